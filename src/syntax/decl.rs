// Fri Jan 16 2026 - Alex

use crate::syntax::{Markers, SyntaxError, TypeRef};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

fn is_false(value: &bool) -> bool {
    !*value
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LayoutKind {
    #[serde(alias = "Auto")]
    Sequential,
    Explicit,
}

/// The layout attribute as the author wrote it. Absent fields fall back to
/// the host defaults when the pass reads them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutAttr {
    pub kind: LayoutKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pack: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
}

impl LayoutAttr {
    pub fn sequential() -> Self {
        Self {
            kind: LayoutKind::Sequential,
            pack: None,
            size: None,
        }
    }

    pub fn explicit() -> Self {
        Self {
            kind: LayoutKind::Explicit,
            pack: None,
            size: None,
        }
    }

    pub fn with_pack(mut self, pack: u32) -> Self {
        self.pack = Some(pack);
        self
    }

    pub fn with_size(mut self, size: u32) -> Self {
        self.size = Some(size);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDecl {
    #[serde(default)]
    pub modifiers: Vec<String>,
    #[serde(rename = "type")]
    pub ty: TypeRef,
    pub names: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_static: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_const: bool,
    #[serde(default, skip_serializing_if = "Markers::is_empty")]
    pub markers: Markers,
}

impl FieldDecl {
    pub fn new(ty: TypeRef, name: &str) -> Self {
        Self {
            modifiers: vec!["public".to_string()],
            ty,
            names: vec![name.to_string()],
            fixed_count: None,
            offset: None,
            is_static: false,
            is_const: false,
            markers: Markers::none(),
        }
    }

    pub fn grouped(ty: TypeRef, names: &[&str]) -> Self {
        let mut field = Self::new(ty, "");
        field.names = names.iter().map(|n| n.to_string()).collect();
        field
    }

    pub fn with_offset(mut self, offset: u32) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn with_fixed_count(mut self, count: u32) -> Self {
        self.fixed_count = Some(count);
        if !self.modifiers.iter().any(|m| m == "unsafe") {
            self.modifiers.push("unsafe".to_string());
        }
        self
    }

    pub fn with_markers(mut self, markers: Markers) -> Self {
        self.markers = markers;
        self
    }

    pub fn with_static(mut self) -> Self {
        self.is_static = true;
        self
    }

    /// Static and constant declarations own no storage in an instance.
    pub fn is_instance(&self) -> bool {
        !self.is_static && !self.is_const
    }

    pub fn is_grouped(&self) -> bool {
        self.names.len() > 1
    }

    pub fn name(&self) -> &str {
        self.names.first().map(String::as_str).unwrap_or("")
    }

    /// One declaration per name, in declaration order.
    pub fn split(&self) -> Vec<FieldDecl> {
        self.names
            .iter()
            .map(|name| FieldDecl {
                names: vec![name.clone()],
                ..self.clone()
            })
            .collect()
    }
}

/// A computed, read-only pointer property. It yields the address of
/// `base_field` inside a live instance of `container`, typed as a pointer to
/// `pointee`, and occupies no storage of its own. The getter pins the
/// instance for the duration of the address computation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessorDecl {
    #[serde(default)]
    pub modifiers: Vec<String>,
    pub name: String,
    pub pointee: TypeRef,
    pub container: String,
    pub base_field: String,
    pub offset: u32,
}

impl AccessorDecl {
    pub fn return_type(&self) -> Result<TypeRef, SyntaxError> {
        self.pointee.pointer_to()
    }

    /// `&container + offset` for an instance living at `instance_base`.
    pub fn address_in(&self, instance_base: u64) -> u64 {
        instance_base + u64::from(self.offset)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumDecl {
    #[serde(default)]
    pub modifiers: Vec<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub underlying: Option<TypeRef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variants: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassDecl {
    #[serde(default)]
    pub modifiers: Vec<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub body: Vec<String>,
}

/// `#if symbol ... #else ... #endif` inside a struct body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionalBlock {
    pub symbol: String,
    pub members: Vec<Member>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub else_members: Vec<Member>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Member {
    Field(FieldDecl),
    Accessor(AccessorDecl),
    Struct(StructDecl),
    Enum(EnumDecl),
    Conditional(ConditionalBlock),
    Verbatim { text: String },
}

impl Member {
    pub fn verbatim(text: &str) -> Self {
        Self::Verbatim {
            text: text.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructDecl {
    #[serde(default)]
    pub modifiers: Vec<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Markers::is_empty")]
    pub markers: Markers,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<LayoutAttr>,
    #[serde(default)]
    pub members: Vec<Member>,
}

impl StructDecl {
    pub fn new(name: &str) -> Self {
        Self {
            modifiers: vec!["public".to_string()],
            name: name.to_string(),
            markers: Markers::none(),
            layout: None,
            members: Vec::new(),
        }
    }

    pub fn with_markers(mut self, markers: Markers) -> Self {
        self.markers = markers;
        self
    }

    pub fn with_layout(mut self, layout: LayoutAttr) -> Self {
        self.layout = Some(layout);
        self
    }

    pub fn with_member(mut self, member: Member) -> Self {
        self.members.push(member);
        self
    }

    pub fn with_field(self, field: FieldDecl) -> Self {
        self.with_member(Member::Field(field))
    }

    pub fn fields(&self) -> impl Iterator<Item = &FieldDecl> {
        self.members.iter().filter_map(|m| match m {
            Member::Field(field) => Some(field),
            _ => None,
        })
    }

    pub fn accessors(&self) -> impl Iterator<Item = &AccessorDecl> {
        self.members.iter().filter_map(|m| match m {
            Member::Accessor(accessor) => Some(accessor),
            _ => None,
        })
    }

    pub fn field(&self, name: &str) -> Option<&FieldDecl> {
        self.fields().find(|f| f.names.iter().any(|n| n == name))
    }

    pub fn accessor(&self, name: &str) -> Option<&AccessorDecl> {
        self.accessors().find(|a| a.name == name)
    }

    pub fn nested_struct(&self, name: &str) -> Option<&StructDecl> {
        self.members.iter().find_map(|m| match m {
            Member::Struct(s) if s.name == name => Some(s),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Item {
    Struct(StructDecl),
    Enum(EnumDecl),
    Class(ClassDecl),
    Verbatim { text: String },
}

/// One source file worth of declarations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub imports: Vec<String>,
    #[serde(default)]
    pub items: Vec<Item>,
}

impl Unit {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            namespace: None,
            imports: Vec::new(),
            items: Vec::new(),
        }
    }

    pub fn with_namespace(mut self, namespace: &str) -> Self {
        self.namespace = Some(namespace.to_string());
        self
    }

    pub fn with_item(mut self, item: Item) -> Self {
        self.items.push(item);
        self
    }

    pub fn with_struct(self, decl: StructDecl) -> Self {
        self.with_item(Item::Struct(decl))
    }

    pub fn from_json(text: &str) -> Result<Self, SyntaxError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SyntaxError> {
        let contents = fs::read_to_string(path.as_ref())?;
        Self::from_json(&contents)
    }

    pub fn to_json(&self, pretty: bool) -> Result<String, SyntaxError> {
        let text = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };
        Ok(text)
    }

    pub fn structs(&self) -> impl Iterator<Item = &StructDecl> {
        self.items.iter().filter_map(|item| match item {
            Item::Struct(s) => Some(s),
            _ => None,
        })
    }

    pub fn find_struct(&self, name: &str) -> Option<&StructDecl> {
        self.structs().find(|s| s.name == name)
    }
}
