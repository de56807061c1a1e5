// Fri Jan 16 2026 - Alex

use crate::syntax::{AccessorDecl, FieldDecl, Markers, Member, TypeRef};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberRole {
    Plain,
    UnionMember,
    /// Field of an anonymous member, merged without a name prefix.
    AnonymousInlined,
    /// Field of a named nested member, renamed `outer_inner`.
    Promoted,
    /// Singleton element standing in for a non-native fixed buffer.
    BufferStart,
    BufferAccessor,
    /// First field of a nested struct kept behind an accessor.
    NestedStart,
    NestedAccessor,
}

impl MemberRole {
    pub fn is_accessor(self) -> bool {
        matches!(self, Self::BufferAccessor | Self::NestedAccessor)
    }
}

/// One placed member of a flattened struct. Accessor descriptors carry the
/// offset of the field they point at and occupy no bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberDescriptor {
    pub name: String,
    pub type_ref: TypeRef,
    pub offset: u32,
    pub size: u32,
    pub fixed_count: Option<u32>,
    pub role: MemberRole,
    pub modifiers: Vec<String>,
    /// Field an accessor points at.
    pub base_field: Option<String>,
    /// Index of the member in the container's declaration list that this
    /// descriptor replaces.
    #[serde(skip)]
    pub source: usize,
}

impl MemberDescriptor {
    pub fn field(field: &FieldDecl, source: usize, offset: u32, size: u32, role: MemberRole) -> Self {
        Self {
            name: field.name().to_string(),
            type_ref: field.ty.clone(),
            offset,
            size,
            fixed_count: field.fixed_count,
            role,
            modifiers: field.modifiers.clone(),
            base_field: None,
            source,
        }
    }

    pub fn accessor(
        name: String,
        pointee: TypeRef,
        base_field: &str,
        offset: u32,
        modifiers: &[String],
        role: MemberRole,
        source: usize,
    ) -> Self {
        Self {
            name,
            type_ref: pointee,
            offset,
            size: 0,
            fixed_count: None,
            role,
            modifiers: modifiers.to_vec(),
            base_field: Some(base_field.to_string()),
            source,
        }
    }

    pub fn is_accessor(&self) -> bool {
        self.role.is_accessor()
    }

    pub fn end(&self) -> u32 {
        self.offset.saturating_add(self.size)
    }

    /// Re-homes a member of a flattened child into its container. `None` if
    /// the moved offset does not fit.
    pub fn promote(&self, prefix: Option<&str>, base: u32, source: usize) -> Option<Self> {
        let rename = |name: &str| match prefix {
            Some(outer) => format!("{}_{}", outer, name),
            None => name.to_string(),
        };
        let role = if self.is_accessor() {
            self.role
        } else if prefix.is_some() {
            MemberRole::Promoted
        } else {
            MemberRole::AnonymousInlined
        };

        Some(Self {
            name: rename(&self.name),
            offset: self.offset.checked_add(base)?,
            role,
            base_field: self.base_field.as_deref().map(rename),
            source,
            ..self.clone()
        })
    }

    /// Materializes the descriptor as an output member of `container`.
    pub fn to_member(&self, container: &str) -> Member {
        match &self.base_field {
            Some(base_field) if self.is_accessor() => {
                let mut modifiers = self.modifiers.clone();
                if !modifiers.iter().any(|m| m == "unsafe") {
                    modifiers.push("unsafe".to_string());
                }
                Member::Accessor(AccessorDecl {
                    modifiers,
                    name: self.name.clone(),
                    pointee: self.type_ref.clone(),
                    container: container.to_string(),
                    base_field: base_field.clone(),
                    offset: self.offset,
                })
            }
            _ => Member::Field(FieldDecl {
                modifiers: self.modifiers.clone(),
                ty: self.type_ref.clone(),
                names: vec![self.name.clone()],
                fixed_count: self.fixed_count,
                offset: Some(self.offset),
                is_static: false,
                is_const: false,
                markers: Markers::none(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int_field(name: &str, offset: u32) -> MemberDescriptor {
        let decl = FieldDecl::new(TypeRef::named("int"), name);
        MemberDescriptor::field(&decl, 0, offset, 4, MemberRole::Plain)
    }

    #[test]
    fn test_promote_with_prefix() {
        let promoted = int_field("UniqueThread", 8).promote(Some("ClientId"), 0x40, 3).unwrap();
        assert_eq!(promoted.name, "ClientId_UniqueThread");
        assert_eq!(promoted.offset, 0x48);
        assert_eq!(promoted.role, MemberRole::Promoted);
        assert_eq!(promoted.source, 3);
    }

    #[test]
    fn test_promote_anonymous_keeps_names() {
        let promoted = int_field("Version", 0).promote(None, 16, 1).unwrap();
        assert_eq!(promoted.name, "Version");
        assert_eq!(promoted.offset, 16);
        assert_eq!(promoted.role, MemberRole::AnonymousInlined);
    }

    #[test]
    fn test_promote_accessor_renames_base() {
        let accessor = MemberDescriptor::accessor(
            "Slots".to_string(),
            TypeRef::named("IntPtr"),
            "Slots_Start",
            4,
            &["public".to_string()],
            MemberRole::BufferAccessor,
            0,
        );
        let promoted = accessor.promote(Some("Batch"), 8, 2).unwrap();
        assert_eq!(promoted.name, "Batch_Slots");
        assert_eq!(promoted.base_field.as_deref(), Some("Batch_Slots_Start"));
        assert_eq!(promoted.role, MemberRole::BufferAccessor);
        assert_eq!(promoted.offset, 12);
    }

    #[test]
    fn test_promote_past_address_space() {
        assert!(int_field("a", 8).promote(None, u32::MAX - 4, 0).is_none());
        assert_eq!(int_field("a", 4).end(), 8);
        assert_eq!(int_field("a", u32::MAX - 1).end(), u32::MAX);
    }

    #[test]
    fn test_to_member_field_carries_offset() {
        match int_field("a", 4).to_member("S") {
            Member::Field(field) => {
                assert_eq!(field.offset, Some(4));
                assert_eq!(field.names, vec!["a"]);
            }
            other => panic!("unexpected member {:?}", other),
        }
    }
}
