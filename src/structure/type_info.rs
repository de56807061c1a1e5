// Fri Jan 16 2026 - Alex

use crate::syntax::TypeRef;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical identity of a declared type: its dotted, fully-qualified name.
/// Independent of the file the type was declared in.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TypeKey(String);

impl TypeKey {
    pub fn root(namespace: Option<&str>, name: &str) -> Self {
        match namespace {
            Some(ns) if !ns.is_empty() => Self(format!("{}.{}", ns, name)),
            _ => Self(name.to_string()),
        }
    }

    pub fn child(&self, name: &str) -> Self {
        Self(format!("{}.{}", self.0, name))
    }

    pub fn parent(&self) -> Option<Self> {
        self.0.rsplit_once('.').map(|(parent, _)| Self(parent.to_string()))
    }

    /// Last path segment.
    pub fn simple_name(&self) -> &str {
        self.0.rsplit('.').next().unwrap_or(&self.0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TypeKey {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SemanticType {
    Primitive(PrimitiveKind),
    /// The pointee stays unresolved: pointer size never depends on it.
    Pointer(TypeRef),
    Enum { key: TypeKey, underlying: PrimitiveKind },
    Struct(TypeKey),
    /// Reference types and other shapes without an unmanaged layout.
    Managed(String),
}

impl SemanticType {
    pub fn is_struct(&self) -> bool {
        matches!(self, Self::Struct(_))
    }

    /// Element kinds a fixed-size buffer can hold natively.
    pub fn is_fixed_buffer_element(&self) -> bool {
        match self {
            Self::Primitive(kind) => kind.is_fixed_buffer_element(),
            _ => false,
        }
    }
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primitive(kind) => write!(f, "{}", kind.keyword()),
            Self::Pointer(pointee) => write!(f, "{}*", pointee),
            Self::Enum { key, .. } => write!(f, "enum {}", key),
            Self::Struct(key) => write!(f, "struct {}", key),
            Self::Managed(name) => write!(f, "{}", name),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Bool,
    U8,
    I8,
    U16,
    I16,
    Char,
    U32,
    I32,
    F32,
    U64,
    I64,
    F64,
    IntPtr,
    UIntPtr,
}

impl PrimitiveKind {
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.strip_prefix("System.").unwrap_or(name);
        let kind = match name {
            "bool" | "Boolean" => Self::Bool,
            "byte" | "Byte" => Self::U8,
            "sbyte" | "SByte" => Self::I8,
            "ushort" | "UInt16" => Self::U16,
            "short" | "Int16" => Self::I16,
            "char" | "Char" => Self::Char,
            "uint" | "UInt32" => Self::U32,
            "int" | "Int32" => Self::I32,
            "float" | "Single" => Self::F32,
            "ulong" | "UInt64" => Self::U64,
            "long" | "Int64" => Self::I64,
            "double" | "Double" => Self::F64,
            "nint" | "IntPtr" => Self::IntPtr,
            "nuint" | "UIntPtr" => Self::UIntPtr,
            _ => return None,
        };
        Some(kind)
    }

    pub fn keyword(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::U8 => "byte",
            Self::I8 => "sbyte",
            Self::U16 => "ushort",
            Self::I16 => "short",
            Self::Char => "char",
            Self::U32 => "uint",
            Self::I32 => "int",
            Self::F32 => "float",
            Self::U64 => "ulong",
            Self::I64 => "long",
            Self::F64 => "double",
            Self::IntPtr => "IntPtr",
            Self::UIntPtr => "UIntPtr",
        }
    }

    pub fn size(self, pointer_width: u32) -> u32 {
        match self {
            Self::Bool | Self::U8 | Self::I8 => 1,
            Self::U16 | Self::I16 | Self::Char => 2,
            Self::U32 | Self::I32 | Self::F32 => 4,
            Self::U64 | Self::I64 | Self::F64 => 8,
            Self::IntPtr | Self::UIntPtr => pointer_width,
        }
    }

    pub fn is_integer(self) -> bool {
        !matches!(self, Self::Bool | Self::F32 | Self::F64)
    }

    pub fn is_fixed_buffer_element(self) -> bool {
        !matches!(self, Self::IntPtr | Self::UIntPtr)
    }
}

/// Names that resolve but have no unmanaged layout.
pub fn is_managed_name(name: &str) -> bool {
    let name = name.strip_prefix("System.").unwrap_or(name);
    matches!(
        name,
        "string" | "String" | "object" | "Object" | "decimal" | "Decimal" | "dynamic" | "void" | "Void"
    )
}
