// Fri Jan 16 2026 - Alex

use crate::structure::{FlattenedStruct, LayoutEngine, LayoutError, LayoutResult, Resolver, SemanticType};
use std::rc::Rc;

/// Byte size of a resolved type, plus the flattened struct when the type is
/// one.
#[derive(Debug, Clone)]
pub struct TypeSize {
    pub size: u32,
    pub flattened: Option<Rc<FlattenedStruct>>,
}

impl TypeSize {
    fn scalar(size: u32) -> Self {
        Self {
            size,
            flattened: None,
        }
    }
}

impl<R: Resolver + ?Sized> LayoutEngine<'_, R> {
    /// The first query for a struct type flattens it (recursively); later
    /// queries are cache hits. Pointers never look at their pointee.
    pub fn size_of(&mut self, ty: &SemanticType) -> LayoutResult<TypeSize> {
        let pointer_width = self.options().pointer_width;
        match ty {
            SemanticType::Pointer(_) => Ok(TypeSize::scalar(pointer_width)),
            SemanticType::Primitive(kind) => Ok(TypeSize::scalar(kind.size(pointer_width))),
            SemanticType::Enum { underlying, .. } => Ok(TypeSize::scalar(underlying.size(pointer_width))),
            SemanticType::Struct(key) => {
                let flattened = self.flatten(key)?;
                Ok(TypeSize {
                    size: flattened.layout.size,
                    flattened: Some(flattened),
                })
            }
            SemanticType::Managed(name) => Err(LayoutError::UnsupportedType(name.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structure::{DeclIndex, FlattenOptions, PrimitiveKind, TypeKey};
    use crate::syntax::{FieldDecl, StructDecl, TypeRef, Unit};

    #[test]
    fn test_scalar_sizes_follow_pointer_width() {
        let index = DeclIndex::new();
        let mut engine = LayoutEngine::new(&index, FlattenOptions::x86());
        let ptr = SemanticType::Pointer(TypeRef::named("LIST_ENTRY"));
        assert_eq!(engine.size_of(&ptr).unwrap().size, 4);
        let intptr = SemanticType::Primitive(PrimitiveKind::IntPtr);
        assert_eq!(engine.size_of(&intptr).unwrap().size, 4);

        let mut engine = LayoutEngine::new(&index, FlattenOptions::x64());
        assert_eq!(engine.size_of(&ptr).unwrap().size, 8);
        let status = SemanticType::Enum {
            key: TypeKey::from("STATUS"),
            underlying: PrimitiveKind::U16,
        };
        assert_eq!(engine.size_of(&status).unwrap().size, 2);
    }

    #[test]
    fn test_struct_size_flattens_once() {
        let unit = Unit::new("a.cs").with_struct(
            StructDecl::new("CLIENT_ID")
                .with_field(FieldDecl::new(TypeRef::named("IntPtr"), "UniqueProcess"))
                .with_field(FieldDecl::new(TypeRef::named("IntPtr"), "UniqueThread")),
        );
        let units = [unit];
        let index = DeclIndex::from_units(&units);
        let mut engine = LayoutEngine::new(&index, FlattenOptions::x64());
        let client_id = SemanticType::Struct(TypeKey::from("CLIENT_ID"));

        let first = engine.size_of(&client_id).unwrap();
        let second = engine.size_of(&client_id).unwrap();
        assert_eq!(first.size, 16);
        assert!(Rc::ptr_eq(&first.flattened.unwrap(), &second.flattened.unwrap()));
        assert_eq!(engine.computed(), 1);
    }

    #[test]
    fn test_managed_is_unsupported() {
        let index = DeclIndex::new();
        let mut engine = LayoutEngine::new(&index, FlattenOptions::default());
        let err = engine.size_of(&SemanticType::Managed("string".to_string())).unwrap_err();
        assert!(matches!(err, LayoutError::UnsupportedType(name) if name == "string"));
    }
}
