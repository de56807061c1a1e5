// Fri Jan 16 2026 - Alex

use crate::structure::type_info::is_managed_name;
use crate::structure::{LayoutError, LayoutResult, PrimitiveKind, SemanticType, StructLayoutSpec, TypeKey};
use crate::syntax::{ClassDecl, EnumDecl, Item, Markers, Member, StructDecl, TypeRef, Unit};
use ahash::AHashMap;
use indexmap::IndexMap;

/// The queries the layout engine asks of whatever owns the declarations.
pub trait Resolver {
    /// Binds a type reference written inside the struct `scope`.
    fn resolve_type(&self, ty: &TypeRef, scope: &TypeKey) -> LayoutResult<SemanticType>;

    fn struct_decl(&self, key: &TypeKey) -> Option<&StructDecl>;

    fn markers_of(&self, decl: &StructDecl) -> Markers {
        decl.markers
    }

    fn structural_layout_of(&self, decl: &StructDecl) -> LayoutResult<StructLayoutSpec> {
        StructLayoutSpec::from_attr(decl.layout.as_ref(), &decl.name)
    }
}

/// Symbol table over every declaration of a set of units.
pub struct DeclIndex<'u> {
    structs: IndexMap<TypeKey, &'u StructDecl>,
    enums: AHashMap<TypeKey, &'u EnumDecl>,
    classes: AHashMap<TypeKey, &'u ClassDecl>,
    namespaces: Vec<String>,
}

impl<'u> DeclIndex<'u> {
    pub fn new() -> Self {
        Self {
            structs: IndexMap::new(),
            enums: AHashMap::new(),
            classes: AHashMap::new(),
            namespaces: Vec::new(),
        }
    }

    pub fn from_units<I>(units: I) -> Self
    where
        I: IntoIterator<Item = &'u Unit>,
    {
        let mut index = Self::new();
        for unit in units {
            index.add_unit(unit);
        }
        index
    }

    pub fn add_unit(&mut self, unit: &'u Unit) {
        for namespace in unit.namespace.iter().chain(unit.imports.iter()) {
            if !self.namespaces.contains(namespace) {
                self.namespaces.push(namespace.clone());
            }
        }

        let namespace = unit.namespace.as_deref();
        for item in &unit.items {
            match item {
                Item::Struct(decl) => self.add_struct(TypeKey::root(namespace, &decl.name), decl),
                Item::Enum(decl) => {
                    self.enums.insert(TypeKey::root(namespace, &decl.name), decl);
                }
                Item::Class(decl) => {
                    self.classes.insert(TypeKey::root(namespace, &decl.name), decl);
                }
                Item::Verbatim { .. } => {}
            }
        }
    }

    fn add_struct(&mut self, key: TypeKey, decl: &'u StructDecl) {
        for member in &decl.members {
            match member {
                Member::Struct(nested) => self.add_struct(key.child(&nested.name), nested),
                Member::Enum(nested) => {
                    self.enums.insert(key.child(&nested.name), nested);
                }
                _ => {}
            }
        }

        if self.structs.contains_key(&key) {
            log::warn!("Duplicate declaration of struct {}, keeping the first", key);
            return;
        }
        self.structs.insert(key, decl);
    }

    pub fn structs(&self) -> impl Iterator<Item = (&TypeKey, &StructDecl)> {
        self.structs.iter().map(|(key, decl)| (key, *decl))
    }

    pub fn len(&self) -> usize {
        self.structs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.structs.is_empty()
    }

    /// Innermost scope first, then the namespaces every unit contributes.
    fn candidates(&self, name: &str, scope: &TypeKey) -> Vec<TypeKey> {
        let mut candidates = Vec::new();
        let mut current = Some(scope.clone());
        while let Some(prefix) = current {
            candidates.push(prefix.child(name));
            current = prefix.parent();
        }
        candidates.push(TypeKey::root(None, name));
        for namespace in &self.namespaces {
            candidates.push(TypeKey::root(Some(namespace), name));
        }
        candidates
    }

    fn resolve_enum(&self, key: &TypeKey, decl: &EnumDecl) -> LayoutResult<SemanticType> {
        let underlying = match &decl.underlying {
            None => PrimitiveKind::I32,
            Some(ty) => PrimitiveKind::from_name(ty.name())
                .filter(|kind| kind.is_integer() && !ty.is_pointer())
                .ok_or_else(|| {
                    LayoutError::UnsupportedType(format!("enum {} : {}", key, ty))
                })?,
        };
        Ok(SemanticType::Enum {
            key: key.clone(),
            underlying,
        })
    }
}

impl Default for DeclIndex<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl Resolver for DeclIndex<'_> {
    fn resolve_type(&self, ty: &TypeRef, scope: &TypeKey) -> LayoutResult<SemanticType> {
        if ty.is_pointer() {
            return Ok(SemanticType::Pointer(ty.pointee().unwrap_or_else(|| ty.clone())));
        }
        if let Some(kind) = PrimitiveKind::from_name(ty.name()) {
            return Ok(SemanticType::Primitive(kind));
        }
        if is_managed_name(ty.name()) {
            return Ok(SemanticType::Managed(ty.name().to_string()));
        }

        for candidate in self.candidates(ty.name(), scope) {
            if self.structs.contains_key(&candidate) {
                return Ok(SemanticType::Struct(candidate));
            }
            if let Some(decl) = self.enums.get(&candidate) {
                return self.resolve_enum(&candidate, decl);
            }
            if self.classes.contains_key(&candidate) {
                return Ok(SemanticType::Managed(candidate.to_string()));
            }
        }

        Err(LayoutError::UnresolvedType {
            type_ref: ty.to_string(),
            scope: scope.to_string(),
        })
    }

    fn struct_decl(&self, key: &TypeKey) -> Option<&StructDecl> {
        self.structs.get(key).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::{FieldDecl, MarkerKind};

    fn units() -> Vec<Unit> {
        let fiber = StructDecl::new("FiberOrVersionUnion")
            .with_markers(Markers::none().with(MarkerKind::Union).with(MarkerKind::AnonymousStruct))
            .with_field(FieldDecl::new(TypeRef::named("IntPtr"), "FiberData"));
        let tib = StructDecl::new("NT_TIB")
            .with_member(Member::Struct(fiber))
            .with_field(FieldDecl::new(TypeRef::named("FiberOrVersionUnion"), "fv"));
        let status = EnumDecl {
            modifiers: Vec::new(),
            name: "STATUS".to_string(),
            underlying: Some(TypeRef::named("ushort")),
            variants: Vec::new(),
        };

        let primary = Unit::new("a.cs")
            .with_namespace("Native")
            .with_struct(tib)
            .with_item(Item::Enum(status))
            .with_item(Item::Class(ClassDecl {
                modifiers: Vec::new(),
                name: "Handle".to_string(),
                base: None,
                body: Vec::new(),
            }));
        let aux = Unit::new("b.cs")
            .with_namespace("Native.Common")
            .with_struct(StructDecl::new("LIST_ENTRY"));
        vec![primary, aux]
    }

    #[test]
    fn test_nested_type_resolves_from_inner_scope() {
        let units = units();
        let index = DeclIndex::from_units(&units);
        let scope = TypeKey::from("Native.NT_TIB");
        let ty = index.resolve_type(&TypeRef::named("FiberOrVersionUnion"), &scope).unwrap();
        assert_eq!(ty, SemanticType::Struct(TypeKey::from("Native.NT_TIB.FiberOrVersionUnion")));
        assert!(index.struct_decl(&TypeKey::from("Native.NT_TIB.FiberOrVersionUnion")).is_some());
    }

    #[test]
    fn test_cross_unit_namespace_lookup() {
        let units = units();
        let index = DeclIndex::from_units(&units);
        let ty = index
            .resolve_type(&TypeRef::named("LIST_ENTRY"), &TypeKey::from("Native.NT_TIB"))
            .unwrap();
        assert_eq!(ty, SemanticType::Struct(TypeKey::from("Native.Common.LIST_ENTRY")));
    }

    #[test]
    fn test_pointer_never_touches_pointee() {
        let index = DeclIndex::new();
        let ty = index
            .resolve_type(&"Missing*".parse().unwrap(), &TypeKey::from("S"))
            .unwrap();
        assert_eq!(ty, SemanticType::Pointer(TypeRef::named("Missing")));
    }

    #[test]
    fn test_enum_and_class() {
        let units = units();
        let index = DeclIndex::from_units(&units);
        let scope = TypeKey::from("Native.NT_TIB");
        match index.resolve_type(&TypeRef::named("STATUS"), &scope).unwrap() {
            SemanticType::Enum { underlying, .. } => assert_eq!(underlying, PrimitiveKind::U16),
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(
            index.resolve_type(&TypeRef::named("Handle"), &scope).unwrap(),
            SemanticType::Managed(_)
        ));
    }

    #[test]
    fn test_unresolved_names_scope() {
        let index = DeclIndex::new();
        let err = index
            .resolve_type(&TypeRef::named("HANDLE"), &TypeKey::from("TEB"))
            .unwrap_err();
        assert!(matches!(err, LayoutError::UnresolvedType { ref type_ref, .. } if type_ref == "HANDLE"));
    }
}
