// Fri Jan 16 2026 - Alex

use crate::structure::{FlattenedStruct, LayoutError, LayoutResult, MemberDescriptor, StructLayoutSpec};
use ahash::AHashSet;

/// Checks that a flattened result is safe to publish.
pub struct LayoutValidator;

impl LayoutValidator {
    pub fn new() -> Self {
        Self
    }

    pub fn validate(&self, flat: &FlattenedStruct) -> LayoutResult<()> {
        let name = flat.key.as_str();
        let expected = StructLayoutSpec::flattened_attr(flat.layout.size);
        if flat.decl.layout != Some(expected) {
            return Err(LayoutError::ValidationFailed(format!(
                "{} is not emitted as Explicit, Pack = 1, Size = {}",
                name, flat.layout.size
            )));
        }

        for field in flat.decl.fields().filter(|f| f.is_instance()) {
            if field.offset.is_none() {
                return Err(LayoutError::ValidationFailed(format!(
                    "{}.{} has no offset",
                    name,
                    field.name()
                )));
            }
        }

        let mut seen = AHashSet::new();
        for member in &flat.members {
            if !seen.insert(member.name.as_str()) {
                return Err(LayoutError::ValidationFailed(format!(
                    "{} declares {} twice",
                    name, member.name
                )));
            }
            if member.end() > flat.layout.size {
                return Err(LayoutError::ValidationFailed(format!(
                    "{}.{} ends at {} past size {}",
                    name,
                    member.name,
                    member.end(),
                    flat.layout.size
                )));
            }
        }

        for accessor in flat.members.iter().filter(|m| m.is_accessor()) {
            let target = accessor
                .base_field
                .as_deref()
                .and_then(|base| flat.member(base))
                .filter(|target| !target.is_accessor());
            match target {
                Some(target) if target.offset == accessor.offset => {}
                _ => {
                    return Err(LayoutError::ValidationFailed(format!(
                        "accessor {}.{} does not point at a field at {}",
                        name, accessor.name, accessor.offset
                    )))
                }
            }
        }

        Ok(())
    }

    /// Pairs of fields sharing at least one byte, in declaration order.
    pub fn find_overlaps<'a>(&self, flat: &'a FlattenedStruct) -> Vec<(&'a MemberDescriptor, &'a MemberDescriptor)> {
        let fields: Vec<&MemberDescriptor> = flat.fields().filter(|m| m.size > 0).collect();
        let mut overlaps = Vec::new();
        for (i, a) in fields.iter().enumerate() {
            for b in &fields[i + 1..] {
                if a.offset < b.end() && b.offset < a.end() {
                    overlaps.push((*a, *b));
                }
            }
        }
        overlaps
    }
}

impl Default for LayoutValidator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structure::{DeclIndex, FlattenOptions, LayoutEngine, TypeKey};
    use crate::syntax::{FieldDecl, MarkerKind, Markers, StructDecl, TypeRef, Unit};
    use std::rc::Rc;

    fn flatten(decl: StructDecl) -> Rc<FlattenedStruct> {
        let name = decl.name.clone();
        let units = [Unit::new("v.cs").with_struct(decl)];
        let index = DeclIndex::from_units(&units);
        let mut engine = LayoutEngine::new(&index, FlattenOptions::x86());
        engine.flatten(&TypeKey::from(name.as_str())).unwrap()
    }

    fn large_integer() -> StructDecl {
        StructDecl::new("LARGE_INTEGER")
            .with_markers(Markers::none().with(MarkerKind::Union))
            .with_field(FieldDecl::new(TypeRef::named("long"), "QuadPart"))
            .with_field(FieldDecl::new(TypeRef::named("uint"), "LowPart"))
    }

    #[test]
    fn test_engine_output_validates() {
        let decl = StructDecl::new("S")
            .with_field(FieldDecl::new(TypeRef::named("byte"), "flag"))
            .with_field(FieldDecl::new(TypeRef::named("IntPtr"), "Slots").with_fixed_count(4));
        let validator = LayoutValidator::new();
        validator.validate(&flatten(decl)).unwrap();
        validator.validate(&flatten(large_integer())).unwrap();
    }

    #[test]
    fn test_member_past_end_rejected() {
        let mut flat = (*flatten(large_integer())).clone();
        flat.members[1].offset = 6;
        let err = LayoutValidator::new().validate(&flat).unwrap_err();
        assert!(matches!(err, LayoutError::ValidationFailed(msg) if msg.contains("LowPart")));
    }

    #[test]
    fn test_dangling_accessor_rejected() {
        let decl = StructDecl::new("S")
            .with_field(FieldDecl::new(TypeRef::named("IntPtr"), "Slots").with_fixed_count(2));
        let mut flat = (*flatten(decl)).clone();
        flat.members.retain(|m| m.name != "Slots_Start");
        assert!(LayoutValidator::new().validate(&flat).is_err());
    }

    #[test]
    fn test_union_members_overlap() {
        let flat = flatten(large_integer());
        let overlaps = LayoutValidator::new().find_overlaps(&flat);
        assert_eq!(overlaps.len(), 1);
        assert_eq!(overlaps[0].0.name, "QuadPart");
        assert_eq!(overlaps[0].1.name, "LowPart");
    }
}
