// Fri Jan 16 2026 - Alex

use crate::structure::{MemberDescriptor, MemberRole};
use crate::syntax::FieldDecl;

pub fn start_name(field: &str) -> String {
    format!("{}_Start", field)
}

pub fn ref_name(field: &str) -> String {
    format!("{}_Ref", field)
}

/// Indexable access to a fixed buffer whose element type cannot be declared
/// as a native buffer. Named after the declared buffer.
pub fn buffer_accessor(buffer: &FieldDecl, start_field: &str, offset: u32, source: usize) -> MemberDescriptor {
    MemberDescriptor::accessor(
        buffer.name().to_string(),
        buffer.ty.clone(),
        start_field,
        offset,
        &buffer.modifiers,
        MemberRole::BufferAccessor,
        source,
    )
}

/// Whole-struct access to a nested member whose fields were spread into the
/// container, typed as a pointer to the nested struct.
pub fn nested_accessor(nested: &FieldDecl, first_field: &str, offset: u32, source: usize) -> MemberDescriptor {
    MemberDescriptor::accessor(
        ref_name(nested.name()),
        nested.ty.clone(),
        first_field,
        offset,
        &nested.modifiers,
        MemberRole::NestedAccessor,
        source,
    )
}
