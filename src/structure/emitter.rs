// Fri Jan 16 2026 - Alex

use crate::structure::{MemberDescriptor, StructLayoutSpec};
use crate::syntax::{Markers, Member, StructDecl};

/// Builds the flat declaration from the source struct and its placed members.
/// Each instance field is replaced in place by the descriptors produced from
/// it; every other member (statics, methods, comments, nested types) is
/// carried over untouched.
pub fn emit(decl: &StructDecl, placed: &[MemberDescriptor], size: u32) -> StructDecl {
    let mut placed = placed.iter().peekable();
    let mut members = Vec::with_capacity(decl.members.len() + placed.len());

    for (index, member) in decl.members.iter().enumerate() {
        match member {
            Member::Field(field) if field.is_instance() => {
                while let Some(descriptor) = placed.next_if(|d| d.source == index) {
                    members.push(descriptor.to_member(&decl.name));
                }
            }
            other => members.push(other.clone()),
        }
    }

    StructDecl {
        modifiers: decl.modifiers.clone(),
        name: decl.name.clone(),
        markers: Markers::none(),
        layout: Some(StructLayoutSpec::flattened_attr(size)),
        members,
    }
}
