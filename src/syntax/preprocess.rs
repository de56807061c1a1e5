// Fri Jan 16 2026 - Alex

use crate::syntax::{Item, Member, StructDecl, Unit};

/// Splices the active branch of every conditional block into its enclosing
/// struct body. A block is active when its symbol is among `defines`.
pub fn preprocess(unit: &Unit, defines: &[String]) -> Unit {
    let items = unit
        .items
        .iter()
        .map(|item| match item {
            Item::Struct(decl) => Item::Struct(preprocess_struct(decl, defines)),
            other => other.clone(),
        })
        .collect();

    Unit {
        items,
        ..unit.clone()
    }
}

fn preprocess_struct(decl: &StructDecl, defines: &[String]) -> StructDecl {
    let mut members = Vec::with_capacity(decl.members.len());
    expand_members(&decl.members, defines, &mut members);
    StructDecl {
        members,
        ..decl.clone()
    }
}

fn expand_members(members: &[Member], defines: &[String], out: &mut Vec<Member>) {
    for member in members {
        match member {
            Member::Conditional(block) => {
                let active = if defines.iter().any(|d| d == &block.symbol) {
                    &block.members
                } else {
                    &block.else_members
                };
                log::trace!("#if {}: splicing {} member(s)", block.symbol, active.len());
                expand_members(active, defines, out);
            }
            Member::Struct(nested) => out.push(Member::Struct(preprocess_struct(nested, defines))),
            other => out.push(other.clone()),
        }
    }
}
