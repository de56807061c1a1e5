// Fri Jan 16 2026 - Alex

use crate::structure::{FlattenedStruct, LayoutEngine, LayoutResult, Resolver, TypeKey};
use crate::syntax::{is_marker_declaration, Item, Markers, Member, StructDecl, Unit};
use std::rc::Rc;

/// Applies the engine's results to a whole unit. Flatten-marked structs are
/// swapped for their flat form, anonymous struct types and marker attribute
/// classes are dropped, and every remaining marker is stripped. Everything
/// else is copied as is.
pub struct Rewriter<'e, 'r, R: Resolver + ?Sized> {
    engine: &'e mut LayoutEngine<'r, R>,
    rewritten: Vec<Rc<FlattenedStruct>>,
}

impl<'e, 'r, R: Resolver + ?Sized> Rewriter<'e, 'r, R> {
    pub fn new(engine: &'e mut LayoutEngine<'r, R>) -> Self {
        Self {
            engine,
            rewritten: Vec::new(),
        }
    }

    /// Structs replaced so far, in the order they appear in the unit.
    pub fn rewritten(&self) -> &[Rc<FlattenedStruct>] {
        &self.rewritten
    }

    pub fn into_rewritten(self) -> Vec<Rc<FlattenedStruct>> {
        self.rewritten
    }

    pub fn rewrite_unit(&mut self, unit: &Unit) -> LayoutResult<Unit> {
        let namespace = unit.namespace.as_deref();
        let mut items = Vec::with_capacity(unit.items.len());

        for item in &unit.items {
            match item {
                Item::Struct(decl) => {
                    if let Some(out) = self.rewrite_struct(TypeKey::root(namespace, &decl.name), decl)? {
                        items.push(Item::Struct(out));
                    }
                }
                Item::Class(class) if is_marker_declaration(&class.name, class.base.as_deref()) => {
                    log::debug!("Dropping marker declaration {}", class.name);
                }
                other => items.push(other.clone()),
            }
        }

        Ok(Unit {
            items,
            ..unit.clone()
        })
    }

    fn rewrite_struct(&mut self, key: TypeKey, decl: &StructDecl) -> LayoutResult<Option<StructDecl>> {
        if decl.markers.anonymous {
            log::debug!("Dropping anonymous struct {}", key);
            return Ok(None);
        }

        let mut out = if decl.markers.flatten {
            let flat = self.engine.flatten(&key)?;
            let out = flat.decl.clone();
            self.rewritten.push(flat);
            out
        } else {
            StructDecl {
                markers: Markers::none(),
                ..decl.clone()
            }
        };

        let members = std::mem::take(&mut out.members);
        for member in members {
            match member {
                Member::Struct(nested) => {
                    let child = key.child(&nested.name);
                    if let Some(nested) = self.rewrite_struct(child, &nested)? {
                        out.members.push(Member::Struct(nested));
                    }
                }
                Member::Field(mut field) => {
                    field.markers = Markers::none();
                    out.members.push(Member::Field(field));
                }
                other => out.members.push(other),
            }
        }
        Ok(Some(out))
    }
}
