// Fri Jan 16 2026 - Alex

use crate::structure::{FlattenedLayout, MemberDescriptor, TypeKey};
use crate::syntax::{Markers, StructDecl};
use indexmap::IndexMap;
use std::rc::Rc;

/// A struct after flattening: the rewritten declaration, its published
/// layout, and the placed members the declaration was built from.
#[derive(Debug, Clone)]
pub struct FlattenedStruct {
    pub key: TypeKey,
    /// Intent markers of the source declaration.
    pub markers: Markers,
    pub decl: StructDecl,
    pub layout: FlattenedLayout,
    pub members: Vec<MemberDescriptor>,
}

impl FlattenedStruct {
    pub fn fields(&self) -> impl Iterator<Item = &MemberDescriptor> {
        self.members.iter().filter(|m| !m.is_accessor())
    }

    pub fn member(&self, name: &str) -> Option<&MemberDescriptor> {
        self.members.iter().find(|m| m.name == name)
    }
}

/// One canonical flattened result per type key, shared by reference with
/// every site that embeds the type. Entries keep first-computed order.
pub struct FlattenCache {
    entries: IndexMap<TypeKey, Rc<FlattenedStruct>>,
    hits: usize,
}

impl FlattenCache {
    pub fn new() -> Self {
        Self {
            entries: IndexMap::new(),
            hits: 0,
        }
    }

    pub fn get(&mut self, key: &TypeKey) -> Option<Rc<FlattenedStruct>> {
        let entry = self.entries.get(key).cloned();
        if entry.is_some() {
            self.hits += 1;
        }
        entry
    }

    pub fn peek(&self, key: &TypeKey) -> Option<&Rc<FlattenedStruct>> {
        self.entries.get(key)
    }

    pub fn insert(&mut self, flattened: Rc<FlattenedStruct>) {
        self.entries.insert(flattened.key.clone(), flattened);
    }

    pub fn contains(&self, key: &TypeKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rc<FlattenedStruct>> {
        self.entries.values()
    }

    pub fn hits(&self) -> usize {
        self.hits
    }

    pub fn size(&self) -> usize {
        self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.hits = 0;
    }
}

impl Default for FlattenCache {
    fn default() -> Self {
        Self::new()
    }
}
