// Fri Jan 16 2026 - Alex

use crate::structure::accessor::{self, start_name};
use crate::structure::{
    emitter, Alignment, FlattenCache, FlattenedLayout, FlattenedStruct, LayoutError, LayoutResult,
    MemberDescriptor, MemberRole, Resolver, SemanticType, StructLayoutSpec, TypeKey,
};
use crate::syntax::{FieldDecl, Member, StructDecl};
use ahash::AHashSet;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlattenOptions {
    /// 4 on 32-bit targets, 8 on 64-bit targets.
    pub pointer_width: u32,
    /// Spread named nested structs into their container as `outer_inner`
    /// fields instead of keeping a single `outer_Start` placeholder.
    pub inline_nested_structs: bool,
    /// Round each struct's size up to its own alignment.
    pub pad_trailing: bool,
}

impl FlattenOptions {
    pub fn for_pointer_width(pointer_width: u32) -> Self {
        Self {
            pointer_width,
            inline_nested_structs: true,
            pad_trailing: true,
        }
    }

    pub fn x86() -> Self {
        Self::for_pointer_width(4)
    }

    pub fn x64() -> Self {
        Self::for_pointer_width(8)
    }

    pub fn with_inline_nested_structs(mut self, inline: bool) -> Self {
        self.inline_nested_structs = inline;
        self
    }

    pub fn with_pad_trailing(mut self, pad: bool) -> Self {
        self.pad_trailing = pad;
        self
    }
}

impl Default for FlattenOptions {
    fn default() -> Self {
        Self::x64()
    }
}

/// Running state while one struct's members are placed.
struct LayoutState<'d> {
    name: &'d str,
    structural: StructLayoutSpec,
    is_union: bool,
    size: u32,
    largest: u32,
    members: Vec<MemberDescriptor>,
}

impl<'d> LayoutState<'d> {
    fn new(name: &'d str, structural: StructLayoutSpec, is_union: bool) -> Self {
        Self {
            name,
            structural,
            is_union,
            size: 0,
            largest: 0,
            members: Vec::new(),
        }
    }

    fn overlapping(&self) -> bool {
        self.is_union || self.structural.is_explicit()
    }

    fn base_offset(&self, field: &FieldDecl) -> LayoutResult<u32> {
        if self.is_union {
            return Ok(0);
        }
        if self.structural.is_explicit() {
            return field.offset.ok_or_else(|| LayoutError::MissingOffset {
                structure: self.name.to_string(),
                member: field.name().to_string(),
            });
        }
        Ok(self.size)
    }

    fn overflow(&self, value: u32) -> LayoutError {
        LayoutError::InvalidLayout {
            structure: self.name.to_string(),
            parameter: "offset",
            value,
        }
    }

    fn align(&self, natural: u32, base: u32) -> LayoutResult<u32> {
        Alignment::effective(self.structural.pack, natural)
            .align(base)
            .ok_or_else(|| self.overflow(base))
    }

    fn plain_role(&self) -> MemberRole {
        if self.is_union {
            MemberRole::UnionMember
        } else {
            MemberRole::Plain
        }
    }

    fn place_plain(&mut self, field: &FieldDecl, size: u32, base: u32, source: usize) -> LayoutResult<(u32, u32)> {
        let offset = self.align(size, base)?;
        self.largest = self.largest.max(size);
        let role = self.plain_role();
        self.members.push(MemberDescriptor::field(field, source, offset, size, role));
        Ok((offset, size))
    }

    fn advance(&mut self, offset: u32, size: u32) -> LayoutResult<()> {
        let end = offset.checked_add(size).ok_or_else(|| self.overflow(offset))?;
        if self.overlapping() {
            self.size = self.size.max(end);
        } else {
            self.size = end;
        }
        Ok(())
    }

    /// Inlining without a prefix can bring in a name the container already
    /// uses.
    fn check_unique_names(&self) -> LayoutResult<()> {
        let mut seen = AHashSet::new();
        for member in &self.members {
            if !seen.insert(member.name.as_str()) {
                return Err(LayoutError::DuplicateMember {
                    structure: self.name.to_string(),
                    member: member.name.clone(),
                });
            }
        }
        Ok(())
    }

    fn finish(&self, pad_trailing: bool) -> LayoutResult<FlattenedLayout> {
        let mut size = self.size;
        if pad_trailing {
            size = self.align(self.largest, size)?;
        }
        Ok(FlattenedLayout {
            size: size.max(self.structural.size),
            largest_member_alignment: self.largest,
        })
    }
}

/// Computes flat, explicit layouts for struct declarations, one type at a
/// time, memoizing every result.
pub struct LayoutEngine<'r, R: Resolver + ?Sized> {
    resolver: &'r R,
    options: FlattenOptions,
    cache: FlattenCache,
    in_progress: Vec<TypeKey>,
    computed: usize,
}

impl<'r, R: Resolver + ?Sized> LayoutEngine<'r, R> {
    pub fn new(resolver: &'r R, options: FlattenOptions) -> Self {
        Self {
            resolver,
            options,
            cache: FlattenCache::new(),
            in_progress: Vec::new(),
            computed: 0,
        }
    }

    pub fn resolver(&self) -> &'r R {
        self.resolver
    }

    pub fn options(&self) -> FlattenOptions {
        self.options
    }

    pub fn cache(&self) -> &FlattenCache {
        &self.cache
    }

    /// Number of layouts actually computed (cache misses).
    pub fn computed(&self) -> usize {
        self.computed
    }

    pub fn flatten(&mut self, key: &TypeKey) -> LayoutResult<Rc<FlattenedStruct>> {
        if let Some(hit) = self.cache.get(key) {
            return Ok(hit);
        }
        if self.in_progress.contains(key) {
            return Err(LayoutError::CyclicLayout(key.to_string()));
        }

        let resolver = self.resolver;
        let decl = resolver.struct_decl(key).ok_or_else(|| LayoutError::UnresolvedType {
            type_ref: key.to_string(),
            scope: key.parent().map(|p| p.to_string()).unwrap_or_default(),
        })?;

        self.in_progress.push(key.clone());
        let result = self.layout_struct(key, decl);
        self.in_progress.pop();

        let flattened = Rc::new(result?);
        self.cache.insert(flattened.clone());
        self.computed += 1;
        Ok(flattened)
    }

    fn layout_struct(&mut self, key: &TypeKey, decl: &StructDecl) -> LayoutResult<FlattenedStruct> {
        let structural = self.resolver.structural_layout_of(decl)?;
        let markers = self.resolver.markers_of(decl);
        log::debug!(
            "Flattening {} ({:?}, pack {}{})",
            key,
            structural.kind,
            structural.pack,
            if markers.union { ", union" } else { "" }
        );

        let mut state = LayoutState::new(&decl.name, structural, markers.union);
        for (index, member) in decl.members.iter().enumerate() {
            match member {
                Member::Field(field) if !field.is_instance() => {}
                Member::Field(field) if field.is_grouped() => {
                    if field.fixed_count.is_some() {
                        return Err(LayoutError::NotImplemented(format!(
                            "splitting grouped fixed buffer {} in {}",
                            field.names.join(", "),
                            decl.name
                        )));
                    }
                    for single in field.split() {
                        self.place_field(key, &single, index, &mut state)?;
                    }
                }
                Member::Field(field) => self.place_field(key, field, index, &mut state)?,
                Member::Conditional(block) => {
                    return Err(LayoutError::NotImplemented(format!(
                        "unexpanded #if {} block in {}",
                        block.symbol, decl.name
                    )));
                }
                _ => {}
            }
        }

        state.check_unique_names()?;
        let layout = state.finish(self.options.pad_trailing)?;
        log::debug!(
            "{}: size {}, largest member alignment {}",
            key,
            layout.size,
            layout.largest_member_alignment
        );

        let out = emitter::emit(decl, &state.members, layout.size);
        Ok(FlattenedStruct {
            key: key.clone(),
            markers,
            decl: out,
            layout,
            members: state.members,
        })
    }

    fn place_field(
        &mut self,
        scope: &TypeKey,
        field: &FieldDecl,
        source: usize,
        state: &mut LayoutState<'_>,
    ) -> LayoutResult<()> {
        let ty = self.resolver.resolve_type(&field.ty, scope)?;
        let base = state.base_offset(field)?;

        let (offset, size) = match field.fixed_count {
            Some(count) => self.place_buffer(field, &ty, count, base, source, state)?,
            None => {
                let type_size = self.size_of(&ty)?;
                match type_size.flattened {
                    Some(child) => self.place_nested(field, &child, base, source, state)?,
                    None => state.place_plain(field, type_size.size, base, source)?,
                }
            }
        };

        log::trace!("{}.{} @ {} ({} bytes)", state.name, field.name(), offset, size);
        state.advance(offset, size)
    }

    fn place_buffer(
        &mut self,
        field: &FieldDecl,
        ty: &SemanticType,
        count: u32,
        base: u32,
        source: usize,
        state: &mut LayoutState<'_>,
    ) -> LayoutResult<(u32, u32)> {
        let element = self.size_of(ty)?;
        if element.flattened.is_some() {
            return Err(LayoutError::NotImplemented(format!(
                "fixed buffer {}.{} of struct elements ({})",
                state.name,
                field.name(),
                field.ty
            )));
        }

        let size = element.size.checked_mul(count).ok_or_else(|| LayoutError::InvalidLayout {
            structure: state.name.to_string(),
            parameter: "fixed buffer length",
            value: count,
        })?;
        let offset = state.align(element.size, base)?;
        state.largest = state.largest.max(element.size);

        if ty.is_fixed_buffer_element() {
            let role = state.plain_role();
            state.members.push(MemberDescriptor::field(field, source, offset, size, role));
        } else {
            let start = start_name(field.name());
            let mut start_field = MemberDescriptor::field(field, source, offset, size, MemberRole::BufferStart);
            start_field.name = start.clone();
            start_field.fixed_count = None;
            state.members.push(start_field);
            state
                .members
                .push(accessor::buffer_accessor(field, &start, offset, source));
        }
        Ok((offset, size))
    }

    fn place_nested(
        &mut self,
        field: &FieldDecl,
        child: &FlattenedStruct,
        base: u32,
        source: usize,
        state: &mut LayoutState<'_>,
    ) -> LayoutResult<(u32, u32)> {
        let alignment = child.layout.largest_member_alignment;
        state.largest = state.largest.max(alignment);
        let offset = state.align(alignment, base)?;
        let size = child.layout.size;

        let Some(first) = child.fields().next() else {
            log::debug!(
                "{}.{}: {} has no instance fields, reserving {} bytes",
                state.name,
                field.name(),
                child.key,
                size
            );
            return Ok((offset, size));
        };

        let anonymous = field.markers.anonymous || child.markers.anonymous;
        if anonymous {
            let promoted = promote_all(child, None, offset, source).ok_or_else(|| state.overflow(offset))?;
            state.members.extend(promoted);
            return Ok((offset, size));
        }

        if self.options.inline_nested_structs {
            let promoted = promote_all(child, Some(field.name()), offset, source)
                .ok_or_else(|| state.overflow(offset))?;
            let first = promoted.iter().position(|m| !m.is_accessor()).unwrap_or_default();
            let reference = accessor::nested_accessor(field, &promoted[first].name, offset, source);

            let mut promoted = promoted.into_iter();
            state.members.extend(promoted.by_ref().take(first + 1));
            state.members.push(reference);
            state.members.extend(promoted);
        } else {
            let start = MemberDescriptor {
                name: start_name(field.name()),
                type_ref: first.type_ref.clone(),
                offset,
                size,
                fixed_count: first.fixed_count,
                role: MemberRole::NestedStart,
                modifiers: field.modifiers.clone(),
                base_field: None,
                source,
            };
            let reference = accessor::nested_accessor(field, &start.name, offset, source);
            state.members.push(start);
            state.members.push(reference);
        }
        Ok((offset, size))
    }
}

fn promote_all(
    child: &FlattenedStruct,
    prefix: Option<&str>,
    base: u32,
    source: usize,
) -> Option<Vec<MemberDescriptor>> {
    child.members.iter().map(|m| m.promote(prefix, base, source)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structure::DeclIndex;
    use crate::syntax::{
        ConditionalBlock, LayoutAttr, MarkerKind, Markers, StructDecl, TypeRef, Unit,
    };

    fn ty(text: &str) -> TypeRef {
        text.parse().unwrap()
    }

    fn field(text: &str, name: &str) -> FieldDecl {
        FieldDecl::new(ty(text), name)
    }

    fn union() -> Markers {
        Markers::none().with(MarkerKind::Union)
    }

    fn anonymous_union() -> Markers {
        union().with(MarkerKind::AnonymousStruct)
    }

    fn flatten_in(units: &[Unit], name: &str, options: FlattenOptions) -> LayoutResult<Rc<FlattenedStruct>> {
        let index = DeclIndex::from_units(units);
        let mut engine = LayoutEngine::new(&index, options);
        engine.flatten(&TypeKey::from(name))
    }

    fn flatten_one(decl: StructDecl, options: FlattenOptions) -> LayoutResult<Rc<FlattenedStruct>> {
        let name = decl.name.clone();
        flatten_in(&[Unit::new("test.cs").with_struct(decl)], &name, options)
    }

    fn offset_of(flat: &FlattenedStruct, name: &str) -> u32 {
        flat.member(name).unwrap_or_else(|| panic!("no member {}", name)).offset
    }

    fn client_id() -> StructDecl {
        StructDecl::new("CLIENT_ID")
            .with_layout(LayoutAttr::sequential())
            .with_field(field("IntPtr", "UniqueProcess"))
            .with_field(field("IntPtr", "UniqueThread"))
    }

    fn nt_tib() -> StructDecl {
        let fiber = StructDecl::new("FiberOrVersionUnion")
            .with_markers(anonymous_union())
            .with_field(field("IntPtr", "FiberData"))
            .with_field(field("int", "Version"));
        StructDecl::new("NT_TIB")
            .with_markers(Markers::none().with(MarkerKind::Flatten))
            .with_field(field("IntPtr", "ExceptionList"))
            .with_field(field("IntPtr", "StackBase"))
            .with_field(field("IntPtr", "StackLimit"))
            .with_field(field("IntPtr", "SubSystemTib"))
            .with_member(Member::Struct(fiber))
            .with_field(
                field("FiberOrVersionUnion", "fv")
                    .with_markers(Markers::none().with(MarkerKind::AnonymousStruct)),
            )
            .with_field(field("IntPtr", "ArbitraryUserPointer"))
            .with_field(field("NT_TIB*", "Self"))
    }

    #[test]
    fn test_sequential_ints() {
        let decl = StructDecl::new("S")
            .with_field(field("int", "a"))
            .with_field(field("int", "b"));
        let flat = flatten_one(decl, FlattenOptions::x86()).unwrap();
        assert_eq!(offset_of(&flat, "a"), 0);
        assert_eq!(offset_of(&flat, "b"), 4);
        assert_eq!(flat.layout.size, 8);
        assert_eq!(flat.layout.largest_member_alignment, 4);
    }

    #[test]
    fn test_union_offsets_are_zero() {
        let decl = StructDecl::new("U")
            .with_markers(union())
            .with_field(field("int", "a"))
            .with_field(field("int", "b"));
        let flat = flatten_one(decl, FlattenOptions::x86()).unwrap();
        assert_eq!(offset_of(&flat, "a"), 0);
        assert_eq!(offset_of(&flat, "b"), 0);
        assert_eq!(flat.layout.size, 4);
        assert!(flat.fields().all(|m| m.role == MemberRole::UnionMember));
    }

    #[test]
    fn test_union_size_is_largest_member() {
        let decl = StructDecl::new("U")
            .with_markers(union())
            .with_field(field("long", "wide"))
            .with_field(field("byte", "narrow"));
        let flat = flatten_one(decl, FlattenOptions::x64()).unwrap();
        assert_eq!(flat.layout.size, 8);
    }

    #[test]
    fn test_pointer_then_short_on_x64() {
        let decl = StructDecl::new("S")
            .with_field(field("IntPtr", "p"))
            .with_field(field("short", "s"));
        let flat = flatten_one(decl.clone(), FlattenOptions::x64()).unwrap();
        assert_eq!(offset_of(&flat, "p"), 0);
        assert_eq!(offset_of(&flat, "s"), 8);
        assert_eq!(flat.layout.size, 16);

        let flat = flatten_one(decl.with_field(field("void*", "q")), FlattenOptions::x64()).unwrap();
        assert_eq!(offset_of(&flat, "q"), 16);
        assert_eq!(flat.layout.size, 24);
    }

    #[test]
    fn test_without_trailing_padding() {
        let decl = StructDecl::new("S")
            .with_field(field("IntPtr", "p"))
            .with_field(field("short", "s"));
        let flat = flatten_one(decl, FlattenOptions::x64().with_pad_trailing(false)).unwrap();
        assert_eq!(flat.layout.size, 10);
    }

    #[test]
    fn test_pointer_buffer_on_x86() {
        let decl = StructDecl::new("S")
            .with_field(field("byte", "flag"))
            .with_field(field("IntPtr", "Slots").with_fixed_count(5));
        let flat = flatten_one(decl, FlattenOptions::x86()).unwrap();

        let start = flat.member("Slots_Start").unwrap();
        assert_eq!(start.offset, 4);
        assert_eq!(start.size, 20);
        assert_eq!(start.role, MemberRole::BufferStart);
        assert_eq!(start.fixed_count, None);

        let accessor = flat.member("Slots").unwrap();
        assert_eq!(accessor.role, MemberRole::BufferAccessor);
        assert_eq!(accessor.base_field.as_deref(), Some("Slots_Start"));
        assert_eq!(flat.layout.size, 24);

        assert!(flat.decl.field("Slots_Start").is_some());
        assert_eq!(flat.decl.accessor("Slots").unwrap().return_type().unwrap().to_string(), "IntPtr*");
    }

    #[test]
    fn test_struct_element_buffer_not_implemented() {
        let holder = StructDecl::new("Holder").with_field(field("CLIENT_ID", "Ids").with_fixed_count(5));
        let units = [Unit::new("a.cs").with_struct(client_id()).with_struct(holder)];
        let err = flatten_in(&units, "Holder", FlattenOptions::x86()).unwrap_err();
        assert!(matches!(err, LayoutError::NotImplemented(_)));
    }

    #[test]
    fn test_native_buffer_kept() {
        let decl = StructDecl::new("GDI_TEB_BATCH")
            .with_field(field("uint", "Offset"))
            .with_field(field("IntPtr", "HDC"))
            .with_field(field("uint", "Buffer").with_fixed_count(4));
        let flat = flatten_one(decl, FlattenOptions::x64()).unwrap();
        let buffer = flat.member("Buffer").unwrap();
        assert_eq!(buffer.offset, 16);
        assert_eq!(buffer.size, 16);
        assert_eq!(buffer.fixed_count, Some(4));
        assert_eq!(flat.layout.size, 32);
        assert_eq!(flat.decl.field("Buffer").unwrap().fixed_count, Some(4));
    }

    #[test]
    fn test_explicit_missing_offset() {
        let decl = StructDecl::new("S")
            .with_layout(LayoutAttr::explicit())
            .with_field(field("int", "a").with_offset(0))
            .with_field(field("int", "b"));
        let err = flatten_one(decl, FlattenOptions::x86()).unwrap_err();
        match err {
            LayoutError::MissingOffset { structure, member } => {
                assert_eq!(structure, "S");
                assert_eq!(member, "b");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_explicit_offsets_pass_through() {
        let decl = StructDecl::new("LARGE_INTEGER")
            .with_layout(LayoutAttr::explicit())
            .with_field(field("uint", "LowPart").with_offset(0))
            .with_field(field("int", "HighPart").with_offset(4))
            .with_field(field("long", "QuadPart").with_offset(0));
        let flat = flatten_one(decl, FlattenOptions::x64()).unwrap();
        assert_eq!(offset_of(&flat, "LowPart"), 0);
        assert_eq!(offset_of(&flat, "HighPart"), 4);
        assert_eq!(offset_of(&flat, "QuadPart"), 0);
        assert_eq!(flat.layout.size, 8);
    }

    #[test]
    fn test_alignment_law_under_pack() {
        let decl = StructDecl::new("S")
            .with_layout(LayoutAttr::sequential().with_pack(2))
            .with_field(field("byte", "a"))
            .with_field(field("int", "b"))
            .with_field(field("double", "c"));
        let flat = flatten_one(decl, FlattenOptions::x64()).unwrap();
        assert_eq!(offset_of(&flat, "b"), 2);
        assert_eq!(offset_of(&flat, "c"), 6);
        assert_eq!(flat.layout.size, 14);
        for member in flat.fields() {
            assert_eq!(member.offset % 2u32.min(member.size), 0, "{} misaligned", member.name);
        }
    }

    #[test]
    fn test_pack_four_pointer() {
        let decl = StructDecl::new("UNICODE_STRING")
            .with_layout(LayoutAttr::sequential().with_pack(4))
            .with_field(field("ushort", "Length"))
            .with_field(field("ushort", "MaximumLength"))
            .with_field(field("char*", "buffer"));
        let flat = flatten_one(decl, FlattenOptions::x64()).unwrap();
        assert_eq!(offset_of(&flat, "buffer"), 4);
        assert_eq!(flat.layout.size, 12);
        assert_eq!(flat.layout.largest_member_alignment, 8);
    }

    #[test]
    fn test_declared_size_widens_only() {
        let decl = StructDecl::new("S")
            .with_layout(LayoutAttr::sequential().with_size(32))
            .with_field(field("int", "a"));
        assert_eq!(flatten_one(decl, FlattenOptions::x64()).unwrap().layout.size, 32);

        let decl = StructDecl::new("S")
            .with_layout(LayoutAttr::sequential().with_size(2))
            .with_field(field("int", "a"));
        assert_eq!(flatten_one(decl, FlattenOptions::x64()).unwrap().layout.size, 4);
    }

    #[test]
    fn test_anonymous_union_inlined_without_prefix() {
        let flat = flatten_one(nt_tib(), FlattenOptions::x64()).unwrap();
        assert_eq!(offset_of(&flat, "FiberData"), 32);
        assert_eq!(offset_of(&flat, "Version"), 32);
        assert_eq!(flat.member("FiberData").unwrap().role, MemberRole::AnonymousInlined);
        assert!(flat.member("fv").is_none());
        assert!(flat.member("fv_Ref").is_none());
        assert_eq!(offset_of(&flat, "ArbitraryUserPointer"), 40);
        assert_eq!(offset_of(&flat, "Self"), 48);
        assert_eq!(flat.layout.size, 56);

        let flat = flatten_one(nt_tib(), FlattenOptions::x86()).unwrap();
        assert_eq!(offset_of(&flat, "Version"), 16);
        assert_eq!(flat.layout.size, 28);
    }

    #[test]
    fn test_named_nested_struct_promoted() {
        let teb = StructDecl::new("TEB")
            .with_field(field("NT_TIB", "Tib"))
            .with_field(field("IntPtr", "EnvironmentPointer"))
            .with_field(field("CLIENT_ID", "ClientId"));
        let units = [Unit::new("a.cs").with_struct(nt_tib()).with_struct(client_id()).with_struct(teb)];
        let flat = flatten_in(&units, "TEB", FlattenOptions::x64()).unwrap();

        assert_eq!(offset_of(&flat, "Tib_ExceptionList"), 0);
        assert_eq!(offset_of(&flat, "Tib_Version"), 32);
        assert_eq!(offset_of(&flat, "EnvironmentPointer"), 0x38);
        assert_eq!(offset_of(&flat, "ClientId_UniqueProcess"), 0x40);
        assert_eq!(offset_of(&flat, "ClientId_UniqueThread"), 0x48);
        assert_eq!(flat.layout.size, 0x50);

        let reference = flat.member("ClientId_Ref").unwrap();
        assert_eq!(reference.role, MemberRole::NestedAccessor);
        assert_eq!(reference.base_field.as_deref(), Some("ClientId_UniqueProcess"));
        assert_eq!(reference.type_ref, ty("CLIENT_ID"));

        let names: Vec<&str> = flat.members.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(&names[..3], &["Tib_ExceptionList", "Tib_Ref", "Tib_StackBase"]);
    }

    #[test]
    fn test_nested_struct_behind_start_field() {
        let teb = StructDecl::new("TEB")
            .with_field(field("int", "LastErrorValue"))
            .with_field(field("CLIENT_ID", "ClientId"));
        let units = [Unit::new("a.cs").with_struct(client_id()).with_struct(teb)];
        let options = FlattenOptions::x64().with_inline_nested_structs(false);
        let flat = flatten_in(&units, "TEB", options).unwrap();

        let start = flat.member("ClientId_Start").unwrap();
        assert_eq!(start.offset, 8);
        assert_eq!(start.size, 16);
        assert_eq!(start.type_ref, ty("IntPtr"));
        assert_eq!(flat.member("ClientId_Ref").unwrap().base_field.as_deref(), Some("ClientId_Start"));
        assert!(flat.member("ClientId_UniqueThread").is_none());
        assert_eq!(flat.layout.size, 24);
    }

    #[test]
    fn test_anonymous_inlined_even_without_inlining() {
        let options = FlattenOptions::x64().with_inline_nested_structs(false);
        let flat = flatten_one(nt_tib(), options).unwrap();
        assert_eq!(offset_of(&flat, "FiberData"), 32);
    }

    #[test]
    fn test_union_of_struct_members() {
        let decl = StructDecl::new("U")
            .with_markers(union())
            .with_field(field("int", "status"))
            .with_field(field("CLIENT_ID", "ids"));
        let units = [Unit::new("a.cs").with_struct(client_id()).with_struct(decl)];
        let flat = flatten_in(&units, "U", FlattenOptions::x86()).unwrap();
        assert_eq!(offset_of(&flat, "status"), 0);
        assert_eq!(offset_of(&flat, "ids_UniqueProcess"), 0);
        assert_eq!(offset_of(&flat, "ids_UniqueThread"), 4);
        assert_eq!(flat.layout.size, 8);
    }

    #[test]
    fn test_explicit_container_translates_anonymous_child() {
        let decl = StructDecl::new("S")
            .with_layout(LayoutAttr::explicit())
            .with_member(Member::Struct(
                StructDecl::new("Inner")
                    .with_markers(anonymous_union())
                    .with_field(field("short", "lo"))
                    .with_field(field("int", "dword")),
            ))
            .with_field(field("int", "tag").with_offset(0))
            .with_field(field("Inner", "u").with_offset(8));
        let flat = flatten_one(decl, FlattenOptions::x64()).unwrap();
        assert_eq!(offset_of(&flat, "lo"), 8);
        assert_eq!(offset_of(&flat, "dword"), 8);
        assert_eq!(flat.layout.size, 12);
    }

    #[test]
    fn test_offset_past_address_space() {
        let decl = StructDecl::new("S")
            .with_layout(LayoutAttr::explicit())
            .with_field(field("int", "a").with_offset(u32::MAX - 1));
        let err = flatten_one(decl, FlattenOptions::x64()).unwrap_err();
        assert!(matches!(err, LayoutError::InvalidLayout { parameter: "offset", .. }));

        let decl = StructDecl::new("S")
            .with_layout(LayoutAttr::explicit())
            .with_field(field("int", "a").with_offset(u32::MAX - 3));
        let err = flatten_one(decl, FlattenOptions::x64()).unwrap_err();
        assert!(matches!(err, LayoutError::InvalidLayout { parameter: "offset", value, .. } if value == u32::MAX - 3));
    }

    #[test]
    fn test_anonymous_member_name_clash() {
        let decl = StructDecl::new("S")
            .with_member(Member::Struct(
                StructDecl::new("Inner")
                    .with_markers(anonymous_union())
                    .with_field(field("int", "a")),
            ))
            .with_field(field("int", "a"))
            .with_field(field("Inner", "u").with_markers(Markers::none().with(MarkerKind::AnonymousStruct)));
        let err = flatten_one(decl, FlattenOptions::x64()).unwrap_err();
        assert!(matches!(
            err,
            LayoutError::DuplicateMember { structure, member } if structure == "S" && member == "a"
        ));
    }

    #[test]
    fn test_prefixed_name_clash() {
        let decl = StructDecl::new("S")
            .with_field(field("IntPtr", "ids_UniqueThread"))
            .with_field(field("CLIENT_ID", "ids"));
        let units = [Unit::new("a.cs").with_struct(client_id()).with_struct(decl)];
        let err = flatten_in(&units, "S", FlattenOptions::x86()).unwrap_err();
        assert!(matches!(err, LayoutError::DuplicateMember { member, .. } if member == "ids_UniqueThread"));
    }

    #[test]
    fn test_nested_struct_without_fields_reserves_space() {
        let empty = StructDecl::new("Reserved").with_layout(LayoutAttr::sequential().with_size(16));
        let decl = StructDecl::new("S")
            .with_field(field("int", "a"))
            .with_field(field("Reserved", "spare"))
            .with_field(field("int", "b"));
        let units = [Unit::new("a.cs").with_struct(empty).with_struct(decl)];

        for options in [FlattenOptions::x64(), FlattenOptions::x64().with_inline_nested_structs(false)] {
            let flat = flatten_in(&units, "S", options).unwrap();
            assert_eq!(offset_of(&flat, "b"), 20);
            assert_eq!(flat.layout.size, 24);
            assert!(flat.member("spare_Ref").is_none());
            assert!(flat.member("spare_Start").is_none());
            assert_eq!(flat.decl.fields().count(), 2);
        }
    }

    #[test]
    fn test_memoized_across_parents() {
        let first = StructDecl::new("A").with_field(field("CLIENT_ID", "id"));
        let second = StructDecl::new("B")
            .with_field(field("byte", "flag"))
            .with_field(field("CLIENT_ID", "id"));
        let units = [Unit::new("a.cs").with_struct(client_id()).with_struct(first).with_struct(second)];
        let index = DeclIndex::from_units(&units);
        let mut engine = LayoutEngine::new(&index, FlattenOptions::x86());

        let a = engine.flatten(&TypeKey::from("A")).unwrap();
        let b = engine.flatten(&TypeKey::from("B")).unwrap();
        assert_eq!(engine.computed(), 3);
        assert_eq!(a.layout.size, 8);
        assert_eq!(offset_of(&b, "id_UniqueProcess"), 4);

        let shared = engine.cache().peek(&TypeKey::from("CLIENT_ID")).unwrap().clone();
        let again = engine.flatten(&TypeKey::from("CLIENT_ID")).unwrap();
        assert!(Rc::ptr_eq(&shared, &again));
        assert_eq!(engine.computed(), 3);
    }

    #[test]
    fn test_reflatten_is_stable() {
        let teb = StructDecl::new("TEB")
            .with_field(field("NT_TIB", "Tib"))
            .with_field(field("short", "Flags"))
            .with_field(field("IntPtr", "TlsSlots").with_fixed_count(3))
            .with_field(field("byte", "Spare").with_fixed_count(5));
        let units = [Unit::new("a.cs").with_struct(nt_tib()).with_struct(teb)];
        let first = flatten_in(&units, "TEB", FlattenOptions::x64()).unwrap();

        let again = [Unit::new("b.cs").with_struct(first.decl.clone())];
        let second = flatten_in(&again, "TEB", FlattenOptions::x64()).unwrap();
        assert_eq!(first.layout, second.layout);
        for member in first.fields() {
            assert_eq!(offset_of(&second, &member.name), member.offset);
        }
    }

    #[test]
    fn test_grouped_declaration_split() {
        let decl = StructDecl::new("POINT").with_field(FieldDecl::grouped(ty("int"), &["x", "y"]));
        let flat = flatten_one(decl, FlattenOptions::x64()).unwrap();
        assert_eq!(offset_of(&flat, "x"), 0);
        assert_eq!(offset_of(&flat, "y"), 4);
        assert_eq!(flat.decl.fields().count(), 2);
        assert!(flat.decl.fields().all(|f| !f.is_grouped()));
    }

    #[test]
    fn test_grouped_fixed_buffer_not_implemented() {
        let decl = StructDecl::new("S")
            .with_field(FieldDecl::grouped(ty("byte"), &["a", "b"]).with_fixed_count(4));
        let err = flatten_one(decl, FlattenOptions::x64()).unwrap_err();
        assert!(matches!(err, LayoutError::NotImplemented(_)));
    }

    #[test]
    fn test_static_members_take_no_space() {
        let decl = StructDecl::new("S")
            .with_field(field("byte", "a"))
            .with_field(field("long", "Counter").with_static())
            .with_field(field("byte", "b"));
        let flat = flatten_one(decl, FlattenOptions::x64()).unwrap();
        assert_eq!(offset_of(&flat, "b"), 1);
        assert_eq!(flat.layout.size, 2);
        assert!(flat.member("Counter").is_none());
        assert_eq!(flat.decl.field("Counter").unwrap().offset, None);
    }

    #[test]
    fn test_self_pointer_and_value_cycle() {
        let list = StructDecl::new("LIST_ENTRY")
            .with_field(field("LIST_ENTRY*", "Flink"))
            .with_field(field("LIST_ENTRY*", "Blink"));
        assert_eq!(flatten_one(list, FlattenOptions::x86()).unwrap().layout.size, 8);

        let node = StructDecl::new("Node").with_field(field("Node", "next"));
        let err = flatten_one(node, FlattenOptions::x86()).unwrap_err();
        assert!(matches!(err, LayoutError::CyclicLayout(name) if name == "Node"));
    }

    #[test]
    fn test_unresolved_and_managed_members() {
        let decl = StructDecl::new("S").with_field(field("HANDLE", "h"));
        let err = flatten_one(decl, FlattenOptions::x64()).unwrap_err();
        assert!(matches!(err, LayoutError::UnresolvedType { .. }));

        let decl = StructDecl::new("S").with_field(field("string", "name"));
        let err = flatten_one(decl, FlattenOptions::x64()).unwrap_err();
        assert!(matches!(err, LayoutError::UnsupportedType(_)));
    }

    #[test]
    fn test_unexpanded_conditional_rejected() {
        let decl = StructDecl::new("S").with_member(Member::Conditional(ConditionalBlock {
            symbol: "X64".to_string(),
            members: vec![Member::Field(field("int", "a"))],
            else_members: Vec::new(),
        }));
        let err = flatten_one(decl, FlattenOptions::x64()).unwrap_err();
        assert!(matches!(err, LayoutError::NotImplemented(_)));
    }

    #[test]
    fn test_output_is_explicit_pack_one() {
        let flat = flatten_one(nt_tib(), FlattenOptions::x64()).unwrap();
        let layout = flat.decl.layout.unwrap();
        assert_eq!(layout, StructLayoutSpec::flattened_attr(56));
        assert!(flat.decl.markers.is_empty());
        assert!(flat.decl.fields().all(|f| f.offset.is_some()));
        assert!(flat.markers.flatten);
    }
}
