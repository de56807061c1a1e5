// Fri Jan 16 2026 - Alex

use crate::syntax::{
    AccessorDecl, ClassDecl, EnumDecl, FieldDecl, Item, LayoutAttr, LayoutKind, Markers, Member,
    StructDecl, Unit,
};
use std::fmt::Write;

const INDENT: &str = "  ";

/// Renders a declaration tree back into host source text.
pub struct DeclPrinter {
    out: String,
    depth: usize,
}

impl DeclPrinter {
    pub fn new() -> Self {
        Self {
            out: String::new(),
            depth: 0,
        }
    }

    pub fn print_unit(mut self, unit: &Unit) -> String {
        for import in &unit.imports {
            self.line(&format!("using {};", import));
        }
        if !unit.imports.is_empty() {
            self.out.push('\n');
        }

        match &unit.namespace {
            Some(namespace) => {
                self.line(&format!("namespace {}", namespace));
                self.open();
                self.items(&unit.items);
                self.close("}");
            }
            None => self.items(&unit.items),
        }
        self.out
    }

    pub fn print_struct(mut self, decl: &StructDecl) -> String {
        self.struct_decl(decl);
        self.out
    }

    fn items(&mut self, items: &[Item]) {
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                self.out.push('\n');
            }
            match item {
                Item::Struct(decl) => self.struct_decl(decl),
                Item::Enum(decl) => self.enum_decl(decl),
                Item::Class(decl) => self.class_decl(decl),
                Item::Verbatim { text } => self.verbatim(text),
            }
        }
    }

    fn struct_decl(&mut self, decl: &StructDecl) {
        self.markers(&decl.markers);
        if let Some(layout) = &decl.layout {
            self.line(&format_layout(layout));
        }
        self.line(&format!("{}struct {}", prefix(&decl.modifiers), decl.name));
        self.open();
        for member in &decl.members {
            self.member(member, &decl.name);
        }
        self.close("}");
    }

    fn member(&mut self, member: &Member, container: &str) {
        match member {
            Member::Field(field) => self.field(field),
            Member::Accessor(accessor) => self.accessor(accessor, container),
            Member::Struct(nested) => self.struct_decl(nested),
            Member::Enum(decl) => self.enum_decl(decl),
            Member::Conditional(block) => {
                self.raw_line(&format!("#if {}", block.symbol));
                for m in &block.members {
                    self.member(m, container);
                }
                if !block.else_members.is_empty() {
                    self.raw_line("#else");
                    for m in &block.else_members {
                        self.member(m, container);
                    }
                }
                self.raw_line("#endif");
            }
            Member::Verbatim { text } => self.verbatim(text),
        }
    }

    fn field(&mut self, field: &FieldDecl) {
        self.markers(&field.markers);
        let mut text = String::new();
        if let Some(offset) = field.offset {
            let _ = write!(text, "[FieldOffset({})] ", offset);
        }
        text.push_str(&prefix(&field.modifiers));
        if field.is_static && !field.modifiers.iter().any(|m| m == "static") {
            text.push_str("static ");
        }
        if field.is_const && !field.modifiers.iter().any(|m| m == "const") {
            text.push_str("const ");
        }
        match field.fixed_count {
            Some(count) => {
                let _ = write!(text, "fixed {} {}[{}];", field.ty, field.names.join(", "), count);
            }
            None => {
                let _ = write!(text, "{} {};", field.ty, field.names.join(", "));
            }
        }
        self.line(&text);
    }

    fn accessor(&mut self, accessor: &AccessorDecl, container: &str) {
        let return_type = format!("{}*", accessor.pointee);
        self.line(&format!("{}{} {}", prefix(&accessor.modifiers), return_type, accessor.name));
        self.open();
        self.line("get");
        self.open();
        self.line(&format!("fixed ({}* __s = &this)", container));
        self.open();
        self.line(&format!("return ({})&__s->{};", return_type, accessor.base_field));
        self.close("}");
        self.close("}");
        self.close("}");
    }

    fn enum_decl(&mut self, decl: &EnumDecl) {
        let underlying = decl
            .underlying
            .as_ref()
            .map(|ty| format!(" : {}", ty))
            .unwrap_or_default();
        self.line(&format!("{}enum {}{}", prefix(&decl.modifiers), decl.name, underlying));
        self.open();
        for variant in &decl.variants {
            self.line(&format!("{},", variant));
        }
        self.close("}");
    }

    fn class_decl(&mut self, decl: &ClassDecl) {
        let base = decl.base.as_ref().map(|b| format!(" : {}", b)).unwrap_or_default();
        if decl.body.is_empty() {
            self.line(&format!("{}class {}{} {{ }}", prefix(&decl.modifiers), decl.name, base));
            return;
        }
        self.line(&format!("{}class {}{}", prefix(&decl.modifiers), decl.name, base));
        self.open();
        for text in &decl.body {
            self.verbatim(text);
        }
        self.close("}");
    }

    fn markers(&mut self, markers: &Markers) {
        if markers.is_empty() {
            return;
        }
        let names: Vec<&str> = markers.kinds().map(|k| k.attribute_name()).collect();
        self.line(&format!("[{}]", names.join(", ")));
    }

    fn verbatim(&mut self, text: &str) {
        for line in text.lines() {
            if line.trim().is_empty() {
                self.out.push('\n');
            } else {
                self.line(line);
            }
        }
    }

    fn open(&mut self) {
        self.line("{");
        self.depth += 1;
    }

    fn close(&mut self, text: &str) {
        self.depth = self.depth.saturating_sub(1);
        self.line(text);
    }

    fn line(&mut self, text: &str) {
        for _ in 0..self.depth {
            self.out.push_str(INDENT);
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn raw_line(&mut self, text: &str) {
        self.out.push_str(text);
        self.out.push('\n');
    }
}

impl Default for DeclPrinter {
    fn default() -> Self {
        Self::new()
    }
}

fn prefix(modifiers: &[String]) -> String {
    modifiers.iter().map(|m| format!("{} ", m)).collect()
}

fn format_layout(layout: &LayoutAttr) -> String {
    let kind = match layout.kind {
        LayoutKind::Sequential => "LayoutKind.Sequential",
        LayoutKind::Explicit => "LayoutKind.Explicit",
    };
    let mut text = format!("[StructLayout({}", kind);
    if let Some(pack) = layout.pack {
        let _ = write!(text, ", Pack = {}", pack);
    }
    if let Some(size) = layout.size {
        let _ = write!(text, ", Size = {}", size);
    }
    text.push_str(")]");
    text
}
