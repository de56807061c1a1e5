// Fri Jan 16 2026 - Alex

use crate::structure::{FlattenedStruct, MemberDescriptor, MemberRole};
use colored::*;

const HEADERS: [&str; 5] = ["Offset", "Size", "Name", "Type", "Role"];
/// Offset and Size are right-aligned.
const RIGHT_ALIGNED: [bool; 5] = [true, true, false, false, false];

/// Member table of one flattened struct.
pub struct LayoutTable {
    rows: Vec<[String; 5]>,
    widths: [usize; 5],
    use_color: bool,
}

impl LayoutTable {
    pub fn new(flat: &FlattenedStruct, with_accessors: bool) -> Self {
        let mut table = Self {
            rows: Vec::new(),
            widths: HEADERS.map(str::len),
            use_color: true,
        };
        for member in flat.members.iter().filter(|m| with_accessors || !m.is_accessor()) {
            table.push(member);
        }
        table
    }

    pub fn with_color(mut self, use_color: bool) -> Self {
        self.use_color = use_color;
        self
    }

    fn push(&mut self, member: &MemberDescriptor) {
        let type_name = match member.fixed_count {
            Some(count) => format!("{}[{}]", member.type_ref, count),
            None if member.is_accessor() => format!("{}*", member.type_ref),
            None => member.type_ref.to_string(),
        };
        let row = [
            format!("0x{:x}", member.offset),
            member.size.to_string(),
            member.name.clone(),
            type_name,
            role_label(member.role).to_string(),
        ];
        for (width, cell) in self.widths.iter_mut().zip(&row) {
            *width = (*width).max(cell.len());
        }
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn build(&self) -> String {
        let mut lines = Vec::with_capacity(self.rows.len() + 4);
        let border = self.border();

        lines.push(border.clone());
        let header = HEADERS.map(str::to_string);
        lines.push(self.row(&header, true));
        lines.push(border.clone());
        for row in &self.rows {
            lines.push(self.row(row, false));
        }
        lines.push(border);
        lines.join("\n")
    }

    fn border(&self) -> String {
        let segments: Vec<String> = self.widths.iter().map(|w| "-".repeat(w + 2)).collect();
        format!("+{}+", segments.join("+"))
    }

    fn row(&self, cells: &[String; 5], is_header: bool) -> String {
        let mut out = String::from("|");
        for (i, cell) in cells.iter().enumerate() {
            let width = self.widths[i];
            let aligned = if RIGHT_ALIGNED[i] {
                format!("{:>width$}", cell, width = width)
            } else {
                format!("{:<width$}", cell, width = width)
            };
            let formatted = if !self.use_color {
                aligned
            } else if is_header {
                aligned.cyan().bold().to_string()
            } else if i == 2 && cells[4] != role_label(MemberRole::Plain) {
                aligned.yellow().to_string()
            } else {
                aligned
            };
            out.push(' ');
            out.push_str(&formatted);
            out.push_str(" |");
        }
        out
    }
}

fn role_label(role: MemberRole) -> &'static str {
    match role {
        MemberRole::Plain => "plain",
        MemberRole::UnionMember => "union",
        MemberRole::AnonymousInlined => "anonymous",
        MemberRole::Promoted => "promoted",
        MemberRole::BufferStart => "buffer start",
        MemberRole::BufferAccessor => "buffer accessor",
        MemberRole::NestedStart => "nested start",
        MemberRole::NestedAccessor => "nested accessor",
    }
}
