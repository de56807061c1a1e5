// Fri Jan 16 2026 - Alex

use crate::structure::{FlattenedStruct, LayoutResult, MemberRole};
use crate::syntax::SyntaxError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializableLayout {
    pub name: String,
    pub size: u32,
    pub alignment: u32,
    pub fields: Vec<SerializableField>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializableField {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub offset: u32,
    pub size: u32,
    pub role: MemberRole,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_field: Option<String>,
}

impl From<&FlattenedStruct> for SerializableLayout {
    fn from(flat: &FlattenedStruct) -> Self {
        Self {
            name: flat.key.to_string(),
            size: flat.layout.size,
            alignment: flat.layout.largest_member_alignment,
            fields: flat
                .members
                .iter()
                .map(|m| SerializableField {
                    name: m.name.clone(),
                    type_name: m.type_ref.to_string(),
                    offset: m.offset,
                    size: m.size,
                    role: m.role,
                    count: m.fixed_count,
                    base_field: m.base_field.clone(),
                })
                .collect(),
        }
    }
}

pub fn report_json(layouts: &[SerializableLayout], pretty: bool) -> LayoutResult<String> {
    let text = if pretty {
        serde_json::to_string_pretty(layouts)
    } else {
        serde_json::to_string(layouts)
    };
    Ok(text.map_err(SyntaxError::from)?)
}

pub fn write_report<P: AsRef<Path>>(path: P, layouts: &[SerializableLayout], pretty: bool) -> LayoutResult<()> {
    fs::write(path.as_ref(), report_json(layouts, pretty)?)?;
    Ok(())
}
