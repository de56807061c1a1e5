// Fri Jan 16 2026 - Alex

use crate::syntax::SyntaxError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LayoutError {
    #[error("Could not resolve member type {type_ref} (from {scope})")]
    UnresolvedType { type_ref: String, scope: String },
    #[error("Non-unmanaged or unsupported type: {0}")]
    UnsupportedType(String),
    #[error("Missing field offset from member in struct with explicit layout. Struct: {structure}, field: {member}")]
    MissingOffset { structure: String, member: String },
    #[error("Not implemented: {0}")]
    NotImplemented(String),
    #[error("Invalid value for {parameter} in layout of {structure}, got {value}")]
    InvalidLayout {
        structure: String,
        parameter: &'static str,
        value: u32,
    },
    #[error("Duplicate member {member} in flattened struct {structure}")]
    DuplicateMember { structure: String, member: String },
    #[error("Struct {0} contains itself by value")]
    CyclicLayout(String),
    #[error("Validation failed: {0}")]
    ValidationFailed(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Syntax error: {0}")]
    Syntax(#[from] SyntaxError),
}

pub type LayoutResult<T> = Result<T, LayoutError>;
