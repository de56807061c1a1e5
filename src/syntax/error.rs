// Fri Jan 16 2026 - Alex

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyntaxError {
    #[error("Malformed type reference: {0:?}")]
    MalformedTypeRef(String),
    #[error("Unknown intent marker: {0}")]
    UnknownMarker(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    ParseError(#[from] serde_json::Error),
}
