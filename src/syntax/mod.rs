// Fri Jan 16 2026 - Alex

pub mod decl;
pub mod error;
pub mod markers;
pub mod preprocess;
pub mod printer;
pub mod type_ref;

pub use decl::{
    AccessorDecl, ClassDecl, ConditionalBlock, EnumDecl, FieldDecl, Item, LayoutAttr, LayoutKind,
    Member, StructDecl, Unit,
};
pub use error::SyntaxError;
pub use markers::{is_marker_declaration, MarkerKind, Markers};
pub use preprocess::preprocess;
pub use printer::DeclPrinter;
pub use type_ref::TypeRef;
