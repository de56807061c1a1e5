// Fri Jan 16 2026 - Alex

pub mod config;
pub mod structure;
pub mod syntax;
pub mod ui;


pub use config::{Config, OutputFormat, Target};
pub use structure::{FlattenOptions, FlattenPass, FlattenedStruct, LayoutEngine, LayoutError, PassOutput};
pub use syntax::{DeclPrinter, StructDecl, Unit};
