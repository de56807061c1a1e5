// Fri Jan 16 2026 - Alex

pub mod accessor;
pub mod alignment;
pub mod cache;
pub mod emitter;
pub mod engine;
pub mod error;
pub mod layout;
pub mod member;
pub mod pass;
pub mod resolver;
pub mod rewrite;
pub mod serializer;
pub mod size;
pub mod type_info;
pub mod validator;

pub use alignment::Alignment;
pub use cache::{FlattenCache, FlattenedStruct};
pub use engine::{FlattenOptions, LayoutEngine};
pub use error::{LayoutError, LayoutResult};
pub use layout::{FlattenedLayout, StructLayoutSpec, DEFAULT_PACK};
pub use member::{MemberDescriptor, MemberRole};
pub use pass::{FlattenPass, PassOutput};
pub use resolver::{DeclIndex, Resolver};
pub use rewrite::Rewriter;
pub use serializer::{SerializableField, SerializableLayout};
pub use size::TypeSize;
pub use type_info::{PrimitiveKind, SemanticType, TypeKey};
pub use validator::LayoutValidator;
