mod draft;
mod field;
pub mod rule;
pub mod sdl;
mod validate;

pub use draft::CollectionDraft;
pub use field::{FieldDefinition, FieldPatch, FieldType, UnknownFieldType};
pub use rule::{CollectionSchema, Rule, SchemaLevel, build_schema};
pub use sdl::render_sdl;
pub use validate::{ValidationError, validate_draft};
