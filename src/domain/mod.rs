//! Domain Layer
//!
//! Contains the tag entities, name validation and the shared error type.
//! Storage concerns live in the repository layer.

mod entity;
mod tag;
mod tagging;
pub mod validation;

pub use entity::{Entity, DomainError, DomainResult};
pub use tag::{sort_by_name, Tag, TagId, TagType};
pub use tagging::{BookmarkId, Taggable, TaggableKind, Tagging, TaggingId, WorkId};
pub use validation::{normalize_name, MessageCatalog, NameRules, Translate, Untranslated, ValidationErrors};
