//! Tag Repository Module
//!
//! This module provides tag repository functionality split into specialized sub-modules:
//! - tag_repo: Core record operations and single-attribute writes
//! - tagging: Tag-taggable relationships
//! - scope: Composable query scopes
//! - wrangling: Canonical tags, synonyms and fandom backfill

mod tag_repo;
mod tagging;
mod scope;
mod wrangling;

pub use tag_repo::{TagField, TagRepository};
pub use scope::TagScope;

// Re-export all operation traits so they can be used by importing TagRepository
pub use tagging::TaggingOperations;
pub use wrangling::WranglingOperations;
