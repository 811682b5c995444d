//! Archive Tags
//!
//! Tag model for a fan-works archive.
//!
//! Layered architecture:
//! - domain: Tag and tagging entities, name validation, errors
//! - repository: SQLite-backed data access, query scopes and wrangling
//! - config / logging: explicit configuration and log setup

pub mod config;
pub mod domain;
pub mod logging;
pub mod repository;

pub use config::ArchiveConfig;
pub use domain::{DomainError, DomainResult, Tag, TagType, Taggable};
pub use repository::{
    init_db, DbState, Repository, ScopedRepository, TagField, TagRepository, TagScope,
    TaggingOperations, WranglingOperations,
};
