//! Repository Layer
//!
//! Data access abstractions and their SQLite implementations.

mod traits;
mod db;
pub mod tag;

#[cfg(test)]
mod tests;

pub use traits::{Repository, ScopedRepository};
pub use db::{init_db, DbState};
pub use tag::{TagField, TagRepository, TagScope, TaggingOperations, WranglingOperations};
