//! Tagging Entity
//!
//! Join record between a tag and the thing it describes. The tagged side is
//! polymorphic: a work, a bookmark or another tag.

use serde::{Deserialize, Serialize};

use super::entity::{DomainError, DomainResult, Entity};
use super::tag::TagId;

pub type WorkId = u32;
pub type BookmarkId = u32;
pub type TaggingId = u32;

/// Kind of entity on the tagged side, stored in `taggable_type`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaggableKind {
    Work,
    Bookmark,
    Tag,
}

impl TaggableKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaggableKind::Work => "Work",
            TaggableKind::Bookmark => "Bookmark",
            TaggableKind::Tag => "Tag",
        }
    }
}

/// Anything a tag can be attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "taggable_type", content = "taggable_id")]
pub enum Taggable {
    Work(WorkId),
    Bookmark(BookmarkId),
    Tag(TagId),
}

impl Taggable {
    pub fn kind(&self) -> TaggableKind {
        match self {
            Taggable::Work(_) => TaggableKind::Work,
            Taggable::Bookmark(_) => TaggableKind::Bookmark,
            Taggable::Tag(_) => TaggableKind::Tag,
        }
    }

    pub fn id(&self) -> u32 {
        match *self {
            Taggable::Work(id) | Taggable::Bookmark(id) | Taggable::Tag(id) => id,
        }
    }

    /// Rebuild from the stored `(taggable_type, taggable_id)` pair
    pub fn from_parts(taggable_type: &str, taggable_id: u32) -> DomainResult<Self> {
        match taggable_type {
            "Work" => Ok(Taggable::Work(taggable_id)),
            "Bookmark" => Ok(Taggable::Bookmark(taggable_id)),
            "Tag" => Ok(Taggable::Tag(taggable_id)),
            other => Err(DomainError::InvalidInput(format!(
                "unknown taggable type '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tagging {
    pub id: TaggingId,
    pub tag_id: TagId,
    #[serde(flatten)]
    pub taggable: Taggable,
}

impl Entity for Tagging {
    type Id = TaggingId;

    fn id(&self) -> Self::Id {
        self.id
    }

    fn is_persisted(&self) -> bool {
        self.id != 0
    }
}
