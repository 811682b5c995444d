//! Tag Entity
//!
//! Tags describe works, bookmarks and other tags. Wrangling groups synonymous
//! tags under a canonical one and attaches non-fandom tags to their fandom.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

use super::entity::{DomainError, Entity};

pub type TagId = u32;

/// Tag category, stored in the `type` column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TagType {
    Rating,
    Warning,
    Category,
    Media,
    Fandom,
    Pairing,
    Character,
    Genre,
    Freeform,
}

impl TagType {
    pub const ALL: [TagType; 9] = [
        TagType::Rating,
        TagType::Warning,
        TagType::Category,
        TagType::Media,
        TagType::Fandom,
        TagType::Pairing,
        TagType::Character,
        TagType::Genre,
        TagType::Freeform,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TagType::Rating => "Rating",
            TagType::Warning => "Warning",
            TagType::Category => "Category",
            TagType::Media => "Media",
            TagType::Fandom => "Fandom",
            TagType::Pairing => "Pairing",
            TagType::Character => "Character",
            TagType::Genre => "Genre",
            TagType::Freeform => "Freeform",
        }
    }
}

impl fmt::Display for TagType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TagType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TagType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| DomainError::InvalidInput(format!("unknown tag type '{}'", s)))
    }
}

impl ToSql for TagType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TagType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: DomainError| FromSqlError::Other(Box::new(e)))
    }
}

/// A tag and its wrangling state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    /// Unique identifier, 0 until stored
    pub id: TagId,
    pub name: String,
    #[serde(rename = "type")]
    pub tag_type: TagType,
    /// Excluded from normal listing and use
    pub banned: bool,
    /// Preferred form within its synonym group
    pub canonical: bool,
    /// Canonical tag this one redirects to
    pub canonical_id: Option<TagId>,
    /// Parent fandom for character, pairing and similar tags
    pub fandom_id: Option<TagId>,
    /// Denormalized number of taggings, used for popularity ordering
    pub taggings_count: u32,
}

impl Tag {
    pub fn new(name: impl Into<String>, tag_type: TagType) -> Self {
        Self {
            id: 0,
            name: name.into(),
            tag_type,
            banned: false,
            canonical: false,
            canonical_id: None,
            fandom_id: None,
            taggings_count: 0,
        }
    }

    /// Not banned, not canonical and not redirected: still awaiting wrangling
    pub fn is_unwrangled(&self) -> bool {
        !(self.banned || self.canonical || self.canonical_id.is_some())
    }

    pub fn is_synonym(&self) -> bool {
        self.canonical_id.is_some()
    }

    /// Case-insensitive name comparison
    pub fn cmp_by_name(&self, other: &Tag) -> Ordering {
        self.name.to_lowercase().cmp(&other.name.to_lowercase())
    }
}

impl Entity for Tag {
    type Id = TagId;

    fn id(&self) -> Self::Id {
        self.id
    }

    fn is_persisted(&self) -> bool {
        self.id != 0
    }
}

/// Sort tags by name, ignoring case
pub fn sort_by_name(tags: &mut [Tag]) {
    tags.sort_by(|a, b| a.cmp_by_name(b));
}
