//! Tag Repository - Core Record Operations
//!
//! SQLite-backed implementation for Tag records.
//! Specialized operations are in separate modules:
//! - tagging: Tag-taggable relationships (works, bookmarks, tags)
//! - scope: Composable filtered queries
//! - wrangling: Canonical tags, synonyms and fandom backfill

use async_trait::async_trait;
use rusqlite::types::Value;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::config::ArchiveConfig;
use crate::domain::{
    normalize_name, DomainError, DomainResult, Entity, NameRules, Tag, TagId, TagType, Translate,
    Untranslated,
};
use super::super::db::DbState;
use super::super::traits::Repository;

/// Column list matching `row_to_tag`
pub(super) const TAG_COLUMNS: &str =
    "tags.id, tags.name, tags.type, tags.banned, tags.canonical, tags.canonical_id, tags.fandom_id, tags.taggings_count";

/// A single attribute written without running validations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagField {
    Banned(bool),
    Canonical(bool),
    CanonicalId(Option<TagId>),
    FandomId(Option<TagId>),
}

impl TagField {
    fn column(&self) -> &'static str {
        match self {
            TagField::Banned(_) => "banned",
            TagField::Canonical(_) => "canonical",
            TagField::CanonicalId(_) => "canonical_id",
            TagField::FandomId(_) => "fandom_id",
        }
    }

    fn value(&self) -> Value {
        match *self {
            TagField::Banned(flag) | TagField::Canonical(flag) => Value::Integer(flag as i64),
            TagField::CanonicalId(id) | TagField::FandomId(id) => {
                id.map_or(Value::Null, |id| Value::Integer(id as i64))
            }
        }
    }

    /// Mirror the write on an in-memory tag
    pub fn apply(&self, tag: &mut Tag) {
        match *self {
            TagField::Banned(flag) => tag.banned = flag,
            TagField::Canonical(flag) => tag.canonical = flag,
            TagField::CanonicalId(id) => tag.canonical_id = id,
            TagField::FandomId(id) => tag.fandom_id = id,
        }
    }
}

/// SQLite implementation of Tag repository
pub struct TagRepository {
    pub(super) conn: Arc<Mutex<Connection>>,
    rules: NameRules,
}

impl TagRepository {
    pub fn new(conn: Arc<Mutex<Connection>>, config: &ArchiveConfig) -> Self {
        Self {
            conn,
            rules: NameRules::new(config, Arc::new(Untranslated)),
        }
    }

    pub fn from_state(state: &DbState, config: &ArchiveConfig) -> Self {
        Self::new(state.connection(), config)
    }

    /// Use `translator` for validation messages
    pub fn with_translator(mut self, translator: Arc<dyn Translate>) -> Self {
        self.rules = self.rules.with_translator(translator);
        self
    }

    /// First tag with exactly this name, of any type
    pub async fn find_by_name(&self, name: &str) -> DomainResult<Option<Tag>> {
        let conn = self.conn.lock().await;
        let tag = conn
            .query_row(
                &format!("SELECT {} FROM tags WHERE tags.name = ?1 ORDER BY tags.id LIMIT 1", TAG_COLUMNS),
                params![name],
                row_to_tag,
            )
            .optional()?;
        Ok(tag)
    }

    pub async fn find_by_name_and_type(&self, name: &str, tag_type: TagType) -> DomainResult<Option<Tag>> {
        let conn = self.conn.lock().await;
        let tag = conn
            .query_row(
                &format!("SELECT {} FROM tags WHERE tags.name = ?1 AND tags.type = ?2", TAG_COLUMNS),
                params![name, tag_type],
                row_to_tag,
            )
            .optional()?;
        Ok(tag)
    }

    /// Existing tag of this name and type, or a newly created one
    pub async fn find_or_create_by_name(&self, name: &str, tag_type: TagType) -> DomainResult<Tag> {
        let name = normalize_name(name);
        if let Some(tag) = self.find_by_name_and_type(&name, tag_type).await? {
            return Ok(tag);
        }
        self.create(&Tag::new(name, tag_type)).await
    }

    /// Write one attribute, skipping validations
    pub async fn update_field(&self, id: TagId, field: TagField) -> DomainResult<()> {
        let conn = self.conn.lock().await;
        write_field(&conn, id, &field)
    }

    fn validate(&self, conn: &Connection, tag: &Tag) -> DomainResult<()> {
        let mut errors = self.rules.check(&tag.name);
        if !tag.name.is_empty() && name_taken(conn, &tag.name, tag.tag_type, tag.id)? {
            errors.add("name", self.rules.taken_message());
        }
        errors.into_result()?;
        Ok(())
    }
}

#[async_trait]
impl Repository<Tag> for TagRepository {
    async fn create(&self, entity: &Tag) -> DomainResult<Tag> {
        let mut tag = entity.clone();
        tag.id = 0;
        tag.name = normalize_name(&tag.name);

        let conn = self.conn.lock().await;
        self.validate(&conn, &tag)?;
        check_links(&conn, tag.id, tag.canonical_id, tag.fandom_id)?;

        let now = chrono::Utc::now().timestamp_millis();
        conn.execute(
            "INSERT INTO tags (name, type, banned, canonical, canonical_id, fandom_id, taggings_count, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
            params![
                tag.name,
                tag.tag_type,
                tag.banned,
                tag.canonical,
                tag.canonical_id,
                tag.fandom_id,
                tag.taggings_count,
                now,
            ],
        )?;

        tag.id = conn.last_insert_rowid() as TagId;
        log::debug!("Created {} tag '{}' ({})", tag.tag_type, tag.name, tag.id);
        Ok(tag)
    }

    async fn find_by_id(&self, id: TagId) -> DomainResult<Option<Tag>> {
        let conn = self.conn.lock().await;
        fetch_tag(&conn, id)
    }

    async fn list(&self) -> DomainResult<Vec<Tag>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(&format!("SELECT {} FROM tags ORDER BY tags.id", TAG_COLUMNS))?;
        let tags = stmt
            .query_map([], row_to_tag)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tags)
    }

    /// Saves every attribute except `taggings_count`, which only taggings maintain
    async fn update(&self, entity: &Tag) -> DomainResult<Tag> {
        if !entity.is_persisted() {
            return Err(DomainError::InvalidInput("cannot update a tag that was never saved".to_string()));
        }
        let mut tag = entity.clone();
        tag.name = normalize_name(&tag.name);

        let conn = self.conn.lock().await;
        self.validate(&conn, &tag)?;
        check_links(&conn, tag.id, tag.canonical_id, tag.fandom_id)?;

        let changed = conn.execute(
            "UPDATE tags SET name = ?1, type = ?2, banned = ?3, canonical = ?4, canonical_id = ?5,
                             fandom_id = ?6, updated_at = ?7
             WHERE id = ?8",
            params![
                tag.name,
                tag.tag_type,
                tag.banned,
                tag.canonical,
                tag.canonical_id,
                tag.fandom_id,
                chrono::Utc::now().timestamp_millis(),
                tag.id,
            ],
        )?;
        if changed == 0 {
            return Err(DomainError::NotFound(format!("tag {}", tag.id)));
        }

        fetch_tag(&conn, tag.id)?.ok_or_else(|| DomainError::NotFound(format!("tag {}", tag.id)))
    }
}

/// Convert a database row to Tag
pub(super) fn row_to_tag(row: &rusqlite::Row<'_>) -> rusqlite::Result<Tag> {
    Ok(Tag {
        id: row.get(0)?,
        name: row.get(1)?,
        tag_type: row.get(2)?,
        banned: row.get(3)?,
        canonical: row.get(4)?,
        canonical_id: row.get(5)?,
        fandom_id: row.get(6)?,
        taggings_count: row.get(7)?,
    })
}

pub(super) fn fetch_tag(conn: &Connection, id: TagId) -> DomainResult<Option<Tag>> {
    let tag = conn
        .query_row(
            &format!("SELECT {} FROM tags WHERE tags.id = ?1", TAG_COLUMNS),
            params![id],
            row_to_tag,
        )
        .optional()?;
    Ok(tag)
}

pub(super) fn write_field(conn: &Connection, id: TagId, field: &TagField) -> DomainResult<()> {
    match *field {
        TagField::CanonicalId(target) => check_links(conn, id, target, None)?,
        TagField::FandomId(target) => check_links(conn, id, None, target)?,
        TagField::Banned(_) | TagField::Canonical(_) => {}
    }
    let changed = conn.execute(
        &format!("UPDATE tags SET {} = ?1, updated_at = ?2 WHERE id = ?3", field.column()),
        params![field.value(), chrono::Utc::now().timestamp_millis(), id],
    )?;
    if changed == 0 {
        return Err(DomainError::NotFound(format!("tag {}", id)));
    }
    log::debug!("Tag {} {} updated", id, field.column());
    Ok(())
}

/// A tag may not redirect to itself, and linked tags must exist
fn check_links(
    conn: &Connection,
    id: TagId,
    canonical_id: Option<TagId>,
    fandom_id: Option<TagId>,
) -> DomainResult<()> {
    if id != 0 && canonical_id == Some(id) {
        return Err(DomainError::InvalidInput(format!("tag {} cannot redirect to itself", id)));
    }
    for linked in [canonical_id, fandom_id].into_iter().flatten() {
        if fetch_tag(conn, linked)?.is_none() {
            return Err(DomainError::NotFound(format!("tag {}", linked)));
        }
    }
    Ok(())
}

/// Whether another tag of the same type already uses `name`
fn name_taken(conn: &Connection, name: &str, tag_type: TagType, except: TagId) -> DomainResult<bool> {
    let found = conn
        .query_row(
            "SELECT 1 FROM tags WHERE name = ?1 AND type = ?2 AND id != ?3 LIMIT 1",
            params![name, tag_type, except],
            |_| Ok(()),
        )
        .optional()?;
    Ok(found.is_some())
}
