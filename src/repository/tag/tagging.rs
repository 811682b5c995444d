//! Tagging Operations
//!
//! Operations for the polymorphic relationship between tags and the works,
//! bookmarks and tags they describe. Adding and removing taggings keeps the
//! tag's `taggings_count` in step.

use async_trait::async_trait;
use rusqlite::{params, Connection};

use crate::domain::{
    BookmarkId, DomainError, DomainResult, Tag, TagId, Taggable, TaggableKind, Tagging, WorkId,
};
use super::tag_repo::{fetch_tag, row_to_tag, TAG_COLUMNS};

/// Trait for tag-taggable relationship operations
#[async_trait]
pub trait TaggingOperations {
    /// Attach a tag. Returns false when it was already attached.
    async fn add_tagging(&self, tag_id: TagId, taggable: Taggable) -> DomainResult<bool>;

    /// Detach a tag. Returns false when it was not attached.
    async fn remove_tagging(&self, tag_id: TagId, taggable: Taggable) -> DomainResult<bool>;

    /// Tags attached to a taggable, in the order they were attached
    async fn tags_on(&self, taggable: Taggable) -> DomainResult<Vec<Tag>>;

    /// Every tagging of a tag
    async fn taggings_for(&self, tag_id: TagId) -> DomainResult<Vec<Tagging>>;

    /// Works carrying a tag
    async fn works_for(&self, tag_id: TagId) -> DomainResult<Vec<WorkId>>;

    /// Bookmarks carrying a tag
    async fn bookmarks_for(&self, tag_id: TagId) -> DomainResult<Vec<BookmarkId>>;

    /// Tags that are themselves tagged with a tag
    async fn tags_for(&self, tag_id: TagId) -> DomainResult<Vec<Tag>>;
}

#[async_trait]
impl TaggingOperations for super::tag_repo::TagRepository {
    async fn add_tagging(&self, tag_id: TagId, taggable: Taggable) -> DomainResult<bool> {
        let conn = self.conn.lock().await;
        if fetch_tag(&conn, tag_id)?.is_none() {
            return Err(DomainError::NotFound(format!("tag {}", tag_id)));
        }
        insert_tagging(&conn, tag_id, taggable)
    }

    async fn remove_tagging(&self, tag_id: TagId, taggable: Taggable) -> DomainResult<bool> {
        let conn = self.conn.lock().await;
        delete_tagging(&conn, tag_id, taggable)
    }

    async fn tags_on(&self, taggable: Taggable) -> DomainResult<Vec<Tag>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM tags
             JOIN taggings ON tags.id = taggings.tag_id
             WHERE taggings.taggable_type = ?1 AND taggings.taggable_id = ?2
             ORDER BY taggings.id",
            TAG_COLUMNS
        ))?;
        let tags = stmt
            .query_map(params![taggable.kind().as_str(), taggable.id()], row_to_tag)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tags)
    }

    async fn taggings_for(&self, tag_id: TagId) -> DomainResult<Vec<Tagging>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(
            "SELECT id, tag_id, taggable_type, taggable_id FROM taggings WHERE tag_id = ?1 ORDER BY id",
        )?;
        let rows = stmt
            .query_map(params![tag_id], |row| {
                Ok((
                    row.get::<_, u32>(0)?,
                    row.get::<_, TagId>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, u32>(3)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(id, tag_id, taggable_type, taggable_id)| {
                Ok(Tagging {
                    id,
                    tag_id,
                    taggable: Taggable::from_parts(&taggable_type, taggable_id)?,
                })
            })
            .collect()
    }

    async fn works_for(&self, tag_id: TagId) -> DomainResult<Vec<WorkId>> {
        let conn = self.conn.lock().await;
        taggable_ids(&conn, tag_id, TaggableKind::Work)
    }

    async fn bookmarks_for(&self, tag_id: TagId) -> DomainResult<Vec<BookmarkId>> {
        let conn = self.conn.lock().await;
        taggable_ids(&conn, tag_id, TaggableKind::Bookmark)
    }

    async fn tags_for(&self, tag_id: TagId) -> DomainResult<Vec<Tag>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM tags
             JOIN taggings ON tags.id = taggings.taggable_id AND taggings.taggable_type = 'Tag'
             WHERE taggings.tag_id = ?1
             ORDER BY taggings.id",
            TAG_COLUMNS
        ))?;
        let tags = stmt
            .query_map(params![tag_id], row_to_tag)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tags)
    }
}

/// Insert a tagging if missing and bump the counter
pub(super) fn insert_tagging(conn: &Connection, tag_id: TagId, taggable: Taggable) -> DomainResult<bool> {
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO taggings (tag_id, taggable_type, taggable_id) VALUES (?1, ?2, ?3)",
        params![tag_id, taggable.kind().as_str(), taggable.id()],
    )?;
    if inserted == 0 {
        return Ok(false);
    }
    conn.execute(
        "UPDATE tags SET taggings_count = taggings_count + 1 WHERE id = ?1",
        params![tag_id],
    )?;
    Ok(true)
}

/// Delete a tagging if present and lower the counter
pub(super) fn delete_tagging(conn: &Connection, tag_id: TagId, taggable: Taggable) -> DomainResult<bool> {
    let deleted = conn.execute(
        "DELETE FROM taggings WHERE tag_id = ?1 AND taggable_type = ?2 AND taggable_id = ?3",
        params![tag_id, taggable.kind().as_str(), taggable.id()],
    )?;
    if deleted == 0 {
        return Ok(false);
    }
    conn.execute(
        "UPDATE tags SET taggings_count = MAX(taggings_count - 1, 0) WHERE id = ?1",
        params![tag_id],
    )?;
    Ok(true)
}

pub(super) fn taggable_ids(conn: &Connection, tag_id: TagId, kind: TaggableKind) -> DomainResult<Vec<u32>> {
    let mut stmt = conn.prepare(
        "SELECT taggable_id FROM taggings WHERE tag_id = ?1 AND taggable_type = ?2 ORDER BY id",
    )?;
    let ids = stmt
        .query_map(params![tag_id, kind.as_str()], |row| row.get(0))?
        .collect::<Result<Vec<u32>, _>>()?;
    Ok(ids)
}
