//! Wrangling Operations
//!
//! Canonical tags, synonym redirects and fandom backfill.
//!
//! Turning a tag into a synonym moves every work tagged with it over to the
//! canonical tag. The redirect and the move happen in one transaction, so a
//! failure part way leaves every work where it was.

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};

use crate::domain::{
    DomainError, DomainResult, Entity, Tag, TagId, TagType, Taggable, TaggableKind, WorkId,
};
use super::super::traits::Repository;
use super::tag_repo::{fetch_tag, row_to_tag, write_field, TagField, TagRepository, TAG_COLUMNS};
use super::tagging::{delete_tagging, insert_tagging, taggable_ids, TaggingOperations};

/// Trait for tag wrangling operations
#[async_trait]
pub trait WranglingOperations {
    /// Find or create a tag of this name and type and mark it canonical
    async fn setup_canonical(&self, name: &str, tag_type: TagType) -> DomainResult<Tag>;

    /// Canonical tag this tag redirects to
    async fn synonym(&self, tag: &Tag) -> DomainResult<Option<Tag>>;

    /// Tags redirecting to this one
    async fn synonyms(&self, tag: &Tag) -> DomainResult<Vec<Tag>>;

    /// Redirect `tag` to `target` and move its works over.
    ///
    /// Returns false without changing anything when `target` is not canonical
    /// or is `tag` itself.
    async fn set_synonym(&self, tag: &mut Tag, target: &Tag) -> DomainResult<bool>;

    /// Move every work tagged with `tag` to its canonical tag.
    ///
    /// Returns false when `tag` has no resolvable canonical tag.
    async fn reassign_to_canonical(&self, tag: &Tag) -> DomainResult<bool>;

    /// Fandom this tag belongs to
    async fn fandom(&self, tag: &Tag) -> DomainResult<Option<Tag>>;

    /// Fill in a missing fandom from the first fandom of the tag's first work.
    ///
    /// Returns whether the fandom was set. Lookup failures count as "no fandom".
    async fn update_fandom(&self, tag: &mut Tag) -> DomainResult<bool>;

    /// First fandom tag attached to a work
    async fn first_fandom_of_work(&self, work_id: WorkId) -> DomainResult<Option<Tag>>;
}

#[async_trait]
impl WranglingOperations for TagRepository {
    async fn setup_canonical(&self, name: &str, tag_type: TagType) -> DomainResult<Tag> {
        let mut tag = self.find_or_create_by_name(name, tag_type).await?;
        if !tag.canonical {
            let field = TagField::Canonical(true);
            self.update_field(tag.id, field).await?;
            field.apply(&mut tag);
            log::info!("Tag '{}' ({}) is canonical", tag.name, tag.id);
        }
        Ok(tag)
    }

    async fn synonym(&self, tag: &Tag) -> DomainResult<Option<Tag>> {
        match tag.canonical_id {
            Some(id) => self.find_by_id(id).await,
            None => Ok(None),
        }
    }

    async fn synonyms(&self, tag: &Tag) -> DomainResult<Vec<Tag>> {
        if !tag.is_persisted() {
            return Ok(Vec::new());
        }
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM tags WHERE tags.canonical_id = ?1 ORDER BY tags.id",
            TAG_COLUMNS
        ))?;
        let tags = stmt
            .query_map(params![tag.id], row_to_tag)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tags)
    }

    async fn set_synonym(&self, tag: &mut Tag, target: &Tag) -> DomainResult<bool> {
        if !target.canonical {
            log::debug!("Refusing to redirect '{}' to non-canonical '{}'", tag.name, target.name);
            return Ok(false);
        }
        if !tag.is_persisted() {
            return Err(DomainError::InvalidInput(format!("tag '{}' has not been saved", tag.name)));
        }
        if target.id == tag.id {
            log::debug!("Refusing to redirect '{}' to itself", tag.name);
            return Ok(false);
        }

        let mut conn = self.conn.lock().await;
        match fetch_tag(&conn, target.id)? {
            Some(stored) if stored.canonical => {}
            Some(_) => return Ok(false),
            None => return Err(DomainError::NotFound(format!("tag {}", target.id))),
        }

        let tx = conn.transaction()?;
        write_field(&tx, tag.id, &TagField::CanonicalId(Some(target.id)))?;
        let moved = move_works(&tx, tag.id, target.id)?;
        tx.commit()?;

        tag.canonical_id = Some(target.id);
        log::info!(
            "Tag '{}' ({}) now redirects to '{}' ({}), {} works moved",
            tag.name, tag.id, target.name, target.id, moved
        );
        Ok(true)
    }

    async fn reassign_to_canonical(&self, tag: &Tag) -> DomainResult<bool> {
        let Some(canonical_id) = tag.canonical_id else {
            return Ok(false);
        };
        if canonical_id == tag.id {
            log::warn!("Tag {} redirects to itself, nothing to move", tag.id);
            return Ok(false);
        }

        let mut conn = self.conn.lock().await;
        if fetch_tag(&conn, canonical_id)?.is_none() {
            log::warn!("Tag {} redirects to missing tag {}", tag.id, canonical_id);
            return Ok(false);
        }

        let tx = conn.transaction()?;
        let moved = move_works(&tx, tag.id, canonical_id)?;
        tx.commit()?;

        log::info!("Moved {} works from tag {} to {}", moved, tag.id, canonical_id);
        Ok(true)
    }

    async fn fandom(&self, tag: &Tag) -> DomainResult<Option<Tag>> {
        match tag.fandom_id {
            Some(id) => self.find_by_id(id).await,
            None => Ok(None),
        }
    }

    async fn update_fandom(&self, tag: &mut Tag) -> DomainResult<bool> {
        if tag.fandom_id.is_some() {
            return Ok(false);
        }

        let fandom = match self.fandom_of_first_work(tag.id).await {
            Ok(fandom) => fandom,
            Err(e) => {
                log::warn!("Fandom lookup for tag {} failed, leaving it unset: {}", tag.id, e);
                None
            }
        };
        let Some(fandom) = fandom else {
            return Ok(false);
        };

        let field = TagField::FandomId(Some(fandom.id));
        self.update_field(tag.id, field).await?;
        field.apply(tag);
        Ok(true)
    }

    async fn first_fandom_of_work(&self, work_id: WorkId) -> DomainResult<Option<Tag>> {
        let conn = self.conn.lock().await;
        first_fandom(&conn, work_id)
    }
}

impl TagRepository {
    async fn fandom_of_first_work(&self, tag_id: TagId) -> DomainResult<Option<Tag>> {
        let works = self.works_for(tag_id).await?;
        match works.first() {
            Some(&work_id) => self.first_fandom_of_work(work_id).await,
            None => Ok(None),
        }
    }
}

/// Retag every work of `from` with `to`, then drop `from` from it
fn move_works(conn: &Connection, from: TagId, to: TagId) -> DomainResult<usize> {
    if from == to {
        return Ok(0);
    }
    let works = taggable_ids(conn, from, TaggableKind::Work)?;
    for &work_id in &works {
        insert_tagging(conn, to, Taggable::Work(work_id))?;
        delete_tagging(conn, from, Taggable::Work(work_id))?;
    }
    Ok(works.len())
}

fn first_fandom(conn: &Connection, work_id: WorkId) -> DomainResult<Option<Tag>> {
    let tag = conn
        .query_row(
            &format!(
                "SELECT {} FROM tags
                 JOIN taggings ON tags.id = taggings.tag_id
                 WHERE taggings.taggable_type = 'Work' AND taggings.taggable_id = ?1 AND tags.type = ?2
                 ORDER BY taggings.id
                 LIMIT 1",
                TAG_COLUMNS
            ),
            params![work_id, TagType::Fandom],
            row_to_tag,
        )
        .optional()?;
    Ok(tag)
}
