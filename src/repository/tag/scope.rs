//! Tag Scopes
//!
//! Composable, read-only filters over the stored tags. Filters are ANDed
//! together; orders apply in the order they were added, ties broken by id.

use async_trait::async_trait;
use rusqlite::params_from_iter;
use rusqlite::types::Value;

use crate::domain::{DomainResult, Tag, TagId, TagType, WorkId};
use super::super::traits::ScopedRepository;
use super::tag_repo::{row_to_tag, TagRepository, TAG_COLUMNS};

#[derive(Debug, Clone, PartialEq, Eq)]
enum TagFilter {
    ByFandom(Vec<TagId>),
    Banned(bool),
    Canonical,
    Unwrangled,
    ByCategory(Vec<TagType>),
    OnWorks(Vec<WorkId>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TagOrder {
    Popularity,
    Name,
}

/// A filtered, ordered view of the tag collection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagScope {
    filters: Vec<TagFilter>,
    orders: Vec<TagOrder>,
}

/// SQL fragments and their positional parameters
#[derive(Debug)]
pub(super) struct CompiledScope {
    pub where_clause: String,
    pub order_clause: String,
    pub params: Vec<Value>,
}

impl TagScope {
    /// Every tag
    pub fn all() -> Self {
        Self::default()
    }

    /// Tags whose fandom is one of `fandoms`
    pub fn by_fandom(self, fandoms: &[Tag]) -> Self {
        self.by_fandom_ids(fandoms.iter().map(|f| f.id))
    }

    pub fn by_fandom_ids(mut self, ids: impl IntoIterator<Item = TagId>) -> Self {
        self.filters.push(TagFilter::ByFandom(ids.into_iter().collect()));
        self
    }

    /// Tags that are not banned
    pub fn valid(mut self) -> Self {
        self.filters.push(TagFilter::Banned(false));
        self
    }

    pub fn banned(mut self) -> Self {
        self.filters.push(TagFilter::Banned(true));
        self
    }

    pub fn canonical(mut self) -> Self {
        self.filters.push(TagFilter::Canonical);
        self
    }

    /// Most taggings first
    pub fn by_popularity(mut self) -> Self {
        self.orders.push(TagOrder::Popularity);
        self
    }

    /// Ascending by name, case-sensitive
    pub fn ordered_by_name(mut self) -> Self {
        self.orders.push(TagOrder::Name);
        self
    }

    /// Not banned, not canonical and without a canonical redirect
    pub fn unwrangled(mut self) -> Self {
        self.filters.push(TagFilter::Unwrangled);
        self
    }

    pub fn by_category(mut self, types: &[TagType]) -> Self {
        self.filters.push(TagFilter::ByCategory(types.to_vec()));
        self
    }

    /// Distinct tags attached to any of `works`
    pub fn on_works(mut self, works: &[WorkId]) -> Self {
        self.filters.push(TagFilter::OnWorks(works.to_vec()));
        self
    }

    pub(super) fn compile(&self) -> CompiledScope {
        let mut conditions = Vec::with_capacity(self.filters.len());
        let mut params = Vec::new();

        for filter in &self.filters {
            let condition = match filter {
                TagFilter::ByFandom(ids) => {
                    in_list("tags.fandom_id", ids.iter().map(|id| Value::Integer(*id as i64)), &mut params)
                }
                TagFilter::Banned(flag) => {
                    params.push(Value::Integer(*flag as i64));
                    "tags.banned = ?".to_string()
                }
                TagFilter::Canonical => "tags.canonical = 1".to_string(),
                TagFilter::Unwrangled => {
                    "tags.banned = 0 AND tags.canonical = 0 AND tags.canonical_id IS NULL".to_string()
                }
                TagFilter::ByCategory(types) => in_list(
                    "tags.type",
                    types.iter().map(|t| Value::Text(t.as_str().to_string())),
                    &mut params,
                ),
                TagFilter::OnWorks(works) => {
                    let works = in_list(
                        "taggings.taggable_id",
                        works.iter().map(|id| Value::Integer(*id as i64)),
                        &mut params,
                    );
                    format!(
                        "tags.id IN (SELECT taggings.tag_id FROM taggings
                                     WHERE taggings.taggable_type = 'Work' AND {})",
                        works
                    )
                }
            };
            conditions.push(format!("({})", condition));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let mut orders: Vec<&str> = self
            .orders
            .iter()
            .map(|order| match order {
                TagOrder::Popularity => "tags.taggings_count DESC",
                TagOrder::Name => "tags.name ASC",
            })
            .collect();
        orders.push("tags.id ASC");

        CompiledScope {
            where_clause,
            order_clause: format!("ORDER BY {}", orders.join(", ")),
            params,
        }
    }
}

/// `column IN (?, ...)`, or a condition matching nothing for an empty list
fn in_list(column: &str, values: impl Iterator<Item = Value>, params: &mut Vec<Value>) -> String {
    let before = params.len();
    params.extend(values);
    let count = params.len() - before;
    if count == 0 {
        return "0".to_string();
    }
    format!("{} IN ({})", column, vec!["?"; count].join(", "))
}

#[async_trait]
impl ScopedRepository<Tag> for TagRepository {
    type Scope = TagScope;

    async fn scoped(&self, scope: &TagScope) -> DomainResult<Vec<Tag>> {
        let compiled = scope.compile();
        let sql = format!(
            "SELECT {} FROM tags {} {}",
            TAG_COLUMNS, compiled.where_clause, compiled.order_clause
        );

        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(&sql)?;
        let tags = stmt
            .query_map(params_from_iter(compiled.params.iter()), row_to_tag)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tags)
    }

    async fn count(&self, scope: &TagScope) -> DomainResult<usize> {
        let compiled = scope.compile();
        let sql = format!("SELECT COUNT(*) FROM tags {}", compiled.where_clause);

        let conn = self.conn.lock().await;
        let count: i64 = conn.query_row(&sql, params_from_iter(compiled.params.iter()), |row| row.get(0))?;
        Ok(count as usize)
    }
}
