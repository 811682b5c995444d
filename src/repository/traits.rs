//! Repository Layer - Core Traits
//!
//! Defines the abstract interfaces for data access.

use async_trait::async_trait;
use crate::domain::{Entity, DomainResult};

/// Core repository trait for record operations
///
/// Generic over any Entity type. Records are never deleted through this layer.
#[async_trait]
pub trait Repository<T: Entity>: Send + Sync {
    /// Validate and insert a new entity, returning it with its assigned ID
    async fn create(&self, entity: &T) -> DomainResult<T>;

    /// Find entity by ID
    async fn find_by_id(&self, id: T::Id) -> DomainResult<Option<T>>;

    /// List all entities
    async fn list(&self) -> DomainResult<Vec<T>>;

    /// Validate and save every attribute of an existing entity
    async fn update(&self, entity: &T) -> DomainResult<T>;
}

/// Extension for repositories that answer composable filtered queries
#[async_trait]
pub trait ScopedRepository<T: Entity>: Repository<T> {
    type Scope: Send + Sync;

    /// Entities matching every filter of the scope, in its order
    async fn scoped(&self, scope: &Self::Scope) -> DomainResult<Vec<T>>;

    /// Number of entities matching the scope
    async fn count(&self, scope: &Self::Scope) -> DomainResult<usize>;
}
