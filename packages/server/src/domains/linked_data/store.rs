use anyhow::Result;
use async_trait::async_trait;
use sqlx::PgPool;

use crate::domains::events::{Event, Tombstone};
use crate::domains::organizations::Organization;
use crate::domains::places::Place;

/// Read-only lookups behind the public dereferenceable pages
#[async_trait]
pub trait DirectoryStore: Send + Sync {
    async fn find_event(&self, ulid: &str) -> Result<Option<Event>>;
    async fn find_place(&self, ulid: &str) -> Result<Option<Place>>;
    async fn find_organization(&self, ulid: &str) -> Result<Option<Organization>>;
    async fn find_tombstone(&self, entity_type: &str, ulid: &str) -> Result<Option<Tombstone>>;
}

#[derive(Clone)]
pub struct PgDirectoryStore {
    pool: PgPool,
}

impl PgDirectoryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DirectoryStore for PgDirectoryStore {
    async fn find_event(&self, ulid: &str) -> Result<Option<Event>> {
        Event::find_by_ulid(ulid, &self.pool).await
    }

    async fn find_place(&self, ulid: &str) -> Result<Option<Place>> {
        Place::find_by_ulid(ulid, &self.pool).await
    }

    async fn find_organization(&self, ulid: &str) -> Result<Option<Organization>> {
        Organization::find_by_ulid(ulid, &self.pool).await
    }

    async fn find_tombstone(&self, entity_type: &str, ulid: &str) -> Result<Option<Tombstone>> {
        Tombstone::find_for_entity(entity_type, ulid, &self.pool).await
    }
}
