use crate::core::entities::EntityKind;
use crate::domain::model::{DedupKey, Entity, RawCandidate, StoreResult, StoredEntity};
use crate::utils::error::Result;
use async_trait::async_trait;

/// Produces the full candidate list in one call, or fails before yielding anything.
#[async_trait]
pub trait RecordSource: Send + Sync {
    fn describe(&self) -> String;

    async fn fetch(&self) -> Result<Vec<RawCandidate>>;
}

/// Table-level operations the importer needs from a relational store.
///
/// `ensure_schema` and the query methods return terminal errors; `exists` and
/// `insert` return per-record reasons so the engine can classify them.
#[async_trait]
pub trait Store<E: Entity>: Send + Sync {
    async fn ensure_schema(&self) -> Result<()>;

    async fn exists(&self, key: &DedupKey) -> StoreResult<bool>;

    async fn insert(&self, record: &E) -> StoreResult<StoredEntity<E>>;

    async fn query_all(&self) -> Result<Vec<StoredEntity<E>>>;

    async fn query_page(&self, limit: usize) -> Result<Vec<StoredEntity<E>>>;
}

pub trait ConfigProvider: Send + Sync {
    fn entity(&self) -> EntityKind;
    fn source_location(&self) -> &str;
    fn store_location(&self) -> &str;
    /// Empty means the entity's default key.
    fn key_fields(&self) -> &[String];
    fn display_limit(&self) -> Option<usize>;
}
