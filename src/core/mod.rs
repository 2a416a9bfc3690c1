pub mod entities;
pub mod etl;
pub mod normalize;
pub mod summary;

pub use crate::domain::model::{
    DedupKey, Entity, ImportOutcome, KeySelector, OutcomeKind, RawCandidate, RejectReason,
    StoreErrorReason, StoredEntity,
};
pub use crate::domain::ports::{ConfigProvider, RecordSource, Store};
pub use crate::utils::error::Result;
