use crate::core::normalize::normalize;
use crate::core::summary::ImportSummary;
use crate::domain::model::{
    DedupKey, Entity, ImportOutcome, KeySelector, RawCandidate, StoreErrorReason,
};
use crate::domain::ports::Store;
use crate::utils::error::{EtlError, Result};
use std::marker::PhantomData;

/// Runs the normalize, check, insert sequence for every candidate of one pass.
///
/// The engine borrows the store for the duration of the pass; it never opens,
/// closes or caches a handle. Candidates are processed strictly in source order,
/// one at a time, so the first of several candidates sharing a key is the one
/// inserted.
pub struct ImportEngine<'a, E: Entity, S: Store<E>> {
    store: &'a S,
    key: &'a KeySelector,
    _entity: PhantomData<E>,
}

impl<'a, E: Entity, S: Store<E>> ImportEngine<'a, E, S> {
    pub fn new(store: &'a S, key: &'a KeySelector) -> Self {
        Self {
            store,
            key,
            _entity: PhantomData,
        }
    }

    /// Imports every candidate and returns the counts.
    ///
    /// Only an unusable store ends the pass early; rows inserted before that
    /// point stay committed.
    pub async fn import_all(&self, candidates: Vec<RawCandidate>) -> Result<ImportSummary> {
        tracing::info!(
            "Importing {} candidates into '{}' (key: {})",
            candidates.len(),
            E::TABLE,
            self.key.columns().join(",")
        );

        let mut summary = ImportSummary::new();
        for (index, raw) in candidates.iter().enumerate() {
            let position = index + 1;
            let outcome = match self.import_one(raw).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::error!(
                        "Aborting import at candidate #{}: {} ({} inserted before abort)",
                        position,
                        e,
                        summary.inserted()
                    );
                    return Err(e);
                }
            };

            match &outcome {
                ImportOutcome::Inserted { id } => {
                    tracing::debug!("#{} inserted with id {}", position, id)
                }
                ImportOutcome::SkippedDuplicate { key } => {
                    tracing::debug!("#{} skipped, {} already stored", position, key)
                }
                ImportOutcome::Rejected(reason) => {
                    tracing::warn!("#{} rejected: {}", position, reason)
                }
                ImportOutcome::StoreError(reason) => {
                    tracing::warn!("#{} not stored: {}", position, reason)
                }
            }
            summary.record(&outcome);
        }

        tracing::info!(
            "Import finished: {} inserted, {} duplicates, {} rejected, {} store errors",
            summary.inserted(),
            summary.skipped_duplicate(),
            summary.rejected(),
            summary.store_errors()
        );
        Ok(summary)
    }

    /// Classifies a single candidate. `Err` means the store itself is gone.
    pub async fn import_one(&self, raw: &RawCandidate) -> Result<ImportOutcome> {
        let record: E = match normalize(raw) {
            Ok(record) => record,
            Err(reason) => return Ok(ImportOutcome::Rejected(reason)),
        };

        let key = self.key.key_for(&record);
        match self.store.exists(&key).await {
            Ok(true) => return Ok(ImportOutcome::SkippedDuplicate { key }),
            Ok(false) => {}
            Err(reason) => return Self::store_failure(reason, key),
        }

        match self.store.insert(&record).await {
            Ok(stored) => Ok(ImportOutcome::Inserted { id: stored.id }),
            Err(StoreErrorReason::UniquenessViolation) => {
                // Another writer stored the key between the check and the insert.
                tracing::debug!("Constraint reported {} as already stored", key);
                Ok(ImportOutcome::SkippedDuplicate { key })
            }
            Err(reason) => Self::store_failure(reason, key),
        }
    }

    fn store_failure(reason: StoreErrorReason, key: DedupKey) -> Result<ImportOutcome> {
        match reason {
            StoreErrorReason::UniquenessViolation => Ok(ImportOutcome::SkippedDuplicate { key }),
            StoreErrorReason::Write(message) => Ok(ImportOutcome::StoreError(message)),
            StoreErrorReason::Unavailable(message) => Err(EtlError::StoreUnavailable { message }),
        }
    }
}
