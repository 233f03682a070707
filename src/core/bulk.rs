//! Best-effort batch primitives shared by the association services.
//!
//! A batch is accepted or rejected as a whole only for its size. After that, every item
//! ends up as exactly one [`ItemOutcome`], in input order. Item-level errors (see
//! [`Error::is_item_failure`]) become [`BulkFailure`] records; anything else aborts the
//! call and is returned to the caller.

use crate::{
    entities::EntityType,
    errors::{Error, Result},
};
use serde::Serialize;
use tracing::warn;

/// Largest batch any bulk operation accepts.
pub const MAX_BATCH_SIZE: usize = 100;

/// Rejects empty batches and batches over [`MAX_BATCH_SIZE`].
pub fn validate_batch_size(size: usize) -> Result<()> {
    if size == 0 || size > MAX_BATCH_SIZE {
        return Err(Error::InvalidBatchSize {
            size,
            max: MAX_BATCH_SIZE,
        });
    }
    Ok(())
}

/// Why one batch item was not applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BulkFailure {
    /// Entity id for association items, association id for update/remove items
    pub id: i64,
    /// Target entity kind, when the item names one
    #[serde(rename = "type")]
    pub entity_type: Option<EntityType>,
    /// Human-readable reason
    pub error: String,
}

/// Result of a single batch item.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemOutcome<T> {
    /// Applied; carries what was written
    Succeeded(T),
    /// Skipped, with the reason
    Failed(BulkFailure),
}

/// Per-item outcomes of a bulk call, in input order.
#[derive(Debug, Clone)]
pub struct BulkOutcome<T> {
    outcomes: Vec<ItemOutcome<T>>,
}

/// Counts and failures of a finished bulk call, ready to hand to a transport layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BulkSummary {
    /// Items applied
    pub success_count: usize,
    /// Items skipped
    pub failed_count: usize,
    /// Items submitted
    pub total_count: usize,
    /// One record per skipped item, in input order
    pub failures: Vec<BulkFailure>,
}

impl<T> BulkOutcome<T> {
    /// Empty outcome sized for `capacity` items.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            outcomes: Vec::with_capacity(capacity),
        }
    }

    /// Records the result of processing one item.
    ///
    /// # Errors
    /// Returns `result`'s error unchanged when it is not an item-level failure; the
    /// caller is expected to stop processing the batch.
    pub fn record(
        &mut self,
        id: i64,
        entity_type: Option<EntityType>,
        result: Result<T>,
    ) -> Result<()> {
        match result {
            Ok(value) => self.outcomes.push(ItemOutcome::Succeeded(value)),
            Err(err) if err.is_item_failure() => {
                warn!(id, error = %err, "Bulk item failed");
                self.outcomes.push(ItemOutcome::Failed(BulkFailure {
                    id,
                    entity_type,
                    error: err.to_string(),
                }));
            }
            Err(err) => return Err(err),
        }
        Ok(())
    }

    /// All outcomes in input order
    #[must_use]
    pub fn outcomes(&self) -> &[ItemOutcome<T>] {
        &self.outcomes
    }

    /// Successful values in input order
    pub fn successes(&self) -> impl Iterator<Item = &T> {
        self.outcomes.iter().filter_map(|outcome| match outcome {
            ItemOutcome::Succeeded(value) => Some(value),
            ItemOutcome::Failed(_) => None,
        })
    }

    /// Failures in input order
    pub fn failures(&self) -> impl Iterator<Item = &BulkFailure> {
        self.outcomes.iter().filter_map(|outcome| match outcome {
            ItemOutcome::Succeeded(_) => None,
            ItemOutcome::Failed(failure) => Some(failure),
        })
    }

    #[must_use]
    pub fn success_count(&self) -> usize {
        self.successes().count()
    }

    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.failures().count()
    }

    #[must_use]
    pub fn total_count(&self) -> usize {
        self.outcomes.len()
    }

    /// Splits into successful values and failure records, each in input order.
    #[must_use]
    pub fn into_parts(self) -> (Vec<T>, Vec<BulkFailure>) {
        let mut successes = Vec::new();
        let mut failures = Vec::new();
        for outcome in self.outcomes {
            match outcome {
                ItemOutcome::Succeeded(value) => successes.push(value),
                ItemOutcome::Failed(failure) => failures.push(failure),
            }
        }
        (successes, failures)
    }

    /// Counts plus failure records.
    #[must_use]
    pub fn summary(&self) -> BulkSummary {
        let failures: Vec<BulkFailure> = self.failures().cloned().collect();
        BulkSummary {
            success_count: self.total_count() - failures.len(),
            failed_count: failures.len(),
            total_count: self.total_count(),
            failures,
        }
    }
}
