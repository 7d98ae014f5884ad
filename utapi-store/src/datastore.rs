//! The backing-store contract (SPEC_FULL.md §4.2).

use async_trait::async_trait;

use crate::command::Command;
use crate::error::StoreError;
use crate::value::{ScoreBound, StoreValue};

/// A per-command result within a [`Datastore::batch`] reply: individual
/// command failures do not short-circuit the rest of the batch.
pub type CommandResult = Result<StoreValue, StoreError>;

/// The asynchronous contract every backing-store adapter must satisfy.
///
/// Every method is a suspension point (SPEC_FULL.md §5): nothing here blocks
/// the caller's thread, and no adapter holds in-process mutable state beyond
/// what's needed to talk to the real store.
#[async_trait]
pub trait Datastore: Send + Sync {
    /// Read an integer counter; a missing key reads as `Ok(None)`.
    async fn get(&self, key: &str) -> Result<Option<i64>, StoreError>;
    /// Overwrite an integer counter.
    async fn set(&self, key: &str, value: i64) -> Result<(), StoreError>;
    /// Atomically increment an integer counter by 1, returning its new value.
    async fn incr(&self, key: &str) -> Result<i64, StoreError>;
    /// Atomically increment an integer counter by `amount`, returning its new value.
    async fn incrby(&self, key: &str, amount: i64) -> Result<i64, StoreError>;
    /// Atomically decrement an integer counter by `amount`, returning its new value.
    async fn decrby(&self, key: &str, amount: i64) -> Result<i64, StoreError>;
    /// Insert or overwrite a sorted-set member at `score`.
    async fn zadd(&self, key: &str, score: i64, member: &str) -> Result<(), StoreError>;
    /// Ascending-score range query.
    async fn zrangebyscore(
        &self,
        key: &str,
        min: ScoreBound,
        max: ScoreBound,
        limit: Option<(usize, usize)>,
    ) -> Result<Vec<String>, StoreError>;
    /// Descending-score range query.
    async fn zrevrangebyscore(
        &self,
        key: &str,
        max: ScoreBound,
        min: ScoreBound,
        limit: Option<(usize, usize)>,
    ) -> Result<Vec<String>, StoreError>;
    /// Remove every member whose score falls in `[min, max]`.
    async fn zremrangebyscore(&self, key: &str, min: ScoreBound, max: ScoreBound) -> Result<(), StoreError>;

    /// Execute `commands` as a single pipelined batch, returning one result
    /// per command in the same order. Individual command failures are
    /// reported per-slot; only a transport-level failure of the whole batch
    /// surfaces as `Err`.
    async fn batch(&self, commands: Vec<Command>) -> Result<Vec<CommandResult>, StoreError>;
}
