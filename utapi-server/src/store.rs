//! [`StoreHandle`]: the one concrete [`Datastore`] the binary hands to
//! [`utapi_client::Client`] and [`utapi_reader::Dispatcher`].
//!
//! `Client<D>`/`ListMetrics<'a, D>`/`Dispatcher<'a, D>` are generic over
//! `D: Datastore`, so the adapter choice could in principle be made at the
//! type level per build. A deployed binary needs to pick the adapter at
//! *runtime*, from configuration, without forcing those already-generic
//! callers onto `Arc<dyn Datastore>` (which would need `?Sized` bounds
//! threaded through both crates for a single caller's benefit). Enum
//! dispatch over the two adapters this binary ships gets the same runtime
//! choice for free.

use async_trait::async_trait;
use utapi_store::{Command, CommandResult, Datastore, InMemoryStore, RedisStore, ScoreBound, StoreError};

/// Either of the two [`Datastore`] adapters this binary can be configured
/// with. `Clone` is cheap for both variants, matching the adapters it wraps.
#[derive(Clone)]
pub enum StoreHandle {
    /// The in-process adapter, used by `utapi-server init` dry runs and by
    /// this crate's own integration tests.
    InMemory(InMemoryStore),
    /// The production adapter.
    Redis(RedisStore),
}

impl StoreHandle {
    /// Connect to Redis at `host:port` and wrap it as a handle.
    pub async fn connect_redis(host: &str, port: u16) -> Result<Self, StoreError> {
        Ok(Self::Redis(RedisStore::connect(host, port).await?))
    }

    /// A fresh in-memory handle.
    pub fn in_memory() -> Self {
        Self::InMemory(InMemoryStore::new())
    }
}

#[async_trait]
impl Datastore for StoreHandle {
    async fn get(&self, key: &str) -> Result<Option<i64>, StoreError> {
        match self {
            Self::InMemory(store) => store.get(key).await,
            Self::Redis(store) => store.get(key).await,
        }
    }

    async fn set(&self, key: &str, value: i64) -> Result<(), StoreError> {
        match self {
            Self::InMemory(store) => store.set(key, value).await,
            Self::Redis(store) => store.set(key, value).await,
        }
    }

    async fn incr(&self, key: &str) -> Result<i64, StoreError> {
        match self {
            Self::InMemory(store) => store.incr(key).await,
            Self::Redis(store) => store.incr(key).await,
        }
    }

    async fn incrby(&self, key: &str, amount: i64) -> Result<i64, StoreError> {
        match self {
            Self::InMemory(store) => store.incrby(key, amount).await,
            Self::Redis(store) => store.incrby(key, amount).await,
        }
    }

    async fn decrby(&self, key: &str, amount: i64) -> Result<i64, StoreError> {
        match self {
            Self::InMemory(store) => store.decrby(key, amount).await,
            Self::Redis(store) => store.decrby(key, amount).await,
        }
    }

    async fn zadd(&self, key: &str, score: i64, member: &str) -> Result<(), StoreError> {
        match self {
            Self::InMemory(store) => store.zadd(key, score, member).await,
            Self::Redis(store) => store.zadd(key, score, member).await,
        }
    }

    async fn zrangebyscore(
        &self,
        key: &str,
        min: ScoreBound,
        max: ScoreBound,
        limit: Option<(usize, usize)>,
    ) -> Result<Vec<String>, StoreError> {
        match self {
            Self::InMemory(store) => store.zrangebyscore(key, min, max, limit).await,
            Self::Redis(store) => store.zrangebyscore(key, min, max, limit).await,
        }
    }

    async fn zrevrangebyscore(
        &self,
        key: &str,
        max: ScoreBound,
        min: ScoreBound,
        limit: Option<(usize, usize)>,
    ) -> Result<Vec<String>, StoreError> {
        match self {
            Self::InMemory(store) => store.zrevrangebyscore(key, max, min, limit).await,
            Self::Redis(store) => store.zrevrangebyscore(key, max, min, limit).await,
        }
    }

    async fn zremrangebyscore(&self, key: &str, min: ScoreBound, max: ScoreBound) -> Result<(), StoreError> {
        match self {
            Self::InMemory(store) => store.zremrangebyscore(key, min, max).await,
            Self::Redis(store) => store.zremrangebyscore(key, min, max).await,
        }
    }

    async fn batch(&self, commands: Vec<Command>) -> Result<Vec<CommandResult>, StoreError> {
        match self {
            Self::InMemory(store) => store.batch(commands).await,
            Self::Redis(store) => store.batch(commands).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn in_memory_handle_round_trips_through_the_datastore_trait() {
        let handle = StoreHandle::in_memory();
        handle.set("k", 5).await.unwrap();
        assert_eq!(handle.get("k").await.unwrap(), Some(5));
        assert_eq!(handle.incrby("k", 2).await.unwrap(), 7);
    }
}
