//! An in-memory [`Datastore`], used by every unit test in the workspace that
//! doesn't need a real Redis deployment.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::command::Command;
use crate::datastore::{CommandResult, Datastore};
use crate::error::StoreError;
use crate::value::{ScoreBound, StoreValue};

#[derive(Default)]
struct State {
    counters: HashMap<String, i64>,
    // score -> member, mirroring that every resample removes any existing
    // entry at that score before inserting (invariant 1, SPEC_FULL.md §3).
    sorted_sets: HashMap<String, BTreeMap<i64, String>>,
}

/// A mapping-based, ordered-set-based `Datastore` backed by a single mutex.
///
/// Every operation here is synchronous under the hood; the mutex is never
/// held across an `.await`, so this is safe to share across concurrently
/// running requests the same way [`crate::redis_store::RedisStore`] is.
#[derive(Default, Clone)]
pub struct InMemoryStore {
    state: std::sync::Arc<Mutex<State>>,
}

impl InMemoryStore {
    /// A fresh, empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }
}

#[async_trait]
impl Datastore for InMemoryStore {
    async fn get(&self, key: &str) -> Result<Option<i64>, StoreError> {
        Ok(self.lock().counters.get(key).copied())
    }

    async fn set(&self, key: &str, value: i64) -> Result<(), StoreError> {
        self.lock().counters.insert(key.to_string(), value);
        Ok(())
    }

    async fn incr(&self, key: &str) -> Result<i64, StoreError> {
        self.incrby(key, 1).await
    }

    async fn incrby(&self, key: &str, amount: i64) -> Result<i64, StoreError> {
        let mut guard = self.lock();
        let counter = guard.counters.entry(key.to_string()).or_insert(0);
        *counter += amount;
        Ok(*counter)
    }

    async fn decrby(&self, key: &str, amount: i64) -> Result<i64, StoreError> {
        let mut guard = self.lock();
        let counter = guard.counters.entry(key.to_string()).or_insert(0);
        *counter -= amount;
        Ok(*counter)
    }

    async fn zadd(&self, key: &str, score: i64, member: &str) -> Result<(), StoreError> {
        let mut guard = self.lock();
        guard.sorted_sets.entry(key.to_string()).or_default().insert(score, member.to_string());
        Ok(())
    }

    async fn zrangebyscore(
        &self,
        key: &str,
        min: ScoreBound,
        max: ScoreBound,
        limit: Option<(usize, usize)>,
    ) -> Result<Vec<String>, StoreError> {
        let guard = self.lock();
        let Some(set) = guard.sorted_sets.get(key) else { return Ok(Vec::new()) };
        let mut members: Vec<String> = set
            .iter()
            .filter(|(score, _)| min.satisfied_as_min(**score) && max.satisfied_as_max(**score))
            .map(|(_, member)| member.clone())
            .collect();
        apply_limit(&mut members, limit);
        Ok(members)
    }

    async fn zrevrangebyscore(
        &self,
        key: &str,
        max: ScoreBound,
        min: ScoreBound,
        limit: Option<(usize, usize)>,
    ) -> Result<Vec<String>, StoreError> {
        let guard = self.lock();
        let Some(set) = guard.sorted_sets.get(key) else { return Ok(Vec::new()) };
        let mut members: Vec<String> = set
            .iter()
            .rev()
            .filter(|(score, _)| min.satisfied_as_min(**score) && max.satisfied_as_max(**score))
            .map(|(_, member)| member.clone())
            .collect();
        apply_limit(&mut members, limit);
        Ok(members)
    }

    async fn zremrangebyscore(&self, key: &str, min: ScoreBound, max: ScoreBound) -> Result<(), StoreError> {
        let mut guard = self.lock();
        if let Some(set) = guard.sorted_sets.get_mut(key) {
            set.retain(|score, _| !(min.satisfied_as_min(*score) && max.satisfied_as_max(*score)));
        }
        Ok(())
    }

    async fn batch(&self, commands: Vec<Command>) -> Result<Vec<CommandResult>, StoreError> {
        // A real adapter pipelines these across the network; in-memory, we
        // just apply them in order under one lock acquisition per command,
        // matching the "commands are executed in batch-declared order"
        // guarantee (SPEC_FULL.md §5) without needing a transport.
        let mut results = Vec::with_capacity(commands.len());
        for command in commands {
            results.push(self.apply(command).await);
        }
        Ok(results)
    }
}

impl InMemoryStore {
    async fn apply(&self, command: Command) -> CommandResult {
        match command {
            Command::Get(key) => Ok(match self.get(&key).await? {
                Some(n) => StoreValue::Int(n),
                None => StoreValue::Nil,
            }),
            Command::Set(key, value) => {
                self.set(&key, value).await?;
                Ok(StoreValue::Nil)
            }
            Command::Incr(key) => Ok(StoreValue::Int(self.incr(&key).await?)),
            Command::IncrBy(key, amount) => Ok(StoreValue::Int(self.incrby(&key, amount).await?)),
            Command::DecrBy(key, amount) => Ok(StoreValue::Int(self.decrby(&key, amount).await?)),
            Command::ZAdd { key, score, member } => {
                self.zadd(&key, score, &member).await?;
                Ok(StoreValue::Nil)
            }
            Command::ZRangeByScore { key, min, max, limit } => {
                Ok(StoreValue::Members(self.zrangebyscore(&key, min, max, limit).await?))
            }
            Command::ZRevRangeByScore { key, max, min, limit } => {
                Ok(StoreValue::Members(self.zrevrangebyscore(&key, max, min, limit).await?))
            }
            Command::ZRemRangeByScore { key, min, max } => {
                self.zremrangebyscore(&key, min, max).await?;
                Ok(StoreValue::Nil)
            }
        }
    }
}

fn apply_limit(members: &mut Vec<String>, limit: Option<(usize, usize)>) {
    if let Some((offset, count)) = limit {
        *members = members.iter().skip(offset).take(count).cloned().collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn incrby_accumulates() {
        let store = InMemoryStore::new();
        assert_eq!(store.incrby("k", 5).await.unwrap(), 5);
        assert_eq!(store.incrby("k", 3).await.unwrap(), 8);
    }

    #[tokio::test]
    async fn decrby_can_go_negative() {
        let store = InMemoryStore::new();
        assert_eq!(store.decrby("k", 5).await.unwrap(), -5);
    }

    #[tokio::test]
    async fn resample_pattern_leaves_exactly_one_sample_per_score() {
        let store = InMemoryStore::new();
        store.zadd("s", 100, "1").await.unwrap();
        let commands = Command::resample("s", 100, 2).to_vec();
        store.batch(commands).await.unwrap();
        let members = store.zrangebyscore("s", ScoreBound::Exact(100), ScoreBound::Exact(100), None).await.unwrap();
        assert_eq!(members, vec!["2".to_string()]);
    }

    #[tokio::test]
    async fn zrevrangebyscore_returns_nearest_predecessor() {
        let store = InMemoryStore::new();
        store.zadd("s", 0, "0").await.unwrap();
        store.zadd("s", 900_000, "5").await.unwrap();
        let members = store
            .zrevrangebyscore("s", ScoreBound::Exact(1_000_000), ScoreBound::NegInf, Some((0, 1)))
            .await
            .unwrap();
        assert_eq!(members, vec!["5".to_string()]);
    }

    #[tokio::test]
    async fn zrevrangebyscore_before_any_sample_is_empty() {
        let store = InMemoryStore::new();
        store.zadd("s", 1_000, "7").await.unwrap();
        let members = store
            .zrevrangebyscore("s", ScoreBound::Exact(500), ScoreBound::NegInf, Some((0, 1)))
            .await
            .unwrap();
        assert!(members.is_empty());
    }

    #[tokio::test]
    async fn batch_applies_commands_in_order() {
        let store = InMemoryStore::new();
        let commands = vec![Command::IncrBy("k".into(), 10), Command::DecrBy("k".into(), 3)];
        let results = store.batch(commands).await.unwrap();
        assert_eq!(results[0].as_ref().unwrap(), &StoreValue::Int(10));
        assert_eq!(results[1].as_ref().unwrap(), &StoreValue::Int(7));
    }
}
