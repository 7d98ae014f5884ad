//! A [`Datastore`] backed by Redis, via a multiplexed, auto-reconnecting
//! [`redis::aio::ConnectionManager`].
//!
//! The backing-store contract in SPEC_FULL.md §4.2 is, command for command,
//! the subset of the Redis command set this engine needs (`incr`, `incrby`,
//! `decrby`, `zadd`, `zrangebyscore`/`zrevrangebyscore` with `LIMIT`,
//! `zremrangebyscore`, and a pipelined batch) — Redis is the natural,
//! idiomatic backing store for this contract rather than a bespoke one.

use async_trait::async_trait;
use redis::AsyncCommands;

use crate::command::Command;
use crate::datastore::{CommandResult, Datastore};
use crate::error::StoreError;
use crate::value::{ScoreBound, StoreValue};

/// Connects to a single Redis endpoint and exposes it as a [`Datastore`].
#[derive(Clone)]
pub struct RedisStore {
    conn: redis::aio::ConnectionManager,
}

impl RedisStore {
    /// Connect to `redis://{host}:{port}`.
    pub async fn connect(host: &str, port: u16) -> Result<Self, StoreError> {
        let client = redis::Client::open(format!("redis://{host}:{port}"))?;
        let conn = client.get_connection_manager().await?;
        Ok(Self { conn })
    }
}

fn bound_to_redis(bound: ScoreBound) -> String {
    match bound {
        ScoreBound::NegInf => "-inf".to_string(),
        ScoreBound::PosInf => "+inf".to_string(),
        ScoreBound::Exact(score) => score.to_string(),
    }
}

/// Pushes one pipeline step per [`Command`]. Every step keeps its reply
/// (none is marked `.ignore()`): `batch`'s `commands.len() == replies.len()`
/// invariant must hold no matter which [`Datastore`] adapter is active,
/// since `StoreHandle` dispatches callers to either one interchangeably, and
/// `InMemoryStore` already returns a `Nil` placeholder for commands with no
/// meaningful return value (`reply_to_result` below does the same).
fn push_command(pipe: &mut redis::Pipeline, command: &Command) {
    match command {
        Command::Get(key) => {
            pipe.get(key);
        }
        Command::Set(key, value) => {
            pipe.set(key, value);
        }
        Command::Incr(key) => {
            pipe.incr(key, 1);
        }
        Command::IncrBy(key, amount) => {
            pipe.incr(key, *amount);
        }
        Command::DecrBy(key, amount) => {
            pipe.decr(key, *amount);
        }
        Command::ZAdd { key, score, member } => {
            pipe.zadd(key, member, *score);
        }
        Command::ZRangeByScore { key, min, max, limit } => {
            let min = bound_to_redis(*min);
            let max = bound_to_redis(*max);
            match limit {
                Some((offset, count)) => {
                    pipe.zrangebyscore_limit(key, min, max, *offset as isize, *count as isize);
                }
                None => {
                    pipe.zrangebyscore(key, min, max);
                }
            }
        }
        Command::ZRevRangeByScore { key, max, min, limit } => {
            let max = bound_to_redis(*max);
            let min = bound_to_redis(*min);
            match limit {
                Some((offset, count)) => {
                    pipe.zrevrangebyscore_limit(key, max, min, *offset as isize, *count as isize);
                }
                None => {
                    pipe.zrevrangebyscore(key, max, min);
                }
            }
        }
        Command::ZRemRangeByScore { key, min, max } => {
            pipe.zrembyscore(key, bound_to_redis(*min), bound_to_redis(*max));
        }
    }
}

/// Convert one pipeline reply into a [`CommandResult`]. A value that can't be
/// interpreted the way its issuing [`Command`] expects is reported as a
/// per-command [`StoreError`], not a transport failure — matching
/// SPEC_FULL.md §4.2's "individual command failures do not short-circuit the
/// batch."
fn reply_to_result(reply: redis::Value, command: &Command) -> CommandResult {
    match command {
        Command::Get(_) | Command::Incr(_) | Command::IncrBy(..) | Command::DecrBy(..) => {
            match reply {
                redis::Value::Nil => Ok(StoreValue::Nil),
                other => redis::from_redis_value::<i64>(&other)
                    .map(StoreValue::Int)
                    .map_err(|e| StoreError::new(e.to_string())),
            }
        }
        Command::ZRangeByScore { .. } | Command::ZRevRangeByScore { .. } => {
            redis::from_redis_value::<Vec<String>>(&reply)
                .map(StoreValue::Members)
                .map_err(|e| StoreError::new(e.to_string()))
        }
        Command::Set(..) | Command::ZAdd { .. } | Command::ZRemRangeByScore { .. } => Ok(StoreValue::Nil),
    }
}

#[async_trait]
impl Datastore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<i64>, StoreError> {
        let mut conn = self.conn.clone();
        Ok(conn.get(key).await?)
    }

    async fn set(&self, key: &str, value: i64) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        conn.set(key, value).await?;
        Ok(())
    }

    async fn incr(&self, key: &str) -> Result<i64, StoreError> {
        self.incrby(key, 1).await
    }

    async fn incrby(&self, key: &str, amount: i64) -> Result<i64, StoreError> {
        let mut conn = self.conn.clone();
        Ok(conn.incr(key, amount).await?)
    }

    async fn decrby(&self, key: &str, amount: i64) -> Result<i64, StoreError> {
        let mut conn = self.conn.clone();
        Ok(conn.decr(key, amount).await?)
    }

    async fn zadd(&self, key: &str, score: i64, member: &str) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        conn.zadd(key, member, score).await?;
        Ok(())
    }

    async fn zrangebyscore(
        &self,
        key: &str,
        min: ScoreBound,
        max: ScoreBound,
        limit: Option<(usize, usize)>,
    ) -> Result<Vec<String>, StoreError> {
        let mut conn = self.conn.clone();
        let min = bound_to_redis(min);
        let max = bound_to_redis(max);
        Ok(match limit {
            Some((offset, count)) => {
                conn.zrangebyscore_limit(key, min, max, offset as isize, count as isize).await?
            }
            None => conn.zrangebyscore(key, min, max).await?,
        })
    }

    async fn zrevrangebyscore(
        &self,
        key: &str,
        max: ScoreBound,
        min: ScoreBound,
        limit: Option<(usize, usize)>,
    ) -> Result<Vec<String>, StoreError> {
        let mut conn = self.conn.clone();
        let max = bound_to_redis(max);
        let min = bound_to_redis(min);
        Ok(match limit {
            Some((offset, count)) => {
                conn.zrevrangebyscore_limit(key, max, min, offset as isize, count as isize).await?
            }
            None => conn.zrevrangebyscore(key, max, min).await?,
        })
    }

    async fn zremrangebyscore(&self, key: &str, min: ScoreBound, max: ScoreBound) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        conn.zrembyscore(key, bound_to_redis(min), bound_to_redis(max)).await?;
        Ok(())
    }

    async fn batch(&self, commands: Vec<Command>) -> Result<Vec<CommandResult>, StoreError> {
        if commands.is_empty() {
            return Ok(Vec::new());
        }
        let mut pipe = redis::pipe();
        for command in &commands {
            push_command(&mut pipe, command);
        }
        let mut conn = self.conn.clone();
        // A plain (non-`.atomic()`) pipeline: SPEC_FULL.md §5's ordering
        // guarantee is pipeline order, not MULTI/EXEC transactional
        // atomicity, matching the spec's own emphasis on single-command
        // atomicity rather than whole-batch atomicity.
        let replies: Vec<redis::Value> = pipe
            .query_async(&mut conn)
            .await
            .map_err(|e| StoreError::new(format!("pipeline transport failure: {e}")))?;

        Ok(replies
            .into_iter()
            .zip(commands.iter())
            .map(|(reply, command)| reply_to_result(reply, command))
            .collect())
    }
}
