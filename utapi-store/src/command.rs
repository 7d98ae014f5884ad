//! The commands a [`crate::Datastore::batch`] pipeline is built from.

use crate::value::ScoreBound;

/// A single backing-store command, as issued into a pipelined batch.
#[derive(Debug, Clone)]
pub enum Command {
    /// Read an integer counter (absent key reads as [`crate::StoreValue::Nil`]).
    Get(String),
    /// Overwrite an integer counter.
    Set(String, i64),
    /// Atomically increment an integer counter by 1.
    Incr(String),
    /// Atomically increment an integer counter by `amount`.
    IncrBy(String, i64),
    /// Atomically decrement an integer counter by `amount`.
    DecrBy(String, i64),
    /// Insert or overwrite a sorted-set member at `score`.
    ZAdd { key: String, score: i64, member: String },
    /// Ascending-score range query, capped to `limit` results if set.
    ZRangeByScore { key: String, min: ScoreBound, max: ScoreBound, limit: Option<(usize, usize)> },
    /// Descending-score range query, capped to `limit` results if set.
    ZRevRangeByScore { key: String, max: ScoreBound, min: ScoreBound, limit: Option<(usize, usize)> },
    /// Remove every member whose score falls in `[min, max]`.
    ZRemRangeByScore { key: String, min: ScoreBound, max: ScoreBound },
}

impl Command {
    /// Build the two-command pair that re-samples an absolute metric's state
    /// set at `interval_ms` (SPEC_FULL.md §4.3, "Sampling pattern"): remove
    /// any existing sample at exactly `interval_ms`, then insert `value`.
    /// Always issued as a consecutive pair within one batch so that no
    /// reader ever observes the state set briefly empty at that score.
    pub fn resample(state_key: &str, interval_ms: i64, value: i64) -> [Command; 2] {
        [
            Command::ZRemRangeByScore {
                key: state_key.to_string(),
                min: ScoreBound::Exact(interval_ms),
                max: ScoreBound::Exact(interval_ms),
            },
            Command::ZAdd { key: state_key.to_string(), score: interval_ms, member: value.to_string() },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resample_removes_before_adding() {
        let [remove, add] = Command::resample("bucket:b:state:storageUtilized", 100, 42);
        assert!(matches!(remove, Command::ZRemRangeByScore { min: ScoreBound::Exact(100), max: ScoreBound::Exact(100), .. }));
        assert!(matches!(add, Command::ZAdd { score: 100, .. }));
    }
}
