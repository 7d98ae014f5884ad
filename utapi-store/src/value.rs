//! Value and score types shared by every [`crate::Command`].

/// A value returned by a single backing-store command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreValue {
    /// No value (a missing key, or a command with no meaningful return).
    Nil,
    /// An integer reply (`get`, `incr`, `incrby`, `decrby`).
    Int(i64),
    /// A list of members (`zrangebyscore`, `zrevrangebyscore`).
    Members(Vec<String>),
}

impl StoreValue {
    /// Interpret this value as an integer, the way a [`crate::Datastore::get`]
    /// reply is parsed on the read path: absent or non-numeric is zero
    /// (SPEC_FULL.md §4.4, "parse as integer (absent/NaN → 0)").
    pub fn as_i64_or_zero(&self) -> i64 {
        match self {
            StoreValue::Int(n) => *n,
            StoreValue::Members(members) => {
                members.first().and_then(|m| m.parse().ok()).unwrap_or(0)
            }
            StoreValue::Nil => 0,
        }
    }
}

/// A score bound for a sorted-set range query: `-inf`, `+inf`, or an exact
/// epoch-millisecond score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreBound {
    /// Negative infinity (`-inf` in Redis range syntax).
    NegInf,
    /// Positive infinity (`+inf` in Redis range syntax).
    PosInf,
    /// An exact score.
    Exact(i64),
}

impl ScoreBound {
    /// Does `score` satisfy this bound acting as a lower bound?
    pub fn satisfied_as_min(self, score: i64) -> bool {
        match self {
            ScoreBound::NegInf => true,
            ScoreBound::PosInf => false,
            ScoreBound::Exact(min) => score >= min,
        }
    }

    /// Does `score` satisfy this bound acting as an upper bound?
    pub fn satisfied_as_max(self, score: i64) -> bool {
        match self {
            ScoreBound::NegInf => false,
            ScoreBound::PosInf => true,
            ScoreBound::Exact(max) => score <= max,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn as_i64_or_zero_handles_every_variant() {
        assert_eq!(StoreValue::Int(5).as_i64_or_zero(), 5);
        assert_eq!(StoreValue::Nil.as_i64_or_zero(), 0);
        assert_eq!(StoreValue::Members(vec!["42".into()]).as_i64_or_zero(), 42);
        assert_eq!(StoreValue::Members(vec!["not-a-number".into()]).as_i64_or_zero(), 0);
        assert_eq!(StoreValue::Members(vec![]).as_i64_or_zero(), 0);
    }

    #[test]
    fn bound_satisfaction() {
        assert!(ScoreBound::NegInf.satisfied_as_min(i64::MIN));
        assert!(ScoreBound::PosInf.satisfied_as_max(i64::MAX));
        assert!(ScoreBound::Exact(10).satisfied_as_min(10));
        assert!(!ScoreBound::Exact(10).satisfied_as_min(9));
        assert!(ScoreBound::Exact(10).satisfied_as_max(10));
        assert!(!ScoreBound::Exact(10).satisfied_as_max(11));
    }
}
