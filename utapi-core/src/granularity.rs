//! The three resource families a single event can be accounted against.

use std::fmt;

/// A resource family / level at which metrics are accounted.
///
/// Symmetric by design: the write path and read path treat `Bucket`,
/// `Account`, and `Service` identically, differing only in which
/// identifier fills the resource tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Granularity {
    /// Keyed by bucket name (implicitly scoped to an account).
    Bucket,
    /// Keyed by a canonical account id.
    Account,
    /// The fixed singleton identifier: the component name.
    Service,
}

impl Granularity {
    /// All three granularities, in a stable order.
    pub const ALL: [Granularity; 3] = [Granularity::Bucket, Granularity::Account, Granularity::Service];

    /// The lowercase tag used as the `{level}` part of a resource key.
    pub fn tag(self) -> &'static str {
        match self {
            Granularity::Bucket => "bucket",
            Granularity::Account => "account",
            Granularity::Service => "service",
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// A configured subset of [`Granularity`], e.g. a deployment that only
/// records bucket- and account-level metrics.
///
/// `metrics` unset in configuration means "every level the event carries" —
/// represented here as [`GranularitySet::all`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GranularitySet {
    bucket: bool,
    account: bool,
    service: bool,
}

impl GranularitySet {
    /// Every granularity enabled. The default when no `metrics` configuration
    /// is present.
    pub fn all() -> Self {
        Self { bucket: true, account: true, service: true }
    }

    /// Build a set from an explicit list, e.g. parsed from configuration.
    pub fn from_levels(levels: impl IntoIterator<Item = Granularity>) -> Self {
        let mut set = Self { bucket: false, account: false, service: false };
        for level in levels {
            set.enable(level);
        }
        set
    }

    fn enable(&mut self, level: Granularity) {
        match level {
            Granularity::Bucket => self.bucket = true,
            Granularity::Account => self.account = true,
            Granularity::Service => self.service = true,
        }
    }

    /// Whether `level` is enabled in this set.
    pub fn contains(&self, level: Granularity) -> bool {
        match level {
            Granularity::Bucket => self.bucket,
            Granularity::Account => self.account,
            Granularity::Service => self.service,
        }
    }

    /// Iterate the enabled granularities, in [`Granularity::ALL`] order.
    pub fn iter(&self) -> impl Iterator<Item = Granularity> + '_ {
        Granularity::ALL.into_iter().filter(|g| self.contains(*g))
    }
}

impl Default for GranularitySet {
    fn default() -> Self {
        Self::all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_contains_every_level() {
        let set = GranularitySet::all();
        for level in Granularity::ALL {
            assert!(set.contains(level));
        }
    }

    #[test]
    fn from_levels_is_exclusive() {
        let set = GranularitySet::from_levels([Granularity::Account]);
        assert!(!set.contains(Granularity::Bucket));
        assert!(set.contains(Granularity::Account));
        assert!(!set.contains(Granularity::Service));
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![Granularity::Account]);
    }

    #[test]
    fn tag_matches_schema_level() {
        assert_eq!(Granularity::Bucket.tag(), "bucket");
        assert_eq!(Granularity::Account.tag(), "account");
        assert_eq!(Granularity::Service.tag(), "service");
    }
}
