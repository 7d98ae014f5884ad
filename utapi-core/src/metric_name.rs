//! Names of the non-operation metrics every resource can carry: the two
//! traffic deltas and the two absolute levels (SPEC_FULL.md §3).

use std::fmt;

/// A metric name that isn't one of the ~22 operation counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    /// Bytes received by the service (a delta metric).
    IncomingBytes,
    /// Bytes sent by the service (a delta metric).
    OutgoingBytes,
    /// Live storage occupied by a resource (an absolute metric).
    StorageUtilized,
    /// Live object count for a resource (an absolute metric).
    NumberOfObjects,
}

impl MetricName {
    /// All non-operation metric names.
    pub const ALL: [MetricName; 4] = [
        MetricName::IncomingBytes,
        MetricName::OutgoingBytes,
        MetricName::StorageUtilized,
        MetricName::NumberOfObjects,
    ];

    /// The name as stored in a schema key.
    pub fn as_str(self) -> &'static str {
        match self {
            MetricName::IncomingBytes => "incomingBytes",
            MetricName::OutgoingBytes => "outgoingBytes",
            MetricName::StorageUtilized => "storageUtilized",
            MetricName::NumberOfObjects => "numberOfObjects",
        }
    }

    /// `true` for the two absolute metrics (running counter + state set),
    /// `false` for the two traffic deltas (plain interval counters).
    pub fn is_absolute(self) -> bool {
        matches!(self, MetricName::StorageUtilized | MetricName::NumberOfObjects)
    }

    /// Parse a stored metric name back into a [`MetricName`].
    pub fn from_str_name(name: &str) -> Option<MetricName> {
        MetricName::ALL.into_iter().find(|m| m.as_str() == name)
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
