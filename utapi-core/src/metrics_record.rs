//! The per-resource result of a `ListMetrics` query (SPEC_FULL.md §6).

use std::collections::BTreeMap;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::event::EventKind;
use crate::resource::ResourceId;

/// One resource's metrics over a queried time range.
///
/// Initialized with every operation counter at zero (SPEC_FULL.md §4.4,
/// "Aggregation"), so a resource with no recorded activity in range still
/// reports a complete, zero-valued record rather than an empty one.
#[derive(Debug, Clone)]
pub struct MetricsRecord {
    /// The resource this record describes.
    pub resource: ResourceId,
    /// `[start, end]` exactly as received, unrounded.
    pub time_range: [i64; 2],
    /// `[nearest sample at or before start, nearest sample at or before end]`.
    pub storage_utilized: [i64; 2],
    /// Sum of `incomingBytes` deltas over `[start, end)`.
    pub incoming_bytes: i64,
    /// Sum of `outgoingBytes` deltas over `[start, end)`.
    pub outgoing_bytes: i64,
    /// `[nearest sample at or before start, nearest sample at or before end]`.
    pub number_of_objects: [i64; 2],
    /// Every operation counter, keyed by wire name (`"s3:PutObject"`, …).
    pub operations: BTreeMap<String, i64>,
}

impl MetricsRecord {
    /// A zero-valued record for `resource` over `time_range`, with every
    /// recognized operation present and set to zero.
    pub fn zeroed(resource: ResourceId, time_range: [i64; 2]) -> Self {
        let operations = EventKind::ALL.into_iter().map(|kind| (kind.wire_name(), 0)).collect();
        Self {
            resource,
            time_range,
            storage_utilized: [0, 0],
            incoming_bytes: 0,
            outgoing_bytes: 0,
            number_of_objects: [0, 0],
            operations,
        }
    }
}

impl Serialize for MetricsRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(7))?;
        match &self.resource {
            ResourceId::Bucket(name) => map.serialize_entry("bucketName", name)?,
            ResourceId::Account(id) => map.serialize_entry("accountId", id)?,
            ResourceId::Service(name) => map.serialize_entry("serviceName", name)?,
        }
        map.serialize_entry("timeRange", &self.time_range)?;
        map.serialize_entry("storageUtilized", &self.storage_utilized)?;
        map.serialize_entry("incomingBytes", &self.incoming_bytes)?;
        map.serialize_entry("outgoingBytes", &self.outgoing_bytes)?;
        map.serialize_entry("numberOfObjects", &self.number_of_objects)?;
        map.serialize_entry("operations", &self.operations)?;
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zeroed_seeds_every_operation() {
        let record = MetricsRecord::zeroed(ResourceId::Bucket("b".into()), [0, 1000]);
        assert_eq!(record.operations.len(), EventKind::ALL.len());
        assert_eq!(record.operations.get("s3:CreateBucket"), Some(&0));
    }

    #[test]
    fn serializes_bucket_resource_under_bucket_name_key() {
        let record = MetricsRecord::zeroed(ResourceId::Bucket("b".into()), [0, 1000]);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["bucketName"], "b");
        assert!(json.get("accountId").is_none());
        assert_eq!(json["timeRange"], serde_json::json!([0, 1000]));
    }

    #[test]
    fn serializes_account_resource_under_account_id_key() {
        let record = MetricsRecord::zeroed(ResourceId::Account("a1".into()), [0, 1000]);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["accountId"], "a1");
    }
}
