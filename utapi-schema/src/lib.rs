// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

#![deny(missing_docs)]

//! Pure functions deriving backing-store keys from `(granularity, resource,
//! metric, interval)` tuples (SPEC_FULL.md §4.1).
//!
//! Every function here is deterministic and reversible: given a key plus the
//! resource it belongs to, [`get_metric_from_key`] recovers the metric name.
//! The shapes are frozen — a key written by one release must stay readable
//! by the next — so changing the `format!` templates below is a breaking
//! change to every deployment's existing data.

use utapi_core::{MetricName, ResourceId};

/// The interval-scoped key for an operation counter or traffic delta:
/// `R:{metric}:{interval}`.
pub fn generate_key(resource: &ResourceId, metric: &str, interval_ms: i64) -> String {
    format!("{}:{metric}:{interval_ms}", resource.tag())
}

/// The sorted-set key holding sampled absolute values over time:
/// `R:state:{metric}`. Only meaningful for an absolute [`MetricName`].
pub fn generate_state_key(resource: &ResourceId, metric: MetricName) -> String {
    format!("{}:state:{}", resource.tag(), metric.as_str())
}

/// The unscoped running-counter key for an absolute metric: `R:counter:{metric}`.
pub fn generate_counter(resource: &ResourceId, metric: MetricName) -> String {
    format!("{}:counter:{}", resource.tag(), metric.as_str())
}

/// Every running-counter key for `resource` (one per absolute metric).
pub fn get_counters(resource: &ResourceId) -> Vec<String> {
    MetricName::ALL
        .into_iter()
        .filter(|m| m.is_absolute())
        .map(|m| generate_counter(resource, m))
        .collect()
}

/// Recover the metric name embedded in a [`generate_key`]-shaped key,
/// given the resource it was generated for.
///
/// Returns `None` if `key` isn't shaped like `{resource.tag()}:{metric}:{interval}`.
pub fn get_metric_from_key(key: &str, resource: &ResourceId) -> Option<String> {
    let rest = key.strip_prefix(&resource.tag())?.strip_prefix(':')?;
    let (metric, _interval) = rest.rsplit_once(':')?;
    Some(metric.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_shape_matches_spec() {
        let resource = ResourceId::Bucket("my-bucket".into());
        assert_eq!(
            generate_key(&resource, "PutObject", 1_500_000_000_000),
            "bucket:my-bucket:PutObject:1500000000000"
        );
    }

    #[test]
    fn state_and_counter_keys_are_unscoped_by_interval() {
        let resource = ResourceId::Account("a1".into());
        assert_eq!(
            generate_state_key(&resource, MetricName::StorageUtilized),
            "account:a1:state:storageUtilized"
        );
        assert_eq!(
            generate_counter(&resource, MetricName::NumberOfObjects),
            "account:a1:counter:numberOfObjects"
        );
    }

    #[test]
    fn get_counters_returns_both_absolutes() {
        let resource = ResourceId::Service("utapi".into());
        let counters = get_counters(&resource);
        assert_eq!(counters.len(), 2);
        assert!(counters.contains(&"service:utapi:counter:storageUtilized".to_string()));
        assert!(counters.contains(&"service:utapi:counter:numberOfObjects".to_string()));
    }

    #[test]
    fn get_metric_from_key_recovers_operation_name() {
        let resource = ResourceId::Bucket("b".into());
        let key = generate_key(&resource, "HeadObject", 42);
        assert_eq!(get_metric_from_key(&key, &resource), Some("HeadObject".to_string()));
    }

    #[test]
    fn get_metric_from_key_rejects_foreign_resource() {
        let resource = ResourceId::Bucket("b".into());
        let other = ResourceId::Bucket("other".into());
        let key = generate_key(&resource, "HeadObject", 42);
        assert_eq!(get_metric_from_key(&key, &other), None);
    }

    #[test]
    fn key_survives_a_bucket_name_containing_colons() {
        // Bucket names can't really contain colons on S3, but the scheme
        // should still round-trip if one ever does (defense, not a feature).
        let resource = ResourceId::Bucket("weird:name".into());
        let key = generate_key(&resource, "PutObject", 7);
        assert_eq!(get_metric_from_key(&key, &resource), Some("PutObject".to_string()));
    }
}
