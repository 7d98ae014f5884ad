//! `ListMetrics(family, component)`: the read path for one resource family
//! (SPEC_FULL.md §4.4).

use futures::stream::{self, StreamExt};

use utapi_core::{EventKind, Granularity, MetricName, MetricsRecord, ResourceId, UtapiError};
use utapi_store::{Command, CommandResult, Datastore, ScoreBound};

/// The default read-side concurrency cap (SPEC_FULL.md §4.4, "suggested
/// concurrency limit: 5").
pub const DEFAULT_CONCURRENCY: usize = 5;

/// A validated `ListMetrics` request: the resources to report on and the
/// time range to report over.
#[derive(Debug, Clone)]
pub struct ListMetricsRequest {
    /// The bucket names or account ids to query. Ignored for [`Granularity::Service`],
    /// whose single resource is always the configured component name.
    pub resources: Vec<String>,
    /// `[start, end]` in epoch milliseconds.
    pub time_range: [i64; 2],
}

impl ListMetricsRequest {
    fn validate(&self) -> Result<(), UtapiError> {
        if self.time_range[0] > self.time_range[1] {
            return Err(UtapiError::precondition("timeRange start must not be after end"));
        }
        Ok(())
    }
}

/// Which aggregate a delta `get` reply feeds into.
enum DeltaSlot {
    Operation(EventKind),
    IncomingBytes,
    OutgoingBytes,
}

/// Serves `ListMetrics` for a single resource family (bucket, account, or
/// service), uniformly (SPEC_FULL.md §4.4: "A generic `ListMetrics(family,
/// component)` object serves buckets, accounts, and service uniformly").
pub struct ListMetrics<'a, D> {
    store: &'a D,
    family: Granularity,
    component: String,
}

impl<'a, D: Datastore> ListMetrics<'a, D> {
    /// Build a lister for `family`, using `component` to synthesize the
    /// service-level singleton resource.
    pub fn new(store: &'a D, family: Granularity, component: impl Into<String>) -> Self {
        Self { store, family, component: component.into() }
    }

    /// Validate `request`, then compute one [`MetricsRecord`] per resource,
    /// with at most `concurrency` resources in flight at once.
    pub async fn list(&self, request: ListMetricsRequest, concurrency: usize) -> Result<Vec<MetricsRecord>, UtapiError> {
        request.validate()?;
        let resources = self.resolve_resources(&request.resources);
        let time_range = request.time_range;

        let results: Vec<Result<MetricsRecord, UtapiError>> = stream::iter(resources)
            .map(|resource| self.one_resource(resource, time_range))
            .buffer_unordered(concurrency.max(1))
            .collect()
            .await;

        // A resource's completion order is whatever `buffer_unordered` gives
        // us, not request order; each record carries its own resource
        // identifier so the caller can re-key if it needs a stable order.
        results.into_iter().collect()
    }

    fn resolve_resources(&self, names: &[String]) -> Vec<ResourceId> {
        match self.family {
            Granularity::Bucket => names.iter().map(|name| ResourceId::Bucket(name.clone())).collect(),
            Granularity::Account => names.iter().map(|id| ResourceId::Account(id.clone())).collect(),
            Granularity::Service => vec![ResourceId::Service(self.component.clone())],
        }
    }

    async fn one_resource(&self, resource: ResourceId, time_range: [i64; 2]) -> Result<MetricsRecord, UtapiError> {
        let mut record = MetricsRecord::zeroed(resource.clone(), time_range);

        let intervals = utapi_core::interval::delta_intervals(time_range[0], time_range[1]);
        let mut commands = Vec::with_capacity(intervals.len() * (EventKind::ALL.len() + 2) + 4);
        let mut slots = Vec::with_capacity(intervals.len() * (EventKind::ALL.len() + 2));

        for interval_ms in intervals {
            for kind in EventKind::ALL {
                commands.push(Command::Get(utapi_schema::generate_key(&resource, kind.metric_name(), interval_ms)));
                slots.push(DeltaSlot::Operation(kind));
            }
            commands.push(Command::Get(utapi_schema::generate_key(&resource, MetricName::IncomingBytes.as_str(), interval_ms)));
            slots.push(DeltaSlot::IncomingBytes);
            commands.push(Command::Get(utapi_schema::generate_key(&resource, MetricName::OutgoingBytes.as_str(), interval_ms)));
            slots.push(DeltaSlot::OutgoingBytes);
        }

        let delta_command_count = commands.len();
        // Exactly four nearest-neighbor lookups (SPEC_FULL.md §4.4, "Batch
        // construction per resource"), appended to the same pipelined batch.
        // The nearest predecessor is strictly before the boundary: a sample
        // resampled at a score equal to the boundary itself belongs to the
        // interval starting at that boundary, not to the state as of just
        // before it, so the upper bound is `boundary - 1`, not `boundary`.
        let storage_state = utapi_schema::generate_state_key(&resource, MetricName::StorageUtilized);
        let objects_state = utapi_schema::generate_state_key(&resource, MetricName::NumberOfObjects);
        for (key, score) in [
            (storage_state.clone(), time_range[0]),
            (storage_state, time_range[1]),
            (objects_state.clone(), time_range[0]),
            (objects_state, time_range[1]),
        ] {
            commands.push(Command::ZRevRangeByScore {
                key,
                max: ScoreBound::Exact(score - 1),
                min: ScoreBound::NegInf,
                limit: Some((0, 1)),
            });
        }

        let results = self.store.batch(commands).await.map_err(|err| {
            tracing::error!(error = %err, resource = %record.resource, "read-path batch failed");
            UtapiError::internal(err.to_string())
        })?;

        for (slot, result) in slots.iter().zip(&results[..delta_command_count]) {
            let value = degraded_or_zero(result);
            match slot {
                DeltaSlot::Operation(kind) => {
                    let entry = record
                        .operations
                        .get_mut(&kind.wire_name())
                        .expect("every recognized operation is seeded by MetricsRecord::zeroed");
                    *entry += value;
                }
                DeltaSlot::IncomingBytes => record.incoming_bytes += value,
                DeltaSlot::OutgoingBytes => record.outgoing_bytes += value,
            }
        }

        let absolutes = &results[delta_command_count..];
        record.storage_utilized = [nearest_sample(&absolutes[0]), nearest_sample(&absolutes[1])];
        record.number_of_objects = [nearest_sample(&absolutes[2]), nearest_sample(&absolutes[3])];

        Ok(record)
    }
}

/// Degraded-read policy (SPEC_FULL.md §4.4, "Per-command failure policy"): a
/// failed sub-command is logged and folded in as zero; it never fails the
/// whole request.
fn degraded_or_zero(result: &CommandResult) -> i64 {
    match result {
        Ok(value) => value.as_i64_or_zero(),
        Err(err) => {
            tracing::warn!(error = %err, "read-path sub-command failed; treating as zero");
            0
        }
    }
}

/// An absolute sample: degraded-read policy, plus clamped to zero (a
/// missing or negative nearest-predecessor reads as zero).
fn nearest_sample(result: &CommandResult) -> i64 {
    degraded_or_zero(result).max(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use utapi_core::{GranularitySet, PushMetricParams};
    use utapi_store::InMemoryStore;

    async fn create_bucket_and_put(store: &InMemoryStore, bucket: &str, interval_ms: i64, new_byte_length: i64) {
        let client = utapi_client::Client::new(store.clone(), GranularitySet::all(), "utapi-test");
        let _guard = pin_time(interval_ms);
        client
            .push_metric(EventKind::CreateBucket, "r1", PushMetricParams { bucket: Some(bucket.into()), ..Default::default() })
            .await
            .unwrap();
        client
            .push_metric(
                EventKind::PutObject,
                "r2",
                PushMetricParams { bucket: Some(bucket.into()), new_byte_length: Some(new_byte_length), ..Default::default() },
            )
            .await
            .unwrap();
    }

    fn pin_time(epoch_ms: i64) -> utapi_timesource::ThreadLocalTimeSourceGuard {
        use std::time::{Duration, UNIX_EPOCH};
        let system_time = UNIX_EPOCH + Duration::from_millis(epoch_ms as u64);
        utapi_timesource::set_time_source(utapi_timesource::TimeSource::custom(
            utapi_timesource::fakes::StaticTimeSource::at_time(system_time),
        ))
    }

    #[tokio::test]
    async fn create_bucket_then_put_object_round_trips_through_list_metrics() {
        let store = InMemoryStore::new();
        create_bucket_and_put(&store, "b", 0, 1024).await;

        let lister = ListMetrics::new(&store, Granularity::Bucket, "utapi-test");
        let request = ListMetricsRequest { resources: vec!["b".into()], time_range: [0, 15 * 60_000] };
        let records = lister.list(request, DEFAULT_CONCURRENCY).await.unwrap();

        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.storage_utilized, [0, 1024]);
        assert_eq!(record.number_of_objects, [0, 1]);
        assert_eq!(record.incoming_bytes, 1024);
        assert_eq!(record.operations["s3:CreateBucket"], 1);
        assert_eq!(record.operations["s3:PutObject"], 1);
    }

    #[tokio::test]
    async fn zero_length_range_has_zero_deltas_and_matching_absolutes() {
        let store = InMemoryStore::new();
        create_bucket_and_put(&store, "b", 0, 1024).await;

        let lister = ListMetrics::new(&store, Granularity::Bucket, "utapi-test");
        let request = ListMetricsRequest { resources: vec!["b".into()], time_range: [0, 0] };
        let records = lister.list(request, DEFAULT_CONCURRENCY).await.unwrap();

        let record = &records[0];
        assert_eq!(record.incoming_bytes, 0);
        assert_eq!(record.storage_utilized[0], record.storage_utilized[1]);
    }

    #[tokio::test]
    async fn range_before_any_event_reads_absolutes_as_zero() {
        let store = InMemoryStore::new();
        create_bucket_and_put(&store, "b", 15 * 60_000, 1024).await;

        let lister = ListMetrics::new(&store, Granularity::Bucket, "utapi-test");
        let request = ListMetricsRequest { resources: vec!["b".into()], time_range: [0, 15 * 60_000] };
        let records = lister.list(request, DEFAULT_CONCURRENCY).await.unwrap();

        assert_eq!(records[0].storage_utilized, [0, 0]);
    }

    #[tokio::test]
    async fn service_family_ignores_the_resources_list_and_uses_the_component_name() {
        let store = InMemoryStore::new();
        let lister = ListMetrics::new(&store, Granularity::Service, "utapi-test");
        let request = ListMetricsRequest { resources: vec![], time_range: [0, 1000] };
        let records = lister.list(request, DEFAULT_CONCURRENCY).await.unwrap();
        assert_eq!(records.len(), 1);
        assert!(matches!(&records[0].resource, ResourceId::Service(name) if name == "utapi-test"));
    }

    #[tokio::test]
    async fn inverted_time_range_is_a_precondition_failure() {
        let store = InMemoryStore::new();
        let lister = ListMetrics::new(&store, Granularity::Bucket, "utapi-test");
        let request = ListMetricsRequest { resources: vec!["b".into()], time_range: [1000, 0] };
        let result = lister.list(request, DEFAULT_CONCURRENCY).await;
        assert!(matches!(result, Err(err) if err.is_precondition()));
    }

    #[tokio::test]
    async fn a_day_plus_one_interval_batch_issues_the_documented_command_count() {
        // 97 intervals: one day (96) plus the partial interval straddling
        // the range boundary, matching SPEC_FULL.md §4.4 scenario 6.
        let one_day_plus_one = 97 * 15 * 60_000;
        let intervals = utapi_core::interval::delta_intervals(0, one_day_plus_one);
        assert_eq!(intervals.len(), 97);
        assert_eq!(intervals.len() * (EventKind::ALL.len() + 2), 97 * 25);
    }
}
