//! The write-path client: `pushMetric`'s fan-out, classification, and
//! per-algorithm execution (SPEC_FULL.md §4.3).

use std::time::UNIX_EPOCH;

use utapi_core::{EventKind, Granularity, GranularitySet, MetricName, PushMetricParams, ResourceId, UtapiError, WriteAlgorithm};
use utapi_store::{Command, CommandResult, Datastore};

use crate::algorithms;

/// The write-path entry point: one client per deployed component
/// (SPEC_FULL.md §9, "Global-ish client object" → an explicitly constructed,
/// immutable-after-start object, rather than the source's process-wide
/// mutable singleton).
pub struct Client<D> {
    store: Option<D>,
    granularities: GranularitySet,
    component: String,
}

impl<D: Datastore> Client<D> {
    /// A client backed by a real [`Datastore`].
    pub fn new(store: D, granularities: GranularitySet, component: impl Into<String>) -> Self {
        Self { store: Some(store), granularities, component: component.into() }
    }

    /// A client with no backing store configured: every [`Client::push_metric`]
    /// call succeeds without side effects (SPEC_FULL.md §4.3, "Configuration
    /// and guards").
    pub fn disabled(granularities: GranularitySet, component: impl Into<String>) -> Self {
        Self { store: None, granularities, component: component.into() }
    }

    /// `true` if this client has no backing store and is silently dropping writes.
    pub fn is_disabled(&self) -> bool {
        self.store.is_none()
    }

    /// Record one event. Property-type checks run before any store I/O; if
    /// they pass and a store is configured, the event is fanned out to every
    /// configured granularity present in `params` and applied independently
    /// at each.
    #[tracing::instrument(skip(self, params), fields(request_id = %request_id, event = %kind))]
    pub async fn push_metric(
        &self,
        kind: EventKind,
        request_id: &str,
        params: PushMetricParams,
    ) -> Result<(), UtapiError> {
        params.validate(kind)?;

        let Some(store) = &self.store else {
            tracing::debug!("client has no backing store configured; push_metric is a no-op");
            return Ok(());
        };

        let interval_ms = utapi_core::interval::normalize_interval_ms(current_epoch_ms());

        for resource in self.resources_for(&params) {
            self.apply_algorithm(store, &resource, kind, interval_ms, &params).await?;
        }
        Ok(())
    }

    /// The resources this event fans out to: the configured granularity set
    /// intersected with the granularities present in `params`, with `service`
    /// always populated from the configured component name (SPEC_FULL.md
    /// §4.3, "Fan-out").
    fn resources_for(&self, params: &PushMetricParams) -> Vec<ResourceId> {
        let mut resources = Vec::with_capacity(3);
        if self.granularities.contains(Granularity::Bucket) {
            if let Some(bucket) = &params.bucket {
                resources.push(ResourceId::Bucket(bucket.clone()));
            }
        }
        if self.granularities.contains(Granularity::Account) {
            if let Some(account_id) = &params.account_id {
                resources.push(ResourceId::Account(account_id.clone()));
            }
        }
        if self.granularities.contains(Granularity::Service) {
            resources.push(ResourceId::Service(self.component.clone()));
        }
        resources
    }

    async fn apply_algorithm(
        &self,
        store: &D,
        resource: &ResourceId,
        kind: EventKind,
        interval_ms: i64,
        params: &PushMetricParams,
    ) -> Result<(), UtapiError> {
        match kind.algorithm() {
            WriteAlgorithm::GenericIncrement => {
                let traffic = matches!(kind, EventKind::GetObject)
                    .then(|| params.byte_length)
                    .flatten()
                    .map(|n| (MetricName::OutgoingBytes, n));
                let commands = algorithms::generic_increment(resource, kind.metric_name(), interval_ms, traffic);
                self.run_batch(store, commands).await?;
                Ok(())
            }
            WriteAlgorithm::CreateBucket => {
                let commands =
                    algorithms::create_bucket(resource, interval_ms, resource.granularity() == Granularity::Bucket);
                self.run_batch(store, commands).await?;
                Ok(())
            }
            WriteAlgorithm::UploadPart => {
                let new_byte_length = params.new_byte_length.expect("validated by PushMetricParams::validate");
                let commands = algorithms::upload_part_first_batch(resource, interval_ms, new_byte_length);
                let results = self.run_batch(store, commands).await?;
                let storage_value = reply_as_i64(&results, 0)?;
                self.resample_one(store, resource, MetricName::StorageUtilized, interval_ms, storage_value).await
            }
            WriteAlgorithm::CompleteMultipartUpload => {
                let commands = algorithms::complete_multipart_upload_first_batch(resource, interval_ms);
                let results = self.run_batch(store, commands).await?;
                let objects_value = reply_as_i64(&results, 0)?;
                self.resample_one(store, resource, MetricName::NumberOfObjects, interval_ms, objects_value).await
            }
            WriteAlgorithm::PutOrCopyObject => {
                let new_byte_length = params.new_byte_length.expect("validated by PushMetricParams::validate");
                let delta_storage = new_byte_length - params.old_byte_length.unwrap_or(0);
                let is_new_object = params.old_byte_length.is_none();
                let traffic =
                    matches!(kind, EventKind::PutObject).then_some((MetricName::IncomingBytes, new_byte_length));
                let commands = algorithms::put_or_copy_object_first_batch(
                    resource,
                    interval_ms,
                    kind.metric_name(),
                    delta_storage,
                    is_new_object,
                    traffic,
                );
                let results = self.run_batch(store, commands).await?;
                let storage_value = reply_as_i64(&results, 0)?;
                let objects_value = reply_as_i64(&results, 1)?;
                self.resample_both(store, resource, interval_ms, storage_value, objects_value).await
            }
            WriteAlgorithm::DeleteObject => {
                let byte_length = params.byte_length.expect("validated by PushMetricParams::validate");
                let number_of_objects = params.number_of_objects.expect("validated by PushMetricParams::validate");
                let commands =
                    algorithms::delete_object_first_batch(resource, interval_ms, kind.metric_name(), byte_length, number_of_objects);
                let results = self.run_batch(store, commands).await?;
                // Clamped only at the sample, never at the counter itself
                // (SPEC_FULL.md §9, "Negative-counter race").
                let storage_value = reply_as_i64(&results, 0)?.max(0);
                let objects_value = reply_as_i64(&results, 1)?.max(0);
                self.resample_both(store, resource, interval_ms, storage_value, objects_value).await
            }
        }
    }

    async fn resample_one(
        &self,
        store: &D,
        resource: &ResourceId,
        metric: MetricName,
        interval_ms: i64,
        value: i64,
    ) -> Result<(), UtapiError> {
        let state_key = utapi_schema::generate_state_key(resource, metric);
        self.run_batch(store, Command::resample(&state_key, interval_ms, value).to_vec()).await?;
        Ok(())
    }

    async fn resample_both(
        &self,
        store: &D,
        resource: &ResourceId,
        interval_ms: i64,
        storage_value: i64,
        objects_value: i64,
    ) -> Result<(), UtapiError> {
        let storage_key = utapi_schema::generate_state_key(resource, MetricName::StorageUtilized);
        let objects_key = utapi_schema::generate_state_key(resource, MetricName::NumberOfObjects);
        let mut commands = Command::resample(&storage_key, interval_ms, storage_value).to_vec();
        commands.extend(Command::resample(&objects_key, interval_ms, objects_value));
        self.run_batch(store, commands).await?;
        Ok(())
    }

    /// Execute a batch and enforce the write-path failure policy: a
    /// transport-level error, or any individual command's error, fails the
    /// whole push with the same opaque `"internal error"` (SPEC_FULL.md
    /// §4.3, "Failure policy").
    async fn run_batch(&self, store: &D, commands: Vec<Command>) -> Result<Vec<CommandResult>, UtapiError> {
        let results = store.batch(commands).await.map_err(|err| {
            tracing::error!(error = %err, "backing store batch failed");
            UtapiError::internal(err.to_string())
        })?;
        for result in &results {
            if let Err(err) = result {
                tracing::error!(error = %err, "backing store command failed");
                return Err(UtapiError::internal(err.to_string()));
            }
        }
        Ok(results)
    }
}

fn reply_as_i64(results: &[CommandResult], index: usize) -> Result<i64, UtapiError> {
    match results.get(index) {
        Some(Ok(value)) => Ok(value.as_i64_or_zero()),
        Some(Err(err)) => Err(UtapiError::internal(err.to_string())),
        None => Err(UtapiError::internal("missing expected batch reply")),
    }
}

fn current_epoch_ms() -> i64 {
    utapi_timesource::time_source()
        .system_time()
        .as_std()
        .duration_since(UNIX_EPOCH)
        .expect("system time is never before the Unix epoch")
        .as_millis() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use utapi_store::InMemoryStore;
    use utapi_timesource::{TimeSource, fakes::StaticTimeSource};

    fn pinned_at(epoch_ms: i64) -> utapi_timesource::ThreadLocalTimeSourceGuard {
        let system_time = UNIX_EPOCH + std::time::Duration::from_millis(epoch_ms as u64);
        utapi_timesource::set_time_source(TimeSource::custom(StaticTimeSource::at_time(system_time)))
    }

    async fn read_counter(store: &InMemoryStore, resource: &ResourceId, metric: MetricName) -> i64 {
        store.get(&utapi_schema::generate_counter(resource, metric)).await.unwrap().unwrap_or(0)
    }

    #[tokio::test]
    async fn create_bucket_round_trip() {
        let _time = pinned_at(1_500_000_000_000);
        let store = InMemoryStore::new();
        let client = Client::new(store.clone(), GranularitySet::all(), "utapi-test");
        let resource = ResourceId::Bucket("b".into());

        client
            .push_metric(EventKind::CreateBucket, "req-1", PushMetricParams { bucket: Some("b".into()), ..Default::default() })
            .await
            .unwrap();

        assert_eq!(read_counter(&store, &resource, MetricName::StorageUtilized).await, 0);
        assert_eq!(read_counter(&store, &resource, MetricName::NumberOfObjects).await, 0);
        let op_key = utapi_schema::generate_key(&resource, "CreateBucket", 1_500_000_000_000);
        assert_eq!(store.get(&op_key).await.unwrap(), Some(1));
    }

    #[tokio::test]
    async fn put_object_new_object_increments_both_counters() {
        let _time = pinned_at(0);
        let store = InMemoryStore::new();
        let client = Client::new(store.clone(), GranularitySet::all(), "utapi-test");
        let resource = ResourceId::Bucket("b".into());

        client
            .push_metric(
                EventKind::PutObject,
                "req-1",
                PushMetricParams { bucket: Some("b".into()), new_byte_length: Some(100), ..Default::default() },
            )
            .await
            .unwrap();

        assert_eq!(read_counter(&store, &resource, MetricName::StorageUtilized).await, 100);
        assert_eq!(read_counter(&store, &resource, MetricName::NumberOfObjects).await, 1);
        let incoming_key = utapi_schema::generate_key(&resource, MetricName::IncomingBytes.as_str(), 0);
        assert_eq!(store.get(&incoming_key).await.unwrap(), Some(100));
    }

    #[tokio::test]
    async fn put_object_overwrite_leaves_object_count_unchanged() {
        let _time = pinned_at(0);
        let store = InMemoryStore::new();
        let client = Client::new(store.clone(), GranularitySet::all(), "utapi-test");
        let resource = ResourceId::Bucket("b".into());
        let params = PushMetricParams { bucket: Some("b".into()), ..Default::default() };

        client
            .push_metric(EventKind::PutObject, "req-1", PushMetricParams { new_byte_length: Some(100), ..params.clone() })
            .await
            .unwrap();
        client
            .push_metric(
                EventKind::PutObject,
                "req-2",
                PushMetricParams { new_byte_length: Some(150), old_byte_length: Some(100), ..params },
            )
            .await
            .unwrap();

        assert_eq!(read_counter(&store, &resource, MetricName::StorageUtilized).await, 150);
        assert_eq!(read_counter(&store, &resource, MetricName::NumberOfObjects).await, 1);
    }

    #[tokio::test]
    async fn delete_object_never_drives_the_counter_below_zero_at_read() {
        let _time = pinned_at(0);
        let store = InMemoryStore::new();
        let client = Client::new(store.clone(), GranularitySet::all(), "utapi-test");
        let resource = ResourceId::Bucket("b".into());

        client
            .push_metric(
                EventKind::DeleteObject,
                "req-1",
                PushMetricParams {
                    bucket: Some("b".into()),
                    byte_length: Some(500),
                    number_of_objects: Some(1),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        // The raw counter is allowed to go negative...
        assert_eq!(read_counter(&store, &resource, MetricName::StorageUtilized).await, -500);
        // ...but the sample written into the state set is clamped to zero.
        let state_key = utapi_schema::generate_state_key(&resource, MetricName::StorageUtilized);
        let sample = store
            .zrevrangebyscore(&state_key, utapi_store::ScoreBound::Exact(0), utapi_store::ScoreBound::NegInf, Some((0, 1)))
            .await
            .unwrap();
        assert_eq!(sample, vec!["0".to_string()]);
    }

    #[tokio::test]
    async fn account_only_event_does_not_touch_bucket_keys() {
        let _time = pinned_at(0);
        let store = InMemoryStore::new();
        let client = Client::new(store.clone(), GranularitySet::from_levels([Granularity::Account]), "utapi-test");

        client
            .push_metric(
                EventKind::HeadBucket,
                "req-1",
                PushMetricParams { bucket: Some("b".into()), account_id: Some("a1".into()), ..Default::default() },
            )
            .await
            .unwrap();

        let bucket_key = utapi_schema::generate_key(&ResourceId::Bucket("b".into()), "HeadBucket", 0);
        assert_eq!(store.get(&bucket_key).await.unwrap(), None);
        let account_key = utapi_schema::generate_key(&ResourceId::Account("a1".into()), "HeadBucket", 0);
        assert_eq!(store.get(&account_key).await.unwrap(), Some(1));
    }

    #[tokio::test]
    async fn disabled_client_is_a_silent_no_op() {
        let client: Client<InMemoryStore> = Client::disabled(GranularitySet::all(), "utapi-test");
        let result = client
            .push_metric(EventKind::CreateBucket, "req-1", PushMetricParams { bucket: Some("b".into()), ..Default::default() })
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn missing_resource_identifier_is_a_precondition_failure() {
        let store = InMemoryStore::new();
        let client = Client::new(store, GranularitySet::all(), "utapi-test");
        let result = client.push_metric(EventKind::HeadBucket, "req-1", PushMetricParams::default()).await;
        assert!(matches!(result, Err(err) if err.is_precondition()));
    }

    #[tokio::test]
    async fn concurrent_put_objects_on_the_same_interval_commute() {
        let _time = pinned_at(0);
        let store = InMemoryStore::new();
        let client = Client::new(store.clone(), GranularitySet::all(), "utapi-test");
        let resource = ResourceId::Bucket("b".into());
        let params = PushMetricParams { bucket: Some("b".into()), new_byte_length: Some(500), ..Default::default() };

        client.push_metric(EventKind::PutObject, "req-1", params.clone()).await.unwrap();
        client.push_metric(EventKind::PutObject, "req-2", params).await.unwrap();

        assert_eq!(read_counter(&store, &resource, MetricName::StorageUtilized).await, 1000);
        let op_key = utapi_schema::generate_key(&resource, "PutObject", 0);
        assert_eq!(store.get(&op_key).await.unwrap(), Some(2));
    }
}
