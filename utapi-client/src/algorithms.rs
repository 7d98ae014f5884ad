//! The six write algorithms a classified [`EventKind`] is executed through
//! (SPEC_FULL.md §4.3).
//!
//! Every function here only *builds* the command batches for one resource;
//! [`crate::Client::push_metric`] is the one that executes them and
//! interprets the results. Keeping batch construction pure makes the
//! per-algorithm command shapes straightforward to unit test without a store.

use utapi_core::{MetricName, ResourceId};
use utapi_store::Command;

/// `incr R:{op}:{interval}`, optionally preceded by an `incrby` against a
/// traffic key — algorithm 1.
pub fn generic_increment(
    resource: &ResourceId,
    op_metric: &str,
    interval_ms: i64,
    traffic: Option<(MetricName, i64)>,
) -> Vec<Command> {
    let mut commands = Vec::with_capacity(2);
    if let Some((metric, amount)) = traffic {
        let key = utapi_schema::generate_key(resource, metric.as_str(), interval_ms);
        commands.push(Command::IncrBy(key, amount));
    }
    let op_key = utapi_schema::generate_key(resource, op_metric, interval_ms);
    commands.push(Command::Incr(op_key));
    commands
}

/// Zero both absolute counters, sample both at zero, and set/increment the
/// operation counter — algorithm 2.
///
/// `op_counter_starts_at_one` is `true` at bucket granularity (a bucket is
/// created exactly once) and `false` at account/service granularity, where
/// the same component can see many `CreateBucket` events.
pub fn create_bucket(
    resource: &ResourceId,
    interval_ms: i64,
    op_counter_starts_at_one: bool,
) -> Vec<Command> {
    let mut commands = Vec::with_capacity(7);
    for metric in [MetricName::StorageUtilized, MetricName::NumberOfObjects] {
        commands.push(Command::Set(utapi_schema::generate_counter(resource, metric), 0));
        commands.extend(Command::resample(&utapi_schema::generate_state_key(resource, metric), interval_ms, 0));
    }
    let op_key = utapi_schema::generate_key(resource, "CreateBucket", interval_ms);
    commands.push(if op_counter_starts_at_one { Command::Set(op_key, 1) } else { Command::Incr(op_key) });
    commands
}

/// The first batch of algorithm 3: grow `storageUtilized` and
/// `incomingBytes` by `new_byte_length`, increment the operation counter.
/// Returns the index of the `storageUtilized` counter's reply within the
/// batch so the caller can re-sample it in a second batch.
pub fn upload_part_first_batch(resource: &ResourceId, interval_ms: i64, new_byte_length: i64) -> Vec<Command> {
    vec![
        Command::IncrBy(utapi_schema::generate_counter(resource, MetricName::StorageUtilized), new_byte_length),
        Command::IncrBy(
            utapi_schema::generate_key(resource, MetricName::IncomingBytes.as_str(), interval_ms),
            new_byte_length,
        ),
        Command::Incr(utapi_schema::generate_key(resource, "UploadPart", interval_ms)),
    ]
}

/// The first batch of algorithm 4: increment `numberOfObjects`, increment
/// the operation counter.
pub fn complete_multipart_upload_first_batch(resource: &ResourceId, interval_ms: i64) -> Vec<Command> {
    vec![
        Command::Incr(utapi_schema::generate_counter(resource, MetricName::NumberOfObjects)),
        Command::Incr(utapi_schema::generate_key(resource, "CompleteMultipartUpload", interval_ms)),
    ]
}

/// The first batch of algorithm 5 (`PutObject`/`CopyObject`).
///
/// `delta_storage` is `new_byte_length - old_byte_length.unwrap_or(0)`.
/// `is_new_object` is `old_byte_length.is_none()`: a genuinely new object
/// increments `numberOfObjects`; an overwrite reads the counter's current
/// value instead (via a zero-amount `incrby`, which is atomic and
/// side-effect-free) so the caller still has a value to re-sample.
/// `traffic` carries `(IncomingBytes, new_byte_length)` for `PutObject` only
/// (`CopyObject` never touches traffic, matching spec.md §4.3).
pub fn put_or_copy_object_first_batch(
    resource: &ResourceId,
    interval_ms: i64,
    op_metric: &str,
    delta_storage: i64,
    is_new_object: bool,
    traffic: Option<(MetricName, i64)>,
) -> Vec<Command> {
    let mut commands = Vec::with_capacity(4);
    commands.push(Command::IncrBy(utapi_schema::generate_counter(resource, MetricName::StorageUtilized), delta_storage));
    let objects_counter = utapi_schema::generate_counter(resource, MetricName::NumberOfObjects);
    commands.push(if is_new_object { Command::Incr(objects_counter) } else { Command::IncrBy(objects_counter, 0) });
    if let Some((metric, amount)) = traffic {
        commands.push(Command::IncrBy(utapi_schema::generate_key(resource, metric.as_str(), interval_ms), amount));
    }
    commands.push(Command::Incr(utapi_schema::generate_key(resource, op_metric, interval_ms)));
    commands
}

/// The first batch of algorithm 6 (`DeleteObject`/`MultiObjectDelete`):
/// shrink both absolute counters and increment the operation counter. The
/// counters are left exactly as decremented, possibly negative — clamping
/// happens only when the sample is written (SPEC_FULL.md §9, "Negative-counter
/// race").
pub fn delete_object_first_batch(
    resource: &ResourceId,
    interval_ms: i64,
    op_metric: &str,
    byte_length: i64,
    number_of_objects: i64,
) -> Vec<Command> {
    vec![
        Command::DecrBy(utapi_schema::generate_counter(resource, MetricName::StorageUtilized), byte_length),
        Command::DecrBy(utapi_schema::generate_counter(resource, MetricName::NumberOfObjects), number_of_objects),
        Command::Incr(utapi_schema::generate_key(resource, op_metric, interval_ms)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bucket() -> ResourceId {
        ResourceId::Bucket("b".into())
    }

    #[test]
    fn generic_increment_without_traffic_is_a_single_command() {
        let commands = generic_increment(&bucket(), "HeadObject", 0, None);
        assert_eq!(commands.len(), 1);
        assert!(matches!(&commands[0], Command::Incr(key) if key.ends_with("HeadObject:0")));
    }

    #[test]
    fn generic_increment_with_traffic_prefixes_incrby() {
        let commands = generic_increment(&bucket(), "GetObject", 0, Some((MetricName::OutgoingBytes, 512)));
        assert_eq!(commands.len(), 2);
        assert!(matches!(&commands[0], Command::IncrBy(key, 512) if key.contains("outgoingBytes")));
    }

    #[test]
    fn create_bucket_zeroes_and_samples_both_absolutes() {
        let commands = create_bucket(&bucket(), 0, true);
        // 2 absolutes * (1 set + 2 resample commands) + 1 op counter command.
        assert_eq!(commands.len(), 7);
        assert!(matches!(&commands.last().unwrap(), Command::Set(_, 1)));
    }

    #[test]
    fn create_bucket_increments_op_counter_above_bucket_granularity() {
        let commands = create_bucket(&bucket(), 0, false);
        assert!(matches!(&commands.last().unwrap(), Command::Incr(_)));
    }

    #[test]
    fn overwrite_reads_object_counter_without_mutating_it() {
        let commands = put_or_copy_object_first_batch(&bucket(), 0, "PutObject", 50, false, None);
        assert!(matches!(&commands[1], Command::IncrBy(_, 0)));
    }
}
