//! The event payload accepted by `pushMetric` (SPEC_FULL.md §4.3).
//!
//! The original system accepts a loose, duck-typed record; here it is a
//! single typed struct carrying every optional numeric field, per the design
//! note in SPEC_FULL.md §9 ("Duck-typed `params`" → a typed event struct).

use crate::error::UtapiError;
use crate::event::{EventKind, WriteAlgorithm};

/// The payload of a single ingested event.
///
/// Any subset of the identifier fields may be set; [`PushMetricParams::granularities`]
/// derives which levels this event participates in. Numeric fields are
/// required or forbidden depending on the event's [`WriteAlgorithm`], checked
/// by [`PushMetricParams::validate`].
#[derive(Debug, Clone, Default)]
pub struct PushMetricParams {
    /// Bucket name, present when this event carries bucket-level information.
    pub bucket: Option<String>,
    /// Account id, present when this event carries account-level information.
    pub account_id: Option<String>,
    /// Raw byte length freed or transferred, used by delete and upload-part events.
    pub byte_length: Option<i64>,
    /// Byte length of the object state being written, used by put/copy/upload-part.
    pub new_byte_length: Option<i64>,
    /// Byte length of the object state being replaced, `None` means "new object".
    pub old_byte_length: Option<i64>,
    /// Count of objects affected, used by delete events.
    pub number_of_objects: Option<i64>,
}

impl PushMetricParams {
    /// Precondition-check the fields a given [`EventKind`] requires, matching
    /// SPEC_FULL.md §4.3's "Configuration and guards" (property-type checks
    /// enforced before the first store call).
    pub fn validate(&self, kind: EventKind) -> Result<(), UtapiError> {
        if self.bucket.is_none() && self.account_id.is_none() {
            return Err(UtapiError::precondition(
                "pushMetric requires at least one of bucket or accountId",
            ));
        }
        match kind.algorithm() {
            WriteAlgorithm::UploadPart => self.require_i64("newByteLength", self.new_byte_length),
            WriteAlgorithm::CompleteMultipartUpload => Ok(()),
            WriteAlgorithm::PutOrCopyObject => self.require_i64("newByteLength", self.new_byte_length),
            WriteAlgorithm::DeleteObject => {
                self.require_i64("byteLength", self.byte_length)?;
                self.require_i64("numberOfObjects", self.number_of_objects)
            }
            WriteAlgorithm::CreateBucket | WriteAlgorithm::GenericIncrement => Ok(()),
        }
    }

    fn require_i64(&self, field: &str, value: Option<i64>) -> Result<(), UtapiError> {
        if value.is_some() {
            Ok(())
        } else {
            Err(UtapiError::precondition(format!("missing required numeric property `{field}`")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_event_with_no_resource_identifier() {
        let params = PushMetricParams::default();
        assert!(params.validate(EventKind::HeadBucket).is_err());
    }

    #[test]
    fn upload_part_requires_new_byte_length() {
        let mut params = PushMetricParams { bucket: Some("b".into()), ..Default::default() };
        assert!(params.validate(EventKind::UploadPart).is_err());
        params.new_byte_length = Some(1024);
        assert!(params.validate(EventKind::UploadPart).is_ok());
    }

    #[test]
    fn delete_object_requires_both_byte_length_and_count() {
        let mut params = PushMetricParams { bucket: Some("b".into()), ..Default::default() };
        assert!(params.validate(EventKind::DeleteObject).is_err());
        params.byte_length = Some(100);
        assert!(params.validate(EventKind::DeleteObject).is_err());
        params.number_of_objects = Some(1);
        assert!(params.validate(EventKind::DeleteObject).is_ok());
    }

    #[test]
    fn generic_increment_has_no_numeric_requirements() {
        let params = PushMetricParams { bucket: Some("b".into()), ..Default::default() };
        assert!(params.validate(EventKind::HeadBucket).is_ok());
    }
}
