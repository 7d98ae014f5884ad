//! The enumerated operation kinds a [`pushMetric`](crate) call can report,
//! and the write algorithm each is classified into.

use std::fmt;

/// One of the ~22 recognized S3-style operations UTAPI accounts for.
///
/// A closed enum rather than a string, per the design note in SPEC_FULL.md
/// §4.3: the compiler enforces exhaustiveness in [`EventKind::algorithm`]
/// when a new operation is added, instead of relying on a string-keyed
/// dispatch table falling through silently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKind {
    CreateBucket,
    DeleteBucket,
    ListBucket,
    GetBucketAcl,
    PutBucketAcl,
    PutBucketWebsite,
    GetBucketWebsite,
    DeleteBucketWebsite,
    PutObject,
    CopyObject,
    UploadPart,
    ListBucketMultipartUploads,
    ListMultipartUploadParts,
    InitiateMultipartUpload,
    CompleteMultipartUpload,
    AbortMultipartUpload,
    DeleteObject,
    MultiObjectDelete,
    GetObject,
    GetObjectAcl,
    PutObjectAcl,
    HeadBucket,
    HeadObject,
}

/// The write algorithm an [`EventKind`] is classified into (SPEC_FULL.md §4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteAlgorithm {
    /// Algorithm 1: increment the operation counter, optionally preceded by a
    /// traffic-delta `incrby`.
    GenericIncrement,
    /// Algorithm 2: initialize both absolute counters to zero and sample them.
    CreateBucket,
    /// Algorithm 3: grow `storageUtilized` and `incomingBytes` by the new part's
    /// length, then re-sample `storageUtilized`.
    UploadPart,
    /// Algorithm 4: increment `numberOfObjects` and re-sample it.
    CompleteMultipartUpload,
    /// Algorithm 5: reconcile `storageUtilized` (and, for new objects,
    /// `numberOfObjects`) against an optional previous byte length.
    PutOrCopyObject,
    /// Algorithm 6: shrink both absolutes and clamp their samples at zero.
    DeleteObject,
}

impl EventKind {
    /// All recognized operations, in the order SPEC_FULL.md §3 lists them.
    pub const ALL: [EventKind; 23] = [
        EventKind::CreateBucket,
        EventKind::DeleteBucket,
        EventKind::ListBucket,
        EventKind::GetBucketAcl,
        EventKind::PutBucketAcl,
        EventKind::PutBucketWebsite,
        EventKind::GetBucketWebsite,
        EventKind::DeleteBucketWebsite,
        EventKind::PutObject,
        EventKind::CopyObject,
        EventKind::UploadPart,
        EventKind::ListBucketMultipartUploads,
        EventKind::ListMultipartUploadParts,
        EventKind::InitiateMultipartUpload,
        EventKind::CompleteMultipartUpload,
        EventKind::AbortMultipartUpload,
        EventKind::DeleteObject,
        EventKind::MultiObjectDelete,
        EventKind::GetObject,
        EventKind::GetObjectAcl,
        EventKind::PutObjectAcl,
        EventKind::HeadBucket,
        EventKind::HeadObject,
    ];

    /// The bare operation name as stored in schema keys, e.g. `"PutObject"`.
    ///
    /// Per the Open Question resolved in SPEC_FULL.md §3, multipart listing's
    /// canonical stored name is `listBucketMultipartUploads`, not
    /// `listMultipartUploads`.
    pub fn metric_name(self) -> &'static str {
        match self {
            EventKind::CreateBucket => "CreateBucket",
            EventKind::DeleteBucket => "DeleteBucket",
            EventKind::ListBucket => "ListBucket",
            EventKind::GetBucketAcl => "GetBucketAcl",
            EventKind::PutBucketAcl => "PutBucketAcl",
            EventKind::PutBucketWebsite => "PutBucketWebsite",
            EventKind::GetBucketWebsite => "GetBucketWebsite",
            EventKind::DeleteBucketWebsite => "DeleteBucketWebsite",
            EventKind::PutObject => "PutObject",
            EventKind::CopyObject => "CopyObject",
            EventKind::UploadPart => "UploadPart",
            EventKind::ListBucketMultipartUploads => "listBucketMultipartUploads",
            EventKind::ListMultipartUploadParts => "ListMultipartUploadParts",
            EventKind::InitiateMultipartUpload => "InitiateMultipartUpload",
            EventKind::CompleteMultipartUpload => "CompleteMultipartUpload",
            EventKind::AbortMultipartUpload => "AbortMultipartUpload",
            EventKind::DeleteObject => "DeleteObject",
            EventKind::MultiObjectDelete => "MultiObjectDelete",
            EventKind::GetObject => "GetObject",
            EventKind::GetObjectAcl => "GetObjectAcl",
            EventKind::PutObjectAcl => "PutObjectAcl",
            EventKind::HeadBucket => "HeadBucket",
            EventKind::HeadObject => "HeadObject",
        }
    }

    /// The wire-format operation name used in a `ListMetrics` response, e.g.
    /// `"s3:PutObject"` (SPEC_FULL.md §6).
    pub fn wire_name(self) -> String {
        format!("s3:{}", self.metric_name())
    }

    /// Parse a bare stored operation name (as returned by
    /// [`EventKind::metric_name`]) back into an `EventKind`.
    pub fn from_metric_name(name: &str) -> Option<EventKind> {
        EventKind::ALL.into_iter().find(|kind| kind.metric_name() == name)
    }

    /// The write algorithm this operation is classified into.
    pub fn algorithm(self) -> WriteAlgorithm {
        match self {
            EventKind::CreateBucket => WriteAlgorithm::CreateBucket,
            EventKind::UploadPart => WriteAlgorithm::UploadPart,
            EventKind::CompleteMultipartUpload => WriteAlgorithm::CompleteMultipartUpload,
            EventKind::PutObject | EventKind::CopyObject => WriteAlgorithm::PutOrCopyObject,
            EventKind::DeleteObject | EventKind::MultiObjectDelete => WriteAlgorithm::DeleteObject,
            EventKind::DeleteBucket
            | EventKind::ListBucket
            | EventKind::GetBucketAcl
            | EventKind::PutBucketAcl
            | EventKind::PutBucketWebsite
            | EventKind::GetBucketWebsite
            | EventKind::DeleteBucketWebsite
            | EventKind::ListBucketMultipartUploads
            | EventKind::ListMultipartUploadParts
            | EventKind::InitiateMultipartUpload
            | EventKind::AbortMultipartUpload
            | EventKind::GetObject
            | EventKind::GetObjectAcl
            | EventKind::PutObjectAcl
            | EventKind::HeadBucket
            | EventKind::HeadObject => WriteAlgorithm::GenericIncrement,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.metric_name())
    }
}
