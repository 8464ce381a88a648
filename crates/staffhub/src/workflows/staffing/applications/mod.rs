//! Application Bucket Manager: seeker applications against a job's helper quota and the
//! total-applications cap (`helpers_needed * 2`).

pub mod bucket;
pub(crate) mod custom_fields;
pub mod service;

pub use bucket::{BucketPolicy, BucketSnapshot, BUCKET_MULTIPLIER};
pub use custom_fields::CustomFieldError;
pub use service::ApplicationBucketService;
