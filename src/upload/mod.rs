// ABOUTME: Object upload module
// ABOUTME: Upload job, key layout, the sequential uploader, and the S3 sink

pub mod job;
pub mod keys;
pub mod s3;
pub mod uploader;

pub use job::UploadJob;
pub use s3::S3Sink;
pub use uploader::{upload_to_s3, FailedUpload, ObjectSink, UploadReport, UploadedObject};
