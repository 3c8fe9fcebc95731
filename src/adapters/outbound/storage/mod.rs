// Infrastructure error translation
pub mod error;

// Shared object code path
pub mod bucket_objects;

// Backend implementations
pub mod mock;
pub mod s3;

// Re-export key types
pub use bucket_objects::BucketObjects;
pub use mock::MockStore;
pub use s3::{ConnectionSettings, S3Backend, S3Connector};
