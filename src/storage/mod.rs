//! Content store backends for product file uploads

pub mod s3;

pub use s3::S3ContentStore;
