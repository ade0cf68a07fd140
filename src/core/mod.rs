//! Core building blocks shared by every command
//!
//! - **config**: request and response types exchanged with Concourse
//! - **error**: error types with exit codes and contextual help messages

pub mod config;
pub mod error;
