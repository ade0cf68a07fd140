//! Terminal output on stderr: logging and progress bars
//!
//! stdout carries the JSON response, so nothing in here may write to it.

pub mod logging;
pub mod progress;
