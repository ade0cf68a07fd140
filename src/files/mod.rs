//! Local file helpers: glob expansion and checksums

pub mod checksum;
pub mod globs;

pub use checksum::{md5_file, sha256_file};
pub use globs::Globber;
