//! Automatic numbering for markdown headings
//!
//! Documents are plain markdown files. Each document can carry its own
//! numbering configuration in a `number headings` front-matter field, and a
//! folder of documents can share defaults from a `numbering.toml` file.

pub mod domain;
pub use domain::{NumberingPass, NumberingSettings, NumberingStyle, NumberingToken};

/// Filesystem storage and directory-wide numbering passes.
pub mod storage;
pub use storage::{Directory, MarkdownDocument};
