//! Reading, numbering, and writing markdown documents on disk.

pub mod directory;
pub mod document;
pub mod front_matter;

pub use directory::{Directory, DirectoryPassError, PassOptions, PassReport};
pub use document::{LoadError, MarkdownDocument, NumberingOutcome};
pub use front_matter::{
    COMPACT_SETTINGS_KEY, front_matter_settings_or_alternative,
    settings_to_compact_front_matter_value,
};
