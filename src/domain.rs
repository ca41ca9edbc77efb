//! Domain models for heading numbering.
//!
//! This module contains the core types: numbering styles and their
//! arithmetic, per-level counter tokens, the numbering pass, and the
//! per-document settings.

/// Numbering styles and numeral-system arithmetic.
pub mod style;
pub use style::{InvalidStyleError, NumberingStyle};

/// Counter tokens, the label renderer, and the seed resolver.
pub mod token;
pub use token::{
    NumberingStack, NumberingToken, make_numbering_string, start_at_or_zeroth_in_style,
};

mod numbering;
pub use numbering::NumberingPass;

/// Per-document settings and their validity predicates.
pub mod settings;
pub use settings::{BlockId, NumberingSettings, SettingsOverrides, is_valid_numbering_value_string};
