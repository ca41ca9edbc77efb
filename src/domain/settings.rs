use std::{fmt, path::Path, str::FromStr};

use non_empty_string::NonEmptyString;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::NumberingStyle;

/// Heading levels run from 1 (`#`) to 6 (`######`).
pub const MAX_HEADING_LEVEL: u32 = 6;

/// Checks that a value is usable as a first-level or max-level setting.
#[must_use]
pub fn is_valid_first_or_max_level(level: i64) -> bool {
    level >= 1 && level <= i64::from(MAX_HEADING_LEVEL)
}

/// Checks that a string is a recognised single-letter style code.
#[must_use]
pub fn is_valid_numbering_style_string(s: &str) -> bool {
    NumberingStyle::from_str(s).is_ok()
}

/// Checks that a string is usable as a "start at" value.
///
/// The compact line is comma-separated, so an embedded comma can never
/// survive a round trip and is rejected up front.
#[must_use]
pub fn is_valid_numbering_value_string(s: &str) -> bool {
    !s.is_empty() && !s.contains(',')
}

/// Checks that a string is usable as a block-id setting.
#[must_use]
pub fn is_valid_block_id_setting(s: &str) -> bool {
    BlockId::new(s).is_ok()
}

/// A validated block identifier, as written after a `^` anchor on a heading
/// line (e.g. `toc` for a heading ending in `^toc`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockId(NonEmptyString);

impl BlockId {
    /// Creates a new `BlockId`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidBlockIdError` if the string is empty or contains
    /// whitespace or commas, neither of which can appear in a block anchor
    /// or survive the comma-separated compact line.
    pub fn new(s: &str) -> Result<Self, InvalidBlockIdError> {
        if s.contains(',') || s.chars().any(char::is_whitespace) {
            return Err(InvalidBlockIdError(s.to_string()));
        }
        let non_empty =
            NonEmptyString::new(s.to_string()).map_err(|_| InvalidBlockIdError(s.to_string()))?;
        Ok(Self(non_empty))
    }

    /// Returns the string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for BlockId {
    type Err = InvalidBlockIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Serialize for BlockId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for BlockId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::new(&s).map_err(serde::de::Error::custom)
    }
}

/// Error returned when a string cannot be used as a block id.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("invalid block id '{0}': must be non-empty with no whitespace or commas")]
pub struct InvalidBlockIdError(String);

/// The per-document numbering configuration.
///
/// This is a plain value object: each numbering pass operates on an
/// immutable snapshot, and changes go through [`SettingsOverrides`] rather
/// than mutation of some shared default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Versions", into = "Versions")]
pub struct NumberingSettings {
    /// Numbering is switched off entirely; an update pass removes labels.
    pub off: bool,

    /// Renumber automatically whenever the document changes.
    pub auto: bool,

    /// The shallowest heading level that receives a number.
    pub first_level: u32,

    /// The deepest heading level that receives a number.
    pub max_level: u32,

    /// Leave level-1 headings unnumbered (legacy spelling of
    /// `first_level = 2`).
    pub skip_top_level: bool,

    /// Numbering style for level-1 headings.
    pub style_level_1: NumberingStyle,

    /// Numbering style for every other level.
    pub style_level_other: NumberingStyle,

    /// The value the first numbered heading starts at, in the style of its
    /// level. Empty means the style's natural first value.
    pub start_at: String,

    /// A literal prefix prepended to every label.
    pub prepend_value: String,

    /// Block id of a table-of-contents heading, which is never numbered.
    pub contents: Option<BlockId>,

    /// Block id marking headings to leave untouched.
    pub skip_headings: Option<BlockId>,

    /// Text appended after the last token of each label (e.g. `:` or `.`).
    pub separator: String,
}

impl Default for NumberingSettings {
    fn default() -> Self {
        Self {
            off: false,
            auto: false,
            first_level: 1,
            max_level: MAX_HEADING_LEVEL,
            skip_top_level: false,
            style_level_1: NumberingStyle::Decimal,
            style_level_other: NumberingStyle::Decimal,
            start_at: String::new(),
            prepend_value: String::new(),
            contents: None,
            skip_headings: None,
            separator: String::new(),
        }
    }
}

impl NumberingSettings {
    /// The shallowest level the numbering pass actually numbers, combining
    /// `first_level` with the legacy `skip_top_level` flag.
    #[must_use]
    pub const fn first_numbered_level(&self) -> u32 {
        if self.skip_top_level && self.first_level < 2 {
            2
        } else {
            self.first_level
        }
    }

    /// The style used at a given heading level.
    #[must_use]
    pub const fn style_for_level(&self, level: u32) -> NumberingStyle {
        if level == 1 {
            self.style_level_1
        } else {
            self.style_level_other
        }
    }

    /// Returns a copy of these settings with the given sparse overrides
    /// applied.
    #[must_use]
    pub fn with_overrides(&self, overrides: SettingsOverrides) -> Self {
        let mut merged = self.clone();
        let SettingsOverrides {
            off,
            auto,
            first_level,
            max_level,
            skip_top_level,
            style_level_1,
            style_level_other,
            start_at,
            prepend_value,
            contents,
            skip_headings,
            separator,
        } = overrides;

        if let Some(off) = off {
            merged.off = off;
        }
        if let Some(auto) = auto {
            merged.auto = auto;
        }
        if let Some(first_level) = first_level {
            merged.first_level = first_level;
        }
        if let Some(max_level) = max_level {
            merged.max_level = max_level;
        }
        if let Some(skip_top_level) = skip_top_level {
            merged.skip_top_level = skip_top_level;
        }
        if let Some(style) = style_level_1 {
            merged.style_level_1 = style;
        }
        if let Some(style) = style_level_other {
            merged.style_level_other = style;
        }
        if let Some(start_at) = start_at {
            merged.start_at = start_at;
        }
        if let Some(prepend_value) = prepend_value {
            merged.prepend_value = prepend_value;
        }
        if let Some(contents) = contents {
            merged.contents = contents;
        }
        if let Some(skip_headings) = skip_headings {
            merged.skip_headings = skip_headings;
        }
        if let Some(separator) = separator {
            merged.separator = separator;
        }

        merged
    }

    /// Loads tool-level default settings from a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the TOML content is
    /// invalid.
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read settings file: {e}"))?;
        toml::from_str(&content).map_err(|e| format!("Failed to parse settings file: {e}"))
    }

    /// Saves these settings to a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings cannot be serialized or the file
    /// cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), String> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize settings: {e}"))?;
        std::fs::write(path, content).map_err(|e| format!("Failed to write settings file: {e}"))
    }
}

/// A sparse set of settings changes.
///
/// `None` fields keep the base value; `Some` fields replace it. The two
/// optional block-id settings use a nested `Option` so an override can also
/// clear them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsOverrides {
    /// Override for [`NumberingSettings::off`].
    pub off: Option<bool>,
    /// Override for [`NumberingSettings::auto`].
    pub auto: Option<bool>,
    /// Override for [`NumberingSettings::first_level`].
    pub first_level: Option<u32>,
    /// Override for [`NumberingSettings::max_level`].
    pub max_level: Option<u32>,
    /// Override for [`NumberingSettings::skip_top_level`].
    pub skip_top_level: Option<bool>,
    /// Override for [`NumberingSettings::style_level_1`].
    pub style_level_1: Option<NumberingStyle>,
    /// Override for [`NumberingSettings::style_level_other`].
    pub style_level_other: Option<NumberingStyle>,
    /// Override for [`NumberingSettings::start_at`].
    pub start_at: Option<String>,
    /// Override for [`NumberingSettings::prepend_value`].
    pub prepend_value: Option<String>,
    /// Override for [`NumberingSettings::contents`].
    pub contents: Option<Option<BlockId>>,
    /// Override for [`NumberingSettings::skip_headings`].
    pub skip_headings: Option<Option<BlockId>>,
    /// Override for [`NumberingSettings::separator`].
    pub separator: Option<String>,
}

/// The serialized versions of the settings file.
/// This allows for future changes to the file format and to the domain type
/// without breaking compatibility.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
enum Versions {
    #[serde(rename = "1")]
    V1 {
        #[serde(default)]
        off: bool,
        #[serde(default)]
        auto: bool,
        #[serde(default = "default_first_level")]
        first_level: u32,
        #[serde(default = "default_max_level")]
        max_level: u32,
        #[serde(default)]
        skip_top_level: bool,
        #[serde(default = "default_style")]
        style_level_1: NumberingStyle,
        #[serde(default = "default_style")]
        style_level_other: NumberingStyle,
        #[serde(default, skip_serializing_if = "String::is_empty")]
        start_at: String,
        #[serde(default, skip_serializing_if = "String::is_empty")]
        prepend_value: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        contents: Option<BlockId>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        skip_headings: Option<BlockId>,
        #[serde(default, skip_serializing_if = "String::is_empty")]
        separator: String,
    },
}

const fn default_first_level() -> u32 {
    1
}

const fn default_max_level() -> u32 {
    MAX_HEADING_LEVEL
}

const fn default_style() -> NumberingStyle {
    NumberingStyle::Decimal
}

impl From<Versions> for NumberingSettings {
    fn from(versions: Versions) -> Self {
        match versions {
            Versions::V1 {
                off,
                auto,
                first_level,
                max_level,
                skip_top_level,
                style_level_1,
                style_level_other,
                start_at,
                prepend_value,
                contents,
                skip_headings,
                separator,
            } => Self {
                off,
                auto,
                first_level,
                max_level,
                skip_top_level,
                style_level_1,
                style_level_other,
                start_at,
                prepend_value,
                contents,
                skip_headings,
                separator,
            },
        }
    }
}

impl From<NumberingSettings> for Versions {
    fn from(settings: NumberingSettings) -> Self {
        let NumberingSettings {
            off,
            auto,
            first_level,
            max_level,
            skip_top_level,
            style_level_1,
            style_level_other,
            start_at,
            prepend_value,
            contents,
            skip_headings,
            separator,
        } = settings;
        Self::V1 {
            off,
            auto,
            first_level,
            max_level,
            skip_top_level,
            style_level_1,
            style_level_other,
            start_at,
            prepend_value,
            contents,
            skip_headings,
            separator,
        }
    }
}
