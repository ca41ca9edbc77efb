//! The compact settings codec for document front matter.
//!
//! A document carries its numbering configuration in a single front-matter
//! field named `number headings`, whose value is a comma-separated line such
//! as:
//!
//! ```yaml
//! number headings: auto, first-level 1, max 6, contents ^toc, _.A.1:
//! ```
//!
//! Older documents instead carry discrete `number-headings-*` keys (or the
//! still older `header-numbering-*` spellings). Those are read as a fallback
//! when the compact field is absent, but never written.

use serde_yaml::{Mapping, Value};

use crate::domain::{
    NumberingSettings, NumberingStyle, SettingsOverrides,
    settings::{
        BlockId, is_valid_block_id_setting, is_valid_first_or_max_level,
        is_valid_numbering_style_string, is_valid_numbering_value_string,
    },
};

/// The front-matter field holding the compact settings line.
pub const COMPACT_SETTINGS_KEY: &str = "number headings";

const OFF_PART: &str = "off";
const AUTO_PART: &str = "auto";
const FIRST_LEVEL_PREFIX: &str = "first-level ";
const MAX_LEVEL_PREFIX: &str = "max ";
const CONTENTS_PREFIX: &str = "contents ";
const SKIP_PREFIX: &str = "skip ";
const START_AT_PREFIX: &str = "start-at ";
const PREPEND_PREFIX: &str = "prependValue ";

/// Checks that a legacy front-matter value is usable as a boolean flag.
#[must_use]
pub fn is_valid_flag(value: &Value) -> bool {
    value.is_bool()
}

/// Returns the settings encoded in a front-matter mapping, or the given
/// alternative when the mapping carries no recognisable settings.
///
/// The compact `number headings` field wins; the legacy discrete keys are
/// consulted only when it is wholly absent. This function never fails: every
/// malformed value degrades to the alternative (legacy mode) or the default
/// (compact mode) for that field.
#[must_use]
pub fn front_matter_settings_or_alternative(
    front_matter: Option<&Mapping>,
    alternative: &NumberingSettings,
) -> NumberingSettings {
    front_matter.map_or_else(
        || alternative.clone(),
        |fm| {
            parse_compact_front_matter_settings(fm)
                .unwrap_or_else(|| legacy_front_matter_settings(fm, alternative))
        },
    )
}

/// Parses the compact `number headings` field, if present.
///
/// Parsing always starts from a fresh default configuration: fields not
/// mentioned in the line take their defaults, not some caller's previous
/// values. Unrecognised segments are silently ignored.
#[must_use]
pub fn parse_compact_front_matter_settings(front_matter: &Mapping) -> Option<NumberingSettings> {
    let entry = compact_entry(front_matter.get(COMPACT_SETTINGS_KEY)?)?;

    let mut settings = NumberingSettings::default();
    for part in entry.split(',') {
        apply_compact_part(part.trim(), &mut settings);
    }
    Some(settings)
}

/// Classifies one comma-separated segment of the compact line.
///
/// Order matters: the exact tokens and keyed prefixes must be tried before
/// the style-format fallback, which accepts any remaining segment shape.
fn apply_compact_part(part: &str, settings: &mut NumberingSettings) {
    if part.is_empty() {
        return;
    }

    if part == OFF_PART {
        settings.off = true;
    } else if part == AUTO_PART {
        settings.auto = true;
    } else if let Some(rest) = part.strip_prefix(FIRST_LEVEL_PREFIX) {
        if let Ok(n) = rest.parse::<i64>() {
            if is_valid_first_or_max_level(n) {
                settings.first_level = u32::try_from(n).unwrap_or(settings.first_level);
            }
        }
    } else if let Some(rest) = part.strip_prefix(MAX_LEVEL_PREFIX) {
        if let Ok(n) = rest.parse::<i64>() {
            if is_valid_first_or_max_level(n) {
                settings.max_level = u32::try_from(n).unwrap_or(settings.max_level);
            }
        }
    } else if let Some(rest) = part.strip_prefix(START_AT_PREFIX) {
        if is_valid_numbering_value_string(rest) {
            settings.start_at = rest.to_string();
        }
    } else if let Some(rest) = part.strip_prefix(PREPEND_PREFIX) {
        settings.prepend_value = rest.to_string();
    } else if let Some(rest) = part.strip_prefix(CONTENTS_PREFIX) {
        if is_valid_block_id_setting(rest) {
            settings.contents = BlockId::new(rest).ok();
        }
    } else if let Some(rest) = part.strip_prefix(SKIP_PREFIX) {
        if is_valid_block_id_setting(rest) {
            settings.skip_headings = BlockId::new(rest).ok();
        }
    } else {
        apply_format_part(part, settings);
    }
}

/// Parses the trailing style-format segment, `[_.]<style1>.<styleOther><sep>`.
///
/// A leading `_.` marks "skip top level". Both style letters must be valid
/// codes or the whole segment is ignored, leaving the style fields at their
/// current values. Whatever trails the second style letter is the separator,
/// taken verbatim.
fn apply_format_part(part: &str, settings: &mut NumberingSettings) {
    let (skip_top_level, rest) = part
        .strip_prefix("_.")
        .map_or((false, part), |rest| (true, rest));

    let mut chars = rest.chars();
    let (Some(code_1), Some('.'), Some(code_other)) = (chars.next(), chars.next(), chars.next())
    else {
        return;
    };
    let (Some(style_1), Some(style_other)) = (
        NumberingStyle::from_code(code_1),
        NumberingStyle::from_code(code_other),
    ) else {
        return;
    };

    settings.skip_top_level = skip_top_level;
    settings.style_level_1 = style_1;
    settings.style_level_other = style_other;
    settings.separator = chars.as_str().to_string();
}

/// Reads the legacy discrete keys, merging into the caller's alternative.
///
/// Unlike compact parsing this deliberately starts from the *alternative*
/// settings, so long-lived documents that predate the compact format keep
/// whatever the caller already holds for fields they don't mention.
fn legacy_front_matter_settings(
    front_matter: &Mapping,
    alternative: &NumberingSettings,
) -> NumberingSettings {
    let skip_top_level = legacy_entry(front_matter, "skip-top-level")
        .filter(|value| is_valid_flag(value))
        .and_then(Value::as_bool);

    let max_level = legacy_entry(front_matter, "max-level")
        .and_then(Value::as_i64)
        .filter(|&n| is_valid_first_or_max_level(n))
        .and_then(|n| u32::try_from(n).ok());

    let style_level_1 = legacy_entry(front_matter, "style-level-1")
        .and_then(scalar_to_string)
        .filter(|s| is_valid_numbering_style_string(s))
        .and_then(|s| s.parse().ok());

    let style_level_other = legacy_entry(front_matter, "style-level-other")
        .and_then(scalar_to_string)
        .filter(|s| is_valid_numbering_style_string(s))
        .and_then(|s| s.parse().ok());

    let auto = legacy_entry(front_matter, "auto")
        .filter(|value| is_valid_flag(value))
        .and_then(Value::as_bool);

    let prepend_value = legacy_entry(front_matter, "prependValue").and_then(scalar_to_string);

    alternative.with_overrides(SettingsOverrides {
        skip_top_level,
        max_level,
        style_level_1,
        style_level_other,
        auto,
        prepend_value,
        ..SettingsOverrides::default()
    })
}

fn legacy_entry<'a>(front_matter: &'a Mapping, suffix: &str) -> Option<&'a Value> {
    front_matter
        .get(format!("number-headings-{suffix}"))
        .or_else(|| front_matter.get(format!("header-numbering-{suffix}")))
        .filter(|value| !value.is_null())
}

/// A compact entry that is null, empty, `false` or `0` counts as absent and
/// triggers the legacy fallback.
fn compact_entry(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
        Value::Bool(true) => Some("true".to_string()),
        _ => None,
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Serializes settings to the compact `number headings` line.
///
/// An "off" configuration is just the literal `off`. Otherwise the segments
/// appear in fixed order, each omitted when not applicable, ending with the
/// style-format segment. `prepend_value` is intentionally never emitted: the
/// parser accepts it for manually edited documents, but it does not survive
/// a round trip.
#[must_use]
pub fn settings_to_compact_front_matter_value(settings: &NumberingSettings) -> String {
    if settings.off {
        return OFF_PART.to_string();
    }

    let mut out = String::new();
    if settings.auto {
        out.push_str("auto, ");
    }
    out.push_str(&format!("first-level {}, ", settings.first_level));
    out.push_str(&format!("max {}, ", settings.max_level));
    if let Some(contents) = &settings.contents {
        out.push_str(&format!("contents {contents}, "));
    }
    if let Some(skip) = &settings.skip_headings {
        out.push_str(&format!("skip {skip}, "));
    }
    if !settings.start_at.is_empty() {
        out.push_str(&format!("start-at {}, ", settings.start_at));
    }

    if settings.skip_top_level {
        out.push_str("_.");
    }
    out.push_str(&format!(
        "{}.{}{}",
        settings.style_level_1, settings.style_level_other, settings.separator
    ));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::NumberingStyle;

    fn mapping(pairs: &[(&str, Value)]) -> Mapping {
        pairs
            .iter()
            .map(|(k, v)| (Value::String((*k).to_string()), v.clone()))
            .collect()
    }

    fn compact(line: &str) -> NumberingSettings {
        let fm = mapping(&[(COMPACT_SETTINGS_KEY, Value::String(line.to_string()))]);
        parse_compact_front_matter_settings(&fm).unwrap()
    }

    #[test]
    fn absent_compact_field_signals_fallback() {
        let fm = mapping(&[("title", Value::String("Notes".into()))]);
        assert!(parse_compact_front_matter_settings(&fm).is_none());
    }

    #[test]
    fn parses_off() {
        assert!(compact("off").off);
    }

    #[test]
    fn parses_full_line() {
        let settings = compact("auto, first-level 2, max 4, contents ^toc, skip ^ignore, start-at C, _.A.1:");

        assert!(!settings.off);
        assert!(settings.auto);
        assert_eq!(settings.first_level, 2);
        assert_eq!(settings.max_level, 4);
        assert_eq!(settings.contents, Some(BlockId::new("^toc").unwrap()));
        assert_eq!(settings.skip_headings, Some(BlockId::new("^ignore").unwrap()));
        assert_eq!(settings.start_at, "C");
        assert!(settings.skip_top_level);
        assert_eq!(settings.style_level_1, NumberingStyle::UpperAlpha);
        assert_eq!(settings.style_level_other, NumberingStyle::Decimal);
        assert_eq!(settings.separator, ":");
    }

    #[test]
    fn segments_parse_in_any_order() {
        let settings = compact("1.1, max 3, auto");
        assert!(settings.auto);
        assert_eq!(settings.max_level, 3);
        assert_eq!(settings.style_level_1, NumberingStyle::Decimal);
    }

    #[test]
    fn unknown_segments_are_ignored() {
        let settings = compact("wibble, max 3, flavour strawberry");
        assert_eq!(settings.max_level, 3);
        assert_eq!(settings, NumberingSettings {
            max_level: 3,
            ..NumberingSettings::default()
        });
    }

    #[test]
    fn out_of_range_levels_keep_defaults() {
        let settings = compact("first-level 0, max 99");
        assert_eq!(settings.first_level, 1);
        assert_eq!(settings.max_level, 6);
    }

    #[test]
    fn start_at_with_comma_cannot_exist_and_empty_is_ignored() {
        // "start-at" with nothing after the space never matches the prefix.
        let settings = compact("start-at, 1.1");
        assert_eq!(settings.start_at, "");
    }

    #[test]
    fn bare_block_id_prefixes_are_ignored() {
        let settings = compact("contents, skip, 1.1.");
        assert_eq!(settings.contents, None);
        assert_eq!(settings.skip_headings, None);
        assert_eq!(settings.separator, ".");
    }

    #[test]
    fn prepend_value_is_accepted_verbatim() {
        let settings = compact("prependValue §, 1.1");
        assert_eq!(settings.prepend_value, "§");
    }

    #[test]
    fn unmentioned_fields_take_defaults_not_prior_values() {
        let alternative = NumberingSettings {
            max_level: 2,
            auto: true,
            ..NumberingSettings::default()
        };
        let fm = mapping(&[(COMPACT_SETTINGS_KEY, Value::String("first-level 2, 1.1".into()))]);

        let settings = front_matter_settings_or_alternative(Some(&fm), &alternative);

        // Compact parsing starts from defaults, ignoring the alternative.
        assert_eq!(settings.max_level, 6);
        assert!(!settings.auto);
        assert_eq!(settings.first_level, 2);
    }

    #[test]
    fn malformed_format_part_leaves_styles_at_defaults() {
        for line in ["_.Q.1:", "A.", "A", "_.", "1.Q"] {
            let settings = compact(line);
            assert_eq!(settings.style_level_1, NumberingStyle::Decimal, "line {line:?}");
            assert_eq!(settings.style_level_other, NumberingStyle::Decimal);
            assert!(!settings.skip_top_level);
            assert_eq!(settings.separator, "");
        }
    }

    #[test]
    fn format_part_accepts_multi_char_separator() {
        let settings = compact("I.a -");
        assert_eq!(settings.style_level_1, NumberingStyle::UpperRoman);
        assert_eq!(settings.style_level_other, NumberingStyle::LowerAlpha);
        assert_eq!(settings.separator, " -");
    }

    #[test]
    fn numeric_compact_value_is_stringified() {
        // YAML may deliver a scalar that isn't a string; it is stringified
        // before parsing, like any other unrecognised segment.
        let fm = mapping(&[(COMPACT_SETTINGS_KEY, Value::Number(3.into()))]);
        let settings = parse_compact_front_matter_settings(&fm).unwrap();
        assert_eq!(settings, NumberingSettings::default());
    }

    #[test]
    fn falsy_compact_value_triggers_fallback() {
        for value in [Value::Null, Value::String(String::new()), Value::Bool(false)] {
            let fm = mapping(&[
                (COMPACT_SETTINGS_KEY, value),
                ("number-headings-max-level", Value::Number(3.into())),
            ]);
            let settings =
                front_matter_settings_or_alternative(Some(&fm), &NumberingSettings::default());
            assert_eq!(settings.max_level, 3);
        }
    }

    #[test]
    fn missing_front_matter_returns_alternative() {
        let alternative = NumberingSettings {
            separator: ":".to_string(),
            ..NumberingSettings::default()
        };
        let settings = front_matter_settings_or_alternative(None, &alternative);
        assert_eq!(settings, alternative);
    }

    #[test]
    fn legacy_keys_merge_into_alternative() {
        let alternative = NumberingSettings {
            separator: ":".to_string(),
            first_level: 2,
            ..NumberingSettings::default()
        };
        let fm = mapping(&[
            ("number-headings-max-level", Value::Number(3.into())),
            ("number-headings-auto", Value::Bool(true)),
        ]);

        let settings = front_matter_settings_or_alternative(Some(&fm), &alternative);

        assert_eq!(settings.max_level, 3);
        assert!(settings.auto);
        // Everything else keeps the caller's alternative, not the default.
        assert_eq!(settings.separator, ":");
        assert_eq!(settings.first_level, 2);
    }

    #[test]
    fn legacy_aliases_are_read() {
        let fm = mapping(&[
            ("header-numbering-skip-top-level", Value::Bool(true)),
            ("header-numbering-style-level-1", Value::String("I".into())),
        ]);

        let settings = front_matter_settings_or_alternative(Some(&fm), &NumberingSettings::default());

        assert!(settings.skip_top_level);
        assert_eq!(settings.style_level_1, NumberingStyle::UpperRoman);
    }

    #[test]
    fn legacy_invalid_values_keep_alternative() {
        let alternative = NumberingSettings {
            max_level: 4,
            style_level_1: NumberingStyle::UpperAlpha,
            ..NumberingSettings::default()
        };
        let fm = mapping(&[
            ("number-headings-max-level", Value::Number(42.into())),
            ("number-headings-style-level-1", Value::String("Q".into())),
            ("number-headings-auto", Value::String("yes".into())),
        ]);

        let settings = front_matter_settings_or_alternative(Some(&fm), &alternative);

        assert_eq!(settings.max_level, 4);
        assert_eq!(settings.style_level_1, NumberingStyle::UpperAlpha);
        assert!(!settings.auto);
    }

    #[test]
    fn legacy_fallback_not_used_when_compact_present() {
        let fm = mapping(&[
            (COMPACT_SETTINGS_KEY, Value::String("max 2, 1.1".into())),
            ("number-headings-max-level", Value::Number(5.into())),
        ]);

        let settings = front_matter_settings_or_alternative(Some(&fm), &NumberingSettings::default());
        assert_eq!(settings.max_level, 2);
    }

    #[test]
    fn legacy_numeric_style_key_is_stringified() {
        // `style-level-1: 1` arrives as a YAML number but names a valid style.
        let fm = mapping(&[("number-headings-style-level-1", Value::Number(1.into()))]);
        let settings = front_matter_settings_or_alternative(Some(&fm), &NumberingSettings {
            style_level_1: NumberingStyle::UpperRoman,
            ..NumberingSettings::default()
        });
        assert_eq!(settings.style_level_1, NumberingStyle::Decimal);
    }

    #[test]
    fn serializes_off() {
        let settings = NumberingSettings {
            off: true,
            auto: true,
            ..NumberingSettings::default()
        };
        assert_eq!(settings_to_compact_front_matter_value(&settings), "off");
    }

    #[test]
    fn serializes_defaults() {
        let settings = NumberingSettings::default();
        assert_eq!(
            settings_to_compact_front_matter_value(&settings),
            "first-level 1, max 6, 1.1"
        );
    }

    #[test]
    fn serializes_full_configuration() {
        let settings = NumberingSettings {
            auto: true,
            first_level: 2,
            max_level: 4,
            skip_top_level: true,
            style_level_1: NumberingStyle::UpperAlpha,
            style_level_other: NumberingStyle::Decimal,
            start_at: "C".to_string(),
            contents: Some(BlockId::new("^toc").unwrap()),
            skip_headings: Some(BlockId::new("^ignore").unwrap()),
            separator: ":".to_string(),
            ..NumberingSettings::default()
        };
        assert_eq!(
            settings_to_compact_front_matter_value(&settings),
            "auto, first-level 2, max 4, contents ^toc, skip ^ignore, start-at C, _.A.1:"
        );
    }

    #[test]
    fn compact_round_trip_preserves_emitted_fields() {
        let original = NumberingSettings {
            auto: true,
            first_level: 2,
            max_level: 5,
            skip_top_level: true,
            style_level_1: NumberingStyle::UpperRoman,
            style_level_other: NumberingStyle::LowerAlpha,
            start_at: "V".to_string(),
            contents: Some(BlockId::new("^toc").unwrap()),
            separator: ".".to_string(),
            // Not emitted by the serializer.
            prepend_value: "§".to_string(),
            ..NumberingSettings::default()
        };

        let line = settings_to_compact_front_matter_value(&original);
        let reparsed = compact(&line);

        assert_eq!(reparsed.prepend_value, "", "prependValue is write-one-way");
        let expected = NumberingSettings {
            prepend_value: String::new(),
            ..original
        };
        assert_eq!(reparsed, expected);
    }
}
