//! Markdown documents with YAML front matter and numbered headings.
//!
//! [`MarkdownDocument`] is the storage-side collaborator that drives the pure
//! numbering core: it enumerates ATX headings (skipping fenced code blocks),
//! feeds their levels to a [`NumberingPass`], and splices the produced labels
//! into the heading lines. Nothing outside heading lines and the
//! `number headings` front-matter field is ever rewritten.

use std::{
    fs::File,
    io::{self, BufRead, BufReader, BufWriter, Write},
    path::Path,
};

use regex::Regex;
use serde_yaml::{Mapping, Value};

use crate::{
    domain::{NumberingPass, NumberingSettings, NumberingStyle},
    storage::front_matter::{
        COMPACT_SETTINGS_KEY, front_matter_settings_or_alternative,
        settings_to_compact_front_matter_value,
    },
};

/// A markdown document split into optional YAML front matter and body lines.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkdownDocument {
    front_matter: Option<Mapping>,
    lines: Vec<String>,
}

/// What a numbering pass did to a document.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct NumberingOutcome {
    /// Headings that received a new or updated label.
    pub labeled: usize,
    /// Headings whose stale label was removed.
    pub cleared: usize,
    /// Headings visited, including untouched ones.
    pub headings: usize,
}

impl NumberingOutcome {
    /// Whether the pass changed any line.
    #[must_use]
    pub const fn changed(&self) -> bool {
        self.labeled > 0 || self.cleared > 0
    }
}

impl MarkdownDocument {
    /// Parses a document from text.
    ///
    /// # Errors
    ///
    /// Returns an error if a front-matter block is opened but never closed,
    /// or if its content is not a YAML mapping.
    pub fn parse(text: &str) -> Result<Self, LoadError> {
        Self::read(&mut io::Cursor::new(text))
    }

    pub(crate) fn read<R: BufRead>(reader: &mut R) -> Result<Self, LoadError> {
        let mut lines = reader
            .lines()
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .peekable();

        let front_matter = if lines.peek().is_some_and(|line| line.trim() == "---") {
            lines.next();
            let mut block = Vec::new();
            let mut closed = false;
            for line in lines.by_ref() {
                if line.trim() == "---" {
                    closed = true;
                    break;
                }
                block.push(line);
            }
            if !closed {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    "front matter block is never closed",
                )
                .into());
            }

            let block = block.join("\n");
            if block.trim().is_empty() {
                Some(Mapping::new())
            } else {
                Some(serde_yaml::from_str(&block)?)
            }
        } else {
            None
        };

        Ok(Self {
            front_matter,
            lines: lines.collect(),
        })
    }

    fn render(&self) -> String {
        let mut out = String::new();
        if let Some(front_matter) = self.front_matter.as_ref().filter(|fm| !fm.is_empty()) {
            let yaml = serde_yaml::to_string(front_matter).expect("this must never fail");
            out.push_str("---\n");
            out.push_str(&yaml);
            out.push_str("---\n");
        }
        if !self.lines.is_empty() {
            out.push_str(&self.lines.join("\n"));
            out.push('\n');
        }
        out
    }

    fn write<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(self.render().as_bytes())
    }

    /// Reads a document from a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let file = File::open(path).map_err(|io_error| match io_error.kind() {
            io::ErrorKind::NotFound => LoadError::NotFound,
            _ => LoadError::Io(io_error),
        })?;
        let mut reader = BufReader::new(file);
        Self::read(&mut reader)
    }

    /// Writes the document back to a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or written to.
    pub fn save(&self, path: &Path) -> io::Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        self.write(&mut writer)
    }

    /// Renders the document back to text.
    #[must_use]
    pub fn to_text(&self) -> String {
        self.render()
    }

    /// The document's front matter, if any.
    #[must_use]
    pub const fn front_matter(&self) -> Option<&Mapping> {
        self.front_matter.as_ref()
    }

    /// The numbering settings this document carries, falling back to the
    /// given alternative.
    #[must_use]
    pub fn settings_or_alternative(&self, alternative: &NumberingSettings) -> NumberingSettings {
        front_matter_settings_or_alternative(self.front_matter(), alternative)
    }

    /// Replaces the document's compact settings line, creating the front
    /// matter block if necessary.
    ///
    /// This is the only write path for settings: legacy keys are read-only
    /// and are left exactly as found.
    pub fn save_settings(&mut self, settings: &NumberingSettings) {
        let line = settings_to_compact_front_matter_value(settings);
        self.front_matter
            .get_or_insert_with(Mapping::new)
            .insert(Value::String(COMPACT_SETTINGS_KEY.into()), Value::String(line));
    }

    /// Numbers (or, for "off" settings, un-numbers) the document's headings.
    pub fn apply_numbering(&mut self, settings: &NumberingSettings) -> NumberingOutcome {
        if settings.off {
            return self.remove_numbering(settings);
        }

        let pattern = label_pattern(settings);
        let mut pass = NumberingPass::new(settings);
        let mut outcome = NumberingOutcome::default();

        for idx in self.heading_line_indices() {
            let Some(heading) = parse_heading(&self.lines[idx]) else {
                continue;
            };
            outcome.headings += 1;

            if is_marked(&heading, settings) {
                continue;
            }

            let stripped = strip_label(&pattern, heading.text);
            let label = pass.label_for(heading.level);
            let new_line = label.as_deref().map_or_else(
                || heading.with_text(stripped),
                |label| heading.with_label(label, stripped),
            );

            if new_line != self.lines[idx] {
                if label.is_some() {
                    outcome.labeled += 1;
                } else {
                    outcome.cleared += 1;
                }
                self.lines[idx] = new_line;
            }
        }

        outcome
    }

    /// Strips numbering labels from every heading except skip-marked ones.
    pub fn remove_numbering(&mut self, settings: &NumberingSettings) -> NumberingOutcome {
        let pattern = label_pattern(settings);
        let mut outcome = NumberingOutcome::default();

        for idx in self.heading_line_indices() {
            let Some(heading) = parse_heading(&self.lines[idx]) else {
                continue;
            };
            outcome.headings += 1;

            if is_skip_marked(&heading, settings) {
                continue;
            }

            let stripped = strip_label(&pattern, heading.text);
            let new_line = heading.with_text(stripped);
            if new_line != self.lines[idx] {
                outcome.cleared += 1;
                self.lines[idx] = new_line;
            }
        }

        outcome
    }

    /// Body line indices that hold ATX headings, with fenced code blocks
    /// excluded.
    fn heading_line_indices(&self) -> Vec<usize> {
        let mut indices = Vec::new();
        let mut fence: Option<&str> = None;

        for (idx, line) in self.lines.iter().enumerate() {
            let trimmed = line.trim_start();
            if let Some(open) = fence {
                if trimmed.starts_with(open) {
                    fence = None;
                }
                continue;
            }
            if trimmed.starts_with("```") {
                fence = Some("```");
                continue;
            }
            if trimmed.starts_with("~~~") {
                fence = Some("~~~");
                continue;
            }
            if parse_heading(line).is_some() {
                indices.push(idx);
            }
        }

        indices
    }
}

/// One parsed ATX heading line.
#[derive(Debug)]
struct Heading<'a> {
    level: u32,
    /// The `#` markers plus any indent, verbatim.
    markers: &'a str,
    /// Everything after the markers and the following whitespace.
    text: &'a str,
}

impl Heading<'_> {
    fn with_text(&self, text: &str) -> String {
        if text.is_empty() {
            self.markers.to_string()
        } else {
            format!("{} {}", self.markers, text)
        }
    }

    fn with_label(&self, label: &str, text: &str) -> String {
        // The label already carries its leading space.
        if text.is_empty() {
            format!("{}{}", self.markers, label)
        } else {
            format!("{}{} {}", self.markers, label, text)
        }
    }

    /// The trailing `^block-id` anchor, if the heading has one.
    fn block_anchor(&self) -> Option<&str> {
        let last = self
            .text
            .rsplit_once(char::is_whitespace)
            .map_or(self.text, |(_, last)| last);
        (last.starts_with('^') && last.len() > 1).then_some(last)
    }
}

/// Splits an ATX heading into markers and text. Up to three leading spaces
/// are tolerated, per CommonMark.
fn parse_heading(line: &str) -> Option<Heading<'_>> {
    let indent = line.len() - line.trim_start_matches(' ').len();
    if indent > 3 {
        return None;
    }

    let after_indent = &line[indent..];
    let hashes = after_indent.len() - after_indent.trim_start_matches('#').len();
    if !(1..=6).contains(&hashes) {
        return None;
    }

    let rest = &after_indent[hashes..];
    if !rest.is_empty() && !rest.starts_with(' ') && !rest.starts_with('\t') {
        return None;
    }

    Some(Heading {
        level: u32::try_from(hashes).ok()?,
        markers: &line[..indent + hashes],
        text: rest.trim_start(),
    })
}

fn is_marked(heading: &Heading, settings: &NumberingSettings) -> bool {
    is_skip_marked(heading, settings)
        || anchor_matches(heading.block_anchor(), settings.contents.as_ref().map(crate::domain::BlockId::as_str))
}

fn is_skip_marked(heading: &Heading, settings: &NumberingSettings) -> bool {
    anchor_matches(
        heading.block_anchor(),
        settings.skip_headings.as_ref().map(crate::domain::BlockId::as_str),
    )
}

fn anchor_matches(anchor: Option<&str>, setting: Option<&str>) -> bool {
    anchor
        .zip(setting)
        .is_some_and(|(anchor, setting)| {
            anchor.trim_start_matches('^') == setting.trim_start_matches('^')
        })
}

fn strip_label<'a>(pattern: &Regex, text: &'a str) -> &'a str {
    pattern
        .find(text)
        .filter(|m| m.start() == 0)
        .map_or(text, |m| text[m.end()..].trim_start())
}

/// Builds the pattern matching labels this configuration would produce.
///
/// The pattern is style-aware so that ordinary heading words are not
/// mistaken for stale labels: a heading numbered under different styles may
/// keep its old label, which matches the original tool's behaviour.
fn label_pattern(settings: &NumberingSettings) -> Regex {
    let first = style_token_pattern(settings.style_for_level(settings.first_numbered_level()));
    let other = style_token_pattern(settings.style_level_other);
    let prepend = regex::escape(&settings.prepend_value);
    let separator = regex::escape(settings.separator.trim_end());

    Regex::new(&format!(
        r"^{prepend}{first}(?:\.{other})*{separator}(?:\s+|$)"
    ))
    .expect("label pattern is valid")
}

const fn style_token_pattern(style: NumberingStyle) -> &'static str {
    match style {
        NumberingStyle::Decimal => r"-?\d+",
        NumberingStyle::UpperAlpha => r"[A-Z]+",
        NumberingStyle::LowerAlpha => r"[a-z]+",
        NumberingStyle::UpperRoman => r"(?:[IVXLCDM]+|0)",
        NumberingStyle::LowerRoman => r"(?:[ivxlcdm]+|0)",
    }
}

/// Errors that can occur when loading a document.
#[derive(Debug, thiserror::Error)]
#[error("failed to read markdown document")]
pub enum LoadError {
    /// The document file was not found.
    NotFound,
    /// An I/O error occurred.
    Io(#[from] io::Error),
    /// The YAML front matter could not be parsed.
    Yaml(#[from] serde_yaml::Error),
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::domain::SettingsOverrides;

    fn numbered(input: &str, settings: &NumberingSettings) -> String {
        let mut doc = MarkdownDocument::parse(input).unwrap();
        doc.apply_numbering(settings);
        doc.to_text()
    }

    #[test]
    fn numbers_simple_document() {
        let input = "# Alpha\n\ntext\n\n## Beta\n\n## Gamma\n\n# Delta\n";
        let expected = "# 1 Alpha\n\ntext\n\n## 1.1 Beta\n\n## 1.2 Gamma\n\n# 2 Delta\n";
        assert_eq!(numbered(input, &NumberingSettings::default()), expected);
    }

    #[test]
    fn renumbering_is_idempotent_after_edits() {
        let settings = NumberingSettings::default();
        let input = "# 1 Alpha\n## 1.1 Beta\n## New Section\n";
        let expected = "# 1 Alpha\n## 1.1 Beta\n## 1.2 New Section\n";
        assert_eq!(numbered(input, &settings), expected);
        assert_eq!(numbered(expected, &settings), expected);
    }

    #[test]
    fn respects_separator_and_styles() {
        let settings = NumberingSettings::default().with_overrides(SettingsOverrides {
            style_level_1: Some(NumberingStyle::UpperAlpha),
            separator: Some(":".into()),
            ..SettingsOverrides::default()
        });
        let input = "# Alpha\n## Beta\n# Gamma\n";
        let expected = "# A: Alpha\n## A.1: Beta\n# B: Gamma\n";
        assert_eq!(numbered(input, &settings), expected);
    }

    #[test]
    fn off_settings_strip_labels() {
        let settings = NumberingSettings {
            off: true,
            ..NumberingSettings::default()
        };
        let input = "# 1 Alpha\n## 1.1 Beta\n## Untouched words\n";
        let expected = "# Alpha\n## Beta\n## Untouched words\n";
        assert_eq!(numbered(input, &settings), expected);
    }

    #[test]
    fn skip_marked_heading_is_untouched() {
        let settings = NumberingSettings {
            skip_headings: Some("^keep".parse().unwrap()),
            ..NumberingSettings::default()
        };
        let input = "# Alpha\n# Old 3 label ^keep\n# Gamma\n";
        let output = numbered(input, &settings);
        assert!(output.contains("# Old 3 label ^keep"));
        assert!(output.contains("# 1 Alpha"));
        assert!(output.contains("# 2 Gamma"));
    }

    #[test]
    fn contents_heading_is_not_numbered() {
        let settings = NumberingSettings {
            contents: Some("^toc".parse().unwrap()),
            ..NumberingSettings::default()
        };
        let input = "# Contents ^toc\n# Alpha\n";
        let output = numbered(input, &settings);
        assert!(output.contains("# Contents ^toc"));
        assert!(output.contains("# 1 Alpha"));
    }

    #[test]
    fn code_fences_are_ignored() {
        let input = "# Alpha\n```\n# not a heading\n```\n# Beta\n";
        let output = numbered(input, &NumberingSettings::default());
        assert!(output.contains("# 1 Alpha"));
        assert!(output.contains("# not a heading"));
        assert!(output.contains("# 2 Beta"));
    }

    #[test]
    fn headings_beyond_max_level_are_cleaned() {
        let settings = NumberingSettings::default().with_overrides(SettingsOverrides {
            max_level: Some(1),
            ..SettingsOverrides::default()
        });
        let input = "# Alpha\n## 1.1 Beta\n";
        let expected = "# 1 Alpha\n## Beta\n";
        assert_eq!(numbered(input, &settings), expected);
    }

    #[test]
    fn plain_words_are_not_mistaken_for_labels() {
        let input = "# Overview\n## Introduction to things\n";
        let expected = "# 1 Overview\n## 1.1 Introduction to things\n";
        assert_eq!(numbered(input, &NumberingSettings::default()), expected);
    }

    #[test]
    fn parses_front_matter_and_preserves_other_fields() {
        let input = "---\ntitle: Notes\nnumber headings: max 2, 1.1\n---\n# Alpha\n## Beta\n### Gamma\n";
        let mut doc = MarkdownDocument::parse(input).unwrap();

        let settings = doc.settings_or_alternative(&NumberingSettings::default());
        assert_eq!(settings.max_level, 2);

        doc.apply_numbering(&settings);
        let output = doc.to_text();
        assert!(output.contains("title: Notes"));
        assert!(output.contains("# 1 Alpha"));
        assert!(output.contains("## 1.1 Beta"));
        assert!(output.contains("### Gamma"));
    }

    #[test]
    fn save_settings_writes_compact_line() {
        let mut doc = MarkdownDocument::parse("# Alpha\n").unwrap();
        let settings = NumberingSettings {
            auto: true,
            ..NumberingSettings::default()
        };
        doc.save_settings(&settings);

        let reparsed = MarkdownDocument::parse(&doc.to_text()).unwrap();
        let loaded = reparsed.settings_or_alternative(&NumberingSettings {
            max_level: 2,
            ..NumberingSettings::default()
        });
        // The compact line is authoritative; the alternative is ignored.
        assert!(loaded.auto);
        assert_eq!(loaded.max_level, 6);
    }

    #[test]
    fn document_without_front_matter_parses() {
        let doc = MarkdownDocument::parse("# Alpha\n\nBody text\n").unwrap();
        assert!(doc.front_matter().is_none());
    }

    #[test]
    fn unclosed_front_matter_is_an_error() {
        let result = MarkdownDocument::parse("---\ntitle: Notes\n# Alpha\n");
        assert!(matches!(result, Err(LoadError::Io(_))));
    }

    #[test]
    fn invalid_yaml_is_an_error() {
        let result = MarkdownDocument::parse("---\n[not: a: mapping\n---\n# Alpha\n");
        assert!(matches!(result, Err(LoadError::Yaml(_))));
    }

    #[test]
    fn save_and_load_round_trip() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("notes.md");

        let mut doc = MarkdownDocument::parse("# Alpha\n## Beta\n").unwrap();
        doc.save_settings(&NumberingSettings::default());
        doc.apply_numbering(&NumberingSettings::default());
        doc.save(&path).unwrap();

        let loaded = MarkdownDocument::load(&path).unwrap();
        assert_eq!(loaded, doc);
    }

    #[test]
    fn load_nonexistent_file() {
        let tmp = TempDir::new().unwrap();
        let result = MarkdownDocument::load(&tmp.path().join("missing.md"));
        assert!(matches!(result, Err(LoadError::NotFound)));
    }

    #[test]
    fn outcome_counts_changes() {
        let mut doc = MarkdownDocument::parse("# Alpha\n## Beta\n").unwrap();
        let outcome = doc.apply_numbering(&NumberingSettings::default());
        assert_eq!(outcome.headings, 2);
        assert_eq!(outcome.labeled, 2);
        assert!(outcome.changed());

        // A second pass changes nothing.
        let outcome = doc.apply_numbering(&NumberingSettings::default());
        assert_eq!(outcome.labeled, 0);
        assert!(!outcome.changed());
    }
}
