//! The per-document numbering pass.
//!
//! [`NumberingPass`] is the pure driver behind heading renumbering: it
//! consumes an ordered sequence of heading levels (top-to-bottom document
//! order) and yields one label per heading, maintaining the per-level token
//! stack along the way. File reading and line rewriting live in the storage
//! layer; this type never touches text outside the labels it produces.

use super::{
    NumberingSettings, NumberingToken,
    token::{NumberingStack, make_numbering_string, start_at_or_zeroth_in_style},
};

/// Stateful label generator for one pass over a document's headings.
///
/// Feed it heading levels in document order; it returns the rendered label
/// for each numbered heading, or `None` for headings outside the configured
/// level range. Levels outside the range leave the stack untouched, so
/// numbering continues across them.
#[derive(Debug)]
pub struct NumberingPass<'a> {
    settings: &'a NumberingSettings,
    stack: NumberingStack,
}

impl<'a> NumberingPass<'a> {
    /// Starts a fresh pass over an immutable settings snapshot.
    #[must_use]
    pub const fn new(settings: &'a NumberingSettings) -> Self {
        Self {
            settings,
            stack: Vec::new(),
        }
    }

    /// Produces the label for the next heading at the given level, or `None`
    /// if that level is not numbered.
    ///
    /// The label includes the leading space, the prepend prefix, the joined
    /// token values, and the trailing separator, ready to splice after the
    /// heading's `#` markers.
    pub fn label_for(&mut self, level: u32) -> Option<String> {
        let first = self.settings.first_numbered_level();
        if level < first || level > self.settings.max_level {
            return None;
        }

        let depth = usize::try_from(level - first + 1).ok()?;

        // Descending into deeper levels seeds the intermediate counters; the
        // very first counter honours the start-at value.
        while self.stack.len() < depth {
            let style = self
                .settings
                .style_for_level(first + u32::try_from(self.stack.len()).unwrap_or(0));
            let seed = if self.stack.is_empty() {
                start_at_or_zeroth_in_style(&self.settings.start_at, style)
            } else {
                NumberingToken::zeroth(style)
            };
            self.stack.push(seed);
        }
        self.stack.truncate(depth);

        if let Some(top) = self.stack.last_mut() {
            *top = top.incremented();
        }

        let mut label = make_numbering_string(&self.stack, &self.settings.separator);
        if !self.settings.prepend_value.is_empty() {
            label.insert_str(1, &self.settings.prepend_value);
        }
        Some(label)
    }
}
