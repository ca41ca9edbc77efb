//! Per-level counter tokens and the numbering label renderer.
//!
//! A [`NumberingToken`] is one heading level's counter state. Tokens are only
//! ever constructed through [`NumberingToken::zeroth`],
//! [`NumberingToken::parse`] and the increment/predecessor operations, so an
//! invalid (style, value) combination is unrepresentable.
//!
//! Internally every style counts with the same integer core; only parsing and
//! rendering are style-specific. The integer `0` is each style's pre-first
//! ("zeroth") state: it renders as `Z`/`z` for the alphabetic styles and as
//! the literal sentinel `0` for the roman styles, and incrementing it yields
//! the style's natural first value (`1`, `A`, `I`, …). This keeps the zeroth
//! alphabetic state distinct from a parsed `"Z"` (which is 26 and increments
//! to `"AA"`).

use std::fmt;

use super::style::{NumberingStyle, alpha_to_int, int_to_alpha, int_to_roman, roman_to_int};

/// One heading level's counter state: a numbering style plus a value that is
/// always representable under that style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberingToken {
    /// A decimal counter.
    Decimal(i64),
    /// An uppercase alphabetic counter (0 is the pre-first state).
    UpperAlpha(i64),
    /// A lowercase alphabetic counter (0 is the pre-first state).
    LowerAlpha(i64),
    /// An uppercase roman counter (0 is the pre-first state).
    UpperRoman(i64),
    /// A lowercase roman counter (0 is the pre-first state).
    LowerRoman(i64),
}

/// An ordered sequence of tokens, outermost heading level first.
pub type NumberingStack = Vec<NumberingToken>;

impl NumberingToken {
    /// The style this token counts in.
    #[must_use]
    pub const fn style(self) -> NumberingStyle {
        match self {
            Self::Decimal(_) => NumberingStyle::Decimal,
            Self::UpperAlpha(_) => NumberingStyle::UpperAlpha,
            Self::LowerAlpha(_) => NumberingStyle::LowerAlpha,
            Self::UpperRoman(_) => NumberingStyle::UpperRoman,
            Self::LowerRoman(_) => NumberingStyle::LowerRoman,
        }
    }

    /// The pre-first value of a style: incrementing it yields the style's
    /// first real value.
    #[must_use]
    pub const fn zeroth(style: NumberingStyle) -> Self {
        Self::with_ordinal(style, 0)
    }

    /// Parses a style-specific value string.
    ///
    /// Decimal accepts an optionally-signed integer literal; the alphabetic
    /// styles accept bijective base-26 letter strings of the matching case;
    /// the roman styles accept canonical subtractive numerals of the matching
    /// case with values in `[1, 3999]`. Anything else is `None`.
    #[must_use]
    pub fn parse(text: &str, style: NumberingStyle) -> Option<Self> {
        let ordinal = match style {
            NumberingStyle::Decimal => text.parse().ok()?,
            NumberingStyle::UpperAlpha => alpha_to_int(text, true)?,
            NumberingStyle::LowerAlpha => alpha_to_int(text, false)?,
            NumberingStyle::UpperRoman => roman_to_int(text, true)?,
            NumberingStyle::LowerRoman => roman_to_int(text, false)?,
        };
        Some(Self::with_ordinal(style, ordinal))
    }

    /// The next counter value.
    #[must_use]
    pub const fn incremented(self) -> Self {
        Self::with_ordinal(self.style(), self.ordinal().saturating_add(1))
    }

    /// The previous counter value, floored at the style's zeroth state.
    ///
    /// Decimal keeps counting down through negative values but never drops
    /// below zero *from* zero; the other styles floor at their sentinel.
    #[must_use]
    pub const fn predecessor(self) -> Self {
        let ordinal = match self {
            Self::Decimal(0) => 0,
            Self::Decimal(v) => v - 1,
            Self::UpperAlpha(v) | Self::LowerAlpha(v) | Self::UpperRoman(v) | Self::LowerRoman(v) => {
                if v <= 0 { 0 } else { v - 1 }
            }
        };
        Self::with_ordinal(self.style(), ordinal)
    }

    const fn with_ordinal(style: NumberingStyle, ordinal: i64) -> Self {
        match style {
            NumberingStyle::Decimal => Self::Decimal(ordinal),
            NumberingStyle::UpperAlpha => Self::UpperAlpha(ordinal),
            NumberingStyle::LowerAlpha => Self::LowerAlpha(ordinal),
            NumberingStyle::UpperRoman => Self::UpperRoman(ordinal),
            NumberingStyle::LowerRoman => Self::LowerRoman(ordinal),
        }
    }

    const fn ordinal(self) -> i64 {
        match self {
            Self::Decimal(v)
            | Self::UpperAlpha(v)
            | Self::LowerAlpha(v)
            | Self::UpperRoman(v)
            | Self::LowerRoman(v) => v,
        }
    }
}

impl fmt::Display for NumberingToken {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Self::Decimal(v) => write!(f, "{v}"),
            Self::UpperAlpha(v) if v <= 0 => f.write_str("Z"),
            Self::UpperAlpha(v) => f.write_str(&int_to_alpha(v, true)),
            Self::LowerAlpha(v) if v <= 0 => f.write_str("z"),
            Self::LowerAlpha(v) => f.write_str(&int_to_alpha(v, false)),
            Self::UpperRoman(v) | Self::LowerRoman(v) if v <= 0 => f.write_str("0"),
            Self::UpperRoman(v) => f.write_str(&int_to_roman(v, true)),
            Self::LowerRoman(v) => f.write_str(&int_to_roman(v, false)),
        }
    }
}

/// Renders a stack of tokens into a single heading label.
///
/// The label is a leading space, the token values joined by `.` in stack
/// order, then the separator. An empty stack renders as the leading space
/// alone. The renderer performs no validation; every token already holds a
/// representable value.
#[must_use]
pub fn make_numbering_string(stack: &[NumberingToken], separator: &str) -> String {
    if stack.is_empty() {
        return " ".to_string();
    }

    let mut out = " ".to_string();
    for (i, token) in stack.iter().enumerate() {
        if i > 0 {
            out.push('.');
        }
        out.push_str(&token.to_string());
    }
    out.push_str(separator);
    out
}

/// Resolves a user-supplied "start at" string into the seed token for a
/// level.
///
/// Callers always increment a seed before rendering it, so the seed is the
/// *predecessor* of the intended first value. An empty start-at string, or
/// one that cannot be interpreted under the given style (a digit string
/// against an alphabetic style, say), is silently discarded in favour of the
/// style's zeroth state.
#[must_use]
pub fn start_at_or_zeroth_in_style(start_at: &str, style: NumberingStyle) -> NumberingToken {
    NumberingToken::parse(start_at, style)
        .map_or_else(|| NumberingToken::zeroth(style), NumberingToken::predecessor)
}
