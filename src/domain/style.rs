use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// The numeral system used to render a heading counter.
///
/// Each style is identified by a single case-sensitive letter, which is how
/// styles are written in settings files and in the compact front-matter line:
///
/// - `1` — decimal (`1`, `2`, `3`, …)
/// - `A` — uppercase alphabetic (`A`, `B`, …, `Z`, `AA`, …)
/// - `a` — lowercase alphabetic (`a`, `b`, …, `z`, `aa`, …)
/// - `I` — uppercase roman (`I`, `II`, `III`, `IV`, …)
/// - `i` — lowercase roman (`i`, `ii`, `iii`, `iv`, …)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumberingStyle {
    /// Decimal numbering: `1`, `2`, `3`, …
    Decimal,
    /// Uppercase alphabetic numbering: `A`, `B`, …, `Z`, `AA`, …
    UpperAlpha,
    /// Lowercase alphabetic numbering: `a`, `b`, …, `z`, `aa`, …
    LowerAlpha,
    /// Uppercase roman numbering: `I`, `II`, `III`, `IV`, …
    UpperRoman,
    /// Lowercase roman numbering: `i`, `ii`, `iii`, `iv`, …
    LowerRoman,
}

impl NumberingStyle {
    /// The single-letter code identifying this style.
    #[must_use]
    pub const fn code(self) -> char {
        match self {
            Self::Decimal => '1',
            Self::UpperAlpha => 'A',
            Self::LowerAlpha => 'a',
            Self::UpperRoman => 'I',
            Self::LowerRoman => 'i',
        }
    }

    /// Looks up a style from its single-letter code.
    #[must_use]
    pub const fn from_code(code: char) -> Option<Self> {
        match code {
            '1' => Some(Self::Decimal),
            'A' => Some(Self::UpperAlpha),
            'a' => Some(Self::LowerAlpha),
            'I' => Some(Self::UpperRoman),
            'i' => Some(Self::LowerRoman),
            _ => None,
        }
    }
}

impl fmt::Display for NumberingStyle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Error returned when a string is not a recognised style code.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("invalid numbering style '{0}': expected one of '1', 'A', 'a', 'I', 'i'")]
pub struct InvalidStyleError(String);

impl FromStr for NumberingStyle {
    type Err = InvalidStyleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(code), None) => Self::from_code(code).ok_or_else(|| InvalidStyleError(s.into())),
            _ => Err(InvalidStyleError(s.into())),
        }
    }
}

impl TryFrom<&str> for NumberingStyle {
    type Error = InvalidStyleError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl Serialize for NumberingStyle {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_char(self.code())
    }
}

impl<'de> Deserialize<'de> for NumberingStyle {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Converts a bijective base-26 letter string to its integer value.
///
/// "A" = 1, "Z" = 26, "AA" = 27, and so on. Every letter must match the
/// requested case. Returns `None` for empty input, mixed or wrong case,
/// non-letters, or overflow.
pub(crate) fn alpha_to_int(s: &str, uppercase: bool) -> Option<i64> {
    if s.is_empty() {
        return None;
    }

    let mut value: i64 = 0;
    for c in s.chars() {
        let digit = if uppercase {
            c.is_ascii_uppercase()
                .then(|| i64::from(u32::from(c) - u32::from('A')) + 1)?
        } else {
            c.is_ascii_lowercase()
                .then(|| i64::from(u32::from(c) - u32::from('a')) + 1)?
        };
        value = value.checked_mul(26)?.checked_add(digit)?;
    }
    Some(value)
}

/// Renders an integer >= 1 as a bijective base-26 letter string.
pub(crate) fn int_to_alpha(mut value: i64, uppercase: bool) -> String {
    debug_assert!(value >= 1);

    let base = if uppercase { b'A' } else { b'a' };
    let mut letters = Vec::new();
    while value > 0 {
        value -= 1;
        letters.push(base + u8::try_from(value % 26).expect("remainder fits in u8"));
        value /= 26;
    }
    letters.reverse();
    String::from_utf8(letters).expect("ASCII letters are valid UTF-8")
}

/// Parses a roman numeral in conventional subtractive notation.
///
/// The numeral must be entirely in the requested case and represent a value
/// in `[1, 3999]`. Sloppy forms ("IIII", "VX") are rejected by re-rendering
/// the parsed value and comparing against the input.
pub(crate) fn roman_to_int(s: &str, uppercase: bool) -> Option<i64> {
    if s.is_empty() {
        return None;
    }

    let case_ok = if uppercase {
        s.chars().all(|c| c.is_ascii_uppercase())
    } else {
        s.chars().all(|c| c.is_ascii_lowercase())
    };
    if !case_ok {
        return None;
    }

    let digits: Vec<i64> = s
        .chars()
        .map(|c| match c.to_ascii_uppercase() {
            'I' => Some(1),
            'V' => Some(5),
            'X' => Some(10),
            'L' => Some(50),
            'C' => Some(100),
            'D' => Some(500),
            'M' => Some(1000),
            _ => None,
        })
        .collect::<Option<_>>()?;

    let mut value = 0;
    for (i, digit) in digits.iter().enumerate() {
        if digits.get(i + 1).is_some_and(|next| next > digit) {
            value -= digit;
        } else {
            value += digit;
        }
    }

    if !(1..=3999).contains(&value) {
        return None;
    }

    // Only the canonical spelling round-trips.
    (int_to_roman(value, uppercase) == s).then_some(value)
}

/// Renders an integer >= 1 as a roman numeral in subtractive notation.
pub(crate) fn int_to_roman(mut value: i64, uppercase: bool) -> String {
    debug_assert!(value >= 1);

    const NUMERALS: [(i64, &str); 13] = [
        (1000, "M"),
        (900, "CM"),
        (500, "D"),
        (400, "CD"),
        (100, "C"),
        (90, "XC"),
        (50, "L"),
        (40, "XL"),
        (10, "X"),
        (9, "IX"),
        (5, "V"),
        (4, "IV"),
        (1, "I"),
    ];

    let mut out = String::new();
    for (magnitude, symbol) in NUMERALS {
        while value >= magnitude {
            out.push_str(symbol);
            value -= magnitude;
        }
    }

    if uppercase {
        out
    } else {
        out.to_ascii_lowercase()
    }
}
