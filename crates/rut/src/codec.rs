//! Internal implementation of the RUT codec.
//!
//! All functions here are pure and total: malformed input yields an empty string, `None` or
//! `false`, never a panic.

use crate::{RutError, RutResult};
use std::{fmt, str::FromStr};

/// Maximum number of significant characters kept by [`sanitize_input`].
pub const MAX_INPUT_LEN: usize = 9;

/// Weights applied right-to-left over the body digits.
const CHECK_WEIGHTS: [u32; 6] = [2, 3, 4, 5, 6, 7];

fn is_rut_char(c: char) -> bool {
    c.is_ascii_digit() || c == 'K' || c == 'k'
}

/// Keeps only `[0-9K]`, uppercased, without truncation.
fn strip_to_significant(raw: &str) -> String {
    raw.chars()
        .filter(|c| is_rut_char(*c))
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// Cleans raw keystrokes into the significant RUT characters.
///
/// Strips every character except digits and `K`/`k`, uppercases, and truncates to
/// [`MAX_INPUT_LEN`] characters. Always succeeds, possibly returning an empty string.
///
/// # Examples
///
/// ```
/// assert_eq!(percapita_rut::sanitize_input("12.345.678-k"), "12345678K");
/// assert_eq!(percapita_rut::sanitize_input("abc"), "");
/// ```
pub fn sanitize_input(raw: &str) -> String {
    raw.chars()
        .filter(|c| is_rut_char(*c))
        .map(|c| c.to_ascii_uppercase())
        .take(MAX_INPUT_LEN)
        .collect()
}

/// Renders a RUT in display form `BODY-CHECK`.
///
/// Any character outside `[0-9K]` is discarded from the whole input before splitting, so
/// re-formatting an already formatted value is safe. Inputs with one significant character or
/// fewer are returned as their cleaned form (there is nothing to split yet).
pub fn format(input: &str) -> String {
    let mut body = strip_to_significant(input);
    if body.len() <= 1 {
        return body;
    }
    match body.pop() {
        Some(check) => format!("{body}-{check}"),
        None => body,
    }
}

/// Computes the modulo-11 check character for a digit-only body.
///
/// Returns `None` if the body is empty or contains anything other than ASCII digits.
/// A raw result of 11 maps to `'0'` and 10 maps to `'K'`.
pub fn compute_check_char(body: &str) -> Option<char> {
    if body.is_empty() || !body.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    // reduced per step so arbitrarily long bodies cannot overflow
    let remainder = body
        .bytes()
        .rev()
        .zip(CHECK_WEIGHTS.iter().cycle())
        .fold(0u32, |acc, (digit, weight)| {
            (acc + u32::from(digit - b'0') * weight) % 11
        });

    let check = match 11 - remainder {
        11 => '0',
        10 => 'K',
        d => char::from(b'0' + d as u8),
    };
    Some(check)
}

/// Returns whether `rut` carries a correct modulo-11 check character.
///
/// Non-`[0-9K]` characters are ignored. Fewer than two significant characters, a non-numeric
/// body, or a wrong check character all yield `false`.
pub fn validate(rut: &str) -> bool {
    Rut::parse(rut).is_ok()
}

/// Loosest comparable form of an identifier as found in bulk data.
///
/// Strips `.`, `-` and whitespace and uppercases everything else. Unlike the storage form this
/// does not discard other characters, so two values only match if they agree on everything that
/// is not punctuation.
pub fn normalize_for_match(raw: &str) -> String {
    raw.chars()
        .filter(|c| *c != '.' && *c != '-' && !c.is_whitespace())
        .flat_map(char::to_uppercase)
        .collect()
}

/// A RUT with a verified check character, held in storage form.
///
/// # Construction
/// [`Rut::parse`] accepts any punctuation (`12.345.678-5`, `12345678-5`, `123456785`) and lowercase
/// `k`, and rejects values whose check character does not match the body.
///
/// # Display format
/// `BODY-CHECK`, e.g. `12345678-5`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Rut {
    canonical: String,
}

impl Rut {
    /// Parses and verifies a RUT.
    ///
    /// # Errors
    ///
    /// - [`RutError::TooShort`] if fewer than two significant characters remain,
    /// - [`RutError::InvalidBody`] if the body is not purely numeric,
    /// - [`RutError::CheckCharMismatch`] if the check character is wrong.
    pub fn parse(input: &str) -> RutResult<Self> {
        let mut body = strip_to_significant(input);
        let found = body.pop().ok_or(RutError::TooShort)?;
        if body.is_empty() {
            return Err(RutError::TooShort);
        }

        let expected =
            compute_check_char(&body).ok_or_else(|| RutError::InvalidBody(body.clone()))?;
        if expected != found {
            return Err(RutError::CheckCharMismatch { expected, found });
        }

        body.push(found);
        Ok(Self { canonical: body })
    }

    /// Storage form: body immediately followed by the check character.
    pub fn as_str(&self) -> &str {
        &self.canonical
    }

    /// Numeric body without the check character.
    pub fn body(&self) -> &str {
        &self.canonical[..self.canonical.len() - 1]
    }

    /// The verified check character (`0-9` or `K`).
    pub fn check_char(&self) -> char {
        // parse guarantees at least two ASCII characters
        self.canonical.chars().last().unwrap_or('0')
    }

    /// Returns true if `other` denotes the same person once punctuation is ignored.
    pub fn matches(&self, other: &str) -> bool {
        normalize_for_match(other) == self.canonical
    }
}

impl fmt::Display for Rut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.body(), self.check_char())
    }
}

impl FromStr for Rut {
    type Err = RutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Rut::parse(s)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Rut {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Rut {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Rut::parse(&s).map_err(serde::de::Error::custom)
    }
}
