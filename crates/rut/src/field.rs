//! Form-field state for RUT entry.
//!
//! Tracks whether the field has lost focus at least once separately from validity, so an error is
//! only surfaced after the first blur. The codec functions stay pure; this is the only stateful
//! piece of the crate.

use crate::codec::{format, sanitize_input, validate};

/// Message shown for a structurally invalid RUT.
pub const INVALID_RUT_MESSAGE: &str = "RUT inválido";

/// Minimum formatted length (`B-C` plus one digit) before re-validating on input.
const REVALIDATE_MIN_LEN: usize = 3;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RutField {
    value: String,
    touched: bool,
    error: Option<&'static str>,
}

impl RutField {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies a keystroke: the stored value becomes `format(sanitize_input(raw))`.
    ///
    /// Once the field has been blurred, a value of at least three characters is re-validated.
    /// Shorter values keep whatever error was already showing.
    pub fn on_input(&mut self, raw: &str) {
        self.value = format(&sanitize_input(raw));

        if self.touched && self.value.len() >= REVALIDATE_MIN_LEN {
            self.error = (!validate(&self.value)).then_some(INVALID_RUT_MESSAGE);
        }
    }

    /// Marks the field as touched and validates any non-empty value.
    pub fn on_blur(&mut self) {
        self.touched = true;
        self.error =
            (!self.value.is_empty() && !validate(&self.value)).then_some(INVALID_RUT_MESSAGE);
    }

    /// Display-form value.
    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn is_touched(&self) -> bool {
        self.touched
    }

    /// The error to show, if any. Always `None` before the first blur.
    pub fn error(&self) -> Option<&'static str> {
        if self.touched {
            self.error
        } else {
            None
        }
    }

    pub fn is_valid(&self) -> bool {
        validate(&self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_formats_as_you_type() {
        let mut field = RutField::new();
        field.on_input("12.345.678k");
        assert_eq!(field.value(), "12345678-K");
        field.on_input("1234567");
        assert_eq!(field.value(), "123456-7");
    }

    #[test]
    fn test_no_error_before_first_blur() {
        let mut field = RutField::new();
        field.on_input("12345678-6");
        assert!(!field.is_valid());
        assert_eq!(field.error(), None);
        assert!(!field.is_touched());
    }

    #[test]
    fn test_blur_surfaces_error_for_invalid_value() {
        let mut field = RutField::new();
        field.on_input("12345678-6");
        field.on_blur();
        assert_eq!(field.error(), Some(INVALID_RUT_MESSAGE));
    }

    #[test]
    fn test_blur_on_empty_field_has_no_error() {
        let mut field = RutField::new();
        field.on_blur();
        assert!(field.is_touched());
        assert_eq!(field.error(), None);
    }

    #[test]
    fn test_input_after_blur_clears_error_once_valid() {
        let mut field = RutField::new();
        field.on_input("12345678-6");
        field.on_blur();
        assert!(field.error().is_some());

        field.on_input("12345678-5");
        assert_eq!(field.error(), None);
        assert!(field.is_valid());
    }

    #[test]
    fn test_short_input_keeps_previous_error() {
        let mut field = RutField::new();
        field.on_input("12345678-6");
        field.on_blur();
        field.on_input("1");
        assert_eq!(field.value(), "1");
        assert_eq!(field.error(), Some(INVALID_RUT_MESSAGE));
    }

    #[test]
    fn test_input_is_truncated_to_nine_significant_chars() {
        let mut field = RutField::new();
        field.on_input("1234567890");
        assert_eq!(field.value(), "12345678-9");
    }
}
