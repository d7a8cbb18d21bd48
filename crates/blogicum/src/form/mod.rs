//! HTML form handling: CSRF tokens, submitted values and validation.
//!
//! Each form has a plain `*Form` struct holding what the user typed (so a
//! failed submission can be re-rendered as entered) and a `validate` method
//! producing either cleaned, typed input or [`FormErrors`].

pub mod account;
pub mod comment;
pub mod csrf;
pub mod post;

use std::collections::BTreeMap;

use serde::Serialize;

pub use account::{LoginForm, ProfileForm, RegisterForm};
pub use comment::CommentForm;
pub use csrf::{generate_csrf_token, verify_csrf_token};
pub use post::{PostForm, PostInput, PostSubmission, UploadedImage};

/// Key under which errors not tied to a field are collected.
pub const NON_FIELD_ERRORS: &str = "__all__";

/// Validation errors keyed by field name.
///
/// Serializes as a map so templates can write `errors.title`.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct FormErrors(BTreeMap<String, Vec<String>>);

impl FormErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error against `field`.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    /// Record an error against the form as a whole.
    pub fn add_non_field(&mut self, message: impl Into<String>) {
        self.add(NON_FIELD_ERRORS, message);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn has(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Messages recorded against `field`.
    pub fn get(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or_default()
    }

    /// `Ok(value)` when no errors were recorded.
    pub fn into_result<T>(self, value: T) -> Result<T, Self> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

/// Message for a missing required field.
pub(crate) const REQUIRED: &str = "This field is required.";

/// Trimmed value, or a "required" error when blank.
pub(crate) fn required(errors: &mut FormErrors, field: &str, value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        errors.add(field, REQUIRED);
        None
    } else {
        Some(value.to_string())
    }
}

/// Record an error when `value` is longer than `max` characters.
pub(crate) fn max_length(errors: &mut FormErrors, field: &str, value: &str, max: usize) {
    let len = value.chars().count();
    if len > max {
        errors.add(
            field,
            format!("Ensure this value has at most {max} characters (it has {len})."),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_collect_per_field() {
        let mut errors = FormErrors::new();
        assert!(errors.is_empty());

        errors.add("title", "first");
        errors.add("title", "second");
        errors.add_non_field("whole form");

        assert!(errors.has("title"));
        assert_eq!(errors.get("title").len(), 2);
        assert_eq!(errors.get(NON_FIELD_ERRORS), ["whole form".to_string()]);
        assert!(errors.get("text").is_empty());
        assert!(errors.into_result(()).is_err());
    }

    #[test]
    fn required_trims() {
        let mut errors = FormErrors::new();
        assert_eq!(required(&mut errors, "a", "  x "), Some("x".to_string()));
        assert_eq!(required(&mut errors, "b", "   "), None);
        assert!(errors.has("b"));
        assert!(!errors.has("a"));
    }

    #[test]
    fn serializes_as_map() {
        let mut errors = FormErrors::new();
        errors.add("text", REQUIRED);
        let json = serde_json::to_value(&errors).unwrap_or_default();
        assert_eq!(json["text"][0], REQUIRED);
    }
}
