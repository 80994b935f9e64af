//! Domain error model.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures (validation,
/// invariants, conflicts). Storage concerns belong elsewhere.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. malformed input).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A domain invariant was violated.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A requested record was not found.
    #[error("not found")]
    NotFound,

    /// A conflict occurred (e.g. a unique value is already taken).
    #[error("conflict: {0}")]
    Conflict(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn not_found() -> Self {
        Self::NotFound
    }

    /// The message without its category prefix, for showing next to a form.
    pub fn message(&self) -> String {
        match self {
            Self::Validation(msg)
            | Self::InvariantViolation(msg)
            | Self::InvalidId(msg)
            | Self::Conflict(msg) => msg.clone(),
            other => other.to_string(),
        }
    }
}

/// Field-scoped validation errors for a submitted form.
///
/// Each invalid field maps to one or more messages; errors that concern the
/// submission as a whole (cross-field rules, formset minimums) live in
/// `non_field`. A form is valid exactly when this collection is empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldErrors {
    fields: BTreeMap<String, Vec<String>>,
    non_field: Vec<String>,
}

/// Message used when a required field is left blank.
pub const REQUIRED: &str = "This field is required.";

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.fields
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    pub fn add_required(&mut self, field: impl Into<String>) {
        self.add(field, REQUIRED);
    }

    pub fn add_non_field(&mut self, message: impl Into<String>) {
        self.non_field.push(message.into());
    }

    /// Merge another set of errors, prefixing its field names
    /// (e.g. `stockrecords-0-partner_sku`).
    pub fn merge_prefixed(&mut self, prefix: &str, other: FieldErrors) {
        for (field, messages) in other.fields {
            let key = if prefix.is_empty() {
                field
            } else {
                format!("{prefix}-{field}")
            };
            self.fields.entry(key).or_default().extend(messages);
        }
        self.non_field.extend(other.non_field);
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.non_field.is_empty()
    }

    pub fn field(&self, name: &str) -> &[String] {
        self.fields.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn non_field(&self) -> &[String] {
        &self.non_field
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// `Ok(())` when empty, otherwise `Err(self)`.
    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }

    /// True if any message (field or non-field) contains `needle`.
    pub fn mentions(&self, needle: &str) -> bool {
        self.non_field.iter().any(|m| m.contains(needle))
            || self
                .fields
                .values()
                .flatten()
                .any(|m| m.contains(needle))
    }
}

impl core::fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let mut first = true;
        for message in &self.non_field {
            if !first {
                f.write_str("; ")?;
            }
            f.write_str(message)?;
            first = false;
        }
        for (field, messages) in &self.fields {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{field}: {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}

impl std::error::Error for FieldErrors {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_errors_are_valid() {
        let errors = FieldErrors::new();
        assert!(errors.is_empty());
        assert!(errors.into_result().is_ok());
    }

    #[test]
    fn field_messages_accumulate() {
        let mut errors = FieldErrors::new();
        errors.add_required("title");
        errors.add("title", "too short");
        assert_eq!(errors.field("title"), &[REQUIRED.to_string(), "too short".to_string()]);
        assert!(errors.field("upc").is_empty());
    }

    #[test]
    fn merge_prefixes_nested_fields() {
        let mut inner = FieldErrors::new();
        inner.add_required("partner_sku");
        inner.add_non_field("bad row");

        let mut outer = FieldErrors::new();
        outer.merge_prefixed("stockrecords-0", inner);

        assert!(outer.has_field("stockrecords-0-partner_sku"));
        assert_eq!(outer.non_field(), &["bad row".to_string()]);
    }

    #[test]
    fn display_lists_every_message() {
        let mut errors = FieldErrors::new();
        errors.add_non_field("Your product must have at least one category.");
        errors.add("upc", "Product with this UPC already exists.");
        let text = errors.to_string();
        assert!(text.contains("at least one category"));
        assert!(text.contains("upc: Product with this UPC already exists."));
        assert!(errors.mentions("UPC already exists"));
    }

    #[test]
    fn domain_messages_drop_their_prefix() {
        let err = DomainError::validation("Your product must have a title.");
        assert_eq!(err.to_string(), "validation failed: Your product must have a title.");
        assert_eq!(err.message(), "Your product must have a title.");
        assert_eq!(DomainError::not_found().message(), "not found");
    }
}
