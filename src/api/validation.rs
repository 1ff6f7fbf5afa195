use std::borrow::Cow;
use std::fmt;

use serde::Serialize;
use validator::{ValidationError, ValidationErrors};

/// One violated form rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Build a `ValidationError` carrying a user-facing message
pub fn rule(code: &'static str, message: impl Into<String>) -> ValidationError {
    let message: String = message.into();
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Owned(message));
    error
}

/// Flatten validator errors into a list ordered by `field_order`.
///
/// Fields missing from `field_order` come last, sorted by name, so the
/// result never depends on hash ordering.
pub fn collect_field_errors(errors: &ValidationErrors, field_order: &[&str]) -> Vec<FieldError> {
    let mut fields: Vec<(usize, String, Vec<String>)> = errors
        .field_errors()
        .into_iter()
        .map(|(field, errors)| {
            let field = field.to_string();
            let messages = errors
                .iter()
                .map(|e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("Validation error in field: {}", field))
                })
                .collect();
            let rank = field_order
                .iter()
                .position(|name| *name == field)
                .unwrap_or(field_order.len());
            (rank, field, messages)
        })
        .collect();

    fields.sort_by(|a, b| (a.0, &a.1).cmp(&(b.0, &b.1)));

    fields
        .into_iter()
        .flat_map(|(_, field, messages)| {
            messages.into_iter().map(move |message| FieldError {
                field: field.clone(),
                message,
            })
        })
        .collect()
}

/// Join all messages into the single text shown to the user
pub fn combined_message(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_follow_field_order() {
        let mut errors = ValidationErrors::new();
        errors.add("note", rule("range", "bad note"));
        errors.add("zeta", rule("other", "bad zeta"));
        errors.add("category", rule("required", "no category"));

        let collected = collect_field_errors(&errors, &["category", "url", "note"]);

        let fields: Vec<&str> = collected.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["category", "note", "zeta"]);
        assert_eq!(
            combined_message(&collected),
            "no category\nbad note\nbad zeta"
        );
    }

    #[test]
    fn missing_message_falls_back_to_field_name() {
        let mut errors = ValidationErrors::new();
        errors.add("url", ValidationError::new("length"));

        let collected = collect_field_errors(&errors, &["url"]);

        assert_eq!(collected[0].message, "Validation error in field: url");
    }
}
