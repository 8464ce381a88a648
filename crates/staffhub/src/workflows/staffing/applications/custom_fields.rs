use std::collections::HashSet;

use super::super::domain::{CustomData, CustomFieldKind, CustomFieldSpec, CustomFieldValue};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CustomFieldError {
    #[error("custom field '{0}' is required")]
    Missing(String),
    #[error("custom field '{0}' is not declared on this job")]
    Undeclared(String),
    #[error("custom field '{key}' expects {expected}, got {found}")]
    KindMismatch {
        key: String,
        expected: &'static str,
        found: &'static str,
    },
    #[error("custom field '{0}' must not be blank")]
    Blank(String),
    #[error("custom field '{0}' must be an http(s) URL")]
    InvalidPhotoUrl(String),
    #[error("custom field key '{0}' is declared more than once")]
    DuplicateKey(String),
    #[error("custom field declarations need a key and a label")]
    UnnamedField,
}

/// Checks a company-declared schema before it is attached to a request or job.
pub(crate) fn validate_schema(fields: &[CustomFieldSpec]) -> Result<(), CustomFieldError> {
    let mut seen = HashSet::new();
    for field in fields {
        if field.key.trim().is_empty() || field.label.trim().is_empty() {
            return Err(CustomFieldError::UnnamedField);
        }
        if !seen.insert(field.key.as_str()) {
            return Err(CustomFieldError::DuplicateKey(field.key.clone()));
        }
    }
    Ok(())
}

/// Checks an applicant's answers against the job's declared fields.
pub(crate) fn validate_answers(
    fields: &[CustomFieldSpec],
    data: &CustomData,
) -> Result<(), CustomFieldError> {
    if let Some(key) = data
        .keys()
        .find(|key| !fields.iter().any(|field| &field.key == *key))
    {
        return Err(CustomFieldError::Undeclared(key.clone()));
    }

    for field in fields {
        let Some(value) = data.get(&field.key) else {
            if field.required {
                return Err(CustomFieldError::Missing(field.key.clone()));
            }
            continue;
        };

        if value.kind() != field.kind {
            return Err(CustomFieldError::KindMismatch {
                key: field.key.clone(),
                expected: field.kind.label(),
                found: value.kind().label(),
            });
        }

        match value {
            CustomFieldValue::Text(text) if text.trim().is_empty() => {
                return Err(CustomFieldError::Blank(field.key.clone()));
            }
            CustomFieldValue::PhotoUrl(url) => {
                let url = url.trim();
                if !(url.starts_with("https://") || url.starts_with("http://")) {
                    return Err(CustomFieldError::InvalidPhotoUrl(field.key.clone()));
                }
            }
            _ => {}
        }
    }

    Ok(())
}
