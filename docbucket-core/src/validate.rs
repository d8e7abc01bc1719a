//! Document validation run once per insert, before any hook.

use std::fmt;

/// Describes why a document was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// The offending field, if the validator can name one.
    pub field: Option<String>,
    /// Human readable reason.
    pub message: String,
}

impl ValidationError {
    /// Creates an error that is not tied to a specific field.
    pub fn new(message: impl Into<String>) -> Self {
        Self { field: None, message: message.into() }
    }

    /// Creates an error for a specific field.
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field: Some(field.into()), message: message.into() }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.field {
            Some(field) => write!(f, "{field}: {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Checks a document before it is inserted.
///
/// Implemented for any `Fn(&D) -> Result<(), ValidationError>` closure, so most
/// callers never name this trait.
pub trait Validator<D>: Send + Sync {
    /// Returns `Ok(())` when the document may be stored.
    fn validate(&self, document: &D) -> Result<(), ValidationError>;
}

impl<D, F> Validator<D> for F
where
    F: Fn(&D) -> Result<(), ValidationError> + Send + Sync,
{
    fn validate(&self, document: &D) -> Result<(), ValidationError> {
        self(document)
    }
}

/// Validator that accepts every document.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl<D> Validator<D> for AcceptAll {
    fn validate(&self, _document: &D) -> Result<(), ValidationError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closures_are_validators() {
        let non_empty = |name: &String| {
            if name.is_empty() {
                Err(ValidationError::field("name", "required"))
            } else {
                Ok(())
            }
        };

        assert!(non_empty.validate(&"Apple".to_string()).is_ok());
        let err = non_empty.validate(&String::new()).unwrap_err();
        assert_eq!(err.to_string(), "name: required");
        assert!(AcceptAll.validate(&String::new()).is_ok());
    }
}
