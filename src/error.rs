//! Error types for edmx-rs
//!
//! This module defines all error types used throughout the library.

use std::fmt;
use thiserror::Error;

/// Result type alias using edmx Error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for edmx operations
#[derive(Error, Debug)]
pub enum Error {
    /// A required attribute is absent on an EDM element
    #[error("missing attribute '{attribute}' on <{element}>")]
    MissingAttribute {
        /// Local name of the offending element
        element: String,
        /// Name of the attribute that was expected
        attribute: String,
    },

    /// An element appeared without the enclosing construct it belongs to
    #[error("structure error: {0}")]
    Structure(String),

    /// XML document parsing error
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// XML parsing error without location information
    #[error("XML error: {0}")]
    Xml(String),

    /// Resource loading error
    #[error("resource error: {0}")]
    Resource(String),

    /// Limit exceeded error
    #[error("limit exceeded: {0}")]
    LimitExceeded(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a missing attribute error for the given element
    pub fn missing_attribute(element: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self::MissingAttribute {
            element: element.into(),
            attribute: attribute.into(),
        }
    }
}

/// XML document parsing error
#[derive(Debug, Clone)]
pub struct ParseError {
    /// Error message
    pub message: String,
    /// Location in the document, as `line:column`
    pub location: Option<String>,
    /// Document name that caused the error
    pub source: Option<String>,
}

impl ParseError {
    /// Create a new parse error
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            location: None,
            source: None,
        }
    }

    /// Set the location
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Set the source
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;

        if let Some(ref loc) = self.location {
            write!(f, "\n\nLocation: {}", loc)?;
        }

        if let Some(ref src) = self.source {
            write!(f, "\n\nSource: {}", src)?;
        }

        Ok(())
    }
}

impl std::error::Error for ParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_attribute_display() {
        let err = Error::missing_attribute("Property", "Type");
        assert_eq!(err.to_string(), "missing attribute 'Type' on <Property>");
    }

    #[test]
    fn test_parse_error_display() {
        let err = ParseError::new("Unexpected end of input")
            .with_location("12:4")
            .with_source("metadata.xml");

        let msg = format!("{}", err);
        assert!(msg.contains("Unexpected end of input"));
        assert!(msg.contains("Location: 12:4"));
        assert!(msg.contains("Source: metadata.xml"));
    }

    #[test]
    fn test_error_conversion() {
        let parse_err = ParseError::new("test");
        let err: Error = parse_err.into();
        assert!(matches!(err, Error::Parse(_)));
    }
}
