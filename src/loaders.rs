//! Resource loading utilities
//!
//! This module reads metadata documents from files or memory and turns them
//! into element trees. Fetching documents over HTTP is left to the caller.

use crate::documents::{Document, Element};
use crate::error::{Error, Result};
use crate::limits::Limits;
use std::fs;
use std::path::Path;

/// Resource loader for metadata documents
#[derive(Debug, Default)]
pub struct Loader {
    /// Resource limits
    limits: Limits,
}

impl Loader {
    /// Create a new loader with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the limits
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Get the limits in effect
    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Load a file as bytes, checking the size limit before reading it
    pub fn load_bytes(&self, path: &Path) -> Result<Vec<u8>> {
        let metadata = fs::metadata(path).map_err(|e| {
            Error::Resource(format!("Failed to read file '{}': {}", path.display(), e))
        })?;
        self.limits
            .check_xml_size(usize::try_from(metadata.len()).unwrap_or(usize::MAX))?;

        fs::read(path).map_err(|e| {
            Error::Resource(format!("Failed to read file '{}': {}", path.display(), e))
        })
    }

    /// Load and parse a metadata document, returning its root element
    pub fn load_root(&self, path: &Path) -> Result<Element> {
        let bytes = self.load_bytes(path)?;
        let doc = Document::parse_with_limits(&bytes, &self.limits).map_err(|e| match e {
            Error::Parse(parse) => Error::Parse(parse.with_source(path.display().to_string())),
            other => other,
        })?;
        doc.into_root()
    }

    /// Parse an in-memory metadata document, returning its root element
    pub fn parse_root(&self, xml: &str) -> Result<Element> {
        Document::parse_with_limits(xml.as_bytes(), &self.limits)?.into_root()
    }
}
