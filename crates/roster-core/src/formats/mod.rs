//! # Formats Module
//!
//! Output representations for API responses.
//!
//! This module contains:
//! - `media`: media type parsing and `Accept` negotiation
//! - `xml`: XML encoder
//! - `csv`: CSV encoder for flat records
//!
//! Handlers build a `serde_json::Value` once; the negotiated media type picks
//! the encoder. Writing the bytes to a socket stays in the app layer.

mod csv;
pub mod media;
mod xml;

pub use csv::to_csv;
pub use media::{MediaType, NegotiationError, negotiate};
pub use xml::to_xml;

use serde_json::Value;
use thiserror::Error;

/// Wire encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Xml,
    Csv,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    /// CSV can only carry flat records.
    #[error("representation is not tabular and cannot be written as CSV")]
    NotTabular,

    #[error("JSON encoding failed: {0}")]
    Json(String),
}

impl From<serde_json::Error> for FormatError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Element names used when a value is written as XML.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XmlNames {
    pub root: &'static str,
    pub item: &'static str,
}

impl XmlNames {
    #[must_use]
    pub const fn new(root: &'static str, item: &'static str) -> Self {
        Self { root, item }
    }
}

/// Encode `value` for `media`.
pub fn encode(value: &Value, media: &MediaType, names: XmlNames) -> Result<Vec<u8>, FormatError> {
    match media.format() {
        Format::Json => Ok(serde_json::to_vec(value)?),
        Format::Xml => Ok(to_xml(value, names.root, names.item).into_bytes()),
        Format::Csv => Ok(to_csv(value)?.into_bytes()),
    }
}
