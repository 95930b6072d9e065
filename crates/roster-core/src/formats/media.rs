//! Media types and `Accept` negotiation.
//!
//! Quality values are parsed in thousandths (`q=0.8` -> 800) so no floating
//! point is involved.

use super::Format;
use std::fmt;
use thiserror::Error;

/// Vendor type for hypermedia responses.
pub const HATEOAS_JSON: &str = "application/x.y.hateoas+json";
pub const HATEOAS_XML: &str = "application/x.y.hateoas+xml";
/// Vendor type for the API root document.
pub const APIROOT_JSON: &str = "application/x.y.apiroot+json";
pub const APIROOT_XML: &str = "application/x.y.apiroot+xml";

/// Media types the API can produce, in server preference order.
pub const SUPPORTED: [&str; 8] = [
    "application/json",
    "application/xml",
    "text/xml",
    "text/csv",
    HATEOAS_JSON,
    HATEOAS_XML,
    APIROOT_JSON,
    APIROOT_XML,
];

const MAX_QUALITY: u16 = 1000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NegotiationError {
    /// The header held nothing that parses as a media range.
    #[error("Media type not present. Please add Accept header with the required media type.")]
    Malformed,

    /// Nothing the client accepts can be produced.
    #[error("none of the requested media types are supported: {0}")]
    NotAcceptable(String),
}

/// A concrete media type such as `application/x.y.hateoas+json`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaType {
    kind: String,
    subtype: String,
}

impl MediaType {
    /// Parse `type/subtype`, ignoring parameters. Wildcards are rejected.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let essence = raw.split(';').next()?.trim();
        let (kind, subtype) = essence.split_once('/')?;
        let (kind, subtype) = (kind.trim(), subtype.trim());
        if kind.is_empty() || subtype.is_empty() || kind == "*" || subtype == "*" {
            return None;
        }
        Some(Self {
            kind: kind.to_ascii_lowercase(),
            subtype: subtype.to_ascii_lowercase(),
        })
    }

    #[must_use]
    pub fn json() -> Self {
        Self {
            kind: "application".into(),
            subtype: "json".into(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    #[must_use]
    pub fn subtype(&self) -> &str {
        &self.subtype
    }

    /// `x.y.hateoas` for `x.y.hateoas+json`.
    #[must_use]
    pub fn subtype_without_suffix(&self) -> &str {
        self.subtype
            .split_once('+')
            .map(|(base, _)| base)
            .unwrap_or(&self.subtype)
    }

    /// `json` for `x.y.hateoas+json`.
    #[must_use]
    pub fn suffix(&self) -> Option<&str> {
        self.subtype.split_once('+').map(|(_, suffix)| suffix)
    }

    /// Hypermedia links are emitted only for `*hateoas` subtypes.
    #[must_use]
    pub fn wants_links(&self) -> bool {
        self.subtype_without_suffix().ends_with("hateoas")
    }

    #[must_use]
    pub fn is_api_root(&self) -> bool {
        self.subtype_without_suffix().ends_with("apiroot")
    }

    /// The encoder that renders this media type.
    #[must_use]
    pub fn format(&self) -> Format {
        match self.suffix().unwrap_or(&self.subtype) {
            "xml" => Format::Xml,
            "csv" => Format::Csv,
            _ => Format::Json,
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.subtype)
    }
}

/// One entry of an `Accept` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaRange {
    pub kind: String,
    pub subtype: String,
    /// Quality in thousandths, `0..=1000`.
    pub quality: u16,
}

impl MediaRange {
    fn parse(raw: &str) -> Option<Self> {
        let mut parts = raw.split(';');
        let (kind, subtype) = parts.next()?.trim().split_once('/')?;
        let (kind, subtype) = (kind.trim(), subtype.trim());
        if kind.is_empty() || subtype.is_empty() || (kind == "*" && subtype != "*") {
            return None;
        }

        let mut quality = MAX_QUALITY;
        for param in parts {
            if let Some((name, value)) = param.split_once('=') {
                if name.trim().eq_ignore_ascii_case("q") {
                    quality = parse_quality(value.trim())?;
                }
            }
        }

        Some(Self {
            kind: kind.to_ascii_lowercase(),
            subtype: subtype.to_ascii_lowercase(),
            quality,
        })
    }

    fn specificity(&self) -> u8 {
        match (self.kind.as_str(), self.subtype.as_str()) {
            ("*", _) => 0,
            (_, "*") => 1,
            _ => 2,
        }
    }

    fn matches(&self, media: &MediaType) -> bool {
        (self.kind == "*" || self.kind == media.kind)
            && (self.subtype == "*" || self.subtype == media.subtype)
    }
}

/// `1`, `1.0`, `0.5`, `0.125` -> thousandths. Anything else is malformed.
fn parse_quality(value: &str) -> Option<u16> {
    let (whole, fraction) = value.split_once('.').unwrap_or((value, ""));
    if fraction.len() > 3 || !fraction.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let whole: u16 = whole.parse().ok()?;
    let mut thousandths: u16 = 0;
    for (i, digit) in fraction.chars().enumerate() {
        let d = digit.to_digit(10)? as u16;
        thousandths += d * 10u16.pow(2 - i as u32);
    }
    let quality = whole.checked_mul(MAX_QUALITY)?.checked_add(thousandths)?;
    (quality <= MAX_QUALITY).then_some(quality)
}

/// Parse an `Accept` header, ordered by quality then specificity.
/// Entries with `q=0` are dropped.
pub fn parse_accept(header: &str) -> Result<Vec<MediaRange>, NegotiationError> {
    let mut parsed: Vec<MediaRange> = header
        .split(',')
        .filter(|entry| !entry.trim().is_empty())
        .filter_map(MediaRange::parse)
        .collect();
    if parsed.is_empty() {
        return Err(NegotiationError::Malformed);
    }
    parsed.retain(|range| range.quality > 0);
    parsed.sort_by(|a, b| {
        b.quality
            .cmp(&a.quality)
            .then_with(|| b.specificity().cmp(&a.specificity()))
    });
    Ok(parsed)
}

/// Pick the media type to respond with. A missing header means JSON.
pub fn negotiate(accept: Option<&str>) -> Result<MediaType, NegotiationError> {
    let Some(header) = accept.filter(|h| !h.trim().is_empty()) else {
        return Ok(MediaType::json());
    };
    let ranges = parse_accept(header)?;
    for range in &ranges {
        for candidate in SUPPORTED {
            if let Some(media) = MediaType::parse(candidate) {
                if range.matches(&media) {
                    return Ok(media);
                }
            }
        }
    }
    Err(NegotiationError::NotAcceptable(header.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chosen(accept: &str) -> Option<String> {
        negotiate(Some(accept)).ok().map(|m| m.to_string())
    }

    #[test]
    fn missing_header_defaults_to_json() {
        assert_eq!(negotiate(None), Ok(MediaType::json()));
        assert_eq!(negotiate(Some("  ")), Ok(MediaType::json()));
    }

    #[test]
    fn exact_types_are_honoured() {
        assert_eq!(chosen("text/csv").as_deref(), Some("text/csv"));
        assert_eq!(chosen("application/xml").as_deref(), Some("application/xml"));
        assert_eq!(chosen(HATEOAS_JSON).as_deref(), Some(HATEOAS_JSON));
    }

    #[test]
    fn wildcards_resolve_to_server_preference() {
        assert_eq!(chosen("*/*").as_deref(), Some("application/json"));
        assert_eq!(chosen("text/*").as_deref(), Some("text/xml"));
    }

    #[test]
    fn quality_orders_ranges() {
        assert_eq!(
            chosen("application/json;q=0.5, application/xml;q=0.9").as_deref(),
            Some("application/xml")
        );
        assert_eq!(
            chosen("text/csv;q=0, application/json").as_deref(),
            Some("application/json")
        );
    }

    #[test]
    fn specific_range_beats_wildcard_at_equal_quality() {
        assert_eq!(chosen("*/*, text/csv").as_deref(), Some("text/csv"));
    }

    #[test]
    fn unsupported_types_are_not_acceptable() {
        assert!(matches!(
            negotiate(Some("image/png")),
            Err(NegotiationError::NotAcceptable(_))
        ));
    }

    #[test]
    fn garbage_is_malformed() {
        assert_eq!(negotiate(Some("nonsense")), Err(NegotiationError::Malformed));
        assert_eq!(
            negotiate(Some("text/csv;q=banana")),
            Err(NegotiationError::Malformed)
        );
    }

    #[test]
    fn quality_parsing() {
        assert_eq!(parse_quality("1"), Some(1000));
        assert_eq!(parse_quality("1.000"), Some(1000));
        assert_eq!(parse_quality("0.8"), Some(800));
        assert_eq!(parse_quality("0.125"), Some(125));
        assert_eq!(parse_quality("1.5"), None);
        assert_eq!(parse_quality("0.1234"), None);
    }

    #[test]
    fn hateoas_and_root_detection() {
        let hateoas = MediaType::parse(HATEOAS_XML);
        assert_eq!(hateoas.as_ref().map(MediaType::wants_links), Some(true));
        assert_eq!(hateoas.map(|m| m.format()), Some(Format::Xml));

        let root = MediaType::parse(APIROOT_JSON);
        assert_eq!(root.as_ref().map(MediaType::is_api_root), Some(true));
        assert_eq!(root.map(|m| m.wants_links()), Some(false));

        assert_eq!(
            MediaType::parse("text/csv").map(|m| m.format()),
            Some(Format::Csv)
        );
    }
}
