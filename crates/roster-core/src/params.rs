//! # Request Parameters
//!
//! Paging, sorting, shaping and filtering options taken from a query string.
//! Keys are matched case-insensitively; unknown keys are ignored.

use thiserror::Error;

/// Largest page a client may request.
pub const MAX_PAGE_SIZE: u32 = 50;

/// Page size when none is given.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// A query value that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("The value '{value}' is not valid for {field}.")]
pub struct ParamError {
    pub field: &'static str,
    pub value: String,
}

/// Options common to every list endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestParameters {
    page_number: u32,
    page_size: u32,
    pub order_by: Option<String>,
    pub fields: Option<String>,
}

impl Default for RequestParameters {
    fn default() -> Self {
        Self {
            page_number: 1,
            page_size: DEFAULT_PAGE_SIZE,
            order_by: None,
            fields: None,
        }
    }
}

impl RequestParameters {
    #[must_use]
    pub fn page_number(&self) -> u32 {
        self.page_number
    }

    #[must_use]
    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Pages start at 1.
    pub fn set_page_number(&mut self, page: u32) {
        self.page_number = page.max(1);
    }

    /// Clamped to `1..=MAX_PAGE_SIZE`.
    pub fn set_page_size(&mut self, size: u32) {
        self.page_size = size.clamp(1, MAX_PAGE_SIZE);
    }

    /// Apply one query pair. Returns `Ok(false)` when the key is not a paging key.
    fn apply(&mut self, key: &str, value: &str) -> Result<bool, ParamError> {
        match key.to_ascii_lowercase().as_str() {
            "pagenumber" => self.set_page_number(parse_u32("pageNumber", value)?),
            "pagesize" => self.set_page_size(parse_u32("pageSize", value)?),
            "orderby" => self.order_by = non_blank(value),
            "fields" => self.fields = non_blank(value),
            _ => return Ok(false),
        }
        Ok(true)
    }

    /// Parse from decoded query pairs.
    pub fn from_pairs<'a, I>(pairs: I) -> Result<Self, ParamError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut params = Self::default();
        for (key, value) in pairs {
            params.apply(key, value)?;
        }
        Ok(params)
    }
}

/// List options for a company's employees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmployeeParameters {
    pub request: RequestParameters,
    pub min_age: u32,
    pub max_age: u32,
    pub search_term: Option<String>,
}

impl Default for EmployeeParameters {
    fn default() -> Self {
        Self {
            request: RequestParameters {
                order_by: Some("name".to_string()),
                ..RequestParameters::default()
            },
            min_age: 0,
            max_age: i32::MAX as u32,
            search_term: None,
        }
    }
}

impl EmployeeParameters {
    /// The range is usable only when `max_age` is strictly above `min_age`.
    #[must_use]
    pub fn valid_age_range(&self) -> bool {
        self.max_age > self.min_age
    }

    /// Parse from decoded query pairs.
    pub fn from_pairs<'a, I>(pairs: I) -> Result<Self, ParamError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut params = Self::default();
        for (key, value) in pairs {
            if params.request.apply(key, value)? {
                continue;
            }
            match key.to_ascii_lowercase().as_str() {
                "minage" => params.min_age = parse_u32("minAge", value)?,
                "maxage" => params.max_age = parse_u32("maxAge", value)?,
                "searchterm" => params.search_term = non_blank(value),
                _ => {}
            }
        }
        if params.request.order_by.is_none() {
            params.request.order_by = Some("name".to_string());
        }
        Ok(params)
    }

    #[must_use]
    pub fn fields(&self) -> Option<&str> {
        self.request.fields.as_deref()
    }
}

fn parse_u32(field: &'static str, value: &str) -> Result<u32, ParamError> {
    value.trim().parse().map_err(|_| ParamError {
        field,
        value: value.to_string(),
    })
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
