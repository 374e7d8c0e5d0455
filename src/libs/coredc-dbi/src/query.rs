//! Subscriber List Queries
//!
//! Filter and pagination parameters for listing subscribers, with the MongoDB
//! query they translate to and the equivalent in-memory predicate.

use coredc_model::types::{NAME_STRING, SD_STRING, SLICE_STRING, SST_STRING};
use coredc_model::{normalize_hex, SubscriberRecord, ValidationError, ValidationResult};
use mongodb::bson::{doc, Document};

pub const DEFAULT_LIMIT: u32 = 100;
/// Largest offset a MongoDB skip accepts
pub const MAX_OFFSET: u64 = i64::MAX as u64;

/// Escape regular expression metacharacters so `value` matches literally
pub fn escape_regex(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(
            c,
            '\\' | '.' | '+' | '*' | '?' | '(' | ')' | '|' | '[' | ']' | '{' | '}' | '^' | '$' | '#' | '-'
        ) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Subscriber list filter
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriberFilter {
    /// Case-insensitive substring of the subscriber name
    pub name: Option<String>,
    /// Slice/Service Type carried by at least one slice
    pub sst: Option<i32>,
    /// Slice differentiator of that same slice (only used with `sst`)
    pub sd: Option<String>,
}

impl SubscriberFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_slice(mut self, sst: i32, sd: Option<&str>) -> Self {
        self.sst = Some(sst);
        self.sd = sd.map(str::to_string);
        self
    }

    fn name_filter(&self) -> Option<&str> {
        self.name.as_deref().filter(|name| !name.is_empty())
    }

    /// SD in canonical form, ignored unless an SST is given
    fn sd_filter(&self) -> Option<String> {
        self.sst?;
        self.sd
            .as_deref()
            .map(normalize_hex)
            .filter(|sd| !sd.is_empty())
            .map(|sd| sd.to_ascii_uppercase())
    }

    /// MongoDB query document for this filter
    pub fn to_document(&self) -> Document {
        let mut query = Document::new();

        if let Some(name) = self.name_filter() {
            query.insert(
                NAME_STRING,
                doc! { "$regex": escape_regex(name), "$options": "i" },
            );
        }

        if let Some(sst) = self.sst {
            let mut slice_filter = doc! { SST_STRING: sst };
            if let Some(sd) = self.sd_filter() {
                slice_filter.insert(SD_STRING, sd);
            }
            query.insert(SLICE_STRING, doc! { "$elemMatch": slice_filter });
        }

        query
    }

    /// Same semantics as [`to_document`](Self::to_document), evaluated in memory
    pub fn matches(&self, record: &SubscriberRecord) -> bool {
        if let Some(name) = self.name_filter() {
            let needle = name.to_lowercase();
            let found = record
                .name
                .as_deref()
                .map_or(false, |n| n.to_lowercase().contains(&needle));
            if !found {
                return false;
            }
        }

        match self.sst {
            Some(sst) => record.has_slice(sst, self.sd_filter().as_deref()),
            None => true,
        }
    }
}

/// Pagination window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: u32,
    pub offset: u64,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

impl Page {
    /// Create a page, rejecting a zero limit and offsets MongoDB cannot skip
    pub fn new(limit: u32, offset: u64) -> ValidationResult<Self> {
        if limit == 0 {
            return Err(ValidationError::InvalidParam {
                param: "limit".to_string(),
                reason: "must be greater than or equal to 1".to_string(),
            });
        }
        if offset > MAX_OFFSET {
            return Err(ValidationError::InvalidParam {
                param: "offset".to_string(),
                reason: format!("must be less than or equal to {MAX_OFFSET}"),
            });
        }
        Ok(Self { limit, offset })
    }
}
