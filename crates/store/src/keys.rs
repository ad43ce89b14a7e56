//! Object key layout for lead records.
//!
//! All three record classes share one hierarchical template,
//! `<prefix>/{yyyy}/{mm}/{dd}/{lead_id}.json`, partitioned by the day the
//! lead was captured. The enriched and error records for a lead reuse the
//! raw key's partition, so [`sibling_key`] can derive one from another
//! without consulting a calendar.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::StoreError;

/// The three record classes stored by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordClass {
    /// Immutable capture-time snapshot of the inbound event.
    Raw,
    /// Cleaned and owner-resolved record; authoritative once present.
    Enriched,
    /// Advisory permanent-failure artifacts.
    Errors,
}

impl RecordClass {
    pub fn prefix(&self) -> &'static str {
        match self {
            RecordClass::Raw => "raw",
            RecordClass::Enriched => "enriched",
            RecordClass::Errors => "errors",
        }
    }

    fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "raw" => Some(RecordClass::Raw),
            "enriched" => Some(RecordClass::Enriched),
            "errors" => Some(RecordClass::Errors),
            _ => None,
        }
    }
}

/// Parsed components of an object key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyParts {
    pub class: RecordClass,
    pub day: NaiveDate,
    pub lead_id: String,
}

/// Build the object key for `lead_id` in the given class and day partition.
pub fn object_key(class: RecordClass, day: NaiveDate, lead_id: &str) -> String {
    format!(
        "{}/{:04}/{:02}/{:02}/{}.json",
        class.prefix(),
        day.year(),
        day.month(),
        day.day(),
        lead_id
    )
}

/// Parse an object key back into its components.
pub fn partition(key: &str) -> Result<KeyParts, StoreError> {
    let invalid = || StoreError::InvalidKey(key.to_string());

    let mut parts = key.split('/');
    let class = parts
        .next()
        .and_then(RecordClass::from_prefix)
        .ok_or_else(invalid)?;
    let year: i32 = parts.next().and_then(|s| s.parse().ok()).ok_or_else(invalid)?;
    let month: u32 = parts.next().and_then(|s| s.parse().ok()).ok_or_else(invalid)?;
    let day: u32 = parts.next().and_then(|s| s.parse().ok()).ok_or_else(invalid)?;
    let file = parts.next().ok_or_else(invalid)?;
    if parts.next().is_some() {
        return Err(invalid());
    }

    let date = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(invalid)?;
    let lead_id = file.strip_suffix(".json").ok_or_else(invalid)?;
    if lead_id.is_empty() {
        return Err(invalid());
    }

    Ok(KeyParts {
        class,
        day: date,
        lead_id: lead_id.to_string(),
    })
}

/// Derive the key of another record class for the same lead and partition.
pub fn sibling_key(key: &str, class: RecordClass) -> Result<String, StoreError> {
    let parts = partition(key)?;
    Ok(object_key(class, parts.day, &parts.lead_id))
}
