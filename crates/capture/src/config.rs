//! Configuration for capture-time validation.
//!
//! [`CaptureConfig`] controls which fields an inbound event must carry,
//! whether metadata strings are sanitized, and how large a payload may be.
//! It is cheap to clone and serializable from external configuration.

use serde::{Deserialize, Serialize};

/// Payload fields that can be marked as required at capture time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[non_exhaustive]
pub enum RequiredField {
    /// A name-like identifier for the prospect.
    Name,
    /// An email-shaped contact address (shape-checked whenever present).
    Email,
    Phone,
    Company,
}

impl RequiredField {
    pub fn key(&self) -> &'static str {
        match self {
            RequiredField::Name => "name",
            RequiredField::Email => "email",
            RequiredField::Phone => "phone",
            RequiredField::Company => "company",
        }
    }
}

/// Runtime configuration for capture behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Fields that must be present, string-typed, and non-empty after
    /// sanitization. The default requires a name-like identifier and an
    /// email-like string.
    pub required_fields: Vec<RequiredField>,

    /// Strip ASCII control characters from string fields before
    /// validation. Prevents log injection; recommended on.
    pub strip_control_chars: bool,

    /// Maximum serialized payload size in bytes. `None` means unlimited.
    #[serde(default)]
    pub max_payload_bytes: Option<usize>,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            required_fields: vec![RequiredField::Name, RequiredField::Email],
            strip_control_chars: true,
            max_payload_bytes: None,
        }
    }
}
