//! Configurable stub lookup for tests and offline runs.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::{LookupError, OwnerLookup, OwnerRecord};

/// An [`OwnerLookup`] backed by a fixed response table.
///
/// Unknown identifiers resolve to the configured default, which is
/// `NotFound` unless overridden. Every call is recorded so tests can
/// assert on retry counts.
pub struct StubOwnerLookup {
    responses: HashMap<String, Result<OwnerRecord, LookupError>>,
    default: Result<OwnerRecord, LookupError>,
    calls: Mutex<Vec<String>>,
}

impl StubOwnerLookup {
    pub fn new() -> Self {
        Self {
            responses: HashMap::new(),
            default: Err(LookupError::NotFound("unknown".into())),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Resolve `id` to the given owner record.
    pub fn with_owner(mut self, id: impl Into<String>, record: OwnerRecord) -> Self {
        self.responses.insert(id.into(), Ok(record));
        self
    }

    /// Resolve `id` to the given failure.
    pub fn with_failure(mut self, id: impl Into<String>, err: LookupError) -> Self {
        self.responses.insert(id.into(), Err(err));
        self
    }

    /// Response for identifiers with no explicit entry.
    pub fn with_default(mut self, response: Result<OwnerRecord, LookupError>) -> Self {
        self.default = response;
        self
    }

    /// Identifiers resolved so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or(0)
    }
}

impl Default for StubOwnerLookup {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OwnerLookup for StubOwnerLookup {
    async fn resolve(&self, id: &str) -> Result<OwnerRecord, LookupError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(id.to_string());
        }
        match self.responses.get(id) {
            Some(response) => response.clone(),
            None => match &self.default {
                Ok(record) => Ok(record.clone()),
                // NotFound carries the identifier that was actually asked for.
                Err(LookupError::NotFound(_)) => Err(LookupError::NotFound(id.to_string())),
                Err(err) => Err(err.clone()),
            },
        }
    }
}
