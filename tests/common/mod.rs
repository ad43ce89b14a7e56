//! Shared fixtures for the integration suites.
#![allow(dead_code)] // each test binary uses a different subset

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use leadflow::{
    InMemoryDelayQueue, InMemoryStore, LeadAlert, Notifier, NotifyError, ObjectStore, Pipeline,
    PipelineOptions, StubOwnerLookup,
};

/// Notifier that records every alert instead of pushing anywhere.
pub struct RecordingNotifier {
    alerts: Mutex<Vec<LeadAlert>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self {
            alerts: Mutex::new(Vec::new()),
        }
    }

    pub fn alerts(&self) -> Vec<LeadAlert> {
        self.alerts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, alert: &LeadAlert) -> Result<(), NotifyError> {
        self.alerts.lock().unwrap().push(alert.clone());
        Ok(())
    }
}

/// A pipeline over in-memory collaborators, with handles kept for
/// assertions.
pub struct Harness {
    pub pipeline: Pipeline,
    pub store: Arc<InMemoryStore>,
    pub lookup: Arc<StubOwnerLookup>,
    pub notifier: Arc<RecordingNotifier>,
}

pub fn harness(lookup: StubOwnerLookup, options: PipelineOptions) -> Harness {
    let store = Arc::new(InMemoryStore::new());
    let lookup = Arc::new(lookup);
    let notifier = Arc::new(RecordingNotifier::new());
    let queue = Arc::new(InMemoryDelayQueue::default());

    let pipeline = Pipeline::new(
        store.clone() as Arc<dyn ObjectStore>,
        queue,
        lookup.clone(),
        notifier.clone(),
        options,
    );

    Harness {
        pipeline,
        store,
        lookup,
        notifier,
    }
}

pub fn lead_payload() -> serde_json::Value {
    serde_json::json!({
        "name": "Jane Smith",
        "email": "Jane@Test.com",
        "phone": "+1 (555) 012-3456",
        "source": "webinar",
    })
}
