//! Failure routing across the whole pipeline: retry ceiling, permanent
//! classification, redelivery idempotence, and error-record precedence.

mod common;

use std::sync::Arc;
use std::time::Duration;

use leadflow::{
    get_json, DelayQueue, ErrorRecord, InMemoryDelayQueue, InMemoryStore, LookupError,
    ObjectStore, Outcome, OwnerRecord, Pipeline, PipelineOptions, ReasonCode, RefinedLead,
    StubOwnerLookup,
};

use common::{harness, lead_payload, RecordingNotifier};

const VISIBILITY: Duration = Duration::from_secs(300);

fn immediate_options() -> PipelineOptions {
    PipelineOptions {
        delay: Duration::ZERO,
        ..Default::default()
    }
}

#[tokio::test(start_paused = true)]
async fn always_transient_lookup_exhausts_after_the_ceiling() {
    let h = harness(
        StubOwnerLookup::new()
            .with_default(Err(LookupError::Transport("connection reset".into()))),
        immediate_options(),
    );
    h.pipeline.capture(lead_payload()).unwrap();

    // Initial attempt plus two retries, each separated by the visibility
    // timeout the nack imposes.
    let results = h.pipeline.run_batch().await.unwrap();
    assert_eq!(results[0].outcome, Outcome::Retry);
    assert_eq!(h.lookup.call_count(), 1);

    tokio::time::advance(VISIBILITY).await;
    let results = h.pipeline.run_batch().await.unwrap();
    assert_eq!(results[0].outcome, Outcome::Retry);
    assert_eq!(h.lookup.call_count(), 2);

    // No error artifact below the ceiling: transient failures are
    // invisible until exhausted.
    assert!(h.store.list("errors/").unwrap().is_empty());

    tokio::time::advance(VISIBILITY).await;
    let results = h.pipeline.run_batch().await.unwrap();
    assert_eq!(
        results[0].outcome,
        Outcome::FailedPermanent(ReasonCode::LookupRetriesExhausted)
    );
    assert_eq!(h.lookup.call_count(), 3);

    let error_keys = h.store.list("errors/").unwrap();
    assert_eq!(error_keys.len(), 1);
    let record: ErrorRecord = get_json(h.store.as_ref(), &error_keys[0]).unwrap().unwrap();
    assert_eq!(record.reason_code, ReasonCode::LookupRetriesExhausted);

    // Exhaustion acked the message: no further lookups ever happen.
    tokio::time::advance(Duration::from_secs(7200)).await;
    assert!(h.pipeline.run_batch().await.unwrap().is_empty());
    assert_eq!(h.lookup.call_count(), 3);
    assert!(h.notifier.alerts().is_empty());
}

#[tokio::test(start_paused = true)]
async fn not_found_is_terminal_on_the_first_attempt() {
    let h = harness(StubOwnerLookup::new(), immediate_options());
    h.pipeline.capture(lead_payload()).unwrap();

    let results = h.pipeline.run_batch().await.unwrap();
    assert_eq!(
        results[0].outcome,
        Outcome::FailedPermanent(ReasonCode::LookupNotFound)
    );
    assert_eq!(h.lookup.call_count(), 1);

    // A permanent classification never re-enters the queue.
    tokio::time::advance(Duration::from_secs(7200)).await;
    assert!(h.pipeline.run_batch().await.unwrap().is_empty());
    assert_eq!(h.lookup.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn crash_redelivery_does_not_consume_retry_budget() {
    // Drive the queue directly to simulate a worker that took a delivery
    // and died: the lease expires without an ack or nack.
    let queue = InMemoryDelayQueue::new(VISIBILITY);
    queue
        .enqueue(
            leadflow::QueueMessage {
                lead_id: "lead-1".into(),
                object_key: "raw/2025/08/06/lead-1.json".into(),
                enqueued_at: chrono::Utc::now(),
                attempt: 0,
            },
            Duration::ZERO,
        )
        .unwrap();

    let first = queue.receive_batch(10).unwrap();
    assert_eq!(first.len(), 1);
    drop(first); // worker crash: no settle

    tokio::time::advance(VISIBILITY).await;
    let second = queue.receive_batch(10).unwrap();
    assert_eq!(second.len(), 1);
    // The application retry counter is untouched; only the queue's own
    // redelivery count moved.
    assert_eq!(second[0].message.attempt, 0);
    assert_eq!(second[0].redelivery_count, 1);
}

#[tokio::test(start_paused = true)]
async fn duplicate_delivery_produces_equivalent_enriched_records() {
    let h = harness(
        StubOwnerLookup::new().with_default(Ok(OwnerRecord::named("John Smith"))),
        immediate_options(),
    );

    let mut payload = lead_payload();
    payload
        .as_object_mut()
        .unwrap()
        .insert("lead_id".into(), serde_json::json!("crm-lead-9"));
    h.pipeline.capture(payload.clone()).unwrap();

    assert_eq!(h.pipeline.run_batch().await.unwrap().len(), 1);
    let keys = h.store.list("enriched/").unwrap();
    let first: RefinedLead = get_json(h.store.as_ref(), &keys[0]).unwrap().unwrap();

    // Redeliver by capturing the identical event again (same lead_id):
    // the raw write and the enriched write both overwrite idempotently.
    h.pipeline.capture(payload).unwrap();
    assert_eq!(h.pipeline.run_batch().await.unwrap().len(), 1);

    let keys = h.store.list("enriched/").unwrap();
    assert_eq!(keys.len(), 1, "overwrite, never duplicate");
    let second: RefinedLead = get_json(h.store.as_ref(), &keys[0]).unwrap().unwrap();

    assert_eq!(first.lead_id, second.lead_id);
    assert_eq!(first.contact, second.contact);
    assert_eq!(first.lead_details, second.lead_details);
    assert_eq!(first.original_payload, second.original_payload);

    // Notifications are per delivery, not deduplicated.
    assert_eq!(h.notifier.alerts().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn enriched_record_is_authoritative_over_a_stale_error_record() {
    // One shared store, two pipeline generations: the first sees a broken
    // directory, the second a healthy one.
    let store = Arc::new(InMemoryStore::new());
    let notifier = Arc::new(RecordingNotifier::new());

    let failing = Pipeline::new(
        store.clone() as Arc<dyn ObjectStore>,
        Arc::new(InMemoryDelayQueue::default()),
        Arc::new(StubOwnerLookup::new()), // not found
        notifier.clone(),
        immediate_options(),
    );

    let mut payload = lead_payload();
    payload
        .as_object_mut()
        .unwrap()
        .insert("lead_id".into(), serde_json::json!("crm-lead-5"));

    failing.capture(payload.clone()).unwrap();
    let results = failing.run_batch().await.unwrap();
    assert_eq!(
        results[0].outcome,
        Outcome::FailedPermanent(ReasonCode::LookupNotFound)
    );
    assert_eq!(store.list("errors/").unwrap().len(), 1);

    // The directory heals; the same lead is re-captured later.
    let healthy = Pipeline::new(
        store.clone() as Arc<dyn ObjectStore>,
        Arc::new(InMemoryDelayQueue::default()),
        Arc::new(StubOwnerLookup::new().with_default(Ok(OwnerRecord::named("John Smith")))),
        notifier,
        immediate_options(),
    );
    healthy.capture(payload).unwrap();
    let results = healthy.run_batch().await.unwrap();
    assert_eq!(results[0].outcome, Outcome::Enriched);

    // Both artifacts coexist; the enriched record is the current terminal
    // state and the stale error record is advisory only.
    assert_eq!(store.list("errors/").unwrap().len(), 1);
    let enriched_keys = store.list("enriched/").unwrap();
    assert_eq!(enriched_keys.len(), 1);
    let refined: RefinedLead = get_json(store.as_ref(), &enriched_keys[0]).unwrap().unwrap();
    assert_eq!(refined.lead_details.owner, "John Smith");
}
