use std::sync::Arc;
use std::time::Instant;

use capture::LeadEvent;
use chrono::{NaiveDate, Utc};
use directory::{FailureKind, LookupError, OwnerLookup, OwnerRecord};
use notify::{LeadAlert, Notifier};
use queue::QueueMessage;
use serde_json::Value;
use store::{object_key, partition, ObjectStore, RecordClass};
use tracing::{error, info, warn};

use crate::clean::{clean_email, clean_phone, clean_string};
use crate::config::RefineConfig;
use crate::error::RefineError;
use crate::types::{
    BatchItem, Contact, ErrorRecord, LeadDetails, Outcome, ReasonCode, RefinedLead, RefinedStatus,
};


/// The refinement engine.
///
/// Holds the injected collaborators (store, lookup, notifier) plus the
/// stage configuration. Stateless across deliveries: all coordination
/// happens through the queue lease and the store's last-writer-wins
/// overwrite semantics, so any number of workers can run this engine
/// concurrently.
pub struct Refiner {
    store: Arc<dyn ObjectStore>,
    lookup: Arc<dyn OwnerLookup>,
    notifier: Arc<dyn Notifier>,
    cfg: RefineConfig,
}

impl Refiner {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        lookup: Arc<dyn OwnerLookup>,
        notifier: Arc<dyn Notifier>,
        cfg: RefineConfig,
    ) -> Self {
        Self {
            store,
            lookup,
            notifier,
            cfg,
        }
    }

    /// Process a batch of queue messages.
    ///
    /// Items are independent: each message gets its own outcome and one
    /// item's permanent failure or I/O error never blocks, delays, or
    /// fails the others.
    pub async fn process_batch(&self, batch: &[QueueMessage]) -> Vec<BatchItem> {
        let mut results = Vec::with_capacity(batch.len());
        for message in batch {
            let outcome = self.process_message(message).await;
            results.push(BatchItem {
                lead_id: message.lead_id.clone(),
                outcome,
            });
        }
        results
    }

    /// Process one delivery, capturing I/O failures as a retry outcome.
    pub async fn process_message(&self, message: &QueueMessage) -> Outcome {
        let start = Instant::now();

        match self.refine(message).await {
            Ok(outcome) => {
                let elapsed_micros = start.elapsed().as_micros();
                info!(
                    lead_id = %message.lead_id,
                    attempt = message.attempt,
                    outcome = ?outcome,
                    elapsed_micros,
                    "refinement_settled"
                );
                outcome
            }
            Err(err) => {
                let elapsed_micros = start.elapsed().as_micros();
                // Durable write or read failed: do not ack, let the queue
                // redeliver and the idempotent write run again.
                warn!(
                    lead_id = %message.lead_id,
                    attempt = message.attempt,
                    error = %err,
                    elapsed_micros,
                    "refinement_io_failure, delivery abandoned"
                );
                Outcome::Retry
            }
        }
    }

    async fn refine(&self, message: &QueueMessage) -> Result<Outcome, RefineError> {
        let Some(bytes) = self.store.get(&message.object_key)? else {
            error!(
                lead_id = %message.lead_id,
                object_key = %message.object_key,
                "raw record missing at refinement time; intake invariant violated"
            );
            return self
                .fail_permanent(
                    message,
                    None,
                    ReasonCode::RawMissing,
                    "raw record absent at refinement time".to_string(),
                )
                .await;
        };

        let event: LeadEvent = match serde_json::from_slice(&bytes) {
            Ok(event) => event,
            Err(err) => {
                error!(object_key = %message.object_key, error = %err, "raw record undecodable");
                return self
                    .fail_permanent(
                        message,
                        None,
                        ReasonCode::RawMissing,
                        format!("raw record undecodable: {err}"),
                    )
                    .await;
            }
        };
        let day = event.received_at.date_naive();

        let owner = if self.cfg.skip_lookup {
            None
        } else {
            let identifier = lookup_identifier(&event);
            match self.lookup.resolve(&identifier).await {
                Ok(record) => Some(record),
                Err(err) => match err.kind() {
                    FailureKind::Permanent => {
                        return self
                            .fail_permanent(message, Some(day), permanent_reason(&err), err.to_string())
                            .await;
                    }
                    FailureKind::Transient if message.attempt < self.cfg.retry_ceiling => {
                        // Below the ceiling a transient failure leaves no
                        // trace: no error record, just an abandoned
                        // delivery the queue will redeliver.
                        info!(
                            lead_id = %message.lead_id,
                            attempt = message.attempt,
                            ceiling = self.cfg.retry_ceiling,
                            error = %err,
                            "transient lookup failure, retrying via redelivery"
                        );
                        return Ok(Outcome::Retry);
                    }
                    FailureKind::Transient => {
                        return self
                            .fail_permanent(
                                message,
                                Some(day),
                                ReasonCode::LookupRetriesExhausted,
                                err.to_string(),
                            )
                            .await;
                    }
                },
            }
        };

        let refined = compose_refined(&event, owner.as_ref(), Utc::now());
        let enriched_key = object_key(RecordClass::Enriched, day, &event.lead_id);
        store::put_json(self.store.as_ref(), &enriched_key, &refined)?;

        // Best effort from here on: the enriched write has committed and
        // the message will be acked regardless of how notification goes.
        let alert = build_alert(&event, &refined, owner.as_ref());
        if let Err(err) = self.notifier.notify(&alert).await {
            warn!(lead_id = %refined.lead_id, error = %err, "notification_failed");
        }

        Ok(Outcome::Enriched)
    }

    /// Durably record a permanent failure, then settle the delivery.
    ///
    /// An error here propagates so the delivery is *not* acked — the error
    /// artifact write must stick before the message is consumed.
    async fn fail_permanent(
        &self,
        message: &QueueMessage,
        day: Option<NaiveDate>,
        reason_code: ReasonCode,
        detail: String,
    ) -> Result<Outcome, RefineError> {
        let day = day
            .or_else(|| partition(&message.object_key).ok().map(|parts| parts.day))
            .unwrap_or_else(|| Utc::now().date_naive());

        let record = ErrorRecord {
            lead_id: message.lead_id.clone(),
            failed_at: Utc::now(),
            reason_code,
            detail,
            raw_reference: message.object_key.clone(),
        };
        let errors_key = object_key(RecordClass::Errors, day, &message.lead_id);
        store::put_json(self.store.as_ref(), &errors_key, &record)?;

        warn!(
            lead_id = %message.lead_id,
            reason_code = %reason_code,
            "lead permanently failed"
        );
        Ok(Outcome::FailedPermanent(reason_code))
    }
}

/// The directory identifier for a lead: the CRM-assigned `owner` field
/// when present, otherwise the lead id itself.
fn lookup_identifier(event: &LeadEvent) -> String {
    let owner = clean_string(event.payload.get("owner"));
    if owner.is_empty() {
        event.lead_id.clone()
    } else {
        owner
    }
}

fn permanent_reason(err: &LookupError) -> ReasonCode {
    match err {
        LookupError::NotFound(_) => ReasonCode::LookupNotFound,
        _ => ReasonCode::LookupForbidden,
    }
}

fn compose_refined(
    event: &LeadEvent,
    owner: Option<&OwnerRecord>,
    processed_at: chrono::DateTime<Utc>,
) -> RefinedLead {
    let payload = &event.payload;

    let payload_owner = clean_string(payload.get("owner"));
    let resolved_owner = owner
        .and_then(|record| record.owner.clone())
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| {
            if payload_owner.is_empty() {
                "Unassigned".to_string()
            } else {
                payload_owner
            }
        });

    let source = clean_string(payload.get("source"));

    RefinedLead {
        lead_id: event.lead_id.clone(),
        captured_at: event.received_at,
        processed_at,
        status: RefinedStatus::Enriched,
        contact: Contact {
            name: clean_string(payload.get("name")),
            email: clean_email(payload.get("email")),
            phone: clean_phone(payload.get("phone")),
            company: clean_string(payload.get("company")),
        },
        lead_details: LeadDetails {
            source: if source.is_empty() {
                "Unknown".to_string()
            } else {
                source
            },
            campaign: clean_string(payload.get("campaign")),
            lead_score: payload.get("lead_score").and_then(Value::as_f64).unwrap_or(0.0),
            owner: resolved_owner,
        },
        original_payload: event.payload.clone(),
    }
}

fn build_alert(event: &LeadEvent, refined: &RefinedLead, owner: Option<&OwnerRecord>) -> LeadAlert {
    let status_label = clean_string(event.payload.get("status_label"));

    LeadAlert {
        lead_id: refined.lead_id.clone(),
        name: non_empty(&refined.contact.name),
        owner: refined.lead_details.owner.clone(),
        status_label: if status_label.is_empty() {
            "enriched".to_string()
        } else {
            status_label
        },
        email: non_empty(&refined.contact.email),
        source: non_empty(&refined.lead_details.source),
        funnel: owner.and_then(|record| record.funnel.clone()),
        enriched_at: refined.processed_at,
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
