//! Slack Block Kit payload construction.

use serde_json::{json, Value};

use crate::LeadAlert;

fn field(label: &str, value: Option<&str>, fallback: &str) -> Value {
    let value = match value {
        Some(v) if !v.is_empty() => v,
        _ => fallback,
    };
    json!({ "type": "mrkdwn", "text": format!("*{label}:*\n{value}") })
}

/// Build the Block Kit message for an enriched-lead alert.
pub fn slack_payload(alert: &LeadAlert) -> Value {
    json!({
        "text": "New Lead Alert",
        "blocks": [
            {
                "type": "header",
                "text": { "type": "plain_text", "text": "New Lead Enriched" }
            },
            {
                "type": "section",
                "fields": [
                    field("Name", alert.name.as_deref(), "N/A"),
                    field("Lead ID", Some(alert.lead_id.as_str()), "N/A"),
                    field("Label", Some(alert.status_label.as_str()), "N/A"),
                    field("Email", alert.email.as_deref(), "N/A"),
                    field("Owner", Some(alert.owner.as_str()), "Unassigned"),
                    field("Source", alert.source.as_deref(), "N/A"),
                    field("Funnel", alert.funnel.as_deref(), "N/A"),
                ]
            },
            {
                "type": "context",
                "elements": [{
                    "type": "mrkdwn",
                    "text": format!("Enriched at {}", alert.enriched_at.to_rfc3339())
                }]
            }
        ]
    })
}
