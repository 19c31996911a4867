//! Webhook dispatcher - delivers domain events to user-configured endpoints.
//!
//! Fire-and-forget from the caller's perspective: delivery failure never
//! affects the domain operation that triggered the event. Each endpoint is
//! handled independently with a bounded retry policy that distinguishes
//! transient failures (5xx, network) from permanent client misconfiguration
//! (4xx, never retried).

use chrono::Utc;
use uuid::Uuid;

use crate::kernel::ServerDeps;

use super::models::WebhookEndpoint;

/// Total attempts per endpoint, including the first.
pub const MAX_ATTEMPTS: u32 = 3;

/// How one endpoint delivery ended. Used for logging and tests; callers of
/// `deliver` never see it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered { attempts: u32 },
    /// 4xx response: the endpoint is misconfigured, retrying cannot help.
    ClientError { status: u16 },
    Exhausted { attempts: u32, last_error: String },
}

/// Hand an event off to a detached delivery task.
///
/// The triggering request path never awaits delivery; the spawned task owns
/// its own error handling.
pub fn notify(
    deps: &ServerDeps,
    account_id: Uuid,
    event_type: &str,
    payload: serde_json::Value,
) {
    let deps = deps.clone();
    let event_type = event_type.to_string();
    tokio::spawn(async move {
        deliver(&deps, account_id, &event_type, payload).await;
    });
}

/// Deliver an event to every active endpoint of the account. Never fails.
pub async fn deliver(
    deps: &ServerDeps,
    account_id: Uuid,
    event_type: &str,
    payload: serde_json::Value,
) {
    let endpoints = match WebhookEndpoint::find_active_for_account(account_id, &deps.db_pool).await
    {
        Ok(endpoints) => endpoints,
        Err(e) => {
            tracing::error!(
                account_id = %account_id,
                event = event_type,
                error = %e,
                "Failed to load webhook endpoints"
            );
            return;
        }
    };

    if endpoints.is_empty() {
        return;
    }

    let body = serde_json::json!({
        "event": event_type,
        "timestamp": Utc::now().to_rfc3339(),
        "data": payload,
    });

    for endpoint in &endpoints {
        match deliver_to_endpoint(&deps.http, endpoint, event_type, &body).await {
            DeliveryOutcome::Delivered { attempts } => {
                tracing::debug!(
                    endpoint_id = %endpoint.id,
                    event = event_type,
                    attempts,
                    "Webhook delivered"
                );
            }
            DeliveryOutcome::ClientError { status } => {
                tracing::warn!(
                    endpoint_id = %endpoint.id,
                    url = %endpoint.url,
                    event = event_type,
                    status,
                    "Webhook rejected by endpoint, not retrying"
                );
            }
            DeliveryOutcome::Exhausted {
                attempts,
                last_error,
            } => {
                tracing::warn!(
                    endpoint_id = %endpoint.id,
                    url = %endpoint.url,
                    event = event_type,
                    attempts,
                    error = %last_error,
                    "Webhook delivery failed after retries"
                );
            }
        }
    }
}

/// Deliver one event body to one endpoint with bounded retries.
pub async fn deliver_to_endpoint(
    client: &reqwest::Client,
    endpoint: &WebhookEndpoint,
    event_type: &str,
    body: &serde_json::Value,
) -> DeliveryOutcome {
    let mut last_error = String::new();

    for attempt in 1..=MAX_ATTEMPTS {
        let response = client
            .post(&endpoint.url)
            .header("X-Webhook-Event", event_type)
            .header("X-Webhook-Id", endpoint.id.to_string())
            .json(body)
            .send()
            .await;

        match response {
            Ok(response) if response.status().is_success() => {
                return DeliveryOutcome::Delivered { attempts: attempt };
            }
            Ok(response) if is_permanent(response.status()) => {
                return DeliveryOutcome::ClientError {
                    status: response.status().as_u16(),
                };
            }
            Ok(response) => {
                // 5xx and anything else unexpected: transient, retry.
                last_error = format!("endpoint returned {}", response.status());
            }
            Err(e) => {
                // No response at all (timeout, connect failure): transient.
                last_error = e.to_string();
            }
        }
    }

    DeliveryOutcome::Exhausted {
        attempts: MAX_ATTEMPTS,
        last_error,
    }
}

/// 4xx responses are permanent client configuration errors.
fn is_permanent(status: reqwest::StatusCode) -> bool {
    status.is_client_error()
}
