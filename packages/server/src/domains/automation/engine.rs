//! Automation engine - processes one incoming comment against one rule.
//!
//! Invoked by the comment-event caller once per (rule, comment) pair; the
//! caller owns fan-out across the rules watching a post. Non-matching
//! comments incur minimal work (one log row, zero external calls). On a
//! keyword match, the configured actions run independently in a fixed
//! order: a failure in one never prevents the others from being attempted,
//! and nothing propagates past `process_comment`.

use serde::Deserialize;
use uuid::Uuid;

use crate::domains::webhooks::dispatcher;
use crate::kernel::social_api::SocialIntegration;
use crate::kernel::{LeadInput, ServerDeps};

use super::models::{AutomationEvent, AutomationEventType, AutomationRule};

/// Marker returned for comments that match no configured keyword.
pub const NO_KEYWORD_MATCH: &str = "no_keyword_match";

/// Who left the comment.
#[derive(Debug, Clone, Deserialize)]
pub struct Commenter {
    /// Social-network identity of the commenter.
    pub id: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub profile_url: Option<String>,
}

impl Commenter {
    /// "First Last", or whichever half is present.
    pub fn full_name(&self) -> String {
        [self.first_name.as_deref(), self.last_name.as_deref()]
            .iter()
            .flatten()
            .copied()
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// A comment event received from the social network.
#[derive(Debug, Clone, Deserialize)]
pub struct IncomingComment {
    pub post_id: String,
    pub comment_id: String,
    pub text: String,
    pub commenter: Commenter,
}

/// Aggregated result of one engine run, for observability.
#[derive(Debug, Default)]
pub struct EngineOutcome {
    pub actions_taken: Vec<String>,
    pub errors: Vec<String>,
}

/// Process one comment against one automation rule.
///
/// Never returns an error: every external call and every log write is
/// individually guarded, and failures land in the outcome's error list.
pub async fn process_comment(
    deps: &ServerDeps,
    rule: &AutomationRule,
    comment: &IncomingComment,
) -> EngineOutcome {
    let mut outcome = EngineOutcome::default();
    let commenter = &comment.commenter;

    log_event(
        deps,
        rule.id,
        AutomationEventType::CommentDetected,
        commenter,
        Some(&comment.text),
        None,
    )
    .await;

    let Some(keyword) = rule.matched_keyword(&comment.text) else {
        outcome.actions_taken.push(NO_KEYWORD_MATCH.to_string());
        return outcome;
    };

    log_event(
        deps,
        rule.id,
        AutomationEventType::KeywordMatched,
        commenter,
        Some(&format!("matched keyword '{}'", keyword)),
        None,
    )
    .await;

    // Posting identity used by the like and reply actions. An unresolvable
    // identity is each dependent action's own failure, not an engine abort.
    let posting_account = if rule.auto_like || rule.reply_template.is_some() {
        resolve_posting_account(deps, rule.account_id).await
    } else {
        Ok(None)
    };

    // Action a: like the source post.
    if rule.auto_like {
        match &posting_account {
            Ok(Some(account)) => {
                match deps.social.add_reaction(&comment.post_id, account, "like").await {
                    Ok(()) => {
                        log_event(
                            deps,
                            rule.id,
                            AutomationEventType::LikeSent,
                            commenter,
                            Some(&format!("liked post {} as {}", comment.post_id, account)),
                            None,
                        )
                        .await;
                        outcome.actions_taken.push("like".to_string());
                    }
                    Err(e) => {
                        let error = e.to_string();
                        log_event(
                            deps,
                            rule.id,
                            AutomationEventType::LikeFailed,
                            commenter,
                            None,
                            Some(&error),
                        )
                        .await;
                        outcome.errors.push(error);
                    }
                }
            }
            Ok(None) | Err(_) => {
                let error = match &posting_account {
                    Err(e) => e.clone(),
                    _ => "no posting account configured".to_string(),
                };
                log_event(
                    deps,
                    rule.id,
                    AutomationEventType::LikeFailed,
                    commenter,
                    None,
                    Some(&error),
                )
                .await;
                outcome.errors.push(error);
            }
        }
    }

    // Action b: enroll the commenter as a lead.
    if let (Some(campaign_id), Some(profile_url)) =
        (rule.campaign_id.as_deref(), commenter.profile_url.as_deref())
    {
        let lead = LeadInput {
            profile_url: profile_url.to_string(),
            first_name: commenter.first_name.clone(),
            last_name: commenter.last_name.clone(),
            custom_variables: rule.custom_variables.clone(),
        };

        let enrolled = match deps.campaigns.enroll_leads(campaign_id, &[lead]).await {
            Ok(result) if result.success => Ok(()),
            Ok(result) => Err(result
                .error
                .unwrap_or_else(|| "enrollment rejected".to_string())),
            Err(e) => Err(e.to_string()),
        };

        match enrolled {
            Ok(()) => {
                if let Err(e) =
                    AutomationRule::increment_leads_captured(rule.id, &deps.db_pool).await
                {
                    tracing::error!(automation_id = %rule.id, error = %e, "Failed to increment leads_captured");
                }

                log_event(
                    deps,
                    rule.id,
                    AutomationEventType::LeadEnrolled,
                    commenter,
                    Some(&format!("enrolled in campaign {}", campaign_id)),
                    None,
                )
                .await;
                outcome.actions_taken.push("lead_enrolled".to_string());

                dispatcher::notify(
                    deps,
                    rule.account_id,
                    "lead_captured",
                    serde_json::json!({
                        "automation_id": rule.id,
                        "campaign_id": campaign_id,
                        "post_id": comment.post_id,
                        "comment_id": comment.comment_id,
                        "commenter": {
                            "id": commenter.id,
                            "name": commenter.full_name(),
                            "profile_url": profile_url,
                        },
                    }),
                );
            }
            Err(error) => {
                log_event(
                    deps,
                    rule.id,
                    AutomationEventType::LeadFailed,
                    commenter,
                    None,
                    Some(&error),
                )
                .await;
                outcome.errors.push(error);
            }
        }
    }

    // Action c: reply with the rendered template.
    if let Some(template) = rule.reply_template.as_deref() {
        let reply = render_template(template, commenter, &comment.text);

        match &posting_account {
            Ok(Some(account)) => {
                match deps.social.add_comment(&comment.post_id, account, &reply).await {
                    Ok(()) => {
                        log_event(
                            deps,
                            rule.id,
                            AutomationEventType::ReplySent,
                            commenter,
                            Some(&reply),
                            None,
                        )
                        .await;
                        outcome.actions_taken.push("reply".to_string());
                    }
                    Err(e) => {
                        let error = e.to_string();
                        log_event(
                            deps,
                            rule.id,
                            AutomationEventType::ReplyFailed,
                            commenter,
                            None,
                            Some(&error),
                        )
                        .await;
                        outcome.errors.push(error);
                    }
                }
            }
            Ok(None) | Err(_) => {
                let error = match &posting_account {
                    Err(e) => e.clone(),
                    _ => "no posting account configured".to_string(),
                };
                log_event(
                    deps,
                    rule.id,
                    AutomationEventType::ReplyFailed,
                    commenter,
                    None,
                    Some(&error),
                )
                .await;
                outcome.errors.push(error);
            }
        }
    }

    outcome
}

/// Resolve the social account the engine posts as, from the owner's stored
/// integration. Lookup failures become per-action error strings.
async fn resolve_posting_account(
    deps: &ServerDeps,
    account_id: Uuid,
) -> Result<Option<String>, String> {
    SocialIntegration::find_active(account_id, &deps.db_pool)
        .await
        .map(|integration| integration.map(|i| i.posting_account))
        .map_err(|e| format!("resolving posting account: {}", e))
}

/// Render a reply template with `{{token}}` substitution.
///
/// Supported tokens: `{{name}}` (first name), `{{full_name}}`, `{{comment}}`.
pub fn render_template(template: &str, commenter: &Commenter, comment_text: &str) -> String {
    template
        .replace("{{name}}", commenter.first_name.as_deref().unwrap_or(""))
        .replace("{{full_name}}", &commenter.full_name())
        .replace("{{comment}}", comment_text)
}

/// Append an event row; log failures are reported but never interrupt the
/// engine run.
async fn log_event(
    deps: &ServerDeps,
    automation_id: Uuid,
    event_type: AutomationEventType,
    commenter: &Commenter,
    action_details: Option<&str>,
    error: Option<&str>,
) {
    let name = commenter.full_name();
    let name = (!name.is_empty()).then_some(name);

    if let Err(e) = AutomationEvent::log(
        automation_id,
        event_type,
        Some(&commenter.id),
        name.as_deref(),
        action_details,
        error,
        &deps.db_pool,
    )
    .await
    {
        tracing::error!(
            automation_id = %automation_id,
            event_type = ?event_type,
            error = %e,
            "Failed to append automation event"
        );
    }
}
