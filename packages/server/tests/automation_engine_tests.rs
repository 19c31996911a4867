//! Integration tests for the automation engine.
//!
//! One `process_comment` call per (rule, comment) pair: non-matching
//! comments must be near-free, matching comments run every configured
//! action independently, and each attempt leaves exactly one audit event.

mod common;

use std::sync::Arc;

use test_context::test_context;
use uuid::Uuid;

use crate::common::TestHarness;
use pipeline_core::domains::automation::engine::{
    process_comment, Commenter, IncomingComment, NO_KEYWORD_MATCH,
};
use pipeline_core::domains::automation::models::{
    AutomationEvent, AutomationEventType, AutomationRule, RuleStatus,
};
use pipeline_core::kernel::test_dependencies::{
    MockCampaignClient, MockSocialClient, StaticPublisherResolver,
};
use pipeline_core::kernel::ServerDeps;

fn deps_with(
    ctx: &TestHarness,
    social: Arc<MockSocialClient>,
    campaigns: Arc<MockCampaignClient>,
) -> ServerDeps {
    ctx.deps_with(Arc::new(StaticPublisherResolver::new()), social, campaigns)
}

async fn create_integration(ctx: &TestHarness, account_id: Uuid, posting_account: &str) {
    sqlx::query(
        r#"
        INSERT INTO social_integrations (account_id, provider, access_token, posting_account)
        VALUES ($1, 'mock', 'test-token', $2)
        "#,
    )
    .bind(account_id)
    .bind(posting_account)
    .execute(&ctx.db_pool)
    .await
    .expect("insert integration");
}

async fn create_rule(ctx: &TestHarness, rule: AutomationRule) -> AutomationRule {
    rule.insert(&ctx.db_pool).await.expect("insert rule");
    rule
}

fn full_rule(account_id: Uuid) -> AutomationRule {
    AutomationRule::builder()
        .account_id(account_id)
        .post_id("post-77")
        .keywords(vec!["pricing".to_string()])
        .status(RuleStatus::Running)
        .auto_like(true)
        .reply_template("Thanks {{name}}, sending details!")
        .campaign_id("campaign-9")
        .custom_variables(serde_json::json!({"source": "comment"}))
        .build()
}

fn comment(text: &str) -> IncomingComment {
    IncomingComment {
        post_id: "post-77".to_string(),
        comment_id: "comment-1".to_string(),
        text: text.to_string(),
        commenter: Commenter {
            id: "urn:member:42".to_string(),
            first_name: Some("Ada".to_string()),
            last_name: Some("Lovelace".to_string()),
            profile_url: Some("https://social.example/in/ada".to_string()),
        },
    }
}

async fn event_types(ctx: &TestHarness, automation_id: Uuid) -> Vec<AutomationEventType> {
    AutomationEvent::find_for_automation(automation_id, &ctx.db_pool)
        .await
        .expect("load events")
        .into_iter()
        .map(|e| e.event_type)
        .collect()
}

#[test_context(TestHarness)]
#[tokio::test]
async fn non_matching_comment_is_a_cheap_no_op(ctx: &TestHarness) {
    let account_id = Uuid::new_v4();
    let social = Arc::new(MockSocialClient::new());
    let campaigns = Arc::new(MockCampaignClient::new());
    let deps = deps_with(ctx, social.clone(), campaigns.clone());

    let rule = create_rule(ctx, full_rule(account_id)).await;

    let outcome = process_comment(&deps, &rule, &comment("great post, congrats!")).await;

    assert_eq!(outcome.actions_taken, vec![NO_KEYWORD_MATCH.to_string()]);
    assert!(outcome.errors.is_empty());

    // Exactly one event and zero external calls
    assert_eq!(
        event_types(ctx, rule.id).await,
        vec![AutomationEventType::CommentDetected]
    );
    assert_eq!(social.call_count(), 0);
    assert_eq!(campaigns.call_count(), 0);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn failing_like_does_not_stop_sibling_actions(ctx: &TestHarness) {
    let account_id = Uuid::new_v4();
    let social = Arc::new(MockSocialClient::new().with_reaction_error("rate limited"));
    let campaigns = Arc::new(MockCampaignClient::new());
    let deps = deps_with(ctx, social.clone(), campaigns.clone());

    create_integration(ctx, account_id, "acct-1").await;
    let rule = create_rule(ctx, full_rule(account_id)).await;

    let outcome = process_comment(&deps, &rule, &comment("what's the pricing?")).await;

    // All three actions attempted: two succeeded, one failed
    assert_eq!(
        outcome.actions_taken,
        vec!["lead_enrolled".to_string(), "reply".to_string()]
    );
    assert_eq!(outcome.errors.len(), 1);
    assert!(outcome.errors[0].contains("rate limited"));

    assert_eq!(
        event_types(ctx, rule.id).await,
        vec![
            AutomationEventType::CommentDetected,
            AutomationEventType::KeywordMatched,
            AutomationEventType::LikeFailed,
            AutomationEventType::LeadEnrolled,
            AutomationEventType::ReplySent,
        ]
    );

    // Reaction was attempted despite failing
    assert_eq!(social.reaction_calls().len(), 1);

    // Reply was rendered from the template
    let replies = social.comment_calls();
    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0].text, "Thanks Ada, sending details!");
    assert_eq!(replies[0].account_id, "acct-1");

    // Lead passed through with the rule's static custom variables
    let enrolls = campaigns.enroll_calls();
    assert_eq!(enrolls.len(), 1);
    assert_eq!(enrolls[0].campaign_id, "campaign-9");
    assert_eq!(enrolls[0].leads[0].profile_url, "https://social.example/in/ada");
    assert_eq!(
        enrolls[0].leads[0].custom_variables,
        serde_json::json!({"source": "comment"})
    );

    // Counter incremented once
    let reloaded = AutomationRule::find_by_id(rule.id, &ctx.db_pool).await.unwrap();
    assert_eq!(reloaded.leads_captured, 1);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn enrollment_rejection_is_logged_not_counted(ctx: &TestHarness) {
    let account_id = Uuid::new_v4();
    let social = Arc::new(MockSocialClient::new());
    let campaigns = Arc::new(MockCampaignClient::new().with_rejection("duplicate lead"));
    let deps = deps_with(ctx, social, campaigns.clone());

    create_integration(ctx, account_id, "acct-1").await;
    let rule = create_rule(ctx, full_rule(account_id)).await;

    let outcome = process_comment(&deps, &rule, &comment("pricing please")).await;

    assert!(outcome.errors.iter().any(|e| e.contains("duplicate lead")));
    assert!(event_types(ctx, rule.id)
        .await
        .contains(&AutomationEventType::LeadFailed));

    let reloaded = AutomationRule::find_by_id(rule.id, &ctx.db_pool).await.unwrap();
    assert_eq!(reloaded.leads_captured, 0);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn enrollment_transport_failure_is_logged_not_counted(ctx: &TestHarness) {
    let account_id = Uuid::new_v4();
    let social = Arc::new(MockSocialClient::new());
    let campaigns = Arc::new(MockCampaignClient::new().with_error("connection reset by peer"));
    let deps = deps_with(ctx, social, campaigns.clone());

    create_integration(ctx, account_id, "acct-1").await;
    let rule = create_rule(ctx, full_rule(account_id)).await;

    let outcome = process_comment(&deps, &rule, &comment("pricing please")).await;

    // A failed call counts the same as an API rejection: one LeadFailed
    // event, no counter bump, siblings untouched
    assert_eq!(outcome.actions_taken, vec!["like".to_string(), "reply".to_string()]);
    assert!(outcome
        .errors
        .iter()
        .any(|e| e.contains("connection reset by peer")));
    assert!(event_types(ctx, rule.id)
        .await
        .contains(&AutomationEventType::LeadFailed));

    let reloaded = AutomationRule::find_by_id(rule.id, &ctx.db_pool).await.unwrap();
    assert_eq!(reloaded.leads_captured, 0);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn failing_reply_does_not_stop_sibling_actions(ctx: &TestHarness) {
    let account_id = Uuid::new_v4();
    let social = Arc::new(MockSocialClient::new().with_comment_error("comment moderation hold"));
    let campaigns = Arc::new(MockCampaignClient::new());
    let deps = deps_with(ctx, social.clone(), campaigns);

    create_integration(ctx, account_id, "acct-1").await;
    let rule = create_rule(ctx, full_rule(account_id)).await;

    let outcome = process_comment(&deps, &rule, &comment("what's the pricing?")).await;

    assert_eq!(
        outcome.actions_taken,
        vec!["like".to_string(), "lead_enrolled".to_string()]
    );
    assert_eq!(outcome.errors.len(), 1);
    assert!(outcome.errors[0].contains("comment moderation hold"));

    // The reply was attempted and its failure recorded
    assert_eq!(social.comment_calls().len(), 1);
    assert_eq!(
        event_types(ctx, rule.id).await,
        vec![
            AutomationEventType::CommentDetected,
            AutomationEventType::KeywordMatched,
            AutomationEventType::LikeSent,
            AutomationEventType::LeadEnrolled,
            AutomationEventType::ReplyFailed,
        ]
    );
}

#[test_context(TestHarness)]
#[tokio::test]
async fn lead_enrollment_requires_profile_url(ctx: &TestHarness) {
    let account_id = Uuid::new_v4();
    let social = Arc::new(MockSocialClient::new());
    let campaigns = Arc::new(MockCampaignClient::new());
    let deps = deps_with(ctx, social, campaigns.clone());

    create_integration(ctx, account_id, "acct-1").await;
    let rule = create_rule(ctx, full_rule(account_id)).await;

    let mut anonymous = comment("pricing?");
    anonymous.commenter.profile_url = None;

    let outcome = process_comment(&deps, &rule, &anonymous).await;

    // Like and reply still run; enrollment is skipped without error
    assert_eq!(outcome.actions_taken, vec!["like".to_string(), "reply".to_string()]);
    assert_eq!(campaigns.call_count(), 0);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn missing_posting_account_fails_like_and_reply(ctx: &TestHarness) {
    let account_id = Uuid::new_v4();
    let social = Arc::new(MockSocialClient::new());
    let campaigns = Arc::new(MockCampaignClient::new());
    let deps = deps_with(ctx, social.clone(), campaigns);

    // No social_integrations row for this account
    let rule = create_rule(ctx, full_rule(account_id)).await;

    let outcome = process_comment(&deps, &rule, &comment("pricing?")).await;

    // Enrollment still succeeds; the identity-dependent actions fail
    assert_eq!(outcome.actions_taken, vec!["lead_enrolled".to_string()]);
    assert_eq!(outcome.errors.len(), 2);
    assert!(outcome
        .errors
        .iter()
        .all(|e| e.contains("no posting account configured")));
    assert_eq!(social.call_count(), 0);

    assert_eq!(
        event_types(ctx, rule.id).await,
        vec![
            AutomationEventType::CommentDetected,
            AutomationEventType::KeywordMatched,
            AutomationEventType::LikeFailed,
            AutomationEventType::LeadEnrolled,
            AutomationEventType::ReplyFailed,
        ]
    );
}

#[test_context(TestHarness)]
#[tokio::test]
async fn rules_without_actions_only_log_the_match(ctx: &TestHarness) {
    let account_id = Uuid::new_v4();
    let social = Arc::new(MockSocialClient::new());
    let campaigns = Arc::new(MockCampaignClient::new());
    let deps = deps_with(ctx, social.clone(), campaigns.clone());

    let rule = create_rule(
        ctx,
        AutomationRule::builder()
            .account_id(account_id)
            .post_id("post-77")
            .keywords(vec!["demo".to_string()])
            .status(RuleStatus::Running)
            .build(),
    )
    .await;

    let outcome = process_comment(&deps, &rule, &comment("book me a demo")).await;

    assert!(outcome.actions_taken.is_empty());
    assert!(outcome.errors.is_empty());
    assert_eq!(
        event_types(ctx, rule.id).await,
        vec![
            AutomationEventType::CommentDetected,
            AutomationEventType::KeywordMatched,
        ]
    );
    assert_eq!(social.call_count(), 0);
    assert_eq!(campaigns.call_count(), 0);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn fan_out_finds_only_running_rules_for_post(ctx: &TestHarness) {
    let account_id = Uuid::new_v4();
    let post_id = format!("post-{}", Uuid::new_v4());

    let running = AutomationRule::builder()
        .account_id(account_id)
        .post_id(post_id.clone())
        .keywords(vec!["pricing".to_string()])
        .status(RuleStatus::Running)
        .build();
    running.insert(&ctx.db_pool).await.unwrap();

    let paused = AutomationRule::builder()
        .account_id(account_id)
        .post_id(post_id.clone())
        .keywords(vec!["pricing".to_string()])
        .status(RuleStatus::Paused)
        .build();
    paused.insert(&ctx.db_pool).await.unwrap();

    let rules = AutomationRule::find_running_for_post(&post_id, &ctx.db_pool)
        .await
        .unwrap();

    assert_eq!(rules.len(), 1);
    assert_eq!(rules[0].id, running.id);
}
