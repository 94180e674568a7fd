// End-to-end processor behavior over an in-memory store.

use std::sync::Arc;

use chrono::Utc;
use social_pulse_monitor::config::Config;
use social_pulse_monitor::db;
use social_pulse_monitor::processor::{self, ProcessingOutcome};
use social_pulse_monitor::sentiment::{
    DynClassifier, FailingClassifier, FixedClassifier, SentimentAnalyzer, SentimentLabel,
};
use social_pulse_monitor::state::AppContext;

async fn test_ctx(classifier: DynClassifier) -> AppContext {
    let pool = db::connect_in_memory().await.expect("in-memory db");
    AppContext::new(pool, SentimentAnalyzer::new(classifier), Config::from_env())
}

fn positive_ctx() -> impl std::future::Future<Output = AppContext> {
    test_ctx(Arc::new(FixedClassifier {
        label: "POSITIVE",
        score: 0.92,
    }))
}

#[tokio::test]
async fn no_keywords_configured_ignores_post() {
    let ctx = positive_ctx().await;
    let id = db::create_post(&ctx.db, "I love the Tesla autopilot", Utc::now(), "Twitter")
        .await
        .unwrap();

    let outcome = processor::process_post(&ctx, id).await;
    match outcome {
        ProcessingOutcome::Ignored { post_id, reason } => {
            assert_eq!(post_id, id);
            assert_eq!(reason, "no keywords configured");
        }
        other => panic!("expected Ignored, got {other:?}"),
    }

    let post = db::get_post(&ctx.db, id).await.unwrap().unwrap();
    assert_eq!(post.processing_status, "ignored");
    assert!(post.sentiment_label.is_none());
    assert!(post.sentiment_score.is_none());
    assert!(post.keyword_matched.is_none());
}

#[tokio::test]
async fn matching_post_is_processed_with_sentiment() {
    let ctx = positive_ctx().await;
    db::add_keyword(&ctx.db, "tesla").await.unwrap();
    let id = db::create_post(&ctx.db, "I love the Tesla autopilot", Utc::now(), "Twitter")
        .await
        .unwrap();

    let outcome = processor::process_post(&ctx, id).await;
    let ProcessingOutcome::Processed(result) = outcome else {
        panic!("expected Processed");
    };
    assert_eq!(result.keyword_matched, "tesla");
    assert_eq!(result.sentiment, SentimentLabel::Positive);
    assert_eq!(result.confidence, 0.92);

    let post = db::get_post(&ctx.db, id).await.unwrap().unwrap();
    assert_eq!(post.processing_status, "processed");
    assert_eq!(post.keyword_matched.as_deref(), Some("tesla"));
    assert_eq!(post.sentiment_label.as_deref(), Some("POSITIVE"));
    assert_eq!(post.sentiment_score, Some(0.92));
}

#[tokio::test]
async fn non_matching_post_is_ignored_with_null_fields() {
    let ctx = positive_ctx().await;
    db::add_keyword(&ctx.db, "tesla").await.unwrap();
    let id = db::create_post(&ctx.db, "meh, it's fine", Utc::now(), "Twitter")
        .await
        .unwrap();

    let outcome = processor::process_post(&ctx, id).await;
    match outcome {
        ProcessingOutcome::Ignored { reason, .. } => assert_eq!(reason, "no keyword match"),
        other => panic!("expected Ignored, got {other:?}"),
    }

    let post = db::get_post(&ctx.db, id).await.unwrap().unwrap();
    assert_eq!(post.processing_status, "ignored");
    assert!(post.sentiment_label.is_none());
    assert!(post.sentiment_score.is_none());
}

#[tokio::test]
async fn unknown_post_id_reports_error() {
    let ctx = positive_ctx().await;
    db::add_keyword(&ctx.db, "tesla").await.unwrap();

    let outcome = processor::process_post(&ctx, 9999).await;
    match outcome {
        ProcessingOutcome::Failed { post_id, message } => {
            assert_eq!(post_id, 9999);
            assert_eq!(message, "post not found");
        }
        other => panic!("expected Failed, got {other:?}"),
    }
}

#[tokio::test]
async fn most_recently_added_keyword_wins_ties() {
    let ctx = positive_ctx().await;
    db::add_keyword(&ctx.db, "tesla").await.unwrap();
    db::add_keyword(&ctx.db, "apple").await.unwrap();
    let id = db::create_post(
        &ctx.db,
        "Apple CarPlay in a Tesla would be something",
        Utc::now(),
        "Reddit",
    )
    .await
    .unwrap();

    let ProcessingOutcome::Processed(result) = processor::process_post(&ctx, id).await else {
        panic!("expected Processed");
    };
    // registry iterates most-recent-first, so "apple" is checked before "tesla"
    assert_eq!(result.keyword_matched, "apple");
}

#[tokio::test]
async fn classifier_failure_stores_neutral_fallback() {
    let ctx = test_ctx(Arc::new(FailingClassifier)).await;
    db::add_keyword(&ctx.db, "tesla").await.unwrap();
    let id = db::create_post(&ctx.db, "tesla again", Utc::now(), "Twitter")
        .await
        .unwrap();

    let ProcessingOutcome::Processed(result) = processor::process_post(&ctx, id).await else {
        panic!("expected Processed");
    };
    assert_eq!(result.sentiment, SentimentLabel::Neutral);
    assert_eq!(result.confidence, 0.5);

    let post = db::get_post(&ctx.db, id).await.unwrap().unwrap();
    assert_eq!(post.sentiment_label.as_deref(), Some("NEUTRAL"));
    assert_eq!(post.sentiment_score, Some(0.5));
}

#[tokio::test]
async fn post_transitions_exactly_once() {
    let ctx = positive_ctx().await;
    db::add_keyword(&ctx.db, "tesla").await.unwrap();
    let id = db::create_post(&ctx.db, "tesla forever", Utc::now(), "Twitter")
        .await
        .unwrap();

    processor::process_post(&ctx, id).await;

    // second transition attempts are no-ops on an already-processed row
    db::mark_ignored(&ctx.db, id).await.unwrap();
    db::mark_processed(&ctx.db, id, SentimentLabel::Negative, 0.99, "other")
        .await
        .unwrap();

    let post = db::get_post(&ctx.db, id).await.unwrap().unwrap();
    assert_eq!(post.processing_status, "processed");
    assert_eq!(post.sentiment_label.as_deref(), Some("POSITIVE"));
    assert_eq!(post.sentiment_score, Some(0.92));
    assert_eq!(post.keyword_matched.as_deref(), Some("tesla"));
}

#[tokio::test]
async fn duplicate_keyword_is_rejected_case_insensitively() {
    let ctx = positive_ctx().await;
    db::add_keyword(&ctx.db, "Tesla").await.unwrap();

    let err = db::add_keyword(&ctx.db, "TESLA").await.unwrap_err();
    assert!(matches!(
        err,
        social_pulse_monitor::Error::DuplicateKeyword(_)
    ));

    // removal is idempotent, unknown ids included
    db::delete_keyword(&ctx.db, 42).await.unwrap();
}

#[tokio::test]
async fn pending_posts_drain_in_creation_order() {
    let ctx = positive_ctx().await;
    let first = db::create_post(&ctx.db, "one", Utc::now(), "Twitter")
        .await
        .unwrap();
    let second = db::create_post(&ctx.db, "two", Utc::now(), "Twitter")
        .await
        .unwrap();

    let pending = db::list_pending(&ctx.db).await.unwrap();
    let ids: Vec<i64> = pending.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![first, second]);
}
