//! Integration tests for the MemoryEngine surface.

mod common;

use common::{engine, system, user};
use recall::SessionStats;
use recall_core::{
    MemoryFilter, MessageRole, Page, ReadSelector, SessionStatus, SessionType, StrategyKind,
};

#[tokio::test]
async fn test_append_updates_store_and_stats() {
    let engine = engine();

    engine
        .append_message("s1", user("s1", "hello there", 10))
        .await
        .unwrap();
    engine
        .append_messages(
            "s1",
            vec![user("s1", "how are you", 10), user("s1", "today", 5)],
        )
        .await
        .unwrap();

    let stats = engine.stats("s1").await.unwrap();
    assert_eq!(stats.message_count, 3);
    assert_eq!(stats.total_tokens, 25);
    assert_eq!(stats.status, SessionStatus::Active);

    let messages = engine.read_messages("s1", ReadSelector::All).await.unwrap();
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[0].content, "hello there");

    // session opened on first use
    let session = engine.get_session("s1").await.unwrap();
    assert_eq!(session.message_count, 3);
    assert_eq!(session.session_type, SessionType::Chat);
}

#[tokio::test]
async fn test_assemble_absent_session_returns_empty_default() {
    let engine = engine();
    let ctx = engine.assemble("ghost", Some(1000), None).await.unwrap();
    assert!(ctx.is_empty());
    assert_eq!(ctx.original_message_count, 0);

    // absence is not an error for stats either
    let stats = engine.stats("ghost").await.unwrap();
    assert_eq!(stats.message_count, SessionStats::default().message_count);
}

#[tokio::test]
async fn test_assemble_uses_session_type_default_strategy() {
    let engine = engine();
    engine
        .open_session("collab", SessionType::Collaborative)
        .await;
    engine
        .append_message("collab", user("collab", "hello", 10))
        .await
        .unwrap();

    let ctx = engine.assemble("collab", Some(100), None).await.unwrap();
    assert_eq!(ctx.strategy, StrategyKind::RollingWindow);

    // explicit strategy overrides the table
    let ctx = engine
        .assemble("collab", Some(100), Some(StrategyKind::ImportanceBased))
        .await
        .unwrap();
    assert_eq!(ctx.strategy, StrategyKind::ImportanceBased);
}

#[tokio::test]
async fn test_zero_budget_assembly_flags_and_drops() {
    let engine = engine();
    engine
        .append_messages(
            "s1",
            vec![user("s1", "one", 10), user("s1", "two", 10)],
        )
        .await
        .unwrap();

    let ctx = engine
        .assemble("s1", Some(0), Some(StrategyKind::RollingWindow))
        .await
        .unwrap();
    assert!(ctx.messages.is_empty());
    assert_eq!(ctx.dropped_message_count, 2);

    // with a System message present it is included and flagged over budget
    engine
        .append_message("s1", system("s1", "be kind", 10))
        .await
        .unwrap();
    let ctx = engine
        .assemble("s1", Some(0), Some(StrategyKind::RollingWindow))
        .await
        .unwrap();
    assert_eq!(ctx.messages.len(), 1);
    assert_eq!(ctx.messages[0].role, MessageRole::System);
    assert!(ctx.over_budget);
}

#[tokio::test]
async fn test_stats_track_last_compression_ratio() {
    let engine = engine();
    for i in 0..10 {
        engine
            .append_message("s1", user("s1", &format!("message number {i}"), 10))
            .await
            .unwrap();
    }

    // lossy assembly: 100 tokens into a budget of 30
    let ctx = engine
        .assemble("s1", Some(30), Some(StrategyKind::RollingWindow))
        .await
        .unwrap();
    assert!(ctx.compression_ratio() > 1.0);

    let stats = engine.stats("s1").await.unwrap();
    assert!(stats.compression_ratio > 1.0);
}

#[tokio::test]
async fn test_extraction_flows_into_long_term_memory() {
    let engine = engine();
    let messages = vec![
        user("s1", "My name is Ada and I live in London.", 12),
        user("s1", "I really like green tea.", 8),
    ];
    engine.append_messages("s1", messages.clone()).await.unwrap();

    assert!(engine.trigger_extraction("u1", messages).await);
    engine.wait_for_extraction_idle().await;

    let memories = engine
        .query_memories("u1", MemoryFilter::default(), Page::default())
        .await
        .unwrap();
    assert!(memories.iter().any(|m| m.key == "name" && m.value == "Ada"));
    assert!(memories.iter().any(|m| m.key.starts_with("like:")));

    let profile = engine.subject_profile("u1").await.unwrap();
    assert!(profile.statistics.total_facts >= 2);
    assert!(profile.statistics.total_preferences >= 1);

    assert!(engine.forget_subject("u1").await.unwrap() > 0);
    let profile = engine.subject_profile("u1").await.unwrap();
    assert_eq!(profile.statistics.total_facts, 0);
}

#[tokio::test]
async fn test_session_lifecycle() {
    let engine = engine();
    engine
        .append_message("s1", user("s1", "hello", 5))
        .await
        .unwrap();

    let archived = engine.archive_session("s1").await.unwrap();
    assert_eq!(archived.status, SessionStatus::Archived);
    let stats = engine.stats("s1").await.unwrap();
    assert_eq!(stats.status, SessionStatus::Archived);

    engine.clear_session("s1").await.unwrap();
    assert_eq!(engine.stats("s1").await.unwrap().message_count, 0);
    assert_eq!(engine.get_session("s1").await.unwrap().message_count, 0);

    engine.delete_session("s1").await.unwrap();
    assert!(engine.get_session("s1").await.is_none());
    assert!(engine.session_ids().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_relationship_tracking_through_engine() {
    let engine = engine();
    let rel = engine
        .record_interaction(
            "u1",
            "char1",
            recall_core::Interaction::new("long warm chat", 0.8),
        )
        .await
        .unwrap();
    assert_eq!(rel.interactions.len(), 1);

    let fetched = engine.get_relationship("u1", "char1").await.unwrap().unwrap();
    assert_eq!(fetched.interactions.len(), 1);
    assert!(engine.get_relationship("u1", "nobody").await.unwrap().is_none());
}
