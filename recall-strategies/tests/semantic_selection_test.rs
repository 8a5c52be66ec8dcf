//! Unit tests for SemanticSelectionStrategy with the default
//! keyword-overlap scorer.

mod common;

use std::sync::Arc;

use common::{system, user};
use recall_core::MessageRole;
use recall_strategies::{KeywordOverlapScorer, OptimizationStrategy, SemanticSelectionStrategy};

fn strategy() -> SemanticSelectionStrategy {
    SemanticSelectionStrategy::new(Arc::new(KeywordOverlapScorer::new()))
}

#[tokio::test]
async fn test_relevant_messages_win_over_recent_noise() {
    let messages = vec![
        user("the database migration needs a rollback plan", 10),
        user("lunch was great", 10),
        user("we should test the migration on staging", 10),
        user("totally unrelated chatter", 10),
        user("more filler text here", 10),
    ];

    let ctx = strategy()
        .optimize(&messages, 20, Some("database migration rollback"))
        .await
        .unwrap();

    let contents: Vec<&str> = ctx.messages.iter().map(|m| m.content.as_str()).collect();
    assert!(contents.contains(&"the database migration needs a rollback plan"));
    assert!(contents.contains(&"we should test the migration on staging"));
    assert_eq!(ctx.messages.len(), 2);
    // chronological order is restored after ranking
    assert_eq!(contents[0], "the database migration needs a rollback plan");
}

#[tokio::test]
async fn test_falls_back_to_latest_user_message_as_query() {
    let messages = vec![
        user("my cat is named Pixel", 10),
        user("the weather is fine", 10),
        user("tell me about my cat Pixel", 10),
    ];

    // no explicit query: the newest user message drives relevance
    let ctx = strategy().optimize(&messages, 20, None).await.unwrap();
    let contents: Vec<&str> = ctx.messages.iter().map(|m| m.content.as_str()).collect();
    assert!(contents.contains(&"my cat is named Pixel"));
}

#[tokio::test]
async fn test_system_messages_come_first() {
    let messages = vec![
        user("alpha beta", 10),
        system("you are terse", 5),
        user("gamma delta", 10),
    ];

    let ctx = strategy().optimize(&messages, 15, Some("alpha")).await.unwrap();
    assert_eq!(ctx.messages[0].role, MessageRole::System);
    assert!(ctx.messages.len() >= 2);
}

#[tokio::test]
async fn test_empty_history_yields_empty_context() {
    let ctx = strategy().optimize(&[], 100, Some("anything")).await.unwrap();
    assert!(ctx.is_empty());
    assert_eq!(ctx.original_message_count, 0);
}
