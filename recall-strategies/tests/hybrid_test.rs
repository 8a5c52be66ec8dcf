//! Unit tests for HybridStrategy.

mod common;

use std::sync::Arc;

use common::{system, user, FailingModelClient, MockModelClient};
use recall_core::MessageRole;
use recall_strategies::{HybridStrategy, KeywordOverlapScorer, OptimizationStrategy};

fn strategy(model_reply: &str) -> HybridStrategy {
    HybridStrategy::new(
        Arc::new(MockModelClient::new(model_reply)),
        Arc::new(KeywordOverlapScorer::new()),
    )
}

#[tokio::test]
async fn test_combines_summary_semantic_and_recent() {
    let mut messages = vec![
        user("filler zero", 10),
        user("filler one", 10),
        user("the weather in paris is sunny", 10),
        user("filler three", 10),
        user("filler four", 10),
        user("filler five", 10),
        user("filler six", 10),
        user("filler seven", 10),
        user("filler eight", 10),
    ];
    messages.extend([
        user("filler nine", 10),
        user("filler ten", 10),
        user("filler eleven", 10),
    ]);

    // 120 tokens into budget 60: recent bucket 30 (three newest),
    // semantic bucket 12 (one pick), the rest summarized
    let ctx = strategy("Recap of earlier chat.\n- they talked weather")
        .optimize(&messages, 60, Some("paris weather"))
        .await
        .unwrap();

    let contents: Vec<&str> = ctx.messages.iter().map(|m| m.content.as_str()).collect();

    // semantic pick
    assert!(contents.contains(&"the weather in paris is sunny"));
    // recent verbatim tail
    assert!(contents.contains(&"filler nine"));
    assert!(contents.contains(&"filler ten"));
    assert!(contents.contains(&"filler eleven"));
    // one summary over the low-relevance remainder
    assert_eq!(ctx.summaries.len(), 1);
    assert!(contents.iter().any(|c| c.starts_with("[Conversation summary]")));

    assert!(ctx.optimized_token_count <= ctx.original_token_count);
    assert!(ctx.compression_ratio() >= 1.0);
}

#[tokio::test]
async fn test_system_floor_is_kept() {
    let messages = vec![
        system("you are a companion", 10),
        user("alpha", 10),
        user("beta", 10),
        user("gamma", 10),
    ];

    let ctx = strategy("short recap")
        .optimize(&messages, 25, None)
        .await
        .unwrap();
    assert_eq!(ctx.messages[0].role, MessageRole::System);
    assert_eq!(ctx.messages[0].content, "you are a companion");
}

#[tokio::test]
async fn test_model_failure_still_assembles_context() {
    let strategy = HybridStrategy::new(
        Arc::new(FailingModelClient),
        Arc::new(KeywordOverlapScorer::new()),
    );
    let messages: Vec<_> = (0..10).map(|i| user(&format!("msg {i}"), 10)).collect();

    let ctx = strategy.optimize(&messages, 50, None).await.unwrap();
    assert!(!ctx.messages.is_empty());
    // recent bucket survives no matter what the model does
    let contents: Vec<&str> = ctx.messages.iter().map(|m| m.content.as_str()).collect();
    assert!(contents.contains(&"msg 9"));
}

#[tokio::test]
async fn test_empty_history_yields_empty_context() {
    let ctx = strategy("anything").optimize(&[], 100, None).await.unwrap();
    assert!(ctx.is_empty());
}
