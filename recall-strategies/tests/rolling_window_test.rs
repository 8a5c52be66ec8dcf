//! Unit tests for RollingWindowStrategy.
//!
//! Covers the identity shortcut, newest-first filling, the System floor,
//! the zero-budget edge and single-message truncation.

mod common;

use common::{system, user};
use recall_core::MessageRole;
use recall_strategies::{OptimizationStrategy, RollingWindowStrategy};

#[tokio::test]
async fn test_empty_history_yields_empty_context() {
    let strategy = RollingWindowStrategy::new();
    let ctx = strategy.optimize(&[], 1000, None).await.unwrap();
    assert!(ctx.is_empty());
    assert_eq!(ctx.original_message_count, 0);
    assert_eq!(ctx.optimized_token_count, 0);
    assert_eq!(ctx.dropped_message_count, 0);
}

#[tokio::test]
async fn test_history_within_budget_is_returned_unmodified() {
    let strategy = RollingWindowStrategy::new();
    let messages: Vec<_> = (0..5).map(|i| user(&format!("msg {i}"), 10)).collect();

    let ctx = strategy.optimize(&messages, 1000, None).await.unwrap();
    assert_eq!(ctx.messages, messages);
    assert_eq!(ctx.dropped_message_count, 0);
    assert_eq!(ctx.optimized_token_count, ctx.original_token_count);
    assert!(!ctx.over_budget);
    assert_eq!(ctx.compression_ratio(), 1.0);
}

#[tokio::test]
async fn test_over_budget_keeps_newest_whole_messages() {
    let strategy = RollingWindowStrategy::new();
    let messages: Vec<_> = (0..10).map(|i| user(&format!("msg {i}"), 10)).collect();

    // 100 tokens of history into a budget of 35: three newest fit
    let ctx = strategy.optimize(&messages, 35, None).await.unwrap();
    assert_eq!(ctx.messages.len(), 3);
    assert_eq!(ctx.messages[0].content, "msg 7");
    assert_eq!(ctx.messages[2].content, "msg 9");
    assert_eq!(ctx.dropped_message_count, 7);
    assert_eq!(ctx.optimized_token_count, 30);
    assert!(ctx.optimized_token_count <= ctx.original_token_count);
    assert!(ctx.compression_ratio() >= 1.0);
    assert!(!ctx.over_budget);
}

#[tokio::test]
async fn test_system_messages_are_always_included() {
    let strategy = RollingWindowStrategy::new();
    let mut messages = vec![system("be helpful", 10)];
    messages.extend((0..5).map(|i| user(&format!("msg {i}"), 10)));

    let ctx = strategy.optimize(&messages, 25, None).await.unwrap();
    assert_eq!(ctx.messages[0].role, MessageRole::System);
    // 10 system tokens leave 15: one user message fits
    assert_eq!(ctx.messages.len(), 2);
    assert_eq!(ctx.messages[1].content, "msg 4");
}

#[tokio::test]
async fn test_system_floor_exceeding_budget_is_flagged() {
    let strategy = RollingWindowStrategy::new();
    let messages = vec![system("a long system instruction", 50), user("hi", 5)];

    let ctx = strategy.optimize(&messages, 20, None).await.unwrap();
    assert_eq!(ctx.messages.len(), 1);
    assert_eq!(ctx.messages[0].role, MessageRole::System);
    assert!(ctx.over_budget);
}

#[tokio::test]
async fn test_zero_budget_drops_everything_without_system() {
    let strategy = RollingWindowStrategy::new();
    let messages: Vec<_> = (0..4).map(|i| user(&format!("msg {i}"), 10)).collect();

    let ctx = strategy.optimize(&messages, 0, None).await.unwrap();
    assert!(ctx.messages.is_empty());
    assert_eq!(ctx.dropped_message_count, 4);
    assert_eq!(ctx.original_message_count, 4);
}

#[tokio::test]
async fn test_budget_below_smallest_message_truncates() {
    let strategy = RollingWindowStrategy::new();
    let content = "x".repeat(400); // 100 heuristic tokens
    let messages = vec![user(&content, 100)];

    let ctx = strategy.optimize(&messages, 10, None).await.unwrap();
    assert_eq!(ctx.messages.len(), 1);
    assert!(ctx.truncated);
    assert!(ctx.messages[0].content.len() <= 40);
    assert_eq!(ctx.messages[0].metadata.get("truncated").map(String::as_str), Some("true"));
    assert!(ctx.optimized_token_count <= ctx.original_token_count);
}
