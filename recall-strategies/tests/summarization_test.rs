//! Unit tests for SummarizationStrategy.
//!
//! Uses MockModelClient / FailingModelClient from tests/common so no
//! external model API is called.

mod common;

use std::sync::Arc;

use common::{user, FailingModelClient, MockModelClient};
use recall_core::MessageRole;
use recall_strategies::{OptimizationStrategy, SummarizationStrategy};

#[tokio::test]
async fn test_older_slice_is_compressed_into_one_summary() {
    let model = Arc::new(MockModelClient::new(
        "They planned a trip to Lisbon.\n- flight booked for May\n- hotel still open",
    ));
    let strategy = SummarizationStrategy::new(model);

    let messages: Vec<_> = (0..10).map(|i| user(&format!("msg {i}"), 10)).collect();

    // 100 tokens into budget 50; 60% of the budget is reserved for the
    // recent slice, so the three newest stay verbatim
    let ctx = strategy.optimize(&messages, 50, None).await.unwrap();

    assert_eq!(ctx.summaries.len(), 1);
    let summary = &ctx.summaries[0];
    assert_eq!(summary.original_message_count, 7);
    assert_eq!(summary.key_points.len(), 2);
    assert_eq!(summary.key_points[0], "flight booked for May");

    // summary rides along as a System message ahead of the recent slice
    assert_eq!(ctx.messages[0].role, MessageRole::System);
    assert!(ctx.messages[0].content.starts_with("[Conversation summary]"));
    let recent: Vec<&str> = ctx.messages[1..].iter().map(|m| m.content.as_str()).collect();
    assert_eq!(recent, vec!["msg 7", "msg 8", "msg 9"]);

    assert_eq!(ctx.dropped_message_count, 7);
    assert!(ctx.optimized_token_count <= ctx.original_token_count);
    assert!(ctx.compression_ratio() >= 1.0);
}

#[tokio::test]
async fn test_model_failure_degrades_to_unavailable_digest() {
    let strategy = SummarizationStrategy::new(Arc::new(FailingModelClient));
    let messages: Vec<_> = (0..10).map(|i| user(&format!("msg {i}"), 10)).collect();

    let ctx = strategy.optimize(&messages, 50, None).await.unwrap();

    // the assembly still succeeds; the summary text marks the failure
    assert_eq!(ctx.summaries.len(), 1);
    assert!(ctx.summaries[0].text.contains("summary unavailable"));
    assert!(ctx.summaries[0].text.contains("7 earlier messages"));
}

#[tokio::test]
async fn test_history_within_budget_is_not_summarized() {
    let strategy = SummarizationStrategy::new(Arc::new(FailingModelClient));
    let messages: Vec<_> = (0..3).map(|i| user(&format!("msg {i}"), 10)).collect();

    let ctx = strategy.optimize(&messages, 100, None).await.unwrap();
    assert!(ctx.summaries.is_empty());
    assert_eq!(ctx.messages, messages);
}

#[tokio::test]
async fn test_system_messages_stay_ahead_of_the_summary() {
    let model = Arc::new(MockModelClient::new("Recap.\n- a point"));
    let strategy = SummarizationStrategy::new(model);

    let mut messages = vec![common::system("persona rules", 10)];
    messages.extend((0..10).map(|i| user(&format!("msg {i}"), 10)));

    let ctx = strategy.optimize(&messages, 60, None).await.unwrap();
    assert_eq!(ctx.messages[0].role, MessageRole::System);
    assert_eq!(ctx.messages[0].content, "persona rules");
    assert!(ctx.messages[1].content.starts_with("[Conversation summary]"));
}

#[tokio::test]
async fn test_oversized_summary_is_dropped() {
    // model returns a wall of text larger than the slice it would replace
    let model = Arc::new(MockModelClient::new(&"verbose ".repeat(200)));
    let strategy = SummarizationStrategy::new(model);

    let messages: Vec<_> = (0..6).map(|i| user(&format!("msg {i}"), 10)).collect();

    let ctx = strategy.optimize(&messages, 30, None).await.unwrap();
    assert!(ctx.summaries.is_empty());
    // the recent slice is still served
    assert!(!ctx.messages.is_empty());
    assert!(ctx.optimized_token_count <= ctx.original_token_count);
}
