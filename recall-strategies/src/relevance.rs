//! Relevance scoring extension point for semantic selection.
//!
//! The scoring algorithm is deliberately pluggable: the default
//! [`KeywordOverlapScorer`] is deterministic and dependency-free, while an
//! embedding-backed scorer (cosine similarity over an embedding service)
//! can implement the same trait without touching the strategies.

use std::collections::HashSet;

use async_trait::async_trait;
use recall_core::Message;

/// Scores how relevant each message is to a query.
#[async_trait]
pub trait RelevanceScorer: Send + Sync {
    /// Returns one score per message, same order as the input. Scores are
    /// only compared against each other; they need not be normalized
    /// across calls.
    async fn score_batch(&self, query: &str, messages: &[Message]) -> Result<Vec<f32>, anyhow::Error>;
}

/// Default scorer: case-folded alphanumeric token overlap between the
/// query and the message, normalized by the query's token count.
#[derive(Debug, Clone, Default)]
pub struct KeywordOverlapScorer;

impl KeywordOverlapScorer {
    pub fn new() -> Self {
        Self
    }

    fn terms(text: &str) -> HashSet<String> {
        text.to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| t.len() >= 2)
            .map(str::to_string)
            .collect()
    }
}

#[async_trait]
impl RelevanceScorer for KeywordOverlapScorer {
    async fn score_batch(&self, query: &str, messages: &[Message]) -> Result<Vec<f32>, anyhow::Error> {
        let query_terms = Self::terms(query);
        if query_terms.is_empty() {
            return Ok(vec![0.0; messages.len()]);
        }
        let scores = messages
            .iter()
            .map(|message| {
                let message_terms = Self::terms(&message.content);
                let overlap = query_terms.intersection(&message_terms).count();
                overlap as f32 / query_terms.len() as f32
            })
            .collect();
        Ok(scores)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recall_core::MessageRole;

    #[tokio::test]
    async fn test_overlap_ranks_related_content_higher() {
        let scorer = KeywordOverlapScorer::new();
        let messages = vec![
            Message::new("s1", MessageRole::User, "the weather in Paris is lovely"),
            Message::new("s1", MessageRole::User, "my cat sleeps all day"),
        ];
        let scores = scorer
            .score_batch("what is the weather in Paris", &messages)
            .await
            .unwrap();
        assert!(scores[0] > scores[1]);
    }

    #[tokio::test]
    async fn test_empty_query_scores_zero() {
        let scorer = KeywordOverlapScorer::new();
        let messages = vec![Message::new("s1", MessageRole::User, "anything")];
        let scores = scorer.score_batch("", &messages).await.unwrap();
        assert_eq!(scores, vec![0.0]);
    }
}
