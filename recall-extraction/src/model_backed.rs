//! Model-backed primary extractor.
//!
//! Builds a structured-output prompt per category, calls the model client
//! under a deadline and parses a JSON array out of the reply (markdown
//! fences tolerated). Any failure here is recoverable: the pipeline falls
//! back to the rule-based extractor.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use recall_core::{MemoryItem, MemoryKind, MemorySource, Message, MessageRole, ModelClient};

use crate::extractor::MemoryExtractor;

/// Default deadline for one extraction model call.
const DEFAULT_DEADLINE: Duration = Duration::from_secs(10);

/// One item as the model is asked to emit it.
#[derive(Debug, Deserialize)]
struct RawItem {
    key: String,
    value: String,
    #[serde(default = "default_confidence")]
    confidence: f32,
    #[serde(default = "default_importance")]
    importance: f32,
    #[serde(default)]
    tags: Vec<String>,
}

fn default_confidence() -> f32 {
    0.7
}

fn default_importance() -> f32 {
    0.5
}

/// Primary extractor backed by the generative model.
pub struct ModelExtractor {
    client: Arc<dyn ModelClient>,
    deadline: Duration,
}

impl ModelExtractor {
    pub fn new(client: Arc<dyn ModelClient>) -> Self {
        Self {
            client,
            deadline: DEFAULT_DEADLINE,
        }
    }

    /// Overrides the model-call deadline.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// Runs one prompt through the model and parses the JSON array reply.
    /// The deadline is enforced on this side too, in case the client
    /// implementation does not honor its parameter.
    async fn complete_items(&self, prompt: String) -> Result<Vec<RawItem>, anyhow::Error> {
        let reply = tokio::time::timeout(self.deadline, self.client.complete(&prompt, self.deadline))
            .await
            .map_err(|_| anyhow!("model call exceeded deadline"))??;
        let json = extract_json(&reply)
            .ok_or_else(|| anyhow!("no JSON array in model reply"))?;
        let items: Vec<RawItem> =
            serde_json::from_str(json).context("model reply was not a valid item array")?;
        Ok(items)
    }

    fn to_memory_items(
        &self,
        raw: Vec<RawItem>,
        kind: MemoryKind,
        subject_id: &str,
        character_id: Option<&str>,
    ) -> Vec<MemoryItem> {
        raw.into_iter()
            .map(|r| {
                let mut item = MemoryItem::new(kind, subject_id, r.key, r.value, MemorySource::Model)
                    .with_confidence(r.confidence)
                    .with_importance(r.importance)
                    .with_tags(r.tags);
                if let Some(character_id) = character_id {
                    item = item.with_character(character_id);
                }
                item
            })
            .collect()
    }

    async fn extract(
        &self,
        prompt: String,
        kind: MemoryKind,
        subject_id: &str,
        character_id: Option<&str>,
    ) -> Result<Vec<MemoryItem>, anyhow::Error> {
        let raw = self.complete_items(prompt).await?;
        let items = self.to_memory_items(raw, kind, subject_id, character_id);
        debug!(subject_id, ?kind, count = items.len(), "Model extraction parsed items");
        Ok(items)
    }
}

/// Locates the JSON array in a model reply: a fenced ```json block if
/// present, otherwise the outermost `[...]` span.
fn extract_json(reply: &str) -> Option<&str> {
    let body = if let Some(start) = reply.find("```json") {
        let after = &reply[start + 7..];
        match after.find("```") {
            Some(end) => &after[..end],
            None => after,
        }
    } else if let Some(start) = reply.find("```") {
        let after = &reply[start + 3..];
        match after.find("```") {
            Some(end) => &after[..end],
            None => after,
        }
    } else {
        reply
    };
    let open = body.find('[')?;
    let close = body.rfind(']')?;
    if close < open {
        return None;
    }
    Some(&body[open..=close])
}

/// Conversation transcript with role prefixes. `user_only` drops
/// assistant/system lines for categories that only concern what the
/// subject said.
fn transcript(messages: &[Message], user_only: bool) -> String {
    let mut out = String::new();
    for message in messages {
        let role = match message.role {
            MessageRole::User => "User",
            MessageRole::Assistant => "Assistant",
            MessageRole::System => "System",
        };
        if user_only && message.role != MessageRole::User {
            continue;
        }
        out.push_str(role);
        out.push_str(": ");
        out.push_str(&message.content);
        out.push('\n');
    }
    out
}

const ITEM_FORMAT: &str = r#"Reply with a JSON array only:
[
  {
    "key": "short stable identifier, lowercase",
    "value": "the remembered content",
    "confidence": 0.0-1.0,
    "importance": 0.0-1.0,
    "tags": ["tag"]
  }
]
Reply with [] when there is nothing to extract."#;

#[async_trait]
impl MemoryExtractor for ModelExtractor {
    async fn extract_facts(
        &self,
        subject_id: &str,
        messages: &[Message],
    ) -> Result<Vec<MemoryItem>, anyhow::Error> {
        if messages.is_empty() {
            return Ok(Vec::new());
        }
        let prompt = format!(
            "Extract stable facts about the user from this conversation: \
             identity (name, age, birthday), location, occupation, habits, relationships.\n\n\
             Conversation:\n{}\n{}",
            transcript(messages, true),
            ITEM_FORMAT
        );
        self.extract(prompt, MemoryKind::Fact, subject_id, None).await
    }

    async fn extract_preferences(
        &self,
        subject_id: &str,
        messages: &[Message],
    ) -> Result<Vec<MemoryItem>, anyhow::Error> {
        if messages.is_empty() {
            return Ok(Vec::new());
        }
        let prompt = format!(
            "Extract the user's preferences from this conversation: likes, dislikes, \
             style and format preferences. Use keys like \"like:coffee\" or \"dislike:noise\".\n\n\
             Conversation:\n{}\n{}",
            transcript(messages, true),
            ITEM_FORMAT
        );
        self.extract(prompt, MemoryKind::Preference, subject_id, None).await
    }

    async fn extract_episodic(
        &self,
        subject_id: &str,
        messages: &[Message],
    ) -> Result<Vec<MemoryItem>, anyhow::Error> {
        if messages.is_empty() {
            return Ok(Vec::new());
        }
        let prompt = format!(
            "Extract memorable moments and events from this conversation: things the \
             user would want remembered later (dates, milestones, emotional moments). \
             Use keys like \"moment:first-concert\".\n\n\
             Conversation:\n{}\n{}",
            transcript(messages, false),
            ITEM_FORMAT
        );
        self.extract(prompt, MemoryKind::Episodic, subject_id, None).await
    }

    async fn extract_character_memories(
        &self,
        subject_id: &str,
        character_id: &str,
        messages: &[Message],
    ) -> Result<Vec<MemoryItem>, anyhow::Error> {
        if messages.is_empty() {
            return Ok(Vec::new());
        }
        let prompt = format!(
            "Extract what the character \"{character_id}\" should remember about the user \
             from this conversation: preferences shown toward the character and moments \
             in their shared history.\n\n\
             Conversation:\n{}\n{}",
            transcript(messages, false),
            ITEM_FORMAT
        );
        self.extract(prompt, MemoryKind::Episodic, subject_id, Some(character_id))
            .await
    }

    async fn extract_scene_memories(
        &self,
        character_id: &str,
        scene_id: &str,
        messages: &[Message],
    ) -> Result<Vec<MemoryItem>, anyhow::Error> {
        if messages.is_empty() {
            return Ok(Vec::new());
        }
        let prompt = format!(
            "Extract what the character should remember about the scene \"{scene_id}\" \
             from this conversation: the setting, who was present, what changed.\n\n\
             Conversation:\n{}\n{}",
            transcript(messages, false),
            ITEM_FORMAT
        );
        self.extract(prompt, MemoryKind::Episodic, character_id, None).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_json_plain_array() {
        let reply = r#"[{"key": "name", "value": "Ada"}]"#;
        assert_eq!(extract_json(reply), Some(reply));
    }

    #[test]
    fn test_extract_json_fenced() {
        let reply = "Here you go:\n```json\n[{\"key\": \"k\", \"value\": \"v\"}]\n```\nDone.";
        assert_eq!(extract_json(reply), Some("[{\"key\": \"k\", \"value\": \"v\"}]"));
    }

    #[test]
    fn test_extract_json_prose_around_array() {
        let reply = "Sure! [1, 2] is the answer";
        assert_eq!(extract_json(reply), Some("[1, 2]"));
    }

    #[test]
    fn test_extract_json_missing_array() {
        assert_eq!(extract_json("no structured output here"), None);
    }

    #[test]
    fn test_raw_item_defaults() {
        let items: Vec<RawItem> =
            serde_json::from_str(r#"[{"key": "name", "value": "Ada"}]"#).unwrap();
        assert_eq!(items[0].confidence, 0.7);
        assert_eq!(items[0].importance, 0.5);
        assert!(items[0].tags.is_empty());
    }
}
