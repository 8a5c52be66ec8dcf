//! Rule-based fallback extractor.
//!
//! Pure regex/keyword extraction over user messages. Limited compared to
//! the model-backed extractor (simple patterns, English phrasings, no
//! paraphrase handling) but deterministic and always available, which is
//! exactly what the terminal fallback needs.

use async_trait::async_trait;
use regex::Regex;
use tracing::debug;

use recall_core::{MemoryItem, MemoryKind, MemorySource, Message, MessageRole};

use crate::extractor::MemoryExtractor;

/// Builds a regex from a pattern known at compile time.
fn re(pattern: &str) -> Regex {
    Regex::new(pattern).expect("static pattern compiles")
}

/// Lowercased, dash-joined key slug of a captured phrase, capped at 40
/// characters so keys stay stable and index-friendly.
fn slug(text: &str) -> String {
    let mut out = String::new();
    for word in text
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
    {
        if !out.is_empty() {
            out.push('-');
        }
        if out.len() + word.len() > 40 {
            break;
        }
        out.push_str(word);
    }
    out
}

/// Trims a captured phrase down to its useful head: cuts at the first
/// conjunction and drops trailing punctuation.
fn clean_capture(text: &str) -> String {
    let text = text.trim();
    let mut cut = text.len();
    for stop in [" and ", " but ", " because ", " so "] {
        if let Some(idx) = text.find(stop) {
            cut = cut.min(idx);
        }
    }
    text[..cut].trim_end_matches(['.', ',', '!', '?', ' ']).to_string()
}

/// Joined content of the subject's own (User) messages.
fn user_text(messages: &[Message]) -> String {
    messages
        .iter()
        .filter(|m| m.role == MessageRole::User)
        .map(|m| m.content.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Keywords marking a message as an episodic moment.
const MOMENT_KEYWORDS: [&str; 5] = ["birthday", "anniversary", "remember", "important", "never forget"];

/// Deterministic regex/keyword extractor used as the terminal fallback.
pub struct RuleBasedExtractor {
    name_re: Regex,
    age_re: Regex,
    location_re: Regex,
    occupation_re: Regex,
    habit_re: Regex,
    like_re: Regex,
    dislike_re: Regex,
}

impl RuleBasedExtractor {
    pub fn new() -> Self {
        Self {
            name_re: re(r"(?i)\b(?:my name is|call me|i am called)\s+([A-Za-z][A-Za-z'\-]{1,29})"),
            age_re: re(r"(?i)\bi(?:'m| am)\s+(\d{1,3})\s+years?\s+old"),
            location_re: re(r"(?i)\bi (?:live|stay) in\s+([A-Za-z][A-Za-z .'\-]{1,39})"),
            occupation_re: re(r"(?i)\b(?:i work as|my job is|i am employed as)\s+(?:an?\s+)?([A-Za-z][A-Za-z .'\-]{1,39})"),
            habit_re: re(r"(?i)\bi (?:usually|always|often)\s+([^.!?\n]{2,60})"),
            like_re: re(r"(?i)\bi (?:really\s+)?(?:like|love|prefer|enjoy)\s+([^.!?\n]{2,60})"),
            dislike_re: re(r"(?i)\bi (?:don't like|dislike|hate|can't stand)\s+([^.!?\n]{2,60})"),
        }
    }

    fn fact(subject_id: &str, key: &str, value: &str, confidence: f32, importance: f32, tag: &str) -> MemoryItem {
        MemoryItem::new(MemoryKind::Fact, subject_id, key, value, MemorySource::Rule)
            .with_confidence(confidence)
            .with_importance(importance)
            .with_tags(vec![tag.to_string()])
    }
}

impl Default for RuleBasedExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MemoryExtractor for RuleBasedExtractor {
    async fn extract_facts(
        &self,
        subject_id: &str,
        messages: &[Message],
    ) -> Result<Vec<MemoryItem>, anyhow::Error> {
        let text = user_text(messages);
        if text.is_empty() {
            return Ok(Vec::new());
        }

        let mut facts = Vec::new();

        if let Some(caps) = self.name_re.captures(&text) {
            let name = caps[1].trim();
            facts.push(Self::fact(subject_id, "name", name, 0.8, 0.9, "identity"));
        }
        if let Some(caps) = self.age_re.captures(&text) {
            if let Ok(age) = caps[1].parse::<u32>() {
                if age > 0 && age < 150 {
                    facts.push(Self::fact(subject_id, "age", &age.to_string(), 0.75, 0.7, "identity"));
                }
            }
        }
        if let Some(caps) = self.location_re.captures(&text) {
            let location = clean_capture(&caps[1]);
            facts.push(Self::fact(subject_id, "location", &location, 0.7, 0.6, "location"));
        }
        if let Some(caps) = self.occupation_re.captures(&text) {
            let occupation = clean_capture(&caps[1]);
            facts.push(Self::fact(subject_id, "occupation", &occupation, 0.75, 0.7, "work"));
        }
        for caps in self.habit_re.captures_iter(&text) {
            let habit = clean_capture(&caps[1]);
            facts.push(Self::fact(
                subject_id,
                &format!("habit:{}", slug(&habit)),
                &habit,
                0.7,
                0.6,
                "habit",
            ));
        }

        debug!(subject_id, count = facts.len(), "Rule-based fact extraction");
        Ok(facts)
    }

    async fn extract_preferences(
        &self,
        subject_id: &str,
        messages: &[Message],
    ) -> Result<Vec<MemoryItem>, anyhow::Error> {
        let text = user_text(messages);
        if text.is_empty() {
            return Ok(Vec::new());
        }

        let mut preferences = Vec::new();
        for caps in self.like_re.captures_iter(&text) {
            let liked = clean_capture(&caps[1]);
            preferences.push(
                MemoryItem::new(
                    MemoryKind::Preference,
                    subject_id,
                    format!("like:{}", slug(&liked)),
                    liked.clone(),
                    MemorySource::Rule,
                )
                .with_confidence(0.7)
                .with_tags(vec!["like".to_string()]),
            );
        }
        for caps in self.dislike_re.captures_iter(&text) {
            let disliked = clean_capture(&caps[1]);
            preferences.push(
                MemoryItem::new(
                    MemoryKind::Preference,
                    subject_id,
                    format!("dislike:{}", slug(&disliked)),
                    disliked.clone(),
                    MemorySource::Rule,
                )
                .with_confidence(0.7)
                .with_tags(vec!["dislike".to_string()]),
            );
        }

        debug!(subject_id, count = preferences.len(), "Rule-based preference extraction");
        Ok(preferences)
    }

    async fn extract_episodic(
        &self,
        subject_id: &str,
        messages: &[Message],
    ) -> Result<Vec<MemoryItem>, anyhow::Error> {
        let mut memories = Vec::new();
        for message in messages.iter().filter(|m| m.role == MessageRole::User) {
            let lowered = message.content.to_lowercase();
            if MOMENT_KEYWORDS.iter().any(|k| lowered.contains(k)) {
                let excerpt: String = message.content.chars().take(200).collect();
                memories.push(
                    MemoryItem::new(
                        MemoryKind::Episodic,
                        subject_id,
                        format!("moment:{}", slug(&excerpt)),
                        excerpt,
                        MemorySource::Rule,
                    )
                    .with_confidence(0.6)
                    .with_importance(0.8)
                    .with_tags(vec!["moment".to_string()]),
                );
            }
        }

        debug!(subject_id, count = memories.len(), "Rule-based episodic extraction");
        Ok(memories)
    }

    async fn extract_character_memories(
        &self,
        subject_id: &str,
        character_id: &str,
        messages: &[Message],
    ) -> Result<Vec<MemoryItem>, anyhow::Error> {
        let mut memories = Vec::new();
        for message in messages.iter().filter(|m| m.role == MessageRole::User) {
            let lowered = message.content.to_lowercase();
            if lowered.contains("like") || lowered.contains("prefer") || lowered.contains("love") {
                let excerpt: String = message.content.chars().take(200).collect();
                memories.push(
                    MemoryItem::new(
                        MemoryKind::Preference,
                        subject_id,
                        format!("like:{}", slug(&excerpt)),
                        excerpt,
                        MemorySource::Rule,
                    )
                    .with_character(character_id)
                    .with_confidence(0.6)
                    .with_tags(vec!["interaction".to_string()]),
                );
            }
            if lowered.contains("remember") || lowered.contains("important") {
                let excerpt: String = message.content.chars().take(200).collect();
                memories.push(
                    MemoryItem::new(
                        MemoryKind::Episodic,
                        subject_id,
                        format!("moment:{}", slug(&excerpt)),
                        excerpt,
                        MemorySource::Rule,
                    )
                    .with_character(character_id)
                    .with_confidence(0.7)
                    .with_importance(0.8)
                    .with_tags(vec!["moment".to_string()]),
                );
            }
        }

        debug!(
            subject_id,
            character_id,
            count = memories.len(),
            "Rule-based character memory extraction"
        );
        Ok(memories)
    }

    async fn extract_scene_memories(
        &self,
        character_id: &str,
        scene_id: &str,
        messages: &[Message],
    ) -> Result<Vec<MemoryItem>, anyhow::Error> {
        let combined: String = messages
            .iter()
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        let lowered = combined.to_lowercase();

        let mut memories = Vec::new();
        if lowered.contains("scene") || lowered.contains("place") || lowered.contains("location") {
            let excerpt: String = combined.chars().take(200).collect();
            memories.push(
                MemoryItem::new(
                    MemoryKind::Episodic,
                    character_id,
                    format!("scene:{scene_id}"),
                    excerpt,
                    MemorySource::Rule,
                )
                .with_confidence(0.6)
                .with_tags(vec!["scene".to_string(), scene_id.to_string()]),
            );
        }

        debug!(
            character_id,
            scene_id,
            count = memories.len(),
            "Rule-based scene memory extraction"
        );
        Ok(memories)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(content: &str) -> Message {
        Message::new("s1", MessageRole::User, content)
    }

    #[tokio::test]
    async fn test_extracts_identity_facts() {
        let extractor = RuleBasedExtractor::new();
        let messages = vec![
            user("Hi! My name is Ada and I am 36 years old."),
            user("I live in London and I work as an engineer."),
        ];

        let facts = extractor.extract_facts("u1", &messages).await.unwrap();
        let keys: Vec<&str> = facts.iter().map(|f| f.key.as_str()).collect();
        assert!(keys.contains(&"name"));
        assert!(keys.contains(&"age"));
        assert!(keys.contains(&"location"));
        assert!(keys.contains(&"occupation"));

        let name = facts.iter().find(|f| f.key == "name").unwrap();
        assert_eq!(name.value, "Ada");
        assert_eq!(name.source, MemorySource::Rule);
    }

    #[tokio::test]
    async fn test_implausible_age_is_skipped() {
        let extractor = RuleBasedExtractor::new();
        let messages = vec![user("I am 999 years old")];
        let facts = extractor.extract_facts("u1", &messages).await.unwrap();
        assert!(facts.iter().all(|f| f.key != "age"));
    }

    #[tokio::test]
    async fn test_extracts_likes_and_dislikes() {
        let extractor = RuleBasedExtractor::new();
        let messages = vec![user("I really like green tea. I hate loud music!")];

        let prefs = extractor.extract_preferences("u1", &messages).await.unwrap();
        assert_eq!(prefs.len(), 2);
        assert!(prefs.iter().any(|p| p.key.starts_with("like:") && p.value.contains("green tea")));
        assert!(prefs.iter().any(|p| p.key.starts_with("dislike:") && p.value.contains("loud music")));
        assert!(prefs.iter().all(|p| p.kind == MemoryKind::Preference));
    }

    #[tokio::test]
    async fn test_assistant_messages_are_ignored() {
        let extractor = RuleBasedExtractor::new();
        let messages = vec![Message::new(
            "s1",
            MessageRole::Assistant,
            "My name is HelperBot and I like helping",
        )];

        assert!(extractor.extract_facts("u1", &messages).await.unwrap().is_empty());
        assert!(extractor.extract_preferences("u1", &messages).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_extracts_episodic_moments() {
        let extractor = RuleBasedExtractor::new();
        let messages = vec![
            user("my birthday is next Friday, please remember it"),
            user("nothing special here"),
        ];

        let memories = extractor.extract_episodic("u1", &messages).await.unwrap();
        assert_eq!(memories.len(), 1);
        assert_eq!(memories[0].kind, MemoryKind::Episodic);
        assert!(memories[0].key.starts_with("moment:"));
    }

    #[tokio::test]
    async fn test_character_memories_are_scoped() {
        let extractor = RuleBasedExtractor::new();
        let messages = vec![user("I love stargazing with you")];

        let memories = extractor
            .extract_character_memories("u1", "char1", &messages)
            .await
            .unwrap();
        assert!(!memories.is_empty());
        assert!(memories.iter().all(|m| m.character_id.as_deref() == Some("char1")));
    }

    #[tokio::test]
    async fn test_slug_is_bounded_and_clean() {
        assert_eq!(slug("Green Tea!"), "green-tea");
        assert!(slug(&"word ".repeat(30)).len() <= 40);
    }
}
