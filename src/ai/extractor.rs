use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Fail-open default for classification: an item the provider cannot judge
/// must not stay unpromoted forever.
const FAIL_OPEN_TECHNICAL: bool = true;

/// Cap on heuristic output.
const MAX_HEURISTIC_KEYWORDS: usize = 5;

/// Description length sent to the provider.
const DESCRIPTION_LIMIT: usize = 1000;

/// Tokens too generic to be worth searching for.
const STOP_WORDS: &[&str] = &["영상", "채널", "today", "news", "shorts", "youtube"];

static WORD_RE: OnceLock<Regex> = OnceLock::new();

fn word_re() -> &'static Regex {
    // Alphanumeric or Hangul runs, plus the symbols that keep "c++", "c#"
    // and "node.js" in one token.
    WORD_RE.get_or_init(|| Regex::new(r"[a-zA-Z0-9가-힣+#\.]{2,}").unwrap())
}

#[derive(Debug, Clone)]
pub struct AiSettings {
    pub enabled: bool,
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
}

/// Which strategy in the extraction chain produced the result. External
/// tags become per-video tag rows; AI and heuristic output only feeds the
/// keyword rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagSource {
    External,
    Ai,
    Heuristic,
}

#[derive(Debug, Clone)]
pub struct Extraction {
    pub tags: Vec<String>,
    pub source: TagSource,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Verdict {
    technical: bool,
}

/// Derives searchable keywords for an item and classifies topical
/// relevance. Stateless; holds only provider settings and an HTTP client.
pub struct Extractor {
    client: reqwest::Client,
    settings: AiSettings,
}

impl Extractor {
    pub fn new(settings: AiSettings) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .expect("Failed to create HTTP client");
        Self { client, settings }
    }

    /// Ordered fallback chain; the first non-empty result wins.
    pub async fn extract(
        &self,
        title: &str,
        description: &str,
        external_tags: &[String],
    ) -> Extraction {
        if let Some(tags) = attempt_external(external_tags) {
            return Extraction {
                tags,
                source: TagSource::External,
            };
        }

        if let Some(tags) = self.attempt_ai(title, description).await {
            return Extraction {
                tags,
                source: TagSource::Ai,
            };
        }

        Extraction {
            tags: attempt_heuristic(title, description),
            source: TagSource::Heuristic,
        }
    }

    /// AI-assisted extraction. Any call or parse failure is swallowed and
    /// treated as an empty result so the chain falls through.
    async fn attempt_ai(&self, title: &str, description: &str) -> Option<Vec<String>> {
        if !self.settings.enabled {
            return None;
        }
        let api_key = self.settings.api_key.as_deref()?;

        let prompt = format!(
            "Extract up to 5 short, searchable IT/tech keywords from this video metadata. \
             Skip generic words; prefer concise nouns. Respond with a JSON array of strings only.\n\n\
             Title: {}\nDescription: {}",
            title,
            truncate_chars(description, DESCRIPTION_LIMIT)
        );

        match self.chat(prompt, 0.2).await {
            Ok(raw) => match serde_json::from_str::<Vec<String>>(raw.trim()) {
                Ok(keywords) if !keywords.is_empty() => Some(keywords),
                Ok(_) => None,
                Err(e) => {
                    tracing::warn!("extraction strategy ai: unparsable response: {}", e);
                    None
                }
            },
            Err(e) => {
                tracing::warn!("extraction strategy ai: {}", e);
                None
            }
        }
    }

    /// Whether the item is IT/dev/coding related. Disabled or failing
    /// classification defaults to technical so nothing gets stuck as NEW.
    pub async fn is_technical(&self, title: &str, description: &str) -> bool {
        if !self.settings.enabled {
            return FAIL_OPEN_TECHNICAL;
        }
        if self.settings.api_key.is_none() {
            return FAIL_OPEN_TECHNICAL;
        }

        let prompt = format!(
            "Does this video cover IT, software development or other technical content? \
             Respond with JSON only: {{\"technical\": true}} or {{\"technical\": false}}.\n\n\
             Title: {}\nDescription: {}",
            title,
            truncate_chars(description, DESCRIPTION_LIMIT)
        );

        match self.chat(prompt, 0.1).await {
            Ok(raw) => match serde_json::from_str::<Verdict>(raw.trim()) {
                Ok(verdict) => verdict.technical,
                Err(e) => {
                    tracing::warn!("classification: unparsable verdict: {}", e);
                    FAIL_OPEN_TECHNICAL
                }
            },
            Err(e) => {
                tracing::warn!("classification: {}", e);
                FAIL_OPEN_TECHNICAL
            }
        }
    }

    async fn chat(&self, prompt: String, temperature: f32) -> Result<String> {
        let request = ChatRequest {
            model: self.settings.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: "Respond with JSON only, no prose.".to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: prompt,
                },
            ],
            temperature,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.settings.base_url))
            .bearer_auth(self.settings.api_key.as_deref().unwrap_or_default())
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            return Err(AppError::AiApi(format!("API error: {}", error_text)));
        }

        let chat_response: ChatResponse = response.json().await?;
        let content = chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();

        Ok(content)
    }
}

fn attempt_external(external_tags: &[String]) -> Option<Vec<String>> {
    if external_tags.is_empty() {
        None
    } else {
        Some(external_tags.to_vec())
    }
}

/// Deterministic last resort: lowercase token runs minus stop words,
/// first-seen order, capped.
fn attempt_heuristic(title: &str, description: &str) -> Vec<String> {
    let text = format!("{} {}", title, description).to_lowercase();
    let mut keywords = Vec::new();
    for m in word_re().find_iter(&text) {
        let word = m.as_str();
        if STOP_WORDS.contains(&word) || keywords.iter().any(|k| k == word) {
            continue;
        }
        keywords.push(word.to_string());
        if keywords.len() == MAX_HEURISTIC_KEYWORDS {
            break;
        }
    }
    keywords
}

fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn disabled() -> Extractor {
        Extractor::new(AiSettings {
            enabled: false,
            base_url: String::new(),
            api_key: None,
            model: String::new(),
        })
    }

    /// Enabled but pointing at a closed loopback port, so every provider
    /// call fails fast.
    fn unreachable() -> Extractor {
        Extractor::new(AiSettings {
            enabled: true,
            base_url: "http://127.0.0.1:9".to_string(),
            api_key: Some("test-key".to_string()),
            model: "test-model".to_string(),
        })
    }

    #[tokio::test]
    async fn external_tags_win_without_ai_call() {
        // Unreachable provider: if the chain tried AI first this would
        // fall through to the heuristic instead of returning the tags.
        let extractor = unreachable();
        let tags = vec!["Rust".to_string(), "Async".to_string()];
        let extraction = extractor.extract("title", "description", &tags).await;
        assert_eq!(extraction.source, TagSource::External);
        assert_eq!(extraction.tags, tags);
    }

    #[tokio::test]
    async fn heuristic_when_ai_disabled() {
        let extractor = disabled();
        let extraction = extractor
            .extract("Rust Async youtube Tutorial", "learn rust async streams today", &[])
            .await;
        assert_eq!(extraction.source, TagSource::Heuristic);
        assert_eq!(extraction.tags, vec!["rust", "async", "tutorial", "learn", "streams"]);
    }

    #[tokio::test]
    async fn ai_failure_falls_back_to_heuristic() {
        let extractor = unreachable();
        let extraction = extractor.extract("Docker basics", "", &[]).await;
        assert_eq!(extraction.source, TagSource::Heuristic);
        assert_eq!(extraction.tags, vec!["docker", "basics"]);
    }

    #[test]
    fn heuristic_keeps_symbol_tokens_and_hangul() {
        let keywords = attempt_heuristic("C++ vs C# vs node.js", "백엔드 개발");
        assert_eq!(keywords, vec!["c++", "vs", "c#", "node.js", "백엔드"]);
    }

    #[test]
    fn heuristic_drops_stop_words_and_short_runs() {
        let keywords = attempt_heuristic("a youtube shorts news", "오늘의 영상 x");
        assert_eq!(keywords, vec!["오늘의"]);
    }

    #[tokio::test]
    async fn classification_disabled_is_technical() {
        assert!(disabled().is_technical("anything", "at all").await);
    }

    #[tokio::test]
    async fn classification_fails_open() {
        assert!(unreachable().is_technical("cooking pasta", "no tech here").await);
    }

    #[test]
    fn verdict_parsing_is_strict() {
        let verdict: Verdict = serde_json::from_str(r#"{"technical": false}"#).unwrap();
        assert!(!verdict.technical);
        assert!(serde_json::from_str::<Verdict>(r#"{"relevant": true}"#).is_err());
        assert!(serde_json::from_str::<Verdict>("sure, it's technical").is_err());
    }

    #[test]
    fn truncation_is_char_boundary_safe() {
        let s = "한글설명".repeat(400);
        let t = truncate_chars(&s, 1000);
        assert_eq!(t.chars().count(), 1000);
    }
}
