//! Line classification through an LLM backend.
//!
//! The backend is asked to answer with exactly `category, description`
//! on one line. [`interpret`] is the pure capability that turns the
//! free-text reply into a structured fragment, kept separate from the
//! HTTP plumbing so the backend's wording can evolve without touching
//! pipeline logic.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::domain::{ReviewError, UnparsableReply};

/// Categories the backend is instructed to choose from.
const CATEGORIES: &str = "Improvement, Style, Bug, Best Practice";

/// A structured classification for one line: category plus a short
/// description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueFragment {
    pub category: String,
    pub description: String,
}

impl IssueFragment {
    /// Degraded fragment for a reply that was not in the expected shape.
    pub fn unparsable() -> Self {
        IssueFragment {
            category: "Error".to_string(),
            description: "Invalid response format".to_string(),
        }
    }

    /// Degraded fragment for a backend response missing its reply body.
    pub fn unknown() -> Self {
        IssueFragment {
            category: "Unknown".to_string(),
            description: "Failed to parse response.".to_string(),
        }
    }

    /// Whether this fragment carries a real classification, as opposed
    /// to a degraded `Error`/`Unknown` sentinel. Only usable fragments
    /// become report issues.
    pub fn is_usable(&self) -> bool {
        self.category != "Error" && self.category != "Unknown"
    }
}

/// Interpret a raw backend reply as `category, description`.
///
/// Splits on the first comma; both parts are trimmed and must be
/// non-empty. Anything else is an [`UnparsableReply`] — a benign
/// outcome, not an error.
pub fn interpret(raw: &str) -> Result<IssueFragment, UnparsableReply> {
    let unparsable = || UnparsableReply {
        raw: raw.to_string(),
    };

    let (category, description) = raw.split_once(',').ok_or_else(unparsable)?;
    let category = category.trim();
    let description = description.trim();
    if category.is_empty() || description.is_empty() {
        return Err(unparsable());
    }

    Ok(IssueFragment {
        category: category.to_string(),
        description: description.to_string(),
    })
}

/// Build the fixed-shape prompt for one added line.
pub fn build_prompt(line_number: u32, code_snippet: &str) -> String {
    format!(
        "Analyse this line of code for issues: line no: {line_number} - {code_snippet}\n\
         Categorize as one of the category in one word: {CATEGORIES}. \
         Response should be in one word. And then write a description for this line in 7-10 words at most. \
         Return response like this category, description"
    )
}

/// Classifies one code line into a category/description fragment.
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Classify one added line. A reply in an unexpected shape degrades
    /// to a sentinel fragment; only transport/upstream problems error.
    async fn classify(
        &self,
        line_number: u32,
        code_snippet: &str,
    ) -> Result<IssueFragment, ReviewError>;
}

/// Configuration for the Ollama-backed classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Generate endpoint URL.
    pub api_url: String,

    /// Model name to request.
    pub model: String,

    /// Per-request timeout in seconds. Bounds every classification call.
    pub timeout_secs: u64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        ClassifierConfig {
            api_url: std::env::var("LLAMA_API_URL")
                .unwrap_or_else(|_| "http://localhost:11434/api/generate".to_string()),
            model: std::env::var("LLAMA_MODEL").unwrap_or_else(|_| "llama3.2".to_string()),
            timeout_secs: 100,
        }
    }
}

impl ClassifierConfig {
    /// Create a new config from environment variables.
    pub fn from_env() -> Self {
        Self::default()
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: Option<String>,
}

/// Ollama implementation of [`Classifier`].
pub struct OllamaClassifier {
    config: ClassifierConfig,
    http_client: reqwest::Client,
}

impl OllamaClassifier {
    /// Create a new classifier client.
    pub fn new(config: ClassifierConfig) -> Self {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("revq/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        OllamaClassifier {
            config,
            http_client,
        }
    }

    /// Create from environment variables.
    pub fn from_env() -> Self {
        Self::new(ClassifierConfig::from_env())
    }
}

#[async_trait]
impl Classifier for OllamaClassifier {
    async fn classify(
        &self,
        line_number: u32,
        code_snippet: &str,
    ) -> Result<IssueFragment, ReviewError> {
        let prompt = build_prompt(line_number, code_snippet);
        let request = GenerateRequest {
            model: &self.config.model,
            prompt: &prompt,
            stream: false,
        };

        let response = self
            .http_client
            .post(&self.config.api_url)
            .json(&request)
            .send()
            .await
            .map_err(ReviewError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ReviewError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        let body: GenerateResponse = response.json().await.map_err(ReviewError::from_reqwest)?;
        let Some(raw) = body.response else {
            debug!(line = line_number, "backend response missing reply body");
            return Ok(IssueFragment::unknown());
        };

        match interpret(&raw) {
            Ok(fragment) => Ok(fragment),
            Err(unparsable) => {
                debug!(line = line_number, raw = %unparsable.raw, "unparsable classifier reply");
                Ok(IssueFragment::unparsable())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interpret_splits_on_first_comma() {
        let fragment = interpret("Bug, possible null dereference").unwrap();
        assert_eq!(fragment.category, "Bug");
        assert_eq!(fragment.description, "possible null dereference");
    }

    #[test]
    fn interpret_keeps_commas_in_description() {
        let fragment = interpret("Style, missing spaces, consider rustfmt").unwrap();
        assert_eq!(fragment.category, "Style");
        assert_eq!(fragment.description, "missing spaces, consider rustfmt");
    }

    #[test]
    fn interpret_trims_both_parts() {
        let fragment = interpret("  Best Practice ,  prefer iterators here  ").unwrap();
        assert_eq!(fragment.category, "Best Practice");
        assert_eq!(fragment.description, "prefer iterators here");
    }

    #[test]
    fn reply_without_comma_is_unparsable() {
        let err = interpret("Bug").unwrap_err();
        assert_eq!(err.raw, "Bug");
    }

    #[test]
    fn empty_parts_are_unparsable() {
        assert!(interpret(", description only").is_err());
        assert!(interpret("Bug,").is_err());
        assert!(interpret("Bug,   ").is_err());
        assert!(interpret(",").is_err());
        assert!(interpret("").is_err());
    }

    #[test]
    fn sentinel_fragments_are_not_usable() {
        assert!(!IssueFragment::unparsable().is_usable());
        assert!(!IssueFragment::unknown().is_usable());
        assert!(interpret("Bug, off by one").unwrap().is_usable());
    }

    #[test]
    fn prompt_names_line_and_snippet() {
        let prompt = build_prompt(42, "total += num");
        assert!(prompt.contains("line no: 42"));
        assert!(prompt.contains("total += num"));
        assert!(prompt.contains("category, description"));
    }
}
