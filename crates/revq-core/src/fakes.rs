//! Scripted fakes for the pipeline's external seams (testing only)
//!
//! `ScriptedChangeSource` and `ScriptedClassifier` satisfy the trait
//! contracts without any network, driven by builder-style scripts.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;

use crate::classify::{interpret, Classifier, IssueFragment};
use crate::domain::{JobRequest, ReviewError};
use crate::source::{ChangeSource, ChangedFile};

/// Change source that replays a scripted file list and contents.
#[derive(Debug, Default)]
pub struct ScriptedChangeSource {
    files: Vec<ChangedFile>,
    list_error_status: Option<u16>,
    contents: HashMap<String, String>,
    content_failures: HashSet<String>,
}

impl ScriptedChangeSource {
    /// Source whose list call fails with the given upstream status.
    pub fn failing_list(status: u16) -> Self {
        Self {
            list_error_status: Some(status),
            ..Self::default()
        }
    }

    /// Append a changed file to the scripted list.
    pub fn with_file(mut self, file: ChangedFile) -> Self {
        self.files.push(file);
        self
    }

    /// Serve specific content for a contents URL.
    pub fn with_content(mut self, url: &str, body: &str) -> Self {
        self.contents.insert(url.to_string(), body.to_string());
        self
    }

    /// Make content fetches for a URL fail with an upstream 404.
    pub fn with_content_failure(mut self, url: &str) -> Self {
        self.content_failures.insert(url.to_string());
        self
    }
}

#[async_trait]
impl ChangeSource for ScriptedChangeSource {
    async fn list_changed_files(
        &self,
        _request: &JobRequest,
    ) -> Result<Vec<ChangedFile>, ReviewError> {
        if let Some(status) = self.list_error_status {
            return Err(ReviewError::Upstream {
                status,
                message: "scripted list failure".to_string(),
            });
        }
        Ok(self.files.clone())
    }

    async fn fetch_content(&self, url: &str, _credential: &str) -> Result<String, ReviewError> {
        if self.content_failures.contains(url) {
            return Err(ReviewError::Upstream {
                status: 404,
                message: "scripted content failure".to_string(),
            });
        }
        Ok(self
            .contents
            .get(url)
            .cloned()
            .unwrap_or_else(|| "// scripted file content".to_string()))
    }
}

/// Classifier that replays scripted raw replies per snippet, run
/// through the same [`interpret`] path as the real backend client.
#[derive(Debug)]
pub struct ScriptedClassifier {
    replies: HashMap<String, String>,
    failures: HashSet<String>,
    default_reply: String,
}

impl Default for ScriptedClassifier {
    fn default() -> Self {
        Self {
            replies: HashMap::new(),
            failures: HashSet::new(),
            // Comma-less, so unscripted lines degrade and are dropped.
            default_reply: "Unknown".to_string(),
        }
    }
}

impl ScriptedClassifier {
    /// Script the raw backend reply for a snippet.
    pub fn with_reply(mut self, snippet: &str, raw_reply: &str) -> Self {
        self.replies
            .insert(snippet.to_string(), raw_reply.to_string());
        self
    }

    /// Make classification of a snippet fail with a transport error.
    pub fn with_failure(mut self, snippet: &str) -> Self {
        self.failures.insert(snippet.to_string());
        self
    }

    /// Change the reply used for unscripted snippets.
    pub fn with_default_reply(mut self, raw_reply: &str) -> Self {
        self.default_reply = raw_reply.to_string();
        self
    }
}

#[async_trait]
impl Classifier for ScriptedClassifier {
    async fn classify(
        &self,
        _line_number: u32,
        code_snippet: &str,
    ) -> Result<IssueFragment, ReviewError> {
        if self.failures.contains(code_snippet) {
            return Err(ReviewError::Transport(
                "scripted classifier failure".to_string(),
            ));
        }
        let raw = self
            .replies
            .get(code_snippet)
            .unwrap_or(&self.default_reply);
        Ok(interpret(raw).unwrap_or_else(|_| IssueFragment::unparsable()))
    }
}
