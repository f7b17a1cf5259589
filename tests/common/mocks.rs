//! Scripted collaborator mocks injected through the trait seams
//!
//! These mirror the production collaborators at their boundaries: the LLM
//! provider returns a canned completion (or fails), the catalog resolves
//! queries from a fixed table (or fails per query).

use async_trait::async_trait;
use promptify_server::curator::llm::{
    CompletionOptions, CompletionResponse, FinishReason, LlmError, LlmProvider, Message,
};
use promptify_server::resolver::{CatalogError, ResolvedTrack, TrackCatalog};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

/// LLM provider that replays a fixed completion.
pub struct ScriptedLlm {
    reply: Option<String>,
}

impl ScriptedLlm {
    /// Replies with the given raw completion content.
    pub fn replying(content: impl Into<String>) -> Self {
        Self {
            reply: Some(content.into()),
        }
    }

    /// Fails every completion request with a connection error.
    pub fn unavailable() -> Self {
        Self { reply: None }
    }

    /// Replies with a well-formed recommendations document.
    pub fn recommending(picks: &[(&str, &str)]) -> Self {
        let recommendations: Vec<_> = picks
            .iter()
            .map(|(title, artist)| serde_json::json!({"title": title, "artist": artist}))
            .collect();
        Self::replying(serde_json::json!({ "recommendations": recommendations }).to_string())
    }
}

#[async_trait]
impl LlmProvider for ScriptedLlm {
    fn name(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted-model"
    }

    async fn complete(
        &self,
        _messages: &[Message],
        _options: &CompletionOptions,
    ) -> Result<CompletionResponse, LlmError> {
        match &self.reply {
            Some(content) => Ok(CompletionResponse {
                message: Message::assistant(content.clone()),
                finish_reason: FinishReason::Stop,
                usage: None,
            }),
            None => Err(LlmError::Connection("scripted outage".to_string())),
        }
    }
}

/// Catalog that resolves queries from a fixed table and counts every call.
pub struct ScriptedCatalog {
    tracks: HashMap<String, String>,
    failing: HashSet<String>,
    calls: AtomicUsize,
}

impl ScriptedCatalog {
    pub fn new() -> Self {
        Self {
            tracks: HashMap::new(),
            failing: HashSet::new(),
            calls: AtomicUsize::new(0),
        }
    }

    /// Register a track the catalog will resolve for "<title> <artist>".
    pub fn with_track(mut self, title: &str, artist: &str, id: &str) -> Self {
        self.tracks
            .insert(format!("{} {}", title, artist), id.to_string());
        self
    }

    /// Make the search request for "<title> <artist>" fail with a 502.
    pub fn with_failure(mut self, title: &str, artist: &str) -> Self {
        self.failing.insert(format!("{} {}", title, artist));
        self
    }

    /// Number of search calls received so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TrackCatalog for ScriptedCatalog {
    async fn find_track(
        &self,
        query: &str,
        _credential: &str,
    ) -> Result<Option<ResolvedTrack>, CatalogError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.contains(query) {
            return Err(CatalogError::Api { status: 502 });
        }
        Ok(self
            .tracks
            .get(query)
            .map(|id| ResolvedTrack { id: id.clone() }))
    }
}
