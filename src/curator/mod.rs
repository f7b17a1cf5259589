//! Prompt-to-playlist recommendation generation.
//!
//! The curator turns a free-text prompt into a fixed-length list of
//! (title, artist) picks by calling an LLM with a strict JSON output
//! contract. The LLM's output is an untrusted boundary: it is parsed and
//! validated, never trusted for shape.

pub mod llm;

use llm::{CompletionOptions, LlmError, LlmProvider, Message};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Number of songs a generation must produce. The instruction below and the
/// count validation must agree on this value.
pub const PLAYLIST_LENGTH: usize = 5;

const SYSTEM_INSTRUCTION: &str = r#"
You are a playlist curator. Your task is to analyze user prompts and generate song recommendations.
Always return a JSON object containing exactly 5 song recommendations. Each song must include "title" and "artist" fields.

Example format:
{
  "recommendations": [
    {
      "title": "song_title",
      "artist": "artist_name"
    }
  ]
}

Rules:
- Return only the JSON object without any other text
- Include full artist names (no abbreviations)
- Include exact song titles as they would appear in a music catalog
- Do not include additional commentary or explanations
- Do not include song descriptions or reasons for recommendations
- Ensure consistent JSON formatting
- Must return exactly 5 songs, no more and no less
"#;

/// A generated song pick awaiting catalog resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongPick {
    pub title: String,
    pub artist: String,
}

#[derive(Debug, Deserialize)]
struct RecommendationsDoc {
    recommendations: Vec<SongPick>,
}

/// Errors that can occur while generating recommendations.
#[derive(Debug, Error)]
pub enum CuratorError {
    #[error("Completion request failed: {0}")]
    Llm(#[from] LlmError),

    #[error("Malformed recommendation output: {0}")]
    MalformedOutput(String),
}

/// Generates song recommendations from a free-text prompt.
pub struct Curator {
    provider: Arc<dyn LlmProvider>,
    options: CompletionOptions,
}

impl Curator {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self::with_options(provider, CompletionOptions::default())
    }

    pub fn with_options(provider: Arc<dyn LlmProvider>, options: CompletionOptions) -> Self {
        Self { provider, options }
    }

    /// Generate exactly [`PLAYLIST_LENGTH`] song picks for the given prompt.
    ///
    /// Makes a single completion call, no retries. A response that violates
    /// the output contract in any way (not JSON, missing array, wrong count,
    /// empty fields) is a [`CuratorError::MalformedOutput`].
    pub async fn generate(&self, prompt: &str) -> Result<Vec<SongPick>, CuratorError> {
        let messages = [
            Message::system(SYSTEM_INSTRUCTION),
            Message::user(prompt),
        ];

        debug!(
            provider = %self.provider.name(),
            model = %self.provider.model(),
            "Requesting song recommendations"
        );

        let response = self.provider.complete(&messages, &self.options).await?;

        if let Some(usage) = response.usage {
            debug!(
                total_tokens = usage.total_tokens,
                "Recommendation completion finished"
            );
        }

        parse_recommendations(&response.message.content)
    }
}

/// Remove markdown code fences the model may wrap its JSON in.
fn strip_code_fences(raw: &str) -> String {
    raw.replace("```json", "").replace("```", "")
}

/// Parse and validate the raw model output into song picks.
fn parse_recommendations(raw: &str) -> Result<Vec<SongPick>, CuratorError> {
    let cleaned = strip_code_fences(raw);

    let doc: RecommendationsDoc = serde_json::from_str(cleaned.trim())
        .map_err(|e| CuratorError::MalformedOutput(format!("not a recommendations document: {}", e)))?;

    if doc.recommendations.len() != PLAYLIST_LENGTH {
        return Err(CuratorError::MalformedOutput(format!(
            "expected exactly {} recommendations, got {}",
            PLAYLIST_LENGTH,
            doc.recommendations.len()
        )));
    }

    for pick in &doc.recommendations {
        if pick.title.trim().is_empty() || pick.artist.trim().is_empty() {
            return Err(CuratorError::MalformedOutput(
                "recommendation with empty title or artist".to_string(),
            ));
        }
    }

    Ok(doc.recommendations)
}
