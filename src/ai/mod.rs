// 🤖 Generative AI collaborator
// Statement extraction + advice are delegated to an external model.
// Everything the ledger sees comes through the GenerativeModel seam.

pub mod advice;
pub mod extraction;
pub mod gemini;

use anyhow::Result;
use futures::future::BoxFuture;
use serde_json::Value;

pub use advice::{advise_on, fallback_tips, get_financial_advice, summarize_recent};
pub use extraction::{clean_json_string, extract_from_media, extract_from_text, EXTRACTION_PROMPT};
pub use gemini::GeminiClient;

/// One part of a prompt: plain text or an inline file (base64 payload).
#[derive(Debug, Clone, PartialEq)]
pub enum Part {
    Text(String),
    InlineData { mime_type: String, data: String },
}

/// ContentRequest - a single-turn "user" prompt
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ContentRequest {
    pub parts: Vec<Part>,
    /// JSON schema the model must answer with (JSON mime type implied)
    pub response_schema: Option<Value>,
}

impl ContentRequest {
    pub fn text(prompt: impl Into<String>) -> Self {
        ContentRequest {
            parts: vec![Part::Text(prompt.into())],
            response_schema: None,
        }
    }

    pub fn with_part(mut self, part: Part) -> Self {
        self.parts.push(part);
        self
    }

    pub fn with_schema(mut self, schema: Value) -> Self {
        self.response_schema = Some(schema);
        self
    }
}

/// GenerativeModel - the only interface the app needs from an AI vendor.
///
/// Returns the raw response text; callers own the JSON cleanup.
pub trait GenerativeModel: Send + Sync {
    fn generate<'a>(&'a self, request: ContentRequest) -> BoxFuture<'a, Result<String>>;

    /// Model identifier for logs
    fn model_name(&self) -> &str;
}
