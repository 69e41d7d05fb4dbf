//! Wire types for the `generateContent` call.

use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, Serialize)]
pub struct GeminiRequest {
    pub contents: Vec<GeminiContent>,
    pub config: GeminiConfig,
}

#[derive(Debug, Serialize)]
pub struct GeminiContent {
    pub parts: Vec<GeminiRequestPart>,
}

/// A request part: text or an inline image blob.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum GeminiRequestPart {
    Text { text: String },
    InlineData { inline_data: InlineData },
}

#[derive(Debug, Serialize)]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Serialize)]
pub struct GeminiConfig {
    pub response_mime_type: String,
    pub response_schema: serde_json::Value,
}

impl GeminiConfig {
    /// JSON output with `image_data_base64` and `description` string fields.
    pub fn edited_image_schema() -> Self {
        Self {
            response_mime_type: "application/json".to_string(),
            response_schema: json!({
                "type": "OBJECT",
                "properties": {
                    "image_data_base64": { "type": "STRING" },
                    "description": { "type": "STRING" }
                },
                "required": ["image_data_base64", "description"]
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct GeminiResponse {
    #[serde(default)]
    pub candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
pub struct GeminiCandidate {
    #[serde(default)]
    pub content: Option<GeminiContentResponse>,
    #[serde(default, alias = "finishReason")]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GeminiContentResponse {
    #[serde(default)]
    pub parts: Vec<GeminiPartResponse>,
}

#[derive(Debug, Deserialize)]
pub struct GeminiPartResponse {
    #[serde(default)]
    pub text: Option<String>,
}

impl GeminiResponse {
    /// `candidates[0].content.parts[0].text`
    pub fn first_text(&self) -> Option<&str> {
        self.candidates
            .first()?
            .content
            .as_ref()?
            .parts
            .first()?
            .text
            .as_deref()
    }

    pub fn finish_reason(&self) -> Option<&str> {
        self.candidates.first()?.finish_reason.as_deref()
    }
}

/// The model-produced JSON carried inside the first text part.
#[derive(Debug, Deserialize)]
pub struct EditedImagePayload {
    #[serde(default)]
    pub image_data_base64: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}
