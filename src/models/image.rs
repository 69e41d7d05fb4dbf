use crate::error::{ForgeError, Result};
use serde::{Deserialize, Serialize};

pub const MISSING_INPUT: &str = "missing image or prompt";

/// A fully resolved generate action: prompt plus base64 image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub prompt: String,
    pub image_data: String,
    pub mime_type: String,
}

impl GenerationRequest {
    pub fn new(
        prompt: impl Into<String>,
        image_data: impl Into<String>,
        mime_type: impl Into<String>,
    ) -> Self {
        Self {
            prompt: prompt.into(),
            image_data: image_data.into(),
            mime_type: mime_type.into(),
        }
    }

    /// Both prompt and image must be present before any network call.
    pub fn validate(&self) -> Result<()> {
        if self.prompt.trim().is_empty() || self.image_data.is_empty() {
            return Err(ForgeError::ValidationError(MISSING_INPUT.into()));
        }
        Ok(())
    }
}

/// Successful reply from the generation client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditedImage {
    pub base64_data: String,
    pub description: Option<String>,
}

/// Outcome of one completed or failed generate action. `error` is set iff
/// `image_data_base64` is absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResult {
    pub image_data_base64: Option<String>,
    pub description: Option<String>,
    pub error: Option<String>,
}

impl GenerationResult {
    pub fn success(image: EditedImage) -> Self {
        Self {
            image_data_base64: Some(image.base64_data),
            description: image.description,
            error: None,
        }
    }

    pub fn failure(error: &ForgeError) -> Self {
        Self {
            image_data_base64: None,
            description: None,
            error: Some(error.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.image_data_base64.is_some()
    }
}

impl From<Result<EditedImage>> for GenerationResult {
    fn from(outcome: Result<EditedImage>) -> Self {
        match outcome {
            Ok(image) => GenerationResult::success(image),
            Err(e) => GenerationResult::failure(&e),
        }
    }
}
