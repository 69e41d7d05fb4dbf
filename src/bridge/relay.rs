use crate::error::{ForgeError, Result};
use crate::models::GenerationResult;
use serde::{Deserialize, Serialize};

/// Prefix of the single-line text form of a relay.
pub const RELAY_TAG: &str = "FORGE_RELAY";

/// What the front end receives at the end of an execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum RelayMessage {
    Result {
        #[serde(rename = "base64Data")]
        base64_data: Option<String>,
        error: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
    /// Nothing pending for this session.
    Idle,
}

impl RelayMessage {
    pub fn error(message: impl Into<String>) -> Self {
        RelayMessage::Result {
            base64_data: None,
            error: Some(message.into()),
            description: None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            RelayMessage::Result { error, .. } => error.as_deref(),
            RelayMessage::Idle => None,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, RelayMessage::Idle)
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| r#"{"action":"idle"}"#.to_string())
    }

    /// `FORGE_RELAY {json}` on one line.
    pub fn to_tagged_line(&self) -> String {
        format!("{} {}", RELAY_TAG, self.to_json())
    }

    pub fn from_tagged_line(line: &str) -> Result<Self> {
        let json = line
            .trim()
            .strip_prefix(RELAY_TAG)
            .ok_or_else(|| ForgeError::DecodeError(format!("missing {} tag", RELAY_TAG)))?;
        serde_json::from_str(json.trim())
            .map_err(|e| ForgeError::DecodeError(format!("invalid relay payload: {}", e)))
    }
}

impl From<GenerationResult> for RelayMessage {
    fn from(result: GenerationResult) -> Self {
        RelayMessage::Result {
            base64_data: result.image_data_base64,
            error: result.error,
            description: result.description,
        }
    }
}
