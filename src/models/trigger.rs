use serde::{Deserialize, Serialize};

pub const GENERATE_ACTION: &str = "generate";

/// Named values sent by the front end, either as query parameters or as a
/// JSON body. Every field is optional on the wire; the bridge decides what
/// is missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerPayload {
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub image_data: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
    /// Front-end generated id; a replay with an already consumed id is ignored.
    #[serde(default)]
    pub trigger_id: Option<String>,
}

impl TriggerPayload {
    pub fn generate(prompt: impl Into<String>) -> Self {
        Self {
            action: Some(GENERATE_ACTION.to_string()),
            prompt: Some(prompt.into()),
            ..Default::default()
        }
    }

    pub fn with_image(mut self, image_data: impl Into<String>, mime_type: impl Into<String>) -> Self {
        self.image_data = Some(image_data.into());
        self.mime_type = Some(mime_type.into());
        self
    }

    pub fn with_trigger_id(mut self, trigger_id: impl Into<String>) -> Self {
        self.trigger_id = Some(trigger_id.into());
        self
    }

    pub fn is_generate(&self) -> bool {
        self.action.as_deref() == Some(GENERATE_ACTION)
    }

    /// Attached image data, ignoring empty strings.
    pub fn attached_image(&self) -> Option<&str> {
        self.image_data.as_deref().filter(|data| !data.is_empty())
    }
}
