use crate::{
    config::GeminiConfig,
    encoding,
    error::{sanitize_detail, ForgeError, Result},
    gemini::transport::Transport,
    logger,
    models::{
        gemini::{
            EditedImagePayload, GeminiConfig as SchemaConfig, GeminiContent, GeminiRequest,
            GeminiRequestPart, GeminiResponse, InlineData,
        },
        EditedImage,
    },
};
use std::sync::Arc;

/// Frames the user's instruction for an image-to-image edit.
pub fn frame_prompt(prompt: &str) -> String {
    format!(
        "Perform image-to-image modification based on this instruction: {}. Return only the resulting image.",
        prompt.trim()
    )
}

/// Single-shot client for the image editing service. One `generate` call is
/// exactly one request; nothing is retried or cached.
#[derive(Clone)]
pub struct ImageClient {
    transport: Arc<dyn Transport>,
    api_key: String,
    model: String,
    base_url: String,
}

impl ImageClient {
    pub fn new(config: &GeminiConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        Ok(Self {
            transport,
            api_key: config.api_key()?.to_string(),
            model: config.model().to_string(),
            base_url: config.base_url().to_string(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }

    pub fn build_request(prompt: &str, image_bytes: &[u8], mime_type: &str) -> GeminiRequest {
        GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![
                    GeminiRequestPart::Text {
                        text: frame_prompt(prompt),
                    },
                    GeminiRequestPart::InlineData {
                        inline_data: InlineData {
                            mime_type: mime_type.to_string(),
                            data: encoding::encode(image_bytes),
                        },
                    },
                ],
            }],
            config: SchemaConfig::edited_image_schema(),
        }
    }

    pub async fn generate(
        &self,
        prompt: &str,
        image_bytes: &[u8],
        mime_type: &str,
    ) -> Result<EditedImage> {
        let request = Self::build_request(prompt, image_bytes, mime_type);
        let body = serde_json::to_value(&request)
            .map_err(|e| ForgeError::MalformedResponse(format!("request encoding: {}", e)))?;

        log::info!(
            "Editing image with model: {} ({} bytes, {})",
            self.model,
            image_bytes.len(),
            mime_type
        );

        let timer = logger::timer("generateContent");
        let response = self
            .transport
            .post_json(&self.endpoint(), &self.api_key, &body)
            .await;
        timer.stop();

        let response = response.map_err(|e| {
            log::error!("Image service unreachable: {}", e);
            e
        })?;

        if !response.is_success() {
            log::error!(
                "Image service returned HTTP {}: {}",
                response.status,
                sanitize_detail(&response.body)
            );
            return Err(ForgeError::transport(Some(response.status), &response.body));
        }

        Self::parse_reply(&response.body)
    }

    /// Parses the service container and validates the model-produced JSON
    /// inside it. The declared schema is only a hint to the service.
    pub fn parse_reply(body: &str) -> Result<EditedImage> {
        let container: GeminiResponse = serde_json::from_str(body).map_err(|e| {
            log::error!("Unparseable service container: {}", sanitize_detail(body));
            ForgeError::MalformedResponse(format!("invalid response container: {}", e))
        })?;

        let text = container.first_text().ok_or_else(|| {
            log::error!(
                "Service reply has no text part (finish reason: {:?})",
                container.finish_reason()
            );
            ForgeError::MalformedResponse("no text in first candidate".into())
        })?;

        let payload: EditedImagePayload = serde_json::from_str(text).map_err(|e| {
            log::error!("Model text is not JSON: {}", sanitize_detail(text));
            ForgeError::MalformedResponse(format!("model output is not JSON: {}", e))
        })?;

        let base64_data = payload
            .image_data_base64
            .filter(|data| !data.is_empty())
            .ok_or_else(|| {
                log::error!("Model JSON lacks image_data_base64: {}", sanitize_detail(text));
                ForgeError::MalformedResponse("image_data_base64 missing".into())
            })?;

        if !encoding::is_valid(&base64_data) {
            log::error!("image_data_base64 is not valid base64");
            return Err(ForgeError::MalformedResponse(
                "image_data_base64 is not valid base64".into(),
            ));
        }

        Ok(EditedImage {
            base64_data,
            description: payload.description,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gemini::transport::ScriptedTransport;

    const PNG: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x01];

    fn client_with(transport: Arc<ScriptedTransport>) -> ImageClient {
        let config = GeminiConfig::new().with_api_key("test-key");
        ImageClient::new(&config, transport).unwrap()
    }

    #[test]
    fn test_new_requires_api_key() {
        let transport = Arc::new(ScriptedTransport::new());
        let result = ImageClient::new(&GeminiConfig::new(), transport);
        assert!(matches!(result, Err(ForgeError::ConfigError(_))));
    }

    #[test]
    fn test_endpoint_uses_model() {
        let client = client_with(Arc::new(ScriptedTransport::new()));
        assert_eq!(
            client.endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[tokio::test]
    async fn test_generate_success() {
        let transport = Arc::new(
            ScriptedTransport::new()
                .reply_with_text(r#"{"image_data_base64": "QQ==", "description": "ok"}"#),
        );
        let client = client_with(transport.clone());

        let image = client.generate("make it blue", PNG, "image/png").await.unwrap();
        assert_eq!(image.base64_data, "QQ==");
        assert_eq!(image.description.as_deref(), Some("ok"));
        assert_eq!(transport.calls(), 1);

        let sent = transport.last_request().unwrap();
        let parts = &sent["contents"][0]["parts"];
        assert!(parts[0]["text"].as_str().unwrap().contains("make it blue"));
        assert_eq!(parts[1]["inline_data"]["data"], encoding::encode(PNG));
        assert_eq!(parts[1]["inline_data"]["mime_type"], "image/png");
    }

    #[tokio::test]
    async fn test_rate_limit_is_transport_failure_without_retry() {
        let transport = Arc::new(
            ScriptedTransport::new()
                .reply(429, r#"{"error": {"message": "Resource exhausted"}}"#)
                .reply_with_text(r#"{"image_data_base64": "QQ=="}"#),
        );
        let client = client_with(transport.clone());

        match client.generate("make it blue", PNG, "image/png").await {
            Err(ForgeError::TransportFailure { status, detail }) => {
                assert_eq!(status, Some(429));
                assert!(detail.contains("Resource exhausted"));
            }
            other => panic!("expected transport failure, got {:?}", other),
        }
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn test_connection_error_is_transport_failure() {
        let transport = Arc::new(ScriptedTransport::new().fail("connection refused"));
        let client = client_with(transport);

        let err = client.generate("p", PNG, "image/png").await.unwrap_err();
        assert!(matches!(err, ForgeError::TransportFailure { status: None, .. }));
    }

    #[tokio::test]
    async fn test_inner_text_not_json_is_malformed() {
        let transport = Arc::new(ScriptedTransport::new().reply_with_text("Here is your image!"));
        let client = client_with(transport);

        let err = client.generate("p", PNG, "image/png").await.unwrap_err();
        assert!(matches!(err, ForgeError::MalformedResponse(_)));
    }

    #[test]
    fn test_parse_reply_rejects_incomplete_payloads() {
        let wrap = |text: &str| {
            serde_json::json!({
                "candidates": [{ "content": { "parts": [{ "text": text }] } }]
            })
            .to_string()
        };

        for body in [
            "not json at all".to_string(),
            r#"{"candidates": []}"#.to_string(),
            wrap(r#"{"description": "no image"}"#),
            wrap(r#"{"image_data_base64": "", "description": "empty"}"#),
            wrap(r#"{"image_data_base64": "%%%", "description": "bad"}"#),
        ] {
            assert!(
                matches!(
                    ImageClient::parse_reply(&body),
                    Err(ForgeError::MalformedResponse(_))
                ),
                "{body}"
            );
        }
    }

    #[test]
    fn test_parse_reply_without_description() {
        let body = serde_json::json!({
            "candidates": [{ "content": { "parts": [{ "text": "{\"image_data_base64\":\"QUJD\"}" }] } }]
        })
        .to_string();
        let image = ImageClient::parse_reply(&body).unwrap();
        assert_eq!(image.base64_data, "QUJD");
        assert_eq!(image.description, None);
    }

    #[test]
    fn test_frame_prompt() {
        assert_eq!(
            frame_prompt(" make it blue "),
            "Perform image-to-image modification based on this instruction: make it blue. Return only the resulting image."
        );
    }
}
