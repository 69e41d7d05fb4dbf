pub mod image_client;
pub mod transport;

use crate::{config::GeminiConfig, error::Result};
use std::sync::Arc;

pub use image_client::ImageClient;
pub use transport::{HttpTransport, ScriptedTransport, Transport, TransportResponse};

/// Entry point to the image editing service.
#[derive(Clone)]
pub struct GeminiClient {
    image_client: ImageClient,
}

impl GeminiClient {
    /// Builds a client over HTTP. Fails with `ConfigError` when no API key is configured.
    pub fn new(config: &GeminiConfig) -> Result<Self> {
        Self::with_transport(config, Arc::new(HttpTransport::new()))
    }

    pub fn with_transport(config: &GeminiConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        Ok(Self {
            image_client: ImageClient::new(config, transport)?,
        })
    }

    pub fn image(&self) -> &ImageClient {
        &self.image_client
    }
}
