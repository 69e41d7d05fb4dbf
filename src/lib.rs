//! rforge - bridge between a browser image-editing front end and a
//! generative image-editing service.
//!
//! The front end and the backend are not persistently connected: every
//! interaction is a fresh request. This crate keeps the uploaded image in a
//! keyed [`SessionStore`], turns a "generate" trigger into at most one
//! [`ImageClient::generate`] call, and relays the outcome back through the
//! response of the very request that triggered it.
//!
//! ```no_run
//! use rforge::{BridgeController, GeminiClient, GeminiConfig, SessionStore, TriggerPayload};
//! use std::sync::Arc;
//!
//! # async fn demo() -> rforge::Result<()> {
//! let client = GeminiClient::new(&GeminiConfig::from_env())?;
//! let bridge = BridgeController::new(Arc::new(SessionStore::new()), client.image().clone());
//!
//! let session = bridge.sessions().create();
//! bridge.sessions().put(&session, std::fs::read("cat.png").unwrap_or_default(), "cat.png", None);
//!
//! let relay = bridge
//!     .execute(&session, Some(TriggerPayload::generate("make it blue")))
//!     .await;
//! println!("{}", relay.to_tagged_line());
//! # Ok(())
//! # }
//! ```

pub mod bridge;
pub mod config;
pub mod encoding;
pub mod error;
pub mod gemini;
pub mod logger;
pub mod models;
#[cfg(feature = "server")]
pub mod server;
pub mod session;

pub use bridge::{BridgeAction, BridgeController, RelayMessage};
pub use config::{Config, GeminiConfig};
pub use error::{ForgeError, GenerationError, Result};
pub use gemini::{GeminiClient, HttpTransport, ImageClient, ScriptedTransport, Transport};
pub use models::{EditedImage, GenerationRequest, GenerationResult, TriggerPayload};
pub use session::{SessionStore, SessionSummary, SourceImage};
