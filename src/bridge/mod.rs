//! The bridge controller: turns one inbound execution into at most one
//! generation call and exactly one relay.

pub mod action;
pub mod relay;

use crate::{
    encoding,
    error::Result,
    gemini::ImageClient,
    models::{sniff_mime_type, EditedImage, GenerationRequest, GenerationResult, TriggerPayload},
    session::{Session, SessionStore},
};
use std::sync::Arc;

pub use action::BridgeAction;
pub use relay::{RelayMessage, RELAY_TAG};

pub const GENERATION_IN_PROGRESS: &str = "generation already in progress";

#[derive(Clone)]
pub struct BridgeController {
    sessions: Arc<SessionStore>,
    client: ImageClient,
}

/// Clears the processing flag if an execution is dropped mid-call.
struct InFlight<'a> {
    sessions: &'a SessionStore,
    session_id: &'a str,
    finished: bool,
}

impl InFlight<'_> {
    fn finish(mut self) {
        self.finished = true;
        self.sessions.with_session(self.session_id, |session| {
            session.processing = false;
            session.touch();
        });
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.finished {
            log::warn!("Session {}: generation interrupted", self.session_id);
            self.sessions
                .with_session(self.session_id, |session| session.processing = false);
        }
    }
}

impl BridgeController {
    pub fn new(sessions: Arc<SessionStore>, client: ImageClient) -> Self {
        Self { sessions, client }
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    /// Runs one execution for `session_id`.
    ///
    /// A fresh generate trigger is consumed, the client is called at most
    /// once, and the outcome is returned as the relay for this same
    /// request/response turn. Without a fresh trigger the execution stays
    /// `Idle`, nothing is called and no session is opened.
    pub async fn execute(&self, session_id: &str, trigger: Option<TriggerPayload>) -> RelayMessage {
        let mut action = match trigger {
            Some(trigger) if trigger.is_generate() => match self.accept_trigger(session_id, &trigger) {
                Ok(action) => action,
                Err(refusal) => return refusal,
            },
            Some(trigger) => {
                log::debug!(
                    "Session {}: ignoring action {:?}",
                    session_id,
                    trigger.action
                );
                BridgeAction::Idle
            }
            None => BridgeAction::Idle,
        };

        if let Some(request) = action.take_request() {
            let guard = InFlight {
                sessions: &self.sessions,
                session_id,
                finished: false,
            };
            let result = GenerationResult::from(self.generate(&request).await);
            guard.finish();
            action = BridgeAction::ResultReady(result);
        }

        log::debug!("Session {}: relaying {}", session_id, action.name());
        action
            .take_result()
            .map(RelayMessage::from)
            .unwrap_or(RelayMessage::Idle)
    }

    /// Accepts a generate trigger under a single lock of the session:
    /// replay check, busy check, input resolution and, when a call will be
    /// made, the processing flag. Returns `Err` when the trigger is refused
    /// outright.
    fn accept_trigger(
        &self,
        session_id: &str,
        trigger: &TriggerPayload,
    ) -> std::result::Result<BridgeAction, RelayMessage> {
        self.sessions.update(session_id, |session| {
            if let Some(id) = trigger.trigger_id.as_deref() {
                if session.consumed_trigger.as_deref() == Some(id) {
                    log::info!("Session {}: trigger {} already consumed", session_id, id);
                    return Ok(BridgeAction::Idle);
                }
            }

            if session.processing {
                log::warn!("Session {}: trigger refused, call in flight", session_id);
                return Err(RelayMessage::error(GENERATION_IN_PROGRESS));
            }

            if trigger.trigger_id.is_some() {
                session.consumed_trigger = trigger.trigger_id.clone();
            }
            session.touch();

            match Self::resolve(session, trigger) {
                Ok(request) => {
                    log::info!(
                        "Session {}: generate requested ({} chars of prompt)",
                        session_id,
                        request.prompt.len()
                    );
                    session.processing = true;
                    Ok(BridgeAction::GenerateRequested(request))
                }
                Err(e) => {
                    log::warn!("Session {}: {}", session_id, e);
                    Ok(BridgeAction::ResultReady(GenerationResult::failure(&e)))
                }
            }
        })
    }

    /// Prompt from the trigger; image attached to the trigger, else the
    /// session's upload.
    fn resolve(session: &Session, trigger: &TriggerPayload) -> Result<GenerationRequest> {
        let prompt = trigger.prompt.clone().unwrap_or_default();
        let trigger_mime = trigger.mime_type.clone().filter(|m| !m.is_empty());

        let (image_data, mime_type) = match (trigger.attached_image(), &session.source) {
            (Some(data), _) => (data.to_string(), trigger_mime),
            (None, Some(source)) => (
                encoding::encode(&source.bytes),
                trigger_mime.or_else(|| source.mime_type.clone()),
            ),
            (None, None) => (String::new(), trigger_mime),
        };

        let request = GenerationRequest::new(prompt, image_data, mime_type.unwrap_or_default());
        request.validate()?;
        Ok(request)
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<EditedImage> {
        let bytes = encoding::decode(&request.image_data)?;
        let mime_type = if request.mime_type.is_empty() {
            sniff_mime_type(&bytes)
        } else {
            request.mime_type.as_str()
        };

        let outcome = self.client.generate(&request.prompt, &bytes, mime_type).await;
        match &outcome {
            Ok(image) => log::info!(
                "Generation succeeded ({} base64 chars)",
                image.base64_data.len()
            ),
            Err(e) => log::warn!("Generation failed: {}", e),
        }
        outcome
    }
}
