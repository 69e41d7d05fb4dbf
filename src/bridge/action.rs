use crate::models::{GenerationRequest, GenerationResult};

/// Where one execution stands.
///
/// `Idle -> GenerateRequested` when a fresh trigger is accepted,
/// `GenerateRequested -> ResultReady` once the client returns (or validation
/// fails), `ResultReady -> Idle` when the relay is handed to the front end.
/// The value lives on the executing task, so a result can only leave through
/// the turn that requested it.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum BridgeAction {
    #[default]
    Idle,
    GenerateRequested(GenerationRequest),
    ResultReady(GenerationResult),
}

impl BridgeAction {
    pub fn is_idle(&self) -> bool {
        matches!(self, BridgeAction::Idle)
    }

    pub fn name(&self) -> &'static str {
        match self {
            BridgeAction::Idle => "idle",
            BridgeAction::GenerateRequested(_) => "generate_requested",
            BridgeAction::ResultReady(_) => "result_ready",
        }
    }

    /// Takes a pending request, leaving `Idle`. Any other state is left untouched.
    pub fn take_request(&mut self) -> Option<GenerationRequest> {
        match std::mem::take(self) {
            BridgeAction::GenerateRequested(request) => Some(request),
            other => {
                *self = other;
                None
            }
        }
    }

    /// Takes a ready result, leaving `Idle`. Any other state is left untouched.
    pub fn take_result(&mut self) -> Option<GenerationResult> {
        match std::mem::take(self) {
            BridgeAction::ResultReady(result) => Some(result),
            other => {
                *self = other;
                None
            }
        }
    }
}
