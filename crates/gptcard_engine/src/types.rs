use gptcard_core::{Msg, RequestId};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// `text` is the completion, or the inline error text on failure.
    CompletionSettled { request_id: RequestId, text: String },
    PrefillDue,
}

impl<N> From<EngineEvent> for Msg<N> {
    fn from(event: EngineEvent) -> Self {
        match event {
            EngineEvent::CompletionSettled { request_id, text } => {
                Msg::CompletionSettled { request_id, text }
            }
            EngineEvent::PrefillDue => Msg::PrefillDue,
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CompletionError {
    #[error("no api key configured")]
    MissingApiKey,
    #[error("invalid endpoint {endpoint}: {message}")]
    InvalidEndpoint { endpoint: String, message: String },
    #[error("timeout")]
    Timeout,
    #[error("network error: {0}")]
    Network(String),
    #[error("http status {status}: {body}")]
    HttpStatus { status: u16, body: String },
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    #[error("response contained no choices")]
    EmptyResponse,
}
