//! Error types shared by the generation client, the session store and the bridge.

/// Longest transport detail surfaced to the front end.
const MAX_DETAIL_LEN: usize = 300;

#[derive(Debug, thiserror::Error)]
pub enum ForgeError {
    /// Required configuration (the service API key) is missing.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A generate trigger is missing its prompt or its image.
    #[error("{0}")]
    ValidationError(String),

    /// The external service was unreachable or answered with a non-success status.
    #[error("Transport failure{}: {detail}", status_label(.status))]
    TransportFailure { status: Option<u16>, detail: String },

    /// The service answered successfully but the payload did not match the declared schema.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Malformed base64 on a decode path.
    #[error("Decode error: {0}")]
    DecodeError(String),
}

/// Errors returned by the generation client.
pub type GenerationError = ForgeError;

pub type Result<T> = std::result::Result<T, ForgeError>;

impl ForgeError {
    pub fn transport(status: Option<u16>, detail: impl AsRef<str>) -> Self {
        ForgeError::TransportFailure {
            status,
            detail: sanitize_detail(detail.as_ref()),
        }
    }
}

impl From<base64::DecodeError> for ForgeError {
    fn from(err: base64::DecodeError) -> Self {
        ForgeError::DecodeError(err.to_string())
    }
}

impl From<reqwest::Error> for ForgeError {
    fn from(err: reqwest::Error) -> Self {
        let status = err.status().map(|s| s.as_u16());
        ForgeError::transport(status, err.to_string())
    }
}

fn status_label(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!(" (HTTP {})", code),
        None => String::new(),
    }
}

/// Collapses whitespace and truncates service error bodies before they reach a user.
pub fn sanitize_detail(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= MAX_DETAIL_LEN {
        return collapsed;
    }
    let truncated: String = collapsed.chars().take(MAX_DETAIL_LEN).collect();
    format!("{}...", truncated)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_display_includes_status() {
        let err = ForgeError::transport(Some(429), "Resource exhausted");
        assert_eq!(
            err.to_string(),
            "Transport failure (HTTP 429): Resource exhausted"
        );

        let err = ForgeError::transport(None, "connection refused");
        assert_eq!(err.to_string(), "Transport failure: connection refused");
    }

    #[test]
    fn test_validation_message_is_verbatim() {
        let err = ForgeError::ValidationError("missing image or prompt".into());
        assert_eq!(err.to_string(), "missing image or prompt");
    }

    #[test]
    fn test_sanitize_detail_truncates_long_bodies() {
        let body = "x".repeat(1000);
        let detail = sanitize_detail(&body);
        assert!(detail.ends_with("..."));
        assert_eq!(detail.chars().count(), MAX_DETAIL_LEN + 3);

        assert_eq!(sanitize_detail("  a \n  b  "), "a b");
    }
}
