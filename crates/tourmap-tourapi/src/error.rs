use thiserror::Error;

/// Errors returned by the TourAPI client.
///
/// `reqwest` errors are stored with their URL stripped so the service key
/// never ends up in logs or user-facing messages.
#[derive(Debug, Error)]
pub enum TourApiError {
    /// No service key was supplied to the client.
    #[error("TourAPI service key is not configured")]
    MissingServiceKey,

    /// The gateway rejected the service key (unregistered, expired, IP not allowed).
    #[error("TourAPI rejected the service key ({code}): {message}")]
    InvalidServiceKey { code: String, message: String },

    /// HTTP 429 or the gateway's request-quota result code.
    #[error("TourAPI rate limit exceeded ({code}): {message}")]
    RateLimited { code: String, message: String },

    /// Network, TLS, or timeout failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} from {operation}")]
    UnexpectedStatus { status: u16, operation: String },

    /// Empty body, non-JSON body, or an envelope missing required fields.
    #[error("malformed response for {context}: {reason}")]
    Malformed { context: String, reason: String },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// Envelope present but `resultCode` is not the success sentinel.
    #[error("TourAPI error {code}: {message}")]
    Api { code: String, message: String },

    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

impl TourApiError {
    /// `true` for failures caused by credentials or client setup; these fail
    /// every request identically and are never retried.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            TourApiError::MissingServiceKey
                | TourApiError::InvalidServiceKey { .. }
                | TourApiError::InvalidBaseUrl { .. }
        )
    }

    /// Short message suitable for showing upstream in place of the list.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            TourApiError::MissingServiceKey
            | TourApiError::InvalidServiceKey { .. }
            | TourApiError::InvalidBaseUrl { .. } => {
                "The tourism data service is not configured correctly.".to_string()
            }
            TourApiError::RateLimited { .. } => {
                "Too many requests to the tourism data service. Please try again later."
                    .to_string()
            }
            TourApiError::Http(_) | TourApiError::UnexpectedStatus { .. } => {
                "Could not reach the tourism data service. Check your connection and retry."
                    .to_string()
            }
            TourApiError::Malformed { .. } | TourApiError::Deserialize { .. } => {
                "The tourism data service returned an unreadable response.".to_string()
            }
            TourApiError::Api { message, .. } => {
                format!("The tourism data service reported an error: {message}")
            }
        }
    }
}
