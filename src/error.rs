use thiserror::Error;

/// A failed search as shown to the user. Produced only by the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    /// 403 from the provider, treated as quota exhaustion.
    #[error(
        "GitHub Search API rate limit reached.{} Add a personal access token to raise the limit.",
        reset_suffix(.reset_at)
    )]
    RateLimited {
        /// Rendered reset time, present only when the quota is known to be spent.
        reset_at: Option<String>,
    },

    #[error("Token is invalid or lacks the required permissions (401). Check or clear the saved token.")]
    Unauthorized,

    #[error("GitHub rejected the query (422). Try simplifying the search term or filters.")]
    InvalidQuery,

    #[error("Error {status}: {status_text}")]
    Http { status: u16, status_text: String },

    #[error("Network error: {0}")]
    Transport(String),

    #[error("Unexpected response from GitHub: {0}")]
    Decode(String),
}

fn reset_suffix(reset_at: &Option<String>) -> String {
    match reset_at {
        Some(at) => format!(" Resets at {}.", at),
        None => String::new(),
    }
}

impl SearchError {
    /// HTTP status associated with the failure, if a response was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            SearchError::RateLimited { .. } => Some(403),
            SearchError::Unauthorized => Some(401),
            SearchError::InvalidQuery => Some(422),
            SearchError::Http { status, .. } => Some(*status),
            SearchError::Transport(_) | SearchError::Decode(_) => None,
        }
    }

    pub fn is_rate_limit(&self) -> bool {
        matches!(self, SearchError::RateLimited { .. })
    }
}

/// Failure to obtain any HTTP response.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Superseded by a newer request or torn down. Never shown to the user.
    #[error("request cancelled")]
    Cancelled,

    #[error("request failed: {0}")]
    Request(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        TransportError::Request(err.to_string())
    }
}

/// Persistent client storage failure. Logged and swallowed by the stores.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage contents are not valid JSON: {0}")]
    Corrupt(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limit_message_includes_reset_time_when_known() {
        let err = SearchError::RateLimited {
            reset_at: Some("14:05:00 UTC".to_string()),
        };
        let msg = err.to_string();
        assert!(msg.contains("rate limit reached"));
        assert!(msg.contains("Resets at 14:05:00 UTC."));
        assert!(msg.contains("personal access token"));
        assert_eq!(err.status(), Some(403));
        assert!(err.is_rate_limit());

        let err = SearchError::RateLimited { reset_at: None };
        assert!(!err.to_string().contains("Resets at"));
    }

    #[test]
    fn generic_http_message_names_status_and_text() {
        let err = SearchError::Http {
            status: 503,
            status_text: "Service Unavailable".to_string(),
        };
        assert_eq!(err.to_string(), "Error 503: Service Unavailable");
        assert_eq!(err.status(), Some(503));
        assert!(!err.is_rate_limit());
    }

    #[test]
    fn distinct_messages_per_kind() {
        let unauthorized = SearchError::Unauthorized.to_string();
        let invalid = SearchError::InvalidQuery.to_string();
        assert_ne!(unauthorized, invalid);
        assert!(invalid.contains("simplifying"));
        assert_eq!(SearchError::Transport("reset".into()).status(), None);
    }
}
