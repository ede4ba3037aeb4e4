use reqwest::StatusCode;
use thiserror::Error;

/// Failure talking to one of the external HTTP services.
///
/// Messages are built from the service name, status and a short reason only.
/// Request URLs are never included because the weather API carries its key
/// in the query string.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{service} request failed: {reason}")]
    Transport {
        service: &'static str,
        reason: String,
    },
    #[error("{service} returned HTTP {status}")]
    Status {
        service: &'static str,
        status: StatusCode,
    },
    #[error("{service} returned a malformed payload: {reason}")]
    Decode {
        service: &'static str,
        reason: String,
    },
    #[error("{service}: {message}")]
    Domain {
        service: &'static str,
        message: String,
    },
}

impl ApiError {
    /// Map a reqwest send error, dropping the URL it carries.
    pub fn transport(service: &'static str, err: reqwest::Error) -> Self {
        let reason = if err.is_timeout() {
            "timed out".to_string()
        } else if err.is_connect() {
            "connection failed".to_string()
        } else {
            err.without_url().to_string()
        };
        Self::Transport { service, reason }
    }

    pub fn decode(service: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Decode {
            service,
            reason: err.to_string(),
        }
    }

    pub fn domain(service: &'static str, message: impl Into<String>) -> Self {
        Self::Domain {
            service,
            message: message.into(),
        }
    }

    /// Whether another attempt could plausibly succeed.
    ///
    /// Network failures, timeouts, rate limits and 5xx responses are
    /// transient. Provider answers that say "no data" are not.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport { .. } => true,
            Self::Status { status, .. } => {
                status.is_server_error()
                    || *status == StatusCode::TOO_MANY_REQUESTS
                    || *status == StatusCode::REQUEST_TIMEOUT
            }
            Self::Decode { .. } | Self::Domain { .. } => false,
        }
    }
}

/// Failure dispatching a tool call requested by the model.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("unknown tool: {0}")]
    NotFound(String),
    #[error("invalid arguments for {tool}: {reason}")]
    InvalidArguments { tool: String, reason: String },
    #[error("{tool} failed: {source}")]
    Execution {
        tool: String,
        #[source]
        source: ApiError,
    },
}
