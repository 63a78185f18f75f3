use std::time::Duration;

use alloy_primitives::hex::FromHexError;
use reqwest::StatusCode;

/// Failure talking to the beacon node.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Reqwest error: {0}")]
    ReqwestError(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("request body serialization error: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("unexpected status {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("request timed out after {0:?}")]
    Timeout(Duration),
}

impl TransportError {
    /// Connection failures, timeouts and 5xx responses may succeed on a later attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            TransportError::ReqwestError(err) => {
                err.is_connect() || err.is_timeout() || err.is_request()
            }
            TransportError::Status { status, .. } => status.is_server_error(),
            TransportError::Timeout(_) => true,
            TransportError::UrlError(_) | TransportError::Encode(_) => false,
        }
    }
}

/// The node answered, but not in the shape the dialect promises.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("JSON deserialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid hex in `{field}`: {source}")]
    Hex { field: &'static str, source: FromHexError },

    #[error("`{field}` is {actual} bytes, expected {expected}")]
    Length { field: &'static str, expected: usize, actual: usize },

    #[error("`{field}` is not an unsigned decimal integer: {value:?}")]
    Integer { field: &'static str, value: String },

    #[error("missing `{0}` in response")]
    MissingField(&'static str),

    #[error("`{field}` is invalid: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Debug, thiserror::Error)]
pub enum BeaconClientError {
    #[error("error retrieving {query}: {source}")]
    Transport { query: &'static str, source: TransportError },

    #[error("error decoding {query}: {source}")]
    Decode { query: &'static str, source: DecodeError },

    #[error("{query} timed out after {after:?}")]
    Timeout { query: &'static str, after: Duration },

    #[error("sub-query task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("invalid validator public key {pubkey:?}: {reason}")]
    InvalidPubkey { pubkey: String, reason: String },

    #[error("invalid beacon client config: {0}")]
    Config(String),
}

impl BeaconClientError {
    /// Wraps a transport failure, lifting timeouts into their own kind.
    pub fn transport(query: &'static str, source: TransportError) -> Self {
        match source {
            TransportError::Timeout(after) => BeaconClientError::Timeout { query, after },
            source => BeaconClientError::Transport { query, source },
        }
    }

    pub fn decode(query: &'static str, source: impl Into<DecodeError>) -> Self {
        BeaconClientError::Decode { query, source: source.into() }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, BeaconClientError::Transport { .. })
    }

    pub fn is_decode(&self) -> bool {
        matches!(self, BeaconClientError::Decode { .. })
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, BeaconClientError::Timeout { .. })
    }

    /// Name of the sub-query that produced this error, if any.
    pub fn query(&self) -> Option<&'static str> {
        match self {
            BeaconClientError::Transport { query, .. } |
            BeaconClientError::Decode { query, .. } |
            BeaconClientError::Timeout { query, .. } => Some(query),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_timeout_becomes_timeout_kind() {
        let err = BeaconClientError::transport(
            "beacon head",
            TransportError::Timeout(Duration::from_millis(10)),
        );
        assert!(err.is_timeout());
        assert_eq!(err.query(), Some("beacon head"));
    }

    #[test]
    fn test_error_message_names_query_and_field() {
        let err = BeaconClientError::decode(
            "eth2 config",
            DecodeError::Integer { field: "slots_per_epoch", value: "abc".to_string() },
        );
        let message = err.to_string();
        assert!(message.starts_with("error decoding eth2 config"));
        assert!(message.contains("slots_per_epoch"));
    }

    #[test]
    fn test_retryable_status() {
        let server_error =
            TransportError::Status { status: StatusCode::BAD_GATEWAY, body: String::new() };
        let client_error =
            TransportError::Status { status: StatusCode::NOT_FOUND, body: String::new() };
        assert!(server_error.is_retryable());
        assert!(!client_error.is_retryable());
    }
}
