// ── Core error types ──
//
// Four families: configuration errors (unknown command or service names,
// missing credentials), transport errors (non-success status, connection
// failures), decode errors (a response lacks a field the command needs),
// and pipeline errors (bad identifiers, malformed structures, local I/O).
// The `From<resttc_api::Error>` impl translates transport-layer errors.

use std::path::PathBuf;

use thiserror::Error;

use crate::command::CommandKind;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Configuration errors ─────────────────────────────────────────
    #[error("No Teamcenter command defined called: {name}")]
    UndefinedCommand { name: String },

    #[error("No Teamcenter service defined called: {name}")]
    UndefinedService { name: String },

    #[error("Service {service} has no operation called: {name}")]
    UndefinedOperation { service: String, name: String },

    #[error("Credentials unavailable for alias '{alias}': {message}")]
    Credentials { alias: String, message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Connection errors ────────────────────────────────────────────
    #[error("Not logged in -- call login() before sending commands")]
    NotLoggedIn,

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Cannot connect to server at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Request to server timed out")]
    Timeout,

    // ── Transport errors ─────────────────────────────────────────────
    #[error("Transport error: {message}")]
    Transport {
        message: String,
        /// HTTP status code (if the server answered at all).
        status: Option<u16>,
    },

    // ── Decode errors ────────────────────────────────────────────────
    #[error("Unexpected {command} response: {message}")]
    Decode {
        command: CommandKind,
        message: String,
    },

    // ── Pipeline errors ──────────────────────────────────────────────
    #[error("Invalid identifier '{identifier}': {reason}")]
    InvalidIdentifier { identifier: String, reason: String },

    #[error("Malformed structure: object {uid} is its own ancestor")]
    MalformedStructure { uid: String },

    #[error("Unsupported image source in {item}: {src}")]
    UnsupportedImageSource { item: String, src: String },

    #[error("Failed to rewrite HTML for {item}: {message}")]
    Html { item: String, message: String },

    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Operation failed: {message}")]
    OperationFailed { message: String },
}

impl CoreError {
    pub(crate) fn decode(command: CommandKind, message: impl Into<String>) -> Self {
        Self::Decode {
            command,
            message: message.into(),
        }
    }

    /// Returns `true` for configuration errors, which retrying cannot fix.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::UndefinedCommand { .. }
                | Self::UndefinedService { .. }
                | Self::UndefinedOperation { .. }
                | Self::Credentials { .. }
                | Self::Config { .. }
        )
    }

    /// Messages of this error and each `source()` beneath it, outermost first.
    pub fn chain(&self) -> Vec<String> {
        std::iter::successors(Some(self as &dyn std::error::Error), |e| e.source())
            .map(ToString::to_string)
            .collect()
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<resttc_api::Error> for CoreError {
    fn from(err: resttc_api::Error) -> Self {
        match err {
            resttc_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            resttc_api::Error::Decryption { message } => CoreError::AuthenticationFailed {
                message: format!("cannot open stored password: {message}"),
            },
            resttc_api::Error::SessionClosed => CoreError::NotLoggedIn,
            resttc_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Transport {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            resttc_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            resttc_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            resttc_api::Error::Status {
                status,
                url,
                message,
            } => CoreError::Transport {
                message: format!("HTTP {status} from {url}: {message}"),
                status: Some(status),
            },
            resttc_api::Error::Deserialization { message, body: _ } => CoreError::Transport {
                message: format!("response is not JSON: {message}"),
                status: None,
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn chain_walks_every_source() {
        let err = CoreError::Io {
            path: PathBuf::from("/tmp/specimages"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
        };
        assert_eq!(
            err.chain(),
            vec![
                "I/O error at /tmp/specimages: read-only".to_owned(),
                "read-only".to_owned(),
            ]
        );
    }

    #[test]
    fn chain_of_a_leaf_error_is_its_message() {
        assert_eq!(CoreError::NotLoggedIn.chain(), vec![CoreError::NotLoggedIn.to_string()]);
    }
}
