//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use resttc_config::ConfigError;
use resttc_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to Teamcenter at {url}")]
    #[diagnostic(
        code(resttc::connection_failed),
        help(
            "Check that the web tier is running and reachable.\n\
             Reason: {reason}\n\
             Self-signed certificate? Try --insecure (-k)."
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("Request timed out")]
    #[diagnostic(
        code(resttc::timeout),
        help("Increase the timeout with --timeout or check server responsiveness.")
    )]
    Timeout,

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(resttc::auth_failed),
        help(
            "The stored password may be out of date.\n\
             Run: resttc credential create --alias {alias}"
        )
    )]
    AuthFailed { alias: String, message: String },

    #[error("No credentials for alias '{alias}'")]
    #[diagnostic(
        code(resttc::no_credentials),
        help(
            "{message}\n\
             Create them with: resttc credential create --alias {alias}"
        )
    )]
    NoCredentials { alias: String, message: String },

    // ── Lookups ──────────────────────────────────────────────────────
    #[error("{message}")]
    #[diagnostic(code(resttc::not_found))]
    NotFound { message: String },

    #[error("Invalid identifier '{identifier}': {reason}")]
    #[diagnostic(
        code(resttc::invalid_identifier),
        help("Identifiers look like ITEMID_REV, e.g. SPEC-001_A")
    )]
    InvalidIdentifier { identifier: String, reason: String },

    // ── Server ───────────────────────────────────────────────────────
    #[error("Server error: {message}")]
    #[diagnostic(code(resttc::server))]
    Server { message: String, status: Option<u16> },

    #[error("Unexpected {command} response: {message}")]
    #[diagnostic(
        code(resttc::decode),
        help("Re-run with -vv to log the exchanged requests.")
    )]
    Decode { command: String, message: String },

    #[error("{message}")]
    #[diagnostic(code(resttc::pipeline))]
    Pipeline { message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(resttc::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Configuration file not found")]
    #[diagnostic(
        code(resttc::no_config),
        help("Expected at: {path}\nAliases live in [aliases.NAME] tables.")
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(resttc::config))]
    Config(Box<figment::Error>),

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render output: {0}")]
    #[diagnostic(code(resttc::render))]
    Render(String),
}

impl From<figment::Error> for CliError {
    fn from(err: figment::Error) -> Self {
        Self::Config(Box::new(err))
    }
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. }
            | Self::NoCredentials { .. }
            | Self::Server {
                status: Some(401 | 403),
                ..
            } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Timeout => exit_code::TIMEOUT,
            Self::Validation { .. } | Self::InvalidIdentifier { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }

    /// Name the alias in authentication help text.
    pub fn for_alias(self, name: &str) -> Self {
        match self {
            Self::AuthFailed { message, .. } => Self::AuthFailed {
                alias: name.to_owned(),
                message,
            },
            other => other,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => CliError::ConnectionFailed { url, reason },
            CoreError::Timeout => CliError::Timeout,

            CoreError::AuthenticationFailed { message } => CliError::AuthFailed {
                alias: "<alias>".into(),
                message,
            },
            CoreError::Credentials { alias, message } => CliError::NoCredentials { alias, message },

            CoreError::InvalidIdentifier { identifier, reason } => {
                CliError::InvalidIdentifier { identifier, reason }
            }

            CoreError::Transport {
                message,
                status: Some(404),
            } => CliError::NotFound { message },
            CoreError::Transport { message, status } => CliError::Server { message, status },

            CoreError::Decode { command, message } => CliError::Decode {
                command: command.to_string(),
                message,
            },

            CoreError::Io { path, source } => CliError::Io(std::io::Error::new(
                source.kind(),
                format!("{}: {source}", path.display()),
            )),

            CoreError::OperationFailed { ref message } if message.contains("not found") => {
                CliError::NotFound {
                    message: err.to_string(),
                }
            }

            other @ (CoreError::UndefinedCommand { .. }
            | CoreError::UndefinedService { .. }
            | CoreError::UndefinedOperation { .. }
            | CoreError::Config { .. }) => CliError::Validation {
                field: "configuration".into(),
                reason: other.to_string(),
            },

            other => CliError::Pipeline {
                message: other.to_string(),
            },
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::MissingKeyFile { ref alias, .. }
            | ConfigError::MissingCredentialFile { ref alias, .. } => CliError::NoCredentials {
                alias: alias.clone(),
                message: err.to_string(),
            },
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::Figment(e) => CliError::Config(e),
            ConfigError::Io { path, source } => CliError::Io(std::io::Error::new(
                source.kind(),
                format!("{}: {source}", path.display()),
            )),
            other => CliError::Pipeline {
                message: other.to_string(),
            },
        }
    }
}
