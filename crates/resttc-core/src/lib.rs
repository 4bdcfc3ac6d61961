//! Command dispatch, connection lifecycle and requirement workflows for
//! Teamcenter JSON/REST services.
//!
//! - **Commands** ([`command`]): one type per remote operation implementing
//!   [`TcCommand`]: it renders its request and decodes the reply. Commands
//!   are built with their parameters, so an unconfigured command cannot be
//!   sent.
//!
//! - **Registry** ([`service`]): services, their operations and endpoints,
//!   and the exhaustive [`CommandKind::operation`] dispatch table.
//!
//! - **[`Connection`]**: one cookie-backed session per alias with explicit
//!   login/logout states. [`Connection::handle`] is the only way a command
//!   reaches the transport.
//!
//! - **Caches** ([`cache`]): saved query descriptors and rewritten HTML,
//!   explicit objects with no eviction.
//!
//! - **Workflows** ([`pipeline`]): specification contents (structure walk
//!   plus HTML caching) and idempotent backlink creation.
//!
//! - **[`RequirementsClient`]**: the facade tying it together.

pub mod cache;
pub mod client;
pub mod command;
pub mod connection;
pub mod error;
pub mod html;
pub mod model;
pub mod pipeline;
pub mod service;

// ── Primary re-exports ──────────────────────────────────────────────
pub use cache::{HTML_UNAVAILABLE, HtmlTextCache, SavedQueryCache};
pub use client::{CredentialProvider, RequirementsClient};
pub use command::{CommandKind, Reply, Request, TcCommand, resolve_command};
pub use connection::{Connection, ConnectionState};
pub use error::CoreError;
pub use model::{ItemRevisionId, ModelObject, SpecContents, Specification};
pub use pipeline::{BacklinkOutcome, BacklinkRequest};
pub use service::{Endpoint, Service, ServiceOperation, resolve_service};

// Transport types callers need to build a client.
pub use resttc_api::{Alias, AliasBook, Credentials, DEFAULT_ALIAS, TlsMode, TransportConfig};
