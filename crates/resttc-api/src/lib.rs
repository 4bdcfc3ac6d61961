// resttc-api: Async transport for Teamcenter JSON/REST services

pub mod alias;
pub mod auth;
pub mod error;
pub mod session;
pub mod transport;

pub use alias::{Alias, AliasBook, DEFAULT_ALIAS};
pub use auth::Credentials;
pub use error::Error;
pub use session::HttpSession;
pub use transport::{TlsMode, TransportConfig};
