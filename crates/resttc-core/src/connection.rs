// ── Connection lifecycle ──
//
// One HTTP session against one alias, plus the credentials that open it.
// `handle` is the only path by which a command reaches the transport.
// Every sending method takes `&mut self`, so at most one request is in
// flight per connection.

use resttc_api::{Alias, Credentials, HttpSession, TransportConfig};
use tracing::{debug, info, warn};
use url::Url;

use crate::command::{Login, Logout, Reply, Request, TcCommand, envelope};
use crate::error::CoreError;
use crate::service::Endpoint;

// ── ConnectionState ──────────────────────────────────────────────────

/// Where a connection is in its login/logout cycle.
///
/// `Closed` behaves like `Unauthenticated`: the next `login()` opens a
/// fresh session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum ConnectionState {
    Unauthenticated,
    LoggingIn,
    Authenticated,
    LoggingOut,
    Closed,
}

// ── Connection ───────────────────────────────────────────────────────

pub struct Connection {
    alias: Alias,
    credentials: Credentials,
    transport: TransportConfig,
    session: Option<HttpSession>,
    state: ConnectionState,
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("alias", &self.alias.name())
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl Connection {
    /// A connection that has not logged in yet. No I/O happens here.
    pub fn new(alias: Alias, credentials: Credentials, transport: TransportConfig) -> Self {
        Self {
            alias,
            credentials,
            transport,
            session: None,
            state: ConnectionState::Unauthenticated,
        }
    }

    pub fn alias(&self) -> &Alias {
        &self.alias
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// `true` iff a login reply was received and no logout/close happened since.
    pub fn is_logged_in(&self) -> bool {
        self.state == ConnectionState::Authenticated
    }

    // ── Login / logout ───────────────────────────────────────────────

    /// Open a fresh session and log in. A no-op when already logged in.
    ///
    /// Primes the session with an unauthenticated GET of the web tier root
    /// so anti-forgery cookies are echoed as headers on the login POST.
    pub async fn login(&mut self) -> Result<(), CoreError> {
        if self.is_logged_in() {
            return Ok(());
        }

        self.state = ConnectionState::LoggingIn;
        match self.open_session().await {
            Ok(()) => {
                self.state = ConnectionState::Authenticated;
                info!(alias = self.alias.name(), "logged in");
                Ok(())
            }
            Err(e) => {
                self.session = None;
                self.state = ConnectionState::Unauthenticated;
                Err(match e {
                    CoreError::Transport {
                        status: Some(401 | 403),
                        message,
                    } => CoreError::AuthenticationFailed { message },
                    other => other,
                })
            }
        }
    }

    async fn open_session(&mut self) -> Result<(), CoreError> {
        let mut session = HttpSession::open(&self.transport)?;
        session.harvest_anti_forgery(&self.alias.base_url()).await?;
        self.session = Some(session);

        let login = Login::new(self.credentials.clone());
        self.handle(&login).await?;
        debug!(user = self.credentials.username(), "session authentication successful");
        Ok(())
    }

    /// Log in unless already logged in.
    pub async fn ensure_logged_in(&mut self) -> Result<(), CoreError> {
        self.login().await
    }

    /// Send `Logout`, then close whatever its outcome.
    pub async fn logout(&mut self) -> Result<(), CoreError> {
        if self.session.is_none() {
            self.close();
            return Ok(());
        }

        self.state = ConnectionState::LoggingOut;
        let result = self.handle(&Logout).await;
        self.close();
        result.map(|_| ())
    }

    /// Drop the session and its cookies. Safe to call repeatedly.
    pub fn close(&mut self) {
        if self.session.take().is_some() {
            debug!(alias = self.alias.name(), "session closed");
        }
        if self.state != ConnectionState::Unauthenticated {
            self.state = ConnectionState::Closed;
        }
    }

    // ── Dispatch ─────────────────────────────────────────────────────

    /// Send a command through the service operation registered for its kind
    /// and decode the reply.
    pub async fn handle<C: TcCommand>(&mut self, command: &C) -> Result<C::Output, CoreError> {
        let kind = C::KIND;
        let operation = kind.operation();
        let request = command.request()?;

        let reply = match (operation.endpoint(), request) {
            (Endpoint::Json(path), Request::Json(body)) => {
                let url = self.alias.url(path);
                debug!(command = %kind, %operation, %url, "dispatching");
                Reply::Json(self.post(&url, &body).await?)
            }
            (Endpoint::FileService, Request::Download(source)) => {
                let url = self.file_url(&source)?;
                debug!(command = %kind, %operation, %url, "dispatching");
                Reply::Bytes(self.session()?.get_bytes(&url).await?)
            }
            (endpoint, _) => {
                return Err(CoreError::OperationFailed {
                    message: format!(
                        "{kind} cannot be sent through {operation} ({endpoint:?})"
                    ),
                });
            }
        };

        command.decode(reply).await
    }

    fn session(&self) -> Result<&HttpSession, CoreError> {
        self.session.as_ref().ok_or(CoreError::NotLoggedIn)
    }

    async fn post(&self, url: &str, body: &serde_json::Value) -> Result<serde_json::Value, CoreError> {
        Ok(self.session()?.post_json(url, &envelope(body.clone())).await?)
    }

    /// Resolve a file service link (absolute or server-relative).
    pub fn file_url(&self, source: &str) -> Result<Url, CoreError> {
        let root = Url::parse(&self.alias.fms_url()).map_err(resttc_api::Error::from)?;
        Ok(root.join(source).map_err(resttc_api::Error::from)?)
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        if self.is_logged_in() {
            warn!(
                alias = self.alias.name(),
                "connection dropped while logged in; closing without logout"
            );
        }
        self.close();
    }
}
