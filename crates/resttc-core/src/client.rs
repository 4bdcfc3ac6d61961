// ── Requirements client ──
//
// The entry point for requirement-tool glue. Owns one lazily created
// connection (logged in at most once until reset), the saved query cache,
// the HTML cache and the image root. Everything is passed in explicitly;
// there is no process-wide state.

use std::path::{Path, PathBuf};

use resttc_api::{Alias, AliasBook, Credentials, TransportConfig};
use tracing::{debug, warn};
use url::Url;

use crate::cache::{HTML_UNAVAILABLE, HtmlTextCache, SavedQueryCache};
use crate::command::{ExecuteSavedQuery, GetItemFromId, LoadObjects, TcCommand};
use crate::connection::Connection;
use crate::error::CoreError;
use crate::html;
use crate::model::{ItemRevisionId, ModelObject, SpecContents, Specification, display_name};
use crate::pipeline::{self, BacklinkOutcome, BacklinkRequest};

// ── CredentialProvider ───────────────────────────────────────────────

/// Supplies the credentials for an alias when a connection is created.
pub trait CredentialProvider {
    fn credentials(&self, alias: &str) -> Result<Credentials, CoreError>;
}

/// Fixed credentials, whatever the alias.
impl CredentialProvider for Credentials {
    fn credentials(&self, _alias: &str) -> Result<Credentials, CoreError> {
        Ok(self.clone())
    }
}

// ── RequirementsClient ───────────────────────────────────────────────

pub struct RequirementsClient {
    aliases: AliasBook,
    alias_name: String,
    credentials: Box<dyn CredentialProvider + Send + Sync>,
    transport: TransportConfig,
    image_root: PathBuf,
    connection: Option<Connection>,
    saved_queries: SavedQueryCache,
    html: HtmlTextCache,
}

impl std::fmt::Debug for RequirementsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequirementsClient")
            .field("alias", &self.alias_name)
            .field("image_root", &self.image_root)
            .field("connection", &self.connection)
            .finish_non_exhaustive()
    }
}

impl RequirementsClient {
    pub fn new(
        aliases: AliasBook,
        alias_name: impl Into<String>,
        credentials: impl CredentialProvider + Send + Sync + 'static,
    ) -> Self {
        Self {
            aliases,
            alias_name: alias_name.into(),
            credentials: Box::new(credentials),
            transport: TransportConfig::default(),
            image_root: std::env::temp_dir().join("RMI").join("TEAMCENTER"),
            connection: None,
            saved_queries: SavedQueryCache::new(),
            html: HtmlTextCache::new(),
        }
    }

    pub fn with_transport(mut self, transport: TransportConfig) -> Self {
        self.transport = transport;
        self
    }

    /// Where downloaded images are written (under `specimages/`).
    pub fn with_image_root(mut self, image_root: impl Into<PathBuf>) -> Self {
        self.image_root = image_root.into();
        self
    }

    pub fn image_root(&self) -> &Path {
        &self.image_root
    }

    pub fn html_cache(&self) -> &HtmlTextCache {
        &self.html
    }

    // ── Connection management ────────────────────────────────────────

    /// Alias for the next connection created. An existing connection keeps
    /// the alias it was created with.
    pub fn set_alias(&mut self, name: impl Into<String>) {
        self.alias_name = name.into();
    }

    pub fn alias_name(&self) -> &str {
        &self.alias_name
    }

    /// The alias the next connection would use.
    pub fn alias(&self) -> Alias {
        self.aliases.get(&self.alias_name)
    }

    /// The logged-in connection, created and logged in on first use.
    pub async fn connection(&mut self) -> Result<&mut Connection, CoreError> {
        self.connect().await?;
        self.connection.as_mut().ok_or(CoreError::NotLoggedIn)
    }

    async fn connect(&mut self) -> Result<(), CoreError> {
        if self.connection.is_none() {
            let alias = self.alias();
            debug!(alias = alias.name(), url = %alias.base_url(), "creating connection");
            let credentials = self.credentials.credentials(alias.name())?;
            self.connection = Some(Connection::new(alias, credentials, self.transport.clone()));
        }
        if let Some(conn) = self.connection.as_mut() {
            conn.ensure_logged_in().await?;
        }
        Ok(())
    }

    /// Log out; the next call logs in again on the same connection.
    pub async fn reset_connection(&mut self) -> Result<(), CoreError> {
        match self.connection.as_mut() {
            Some(conn) => conn.logout().await,
            None => Ok(()),
        }
    }

    /// Best-effort logout for shutdown paths.
    pub async fn shutdown(&mut self) {
        if let Some(conn) = self.connection.as_mut() {
            if conn.is_logged_in() {
                if let Err(e) = conn.logout().await {
                    warn!(error = %e, "logout failed (non-fatal)");
                }
            }
        }
    }

    // ── Lookups ──────────────────────────────────────────────────────

    /// Specification header from an Active Workspace show-object URL
    /// (`...#/...showObject?uid=<uid>`).
    pub async fn get_spec(&mut self, show_object_url: &str) -> Result<Specification, CoreError> {
        let uid = uid_from_show_object_url(show_object_url)?;
        let conn = self.connection().await?;
        let spec = LoadObjects::new(vec![uid.clone()])
            .send(conn)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| CoreError::OperationFailed {
                message: format!("object {uid} not found"),
            })?;

        let object_string = spec.object_string().unwrap_or_default();
        let id = ItemRevisionId::from_object_string(object_string);
        Ok(Specification {
            name: display_name(object_string).to_owned(),
            description: spec.ui_value("object_desc").unwrap_or_default().to_owned(),
            uid,
            item_id: id.item_id,
            revision: id.revision,
        })
    }

    /// Display name (`object_string`) of `location`, or of `doc` when
    /// `location` is empty.
    pub async fn get_summary(&mut self, doc: &str, location: &str) -> Result<String, CoreError> {
        let id = ItemRevisionId::parse(pick(doc, location))?;
        let revision = self.item_revision(&id).await?;
        Ok(revision.object_string().unwrap_or_default().to_owned())
    }

    /// Cached HTML of `location` (or `doc`). A miss yields the sentinel,
    /// and so does an identifier that does not parse.
    pub fn get_viewable_html(&self, doc: &str, location: &str) -> String {
        match ItemRevisionId::parse(pick(doc, location)) {
            Ok(id) => self.html.html(&id),
            Err(_) => HTML_UNAVAILABLE.to_owned(),
        }
    }

    /// Visible text of the cached HTML of `location` (or `doc`).
    pub fn get_viewable_text(&self, doc: &str, location: &str) -> String {
        match ItemRevisionId::parse(pick(doc, location)) {
            Ok(id) => self.html.text(&id),
            Err(_) => html::to_text(HTML_UNAVAILABLE),
        }
    }

    /// Active Workspace link that opens `document`.
    pub async fn get_url(&mut self, document: &str) -> Result<String, CoreError> {
        let id = ItemRevisionId::parse(document)?;
        let revision = self.item_revision(&id).await?;
        let conn = self.connection().await?;
        Ok(conn.alias().show_object_url(&revision.uid))
    }

    async fn item_revision(&mut self, id: &ItemRevisionId) -> Result<ModelObject, CoreError> {
        let conn = self.connection().await?;
        GetItemFromId::new(&id.item_id, &id.revision)
            .send(conn)
            .await
    }

    // ── Workflows ────────────────────────────────────────────────────

    /// Labels, depths and locations of a specification's contents; caches
    /// the HTML of every entry.
    pub async fn get_contents(&mut self, spec_identifier: &str) -> Result<SpecContents, CoreError> {
        let spec = ItemRevisionId::parse(spec_identifier)?;
        self.connect().await?;
        let conn = self.connection.as_mut().ok_or(CoreError::NotLoggedIn)?;
        pipeline::get_contents(conn, &mut self.html, &self.image_root, &spec).await
    }

    /// Link a model to a requirement, creating nothing if a backlink with
    /// the same label exists.
    pub async fn insert_backlinks(
        &mut self,
        requirement: &str,
        model_path: &str,
        label: &str,
        nav_command: &str,
    ) -> Result<BacklinkOutcome, CoreError> {
        let request = BacklinkRequest {
            requirement: ItemRevisionId::parse(requirement)?,
            model_path: model_path.to_owned(),
            label: label.to_owned(),
            nav_command: nav_command.to_owned(),
        };
        self.connect().await?;
        let conn = self.connection.as_mut().ok_or(CoreError::NotLoggedIn)?;
        pipeline::insert_backlink(conn, &mut self.saved_queries, &request).await
    }

    /// Run a saved query by name.
    pub async fn run_saved_query(
        &mut self,
        name: &str,
        entries: Vec<String>,
        values: Vec<String>,
        limit: u32,
    ) -> Result<Vec<ModelObject>, CoreError> {
        self.connect().await?;
        let conn = self.connection.as_mut().ok_or(CoreError::NotLoggedIn)?;
        let query = self.saved_queries.find(conn, name).await?;
        ExecuteSavedQuery::new(query, entries, values, limit)
            .send(conn)
            .await
    }
}

fn pick<'a>(doc: &'a str, location: &'a str) -> &'a str {
    if location.trim().is_empty() { doc } else { location }
}

/// The `uid` query parameter inside the URL fragment.
fn uid_from_show_object_url(show_object_url: &str) -> Result<String, CoreError> {
    let invalid = |reason: &str| CoreError::InvalidIdentifier {
        identifier: show_object_url.to_owned(),
        reason: reason.to_owned(),
    };

    let url = Url::parse(show_object_url).map_err(|e| invalid(&e.to_string()))?;
    let fragment = url.fragment().ok_or_else(|| invalid("URL has no fragment"))?;
    let (_, query) = fragment
        .split_once('?')
        .ok_or_else(|| invalid("fragment has no query"))?;

    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == "uid")
        .map(|(_, uid)| uid.into_owned())
        .ok_or_else(|| invalid("no uid parameter"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;

    use super::*;

    fn offline_client() -> RequirementsClient {
        let creds = Credentials::seal("ed", &SecretString::from("pw".to_string())).unwrap();
        RequirementsClient::new(AliasBook::default(), "X", creds)
    }

    #[test]
    fn unparsable_identifier_reads_as_a_miss() {
        let client = offline_client();
        assert_eq!(client.get_viewable_html("SPEC001", ""), HTML_UNAVAILABLE);
        assert_eq!(client.get_viewable_text("DOC_A", "REQ010"), "Failed to Get HTML!");
    }

    #[test]
    fn uncached_identifier_reads_as_a_miss() {
        let client = offline_client();
        assert_eq!(client.get_viewable_html("SPEC-001_A", "REQ-010_A"), HTML_UNAVAILABLE);
    }

    #[test]
    fn uid_is_read_from_fragment_query() {
        let url = "http://awc/#/com.siemens.splm.clientfx.tcui.xrt.showObject?uid=RzmFnsGGpFYgSC&page=Overview";
        assert_eq!(uid_from_show_object_url(url).unwrap(), "RzmFnsGGpFYgSC");
    }

    #[test]
    fn url_without_uid_is_rejected() {
        for url in [
            "http://awc/",
            "http://awc/#/showObject",
            "http://awc/#/showObject?page=x",
            "not a url",
        ] {
            assert!(
                matches!(
                    uid_from_show_object_url(url),
                    Err(CoreError::InvalidIdentifier { .. })
                ),
                "{url}"
            );
        }
    }

    #[test]
    fn empty_location_falls_back_to_document() {
        assert_eq!(pick("SPEC-1_A", ""), "SPEC-1_A");
        assert_eq!(pick("SPEC-1_A", "REQ-1_A"), "REQ-1_A");
    }
}
