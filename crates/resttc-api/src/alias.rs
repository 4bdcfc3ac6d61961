// Server aliases
//
// An alias is a named connection profile: where the web tier lives, where
// the file service (FMS) listens, and under which path the JSON/REST
// services are mounted. URL construction is a pure function of the fields.

use std::collections::BTreeMap;

use serde::Serialize;

/// Name of the alias used when nothing else is configured.
pub const DEFAULT_ALIAS: &str = "DEFAULT";

const DEFAULT_SCHEME: &str = "http";
const DEFAULT_HOST: &str = "localhost";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_FMS_PORT: u16 = 4544;
const DEFAULT_BASE_PATH: &str = "/tc/JsonRestServices/";

/// A named server profile.
///
/// Path components are normalized on the way in:
/// - `app_path` is empty, or starts with `/` and has no trailing `/`
/// - `base_path` starts and ends with `/`
///
/// so `base_url()` and `url()` never produce doubled or missing slashes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Alias {
    name: String,
    scheme: String,
    host: String,
    port: u16,
    fms_port: u16,
    app_path: String,
    base_path: String,
}

impl Default for Alias {
    fn default() -> Self {
        Self::new(DEFAULT_ALIAS)
    }
}

impl Alias {
    /// A default-valued alias carrying the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            scheme: DEFAULT_SCHEME.into(),
            host: DEFAULT_HOST.into(),
            port: DEFAULT_PORT,
            fms_port: DEFAULT_FMS_PORT,
            app_path: String::new(),
            base_path: DEFAULT_BASE_PATH.into(),
        }
    }

    // ── Builders ─────────────────────────────────────────────────────

    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into().trim().trim_end_matches("://").to_ascii_lowercase();
        self
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into().trim().trim_end_matches('/').to_owned();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_fms_port(mut self, fms_port: u16) -> Self {
        self.fms_port = fms_port;
        self
    }

    pub fn with_app_path(mut self, app_path: &str) -> Self {
        self.app_path = normalize_app_path(app_path);
        self
    }

    pub fn with_base_path(mut self, base_path: &str) -> Self {
        self.base_path = normalize_base_path(base_path);
        self
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn fms_port(&self) -> u16 {
        self.fms_port
    }

    pub fn app_path(&self) -> &str {
        &self.app_path
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    // ── URL construction ─────────────────────────────────────────────

    /// Web tier root: `scheme://host[:port]{app_path}`.
    ///
    /// The port is omitted when it is the scheme's default.
    pub fn base_url(&self) -> String {
        let default_port = match self.scheme.as_str() {
            "http" => Some(80),
            "https" => Some(443),
            _ => None,
        };
        if default_port == Some(self.port) {
            format!("{}://{}{}", self.scheme, self.host, self.app_path)
        } else {
            format!(
                "{}://{}:{}{}",
                self.scheme, self.host, self.port, self.app_path
            )
        }
    }

    /// Full URL of a service endpoint, e.g. `Core-2011-06-Session/login`.
    pub fn url(&self, endpoint: &str) -> String {
        format!(
            "{}{}{}",
            self.base_url(),
            self.base_path,
            endpoint.trim_start_matches('/')
        )
    }

    /// File service root: `scheme://host:fms_port`.
    pub fn fms_url(&self) -> String {
        format!("{}://{}:{}", self.scheme, self.host, self.fms_port)
    }

    /// Download prefix the server embeds in exported HTML image links.
    pub fn fms_download_url(&self) -> String {
        format!("{}/fms/fmsdownload/", self.fms_url())
    }

    /// Active Workspace deep link that opens the object with `uid`.
    pub fn show_object_url(&self, uid: &str) -> String {
        format!(
            "{}/#/com.siemens.splm.clientfx.tcui.xrt.showObject?uid={uid}",
            self.base_url()
        )
    }
}

fn normalize_app_path(path: &str) -> String {
    let trimmed = path.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}

fn normalize_base_path(path: &str) -> String {
    let trimmed = path.trim().trim_matches('/');
    if trimmed.is_empty() {
        "/".into()
    } else {
        format!("/{trimmed}/")
    }
}

// ── AliasBook ────────────────────────────────────────────────────────

/// All configured aliases, looked up by name.
///
/// Lookups never fail: an unknown name yields a default-valued alias
/// that carries the requested name.
#[derive(Debug, Clone, Default)]
pub struct AliasBook {
    aliases: BTreeMap<String, Alias>,
}

impl AliasBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an alias under its own name, replacing any previous entry.
    pub fn insert(&mut self, alias: Alias) {
        self.aliases.insert(alias.name.clone(), alias);
    }

    pub fn get(&self, name: &str) -> Alias {
        self.aliases
            .get(name)
            .cloned()
            .unwrap_or_else(|| Alias::new(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.aliases.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Alias> {
        self.aliases.values()
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}

impl FromIterator<Alias> for AliasBook {
    fn from_iter<I: IntoIterator<Item = Alias>>(iter: I) -> Self {
        let mut book = Self::new();
        for alias in iter {
            book.insert(alias);
        }
        book
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_alias_urls() {
        let alias = Alias::default();
        assert_eq!(alias.base_url(), "http://localhost:3000");
        assert_eq!(
            alias.url("Core-2011-06-Session/login"),
            "http://localhost:3000/tc/JsonRestServices/Core-2011-06-Session/login"
        );
        assert_eq!(alias.fms_url(), "http://localhost:4544");
        assert_eq!(
            alias.fms_download_url(),
            "http://localhost:4544/fms/fmsdownload/"
        );
    }

    #[test]
    fn default_port_is_omitted() {
        let alias = Alias::new("AWC")
            .with_host("awc")
            .with_port(80)
            .with_app_path("/62/wd141/aw");
        assert_eq!(alias.base_url(), "http://awc/62/wd141/aw");
        assert_eq!(
            alias.url("foo"),
            "http://awc/62/wd141/aw/tc/JsonRestServices/foo"
        );

        let tls = Alias::new("TLS").with_scheme("https").with_port(443);
        assert_eq!(tls.base_url(), "https://localhost");
    }

    #[test]
    fn path_components_are_normalized() {
        for app in ["aw", "/aw", "aw/", "/aw/"] {
            let alias = Alias::default().with_app_path(app);
            assert_eq!(alias.app_path(), "/aw", "app_path {app:?}");
        }
        assert_eq!(Alias::default().with_app_path("/").app_path(), "");

        for base in ["tc/rest", "/tc/rest", "tc/rest/", "/tc/rest/"] {
            let alias = Alias::default().with_base_path(base);
            assert_eq!(alias.base_path(), "/tc/rest/", "base_path {base:?}");
        }

        let alias = Alias::default()
            .with_app_path("aw/")
            .with_base_path("tc/rest");
        assert_eq!(alias.url("/x"), "http://localhost:3000/aw/tc/rest/x");
    }

    #[test]
    fn missing_alias_yields_default_with_name() {
        let book: AliasBook = [Alias::new("DEV 1").with_host("dev1.example.com")]
            .into_iter()
            .collect();

        assert_eq!(book.get("DEV 1").host(), "dev1.example.com");

        let missing = book.get("NOPE");
        assert_eq!(missing.name(), "NOPE");
        assert_eq!(missing.host(), "localhost");
        assert!(!book.contains("NOPE"));
    }

    #[test]
    fn show_object_link() {
        let alias = Alias::new("A").with_host("awc").with_port(80);
        assert_eq!(
            alias.show_object_url("RzmFnsGGpFYgSC"),
            "http://awc/#/com.siemens.splm.clientfx.tcui.xrt.showObject?uid=RzmFnsGGpFYgSC"
        );
    }
}
