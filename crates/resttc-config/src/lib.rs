//! Shared configuration for the resttc tools.
//!
//! TOML alias profiles (figment, with `RESTTC_` environment overrides),
//! per-alias credential files, and the platform paths everything lives
//! under. The CLI layers its global flags on top.

mod credentials;

pub use credentials::{CredentialFile, CredentialStore, NO_EXPIRY};

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use resttc_api::{Alias, AliasBook, DEFAULT_ALIAS, TlsMode, TransportConfig};

/// File name of the alias configuration inside the config directory.
pub const CONFIG_FILE: &str = "aliases.toml";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("key file {} does not exist for alias '{alias}'", path.display())]
    MissingKeyFile { alias: String, path: PathBuf },

    #[error("credential file {} does not exist for alias '{alias}'", path.display())]
    MissingCredentialFile { alias: String, path: PathBuf },

    #[error("credential file {} has no {field} line", path.display())]
    IncompleteCredentialFile { path: PathBuf, field: &'static str },

    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to seal password: {0}")]
    Seal(#[from] resttc_api::Error),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

pub(crate) fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> ConfigError + '_ {
    move |source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level contents of `aliases.toml`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Alias used when none is given on the command line.
    pub default_alias: Option<String>,

    /// Root for downloaded images; the platform cache directory if unset.
    pub cache_dir: Option<PathBuf>,

    /// Where `<alias>_key.key` and `<alias>_CredFile.ini` live; the config
    /// directory if unset.
    pub credential_dir: Option<PathBuf>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named server profiles.
    #[serde(default)]
    pub aliases: BTreeMap<String, AliasEntry>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_alias: Some(DEFAULT_ALIAS.into()),
            cache_dir: None,
            credential_dir: None,
            defaults: Defaults::default(),
            aliases: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default)]
    pub insecure: bool,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            insecure: false,
            timeout: default_timeout(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_timeout() -> u64 {
    120
}

/// One `[aliases.NAME]` section. Unset fields keep the alias defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct AliasEntry {
    pub scheme: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub fms_port: Option<u16>,
    pub app_path: Option<String>,
    pub base_path: Option<String>,

    /// Path to a custom CA certificate (PEM).
    pub ca_cert: Option<PathBuf>,

    /// Override the insecure TLS setting.
    pub insecure: Option<bool>,

    /// Override the timeout.
    pub timeout: Option<u64>,
}

impl AliasEntry {
    pub fn to_alias(&self, name: &str) -> Alias {
        let mut alias = Alias::new(name);
        if let Some(ref scheme) = self.scheme {
            alias = alias.with_scheme(scheme.as_str());
        }
        if let Some(ref host) = self.host {
            alias = alias.with_host(host.as_str());
        }
        if let Some(port) = self.port {
            alias = alias.with_port(port);
        }
        if let Some(fms_port) = self.fms_port {
            alias = alias.with_fms_port(fms_port);
        }
        if let Some(ref app_path) = self.app_path {
            alias = alias.with_app_path(app_path);
        }
        if let Some(ref base_path) = self.base_path {
            alias = alias.with_base_path(base_path);
        }
        alias
    }
}

impl Config {
    /// Every configured alias.
    pub fn alias_book(&self) -> AliasBook {
        self.aliases
            .iter()
            .map(|(name, entry)| entry.to_alias(name))
            .collect()
    }

    pub fn default_alias_name(&self) -> &str {
        self.default_alias.as_deref().unwrap_or(DEFAULT_ALIAS)
    }

    /// TLS and timeout for `alias`, alias overrides first.
    pub fn transport(&self, alias: &str) -> TransportConfig {
        let entry = self.aliases.get(alias);
        let insecure = entry
            .and_then(|e| e.insecure)
            .unwrap_or(self.defaults.insecure);

        let tls = if insecure {
            TlsMode::DangerAcceptInvalid
        } else if let Some(ca) = entry.and_then(|e| e.ca_cert.clone()) {
            TlsMode::CustomCa(ca)
        } else {
            TlsMode::System
        };

        let timeout = entry
            .and_then(|e| e.timeout)
            .unwrap_or(self.defaults.timeout);

        TransportConfig {
            tls,
            timeout: Duration::from_secs(timeout),
        }
    }

    pub fn credential_dir(&self) -> PathBuf {
        self.credential_dir.clone().unwrap_or_else(config_dir)
    }

    /// `<cache dir>/RMI/TEAMCENTER`.
    pub fn image_root(&self) -> PathBuf {
        image_root(&self.cache_dir.clone().unwrap_or_else(cache_dir))
    }
}

// ── Paths ───────────────────────────────────────────────────────────

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "resttc", "resttc")
}

fn home_fallback(kind: &str) -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(kind);
    p.push("resttc");
    p
}

/// Platform config directory (XDG on Linux).
pub fn config_dir() -> PathBuf {
    project_dirs().map_or_else(
        || home_fallback(".config"),
        |dirs| dirs.config_dir().to_path_buf(),
    )
}

/// Platform cache directory.
pub fn cache_dir() -> PathBuf {
    project_dirs().map_or_else(
        || home_fallback(".cache"),
        |dirs| dirs.cache_dir().to_path_buf(),
    )
}

/// The canonical `aliases.toml` path.
pub fn config_path() -> PathBuf {
    config_dir().join(CONFIG_FILE)
}

/// Where exported specification images are written below a cache root.
pub fn image_root(cache_dir: &Path) -> PathBuf {
    cache_dir.join("RMI").join("TEAMCENTER")
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the config from `path` plus `RESTTC_` environment overrides
/// (`RESTTC_ALIASES__DEV__HOST=...`). A missing file yields the defaults.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    tracing::debug!(path = %path.display(), "loading alias configuration");
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("RESTTC_").split("__"));

    Ok(figment.extract()?)
}

/// Load the config from the canonical path.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load config, returning a default if it cannot be read.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write it to `path`.
pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(io_error(parent))?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str).map_err(io_error(path))?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const SAMPLE: &str = r#"
default_alias = "DEV"
cache_dir = "/var/cache/rmi"

[defaults]
timeout = 30

[aliases.DEV]
host = "plm-dev.example.com"
port = 80
app_path = "aw/"

[aliases.PROD]
scheme = "https"
host = "plm.example.com"
port = 443
fms_port = 4545
ca_cert = "/etc/ssl/plm.pem"
"#;

    fn load(text: &str) -> Config {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, text).unwrap();
        load_config_from(&path).unwrap()
    }

    #[test]
    fn aliases_are_read_from_toml() {
        let cfg = load(SAMPLE);
        assert_eq!(cfg.default_alias_name(), "DEV");

        let book = cfg.alias_book();
        assert_eq!(book.len(), 2);
        assert_eq!(book.get("DEV").base_url(), "http://plm-dev.example.com/aw");
        assert_eq!(
            book.get("PROD").fms_download_url(),
            "https://plm.example.com:4545/fms/fmsdownload/"
        );
    }

    #[test]
    fn unknown_alias_keeps_defaults() {
        let book = load(SAMPLE).alias_book();
        let alias = book.get("QA");
        assert_eq!(alias.name(), "QA");
        assert_eq!(alias.base_url(), "http://localhost:3000");
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg.default_alias_name(), DEFAULT_ALIAS);
        assert!(cfg.aliases.is_empty());
        assert_eq!(cfg.defaults.timeout, 120);
    }

    #[test]
    fn transport_prefers_alias_overrides() {
        let cfg = load(SAMPLE);

        let dev = cfg.transport("DEV");
        assert_eq!(dev.tls, TlsMode::System);
        assert_eq!(dev.timeout, Duration::from_secs(30));

        let prod = cfg.transport("PROD");
        assert_eq!(prod.tls, TlsMode::CustomCa("/etc/ssl/plm.pem".into()));
    }

    #[test]
    fn image_root_follows_cache_dir() {
        let cfg = load(SAMPLE);
        assert_eq!(
            cfg.image_root(),
            PathBuf::from("/var/cache/rmi/RMI/TEAMCENTER")
        );
    }

    #[test]
    fn saved_config_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE);

        let mut cfg = Config::default();
        cfg.aliases.insert(
            "LAB".into(),
            AliasEntry {
                host: Some("lab".into()),
                fms_port: Some(4600),
                ..AliasEntry::default()
            },
        );
        save_config_to(&cfg, &path).unwrap();

        let loaded = load_config_from(&path).unwrap();
        assert_eq!(loaded.aliases, cfg.aliases);
        assert_eq!(loaded.alias_book().get("LAB").fms_url(), "http://lab:4600");
    }
}
