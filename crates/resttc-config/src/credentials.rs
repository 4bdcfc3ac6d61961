// Credential files
//
// Each alias has two files in the credential directory:
//
//   <alias>_key.key      the Fernet key, nothing else
//   <alias>_CredFile.ini `Username=`, `Password=` (Fernet token) and
//                        `Expiry=` lines; anything else is ignored
//
// Both are needed to log in. The password is never written in clear.

use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info};

use resttc_api::Credentials;
use resttc_core::{CoreError, CredentialProvider};

use crate::{ConfigError, io_error};

/// `Expiry=` value written when no expiry is set.
pub const NO_EXPIRY: i64 = -1;

/// Shortest expiry accepted by [`CredentialStore::create`], in hours.
const MIN_EXPIRY: i64 = 2;

// ── CredentialFile ──────────────────────────────────────────────────

/// Parsed contents of `<alias>_CredFile.ini`.
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialFile {
    pub username: String,
    /// Sealed password token.
    pub password: String,
    pub expiry: i64,
}

impl std::fmt::Debug for CredentialFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialFile")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("expiry", &self.expiry)
            .finish()
    }
}

impl CredentialFile {
    /// Read `Key=value` lines. Each value runs to the end of its line and may
    /// itself contain `=`.
    pub fn parse(text: &str, path: &Path) -> Result<Self, ConfigError> {
        let mut username = None;
        let mut password = None;
        let mut expiry = NO_EXPIRY;

        for line in text.lines() {
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            match key {
                "Username" => username = Some(value.to_owned()),
                "Password" => password = Some(value.to_owned()),
                "Expiry" => expiry = value.trim().parse().unwrap_or(NO_EXPIRY),
                _ => {}
            }
        }

        let missing = |field| ConfigError::IncompleteCredentialFile {
            path: path.to_path_buf(),
            field,
        };
        Ok(Self {
            username: username.ok_or_else(|| missing("Username"))?,
            password: password.ok_or_else(|| missing("Password"))?,
            expiry,
        })
    }

    pub fn render(&self) -> String {
        format!(
            "#Credential file:\nUsername={}\nPassword={}\nExpiry={}\n",
            self.username, self.password, self.expiry
        )
    }
}

// ── CredentialStore ─────────────────────────────────────────────────

/// The credential directory.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    dir: PathBuf,
}

impl CredentialStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn key_path(&self, alias: &str) -> PathBuf {
        self.dir.join(format!("{alias}_key.key"))
    }

    pub fn credential_path(&self, alias: &str) -> PathBuf {
        self.dir.join(format!("{alias}_CredFile.ini"))
    }

    /// Whether both files exist for `alias`.
    pub fn exists(&self, alias: &str) -> bool {
        self.key_path(alias).is_file() && self.credential_path(alias).is_file()
    }

    /// Load the credentials of `alias`. The key file is checked first.
    pub fn load(&self, alias: &str) -> Result<Credentials, ConfigError> {
        let key_path = self.key_path(alias);
        if !key_path.is_file() {
            return Err(ConfigError::MissingKeyFile {
                alias: alias.to_owned(),
                path: key_path,
            });
        }
        let cred_path = self.credential_path(alias);
        if !cred_path.is_file() {
            return Err(ConfigError::MissingCredentialFile {
                alias: alias.to_owned(),
                path: cred_path,
            });
        }

        let key = std::fs::read_to_string(&key_path).map_err(io_error(&key_path))?;
        let text = std::fs::read_to_string(&cred_path).map_err(io_error(&cred_path))?;
        let file = CredentialFile::parse(&text, &cred_path)?;
        debug!(alias, user = %file.username, "credentials loaded");

        Ok(Credentials::new(
            file.username,
            file.password,
            SecretString::from(key.trim().to_owned()),
        ))
    }

    /// Seal `password` under a new key and write both files, replacing any
    /// previous ones. Expiries shorter than two hours are not recorded.
    pub fn create(
        &self,
        alias: &str,
        username: &str,
        password: &SecretString,
        expiry_hours: Option<i64>,
    ) -> Result<Credentials, ConfigError> {
        if username.trim().is_empty() {
            return Err(ConfigError::Validation {
                field: "username".into(),
                reason: "must not be blank".into(),
            });
        }

        let credentials = Credentials::seal(username, password)?;
        let file = CredentialFile {
            username: username.to_owned(),
            password: credentials.sealed_password().to_owned(),
            expiry: expiry_hours
                .filter(|h| *h >= MIN_EXPIRY)
                .unwrap_or(NO_EXPIRY),
        };

        std::fs::create_dir_all(&self.dir).map_err(io_error(&self.dir))?;
        let cred_path = self.credential_path(alias);
        std::fs::write(&cred_path, file.render()).map_err(io_error(&cred_path))?;
        let key_path = self.key_path(alias);
        std::fs::write(&key_path, credentials.key().expose_secret())
            .map_err(io_error(&key_path))?;

        info!(alias, path = %self.dir.display(), "credential files written");
        Ok(credentials)
    }
}

impl CredentialProvider for CredentialStore {
    fn credentials(&self, alias: &str) -> Result<Credentials, CoreError> {
        self.load(alias).map_err(|e| CoreError::Credentials {
            alias: alias.to_owned(),
            message: e.to_string(),
        })
    }
}
