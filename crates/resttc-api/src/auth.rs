// Credentials
//
// The password is stored sealed (a Fernet token) next to the key that
// opens it. It is only ever decrypted into a `SecretString` at the moment
// the login body is built.

use fernet::Fernet;
use secrecy::{ExposeSecret, SecretString};

use crate::error::Error;

/// Username plus a sealed password and the key that opens it.
///
/// Constructed once per connection and never mutated.
#[derive(Clone)]
pub struct Credentials {
    username: String,
    sealed_password: String,
    key: SecretString,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("sealed_password", &"[REDACTED]")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

impl Credentials {
    /// Wrap an already sealed password and its key.
    pub fn new(
        username: impl Into<String>,
        sealed_password: impl Into<String>,
        key: SecretString,
    ) -> Self {
        Self {
            username: username.into(),
            sealed_password: sealed_password.into(),
            key,
        }
    }

    /// Seal a plaintext password under a freshly generated key.
    pub fn seal(username: impl Into<String>, password: &SecretString) -> Result<Self, Error> {
        let key = Fernet::generate_key();
        let fernet = Fernet::new(&key).ok_or_else(|| Error::Decryption {
            message: "generated key was rejected".into(),
        })?;
        let sealed_password = fernet.encrypt(password.expose_secret().as_bytes());
        Ok(Self {
            username: username.into(),
            sealed_password,
            key: SecretString::from(key),
        })
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// The sealed password token, as written to the credential file.
    pub fn sealed_password(&self) -> &str {
        &self.sealed_password
    }

    /// The key that opens the sealed password.
    pub fn key(&self) -> &SecretString {
        &self.key
    }

    /// Decrypt the password.
    pub fn password(&self) -> Result<SecretString, Error> {
        let fernet = Fernet::new(self.key.expose_secret().trim()).ok_or_else(|| {
            Error::Decryption {
                message: "key is not a valid Fernet key".into(),
            }
        })?;
        let plain = fernet
            .decrypt(self.sealed_password.trim())
            .map_err(|_| Error::Decryption {
                message: format!("password token for '{}' does not match key", self.username),
            })?;
        let plain = String::from_utf8(plain).map_err(|_| Error::Decryption {
            message: "decrypted password is not valid UTF-8".into(),
        })?;
        Ok(SecretString::from(plain))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn seal_then_open() {
        let creds = Credentials::seal("ed", &SecretString::from("s3cret".to_string())).unwrap();
        assert_eq!(creds.username(), "ed");
        assert_ne!(creds.sealed_password(), "s3cret");
        assert_eq!(creds.password().unwrap().expose_secret(), "s3cret");
    }

    #[test]
    fn wrong_key_is_rejected() {
        let sealed = Credentials::seal("ed", &SecretString::from("s3cret".to_string())).unwrap();
        let other_key = SecretString::from(Fernet::generate_key());
        let creds = Credentials::new("ed", sealed.sealed_password(), other_key);

        assert!(matches!(creds.password(), Err(Error::Decryption { .. })));
    }

    #[test]
    fn debug_redacts_secrets() {
        let creds = Credentials::seal("ed", &SecretString::from("s3cret".to_string())).unwrap();
        let rendered = format!("{creds:?}");
        assert!(rendered.contains("ed"));
        assert!(!rendered.contains(creds.sealed_password()));
    }
}
