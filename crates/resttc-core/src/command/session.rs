// Session commands

use resttc_api::Credentials;
use secrecy::ExposeSecret;
use serde_json::{Value, json};
use uuid::Uuid;

use super::{CommandKind, Reply, Request, TcCommand};
use crate::error::CoreError;

const DISCRIMINATOR_PREFIX: &str = "RESTTC-";

/// Open a server session.
///
/// The password stays sealed until `request()` builds the body.
#[derive(Debug, Clone)]
pub struct Login {
    credentials: Credentials,
    group: String,
    role: String,
    locale: String,
}

impl Login {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            group: String::new(),
            role: String::new(),
            locale: "en_US".into(),
        }
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = group.into();
        self
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = role.into();
        self
    }

    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = locale.into();
        self
    }
}

impl TcCommand for Login {
    const KIND: CommandKind = CommandKind::Login;
    type Output = Value;

    fn request(&self) -> Result<Request, CoreError> {
        let password = self.credentials.password()?;
        Ok(Request::Json(json!({
            "credentials": {
                "user": self.credentials.username(),
                "password": password.expose_secret(),
                "group": self.group,
                "role": self.role,
                "locale": self.locale,
                // sic: the server's field name
                "descrimator": format!("{DISCRIMINATOR_PREFIX}{}", Uuid::new_v4())
            }
        })))
    }

    async fn decode(&self, reply: Reply) -> Result<Value, CoreError> {
        reply.into_json(Self::KIND)
    }
}

/// Close the server session.
#[derive(Debug, Clone, Copy, Default)]
pub struct Logout;

impl TcCommand for Logout {
    const KIND: CommandKind = CommandKind::Logout;
    type Output = Value;

    fn request(&self) -> Result<Request, CoreError> {
        Ok(Request::Json(json!({})))
    }

    async fn decode(&self, reply: Reply) -> Result<Value, CoreError> {
        reply.into_json(Self::KIND)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;

    use super::*;

    #[test]
    fn login_body_carries_decrypted_password() {
        let creds = Credentials::seal("ed", &SecretString::from("pw".to_string())).unwrap();
        let Request::Json(body) = Login::new(creds).request().unwrap() else {
            panic!("expected JSON request");
        };

        let c = &body["credentials"];
        assert_eq!(c["user"], "ed");
        assert_eq!(c["password"], "pw");
        assert_eq!(c["group"], "");
        assert_eq!(c["role"], "");
        assert_eq!(c["locale"], "en_US");
        assert!(
            c["descrimator"]
                .as_str()
                .unwrap()
                .starts_with(DISCRIMINATOR_PREFIX)
        );
    }

    #[test]
    fn login_with_bad_key_fails_before_sending() {
        let sealed = Credentials::seal("ed", &SecretString::from("pw".to_string())).unwrap();
        let other = Credentials::seal("ed", &SecretString::from("x".to_string())).unwrap();
        let creds = Credentials::new("ed", sealed.sealed_password(), other.key().clone());

        assert!(matches!(
            Login::new(creds).request(),
            Err(CoreError::AuthenticationFailed { .. })
        ));
    }
}
