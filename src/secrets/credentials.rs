//! Database credentials derived from a resolved secret.
//!
//! Rotation secrets are usually JSON documents (`{"username": .., "password": ..,
//! "host": ..}`); anything else is treated as a bare password.

use serde::Deserialize;
use zeroize::Zeroizing;

use crate::secrets::types::SecretValue;

/// Principal and credential for the database endpoint.
#[derive(Clone)]
pub struct DatabaseCredentials {
    pub username: Option<String>,
    pub password: Zeroizing<String>,
}

#[derive(Deserialize)]
struct SecretDocument {
    username: Option<String>,
    password: Option<String>,
}

impl DatabaseCredentials {
    pub fn new(username: Option<String>, password: impl Into<String>) -> Self {
        Self {
            username,
            password: Zeroizing::new(password.into()),
        }
    }

    /// Interpret a secret as database credentials.
    pub fn from_secret(secret: &SecretValue) -> Self {
        let raw = secret.expose();
        match serde_json::from_str::<SecretDocument>(raw) {
            Ok(SecretDocument {
                username,
                password: Some(password),
            }) => Self::new(username, password),
            _ => Self::new(None, raw),
        }
    }
}

impl std::fmt::Debug for DatabaseCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseCredentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_document_is_used_field_wise() {
        let secret = SecretValue::new(
            r#"{"username":"conductor","password":"s3cret","host":"db.internal","port":3306}"#,
        );
        let creds = DatabaseCredentials::from_secret(&secret);
        assert_eq!(creds.username.as_deref(), Some("conductor"));
        assert_eq!(creds.password.as_str(), "s3cret");
    }

    #[test]
    fn json_without_password_is_taken_whole() {
        let secret = SecretValue::new(r#"{"username":"conductor"}"#);
        let creds = DatabaseCredentials::from_secret(&secret);
        assert_eq!(creds.username, None);
        assert_eq!(creds.password.as_str(), r#"{"username":"conductor"}"#);
    }

    #[test]
    fn plain_string_is_password() {
        let creds = DatabaseCredentials::from_secret(&SecretValue::new("hunter2"));
        assert_eq!(creds.username, None);
        assert_eq!(creds.password.as_str(), "hunter2");
    }

    #[test]
    fn debug_hides_password() {
        let creds = DatabaseCredentials::new(Some("u".into()), "hunter2");
        assert!(!format!("{:?}", creds).contains("hunter2"));
    }
}
