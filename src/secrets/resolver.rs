//! Secret resolution on top of a [`SecretStore`].
//!
//! # Responsibilities
//! - Issue exactly one store call per lookup (no retries)
//! - Map every store failure to `SecretError::Unavailable`
//! - Return string payloads verbatim, base64-decode binary payloads
//!
//! # Design Decisions
//! - Only the secret id and payload kind are logged, never the value

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::secrets::types::{SecretError, SecretPayload, SecretResult, SecretStore, SecretValue};

/// Fetches named secrets from an external store.
#[derive(Clone)]
pub struct SecretResolver {
    store: Arc<dyn SecretStore>,
}

impl SecretResolver {
    pub fn new(store: Arc<dyn SecretStore>) -> Self {
        Self { store }
    }

    /// Fetch and decode a secret.
    pub async fn fetch(&self, secret_id: &str) -> SecretResult<SecretValue> {
        tracing::debug!(secret_id = %secret_id, "Fetching secret");

        let payload = self.store.get_secret(secret_id).await.map_err(|source| {
            tracing::error!(
                secret_id = %secret_id,
                kind = %source.kind,
                "Secret store call failed"
            );
            SecretError::Unavailable {
                secret_id: secret_id.to_string(),
                source,
            }
        })?;

        tracing::debug!(secret_id = %secret_id, payload = payload.kind(), "Secret fetched");
        decode_payload(secret_id, payload)
    }
}

/// Turn a raw payload into a [`SecretValue`].
pub fn decode_payload(secret_id: &str, payload: SecretPayload) -> SecretResult<SecretValue> {
    match payload {
        SecretPayload::Text(text) => Ok(SecretValue::new(text.as_str())),
        SecretPayload::Binary(bytes) => {
            let decoded = zeroize::Zeroizing::new(STANDARD.decode(bytes.as_slice()).map_err(|e| {
                SecretError::Undecodable {
                    secret_id: secret_id.to_string(),
                    reason: e.to_string(),
                }
            })?);
            let text = std::str::from_utf8(&decoded).map_err(|e| SecretError::Undecodable {
                secret_id: secret_id.to_string(),
                reason: e.to_string(),
            })?;
            Ok(SecretValue::new(text))
        }
        SecretPayload::Empty => Err(SecretError::Empty {
            secret_id: secret_id.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secrets::types::{SecretFailureKind, StaticSecretStore};

    #[tokio::test]
    async fn string_payload_returned_verbatim() {
        let store = StaticSecretStore::new().with_text("db", "{\"password\":\"x\"}");
        let resolver = SecretResolver::new(Arc::new(store));
        let value = resolver.fetch("db").await.unwrap();
        assert_eq!(value.expose(), "{\"password\":\"x\"}");
    }

    #[tokio::test]
    async fn binary_payload_is_base64_decoded() {
        let store = StaticSecretStore::new().with_binary("db", b"aHVudGVyMg==");
        let resolver = SecretResolver::new(Arc::new(store));
        assert_eq!(resolver.fetch("db").await.unwrap().expose(), "hunter2");
    }

    #[tokio::test]
    async fn every_store_failure_is_unavailable() {
        for kind in [
            SecretFailureKind::DecryptionFailure,
            SecretFailureKind::InternalServiceError,
            SecretFailureKind::InvalidParameter,
            SecretFailureKind::InvalidRequest,
            SecretFailureKind::ResourceNotFound,
        ] {
            let store = Arc::new(StaticSecretStore::new().with_failure("db", kind));
            let resolver = SecretResolver::new(store.clone());
            let err = resolver.fetch("db").await.unwrap_err();
            assert!(matches!(err, SecretError::Unavailable { .. }));
            assert_eq!(err.kind(), Some(kind));
            assert_eq!(store.requests().len(), 1, "no retries");
        }
    }

    #[test]
    fn invalid_base64_is_undecodable() {
        let err = decode_payload("db", SecretPayload::Binary(zeroize::Zeroizing::new(b"***".to_vec())))
            .unwrap_err();
        assert!(matches!(err, SecretError::Undecodable { .. }));
    }

    #[test]
    fn non_utf8_binary_is_undecodable() {
        // base64 of [0xff, 0xfe]
        let err = decode_payload("db", SecretPayload::Binary(zeroize::Zeroizing::new(b"//4=".to_vec())))
            .unwrap_err();
        assert!(matches!(err, SecretError::Undecodable { .. }));
    }

    #[test]
    fn empty_payload_is_error() {
        let err = decode_payload("db", SecretPayload::Empty).unwrap_err();
        assert!(matches!(err, SecretError::Empty { .. }));
    }
}
