//! Secret store contract, payload types and errors.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use thiserror::Error;
use zeroize::Zeroizing;

/// Category of a failed secret store call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretFailureKind {
    /// The store could not decrypt the protected value.
    DecryptionFailure,
    /// The store failed internally.
    InternalServiceError,
    /// A request parameter was rejected.
    InvalidParameter,
    /// The request is not valid for the current state of the secret.
    InvalidRequest,
    /// No secret with the given id exists.
    ResourceNotFound,
    /// Network or SDK failure before the store answered.
    Transport,
    /// Anything the store reported that fits none of the above.
    Other,
}

impl std::fmt::Display for SecretFailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SecretFailureKind::DecryptionFailure => "decryption failure",
            SecretFailureKind::InternalServiceError => "internal service error",
            SecretFailureKind::InvalidParameter => "invalid parameter",
            SecretFailureKind::InvalidRequest => "invalid request",
            SecretFailureKind::ResourceNotFound => "resource not found",
            SecretFailureKind::Transport => "transport error",
            SecretFailureKind::Other => "unexpected error",
        };
        f.write_str(name)
    }
}

/// Raw failure reported by a [`SecretStore`].
#[derive(Debug, Clone, Error)]
#[error("{kind}: {message}")]
pub struct SecretStoreError {
    pub kind: SecretFailureKind,
    pub message: String,
}

impl SecretStoreError {
    pub fn new(kind: SecretFailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// What a secret store returned for a lookup.
///
/// Exactly one of the payload fields is populated by real stores; `Empty`
/// covers responses that carry neither.
pub enum SecretPayload {
    Text(Zeroizing<String>),
    Binary(Zeroizing<Vec<u8>>),
    Empty,
}

impl SecretPayload {
    /// Short label for logs. Never includes the payload.
    pub fn kind(&self) -> &'static str {
        match self {
            SecretPayload::Text(_) => "string",
            SecretPayload::Binary(_) => "binary",
            SecretPayload::Empty => "empty",
        }
    }
}

impl std::fmt::Debug for SecretPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SecretPayload::{}([REDACTED])", self.kind())
    }
}

/// External secret management capability.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Fetch the current value of a secret.
    async fn get_secret(&self, secret_id: &str) -> Result<SecretPayload, SecretStoreError>;
}

/// A decoded secret.
///
/// Immutable once fetched. The backing memory is zeroed on drop and the
/// value never appears in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretValue(Zeroizing<String>);

impl SecretValue {
    pub fn new(value: impl Into<String>) -> Self {
        Self(Zeroizing::new(value.into()))
    }

    /// Borrow the plaintext. Callers must not log it.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for SecretValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretValue([REDACTED])")
    }
}

/// Errors surfaced by the secret resolver.
#[derive(Debug, Error)]
pub enum SecretError {
    /// The store call failed.
    #[error("secret '{secret_id}' unavailable: {source}")]
    Unavailable {
        secret_id: String,
        #[source]
        source: SecretStoreError,
    },

    /// A binary payload was not base64 encoded UTF-8.
    #[error("secret '{secret_id}' binary payload could not be decoded: {reason}")]
    Undecodable { secret_id: String, reason: String },

    /// The store answered without a string or binary payload.
    #[error("secret '{secret_id}' has no value")]
    Empty { secret_id: String },
}

impl SecretError {
    /// Failure category when the store itself failed.
    pub fn kind(&self) -> Option<SecretFailureKind> {
        match self {
            SecretError::Unavailable { source, .. } => Some(source.kind),
            _ => None,
        }
    }
}

/// Result type for secret operations.
pub type SecretResult<T> = Result<T, SecretError>;

enum StaticEntry {
    Text(String),
    Binary(Vec<u8>),
    Fail(SecretFailureKind),
}

/// In-memory [`SecretStore`] for local development and tests.
#[derive(Default)]
pub struct StaticSecretStore {
    entries: Mutex<HashMap<String, StaticEntry>>,
    calls: Mutex<Vec<String>>,
}

impl StaticSecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(self, id: &str, value: &str) -> Self {
        self.insert(id, StaticEntry::Text(value.to_string()));
        self
    }

    pub fn with_binary(self, id: &str, value: &[u8]) -> Self {
        self.insert(id, StaticEntry::Binary(value.to_vec()));
        self
    }

    pub fn with_failure(self, id: &str, kind: SecretFailureKind) -> Self {
        self.insert(id, StaticEntry::Fail(kind));
        self
    }

    /// Secret ids requested so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn insert(&self, id: &str, entry: StaticEntry) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(id.to_string(), entry);
        }
    }
}

#[async_trait]
impl SecretStore for StaticSecretStore {
    async fn get_secret(&self, secret_id: &str) -> Result<SecretPayload, SecretStoreError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(secret_id.to_string());
        }
        let entries = self
            .entries
            .lock()
            .map_err(|_| SecretStoreError::new(SecretFailureKind::Other, "store poisoned"))?;
        match entries.get(secret_id) {
            Some(StaticEntry::Text(v)) => Ok(SecretPayload::Text(Zeroizing::new(v.clone()))),
            Some(StaticEntry::Binary(v)) => Ok(SecretPayload::Binary(Zeroizing::new(v.clone()))),
            Some(StaticEntry::Fail(kind)) => Err(SecretStoreError::new(*kind, "injected failure")),
            None => Err(SecretStoreError::new(
                SecretFailureKind::ResourceNotFound,
                format!("no secret named '{}'", secret_id),
            )),
        }
    }
}
