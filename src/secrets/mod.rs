//! Secret management subsystem.
//!
//! # Data Flow
//! ```text
//! secret id (config)
//!     → resolver.rs (single store call, error mapping, decoding)
//!     → SecretStore impl (aws.rs in production, StaticSecretStore in tests)
//!     → SecretValue (zeroed on drop, redacted in Debug)
//!     → credentials.rs (optional override of pool principal/credential)
//! ```
//!
//! # Design Decisions
//! - The store is a trait object so provisioning never depends on an SDK
//! - No retries: a failed attempt surfaces to the caller
//! - Secret material never reaches a log sink

#[cfg(feature = "aws")]
pub mod aws;
pub mod credentials;
pub mod resolver;
pub mod types;

#[cfg(feature = "aws")]
pub use aws::AwsSecretsManagerStore;
pub use credentials::DatabaseCredentials;
pub use resolver::SecretResolver;
pub use types::{
    SecretError, SecretFailureKind, SecretPayload, SecretResult, SecretStore, SecretStoreError,
    SecretValue, StaticSecretStore,
};
