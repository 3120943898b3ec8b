//! AWS Secrets Manager backed secret store.

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_config::Region;
use aws_sdk_secretsmanager::error::DisplayErrorContext;
use aws_sdk_secretsmanager::operation::get_secret_value::GetSecretValueError;
use aws_sdk_secretsmanager::Client;
use zeroize::Zeroizing;

use crate::secrets::types::{SecretFailureKind, SecretPayload, SecretStore, SecretStoreError};

/// Secret store backed by AWS Secrets Manager.
#[derive(Clone, Debug)]
pub struct AwsSecretsManagerStore {
    client: Client,
}

impl AwsSecretsManagerStore {
    /// Build a client from the SDK environment chain, optionally pinned to a region.
    pub async fn from_env(region: Option<String>) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = region {
            loader = loader.region(Region::new(region));
        }
        let shared_config = loader.load().await;
        Self {
            client: Client::new(&shared_config),
        }
    }

    /// Wrap an existing SDK client.
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

fn classify(err: &GetSecretValueError) -> SecretFailureKind {
    if err.is_decryption_failure() {
        SecretFailureKind::DecryptionFailure
    } else if err.is_internal_service_error() {
        SecretFailureKind::InternalServiceError
    } else if err.is_invalid_parameter_exception() {
        SecretFailureKind::InvalidParameter
    } else if err.is_invalid_request_exception() {
        SecretFailureKind::InvalidRequest
    } else if err.is_resource_not_found_exception() {
        SecretFailureKind::ResourceNotFound
    } else {
        SecretFailureKind::Other
    }
}

#[async_trait]
impl SecretStore for AwsSecretsManagerStore {
    async fn get_secret(&self, secret_id: &str) -> Result<SecretPayload, SecretStoreError> {
        let output = self
            .client
            .get_secret_value()
            .secret_id(secret_id)
            .send()
            .await
            .map_err(|err| {
                let kind = err
                    .as_service_error()
                    .map(classify)
                    .unwrap_or(SecretFailureKind::Transport);
                SecretStoreError::new(kind, DisplayErrorContext(&err).to_string())
            })?;

        if let Some(text) = output.secret_string() {
            return Ok(SecretPayload::Text(Zeroizing::new(text.to_string())));
        }
        if let Some(blob) = output.secret_binary() {
            return Ok(SecretPayload::Binary(Zeroizing::new(blob.as_ref().to_vec())));
        }
        Ok(SecretPayload::Empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_secretsmanager::types::error::{
        DecryptionFailure, InvalidRequestException, ResourceNotFoundException,
    };

    #[test]
    fn service_errors_map_to_failure_kinds() {
        let not_found = GetSecretValueError::ResourceNotFoundException(
            ResourceNotFoundException::builder().message("missing").build(),
        );
        assert_eq!(classify(&not_found), SecretFailureKind::ResourceNotFound);

        let decryption =
            GetSecretValueError::DecryptionFailure(DecryptionFailure::builder().build());
        assert_eq!(classify(&decryption), SecretFailureKind::DecryptionFailure);

        let invalid =
            GetSecretValueError::InvalidRequestException(InvalidRequestException::builder().build());
        assert_eq!(classify(&invalid), SecretFailureKind::InvalidRequest);
    }
}
