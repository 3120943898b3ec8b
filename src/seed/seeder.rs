//! Idempotent-ish sample seeding through the metadata API.
//!
//! # Design Decisions
//! - Check-then-act with no lock: safe for a single starting instance only
//! - Names are compared case-insensitively

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::config::SeedConfig;
use crate::seed::bundle::SampleBundle;

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("metadata request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{method} {url} returned {status}")]
    UnexpectedStatus {
        method: &'static str,
        url: String,
        status: u16,
    },

    #[error("could not decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The bundled sample definitions are not valid JSON.
    #[error("invalid sample bundle: {0}")]
    Bundle(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    AlreadyPresent,
    Created { task_defs: usize, workflows: usize },
}

#[derive(Deserialize)]
struct DefinitionSummary {
    name: String,
}

/// Metadata API paths, relative to the service endpoint.
#[derive(Debug, Clone)]
pub struct SeedPaths {
    pub definitions: String,
    pub taskdefs: String,
    pub workflow: String,
}

impl From<&SeedConfig> for SeedPaths {
    fn from(config: &SeedConfig) -> Self {
        Self {
            definitions: config.definitions_path.clone(),
            taskdefs: config.taskdefs_path.clone(),
            workflow: config.workflow_path.clone(),
        }
    }
}

/// Creates the sample dataset when it is missing.
pub struct SampleSeeder {
    client: reqwest::Client,
    paths: SeedPaths,
    bundle: SampleBundle,
}

impl SampleSeeder {
    /// Seeder for the bundled kitchensink dataset.
    pub fn new(config: &SeedConfig) -> Result<Self, SeedError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            paths: SeedPaths::from(config),
            bundle: SampleBundle::kitchensink()?,
        })
    }

    pub fn with_bundle(mut self, bundle: SampleBundle) -> Self {
        self.bundle = bundle;
        self
    }

    /// Create the sample unless a definition named `sample_name` exists.
    pub async fn ensure(&self, endpoint: &str, sample_name: &str) -> Result<SeedOutcome, SeedError> {
        if self.exists(endpoint, sample_name).await? {
            tracing::warn!(sample = %sample_name, "Sample dataset already exists");
            return Ok(SeedOutcome::AlreadyPresent);
        }

        tracing::info!(sample = %sample_name, "Creating sample dataset");
        self.post(&join(endpoint, &self.paths.taskdefs), &self.bundle.task_defs)
            .await?;
        let workflow_url = join(endpoint, &self.paths.workflow);
        for workflow in &self.bundle.workflows {
            self.post(&workflow_url, workflow).await?;
        }

        let outcome = SeedOutcome::Created {
            task_defs: self.bundle.task_defs.len(),
            workflows: self.bundle.workflows.len(),
        };
        tracing::info!(sample = %sample_name, ?outcome, "Sample dataset created");
        Ok(outcome)
    }

    /// Case-insensitive lookup against the definition listing.
    pub async fn exists(&self, endpoint: &str, sample_name: &str) -> Result<bool, SeedError> {
        let url = join(endpoint, &self.paths.definitions);
        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(SeedError::UnexpectedStatus {
                method: "GET",
                url,
                status: response.status().as_u16(),
            });
        }
        let definitions: Vec<DefinitionSummary> = response
            .json()
            .await
            .map_err(|source| SeedError::Decode { url, source })?;
        Ok(definitions
            .iter()
            .any(|d| d.name.eq_ignore_ascii_case(sample_name)))
    }

    async fn post<T: serde::Serialize + ?Sized>(&self, url: &str, body: &T) -> Result<(), SeedError> {
        let response = self.client.post(url).json(body).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SeedError::UnexpectedStatus {
                method: "POST",
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        tracing::debug!(url = %url, status = status.as_u16(), "Metadata created");
        Ok(())
    }
}

fn join(endpoint: &str, path: &str) -> String {
    format!("{}/{}", endpoint.trim_end_matches('/'), path.trim_start_matches('/'))
}
