//! Training-side HTTP client.
//!
//! This module implements the `TrainingApi` trait against the hosted
//! service's REST endpoints. All calls authenticate with the training key
//! passed in a `Training-Key` header.

use async_trait::async_trait;
use iris_abstraction::{
    AccountInfo, ApiError, ImageUploadSummary, ImageUrlBatch, Iteration, IterationId, Project,
    ProjectId, Tag, TrainingApi,
};
use reqwest::{Client, Response};
use serde::Deserialize;
use std::env;
use tracing::{debug, error};

/// Default service endpoint. Overridable for other regions and for tests.
pub const DEFAULT_ENDPOINT: &str =
    "https://southcentralus.api.cognitive.microsoft.com/customvision/v1.0";

/// Name of the environment variable holding the training key.
pub const TRAINING_KEY_VAR: &str = "IRIS_TRAINING_KEY";

/// HTTP client for the training side of the service.
#[derive(Debug, Clone)]
pub struct TrainingClient {
    /// The training key for authentication.
    training_key: String,
    /// The base URL for the service.
    base_url: String,
    /// HTTP client for making requests.
    client: Client,
}

impl TrainingClient {
    /// Creates a new `TrainingClient`, reading the training key from the
    /// `IRIS_TRAINING_KEY` environment variable.
    ///
    /// # Errors
    /// Returns `ApiError::MissingCredential` if the variable is not set.
    pub fn new() -> Result<Self, ApiError> {
        let training_key = env::var(TRAINING_KEY_VAR).map_err(|_| {
            ApiError::MissingCredential(format!("{TRAINING_KEY_VAR} environment variable not set"))
        })?;
        Ok(Self::with_training_key(training_key))
    }

    /// Creates a new `TrainingClient` with an explicit training key.
    #[must_use]
    pub fn with_training_key(training_key: String) -> Self {
        Self { training_key, base_url: DEFAULT_ENDPOINT.to_string(), client: Client::new() }
    }

    /// Creates a new `TrainingClient` against a custom base URL.
    #[must_use]
    pub fn with_base_url(training_key: String, base_url: String) -> Self {
        Self { training_key, base_url, client: Client::new() }
    }

    /// The base URL this client talks to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn read_json<T: for<'de> Deserialize<'de>>(response: Response) -> Result<T, ApiError> {
        let status = response.status();
        if !status.is_success() {
            let message =
                response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            error!(status = %status, message = %message, "Training service returned error status");
            return Err(ApiError::ServiceError { status: status.as_u16(), message });
        }
        response.json::<T>().await.map_err(|e| {
            error!(error = %e, "Failed to parse training service response");
            ApiError::SerializationError(format!("Failed to parse response: {e}"))
        })
    }

    fn request_error(e: reqwest::Error) -> ApiError {
        error!(error = %e, "Failed to send request to training service");
        ApiError::RequestError(format!("Network error: {e}"))
    }
}

#[async_trait]
impl TrainingApi for TrainingClient {
    async fn list_projects(&self) -> Result<Vec<Project>, ApiError> {
        let url = format!("{}/Training/projects", self.base_url);
        debug!(url = %url, "Listing projects");

        let response = self
            .client
            .get(&url)
            .header("Training-Key", &self.training_key)
            .send()
            .await
            .map_err(Self::request_error)?;
        Self::read_json(response).await
    }

    async fn create_project(&self, name: &str, description: &str) -> Result<Project, ApiError> {
        let url = format!("{}/Training/projects", self.base_url);
        debug!(name = %name, "Creating project");

        let response = self
            .client
            .post(&url)
            .header("Training-Key", &self.training_key)
            .query(&[("name", name), ("description", description)])
            .send()
            .await
            .map_err(Self::request_error)?;
        Self::read_json(response).await
    }

    async fn delete_project(&self, project_id: &ProjectId) -> Result<(), ApiError> {
        let url = format!("{}/Training/projects/{}", self.base_url, project_id);
        debug!(project_id = %project_id, "Deleting project");

        let response = self
            .client
            .delete(&url)
            .header("Training-Key", &self.training_key)
            .send()
            .await
            .map_err(Self::request_error)?;

        let status = response.status();
        if !status.is_success() {
            let message =
                response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            error!(status = %status, message = %message, "Failed to delete project");
            return Err(ApiError::ServiceError { status: status.as_u16(), message });
        }
        Ok(())
    }

    async fn create_tag(&self, project_id: &ProjectId, name: &str) -> Result<Tag, ApiError> {
        let url = format!("{}/Training/projects/{}/tags", self.base_url, project_id);
        debug!(project_id = %project_id, name = %name, "Creating tag");

        let response = self
            .client
            .post(&url)
            .header("Training-Key", &self.training_key)
            .query(&[("name", name)])
            .send()
            .await
            .map_err(Self::request_error)?;
        Self::read_json(response).await
    }

    async fn create_images_from_urls(
        &self,
        project_id: &ProjectId,
        batch: &ImageUrlBatch,
    ) -> Result<ImageUploadSummary, ApiError> {
        let url = format!("{}/Training/projects/{}/images/url", self.base_url, project_id);
        debug!(
            project_id = %project_id,
            url_count = batch.urls.len(),
            tag_count = batch.tag_ids.len(),
            "Submitting image batch"
        );

        let response = self
            .client
            .post(&url)
            .header("Training-Key", &self.training_key)
            .json(batch)
            .send()
            .await
            .map_err(Self::request_error)?;
        Self::read_json(response).await
    }

    async fn train_project(&self, project_id: &ProjectId) -> Result<Iteration, ApiError> {
        let url = format!("{}/Training/projects/{}/train", self.base_url, project_id);
        debug!(project_id = %project_id, "Starting training");

        let response = self
            .client
            .post(&url)
            .header("Training-Key", &self.training_key)
            .send()
            .await
            .map_err(Self::request_error)?;
        Self::read_json(response).await
    }

    async fn get_iteration(
        &self,
        project_id: &ProjectId,
        iteration_id: &IterationId,
    ) -> Result<Iteration, ApiError> {
        let url = format!(
            "{}/Training/projects/{}/iterations/{}",
            self.base_url, project_id, iteration_id
        );
        debug!(project_id = %project_id, iteration_id = %iteration_id, "Fetching iteration");

        let response = self
            .client
            .get(&url)
            .header("Training-Key", &self.training_key)
            .send()
            .await
            .map_err(Self::request_error)?;
        Self::read_json(response).await
    }

    async fn update_iteration(
        &self,
        project_id: &ProjectId,
        iteration: &Iteration,
    ) -> Result<Iteration, ApiError> {
        let url = format!(
            "{}/Training/projects/{}/iterations/{}",
            self.base_url, project_id, iteration.id
        );
        debug!(
            project_id = %project_id,
            iteration_id = %iteration.id,
            is_default = iteration.is_default,
            "Updating iteration"
        );

        let response = self
            .client
            .patch(&url)
            .header("Training-Key", &self.training_key)
            .json(iteration)
            .send()
            .await
            .map_err(Self::request_error)?;
        Self::read_json(response).await
    }

    async fn get_account_info(&self) -> Result<AccountInfo, ApiError> {
        let url = format!("{}/Training/account", self.base_url);
        debug!("Fetching account info");

        let response = self
            .client
            .get(&url)
            .header("Training-Key", &self.training_key)
            .send()
            .await
            .map_err(Self::request_error)?;
        let account: AccountWire = Self::read_json(response).await?;
        Ok(AccountInfo { prediction_key: account.keys.prediction_keys.primary_key })
    }
}

// Wire shape of the account endpoint; only the prediction key is surfaced.

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AccountWire {
    keys: AccountKeysWire,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AccountKeysWire {
    prediction_keys: KeyPairWire,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct KeyPairWire {
    primary_key: String,
}
