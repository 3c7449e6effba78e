//! Prediction-side HTTP client.
//!
//! A separate, smaller client authenticated with the prediction key obtained
//! from account info after training. Image bytes are posted raw.

use async_trait::async_trait;
use iris_abstraction::{ApiError, ImagePrediction, PredictionApi, ProjectId};
use reqwest::Client;
use tracing::{debug, error};

use crate::training::DEFAULT_ENDPOINT;

/// HTTP client for the prediction side of the service.
#[derive(Debug, Clone)]
pub struct PredictionClient {
    /// The prediction key for authentication.
    prediction_key: String,
    /// The base URL for the service.
    base_url: String,
    /// HTTP client for making requests.
    client: Client,
}

impl PredictionClient {
    /// Creates a new `PredictionClient` with the given prediction key.
    #[must_use]
    pub fn new(prediction_key: String) -> Self {
        Self { prediction_key, base_url: DEFAULT_ENDPOINT.to_string(), client: Client::new() }
    }

    /// Creates a new `PredictionClient` against a custom base URL.
    #[must_use]
    pub fn with_base_url(prediction_key: String, base_url: String) -> Self {
        Self { prediction_key, base_url, client: Client::new() }
    }
}

#[async_trait]
impl PredictionApi for PredictionClient {
    async fn predict_image(
        &self,
        project_id: &ProjectId,
        image: Vec<u8>,
    ) -> Result<ImagePrediction, ApiError> {
        let url = format!("{}/Prediction/{}/image", self.base_url, project_id);
        debug!(project_id = %project_id, image_bytes = image.len(), "Requesting prediction");

        let response = self
            .client
            .post(&url)
            .header("Prediction-Key", &self.prediction_key)
            .header("Content-Type", "application/octet-stream")
            .body(image)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to send request to prediction service");
                ApiError::RequestError(format!("Network error: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            let message =
                response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            error!(status = %status, message = %message, "Prediction service returned error status");
            return Err(ApiError::ServiceError { status: status.as_u16(), message });
        }

        response.json().await.map_err(|e| {
            error!(error = %e, "Failed to parse prediction response");
            ApiError::SerializationError(format!("Failed to parse response: {e}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prediction_client_uses_default_endpoint() {
        let client = PredictionClient::new("pk".to_string());
        assert_eq!(client.base_url, DEFAULT_ENDPOINT);
    }
}
