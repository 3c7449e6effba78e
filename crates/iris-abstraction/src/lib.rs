//! Service abstraction layer for Iris.
//!
//! This crate defines the core traits and types for talking to a hosted
//! image-classification training service: projects, tags, iterations, and
//! the training/prediction operation sets. Concrete HTTP clients live in
//! `iris-client`; the workflow crate only ever sees these traits.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Represents an error that can occur when talking to the remote service.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApiError {
    /// An error occurred during the API request (e.g., network issues, invalid request).
    #[error("Request Error: {0}")]
    RequestError(String),

    /// The service returned a non-success status code.
    #[error("Service Error ({status}): {message}")]
    ServiceError {
        /// The HTTP status code returned by the service.
        status: u16,
        /// The response body, if any.
        message: String,
    },

    /// An error occurred during serialization or deserialization.
    #[error("Serialization Error: {0}")]
    SerializationError(String),

    /// A required credential was not configured.
    #[error("Missing Credential: {0}")]
    MissingCredential(String),
}

/// Identifier for a remote project.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProjectId(pub String);

impl std::fmt::Display for ProjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Identifier for a tag within a project.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TagId(pub String);

impl std::fmt::Display for TagId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Identifier for a training iteration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IterationId(pub String);

impl std::fmt::Display for IterationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A named container, on the remote service, for tags, images, and
/// training iterations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// A named label category scoped to a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Tag {
    pub id: TagId,
    pub name: String,
}

/// Status of a training iteration as reported by the service.
///
/// The service reports status as a free-form string; anything we do not
/// recognize is carried through as `Unknown` with the raw value preserved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum IterationStatus {
    Training,
    Completed,
    Failed,
    Unknown(String),
}

impl IterationStatus {
    /// Whether the iteration has left the in-progress state.
    ///
    /// Every status other than `Training` is terminal, including `Unknown`.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Training)
    }

    /// The wire representation of this status.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Training => "Training",
            Self::Completed => "Completed",
            Self::Failed => "Failed",
            Self::Unknown(s) => s,
        }
    }
}

impl From<String> for IterationStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "Training" => Self::Training,
            "Completed" => Self::Completed,
            "Failed" => Self::Failed,
            _ => Self::Unknown(s),
        }
    }
}

impl From<IterationStatus> for String {
    fn from(status: IterationStatus) -> Self {
        status.as_str().to_string()
    }
}

impl std::fmt::Display for IterationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One training run of a project, producing a usable model snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Iteration {
    pub id: IterationId,
    #[serde(default)]
    pub name: String,
    pub status: IterationStatus,
    #[serde(default)]
    pub is_default: bool,
}

/// A batch of image URLs to ingest, all receiving the same set of tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ImageUrlBatch {
    pub urls: Vec<String>,
    pub tag_ids: Vec<TagId>,
}

/// A single image the service accepted from a batch upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreatedImage {
    pub id: String,
    #[serde(default)]
    pub image_uri: Option<String>,
}

/// The service's response to a batch image upload.
///
/// The service returns only the subset of submitted URLs it successfully
/// ingested; callers derive the failure count from the difference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ImageUploadSummary {
    #[serde(default)]
    pub images: Vec<CreatedImage>,
}

/// Account metadata needed to construct a prediction client.
///
/// The prediction key is a secondary credential, distinct from the training
/// key, used only to call inference endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountInfo {
    pub prediction_key: String,
}

/// One (label, probability) pair from an inference call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PredictedTag {
    pub tag: String,
    pub probability: f64,
}

/// The result of one inference call, in the order the service returned it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ImagePrediction {
    #[serde(default)]
    pub predictions: Vec<PredictedTag>,
}

/// Operations against the training side of the service.
///
/// All implementations must be `Send + Sync` so the workflow can hold them
/// behind a trait object.
#[async_trait]
pub trait TrainingApi: Send + Sync {
    /// Lists every project visible to the configured account.
    async fn list_projects(&self) -> Result<Vec<Project>, ApiError>;

    /// Creates a new project with the given name and description.
    async fn create_project(&self, name: &str, description: &str) -> Result<Project, ApiError>;

    /// Deletes a project and everything it contains (tags, images, iterations).
    async fn delete_project(&self, project_id: &ProjectId) -> Result<(), ApiError>;

    /// Creates a tag under the given project.
    async fn create_tag(&self, project_id: &ProjectId, name: &str) -> Result<Tag, ApiError>;

    /// Submits a batch of image URLs, all tagged with the given tag ids.
    ///
    /// The returned summary lists only the images the service accepted;
    /// rejected URLs are simply absent.
    async fn create_images_from_urls(
        &self,
        project_id: &ProjectId,
        batch: &ImageUrlBatch,
    ) -> Result<ImageUploadSummary, ApiError>;

    /// Starts a training run and returns the new iteration, typically still
    /// in the `Training` state.
    async fn train_project(&self, project_id: &ProjectId) -> Result<Iteration, ApiError>;

    /// Fetches the current state of an iteration by id.
    async fn get_iteration(
        &self,
        project_id: &ProjectId,
        iteration_id: &IterationId,
    ) -> Result<Iteration, ApiError>;

    /// Persists changes to an iteration (e.g., promoting it to default).
    async fn update_iteration(
        &self,
        project_id: &ProjectId,
        iteration: &Iteration,
    ) -> Result<Iteration, ApiError>;

    /// Fetches account metadata, including the prediction key.
    async fn get_account_info(&self) -> Result<AccountInfo, ApiError>;
}

/// Operations against the prediction side of the service.
#[async_trait]
pub trait PredictionApi: Send + Sync {
    /// Classifies a single image, passed as raw bytes, against the
    /// project's default iteration.
    async fn predict_image(
        &self,
        project_id: &ProjectId,
        image: Vec<u8>,
    ) -> Result<ImagePrediction, ApiError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parses_known_values() {
        assert_eq!(IterationStatus::from("Training".to_string()), IterationStatus::Training);
        assert_eq!(IterationStatus::from("Completed".to_string()), IterationStatus::Completed);
        assert_eq!(IterationStatus::from("Failed".to_string()), IterationStatus::Failed);
    }

    #[test]
    fn test_status_preserves_unrecognized_values() {
        let status = IterationStatus::from("Queued".to_string());
        assert_eq!(status, IterationStatus::Unknown("Queued".to_string()));
        assert_eq!(status.as_str(), "Queued");
    }

    #[test]
    fn test_only_training_is_non_terminal() {
        assert!(!IterationStatus::Training.is_terminal());
        assert!(IterationStatus::Completed.is_terminal());
        assert!(IterationStatus::Failed.is_terminal());
        assert!(IterationStatus::Unknown("New".to_string()).is_terminal());
    }

    #[test]
    fn test_iteration_wire_format() {
        let json = r#"{"Id":"it-1","Name":"Iteration 1","Status":"Training","IsDefault":false}"#;
        let iteration: Iteration = serde_json::from_str(json).unwrap();
        assert_eq!(iteration.id, IterationId("it-1".to_string()));
        assert_eq!(iteration.status, IterationStatus::Training);
        assert!(!iteration.is_default);

        let round = serde_json::to_string(&iteration).unwrap();
        assert!(round.contains(r#""Status":"Training""#));
        assert!(round.contains(r#""IsDefault":false"#));
    }

    #[test]
    fn test_image_url_batch_wire_format() {
        let batch = ImageUrlBatch {
            urls: vec!["http://a/1.jpg".to_string()],
            tag_ids: vec![TagId("t-1".to_string())],
        };
        let json = serde_json::to_string(&batch).unwrap();
        assert!(json.contains(r#""Urls":["http://a/1.jpg"]"#));
        assert!(json.contains(r#""TagIds":["t-1"]"#));
    }

    #[test]
    fn test_upload_summary_defaults_to_empty() {
        let summary: ImageUploadSummary = serde_json::from_str("{}").unwrap();
        assert!(summary.images.is_empty());
    }
}
