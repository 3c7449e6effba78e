//! Service client implementations for Iris.
//!
//! This crate provides concrete implementations of the `TrainingApi` and
//! `PredictionApi` traits.
//!
//! # Implementations
//!
//! - **Mock**: In-memory, scriptable, for testing and development
//! - **HTTP**: `TrainingClient` / `PredictionClient` against the hosted
//!   service (training key required)

pub mod prediction;
pub mod training;

use async_trait::async_trait;
use iris_abstraction::{
    AccountInfo, ApiError, CreatedImage, ImagePrediction, ImageUploadSummary, ImageUrlBatch,
    Iteration, IterationId, IterationStatus, PredictedTag, PredictionApi, Project, ProjectId, Tag,
    TagId, TrainingApi,
};
use std::collections::VecDeque;
use std::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

pub use prediction::PredictionClient;
pub use training::{TrainingClient, DEFAULT_ENDPOINT, TRAINING_KEY_VAR};

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

/// A mock implementation of the `TrainingApi` trait for testing.
///
/// Remote state lives in memory; every mutating call is recorded so tests
/// can assert on exactly what the workflow asked the service to do. The
/// iteration status returned by `train_project` and each subsequent
/// `get_iteration` call follows a configurable script, defaulting to
/// `Training` at train time and `Completed` once the script runs out.
#[derive(Debug, Default)]
pub struct MockTrainingApi {
    state: Mutex<MockTrainingState>,
}

#[derive(Debug)]
struct MockTrainingState {
    projects: Vec<Project>,
    created_tags: Vec<Tag>,
    deleted_projects: Vec<ProjectId>,
    submitted_batches: Vec<ImageUrlBatch>,
    rejected_urls: Vec<String>,
    statuses: VecDeque<IterationStatus>,
    current_iteration: Option<IterationId>,
    iteration_fetches: usize,
    updated_iterations: Vec<Iteration>,
    prediction_key: String,
}

impl Default for MockTrainingState {
    fn default() -> Self {
        Self {
            projects: Vec::new(),
            created_tags: Vec::new(),
            deleted_projects: Vec::new(),
            submitted_batches: Vec::new(),
            rejected_urls: Vec::new(),
            statuses: VecDeque::new(),
            current_iteration: None,
            iteration_fetches: 0,
            updated_iterations: Vec::new(),
            prediction_key: "mock-prediction-key".to_string(),
        }
    }
}

impl MockTrainingApi {
    /// Creates an empty mock service.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the mock with a pre-existing project.
    pub fn add_project(&self, name: &str, description: &str) -> Project {
        let project = Project {
            id: ProjectId(Uuid::new_v4().to_string()),
            name: name.to_string(),
            description: description.to_string(),
        };
        lock(&self.state).projects.push(project.clone());
        project
    }

    /// Scripts the iteration statuses handed out by `train_project` and each
    /// subsequent `get_iteration` call, in order. Once exhausted, every
    /// fetch reports `Completed`.
    pub fn set_statuses(&self, statuses: Vec<IterationStatus>) {
        lock(&self.state).statuses = statuses.into();
    }

    /// Marks a URL as one the service will refuse to ingest.
    pub fn reject_url(&self, url: &str) {
        lock(&self.state).rejected_urls.push(url.to_string());
    }

    /// Tags created so far, in creation order.
    #[must_use]
    pub fn created_tags(&self) -> Vec<Tag> {
        lock(&self.state).created_tags.clone()
    }

    /// Projects deleted so far.
    #[must_use]
    pub fn deleted_projects(&self) -> Vec<ProjectId> {
        lock(&self.state).deleted_projects.clone()
    }

    /// Projects currently live on the mock service.
    #[must_use]
    pub fn projects(&self) -> Vec<Project> {
        lock(&self.state).projects.clone()
    }

    /// Image batches submitted so far, in submission order.
    #[must_use]
    pub fn submitted_batches(&self) -> Vec<ImageUrlBatch> {
        lock(&self.state).submitted_batches.clone()
    }

    /// Number of `get_iteration` calls made so far.
    #[must_use]
    pub fn iteration_fetches(&self) -> usize {
        lock(&self.state).iteration_fetches
    }

    /// Iterations passed to `update_iteration`, in call order.
    #[must_use]
    pub fn updated_iterations(&self) -> Vec<Iteration> {
        lock(&self.state).updated_iterations.clone()
    }

    fn next_status(state: &mut MockTrainingState, default: IterationStatus) -> IterationStatus {
        state.statuses.pop_front().unwrap_or(default)
    }
}

#[async_trait]
impl TrainingApi for MockTrainingApi {
    async fn list_projects(&self) -> Result<Vec<Project>, ApiError> {
        Ok(lock(&self.state).projects.clone())
    }

    async fn create_project(&self, name: &str, description: &str) -> Result<Project, ApiError> {
        debug!(name = %name, "MockTrainingApi creating project");
        Ok(self.add_project(name, description))
    }

    async fn delete_project(&self, project_id: &ProjectId) -> Result<(), ApiError> {
        let mut state = lock(&self.state);
        state.projects.retain(|p| &p.id != project_id);
        state.deleted_projects.push(project_id.clone());
        Ok(())
    }

    async fn create_tag(&self, _project_id: &ProjectId, name: &str) -> Result<Tag, ApiError> {
        let tag = Tag { id: TagId(Uuid::new_v4().to_string()), name: name.to_string() };
        lock(&self.state).created_tags.push(tag.clone());
        Ok(tag)
    }

    async fn create_images_from_urls(
        &self,
        _project_id: &ProjectId,
        batch: &ImageUrlBatch,
    ) -> Result<ImageUploadSummary, ApiError> {
        let mut state = lock(&self.state);
        state.submitted_batches.push(batch.clone());
        let images = batch
            .urls
            .iter()
            .filter(|url| !state.rejected_urls.contains(*url))
            .map(|url| CreatedImage {
                id: Uuid::new_v4().to_string(),
                image_uri: Some(url.clone()),
            })
            .collect();
        Ok(ImageUploadSummary { images })
    }

    async fn train_project(&self, _project_id: &ProjectId) -> Result<Iteration, ApiError> {
        let mut state = lock(&self.state);
        let id = IterationId(Uuid::new_v4().to_string());
        state.current_iteration = Some(id.clone());
        let status = Self::next_status(&mut state, IterationStatus::Training);
        Ok(Iteration { id, name: "Iteration 1".to_string(), status, is_default: false })
    }

    async fn get_iteration(
        &self,
        _project_id: &ProjectId,
        iteration_id: &IterationId,
    ) -> Result<Iteration, ApiError> {
        let mut state = lock(&self.state);
        state.iteration_fetches += 1;
        let status = Self::next_status(&mut state, IterationStatus::Completed);
        Ok(Iteration {
            id: iteration_id.clone(),
            name: "Iteration 1".to_string(),
            status,
            is_default: false,
        })
    }

    async fn update_iteration(
        &self,
        _project_id: &ProjectId,
        iteration: &Iteration,
    ) -> Result<Iteration, ApiError> {
        lock(&self.state).updated_iterations.push(iteration.clone());
        Ok(iteration.clone())
    }

    async fn get_account_info(&self) -> Result<AccountInfo, ApiError> {
        Ok(AccountInfo { prediction_key: lock(&self.state).prediction_key.clone() })
    }
}

/// A mock implementation of the `PredictionApi` trait for testing.
#[derive(Debug, Default)]
pub struct MockPredictionApi {
    predictions: Vec<PredictedTag>,
    requests: Mutex<Vec<(ProjectId, usize)>>,
}

impl MockPredictionApi {
    /// Creates a mock that returns the given predictions for every call.
    #[must_use]
    pub fn with_predictions(predictions: Vec<PredictedTag>) -> Self {
        Self { predictions, requests: Mutex::new(Vec::new()) }
    }

    /// The (project id, image byte length) pairs seen so far.
    #[must_use]
    pub fn requests(&self) -> Vec<(ProjectId, usize)> {
        lock(&self.requests).clone()
    }
}

#[async_trait]
impl PredictionApi for MockPredictionApi {
    async fn predict_image(
        &self,
        project_id: &ProjectId,
        image: Vec<u8>,
    ) -> Result<ImagePrediction, ApiError> {
        debug!(project_id = %project_id, image_bytes = image.len(), "MockPredictionApi predicting");
        lock(&self.requests).push((project_id.clone(), image.len()));
        Ok(ImagePrediction { predictions: self.predictions.clone() })
    }
}
