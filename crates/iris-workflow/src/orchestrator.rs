//! The end-to-end training run: upload, train, poll, promote, predict.

use crate::dataset::{load_batches, LabeledImageBatch};
use crate::error::{WorkflowError, WorkflowResult};
use crate::progress::{ProgressEvent, ProgressSink};
use crate::tags::TagRegistry;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use iris_abstraction::{
    ImagePrediction, ImageUrlBatch, Iteration, PredictionApi, Project, TrainingApi,
};
use tracing::{debug, info};

/// How long the poll loop sleeps between iteration status fetches.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Totals across all batch uploads in a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadReport {
    pub batches: usize,
    pub submitted: usize,
    pub ingested: usize,
    pub failed: usize,
}

/// Inputs for one orchestration run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub project_name: String,
    pub project_description: String,
    pub data_path: PathBuf,
    pub image_path: PathBuf,
    pub poll_interval: Duration,
}

/// What one complete run produced.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub project: Project,
    pub upload: UploadReport,
    pub iteration: Iteration,
    pub prediction: ImagePrediction,
}

/// Uploads every batch, creating each distinct tag remotely at most once.
///
/// Per batch: tags are resolved in the batch's own order, so the tag-id
/// list submitted alongside the URLs has the same length and order as the
/// batch's tag list. The service's response names only the images it
/// accepted; the shortfall is reported as a count and never retried.
pub async fn upload_batches(
    api: &dyn TrainingApi,
    project: &Project,
    batches: &[LabeledImageBatch],
    registry: &mut TagRegistry,
    progress: &dyn ProgressSink,
) -> WorkflowResult<UploadReport> {
    progress.on_event(ProgressEvent::PopulatingImages);
    let mut report = UploadReport::default();

    for batch in batches {
        let mut tag_ids = Vec::with_capacity(batch.tags.len());
        for tag in &batch.tags {
            let known = registry.get(tag).is_some();
            let id = registry.get_or_create(api, &project.id, tag).await?;
            if !known {
                progress.on_event(ProgressEvent::TagCreated {
                    name: tag.clone(),
                    id: id.clone(),
                });
            }
            tag_ids.push(id);
        }

        let submission = ImageUrlBatch { urls: batch.urls.clone(), tag_ids };
        let summary = api.create_images_from_urls(&project.id, &submission).await?;

        let ingested = summary.images.len();
        let failed = batch.urls.len().saturating_sub(ingested);
        progress.on_event(ProgressEvent::BatchUploaded {
            ingested,
            failed,
            tags: batch.tags.clone(),
        });

        report.batches += 1;
        report.submitted += batch.urls.len();
        report.ingested += ingested;
        report.failed += failed;
    }

    Ok(report)
}

/// Starts a training run and polls until the iteration leaves `Training`.
///
/// The loop sleeps a fixed interval and re-fetches the iteration by id on
/// every pass; a cached status is never reused. There is no timeout, no
/// backoff, and no iteration cap.
pub async fn train_and_await(
    api: &dyn TrainingApi,
    project: &Project,
    poll_interval: Duration,
    progress: &dyn ProgressSink,
) -> WorkflowResult<Iteration> {
    progress.on_event(ProgressEvent::TrainingStarted);
    let mut iteration = api.train_project(&project.id).await?;
    info!(iteration_id = %iteration.id, status = %iteration.status, "Training started");

    while !iteration.status.is_terminal() {
        tokio::time::sleep(poll_interval).await;
        iteration = api.get_iteration(&project.id, &iteration.id).await?;
        debug!(iteration_id = %iteration.id, status = %iteration.status, "Polled iteration");
    }

    info!(iteration_id = %iteration.id, status = %iteration.status, "Training finished");
    progress.on_event(ProgressEvent::TrainingFinished { status: iteration.status.clone() });
    Ok(iteration)
}

/// Marks the iteration as the project's default endpoint and persists it.
///
/// The terminal status is not inspected here: a run that ended in `Failed`
/// is promoted all the same, if the service accepts the update.
pub async fn promote_default(
    api: &dyn TrainingApi,
    project: &Project,
    mut iteration: Iteration,
) -> WorkflowResult<Iteration> {
    iteration.is_default = true;
    Ok(api.update_iteration(&project.id, &iteration).await?)
}

/// Sends one local image file to the prediction endpoint and reports each
/// returned (label, probability) pair in service order.
pub async fn predict_file(
    api: &dyn PredictionApi,
    project: &Project,
    path: &Path,
    progress: &dyn ProgressSink,
) -> WorkflowResult<ImagePrediction> {
    let image = fs::read(path).map_err(|e| {
        WorkflowError::ImageFile(format!("failed to read {}: {e}", path.display()))
    })?;

    progress.on_event(ProgressEvent::Predicting);
    let result = api.predict_image(&project.id, image).await?;

    progress.on_event(ProgressEvent::PredictionResults);
    for prediction in &result.predictions {
        progress.on_event(ProgressEvent::Prediction {
            tag: prediction.tag.clone(),
            probability: prediction.probability,
        });
    }
    Ok(result)
}

/// Runs the whole workflow: load, recreate, upload, train, promote, predict.
///
/// The prediction client is built lazily via `make_predictor` because its
/// credential only becomes known once account info is fetched after
/// training. Remote failures at any step abort the run.
pub async fn run<F>(
    api: &dyn TrainingApi,
    make_predictor: F,
    config: &RunConfig,
    progress: &dyn ProgressSink,
) -> WorkflowResult<RunSummary>
where
    F: FnOnce(String) -> Box<dyn PredictionApi>,
{
    let batches = load_batches(&config.data_path)?;

    let project = crate::project::recreate_project(
        api,
        &config.project_name,
        &config.project_description,
        progress,
    )
    .await?;

    let mut registry = TagRegistry::new();
    let upload = upload_batches(api, &project, &batches, &mut registry, progress).await?;

    let iteration = train_and_await(api, &project, config.poll_interval, progress).await?;
    let iteration = promote_default(api, &project, iteration).await?;

    let account = api.get_account_info().await?;
    let predictor = make_predictor(account.prediction_key);
    let prediction = predict_file(predictor.as_ref(), &project, &config.image_path, progress).await?;

    Ok(RunSummary { project, upload, iteration, prediction })
}
