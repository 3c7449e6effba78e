//! End-to-end workflow tests against the in-memory mock service.

use iris_abstraction::{IterationStatus, PredictedTag, PredictionApi};
use iris_client::{MockPredictionApi, MockTrainingApi};
use iris_workflow::{run, MemoryProgressSink, ProgressEvent, RunConfig};
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

fn write_temp(contents: &[u8]) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents).unwrap();
    file
}

fn config_for(data: &tempfile::NamedTempFile, image: &tempfile::NamedTempFile) -> RunConfig {
    RunConfig {
        project_name: "TeamDemo".to_string(),
        project_description: "Demo project".to_string(),
        data_path: data.path().to_path_buf(),
        image_path: image.path().to_path_buf(),
        poll_interval: Duration::from_millis(1),
    }
}

#[tokio::test]
async fn test_full_run_against_mock_service() {
    let data = write_temp(
        br#"[
            {"Urls": ["http://a/1.jpg", "http://a/2.jpg"], "Tags": ["cat"]},
            {"Urls": ["http://b/3.jpg"], "Tags": ["cat", "dog"]}
        ]"#,
    );
    let image = write_temp(&[0xFF, 0xD8, 0xFF, 0xE0]);

    let api = MockTrainingApi::new();
    api.add_project("TeamDemo", "stale");
    api.set_statuses(vec![
        IterationStatus::Training,
        IterationStatus::Training,
        IterationStatus::Completed,
    ]);

    let predictor = Arc::new(MockPredictionApi::with_predictions(vec![
        PredictedTag { tag: "cat".to_string(), probability: 0.97 },
        PredictedTag { tag: "dog".to_string(), probability: 0.03 },
    ]));
    let predictor_handle = Arc::clone(&predictor);

    let progress = MemoryProgressSink::new();
    let summary = run(
        &api,
        move |key| {
            assert_eq!(key, "mock-prediction-key");
            Box::new(ArcPredictor(predictor_handle)) as Box<dyn PredictionApi>
        },
        &config_for(&data, &image),
        &progress,
    )
    .await
    .unwrap();

    // The stale project was replaced, not duplicated.
    assert_eq!(api.deleted_projects().len(), 1);
    assert_eq!(api.projects().len(), 1);
    assert_eq!(summary.project.name, "TeamDemo");

    // One "cat" and one "dog" creation across both batches.
    let names: Vec<String> = api.created_tags().into_iter().map(|t| t.name).collect();
    assert_eq!(names, vec!["cat", "dog"]);

    // Two upload calls with tag-id lists of length 1 and 2.
    let batches = api.submitted_batches();
    assert_eq!(batches.len(), 2);
    assert_eq!(batches[0].tag_ids.len(), 1);
    assert_eq!(batches[1].tag_ids.len(), 2);
    assert_eq!(summary.upload.ingested, 3);
    assert_eq!(summary.upload.failed, 0);

    // Polled twice before the terminal fetch sequence ran out.
    assert_eq!(api.iteration_fetches(), 2);
    assert_eq!(summary.iteration.status, IterationStatus::Completed);
    assert!(summary.iteration.is_default);
    assert_eq!(api.updated_iterations().len(), 1);

    // Exactly one prediction call, carrying the image's raw bytes.
    assert_eq!(predictor.requests().len(), 1);
    assert_eq!(predictor.requests()[0].1, 4);
    assert_eq!(summary.prediction.predictions.len(), 2);

    // Progress reported one line per prediction, in service order.
    let predicted: Vec<String> = progress
        .events()
        .into_iter()
        .filter_map(|e| match e {
            ProgressEvent::Prediction { tag, .. } => Some(tag),
            _ => None,
        })
        .collect();
    assert_eq!(predicted, vec!["cat", "dog"]);
}

#[tokio::test]
async fn test_failed_training_still_promotes_default() {
    let data = write_temp(br#"[{"Urls": ["http://a/1.jpg"], "Tags": ["cat"]}]"#);
    let image = write_temp(&[0x01]);

    let api = MockTrainingApi::new();
    api.set_statuses(vec![IterationStatus::Training, IterationStatus::Failed]);

    let progress = MemoryProgressSink::new();
    let summary = run(
        &api,
        |_key| Box::new(MockPredictionApi::default()) as Box<dyn PredictionApi>,
        &config_for(&data, &image),
        &progress,
    )
    .await
    .unwrap();

    assert_eq!(summary.iteration.status, IterationStatus::Failed);
    assert!(summary.iteration.is_default);
    assert!(progress
        .events()
        .iter()
        .any(|e| matches!(e, ProgressEvent::TrainingFinished { status: IterationStatus::Failed })));
}

#[tokio::test]
async fn test_missing_data_file_aborts_before_any_remote_call() {
    let image = write_temp(&[0x01]);
    let api = MockTrainingApi::new();
    let progress = MemoryProgressSink::new();

    let config = RunConfig {
        project_name: "TeamDemo".to_string(),
        project_description: "Demo project".to_string(),
        data_path: "/nonexistent/imagesData.json".into(),
        image_path: image.path().to_path_buf(),
        poll_interval: Duration::from_millis(1),
    };
    let err = run(
        &api,
        |_key| Box::new(MockPredictionApi::default()) as Box<dyn PredictionApi>,
        &config,
        &progress,
    )
    .await
    .unwrap_err();

    assert!(matches!(err, iris_workflow::WorkflowError::Dataset(_)));
    assert!(api.projects().is_empty());
    assert!(progress.events().is_empty());
}

#[tokio::test]
async fn test_missing_image_file_fails_after_training() {
    let data = write_temp(br#"[{"Urls": ["http://a/1.jpg"], "Tags": ["cat"]}]"#);

    let api = MockTrainingApi::new();
    api.set_statuses(vec![IterationStatus::Completed]);
    let progress = MemoryProgressSink::new();

    let config = RunConfig {
        project_name: "TeamDemo".to_string(),
        project_description: "Demo project".to_string(),
        data_path: data.path().to_path_buf(),
        image_path: "/nonexistent/mostropolis-test.jpg".into(),
        poll_interval: Duration::from_millis(1),
    };
    let err = run(
        &api,
        |_key| Box::new(MockPredictionApi::default()) as Box<dyn PredictionApi>,
        &config,
        &progress,
    )
    .await
    .unwrap_err();

    assert!(matches!(err, iris_workflow::WorkflowError::ImageFile(_)));
    // Training already finished and the iteration was promoted.
    assert_eq!(api.updated_iterations().len(), 1);
}

/// Adapter so the test can keep a handle on the mock the workflow consumes.
struct ArcPredictor(Arc<MockPredictionApi>);

#[async_trait::async_trait]
impl PredictionApi for ArcPredictor {
    async fn predict_image(
        &self,
        project_id: &iris_abstraction::ProjectId,
        image: Vec<u8>,
    ) -> Result<iris_abstraction::ImagePrediction, iris_abstraction::ApiError> {
        self.0.predict_image(project_id, image).await
    }
}
