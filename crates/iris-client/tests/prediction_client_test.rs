//! Integration tests for the prediction HTTP client against a mock server.

use iris_abstraction::{PredictionApi, ProjectId};
use iris_client::PredictionClient;

#[tokio::test]
async fn test_predict_image_posts_raw_bytes_with_prediction_key() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("POST", "/Prediction/p-1/image")
        .match_header("prediction-key", "pk-1")
        .match_header("content-type", "application/octet-stream")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{
                "Predictions": [
                    {"Tag": "cat", "Probability": 0.987},
                    {"Tag": "dog", "Probability": 0.013}
                ]
            }"#,
        )
        .create_async()
        .await;

    let client = PredictionClient::with_base_url("pk-1".to_string(), server.url());
    let result = client
        .predict_image(&ProjectId("p-1".to_string()), vec![0xFF, 0xD8, 0xFF])
        .await
        .unwrap();

    // Predictions come back in service order, untouched.
    assert_eq!(result.predictions.len(), 2);
    assert_eq!(result.predictions[0].tag, "cat");
    assert!((result.predictions[0].probability - 0.987).abs() < f64::EPSILON);
    assert_eq!(result.predictions[1].tag, "dog");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_predict_image_maps_service_errors() {
    let mut server = mockito::Server::new_async().await;

    let _mock = server
        .mock("POST", "/Prediction/p-1/image")
        .with_status(404)
        .with_body("Project not found")
        .create_async()
        .await;

    let client = PredictionClient::with_base_url("pk-1".to_string(), server.url());
    let err = client.predict_image(&ProjectId("p-1".to_string()), vec![1]).await.unwrap_err();

    match err {
        iris_abstraction::ApiError::ServiceError { status, message } => {
            assert_eq!(status, 404);
            assert_eq!(message, "Project not found");
        }
        other => panic!("expected ServiceError, got {other:?}"),
    }
}
