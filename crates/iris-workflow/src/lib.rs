//! Iris Workflow
//!
//! Orchestration of one end-to-end training run against the hosted
//! classification service:
//! - Loading the labeled-image input file (`dataset`)
//! - Destructive project recreation (`project`)
//! - Tag resolution with at-most-once remote creation (`tags`)
//! - Upload, train/poll, promote, predict (`orchestrator`)
//! - User-facing progress reporting (`progress`)

pub mod dataset;
pub mod error;
pub mod orchestrator;
pub mod progress;
pub mod project;
pub mod tags;

pub use dataset::{load_batches, LabeledImageBatch};
pub use error::{WorkflowError, WorkflowResult};
pub use orchestrator::{
    predict_file, promote_default, run, train_and_await, upload_batches, RunConfig, RunSummary,
    UploadReport, DEFAULT_POLL_INTERVAL,
};
pub use progress::{MemoryProgressSink, ProgressEvent, ProgressSink, StdoutProgressSink};
pub use project::recreate_project;
pub use tags::TagRegistry;
