use iris_abstraction::{IterationStatus, TagId};
use std::sync::Mutex;

/// User-facing milestones of one orchestration run.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    ProjectLookup { name: String },
    ProjectRemoved { name: String },
    ProjectCreated { name: String },
    PopulatingImages,
    TagCreated { name: String, id: TagId },
    BatchUploaded { ingested: usize, failed: usize, tags: Vec<String> },
    TrainingStarted,
    TrainingFinished { status: IterationStatus },
    Predicting,
    PredictionResults,
    Prediction { tag: String, probability: f64 },
}

pub trait ProgressSink: Send + Sync {
    fn on_event(&self, event: ProgressEvent);
}

/// Prints progress lines to stdout, one per event.
#[derive(Debug, Default)]
pub struct StdoutProgressSink;

impl ProgressSink for StdoutProgressSink {
    fn on_event(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::ProjectLookup { .. } => println!("Looking for existing project..."),
            ProgressEvent::ProjectRemoved { name } => println!("{name} exists. Cleaning up."),
            ProgressEvent::ProjectCreated { name } => println!("Creating project '{name}'"),
            ProgressEvent::PopulatingImages => println!("Populating Images..."),
            ProgressEvent::TagCreated { name, id } => {
                println!("Created tag: {name} with id: {id}");
            }
            ProgressEvent::BatchUploaded { ingested, failed, tags } => {
                println!(
                    "Populated {ingested} images, with tags {}. Failed: {failed}",
                    tags.join(" ")
                );
            }
            ProgressEvent::TrainingStarted => println!("Let's train the model."),
            // Printed for any terminal status; the run does not branch here.
            ProgressEvent::TrainingFinished { .. } => println!("Training complete."),
            ProgressEvent::Predicting => println!("Making a prediction:"),
            ProgressEvent::PredictionResults => println!("Prediction Results"),
            ProgressEvent::Prediction { tag, probability } => {
                println!("\t{tag}: {:.1}%", probability * 100.0);
            }
        }
    }
}

/// Collects events in memory so tests can assert on the reported sequence.
#[derive(Debug, Default)]
pub struct MemoryProgressSink {
    events: Mutex<Vec<ProgressEvent>>,
}

impl MemoryProgressSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().unwrap_or_else(std::sync::PoisonError::into_inner).clone()
    }
}

impl ProgressSink for MemoryProgressSink {
    fn on_event(&self, event: ProgressEvent) {
        self.events.lock().unwrap_or_else(std::sync::PoisonError::into_inner).push(event);
    }
}
