use crate::error::{WorkflowError, WorkflowResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// One batch of labeled images from the input file.
///
/// Many-to-many: every URL in the batch receives every tag in the batch.
/// Empty URL or tag lists are passed through as-is; a batch with zero tags
/// uploads images with zero tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LabeledImageBatch {
    pub urls: Vec<String>,
    pub tags: Vec<String>,
}

/// Reads the input file: a JSON array of labeled image batches.
///
/// A missing file or malformed JSON is fatal; there is no partial recovery.
/// URL well-formedness and tag non-emptiness are not validated.
pub fn load_batches(path: &Path) -> WorkflowResult<Vec<LabeledImageBatch>> {
    let raw = fs::read_to_string(path).map_err(|e| {
        WorkflowError::Dataset(format!("failed to read {}: {e}", path.display()))
    })?;
    serde_json::from_str(&raw).map_err(|e| {
        WorkflowError::Dataset(format!("failed to parse {}: {e}", path.display()))
    })
}
