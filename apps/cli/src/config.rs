//! CLI configuration loading.

use anyhow::Context;
use iris_client::TRAINING_KEY_VAR;

/// Reads the training key from the environment.
///
/// The key is the only mandatory piece of configuration; everything else
/// has a flag with a default. Absence is fatal.
pub fn training_key() -> anyhow::Result<String> {
    std::env::var(TRAINING_KEY_VAR)
        .with_context(|| format!("{TRAINING_KEY_VAR} environment variable not set"))
}
