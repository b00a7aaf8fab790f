//! Submission Parser
//!
//! Loads submissions from JSON or YAML files. JSON files use the same
//! request shape the web client posts; anything else is read as YAML.

use std::fs;
use std::path::Path;

use log::{debug, info};

use crate::error::SubmissionError;

use super::model::Submission;
use super::validator::validate_submission;

/// Loads and validates a submission from a file.
///
/// # Arguments
///
/// * `path` - Path to a `.json` file or a YAML file
///
/// # Returns
///
/// * `Ok(Submission)` - Parsed and structurally valid submission
/// * `Err` - Read, parse or validation error
///
/// # Example
///
/// ```rust,no_run
/// use nodeflow::workflow::load_submission;
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let submission = load_submission("flow.json")?;
///     println!("Loaded {} steps", submission.len());
///     Ok(())
/// }
/// ```
pub fn load_submission(path: impl AsRef<Path>) -> Result<Submission, SubmissionError> {
    let path = path.as_ref();
    info!("Loading submission from: {}", path.display());

    let content = fs::read_to_string(path).map_err(|source| SubmissionError::Io {
        path: path.display().to_string(),
        source,
    })?;

    debug!("Submission content loaded ({} bytes)", content.len());

    let submission = if is_json(path) {
        parse_json(&content)?
    } else {
        parse_yaml(&content)?
    };

    info!(
        "Parsed {} steps, {} additional inputs",
        submission.steps.len(),
        submission.additional_input.len()
    );

    validate_submission(&submission).map_err(SubmissionError::Invalid)?;
    Ok(submission)
}

/// Parses a submission from a JSON string without validating it.
pub fn parse_json(content: &str) -> Result<Submission, SubmissionError> {
    Ok(serde_json::from_str(content)?)
}

/// Parses a submission from a YAML string without validating it.
pub fn parse_yaml(content: &str) -> Result<Submission, SubmissionError> {
    Ok(serde_yaml::from_str(content)?)
}

/// Saves a submission to a YAML file.
pub fn save_submission(
    submission: &Submission,
    path: impl AsRef<Path>,
) -> Result<(), SubmissionError> {
    let path = path.as_ref();
    let yaml_content = serde_yaml::to_string(submission)?;
    fs::write(path, yaml_content).map_err(|source| SubmissionError::Io {
        path: path.display().to_string(),
        source,
    })?;
    info!("Submission saved to: {}", path.display());
    Ok(())
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false)
}
