//! Submission Validation
//!
//! Structural checks performed on a submission before it reaches the
//! engine:
//! - Submission is not empty
//! - Every step names a capability
//! - Duplicate sequence numbers (allowed, but reported)
//!
//! Capability ids are not checked here; the pipeline builder resolves
//! them against the registry and fails the whole run if one is unknown.

use std::collections::HashMap;

use log::{debug, info, warn};

use super::model::{StepDescriptor, Submission};

/// Validation error types for user-friendly error messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    EmptySubmission,
    EmptyCapabilityId { seq: i64 },
    EmptyAdditionalInputId,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptySubmission => write!(f, "Submission has no steps"),
            Self::EmptyCapabilityId { seq } => {
                write!(f, "Step at seq {} has an empty capability id", seq)
            }
            Self::EmptyAdditionalInputId => {
                write!(f, "An additional input has an empty capability id")
            }
        }
    }
}

/// Validates a single step's fields.
fn validate_step(step: &StepDescriptor) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if step.capability_id.trim().is_empty() {
        errors.push(ValidationError::EmptyCapabilityId { seq: step.seq });
        return errors;
    }

    if step.display_name.trim().is_empty() {
        debug!("Step '{}' (seq {}) has no display name", step.capability_id, step.seq);
    }

    errors
}

/// Validates the entire submission.
///
/// Returns every problem found rather than stopping at the first one.
/// Steps that share a `seq` value are accepted; they run in submission
/// order.
pub fn validate_submission(submission: &Submission) -> Result<(), Vec<ValidationError>> {
    info!("Validating submission with {} steps", submission.len());

    if submission.is_empty() {
        return Err(vec![ValidationError::EmptySubmission]);
    }

    let mut errors: Vec<ValidationError> =
        submission.steps.iter().flat_map(validate_step).collect();

    if submission
        .additional_input
        .iter()
        .any(|extra| extra.capability_id.trim().is_empty())
    {
        errors.push(ValidationError::EmptyAdditionalInputId);
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    for (seq, count) in duplicate_seqs(submission) {
        warn!(
            "{} steps share seq {}; they will run in submission order",
            count, seq
        );
    }

    info!("Submission validated: {} steps", submission.len());
    Ok(())
}

/// Returns `(seq, count)` for every sequence number used more than once.
fn duplicate_seqs(submission: &Submission) -> Vec<(i64, usize)> {
    let mut counts: HashMap<i64, usize> = HashMap::new();
    for step in &submission.steps {
        *counts.entry(step.seq).or_default() += 1;
    }

    let mut duplicates: Vec<(i64, usize)> =
        counts.into_iter().filter(|(_, count)| *count > 1).collect();
    duplicates.sort();
    duplicates
}

/// Quick validation that returns a list of error messages.
///
/// Useful for surfacing feedback without failing.
pub fn quick_validate(submission: &Submission) -> Vec<String> {
    let mut errors = Vec::new();

    if submission.is_empty() {
        errors.push("Submission has no steps".to_string());
        return errors;
    }

    for step in &submission.steps {
        if step.capability_id.trim().is_empty() {
            errors.push(format!("Step at seq {}: missing capability id", step.seq));
        }
    }

    for (seq, count) in duplicate_seqs(submission) {
        errors.push(format!("{} steps share seq {}", count, seq));
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::AdditionalInput;

    #[test]
    fn test_valid_submission() {
        let submission = Submission::from_steps(vec![
            StepDescriptor::new("fetch", 1).with_input("example.com"),
            StepDescriptor::new("summarize", 2),
        ]);
        assert!(validate_submission(&submission).is_ok());
    }

    #[test]
    fn test_empty_submission() {
        let submission = Submission::default();
        let errors = validate_submission(&submission).unwrap_err();
        assert_eq!(errors, vec![ValidationError::EmptySubmission]);
    }

    #[test]
    fn test_empty_capability_id() {
        let submission = Submission::from_steps(vec![
            StepDescriptor::new("   ", 4),
            StepDescriptor::new("ok", 5),
        ]);
        let errors = validate_submission(&submission).unwrap_err();
        assert_eq!(errors, vec![ValidationError::EmptyCapabilityId { seq: 4 }]);
    }

    #[test]
    fn test_empty_additional_input_id() {
        let submission = Submission::from_steps(vec![StepDescriptor::new("ok", 1)])
            .with_additional_input(AdditionalInput::new("", "x"));
        let errors = validate_submission(&submission).unwrap_err();
        assert!(errors.contains(&ValidationError::EmptyAdditionalInputId));
    }

    #[test]
    fn test_duplicate_seq_is_allowed() {
        let submission = Submission::from_steps(vec![
            StepDescriptor::new("a", 1),
            StepDescriptor::new("b", 1),
        ]);
        assert!(validate_submission(&submission).is_ok());
        assert_eq!(duplicate_seqs(&submission), vec![(1, 2)]);
    }

    #[test]
    fn test_quick_validate_empty() {
        let errors = quick_validate(&Submission::default());
        assert!(!errors.is_empty());
        assert!(errors[0].contains("no steps"));
    }

    #[test]
    fn test_quick_validate_reports_duplicates() {
        let submission = Submission::from_steps(vec![
            StepDescriptor::new("a", 7),
            StepDescriptor::new("b", 7),
            StepDescriptor::new("", 8),
        ]);
        let errors = quick_validate(&submission);
        assert!(errors.iter().any(|e| e.contains("missing capability id")));
        assert!(errors.iter().any(|e| e.contains("share seq 7")));
    }

    #[test]
    fn test_quick_validate_valid() {
        let submission = Submission::from_steps(vec![StepDescriptor::new("a", 1)]);
        assert!(quick_validate(&submission).is_empty());
    }

    #[test]
    fn test_validation_error_display() {
        assert_eq!(
            ValidationError::EmptySubmission.to_string(),
            "Submission has no steps"
        );
        assert!(ValidationError::EmptyCapabilityId { seq: 9 }
            .to_string()
            .contains("seq 9"));
    }
}
