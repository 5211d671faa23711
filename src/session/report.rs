//! Submission report shown after "validate"

use crate::api::ValidationResponse;
use crate::validation::ConfigurationValidationResult;
use serde::Serialize;

/// Combined outcome of local and backend validation
///
/// Every error and warning is kept; a failed report never ends the
/// session, the user adjusts the configuration and submits again.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SubmissionReport {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    /// Whether the backend was asked (it is skipped when local checks fail)
    pub checked_remotely: bool,
}

impl SubmissionReport {
    pub fn local(result: &ConfigurationValidationResult) -> Self {
        Self {
            valid: result.is_valid(),
            errors: result.error_messages(),
            warnings: result.warning_messages(),
            checked_remotely: false,
        }
    }

    /// Local warnings first, then whatever the backend reported
    pub fn merge_remote(mut self, response: ValidationResponse) -> Self {
        self.valid = self.valid && response.valid;
        self.errors.extend(response.errors);
        for warning in response.warnings {
            if !self.warnings.contains(&warning) {
                self.warnings.push(warning);
            }
        }
        self.checked_remotely = true;
        self
    }
}
