//! Validate command implementation

use super::{connect_with, load_configuration};
use crate::cli::error::CliError;
use crate::cli::output::format_report;
use crate::config::ClientConfig;
use crate::session::SubmissionReport;
use crate::validation::validate_configuration;

/// Handle the validate command
///
/// Runs the local checks, and with `remote` also asks the backend.
pub async fn handle_validate(config: &ClientConfig, input: &str, remote: bool) -> Result<(), CliError> {
    let report = if remote {
        connect_with(config, input)?.validate().await?
    } else {
        let store = load_configuration(input, config.default_format)?;
        SubmissionReport::local(&validate_configuration(store.configuration()))
    };

    print!("{}", format_report(&report));
    if report.valid {
        Ok(())
    } else {
        Err(CliError::ValidationFailed(report.errors.len()))
    }
}
