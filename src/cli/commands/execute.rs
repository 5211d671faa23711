//! Execute command implementation

use super::connect_with;
use crate::cli::error::CliError;
use crate::cli::output::{format_status, format_submission};
use crate::config::ClientConfig;
use tracing::info;

/// Handle the execute command; with `wait`, poll until the task finishes
pub async fn handle_execute(config: &ClientConfig, input: &str, wait: bool) -> Result<(), CliError> {
    let session = connect_with(config, input)?;
    for warning in session.check().warning_messages() {
        eprintln!("⚠️  {}", warning);
    }

    let response = session.execute().await?;
    print!("{}", format_submission(&response));

    if wait && !response.status.is_terminal() {
        info!(task_id = %response.task_id, "Waiting for export to finish");
        let status = session.wait_for_completion(&response.task_id).await?;
        print!("{}", format_status(&status));
    }
    Ok(())
}
