//! Status command implementation

use super::connect;
use crate::cli::error::CliError;
use crate::cli::output::format_status;
use crate::config::ClientConfig;

pub async fn handle_status(config: &ClientConfig, task_id: &str) -> Result<(), CliError> {
    let status = connect(config)?.status(task_id).await?;
    print!("{}", format_status(&status));
    Ok(())
}
