//! Collections command implementation

use super::connect;
use crate::cli::error::CliError;
use crate::cli::output::format_collections;
use crate::config::ClientConfig;

/// Handle the collections command
pub async fn handle_collections(config: &ClientConfig, json: bool) -> Result<(), CliError> {
    let mut session = connect(config)?;
    let catalog = session.load_catalog().await?;

    if json {
        let options = catalog.options();
        let rendered = serde_json::to_string_pretty(&options)
            .map_err(|e| CliError::InvalidArgument(format!("Failed to render JSON: {}", e)))?;
        println!("{}", rendered);
    } else {
        print!("{}", format_collections(catalog));
    }
    Ok(())
}
