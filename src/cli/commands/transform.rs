//! Transform command implementation

use super::load_configuration;
use crate::cli::error::CliError;
use crate::config::ClientConfig;
use crate::export::transform;

/// Handle the transform command: print the backend payload for a
/// configuration file without contacting the backend
pub fn handle_transform(config: &ClientConfig, input: &str) -> Result<(), CliError> {
    let store = load_configuration(input, config.default_format)?;
    let payload = transform(store.configuration());
    let rendered = payload
        .to_json_pretty()
        .map_err(|e| CliError::InvalidArgument(e.to_string()))?;
    println!("{}", rendered);
    Ok(())
}
