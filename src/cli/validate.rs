use std::path::PathBuf;

use console::style;

use crate::cli::commands::ValidateArgs;
use crate::config::{self, parser::schema_warnings};
use crate::errors::KycError;

pub async fn handle_validate(args: ValidateArgs) -> Result<(), KycError> {
    let path = PathBuf::from(&args.config);
    let config = config::load_config(&path).await?;

    let content = tokio::fs::read_to_string(&path).await?;
    let yaml: serde_yaml::Value = serde_yaml::from_str(&content)?;
    let warnings = if yaml.is_null() { Vec::new() } else { schema_warnings(&yaml)? };

    println!("Configuration is valid: {}", args.config);
    println!(
        "  storage: {:?}, corroboration: {}, step delay: {} ms",
        config.backend(),
        config.corroboration(),
        config.step_delay().as_millis()
    );
    for warning in &warnings {
        println!("  {} {}", style("warning:").yellow(), warning);
    }
    Ok(())
}
