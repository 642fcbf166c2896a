//! Ask command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use crate::story::OutputFormat;
use anyhow::Result;

/// Run the ask command: generate one story and print it.
pub async fn run_ask(query: &str, format: &str, settings: Settings) -> Result<()> {
    let format: OutputFormat = format.parse().map_err(|e: String| anyhow::anyhow!(e))?;

    if let Err(e) = preflight::check(Operation::Generate, &settings) {
        Output::error(&e.to_string());
        return Err(e.into());
    }

    let orchestrator = Orchestrator::new(&settings).await?;

    let spinner = Output::spinner("Finding vocabulary and writing story...");
    let result = orchestrator.generate_formatted(query, format).await;
    spinner.finish_and_clear();

    match result {
        Ok(output) => {
            println!("{}", output.body);
        }
        Err(e) => {
            Output::error(&format!("Failed to generate story: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
