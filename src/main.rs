//! Salary Estimator - Main Entry Point
//!
//! Trains the model bank, serves single and batch estimates, and validates requests.

use clap::Parser;
use salary_estimator::cli::{cmd_info, cmd_predict, cmd_train, cmd_validate, Cli, Commands};

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "salary_estimator=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Train { data, target, model, test_fraction, seed, config, clean, output } => {
            cmd_train(&data, &target, &model, test_fraction, seed, config.as_deref(), clean, &output)?;
        }
        Commands::Predict { bundle, record, data, model, history, output } => {
            cmd_predict(
                &bundle,
                record.as_deref(),
                data.as_deref(),
                model.as_deref(),
                history.as_deref(),
                output.as_deref(),
            )?;
        }
        Commands::Validate { record } => {
            cmd_validate(&record)?;
        }
        Commands::Info { data, target } => {
            cmd_info(&data, &target)?;
        }
    }

    Ok(())
}
