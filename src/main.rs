//! Command-line driver: simulate a 0D model from a JSON configuration.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::info;

use hemoflow::errors::{HemoflowError, Result};
use hemoflow::io::{config, writer};
use hemoflow::solve;

/// Lumped-parameter (0D) hemodynamics solver for vascular networks.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the JSON configuration file.
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Path to the output file; the format is chosen by suffix
    /// (.csv or .json).
    #[arg(value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// Only read and validate the configuration, then exit.
    #[arg(long)]
    validate_only: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt::init();
    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<()> {
    let text = std::fs::read_to_string(&args.config)?;
    let config: serde_json::Value = serde_json::from_str(&text)?;

    let params = config::load_simulation_params(&config)?;
    let mut model = config::load_model(&config)?;
    let state = config::load_initial_condition(&config, &model)?;
    info!(
        blocks = model.num_blocks(false),
        dofs = model.dofhandler.size(),
        "model assembled"
    );

    if args.validate_only {
        info!("configuration is valid");
        return Ok(());
    }
    let output = args.output.as_ref().ok_or_else(|| {
        HemoflowError::Configuration("an output path is required unless --validate-only".into())
    })?;

    let results = solve::run_simulation(&mut model, &params, state)?;

    let rendered = match output.extension().and_then(|e| e.to_str()) {
        Some("csv") => {
            if params.output_variable_based {
                writer::to_variable_csv(
                    &results,
                    &model,
                    params.output_mean_only,
                    params.output_derivative,
                )
            } else {
                writer::to_vessel_csv(
                    &results,
                    &model,
                    params.output_mean_only,
                    params.output_derivative,
                )
            }
        }
        Some("json") => writer::to_json(&results, &model, params.output_derivative)?,
        _ => {
            return Err(HemoflowError::Configuration(format!(
                "unsupported output format: {}",
                output.display()
            )))
        }
    };
    std::fs::write(output, rendered)?;
    info!(output = %output.display(), "results written");
    Ok(())
}
