use std::process::ExitCode;

use anyhow::{Context, Error};
use clap::Parser;
use log::{error, info, LevelFilter};

use imagecustomizer::{
    cli::{Cli, Commands},
    validation, FileLog, MultiLogger, IMAGE_CUSTOMIZER_VERSION,
};
use imagecustomizer_api::error::{ImageCustomizerError, ImageCustomizerResultExt};

fn run(args: &Cli) -> Result<(), ImageCustomizerError> {
    // Log version ASAP
    info!("Image Customizer version: {}", IMAGE_CUSTOMIZER_VERSION);

    let res = match &args.command {
        Commands::Validate { config } => validation::validate_config_file(config),
        Commands::Resolve {
            config,
            output,
            error,
        } => {
            let res = validation::resolve_config_file(config, output.as_deref());

            // return error if requested
            if let (Some(error_path), Err(e)) = (error.as_ref(), &res) {
                if let Err(e2) =
                    std::fs::write(error_path, serde_yaml::to_string(e).unwrap_or_default())
                {
                    error!("Failed to write error to file: {e2}");
                }
            }

            res
        }
    };

    res.message(format!("Failed to execute '{}' command", args.command))
}

fn setup_logging(args: &Cli) -> Result<(), Error> {
    // Regular env_logger to output to stderr
    let mut multilogger = MultiLogger::new().with_logger(
        Box::new(
            env_logger::builder()
                .format_timestamp(None)
                .filter_level(args.verbosity)
                .build(),
        ),
        args.verbosity,
    );

    if let Some(log_file) = &args.log_file {
        multilogger.add_logger(FileLog::new(log_file)?.into_logger(), LevelFilter::Trace);
    }

    multilogger.init().context("Logger already registered")?;

    Ok(())
}

fn main() -> ExitCode {
    // Parse args
    let args = Cli::parse();

    // Initialize the loggers
    if let Err(e) = setup_logging(&args) {
        eprintln!("Failed to initialize logging: {e:?}");
        return ExitCode::from(1);
    }

    if let Err(e) = run(&args) {
        error!("Image Customizer failed: {e:?}");
        return ExitCode::from(2);
    }

    ExitCode::SUCCESS
}
