use clap::Parser;

use log::{error, info};
use std::process::ExitCode;

use folder2yolo::{run_prepare, run_training, Args, Command};

fn main() -> ExitCode {
    // Initialize the logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    match args.command {
        Command::Prepare(prepare) => {
            info!("Starting the conversion process...");
            match run_prepare(&prepare) {
                Ok(summary) => {
                    info!("Dataset preparation complete!");
                    info!("Manifest written to: {}", summary.dataset_yaml.display());
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    error!("Failed to process dataset: {}", e);
                    ExitCode::FAILURE
                }
            }
        }
        Command::Train(train) => match run_training(&train) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                error!("Training failed: {}", e);
                ExitCode::FAILURE
            }
        },
    }
}
