//! Launching the external YOLO trainer on a prepared dataset.

use log::info;
use std::process::Command;

use crate::config::TrainArgs;
use crate::error::TrainError;

/// `<executable> train model=.. data=.. epochs=.. imgsz=.. batch=..`
pub fn build_train_command(args: &TrainArgs) -> Command {
    let mut cmd = Command::new(&args.executable);
    cmd.arg("train")
        .arg(format!("model={}", args.model))
        .arg(format!("data={}", args.data.display()))
        .arg(format!("epochs={}", args.epochs))
        .arg(format!("imgsz={}", args.imgsz))
        .arg(format!("batch={}", args.batch));
    cmd
}

/// Run the trainer to completion, inheriting stdout and stderr.
pub fn run_training(args: &TrainArgs) -> Result<(), TrainError> {
    if !args.data.is_file() {
        return Err(TrainError::ManifestNotFound(args.data.clone()));
    }

    info!("Starting YOLO training with dataset: {}", args.data.display());
    let status = build_train_command(args)
        .status()
        .map_err(|source| TrainError::Spawn {
            program: args.executable.clone(),
            source,
        })?;

    if status.success() {
        info!("Training finished.");
        Ok(())
    } else {
        Err(TrainError::TrainerFailed(status))
    }
}
