use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::str::FromStr;

/// Convert a folder-per-class image archive into a YOLO detection dataset.
#[derive(Parser, Debug, Clone)]
#[command(version, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Build the images/labels tree and dataset.yaml
    Prepare(PrepareArgs),
    /// Run the external YOLO trainer against a dataset.yaml
    Train(TrainArgs),
}

#[derive(ClapArgs, Debug, Clone)]
pub struct PrepareArgs {
    /// Directory containing one subdirectory per class
    #[arg(short = 'i', long = "input_dir")]
    pub input_dir: PathBuf,

    /// Directory that receives images/, labels/ and dataset.yaml
    #[arg(short = 'o', long = "output_dir", default_value = "yolo_dataset")]
    pub output_dir: PathBuf,

    /// Proportion of the dataset to use for validation
    #[arg(long = "val_size", default_value_t = 0.2, value_parser = validate_size)]
    pub val_size: f64,

    /// Seed for random shuffling
    #[arg(long = "seed", default_value_t = 42)]
    pub seed: u64,

    /// How images are assigned to the train and val splits
    #[arg(long = "split", value_enum, default_value = "random")]
    pub split: SplitMode,

    /// Ordered class list; ids follow list position. Discovered from the
    /// sorted class directories when empty
    #[arg(value_delimiter = ',')]
    pub label_list: Vec<String>,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct TrainArgs {
    /// Path to the dataset.yaml manifest
    #[arg(short = 'd', long = "data")]
    pub data: PathBuf,

    /// Model checkpoint to start from
    #[arg(long = "model", default_value = "yolov8n.pt")]
    pub model: String,

    #[arg(long = "epochs", default_value_t = 50)]
    pub epochs: u32,

    /// Training image size in pixels
    #[arg(long = "imgsz", default_value_t = 640)]
    pub imgsz: u32,

    #[arg(long = "batch", default_value_t = 16)]
    pub batch: u32,

    /// Trainer executable looked up on PATH
    #[arg(long = "executable", default_value = "yolo")]
    pub executable: String,
}

// Split policy selectable from the command line
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
pub enum SplitMode {
    /// Seeded shuffle of all images, then hold out val_size of them
    Random,
    /// Per class, the first (1 - val_size) of the images in file-name order go to train
    Positional,
}

// Validate that the size is between 0.0 and 1.0
pub fn validate_size(s: &str) -> Result<f64, String> {
    match f64::from_str(s) {
        Ok(val) if (0.0..=1.0).contains(&val) => Ok(val),
        _ => Err("SIZE must be between 0.0 and 1.0".to_string()),
    }
}
