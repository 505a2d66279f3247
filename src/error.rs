use std::path::PathBuf;
use std::process::ExitStatus;

/// Why an annotation file could not be turned into label lines.
///
/// Both variants are recovered per image: the caller writes an empty label
/// and counts the image as missing.
#[derive(thiserror::Error, Debug)]
pub enum AnnotationError {
    #[error("failed to read annotation {}: {source}", .path.display())]
    Unreadable {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed annotation {}: {reason}", .path.display())]
    Malformed { path: PathBuf, reason: String },
}

/// Errors that stop a conversion run.
#[derive(thiserror::Error, Debug)]
pub enum ConvertError {
    #[error("input directory does not exist: {}", .0.display())]
    MissingInputDir(PathBuf),

    #[error("no class directories found in {}", .0.display())]
    NoClasses(PathBuf),

    #[error("class table lists {0:?} more than once")]
    DuplicateClass(String),

    #[error("class id {0} is assigned to more than one class")]
    DuplicateClassId(usize),

    #[error("no images found under {}", .0.display())]
    NoImages(PathBuf),

    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid glob pattern: {0}")]
    Pattern(#[from] glob::PatternError),
}

/// Errors raised while launching the external trainer.
#[derive(thiserror::Error, Debug)]
pub enum TrainError {
    #[error("dataset.yaml not found at: {}", .0.display())]
    ManifestNotFound(PathBuf),

    #[error("failed to start trainer {program:?}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("trainer exited with {0}")]
    TrainerFailed(ExitStatus),
}
