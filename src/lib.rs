//! Folder-per-class archive to YOLO format converter
//!
//! This library turns a directory with one subdirectory per class into a YOLO
//! detection dataset. Annotations next to each image are located with a
//! tolerant name-matching policy; Pascal VOC XML boxes are normalized and
//! YOLO text labels are copied as they are.

pub mod classes;
pub mod config;
pub mod conversion;
pub mod dataset;
pub mod error;
pub mod io;
pub mod resolver;
pub mod train;
pub mod types;
pub mod utils;
pub mod voc;

// Re-export commonly used types and functions
pub use classes::{ClassEntry, ClassTable};
pub use config::{Args, Command, PrepareArgs, SplitMode, TrainArgs};
pub use dataset::{process_dataset, run_prepare, split_records, DatasetSummary, SplitPolicy};
pub use error::{AnnotationError, ConvertError, TrainError};
pub use resolver::{resolve, ListingCache};
pub use train::run_training;
pub use types::{AnnotationCandidate, AnnotationKind, ImageRecord, ProcessingStats, SplitData};
