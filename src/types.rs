use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// Supported image formats
pub const IMG_FORMATS: &[&str] = &["jpeg", "jpg", "png"];

// Annotation formats, in the order they are tried
pub const ANNOTATION_FORMATS: &[&str] = &["xml", "txt"];

// Precomputed HashSet of image extensions for fast lookup
pub static IMAGE_EXTENSIONS_SET: OnceLock<HashSet<String>> = OnceLock::new();

/// Get the image extensions set
pub fn get_image_extensions_set() -> &'static HashSet<String> {
    IMAGE_EXTENSIONS_SET.get_or_init(|| IMG_FORMATS.iter().map(|ext| ext.to_lowercase()).collect())
}

/// Whether the path has one of the supported image extensions, ignoring case
pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| get_image_extensions_set().contains(&ext.to_lowercase()))
}

/// One image of the input archive together with the class it was filed under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRecord {
    pub class_id: usize,
    pub class_name: String,
    pub path: PathBuf,
}

/// The two annotation formats found next to images.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationKind {
    /// Pascal VOC style XML with pixel bounding boxes
    Xml,
    /// Already in YOLO label format
    Text,
}

impl AnnotationKind {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "xml" => Some(AnnotationKind::Xml),
            "txt" => Some(AnnotationKind::Text),
            _ => None,
        }
    }
}

/// A file believed to hold the annotation of an image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationCandidate {
    pub path: PathBuf,
    pub kind: AnnotationKind,
}

impl AnnotationCandidate {
    pub fn from_path(path: PathBuf) -> Option<Self> {
        let kind = AnnotationKind::from_path(&path)?;
        Some(Self { path, kind })
    }
}

/// Dataset partitions written to disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Split {
    Train,
    Val,
}

impl Split {
    pub fn dir_name(self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Val => "val",
        }
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

// Struct to hold the paths to the output directories for train/val splits
#[derive(Debug, Clone)]
pub struct OutputDirs {
    pub root: PathBuf,
    pub train_labels_dir: PathBuf,
    pub val_labels_dir: PathBuf,
    pub train_images_dir: PathBuf,
    pub val_images_dir: PathBuf,
}

impl OutputDirs {
    pub fn images_dir(&self, split: Split) -> &Path {
        match split {
            Split::Train => &self.train_images_dir,
            Split::Val => &self.val_images_dir,
        }
    }

    pub fn labels_dir(&self, split: Split) -> &Path {
        match split {
            Split::Train => &self.train_labels_dir,
            Split::Val => &self.val_labels_dir,
        }
    }
}

// Struct to hold the split datasets for training and validation
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SplitData {
    pub train: Vec<ImageRecord>,
    pub val: Vec<ImageRecord>,
}

/// What happened to a single image during conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageOutcome {
    /// A label was derived from an annotation file
    WithAnnotation,
    /// No usable annotation; an empty label was written
    Missing,
}

// Struct to hold processing statistics
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ProcessingStats {
    pub total: usize,
    pub with_annotation: usize,
    pub missing: usize,
    pub failed: usize,
}

impl ProcessingStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, outcome: ImageOutcome) {
        self.total += 1;
        match outcome {
            ImageOutcome::WithAnnotation => self.with_annotation += 1,
            ImageOutcome::Missing => self.missing += 1,
        }
    }

    pub fn increment_failed(&mut self) {
        self.total += 1;
        self.failed += 1;
    }

    pub fn print_summary(&self, split: Split) {
        log::info!("=== {} set ===", split.dir_name().to_uppercase());
        log::info!(
            "Processed: {} images with annotations",
            self.with_annotation
        );
        log::info!("Missing: {} annotations (created empty files)", self.missing);
        log::info!("Total: {} images", self.total);

        if self.failed > 0 {
            log::warn!("Failed: {} images were skipped", self.failed);
        }
    }
}
