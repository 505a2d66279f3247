use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::{Path, PathBuf};

/// Create a progress bar with the given length and label
pub fn create_progress_bar(len: u64, label: &str) -> ProgressBar {
    let pb = ProgressBar::new(len);
    let style = ProgressStyle::default_bar()
        .template(&format!(
            "{{spinner:.green}} [{}] [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{pos}}/{{len}} ({{eta}})",
            label
        ))
        .map(|style| style.progress_chars("#>-"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    pb.set_style(style);
    pb
}

/// Safely create output directories and return their paths
pub fn create_output_directory(path: &Path) -> std::io::Result<PathBuf> {
    if path.exists() {
        log::warn!(
            "Directory {:?} already exists. Deleting and recreating it.",
            path
        );
        fs::remove_dir_all(path).and_then(|_| fs::create_dir_all(path))?;
    } else {
        fs::create_dir_all(path)?;
    }
    Ok(path.to_path_buf())
}

/// Output file name for an input path, keeping the extension
pub fn sanitized_file_name(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_str()?;
    Some(sanitize_filename::sanitize(name))
}

/// Output label name for an image: its sanitized stem plus `.txt`
pub fn label_file_name(image_path: &Path) -> Option<String> {
    let stem = image_path.file_stem()?.to_str()?;
    Some(format!("{}.txt", sanitize_filename::sanitize(stem)))
}
