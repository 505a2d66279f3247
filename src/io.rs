use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::classes::ClassTable;
use crate::types::OutputDirs;
use crate::utils::create_output_directory;

pub const DATASET_YAML: &str = "dataset.yaml";

/// Set up the directory structure for YOLO dataset output
pub fn setup_output_directories(output_root: &Path) -> std::io::Result<OutputDirs> {
    let labels_dir = create_output_directory(&output_root.join("labels"))?;
    let images_dir = create_output_directory(&output_root.join("images"))?;

    let train_labels_dir = create_output_directory(&labels_dir.join("train"))?;
    let val_labels_dir = create_output_directory(&labels_dir.join("val"))?;
    let train_images_dir = create_output_directory(&images_dir.join("train"))?;
    let val_images_dir = create_output_directory(&images_dir.join("val"))?;

    Ok(OutputDirs {
        root: output_root.to_path_buf(),
        train_labels_dir,
        val_labels_dir,
        train_images_dir,
        val_images_dir,
    })
}

/// Render the dataset.yaml manifest for a dataset rooted at `dataset_root`
pub fn dataset_yaml_content(dataset_root: &Path, classes: &ClassTable) -> String {
    let mut yaml_content = format!(
        "path: {}\ntrain: images/train\nval: images/val\n",
        dataset_root.to_string_lossy()
    );
    yaml_content.push_str("\nnames:\n");
    for entry in classes.entries() {
        yaml_content.push_str(&format!("  {}: {}\n", entry.id, entry.name));
    }
    yaml_content
}

/// Create the dataset.yaml file for YOLO training
pub fn create_dataset_yaml(output_root: &Path, classes: &ClassTable) -> std::io::Result<PathBuf> {
    let dataset_yaml_path = output_root.join(DATASET_YAML);
    let absolute_path = fs::canonicalize(output_root)?;
    let mut dataset_yaml = BufWriter::new(File::create(&dataset_yaml_path)?);
    dataset_yaml.write_all(dataset_yaml_content(&absolute_path, classes).as_bytes())?;
    dataset_yaml.flush()?;
    Ok(dataset_yaml_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dataset_yaml_content() {
        let classes = ClassTable::fixed([("fox", 1), ("antelope", 0)]).unwrap();
        let yaml = dataset_yaml_content(Path::new("/data/yolo_dataset"), &classes);
        assert_eq!(
            yaml,
            "path: /data/yolo_dataset\ntrain: images/train\nval: images/val\n\nnames:\n  0: antelope\n  1: fox\n"
        );
    }

    #[test]
    fn test_create_dataset_yaml() {
        let temp_dir = tempfile::tempdir().unwrap();
        let classes = ClassTable::from_list(["test"]).unwrap();

        let path = create_dataset_yaml(temp_dir.path(), &classes).unwrap();
        let yaml_content = fs::read_to_string(path).unwrap();

        assert!(yaml_content.starts_with("path: "));
        assert!(yaml_content.contains("train: images/train"));
        assert!(yaml_content.contains("val: images/val"));
        assert!(yaml_content.contains("names:"));
        assert!(yaml_content.contains("0: test"));
    }

    #[test]
    fn test_setup_output_directories() {
        let temp_dir = tempfile::tempdir().unwrap();
        let dirs = setup_output_directories(&temp_dir.path().join("out")).unwrap();
        for dir in [
            &dirs.train_images_dir,
            &dirs.val_images_dir,
            &dirs.train_labels_dir,
            &dirs.val_labels_dir,
        ] {
            assert!(dir.is_dir(), "{} missing", dir.display());
        }
        assert_eq!(dirs.train_labels_dir, temp_dir.path().join("out/labels/train"));
    }
}
