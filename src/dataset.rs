use glob::{glob, Pattern};
use log::{info, warn};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::path::{Path, PathBuf};

use crate::classes::ClassTable;
use crate::config::{PrepareArgs, SplitMode};
use crate::conversion::process_split;
use crate::error::ConvertError;
use crate::io::{create_dataset_yaml, setup_output_directories};
use crate::resolver::ListingCache;
use crate::types::{is_image_file, ImageRecord, ProcessingStats, Split, SplitData};

/// How images are divided between train and val.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SplitPolicy {
    /// Shuffle everything with a seeded RNG, then hold out `ceil(n * val_size)`.
    Random { val_size: f64, seed: u64 },
    /// Per class, the first `floor(n * (1 - val_size))` images are train.
    Positional { val_size: f64 },
}

impl SplitPolicy {
    pub fn from_args(args: &PrepareArgs) -> Self {
        match args.split {
            SplitMode::Random => SplitPolicy::Random {
                val_size: args.val_size,
                seed: args.seed,
            },
            SplitMode::Positional => SplitPolicy::Positional {
                val_size: args.val_size,
            },
        }
    }
}

/// Counts for a finished run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetSummary {
    pub train: ProcessingStats,
    pub val: ProcessingStats,
    pub dataset_yaml: PathBuf,
}

/// List the images of every class, in class id order then file-name order.
///
/// A missing class directory is a warning; no images at all is fatal.
pub fn enumerate_images(root: &Path, classes: &ClassTable) -> Result<Vec<ImageRecord>, ConvertError> {
    if !root.is_dir() {
        return Err(ConvertError::MissingInputDir(root.to_path_buf()));
    }

    let mut records = Vec::new();
    for class in classes.entries() {
        let class_dir = root.join(&class.name);
        if !class_dir.is_dir() {
            warn!("Warning: Missing directory {}", class_dir.display());
            continue;
        }

        let pattern = format!("{}/*", Pattern::escape(&class_dir.to_string_lossy()));
        let mut images: Vec<PathBuf> = glob(&pattern)?
            .filter_map(|entry| entry.ok())
            .filter(|path| path.is_file() && is_image_file(path))
            .collect();
        images.sort();

        if images.is_empty() {
            warn!("No images found in {}", class.name);
        }
        records.extend(images.into_iter().map(|path| ImageRecord {
            class_id: class.id,
            class_name: class.name.clone(),
            path,
        }));
    }

    if records.is_empty() {
        return Err(ConvertError::NoImages(root.to_path_buf()));
    }
    Ok(records)
}

/// Split the records into training and validation sets
pub fn split_records(mut records: Vec<ImageRecord>, policy: SplitPolicy) -> SplitData {
    match policy {
        SplitPolicy::Random { val_size, seed } => {
            let mut rng = StdRng::seed_from_u64(seed);
            records.shuffle(&mut rng);

            let val_count = ((records.len() as f64 * val_size).ceil() as usize).min(records.len());
            let train = records.split_off(val_count);
            SplitData {
                train,
                val: records,
            }
        }
        SplitPolicy::Positional { val_size } => {
            let mut split_data = SplitData::default();
            let mut start = 0;
            while start < records.len() {
                let class_id = records[start].class_id;
                let end = records[start..]
                    .iter()
                    .position(|record| record.class_id != class_id)
                    .map_or(records.len(), |offset| start + offset);

                let class_len = end - start;
                let train_count = ((class_len as f64 * (1.0 - val_size)).floor() as usize).min(class_len);
                split_data
                    .train
                    .extend_from_slice(&records[start..start + train_count]);
                split_data
                    .val
                    .extend_from_slice(&records[start + train_count..end]);
                start = end;
            }
            split_data
        }
    }
}

/// Build the class table the run uses: explicit list, or discovered directories
pub fn class_table_from_args(args: &PrepareArgs) -> Result<ClassTable, ConvertError> {
    if args.label_list.is_empty() {
        let classes = ClassTable::discover(&args.input_dir)?;
        info!("Discovered {} classes:", classes.len());
        for entry in classes.entries() {
            info!("  {}: {}", entry.id, entry.name);
        }
        Ok(classes)
    } else {
        ClassTable::from_list(args.label_list.iter().cloned())
    }
}

/// Main dataset processing pipeline
pub fn process_dataset(
    input_dir: &Path,
    output_dir: &Path,
    classes: &ClassTable,
    policy: SplitPolicy,
) -> Result<DatasetSummary, ConvertError> {
    let records = enumerate_images(input_dir, classes)?;
    info!("Found {} images in {} classes.", records.len(), classes.len());

    let split_data = split_records(records, policy);
    info!(
        "Split into {} train and {} val images.",
        split_data.train.len(),
        split_data.val.len()
    );

    let output_dirs = setup_output_directories(output_dir)?;
    let mut listings = ListingCache::new();
    let train = process_split(&split_data.train, Split::Train, &output_dirs, &mut listings);
    let val = process_split(&split_data.val, Split::Val, &output_dirs, &mut listings);

    info!("Creating dataset.yaml file...");
    let dataset_yaml = create_dataset_yaml(&output_dirs.root, classes)?;
    info!("YOLO dataset created at: {}", output_dir.display());

    Ok(DatasetSummary {
        train,
        val,
        dataset_yaml,
    })
}

/// Run the `prepare` subcommand
pub fn run_prepare(args: &PrepareArgs) -> Result<DatasetSummary, ConvertError> {
    if !args.input_dir.is_dir() {
        return Err(ConvertError::MissingInputDir(args.input_dir.clone()));
    }
    let classes = class_table_from_args(args)?;
    process_dataset(
        &args.input_dir,
        &args.output_dir,
        &classes,
        SplitPolicy::from_args(args),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(per_class: &[usize]) -> Vec<ImageRecord> {
        per_class
            .iter()
            .enumerate()
            .flat_map(|(class_id, &count)| {
                (0..count).map(move |i| ImageRecord {
                    class_id,
                    class_name: format!("class{}", class_id),
                    path: PathBuf::from(format!("class{}/img{:03}.jpg", class_id, i)),
                })
            })
            .collect()
    }

    #[test]
    fn test_random_split_sizes() {
        let split_data = split_records(records(&[5, 5]), SplitPolicy::Random { val_size: 0.2, seed: 42 });
        assert_eq!(split_data.train.len(), 8);
        assert_eq!(split_data.val.len(), 2);

        let split_data = split_records(records(&[7]), SplitPolicy::Random { val_size: 0.2, seed: 42 });
        assert_eq!(split_data.val.len(), 2);
        assert_eq!(split_data.train.len(), 5);
    }

    #[test]
    fn test_random_split_is_reproducible() {
        let policy = SplitPolicy::Random { val_size: 0.3, seed: 7 };
        let first = split_records(records(&[10, 4, 6]), policy);
        let second = split_records(records(&[10, 4, 6]), policy);
        assert_eq!(first, second);

        let mut all: Vec<_> = first.train.iter().chain(first.val.iter()).cloned().collect();
        all.sort_by(|a, b| a.path.cmp(&b.path));
        assert_eq!(all, records(&[10, 4, 6]));
    }

    #[test]
    fn test_random_split_edges() {
        let split_data = split_records(records(&[4]), SplitPolicy::Random { val_size: 0.0, seed: 1 });
        assert_eq!(split_data.train.len(), 4);
        assert!(split_data.val.is_empty());

        let split_data = split_records(records(&[4]), SplitPolicy::Random { val_size: 1.0, seed: 1 });
        assert!(split_data.train.is_empty());
        assert_eq!(split_data.val.len(), 4);
    }

    #[test]
    fn test_positional_split_per_class() {
        let input = records(&[10, 5, 1]);
        let split_data = split_records(input.clone(), SplitPolicy::Positional { val_size: 0.2 });

        assert_eq!(split_data.train.len(), 8 + 4);
        assert_eq!(split_data.val.len(), 2 + 1 + 1);
        assert_eq!(&split_data.train[..8], &input[..8]);
        assert_eq!(&split_data.val[..2], &input[8..10]);
        assert_eq!(split_data.train[8..], input[10..14]);
        assert_eq!(split_data.val[3], input[15]);
    }
}
