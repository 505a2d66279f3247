use log::{debug, error, warn};
use std::fs::{self, File};
use std::io;
use std::path::Path;

use crate::error::AnnotationError;
use crate::resolver::ListingCache;
use crate::types::{AnnotationKind, ImageOutcome, ImageRecord, OutputDirs, ProcessingStats, Split};
use crate::utils::{create_progress_bar, label_file_name, sanitized_file_name};
use crate::voc;

/// Process every image of one split in order and report what happened.
///
/// A failing image is logged and skipped; it never stops the split.
pub fn process_split(
    records: &[ImageRecord],
    split: Split,
    output_dirs: &OutputDirs,
    listings: &mut ListingCache,
) -> ProcessingStats {
    let label = match split {
        Split::Train => "Train",
        Split::Val => "Val",
    };
    let pb = create_progress_bar(records.len() as u64, label);
    let mut stats = ProcessingStats::new();

    for record in records {
        match process_image(record, split, output_dirs, listings) {
            Ok(outcome) => stats.record(outcome),
            Err(e) => {
                pb.suspend(|| {
                    error!("Error processing {}: {}", record.path.display(), e);
                });
                stats.increment_failed();
            }
        }
        pb.inc(1);
    }
    pb.finish_with_message(format!("{} processing complete", label));

    stats.print_summary(split);
    stats
}

/// Copy one image into the split and write its label file.
///
/// The annotation is located before anything is written, so a directory that
/// cannot be listed leaves no image behind.
pub fn process_image(
    record: &ImageRecord,
    split: Split,
    output_dirs: &OutputDirs,
    listings: &mut ListingCache,
) -> io::Result<ImageOutcome> {
    let image_name = sanitized_file_name(&record.path).ok_or_else(|| invalid_name(&record.path))?;
    let label_name = label_file_name(&record.path).ok_or_else(|| invalid_name(&record.path))?;

    let candidate = listings.resolve(&record.path)?;
    fs::copy(&record.path, output_dirs.images_dir(split).join(image_name))?;

    let label_path = output_dirs.labels_dir(split).join(label_name);
    let Some(candidate) = candidate else {
        debug!(
            "No annotation found for {} image {}",
            record.class_name,
            record.path.display()
        );
        write_empty_label(&label_path)?;
        return Ok(ImageOutcome::Missing);
    };

    // Only a failure to read the annotation counts as missing; failing to
    // write the label fails the image.
    let label = match candidate.kind {
        AnnotationKind::Text => fs::read(&candidate.path).map_err(|source| {
            AnnotationError::Unreadable {
                path: candidate.path.clone(),
                source,
            }
        }),
        AnnotationKind::Xml => {
            voc::normalize(&candidate.path, record.class_id).map(String::into_bytes)
        }
    };

    match label {
        Ok(bytes) => {
            fs::write(&label_path, bytes)?;
            Ok(ImageOutcome::WithAnnotation)
        }
        Err(e) => {
            warn!("{} (class {})", e, record.class_name);
            write_empty_label(&label_path)?;
            Ok(ImageOutcome::Missing)
        }
    }
}

fn write_empty_label(label_path: &Path) -> io::Result<()> {
    File::create(label_path).map(|_| ())
}

fn invalid_name(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidInput,
        format!("image path has no usable file name: {}", path.display()),
    )
}
