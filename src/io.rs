use log::{error, info};
use rayon::prelude::*;
use std::collections::HashMap;
use std::fs::{self, copy, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::DatasetError;
use crate::types::{
    Category, OutputDirs, ProcessingStats, Split, SplitAssignment, VideoRecord, IMAGE_EXTENSION,
    LABEL_EXTENSION,
};
use crate::utils::{create_output_directory, create_progress_bar, frame_number};

/// Set up `<base>/{train,val,test}/{images,labels}`, clearing any previous output
pub fn setup_output_directories(base: &Path) -> std::io::Result<OutputDirs> {
    let split_dirs = |split: Split| -> std::io::Result<(PathBuf, PathBuf)> {
        let split_dir = base.join(split.as_str());
        Ok((
            create_output_directory(&split_dir.join("images"))?,
            create_output_directory(&split_dir.join("labels"))?,
        ))
    };

    let (train_images_dir, train_labels_dir) = split_dirs(Split::Train)?;
    let (val_images_dir, val_labels_dir) = split_dirs(Split::Val)?;
    let (test_images_dir, test_labels_dir) = split_dirs(Split::Test)?;

    Ok(OutputDirs {
        train_images_dir,
        train_labels_dir,
        val_images_dir,
        val_labels_dir,
        test_images_dir,
        test_labels_dir,
    })
}

/// Destination name of an extracted file: `<category>_<folder>_frame_<N>.<ext>`
pub fn output_file_name(
    category: Category,
    folder: &str,
    source_name: &str,
    extension: &str,
) -> Option<String> {
    let number = frame_number(source_name)?;
    Some(sanitize_filename::sanitize(format!(
        "{}_{}_frame_{}.{}",
        category, folder, number, extension
    )))
}

fn copy_files(
    record: &VideoRecord,
    files: &[String],
    dest_dir: &Path,
    extension: &str,
) -> Result<usize, DatasetError> {
    for name in files {
        let src = record.frames_dir.join(name);
        let dest_name = output_file_name(record.category, &record.folder, name, extension)
            .ok_or_else(|| {
                DatasetError::io(
                    &src,
                    std::io::Error::new(
                        std::io::ErrorKind::InvalidInput,
                        "file name carries no frame number",
                    ),
                )
            })?;
        copy(&src, dest_dir.join(dest_name)).map_err(|e| DatasetError::io(&src, e))?;
    }
    Ok(files.len())
}

/// Copy every frame and label of one video into the split directories
pub fn copy_record(
    record: &VideoRecord,
    images_dir: &Path,
    labels_dir: &Path,
) -> Result<usize, DatasetError> {
    let images = copy_files(record, &record.image_files, images_dir, IMAGE_EXTENSION)?;
    let labels = copy_files(record, &record.label_files, labels_dir, LABEL_EXTENSION)?;
    Ok(images + labels)
}

/// Copy all records of one split in parallel; failed records are logged and skipped
pub fn materialize_split(
    records: &[VideoRecord],
    images_dir: &Path,
    labels_dir: &Path,
    label: &str,
) -> ProcessingStats {
    let pb = create_progress_bar(records.len() as u64, label);

    let stats = records
        .par_iter()
        .map(|record| {
            let mut stats = ProcessingStats::new();
            stats.increment_total();
            if !record.frames_dir.is_dir() {
                error!(
                    "Frames directory {} disappeared, skipping {}",
                    record.frames_dir.display(),
                    record.folder
                );
                stats.increment_skipped_missing_input();
            } else {
                match copy_record(record, images_dir, labels_dir) {
                    Ok(count) => {
                        stats.increment_successful();
                        stats.add_files(count);
                    }
                    Err(e) => {
                        error!("Failed to copy {}: {}", record.folder, e);
                        stats.increment_failed();
                    }
                }
            }
            pb.inc(1);
            stats
        })
        .reduce(ProcessingStats::new, ProcessingStats::merge);

    pb.finish_with_message(format!("{} copy complete", label));
    stats
}

/// Copy the whole assignment into the split directory tree
pub fn materialize(assignment: &SplitAssignment, output_dirs: &OutputDirs) -> ProcessingStats {
    Split::ALL
        .into_iter()
        .map(|split| {
            let label = match split {
                Split::Train => "Train",
                Split::Val => "Val",
                Split::Test => "Test",
            };
            materialize_split(
                assignment.records(split),
                output_dirs.images_dir(split),
                output_dirs.labels_dir(split),
                label,
            )
        })
        .fold(ProcessingStats::new(), ProcessingStats::merge)
}

/// Create the dataset.yaml file for YOLO training
pub fn create_dataset_yaml(
    base: &Path,
    class_ids: &HashMap<String, usize>,
) -> Result<PathBuf, DatasetError> {
    let dataset_yaml_path = base.join("dataset.yaml");
    let absolute_path = fs::canonicalize(base).map_err(|e| DatasetError::io(base, e))?;

    let mut yaml_content = format!(
        "path: {}\ntrain: train/images\nval: val/images\ntest: test/images\n",
        absolute_path.to_string_lossy()
    );
    yaml_content.push_str("\nnames:\n");

    let mut sorted_labels: Vec<_> = class_ids.iter().collect();
    sorted_labels.sort_by_key(|&(label, id)| (*id, label.clone()));
    for (label, id) in sorted_labels {
        yaml_content.push_str(&format!("    {}: {}\n", id, label));
    }

    let file = File::create(&dataset_yaml_path).map_err(|e| DatasetError::io(&dataset_yaml_path, e))?;
    let mut dataset_yaml = BufWriter::new(file);
    dataset_yaml
        .write_all(yaml_content.as_bytes())
        .and_then(|_| dataset_yaml.flush())
        .map_err(|e| DatasetError::io(&dataset_yaml_path, e))?;

    info!("Wrote {}", dataset_yaml_path.display());
    Ok(dataset_yaml_path)
}
