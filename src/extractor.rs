//! Frame extraction and label conversion for the raw video tree
//!
//! Each `<base>/<category>/<folder>` holds a `video.mp4` and, for labelled
//! categories, a `label.json`. Frames are written to `<folder>/frames` as
//! `frame_0000.jpg`, `frame_0001.jpg`, ... with a matching `.txt` label file per
//! annotated frame.

use glob::glob;
use log::{debug, error, info, warn};
use rayon::prelude::*;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::conversion::convert_labels_json;
use crate::error::DatasetError;
use crate::scanner::{escaped_pattern, list_subdirectories};
use crate::types::{Category, ProcessingStats, FRAMES_DIR, LABEL_FILE, VIDEO_FILE};
use crate::utils::create_progress_bar;

/// Decodes a video into numbered JPEG frames
pub trait FrameDecoder: Sync {
    /// Write every frame of `video` into `output_dir` as `frame_%04d.jpg`, starting
    /// at zero, and return the number of frames written.
    fn extract(&self, video: &Path, output_dir: &Path) -> Result<usize, DatasetError>;
}

/// Decoder backed by the `ffmpeg` executable
#[derive(Debug, Clone)]
pub struct FfmpegDecoder {
    pub program: PathBuf,
}

impl Default for FfmpegDecoder {
    fn default() -> Self {
        Self {
            program: PathBuf::from("ffmpeg"),
        }
    }
}

impl FrameDecoder for FfmpegDecoder {
    fn extract(&self, video: &Path, output_dir: &Path) -> Result<usize, DatasetError> {
        let output = Command::new(&self.program)
            .arg("-hide_banner")
            .arg("-loglevel")
            .arg("error")
            .arg("-y")
            .arg("-i")
            .arg(video)
            .arg("-vsync")
            .arg("0")
            .arg("-q:v")
            .arg("2")
            .arg("-start_number")
            .arg("0")
            .arg(output_dir.join("frame_%04d.jpg"))
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| DatasetError::Decode {
                path: video.to_path_buf(),
                message: format!("failed to spawn {}: {}", self.program.display(), e),
            })?;

        if !output.status.success() {
            return Err(DatasetError::Decode {
                path: video.to_path_buf(),
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        count_frames(output_dir)
    }
}

fn count_frames(dir: &Path) -> Result<usize, DatasetError> {
    let pattern = escaped_pattern(dir, "frame_*.jpg");
    let entries = glob(&pattern).map_err(|e| DatasetError::Decode {
        path: dir.to_path_buf(),
        message: e.to_string(),
    })?;
    Ok(entries.filter_map(|entry| entry.ok()).count())
}

/// Extract frames and labels for one video folder.
///
/// Returns the number of files written (frames plus label files).
pub fn extract_video_folder(
    category: Category,
    folder_path: &Path,
    class_ids: &HashMap<String, usize>,
    decoder: &dyn FrameDecoder,
) -> Result<usize, DatasetError> {
    let video_path = folder_path.join(VIDEO_FILE);
    let frame_folder = folder_path.join(FRAMES_DIR);
    let label_path = folder_path.join(LABEL_FILE);
    if !video_path.is_file() {
        return Err(DatasetError::MissingInput(video_path));
    }
    if category.has_labels() && !label_path.is_file() {
        return Err(DatasetError::MissingInput(label_path));
    }

    // Frames left over from an earlier extraction would be counted and scanned
    if frame_folder.is_dir() {
        fs::remove_dir_all(&frame_folder).map_err(|e| DatasetError::io(&frame_folder, e))?;
    }
    fs::create_dir_all(&frame_folder).map_err(|e| DatasetError::io(&frame_folder, e))?;

    debug!("Processing video: {}", video_path.display());
    let frames = decoder.extract(&video_path, &frame_folder)?;
    debug!("Extracted {} frames into {}", frames, frame_folder.display());

    let labels = if category.has_labels() {
        convert_labels_json(&label_path, &frame_folder, class_ids)?
    } else {
        0
    };
    Ok(frames + labels)
}

/// Extract every video under `<base>/<category>/*` in parallel.
///
/// A failing video is logged and counted; it never stops the run.
pub fn extract_dataset(
    base: &Path,
    categories: &[Category],
    class_ids: &HashMap<String, usize>,
    decoder: &dyn FrameDecoder,
) -> ProcessingStats {
    let mut jobs: Vec<(Category, PathBuf)> = Vec::new();
    for &category in categories {
        let category_path = base.join(category.as_str());
        if !category_path.is_dir() {
            warn!("Category directory {} does not exist. Skipping...", category_path.display());
            continue;
        }
        match list_subdirectories(&category_path) {
            Ok(folders) => jobs.extend(folders.into_iter().map(|folder| (category, folder))),
            Err(warning) => warn!("{}. Skipping...", warning),
        }
    }
    jobs.sort();
    info!("Found {} video folders to extract.", jobs.len());

    let pb = create_progress_bar(jobs.len() as u64, "Extract");
    let stats = jobs
        .par_iter()
        .map(|(category, folder_path)| {
            let mut stats = ProcessingStats::new();
            stats.increment_total();
            match extract_video_folder(*category, folder_path, class_ids, decoder) {
                Ok(files) => {
                    stats.increment_successful();
                    stats.add_files(files);
                }
                Err(e @ DatasetError::MissingInput(_)) => {
                    warn!("Skipping {}: {}", folder_path.display(), e);
                    stats.increment_skipped_missing_input();
                }
                Err(e) => {
                    error!("Failed to extract {}: {}", folder_path.display(), e);
                    stats.increment_failed();
                }
            }
            pb.inc(1);
            stats
        })
        .reduce(ProcessingStats::new, ProcessingStats::merge);
    pb.finish_with_message("Extraction complete");

    stats
}
