use indicatif::{ProgressBar, ProgressStyle};
use serde::de::DeserializeOwned;
use std::fs;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::error::DatasetError;

/// Read and parse a JSON file straight from a buffered file stream
pub fn read_and_parse_json<T: DeserializeOwned>(path: &Path) -> Result<T, DatasetError> {
    let file = fs::File::open(path).map_err(|e| DatasetError::io(path, e))?;
    serde_json::from_reader(BufReader::new(file)).map_err(|source| DatasetError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Create a progress bar with the given length and label
pub fn create_progress_bar(len: u64, label: &str) -> ProgressBar {
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(&format!(
                "{{spinner:.green}} [{}] [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{pos}}/{{len}} ({{eta}})",
                label
            ))
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    pb
}

/// Create an empty output directory, removing whatever was there before
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

/// Name of the extracted frame (or label) with the given index
pub fn frame_file_name(index: u32, extension: &str) -> String {
    format!("frame_{:04}.{}", index, extension)
}

/// Frame number of an extracted file: the last `_` token of its stem.
///
/// `frame_0012.jpg` yields `0012`.
pub fn frame_number(file_name: &str) -> Option<&str> {
    let stem = file_name.split('.').next()?;
    stem.rsplit('_').next().filter(|n| !n.is_empty())
}
