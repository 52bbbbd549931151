//! Dataset scanner
//!
//! Walks `<base>/<category>/<folder>/frames` and builds one [`VideoRecord`] per
//! folder. Folder names encode the video metadata:
//!
//! ```text
//! <prefix>_<camera>_<place>_<subject>_<brightness>[_<extra>...]
//! ```
//!
//! The first five `_`-separated fields must be present and non-empty; anything
//! after them is ignored.

use glob::{glob, Pattern};
use log::{info, warn};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::ScanWarning;
use crate::types::{Category, VideoRecord, FRAMES_DIR, IMAGE_EXTENSION, LABEL_EXTENSION};

pub const FOLDER_DELIMITER: char = '_';

const FOLDER_FIELDS: [&str; 5] = ["prefix", "camera", "place", "subject", "brightness"];

/// Metadata parsed from a video folder name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderMeta {
    pub prefix: String,
    pub camera: String,
    pub place: String,
    pub subject: String,
    pub brightness: String,
}

/// Records found by a scan together with every folder that was skipped
#[derive(Debug, Default)]
pub struct ScanResult {
    pub records: Vec<VideoRecord>,
    pub warnings: Vec<ScanWarning>,
}

pub fn parse_folder_name(name: &str) -> Result<FolderMeta, ScanWarning> {
    let fields: Vec<&str> = name.split(FOLDER_DELIMITER).collect();
    if fields.len() < FOLDER_FIELDS.len() {
        return Err(ScanWarning::MalformedFolderName {
            name: name.to_string(),
            reason: format!(
                "expected at least {} fields, found {}",
                FOLDER_FIELDS.len(),
                fields.len()
            ),
        });
    }
    if let Some(i) = fields[..FOLDER_FIELDS.len()].iter().position(|f| f.is_empty()) {
        return Err(ScanWarning::MalformedFolderName {
            name: name.to_string(),
            reason: format!("{} field is empty", FOLDER_FIELDS[i]),
        });
    }

    Ok(FolderMeta {
        prefix: fields[0].to_string(),
        camera: fields[1].to_string(),
        place: fields[2].to_string(),
        subject: fields[3].to_string(),
        brightness: fields[4].to_string(),
    })
}

// Glob pattern under `dir`, with any metacharacters in the directory path escaped
pub(crate) fn escaped_pattern(dir: &Path, file_pattern: &str) -> String {
    let dir = Pattern::escape(&dir.to_string_lossy());
    format!("{}/{}", dir.trim_end_matches('/'), file_pattern)
}

/// List the file names in `dir` with the given extension, sorted
pub fn list_files_with_extension(dir: &Path, extension: &str) -> Result<Vec<String>, ScanWarning> {
    let pattern = escaped_pattern(dir, &format!("*.{}", extension));
    let unreadable = |message: String| ScanWarning::Unreadable {
        path: dir.to_path_buf(),
        message,
    };
    let entries = glob(&pattern).map_err(|e| unreadable(e.to_string()))?;

    let mut names = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| unreadable(e.to_string()))?;
        if !path.is_file() {
            continue;
        }
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            names.push(name.to_string());
        }
    }
    names.sort();
    Ok(names)
}

/// Immediate subdirectories of `dir`, sorted by name
pub fn list_subdirectories(dir: &Path) -> Result<Vec<PathBuf>, ScanWarning> {
    let pattern = escaped_pattern(dir, "*");
    let entries = glob(&pattern).map_err(|e| ScanWarning::Unreadable {
        path: dir.to_path_buf(),
        message: e.to_string(),
    })?;
    let mut dirs: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .filter(|path| path.is_dir())
        .collect();
    dirs.sort();
    Ok(dirs)
}

/// Build the record for one `<category>/<folder>` directory
pub fn scan_video_folder(category: Category, folder_path: &Path) -> Result<VideoRecord, ScanWarning> {
    let folder = folder_path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| ScanWarning::MalformedFolderName {
            name: folder_path.to_string_lossy().into_owned(),
            reason: "folder name is not valid UTF-8".to_string(),
        })?
        .to_string();

    let meta = parse_folder_name(&folder)?;

    let frames_dir = folder_path.join(FRAMES_DIR);
    if !frames_dir.is_dir() {
        return Err(ScanWarning::MissingFrames(frames_dir));
    }

    let image_files = list_files_with_extension(&frames_dir, IMAGE_EXTENSION)?;
    let label_files = list_files_with_extension(&frames_dir, LABEL_EXTENSION)?;

    Ok(VideoRecord {
        category,
        folder,
        frames_dir,
        image_files,
        label_files,
        subject: meta.subject,
        brightness: meta.brightness,
        camera: meta.camera,
        place: meta.place,
    })
}

/// Scan every category directory under `base`.
///
/// Bad folders are skipped and reported in [`ScanResult::warnings`]; the scan itself
/// never fails. Folder names must be unique across categories: the first occurrence
/// wins and later ones are reported as [`ScanWarning::DuplicateFolder`].
pub fn scan_dataset(base: &Path, categories: &[Category]) -> ScanResult {
    let mut result = ScanResult::default();
    let mut seen: HashMap<String, PathBuf> = HashMap::new();

    for &category in categories {
        let category_path = base.join(category.as_str());
        if !category_path.is_dir() {
            let warning = ScanWarning::MissingCategory(category_path);
            warn!("{}. Skipping...", warning);
            result.warnings.push(warning);
            continue;
        }

        let folders = match list_subdirectories(&category_path) {
            Ok(folders) => folders,
            Err(warning) => {
                warn!("{}. Skipping...", warning);
                result.warnings.push(warning);
                continue;
            }
        };

        for folder_path in folders {
            match scan_video_folder(category, &folder_path) {
                Ok(record) => {
                    if let Some(first) = seen.get(&record.folder) {
                        let warning = ScanWarning::DuplicateFolder {
                            name: record.folder.clone(),
                            first: first.clone(),
                            duplicate: folder_path,
                        };
                        warn!("{}. Skipping...", warning);
                        result.warnings.push(warning);
                        continue;
                    }
                    seen.insert(record.folder.clone(), folder_path);
                    result.records.push(record);
                }
                Err(warning) => {
                    warn!("{}. Skipping...", warning);
                    result.warnings.push(warning);
                }
            }
        }
    }

    info!(
        "Scanned {} video folders ({} skipped).",
        result.records.len(),
        result.warnings.len()
    );
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_folder_name() {
        let meta = parse_folder_name("V01_C1_P2_S3_Light").unwrap();
        assert_eq!(meta.prefix, "V01");
        assert_eq!(meta.camera, "C1");
        assert_eq!(meta.place, "P2");
        assert_eq!(meta.subject, "S3");
        assert_eq!(meta.brightness, "Light");
    }

    #[test]
    fn test_parse_folder_name_ignores_extra_fields() {
        let meta = parse_folder_name("V01_C2_P1_S1_Dark_take2").unwrap();
        assert_eq!(meta.camera, "C2");
        assert_eq!(meta.brightness, "Dark");
    }

    #[test]
    fn test_parse_folder_name_too_few_fields() {
        let err = parse_folder_name("V01_C1_P2").unwrap_err();
        assert!(matches!(err, ScanWarning::MalformedFolderName { .. }));
    }

    #[test]
    fn test_parse_folder_name_empty_field() {
        match parse_folder_name("V01__P2_S3_Light") {
            Err(ScanWarning::MalformedFolderName { reason, .. }) => {
                assert!(reason.contains("camera"))
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
