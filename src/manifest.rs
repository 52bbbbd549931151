//! JSON manifest of a finished split, so later runs can reuse it instead of
//! re-splitting.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::DatasetError;
use crate::types::{Feature, Split, SplitAssignment, VideoRecord};
use crate::utils::read_and_parse_json;

pub const MANIFEST_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub split: Split,
    #[serde(flatten)]
    pub record: VideoRecord,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitManifest {
    pub version: u32,
    pub group_key: Feature,
    pub seed: u64,
    pub entries: Vec<ManifestEntry>,
}

impl SplitManifest {
    pub fn from_assignment(assignment: &SplitAssignment, group_key: Feature, seed: u64) -> Self {
        let entries = assignment
            .iter()
            .map(|(split, record)| ManifestEntry {
                split,
                record: record.clone(),
            })
            .collect();
        Self {
            version: MANIFEST_VERSION,
            group_key,
            seed,
            entries,
        }
    }

    pub fn into_assignment(self) -> SplitAssignment {
        let mut assignment = SplitAssignment::default();
        for entry in self.entries {
            assignment.records_mut(entry.split).push(entry.record);
        }
        assignment
    }
}

pub fn write_manifest(path: &Path, manifest: &SplitManifest) -> Result<(), DatasetError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| DatasetError::io(parent, e))?;
    }
    let file = File::create(path).map_err(|e| DatasetError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, manifest).map_err(|source| DatasetError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    writer.flush().map_err(|e| DatasetError::io(path, e))
}

pub fn read_manifest(path: &Path) -> Result<SplitManifest, DatasetError> {
    let manifest: SplitManifest = read_and_parse_json(path)?;
    if manifest.version != MANIFEST_VERSION {
        return Err(DatasetError::Configuration(format!(
            "unsupported manifest version {} in {}",
            manifest.version,
            path.display()
        )));
    }
    Ok(manifest)
}
