use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

// Extracted frame and label extensions
pub const IMAGE_EXTENSION: &str = "jpg";
pub const LABEL_EXTENSION: &str = "txt";

// Per-video layout below <base>/<category>/<folder>
pub const FRAMES_DIR: &str = "frames";
pub const VIDEO_FILE: &str = "video.mp4";
pub const LABEL_FILE: &str = "label.json";

/// Video category, matching the category directory names on disk.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ValueEnum)]
pub enum Category {
    #[serde(rename = "Handgun")]
    #[value(name = "Handgun")]
    Handgun,
    #[serde(rename = "Machine_Gun")]
    #[value(name = "Machine_Gun")]
    MachineGun,
    #[serde(rename = "No_Gun")]
    #[value(name = "No_Gun")]
    NoGun,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Handgun, Category::MachineGun, Category::NoGun];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Handgun => "Handgun",
            Category::MachineGun => "Machine_Gun",
            Category::NoGun => "No_Gun",
        }
    }

    /// Videos without a weapon carry no annotation file.
    pub fn has_labels(&self) -> bool {
        !matches!(self, Category::NoGun)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown category '{}'", s))
    }
}

/// One of the three dataset partitions.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Split {
    Train,
    Val,
    Test,
}

impl Split {
    pub const ALL: [Split; 3] = [Split::Train, Split::Val, Split::Test];

    pub fn as_str(&self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Val => "val",
            Split::Test => "test",
        }
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Split {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Split::ALL
            .into_iter()
            .find(|split| split.as_str() == s)
            .ok_or_else(|| format!("unknown split '{}'", s))
    }
}

/// Metadata feature used for grouping and balance reports.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Feature {
    Category,
    Camera,
    Place,
    Subject,
    Brightness,
}

impl Feature {
    pub const ALL: [Feature; 5] = [
        Feature::Category,
        Feature::Place,
        Feature::Subject,
        Feature::Brightness,
        Feature::Camera,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Feature::Category => "category",
            Feature::Camera => "camera",
            Feature::Place => "place",
            Feature::Subject => "subject",
            Feature::Brightness => "brightness",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One source video's extracted frames and labels plus the metadata encoded in its
/// folder name. This is the unit of split assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoRecord {
    pub category: Category,
    pub folder: String,
    pub frames_dir: PathBuf,
    pub image_files: Vec<String>,
    pub label_files: Vec<String>,
    pub subject: String,
    pub brightness: String,
    pub camera: String,
    pub place: String,
}

impl VideoRecord {
    pub fn feature(&self, feature: Feature) -> &str {
        match feature {
            Feature::Category => self.category.as_str(),
            Feature::Camera => &self.camera,
            Feature::Place => &self.place,
            Feature::Subject => &self.subject,
            Feature::Brightness => &self.brightness,
        }
    }
}

/// Whole-record partition of the dataset into train, val and test.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitAssignment {
    pub train: Vec<VideoRecord>,
    pub val: Vec<VideoRecord>,
    pub test: Vec<VideoRecord>,
}

impl SplitAssignment {
    pub fn records(&self, split: Split) -> &[VideoRecord] {
        match split {
            Split::Train => &self.train,
            Split::Val => &self.val,
            Split::Test => &self.test,
        }
    }

    pub fn records_mut(&mut self, split: Split) -> &mut Vec<VideoRecord> {
        match split {
            Split::Train => &mut self.train,
            Split::Val => &mut self.val,
            Split::Test => &mut self.test,
        }
    }

    /// Iterate over every record together with the split holding it
    pub fn iter(&self) -> impl Iterator<Item = (Split, &VideoRecord)> {
        Split::ALL
            .into_iter()
            .flat_map(move |split| self.records(split).iter().map(move |r| (split, r)))
    }

    pub fn len(&self) -> usize {
        self.train.len() + self.val.len() + self.test.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// Paths of the split output directories
#[derive(Debug, Clone)]
pub struct OutputDirs {
    pub train_images_dir: PathBuf,
    pub train_labels_dir: PathBuf,
    pub val_images_dir: PathBuf,
    pub val_labels_dir: PathBuf,
    pub test_images_dir: PathBuf,
    pub test_labels_dir: PathBuf,
}

impl OutputDirs {
    pub fn images_dir(&self, split: Split) -> &PathBuf {
        match split {
            Split::Train => &self.train_images_dir,
            Split::Val => &self.val_images_dir,
            Split::Test => &self.test_images_dir,
        }
    }

    pub fn labels_dir(&self, split: Split) -> &PathBuf {
        match split {
            Split::Train => &self.train_labels_dir,
            Split::Val => &self.val_labels_dir,
            Split::Test => &self.test_labels_dir,
        }
    }
}

// Struct to hold processing statistics
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ProcessingStats {
    pub total_records: usize,
    pub successful_records: usize,
    pub skipped_missing_input: usize,
    pub failed_records: usize,
    pub files_written: usize,
}

impl ProcessingStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_total(&mut self) {
        self.total_records += 1;
    }

    pub fn increment_successful(&mut self) {
        self.successful_records += 1;
    }

    pub fn increment_skipped_missing_input(&mut self) {
        self.skipped_missing_input += 1;
    }

    pub fn increment_failed(&mut self) {
        self.failed_records += 1;
    }

    pub fn add_files(&mut self, count: usize) {
        self.files_written += count;
    }

    pub fn merge(mut self, other: ProcessingStats) -> Self {
        self.total_records += other.total_records;
        self.successful_records += other.successful_records;
        self.skipped_missing_input += other.skipped_missing_input;
        self.failed_records += other.failed_records;
        self.files_written += other.files_written;
        self
    }

    pub fn print_summary(&self, title: &str) {
        log::info!("=== {} Summary ===", title);
        log::info!("Total records processed: {}", self.total_records);
        log::info!("Successful records: {}", self.successful_records);
        log::info!("Files written: {}", self.files_written);
        log::info!(
            "Skipped (missing input file): {}",
            self.skipped_missing_input
        );
        log::info!("Failed records: {}", self.failed_records);

        let total_problems = self.skipped_missing_input + self.failed_records;
        if total_problems > 0 {
            log::warn!(
                "Total records with problems: {} (missing input: {}, failed: {})",
                total_problems,
                self.skipped_missing_input,
                self.failed_records
            );
        }
    }
}
