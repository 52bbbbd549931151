//! Video detection dataset preparation
//!
//! Extracts frames from category-labelled videos, converts their COCO box
//! annotations to YOLO label files, and splits the result into train/val/test
//! by video so that no source video leaks across splits.

pub mod balance;
pub mod coco;
pub mod config;
pub mod conversion;
pub mod error;
pub mod extractor;
pub mod io;
pub mod manifest;
pub mod scanner;
pub mod splitter;
pub mod types;
pub mod utils;
pub mod verify;
pub mod yolo_dataset;

// Re-export commonly used types and functions
pub use balance::{balance_report, BalanceReport, BalanceRow};
pub use config::{ExtractArgs, SplitArgs};
pub use conversion::{from_normalized, to_normalized, PixelBox, YoloBox};
pub use error::{AssignmentGap, DatasetError, LeakageViolation, ScanWarning};
pub use extractor::{extract_dataset, FfmpegDecoder, FrameDecoder};
pub use io::{materialize, setup_output_directories};
pub use scanner::{scan_dataset, ScanResult};
pub use splitter::{split, AssignmentRule, GroupPolicy, SplitMode, SplitOutcome, SplitRatios};
pub use types::{Category, Feature, Split, SplitAssignment, VideoRecord};
pub use verify::verify_no_leakage;
pub use yolo_dataset::{process_dataset, DatasetReport};
