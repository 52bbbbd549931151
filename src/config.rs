use clap::Parser;
use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::DatasetError;
use crate::splitter::{GroupPolicy, SplitMode};
use crate::types::{Category, Feature};

pub const DEFAULT_BASE_PATH: &str = "../Gun_Action_Recognition_Dataset";
pub const DEFAULT_CLASS_IDS: &str = r#"{"Handgun": 0, "Machine_Gun": 1, "No_Gun": 2}"#;

/// Extract frames from every category video and convert its labels to YOLO format.
#[derive(Parser, Debug, Clone)]
#[command(version, long_about = None)]
pub struct ExtractArgs {
    /// Base path of the dataset
    #[arg(short = 'd', long = "base_path", default_value = DEFAULT_BASE_PATH)]
    pub base_path: PathBuf,

    /// Categories to process
    #[arg(long = "categories", value_enum, num_args = 1.., default_values_t = Category::ALL)]
    pub categories: Vec<Category>,

    /// Class id mapping as a JSON object, e.g. '{"Handgun": 0}'
    #[arg(long = "class_ids", default_value = DEFAULT_CLASS_IDS, value_parser = parse_class_ids)]
    pub class_ids: HashMap<String, usize>,

    /// ffmpeg executable used to decode the videos
    #[arg(long = "ffmpeg", default_value = "ffmpeg")]
    pub ffmpeg: PathBuf,
}

/// Split the extracted dataset into train, val and test without leaking videos.
#[derive(Parser, Debug, Clone)]
#[command(version, long_about = None)]
pub struct SplitArgs {
    /// Base path of the dataset
    #[arg(short = 'd', long = "base_path", default_value = DEFAULT_BASE_PATH)]
    pub base_path: PathBuf,

    /// Split ratios for train, val and test; must sum to 1
    #[arg(long = "split_ratios", num_args = 3, value_parser = validate_ratio)]
    pub split_ratios: Option<Vec<f64>>,

    /// Feature the videos are grouped by
    #[arg(long = "key_feature", value_enum, default_value_t = Feature::Camera)]
    pub key_feature: Feature,

    /// Group policy used without --split_ratios, e.g. 'C2=train,C1=0:0.5:0.5'
    #[arg(long = "policy", value_parser = parse_policy)]
    pub policy: Option<GroupPolicy>,

    /// Seed for random shuffling
    #[arg(long = "seed", default_value_t = 42)]
    pub seed: u64,

    /// Categories to scan
    #[arg(long = "categories", value_enum, num_args = 1.., default_values_t = Category::ALL)]
    pub categories: Vec<Category>,

    /// Class id mapping as a JSON object, written to dataset.yaml
    #[arg(long = "class_ids", default_value = DEFAULT_CLASS_IDS, value_parser = parse_class_ids)]
    pub class_ids: HashMap<String, usize>,

    /// Write the split manifest to this JSON file
    #[arg(long = "manifest")]
    pub manifest: Option<PathBuf>,

    /// Load the split from --manifest instead of re-splitting, when it exists
    #[arg(long = "reuse_manifest", requires = "manifest")]
    pub reuse_manifest: bool,

    /// Exit with an error when records are dropped or a video leaks across splits
    #[arg(long = "strict")]
    pub strict: bool,
}

impl SplitArgs {
    /// Resolve the CLI options into a split mode.
    ///
    /// Without ratios or an explicit policy the built-in policy of the key feature
    /// is used; features without one are a configuration error.
    pub fn to_split_mode(&self) -> Result<SplitMode, DatasetError> {
        let policy = match (&self.split_ratios, &self.policy) {
            (None, None) => Some(GroupPolicy::default_for(self.key_feature).ok_or_else(|| {
                DatasetError::Configuration(format!(
                    "splitting by {} has no built-in policy; pass --split_ratios or --policy",
                    self.key_feature
                ))
            })?),
            (_, policy) => policy.clone(),
        };
        SplitMode::from_options(self.split_ratios.as_deref(), policy)
    }
}

// Validate that a single ratio is between 0.0 and 1.0
fn validate_ratio(s: &str) -> Result<f64, String> {
    match f64::from_str(s) {
        Ok(val) if (0.0..=1.0).contains(&val) => Ok(val),
        _ => Err("RATIO must be between 0.0 and 1.0".to_string()),
    }
}

fn parse_class_ids(s: &str) -> Result<HashMap<String, usize>, String> {
    serde_json::from_str(s).map_err(|e| format!("class ids must be a JSON object of name -> id: {}", e))
}

fn parse_policy(s: &str) -> Result<GroupPolicy, String> {
    s.parse().map_err(|e: DatasetError| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::splitter::{AssignmentRule, SplitRatios};
    use crate::types::Split;

    #[test]
    fn test_validate_ratio() {
        assert!(validate_ratio("0.5").is_ok());
        assert!(validate_ratio("1.0").is_ok());
        assert!(validate_ratio("0.0").is_ok());
        assert!(validate_ratio("-0.1").is_err());
        assert!(validate_ratio("1.1").is_err());
        assert!(validate_ratio("abc").is_err());
    }

    #[test]
    fn test_parse_class_ids() {
        let ids = parse_class_ids(DEFAULT_CLASS_IDS).unwrap();
        assert_eq!(ids.get("Machine_Gun"), Some(&1));
        assert!(parse_class_ids("[1, 2]").is_err());
    }

    #[test]
    fn test_split_args_defaults_to_camera_policy() {
        let args = SplitArgs::parse_from(["split_dataset"]);
        assert_eq!(args.seed, 42);
        assert_eq!(args.categories, Category::ALL.to_vec());
        match args.to_split_mode().unwrap() {
            SplitMode::Policy(policy) => {
                assert_eq!(policy.rule("C2"), Some(&AssignmentRule::Whole(Split::Train)))
            }
            other => panic!("unexpected mode {:?}", other),
        }
    }

    #[test]
    fn test_split_args_ratios() {
        let args = SplitArgs::parse_from(["split_dataset", "--split_ratios", "0.7", "0.2", "0.1"]);
        assert_eq!(
            args.to_split_mode().unwrap(),
            SplitMode::Ratios(SplitRatios::new(0.7, 0.2, 0.1).unwrap())
        );

        let args = SplitArgs::parse_from(["split_dataset", "--split_ratios", "0.7", "0.2", "0.2"]);
        assert!(matches!(args.to_split_mode(), Err(DatasetError::Configuration(_))));
    }

    #[test]
    fn test_split_args_conflicting_options() {
        let args = SplitArgs::parse_from([
            "split_dataset",
            "--split_ratios",
            "0.7",
            "0.2",
            "0.1",
            "--policy",
            "C2=train",
        ]);
        assert!(matches!(args.to_split_mode(), Err(DatasetError::Configuration(_))));
    }

    #[test]
    fn test_split_args_feature_without_policy() {
        let args = SplitArgs::parse_from(["split_dataset", "--key_feature", "place"]);
        assert!(matches!(args.to_split_mode(), Err(DatasetError::Configuration(_))));

        let args = SplitArgs::parse_from([
            "split_dataset",
            "--key_feature",
            "place",
            "--policy",
            "P1=train,P2=val,P3=test",
        ]);
        assert!(args.to_split_mode().is_ok());
    }

    #[test]
    fn test_extract_args_categories() {
        let args = ExtractArgs::parse_from(["extract_frames", "--categories", "Handgun", "No_Gun"]);
        assert_eq!(args.categories, vec![Category::Handgun, Category::NoGun]);
    }
}
