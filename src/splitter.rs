//! Group-based train/val/test splitting
//!
//! Records are shuffled with an explicitly seeded RNG, bucketed by a metadata
//! feature and then sliced per group. Whole records are assigned, so every frame
//! of a video lands in the same split.

use log::{info, warn};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{AssignmentGap, DatasetError};
use crate::types::{Feature, Split, SplitAssignment, VideoRecord};

pub const RATIO_TOLERANCE: f64 = 1e-10;

/// Train/val/test fractions, validated to sum to one
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitRatios {
    pub train: f64,
    pub val: f64,
    pub test: f64,
}

impl SplitRatios {
    pub fn new(train: f64, val: f64, test: f64) -> Result<Self, DatasetError> {
        for (name, value) in [("train", train), ("val", val), ("test", test)] {
            if !value.is_finite() || value < 0.0 {
                return Err(DatasetError::Configuration(format!(
                    "{} ratio must be a non-negative number, got {}",
                    name, value
                )));
            }
        }
        let sum = train + val + test;
        if (sum - 1.0).abs() > RATIO_TOLERANCE {
            return Err(DatasetError::Configuration(format!(
                "the split ratios must sum to 1, got {}",
                sum
            )));
        }
        Ok(Self { train, val, test })
    }

    pub fn from_slice(ratios: &[f64]) -> Result<Self, DatasetError> {
        match ratios {
            [train, val, test] => Self::new(*train, *val, *test),
            _ => Err(DatasetError::Configuration(format!(
                "expected 3 split ratios, got {}",
                ratios.len()
            ))),
        }
    }

    /// Number of records going to train and val for a group of `n`; the rest is test.
    pub fn slice_sizes(&self, n: usize) -> (usize, usize) {
        let train = ((n as f64 * self.train).floor() as usize).min(n);
        let val = ((n as f64 * self.val).floor() as usize).min(n - train);
        (train, val)
    }
}

/// How a group of records is distributed over the splits
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AssignmentRule {
    /// Every record of the group goes to one split
    Whole(Split),
    /// Group is sliced like in ratio mode
    Proportional(SplitRatios),
}

impl FromStr for AssignmentRule {
    type Err = DatasetError;

    /// `train`, `val`, `test`, or `TRAIN:VAL:TEST` fractions
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(split) = s.parse::<Split>() {
            return Ok(AssignmentRule::Whole(split));
        }
        let ratios = s
            .split(':')
            .map(|part| part.trim().parse::<f64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| {
                DatasetError::Configuration(format!(
                    "invalid assignment rule '{}', expected train, val, test or TRAIN:VAL:TEST",
                    s
                ))
            })?;
        Ok(AssignmentRule::Proportional(SplitRatios::from_slice(&ratios)?))
    }
}

impl fmt::Display for AssignmentRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssignmentRule::Whole(split) => write!(f, "{}", split),
            AssignmentRule::Proportional(r) => write!(f, "{}:{}:{}", r.train, r.val, r.test),
        }
    }
}

/// Table of group value -> assignment rule.
///
/// Group values missing from the table get no assignment at all; their records are
/// dropped from the split and reported as [`AssignmentGap`]s.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupPolicy {
    rules: BTreeMap<String, AssignmentRule>,
}

impl GroupPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rule(mut self, group_value: impl Into<String>, rule: AssignmentRule) -> Self {
        self.rules.insert(group_value.into(), rule);
        self
    }

    pub fn rule(&self, group_value: &str) -> Option<&AssignmentRule> {
        self.rules.get(group_value)
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Built-in policy for a feature, if one exists.
    ///
    /// Only `camera` has one: `C2` is used for training, `C1` is halved between
    /// val and test.
    pub fn default_for(feature: Feature) -> Option<Self> {
        match feature {
            Feature::Camera => Some(
                GroupPolicy::new()
                    .with_rule("C2", AssignmentRule::Whole(Split::Train))
                    .with_rule(
                        "C1",
                        AssignmentRule::Proportional(SplitRatios {
                            train: 0.0,
                            val: 0.5,
                            test: 0.5,
                        }),
                    ),
            ),
            _ => None,
        }
    }
}

impl FromStr for GroupPolicy {
    type Err = DatasetError;

    /// Comma separated `VALUE=RULE` pairs, e.g. `C2=train,C1=0:0.5:0.5`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut policy = GroupPolicy::new();
        for pair in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (value, rule) = pair.split_once('=').ok_or_else(|| {
                DatasetError::Configuration(format!(
                    "invalid policy entry '{}', expected VALUE=RULE",
                    pair
                ))
            })?;
            let value = value.trim();
            if value.is_empty() {
                return Err(DatasetError::Configuration(format!(
                    "policy entry '{}' has an empty group value",
                    pair
                )));
            }
            policy.rules.insert(value.to_string(), rule.trim().parse()?);
        }
        if policy.is_empty() {
            return Err(DatasetError::Configuration(
                "policy must contain at least one VALUE=RULE entry".to_string(),
            ));
        }
        Ok(policy)
    }
}

/// Splitting strategy. Exactly one of ratios or a categorical policy.
#[derive(Debug, Clone, PartialEq)]
pub enum SplitMode {
    Ratios(SplitRatios),
    Policy(GroupPolicy),
}

impl SplitMode {
    pub fn from_options(
        ratios: Option<&[f64]>,
        policy: Option<GroupPolicy>,
    ) -> Result<Self, DatasetError> {
        match (ratios, policy) {
            (Some(ratios), None) => Ok(SplitMode::Ratios(SplitRatios::from_slice(ratios)?)),
            (None, Some(policy)) => Ok(SplitMode::Policy(policy)),
            (Some(_), Some(_)) => Err(DatasetError::Configuration(
                "split ratios and a group policy are mutually exclusive".to_string(),
            )),
            (None, None) => Err(DatasetError::Configuration(
                "either split ratios or a group policy must be given".to_string(),
            )),
        }
    }
}

/// Result of a split: the assignment plus every group that had no rule
#[derive(Debug, Clone, Default)]
pub struct SplitOutcome {
    pub assignment: SplitAssignment,
    pub gaps: Vec<AssignmentGap>,
}

impl SplitOutcome {
    pub fn dropped_records(&self) -> usize {
        self.gaps.iter().map(|gap| gap.records).sum()
    }
}

/// Bucket records by feature value, keeping their relative order
pub fn group_by_feature(
    records: Vec<VideoRecord>,
    feature: Feature,
) -> BTreeMap<String, Vec<VideoRecord>> {
    let mut groups: BTreeMap<String, Vec<VideoRecord>> = BTreeMap::new();
    for record in records {
        groups
            .entry(record.feature(feature).to_string())
            .or_default()
            .push(record);
    }
    groups
}

/// Log how many images and labels each group holds
pub fn summarize_groups(groups: &BTreeMap<String, Vec<VideoRecord>>) {
    for (key, items) in groups {
        let num_images: usize = items.iter().map(|r| r.image_files.len()).sum();
        let num_labels: usize = items.iter().map(|r| r.label_files.len()).sum();
        info!(
            "Key: {}, videos: {}, images: {}, labels: {}",
            key,
            items.len(),
            num_images,
            num_labels
        );
    }
}

fn slice_group(assignment: &mut SplitAssignment, items: Vec<VideoRecord>, ratios: &SplitRatios) {
    let (train_size, val_size) = ratios.slice_sizes(items.len());
    let mut items = items.into_iter();
    assignment.train.extend(items.by_ref().take(train_size));
    assignment.val.extend(items.by_ref().take(val_size));
    assignment.test.extend(items);
}

/// Split records into train, val and test.
///
/// All records are shuffled with `seed` first, then grouped by `group_key`. In ratio
/// mode every group is sliced independently, so each group feeds every split. In
/// policy mode each group follows its rule; groups without one are dropped and
/// returned in [`SplitOutcome::gaps`].
pub fn split(
    mut records: Vec<VideoRecord>,
    mode: &SplitMode,
    group_key: Feature,
    seed: u64,
) -> SplitOutcome {
    let mut rng = StdRng::seed_from_u64(seed);
    records.shuffle(&mut rng);

    let groups = group_by_feature(records, group_key);
    summarize_groups(&groups);

    let mut outcome = SplitOutcome::default();
    for (key, items) in groups {
        info!("Splitting data for key: {}, with {} items", key, items.len());
        let rule = match mode {
            SplitMode::Ratios(ratios) => AssignmentRule::Proportional(*ratios),
            SplitMode::Policy(policy) => match policy.rule(&key) {
                Some(rule) => *rule,
                None => {
                    warn!(
                        "No assignment rule for {} '{}': dropping {} video(s)",
                        group_key,
                        key,
                        items.len()
                    );
                    outcome.gaps.push(AssignmentGap {
                        group_value: key,
                        records: items.len(),
                        folders: items.into_iter().map(|r| r.folder).collect(),
                    });
                    continue;
                }
            },
        };

        match rule {
            AssignmentRule::Whole(split) => outcome.assignment.records_mut(split).extend(items),
            AssignmentRule::Proportional(ratios) => {
                slice_group(&mut outcome.assignment, items, &ratios)
            }
        }
    }

    info!(
        "Split {} videos: train {}, val {}, test {}, dropped {}",
        outcome.assignment.len() + outcome.dropped_records(),
        outcome.assignment.train.len(),
        outcome.assignment.val.len(),
        outcome.assignment.test.len(),
        outcome.dropped_records()
    );
    outcome
}
