use log::{info, warn};
use std::path::Path;

use crate::balance::{balance_report, BalanceReport};
use crate::config::SplitArgs;
use crate::error::{AssignmentGap, DatasetError, LeakageViolation, ScanWarning};
use crate::io::{create_dataset_yaml, materialize, setup_output_directories};
use crate::manifest::{read_manifest, write_manifest, SplitManifest};
use crate::scanner::scan_dataset;
use crate::splitter::{split, SplitMode};
use crate::types::{Feature, ProcessingStats, SplitAssignment};
use crate::verify::verify_no_leakage;

/// Everything a split run found and produced
#[derive(Debug, Default)]
pub struct DatasetReport {
    pub assignment: SplitAssignment,
    pub scan_warnings: Vec<ScanWarning>,
    pub gaps: Vec<AssignmentGap>,
    pub violations: Vec<LeakageViolation>,
    pub stats: ProcessingStats,
    pub balance: Vec<BalanceReport>,
}

fn resolve_assignment(
    args: &SplitArgs,
    mode: &SplitMode,
    report: &mut DatasetReport,
) -> Result<SplitAssignment, DatasetError> {
    if let Some(manifest_path) = args.manifest.as_deref().filter(|p| p.exists()) {
        if args.reuse_manifest {
            info!("Loading split from manifest {}", manifest_path.display());
            let manifest = read_manifest(manifest_path)?;
            if manifest.group_key != args.key_feature || manifest.seed != args.seed {
                warn!(
                    "Manifest was created with key {} and seed {}, current run uses {} and {}",
                    manifest.group_key, manifest.seed, args.key_feature, args.seed
                );
            }
            return Ok(manifest.into_assignment());
        }
    }

    let scan = scan_dataset(&args.base_path, &args.categories);
    report.scan_warnings = scan.warnings;

    let outcome = split(scan.records, mode, args.key_feature, args.seed);
    report.gaps = outcome.gaps;

    if let Some(manifest_path) = &args.manifest {
        let manifest = SplitManifest::from_assignment(&outcome.assignment, args.key_feature, args.seed);
        write_manifest(manifest_path, &manifest)?;
        info!("Split manifest saved to {}", manifest_path.display());
    }
    Ok(outcome.assignment)
}

/// Scan, split, verify, copy and report.
///
/// Configuration problems fail before anything is written. Per-record problems are
/// collected in the returned report; with `--strict` dropped records or leaked
/// videos turn into an error after the output has been written.
pub fn process_dataset(args: &SplitArgs) -> Result<DatasetReport, DatasetError> {
    let mode = args.to_split_mode()?;
    let base: &Path = &args.base_path;
    if !base.is_dir() {
        return Err(DatasetError::Configuration(format!(
            "the specified base_path does not exist: {}",
            base.display()
        )));
    }

    let mut report = DatasetReport::default();
    let assignment = resolve_assignment(args, &mode, &mut report)?;

    if let Err(violations) = verify_no_leakage(&assignment) {
        report.violations = violations;
    }

    let output_dirs = setup_output_directories(base).map_err(|e| DatasetError::io(base, e))?;
    report.stats = materialize(&assignment, &output_dirs);
    report.stats.print_summary("Copy");
    info!("Data split complete.");

    for feature in Feature::ALL {
        let balance = balance_report(&assignment, feature);
        info!("\n{}", balance);
        report.balance.push(balance);
    }

    create_dataset_yaml(base, &args.class_ids)?;
    report.assignment = assignment;

    if args.strict {
        if let Some(gap) = report.gaps.first() {
            return Err(DatasetError::AssignmentGap(gap.clone()));
        }
        if !report.violations.is_empty() {
            return Err(DatasetError::Leakage(report.violations.clone()));
        }
    }

    info!("Dataset split and verification complete.");
    Ok(report)
}
