//! Per-feature balance report over a split assignment
//!
//! Counts are in images (extracted frames), not videos.

use std::collections::BTreeMap;
use std::fmt;

use crate::types::{Feature, Split, SplitAssignment};

/// One row of the balance table
#[derive(Debug, Clone, PartialEq)]
pub struct BalanceRow {
    pub value: String,
    pub total: usize,
    pub train: usize,
    pub val: usize,
    pub test: usize,
    pub train_percent: f64,
    pub val_percent: f64,
    pub test_percent: f64,
}

impl BalanceRow {
    fn new(value: String, train: usize, val: usize, test: usize) -> Self {
        let total = train + val + test;
        let percent = |count: usize| {
            if total > 0 {
                count as f64 / total as f64 * 100.0
            } else {
                0.0
            }
        };
        Self {
            train_percent: percent(train),
            val_percent: percent(val),
            test_percent: percent(test),
            value,
            total,
            train,
            val,
            test,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BalanceReport {
    pub feature: Feature,
    pub rows: Vec<BalanceRow>,
}

impl BalanceReport {
    pub fn row(&self, value: &str) -> Option<&BalanceRow> {
        self.rows.iter().find(|row| row.value == value)
    }
}

/// Aggregate image counts per value of `feature`, per split. Rows are sorted by value.
pub fn balance_report(assignment: &SplitAssignment, feature: Feature) -> BalanceReport {
    let mut counts: BTreeMap<String, [usize; 3]> = BTreeMap::new();
    for (split, record) in assignment.iter() {
        let slot = match split {
            Split::Train => 0,
            Split::Val => 1,
            Split::Test => 2,
        };
        counts
            .entry(record.feature(feature).to_string())
            .or_default()[slot] += record.image_files.len();
    }

    let rows = counts
        .into_iter()
        .map(|(value, [train, val, test])| BalanceRow::new(value, train, val, test))
        .collect();

    BalanceReport { feature, rows }
}

impl fmt::Display for BalanceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Balancing based on {}:", self.feature)?;
        writeln!(
            f,
            "{:<20} {:<10} {:<10} {:<10} {:<10} {:<10} {:<10} {:<10}",
            "Feature", "Total", "Train", "Val", "Test", "Train %", "Val %", "Test %"
        )?;
        writeln!(f, "{}", "-".repeat(95))?;
        for row in &self.rows {
            writeln!(
                f,
                "{:<20} {:<10} {:<10} {:<10} {:<10} {:<10.2} {:<10.2} {:<10.2}",
                row.value,
                row.total,
                row.train,
                row.val,
                row.test,
                row.train_percent,
                row.val_percent,
                row.test_percent
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_total_has_zero_percentages() {
        let row = BalanceRow::new("C1".to_string(), 0, 0, 0);
        assert_eq!(row.total, 0);
        assert_eq!(
            (row.train_percent, row.val_percent, row.test_percent),
            (0.0, 0.0, 0.0)
        );
    }

    #[test]
    fn test_percentages_sum_to_hundred() {
        let row = BalanceRow::new("C1".to_string(), 7, 2, 1);
        assert!((row.train_percent - 70.0).abs() < 1e-9);
        assert!((row.train_percent + row.val_percent + row.test_percent - 100.0).abs() < 1e-9);
    }
}
