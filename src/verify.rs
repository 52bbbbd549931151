use log::{error, info};
use std::collections::HashMap;

use crate::error::LeakageViolation;
use crate::types::{Split, SplitAssignment};

/// Check that no video folder appears in more than one split.
///
/// Only looks at the assignment itself, so it also audits manifests and
/// hand-edited splits. Violations are returned rather than raised; the caller
/// decides whether they are fatal.
pub fn verify_no_leakage(assignment: &SplitAssignment) -> Result<(), Vec<LeakageViolation>> {
    let mut folder_to_split: HashMap<&str, Split> = HashMap::with_capacity(assignment.len());
    let mut violations = Vec::new();

    for (split, record) in assignment.iter() {
        match folder_to_split.get(record.folder.as_str()) {
            Some(&first) if first != split => {
                let violation = LeakageViolation {
                    folder: record.folder.clone(),
                    first,
                    second: split,
                };
                error!("Leakage: {}", violation);
                violations.push(violation);
            }
            Some(_) => {}
            None => {
                folder_to_split.insert(record.folder.as_str(), split);
            }
        }
    }

    if violations.is_empty() {
        info!(
            "Verification complete - all {} folders are assigned to one split.",
            folder_to_split.len()
        );
        Ok(())
    } else {
        Err(violations)
    }
}
