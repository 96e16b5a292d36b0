// 📥 Batch Importer - one-pass load of raw records into a store
//
// 1. Partition raw records into headquarters and branches
// 2. Map prefix -> headquarter (last write wins on duplicate prefixes)
// 3. Persist headquarters as one batch
// 4. Link each branch to the headquarter of ITS batch, re-fetched from the
//    store for its identity; no match means an unlinked branch
// 5. Persist branches as a second batch
//
// All of it runs in one transaction. A headquarter that only exists from a
// previous import is never looked up.

use crate::code::BankCode;
use crate::error::Result;
use crate::store::CodeStore;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

// ============================================================================
// IMPORT PLAN (pure)
// ============================================================================

/// Branch plus the code of the headquarter it will be linked to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedBranch {
    pub branch: BankCode,
    pub headquarter_code: Option<String>,
}

/// What an import will write, computed without touching storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportPlan {
    /// One headquarter per prefix, ordered by prefix
    pub headquarters: Vec<BankCode>,
    pub branches: Vec<PlannedBranch>,
}

#[cfg(test)]
impl ImportPlan {
    /// branch code -> headquarter code (or None)
    pub(crate) fn associations(&self) -> BTreeMap<String, Option<String>> {
        self.branches
            .iter()
            .map(|planned| (planned.branch.code.clone(), planned.headquarter_code.clone()))
            .collect()
    }
}

/// Partition and link raw records. Fails on the first malformed code.
pub fn plan_import(records: &[BankCode]) -> Result<ImportPlan> {
    let mut headquarter_map: BTreeMap<String, BankCode> = BTreeMap::new();
    let mut raw_branches = Vec::new();

    for record in records {
        let prefix = record.prefix()?.to_string();

        if record.is_headquarter() {
            let mut headquarter = record.clone();
            headquarter.id = None;
            headquarter.headquarter = None;
            headquarter_map.insert(prefix, headquarter);
        } else {
            raw_branches.push((prefix, record));
        }
    }

    let branches = raw_branches
        .into_iter()
        .map(|(prefix, record)| {
            let mut branch = record.clone();
            branch.id = None;
            branch.headquarter = None;

            PlannedBranch {
                branch,
                headquarter_code: headquarter_map.get(&prefix).map(|hq| hq.code.clone()),
            }
        })
        .collect();

    Ok(ImportPlan {
        headquarters: headquarter_map.into_values().collect(),
        branches,
    })
}

// ============================================================================
// IMPORT
// ============================================================================

/// Outcome of a completed import
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub records_read: usize,
    pub headquarters: usize,
    pub linked_branches: usize,
    pub unlinked_branches: usize,
}

impl ImportReport {
    pub fn persisted(&self) -> usize {
        self.headquarters + self.linked_branches + self.unlinked_branches
    }
}

/// Import `records` into `store` as one all-or-nothing unit.
///
/// Only meant for an empty store; existing records are not deduplicated
/// against and a clash fails the whole import with `DuplicateCode`.
pub fn import<S: CodeStore>(store: &S, records: &[BankCode]) -> Result<ImportReport> {
    let plan = plan_import(records)?;

    store.atomically(|store| {
        let mut report = ImportReport {
            records_read: records.len(),
            headquarters: store.persist_batch(&plan.headquarters)?,
            ..ImportReport::default()
        };

        // Headquarters of this batch, as stored, fetched at most once each
        let mut stored_headquarters: HashMap<&str, Option<BankCode>> = HashMap::new();
        let mut branches = Vec::with_capacity(plan.branches.len());

        for planned in &plan.branches {
            let mut branch = planned.branch.clone();

            if let Some(hq_code) = planned.headquarter_code.as_deref() {
                let stored = match stored_headquarters.get(hq_code) {
                    Some(found) => found.clone(),
                    None => {
                        let found = store.find_by_code(hq_code)?;
                        stored_headquarters.insert(hq_code, found.clone());
                        found
                    }
                };
                branch.headquarter = stored.map(Box::new);
            }

            if branch.headquarter.is_some() {
                report.linked_branches += 1;
            } else {
                report.unlinked_branches += 1;
            }
            branches.push(branch);
        }

        store.persist_batch(&branches)?;
        Ok(report)
    })
}
