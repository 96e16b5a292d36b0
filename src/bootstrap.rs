// 🚀 Startup Gate - seed the store once, and only while it is empty
//
// There is no "initialized" flag anywhere; the store's record count is the
// only state consulted.

use crate::error::Result;
use crate::importer::{self, ImportReport};
use crate::source::RecordSource;
use crate::store::CodeStore;

pub fn is_initialized<S: CodeStore>(store: &S) -> Result<bool> {
    Ok(store.count()? != 0)
}

/// Import from `source` if the store is empty. `None` when skipped.
pub fn initialize<S: CodeStore, R: RecordSource>(
    store: &S,
    source: &R,
) -> Result<Option<ImportReport>> {
    if is_initialized(store)? {
        tracing::info!("store already holds SWIFT codes, skipping import");
        return Ok(None);
    }

    tracing::info!(source = %source.describe(), "store is empty, importing SWIFT codes");
    let records = source.read_records()?;
    let report = importer::import(store, &records)?;

    tracing::info!(
        records = report.records_read,
        headquarters = report.headquarters,
        linked_branches = report.linked_branches,
        unlinked_branches = report.unlinked_branches,
        "import finished"
    );
    Ok(Some(report))
}
