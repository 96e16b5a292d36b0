// 💾 Code Store - the storage collaborator the directory core talks to
// The store owns persisted records; callers only hold copies.

use crate::code::BankCode;
use crate::error::Result;

/// Keyed lookup and persistence of SWIFT code records.
///
/// Codes are matched case-insensitively on the way in and always stored and
/// returned uppercase. Implementations must enforce code uniqueness and
/// report violations as `DirectoryError::DuplicateCode`. A write that points
/// at a headquarter the store no longer holds is `NotFound` for that
/// headquarter, never a duplicate.
pub trait CodeStore {
    /// Number of stored records.
    fn count(&self) -> Result<i64>;

    /// Insert many records. Not atomic on its own; wrap in [`atomically`].
    ///
    /// [`atomically`]: CodeStore::atomically
    fn persist_batch(&self, records: &[BankCode]) -> Result<usize>;

    /// Insert a record without identity, or update the row of a record that
    /// has one. Returns the record with its identity.
    fn persist_one(&self, record: &BankCode) -> Result<BankCode>;

    /// Delete a stored record. `NotFound` if no row matched,
    /// `DeletionConflict` if the store refused.
    fn delete_one(&self, record: &BankCode) -> Result<()>;

    fn find_by_code(&self, code: &str) -> Result<Option<BankCode>>;

    fn find_by_country(&self, iso2: &str) -> Result<Vec<BankCode>>;

    /// Records whose code starts with `prefix` and does not end with `suffix`.
    fn find_by_prefix_excluding_suffix(&self, prefix: &str, suffix: &str)
        -> Result<Vec<BankCode>>;

    /// Run `work` as one unit: either everything it persisted is committed,
    /// or nothing is.
    fn atomically<T, F>(&self, work: F) -> Result<T>
    where
        Self: Sized,
        F: FnOnce(&Self) -> Result<T>;
}
