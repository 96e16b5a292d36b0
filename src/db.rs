// 🗄️ SQLite Store - rusqlite implementation of CodeStore
//
// One table, self-referencing: a branch row points at its headquarter row
// through `headquarter_id`. Foreign keys are enforced, so a headquarter that
// still has linked branches cannot be deleted on its own.

use crate::code::{normalize, BankCode};
use crate::error::{DirectoryError, Result};
use crate::store::CodeStore;
use rusqlite::{ffi, params, Connection, OptionalExtension, Row, ToSql};
use std::path::Path;

/// Columns of a record joined with its (optional) headquarter
const SELECT_CODES: &str = "SELECT c.id, c.swift_code, c.bank_name, c.address,
            c.country_iso2, c.country_name,
            h.id, h.swift_code, h.bank_name, h.address,
            h.country_iso2, h.country_name
     FROM swift_codes c
     LEFT JOIN swift_codes h ON h.id = c.headquarter_id";

pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS swift_codes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            swift_code TEXT UNIQUE NOT NULL,
            bank_name TEXT NOT NULL,
            address TEXT NOT NULL,
            country_iso2 TEXT NOT NULL,
            country_name TEXT NOT NULL,
            headquarter_id INTEGER REFERENCES swift_codes(id),
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_country_iso2 ON swift_codes(country_iso2)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_headquarter_id ON swift_codes(headquarter_id)",
        [],
    )?;

    tracing::debug!("swift_codes schema ready");
    Ok(())
}

/// SQLite-backed [`CodeStore`].
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Wrap an open connection, creating the schema if needed
    pub fn new(conn: Connection) -> Result<Self> {
        setup_database(&conn)?;
        Ok(SqliteStore { conn })
    }

    pub fn open(path: &Path) -> Result<Self> {
        Self::new(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::new(Connection::open_in_memory()?)
    }

    fn insert(&self, record: &BankCode) -> Result<i64> {
        let result = self.conn.execute(
            "INSERT INTO swift_codes (
                swift_code, bank_name, address, country_iso2, country_name, headquarter_id
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                normalize(&record.code),
                record.bank_name,
                record.address,
                record.country_iso2,
                record.country_name,
                headquarter_id(record)?,
            ],
        );

        match result {
            Ok(_) => Ok(self.conn.last_insert_rowid()),
            Err(e) => Err(write_error(e, record)),
        }
    }

    fn update(&self, id: i64, record: &BankCode) -> Result<()> {
        let result = self.conn.execute(
            "UPDATE swift_codes
             SET swift_code = ?1, bank_name = ?2, address = ?3,
                 country_iso2 = ?4, country_name = ?5, headquarter_id = ?6
             WHERE id = ?7",
            params![
                normalize(&record.code),
                record.bank_name,
                record.address,
                record.country_iso2,
                record.country_name,
                headquarter_id(record)?,
                id,
            ],
        );

        match result {
            Ok(0) => Err(DirectoryError::code_not_found(&record.code)),
            Ok(_) => Ok(()),
            Err(e) => Err(write_error(e, record)),
        }
    }

    fn query_codes(&self, filter: &str, args: &[&dyn ToSql]) -> Result<Vec<BankCode>> {
        let sql = format!("{} {} ORDER BY c.swift_code", SELECT_CODES, filter);
        let mut stmt = self.conn.prepare_cached(&sql)?;

        let codes = stmt
            .query_map(args, row_to_code)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(codes)
    }
}

impl CodeStore for SqliteStore {
    fn count(&self) -> Result<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM swift_codes", [], |row| row.get(0))?;

        Ok(count)
    }

    fn persist_batch(&self, records: &[BankCode]) -> Result<usize> {
        let mut inserted = 0;

        for record in records {
            self.insert(record)?;
            inserted += 1;
        }

        Ok(inserted)
    }

    fn persist_one(&self, record: &BankCode) -> Result<BankCode> {
        let id = match record.id {
            Some(id) => {
                self.update(id, record)?;
                id
            }
            None => self.insert(record)?,
        };

        let mut stored = record.clone();
        stored.id = Some(id);
        stored.code = normalize(&record.code);
        Ok(stored)
    }

    fn delete_one(&self, record: &BankCode) -> Result<()> {
        let code = normalize(&record.code);
        let result = self
            .conn
            .execute("DELETE FROM swift_codes WHERE swift_code = ?1", params![code]);

        match result {
            Ok(0) => Err(DirectoryError::code_not_found(&code)),
            Ok(_) => Ok(()),
            Err(e) if is_constraint_violation(&e) => Err(DirectoryError::DeletionConflict {
                code,
                reason: e.to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    fn find_by_code(&self, code: &str) -> Result<Option<BankCode>> {
        let sql = format!("{} WHERE c.swift_code = ?1", SELECT_CODES);
        let found = self
            .conn
            .query_row(&sql, params![normalize(code)], row_to_code)
            .optional()?;

        Ok(found)
    }

    fn find_by_country(&self, iso2: &str) -> Result<Vec<BankCode>> {
        let iso2 = normalize(iso2);
        self.query_codes("WHERE c.country_iso2 = ?1", &[&iso2 as &dyn ToSql])
    }

    fn find_by_prefix_excluding_suffix(
        &self,
        prefix: &str,
        suffix: &str,
    ) -> Result<Vec<BankCode>> {
        let starts_with = format!("{}%", escape_like(&normalize(prefix)));
        let ends_with = format!("%{}", escape_like(&normalize(suffix)));

        self.query_codes(
            "WHERE c.swift_code LIKE ?1 ESCAPE '\\' AND c.swift_code NOT LIKE ?2 ESCAPE '\\'",
            &[&starts_with as &dyn ToSql, &ends_with],
        )
    }

    fn atomically<T, F>(&self, work: F) -> Result<T>
    where
        F: FnOnce(&Self) -> Result<T>,
    {
        // Dropping the transaction without commit rolls it back
        let tx = self.conn.unchecked_transaction()?;
        let out = work(self)?;
        tx.commit()?;
        Ok(out)
    }
}

// ============================================================================
// ROW HELPERS
// ============================================================================

fn row_to_code(row: &Row<'_>) -> rusqlite::Result<BankCode> {
    let hq_id: Option<i64> = row.get(6)?;

    let headquarter = match hq_id {
        Some(id) => Some(Box::new(BankCode {
            id: Some(id),
            code: row.get(7)?,
            bank_name: row.get(8)?,
            address: row.get(9)?,
            country_iso2: row.get(10)?,
            country_name: row.get(11)?,
            headquarter: None,
        })),
        None => None,
    };

    Ok(BankCode {
        id: Some(row.get(0)?),
        code: row.get(1)?,
        bank_name: row.get(2)?,
        address: row.get(3)?,
        country_iso2: row.get(4)?,
        country_name: row.get(5)?,
        headquarter,
    })
}

/// Row id of the referenced headquarter; it must come from the store.
fn headquarter_id(record: &BankCode) -> Result<Option<i64>> {
    match record.headquarter.as_deref() {
        None => Ok(None),
        Some(hq) => hq.id.map(Some).ok_or_else(|| {
            DirectoryError::MalformedInput(format!(
                "headquarter {} of {} has no stored identity",
                hq.code, record.code
            ))
        }),
    }
}

/// Map a failed INSERT/UPDATE. Only uniqueness clashes are duplicates; a
/// dangling `headquarter_id` means the referenced headquarter is gone.
fn write_error(err: rusqlite::Error, record: &BankCode) -> DirectoryError {
    match constraint_kind(&err) {
        Some(ffi::SQLITE_CONSTRAINT_UNIQUE) | Some(ffi::SQLITE_CONSTRAINT_PRIMARYKEY) => {
            DirectoryError::DuplicateCode(normalize(&record.code))
        }
        Some(ffi::SQLITE_CONSTRAINT_FOREIGNKEY) => match record.headquarter.as_deref() {
            Some(hq) => DirectoryError::code_not_found(&normalize(&hq.code)),
            None => err.into(),
        },
        _ => err.into(),
    }
}

/// Extended result code of a constraint violation, if `err` is one
fn constraint_kind(err: &rusqlite::Error) -> Option<std::os::raw::c_int> {
    match err {
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            Some(e.extended_code)
        }
        _ => None,
    }
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    constraint_kind(err).is_some()
}

fn escape_like(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_code(code: &str, country: &str) -> BankCode {
        BankCode::new(code, "TEST BANK", "TEST ADDRESS", country, "TEST COUNTRY")
    }

    #[test]
    fn test_persist_and_find_by_code() {
        let store = SqliteStore::open_in_memory().unwrap();

        let stored = store.persist_one(&create_test_code("AAAABBCCXXX", "US")).unwrap();
        assert!(stored.id.is_some());

        // Lookups are case-insensitive on the way in
        let found = store.find_by_code("aaaabbccxxx").unwrap().unwrap();
        assert_eq!(found, stored);
        assert_eq!(found.code, "AAAABBCCXXX");

        assert!(store.find_by_code("ZZZZZZZZXXX").unwrap().is_none());
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn test_duplicate_insert_is_rejected() {
        let store = SqliteStore::open_in_memory().unwrap();
        let code = create_test_code("AAAABBCCXXX", "US");

        store.persist_one(&code).unwrap();
        let err = store.persist_one(&code).unwrap_err();

        assert!(matches!(err, DirectoryError::DuplicateCode(ref c) if c == "AAAABBCCXXX"));
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn test_dangling_headquarter_is_not_a_duplicate() {
        let store = SqliteStore::open_in_memory().unwrap();
        let mut hq = create_test_code("AAAABBCCXXX", "US");
        hq.id = Some(999);

        let err = store
            .persist_one(&create_test_code("AAAABBCC001", "US").with_headquarter(hq))
            .unwrap_err();

        assert!(!matches!(err, DirectoryError::DuplicateCode(_)));
        assert!(matches!(err, DirectoryError::NotFound { ref key, .. } if key == "AAAABBCCXXX"));
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_relink_to_missing_headquarter_is_not_a_duplicate() {
        let store = SqliteStore::open_in_memory().unwrap();
        let branch = store.persist_one(&create_test_code("AAAABBCC001", "US")).unwrap();
        let mut hq = create_test_code("AAAABBCCXXX", "US");
        hq.id = Some(999);

        let err = store.persist_one(&branch.with_headquarter(hq)).unwrap_err();
        assert!(err.is_not_found());

        let found = store.find_by_code("AAAABBCC001").unwrap().unwrap();
        assert!(found.headquarter.is_none());
    }

    #[test]
    fn test_branch_row_carries_headquarter() {
        let store = SqliteStore::open_in_memory().unwrap();
        let hq = store.persist_one(&create_test_code("AAAABBCCXXX", "US")).unwrap();

        let branch = create_test_code("AAAABBCC001", "US").with_headquarter(hq.clone());
        store.persist_one(&branch).unwrap();

        let found = store.find_by_code("AAAABBCC001").unwrap().unwrap();
        assert_eq!(found.headquarter.as_deref(), Some(&hq));
    }

    #[test]
    fn test_headquarter_without_identity_is_rejected() {
        let store = SqliteStore::open_in_memory().unwrap();
        let branch = create_test_code("AAAABBCC001", "US")
            .with_headquarter(create_test_code("AAAABBCCXXX", "US"));

        let err = store.persist_one(&branch).unwrap_err();
        assert!(matches!(err, DirectoryError::MalformedInput(_)));
    }

    #[test]
    fn test_persist_one_with_identity_updates() {
        let store = SqliteStore::open_in_memory().unwrap();
        let branch = store.persist_one(&create_test_code("AAAABBCC001", "US")).unwrap();
        let hq = store.persist_one(&create_test_code("AAAABBCCXXX", "US")).unwrap();

        let relinked = store.persist_one(&branch.clone().with_headquarter(hq)).unwrap();
        assert_eq!(relinked.id, branch.id);
        assert_eq!(store.count().unwrap(), 2);

        let found = store.find_by_code("AAAABBCC001").unwrap().unwrap();
        assert_eq!(found.headquarter_code(), Some("AAAABBCCXXX"));
    }

    #[test]
    fn test_find_by_country_and_prefix() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .persist_batch(&[
                create_test_code("AAAABBCCXXX", "US"),
                create_test_code("AAAABBCC001", "US"),
                create_test_code("AAAABBCC002", "US"),
                create_test_code("ZZZZYYXX001", "PL"),
            ])
            .unwrap();

        let us = store.find_by_country("us").unwrap();
        assert_eq!(us.len(), 3);
        assert!(store.find_by_country("DE").unwrap().is_empty());

        let branches = store.find_by_prefix_excluding_suffix("AAAABBCC", "XXX").unwrap();
        let codes: Vec<&str> = branches.iter().map(|b| b.code.as_str()).collect();
        assert_eq!(codes, vec!["AAAABBCC001", "AAAABBCC002"]);
    }

    #[test]
    fn test_prefix_wildcards_are_literal() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.persist_one(&create_test_code("AAAABBCC001", "US")).unwrap();

        assert!(store.find_by_prefix_excluding_suffix("AAAA%", "XXX").unwrap().is_empty());
        assert!(store.find_by_prefix_excluding_suffix("AAAA_BCC", "XXX").unwrap().is_empty());
    }

    #[test]
    fn test_delete_missing_and_referenced() {
        let store = SqliteStore::open_in_memory().unwrap();
        let hq = store.persist_one(&create_test_code("AAAABBCCXXX", "US")).unwrap();
        store
            .persist_one(&create_test_code("AAAABBCC001", "US").with_headquarter(hq.clone()))
            .unwrap();

        let err = store.delete_one(&create_test_code("ZZZZZZZZXXX", "US")).unwrap_err();
        assert!(err.is_not_found());

        // Still referenced by its branch
        let err = store.delete_one(&hq).unwrap_err();
        assert!(matches!(err, DirectoryError::DeletionConflict { .. }));
        assert_eq!(store.count().unwrap(), 2);
    }

    #[test]
    fn test_atomically_rolls_back_on_error() {
        let store = SqliteStore::open_in_memory().unwrap();

        let result: Result<()> = store.atomically(|s| {
            s.persist_one(&create_test_code("AAAABBCCXXX", "US"))?;
            s.persist_one(&create_test_code("AAAABBCCXXX", "US"))?;
            Ok(())
        });

        assert!(matches!(result, Err(DirectoryError::DuplicateCode(_))));
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_on_disk_database_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("codes.db");

        {
            let store = SqliteStore::open(&path).unwrap();
            store.persist_one(&create_test_code("AAAABBCCXXX", "US")).unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.count().unwrap(), 1);
    }
}
