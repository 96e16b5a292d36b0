// 🔎 Code Resolver - headquarter/branch queries on top of a CodeStore
//
// Every relationship is DERIVED from the code string:
// - "....XXX" is a headquarter
// - a branch's headquarter is `prefix + "XXX"`
// - a headquarter's branches share its prefix and don't end in "XXX"
//
// Nothing is cached: each call re-reads the store.

use crate::code::{self, BankCode, HEADQUARTER_SUFFIX};
use crate::error::{DirectoryError, Result};
use crate::store::CodeStore;

/// A record plus, for headquarters, the branches sharing its prefix
#[derive(Debug, Clone, PartialEq)]
pub struct CodeDetails {
    pub code: BankCode,
    pub branches: Option<Vec<BankCode>>,
}

/// Lookup, creation and deletion of SWIFT codes.
pub struct CodeResolver<S: CodeStore> {
    store: S,
}

impl<S: CodeStore> CodeResolver<S> {
    pub fn new(store: S) -> Self {
        CodeResolver { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    // ========================================================================
    // QUERIES
    // ========================================================================

    pub fn find_by_code(&self, code: &str) -> Result<BankCode> {
        code::validate_code(code)?;
        self.store
            .find_by_code(code)?
            .ok_or_else(|| DirectoryError::code_not_found(&code::normalize(code)))
    }

    /// All codes of a country. An empty result is an error, never `[]`.
    pub fn find_by_country(&self, iso2: &str) -> Result<Vec<BankCode>> {
        code::validate_country(iso2)?;
        let codes = self.store.find_by_country(iso2)?;

        if codes.is_empty() {
            return Err(DirectoryError::country_not_found(&code::normalize(iso2)));
        }
        Ok(codes)
    }

    pub fn find_headquarter_for(&self, branch_code: &str) -> Result<BankCode> {
        let key = code::headquarter_key_for(&code::normalize(branch_code))?;
        self.store
            .find_by_code(&key)?
            .ok_or_else(|| DirectoryError::code_not_found(&key))
    }

    pub fn find_branches_for(&self, headquarter_code: &str) -> Result<Vec<BankCode>> {
        let normalized = code::normalize(headquarter_code);
        let prefix = code::prefix(&normalized)?;
        self.store
            .find_by_prefix_excluding_suffix(prefix, HEADQUARTER_SUFFIX)
    }

    /// Lookup used by the API: branches are attached only to headquarters
    pub fn find_with_branches(&self, code: &str) -> Result<CodeDetails> {
        let found = self.find_by_code(code)?;

        let branches = if found.is_headquarter() {
            Some(self.find_branches_for(&found.code)?)
        } else {
            None
        };

        Ok(CodeDetails {
            code: found,
            branches,
        })
    }

    // ========================================================================
    // COMMANDS
    // ========================================================================

    /// Create one record.
    ///
    /// A headquarter is stored first, then every existing branch with its
    /// prefix is re-linked to it. A branch requires its headquarter to exist
    /// already (`NotFound` otherwise).
    pub fn create(&self, record: BankCode) -> Result<BankCode> {
        let mut record = BankCode::new(
            &record.code,
            &record.bank_name,
            &record.address,
            &record.country_iso2,
            &record.country_name,
        );
        code::validate_code(&record.code)?;
        code::validate_country(&record.country_iso2)?;

        self.store.atomically(|store| {
            if store.find_by_code(&record.code)?.is_some() {
                return Err(DirectoryError::DuplicateCode(record.code.clone()));
            }

            if record.is_headquarter() {
                let created = store.persist_one(&record)?;
                let prefix = code::prefix(&created.code)?;

                for branch in store.find_by_prefix_excluding_suffix(prefix, HEADQUARTER_SUFFIX)? {
                    store.persist_one(&branch.with_headquarter(created.clone()))?;
                }
                Ok(created)
            } else {
                let key = code::headquarter_key_for(&record.code)?;
                let headquarter = store
                    .find_by_code(&key)?
                    .ok_or_else(|| DirectoryError::code_not_found(&key))?;

                record.headquarter = Some(Box::new(headquarter));
                store.persist_one(&record)
            }
        })
    }

    /// Delete one record; a headquarter takes all its branches with it,
    /// branches first.
    pub fn delete(&self, code: &str) -> Result<()> {
        let target = self.find_by_code(code)?;

        self.store.atomically(|store| {
            if target.is_headquarter() {
                let prefix = code::prefix(&target.code)?;
                for branch in store.find_by_prefix_excluding_suffix(prefix, HEADQUARTER_SUFFIX)? {
                    store.delete_one(&branch)?;
                }
            }
            store.delete_one(&target)
        })
    }
}
