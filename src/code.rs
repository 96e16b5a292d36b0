// 🏦 SWIFT Code Entity - one record type for headquarters and branches
//
// A SWIFT/BIC code is 11 characters: an 8-character institution+location
// prefix followed by a 3-character branch suffix. "XXX" marks a headquarter.
//
// Headquarter and branch are the SAME type: a branch simply carries an
// optional reference to its headquarter, resolved by key lookup.

use crate::error::{DirectoryError, Result};
use serde::{Deserialize, Serialize};

// ============================================================================
// CODE LAYOUT
// ============================================================================

/// Total length of a SWIFT code
pub const CODE_LENGTH: usize = 11;

/// Length of the institution+location prefix shared by a bank's codes
pub const PREFIX_LENGTH: usize = 8;

/// Suffix that marks a headquarter
pub const HEADQUARTER_SUFFIX: &str = "XXX";

/// True iff `code` ends with "XXX". Pure, no validation.
pub fn is_headquarter(code: &str) -> bool {
    code.ends_with(HEADQUARTER_SUFFIX)
}

/// First 8 characters of a well-formed code.
///
/// Fails with `MalformedInput` instead of slicing anything that is not an
/// 11-character ASCII alphanumeric string.
pub fn prefix(code: &str) -> Result<&str> {
    validate_code(code)?;
    Ok(&code[..PREFIX_LENGTH])
}

/// Key of the headquarter a branch belongs to: `prefix + "XXX"`.
pub fn headquarter_key_for(branch_code: &str) -> Result<String> {
    Ok(format!("{}{}", prefix(branch_code)?, HEADQUARTER_SUFFIX))
}

/// Checks the `[A-Z0-9]{11}` layout (case-insensitive).
pub fn validate_code(code: &str) -> Result<()> {
    if code.len() != CODE_LENGTH || !code.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(DirectoryError::MalformedInput(format!(
            "SWIFT code '{}' is not {} alphanumeric characters",
            code, CODE_LENGTH
        )));
    }
    Ok(())
}

/// Checks the `[A-Z]{2}` layout (case-insensitive).
pub fn validate_country(iso2: &str) -> Result<()> {
    if iso2.len() != 2 || !iso2.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(DirectoryError::MalformedInput(format!(
            "country ISO2 code '{}' is not 2 letters",
            iso2
        )));
    }
    Ok(())
}

/// Trim + uppercase, the normal form of every textual field.
pub fn normalize(value: &str) -> String {
    value.trim().to_uppercase()
}

// ============================================================================
// BANK CODE ENTITY
// ============================================================================

/// A stored (or about to be stored) SWIFT code record.
///
/// `id` is assigned by the store. `headquarter` is only ever set on branches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankCode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub code: String,
    pub bank_name: String,
    pub address: String,
    pub country_iso2: String,
    pub country_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headquarter: Option<Box<BankCode>>,
}

impl BankCode {
    /// New record without identity or headquarter; all fields normalized.
    pub fn new(
        code: &str,
        bank_name: &str,
        address: &str,
        country_iso2: &str,
        country_name: &str,
    ) -> Self {
        BankCode {
            id: None,
            code: normalize(code),
            bank_name: normalize(bank_name),
            address: normalize(address),
            country_iso2: normalize(country_iso2),
            country_name: normalize(country_name),
            headquarter: None,
        }
    }

    pub fn is_headquarter(&self) -> bool {
        is_headquarter(&self.code)
    }

    pub fn prefix(&self) -> Result<&str> {
        prefix(&self.code)
    }

    /// Builder pattern: attach a headquarter reference
    pub fn with_headquarter(mut self, headquarter: BankCode) -> Self {
        self.headquarter = Some(Box::new(headquarter));
        self
    }

    /// Code of the linked headquarter, if any
    pub fn headquarter_code(&self) -> Option<&str> {
        self.headquarter.as_deref().map(|hq| hq.code.as_str())
    }

    /// Copy without the store-assigned identity (and without the
    /// headquarter's identity), for comparing records across stores.
    #[cfg(test)]
    pub(crate) fn without_identity(&self) -> BankCode {
        let mut copy = self.clone();
        copy.id = None;
        if let Some(hq) = copy.headquarter.as_mut() {
            hq.id = None;
        }
        copy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_headquarter_matches_suffix() {
        for code in ["AAAABBCCXXX", "AAAABBCC001", "XXXXXXXXXXX", "AAAABBCCXX1", "XXX", ""] {
            assert_eq!(is_headquarter(code), code.ends_with("XXX"), "{}", code);
        }
    }

    #[test]
    fn test_headquarter_key_for_branch() {
        assert_eq!(headquarter_key_for("AAAABBCC001").unwrap(), "AAAABBCCXXX");
        assert_eq!(headquarter_key_for("AAAABBCCXXX").unwrap(), "AAAABBCCXXX");
    }

    #[test]
    fn test_prefix_rejects_malformed_codes() {
        assert_eq!(prefix("AAAABBCC001").unwrap(), "AAAABBCC");

        for bad in ["", "AAAA", "AAAABBCC00", "AAAABBCC0011", "AAAA-BCC001", "ÄAAABBCC01"] {
            let err = prefix(bad).unwrap_err();
            assert!(matches!(err, DirectoryError::MalformedInput(_)), "{}", bad);
        }
    }

    #[test]
    fn test_validate_country() {
        assert!(validate_country("PL").is_ok());
        assert!(validate_country("pl").is_ok());
        assert!(validate_country("P1").is_err());
        assert!(validate_country("POL").is_err());
    }

    #[test]
    fn test_new_normalizes_fields() {
        let code = BankCode::new(" aaaabbccxxx ", "Head Bank", " 1 Main St ", "us", "United States");

        assert_eq!(code.code, "AAAABBCCXXX");
        assert_eq!(code.bank_name, "HEAD BANK");
        assert_eq!(code.address, "1 MAIN ST");
        assert_eq!(code.country_iso2, "US");
        assert_eq!(code.country_name, "UNITED STATES");
        assert!(code.is_headquarter());
        assert!(code.id.is_none());
        assert!(code.headquarter.is_none());
    }

    #[test]
    fn test_without_identity_strips_ids() {
        let mut hq = BankCode::new("AAAABBCCXXX", "HEAD", "ADDR", "US", "USA");
        hq.id = Some(1);
        let mut branch = BankCode::new("AAAABBCC001", "BRANCH", "ADDR", "US", "USA")
            .with_headquarter(hq);
        branch.id = Some(2);

        let stripped = branch.without_identity();
        assert!(stripped.id.is_none());
        assert!(stripped.headquarter.as_ref().unwrap().id.is_none());
        assert_eq!(stripped.headquarter_code(), Some("AAAABBCCXXX"));
    }
}
