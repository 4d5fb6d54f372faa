//! Canonical address handling.
//!
//! Every DAO address is stored and compared as `0x` followed by 40 lowercase
//! hex characters. Input may use any letter case (including EIP-55
//! checksummed form) but nothing else: no whitespace, no missing prefix.

use std::str::FromStr;
use std::sync::LazyLock;

use alloy_primitives::{hex, Address};
use regex::Regex;

use crate::error::CoreError;

/// Pattern an address must match before it is canonicalized.
pub const ADDRESS_PATTERN: &str = r"^0x[a-fA-F0-9]{40}$";

/// Message returned for any address that does not match [`ADDRESS_PATTERN`].
pub const INVALID_ADDRESS_MESSAGE: &str = "Invalid Ethereum address format";

static ADDRESS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(ADDRESS_PATTERN).expect("valid regex"));

/// Whether `raw` is a 0x-prefixed 20-byte hex string.
pub fn is_valid_address(raw: &str) -> bool {
    ADDRESS_RE.is_match(raw)
}

/// Validate `raw` and return its canonical lowercase form.
pub fn canonicalize_address(raw: &str) -> Result<String, CoreError> {
    if !is_valid_address(raw) {
        return Err(CoreError::Validation(INVALID_ADDRESS_MESSAGE.to_string()));
    }
    Ok(raw.to_ascii_lowercase())
}

/// Validate `raw` and parse it into a typed [`Address`].
pub fn parse_address(raw: &str) -> Result<Address, CoreError> {
    let canonical = canonicalize_address(raw)?;
    Address::from_str(&canonical)
        .map_err(|_| CoreError::Validation(INVALID_ADDRESS_MESSAGE.to_string()))
}

/// Render a typed address in canonical lowercase form.
pub fn format_address(address: &Address) -> String {
    format!("0x{}", hex::encode(address.as_slice()))
}
