//! Identifier and Credential Validators
//!
//! Pure checks run while a subscriber record is built, before anything is
//! handed to storage.

use thiserror::Error;

use crate::types::{AMF_HEX_LEN, IMSI_MAX_LEN, IMSI_MIN_LEN, KEY_HEX_LEN};

/// Validation failure for untrusted subscriber input
///
/// Every variant names the offending field path. Credential values are never
/// carried in the error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Malformed subscriber document: {0}")]
    Malformed(String),
    #[error("Invalid IMSI '{0}': expected 14 or 15 decimal digits")]
    InvalidImsi(String),
    #[error("Invalid hex value in {field}: expected {len} hex digits")]
    InvalidHex { field: String, len: usize },
    #[error("Provide either OP or OPC, not both")]
    BothOpAndOpc,
    #[error("Provide at least one: OP or OPC")]
    MissingOpOrOpc,
    #[error("Name is {0} characters long (maximum 100)")]
    NameTooLong(usize),
    #[error("{0} must contain at least one entry")]
    Empty(String),
    #[error("Invalid IP address in {field}: '{value}'")]
    InvalidIp { field: String, value: String },
    #[error("Invalid query parameter {param}: {reason}")]
    InvalidParam { param: String, reason: String },
}

impl ValidationError {
    /// Field path the error refers to, if any
    pub fn param(&self) -> Option<&str> {
        match self {
            Self::Malformed(_) => None,
            Self::InvalidImsi(_) => Some("imsi"),
            Self::InvalidHex { field, .. } => Some(field.as_str()),
            Self::BothOpAndOpc | Self::MissingOpOrOpc => Some("security"),
            Self::NameTooLong(_) => Some("name"),
            Self::Empty(field) => Some(field.as_str()),
            Self::InvalidIp { field, .. } => Some(field.as_str()),
            Self::InvalidParam { param, .. } => Some(param.as_str()),
        }
    }
}

/// Result type for validation
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Check that `imsi` is 14 or 15 decimal digits
pub fn validate_imsi(imsi: &str) -> ValidationResult<()> {
    let len_ok = (IMSI_MIN_LEN..=IMSI_MAX_LEN).contains(&imsi.len());
    if len_ok && imsi.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(ValidationError::InvalidImsi(imsi.to_string()))
    }
}

/// Strip all whitespace from a hex string (WebUI inserts spaces every 8 digits)
pub fn normalize_hex(value: &str) -> String {
    value.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Normalize `value` and check it is exactly `len` hex digits
///
/// Returns the canonical (upper case) form.
pub fn validate_hex(field: &str, value: &str, len: usize) -> ValidationResult<String> {
    let normalized = normalize_hex(value);
    if normalized.len() == len && normalized.bytes().all(|b| b.is_ascii_hexdigit()) {
        Ok(normalized.to_ascii_uppercase())
    } else {
        Err(ValidationError::InvalidHex {
            field: field.to_string(),
            len,
        })
    }
}

/// Canonical security credentials produced by [`validate_security`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalSecurity {
    pub k: String,
    pub amf: String,
    pub op: Option<String>,
    pub opc: Option<String>,
}

/// Validate K/AMF and the exactly-one-of OP/OPC rule
pub fn validate_security(
    k: &str,
    amf: &str,
    op: Option<&str>,
    opc: Option<&str>,
) -> ValidationResult<CanonicalSecurity> {
    let k = validate_hex("security.k", k, KEY_HEX_LEN)?;
    let amf = validate_hex("security.amf", amf, AMF_HEX_LEN)?;

    // Only a missing value is absent; anything present must be well-formed
    let op = op
        .map(|v| validate_hex("security.op", v, KEY_HEX_LEN))
        .transpose()?;
    let opc = opc
        .map(|v| validate_hex("security.opc", v, KEY_HEX_LEN))
        .transpose()?;

    match (op, opc) {
        (Some(_), Some(_)) => Err(ValidationError::BothOpAndOpc),
        (None, None) => Err(ValidationError::MissingOpOrOpc),
        (op, opc) => Ok(CanonicalSecurity { k, amf, op, opc }),
    }
}
