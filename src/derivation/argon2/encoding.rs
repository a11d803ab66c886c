//! Standard string encoding of Argon2 hashes.
//!
//! ```text
//! $argon2<variant>$v=<version>$m=<mem>,t=<time>,p=<lanes>$<salt>$<hash>
//! ```
//!
//! Salt and hash use the standard base64 alphabet without padding. Numbers
//! are plain decimal without sign or leading zeros, so every accepted string
//! re-encodes to itself. The `v=` field may be absent on input, which denotes
//! version 0x10; it is always written on output.

use core::fmt;
use core::str::FromStr;

use base64::Engine;
use base64::engine::general_purpose::STANDARD_NO_PAD;

use super::params::{Argon2Params, MIN_SALT_LEN, MIN_TAG_LEN, Variant, Version};

/// Errors produced while parsing an encoded hash.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodingError {
    /// The string does not start with `$`.
    #[error("encoded hash must start with '$'")]
    MissingPrefix,
    /// A `$`-separated field is missing.
    #[error("missing {0} field")]
    MissingField(&'static str),
    /// More fields follow the hash.
    #[error("unexpected data after the hash field")]
    TrailingData,
    /// The algorithm identifier is not an Argon2 variant.
    #[error("unknown algorithm identifier {0:?}")]
    UnknownVariant(String),
    /// The version field is malformed or names an unsupported version.
    #[error("invalid version field {0:?}")]
    InvalidVersion(String),
    /// The `m=..,t=..,p=..` field is malformed.
    #[error("invalid parameter field {0:?}")]
    InvalidParams(String),
    /// Salt or hash is not valid unpadded base64.
    #[error("invalid base64 in {field}: {source}")]
    InvalidBase64 {
        /// `salt` or `hash`.
        field: &'static str,
        /// Decoder error.
        source: base64::DecodeError,
    },
    /// Salt shorter than the minimum.
    #[error("salt is {0} bytes, at least 8 are required")]
    SaltTooShort(usize),
    /// Hash shorter than the minimum.
    #[error("hash is {0} bytes, at least 4 are required")]
    HashTooShort(usize),
}

/// Parameters, salt and derived key of one Argon2 hash.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedHash {
    /// Addressing variant.
    pub variant: Variant,
    /// Algorithm version.
    pub version: Version,
    /// Memory cost in KiB.
    pub mem_kib: u32,
    /// Number of passes.
    pub time: u32,
    /// Number of lanes.
    pub lanes: u32,
    /// Salt bytes.
    pub salt: Vec<u8>,
    /// Derived key bytes.
    pub hash: Vec<u8>,
}

impl EncodedHash {
    /// Renders the standard string form.
    pub fn encode(&self) -> String {
        format!(
            "${}$v={}$m={},t={},p={}${}${}",
            self.variant,
            self.version.as_u32(),
            self.mem_kib,
            self.time,
            self.lanes,
            STANDARD_NO_PAD.encode(&self.salt),
            STANDARD_NO_PAD.encode(&self.hash),
        )
    }

    /// Parses the standard string form.
    pub fn decode(encoded: &str) -> Result<Self, EncodingError> {
        let rest = encoded
            .strip_prefix('$')
            .ok_or(EncodingError::MissingPrefix)?;
        let mut fields = rest.split('$');

        let id = fields.next().ok_or(EncodingError::MissingField("algorithm"))?;
        let variant = id
            .parse::<Variant>()
            .map_err(|_| EncodingError::UnknownVariant(id.to_owned()))?;

        let field = fields.next().ok_or(EncodingError::MissingField("parameters"))?;
        let (version, field) = match field.strip_prefix("v=") {
            Some(digits) => {
                let version = decimal(digits)
                    .and_then(|v| Version::try_from(v).ok())
                    .ok_or_else(|| EncodingError::InvalidVersion(field.to_owned()))?;
                let next = fields.next().ok_or(EncodingError::MissingField("parameters"))?;
                (version, next)
            }
            None => (Version::V0x10, field),
        };

        let (mem_kib, time, lanes) =
            cost_params(field).ok_or_else(|| EncodingError::InvalidParams(field.to_owned()))?;

        let salt = base64_field("salt", fields.next())?;
        let hash = base64_field("hash", fields.next())?;

        if fields.next().is_some() {
            return Err(EncodingError::TrailingData);
        }
        if salt.len() < MIN_SALT_LEN {
            return Err(EncodingError::SaltTooShort(salt.len()));
        }
        if hash.len() < MIN_TAG_LEN {
            return Err(EncodingError::HashTooShort(hash.len()));
        }

        Ok(Self {
            variant,
            version,
            mem_kib,
            time,
            lanes,
            salt,
            hash,
        })
    }

    /// Parameters that reproduce this hash.
    pub fn params(&self) -> Argon2Params {
        Argon2Params::new(
            self.variant,
            self.mem_kib,
            self.time,
            self.lanes,
            self.hash.len(),
        )
        .with_version(self.version)
    }
}

impl fmt::Display for EncodedHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl FromStr for EncodedHash {
    type Err = EncodingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}

/// Parses `m=<mem>,t=<time>,p=<lanes>` in that order.
fn cost_params(field: &str) -> Option<(u32, u32, u32)> {
    let mut parts = field.split(',');
    let mem_kib = decimal(parts.next()?.strip_prefix("m=")?)?;
    let time = decimal(parts.next()?.strip_prefix("t=")?)?;
    let lanes = decimal(parts.next()?.strip_prefix("p=")?)?;
    match parts.next() {
        Some(_) => None,
        None => Some((mem_kib, time, lanes)),
    }
}

/// Canonical unsigned decimal: digits only, no leading zeros.
fn decimal(digits: &str) -> Option<u32> {
    let canonical = !digits.is_empty()
        && digits.bytes().all(|b| b.is_ascii_digit())
        && (digits == "0" || !digits.starts_with('0'));
    if !canonical {
        return None;
    }
    digits.parse().ok()
}

fn base64_field(field: &'static str, value: Option<&str>) -> Result<Vec<u8>, EncodingError> {
    let value = value.ok_or(EncodingError::MissingField(field))?;
    STANDARD_NO_PAD
        .decode(value)
        .map_err(|source| EncodingError::InvalidBase64 { field, source })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimal_rejects_non_canonical_forms() {
        assert_eq!(decimal("0"), Some(0));
        assert_eq!(decimal("65536"), Some(65536));
        assert_eq!(decimal(""), None);
        assert_eq!(decimal("+1"), None);
        assert_eq!(decimal("007"), None);
        assert_eq!(decimal("4294967296"), None);
    }

    #[test]
    fn cost_params_require_fixed_order() {
        assert_eq!(cost_params("m=32,t=3,p=4"), Some((32, 3, 4)));
        assert_eq!(cost_params("t=3,m=32,p=4"), None);
        assert_eq!(cost_params("m=32,t=3"), None);
        assert_eq!(cost_params("m=32,t=3,p=4,x=1"), None);
    }
}
