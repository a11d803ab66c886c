//! Parameter definitions and validation for Argon2.
//!
//! This module defines the configurable parameters for Argon2 and provides
//! validation to ensure they meet the algorithm's requirements before any
//! memory is reserved.

use core::fmt;
use core::str::FromStr;

use zeroize::Zeroizing;

/// Number of synchronization points (slices) per lane.
pub const SYNC_POINTS: u32 = 4;

/// Minimum number of lanes.
pub const MIN_LANES: u32 = 1;
/// Maximum number of lanes (2^24 - 1).
pub const MAX_LANES: u32 = 0x00FF_FFFF;

/// Minimum number of passes over memory.
pub const MIN_TIME: u32 = 1;

/// Minimum memory per lane, in KiB (two blocks per slice).
pub const MIN_MEMORY_PER_LANE: u32 = 2 * SYNC_POINTS;

/// Minimum output length in bytes.
pub const MIN_TAG_LEN: usize = 4;
/// Maximum output length in bytes (2^32 - 1).
pub const MAX_TAG_LEN: usize = u32::MAX as usize;

/// Minimum salt length in bytes.
pub const MIN_SALT_LEN: usize = 8;

/// Argon2 variant, selecting how reference blocks are addressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Variant {
    /// Data-dependent addressing. Fastest, not side-channel resistant.
    Argon2d = 0,
    /// Data-independent addressing on every pass.
    Argon2i = 1,
    /// Data-independent for the first half of the first pass, then
    /// data-dependent.
    #[default]
    Argon2id = 2,
}

impl Variant {
    /// Identifier stored in H0 and in address blocks.
    pub const fn as_u32(self) -> u32 {
        self as u32
    }

    /// Lowercase algorithm name as used in encoded hashes.
    pub const fn as_str(self) -> &'static str {
        match self {
            Variant::Argon2d => "argon2d",
            Variant::Argon2i => "argon2i",
            Variant::Argon2id => "argon2id",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Variant {
    type Err = ParamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "argon2d" => Ok(Variant::Argon2d),
            "argon2i" => Ok(Variant::Argon2i),
            "argon2id" => Ok(Variant::Argon2id),
            other => Err(ParamError::UnknownVariant(other.to_owned())),
        }
    }
}

/// Algorithm version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Version {
    /// Version 1.0 (0x10): later passes overwrite blocks.
    V0x10 = 0x10,
    /// Version 1.3 (0x13): later passes XOR into existing blocks.
    #[default]
    V0x13 = 0x13,
}

impl Version {
    /// Numeric version as stored in H0 and in encoded hashes.
    pub const fn as_u32(self) -> u32 {
        self as u32
    }
}

impl TryFrom<u32> for Version {
    type Error = ParamError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0x10 => Ok(Version::V0x10),
            0x13 => Ok(Version::V0x13),
            other => Err(ParamError::UnknownVersion(other)),
        }
    }
}

/// Configuration parameters for the Argon2 algorithm.
///
/// These parameters control the memory and time cost of the hash function,
/// allowing the security level to be tuned for the target hardware and
/// threat model.
///
/// # Recommended Values
///
/// For password hashing in 2024+, OWASP recommends:
/// - `mem_kib`: 19456 (19 MiB) minimum, 47104 (46 MiB) for higher security
/// - `time`: 2 passes minimum
/// - `lanes`: 1 (single-threaded) or number of available cores
/// - `tag_len`: 32 bytes for most applications
///
/// The secret is wiped when the parameters are dropped and never printed by
/// `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct Argon2Params {
    /// Memory size in KiB (minimum 8 × lanes).
    pub mem_kib: u32,
    /// Number of passes over memory (minimum 1).
    pub time: u32,
    /// Degree of parallelism (number of lanes, minimum 1).
    pub lanes: u32,
    /// Length of the output tag in bytes (minimum 4).
    pub tag_len: usize,
    /// Addressing variant.
    pub variant: Variant,
    /// Algorithm version.
    pub version: Version,
    /// Optional secret key for keyed hashing.
    pub secret: Option<Zeroizing<Vec<u8>>>,
    /// Optional associated data.
    pub associated_data: Option<Vec<u8>>,
}

/// Errors that can occur during parameter validation.
///
/// These errors indicate that the provided parameters do not meet the
/// minimum requirements defined by RFC 9106.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParamError {
    /// Memory must be at least 8 × lanes KiB.
    #[error("memory cost {mem_kib} KiB is below the minimum of {min} KiB")]
    MemoryTooSmall {
        /// Requested memory in KiB.
        mem_kib: u32,
        /// Minimum for the requested lane count.
        min: u32,
    },
    /// Lanes must be at least 1.
    #[error("at least one lane is required")]
    TooFewLanes,
    /// Lanes must fit in 24 bits.
    #[error("lane count {0} exceeds the maximum of 16777215")]
    TooManyLanes(u32),
    /// Time (passes) must be at least 1.
    #[error("at least one pass is required")]
    TooFewPasses,
    /// Tag length must be between 4 and 2^32 - 1 bytes.
    #[error("tag length {0} is outside 4..=4294967295")]
    TagLengthInvalid(usize),
    /// An input does not fit its 32-bit length prefix.
    #[error("{field} is {len} bytes, longer than 2^32 - 1")]
    InputTooLong {
        /// Which input overflowed.
        field: &'static str,
        /// Its length.
        len: usize,
    },
    /// Unrecognised variant name.
    #[error("unknown Argon2 variant: {0}")]
    UnknownVariant(String),
    /// Unrecognised version number.
    #[error("unsupported Argon2 version: {0:#x}")]
    UnknownVersion(u32),
}

impl Argon2Params {
    /// Creates parameters for `variant` with the given costs and the latest
    /// version, without secret or associated data.
    pub fn new(variant: Variant, mem_kib: u32, time: u32, lanes: u32, tag_len: usize) -> Self {
        Self {
            mem_kib,
            time,
            lanes,
            tag_len,
            variant,
            version: Version::default(),
            secret: None,
            associated_data: None,
        }
    }

    /// Returns these parameters with a different variant.
    pub fn with_variant(mut self, variant: Variant) -> Self {
        self.variant = variant;
        self
    }

    /// Returns these parameters with a different version.
    pub fn with_version(mut self, version: Version) -> Self {
        self.version = version;
        self
    }

    /// Returns these parameters keyed with `secret`.
    pub fn with_secret(mut self, secret: impl Into<Vec<u8>>) -> Self {
        self.secret = Some(Zeroizing::new(secret.into()));
        self
    }

    /// Returns these parameters bound to `associated_data`.
    pub fn with_associated_data(mut self, associated_data: impl Into<Vec<u8>>) -> Self {
        self.associated_data = Some(associated_data.into());
        self
    }

    /// Checks every cost parameter and optional input.
    pub fn validate(&self) -> Result<(), ParamError> {
        if self.lanes < MIN_LANES {
            return Err(ParamError::TooFewLanes);
        }

        if self.lanes > MAX_LANES {
            return Err(ParamError::TooManyLanes(self.lanes));
        }

        if self.time < MIN_TIME {
            return Err(ParamError::TooFewPasses);
        }

        let min = MIN_MEMORY_PER_LANE * self.lanes;
        if self.mem_kib < min {
            return Err(ParamError::MemoryTooSmall {
                mem_kib: self.mem_kib,
                min,
            });
        }

        validate_tag_len(self.tag_len)?;

        if let Some(secret) = &self.secret {
            check_input_len("secret", secret.len())?;
        }
        if let Some(ad) = &self.associated_data {
            check_input_len("associated data", ad.len())?;
        }

        Ok(())
    }
}

impl fmt::Debug for Argon2Params {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Argon2Params")
            .field("mem_kib", &self.mem_kib)
            .field("time", &self.time)
            .field("lanes", &self.lanes)
            .field("tag_len", &self.tag_len)
            .field("variant", &self.variant)
            .field("version", &self.version)
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .field("associated_data", &self.associated_data)
            .finish()
    }
}

impl Default for Argon2Params {
    /// Default parameters: Argon2id v1.3, 64 MiB memory, 3 passes, 1 lane,
    /// 32-byte tag.
    fn default() -> Self {
        Self::new(Variant::Argon2id, 64 * 1024, 3, 1, 32)
    }
}

pub(crate) fn validate_tag_len(tag_len: usize) -> Result<(), ParamError> {
    if !(MIN_TAG_LEN..=MAX_TAG_LEN).contains(&tag_len) {
        return Err(ParamError::TagLengthInvalid(tag_len));
    }
    Ok(())
}

pub(crate) fn check_input_len(field: &'static str, len: usize) -> Result<u32, ParamError> {
    u32::try_from(len).map_err(|_| ParamError::InputTooLong { field, len })
}
