use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use super::boundary::{finalize, init, seed_lanes};
use super::encoding::{EncodedHash, EncodingError};
use super::memory::{FillPlan, Matrix, MemoryLayout};
use super::params::{
    Argon2Params, MAX_LANES, MIN_SALT_LEN, ParamError, Variant, check_input_len,
    validate_tag_len,
};
use crate::hash::HashError;

/// Errors that can occur during Argon2 computation.
#[derive(Debug, thiserror::Error)]
pub enum Argon2Error {
    /// Invalid parameter values.
    #[error("invalid parameters: {0}")]
    InvalidParams(#[from] ParamError),
    /// Salt must be at least 8 bytes.
    #[error("salt is {len} bytes, at least 8 are required")]
    InvalidSalt {
        /// Length of the rejected salt.
        len: usize,
    },
    /// The memory matrix could not be reserved.
    #[error("could not allocate {blocks} memory blocks")]
    AllocationFailure {
        /// Number of 1 KiB blocks requested.
        blocks: usize,
    },
    /// The BLAKE2b primitive rejected a request. This is a defect.
    #[error("hash engine failure: {0}")]
    HashFailure(#[from] HashError),
    /// The cancellation flag was raised between two slices.
    #[error("derivation cancelled")]
    Cancelled,
    /// An encoded hash could not be parsed.
    #[error("malformed encoded hash: {0}")]
    Encoding(#[from] EncodingError),
}

/// A configured Argon2 instance.
///
/// Parameters are validated once in [`Argon2::new`]; the instance can then
/// be used for any number of derivations, each with its own memory matrix.
///
/// ```rust
/// use cryptal_argon2::derivation::{Argon2, Argon2Params, Variant};
///
/// let params = Argon2Params::new(Variant::Argon2id, 64, 2, 2, 32);
/// let argon2 = Argon2::new(params).unwrap().threads(2);
/// let key = argon2.hash_password(b"password", b"somesalt").unwrap();
/// assert_eq!(key.len(), 32);
/// ```
#[derive(Clone, Debug)]
pub struct Argon2 {
    params: Argon2Params,
    threads: usize,
    cancel: Option<Arc<AtomicBool>>,
}

impl Argon2 {
    /// Validates `params` and builds an instance that uses one worker per
    /// lane, up to the number of available CPUs.
    pub fn new(params: Argon2Params) -> Result<Self, Argon2Error> {
        params.validate()?;
        let threads = (params.lanes as usize).min(num_cpus::get()).max(1);
        Ok(Self {
            params,
            threads,
            cancel: None,
        })
    }

    /// Sets the number of worker threads.
    ///
    /// The value is clamped to `1..=lanes` at derivation time. It never
    /// changes the derived key.
    pub fn threads(mut self, threads: usize) -> Self {
        self.threads = threads.clamp(1, MAX_LANES as usize);
        self
    }

    /// Registers a flag that aborts the derivation when raised.
    ///
    /// The flag is polled between slices only, so a derivation stops within
    /// one slice of work after it is set.
    pub fn cancellation(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Parameters of this instance.
    pub fn params(&self) -> &Argon2Params {
        &self.params
    }

    /// Derives a key of `params.tag_len` bytes.
    pub fn hash_password(
        &self,
        password: &[u8],
        salt: &[u8],
    ) -> Result<Vec<u8>, Argon2Error> {
        let mut out = vec![0u8; self.params.tag_len];
        self.hash_password_into(password, salt, &mut out)?;
        Ok(out)
    }

    /// Derives a key filling all of `out`.
    ///
    /// The tag length mixed into H0 is `out.len()`, which may differ from
    /// `params.tag_len`. `out` is left zeroed on error.
    pub fn hash_password_into(
        &self,
        password: &[u8],
        salt: &[u8],
        out: &mut [u8],
    ) -> Result<(), Argon2Error> {
        let result = self.derive_into(password, salt, out);
        if result.is_err() {
            out.fill(0);
        }
        result
    }

    /// Derives a key and returns it in the standard encoded form.
    pub fn hash_encoded(
        &self,
        password: &[u8],
        salt: &[u8],
    ) -> Result<String, Argon2Error> {
        let hash = self.hash_password(password, salt)?;
        let encoded = EncodedHash {
            variant: self.params.variant,
            version: self.params.version,
            mem_kib: self.params.mem_kib,
            time: self.params.time,
            lanes: self.params.lanes,
            salt: salt.to_vec(),
            hash,
        };
        Ok(encoded.encode())
    }

    fn derive_into(
        &self,
        password: &[u8],
        salt: &[u8],
        out: &mut [u8],
    ) -> Result<(), Argon2Error> {
        let params = &self.params;

        validate_tag_len(out.len())?;
        let tag_len = check_input_len("output", out.len())?;
        check_input_len("password", password.len())?;
        check_input_len("salt", salt.len())?;
        if salt.len() < MIN_SALT_LEN {
            return Err(Argon2Error::InvalidSalt { len: salt.len() });
        }

        let layout = MemoryLayout::new(params.mem_kib, params.lanes);
        tracing::debug!(
            variant = %params.variant,
            version = params.version.as_u32(),
            mem_kib = params.mem_kib,
            blocks = layout.total_blocks,
            time = params.time,
            lanes = params.lanes,
            threads = self.threads,
            tag_len,
            "starting derivation"
        );

        let mut matrix = Matrix::allocate(layout)?;

        let h0 = Zeroizing::new(init(password, salt, params, tag_len)?);
        seed_lanes(&mut matrix, &h0)?;

        let plan = FillPlan {
            variant: params.variant,
            version: params.version,
            time: params.time,
            threads: self.threads,
            cancel: self.cancel.as_deref(),
        };
        matrix.fill(&plan)?;

        finalize(&matrix, out)?;
        tracing::debug!("derivation complete");

        Ok(())
    }
}

/// Computes an Argon2 hash of the given password with the variant and
/// version named in `params`.
///
/// # Arguments
///
/// * `password` - The password to hash
/// * `salt` - A random salt (minimum 8 bytes, recommended 16+ bytes)
/// * `params` - Argon2 parameters (variant, memory, time, parallelism, tag length)
///
/// # Returns
///
/// The derived key (tag) as a byte vector, or an error if parameters are invalid.
///
/// # Example
///
/// ```rust
/// use cryptal_argon2::derivation::{Argon2Params, Variant, derive};
///
/// let params = Argon2Params::new(Variant::Argon2i, 32, 3, 4, 32);
/// let key = derive(b"my_password", b"random_salt_16b!", &params).unwrap();
/// assert_eq!(key.len(), 32);
/// ```
pub fn derive(
    password: &[u8],
    salt: &[u8],
    params: &Argon2Params,
) -> Result<Vec<u8>, Argon2Error> {
    Argon2::new(params.clone())?.hash_password(password, salt)
}

/// Argon2d: data-dependent addressing throughout.
pub fn argon2d(
    password: &[u8],
    salt: &[u8],
    params: &Argon2Params,
) -> Result<Vec<u8>, Argon2Error> {
    derive(password, salt, &params.clone().with_variant(Variant::Argon2d))
}

/// Argon2i: data-independent addressing throughout.
pub fn argon2i(
    password: &[u8],
    salt: &[u8],
    params: &Argon2Params,
) -> Result<Vec<u8>, Argon2Error> {
    derive(password, salt, &params.clone().with_variant(Variant::Argon2i))
}

/// Argon2id: data-independent addressing for the first half of the first
/// pass, data-dependent afterwards.
pub fn argon2id(
    password: &[u8],
    salt: &[u8],
    params: &Argon2Params,
) -> Result<Vec<u8>, Argon2Error> {
    derive(password, salt, &params.clone().with_variant(Variant::Argon2id))
}

/// Derives a key and returns it in the standard encoded form
/// `$argon2<variant>$v=<version>$m=<mem>,t=<time>,p=<lanes>$<salt>$<hash>`.
pub fn hash_encoded(
    password: &[u8],
    salt: &[u8],
    params: &Argon2Params,
) -> Result<String, Argon2Error> {
    Argon2::new(params.clone())?.hash_encoded(password, salt)
}

/// Checks `password` against an encoded hash.
///
/// The variant, version and costs are taken from the string itself. The
/// comparison of the derived key runs in constant time. Returns `Ok(false)`
/// on a mismatch and an error when the string cannot be parsed or carries
/// invalid parameters.
pub fn verify_encoded(encoded: &str, password: &[u8]) -> Result<bool, Argon2Error> {
    let expected = EncodedHash::decode(encoded)?;
    let params = expected.params();

    let mut actual = Zeroizing::new(vec![0u8; expected.hash.len()]);
    Argon2::new(params)?.hash_password_into(password, &expected.salt, &mut actual)?;

    Ok(bool::from(actual.ct_eq(&expected.hash)))
}
