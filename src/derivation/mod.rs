//! Password-based key derivation.
//!
//! Currently provides Argon2 in all three variants, together with the
//! standard encoded string form used to store password hashes.

pub mod argon2;

pub use argon2::core::{
    Argon2, Argon2Error, argon2d, argon2i, argon2id, derive, hash_encoded, verify_encoded,
};
pub use argon2::encoding::{EncodedHash, EncodingError};
pub use argon2::params::{Argon2Params, ParamError, Variant, Version};
