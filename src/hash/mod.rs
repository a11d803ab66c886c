//! Hash functions consumed by the key derivation code.
//!
//! BLAKE2b itself comes from the `blake2` crate. This module only adds the
//! variable-length construction H' that Argon2 layers on top of it.

pub(crate) mod blake2b;

pub use blake2b::HashError;
pub(crate) use blake2b::blake2b_long;
