//! Memory-hard key derivation for Nebula
//!
//! This crate provides the Argon2 password hashing function (RFC 9106),
//! the winner of the Password Hashing Competition, in its three variants.
//!
//! The focus is on **clarity, predictability, and auditability**: the
//! memory-filling engine is written in safe Rust, produces output that is
//! bit-for-bit identical to the reference implementation, and is exercised
//! against the official test vectors.
//!
//! # Module overview
//!
//! - `hash`  
//!   The variable-length hash H' built on top of BLAKE2b, used to seed the
//!   memory matrix and to produce the final tag.
//!
//! - `derivation`  
//!   The Argon2 engine itself: parameters and validation, the compression
//!   function G, reference block selection, the multi-lane memory fill, and
//!   the standard `$argon2id$v=19$...` string encoding with verification.
//!
//! # Example
//!
//! ```rust
//! use cryptal_argon2::derivation::{Argon2Params, Variant, hash_encoded, verify_encoded};
//!
//! let params = Argon2Params::new(Variant::Argon2id, 256, 2, 2, 32);
//! let encoded = hash_encoded(b"correct horse", b"battery staple", &params).unwrap();
//!
//! assert!(verify_encoded(&encoded, b"correct horse").unwrap());
//! assert!(!verify_encoded(&encoded, b"wrong horse").unwrap());
//! ```
//!
//! # Design goals
//!
//! - No `unsafe` code; lanes are split into disjoint mutable segments
//! - Minimal and explicit APIs
//! - Stable, well-defined semantics
//! - Key material and memory blocks are zeroed when released

#![forbid(unsafe_code)]

pub mod derivation;
pub mod hash;
