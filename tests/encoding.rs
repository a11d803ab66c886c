use cryptal_argon2::derivation::{
    Argon2Error, Argon2Params, EncodedHash, EncodingError, Variant, Version, hash_encoded,
    verify_encoded,
};
use hex_literal::hex;
use proptest::prelude::*;

const ARGON2I_REFERENCE: &str =
    "$argon2i$v=19$m=65536,t=2,p=1$c29tZXNhbHQ$wWKIMhR9lyDFvRz9YTZweHKfbftvj+qf+YFY4NeBbtA";

const ARGON2ID_REFERENCE: &str =
    "$argon2id$v=19$m=65536,t=2,p=1$c29tZXNhbHQ$CTFhFdXPJO1aFaMaO6Mm5c8y7cJHAph8ArZWb2GRPPc";

const ARGON2I_LEGACY: &str =
    "$argon2i$m=65536,t=2,p=1$c29tZXNhbHQ$9sTbSlTio3Biev89thdrlKKiCaYsjjYVJxGAL3swxpQ";

#[test]
fn decodes_reference_string() {
    let decoded = EncodedHash::decode(ARGON2I_REFERENCE).unwrap();
    assert_eq!(decoded.variant, Variant::Argon2i);
    assert_eq!(decoded.version, Version::V0x13);
    assert_eq!((decoded.mem_kib, decoded.time, decoded.lanes), (65536, 2, 1));
    assert_eq!(decoded.salt, b"somesalt");
    assert_eq!(
        decoded.hash,
        hex!("c1628832147d9720c5bd1cfd61367078729f6dfb6f8fea9ff98158e0d7816ed0")
    );
    assert_eq!(decoded.encode(), ARGON2I_REFERENCE);
}

#[test]
fn missing_version_means_0x10() {
    let decoded: EncodedHash = ARGON2I_LEGACY.parse().unwrap();
    assert_eq!(decoded.version, Version::V0x10);
    assert!(decoded.to_string().starts_with("$argon2i$v=16$m=65536,t=2,p=1$"));
}

#[test]
fn hash_encoded_matches_reference_strings() {
    let params = Argon2Params::new(Variant::Argon2i, 1 << 16, 2, 1, 32);
    assert_eq!(
        hash_encoded(b"password", b"somesalt", &params).unwrap(),
        ARGON2I_REFERENCE
    );

    let params = params.with_variant(Variant::Argon2id);
    assert_eq!(
        hash_encoded(b"password", b"somesalt", &params).unwrap(),
        ARGON2ID_REFERENCE
    );
}

#[test]
fn verifies_reference_strings() {
    assert!(verify_encoded(ARGON2I_REFERENCE, b"password").unwrap());
    assert!(verify_encoded(ARGON2ID_REFERENCE, b"password").unwrap());
    assert!(verify_encoded(ARGON2I_LEGACY, b"password").unwrap());
    assert!(!verify_encoded(ARGON2ID_REFERENCE, b"Password").unwrap());
}

#[test]
fn verify_uses_encoded_parameters() {
    let params = Argon2Params::new(Variant::Argon2d, 64, 3, 2, 24).with_version(Version::V0x10);
    let encoded = hash_encoded(b"hunter2", b"pepper and salt", &params).unwrap();

    assert!(encoded.starts_with("$argon2d$v=16$m=64,t=3,p=2$"));
    assert!(verify_encoded(&encoded, b"hunter2").unwrap());
    assert!(!verify_encoded(&encoded, b"hunter3").unwrap());
}

#[test]
fn verify_reports_malformed_strings() {
    assert!(matches!(
        verify_encoded("argon2i$v=19$m=8,t=1,p=1$c29tZXNhbHQ$AAAAAA", b"x"),
        Err(Argon2Error::Encoding(EncodingError::MissingPrefix))
    ));
    assert!(matches!(
        verify_encoded("$argon2i$v=19$m=4,t=1,p=1$c29tZXNhbHQ$AAAAAA", b"x"),
        Err(Argon2Error::InvalidParams(_))
    ));
}

#[test]
fn rejects_malformed_strings() {
    let cases = [
        ("", EncodingError::MissingPrefix),
        (
            "$scrypt$v=19$m=8,t=1,p=1$c29tZXNhbHQ$AAAAAA",
            EncodingError::UnknownVariant("scrypt".into()),
        ),
        (
            "$argon2i$v=20$m=8,t=1,p=1$c29tZXNhbHQ$AAAAAA",
            EncodingError::InvalidVersion("v=20".into()),
        ),
        (
            "$argon2i$v=19$m=08,t=1,p=1$c29tZXNhbHQ$AAAAAA",
            EncodingError::InvalidParams("m=08,t=1,p=1".into()),
        ),
        (
            "$argon2i$v=19$t=1,m=8,p=1$c29tZXNhbHQ$AAAAAA",
            EncodingError::InvalidParams("t=1,m=8,p=1".into()),
        ),
        ("$argon2i$v=19$m=8,t=1,p=1$c29tZXNhbHQ", EncodingError::MissingField("hash")),
        ("$argon2i$v=19$m=8,t=1,p=1$c29tZXNhbHQ$AAAAAA$extra", EncodingError::TrailingData),
        ("$argon2i$v=19$m=8,t=1,p=1$c2FsdA$AAAAAA", EncodingError::SaltTooShort(4)),
        ("$argon2i$v=19$m=8,t=1,p=1$c29tZXNhbHQ$AAA", EncodingError::HashTooShort(2)),
    ];

    for (input, expected) in cases {
        assert_eq!(EncodedHash::decode(input), Err(expected), "{input:?}");
    }

    assert!(matches!(
        EncodedHash::decode("$argon2i$v=19$m=8,t=1,p=1$c29tZXNhbHQ=$AAAAAA"),
        Err(EncodingError::InvalidBase64 { field: "salt", .. })
    ));
}

fn variant() -> impl Strategy<Value = Variant> {
    prop_oneof![
        Just(Variant::Argon2d),
        Just(Variant::Argon2i),
        Just(Variant::Argon2id),
    ]
}

fn version() -> impl Strategy<Value = Version> {
    prop_oneof![Just(Version::V0x10), Just(Version::V0x13)]
}

prop_compose! {
    fn encoded_hash()(
        variant in variant(),
        version in version(),
        mem_kib in any::<u32>(),
        time in any::<u32>(),
        lanes in any::<u32>(),
        salt in proptest::collection::vec(any::<u8>(), 8..64),
        hash in proptest::collection::vec(any::<u8>(), 4..128),
    ) -> EncodedHash {
        EncodedHash { variant, version, mem_kib, time, lanes, salt, hash }
    }
}

proptest! {
    #[test]
    fn decode_inverts_encode(hash in encoded_hash()) {
        let encoded = hash.encode();
        prop_assert_eq!(EncodedHash::decode(&encoded), Ok(hash));
    }

    #[test]
    fn decode_never_panics(input in "\\PC*") {
        let _ = EncodedHash::decode(&input);
    }
}
