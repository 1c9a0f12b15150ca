//! Rejection of altered, expired and unexpected tokens.

use chrono::{DateTime, Duration, Utc};
use jwtkit::base64::{decode_segment, encode_segment};
use jwtkit::validation::VerificationOptions;
use jwtkit::{AlgorithmId, ErrorKind, Hmac, Jwt, NoneAlgorithm, Rsa, TimeClaim, Verifier};
use proptest::prelude::*;

const SECRET: &[u8] = b"tamper-test-secret";
const URL_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";
const RSA_PUBLIC: &str = include_str!("fixtures/rsa_public.pem");

fn now() -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000, 0).unwrap()
}

fn signed_token() -> String {
    Jwt::builder()
        .set_type("JWT")
        .set_issuer("auth.example")
        .set_subject("user-42")
        .set_expires_at(now() + Duration::hours(1))
        .set_payload_claim("role", "reader")
        .sign(&Hmac::hs256(SECRET))
        .unwrap()
}

fn verifier() -> Verifier {
    Jwt::verifier()
        .allow_algorithm(Hmac::hs256(SECRET))
        .with_issuer("auth.example")
        .with_clock(now())
}

fn verify(token: &str) -> Result<(), ErrorKind> {
    verifier().verify_str(token).map(|_| ()).map_err(|e| e.kind())
}

#[test]
fn test_untouched_token_verifies() {
    jwtkit_common::LoggingTransformer::init_test();
    assert_eq!(verify(&signed_token()), Ok(()));
}

#[test]
fn test_swapped_payload_fails_signature() {
    let token = signed_token();
    let mut parts: Vec<&str> = token.split('.').collect();
    let forged = encode_segment(
        r#"{"exp":1700003600,"iss":"auth.example","role":"admin","sub":"user-42"}"#,
    );
    parts[1] = &forged;
    assert_eq!(verify(&parts.join(".")), Err(ErrorKind::InvalidSignature));
}

#[test]
fn test_signature_failure_wins_over_claim_failure() {
    let token = signed_token();
    let (data, _) = token.rsplit_once('.').unwrap();
    let forged = format!("{data}.{}", encode_segment([0u8; 32]));
    let err = verifier()
        .with_issuer("someone-else")
        .with_clock(now() + Duration::days(1))
        .verify_str(&forged)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidSignature);
}

#[test]
fn test_none_token_needs_explicit_allow() {
    let token = Jwt::builder()
        .set_issuer("auth.example")
        .sign(&NoneAlgorithm)
        .unwrap();
    assert_eq!(verify(&token), Err(ErrorKind::InvalidAlgorithm));
    verifier().allow_algorithm(NoneAlgorithm).verify_str(&token).unwrap();
}

#[test]
fn test_alg_downgrade_to_none_is_refused() {
    let token = signed_token();
    let payload = token.split('.').nth(1).unwrap();
    let header = encode_segment(r#"{"alg":"none","typ":"JWT"}"#);
    assert_eq!(verify(&format!("{header}.{payload}.")), Err(ErrorKind::InvalidAlgorithm));
}

#[test]
fn test_hmac_keyed_with_public_key_is_refused() {
    // Classic confusion: an HS256 token keyed with the RSA public key text.
    let token = Jwt::builder()
        .set_subject("attacker")
        .sign(&Hmac::hs256(RSA_PUBLIC.as_bytes()))
        .unwrap();
    let err = Jwt::verifier()
        .allow_algorithm(Rsa::from_public_pem(AlgorithmId::Rs256, RSA_PUBLIC).unwrap())
        .verify_str(&token)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidAlgorithm);
}

#[test]
fn test_expiry_honours_leeway() {
    let token = Jwt::builder()
        .set_expires_at(now() - Duration::seconds(1))
        .sign(&Hmac::hs256(SECRET))
        .unwrap();
    let strict = Jwt::verifier().allow_algorithm(Hmac::hs256(SECRET)).with_clock(now());
    let err = strict.clone().verify_str(&token).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TokenExpired);
    assert!(err.is_time_error());
    strict.leeway(Duration::seconds(1)).verify_str(&token).unwrap();
}

#[test]
fn test_not_before_and_issued_at_in_future() {
    let token = Jwt::builder()
        .set_not_before(now() + Duration::seconds(30))
        .sign(&Hmac::hs256(SECRET))
        .unwrap();
    let base = Jwt::verifier().allow_algorithm(Hmac::hs256(SECRET)).with_clock(now());
    assert_eq!(
        base.clone().verify_str(&token).unwrap_err().kind(),
        ErrorKind::TokenNotYetValid
    );
    base.clone().not_before_leeway(Duration::seconds(30)).verify_str(&token).unwrap();

    let token = Jwt::builder()
        .set_issued_at(now() + Duration::minutes(5))
        .sign(&Hmac::hs256(SECRET))
        .unwrap();
    assert_eq!(
        base.verify_str(&token).unwrap_err().kind(),
        ErrorKind::TokenIssuedInFuture
    );
}

#[test]
fn test_required_and_max_age() {
    let token = Jwt::builder()
        .set_issued_at(now() - Duration::hours(2))
        .sign(&Hmac::hs256(SECRET))
        .unwrap();
    let base = Jwt::verifier().allow_algorithm(Hmac::hs256(SECRET)).with_clock(now());
    assert_eq!(
        base.clone().require(TimeClaim::ExpiresAt).verify_str(&token).unwrap_err().kind(),
        ErrorKind::ClaimMismatch
    );
    assert_eq!(
        base.clone().with_max_age(Duration::hours(1)).verify_str(&token).unwrap_err().kind(),
        ErrorKind::TokenExpired
    );
    base.clone()
        .with_options(VerificationOptions::default().with_clock(now()))
        .verify_str(&token)
        .unwrap();
    assert_eq!(
        base.with_options(VerificationOptions::strict().with_clock(now()))
            .verify_str(&token)
            .unwrap_err()
            .kind(),
        ErrorKind::ClaimMismatch
    );
}

#[test]
fn test_audience_set_membership() {
    let token = Jwt::builder()
        .set_audiences(["a", "b"])
        .sign(&Hmac::hs256(SECRET))
        .unwrap();
    let base = Jwt::verifier().allow_algorithm(Hmac::hs256(SECRET));
    base.clone().with_audience("b").verify_str(&token).unwrap();
    base.clone().with_audiences(["a", "b"]).verify_str(&token).unwrap();
    assert_eq!(
        base.with_audience("c").verify_str(&token).unwrap_err().kind(),
        ErrorKind::ClaimMismatch
    );
}

#[test]
fn test_mistyped_claim_kinds_split_by_check() {
    // Value checks report a wrongly typed claim as a mismatch.
    let token = Jwt::builder()
        .set_payload_claim("iss", 7)
        .sign(&Hmac::hs256(SECRET))
        .unwrap();
    assert_eq!(verify(&token), Err(ErrorKind::ClaimMismatch));
    let token = Jwt::builder()
        .set_issuer("auth.example")
        .set_payload_claim("aud", 42)
        .sign(&Hmac::hs256(SECRET))
        .unwrap();
    let err = verifier().with_audience("a").verify_str(&token).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ClaimMismatch);

    // Time claims must be integers to be compared at all.

    let token = Jwt::builder()
        .set_issuer("auth.example")
        .set_payload_claim("exp", "tomorrow")
        .sign(&Hmac::hs256(SECRET))
        .unwrap();
    assert_eq!(verify(&token), Err(ErrorKind::ClaimTypeMismatch));
}

proptest! {
    #[test]
    fn prop_altered_segment_never_verifies(
        position in any::<prop::sample::Index>(),
        replacement in 0usize..64,
    ) {
        let token = signed_token();
        let data_len = token.rfind('.').unwrap();
        let index = position.index(data_len);
        let mut bytes = token.clone().into_bytes();
        prop_assume!(bytes[index] != b'.');
        prop_assume!(bytes[index] != URL_ALPHABET[replacement]);
        bytes[index] = URL_ALPHABET[replacement];
        let altered = String::from_utf8(bytes).unwrap();

        let outcome = verify(&altered);
        prop_assert!(
            matches!(
                outcome,
                Err(ErrorKind::TokenFormat | ErrorKind::InvalidAlgorithm | ErrorKind::InvalidSignature)
            ),
            "unexpected outcome {:?}",
            outcome
        );
    }

    #[test]
    fn prop_altered_signature_never_verifies(flip in 0usize..256) {
        let token = signed_token();
        let (data, signature) = token.rsplit_once('.').unwrap();
        let mut raw = decode_segment(signature).unwrap();
        raw[flip / 8] ^= 1 << (flip % 8);
        let altered = format!("{data}.{}", encode_segment(&raw));
        prop_assert_eq!(verify(&altered), Err(ErrorKind::InvalidSignature));
    }
}
