//! Claim errors surfaced through decoded tokens and the verifier.

use jwtkit::base64::encode_segment;
use jwtkit::{Claim, ClaimMap, ErrorKind, Hmac, Jwt, JwtError, Payload, SerdeJson, ValueKind};
use serde::{Deserialize, Serialize};

type C = Claim<SerdeJson>;

fn unsigned(payload: &str) -> String {
    format!(
        "{}.{}.",
        encode_segment(r#"{"alg":"none"}"#),
        encode_segment(payload)
    )
}

#[test]
fn test_payload_getters_surface_type_errors() {
    let payload = Payload::from(
        ClaimMap::<SerdeJson>::parse(r#"{"iss":1,"aud":["a","a"],"exp":"soon","sub":"s"}"#)
            .unwrap(),
    );
    assert_eq!(
        payload.issuer().unwrap_err(),
        JwtError::ClaimTypeMismatch {
            expected: ValueKind::String,
            actual: ValueKind::Integer,
        }
    );
    assert_eq!(payload.audience().unwrap_err(), JwtError::DuplicateSetEntry("a".into()));
    assert_eq!(payload.expires_at().unwrap_err().kind(), ErrorKind::ClaimTypeMismatch);
    assert_eq!(payload.subject().unwrap(), Some("s"));
    assert_eq!(payload.id().unwrap(), None);
}

#[test]
fn test_decoded_claims_keep_their_json_kinds() {
    let decoded = Jwt::decode(&unsigned(
        r#"{"n":1,"r":1.0,"b":false,"s":"x","a":[1],"o":{},"z":null}"#,
    ))
    .unwrap();
    let kinds: Vec<_> = decoded.payload().iter().map(|(name, c)| (name.as_str(), c.kind())).collect();
    assert_eq!(
        kinds,
        [
            ("a", ValueKind::Array),
            ("b", ValueKind::Boolean),
            ("n", ValueKind::Integer),
            ("o", ValueKind::Object),
            ("r", ValueKind::Real),
            ("s", ValueKind::String),
            ("z", ValueKind::Null),
        ]
    );
}

#[test]
fn test_out_of_range_time_claim_rejects_token() {
    let token = Jwt::builder()
        .set_payload_claim("exp", C::parse("18446744073709551615").unwrap())
        .sign(&Hmac::hs256(b"k"))
        .unwrap();
    let err = Jwt::verifier()
        .allow_algorithm(Hmac::hs256(b"k"))
        .verify_str(&token)
        .unwrap_err();
    assert!(matches!(err, JwtError::ClaimOutOfRange(_)));
    assert_eq!(err.kind(), ErrorKind::ClaimTypeMismatch);
}

#[test]
fn test_custom_claim_checks() {
    let token = Jwt::builder()
        .set_payload_claim("level", 3)
        .set_payload_claim("scope", C::from_set(["read", "write"]))
        .sign(&Hmac::hs256(b"k"))
        .unwrap();
    let base = Jwt::verifier().allow_algorithm(Hmac::hs256(b"k"));

    base.clone()
        .with_claim("level", 3)
        .with_claim_fn("scope", |c| c.as_set().map(|s| s.contains("write")).unwrap_or(false))
        .verify_str(&token)
        .unwrap();

    let err = base.clone().with_claim("level", "3").verify_str(&token).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ClaimMismatch);
    assert!(err.to_string().contains("level"));

    let err = base.with_claim("tenant", "acme").verify_str(&token).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ClaimMismatch);
}

#[test]
fn test_first_failing_claim_is_reported() {
    let token = Jwt::builder()
        .set_issuer("someone")
        .set_subject("nobody")
        .sign(&Hmac::hs256(b"k"))
        .unwrap();
    let err = Jwt::verifier()
        .allow_algorithm(Hmac::hs256(b"k"))
        .with_subject("user")
        .with_issuer("auth")
        .verify_str(&token)
        .unwrap_err();
    // Checks run in claim name order, so `iss` fails before `sub`.
    assert_eq!(
        err,
        JwtError::ClaimMismatch {
            claim: "iss".into(),
            reason: "value does not match".into(),
        }
    );
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct Role {
    name: String,
    level: u8,
}

#[test]
fn test_structured_claim_through_token() {
    let role = Role {
        name: "editor".into(),
        level: 2,
    };
    let token = Jwt::builder()
        .set_payload_claim("role", C::from_serializable(&role).unwrap())
        .sign(&Hmac::hs256(b"k"))
        .unwrap();
    let decoded = Jwt::decode(&token).unwrap();
    let claim = decoded.payload_claim("role").unwrap();
    assert_eq!(claim.kind(), ValueKind::Object);
    assert_eq!(claim.deserialize::<Role>().unwrap(), role);
    assert_eq!(
        claim.deserialize::<Vec<Role>>().unwrap_err().kind(),
        ErrorKind::Parse
    );
}
