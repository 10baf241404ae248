//! Login Codec Tests
//!
//! Tests for login request validation, body layout and reply decoding.

use cmdwire::protocol::{CommandCodec, Login, LoginRequest, LoginResponse, LOGIN_CODE};
use cmdwire::WireError;
use proptest::prelude::*;

// =============================================================================
// Body Layout Tests
// =============================================================================

#[test]
fn test_opcode() {
    assert_eq!(LOGIN_CODE, 38);
    assert_eq!(Login::CODE, 38);
}

#[test]
fn test_encode_bob_secret() {
    let body = Login::encode(&LoginRequest::new("bob", "secret")).unwrap();

    let mut expected = vec![3u8];
    expected.extend_from_slice(b"bob");
    expected.push(6);
    expected.extend_from_slice(b"secret");
    expected.extend_from_slice(&[0, 0, 0, 0]);
    expected.extend_from_slice(&[0, 0, 0, 0]);

    assert_eq!(body.len(), 19);
    assert_eq!(&body[..], &expected[..]);
}

#[test]
fn test_encode_with_version() {
    let body = Login::encode(&LoginRequest::new("bob", "secret").with_version("1.0.0")).unwrap();

    // 1 + 3 + 1 + 6 = 11 bytes of credentials precede the version
    assert_eq!(&body[11..15], &5u32.to_le_bytes());
    assert_eq!(&body[15..20], b"1.0.0");
    assert_eq!(&body[20..], &[0, 0, 0, 0]);
}

#[test]
fn test_encode_with_context() {
    let body = Login::encode(&LoginRequest::new("bob", "secret").with_context("app=web")).unwrap();

    assert_eq!(&body[11..15], &[0, 0, 0, 0]);
    assert_eq!(&body[15..19], &7u32.to_le_bytes());
    assert_eq!(&body[19..], b"app=web");
}

#[test]
fn test_empty_version_same_as_absent() {
    let absent = Login::encode(&LoginRequest::new("bob", "secret")).unwrap();
    let empty = Login::encode(&LoginRequest::new("bob", "secret").with_version("")).unwrap();
    assert_eq!(absent, empty);
    assert_eq!(empty.len(), 19);
}

#[test]
fn test_encode_is_deterministic() {
    let request = LoginRequest::new("user", "pass")
        .with_version("0.4.2")
        .with_context("ctx");
    assert_eq!(Login::encode(&request).unwrap(), Login::encode(&request).unwrap());
}

#[test]
fn test_encode_binary_credentials() {
    let username: Vec<u8> = vec![0x00, 0xFF, 0x80];
    let password: Vec<u8> = (1..=255).collect();
    let body = Login::encode(&LoginRequest::new(&username, &password)).unwrap();

    let decoded = LoginRequest::decode_body(&body).unwrap();
    assert_eq!(decoded.username(), &username[..]);
    assert_eq!(decoded.password(), &password[..]);
}

#[test]
fn test_username_length_counts_bytes() {
    // 128 two-byte characters: 128 chars but 256 bytes
    let username = "é".repeat(128);
    assert!(matches!(
        Login::encode(&LoginRequest::new(&username, "pw")),
        Err(WireError::InvalidField(_))
    ));

    let username = "é".repeat(127);
    let body = Login::encode(&LoginRequest::new(&username, "pw")).unwrap();
    assert_eq!(body[0], 254);
}

// =============================================================================
// Validation Tests
// =============================================================================

#[test]
fn test_empty_username_rejected() {
    match Login::encode(&LoginRequest::new("", "secret")) {
        Err(WireError::InvalidField(msg)) => {
            assert_eq!(msg, "Username should be between 1 and 255 bytes")
        }
        other => panic!("Expected InvalidField, got {:?}", other),
    }
}

#[test]
fn test_long_password_rejected() {
    let password = vec![b'x'; 256];
    match Login::encode(&LoginRequest::new("bob", &password)) {
        Err(WireError::InvalidField(msg)) => {
            assert_eq!(msg, "Password should be between 1 and 255 bytes")
        }
        other => panic!("Expected InvalidField, got {:?}", other),
    }
}

#[test]
fn test_username_checked_before_password() {
    match LoginRequest::new("", "").validate() {
        Err(WireError::InvalidField(msg)) => assert!(msg.starts_with("Username")),
        other => panic!("Expected InvalidField, got {:?}", other),
    }
}

#[test]
fn test_bounds_inclusive() {
    let max = vec![b'a'; 255];
    assert!(LoginRequest::new(&max, &max).validate().is_ok());
    assert!(LoginRequest::new("a", "b").validate().is_ok());
}

#[test]
fn test_validation_error_not_retryable() {
    let err = Login::encode(&LoginRequest::new("", "pw")).unwrap_err();
    assert!(!err.is_retryable());
}

// =============================================================================
// Response Decoding Tests
// =============================================================================

#[test]
fn test_decode_user_id() {
    let response = Login::decode(&[0x01, 0x00, 0x00, 0x00]).unwrap();
    assert_eq!(response, LoginResponse { user_id: 1 });
}

#[test]
fn test_decode_little_endian() {
    let response = Login::decode(&[0x78, 0x56, 0x34, 0x12]).unwrap();
    assert_eq!(response.user_id, 0x1234_5678);
}

#[test]
fn test_decode_ignores_trailer() {
    let response = Login::decode(&[0x02, 0x00, 0x00, 0x00, 0xDE, 0xAD]).unwrap();
    assert_eq!(response.user_id, 2);
}

#[test]
fn test_decode_short_payload() {
    for len in 0..4 {
        let payload = vec![0xFFu8; len];
        assert!(
            matches!(Login::decode(&payload), Err(WireError::MalformedResponse(_))),
            "payload of {} bytes accepted",
            len
        );
    }
}

#[test]
fn test_response_payload_round_trip() {
    let response = LoginResponse { user_id: u32::MAX };
    assert_eq!(Login::decode(&response.to_payload()).unwrap(), response);
}

// =============================================================================
// Generated Input Tests
// =============================================================================

fn credential() -> impl Strategy<Value = Vec<u8>> {
    proptest::collection::vec(any::<u8>(), 1..=255)
}

fn out_of_bounds() -> impl Strategy<Value = Vec<u8>> {
    prop_oneof![Just(Vec::new()), proptest::collection::vec(any::<u8>(), 256..400)]
}

proptest! {
    #[test]
    fn prop_credentials_round_trip(
        username in credential(),
        password in credential(),
        version in proptest::option::of(proptest::collection::vec(any::<u8>(), 0..64)),
        context in proptest::option::of(proptest::collection::vec(any::<u8>(), 0..64)),
    ) {
        let mut request = LoginRequest::new(&username, &password);
        if let Some(v) = &version {
            request = request.with_version(v);
        }
        if let Some(c) = &context {
            request = request.with_context(c);
        }

        let body = Login::encode(&request).unwrap();
        prop_assert_eq!(
            body.len(),
            1 + username.len() + 1 + password.len() + 4
                + version.as_ref().map_or(0, Vec::len) + 4
                + context.as_ref().map_or(0, Vec::len)
        );

        let decoded = LoginRequest::decode_body(&body).unwrap();
        prop_assert_eq!(decoded.username(), &username[..]);
        prop_assert_eq!(decoded.password(), &password[..]);
        prop_assert_eq!(
            decoded.client_version().unwrap_or_default(),
            version.as_deref().unwrap_or_default()
        );
        prop_assert_eq!(
            decoded.context().unwrap_or_default(),
            context.as_deref().unwrap_or_default()
        );
    }

    #[test]
    fn prop_bad_username_rejected(username in out_of_bounds(), password in credential()) {
        let result = Login::encode(&LoginRequest::new(&username, &password));
        prop_assert!(matches!(result, Err(WireError::InvalidField(_))));
    }

    #[test]
    fn prop_bad_password_rejected(username in credential(), password in out_of_bounds()) {
        let result = Login::encode(&LoginRequest::new(&username, &password));
        prop_assert!(matches!(result, Err(WireError::InvalidField(_))));
    }

    #[test]
    fn prop_decode_reads_first_four_bytes(user_id in any::<u32>(), trailer in proptest::collection::vec(any::<u8>(), 0..16)) {
        let mut payload = user_id.to_le_bytes().to_vec();
        payload.extend_from_slice(&trailer);
        prop_assert_eq!(Login::decode(&payload).unwrap().user_id, user_id);
    }
}
