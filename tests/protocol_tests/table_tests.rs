//! Command Table Tests
//!
//! Tests for opcode registration and lookup.

use std::sync::Arc;
use std::thread;

use bytes::Bytes;
use cmdwire::protocol::{
    CommandCodec, CommandTable, Login, LoginRequest, LoginResponse, Logout, Ping, LOGIN_CODE,
    PING_CODE,
};
use cmdwire::{Result, WireError};

/// Command with an opcode outside the standard table
struct Echo;

impl CommandCodec for Echo {
    const CODE: u8 = 200;
    const NAME: &'static str = "echo";
    type Request = Vec<u8>;
    type Response = Vec<u8>;

    fn encode(request: &Vec<u8>) -> Result<Bytes> {
        Ok(Bytes::copy_from_slice(request))
    }

    fn decode(payload: &[u8]) -> Result<Vec<u8>> {
        Ok(payload.to_vec())
    }

    fn decode_body(body: &[u8]) -> Result<Vec<u8>> {
        Ok(body.to_vec())
    }

    fn encode_reply(response: &Vec<u8>) -> Result<Bytes> {
        Ok(Bytes::copy_from_slice(response))
    }
}

#[test]
fn test_builder_registers_in_opcode_order() {
    let table = CommandTable::builder()
        .register::<Echo>()
        .register::<Login>()
        .register::<Ping>()
        .build()
        .unwrap();

    let codes: Vec<u8> = table.iter().map(|c| c.code).collect();
    assert_eq!(codes, vec![1, LOGIN_CODE, 200]);
}

#[test]
fn test_lookup() {
    let table = CommandTable::standard();

    assert_eq!(
        table.get(LOGIN_CODE).map(|c| (c.code, c.name)),
        Some((38, "login"))
    );
    assert!(table.contains(Logout::CODE));
    assert!(table.get(Echo::CODE).is_none());
}

#[test]
fn test_dispatch_uses_registered_codec() {
    let table = CommandTable::standard();
    let body = Login::encode(&LoginRequest::new("bob", "secret")).unwrap();

    let info = table.check_request(LOGIN_CODE, &body).unwrap();
    assert_eq!(info.name, "login");
    info.check_reply(&LoginResponse { user_id: 9 }.to_payload()).unwrap();
    assert!(matches!(
        info.check_reply(&[1, 2]),
        Err(WireError::MalformedResponse(_))
    ));

    // Truncated login body
    assert!(matches!(
        table.check_request(LOGIN_CODE, &body[..body.len() - 1]),
        Err(WireError::Protocol(_))
    ));
    // Ping carries no body
    assert!(matches!(
        table.check_request(PING_CODE, b"x"),
        Err(WireError::Protocol(_))
    ));
    assert!(matches!(
        table.check_request(Echo::CODE, b"x"),
        Err(WireError::UnknownCommand(200))
    ));
}

#[test]
fn test_dispatch_follows_table_contents() {
    let table = CommandTable::builder().register::<Echo>().build().unwrap();
    let info = table.check_request(Echo::CODE, b"anything").unwrap();
    assert_eq!(info.name, "echo");
    assert!(matches!(
        table.check_request(LOGIN_CODE, &[]),
        Err(WireError::UnknownCommand(38))
    ));
}

#[test]
fn test_require_unknown() {
    let table = CommandTable::standard();
    assert!(matches!(table.require(200), Err(WireError::UnknownCommand(200))));
}

#[test]
fn test_empty_table() {
    let table = CommandTable::builder().build().unwrap();
    assert!(table.is_empty());
    assert_eq!(table.len(), 0);
}

#[test]
fn test_registering_same_codec_twice_rejected() {
    let result = CommandTable::builder()
        .register::<Ping>()
        .register::<Ping>()
        .build();

    match result {
        Err(WireError::Config(msg)) => assert!(msg.contains("Opcode 1")),
        other => panic!("Expected Config error, got {:?}", other.map(|t| t.len())),
    }
}

#[test]
fn test_concurrent_codec_use() {
    let table = Arc::new(CommandTable::standard());

    let handles: Vec<_> = (0..8u8)
        .map(|i| {
            let table = Arc::clone(&table);
            thread::spawn(move || {
                let name = format!("user{}", i);
                let request = LoginRequest::new(&name, "pw");
                for _ in 0..100 {
                    assert!(table.contains(Login::CODE));
                    let body = Login::encode(&request).unwrap();
                    assert_eq!(&body[1..1 + name.len()], name.as_bytes());
                    let reply = Login::decode(&u32::from(i).to_le_bytes()).unwrap();
                    assert_eq!(reply.user_id, u32::from(i));
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn test_empty_body_commands() {
    assert!(Ping::encode(&()).unwrap().is_empty());
    assert!(Logout::encode(&()).unwrap().is_empty());
    Ping::decode(b"ignored").unwrap();
    Logout::decode(&[]).unwrap();
}
