use super::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct Ping {
    n: u32,
}

#[tokio::test]
async fn round_trips_a_message_through_the_wire_format() {
    let (mut client, mut server) = tokio::io::duplex(1024);

    let payload = encode::<Ping>(&Ping { n: 7 }).unwrap();
    write_message(&mut client, &payload).await.unwrap();

    let bytes = read_message(&mut server).await.unwrap();
    let decoded: Ping = decode(&bytes).unwrap();
    assert_eq!(decoded, Ping { n: 7 });
}

#[tokio::test]
async fn read_message_reports_connection_closed_on_immediate_eof() {
    let (client, mut server) = tokio::io::duplex(1024);
    drop(client);

    let err = read_message(&mut server).await.unwrap_err();
    assert!(matches!(err, ProtocolError::ConnectionClosed));
}

#[test]
fn encode_rejects_a_payload_over_the_size_limit() {
    #[derive(Serialize)]
    struct Big {
        data: Vec<u8>,
    }
    let big = Big {
        data: vec![0u8; MAX_MESSAGE_SIZE + 1],
    };
    let err = encode(&big).unwrap_err();
    assert!(matches!(err, ProtocolError::MessageTooLarge { .. }));
}

#[tokio::test]
async fn read_message_rejects_a_length_prefix_over_the_size_limit() {
    let (mut client, mut server) = tokio::io::duplex(64);
    let bogus_len = (MAX_MESSAGE_SIZE as u32 + 1).to_be_bytes();
    client.write_all(&bogus_len).await.unwrap();

    let err = read_message(&mut server).await.unwrap_err();
    assert!(matches!(err, ProtocolError::MessageTooLarge { .. }));
}
