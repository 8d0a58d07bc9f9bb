//! Probes against a running gateway instance
//!
//! These tests verify that a locally started gateway accepts a connection,
//! answers commands on the event channel and serves the HTTP surface. They
//! are ignored by default because they need `manipulator-link start`
//! listening on the default ports.

use serde_json::json;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpStream;
use std::time::Duration;

const GATEWAY_ADDR: &str = "127.0.0.1:8080";
const HTTP_ADDR: &str = "127.0.0.1:9090";

/// Send one event frame and read the reply line
fn round_trip(stream: &mut TcpStream, event: &str, data: serde_json::Value) -> serde_json::Value {
    let frame = json!({"event": event, "data": data});
    let frame_str = serde_json::to_string(&frame).expect("Failed to serialize frame");

    stream
        .write_all(frame_str.as_bytes())
        .expect("Failed to write frame");
    stream.write_all(b"\n").expect("Failed to write newline");
    stream.flush().expect("Failed to flush stream");

    let mut reader = BufReader::new(&*stream);
    let mut reply_line = String::new();
    reader
        .read_line(&mut reply_line)
        .expect("Failed to read reply");

    serde_json::from_str(&reply_line).expect("Reply is not valid JSON")
}

/// Test that we can connect to the gateway's event channel
#[test]
#[ignore] // Requires running gateway
fn test_gateway_accepts_connection() {
    let result = TcpStream::connect(GATEWAY_ADDR);
    assert!(
        result.is_ok(),
        "Failed to connect to gateway at {}: {:?}. Is manipulator-link running?",
        GATEWAY_ADDR,
        result.err()
    );
}

/// Test that a register command gets a well-formed ResultTuple reply
#[test]
#[ignore] // Requires running gateway
fn test_gateway_register_round_trip() {
    let mut stream = TcpStream::connect(GATEWAY_ADDR).expect("Failed to connect to gateway");
    stream
        .set_read_timeout(Some(Duration::from_secs(5)))
        .expect("Failed to set read timeout");

    let reply = round_trip(&mut stream, "register_manipulator", json!(1));

    assert_eq!(reply["event"], "register_manipulator");
    let tuple = reply["data"]
        .as_array()
        .expect("Reply data is not a tuple");
    assert_eq!(tuple.len(), 3, "ResultTuple must have three elements");
    assert_eq!(tuple[0], 1, "Reply does not echo the manipulator id");
    assert!(tuple[1].is_array(), "Payload element is not an array");
    assert!(tuple[2].is_string(), "Error element is not a string");

    println!("Reply: {}", serde_json::to_string_pretty(&reply).unwrap());
}

/// Test that querying an unregistered manipulator yields an error reply
#[test]
#[ignore] // Requires running gateway
fn test_gateway_unregistered_query_fails() {
    let mut stream = TcpStream::connect(GATEWAY_ADDR).expect("Failed to connect to gateway");
    stream
        .set_read_timeout(Some(Duration::from_secs(5)))
        .expect("Failed to set read timeout");

    let reply = round_trip(&mut stream, "get_pos", json!(4));

    let tuple = reply["data"]
        .as_array()
        .expect("Reply data is not a tuple");
    let error = tuple[2].as_str().expect("Error element is not a string");
    assert!(
        !error.is_empty(),
        "Expected an error for an unregistered manipulator"
    );

    println!("Error reply: {}", serde_json::to_string_pretty(&reply).unwrap());
}

/// Test that the HTTP health endpoint answers
#[test]
#[ignore] // Requires running gateway
fn test_health_endpoint_responds() {
    let mut stream = TcpStream::connect(HTTP_ADDR).expect("Failed to connect to HTTP server");
    stream
        .set_read_timeout(Some(Duration::from_secs(5)))
        .expect("Failed to set read timeout");

    stream
        .write_all(b"GET /healthz HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .expect("Failed to write request");

    let mut response = String::new();
    stream
        .read_to_string(&mut response)
        .expect("Failed to read response");

    assert!(
        response.starts_with("HTTP/1.1 200"),
        "Unexpected health response: {}",
        response
    );
    assert!(response.ends_with("OK"), "Unexpected health body: {}", response);
}
