//! Example control client
//!
//! This demonstrates how to drive the gateway's event channel from an
//! external application: register a manipulator, calibrate it and move it
//! around, reading the ResultTuple replies.
//!
//! Start the gateway first (`manipulator-link start`), then run this with
//! `cargo run --example control_client`.

use std::io::{BufRead, BufReader, Write};
use std::net::TcpStream;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let addr = "127.0.0.1:8080";
    println!("Connecting to {}", addr);

    let mut stream = TcpStream::connect(addr)?;
    println!("Connected!");

    let mut reader = BufReader::new(stream.try_clone()?);
    let mut reply = String::new();

    // Example 1: Register manipulator 1
    println!("\n--- Registering manipulator 1 ---");
    let register_frame = r#"{"event":"register_manipulator","data":1}"#;
    writeln!(stream, "{}", register_frame)?;

    reader.read_line(&mut reply)?;
    println!("Reply: {}", reply);

    // Example 2: Query its home position
    println!("\n--- Reading position ---");
    let get_pos_frame = r#"{"event":"get_pos","data":1}"#;
    writeln!(stream, "{}", get_pos_frame)?;

    reply.clear();
    reader.read_line(&mut reply)?;
    println!("Reply: {}", reply);

    // Example 3: Calibrate (takes a moment on a real rig)
    println!("\n--- Calibrating ---");
    let calibrate_frame = r#"{"event":"calibrate","data":1}"#;
    writeln!(stream, "{}", calibrate_frame)?;

    reply.clear();
    reader.read_line(&mut reply)?;
    println!("Reply: {}", reply);

    // Example 4: Move to a target position
    println!("\n--- Moving to [1000, 2000, 3000, 500] ---");
    let goto_frame =
        r#"{"event":"goto_pos","data":{"manipulator_id":1,"pos":[1000.0,2000.0,3000.0,500.0],"speed":200.0}}"#;
    writeln!(stream, "{}", goto_frame)?;

    reply.clear();
    reader.read_line(&mut reply)?;
    println!("Reply: {}", reply);

    // Example 5: Read the position back
    println!("\n--- Reading position after the move ---");
    writeln!(stream, "{}", get_pos_frame)?;

    reply.clear();
    reader.read_line(&mut reply)?;
    println!("Reply: {}", reply);

    Ok(())
}
