//! Shared helpers for gateway integration tests
//!
//! Each test spawns its own gateway on an ephemeral port and talks to it
//! over a real TCP connection with the wire protocol, so the full path
//! (accept loop, session admission, router, facility, writer) is exercised.
#![allow(dead_code)]

use manipulator_link::config::FacilityConfig;
use manipulator_link::facility::{DeviceFacility, SimulatedFacility};
use manipulator_link::gateway::GatewayServer;
use manipulator_link::monitoring::Monitor;
use manipulator_link::protocol::{EventFrame, ReplyFrame};
use serde_json::Value;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::time::{sleep, timeout, Instant};

/// How long a test waits for a reply before giving up
pub const RECV_TIMEOUT: Duration = Duration::from_secs(2);

/// A gateway spawned for one test, plus handles into its internals
pub struct TestGateway {
    /// Address the gateway is listening on
    pub addr: SocketAddr,
    /// The simulated rig behind the gateway
    pub facility: Arc<SimulatedFacility>,
    /// The gateway's activity monitor
    pub monitor: Arc<Monitor>,
}

/// Facility configuration with delays short enough for tests
pub fn fast_facility_config() -> FacilityConfig {
    FacilityConfig {
        device_ids: vec![1, 2, 3, 4],
        axis_limit_um: 20_000.0,
        motion_delay_ms: 10,
        calibration_delay_ms: 20,
    }
}

/// Spawn a gateway on an ephemeral port with the fast test facility
pub async fn spawn_gateway() -> TestGateway {
    spawn_gateway_with(fast_facility_config()).await
}

/// Spawn a gateway on an ephemeral port with the given facility settings
pub async fn spawn_gateway_with(config: FacilityConfig) -> TestGateway {
    let facility = Arc::new(SimulatedFacility::new(&config));
    let monitor = Arc::new(Monitor::new());

    let facility_dyn: Arc<dyn DeviceFacility> = facility.clone();
    let server = GatewayServer::bind("127.0.0.1:0", facility_dyn, monitor.clone())
        .await
        .expect("Failed to bind gateway");
    let addr = server.local_addr().expect("Gateway has no local address");

    tokio::spawn(server.run());

    TestGateway {
        addr,
        facility,
        monitor,
    }
}

/// TCP client speaking the gateway's wire protocol
pub struct LinkClient {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl LinkClient {
    /// Connect to the gateway
    pub async fn connect(addr: SocketAddr) -> std::io::Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        let (reader, writer) = stream.into_split();
        Ok(Self {
            reader: BufReader::new(reader),
            writer,
        })
    }

    /// Send one event frame
    pub async fn send_event(&mut self, event: &str, data: Value) {
        let frame = EventFrame::new(event, data);
        let mut line = frame.to_json().expect("Failed to serialize frame");
        line.push('\n');
        self.writer
            .write_all(line.as_bytes())
            .await
            .expect("Failed to write frame");
    }

    /// Send a raw line, bypassing frame serialization
    pub async fn send_raw(&mut self, line: &str) {
        self.writer
            .write_all(line.as_bytes())
            .await
            .expect("Failed to write raw line");
    }

    /// Read one line, or `None` if the gateway closed the connection
    pub async fn recv_line(&mut self) -> Option<String> {
        let mut line = String::new();
        let n = timeout(RECV_TIMEOUT, self.reader.read_line(&mut line))
            .await
            .expect("Timed out waiting for the gateway")
            .expect("Failed to read from the gateway");
        if n == 0 {
            None
        } else {
            Some(line)
        }
    }

    /// Read one reply frame, panicking if the connection closed instead
    pub async fn recv_reply(&mut self) -> ReplyFrame {
        let line = self
            .recv_line()
            .await
            .expect("Gateway closed the connection");
        ReplyFrame::from_json(line.trim()).expect("Reply was not a valid frame")
    }

    /// Send an event and wait for its reply
    pub async fn command(&mut self, event: &str, data: Value) -> ReplyFrame {
        self.send_event(event, data).await;
        self.recv_reply().await
    }
}

/// Poll `condition` until it holds or the receive timeout elapses
pub async fn wait_for<F, Fut>(mut condition: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = Instant::now() + RECV_TIMEOUT;
    while Instant::now() < deadline {
        if condition().await {
            return;
        }
        sleep(Duration::from_millis(5)).await;
    }
    panic!("Condition not met within {:?}", RECV_TIMEOUT);
}
