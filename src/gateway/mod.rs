//! Gateway server and command routing
//!
//! This module implements the network-facing half of the gateway: the TCP
//! accept loop with single-session admission, and the router that maps
//! inbound events to Device Facility calls.

mod router;
mod server;

pub use router::CommandRouter;
pub use server::GatewayServer;
