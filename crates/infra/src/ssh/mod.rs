//! SSH sessions to devices, carried over WebSocket tunnels

pub mod errors;
pub mod keepalive;
pub mod session;

pub use errors::SshError;
pub use keepalive::{
    run_keepalive, KeepaliveTarget, KeepaliveTimings, KEEPALIVE_GRACE, KEEPALIVE_INTERVAL,
};
pub use session::{DeviceSshSession, HANDSHAKE_TIMEOUT};
