//! WebSocket tunnels to devices
//!
//! - [`connection`]: the socket presented as `AsyncRead + AsyncWrite`
//! - [`dialer`]: authenticated upgrades for connect, SSH and log streams

pub mod connection;
pub mod dialer;

pub use connection::{TunnelConnection, TunnelHandle, MAX_FRAME_SIZE};
pub use dialer::DeviceTunnel;
