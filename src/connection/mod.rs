//! Live telemetry connection.
//!
//! - [`live`]: the polled [`LiveClient`](live::LiveClient)
//! - [`link`]: connection status smoothing

pub mod link;
pub mod live;

pub use link::LinkState;
pub use live::{LiveClient, PlatformSource};
