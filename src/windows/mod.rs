//! Windows backend
//!
//! The simulator exposes telemetry through a named file mapping and signals
//! each new tick with a named event. [`Connection`] maps both and implements
//! [`TelemetrySource`](crate::TelemetrySource); [`BroadcastSender`] delivers
//! remote-control commands.
//!
//! ```rust,ignore
//! use pitlane::windows::Connection;
//! use pitlane::{ClientOptions, LiveClient};
//!
//! let mut client = LiveClient::new(Connection::try_connect()?, ClientOptions::default());
//! if client.startup()? {
//!     println!("speed {:?}", client.get("Speed")?);
//! }
//! ```

mod broadcast;
mod connection;

pub use broadcast::BroadcastSender;
pub use connection::{Connection, IRSDK_MEMMAPFILESIZE};
