//! Telemetry reader for the iRacing simulator.
//!
//! Pitlane decodes the simulator's telemetry format from two places:
//!
//! - **Live shared memory** (Windows): a header, a variable directory, a
//!   small ring of data buffers the simulator rewrites every tick, and an
//!   embedded block of session info text. See [`LiveClient`].
//! - **Recorded files** (any platform): the same header and directory in
//!   front of an array of fixed-length records. See [`DiskClient`].
//!
//! # Quick Start
//!
//! ## Recorded file
//!
//! ```rust,no_run
//! use pitlane::Pitlane;
//! use pitlane::schema::session::{WeekendInfo, keys};
//!
//! fn main() -> pitlane::Result<()> {
//!     let disk = Pitlane::open("session.ibt")?;
//!     let speeds: Vec<f32> = disk.column_as("Speed")?;
//!     println!("{} samples", speeds.len());
//!
//!     if let Some(weekend) = disk.session_section::<WeekendInfo>(keys::WEEKEND_INFO)? {
//!         println!("track: {}", weekend.track_name);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Live telemetry
//!
//! ```rust,no_run
//! use pitlane::{ClientOptions, Pitlane};
//!
//! fn main() -> pitlane::Result<()> {
//!     let mut client = Pitlane::connect(ClientOptions::default())?;
//!     loop {
//!         if !client.is_initialized() && !client.startup()? {
//!             continue;
//!         }
//!         if client.wait_for_data()? {
//!             let rpm: f32 = client.get_as("RPM")?;
//!             println!("{rpm:.0} rpm");
//!         }
//!     }
//! }
//! ```

// Core types and error handling
mod error;
#[cfg(any(test, feature = "benchmark"))]
pub mod test_utils;
pub mod types;
mod yaml_utils;

// Decoding
pub mod buffer;
pub mod config;
pub mod extract;
pub mod schema;

// Clients
pub mod commands;
pub mod connection;
pub mod ibt;
pub mod source;

// Platform-specific modules
#[cfg(windows)]
pub mod windows;

// Core exports
pub use error::*;
pub use types::*;

pub use commands::{BroadcastMessage, CommandSink, pad_car_number};
pub use config::ClientOptions;
pub use connection::{LinkState, LiveClient, PlatformSource};
pub use ibt::{DiskClient, DiskSubHeader, RecordCursor, RecordView};
pub use schema::{BufferDescriptor, Header, SessionInfoCache, VariableDirectory};
pub use source::{MemorySource, TelemetrySource, WaitResult};

#[cfg(windows)]
pub use windows::{BroadcastSender, Connection as WindowsConnection};

/// Entry point for both telemetry sources.
///
/// # Examples
///
/// ```rust,no_run
/// use pitlane::{ClientOptions, Pitlane};
///
/// # fn main() -> pitlane::Result<()> {
/// let live = Pitlane::connect(ClientOptions::default());
/// let disk = Pitlane::open("race.ibt")?;
/// # Ok(())
/// # }
/// ```
pub struct Pitlane;

impl Pitlane {
    /// Connect to the running simulator.
    ///
    /// # Platform
    ///
    /// Only available on Windows where the simulator runs. On other platforms
    /// this returns [`TelemetryError::UnsupportedPlatform`].
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Platform is not Windows
    /// - The simulator's shared memory or data-ready event cannot be opened
    /// - The header fails its bounds checks
    pub fn connect(options: ClientOptions) -> Result<LiveClient<PlatformSource>> {
        LiveClient::connect(options)
    }

    /// Memory-map a recorded telemetry file.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file does not exist or cannot be mapped
    /// - The header or disk sub-header is malformed
    pub fn open<P: AsRef<std::path::Path>>(path: P) -> Result<DiskClient> {
        DiskClient::open(path)
    }

    /// [`Pitlane::open`] with explicit options.
    pub fn open_with<P: AsRef<std::path::Path>>(
        path: P,
        options: &ClientOptions,
    ) -> Result<DiskClient> {
        DiskClient::open_with(path, options)
    }
}
