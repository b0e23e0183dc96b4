//! Recorded telemetry files.
//!
//! Recordings share the live header and variable directory; the data buffer
//! becomes an array of fixed-length records. See [`DiskClient`].

pub mod format;
pub mod reader;

pub use format::DiskSubHeader;
pub use reader::{DiskClient, RecordCursor, RecordView, Records};
