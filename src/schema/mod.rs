//! Telemetry image layout.
//!
//! Live shared memory and disk recordings share one layout:
//! - [`header`]: the fixed header and its buffer descriptor array
//! - [`variables`]: the variable directory
//! - [`session`]: the session info document and its cache
//!
//! Everything here decodes from a byte slice, so the same code serves the
//! Windows mapping, memory-mapped files and synthetic images in tests.

pub mod header;
pub mod session;
pub mod variables;

pub use header::{BufferDescriptor, Header};
pub use session::SessionInfoCache;
pub use variables::VariableDirectory;
