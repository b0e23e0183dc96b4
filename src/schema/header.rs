//! Telemetry header decoding.
//!
//! The header sits at offset 0 of both the live shared-memory segment and a
//! recorded telemetry file. Every field is a little-endian `i32` at a fixed
//! offset, so the decoder reads each one explicitly instead of casting the
//! buffer to a `repr(C)` struct:
//!
//! ```text
//! offset  field
//!      0  ver                 api version
//!      4  status              bitfield, bit 0 = connected
//!      8  tickRate            ticks per second
//!     12  sessionInfoUpdate   incremented when session info changes
//!     16  sessionInfoLen      length of the session info region
//!     20  sessionInfoOffset   offset of the session info region
//!     24  numVars             number of variable descriptors
//!     28  varHeaderOffset     offset of the first variable descriptor
//!     32  numBuf              number of data buffers (at most 4)
//!     36  bufLen              length of one data buffer / record
//!     48  varBuf[numBuf]      16-byte buffer descriptors
//! ```
//!
//! A header is only produced when every span it describes (session info,
//! variable directory and buffer descriptor array) lies inside the buffer it
//! was decoded from. Anything else is reported as
//! [`TelemetryError::MalformedHeader`].

use crate::{Result, TelemetryError};
use tracing::{debug, trace};

/// Bytes needed before the buffer descriptor array begins.
pub const HEADER_MIN_LEN: usize = 48;

/// Offset of the first buffer descriptor.
pub const VAR_BUF_OFFSET: usize = 48;

/// Stride of one buffer descriptor.
pub const VAR_BUF_STRIDE: usize = 16;

/// Maximum number of data buffers the writer rotates through.
pub const IRSDK_MAX_BUFS: usize = 4;

/// Size of the fixed header including a full descriptor array.
pub const HEADER_LEN: usize = VAR_BUF_OFFSET + IRSDK_MAX_BUFS * VAR_BUF_STRIDE;

/// Status flag indicating that the simulator is actively publishing telemetry.
pub const IRSDK_STATUS_CONNECTED: i32 = 0x1;

const OFFSET_STATUS: usize = 4;
const OFFSET_SESSION_INFO_UPDATE: usize = 12;

/// One entry of the buffer rotation array.
///
/// The tick count is owned by the external writer and changes between reads;
/// re-read descriptors with [`read_buffer_descriptors`] instead of caching them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferDescriptor {
    pub tick_count: i32,
    pub buf_offset: i32,
}

impl BufferDescriptor {
    /// Byte offset of the buffer as an index into the mapped region.
    pub fn offset(&self) -> usize {
        self.buf_offset.max(0) as usize
    }
}

/// Decoded telemetry header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub version: i32,
    pub status: i32,
    pub tick_rate: i32,
    pub session_info_update: i32,
    pub session_info_len: i32,
    pub session_info_offset: i32,
    pub num_vars: i32,
    pub var_header_offset: i32,
    pub num_buf: i32,
    pub buf_len: i32,
    pub buffers: Vec<BufferDescriptor>,
}

impl Header {
    /// Decode and bounds-check a header from the start of `memory`.
    pub fn parse(memory: &[u8]) -> Result<Self> {
        trace!(memory_len = memory.len(), "Parsing telemetry header");

        if memory.len() < HEADER_MIN_LEN {
            return Err(TelemetryError::malformed_header(format!(
                "buffer of {} bytes is shorter than the {} byte header",
                memory.len(),
                HEADER_MIN_LEN
            )));
        }

        let mut header = Self {
            version: read_i32_le(memory, 0)?,
            status: read_i32_le(memory, 4)?,
            tick_rate: read_i32_le(memory, 8)?,
            session_info_update: read_i32_le(memory, 12)?,
            session_info_len: read_i32_le(memory, 16)?,
            session_info_offset: read_i32_le(memory, 20)?,
            num_vars: read_i32_le(memory, 24)?,
            var_header_offset: read_i32_le(memory, 28)?,
            num_buf: read_i32_le(memory, 32)?,
            buf_len: read_i32_le(memory, 36)?,
            buffers: Vec::new(),
        };

        header.validate_fields()?;
        header.validate_spans(memory.len())?;
        header.buffers = read_buffer_descriptors(memory, header.num_buf as usize)?;

        debug!(
            ver = header.version,
            status = header.status,
            tick_rate = header.tick_rate,
            session_info_update = header.session_info_update,
            num_vars = header.num_vars,
            num_buf = header.num_buf,
            buf_len = header.buf_len,
            "Parsed telemetry header"
        );

        Ok(header)
    }

    fn validate_fields(&self) -> Result<()> {
        let fields = [
            ("sessionInfoLen", self.session_info_len),
            ("sessionInfoOffset", self.session_info_offset),
            ("numVars", self.num_vars),
            ("varHeaderOffset", self.var_header_offset),
            ("numBuf", self.num_buf),
            ("bufLen", self.buf_len),
        ];
        for (name, value) in fields {
            if value < 0 {
                return Err(TelemetryError::malformed_header(format!(
                    "{name} is negative ({value})"
                )));
            }
        }

        if self.num_buf as usize > IRSDK_MAX_BUFS {
            return Err(TelemetryError::malformed_header(format!(
                "numBuf {} exceeds the maximum of {}",
                self.num_buf, IRSDK_MAX_BUFS
            )));
        }

        Ok(())
    }

    fn validate_spans(&self, len: usize) -> Result<()> {
        let buffer_array_end = VAR_BUF_OFFSET + self.num_buf as usize * VAR_BUF_STRIDE;
        check_span("buffer descriptor array", 0, buffer_array_end, len)?;

        check_span(
            "session info",
            self.session_info_offset as usize,
            self.session_info_len as usize,
            len,
        )?;

        let directory_len = (self.num_vars as usize)
            .checked_mul(crate::schema::variables::VAR_HEADER_STRIDE)
            .ok_or_else(|| TelemetryError::malformed_header("variable directory size overflows"))?;
        check_span("variable directory", self.var_header_offset as usize, directory_len, len)
    }

    /// "Ready" requires a published version and at least one variable.
    pub fn is_ready(&self) -> bool {
        self.version >= 1 && self.num_vars > 0
    }

    /// Returns true when the status bitfield reports a live simulator.
    pub fn is_connected(&self) -> bool {
        (self.status & IRSDK_STATUS_CONNECTED) != 0
    }

    /// Check if session info has been updated since `last_update`.
    pub fn session_info_changed(&self, last_update: i32) -> bool {
        self.session_info_update != last_update
    }

    /// Length of one data buffer or disk record.
    pub fn record_len(&self) -> usize {
        self.buf_len as usize
    }

    /// Byte range of the session info region.
    pub fn session_info_range(&self) -> std::ops::Range<usize> {
        let start = self.session_info_offset as usize;
        start..start + self.session_info_len as usize
    }
}

/// Re-read the writer-owned status field from live memory.
pub fn read_status(memory: &[u8]) -> Result<i32> {
    read_i32_le(memory, OFFSET_STATUS)
}

/// Re-read the session info update counter from live memory.
pub fn read_session_info_update(memory: &[u8]) -> Result<i32> {
    read_i32_le(memory, OFFSET_SESSION_INFO_UPDATE)
}

/// Read `count` buffer descriptors from the descriptor array at offset 48.
pub fn read_buffer_descriptors(memory: &[u8], count: usize) -> Result<Vec<BufferDescriptor>> {
    (0..count.min(IRSDK_MAX_BUFS))
        .map(|i| {
            let base = VAR_BUF_OFFSET + i * VAR_BUF_STRIDE;
            Ok(BufferDescriptor {
                tick_count: read_i32_le(memory, base)?,
                buf_offset: read_i32_le(memory, base + 4)?,
            })
        })
        .collect()
}

fn check_span(what: &str, start: usize, len: usize, total: usize) -> Result<()> {
    match start.checked_add(len) {
        Some(end) if end <= total => Ok(()),
        _ => Err(TelemetryError::malformed_header(format!(
            "{what} span {start}+{len} exceeds buffer of {total} bytes"
        ))),
    }
}

fn fixed<const N: usize>(data: &[u8], offset: usize) -> Result<[u8; N]> {
    offset
        .checked_add(N)
        .and_then(|end| data.get(offset..end))
        .and_then(|bytes| bytes.try_into().ok())
        .ok_or(TelemetryError::Memory { offset })
}

/// Little-endian `i32` at `offset`, bounds checked.
pub(crate) fn read_i32_le(data: &[u8], offset: usize) -> Result<i32> {
    fixed::<4>(data, offset).map(i32::from_le_bytes)
}

/// Little-endian `u32` at `offset`, bounds checked.
pub(crate) fn read_u32_le(data: &[u8], offset: usize) -> Result<u32> {
    fixed::<4>(data, offset).map(u32::from_le_bytes)
}

/// Little-endian `u64` at `offset`, bounds checked.
pub(crate) fn read_u64_le(data: &[u8], offset: usize) -> Result<u64> {
    fixed::<8>(data, offset).map(u64::from_le_bytes)
}

/// Little-endian `f32` at `offset`, bounds checked.
pub(crate) fn read_f32_le(data: &[u8], offset: usize) -> Result<f32> {
    fixed::<4>(data, offset).map(f32::from_le_bytes)
}

/// Little-endian `f64` at `offset`, bounds checked.
pub(crate) fn read_f64_le(data: &[u8], offset: usize) -> Result<f64> {
    fixed::<8>(data, offset).map(f64::from_le_bytes)
}
