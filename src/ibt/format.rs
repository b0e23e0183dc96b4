//! Disk recording layout.
//!
//! A recording starts with the same header as live shared memory, declares a
//! single buffer descriptor, and stores a 32-byte sub-header directly after
//! that descriptor:
//!
//! ```text
//! offset  field
//!    112  sessionStartDate    u64, unix seconds
//!    120  sessionStartTime    f64, session seconds
//!    128  sessionEndTime      f64, session seconds
//!    136  sessionLapCount     i32
//!    140  sessionRecordCount  i32
//! ```
//!
//! The descriptor's offset is the start of the record array; each record is
//! `bufLen` bytes and is laid out exactly like one live data buffer.

use crate::schema::header::{read_f64_le, read_i32_le, read_u64_le};
use crate::{Result, TelemetryError};
use tracing::trace;

/// Offset of the disk sub-header.
pub const DISK_SUB_HEADER_OFFSET: usize = 112;

/// Size of the disk sub-header.
pub const DISK_SUB_HEADER_LEN: usize = 32;

/// Metadata about the recorded session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiskSubHeader {
    pub start_date: u64,
    pub start_time: f64,
    pub end_time: f64,
    pub lap_count: i32,
    pub record_count: i32,
}

impl DiskSubHeader {
    /// Decode the sub-header of a recording.
    pub fn parse(memory: &[u8]) -> Result<Self> {
        let end = DISK_SUB_HEADER_OFFSET + DISK_SUB_HEADER_LEN;
        if memory.len() < end {
            return Err(TelemetryError::malformed_header(format!(
                "recording of {} bytes ends before the disk sub-header at {}..{}",
                memory.len(),
                DISK_SUB_HEADER_OFFSET,
                end
            )));
        }

        let at = DISK_SUB_HEADER_OFFSET;
        let sub_header = Self {
            start_date: read_u64_le(memory, at)?,
            start_time: read_f64_le(memory, at + 8)?,
            end_time: read_f64_le(memory, at + 16)?,
            lap_count: read_i32_le(memory, at + 24)?,
            record_count: read_i32_le(memory, at + 28)?,
        };
        trace!(?sub_header, "Parsed disk sub-header");
        Ok(sub_header)
    }

    /// Recorded session length in seconds.
    pub fn duration(&self) -> f64 {
        (self.end_time - self.start_time).max(0.0)
    }

    /// Declared record count, negative values read as zero.
    pub fn declared_records(&self) -> usize {
        self.record_count.max(0) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::put;

    fn sub_header_bytes(record_count: i32) -> Vec<u8> {
        let mut memory = vec![0u8; 144];
        put(&mut memory, 112, 1_700_000_000_u64.to_le_bytes());
        put(&mut memory, 120, 12.5_f64.to_le_bytes());
        put(&mut memory, 128, 72.5_f64.to_le_bytes());
        put(&mut memory, 136, 4_i32.to_le_bytes());
        put(&mut memory, 140, record_count.to_le_bytes());
        memory
    }

    #[test]
    fn decodes_every_field() {
        let sub = DiskSubHeader::parse(&sub_header_bytes(3600)).unwrap();
        assert_eq!(sub.start_date, 1_700_000_000);
        assert_eq!(sub.start_time, 12.5);
        assert_eq!(sub.end_time, 72.5);
        assert_eq!(sub.lap_count, 4);
        assert_eq!(sub.record_count, 3600);
        assert_eq!(sub.duration(), 60.0);
    }

    #[test]
    fn negative_record_count_reads_as_empty() {
        let sub = DiskSubHeader::parse(&sub_header_bytes(-1)).unwrap();
        assert_eq!(sub.declared_records(), 0);
    }

    #[test]
    fn truncated_file_is_malformed() {
        let err = DiskSubHeader::parse(&[0u8; 120]).unwrap_err();
        assert!(matches!(err, TelemetryError::MalformedHeader { .. }));
    }
}
