//! Variable directory parsing.
//!
//! The simulator publishes `numVars` fixed-stride variable descriptors at
//! `varHeaderOffset`. Each descriptor is 144 bytes on the wire:
//!
//! ```text
//! offset  field
//!      0  type         i32 wire type tag
//!      4  offset       i32 byte offset within a buffer/record
//!      8  count        i32 element count
//!     12  countAsTime  bool
//!     16  name         char[32], null padded
//!     48  desc         char[64], null padded
//!    112  unit         char[32], null padded
//! ```
//!
//! The directory keeps descriptors in wire order and indexes them by name for
//! O(1) lookup. Duplicate names are tolerated: the last occurrence wins the
//! name lookup and a warning is logged, but every descriptor stays in the
//! ordered list.
//!
//! A descriptor whose `offset + count * width` exceeds `bufLen`, or whose type
//! tag is unknown, rejects the whole directory with
//! [`TelemetryError::MalformedHeader`]. Reading such a variable would run into
//! the next buffer, so a partial directory is never returned.

use crate::schema::header::{Header, read_i32_le};
use crate::types::{VariableDescriptor, VariableType};
use crate::{Result, TelemetryError};
use std::collections::HashMap;
use tracing::{debug, trace, warn};

/// Wire size of one variable descriptor.
pub const VAR_HEADER_STRIDE: usize = 144;

const IRSDK_MAX_STRING: usize = 32;
const IRSDK_MAX_DESC: usize = 64;
const NAME_OFFSET: usize = 16;
const DESC_OFFSET: usize = 48;
const UNIT_OFFSET: usize = 112;

/// Ordered, name-indexed list of variable descriptors.
#[derive(Debug, Clone, Default)]
pub struct VariableDirectory {
    descriptors: Vec<VariableDescriptor>,
    by_name: HashMap<String, usize>,
    record_len: usize,
}

impl VariableDirectory {
    /// Build the directory described by `header` from `memory`.
    pub fn parse(memory: &[u8], header: &Header) -> Result<Self> {
        debug!(
            num_vars = header.num_vars,
            var_header_offset = header.var_header_offset,
            buf_len = header.buf_len,
            "Building variable directory"
        );

        let base = header.var_header_offset as usize;
        let record_len = header.record_len();
        let count = header.num_vars as usize;

        let mut descriptors = Vec::with_capacity(count);
        for i in 0..count {
            let at = base + i * VAR_HEADER_STRIDE;
            let raw = memory
                .get(at..at + VAR_HEADER_STRIDE)
                .ok_or_else(|| TelemetryError::malformed_header(format!(
                    "variable descriptor {i} at {at} lies outside the buffer"
                )))?;
            let desc = parse_descriptor(raw)?;
            if desc.end() > record_len {
                return Err(TelemetryError::malformed_header(format!(
                    "variable '{}' spans {}..{} past bufLen {}",
                    desc.name,
                    desc.offset,
                    desc.end(),
                    record_len
                )));
            }
            trace!(name = %desc.name, offset = desc.offset, count = desc.count, "Parsed variable descriptor");
            descriptors.push(desc);
        }

        Ok(Self::from_descriptors(descriptors, record_len))
    }

    /// Index an already decoded descriptor list.
    pub fn from_descriptors(descriptors: Vec<VariableDescriptor>, record_len: usize) -> Self {
        let mut by_name = HashMap::with_capacity(descriptors.len());
        for (position, desc) in descriptors.iter().enumerate() {
            if let Some(previous) = by_name.insert(desc.name.clone(), position) {
                warn!(
                    name = %desc.name,
                    previous_position = previous,
                    position,
                    "Duplicate variable name found, last occurrence wins"
                );
            }
        }

        debug!(count = descriptors.len(), unique = by_name.len(), "Variable directory built");
        Self { descriptors, by_name, record_len }
    }

    /// O(1) lookup by name.
    pub fn get(&self, name: &str) -> Option<&VariableDescriptor> {
        self.by_name.get(name).map(|&i| &self.descriptors[i])
    }

    /// Lookup that reports a missing name as [`TelemetryError::UnknownVariable`].
    pub fn require(&self, name: &str) -> Result<&VariableDescriptor> {
        self.get(name).ok_or_else(|| TelemetryError::unknown_variable(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Descriptors in directory order, duplicates included.
    pub fn descriptors(&self) -> &[VariableDescriptor] {
        &self.descriptors
    }

    /// Names in directory order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.descriptors.iter().map(|d| d.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Length of one buffer or record the offsets are relative to.
    pub fn record_len(&self) -> usize {
        self.record_len
    }
}

fn parse_descriptor(raw: &[u8]) -> Result<VariableDescriptor> {
    let tag = read_i32_le(raw, 0)?;
    let offset = read_i32_le(raw, 4)?;
    let count = read_i32_le(raw, 8)?;
    let name = c_string_to_string(&raw[NAME_OFFSET..NAME_OFFSET + IRSDK_MAX_STRING]);

    let var_type = VariableType::from_tag(tag)
        .map_err(|_| TelemetryError::malformed_header(format!("variable '{name}' has unknown type tag {tag}")))?;

    if offset < 0 || count < 0 {
        return Err(TelemetryError::malformed_header(format!(
            "variable '{name}' has negative offset ({offset}) or count ({count})"
        )));
    }

    Ok(VariableDescriptor {
        name,
        var_type,
        offset: offset as usize,
        count: count as usize,
        count_as_time: raw[12] != 0,
        description: c_string_to_string(&raw[DESC_OFFSET..DESC_OFFSET + IRSDK_MAX_DESC]),
        unit: c_string_to_string(&raw[UNIT_OFFSET..UNIT_OFFSET + IRSDK_MAX_STRING]),
    })
}

/// Convert null-padded C string bytes to a Rust `String`.
fn c_string_to_string(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{TelemetryImageBuilder, VarSpec};
    use proptest::prelude::*;

    #[test]
    fn c_string_conversion_works() {
        assert_eq!(c_string_to_string(b"RPM\0\0\0\0"), "RPM");
        assert_eq!(c_string_to_string(b"Speed"), "Speed");
        assert_eq!(c_string_to_string(b"\0\0\0\0"), "");
    }

    #[test]
    fn descriptors_keep_wire_order_and_metadata() {
        let image = TelemetryImageBuilder::new(16)
            .variable(VarSpec::new("Speed", VariableType::Float32, 0, 1).unit("m/s").desc("GPS speed"))
            .variable(VarSpec::new("Gear", VariableType::Int32, 4, 1))
            .variable(VarSpec::new("Lap", VariableType::Int32, 8, 1).count_as_time(true))
            .build_live();

        let header = Header::parse(&image).unwrap();
        let directory = VariableDirectory::parse(&image, &header).unwrap();

        assert_eq!(directory.names().collect::<Vec<_>>(), vec!["Speed", "Gear", "Lap"]);
        let speed = directory.require("Speed").unwrap();
        assert_eq!(speed.var_type, VariableType::Float32);
        assert_eq!(speed.unit, "m/s");
        assert_eq!(speed.description, "GPS speed");
        assert!(directory.get("Lap").unwrap().count_as_time);
        assert_eq!(directory.record_len(), 16);
    }

    #[test]
    fn duplicate_names_last_occurrence_wins() {
        let image = TelemetryImageBuilder::new(16)
            .variable(VarSpec::new("Speed", VariableType::Float32, 0, 1))
            .variable(VarSpec::new("Speed", VariableType::Float32, 8, 1))
            .build_live();

        let header = Header::parse(&image).unwrap();
        let directory = VariableDirectory::parse(&image, &header).unwrap();

        assert_eq!(directory.len(), 2);
        assert_eq!(directory.get("Speed").unwrap().offset, 8);
    }

    #[test]
    fn descriptor_past_buf_len_rejects_directory() {
        let image = TelemetryImageBuilder::new(8)
            .variable(VarSpec::new("Ok", VariableType::Int32, 0, 1))
            .variable(VarSpec::new("Wide", VariableType::Float32, 4, 3))
            .build_live();

        let header = Header::parse(&image).unwrap();
        let err = VariableDirectory::parse(&image, &header).unwrap_err();
        assert!(matches!(err, TelemetryError::MalformedHeader { .. }));
        assert!(err.to_string().contains("Wide"), "{err}");
    }

    #[test]
    fn unknown_type_tag_rejects_directory() {
        let mut image = TelemetryImageBuilder::new(8)
            .variable(VarSpec::new("Odd", VariableType::Int32, 0, 1))
            .build_live();
        let header = Header::parse(&image).unwrap();
        let at = header.var_header_offset as usize;
        image[at..at + 4].copy_from_slice(&9_i32.to_le_bytes());

        let err = VariableDirectory::parse(&image, &header).unwrap_err();
        assert!(err.to_string().contains("unknown type tag 9"), "{err}");
    }

    #[test]
    fn missing_name_is_unknown_variable() {
        let directory = VariableDirectory::default();
        assert!(matches!(
            directory.require("Nope"),
            Err(TelemetryError::UnknownVariable { name }) if name == "Nope"
        ));
    }

    proptest! {
        #[test]
        fn every_accepted_descriptor_fits_in_buf_len(
            buf_len in 4usize..64,
            offset in 0usize..64,
            count in 1usize..8,
        ) {
            let image = TelemetryImageBuilder::new(buf_len)
                .variable(VarSpec::new("X", VariableType::Float32, offset, count))
                .build_live();
            let header = Header::parse(&image).unwrap();

            match VariableDirectory::parse(&image, &header) {
                Ok(directory) => {
                    let desc = directory.require("X").unwrap();
                    prop_assert!(desc.offset + desc.count * 4 <= buf_len);
                }
                Err(err) => {
                    prop_assert!(offset + count * 4 > buf_len);
                    prop_assert!(matches!(err, TelemetryError::MalformedHeader { .. }), "unexpected error kind");
                }
            }
        }
    }
}
