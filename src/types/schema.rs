//! Telemetry variable descriptor

use serde::{Deserialize, Serialize};

use super::VariableType;

/// One entry of the variable directory.
///
/// Offsets are relative to the start of a data buffer (live) or a record
/// (disk); both share the same layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableDescriptor {
    /// Variable name as published by the simulator
    pub name: String,
    /// Declared wire type
    pub var_type: VariableType,
    /// Byte offset within a buffer or record
    pub offset: usize,
    /// Number of elements (1 for scalar, otherwise an array)
    pub count: usize,
    /// Whether the simulator treats the element count as elapsed time
    pub count_as_time: bool,
    /// Human-readable description
    pub description: String,
    /// Units of measurement (e.g., "m/s", "C", "N*m")
    pub unit: String,
}

impl VariableDescriptor {
    /// Total bytes occupied by all elements.
    pub fn byte_len(&self) -> usize {
        self.var_type.size() * self.count
    }

    /// Exclusive end offset within a record.
    pub fn end(&self) -> usize {
        self.offset + self.byte_len()
    }

    /// Byte offset of element `index`.
    pub fn element_offset(&self, index: usize) -> usize {
        self.offset + index * self.var_type.size()
    }

    pub fn is_array(&self) -> bool {
        self.count != 1
    }
}
