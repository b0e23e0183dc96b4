//! Value extraction.
//!
//! Decodes one variable out of a data buffer or disk record. The bytes are
//! read at the descriptor's offset relative to the start of `record`; no unit
//! conversion is applied.

use crate::schema::header::{read_f32_le, read_f64_le, read_i32_le, read_u32_le};
use crate::schema::variables::VariableDirectory;
use crate::types::{Value, VariableDescriptor, VariableType};
use crate::{Result, TelemetryError};

/// Decode every element of `desc` from `record`.
///
/// Returns a bare scalar when the element count is one and a
/// [`Value::Array`] in wire order otherwise.
pub fn extract(record: &[u8], desc: &VariableDescriptor) -> Result<Value> {
    if desc.end() > record.len() {
        return Err(TelemetryError::memory_access_error(desc.offset));
    }

    if desc.count == 1 {
        return extract_element(record, desc, 0);
    }

    (0..desc.count)
        .map(|i| extract_element(record, desc, i))
        .collect::<Result<Vec<_>>>()
        .map(Value::Array)
}

/// Decode a single element of an array variable.
pub fn extract_element(record: &[u8], desc: &VariableDescriptor, index: usize) -> Result<Value> {
    if index >= desc.count {
        return Err(TelemetryError::IndexOutOfRange { index, len: desc.count });
    }

    let offset = desc.element_offset(index);
    let value = match desc.var_type {
        VariableType::Char => Value::Char(byte_at(record, offset)?),
        VariableType::Bool => Value::Bool(byte_at(record, offset)? != 0),
        VariableType::Int32 => Value::Int32(read_i32_le(record, offset)?),
        VariableType::UInt32 => Value::UInt32(read_u32_le(record, offset)?),
        VariableType::Float32 => Value::Float32(read_f32_le(record, offset)?),
        VariableType::Float64 => Value::Float64(read_f64_le(record, offset)?),
    };
    Ok(value)
}

/// Look up `name` in `directory` and decode it from `record`.
pub fn extract_named(directory: &VariableDirectory, record: &[u8], name: &str) -> Result<Value> {
    let desc = directory.require(name)?;
    extract(record, desc)
}

fn byte_at(record: &[u8], offset: usize) -> Result<u8> {
    record.get(offset).copied().ok_or(TelemetryError::Memory { offset })
}
