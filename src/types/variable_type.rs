//! Telemetry variable type definitions

use crate::{Result, TelemetryError};
use serde::{Deserialize, Serialize};

/// Wire types a variable descriptor can declare.
/// Maps to the simulator SDK's `irsdk_VarType` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VariableType {
    /// 8-bit character (tag 0)
    Char,
    /// Boolean stored in one byte, nonzero is true (tag 1)
    Bool,
    /// 32-bit signed integer (tag 2)
    Int32,
    /// 32-bit unsigned integer, used for bitfields (tag 3)
    UInt32,
    /// 32-bit IEEE754 float (tag 4)
    Float32,
    /// 64-bit IEEE754 float (tag 5)
    Float64,
}

impl VariableType {
    /// Decode a wire type tag.
    pub fn from_tag(tag: i32) -> Result<Self> {
        match tag {
            0 => Ok(VariableType::Char),
            1 => Ok(VariableType::Bool),
            2 => Ok(VariableType::Int32),
            3 => Ok(VariableType::UInt32),
            4 => Ok(VariableType::Float32),
            5 => Ok(VariableType::Float64),
            other => Err(TelemetryError::malformed_header(format!("unknown variable type tag {other}"))),
        }
    }

    /// The wire tag for this type.
    pub const fn tag(&self) -> i32 {
        match self {
            VariableType::Char => 0,
            VariableType::Bool => 1,
            VariableType::Int32 => 2,
            VariableType::UInt32 => 3,
            VariableType::Float32 => 4,
            VariableType::Float64 => 5,
        }
    }

    /// Returns the size in bytes of one element of this type.
    pub const fn size(&self) -> usize {
        match self {
            VariableType::Char | VariableType::Bool => 1,
            VariableType::Int32 | VariableType::UInt32 | VariableType::Float32 => 4,
            VariableType::Float64 => 8,
        }
    }
}

/// Decoded telemetry value.
///
/// Variables with an element count of one decode to a scalar variant; any
/// other count decodes to [`Value::Array`] in wire order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Char(u8),
    Bool(bool),
    Int32(i32),
    UInt32(u32),
    Float32(f32),
    Float64(f64),
    Array(Vec<Value>),
}

impl Value {
    /// Numeric view of a scalar value. Arrays return `None`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Char(v) => Some(f64::from(*v)),
            Value::Bool(v) => Some(if *v { 1.0 } else { 0.0 }),
            Value::Int32(v) => Some(f64::from(*v)),
            Value::UInt32(v) => Some(f64::from(*v)),
            Value::Float32(v) => Some(f64::from(*v)),
            Value::Float64(v) => Some(*v),
            Value::Array(_) => None,
        }
    }

    /// Integer view of an integral scalar value.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Char(v) => Some(i64::from(*v)),
            Value::Bool(v) => Some(i64::from(*v)),
            Value::Int32(v) => Some(i64::from(*v)),
            Value::UInt32(v) => Some(i64::from(*v)),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Elements of an array value.
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }
}
