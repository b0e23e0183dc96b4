//! Variable data parsing trait and implementations

use super::{VariableDescriptor, VariableType};
use crate::schema::header::{read_f32_le, read_f64_le, read_i32_le, read_u32_le};
use crate::{Result, TelemetryError};

/// Trait for types that can be parsed from binary telemetry data.
///
/// Implementations check the declared wire type before reading, so asking for
/// an `f32` from an `Int32` variable fails with
/// [`TelemetryError::TypeConversion`] instead of reinterpreting bytes.
pub trait VarData: Sized {
    /// Parse element `index` of the variable from a buffer or record.
    fn from_element(data: &[u8], desc: &VariableDescriptor, index: usize) -> Result<Self>;

    /// Parse the variable from a buffer or record.
    fn from_bytes(data: &[u8], desc: &VariableDescriptor) -> Result<Self> {
        Self::from_element(data, desc, 0)
    }
}

fn expect_type(desc: &VariableDescriptor, expected: VariableType) -> Result<()> {
    if desc.var_type != expected {
        return Err(TelemetryError::TypeConversion {
            details: format!(
                "Variable '{}' is {:?}, requested {:?}",
                desc.name, desc.var_type, expected
            ),
        });
    }
    Ok(())
}

fn read_u8(data: &[u8], offset: usize) -> Result<u8> {
    data.get(offset).copied().ok_or(TelemetryError::Memory { offset })
}

fn read_bool(data: &[u8], offset: usize) -> Result<bool> {
    read_u8(data, offset).map(|b| b != 0)
}

macro_rules! scalar_var_data {
    ($ty:ty, $expected:expr, $read:expr) => {
        impl VarData for $ty {
            fn from_element(data: &[u8], desc: &VariableDescriptor, index: usize) -> Result<Self> {
                expect_type(desc, $expected)?;
                $read(data, desc.element_offset(index))
            }
        }
    };
}

scalar_var_data!(u8, VariableType::Char, read_u8);
scalar_var_data!(bool, VariableType::Bool, read_bool);
scalar_var_data!(i32, VariableType::Int32, read_i32_le);
scalar_var_data!(u32, VariableType::UInt32, read_u32_le);
scalar_var_data!(f32, VariableType::Float32, read_f32_le);
scalar_var_data!(f64, VariableType::Float64, read_f64_le);

// Array support for VarData
impl<T: VarData> VarData for Vec<T> {
    fn from_element(_data: &[u8], desc: &VariableDescriptor, _index: usize) -> Result<Self> {
        Err(TelemetryError::TypeConversion {
            details: format!("Element of '{}' cannot be read as a nested array", desc.name),
        })
    }

    fn from_bytes(data: &[u8], desc: &VariableDescriptor) -> Result<Self> {
        (0..desc.count).map(|i| T::from_element(data, desc, i)).collect()
    }
}

impl VarData for super::Value {
    fn from_element(data: &[u8], desc: &VariableDescriptor, index: usize) -> Result<Self> {
        crate::extract::extract_element(data, desc, index)
    }

    fn from_bytes(data: &[u8], desc: &VariableDescriptor) -> Result<Self> {
        crate::extract::extract(data, desc)
    }
}
