//! Core types for telemetry values.
//!
//! - [`VariableType`] is the closed set of wire types and their widths
//! - [`VariableDescriptor`] is one entry of the variable directory
//! - [`Value`] is a decoded scalar or array
//! - [`VarData`] parses a descriptor's bytes into a concrete Rust type
//!
//! ```rust
//! use pitlane::types::{VarData, VariableDescriptor, VariableType};
//!
//! let rpm = VariableDescriptor {
//!     name: "RPM".to_string(),
//!     var_type: VariableType::Float32,
//!     offset: 0,
//!     count: 1,
//!     count_as_time: false,
//!     description: "Engine rpm".to_string(),
//!     unit: "revs/min".to_string(),
//! };
//!
//! let record = 4500.0_f32.to_le_bytes();
//! assert_eq!(f32::from_bytes(&record, &rpm).unwrap(), 4500.0);
//! ```

mod schema;
mod var_data;
mod variable_type;

pub use schema::VariableDescriptor;
pub use var_data::VarData;
pub use variable_type::{Value, VariableType};
