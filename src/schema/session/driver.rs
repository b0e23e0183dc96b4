//! Driver information structures
//!
//! Typed view of the `DriverInfo` section: the local driver's car setup and
//! the entry list.

use super::lenient;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The `DriverInfo` section
#[derive(Default, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
#[serde(default)]
pub struct DriverInfo {
    /// Car index of the local driver
    pub driver_car_idx: Option<i32>,
    #[serde(rename = "DriverUserID")]
    pub driver_user_id: Option<i32>,
    pub pace_car_idx: Option<i32>,
    #[serde(rename = "DriverCarIdleRPM")]
    pub driver_car_idle_rpm: Option<f64>,
    pub driver_car_red_line: Option<f64>,
    pub driver_car_fuel_max_ltr: Option<f64>,
    pub driver_car_max_fuel_pct: Option<f64>,
    pub driver_car_gear_num_forward: Option<i32>,
    #[serde(rename = "DriverCarSLShiftRPM")]
    pub driver_car_sl_shift_rpm: Option<f64>,
    pub driver_car_est_lap_time: Option<f64>,
    #[serde(deserialize_with = "lenient::optional_string")]
    pub driver_setup_name: Option<String>,
    pub driver_setup_is_modified: Option<i32>,
    pub driver_incident_count: Option<i32>,
    pub driver_tires: Option<Vec<DriverTire>>,
    /// Every car in the session, including the pace car
    pub drivers: Vec<Driver>,
    #[serde(flatten)]
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub other: HashMap<String, serde_yaml_ng::Value>,
}

impl DriverInfo {
    /// Entry for car index `car_idx`.
    pub fn driver(&self, car_idx: i32) -> Option<&Driver> {
        self.drivers.iter().find(|d| d.car_idx == car_idx)
    }

    /// Entry of the local driver.
    pub fn local_driver(&self) -> Option<&Driver> {
        self.driver_car_idx.and_then(|idx| self.driver(idx))
    }
}

/// Tire compound available to the local car
#[derive(Default, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
#[serde(default)]
pub struct DriverTire {
    pub tire_index: Option<i32>,
    #[serde(deserialize_with = "lenient::optional_string")]
    pub tire_compound_type: Option<String>,
}

/// One entry of `DriverInfo.Drivers`
#[derive(Default, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
#[serde(default)]
pub struct Driver {
    pub car_idx: i32,
    #[serde(deserialize_with = "lenient::string")]
    pub user_name: String,
    #[serde(deserialize_with = "lenient::optional_string")]
    pub abbrev_name: Option<String>,
    #[serde(deserialize_with = "lenient::optional_string")]
    pub initials: Option<String>,
    #[serde(rename = "UserID")]
    pub user_id: Option<i32>,
    #[serde(rename = "TeamID")]
    pub team_id: Option<i32>,
    #[serde(deserialize_with = "lenient::optional_string")]
    pub team_name: Option<String>,
    /// Display car number; leading zeros are significant
    #[serde(deserialize_with = "lenient::optional_string")]
    pub car_number: Option<String>,
    pub car_number_raw: Option<i32>,
    #[serde(deserialize_with = "lenient::optional_string")]
    pub car_path: Option<String>,
    #[serde(rename = "CarClassID")]
    pub car_class_id: Option<i32>,
    #[serde(rename = "CarID")]
    pub car_id: Option<i32>,
    #[serde(deserialize_with = "lenient::optional_string")]
    pub car_screen_name: Option<String>,
    #[serde(deserialize_with = "lenient::optional_string")]
    pub car_class_short_name: Option<String>,
    pub car_is_pace_car: Option<i32>,
    #[serde(rename = "CarIsAI")]
    pub car_is_ai: Option<i32>,
    pub i_rating: Option<i32>,
    #[serde(deserialize_with = "lenient::optional_string")]
    pub lic_string: Option<String>,
    pub is_spectator: Option<i32>,
    /// Livery colours; may start with a comma in AI sessions
    #[serde(deserialize_with = "lenient::optional_string")]
    pub car_design_str: Option<String>,
    pub cur_driver_incident_count: Option<i32>,
    pub team_incident_count: Option<i32>,
    #[serde(flatten)]
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub other: HashMap<String, serde_yaml_ng::Value>,
}
