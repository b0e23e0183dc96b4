//! Weekend and track information
//!
//! Typed view of the `WeekendInfo` section: track details, weather and the
//! event configuration.

use super::lenient;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Weekend and track information
#[derive(Default, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
#[serde(default)]
pub struct WeekendInfo {
    #[serde(deserialize_with = "lenient::string")]
    pub track_name: String,
    #[serde(rename = "TrackID")]
    pub track_id: Option<i32>,
    /// Track length, e.g. `"6.93 km"`
    #[serde(deserialize_with = "lenient::string")]
    pub track_length: String,
    #[serde(deserialize_with = "lenient::optional_string")]
    pub track_length_official: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub track_display_name: String,
    #[serde(deserialize_with = "lenient::optional_string")]
    pub track_display_short_name: Option<String>,
    #[serde(deserialize_with = "lenient::optional_string")]
    pub track_config_name: Option<String>,
    #[serde(deserialize_with = "lenient::optional_string")]
    pub track_city: Option<String>,
    #[serde(deserialize_with = "lenient::optional_string")]
    pub track_country: Option<String>,
    pub track_num_turns: Option<i32>,
    #[serde(deserialize_with = "lenient::optional_string")]
    pub track_pit_speed_limit: Option<String>,
    /// Road course, oval, dirt...
    #[serde(deserialize_with = "lenient::optional_string")]
    pub track_type: Option<String>,
    #[serde(deserialize_with = "lenient::optional_string")]
    pub track_skies: Option<String>,
    #[serde(deserialize_with = "lenient::optional_string")]
    pub track_surface_temp: Option<String>,
    #[serde(deserialize_with = "lenient::optional_string")]
    pub track_air_temp: Option<String>,
    #[serde(rename = "SeriesID")]
    pub series_id: Option<i32>,
    #[serde(rename = "SeasonID")]
    pub season_id: Option<i32>,
    #[serde(rename = "SessionID")]
    pub session_id: Option<i32>,
    #[serde(rename = "SubSessionID")]
    pub sub_session_id: Option<i32>,
    #[serde(rename = "LeagueID")]
    pub league_id: Option<i32>,
    pub official: Option<i32>,
    pub race_week: Option<i32>,
    #[serde(deserialize_with = "lenient::optional_string")]
    pub event_type: Option<String>,
    #[serde(deserialize_with = "lenient::optional_string")]
    pub category: Option<String>,
    #[serde(deserialize_with = "lenient::optional_string")]
    pub sim_mode: Option<String>,
    pub team_racing: Option<i32>,
    pub num_car_classes: Option<i32>,
    pub num_car_types: Option<i32>,
    #[serde(deserialize_with = "lenient::optional_string")]
    pub build_version: Option<String>,
    pub telemetry_options: Option<TelemetryOptions>,
    pub weekend_options: Option<WeekendOptions>,
    /// Fields without a typed counterpart
    #[serde(flatten)]
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub other: HashMap<String, serde_yaml_ng::Value>,
}

/// Telemetry recording options
#[derive(Default, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
#[serde(default)]
pub struct TelemetryOptions {
    /// Where the simulator writes disk telemetry files
    #[serde(deserialize_with = "lenient::optional_string")]
    pub telemetry_disk_file: Option<String>,
}

/// Weekend session options
#[derive(Default, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
#[serde(default)]
pub struct WeekendOptions {
    pub num_starters: Option<i32>,
    #[serde(deserialize_with = "lenient::optional_string")]
    pub starting_grid: Option<String>,
    #[serde(deserialize_with = "lenient::optional_string")]
    pub qualify_scoring: Option<String>,
    pub standing_start: Option<i32>,
    #[serde(deserialize_with = "lenient::optional_string")]
    pub restarts: Option<String>,
    #[serde(deserialize_with = "lenient::optional_string")]
    pub time_of_day: Option<String>,
    #[serde(deserialize_with = "lenient::optional_string")]
    pub date: Option<String>,
    #[serde(deserialize_with = "lenient::optional_string")]
    pub incident_limit: Option<String>,
    #[serde(deserialize_with = "lenient::optional_string")]
    pub fast_repairs_limit: Option<String>,
    #[serde(flatten)]
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub other: HashMap<String, serde_yaml_ng::Value>,
}
