//! Session list structures
//!
//! Typed view of the `SessionInfo` section.

use super::lenient;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The `SessionInfo` section
#[derive(Default, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
#[serde(default)]
pub struct SessionInfoData {
    /// Practice, qualifying and race sessions of the event
    pub sessions: Vec<Session>,
    #[serde(flatten)]
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub other: HashMap<String, serde_yaml_ng::Value>,
}

impl SessionInfoData {
    /// Session with number `session_num`.
    pub fn session(&self, session_num: i32) -> Option<&Session> {
        self.sessions.iter().find(|s| s.session_num == session_num)
    }
}

/// One entry of `SessionInfo.Sessions`
#[derive(Default, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
#[serde(default)]
pub struct Session {
    pub session_num: i32,
    /// Lap count or `"unlimited"`
    #[serde(deserialize_with = "lenient::string")]
    pub session_laps: String,
    /// e.g. `"1800.0000 sec"` or `"unlimited"`
    #[serde(deserialize_with = "lenient::string")]
    pub session_time: String,
    pub session_num_laps_to_avg: Option<i32>,
    /// Practice, Lone Qualify, Race...
    #[serde(deserialize_with = "lenient::string")]
    pub session_type: String,
    #[serde(deserialize_with = "lenient::optional_string")]
    pub session_name: Option<String>,
    #[serde(deserialize_with = "lenient::optional_string")]
    pub session_track_rubber_state: Option<String>,
    pub session_skipped: Option<i32>,
    pub results_positions: Option<Vec<serde_yaml_ng::Value>>,
    pub results_fastest_lap: Option<Vec<serde_yaml_ng::Value>>,
    pub results_average_lap_time: Option<f64>,
    pub results_num_caution_flags: Option<i32>,
    pub results_num_lead_changes: Option<i32>,
    pub results_laps_complete: Option<i32>,
    pub results_official: Option<i32>,
    #[serde(flatten)]
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub other: HashMap<String, serde_yaml_ng::Value>,
}

impl Session {
    /// Lap limit, or `None` when the session is unlimited.
    pub fn lap_limit(&self) -> Option<u32> {
        self.session_laps.trim().parse().ok()
    }
}
