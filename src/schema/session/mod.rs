//! # Session Information
//!
//! The simulator publishes session metadata (track, weather, entry list,
//! session schedule, results) as a YAML-like document in its own region of
//! the telemetry image. The document is split into top-level sections such as
//! `WeekendInfo` or `DriverInfo`; each section is located, sanitized and
//! parsed on demand by the [`SessionInfoCache`].
//!
//! The raw text is not valid YAML: it is Windows-1252 encoded, null padded,
//! and carries unquoted free text in driver fields, so every section is
//! cleaned up before parsing.
//!
//! Decoded sections are [`serde_yaml_ng::Value`] trees. The most used ones
//! also have typed views ([`WeekendInfo`], [`SessionInfoData`],
//! [`DriverInfo`]) built with [`section_as`].

use crate::{Result, TelemetryError};
use serde::de::DeserializeOwned;

pub mod cache;
pub mod driver;
pub mod session_data;
pub mod weekend;

pub use cache::{SessionInfoCache, decode_section};
pub use driver::{Driver, DriverInfo, DriverTire};
pub use session_data::{Session, SessionInfoData};
pub use weekend::{TelemetryOptions, WeekendInfo, WeekendOptions};

/// Top-level section keys written by the simulator.
pub mod keys {
    pub const WEEKEND_INFO: &str = "WeekendInfo";
    pub const SESSION_INFO: &str = "SessionInfo";
    pub const QUALIFY_RESULTS_INFO: &str = "QualifyResultsInfo";
    pub const CAMERA_INFO: &str = "CameraInfo";
    pub const RADIO_INFO: &str = "RadioInfo";
    pub const DRIVER_INFO: &str = "DriverInfo";
    pub const SPLIT_TIME_INFO: &str = "SplitTimeInfo";
    pub const CAR_SETUP: &str = "CarSetup";
}

/// Deserialize a decoded section into a typed view.
pub fn section_as<T: DeserializeOwned>(key: &str, value: &serde_yaml_ng::Value) -> Result<T> {
    serde_yaml_ng::from_value(value.clone()).map_err(|e| TelemetryError::Parse {
        context: format!("typed view of session info section {key}"),
        details: e.to_string(),
    })
}

/// Deserializers that accept any scalar where text is expected.
///
/// Session info values are unquoted, so a team called `1987` or a track
/// length of `5` arrive as numbers.
pub(crate) mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_yaml_ng::Value;

    fn scalar_text(value: Value) -> Option<String> {
        match value {
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    pub fn string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        Ok(scalar_text(Value::deserialize(deserializer)?).unwrap_or_default())
    }

    pub fn optional_string<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<String>, D::Error> {
        Ok(scalar_text(Value::deserialize(deserializer)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Context, Result};

    const SESSION_YAML: &str = "---
WeekendInfo:
 TrackName: spa 2024 gp
 TrackID: 163
 TrackLength: 6.93 km
 TrackDisplayName: Circuit de Spa-Francorchamps
 TrackCity: Stavelot
 TrackNumTurns: 19
 SeriesID: 0
 Official: 0
 EventType: Test
 WeekendOptions:
  NumStarters: 0
  IncidentLimit: unlimited
 TelemetryOptions:
  TelemetryDiskFile: \"\"

SessionInfo:
 Sessions:
 - SessionNum: 0
   SessionLaps: unlimited
   SessionTime: unlimited
   SessionType: Offline Testing
   ResultsOfficial: 0
 - SessionNum: 1
   SessionLaps: 20
   SessionTime: 3600.0000 sec
   SessionType: Race

DriverInfo:
 DriverCarIdx: 1
 DriverCarRedLine: 8000.000
 Drivers:
 - CarIdx: 0
   UserName: Pace Car
   CarIsPaceCar: 1
   CarNumber: \"0\"
 - CarIdx: 1
   UserName: 1987
   TeamName: O'Neil \"Fast\" Racing
   CarNumber: \"007\"
   CarDesignStr: ,ff0000,000000
   IRating: 1350

";

    fn section(key: &str) -> Result<serde_yaml_ng::Value> {
        let raw = crate::yaml_utils::find_section(SESSION_YAML.as_bytes(), key)
            .with_context(|| format!("section {key} missing"))?;
        Ok(decode_section(key, raw)?)
    }

    #[test]
    fn weekend_info_typed_view() -> Result<()> {
        let weekend: WeekendInfo = section_as(keys::WEEKEND_INFO, &section(keys::WEEKEND_INFO)?)?;
        assert_eq!(weekend.track_name, "spa 2024 gp");
        assert_eq!(weekend.track_id, Some(163));
        assert_eq!(weekend.track_length, "6.93 km");
        assert_eq!(weekend.track_num_turns, Some(19));
        let options = weekend.weekend_options.context("weekend options")?;
        assert_eq!(options.incident_limit.as_deref(), Some("unlimited"));
        Ok(())
    }

    #[test]
    fn session_list_typed_view() -> Result<()> {
        let sessions: SessionInfoData = section_as(keys::SESSION_INFO, &section(keys::SESSION_INFO)?)?;
        assert_eq!(sessions.sessions.len(), 2);
        assert_eq!(sessions.session(0).context("session 0")?.lap_limit(), None);
        let race = sessions.session(1).context("session 1")?;
        assert_eq!(race.lap_limit(), Some(20));
        assert_eq!(race.session_type, "Race");
        Ok(())
    }

    #[test]
    fn driver_info_typed_view_keeps_free_text() -> Result<()> {
        let drivers: DriverInfo = section_as(keys::DRIVER_INFO, &section(keys::DRIVER_INFO)?)?;
        let me = drivers.local_driver().context("local driver")?;
        assert_eq!(me.user_name, "1987");
        assert_eq!(me.team_name.as_deref(), Some("O'Neil \"Fast\" Racing"));
        assert_eq!(me.car_number.as_deref(), Some("007"));
        assert_eq!(me.car_design_str.as_deref(), Some(",ff0000,000000"));
        assert_eq!(me.i_rating, Some(1350));
        assert_eq!(drivers.driver(0).and_then(|d| d.car_is_pace_car), Some(1));
        Ok(())
    }

    #[test]
    fn typed_view_of_wrong_shape_is_parse_error() {
        let value = serde_yaml_ng::Value::String("not a mapping".into());
        let result = section_as::<WeekendInfo>(keys::WEEKEND_INFO, &value);
        assert!(matches!(result, Err(TelemetryError::Parse { .. })));
    }
}
