//! Remote-control commands for the simulator.
//!
//! Commands travel as a registered window message broadcast to all top-level
//! windows. Each command packs into two machine words:
//!
//! ```text
//! wparam = command | var1 << 16
//! lparam = var2 | var3 << 16
//! ```
//!
//! [`BroadcastMessage::encode`] produces that pair; delivering it is the job of
//! a [`CommandSink`]. On Windows, [`crate::windows::BroadcastSender`] is the
//! real sink.

use crate::{Result, TelemetryError};
use tracing::debug;

/// Receives encoded command words.
pub trait CommandSink {
    /// Deliver one encoded command.
    fn send(&self, wparam: u32, lparam: u32) -> Result<()>;
}

/// Command identifiers in the low word of `wparam`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum CommandKind {
    CamSwitchPos = 0,
    CamSwitchNum = 1,
    CamSetState = 2,
    ReplaySetPlaySpeed = 3,
    ReplaySetPlayPosition = 4,
    ReplaySearch = 5,
    ReplaySetState = 6,
    ReloadTextures = 7,
    ChatCommand = 8,
    PitCommand = 9,
    TelemCommand = 10,
    FfbCommand = 11,
    ReplaySearchSessionTime = 12,
    VideoCapture = 13,
}

/// Camera tool state bits accepted by [`BroadcastMessage::CamSetState`].
pub mod camera_state {
    pub const CAM_TOOL_ACTIVE: u32 = 0x0004;
    pub const UI_HIDDEN: u32 = 0x0008;
    pub const USE_AUTO_SHOT_SELECTION: u32 = 0x0010;
    pub const USE_TEMPORARY_EDITS: u32 = 0x0020;
    pub const USE_KEY_ACCELERATION: u32 = 0x0040;
    pub const USE_KEY10X_ACCELERATION: u32 = 0x0080;
    pub const USE_MOUSE_AIM_MODE: u32 = 0x0100;
}

/// Special camera targets for [`BroadcastMessage::CamSwitchPos`].
pub mod camera_target {
    pub const AT_INCIDENT: i32 = -3;
    pub const AT_LEADER: i32 = -2;
    pub const AT_EXCITING: i32 = -1;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayPosition {
    Begin = 0,
    Current = 1,
    End = 2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplaySearch {
    ToStart = 0,
    ToEnd = 1,
    PrevSession = 2,
    NextSession = 3,
    PrevLap = 4,
    NextLap = 5,
    PrevFrame = 6,
    NextFrame = 7,
    PrevIncident = 8,
    NextIncident = 9,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatCommand {
    BeginChat = 1,
    Reply = 2,
    Cancel = 3,
}

/// Pit service requests; only honoured while the driver is in the car.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PitCommand {
    Clear = 0,
    Windshield = 1,
    /// Liters to add, or 0 for the current amount
    Fuel = 2,
    /// Pressure in kPa, or 0 for the current pressure
    LeftFront = 3,
    RightFront = 4,
    LeftRear = 5,
    RightRear = 6,
    ClearTires = 7,
    FastRepair = 8,
    ClearWindshield = 9,
    ClearFastRepair = 10,
    ClearFuel = 11,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TelemCommand {
    Stop = 0,
    Start = 1,
    /// Write the current file and start a new one
    Restart = 2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoCapture {
    TriggerScreenShot = 0,
    StartVideoCapture = 1,
    EndVideoCapture = 2,
    ToggleVideoCapture = 3,
    ShowVideoTimer = 4,
    HideVideoTimer = 5,
}

/// A command for the simulator.
#[derive(Debug, Clone, PartialEq)]
pub enum BroadcastMessage {
    /// Focus the car at race `position` (or a [`camera_target`]).
    CamSwitchPos { position: i32, group: i32, camera: i32 },
    /// Focus the car with display number `car_number`, e.g. `"007"`.
    CamSwitchNum { car_number: String, group: i32, camera: i32 },
    /// Set [`camera_state`] bits.
    CamSetState { state: u32 },
    ReplaySetPlaySpeed { speed: i32, slow_motion: bool },
    ReplaySetPlayPosition { mode: ReplayPosition, frame: i32 },
    ReplaySearch { mode: ReplaySearch },
    /// Clear the replay tape.
    ReplayEraseTape,
    ReloadAllTextures,
    ReloadCarTextures { car_idx: i32 },
    Chat { command: ChatCommand },
    /// Send chat macro 1..=15.
    ChatMacro { macro_num: i32 },
    Pit { command: PitCommand, value: i32 },
    Telemetry { command: TelemCommand },
    /// Maximum force for steering torque mapping, in Nm.
    FfbMaxForce { newton_meters: f32 },
    ReplaySearchSessionTime { session_num: i32, session_time_ms: i32 },
    VideoCapture { mode: VideoCapture },
}

fn pack(kind: CommandKind, var1: i32, var2: i32, var3: i32) -> (u32, u32) {
    let wparam = u32::from(kind as u16) | (var1 as u32).wrapping_shl(16);
    let lparam = (var2 as u32) | (var3 as u32).wrapping_shl(16);
    (wparam, lparam)
}

impl BroadcastMessage {
    pub fn kind(&self) -> CommandKind {
        match self {
            Self::CamSwitchPos { .. } => CommandKind::CamSwitchPos,
            Self::CamSwitchNum { .. } => CommandKind::CamSwitchNum,
            Self::CamSetState { .. } => CommandKind::CamSetState,
            Self::ReplaySetPlaySpeed { .. } => CommandKind::ReplaySetPlaySpeed,
            Self::ReplaySetPlayPosition { .. } => CommandKind::ReplaySetPlayPosition,
            Self::ReplaySearch { .. } => CommandKind::ReplaySearch,
            Self::ReplayEraseTape => CommandKind::ReplaySetState,
            Self::ReloadAllTextures | Self::ReloadCarTextures { .. } => CommandKind::ReloadTextures,
            Self::Chat { .. } | Self::ChatMacro { .. } => CommandKind::ChatCommand,
            Self::Pit { .. } => CommandKind::PitCommand,
            Self::Telemetry { .. } => CommandKind::TelemCommand,
            Self::FfbMaxForce { .. } => CommandKind::FfbCommand,
            Self::ReplaySearchSessionTime { .. } => CommandKind::ReplaySearchSessionTime,
            Self::VideoCapture { .. } => CommandKind::VideoCapture,
        }
    }

    /// Pack into `(wparam, lparam)`.
    pub fn encode(&self) -> Result<(u32, u32)> {
        let kind = self.kind();
        let words = match self {
            Self::CamSwitchPos { position, group, camera } => pack(kind, *position, *group, *camera),
            Self::CamSwitchNum { car_number, group, camera } => {
                pack(kind, pad_car_number(car_number)?, *group, *camera)
            }
            Self::CamSetState { state } => pack(kind, *state as i32, 0, 0),
            Self::ReplaySetPlaySpeed { speed, slow_motion } => {
                pack(kind, *speed, i32::from(*slow_motion), 0)
            }
            Self::ReplaySetPlayPosition { mode, frame } => pack(kind, *mode as i32, *frame, 0),
            Self::ReplaySearch { mode } => pack(kind, *mode as i32, 0, 0),
            Self::ReplayEraseTape => pack(kind, 0, 0, 0),
            Self::ReloadAllTextures => pack(kind, 0, 0, 0),
            Self::ReloadCarTextures { car_idx } => pack(kind, 1, *car_idx, 0),
            Self::Chat { command } => pack(kind, *command as i32, 0, 0),
            Self::ChatMacro { macro_num } => pack(kind, 0, *macro_num, 0),
            Self::Pit { command, value } => pack(kind, *command as i32, *value, 0),
            Self::Telemetry { command } => pack(kind, *command as i32, 0, 0),
            Self::FfbMaxForce { newton_meters } => {
                pack(kind, 0, (newton_meters * 65536.0) as i32, 0)
            }
            Self::ReplaySearchSessionTime { session_num, session_time_ms } => {
                pack(kind, *session_num, *session_time_ms, 0)
            }
            Self::VideoCapture { mode } => pack(kind, *mode as i32, 0, 0),
        };
        Ok(words)
    }

    /// Encode and hand to `sink`.
    pub fn send_to(&self, sink: &dyn CommandSink) -> Result<()> {
        let (wparam, lparam) = self.encode()?;
        debug!(command = ?self.kind(), wparam, lparam, "Sending broadcast command");
        sink.send(wparam, lparam)
    }
}

/// Encode a display car number for [`BroadcastMessage::CamSwitchNum`].
///
/// Leading zeros are significant (`"7"`, `"07"` and `"007"` are different
/// cars), so a number with `z` leading zeros and `d` significant digits is
/// sent as `n + 1000 * (d + z)`.
pub fn pad_car_number(car_number: &str) -> Result<i32> {
    let digits = car_number.trim();
    let number: i32 = digits.parse().map_err(|_| TelemetryError::TypeConversion {
        details: format!("car number {car_number:?} is not numeric"),
    })?;

    let mut zeros = digits.len() - digits.trim_start_matches('0').len();
    if zeros > 0 && zeros == digits.len() {
        zeros -= 1;
    }
    if zeros == 0 {
        return Ok(number);
    }

    let places = match number {
        n if n > 99 => 3,
        n if n > 9 => 2,
        _ => 1,
    };
    i32::try_from(zeros)
        .ok()
        .and_then(|zeros| zeros.checked_add(places))
        .and_then(|width| width.checked_mul(1000))
        .and_then(|prefix| prefix.checked_add(number))
        .ok_or_else(|| TelemetryError::TypeConversion {
            details: format!("car number {car_number:?} does not fit a camera switch message"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct RecordingSink {
        sent: RefCell<Vec<(u32, u32)>>,
    }

    impl CommandSink for RecordingSink {
        fn send(&self, wparam: u32, lparam: u32) -> Result<()> {
            self.sent.borrow_mut().push((wparam, lparam));
            Ok(())
        }
    }

    #[test]
    fn car_numbers_keep_leading_zeros() {
        assert_eq!(pad_car_number("7").unwrap(), 7);
        assert_eq!(pad_car_number("42").unwrap(), 42);
        assert_eq!(pad_car_number("07").unwrap(), 2007);
        assert_eq!(pad_car_number("007").unwrap(), 3007);
        assert_eq!(pad_car_number("012").unwrap(), 3012);
        assert_eq!(pad_car_number("0").unwrap(), 0);
        assert_eq!(pad_car_number("00").unwrap(), 2000);
    }

    #[test]
    fn oversized_car_number_is_rejected() {
        assert!(matches!(pad_car_number("02147483647"), Err(TelemetryError::TypeConversion { .. })));
        let message = BroadcastMessage::CamSwitchNum { car_number: "02147483647".into(), group: 1, camera: 0 };
        assert!(matches!(message.encode(), Err(TelemetryError::TypeConversion { .. })));
    }

    #[test]
    fn non_numeric_car_number_is_rejected() {
        assert!(matches!(pad_car_number("A1"), Err(TelemetryError::TypeConversion { .. })));
    }

    #[test]
    fn words_pack_command_and_arguments() {
        let message = BroadcastMessage::CamSwitchPos { position: 3, group: 2, camera: 1 };
        assert_eq!(message.encode().unwrap(), (3 << 16, 2 | 1 << 16));

        let message = BroadcastMessage::CamSwitchNum { car_number: "007".into(), group: 1, camera: 0 };
        assert_eq!(message.encode().unwrap(), (1 | 3007 << 16, 1));
    }

    #[test]
    fn negative_camera_target_fills_high_word() {
        let message = BroadcastMessage::CamSwitchPos {
            position: camera_target::AT_INCIDENT,
            group: 0,
            camera: 0,
        };
        let (wparam, _) = message.encode().unwrap();
        assert_eq!(wparam & 0xFFFF, 0);
        assert_eq!((wparam >> 16) as u16 as i16, -3);
    }

    #[test]
    fn wide_arguments_use_whole_lparam() {
        let message = BroadcastMessage::ReplaySetPlayPosition { mode: ReplayPosition::Begin, frame: 300_000 };
        assert_eq!(message.encode().unwrap(), (4, 300_000));

        let message = BroadcastMessage::FfbMaxForce { newton_meters: 1.5 };
        assert_eq!(message.encode().unwrap(), (11, 98_304));

        let message = BroadcastMessage::ReplaySearchSessionTime { session_num: 2, session_time_ms: 90_000 };
        assert_eq!(message.encode().unwrap(), (12 | 2 << 16, 90_000));
    }

    #[test]
    fn mode_commands_encode_mode_in_var1() {
        let cases = [
            (BroadcastMessage::ReplaySetPlaySpeed { speed: 2, slow_motion: true }, (3 | 2 << 16, 1)),
            (BroadcastMessage::ReplaySearch { mode: ReplaySearch::NextLap }, (5 | 5 << 16, 0)),
            (BroadcastMessage::ReplayEraseTape, (6, 0)),
            (BroadcastMessage::ReloadAllTextures, (7, 0)),
            (BroadcastMessage::ReloadCarTextures { car_idx: 12 }, (7 | 1 << 16, 12)),
            (BroadcastMessage::Chat { command: ChatCommand::Reply }, (8 | 2 << 16, 0)),
            (BroadcastMessage::ChatMacro { macro_num: 4 }, (8, 4)),
            (BroadcastMessage::Pit { command: PitCommand::Fuel, value: 20 }, (9 | 2 << 16, 20)),
            (BroadcastMessage::Telemetry { command: TelemCommand::Restart }, (10 | 2 << 16, 0)),
            (BroadcastMessage::VideoCapture { mode: VideoCapture::HideVideoTimer }, (13 | 5 << 16, 0)),
            (BroadcastMessage::CamSetState { state: camera_state::CAM_TOOL_ACTIVE }, (2 | 4 << 16, 0)),
        ];
        for (message, expected) in cases {
            assert_eq!(message.encode().unwrap(), expected, "{message:?}");
        }
    }

    #[test]
    fn send_to_delivers_encoded_words() {
        let sink = RecordingSink::default();
        BroadcastMessage::Telemetry { command: TelemCommand::Start }.send_to(&sink).unwrap();
        assert_eq!(sink.sent.borrow().as_slice(), &[(10 | 1 << 16, 0)]);
    }
}
