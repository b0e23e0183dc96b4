//! Broadcast window message delivery.

use super::connection::wide_string;
use crate::commands::CommandSink;
use crate::{Result, TelemetryError};
use std::sync::OnceLock;
use tracing::trace;
use windows::Win32::Foundation::{LPARAM, WPARAM};
use windows::Win32::UI::WindowsAndMessaging::{
    HWND_BROADCAST, RegisterWindowMessageW, SendNotifyMessageW,
};
use windows::core::PCWSTR;

const IRSDK_BROADCASTMSGNAME: &str = "IRSDK_BROADCASTMSG";

/// Sends commands to the simulator as a broadcast window message.
#[derive(Debug, Default)]
pub struct BroadcastSender {
    message_id: OnceLock<u32>,
}

impl BroadcastSender {
    pub fn new() -> Self {
        Self::default()
    }

    fn message_id(&self) -> Result<u32> {
        if let Some(id) = self.message_id.get() {
            return Ok(*id);
        }

        let name = wide_string(IRSDK_BROADCASTMSGNAME);
        let id = unsafe { RegisterWindowMessageW(PCWSTR::from_raw(name.as_ptr())) };
        if id == 0 {
            let err = windows::core::Error::from_thread();
            return Err(TelemetryError::windows_api_error("RegisterWindowMessageW", err));
        }
        Ok(*self.message_id.get_or_init(|| id))
    }
}

impl CommandSink for BroadcastSender {
    fn send(&self, wparam: u32, lparam: u32) -> Result<()> {
        let id = self.message_id()?;
        trace!(id, wparam, lparam, "SendNotifyMessageW");
        unsafe {
            SendNotifyMessageW(
                HWND_BROADCAST,
                id,
                WPARAM(wparam as usize),
                LPARAM(lparam as i32 as isize),
            )
        }
        .map_err(|e| TelemetryError::windows_api_error("SendNotifyMessageW", e))
    }
}
