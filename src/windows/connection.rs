//! Simulator shared memory mapping and data-ready event.

use crate::source::{TelemetrySource, WaitResult};
use crate::{Result, TelemetryError};
use std::ptr::NonNull;
use std::time::Duration;
use tracing::{debug, trace};
use windows::Win32::Foundation::{CloseHandle, HANDLE, WAIT_OBJECT_0, WAIT_TIMEOUT};
use windows::Win32::System::Memory::{
    FILE_MAP_READ, MEMORY_MAPPED_VIEW_ADDRESS, MapViewOfFile, OpenFileMappingW, UnmapViewOfFile,
};
use windows::Win32::System::Threading::{
    OpenEventW, SYNCHRONIZATION_ACCESS_RIGHTS, WaitForSingleObject,
};
use windows::core::PCWSTR;

const IRSDK_MEMMAPFILENAME: &str = "Local\\IRSDKMemMapFileName";
const IRSDK_DATAVALIDEVENTNAME: &str = "Local\\IRSDKDataValidEvent";
/// Size of the shared segment the simulator creates
pub const IRSDK_MEMMAPFILESIZE: usize = 780 * 1024;
/// SYNCHRONIZE access right
const SYNCHRONIZE: u32 = 0x0010_0000;

/// Read-only view of the simulator's shared memory plus its data-ready event.
pub struct Connection {
    mapping: HANDLE,
    base: NonNull<u8>,
    event: HANDLE,
}

impl Connection {
    /// Open the named mapping and event. Fails when the simulator is not
    /// running.
    pub fn try_connect() -> Result<Self> {
        trace!("Opening simulator shared memory");

        let mapping = unsafe {
            let name = wide_string(IRSDK_MEMMAPFILENAME);
            OpenFileMappingW(FILE_MAP_READ.0, false, PCWSTR::from_raw(name.as_ptr()))
                .map_err(|e| TelemetryError::windows_api_error("OpenFileMappingW", e))?
        };

        let base = unsafe {
            let view = MapViewOfFile(mapping, FILE_MAP_READ, 0, 0, IRSDK_MEMMAPFILESIZE);
            match NonNull::new(view.Value as *mut u8) {
                Some(base) => base,
                None => {
                    let err = windows::core::Error::from_thread();
                    let _ = CloseHandle(mapping);
                    return Err(TelemetryError::windows_api_error("MapViewOfFile", err));
                }
            }
        };

        let event = unsafe {
            let name = wide_string(IRSDK_DATAVALIDEVENTNAME);
            OpenEventW(SYNCHRONIZATION_ACCESS_RIGHTS(SYNCHRONIZE), false, PCWSTR::from_raw(name.as_ptr()))
        };
        let event = match event {
            Ok(event) => event,
            Err(e) => {
                unsafe {
                    let _ = UnmapViewOfFile(MEMORY_MAPPED_VIEW_ADDRESS { Value: base.as_ptr() as *mut _ });
                    let _ = CloseHandle(mapping);
                }
                return Err(TelemetryError::windows_api_error("OpenEventW", e));
            }
        };

        debug!(size = IRSDK_MEMMAPFILESIZE, "Mapped simulator shared memory");
        Ok(Self { mapping, base, event })
    }

    fn memory(&self) -> &[u8] {
        // SAFETY: the view stays mapped for the lifetime of `self` and spans
        // IRSDK_MEMMAPFILESIZE bytes.
        unsafe { std::slice::from_raw_parts(self.base.as_ptr(), IRSDK_MEMMAPFILESIZE) }
    }
}

impl TelemetrySource for Connection {
    fn with_memory<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        f(self.memory())
    }

    fn wait_for_data(&self, timeout: Duration) -> Result<WaitResult> {
        let ms = wait_millis(timeout);
        let result = unsafe { WaitForSingleObject(self.event, ms) };

        match result {
            WAIT_OBJECT_0 => Ok(WaitResult::Signaled),
            WAIT_TIMEOUT => {
                trace!(timeout_ms = ms, "Data-ready wait timed out");
                Ok(WaitResult::Timeout)
            }
            _ => {
                let err = windows::core::Error::from_thread();
                Err(TelemetryError::windows_api_error("WaitForSingleObject", err))
            }
        }
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        unsafe {
            let addr = MEMORY_MAPPED_VIEW_ADDRESS { Value: self.base.as_ptr() as *mut _ };
            let _ = UnmapViewOfFile(addr);
            let _ = CloseHandle(self.mapping);
            let _ = CloseHandle(self.event);
        }
        debug!("Released simulator shared memory");
    }
}

// SAFETY: the handles are kernel objects and the view is only read.
unsafe impl Send for Connection {}
unsafe impl Sync for Connection {}

/// Null-terminated UTF-16 copy of `s`.
/// Bounded wait in milliseconds; `u32::MAX` would mean INFINITE.
fn wait_millis(timeout: Duration) -> u32 {
    u32::try_from(timeout.as_millis()).unwrap_or(u32::MAX).min(u32::MAX - 1)
}

pub(crate) fn wide_string(s: &str) -> Vec<u16> {
    use std::ffi::OsStr;
    use std::os::windows::ffi::OsStrExt;
    OsStr::new(s).encode_wide().chain(std::iter::once(0)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn huge_timeouts_stay_bounded() {
        assert_eq!(wait_millis(Duration::from_millis(16)), 16);
        assert_eq!(wait_millis(Duration::from_secs(u64::MAX)), u32::MAX - 1);
        assert_eq!(wait_millis(Duration::from_millis(u64::from(u32::MAX))), u32::MAX - 1);
    }

    #[test]
    fn wide_string_is_null_terminated() {
        let wide = wide_string("Local\\X");
        assert_eq!(wide.len(), 8);
        assert_eq!(wide.last(), Some(&0));
    }

    #[test]
    #[ignore = "simulator_required"]
    fn connects_to_running_simulator() {
        let connection = Connection::try_connect().expect("simulator should be running");
        let header = connection.with_memory(crate::schema::header::Header::parse).unwrap();
        assert!(header.is_ready());
    }
}
