//! Telemetry source capability.
//!
//! The live client only needs two things from the platform: a scoped view of
//! the mapped memory region and a bounded wait on the writer's "data ready"
//! signal. [`TelemetrySource`] captures exactly that, so every decoding path
//! runs the same against the Windows shared-memory mapping, a dumped memory
//! image on disk, or an in-process [`MemorySource`] in tests.

use crate::{Result, TelemetryError};
use std::path::Path;
use std::sync::{Arc, Condvar, Mutex, RwLock};
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// Result of waiting for data updates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitResult {
    Signaled,
    Timeout,
}

/// A mapped telemetry region plus its data-ready signal.
pub trait TelemetrySource: Send + Sync {
    /// Run `f` over the current bytes of the mapped region.
    fn with_memory<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R;

    /// Block for at most `timeout` waiting for the writer to publish data.
    fn wait_for_data(&self, timeout: Duration) -> Result<WaitResult>;

    /// True when the region is a static image rather than a live writer.
    fn is_file_backed(&self) -> bool {
        false
    }
}

#[derive(Debug, Default)]
struct Signal {
    raised: Mutex<bool>,
    cond: Condvar,
}

/// In-process telemetry region.
///
/// Clones share the same bytes and signal. [`MemorySource::write`] plays the
/// external writer: it mutates the region and raises the auto-reset
/// data-ready signal.
#[derive(Debug, Clone)]
pub struct MemorySource {
    memory: Arc<RwLock<Vec<u8>>>,
    signal: Arc<Signal>,
    file_backed: bool,
}

impl MemorySource {
    pub fn new(memory: Vec<u8>) -> Self {
        Self { memory: Arc::new(RwLock::new(memory)), signal: Arc::default(), file_backed: false }
    }

    /// Load a dumped memory image. Waits on a file-backed source always
    /// succeed immediately.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let memory = std::fs::read(path)
            .map_err(|e| TelemetryError::file_error(path.to_path_buf(), e))?;
        debug!(path = %path.display(), len = memory.len(), "Loaded telemetry memory image");
        Ok(Self { file_backed: true, ..Self::new(memory) })
    }

    /// Mutate the region and raise the data-ready signal.
    pub fn write<R>(&self, f: impl FnOnce(&mut Vec<u8>) -> R) -> R {
        let result = {
            let mut memory = self.memory.write().unwrap_or_else(|e| e.into_inner());
            f(&mut memory)
        };
        self.notify();
        result
    }

    /// Raise the data-ready signal without changing the region.
    pub fn notify(&self) {
        let mut raised = self.signal.raised.lock().unwrap_or_else(|e| e.into_inner());
        *raised = true;
        self.signal.cond.notify_all();
    }

    /// Copy of the current region.
    pub fn snapshot(&self) -> Vec<u8> {
        self.with_memory(<[u8]>::to_vec)
    }
}

impl TelemetrySource for MemorySource {
    fn with_memory<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        let memory = self.memory.read().unwrap_or_else(|e| e.into_inner());
        f(&memory)
    }

    fn wait_for_data(&self, timeout: Duration) -> Result<WaitResult> {
        if self.file_backed {
            return Ok(WaitResult::Signaled);
        }

        let deadline = Instant::now() + timeout;
        let mut raised = self.signal.raised.lock().unwrap_or_else(|e| e.into_inner());
        while !*raised {
            let now = Instant::now();
            if now >= deadline {
                trace!("Wait timed out");
                return Ok(WaitResult::Timeout);
            }
            raised = self
                .signal
                .cond
                .wait_timeout(raised, deadline - now)
                .map(|(guard, _)| guard)
                .unwrap_or_else(|e| e.into_inner().0);
        }
        *raised = false;
        Ok(WaitResult::Signaled)
    }

    fn is_file_backed(&self) -> bool {
        self.file_backed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wait_times_out_without_writer() {
        let source = MemorySource::new(vec![0; 8]);
        let result = source.wait_for_data(Duration::from_millis(5)).unwrap();
        assert_eq!(result, WaitResult::Timeout);
    }

    #[test]
    fn write_signals_once() {
        let source = MemorySource::new(vec![0; 8]);
        source.write(|m| m[0] = 7);

        assert_eq!(source.wait_for_data(Duration::from_millis(5)).unwrap(), WaitResult::Signaled);
        assert_eq!(source.wait_for_data(Duration::from_millis(5)).unwrap(), WaitResult::Timeout);
        assert_eq!(source.with_memory(|m| m[0]), 7);
    }

    #[test]
    fn signal_from_another_thread_wakes_waiter() {
        let source = MemorySource::new(vec![0; 8]);
        let writer = source.clone();
        let handle = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(10));
            writer.write(|m| m[1] = 1);
        });

        let result = source.wait_for_data(Duration::from_secs(5)).unwrap();
        handle.join().unwrap();
        assert_eq!(result, WaitResult::Signaled);
        assert_eq!(source.with_memory(|m| m[1]), 1);
    }

    #[test]
    fn file_backed_source_is_always_signaled() {
        let dir = std::env::temp_dir().join(format!("pitlane-source-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("image.bin");
        std::fs::write(&path, [1u8, 2, 3]).unwrap();

        let source = MemorySource::from_file(&path).unwrap();
        assert!(source.is_file_backed());
        assert_eq!(source.wait_for_data(Duration::ZERO).unwrap(), WaitResult::Signaled);
        assert_eq!(source.snapshot(), vec![1, 2, 3]);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn missing_file_is_file_error() {
        let result = MemorySource::from_file("/definitely/not/here.bin");
        assert!(matches!(result, Err(TelemetryError::File { .. })));
    }
}
