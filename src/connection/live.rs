//! Live telemetry client.
//!
//! [`LiveClient`] polls a [`TelemetrySource`]: callers wait for the writer's
//! data-ready signal with [`LiveClient::wait_for_data`], then read variables
//! and session info. Ordinary reads come from the settled buffer (see
//! [`crate::buffer`]); [`LiveClient::freeze`] pins a private copy of the most
//! recent buffer for reads that must come from a single tick.
//!
//! ```rust,no_run
//! use pitlane::{ClientOptions, LiveClient};
//!
//! # fn main() -> pitlane::Result<()> {
//! let mut client = LiveClient::from_test_file("session.bin", ClientOptions::default())?;
//! if client.is_initialized() {
//!     client.freeze()?;
//!     let speed: f32 = client.get_as("Speed")?;
//!     let gear: i32 = client.get_as("Gear")?;
//!     client.unfreeze();
//!     println!("{speed} m/s in gear {gear}");
//! }
//! # Ok(())
//! # }
//! ```

use super::link::LinkState;
use crate::buffer::{FrozenBuffer, buffer_slice, select_settled};
use crate::commands::{BroadcastMessage, CommandSink};
use crate::config::ClientOptions;
use crate::extract::{extract, extract_element};
use crate::schema::header::{Header, read_buffer_descriptors, read_session_info_update, read_status};
use crate::schema::session::{SessionInfoCache, section_as};
use crate::schema::variables::VariableDirectory;
use crate::source::{MemorySource, TelemetrySource, WaitResult};
use crate::types::{Value, VarData, VariableDescriptor};
use crate::yaml_utils::region_text;
use crate::{Result, TelemetryError};
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, trace};

/// Variable whose presence drives connection smoothing.
const SESSION_NUM: &str = "SessionNum";

/// Source used by [`LiveClient::connect`] on this platform.
#[cfg(windows)]
pub type PlatformSource = crate::windows::Connection;
#[cfg(not(windows))]
pub type PlatformSource = MemorySource;

/// State that exists only between a successful startup and shutdown.
#[derive(Debug)]
struct Attached {
    header: Header,
    directory: Arc<VariableDirectory>,
    frozen: Option<FrozenBuffer>,
    cache: SessionInfoCache,
}

/// Polled reader over a live telemetry source.
#[derive(Debug)]
pub struct LiveClient<S: TelemetrySource> {
    source: Option<S>,
    options: ClientOptions,
    attached: Option<Attached>,
    link: LinkState,
}

impl LiveClient<PlatformSource> {
    /// Map the simulator's shared memory and start up.
    ///
    /// The client is returned even when the simulator has not published data
    /// yet; check [`LiveClient::is_initialized`] or call
    /// [`LiveClient::startup`] again.
    #[cfg(windows)]
    pub fn connect(options: ClientOptions) -> Result<Self> {
        info!("Connecting to simulator telemetry");
        let mut client = Self::new(crate::windows::Connection::try_connect()?, options);
        client.startup()?;
        Ok(client)
    }

    /// Live telemetry needs the Windows shared memory mapping.
    #[cfg(not(windows))]
    pub fn connect(_options: ClientOptions) -> Result<Self> {
        Err(TelemetryError::unsupported_platform("Live telemetry", "Windows"))
    }
}

impl LiveClient<MemorySource> {
    /// Use a dumped memory image (see [`LiveClient::dump_memory`]) as the
    /// live segment.
    pub fn from_test_file<P: AsRef<Path>>(path: P, options: ClientOptions) -> Result<Self> {
        let mut client = Self::new(MemorySource::from_file(path)?, options);
        client.startup()?;
        Ok(client)
    }
}

impl<S: TelemetrySource> LiveClient<S> {
    pub fn new(source: S, options: ClientOptions) -> Self {
        Self { source: Some(source), options, attached: None, link: LinkState::default() }
    }

    /// Wait for data, then decode the header.
    ///
    /// Returns `Ok(false)` when the wait times out or the header is not
    /// ready yet. A header or variable directory that fails its bounds
    /// checks is an error and leaves the client uninitialized.
    pub fn startup(&mut self) -> Result<bool> {
        let source = self.source.as_ref().ok_or(TelemetryError::NotInitialized)?;

        let timeout = self.options.data_ready_timeout();
        if source.wait_for_data(timeout)? == WaitResult::Timeout {
            debug!(timeout_ms = self.options.data_ready_timeout_ms, "No data-ready signal during startup");
            return Ok(false);
        }

        let header = source.with_memory(Header::parse)?;
        if !header.is_ready() {
            debug!(ver = header.version, num_vars = header.num_vars, "Header not ready");
            return Ok(false);
        }
        let directory = Arc::new(source.with_memory(|m| VariableDirectory::parse(m, &header))?);

        info!(
            ver = header.version,
            tick_rate = header.tick_rate,
            num_vars = header.num_vars,
            num_buf = header.num_buf,
            file_backed = source.is_file_backed(),
            "Live telemetry initialized"
        );
        self.attached = Some(Attached {
            header,
            directory,
            frozen: None,
            cache: SessionInfoCache::new(self.options.background_session_decode),
        });
        Ok(true)
    }

    pub fn is_initialized(&self) -> bool {
        self.attached.is_some()
    }

    pub fn is_ready(&self) -> bool {
        self.attached.as_ref().is_some_and(|a| a.header.is_ready())
    }

    /// Connection status, smoothed over session transitions.
    pub fn is_connected(&mut self) -> bool {
        let (Some(source), Some(attached)) = (&self.source, &self.attached) else {
            return false;
        };

        let status_connected = match source.with_memory(read_status) {
            Ok(status) => status & crate::schema::header::IRSDK_STATUS_CONNECTED != 0,
            Err(_) => return false,
        };
        let session_num_present = attached.directory.contains(SESSION_NUM);

        let next = self.link.step(status_connected, session_num_present, source.is_file_backed());
        if next != self.link {
            debug!(from = ?self.link, to = ?next, "Link state changed");
            self.link = next;
        }
        self.link.is_connected(status_connected)
    }

    /// Bounded wait for fresh data; `Ok(false)` means none arrived.
    pub fn wait_for_data(&self) -> Result<bool> {
        let source = self.source.as_ref().ok_or(TelemetryError::NotInitialized)?;
        Ok(source.wait_for_data(self.options.data_ready_timeout())? == WaitResult::Signaled)
    }

    fn attached(&self) -> Result<(&S, &Attached)> {
        match (&self.source, &self.attached) {
            (Some(source), Some(attached)) => Ok((source, attached)),
            _ => Err(TelemetryError::NotInitialized),
        }
    }

    pub fn header(&self) -> Result<&Header> {
        Ok(&self.attached()?.1.header)
    }

    /// Variable directory, built at startup and fixed until shutdown.
    pub fn variables(&self) -> Result<Arc<VariableDirectory>> {
        Ok(self.attached()?.1.directory.clone())
    }

    /// Variable names in directory order.
    pub fn variable_names(&self) -> Result<Vec<String>> {
        Ok(self.variables()?.names().map(str::to_string).collect())
    }

    /// Run `f` over the buffer reads should use: the frozen snapshot if
    /// one is held, otherwise the settled buffer.
    fn with_record<R>(
        &self,
        name: &str,
        f: impl FnOnce(&[u8], &VariableDescriptor) -> Result<R>,
    ) -> Result<R> {
        let (source, attached) = self.attached()?;
        let desc = attached.directory.require(name)?;

        if let Some(frozen) = &attached.frozen {
            return f(frozen.data(), desc);
        }

        source.with_memory(|memory| {
            let buffers = read_buffer_descriptors(memory, attached.header.num_buf as usize)?;
            let selected = select_settled(&buffers)
                .ok_or_else(|| TelemetryError::malformed_header("header lists no data buffers"))?;
            trace!(name, tick = selected.tick_count, "Reading settled buffer");
            let record = buffer_slice(memory, &selected, attached.header.record_len())?;
            f(record, desc)
        })
    }

    /// Current value of variable `name`.
    pub fn get(&self, name: &str) -> Result<Value> {
        self.with_record(name, extract)
    }

    /// Current value of variable `name` as a concrete type.
    pub fn get_as<T: VarData>(&self, name: &str) -> Result<T> {
        self.with_record(name, T::from_bytes)
    }

    /// Element `index` of array variable `name`.
    pub fn get_element(&self, name: &str, index: usize) -> Result<Value> {
        self.with_record(name, |record, desc| extract_element(record, desc, index))
    }

    /// Snapshot the most recent buffer; reads use it until [`unfreeze`].
    ///
    /// Replaces any snapshot already held.
    ///
    /// [`unfreeze`]: LiveClient::unfreeze
    pub fn freeze(&mut self) -> Result<()> {
        self.unfreeze();
        let (source, attached) = self.attached()?;

        let timeout = self.options.freeze_timeout();
        if source.wait_for_data(timeout)? == WaitResult::Timeout {
            return Err(TelemetryError::no_data(timeout));
        }

        let num_buf = attached.header.num_buf as usize;
        let record_len = attached.header.record_len();
        let frozen = source.with_memory(|memory| {
            let buffers = read_buffer_descriptors(memory, num_buf)?;
            FrozenBuffer::capture(memory, &buffers, record_len)
        })?;
        debug!(tick = frozen.tick_count(), "Froze latest buffer");

        if let Some(attached) = self.attached.as_mut() {
            attached.frozen = Some(frozen);
        }
        Ok(())
    }

    pub fn unfreeze(&mut self) {
        if let Some(attached) = self.attached.as_mut() {
            if attached.frozen.take().is_some() {
                trace!("Released frozen buffer");
            }
        }
    }

    pub fn is_frozen(&self) -> bool {
        self.attached.as_ref().is_some_and(|a| a.frozen.is_some())
    }

    /// Decoded session info section `key`, or `None` if it has never been
    /// available.
    pub fn session_info(&self, key: &str) -> Result<Option<Arc<serde_yaml_ng::Value>>> {
        let (source, attached) = self.attached()?;
        let range = attached.header.session_info_range();
        source.with_memory(|memory| {
            let generation = read_session_info_update(memory)?;
            let region = memory
                .get(range.clone())
                .ok_or(TelemetryError::Memory { offset: range.start })?;
            Ok(attached.cache.get(key, generation, region))
        })
    }

    /// Session info section `key` deserialized into `T`.
    pub fn session_section<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        self.session_info(key)?.map(|value| section_as(key, &value)).transpose()
    }

    /// The writer's session info update counter.
    pub fn session_info_update(&self) -> Result<i32> {
        let (source, _) = self.attached()?;
        source.with_memory(read_session_info_update)
    }

    /// Generation at which section `key` was last decoded.
    pub fn session_info_update_for(&self, key: &str) -> Option<i32> {
        self.attached.as_ref().and_then(|a| a.cache.update_for(key))
    }

    /// The whole session info region as text.
    pub fn session_info_text(&self) -> Result<String> {
        let (source, attached) = self.attached()?;
        let range = attached.header.session_info_range();
        source.with_memory(|memory| {
            memory
                .get(range.clone())
                .map(region_text)
                .ok_or(TelemetryError::Memory { offset: range.start })
        })
    }

    /// Write the raw telemetry image to `path`, for later use with
    /// [`LiveClient::from_test_file`].
    pub fn dump_memory<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let (source, _) = self.attached()?;
        let path = path.as_ref();
        source
            .with_memory(|memory| std::fs::write(path, memory))
            .map_err(|e| TelemetryError::file_error(path.to_path_buf(), e))?;
        info!(path = %path.display(), "Dumped telemetry memory");
        Ok(())
    }

    /// Send a remote-control command through `sink`.
    pub fn send_command(&self, sink: &dyn CommandSink, message: &BroadcastMessage) -> Result<()> {
        self.attached()?;
        message.send_to(sink)
    }

    /// Release the source and drop every cached descriptor and value.
    pub fn shutdown(&mut self) {
        if let Some(attached) = self.attached.take() {
            attached.cache.close();
        }
        self.source = None;
        self.link = LinkState::default();
        info!("Live telemetry shut down");
    }
}
