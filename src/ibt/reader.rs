//! Disk recording reader.
//!
//! A [`DiskClient`] memory-maps a recording and gives random and sequential
//! access to its records through the same directory and extractor the live
//! client uses.
//!
//! ```rust,no_run
//! use pitlane::DiskClient;
//!
//! fn lap_speeds() -> pitlane::Result<()> {
//!     let disk = DiskClient::open("session.ibt")?;
//!     println!("{} records", disk.record_count()?);
//!
//!     let speeds: Vec<f32> = disk.column_as("Speed")?;
//!     println!("top speed {:?}", speeds.iter().copied().fold(f32::MIN, f32::max));
//!
//!     let mut cursor = disk.cursor()?;
//!     while cursor.advance() {
//!         let values = cursor.get(&["SessionTime", "Lap"])?;
//!         println!("{values:?}");
//!     }
//!     Ok(())
//! }
//! ```

use super::format::DiskSubHeader;
use crate::config::ClientOptions;
use crate::extract::extract;
use crate::schema::header::Header;
use crate::schema::session::{SessionInfoCache, section_as};
use crate::schema::variables::VariableDirectory;
use crate::types::{Value, VarData};
use crate::yaml_utils::region_text;
use crate::{Result, TelemetryError};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Bytes backing an open recording.
enum Backing {
    Mapped(memmap2::Mmap),
    Owned(Vec<u8>),
}

impl Backing {
    fn as_bytes(&self) -> &[u8] {
        match self {
            Backing::Mapped(m) => m,
            Backing::Owned(v) => v,
        }
    }
}

struct Opened {
    backing: Backing,
    header: Header,
    disk_header: DiskSubHeader,
    directory: Arc<VariableDirectory>,
    records_start: usize,
    record_len: usize,
    record_count: usize,
}

impl Opened {
    fn record(&self, index: usize) -> Result<&[u8]> {
        if index >= self.record_count {
            return Err(TelemetryError::IndexOutOfRange { index, len: self.record_count });
        }
        let start = self.records_start + index * self.record_len;
        self.backing
            .as_bytes()
            .get(start..start + self.record_len)
            .ok_or(TelemetryError::Memory { offset: start })
    }
}

/// Reader for a recorded telemetry file.
pub struct DiskClient {
    opened: Option<Opened>,
    path: Option<PathBuf>,
    cache: SessionInfoCache,
}

impl std::fmt::Debug for DiskClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiskClient")
            .field("path", &self.path)
            .field("open", &self.opened.is_some())
            .field("record_count", &self.opened.as_ref().map(|o| o.record_count))
            .finish()
    }
}

impl DiskClient {
    /// Memory-map the recording at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with(path, &ClientOptions::default())
    }

    pub fn open_with<P: AsRef<Path>>(path: P, options: &ClientOptions) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|e| TelemetryError::file_error(path.clone(), e))?;
        // SAFETY: the mapping is read-only; a recording modified underneath
        // us yields garbage values, never unsoundness in the bounds checks.
        let mmap = unsafe { memmap2::Mmap::map(&file) }
            .map_err(|e| TelemetryError::file_error(path.clone(), e))?;

        info!(path = %path.display(), len = mmap.len(), "Opened telemetry recording");
        Self::load(Backing::Mapped(mmap), Some(path), options)
    }

    /// Read a recording held in memory.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        Self::load(Backing::Owned(data), None, &ClientOptions::default())
    }

    fn load(backing: Backing, path: Option<PathBuf>, options: &ClientOptions) -> Result<Self> {
        let bytes = backing.as_bytes();
        let header = Header::parse(bytes)?;
        let disk_header = DiskSubHeader::parse(bytes)?;
        let directory = Arc::new(VariableDirectory::parse(bytes, &header)?);

        let records_start = header
            .buffers
            .first()
            .map(|b| b.offset())
            .ok_or_else(|| TelemetryError::malformed_header("recording declares no record buffer"))?;
        let record_len = header.record_len();

        let declared = disk_header.declared_records();
        let available = bytes.len().saturating_sub(records_start);
        let record_count = match available.checked_div(record_len) {
            Some(fits) if fits < declared => {
                warn!(declared, fits, "Recording is shorter than its record count, truncating");
                fits
            }
            _ => declared,
        };

        debug!(
            num_vars = directory.len(),
            record_len,
            record_count,
            laps = disk_header.lap_count,
            "Indexed telemetry recording"
        );

        Ok(Self {
            opened: Some(Opened {
                backing,
                header,
                disk_header,
                directory,
                records_start,
                record_len,
                record_count,
            }),
            path,
            cache: SessionInfoCache::new(options.background_session_decode),
        })
    }

    /// Release the file mapping. Every later call fails with
    /// [`TelemetryError::NotInitialized`].
    pub fn close(&mut self) {
        if self.opened.take().is_some() {
            debug!(path = ?self.path, "Closed telemetry recording");
        }
        self.cache.close();
        self.path = None;
    }

    pub fn is_open(&self) -> bool {
        self.opened.is_some()
    }

    fn opened(&self) -> Result<&Opened> {
        self.opened.as_ref().ok_or(TelemetryError::NotInitialized)
    }

    pub fn header(&self) -> Result<&Header> {
        Ok(&self.opened()?.header)
    }

    pub fn disk_header(&self) -> Result<&DiskSubHeader> {
        Ok(&self.opened()?.disk_header)
    }

    /// Number of readable records.
    pub fn record_count(&self) -> Result<usize> {
        Ok(self.opened()?.record_count)
    }

    /// Path of a mapped recording; `None` for in-memory data or after close.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn variables(&self) -> Result<Arc<VariableDirectory>> {
        Ok(self.opened()?.directory.clone())
    }

    /// Variable names in directory order.
    pub fn variable_names(&self) -> Result<Vec<String>> {
        Ok(self.opened()?.directory.names().map(str::to_string).collect())
    }

    /// Raw bytes of record `index`.
    pub fn record(&self, index: usize) -> Result<&[u8]> {
        self.opened()?.record(index)
    }

    /// Values of `keys` in record `index`, in the order requested.
    pub fn get(&self, index: usize, keys: &[&str]) -> Result<Vec<Value>> {
        let opened = self.opened()?;
        let record = opened.record(index)?;
        keys.iter()
            .map(|key| extract(record, opened.directory.require(key)?))
            .collect()
    }

    /// Value of `key` in record `index`.
    pub fn get_one(&self, index: usize, key: &str) -> Result<Value> {
        let opened = self.opened()?;
        let desc = opened.directory.require(key)?;
        extract(opened.record(index)?, desc)
    }

    /// Value of `key` in record `index` as a concrete type.
    pub fn get_as<T: VarData>(&self, index: usize, key: &str) -> Result<T> {
        let opened = self.opened()?;
        let desc = opened.directory.require(key)?;
        T::from_bytes(opened.record(index)?, desc)
    }

    /// Value of `key` in the final record.
    pub fn latest(&self, key: &str) -> Result<Value> {
        let count = self.record_count()?;
        match count.checked_sub(1) {
            Some(last) => self.get_one(last, key),
            None => Err(TelemetryError::IndexOutOfRange { index: 0, len: 0 }),
        }
    }

    /// `key` across every record, in record order.
    pub fn column(&self, key: &str) -> Result<Vec<Value>> {
        self.column_as(key)
    }

    /// `key` across every record as a concrete type.
    pub fn column_as<T: VarData>(&self, key: &str) -> Result<Vec<T>> {
        let opened = self.opened()?;
        let desc = opened.directory.require(key)?;
        (0..opened.record_count)
            .map(|i| T::from_bytes(opened.record(i)?, desc))
            .collect()
    }

    /// Columns for several variables at once, keyed by name.
    pub fn columns(&self, keys: &[&str]) -> Result<HashMap<String, Vec<Value>>> {
        keys.iter()
            .map(|key| Ok((key.to_string(), self.column(key)?)))
            .collect()
    }

    /// Forward cursor positioned on the first record.
    pub fn cursor(&self) -> Result<RecordCursor<'_>> {
        let opened = self.opened()?;
        Ok(RecordCursor { opened, index: 0 })
    }

    /// Every record in order, starting from the first.
    pub fn records(&self) -> Result<Records<'_>> {
        let opened = self.opened()?;
        Ok(Records { opened, next: 0 })
    }

    /// Session info section `key`, decoded once per change of its bytes.
    pub fn session_info(&self, key: &str) -> Result<Option<Arc<serde_yaml_ng::Value>>> {
        let opened = self.opened()?;
        let range = opened.header.session_info_range();
        let region = opened
            .backing
            .as_bytes()
            .get(range.clone())
            .ok_or(TelemetryError::Memory { offset: range.start })?;
        Ok(self.cache.get(key, opened.header.session_info_update, region))
    }

    /// Session info section `key` deserialized into `T`.
    pub fn session_section<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        self.session_info(key)?.map(|value| section_as(key, &value)).transpose()
    }

    /// The whole session info region as text.
    pub fn session_info_text(&self) -> Result<String> {
        let opened = self.opened()?;
        let range = opened.header.session_info_range();
        opened
            .backing
            .as_bytes()
            .get(range.clone())
            .map(region_text)
            .ok_or(TelemetryError::Memory { offset: range.start })
    }
}

/// Position within a recording, bounded to `[0, record_count)`.
#[derive(Clone, Copy)]
pub struct RecordCursor<'a> {
    opened: &'a Opened,
    index: usize,
}

impl std::fmt::Debug for RecordCursor<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordCursor")
            .field("index", &self.index)
            .field("record_count", &self.opened.record_count)
            .finish()
    }
}

impl<'a> RecordCursor<'a> {
    pub fn index(&self) -> usize {
        self.index
    }

    /// Whether [`advance`](Self::advance) would move.
    pub fn has_more(&self) -> bool {
        self.index + 1 < self.opened.record_count
    }

    /// Step to the next record. Returns `false` at the last record.
    pub fn advance(&mut self) -> bool {
        if !self.has_more() {
            return false;
        }
        self.index += 1;
        true
    }

    /// Jump to record `index`.
    pub fn seek(&mut self, index: usize) -> Result<()> {
        if index >= self.opened.record_count {
            return Err(TelemetryError::IndexOutOfRange { index, len: self.opened.record_count });
        }
        self.index = index;
        Ok(())
    }

    /// Values of `keys` in the current record.
    pub fn get(&self, keys: &[&str]) -> Result<Vec<Value>> {
        self.view()?.get_many(keys)
    }

    /// Value of `key` in the current record.
    pub fn get_one(&self, key: &str) -> Result<Value> {
        self.view()?.get(key)
    }

    /// The current record.
    pub fn view(&self) -> Result<RecordView<'a>> {
        Ok(RecordView {
            directory: &self.opened.directory,
            index: self.index,
            data: self.opened.record(self.index)?,
        })
    }
}

/// One record of a recording.
#[derive(Debug, Clone, Copy)]
pub struct RecordView<'a> {
    directory: &'a VariableDirectory,
    index: usize,
    data: &'a [u8],
}

impl<'a> RecordView<'a> {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn bytes(&self) -> &'a [u8] {
        self.data
    }

    pub fn get(&self, key: &str) -> Result<Value> {
        extract(self.data, self.directory.require(key)?)
    }

    pub fn get_as<T: VarData>(&self, key: &str) -> Result<T> {
        T::from_bytes(self.data, self.directory.require(key)?)
    }

    pub fn get_many(&self, keys: &[&str]) -> Result<Vec<Value>> {
        keys.iter().map(|key| self.get(key)).collect()
    }
}

/// Iterator over every record of a recording.
pub struct Records<'a> {
    opened: &'a Opened,
    next: usize,
}

impl<'a> Iterator for Records<'a> {
    type Item = RecordView<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.next;
        let data = self.opened.record(index).ok()?;
        self.next += 1;
        Some(RecordView { directory: &self.opened.directory, index, data })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.opened.record_count.saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Records<'_> {}
