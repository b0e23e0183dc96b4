//! Synthetic telemetry images for tests and benchmarks.
//!
//! [`TelemetryImageBuilder`] lays out a header, variable directory, session
//! info region and data buffers byte-for-byte the way the simulator does, so
//! tests can drive the decoders without a running simulator or recorded
//! files.

#![cfg(any(test, feature = "benchmark"))]

use crate::ibt::format::{DISK_SUB_HEADER_LEN, DISK_SUB_HEADER_OFFSET};
use crate::schema::header::{VAR_BUF_OFFSET, VAR_BUF_STRIDE};
use crate::schema::variables::VAR_HEADER_STRIDE;
use crate::types::VariableType;

/// Built images place the directory right after the disk sub-header.
const DIRECTORY_OFFSET: usize = DISK_SUB_HEADER_OFFSET + DISK_SUB_HEADER_LEN;

/// Raw header values, written verbatim by [`write_header`].
#[derive(Debug, Clone, Default)]
pub struct HeaderFields {
    pub version: i32,
    pub status: i32,
    pub tick_rate: i32,
    pub session_info_update: i32,
    pub session_info_len: i32,
    pub session_info_offset: i32,
    pub num_vars: i32,
    pub var_header_offset: i32,
    pub num_buf: i32,
    pub buf_len: i32,
    /// `(tick_count, buf_offset)` per buffer descriptor
    pub buffers: Vec<(i32, i32)>,
}

/// Write `fields` at the start of `memory` using the wire layout.
pub fn write_header(memory: &mut [u8], fields: &HeaderFields) {
    let scalars = [
        fields.version,
        fields.status,
        fields.tick_rate,
        fields.session_info_update,
        fields.session_info_len,
        fields.session_info_offset,
        fields.num_vars,
        fields.var_header_offset,
        fields.num_buf,
        fields.buf_len,
    ];
    for (i, value) in scalars.iter().enumerate() {
        put(memory, i * 4, value.to_le_bytes());
    }
    for (i, (tick, offset)) in fields.buffers.iter().enumerate() {
        let base = VAR_BUF_OFFSET + i * VAR_BUF_STRIDE;
        put(memory, base, tick.to_le_bytes());
        put(memory, base + 4, offset.to_le_bytes());
    }
}

/// Copy `bytes` into `buf` at `offset`.
pub fn put<const N: usize>(buf: &mut [u8], offset: usize, bytes: [u8; N]) {
    buf[offset..offset + N].copy_from_slice(&bytes);
}

/// Overwrite the session info region and bump the update counter, the way
/// the simulator publishes a new session info generation.
pub fn write_session_info(memory: &mut [u8], text: &str, update: i32) {
    let len = i32::from_le_bytes([memory[16], memory[17], memory[18], memory[19]]) as usize;
    let offset = i32::from_le_bytes([memory[20], memory[21], memory[22], memory[23]]) as usize;
    let region = &mut memory[offset..offset + len];
    region.fill(0);
    let bytes = text.as_bytes();
    region[..bytes.len()].copy_from_slice(bytes);
    put(memory, 12, update.to_le_bytes());
}

/// Set the tick count of buffer descriptor `index`.
pub fn write_tick(memory: &mut [u8], index: usize, tick: i32) {
    put(memory, VAR_BUF_OFFSET + index * VAR_BUF_STRIDE, tick.to_le_bytes());
}

/// A variable descriptor to place in the directory.
#[derive(Debug, Clone)]
pub struct VarSpec {
    name: String,
    var_type: VariableType,
    offset: usize,
    count: usize,
    count_as_time: bool,
    desc: String,
    unit: String,
}

impl VarSpec {
    pub fn new(name: &str, var_type: VariableType, offset: usize, count: usize) -> Self {
        Self {
            name: name.to_string(),
            var_type,
            offset,
            count,
            count_as_time: false,
            desc: String::new(),
            unit: String::new(),
        }
    }

    pub fn unit(mut self, unit: &str) -> Self {
        self.unit = unit.to_string();
        self
    }

    pub fn desc(mut self, desc: &str) -> Self {
        self.desc = desc.to_string();
        self
    }

    pub fn count_as_time(mut self, value: bool) -> Self {
        self.count_as_time = value;
        self
    }

    fn write(&self, out: &mut [u8]) {
        put(out, 0, self.var_type.tag().to_le_bytes());
        put(out, 4, (self.offset as i32).to_le_bytes());
        put(out, 8, (self.count as i32).to_le_bytes());
        out[12] = u8::from(self.count_as_time);
        copy_c_string(&mut out[16..48], &self.name);
        copy_c_string(&mut out[48..112], &self.desc);
        copy_c_string(&mut out[112..144], &self.unit);
    }
}

fn copy_c_string(field: &mut [u8], value: &str) {
    let bytes = value.as_bytes();
    let len = bytes.len().min(field.len() - 1);
    field[..len].copy_from_slice(&bytes[..len]);
}

/// Builds live shared-memory images and disk recordings.
#[derive(Debug, Clone)]
pub struct TelemetryImageBuilder {
    version: i32,
    status: i32,
    tick_rate: i32,
    buf_len: usize,
    num_buf: usize,
    ticks: Vec<i32>,
    vars: Vec<VarSpec>,
    session_info: Vec<u8>,
    session_info_capacity: usize,
    session_info_update: i32,
    buffer_data: Vec<(usize, Vec<u8>)>,
    records: Vec<Vec<u8>>,
    lap_count: i32,
}

impl TelemetryImageBuilder {
    /// Start an image whose buffers/records are `buf_len` bytes.
    pub fn new(buf_len: usize) -> Self {
        Self {
            version: 2,
            status: 0,
            tick_rate: 60,
            buf_len,
            num_buf: 3,
            ticks: Vec::new(),
            vars: Vec::new(),
            session_info: Vec::new(),
            session_info_capacity: 1024,
            session_info_update: 0,
            buffer_data: Vec::new(),
            records: Vec::new(),
            lap_count: 0,
        }
    }

    pub fn version(mut self, version: i32) -> Self {
        self.version = version;
        self
    }

    pub fn status(mut self, status: i32) -> Self {
        self.status = status;
        self
    }

    pub fn variable(mut self, var: VarSpec) -> Self {
        self.vars.push(var);
        self
    }

    /// Number of live buffers and their tick counts, in storage order.
    pub fn buffers(mut self, ticks: &[i32]) -> Self {
        self.num_buf = ticks.len();
        self.ticks = ticks.to_vec();
        self
    }

    /// Contents of live buffer `index`.
    pub fn buffer_data(mut self, index: usize, data: Vec<u8>) -> Self {
        self.buffer_data.push((index, data));
        self
    }

    pub fn session_info(mut self, text: &str, update: i32) -> Self {
        self.session_info = text.as_bytes().to_vec();
        self.session_info_update = update;
        self
    }

    /// Raw session info bytes, for legacy codepage content.
    pub fn session_info_bytes(mut self, bytes: &[u8], update: i32) -> Self {
        self.session_info = bytes.to_vec();
        self.session_info_update = update;
        self
    }

    pub fn session_info_capacity(mut self, capacity: usize) -> Self {
        self.session_info_capacity = capacity;
        self
    }

    /// Append one disk record.
    pub fn record(mut self, data: Vec<u8>) -> Self {
        self.records.push(data);
        self
    }

    pub fn lap_count(mut self, laps: i32) -> Self {
        self.lap_count = laps;
        self
    }

    fn session_capacity(&self) -> usize {
        self.session_info_capacity.max(self.session_info.len() + 1)
    }

    fn layout(&self, num_buf: usize, data_start_len: usize) -> (HeaderFields, usize) {
        let directory_len = self.vars.len() * VAR_HEADER_STRIDE;
        let session_offset = DIRECTORY_OFFSET + directory_len;
        let session_len = self.session_capacity();
        let data_start = session_offset + session_len;

        let buffers = (0..num_buf)
            .map(|i| {
                let tick = self.ticks.get(i).copied().unwrap_or(i as i32);
                (tick, (data_start + i * data_start_len) as i32)
            })
            .collect();

        let fields = HeaderFields {
            version: self.version,
            status: self.status,
            tick_rate: self.tick_rate,
            session_info_update: self.session_info_update,
            session_info_len: session_len as i32,
            session_info_offset: session_offset as i32,
            num_vars: self.vars.len() as i32,
            var_header_offset: DIRECTORY_OFFSET as i32,
            num_buf: num_buf as i32,
            buf_len: self.buf_len as i32,
            buffers,
        };
        (fields, data_start)
    }

    fn write_common(&self, image: &mut [u8], fields: &HeaderFields) {
        write_header(image, fields);
        for (i, var) in self.vars.iter().enumerate() {
            let at = DIRECTORY_OFFSET + i * VAR_HEADER_STRIDE;
            var.write(&mut image[at..at + VAR_HEADER_STRIDE]);
        }
        let session_at = fields.session_info_offset as usize;
        image[session_at..session_at + self.session_info.len()].copy_from_slice(&self.session_info);
    }

    /// Build a live shared-memory image with `num_buf` rotating buffers.
    pub fn build_live(&self) -> Vec<u8> {
        let (fields, data_start) = self.layout(self.num_buf, self.buf_len);
        let mut image = vec![0u8; data_start + self.num_buf * self.buf_len];
        self.write_common(&mut image, &fields);

        for (index, data) in &self.buffer_data {
            let at = data_start + index * self.buf_len;
            image[at..at + data.len()].copy_from_slice(data);
        }
        image
    }

    /// Build a disk recording: one buffer descriptor pointing at the record
    /// array, and the disk sub-header at offset 112.
    pub fn build_disk(&self) -> Vec<u8> {
        let (fields, data_start) = self.layout(1, 0);
        let mut image = vec![0u8; data_start + self.records.len() * self.buf_len];
        self.write_common(&mut image, &fields);

        put(&mut image, DISK_SUB_HEADER_OFFSET, 1_700_000_000_u64.to_le_bytes());
        put(&mut image, DISK_SUB_HEADER_OFFSET + 8, 0.0_f64.to_le_bytes());
        put(
            &mut image,
            DISK_SUB_HEADER_OFFSET + 16,
            (self.records.len() as f64 / f64::from(self.tick_rate)).to_le_bytes(),
        );
        put(&mut image, DISK_SUB_HEADER_OFFSET + 24, self.lap_count.to_le_bytes());
        put(&mut image, DISK_SUB_HEADER_OFFSET + 28, (self.records.len() as i32).to_le_bytes());

        for (i, record) in self.records.iter().enumerate() {
            let at = data_start + i * self.buf_len;
            image[at..at + record.len()].copy_from_slice(record);
        }
        image
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::header::Header;

    #[test]
    fn live_image_decodes_with_expected_layout() {
        let image = TelemetryImageBuilder::new(8)
            .variable(VarSpec::new("Speed", VariableType::Float32, 0, 1))
            .buffers(&[5, 6])
            .session_info("---\nWeekendInfo:\n TrackName: x\n\n", 3)
            .build_live();

        let header = Header::parse(&image).unwrap();
        assert_eq!(header.num_buf, 2);
        assert_eq!(header.buffers[0].tick_count, 5);
        assert_eq!(header.buffers[1].buf_offset - header.buffers[0].buf_offset, 8);
        assert_eq!(header.session_info_update, 3);
        assert_eq!(image.len(), header.buffers[1].offset() + 8);
    }

    #[test]
    fn disk_image_places_records_after_session_info() {
        let image = TelemetryImageBuilder::new(4)
            .variable(VarSpec::new("X", VariableType::Int32, 0, 1))
            .record(10_i32.to_le_bytes().to_vec())
            .record(20_i32.to_le_bytes().to_vec())
            .build_disk();

        let header = Header::parse(&image).unwrap();
        let start = header.buffers[0].offset();
        assert_eq!(image.len(), start + 8);
        assert_eq!(&image[start + 4..start + 8], &20_i32.to_le_bytes());
    }
}
