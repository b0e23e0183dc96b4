//! Byte-level fixtures for integration tests.
//!
//! Images are written field by field from the published layout rather than
//! through the crate's own builder, so these tests also pin the wire format.

#![allow(dead_code)]

pub const TYPE_BOOL: i32 = 1;
pub const TYPE_INT: i32 = 2;
pub const TYPE_FLOAT: i32 = 4;
pub const TYPE_DOUBLE: i32 = 5;

const DIRECTORY_OFFSET: usize = 144;
const VAR_STRIDE: usize = 144;
const SESSION_CAPACITY: usize = 512;

pub struct Var {
    pub name: &'static str,
    pub tag: i32,
    pub offset: i32,
    pub count: i32,
}

impl Var {
    pub const fn new(name: &'static str, tag: i32, offset: i32, count: i32) -> Self {
        Self { name, tag, offset, count }
    }
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn put_i32(image: &mut [u8], at: usize, value: i32) {
    image[at..at + 4].copy_from_slice(&value.to_le_bytes());
}

fn write_vars(image: &mut [u8], vars: &[Var]) {
    for (i, var) in vars.iter().enumerate() {
        let at = DIRECTORY_OFFSET + i * VAR_STRIDE;
        put_i32(image, at, var.tag);
        put_i32(image, at + 4, var.offset);
        put_i32(image, at + 8, var.count);
        let name = var.name.as_bytes();
        image[at + 16..at + 16 + name.len()].copy_from_slice(name);
    }
}

fn session_offset(vars: &[Var]) -> usize {
    DIRECTORY_OFFSET + vars.len() * VAR_STRIDE
}

fn data_start(vars: &[Var]) -> usize {
    session_offset(vars) + SESSION_CAPACITY
}

fn write_common(image: &mut [u8], vars: &[Var], buf_len: usize, num_buf: usize) {
    put_i32(image, 0, 2);
    put_i32(image, 8, 60);
    put_i32(image, 16, SESSION_CAPACITY as i32);
    put_i32(image, 20, session_offset(vars) as i32);
    put_i32(image, 24, vars.len() as i32);
    put_i32(image, 28, DIRECTORY_OFFSET as i32);
    put_i32(image, 32, num_buf as i32);
    put_i32(image, 36, buf_len as i32);
    write_vars(image, vars);
}

/// Replace the session info text and its update counter.
pub fn set_session_info(image: &mut [u8], text: &str, update: i32) {
    let offset = i32::from_le_bytes(image[20..24].try_into().unwrap()) as usize;
    let region = &mut image[offset..offset + SESSION_CAPACITY];
    region.fill(0);
    region[..text.len()].copy_from_slice(text.as_bytes());
    put_i32(image, 12, update);
}

/// Set the tick count of live buffer `index`.
pub fn set_tick(image: &mut [u8], index: usize, tick: i32) {
    put_i32(image, 48 + index * 16, tick);
}

/// Start offset of live buffer `index`.
pub fn buffer_offset(image: &[u8], index: usize) -> usize {
    let at = 48 + index * 16 + 4;
    i32::from_le_bytes(image[at..at + 4].try_into().unwrap()) as usize
}

/// A live shared-memory image; `buffers` holds `(tick, bytes)` in storage order.
pub fn live_image(vars: &[Var], buf_len: usize, buffers: &[(i32, Vec<u8>)], session: &str) -> Vec<u8> {
    let start = data_start(vars);
    let mut image = vec![0u8; start + buffers.len() * buf_len];
    write_common(&mut image, vars, buf_len, buffers.len());
    set_session_info(&mut image, session, 1);

    for (i, (tick, data)) in buffers.iter().enumerate() {
        let offset = start + i * buf_len;
        put_i32(&mut image, 48 + i * 16, *tick);
        put_i32(&mut image, 48 + i * 16 + 4, offset as i32);
        image[offset..offset + data.len()].copy_from_slice(data);
    }
    image
}

/// A disk recording with the sub-header at offset 112.
pub fn recording(vars: &[Var], buf_len: usize, records: &[Vec<u8>], session: &str) -> Vec<u8> {
    let start = data_start(vars);
    let mut image = vec![0u8; start + records.len() * buf_len];
    write_common(&mut image, vars, buf_len, 1);
    set_session_info(&mut image, session, 1);
    put_i32(&mut image, 52, start as i32);

    image[112..120].copy_from_slice(&1_700_000_000_u64.to_le_bytes());
    image[128..136].copy_from_slice(&(records.len() as f64 / 60.0).to_le_bytes());
    put_i32(&mut image, 136, 1);
    put_i32(&mut image, 140, records.len() as i32);

    for (i, record) in records.iter().enumerate() {
        let at = start + i * buf_len;
        image[at..at + record.len()].copy_from_slice(record);
    }
    image
}
