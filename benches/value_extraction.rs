//! Benchmarks for value extraction from synthetic telemetry
//!
//! Tests decoding performance for:
//! - Scalar types (f32, i32, bool) through `VarData` and the dynamic `Value` path
//! - 64-element per-car arrays
//! - Whole-column extraction from a disk recording
//! - Cached session info lookups
//!
//! Platform: Cross-platform (images are built in memory, CI-safe)

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use pitlane::extract::extract;
use pitlane::schema::session::keys;
use pitlane::test_utils::{TelemetryImageBuilder, VarSpec};
use pitlane::types::{VarData, VariableType};
use pitlane::{DiskClient, VariableDirectory};
use std::hint::black_box;

const CARS: usize = 64;
const RECORD_LEN: usize = 16 + CARS * 4;

const SESSION_YAML: &str = "---\nWeekendInfo:\n TrackName: spa\n TrackID: 163\n\n\
DriverInfo:\n DriverCarIdx: 0\n Drivers:\n - CarIdx: 0\n   UserName: Bench Driver\n   CarNumber: \"7\"\n\n";

fn builder() -> TelemetryImageBuilder {
    TelemetryImageBuilder::new(RECORD_LEN)
        .variable(VarSpec::new("Speed", VariableType::Float32, 0, 1).unit("m/s"))
        .variable(VarSpec::new("Gear", VariableType::Int32, 4, 1))
        .variable(VarSpec::new("OnPitRoad", VariableType::Bool, 8, 1))
        .variable(VarSpec::new("CarIdxLapDistPct", VariableType::Float32, 16, CARS))
        .session_info(SESSION_YAML, 1)
}

fn record(i: usize) -> Vec<u8> {
    let mut record = vec![0u8; RECORD_LEN];
    record[0..4].copy_from_slice(&(i as f32 * 0.5).to_le_bytes());
    record[4..8].copy_from_slice(&((i % 6) as i32).to_le_bytes());
    record[8] = u8::from(i % 100 < 5);
    for car in 0..CARS {
        let at = 16 + car * 4;
        record[at..at + 4].copy_from_slice(&((car + i) as f32 / 1000.0).to_le_bytes());
    }
    record
}

fn recording(records: usize) -> Vec<u8> {
    (0..records).fold(builder(), |b, i| b.record(record(i))).build_disk()
}

fn load_record() -> (Vec<u8>, VariableDirectory) {
    let disk = DiskClient::from_bytes(recording(1)).expect("Failed to load recording");
    let directory = (*disk.variables().expect("Recording is open")).clone();
    (record(0), directory)
}

fn bench_scalar_extraction(c: &mut Criterion) {
    let (data, directory) = load_record();
    let mut group = c.benchmark_group("scalar_extraction");

    if let Some(speed) = directory.get("Speed") {
        group.bench_function("f32_speed", |b| {
            b.iter(|| black_box(f32::from_bytes(black_box(&data), speed).unwrap()))
        });
        group.bench_function("value_speed", |b| {
            b.iter(|| black_box(extract(black_box(&data), speed).unwrap()))
        });
    }

    if let Some(gear) = directory.get("Gear") {
        group.bench_function("i32_gear", |b| {
            b.iter(|| black_box(i32::from_bytes(black_box(&data), gear).unwrap()))
        });
    }

    if let Some(pit) = directory.get("OnPitRoad") {
        group.bench_function("bool_on_pit_road", |b| {
            b.iter(|| black_box(bool::from_bytes(black_box(&data), pit).unwrap()))
        });
    }

    group.bench_function("lookup_and_extract", |b| {
        b.iter(|| {
            let desc = directory.require(black_box("Speed")).unwrap();
            black_box(extract(&data, desc).unwrap())
        })
    });

    group.finish();
}

fn bench_array_extraction(c: &mut Criterion) {
    let (data, directory) = load_record();
    let mut group = c.benchmark_group("array_extraction");

    if let Some(lap_dist) = directory.get("CarIdxLapDistPct") {
        group.bench_function(BenchmarkId::new("f32_array", lap_dist.count), |b| {
            b.iter(|| black_box(Vec::<f32>::from_bytes(black_box(&data), lap_dist).unwrap()))
        });
        group.bench_function(BenchmarkId::new("value_array", lap_dist.count), |b| {
            b.iter(|| black_box(extract(black_box(&data), lap_dist).unwrap()))
        });
    }

    group.finish();
}

fn bench_disk_columns(c: &mut Criterion) {
    let mut group = c.benchmark_group("disk_columns");

    for records in [600_usize, 3600] {
        let disk = DiskClient::from_bytes(recording(records)).expect("Failed to load recording");
        group.bench_function(BenchmarkId::new("column_as_f32", records), |b| {
            b.iter(|| black_box(disk.column_as::<f32>("Speed").unwrap()))
        });
        group.bench_function(BenchmarkId::new("cursor_walk", records), |b| {
            b.iter(|| {
                let mut cursor = disk.cursor().unwrap();
                let mut total = 0.0_f32;
                while cursor.advance() {
                    total += cursor.view().unwrap().get_as::<f32>("Speed").unwrap();
                }
                black_box(total)
            })
        });
    }

    group.finish();
}

fn bench_session_info(c: &mut Criterion) {
    let disk = DiskClient::from_bytes(recording(1)).expect("Failed to load recording");
    let mut group = c.benchmark_group("session_info");

    group.bench_function("cached_weekend_info", |b| {
        b.iter(|| black_box(disk.session_info(keys::WEEKEND_INFO).unwrap()))
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_scalar_extraction,
    bench_array_extraction,
    bench_disk_columns,
    bench_session_info
);
criterion_main!(benches);
