use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::fs;
use tempfile::tempdir;
use zip_splitter::{
    filter_archive, ArchiveReader, ArchiveWriter, FilterOptions, DEFAULT_COMPRESSION_LEVEL,
};

fn generate_compressible_data(size: usize) -> Vec<u8> {
    let pattern = b"The quick brown fox jumps over the lazy dog. ";
    let mut data = Vec::with_capacity(size);
    while data.len() < size {
        data.extend_from_slice(pattern);
    }
    data.truncate(size);
    data
}

fn bench_filter_fraction(c: &mut Criterion) {
    let entry_count = 200;
    let entry_size = 16 * 1024;
    let data = generate_compressible_data(entry_size);

    let dir = tempdir().unwrap();
    let source = dir.path().join("source.zip");
    let mut writer =
        ArchiveWriter::create_with_compression(&source, DEFAULT_COMPRESSION_LEVEL).unwrap();
    for i in 0..entry_count {
        writer.add_entry(&format!("file_{:04}.txt", i), &data).unwrap();
    }
    writer.finish().unwrap();

    let mut group = c.benchmark_group("filter_archive");

    // Select every `step`-th member
    for step in [1usize, 4, 20] {
        let selected = entry_count.div_ceil(step);
        group.throughput(Throughput::Bytes((selected * entry_size) as u64));

        let csv = dir.path().join(format!("every_{}.csv", step));
        let mut text = String::from("filename\n");
        for i in (0..entry_count).step_by(step) {
            text.push_str(&format!("file_{:04}.txt\n", i));
        }
        fs::write(&csv, text).unwrap();

        let output = dir.path().join(format!("every_{}.zip", step));
        group.bench_function(BenchmarkId::new("every_nth", step), |b| {
            b.iter(|| {
                let report =
                    filter_archive(&source, &csv, &output, &FilterOptions::default(), |_, _| {})
                        .unwrap();
                black_box(report.copied);
            });
        });
    }

    group.finish();
}

fn bench_read_central_directory(c: &mut Criterion) {
    let dir = tempdir().unwrap();
    let source = dir.path().join("many.zip");
    let mut writer =
        ArchiveWriter::create_with_compression(&source, DEFAULT_COMPRESSION_LEVEL).unwrap();
    for i in 0..5_000 {
        writer.add_entry(&format!("dir/entry_{:05}.bin", i), b"x").unwrap();
    }
    writer.finish().unwrap();

    c.bench_function("open_5000_entries", |b| {
        b.iter(|| {
            let reader = ArchiveReader::open(&source).unwrap();
            black_box(reader.len());
        });
    });
}

criterion_group!(benches, bench_filter_fraction, bench_read_central_directory);
criterion_main!(benches);
