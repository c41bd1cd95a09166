//! sqdec 解码性能基准测试.
//!
//! 覆盖整段 FFT, 矩阵重组, 完整解码流水线 (串行/并行) 以及 WAV 写出.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use std::sync::Arc;

use sqdec::matrix::{NullObserver, SpectralTransform, recombine};
use sqdec::wav::{IoContext, MemoryBackend, WavWriter};
use sqdec::{DecodeConfig, MatrixDecoder, MatrixFormat, OutputLayout};

/// 生成确定性的双声道测试信号
fn make_stereo(len: usize) -> (Vec<f64>, Vec<f64>) {
    let lt = (0..len).map(|i| (i as f64 * 0.031).sin() * 0.5).collect();
    let rt = (0..len).map(|i| (i as f64 * 0.017).cos() * 0.5).collect();
    (lt, rt)
}

fn bench_transform(c: &mut Criterion) {
    let mut group = c.benchmark_group("transform");
    for &len in &[44_100usize, 441_000] {
        let (lt, _) = make_stereo(len);
        let transform = SpectralTransform::new(len);
        group.bench_with_input(BenchmarkId::new("forward", len), &lt, |b, lt| {
            b.iter(|| transform.forward(black_box(lt)).unwrap());
        });
        let spectrum = transform.forward(&lt).unwrap();
        group.bench_with_input(BenchmarkId::new("inverse", len), &spectrum, |b, s| {
            b.iter(|| transform.inverse(black_box(s)).unwrap());
        });
    }
    group.finish();
}

fn bench_recombine(c: &mut Criterion) {
    let len = 441_000;
    let (lt, rt) = make_stereo(len);
    let transform = SpectralTransform::new(len);
    let lt_spec = transform.forward(&lt).unwrap();
    let rt_spec = transform.forward(&rt).unwrap();

    let mut group = c.benchmark_group("recombine");
    for format in [MatrixFormat::Sq, MatrixFormat::Qs] {
        for layout in [OutputLayout::Quad, OutputLayout::Surround51] {
            let id = format!("{format}/{layout}");
            group.bench_function(id, |b| {
                b.iter(|| {
                    recombine(
                        black_box(&lt_spec),
                        black_box(&rt_spec),
                        format,
                        layout.channel_layout(),
                    )
                    .unwrap()
                });
            });
        }
    }
    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let len = 10 * 44_100;
    let (lt, rt) = make_stereo(len);

    let mut group = c.benchmark_group("decode_10s");
    group.sample_size(10);
    for parallel in [false, true] {
        let config = DecodeConfig::default()
            .with_output_layout(OutputLayout::Surround51)
            .with_parallel(parallel);
        let decoder = MatrixDecoder::new(config).with_observer(Arc::new(NullObserver));
        let name = if parallel { "parallel" } else { "serial" };
        group.bench_function(name, |b| {
            b.iter(|| decoder.decode(black_box(&lt), black_box(&rt), 44_100).unwrap());
        });
    }
    group.finish();
}

fn bench_wav_write(c: &mut Criterion) {
    let (lt, rt) = make_stereo(441_000);
    c.bench_function("wav_write_stereo_10s", |b| {
        b.iter(|| {
            let io = IoContext::new(Box::new(MemoryBackend::new()));
            let mut writer = WavWriter::new(io, 44_100, 2).unwrap();
            writer.write_planar(&[&lt, &rt]).unwrap();
            writer.finish().unwrap()
        });
    });
}

criterion_group!(
    benches,
    bench_transform,
    bench_recombine,
    bench_decode,
    bench_wav_write
);
criterion_main!(benches);
