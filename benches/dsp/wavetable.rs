//! Cost of building the table bank. Runs on sample-rate changes, never on
//! the audio thread, but it bounds how quickly a rate switch can complete.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use nanovoice::dsp::wavetable::WavetableBank;

pub fn bench_wavetable_bank(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/wavetable_bank");

    for &sample_rate in &[44_100.0, 48_000.0, 96_000.0] {
        group.bench_with_input(
            BenchmarkId::new("build", sample_rate as u32),
            &sample_rate,
            |b, &rate| {
                b.iter(|| WavetableBank::new(black_box(rate)));
            },
        );
    }

    group.finish();
}
