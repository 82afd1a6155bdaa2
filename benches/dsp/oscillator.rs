//! Benchmarks for pitched waveform generation, wavetable vs DPW.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use nanovoice::dsp::OscWaveform;
use nanovoice::graph::{
    node::{GraphNode, RenderCtx},
    oscillator::OscNode,
};

use crate::BLOCK_SIZES;

const WAVEFORMS: &[(&str, OscWaveform)] = &[
    ("sine", OscWaveform::Sine),
    ("saw", OscWaveform::SawUp),
    ("square", OscWaveform::Square),
    ("triangle", OscWaveform::Triangle),
    ("noise", OscWaveform::Noise),
];

pub fn bench_oscillator(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/oscillator");
    let ctx = RenderCtx::from_freq(48_000.0, 440.0, 100.0);

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        for &(name, waveform) in WAVEFORMS {
            // Wavetable - interpolated table read, two reads for square
            let mut osc = OscNode::wavetable(waveform);
            osc.note_on(&ctx);
            group.bench_with_input(
                BenchmarkId::new(format!("wavetable/{name}"), size),
                &size,
                |b, _| {
                    b.iter(|| {
                        osc.render_block(black_box(&mut buffer), black_box(&ctx));
                    })
                },
            );

            // DPW - parabola, difference and one divide per sample
            let mut osc = OscNode::qbl(waveform);
            osc.note_on(&ctx);
            group.bench_with_input(
                BenchmarkId::new(format!("qbl/{name}"), size),
                &size,
                |b, _| {
                    b.iter(|| {
                        osc.render_block(black_box(&mut buffer), black_box(&ctx));
                    })
                },
            );
        }
    }

    group.finish();
}
