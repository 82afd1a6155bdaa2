//! Benchmarks for LFO shapes, including the quadrature output.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use nanovoice::dsp::LfoMode;
use nanovoice::graph::{
    lfo::LfoNode,
    node::{GraphNode, RenderCtx},
};

use crate::BLOCK_SIZES;

pub fn bench_lfo(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/lfo");
    let ctx = RenderCtx::from_freq(48_000.0, 440.0, 100.0);

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];
        let mut quad = vec![0.0f32; size];

        // Sine - parabolic approximation, twice per sample (primary + quad)
        let mut lfo = LfoNode::sine(5.0);
        lfo.note_on(&ctx);
        group.bench_with_input(BenchmarkId::new("sine", size), &size, |b, _| {
            b.iter(|| {
                lfo.render_block(black_box(&mut buffer), black_box(&ctx));
            })
        });

        let mut lfo = LfoNode::sine(5.0);
        lfo.note_on(&ctx);
        group.bench_with_input(BenchmarkId::new("sine_quadrature", size), &size, |b, _| {
            b.iter(|| {
                lfo.render_quadrature(
                    black_box(&mut buffer),
                    black_box(&mut quad),
                    black_box(&ctx),
                );
            })
        });

        // Sample & hold - counter check, occasional PRNG draw
        let mut lfo = LfoNode::sample_hold(8.0).with_mode(LfoMode::Free);
        lfo.note_on(&ctx);
        group.bench_with_input(BenchmarkId::new("sample_hold", size), &size, |b, _| {
            b.iter(|| {
                lfo.render_block(black_box(&mut buffer), black_box(&ctx));
            })
        });
    }

    group.finish();
}
