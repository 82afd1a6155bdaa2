//! Benchmarks for the complete mono voice.
//!
//! Every sample runs the LFO, two oscillator updates (one powf each) and two
//! oscillator renders, so this is the realistic per-voice cost.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use nanovoice::synth::{MonoVoice, SynthMessage};

use crate::BLOCK_SIZES;

pub fn bench_voice(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/voice");

    for &size in BLOCK_SIZES {
        let mut left = vec![0.0f32; size];
        let mut right = vec![0.0f32; size];

        // === WAVETABLE VOICE ===
        // two saws, vibrato on
        let mut voice = MonoVoice::wavetable(48_000.0);
        voice.params_mut().lfo_depth = 0.2;
        voice.handle(SynthMessage::NoteOn { note: 45, velocity: 100 });

        group.bench_with_input(BenchmarkId::new("wavetable", size), &size, |b, _| {
            b.iter(|| {
                voice.render(black_box(&mut left));
            })
        });

        // === DPW VOICE ===
        let mut voice = MonoVoice::qbl(48_000.0);
        voice.params_mut().lfo_depth = 0.2;
        voice.handle(SynthMessage::NoteOn { note: 45, velocity: 100 });

        group.bench_with_input(BenchmarkId::new("qbl", size), &size, |b, _| {
            b.iter(|| {
                voice.render(black_box(&mut left));
            })
        });

        // === STEREO WITH BEND ===
        let mut voice = MonoVoice::wavetable(48_000.0);
        voice.params_mut().lfo_depth = 0.2;
        voice.handle(SynthMessage::NoteOn { note: 45, velocity: 100 });
        voice.handle(SynthMessage::PitchBend { amount: 0.25 });

        group.bench_with_input(BenchmarkId::new("wavetable_stereo", size), &size, |b, _| {
            b.iter(|| {
                voice.render_stereo(black_box(&mut left), black_box(&mut right));
            })
        });
    }

    group.finish();
}
