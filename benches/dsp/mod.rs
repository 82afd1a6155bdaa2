//! Benchmarks for single generators.

mod lfo;
mod oscillator;
mod wavetable;

pub use lfo::bench_lfo;
pub use oscillator::bench_oscillator;
pub use wavetable::bench_wavetable_bank;
