//! Per-sample generators and the scalar math they share.
//!
//! Everything here is allocation-free once constructed and safe to call from
//! the audio thread. The one exception is `WavetableBank::new`, which fills
//! its tables and must run before rendering starts.

/// LFO with sync, one-shot and free-run modes.
pub mod lfo;
/// Parabolic sine, polarity conversion, pitch and curve helpers.
pub mod math;
/// Owned white noise and pseudo-noise source.
pub mod noise;
/// Shared phase accumulator, modulation inputs and the `Oscillator` trait.
pub mod oscillator;
/// Differentiated parabolic waveform oscillator.
pub mod qbl;
/// Band-limited table-lookup oscillator.
pub mod wavetable;

pub use lfo::{Lfo, LfoMode, LfoParams, LfoWaveform};
pub use oscillator::{Frame, OscParams, OscWaveform, Oscillator};
pub use qbl::QblOscillator;
pub use wavetable::WavetableOscillator;
