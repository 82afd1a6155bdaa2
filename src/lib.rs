pub mod dsp;
pub mod graph; // Block-rendering nodes around the generators
pub mod synth; // Mono voice and control messages

/// Rate generators are built at before a host reports its own.
pub const DEFAULT_SAMPLE_RATE: f64 = 48_000.0;
