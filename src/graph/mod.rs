//! Block-rendering nodes around the per-sample generators.
//!
//! Graph nodes own a generator plus its parameter set, run `update()` once
//! per block and `oscillate()` once per sample, and translate note events
//! into `start()`/`stop()`.

/// LFO node with fixed rate and quadrature rendering.
pub mod lfo;
/// Core traits shared by all graph nodes.
pub mod node;
/// Pitched oscillator node, generic over the generator family.
pub mod oscillator;
