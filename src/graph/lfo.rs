use crate::{
    dsp::{
        lfo::{Lfo, LfoMode, LfoParams, LfoWaveform},
        oscillator::Oscillator,
    },
    graph::node::{GraphNode, RenderCtx},
    DEFAULT_SAMPLE_RATE,
};

/*
LFO Node
========

Renders the LFO at its own fixed rate; the note's pitch is ignored. Note
events still matter: they drive the run mode (see `dsp/lfo.rs`).

  // Vibrato source, restarted on every note
  let vibrato = LfoNode::sine(6.0);

  // One rising ramp per note, then silence
  let riser = LfoNode::sawtooth(0.5).with_mode(LfoMode::Shot);

  // Slow drift that ignores note starts
  let drift = LfoNode::triangle(0.1).with_mode(LfoMode::Free);

render_block() writes the primary output. render_quadrature() also fills
a second buffer with the output a quarter cycle ahead.
*/

pub struct LfoNode {
    lfo: Lfo,
    params: LfoParams,
    sample_rate: f32,
}

impl LfoNode {
    pub fn new(lfo: Lfo, params: LfoParams) -> Self {
        let sample_rate = lfo.core().sample_rate() as f32;
        Self {
            lfo,
            params,
            sample_rate,
        }
    }

    fn with_shape(waveform: LfoWaveform, frequency: f32) -> Self {
        Self::new(
            Lfo::new(DEFAULT_SAMPLE_RATE),
            LfoParams {
                waveform,
                frequency: frequency as f64,
                ..LfoParams::default()
            },
        )
    }

    pub fn sine(frequency: f32) -> Self {
        Self::with_shape(LfoWaveform::Sine, frequency)
    }

    pub fn sawtooth(frequency: f32) -> Self {
        Self::with_shape(LfoWaveform::SawUp, frequency)
    }

    pub fn square(frequency: f32) -> Self {
        Self::with_shape(LfoWaveform::Square, frequency)
    }

    pub fn triangle(frequency: f32) -> Self {
        Self::with_shape(LfoWaveform::Triangle, frequency)
    }

    pub fn sample_hold(frequency: f32) -> Self {
        Self::with_shape(LfoWaveform::SampleHold, frequency)
    }

    pub fn with_mode(mut self, mode: LfoMode) -> Self {
        self.params.mode = mode;
        self
    }

    pub fn with_amplitude(mut self, amplitude: f32) -> Self {
        self.params.amplitude = amplitude as f64;
        self
    }

    pub fn params_mut(&mut self) -> &mut LfoParams {
        &mut self.params
    }

    pub fn lfo(&self) -> &Lfo {
        &self.lfo
    }

    fn update(&mut self, sample_rate: f32) {
        if sample_rate != self.sample_rate {
            self.sample_rate = sample_rate;
            self.lfo.set_sample_rate(sample_rate as f64);
        }
        self.lfo.update(&self.params);
    }

    /// Render primary and quadrature outputs into two buffers of equal length.
    pub fn render_quadrature(&mut self, out: &mut [f32], quad: &mut [f32], ctx: &RenderCtx) {
        self.update(ctx.sample_rate);
        for (o, q) in out.iter_mut().zip(quad.iter_mut()) {
            let frame = self.lfo.oscillate();
            *o = frame.primary as f32;
            *q = frame.aux as f32;
        }
    }
}

impl GraphNode for LfoNode {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        self.update(ctx.sample_rate);
        for sample in out.iter_mut() {
            *sample = self.lfo.oscillate().primary as f32;
        }
    }

    fn note_on(&mut self, ctx: &RenderCtx) {
        // the mode must be current before start() decides whether to reset
        self.update(ctx.sample_rate);
        self.lfo.start();
    }

    fn note_off(&mut self, _ctx: &RenderCtx) {
        self.lfo.stop();
    }

    fn is_active(&self) -> bool {
        self.lfo.is_note_on()
    }
}
