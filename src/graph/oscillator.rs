use log::debug;

use crate::{
    dsp::{
        oscillator::{OscParams, OscWaveform, Oscillator},
        qbl::QblOscillator,
        wavetable::WavetableOscillator,
    },
    graph::node::{GraphNode, RenderCtx},
    DEFAULT_SAMPLE_RATE,
};

/*
Pitched Oscillator Node
=======================

Block-rate wrapper around any pitched generator. The node owns the
generator's parameter set and drives the control-rate / sample-rate split:

    render_block()
      ├── pick up a new sample rate (rare; may rebuild tables)
      ├── resolve frequency: fixed or ctx.frequency, times detune
      ├── update()                 once per block
      └── oscillate()              once per sample

Two generator families plug in:

  WavetableOscillator   band-limited table lookup. Cleanest top end,
                        one bank of tables per oscillator.

  QblOscillator         differentiated parabolic waveforms. No tables,
                        slight high-frequency roll-off.

Example usage:
  let osc = OscNode::wavetable(OscWaveform::SawUp);
  let osc = OscNode::qbl(OscWaveform::Triangle).with_detune(7.0);
  let drone = OscNode::wavetable(OscWaveform::Sine).with_frequency(55.0);

Detune
------

Detune is applied as the frequency ratio 2^(cents/1200). 100 cents = one
semitone. Because it rides on the ratio, the wavetable band is chosen
from the detuned pitch.
*/

pub struct OscNode<O> {
    osc: O,
    params: OscParams,
    /// Fixed frequency (Hz). If Some, ignores ctx.frequency and uses this instead.
    base_frequency: Option<f32>,
    /// Detune in cents (-100 to +100 typical). 100 cents = 1 semitone.
    detune_cents: f32,
    sample_rate: f32,
}

impl OscNode<WavetableOscillator> {
    pub fn wavetable(waveform: OscWaveform) -> Self {
        Self::new(WavetableOscillator::new(DEFAULT_SAMPLE_RATE), waveform)
    }
}

impl OscNode<QblOscillator> {
    pub fn qbl(waveform: OscWaveform) -> Self {
        Self::new(QblOscillator::new(DEFAULT_SAMPLE_RATE), waveform)
    }
}

impl<O: Oscillator<Params = OscParams>> OscNode<O> {
    pub fn new(osc: O, waveform: OscWaveform) -> Self {
        let sample_rate = osc.core().sample_rate() as f32;
        Self {
            osc,
            params: OscParams {
                waveform,
                ..OscParams::default()
            },
            base_frequency: None,
            detune_cents: 0.0,
            sample_rate,
        }
    }

    /// Set a fixed frequency, ignoring the note pitch from RenderCtx.
    pub fn with_frequency(mut self, freq: f32) -> Self {
        self.base_frequency = Some(freq);
        self
    }

    /// Set detune in cents (100 cents = 1 semitone).
    pub fn with_detune(mut self, cents: f32) -> Self {
        self.detune_cents = cents;
        self
    }

    /// Replace the whole parameter set. Waveform, amplitude, pulse width
    /// and the octave/semitone/cent offsets all come from here.
    pub fn with_params(mut self, params: OscParams) -> Self {
        self.params = params;
        self
    }

    pub fn params_mut(&mut self) -> &mut OscParams {
        &mut self.params
    }

    pub fn oscillator(&self) -> &O {
        &self.osc
    }

    pub fn oscillator_mut(&mut self) -> &mut O {
        &mut self.osc
    }

    fn sync_sample_rate(&mut self, sample_rate: f32) {
        if sample_rate != self.sample_rate {
            debug!("oscillator node: sample rate {} -> {}", self.sample_rate, sample_rate);
            self.sample_rate = sample_rate;
            self.osc.set_sample_rate(sample_rate as f64);
        }
    }

    /// Control-rate step: frequency, detune and bend into the generator.
    fn update(&mut self, ctx: &RenderCtx) {
        self.sync_sample_rate(ctx.sample_rate);

        let frequency = self.base_frequency.unwrap_or(ctx.frequency);
        self.params.frequency = frequency as f64;
        self.params.ratio = if self.detune_cents != 0.0 {
            2.0_f64.powf(self.detune_cents as f64 / 1200.0)
        } else {
            1.0
        };
        self.osc.set_pitch_bend_mod(ctx.pitch_bend as f64);
        self.osc.update(&self.params);
    }
}

impl<O: Oscillator<Params = OscParams> + Send> GraphNode for OscNode<O> {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        self.update(ctx);
        for sample in out.iter_mut() {
            *sample = self.osc.oscillate().primary as f32;
        }
    }

    fn note_on(&mut self, ctx: &RenderCtx) {
        // reset picks the start phase from the waveform, and clears the
        // modulation that the second update puts back
        self.update(ctx);
        self.osc.start();
        self.update(ctx);
    }

    fn note_off(&mut self, _ctx: &RenderCtx) {
        self.osc.stop();
    }

    fn is_active(&self) -> bool {
        self.osc.is_note_on()
    }
}
