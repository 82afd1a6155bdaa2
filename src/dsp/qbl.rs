use std::f64::consts::PI;

use crate::dsp::{
    math::{parabolic_sine, unipolar_to_bipolar, wrap_unit},
    noise::NoiseSource,
    oscillator::{Frame, OscParams, OscWaveform, Oscillator, OscillatorCore},
};

/*
Quasi-Band-Limited Oscillator (DPW)
===================================

Differentiated Parabolic Waveforms: a band-limited saw without a table
bank. Cheaper and smaller than the wavetable oscillator; the price is a
gentle high-frequency roll-off that is part of its sound.

The Trick
---------

A trivial saw s = 2φ - 1 aliases because of its jump. Square it and the
jump disappears (s² is continuous at the wrap), so s² has a much steeper
spectral slope. Differentiate s² to get the saw back:

    d(s²)/dφ = 2s · ds/dφ = 4s

Per sample the derivative is a first difference, and dividing by the
phase step undoes the scaling:

    out = (s² - z1) / (4 · inc · (1 - |inc|))
    z1  = s²

The (1 - |inc|) term keeps the level flat as the pitch approaches Nyquist.

    φ:     0 ........ 0.5 ........ 1
    s²:    1 \______/‾‾‾‾‾‾‾‾‾\___ ...   (parabola, continuous)
    out:  -1 ________/ 0 ______/ +1      (saw, one jump per cycle)


Triangle
--------

Same idea one level up: a parabola per half-cycle, flipped in sign on the
second half (the square toggle q), then differentiated:

    s = bipolar(2φ mod 1)
    q = +1 for the first half, -1 for the second
    v = q · (s² - 1)
    out = (v - z1) / (8 · inc · (1 - 2|inc|))

The triangle reads a quarter cycle ahead so it has the same shape as the
wavetable triangle: 0 at φ = 0, +1 at 0.25, -1 at 0.75.


Square
------

Two DPW saws, the second offset by the pulse width d, subtracted:

    out = (Δs1² - Δs2²) · saw_gain + (2d - 1)

The saw difference sits at -2d for most of the cycle and 2 - 2d for the
last d of it, so adding 2d - 1 centres it on ±1. Each saw keeps its own
differentiator register.


Priming
-------

The differentiator needs one previous sample. The first sample after a
reset or a waveform change stores the current parabola and emits the
trivial waveform instead, so there is no start-up spike at any phase.

When the normalisation denominator collapses (increment near 0 or at
Nyquist) the trivial waveform is emitted as well. DPW can overshoot near
Nyquist; output is clamped to [-1, 1].
*/

/// Below this the DPW gain is treated as infinite.
const MIN_DENOMINATOR: f64 = 1e-9;

/// Differentiated-parabola oscillator. Saw, triangle and square are DPW;
/// sine and noise are rendered directly.
pub struct QblOscillator {
    core: OscillatorCore,
    waveform: OscWaveform,

    // Differentiator registers
    z1: f64,
    square_z1: f64, // second saw of the pulse pair
    needs_prime: bool,
}

impl QblOscillator {
    pub fn new(sample_rate: f64) -> Self {
        Self::with_noise(sample_rate, NoiseSource::new())
    }

    pub fn with_noise(sample_rate: f64, noise: NoiseSource) -> Self {
        Self {
            core: OscillatorCore::new(sample_rate, noise),
            waveform: OscWaveform::Sine,
            z1: 0.0,
            square_z1: 0.0,
            needs_prime: true,
        }
    }

    pub fn waveform(&self) -> OscWaveform {
        self.waveform
    }

    /// `delta / denominator`, or `trivial` while priming or when the
    /// denominator is unusable.
    #[inline]
    fn differentiate(&self, delta: f64, denominator: f64, trivial: f64) -> f64 {
        if self.needs_prime || denominator.abs() < MIN_DENOMINATOR {
            trivial
        } else {
            delta / denominator
        }
    }

    #[inline]
    fn saw(&mut self, phase: f64) -> f64 {
        let inc = self.core.increment();
        let s = unipolar_to_bipolar(phase);
        let parabola = s * s;

        let out = self.differentiate(parabola - self.z1, 4.0 * inc * (1.0 - inc.abs()), s);
        self.z1 = parabola;
        out
    }

    #[inline]
    fn triangle(&mut self, phase: f64) -> f64 {
        let inc = self.core.increment();
        let phase = wrap_unit(phase + 0.25);
        let s = unipolar_to_bipolar(wrap_unit(2.0 * phase));
        let toggle = if phase < 0.5 { 1.0 } else { -1.0 };
        let v = toggle * (s * s - 1.0);

        let trivial = 1.0 - 2.0 * unipolar_to_bipolar(phase).abs();
        let denominator = 8.0 * inc * (1.0 - 2.0 * inc.abs());
        let out = self.differentiate(v - self.z1, denominator, trivial);
        self.z1 = v;
        out
    }

    #[inline]
    fn square(&mut self, phase: f64) -> f64 {
        let inc = self.core.increment();
        let width = self.core.pulse_width() / 100.0;

        let s1 = unipolar_to_bipolar(phase);
        let s2 = unipolar_to_bipolar(wrap_unit(phase + width));
        let (p1, p2) = (s1 * s1, s2 * s2);

        let trivial = if phase + width >= 1.0 { 1.0 } else { -1.0 };
        let delta = (p1 - self.z1) - (p2 - self.square_z1);
        let centre = 2.0 * width - 1.0;
        let out = self.differentiate(delta, 4.0 * inc * (1.0 - inc.abs()), trivial - centre);
        self.z1 = p1;
        self.square_z1 = p2;
        out + centre
    }
}

impl Oscillator for QblOscillator {
    type Params = OscParams;

    fn core(&self) -> &OscillatorCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut OscillatorCore {
        &mut self.core
    }

    fn reset(&mut self) {
        self.core.reset();
        self.z1 = 0.0;
        self.square_z1 = 0.0;
        self.needs_prime = true;
        if self.waveform.starts_mid_cycle() {
            self.core.reset_phase(0.5);
        }
    }

    fn update(&mut self, params: &OscParams) {
        if params.waveform != self.waveform {
            self.waveform = params.waveform;
            self.needs_prime = true;
        }
        self.core.retune(
            params.frequency,
            params.ratio,
            params.pitch_offset(),
            params.pulse_width,
            params.amplitude,
        );
    }

    fn start(&mut self) {
        self.reset();
        self.core.set_note_on(true);
    }

    #[inline]
    fn oscillate(&mut self) -> Frame {
        if !self.core.is_note_on() {
            return Frame::SILENT;
        }

        let phase = wrap_unit(self.core.phase() + self.core.modulation().phase);

        let out = match self.waveform {
            OscWaveform::Sine => parabolic_sine(-(phase * 2.0 * PI - PI)),
            OscWaveform::SawUp => self.saw(phase),
            OscWaveform::SawDown => -self.saw(phase),
            OscWaveform::Triangle => self.triangle(phase),
            OscWaveform::Square => self.square(phase),
            OscWaveform::Noise => self.core.noise_mut().white(),
            OscWaveform::PseudoNoise => self.core.noise_mut().pseudo(),
        };
        self.needs_prime = false;

        self.core.advance();

        let out = out.clamp(-1.0, 1.0);
        Frame {
            primary: out,
            aux: out,
        }
        .scaled(self.core.output_gain())
    }
}
