#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::dsp::{
    math::{pitch_shift_multiplier, wrap_unit},
    noise::NoiseSource,
};

/*
Oscillator Core
===============

Every generator in this crate (wavetable, DPW, LFO) is the same machine
underneath: a phase accumulator, a stack of modulation inputs, and a
render step that turns phase into a sample. This module holds the shared
part; each family only decides how phase becomes sound.

Vocabulary
----------

  phase       Position within the current cycle, always in [0, 1).
              0.0 = start of the cycle, 0.5 = halfway.

  increment   Phase step per sample = frequency / sample_rate.
              440 Hz at 48 kHz -> 0.009166...
              Negative when strong FM drives the frequency below zero.

  wrap        The moment phase leaves [0, 1) and is folded back in.
              Reported to the caller: one-shot LFOs stop on it.

  target      The frequency the note asked for (MIDI or GUI).

  effective   The frequency actually rendered, after ratio and every
              modulation input is applied and the result is clamped.


Control Rate vs Sample Rate
---------------------------

Two calls drive a generator:

    update()     control rate. Resolves params + modulation into an
                 increment and a pulse width. Cheap, but not free
                 (one powf).

    oscillate()  sample rate. Reads phase, emits a Frame, advances.

Changing a param does nothing until the next update(). Changing the sample
rate does nothing until the next update() either; call it before rendering.


The Frequency Equation
----------------------

    semitones = fo_mod_exp + pitch_bend + octave·12 + semitones + cents/100
    f         = target · ratio · 2^(semitones/12) + fo_mod_lin
    f         = clamp(f, -FO_MAX, +FO_MAX)
    increment = f / sample_rate

Exponential inputs are summed BEFORE the single powf, so stacking vibrato
on top of pitch bend costs nothing extra. Linear FM is added afterwards
and is not scaled by the ratio. The lower clamp is -FO_MAX, not FO_MIN:
through-zero FM is allowed to run the phase backwards.


Pulse Width
-----------

    pw = clamp(pulse_width + pw_mod · (PW_MAX - PW_MIN) / PW_MIN, PW_MIN, PW_MAX)

With the 2%/98% limits a full-scale PWM input swings the width by 48%,
enough to sweep from the centre to either limit.


Neutral Modulation
------------------

An unconnected input must not change the sound. All inputs rest at 0.0
except amplitude modulation, which rests at 1.0 - otherwise an oscillator
with nothing patched into its AM input would be silent.
*/

/// Lowest musically useful pitch (Hz).
pub const FO_MIN: f64 = 20.0;
/// 20.48 kHz = 10 octaves above FO_MIN. Also the bound for negative frequencies.
pub const FO_MAX: f64 = 20_480.0;
pub const FO_DEFAULT: f64 = 440.0;

pub const PULSE_WIDTH_MIN: f64 = 2.0;
pub const PULSE_WIDTH_MAX: f64 = 98.0;
pub const PULSE_WIDTH_DEFAULT: f64 = 50.0;

/// Semitones of pitch swing for a full-scale exponential FM source.
pub const FO_MOD_RANGE: f64 = 2.0;
/// Semitones of pitch swing for a full-scale pitch bend.
pub const PITCH_BEND_RANGE: f64 = 12.0;

/// Hold-counter value meaning "no sample drawn yet".
const HOLD_UNINITIALIZED: f64 = -1.0;

/// Waveforms available to the pitched generators.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OscWaveform {
    #[default]
    Sine,
    SawUp,
    SawDown,
    Triangle,
    Square,
    Noise,
    PseudoNoise,
}

impl OscWaveform {
    /// Saw and triangle cycles are defined from their midpoint, so their
    /// phase restarts at 0.5 instead of 0.0.
    pub fn starts_mid_cycle(self) -> bool {
        matches!(self, Self::SawUp | Self::SawDown | Self::Triangle)
    }
}

/// Control-rate settings for a pitched generator.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OscParams {
    pub waveform: OscWaveform,
    /// Target frequency in Hz (usually from the MIDI note).
    pub frequency: f64,
    /// Detune or FM-carrier ratio applied to the target.
    pub ratio: f64,
    /// Output gain, 0.0 to 1.0.
    pub amplitude: f64,
    /// Pulse width in percent (square only).
    pub pulse_width: f64,
    pub octave: i32,
    pub semitones: i32,
    pub cents: i32,
}

impl OscParams {
    /// Static pitch offset in semitones from the octave/semitone/cent controls.
    pub fn pitch_offset(&self) -> f64 {
        self.octave as f64 * 12.0 + self.semitones as f64 + self.cents as f64 / 100.0
    }
}

impl Default for OscParams {
    fn default() -> Self {
        Self {
            waveform: OscWaveform::Sine,
            frequency: FO_DEFAULT,
            ratio: 1.0,
            amplitude: 1.0,
            pulse_width: PULSE_WIDTH_DEFAULT,
            octave: 0,
            semitones: 0,
            cents: 0,
        }
    }
}

/// Modulation inputs, written by the voice before each update().
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Modulation {
    /// Exponential FM in semitones.
    pub fo_exp: f64,
    /// Pitch bend in semitones.
    pub pitch_bend: f64,
    /// Linear FM in Hz, added after the ratio.
    pub fo_lin: f64,
    /// Phase offset in cycles (used by the wavetable and DPW readers).
    pub phase: f64,
    /// Pulse-width modulation, -1.0 to +1.0.
    pub pulse_width: f64,
    /// Output amplitude multiplier, rests at 1.0.
    pub amplitude: f64,
}

impl Modulation {
    pub const NEUTRAL: Self = Self {
        fo_exp: 0.0,
        pitch_bend: 0.0,
        fo_lin: 0.0,
        phase: 0.0,
        pulse_width: 0.0,
        amplitude: 1.0,
    };
}

impl Default for Modulation {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

/// One rendered sample: the primary output plus the auxiliary channel
/// (right channel for pitched generators, quadrature for the LFO).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Frame {
    pub primary: f64,
    pub aux: f64,
}

impl Frame {
    pub const SILENT: Self = Self {
        primary: 0.0,
        aux: 0.0,
    };

    #[inline]
    pub fn scaled(self, gain: f64) -> Self {
        Self {
            primary: self.primary * gain,
            aux: self.aux * gain,
        }
    }
}

/// Phase state, modulation stack and random state shared by every family.
#[derive(Debug, Clone)]
pub struct OscillatorCore {
    sample_rate: f64,

    // Timebase
    phase: f64,
    increment: f64,
    wrapped: bool, // phase folded on the last advance, not yet consumed

    // Resolved by update()
    frequency: f64,
    pulse_width: f64,
    amplitude: f64,

    note_on: bool,
    modulation: Modulation,

    // Noise and sample & hold
    noise: NoiseSource,
    hold_counter: f64,
    hold_value: f64,
}

impl OscillatorCore {
    pub fn new(sample_rate: f64, noise: NoiseSource) -> Self {
        Self {
            sample_rate,
            phase: 0.0,
            increment: 0.0,
            wrapped: false,
            frequency: FO_DEFAULT,
            pulse_width: PULSE_WIDTH_DEFAULT,
            amplitude: 1.0,
            note_on: false,
            modulation: Modulation::NEUTRAL,
            noise,
            hold_counter: HOLD_UNINITIALIZED,
            hold_value: 0.0,
        }
    }

    /// Takes effect on the next `retune()`. Does not touch phase.
    pub fn set_sample_rate(&mut self, sample_rate: f64) {
        self.sample_rate = sample_rate;
    }

    /// Zero phase, restore neutral modulation and start a fresh random epoch.
    pub fn reset(&mut self) {
        self.phase = 0.0;
        self.wrapped = false;
        self.noise.reseed();
        self.hold_counter = HOLD_UNINITIALIZED;
        self.hold_value = 0.0;
        self.modulation = Modulation::NEUTRAL;
    }

    /// Resolve target pitch, static offset and the modulation stack into an
    /// effective frequency, increment and pulse width.
    pub fn retune(
        &mut self,
        target: f64,
        ratio: f64,
        pitch_offset: f64,
        pulse_width: f64,
        amplitude: f64,
    ) {
        let m = &self.modulation;

        let semitones = m.fo_exp + m.pitch_bend + pitch_offset;
        let mut frequency = target * ratio * pitch_shift_multiplier(semitones) + m.fo_lin;
        if !frequency.is_finite() {
            frequency = 0.0;
        }
        self.frequency = frequency.clamp(-FO_MAX, FO_MAX);

        self.increment = if self.sample_rate > 0.0 {
            self.frequency / self.sample_rate
        } else {
            0.0
        };

        let width = pulse_width
            + m.pulse_width * (PULSE_WIDTH_MAX - PULSE_WIDTH_MIN) / PULSE_WIDTH_MIN;
        self.pulse_width = if width.is_finite() {
            width.clamp(PULSE_WIDTH_MIN, PULSE_WIDTH_MAX)
        } else {
            PULSE_WIDTH_DEFAULT
        };

        self.amplitude = amplitude;
    }

    /// Step phase by one sample and fold it back into [0, 1).
    /// Returns true when the cycle boundary was crossed. Running backwards,
    /// landing exactly on 0 counts as a crossing and 0 is the top of the
    /// next cycle.
    #[inline]
    pub fn advance(&mut self) -> bool {
        let reversed = self.increment < 0.0;
        if reversed && self.phase == 0.0 {
            self.phase = 1.0;
        }
        self.phase += self.increment;
        let wrapped = if reversed {
            self.phase <= 0.0
        } else {
            !(0.0..1.0).contains(&self.phase)
        };
        if wrapped {
            self.phase = wrap_unit(self.phase);
        }
        self.wrapped |= wrapped;
        wrapped
    }

    /// Consume the wrap reported by the last advance.
    #[inline]
    pub fn take_wrap(&mut self) -> bool {
        std::mem::take(&mut self.wrapped)
    }

    pub fn reset_phase(&mut self, phase: f64) {
        self.phase = wrap_unit(phase);
        self.wrapped = false;
    }

    /// Held random value for the sample & hold shapes. Draws a new value on
    /// the first call after reset, then once every
    /// `round(sample_rate / |frequency|)` samples.
    #[inline]
    pub fn sample_hold(&mut self, pseudo: bool) -> f64 {
        let hold = (self.sample_rate / self.frequency.abs()).round().max(1.0);

        if self.hold_counter < 0.0 || self.hold_counter > hold {
            self.hold_value = self.draw(pseudo);
            self.hold_counter = 1.0;
        }

        self.hold_counter += 1.0;
        self.hold_value
    }

    #[inline]
    fn draw(&mut self, pseudo: bool) -> f64 {
        if pseudo {
            self.noise.pseudo()
        } else {
            self.noise.white()
        }
    }

    /// Amplitude times the AM input.
    #[inline]
    pub fn output_gain(&self) -> f64 {
        self.amplitude * self.modulation.amplitude
    }

    #[inline]
    pub fn phase(&self) -> f64 {
        self.phase
    }

    #[inline]
    pub fn increment(&self) -> f64 {
        self.increment
    }

    /// Effective frequency after modulation and clamping.
    #[inline]
    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    /// Effective pulse width in percent.
    #[inline]
    pub fn pulse_width(&self) -> f64 {
        self.pulse_width
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    #[inline]
    pub fn is_note_on(&self) -> bool {
        self.note_on
    }

    pub fn set_note_on(&mut self, note_on: bool) {
        self.note_on = note_on;
    }

    pub fn modulation(&self) -> &Modulation {
        &self.modulation
    }

    pub fn modulation_mut(&mut self) -> &mut Modulation {
        &mut self.modulation
    }

    #[inline]
    pub fn noise_mut(&mut self) -> &mut NoiseSource {
        &mut self.noise
    }
}

/// Lifecycle and render contract shared by the wavetable, DPW and LFO
/// generators.
///
/// Call order per block: write params, `update()`, then `oscillate()` once
/// per sample. `start()`/`stop()` follow note events.
pub trait Oscillator {
    type Params;

    fn core(&self) -> &OscillatorCore;
    fn core_mut(&mut self) -> &mut OscillatorCore;

    /// Re-issue `update()` before rendering after a rate change.
    fn set_sample_rate(&mut self, sample_rate: f64) {
        self.core_mut().set_sample_rate(sample_rate);
    }

    fn reset(&mut self);

    /// Copy params in and recompute increment, pulse width and any
    /// family-specific derived state.
    fn update(&mut self, params: &Self::Params);

    fn start(&mut self);

    /// Gate off. Phase is left alone so a retrigger can pick up from here.
    fn stop(&mut self) {
        self.core_mut().set_note_on(false);
    }

    /// Render one sample. Silent while the gate is off.
    fn oscillate(&mut self) -> Frame;

    fn is_note_on(&self) -> bool {
        self.core().is_note_on()
    }

    fn set_amplitude_mod(&mut self, amount: f64) {
        self.core_mut().modulation_mut().amplitude = amount;
    }

    fn set_fo_mod_exp(&mut self, semitones: f64) {
        self.core_mut().modulation_mut().fo_exp = semitones;
    }

    fn set_pitch_bend_mod(&mut self, semitones: f64) {
        self.core_mut().modulation_mut().pitch_bend = semitones;
    }

    fn set_fo_mod_lin(&mut self, hz: f64) {
        self.core_mut().modulation_mut().fo_lin = hz;
    }

    fn set_phase_mod(&mut self, cycles: f64) {
        self.core_mut().modulation_mut().phase = cycles;
    }

    fn set_pw_mod(&mut self, amount: f64) {
        self.core_mut().modulation_mut().pulse_width = amount;
    }
}
