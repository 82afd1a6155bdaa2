//! Low Frequency Oscillator with run modes and a quadrature output.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use std::f64::consts::PI;

use crate::dsp::{
    math::{
        bipolar_to_unipolar, concave_inverted_transform, parabolic_sine, unipolar_to_bipolar,
        wrap_unit,
    },
    noise::NoiseSource,
    oscillator::{Frame, Oscillator, OscillatorCore, PULSE_WIDTH_DEFAULT},
};

/*
Low Frequency Oscillators
=========================

An LFO is the same phase accumulator as the audio oscillators, run at
sub-audio rates and read as a control signal. Aliasing is irrelevant down
here, so every shape is rendered trivially from phase.

Vocabulary
----------

  control-rate    ~0.01 Hz to ~20 Hz. The LFO modulates, it does not sound.

  bipolar         Output swings -1.0 to +1.0 (vibrato, pan).

  unipolar        Output stays in 0.0 to 1.0 (one-directional sweeps).

  quadrature      A second output a quarter cycle (90°) ahead of the
                  primary. Sine in, cosine out: handy for stereo wobble.


Run Modes
---------

    mode    start()                 end of cycle
    ----    ---------------------   ------------------------------
    Sync    reset phase, gate on    keep running
    Shot    reset phase, gate on    gate off, output 0 until start()
    Free    gate on only            keep running

Sync gives the same modulation shape on every note. Free ignores notes and
keeps drifting across them. Shot plays exactly one cycle: an envelope made
from an LFO shape.

In Shot mode the saw and triangle shapes become unipolar, so a one-shot
ramp goes 0 -> 1 (up-saw) or 1 -> 0 (down-saw) and settles at rest.


Shapes
------

    Sine          parabolic approximation, starts at 0 rising
    SawUp         ╱╱╱╱
    SawDown       ╲╲╲╲
    Triangle      starts at +1, -1 at half cycle
    Square        +1 for the first pulse_width % of the cycle, then -1
    Exponential   concave decay 1 -> 0 each cycle (unipolar)
    SampleHold    white noise held for one period
    PseudoSampleHold
                  pseudo-noise register held for one period

Held shapes have no meaningful phase, so they always run free and the
quadrature output repeats the held value.


Order of Work per Sample
------------------------

    1. gate off?             -> 0, no side effects
    2. wrapped last sample?  -> in Shot mode: gate off, 0
    3. render primary at phase, quadrature at phase + 0.25
    4. advance phase
    5. scale by amplitude × AM

The wrap is checked BEFORE rendering so the sample that would start the
second cycle of a one-shot is already silent.
*/

pub const LFO_FREQUENCY_DEFAULT: f64 = 5.0;

/// Phase offset of the quadrature output, in cycles.
const QUADRATURE_OFFSET: f64 = 0.25;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LfoWaveform {
    #[default]
    Sine,
    SawUp,
    SawDown,
    Triangle,
    Square,
    Exponential,
    SampleHold,
    PseudoSampleHold,
}

impl LfoWaveform {
    /// Random shapes that hold a value for a period instead of tracking phase.
    pub fn is_held(self) -> bool {
        matches!(self, Self::SampleHold | Self::PseudoSampleHold)
    }
}

/// How the LFO reacts to note starts and to the end of its cycle.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LfoMode {
    #[default]
    Sync,
    Shot,
    Free,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LfoParams {
    pub waveform: LfoWaveform,
    pub mode: LfoMode,
    /// Rate in Hz.
    pub frequency: f64,
    /// Output depth, 0.0 to 1.0.
    pub amplitude: f64,
    /// Square duty cycle in percent.
    pub pulse_width: f64,
}

impl Default for LfoParams {
    fn default() -> Self {
        Self {
            waveform: LfoWaveform::Sine,
            mode: LfoMode::Sync,
            frequency: LFO_FREQUENCY_DEFAULT,
            amplitude: 1.0,
            pulse_width: PULSE_WIDTH_DEFAULT,
        }
    }
}

pub struct Lfo {
    core: OscillatorCore,
    waveform: LfoWaveform,
    mode: LfoMode,
}

impl Lfo {
    pub fn new(sample_rate: f64) -> Self {
        Self::with_noise(sample_rate, NoiseSource::new())
    }

    pub fn with_noise(sample_rate: f64, noise: NoiseSource) -> Self {
        Self {
            core: OscillatorCore::new(sample_rate, noise),
            waveform: LfoWaveform::Sine,
            mode: LfoMode::Sync,
        }
    }

    pub fn waveform(&self) -> LfoWaveform {
        self.waveform
    }

    /// Effective run mode. Held shapes report `Free` whatever was requested.
    pub fn mode(&self) -> LfoMode {
        self.mode
    }

    /// Render one shape at `phase`. `phase` is always in [0, 1).
    #[inline]
    fn shape(&self, phase: f64) -> f64 {
        let one_shot = self.mode == LfoMode::Shot;
        match self.waveform {
            LfoWaveform::Sine => parabolic_sine(-(phase * 2.0 * PI - PI)),
            LfoWaveform::SawUp if one_shot => phase,
            LfoWaveform::SawUp => unipolar_to_bipolar(phase),
            LfoWaveform::SawDown if one_shot => 1.0 - phase,
            LfoWaveform::SawDown => -unipolar_to_bipolar(phase),
            LfoWaveform::Square => {
                if phase > self.core.pulse_width() / 100.0 {
                    -1.0
                } else {
                    1.0
                }
            }
            LfoWaveform::Triangle => {
                let tri = 2.0 * unipolar_to_bipolar(phase).abs() - 1.0;
                if one_shot {
                    bipolar_to_unipolar(tri)
                } else {
                    tri
                }
            }
            LfoWaveform::Exponential => concave_inverted_transform(phase),
            // rendered in oscillate(); they need mutable noise state
            LfoWaveform::SampleHold | LfoWaveform::PseudoSampleHold => 0.0,
        }
    }
}

impl Oscillator for Lfo {
    type Params = LfoParams;

    fn core(&self) -> &OscillatorCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut OscillatorCore {
        &mut self.core
    }

    fn reset(&mut self) {
        self.core.reset();
    }

    fn update(&mut self, params: &LfoParams) {
        self.waveform = params.waveform;
        self.mode = if params.waveform.is_held() {
            LfoMode::Free
        } else {
            params.mode
        };
        self.core.retune(
            params.frequency,
            1.0,
            0.0,
            params.pulse_width,
            params.amplitude,
        );
    }

    fn start(&mut self) {
        if self.mode != LfoMode::Free {
            self.reset();
        }
        self.core.set_note_on(true);
    }

    #[inline]
    fn oscillate(&mut self) -> Frame {
        if !self.core.is_note_on() {
            return Frame::SILENT;
        }

        if self.core.take_wrap() && self.mode == LfoMode::Shot {
            self.core.set_note_on(false);
            return Frame::SILENT;
        }

        let frame = match self.waveform {
            LfoWaveform::SampleHold => {
                let held = self.core.sample_hold(false);
                Frame {
                    primary: held,
                    aux: held,
                }
            }
            LfoWaveform::PseudoSampleHold => {
                let held = self.core.sample_hold(true);
                Frame {
                    primary: held,
                    aux: held,
                }
            }
            _ => {
                let phase = self.core.phase();
                Frame {
                    primary: self.shape(phase),
                    aux: self.shape(wrap_unit(phase + QUADRATURE_OFFSET)),
                }
            }
        };

        self.core.advance();

        frame.scaled(self.core.output_gain())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lfo(sample_rate: f64, waveform: LfoWaveform, mode: LfoMode, frequency: f64) -> Lfo {
        let mut lfo = Lfo::with_noise(sample_rate, NoiseSource::with_seed(5));
        lfo.update(&LfoParams {
            waveform,
            mode,
            frequency,
            ..LfoParams::default()
        });
        lfo
    }

    #[test]
    fn defaults_to_sync_sine() {
        let lfo = Lfo::new(48_000.0);
        assert_eq!(lfo.mode(), LfoMode::Sync);
        assert_eq!(lfo.waveform(), LfoWaveform::Sine);
        assert!(!lfo.is_note_on());
    }

    #[test]
    fn sine_scenario_at_one_hertz() {
        let mut lfo = lfo(44_100.0, LfoWaveform::Sine, LfoMode::Sync, 1.0);
        lfo.start();

        let out: Vec<f64> = (0..11_026).map(|_| lfo.oscillate().primary).collect();
        assert!(out[0].abs() < 1e-9, "sample 0 was {}", out[0]);
        assert!(out[1] > 0.0, "sine should rise from 0");
        assert!((out[11_025] - 1.0).abs() < 1e-3, "quarter cycle was {}", out[11_025]);
    }

    #[test]
    fn quadrature_leads_by_quarter_cycle() {
        // 256 Hz at 32768 Hz: 128 samples per cycle, exact in binary
        for waveform in [
            LfoWaveform::Sine,
            LfoWaveform::SawUp,
            LfoWaveform::Triangle,
            LfoWaveform::Square,
            LfoWaveform::Exponential,
        ] {
            let mut lfo = lfo(32_768.0, waveform, LfoMode::Sync, 256.0);
            lfo.start();
            let frames: Vec<Frame> = (0..256).map(|_| lfo.oscillate()).collect();
            for k in 0..128 {
                assert!(
                    (frames[k].aux - frames[k + 32].primary).abs() < 1e-12,
                    "{:?}: quad[{}] = {}, primary[{}] = {}",
                    waveform,
                    k,
                    frames[k].aux,
                    k + 32,
                    frames[k + 32].primary
                );
            }
        }
    }

    #[test]
    fn one_shot_plays_exactly_one_cycle() {
        let mut lfo = lfo(32_768.0, LfoWaveform::SawDown, LfoMode::Shot, 256.0);
        lfo.start();

        for i in 0..128 {
            let f = lfo.oscillate();
            assert!(f.primary > 0.0, "sample {} should sound, got {}", i, f.primary);
        }
        for i in 128..1024 {
            assert_eq!(lfo.oscillate(), Frame::SILENT, "sample {} should be silent", i);
        }
        assert!(!lfo.is_note_on());

        // retrigger plays the cycle again from the top
        lfo.start();
        assert!((lfo.oscillate().primary - 1.0).abs() < 1e-12);
    }

    #[test]
    fn one_shot_ramps_are_unipolar() {
        let mut up = lfo(32_768.0, LfoWaveform::SawUp, LfoMode::Shot, 256.0);
        let mut tri = lfo(32_768.0, LfoWaveform::Triangle, LfoMode::Shot, 256.0);
        up.start();
        tri.start();
        for _ in 0..128 {
            let u = up.oscillate().primary;
            let t = tri.oscillate().primary;
            assert!((0.0..1.0).contains(&u));
            assert!((0.0..=1.0).contains(&t));
        }
    }

    #[test]
    fn free_run_keeps_phase_across_notes() {
        let mut lfo = lfo(48_000.0, LfoWaveform::Triangle, LfoMode::Free, 3.0);
        lfo.start();
        for _ in 0..1000 {
            lfo.oscillate();
        }
        let phase = lfo.core().phase();
        assert!(phase > 0.0);

        lfo.stop();
        lfo.start();
        assert_eq!(lfo.core().phase(), phase);
    }

    #[test]
    fn sync_restarts_phase() {
        let mut lfo = lfo(48_000.0, LfoWaveform::SawUp, LfoMode::Sync, 3.0);
        lfo.start();
        for _ in 0..1000 {
            lfo.oscillate();
        }
        lfo.stop();
        lfo.start();
        assert_eq!(lfo.core().phase(), 0.0);
    }

    #[test]
    fn held_shapes_force_free_mode() {
        for waveform in [LfoWaveform::SampleHold, LfoWaveform::PseudoSampleHold] {
            let lfo = lfo(44_100.0, waveform, LfoMode::Shot, 441.0);
            assert_eq!(lfo.mode(), LfoMode::Free);
        }
        let lfo = lfo(44_100.0, LfoWaveform::Sine, LfoMode::Shot, 441.0);
        assert_eq!(lfo.mode(), LfoMode::Shot);
    }

    #[test]
    fn sample_hold_changes_once_per_period() {
        // hold = round(44100 / f) samples
        let cases = [(441.0, 100), (440.0, 100), (1000.0, 44)];
        for (frequency, hold) in cases {
            for waveform in [LfoWaveform::SampleHold, LfoWaveform::PseudoSampleHold] {
                let mut lfo = lfo(44_100.0, waveform, LfoMode::Sync, frequency);
                lfo.start();
                let frames: Vec<Frame> = (0..1000).map(|_| lfo.oscillate()).collect();

                let mut changes = Vec::new();
                for i in 1..frames.len() {
                    assert_eq!(frames[i].primary, frames[i].aux);
                    if frames[i].primary != frames[i - 1].primary {
                        changes.push(i);
                    }
                }
                assert!(changes.len() >= 8, "{:?}: only {} redraws", waveform, changes.len());
                assert_eq!(changes[0], hold);
                for pair in changes.windows(2) {
                    assert_eq!(pair[1] - pair[0], hold, "{waveform:?} at {frequency} Hz: {changes:?}");
                }
            }
        }
    }

    #[test]
    fn shapes_stay_in_range() {
        for waveform in [
            LfoWaveform::Sine,
            LfoWaveform::SawUp,
            LfoWaveform::SawDown,
            LfoWaveform::Triangle,
            LfoWaveform::Square,
            LfoWaveform::Exponential,
        ] {
            for pw in [2.0, 25.0, 50.0, 98.0] {
                let mut lfo = Lfo::with_noise(1000.0, NoiseSource::with_seed(1));
                lfo.update(&LfoParams {
                    waveform,
                    frequency: 7.0,
                    pulse_width: pw,
                    ..LfoParams::default()
                });
                lfo.start();
                for _ in 0..1000 {
                    let f = lfo.oscillate();
                    assert!((-1.0..=1.0).contains(&f.primary));
                    assert!((-1.0..=1.0).contains(&f.aux));
                }
            }
        }
    }

    #[test]
    fn square_duty_cycle() {
        let mut lfo = lfo(1000.0, LfoWaveform::Square, LfoMode::Sync, 1.0);
        lfo.update(&LfoParams {
            waveform: LfoWaveform::Square,
            frequency: 1.0,
            pulse_width: 25.0,
            ..LfoParams::default()
        });
        lfo.start();
        let high = (0..1000).filter(|_| lfo.oscillate().primary > 0.0).count();
        assert!((249..=252).contains(&high), "high for {} of 1000", high);
    }

    #[test]
    fn amplitude_scales_both_outputs() {
        let mut lfo = Lfo::with_noise(32_768.0, NoiseSource::with_seed(1));
        lfo.update(&LfoParams {
            waveform: LfoWaveform::Square,
            frequency: 256.0,
            amplitude: 0.5,
            ..LfoParams::default()
        });
        lfo.start();
        lfo.set_amplitude_mod(0.5);
        let f = lfo.oscillate();
        assert_eq!(f.primary, 0.25);
        assert_eq!(f.aux, 0.25);
    }
}
