use std::f64::consts::{FRAC_PI_2, TAU};

use log::debug;

use crate::dsp::{
    math::wrap_unit,
    noise::NoiseSource,
    oscillator::{Frame, OscParams, OscWaveform, Oscillator, OscillatorCore, FO_MAX},
};

/*
Band-Limited Wavetables
=======================

A naive sawtooth (phase mapped straight to -1..+1) has harmonics all the
way up. Everything above Nyquist (sample_rate / 2) folds back down as
inharmonic junk - aliasing. The wavetable generator avoids it by never
playing a table that contains a harmonic the current pitch would push past
Nyquist.

Vocabulary
----------

  table       One cycle of a waveform, TABLE_LEN samples long, built by
              summing sines (additive synthesis).

  bank        One table per frequency band, for each waveform family.
              Low bands hold many harmonics, high bands few.

  band        A range of fundamentals that share a table. Bands here are
              octaves of A0 (27.5 Hz).

  read index  phase × TABLE_LEN, a fractional position into the table.


Band Layout
-----------

    band   ceiling (Hz)   harmonics @ 44.1 kHz
    ----   ------------   --------------------
      0          55              255   (table length limit)
      1         110              200
      2         220              100
      3         440               50
      4         880               25
      5        1760               12
      6        3520                6
      7        7040                3
      8       20480                1   (pure sine)

A band's harmonic count is chosen so that its TOP harmonic, played at the
band's ceiling, is still strictly below Nyquist:

    harmonics = max(1, ceil(nyquist / ceiling) - 1)

A 512-sample table cannot hold more than 255 harmonics without folding
inside the table itself, so the count is capped there.

Any fundamental inside the band is at or below the ceiling, so it is safe
too. Higher bands are never richer than lower ones.


Additive Recipes
----------------

    saw:       Σ  (-1)^(g+1) · sin(g·x) / g          g = 1..N
    triangle:  Σ  (-1)^k · sin((2k+1)·x) / (2k+1)²   odd harmonics ≤ N

Both are normalised to a peak of 1.0 after summing.

The saw sum describes a ramp that crosses zero at x = 0 and jumps at x = π,
so its "start" (the -1 end of the ramp) sits in the MIDDLE of the table.
That is why saw and triangle phase restarts at 0.5.


Square From Two Saws
--------------------

No square tables are stored. Subtracting a saw from a copy of itself shifted
by the pulse width leaves a pulse:

    saw(φ) - saw(φ + pw)      -> pulse, high for pw of the cycle

The raw difference swings between -2·pw·A and (2 - 2·pw)·A, where A is the
saw's plateau amplitude in the normalised table. Adding (2·pw - 1)·A centres
it, and a per-band correction factor (2 / peak-to-peak of the 50% pulse)
scales it onto ±1. The result is clamped so Gibbs ripple at extreme widths
cannot escape [-1, 1].


Interpolation
-------------

Reads use linear interpolation between neighbouring entries. The read
index is wrapped modulo TABLE_LEN before use - phase modulation can push it
anywhere, including negative - so the integer index is always in bounds.
*/

/// Samples per table.
pub const TABLE_LEN: usize = 512;
/// Tables per waveform family.
pub const NUM_TABLES: usize = 9;

/// Upper frequency (Hz) covered by each table. Octaves of A0, with the last
/// band stretched to the frequency ceiling.
pub const BAND_CEILINGS: [f64; NUM_TABLES] = [
    55.0, 110.0, 220.0, 440.0, 880.0, 1760.0, 3520.0, 7040.0, FO_MAX,
];

type Table = [f64; TABLE_LEN];

/// Index of the table that keeps `frequency`'s harmonics below Nyquist.
/// Negative frequencies use their magnitude; anything out of range picks
/// the coarsest table.
#[inline]
pub fn table_index(frequency: f64) -> usize {
    let frequency = frequency.abs();
    BAND_CEILINGS
        .iter()
        .position(|&ceiling| frequency <= ceiling)
        .unwrap_or(NUM_TABLES - 1)
}

/// Most harmonics a table can hold without folding inside the table.
const MAX_HARMONICS: usize = TABLE_LEN / 2 - 1;

/// Highest harmonic that stays strictly below Nyquist for every
/// fundamental up to `ceiling`.
fn harmonics_for_band(sample_rate: f64, ceiling: f64) -> usize {
    let nyquist = sample_rate * 0.5;
    let harmonics = (nyquist / ceiling).ceil() - 1.0;
    if harmonics.is_finite() && harmonics >= 1.0 {
        (harmonics as usize).min(MAX_HARMONICS)
    } else {
        1
    }
}

/// Wrap a fractional table position into [0, TABLE_LEN).
#[inline]
fn wrap_index(index: f64) -> f64 {
    wrap_unit(index / TABLE_LEN as f64) * TABLE_LEN as f64
}

/// Linear-interpolated read at `phase` (in cycles, any value).
#[inline]
fn read(table: &Table, phase: f64) -> f64 {
    let index = wrap_index(phase * TABLE_LEN as f64);
    let i0 = (index as usize).min(TABLE_LEN - 1);
    let i1 = (i0 + 1) % TABLE_LEN;
    let frac = index - i0 as f64;

    table[i0] + frac * (table[i1] - table[i0])
}

/// Scale a table so its largest magnitude is 1.0. Returns the divisor.
fn normalize(table: &mut Table) -> f64 {
    let peak = table.iter().fold(0.0_f64, |acc, s| acc.max(s.abs()));
    if peak > 0.0 {
        table.iter_mut().for_each(|s| *s /= peak);
        peak
    } else {
        1.0
    }
}

/// Saw table plus its plateau amplitude after normalisation (the raw
/// series converges to a ramp of height π/2).
fn build_saw(harmonics: usize) -> (Box<Table>, f64) {
    let mut table = Box::new([0.0; TABLE_LEN]);
    for (i, sample) in table.iter_mut().enumerate() {
        let x = TAU * i as f64 / TABLE_LEN as f64;
        *sample = (1..=harmonics)
            .map(|g| {
                let sign = if g % 2 == 1 { 1.0 } else { -1.0 };
                sign * (g as f64 * x).sin() / g as f64
            })
            .sum();
    }
    let peak = normalize(&mut table);
    (table, FRAC_PI_2 / peak)
}

fn build_triangle(harmonics: usize) -> Box<Table> {
    let mut table = Box::new([0.0; TABLE_LEN]);
    for (i, sample) in table.iter_mut().enumerate() {
        let x = TAU * i as f64 / TABLE_LEN as f64;
        *sample = (0..)
            .map(|k| 2 * k + 1)
            .take_while(|&n| n <= harmonics)
            .enumerate()
            .map(|(k, n)| {
                let sign = if k % 2 == 0 { 1.0 } else { -1.0 };
                let n = n as f64;
                sign * (n * x).sin() / (n * n)
            })
            .sum();
    }
    normalize(&mut table);
    table
}

/// 2 / peak-to-peak of the 50% pulse made from this saw table.
fn pulse_correction(saw: &Table) -> f64 {
    let half = TABLE_LEN / 2;
    let (lo, hi) = (0..TABLE_LEN)
        .map(|i| saw[i] - saw[(i + half) % TABLE_LEN])
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), d| {
            (lo.min(d), hi.max(d))
        });
    let span = hi - lo;
    if span > 0.0 {
        2.0 / span
    } else {
        1.0
    }
}

/// Pre-computed tables for one sample rate. Built off the audio thread,
/// read-only while rendering.
#[derive(Debug, Clone)]
pub struct WavetableBank {
    sample_rate: f64,
    sine: Box<Table>,
    saw: Vec<Box<Table>>,
    triangle: Vec<Box<Table>>,
    harmonics: [usize; NUM_TABLES],
    saw_amplitude: [f64; NUM_TABLES],
    square_correction: [f64; NUM_TABLES],
}

impl WavetableBank {
    /// Allocates and fills every table. Not realtime-safe.
    pub fn new(sample_rate: f64) -> Self {
        let mut sine = Box::new([0.0; TABLE_LEN]);
        for (i, sample) in sine.iter_mut().enumerate() {
            *sample = (TAU * i as f64 / TABLE_LEN as f64).sin();
        }

        let harmonics =
            BAND_CEILINGS.map(|ceiling| harmonics_for_band(sample_rate, ceiling));

        let mut saw = Vec::with_capacity(NUM_TABLES);
        let mut saw_amplitude = [1.0; NUM_TABLES];
        let mut square_correction = [1.0; NUM_TABLES];
        for (i, &h) in harmonics.iter().enumerate() {
            let (table, amplitude) = build_saw(h);
            saw_amplitude[i] = amplitude;
            square_correction[i] = pulse_correction(&table);
            saw.push(table);
        }
        let triangle = harmonics.iter().map(|&h| build_triangle(h)).collect();

        debug!(
            "built wavetable bank at {sample_rate} Hz: {NUM_TABLES} bands, harmonics {harmonics:?}"
        );

        Self {
            sample_rate,
            sine,
            saw,
            triangle,
            harmonics,
            saw_amplitude,
            square_correction,
        }
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Harmonic count of the table at `index`.
    pub fn harmonics(&self, index: usize) -> usize {
        self.harmonics[index.min(NUM_TABLES - 1)]
    }

    #[inline]
    pub fn sine(&self, phase: f64) -> f64 {
        read(&self.sine, phase)
    }

    #[inline]
    pub fn saw(&self, index: usize, phase: f64) -> f64 {
        read(&self.saw[index.min(NUM_TABLES - 1)], phase)
    }

    #[inline]
    pub fn triangle(&self, index: usize, phase: f64) -> f64 {
        read(&self.triangle[index.min(NUM_TABLES - 1)], phase)
    }

    /// Pulse from two saw reads, duty cycle `width` (0..1), within [-1, 1].
    #[inline]
    pub fn square(&self, index: usize, phase: f64, width: f64) -> f64 {
        let index = index.min(NUM_TABLES - 1);
        let table = &self.saw[index];
        let pulse = read(table, phase) - read(table, phase + width);
        let centre = (2.0 * width - 1.0) * self.saw_amplitude[index];
        ((pulse + centre) * self.square_correction[index]).clamp(-1.0, 1.0)
    }
}

/// Table-lookup oscillator with per-note band selection.
pub struct WavetableOscillator {
    core: OscillatorCore,
    bank: WavetableBank,
    waveform: OscWaveform,
    table_index: usize,
}

impl WavetableOscillator {
    pub fn new(sample_rate: f64) -> Self {
        Self::with_noise(sample_rate, NoiseSource::new())
    }

    /// Construct with a specific noise source (e.g. seeded for tests).
    pub fn with_noise(sample_rate: f64, noise: NoiseSource) -> Self {
        Self {
            core: OscillatorCore::new(sample_rate, noise),
            bank: WavetableBank::new(sample_rate),
            waveform: OscWaveform::Sine,
            table_index: 0,
        }
    }

    pub fn waveform(&self) -> OscWaveform {
        self.waveform
    }

    /// Band selected by the last `update()`.
    pub fn table_index(&self) -> usize {
        self.table_index
    }

    pub fn bank(&self) -> &WavetableBank {
        &self.bank
    }
}

impl Oscillator for WavetableOscillator {
    type Params = OscParams;

    fn core(&self) -> &OscillatorCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut OscillatorCore {
        &mut self.core
    }

    /// Rebuilds the bank: harmonic counts depend on Nyquist.
    fn set_sample_rate(&mut self, sample_rate: f64) {
        self.core.set_sample_rate(sample_rate);
        if self.bank.sample_rate() != sample_rate {
            self.bank = WavetableBank::new(sample_rate);
        }
    }

    fn reset(&mut self) {
        self.core.reset();
        if self.waveform.starts_mid_cycle() {
            self.core.reset_phase(0.5);
        }
    }

    fn update(&mut self, params: &OscParams) {
        self.waveform = params.waveform;
        self.core.retune(
            params.frequency,
            params.ratio,
            params.pitch_offset(),
            params.pulse_width,
            params.amplitude,
        );
        self.table_index = table_index(self.core.frequency());
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

        let phase = self.core.phase() + self.core.modulation().phase;
        let index = self.table_index;

        let out = match self.waveform {
            OscWaveform::Sine => self.bank.sine(phase),
            OscWaveform::SawUp => self.bank.saw(index, phase),
            OscWaveform::SawDown => -self.bank.saw(index, phase),
            OscWaveform::Triangle => self.bank.triangle(index, phase),
            OscWaveform::Square => {
                self.bank
                    .square(index, phase, self.core.pulse_width() / 100.0)
            }
            OscWaveform::Noise => self.core.noise_mut().white(),
            OscWaveform::PseudoNoise => self.core.noise_mut().pseudo(),
        };

        self.core.advance();

        // mono source: right channel mirrors left
        Frame {
            primary: out,
            aux: out,
        }
        .scaled(self.core.output_gain())
    }
}
