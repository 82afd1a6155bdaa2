use nanovoice::dsp::{
    noise::NoiseSource,
    wavetable::{table_index, WavetableBank, BAND_CEILINGS, NUM_TABLES},
    OscParams, OscWaveform, Oscillator, QblOscillator, WavetableOscillator,
};
use rustfft::{num_complex::Complex, FftPlanner};

// 5 kHz at 40.96 kHz: exactly 500 cycles in 4096 samples, so every harmonic
// lands on a bin (multiples of 500) and nothing leaks between bins.
const SAMPLE_RATE: f64 = 40_960.0;
const FREQUENCY: f64 = 5_000.0;
const N: usize = 4096;
const FUNDAMENTAL_BIN: usize = 500;

/// Share of spectral energy outside the harmonic bins. Anything there is
/// aliasing folded back from above Nyquist.
fn alias_ratio(signal: &[f64]) -> f64 {
    let mut buffer: Vec<Complex<f64>> = signal.iter().map(|&s| Complex::new(s, 0.0)).collect();
    FftPlanner::<f64>::new().plan_fft_forward(N).process(&mut buffer);

    let mut total = 0.0;
    let mut aliased = 0.0;
    for (bin, value) in buffer.iter().enumerate().take(N / 2 + 1) {
        let power = value.norm_sqr();
        total += power;
        if bin == 0 || bin % FUNDAMENTAL_BIN != 0 {
            aliased += power;
        }
    }
    aliased / total
}

fn render<O: Oscillator<Params = OscParams>>(osc: &mut O) -> Vec<f64> {
    osc.update(&OscParams {
        waveform: OscWaveform::SawUp,
        frequency: FREQUENCY,
        ..OscParams::default()
    });
    osc.start();
    (0..N).map(|_| osc.oscillate().primary).collect()
}

fn trivial_saw() -> Vec<f64> {
    let increment = FREQUENCY / SAMPLE_RATE;
    let mut phase = 0.5;
    (0..N)
        .map(|_| {
            let s = 2.0 * phase - 1.0;
            phase = (phase + increment) % 1.0;
            s
        })
        .collect()
}

#[test]
fn wavetable_saw_has_no_aliasing() {
    let mut osc = WavetableOscillator::with_noise(SAMPLE_RATE, NoiseSource::with_seed(1));
    let wavetable = alias_ratio(&render(&mut osc));
    let trivial = alias_ratio(&trivial_saw());

    assert!(trivial > 0.05, "reference saw should alias, ratio {trivial}");
    assert!(wavetable < 1e-6, "wavetable saw aliased, ratio {wavetable}");
}

#[test]
fn dpw_saw_aliases_less_than_trivial() {
    let mut osc = QblOscillator::with_noise(SAMPLE_RATE, NoiseSource::with_seed(1));
    let dpw = alias_ratio(&render(&mut osc));
    let trivial = alias_ratio(&trivial_saw());

    assert!(
        dpw < trivial * 0.25,
        "DPW ratio {dpw} should be well below trivial {trivial}"
    );
}

#[test]
fn selected_table_stays_below_nyquist() {
    for &sample_rate in &[44_100.0, 48_000.0] {
        let bank = WavetableBank::new(sample_rate);
        let nyquist = sample_rate / 2.0;

        // log sweep 20 Hz .. 20480 Hz, 10 octaves
        for step in 0..=1000 {
            let frequency = 20.0 * 2.0_f64.powf(step as f64 / 100.0);
            let harmonics = bank.harmonics(table_index(frequency));
            assert!(
                harmonics as f64 * frequency < nyquist,
                "{} harmonics at {:.1} Hz exceed Nyquist at {} Hz",
                harmonics,
                frequency,
                sample_rate
            );
        }
    }
}

#[test]
fn tables_get_coarser_as_pitch_rises() {
    let bank = WavetableBank::new(44_100.0);
    let mut last_index = 0;
    let mut last_harmonics = usize::MAX;

    for step in 0..=1000 {
        let frequency = 20.0 * 2.0_f64.powf(step as f64 / 100.0);
        let index = table_index(frequency);
        let harmonics = bank.harmonics(index);

        assert!(index >= last_index, "index fell back at {frequency} Hz");
        assert!(harmonics <= last_harmonics, "table got richer at {frequency} Hz");
        assert!(index < NUM_TABLES);
        last_index = index;
        last_harmonics = harmonics;
    }
    assert_eq!(last_index, NUM_TABLES - 1);
    assert_eq!(BAND_CEILINGS.len(), NUM_TABLES);
}
