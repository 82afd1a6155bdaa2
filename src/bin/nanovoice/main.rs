//! nanovoice - plays a short phrase through the mono voice
//!
//! Run with: cargo run --features cli [-- wavetable|qbl]

mod app;

use app::Player;
use color_eyre::eyre::eyre;
use nanovoice::{
    dsp::{LfoMode, LfoWaveform, OscWaveform},
    synth::VoiceParams,
};

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let engine = match std::env::args().nth(1).as_deref() {
        None | Some("wavetable") => app::Engine::Wavetable,
        Some("qbl") => app::Engine::Qbl,
        Some(other) => return Err(eyre!("unknown engine '{other}', expected wavetable or qbl")),
    };

    let mut params = VoiceParams::default();
    params.osc2.waveform = OscWaveform::Square;
    params.osc2.octave = -1;
    params.lfo.waveform = LfoWaveform::Sine;
    params.lfo.mode = LfoMode::Sync;
    params.lfo.frequency = 5.5;
    params.lfo_depth = 0.15;

    // (MIDI note, beats)
    let phrase = [
        (57, 1.0),
        (60, 1.0),
        (64, 1.0),
        (69, 2.0),
        (67, 0.5),
        (64, 0.5),
        (60, 2.0),
    ];

    Player::new(engine, params).bpm(100.0).run(&phrase)
}
