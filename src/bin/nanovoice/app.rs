//! Player - opens the output device and streams the voice

use std::{thread, time::Duration};

use color_eyre::eyre::{eyre, Result as EyreResult, WrapErr};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use log::{info, warn};
use rtrb::{Consumer, Producer, RingBuffer};

use nanovoice::{
    dsp::{OscParams, Oscillator},
    synth::{MonoVoice, SynthMessage, VoiceParams},
};

/// Frames rendered between control-message checks (0.7 ms at 44.1 kHz).
const CONTROL_BLOCK: usize = 32;
const QUEUE_CAPACITY: usize = 64;
/// Fraction of each note that is held before the note-off.
const GATE: f64 = 0.9;

#[derive(Debug, Clone, Copy)]
pub enum Engine {
    Wavetable,
    Qbl,
}

pub struct Player {
    engine: Engine,
    params: VoiceParams,
    bpm: f64,
}

impl Player {
    pub fn new(engine: Engine, params: VoiceParams) -> Self {
        Self {
            engine,
            params,
            bpm: 120.0,
        }
    }

    pub fn bpm(mut self, bpm: f64) -> Self {
        self.bpm = bpm;
        self
    }

    /// Play `(note, beats)` pairs, then return once the tail has rung out.
    pub fn run(self, phrase: &[(u8, f64)]) -> EyreResult<()> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| eyre!("no default output device available"))?;
        let config = device
            .default_output_config()
            .wrap_err("failed to fetch default output config")?;

        let sample_rate = config.sample_rate().0 as f64;
        let channels = config.channels() as usize;
        info!("output device config: {config:?}");

        println!("=== nanovoice ===");
        println!("Engine: {:?}", self.engine);
        println!("BPM: {}", self.bpm);
        println!("Sample rate: {} Hz", sample_rate);
        println!("Channels: {}", channels);
        println!();

        let (mut tx, rx) = RingBuffer::<SynthMessage>::new(QUEUE_CAPACITY);

        let stream = match self.engine {
            Engine::Wavetable => {
                let voice = MonoVoice::wavetable(sample_rate).with_params(self.params);
                build_stream(&device, &config.into(), channels, voice, rx)?
            }
            Engine::Qbl => {
                let voice = MonoVoice::qbl(sample_rate).with_params(self.params);
                build_stream(&device, &config.into(), channels, voice, rx)?
            }
        };
        stream.play().wrap_err("failed to start output stream")?;

        let beat = 60.0 / self.bpm;
        for &(note, beats) in phrase {
            let length = beat * beats;
            println!("  note {note} for {beats} beats");
            send(&mut tx, SynthMessage::NoteOn { note, velocity: 100 })?;
            thread::sleep(Duration::from_secs_f64(length * GATE));
            send(&mut tx, SynthMessage::NoteOff { note, velocity: 0 })?;
            thread::sleep(Duration::from_secs_f64(length * (1.0 - GATE)));
        }

        send(&mut tx, SynthMessage::AllNotesOff)?;
        thread::sleep(Duration::from_millis(250));
        println!("Done.");
        Ok(())
    }
}

fn send(tx: &mut Producer<SynthMessage>, msg: SynthMessage) -> EyreResult<()> {
    tx.push(msg)
        .map_err(|_| eyre!("control queue full, audio thread not draining"))
}

fn build_stream<O>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    channels: usize,
    mut voice: MonoVoice<O>,
    mut rx: Consumer<SynthMessage>,
) -> EyreResult<cpal::Stream>
where
    O: Oscillator<Params = OscParams> + Send + 'static,
{
    let mut left = [0.0f32; CONTROL_BLOCK];
    let mut right = [0.0f32; CONTROL_BLOCK];

    let stream = device
        .build_output_stream(
            config,
            move |data: &mut [f32], _| {
                for chunk in data.chunks_mut(CONTROL_BLOCK * channels) {
                    voice.process_messages(&mut rx);

                    let frames = chunk.len() / channels;
                    let (l, r) = (&mut left[..frames], &mut right[..frames]);
                    voice.render_stereo(l, r);

                    for (i, frame) in chunk.chunks_mut(channels).enumerate() {
                        for (ch, out) in frame.iter_mut().enumerate() {
                            *out = if ch == 1 { r[i] } else { l[i] };
                        }
                    }
                }
            },
            |err| warn!("audio stream error: {err}"),
            None,
        )
        .wrap_err("failed to build output stream")?;

    Ok(stream)
}
