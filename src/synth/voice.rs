#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use log::info;

use crate::{
    dsp::{
        lfo::{Lfo, LfoParams},
        oscillator::{
            Frame, OscParams, OscWaveform, Oscillator, FO_MOD_RANGE, PITCH_BEND_RANGE,
        },
        qbl::QblOscillator,
        wavetable::WavetableOscillator,
    },
    graph::node::{midi_note_to_freq, GraphNode, RenderCtx},
    synth::message::{MessageReceiver, SynthMessage},
};

/*
Mono Voice
==========

Two pitched oscillators and one LFO, wired the classic way:

    LFO ──× depth × FO_MOD_RANGE──► exponential FM ─┐
                                                   ├─► osc 1 ─┐
    bend ──× PITCH_BEND_RANGE─────► pitch bend ─────┤          ├─► mix ─► out
                                                   └─► osc 2 ─┘

Per sample, in this order:

    1. LFO renders (its update() ran once at the top of the block)
    2. LFO value and bend are written into both oscillators
    3. each oscillator runs update() then oscillate()
    4. the two are mixed at equal gain and scaled by velocity × volume

The oscillators update every sample so vibrato is smooth. The LFO itself
only needs block-rate updates.

Notes
-----

Monophonic, last-note priority: a new note restarts all three generators
(the LFO according to its run mode). A note-off only silences the voice if
it matches the sounding note, so releasing an old key while holding a
newer one does nothing. NoteOn with velocity 0 is a note-off, as in MIDI.
*/

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoiceParams {
    pub osc1: OscParams,
    pub osc2: OscParams,
    pub lfo: LfoParams,
    /// LFO → pitch depth, 0.0 to 1.0 (full depth = FO_MOD_RANGE semitones).
    pub lfo_depth: f64,
    /// Master output gain.
    pub volume: f64,
}

impl Default for VoiceParams {
    fn default() -> Self {
        Self {
            osc1: OscParams {
                waveform: OscWaveform::SawUp,
                ..OscParams::default()
            },
            osc2: OscParams {
                waveform: OscWaveform::SawUp,
                cents: 7,
                ..OscParams::default()
            },
            lfo: LfoParams::default(),
            lfo_depth: 0.0,
            volume: 0.5,
        }
    }
}

pub struct MonoVoice<O> {
    osc1: O,
    osc2: O,
    lfo: Lfo,
    params: VoiceParams,
    note: Option<u8>,
    gain: f64,
    pitch_bend: f64, // -1.0 to +1.0
}

impl MonoVoice<WavetableOscillator> {
    pub fn wavetable(sample_rate: f64) -> Self {
        Self::new(
            WavetableOscillator::new(sample_rate),
            WavetableOscillator::new(sample_rate),
            Lfo::new(sample_rate),
            VoiceParams::default(),
        )
    }
}

impl MonoVoice<QblOscillator> {
    pub fn qbl(sample_rate: f64) -> Self {
        Self::new(
            QblOscillator::new(sample_rate),
            QblOscillator::new(sample_rate),
            Lfo::new(sample_rate),
            VoiceParams::default(),
        )
    }
}

impl<O: Oscillator<Params = OscParams>> MonoVoice<O> {
    pub fn new(osc1: O, osc2: O, lfo: Lfo, params: VoiceParams) -> Self {
        Self {
            osc1,
            osc2,
            lfo,
            params,
            note: None,
            gain: 0.0,
            pitch_bend: 0.0,
        }
    }

    pub fn with_params(mut self, params: VoiceParams) -> Self {
        self.params = params;
        self
    }

    pub fn params(&self) -> &VoiceParams {
        &self.params
    }

    /// Control-rate edits. Picked up at the next render.
    pub fn params_mut(&mut self) -> &mut VoiceParams {
        &mut self.params
    }

    /// Not realtime-safe for wavetable voices: the table banks are rebuilt.
    pub fn set_sample_rate(&mut self, sample_rate: f64) {
        info!("voice sample rate set to {sample_rate} Hz");
        self.osc1.set_sample_rate(sample_rate);
        self.osc2.set_sample_rate(sample_rate);
        self.lfo.set_sample_rate(sample_rate);
    }

    /// Currently sounding note, if any.
    pub fn note(&self) -> Option<u8> {
        self.note
    }

    pub fn oscillators(&self) -> (&O, &O) {
        (&self.osc1, &self.osc2)
    }

    pub fn lfo(&self) -> &Lfo {
        &self.lfo
    }

    pub fn is_active(&self) -> bool {
        self.osc1.is_note_on() || self.osc2.is_note_on()
    }

    pub fn handle(&mut self, msg: SynthMessage) {
        match msg {
            SynthMessage::NoteOn { note, velocity: 0 } => self.release(note),
            SynthMessage::NoteOn { note, velocity } => {
                self.note = Some(note);
                self.trigger(midi_note_to_freq(note) as f64, velocity as f64);
            }
            SynthMessage::NoteOff { note, .. } => self.release(note),
            SynthMessage::PitchBend { amount } => {
                self.pitch_bend = (amount as f64).clamp(-1.0, 1.0);
            }
            SynthMessage::AllNotesOff => self.silence(),
        }
    }

    /// Drain every pending control message.
    pub fn process_messages<R: MessageReceiver + ?Sized>(&mut self, rx: &mut R) {
        while let Some(msg) = rx.pop() {
            self.handle(msg);
        }
    }

    fn trigger(&mut self, frequency: f64, velocity: f64) {
        self.params.osc1.frequency = frequency;
        self.params.osc2.frequency = frequency;
        self.gain = (velocity / 127.0).clamp(0.0, 1.0);

        // mode must be current before the LFO decides whether to reset
        self.lfo.update(&self.params.lfo);
        self.lfo.start();

        // waveform must be current before reset picks the start phase
        self.osc1.update(&self.params.osc1);
        self.osc2.update(&self.params.osc2);
        self.osc1.start();
        self.osc2.start();
    }

    fn release(&mut self, note: u8) {
        if self.note == Some(note) {
            self.silence();
        }
    }

    fn silence(&mut self) {
        self.note = None;
        self.osc1.stop();
        self.osc2.stop();
        self.lfo.stop();
    }

    #[inline]
    fn next_frame(&mut self) -> Frame {
        let lfo = self.lfo.oscillate().primary;
        let fo_mod = lfo * self.params.lfo_depth * FO_MOD_RANGE;
        let bend = self.pitch_bend * PITCH_BEND_RANGE;

        for (osc, params) in [
            (&mut self.osc1, &self.params.osc1),
            (&mut self.osc2, &self.params.osc2),
        ] {
            osc.set_fo_mod_exp(fo_mod);
            osc.set_pitch_bend_mod(bend);
            osc.update(params);
        }

        let a = self.osc1.oscillate();
        let b = self.osc2.oscillate();
        Frame {
            primary: a.primary + b.primary,
            aux: a.aux + b.aux,
        }
        .scaled(0.5 * self.gain * self.params.volume)
    }

    /// Render a mono block.
    pub fn render(&mut self, out: &mut [f32]) {
        self.lfo.update(&self.params.lfo);
        for sample in out.iter_mut() {
            *sample = self.next_frame().primary as f32;
        }
    }

    /// Render left from the primary outputs and right from the aux outputs.
    pub fn render_stereo(&mut self, left: &mut [f32], right: &mut [f32]) {
        self.lfo.update(&self.params.lfo);
        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            let frame = self.next_frame();
            *l = frame.primary as f32;
            *r = frame.aux as f32;
        }
    }
}

/// Lets a voice sit wherever a graph node is expected. The note comes from
/// `ctx.frequency`; pitch bend still arrives through `handle()`.
impl<O: Oscillator<Params = OscParams> + Send> GraphNode for MonoVoice<O> {
    fn render_block(&mut self, out: &mut [f32], _ctx: &RenderCtx) {
        self.render(out);
    }

    fn note_on(&mut self, ctx: &RenderCtx) {
        self.note = None;
        self.trigger(ctx.frequency as f64, ctx.velocity as f64);
    }

    fn note_off(&mut self, _ctx: &RenderCtx) {
        self.silence();
    }

    fn is_active(&self) -> bool {
        MonoVoice::is_active(self)
    }
}
