/// Convert MIDI note number to frequency in Hz.
/// A4 = 440 Hz = MIDI note 69
#[inline]
pub fn midi_note_to_freq(note: u8) -> f32 {
    440.0 * 2.0_f32.powf((note as f32 - 69.0) / 12.0)
}

/// Context passed to graph nodes during rendering
///
/// - sample_rate: Audio sample rate (e.g., 48000.0)
/// - frequency: Pitch of the sounding note (Hz)
/// - velocity: Intensity/loudness (0.0-127.0, MIDI-style)
/// - pitch_bend: Bend in semitones, already scaled by the bend range
pub struct RenderCtx {
    pub sample_rate: f32,
    pub frequency: f32,
    pub velocity: f32,
    pub pitch_bend: f32,
}

impl RenderCtx {
    /// Create context from MIDI note (keyboard/sequencer use case)
    pub fn from_note(sample_rate: f32, note: u8, velocity: f32) -> Self {
        Self::from_freq(sample_rate, midi_note_to_freq(note), velocity)
    }

    /// Create context from direct frequency
    pub fn from_freq(sample_rate: f32, frequency: f32, velocity: f32) -> Self {
        Self {
            sample_rate,
            frequency,
            velocity,
            pitch_bend: 0.0,
        }
    }

    pub fn with_pitch_bend(self, semitones: f32) -> Self {
        Self {
            pitch_bend: semitones,
            ..self
        }
    }
}

/// Block-rendering wrapper around a generator.
///
/// Nodes render one block per call and follow note events. The generator
/// inside is gated: it is silent until `note_on` starts it.
pub trait GraphNode: Send {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx);

    /// Triggered when a note starts
    fn note_on(&mut self, _ctx: &RenderCtx) {}

    /// Triggered when a note is released
    fn note_off(&mut self, _ctx: &RenderCtx) {}

    /// Check if this node is still producing sound
    fn is_active(&self) -> bool {
        true
    }
}

/// Allow boxed graph nodes to be used as graph nodes (for dynamic dispatch)
impl GraphNode for Box<dyn GraphNode> {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        (**self).render_block(out, ctx)
    }

    fn note_on(&mut self, ctx: &RenderCtx) {
        (**self).note_on(ctx)
    }

    fn note_off(&mut self, ctx: &RenderCtx) {
        (**self).note_off(ctx)
    }

    fn is_active(&self) -> bool {
        (**self).is_active()
    }
}
