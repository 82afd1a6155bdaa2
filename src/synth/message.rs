#[cfg(feature = "rtrb")]
use rtrb::Consumer;

/// Control events sent from the UI/MIDI thread to the audio thread.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum SynthMessage {
    NoteOn { note: u8, velocity: u8 },
    NoteOff { note: u8, velocity: u8 },
    /// Bend wheel position, -1.0 (full down) to +1.0 (full up).
    PitchBend { amount: f32 },
    AllNotesOff,
}

impl SynthMessage {
    /// Build a pitch bend from a signed 14-bit MIDI value (-8192..=8191).
    pub fn pitch_bend(value: i16) -> Self {
        let amount = if value < 0 {
            value as f32 / 8192.0
        } else {
            value as f32 / 8191.0
        };
        Self::PitchBend {
            amount: amount.clamp(-1.0, 1.0),
        }
    }
}

pub trait MessageReceiver {
    fn pop(&mut self) -> Option<SynthMessage>;
}

#[cfg(feature = "rtrb")]
impl MessageReceiver for Consumer<SynthMessage> {
    fn pop(&mut self) -> Option<SynthMessage> {
        Consumer::pop(self).ok()
    }
}
