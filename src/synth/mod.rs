// Purpose: the playable voice and the messages that drive it
// This layer sits above the generators and graph nodes

pub mod message;
pub mod voice;

pub use message::{MessageReceiver, SynthMessage};
pub use voice::{MonoVoice, VoiceParams};
