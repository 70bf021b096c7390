//! Speech-to-text collaborator: turns a downloaded voice payload into plain
//! text the bridge forwards exactly like a typed message.

pub mod stt;

pub use stt::{AudioFormat, SttProvider, TranscribeRequest, Transcript, WhisperStt};
