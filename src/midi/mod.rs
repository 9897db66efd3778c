pub mod event;
pub mod json;

pub use event::{encode_note, gate_time, MidiMessage, NoteEvent};
pub use json::ScoreJson;
