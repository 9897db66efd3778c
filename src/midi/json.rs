//! JSON serialization types for parsed scores

use super::event::NoteEvent;
use crate::sequencer::Score;
use serde::Serialize;

/// Top-level JSON structure for a parsed score
#[derive(Debug, Clone, Serialize)]
pub struct ScoreJson {
    /// Tempo in beats per minute
    pub bpm: u32,
    /// Beat unit in effect at the end of the score
    pub pulses_per_beat: u32,
    /// Final tick of each voice
    pub voice_ticks: Vec<u32>,
    /// Nominal length in ticks
    pub end_tick: u32,
    /// Events in playback order
    pub events: Vec<EventJson>,
}

/// One decoded note event
#[derive(Debug, Clone, Serialize)]
pub struct EventJson {
    pub tick: u32,
    #[serde(flatten)]
    pub kind: EventKind,
    pub channel: u8,
    pub note: u8,
    /// Packed 32-bit value
    pub raw: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    NoteOn,
    NoteOff,
}

impl ScoreJson {
    pub fn new(score: &Score) -> Self {
        Self {
            bpm: score.beats_per_minute(),
            pulses_per_beat: score.pulses_per_beat(),
            voice_ticks: score.voice_ticks().to_vec(),
            end_tick: score.end_tick(),
            events: score.events().iter().copied().map(EventJson::from).collect(),
        }
    }
}

impl From<NoteEvent> for EventJson {
    fn from(event: NoteEvent) -> Self {
        Self {
            tick: event.tick(),
            kind: if event.is_note_on() {
                EventKind::NoteOn
            } else {
                EventKind::NoteOff
            },
            channel: event.channel(),
            note: event.note(),
            raw: event.raw(),
        }
    }
}
