//! Score parser - turns plaintext notation into sorted note events
//!
//! Input is line oriented. The first byte of a line selects what it holds:
//!
//! - `#` comment
//! - `U` beat unit, e.g. `U 1/8`
//! - `B` tempo in beats per minute, e.g. `B 120`
//! - `1`..`4` staff line for voice 1..4, e.g. `1| C2 E G {CEG}4`
//!
//! Lines end with `\n`, `\r` or `\r\n`.

pub mod cursor;
pub mod header;
pub mod staff;

use crate::error::{Error, Result};
use crate::midi::event::NoteEvent;
use cursor::{ByteCursor, COMMENT};
use staff::VOICES;
use std::io::Read;

/// Tick resolution, independent of the notation's beat unit
pub const PULSES_PER_QUARTER: u32 = 24;

/// Default tempo when the score has no `B` line
pub const DEFAULT_BPM: u32 = 120;

/// Parsed score: tempo, per-voice cursors and sorted packed events
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Score {
    pub(crate) pulses_per_beat: u32,
    pub(crate) beats_per_minute: u32,
    pub(crate) voice_ticks: [u32; VOICES],
    pub(crate) events: Vec<NoteEvent>,
}

impl Score {
    pub(crate) fn new() -> Self {
        Self {
            pulses_per_beat: PULSES_PER_QUARTER,
            beats_per_minute: DEFAULT_BPM,
            voice_ticks: [0; VOICES],
            events: Vec::new(),
        }
    }

    /// Beat unit in effect at the end of the score
    pub fn pulses_per_beat(&self) -> u32 {
        self.pulses_per_beat
    }

    pub fn beats_per_minute(&self) -> u32 {
        self.beats_per_minute
    }

    /// Final tick cursor of each voice
    pub fn voice_ticks(&self) -> &[u32; VOICES] {
        &self.voice_ticks
    }

    /// Events in ascending packed order
    pub fn events(&self) -> &[NoteEvent] {
        &self.events
    }

    /// Nominal length of the score in ticks, including trailing silence
    pub fn end_tick(&self) -> u32 {
        self.voice_ticks.iter().copied().max().unwrap_or(0)
    }
}

/// Parse a score from a byte stream
pub fn parse<R: Read>(input: R) -> Result<Score> {
    let mut cursor = ByteCursor::new(input);
    let mut score = Score::new();
    let mut line = 1usize;

    while let Some(b) = cursor.next_byte()? {
        match b {
            b'\r' => {
                line += 1;
                // CRLF counts once
                match cursor.next_byte()? {
                    Some(b'\n') | None => {}
                    Some(next) => cursor.unread(next),
                }
            }
            b'\n' => line += 1,
            b' ' | b'\t' => {}
            COMMENT => cursor.skip_comment()?,
            b'U' => score.pulses_per_beat = header::parse_beat_unit(&mut cursor, line)?,
            b'B' => score.beats_per_minute = header::parse_tempo(&mut cursor, line)?,
            b'1'..=b'4' => {
                let voice = (b - b'1') as usize;
                staff::parse_staff(&mut cursor, voice, line, &mut score)?;
            }
            _ => return Err(Error::UnexpectedToken { line, byte: b }),
        }
    }

    score.events.sort();
    Ok(score)
}
