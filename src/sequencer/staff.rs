//! Staff line parser
//!
//! One call parses the note tokens of a single voice up to the end of the
//! line. The grammar per token is:
//!
//! ```text
//! note     := accidental? pitch octave* duration?
//! chord    := '{' note+ '}' duration?
//! accidental := '_' | '^'
//! pitch    := [A-Ga-g]
//! octave   := ',' | '\''
//! duration := digit+
//! ```

use super::cursor::{is_line_end, ByteCursor, COMMENT};
use super::Score;
use crate::error::{Error, Field, Result};
use crate::midi::event::encode_note;
use std::io::Read;

/// Number of independent voices
pub const VOICES: usize = 4;

/// MIDI channel of voice 0; the others follow in order
pub const FIRST_CHANNEL: u8 = 10;

/// Note number of `C` (middle C, octave 4)
const MIDDLE_C: i32 = 60;

/// Semitone offset of a pitch letter from middle C
pub fn pitch_offset(b: u8) -> Option<i32> {
    match b {
        b'C' => Some(0),
        b'D' => Some(2),
        b'E' => Some(4),
        b'F' => Some(5),
        b'G' => Some(7),
        b'A' => Some(9),
        b'B' => Some(11),
        b'c' => Some(12),
        b'd' => Some(14),
        b'e' => Some(16),
        b'f' => Some(17),
        b'g' => Some(19),
        b'a' => Some(21),
        b'b' => Some(23),
        _ => None,
    }
}

fn accidental(b: u8) -> Option<i32> {
    match b {
        b'_' => Some(-1),
        b'^' => Some(1),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Between tokens
    Start,
    /// Pitch letter required
    Pitch,
    /// Octave marks
    Octave,
    /// Duration digits
    Duration,
}

/// Parse one staff line for `voice`, appending events to the score
///
/// The line terminator is left unread for the caller to count.
pub fn parse_staff<R: Read>(
    cursor: &mut ByteCursor<R>,
    voice: usize,
    line: usize,
    score: &mut Score,
) -> Result<()> {
    let channel = FIRST_CHANNEL + voice as u8;
    let ppb = score.pulses_per_beat;
    let mut tick = score.voice_ticks[voice];
    let mut state = State::Start;
    let mut note = MIDDLE_C;
    let mut chord: Option<Vec<i32>> = None;
    let mut multiplier: Option<u32> = None;
    let mut tokens = 0usize;

    loop {
        let byte = cursor.next_byte()?;
        if byte == Some(COMMENT) {
            cursor.skip_comment()?;
            continue;
        }

        match state {
            State::Start => match byte {
                None => break,
                Some(b) if is_line_end(b) => {
                    cursor.unread(b);
                    break;
                }
                Some(b'|' | b' ' | b'\t') => {}
                Some(b'{') => chord = Some(Vec::new()),
                Some(b) => {
                    note = MIDDLE_C;
                    multiplier = None;
                    state = State::Pitch;
                    match accidental(b) {
                        Some(offset) => note += offset,
                        None => cursor.unread(b),
                    }
                }
            },
            State::Pitch => {
                let b = byte.ok_or(Error::UnexpectedEnd { line })?;
                let offset = pitch_offset(b).ok_or(Error::InvalidPitch { line, byte: b })?;
                note += offset;
                state = State::Octave;
            }
            State::Octave => match byte {
                Some(b',') => note -= 12,
                Some(b'\'') => note += 12,
                other => {
                    if let Some(members) = chord.as_mut() {
                        members.push(note);
                        state = match other {
                            Some(b'}') => State::Duration,
                            Some(b) => {
                                cursor.unread(b);
                                State::Start
                            }
                            None => State::Start,
                        };
                    } else {
                        if let Some(b) = other {
                            cursor.unread(b);
                        }
                        state = State::Duration;
                    }
                }
            },
            State::Duration => match byte {
                Some(b) if b.is_ascii_digit() => {
                    let digit = (b - b'0') as u32;
                    let value = multiplier
                        .unwrap_or(0)
                        .checked_mul(10)
                        .and_then(|m| m.checked_add(digit))
                        .ok_or(Error::ValueOutOfRange { line, field: Field::Tick })?;
                    multiplier = Some(value);
                }
                other => {
                    let duration = multiplier.take().unwrap_or(1);
                    let pulses = ppb
                        .checked_mul(duration)
                        .ok_or(Error::ValueOutOfRange { line, field: Field::Tick })?;
                    match chord.take() {
                        Some(members) => {
                            for &member in &members {
                                log::trace!("{}/{}/{}", tick, member, duration);
                                push_note(score, tick, channel, member, pulses, ppb, line)?;
                            }
                        }
                        None => {
                            log::trace!("{}/{}/{}", tick, note, duration);
                            push_note(score, tick, channel, note, pulses, ppb, line)?;
                        }
                    }
                    tick += pulses;
                    tokens += 1;
                    state = State::Start;
                    if let Some(b) = other {
                        cursor.unread(b);
                    }
                }
            },
        }
    }

    if chord.is_some() {
        return Err(Error::UnclosedChord { line });
    }
    log::debug!("{:2}: {} tokens={} ticks={}", line, voice + 1, tokens, tick);
    score.voice_ticks[voice] = tick;
    Ok(())
}

fn push_note(
    score: &mut Score,
    tick: u32,
    channel: u8,
    note: i32,
    pulses: u32,
    ppb: u32,
    line: usize,
) -> Result<()> {
    let (on, off) = encode_note(tick, channel, note, pulses, ppb)
        .map_err(|field| Error::ValueOutOfRange { line, field })?;
    score.events.push(on);
    score.events.push(off);
    Ok(())
}
