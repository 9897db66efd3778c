//! Packed note event encoding
//!
//! Each event is stored as a single `u32`:
//!
//! | bits   | field                                      |
//! |--------|--------------------------------------------|
//! | 31..16 | tick (absolute pulse timestamp)            |
//! | 15..8  | status byte (`0x90 \| ch` or `0x80 \| ch`) |
//! | 7..0   | MIDI note number                           |
//!
//! Sorting the raw values orders events by tick, then status, then note, so a
//! note-off always precedes a note-on that lands on the same tick.

use crate::error::Field;
use serde::Serialize;

/// MIDI status bytes (channel in the low nibble)
pub mod status {
    pub const NOTE_OFF: u8 = 0x80;
    pub const NOTE_ON: u8 = 0x90;
}

/// Largest tick a packed event can hold
pub const MAX_TICK: u32 = 0xFFFF;

/// Largest MIDI channel number
pub const MAX_CHANNEL: u8 = 15;

/// Largest MIDI note number
pub const MAX_NOTE: i32 = 127;

/// Velocity synthesized for every emitted message
pub const VELOCITY: u8 = 100;

/// A packed note-on or note-off event
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct NoteEvent(u32);

impl NoteEvent {
    /// Wrap a raw packed value
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    fn pack(tick: u32, status: u8, note: u8) -> Self {
        Self((tick << 16) | ((status as u32) << 8) | note as u32)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    pub const fn tick(self) -> u32 {
        self.0 >> 16
    }

    pub const fn status(self) -> u8 {
        (self.0 >> 8) as u8
    }

    pub const fn channel(self) -> u8 {
        self.status() & 0x0F
    }

    pub const fn note(self) -> u8 {
        (self.0 & 0x7F) as u8
    }

    pub const fn is_note_on(self) -> bool {
        self.status() & 0xF0 == status::NOTE_ON
    }

    /// Synthesize the 3-byte MIDI message for this event
    pub const fn message(self) -> MidiMessage {
        MidiMessage([self.status(), self.note(), VELOCITY])
    }
}

/// A 3-byte channel voice message ready for a transport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MidiMessage(pub [u8; 3]);

impl MidiMessage {
    pub const fn bytes(&self) -> [u8; 3] {
        self.0
    }

    pub const fn status(&self) -> u8 {
        self.0[0]
    }

    pub const fn note(&self) -> u8 {
        self.0[1]
    }

    pub const fn velocity(&self) -> u8 {
        self.0[2]
    }
}

/// Number of ticks a note actually sounds
///
/// Notes shorter than one beat lose a quarter of their own length, longer
/// notes lose a quarter of one beat. Never less than one tick.
pub fn gate_time(pulses: u32, pulses_per_beat: u32) -> u32 {
    pulses.saturating_sub(pulses.min(pulses_per_beat) / 4).max(1)
}

/// Encode a note as its `(note_on, note_off)` event pair
///
/// Fails with the offending field when the note would end past `MAX_TICK`,
/// the channel exceeds 15, or the note falls outside 0..=127. A zero-length
/// note still occupies one tick, so its release must fit as well.
pub fn encode_note(
    tick: u32,
    channel: u8,
    note: i32,
    pulses: u32,
    pulses_per_beat: u32,
) -> Result<(NoteEvent, NoteEvent), Field> {
    match tick.checked_add(pulses.max(1)) {
        Some(end) if end <= MAX_TICK => {}
        _ => return Err(Field::Tick),
    }
    if channel > MAX_CHANNEL {
        return Err(Field::Channel);
    }
    if !(0..=MAX_NOTE).contains(&note) {
        return Err(Field::Note);
    }
    let note = note as u8;

    let on = NoteEvent::pack(tick, status::NOTE_ON | channel, note);
    let off_tick = tick + gate_time(pulses, pulses_per_beat);
    let off = NoteEvent::pack(off_tick, status::NOTE_OFF | channel, note);
    Ok((on, off))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_layout() {
        let (on, off) = encode_note(0, 10, 60, 48, 12).unwrap();
        assert_eq!(on.raw(), 0x0000_9A3C);
        assert_eq!(off.raw(), (45 << 16) | 0x8A3C);
        assert_eq!(on.tick(), 0);
        assert_eq!(on.channel(), 10);
        assert_eq!(on.note(), 60);
        assert!(on.is_note_on());
        assert!(!off.is_note_on());
        assert_eq!(off.tick(), 45);
    }

    #[test]
    fn test_gate_time() {
        // shorter than a beat: lose a quarter of the note
        assert_eq!(gate_time(12, 24), 9);
        // a beat or longer: lose a quarter of the beat
        assert_eq!(gate_time(24, 24), 18);
        assert_eq!(gate_time(48, 24), 42);
        assert_eq!(gate_time(48, 12), 45);
        // floored at one tick
        assert_eq!(gate_time(1, 1), 1);
        assert_eq!(gate_time(0, 24), 1);
    }

    #[test]
    fn test_range_checks() {
        assert_eq!(encode_note(0xFFF0, 10, 60, 0x10, 24).unwrap_err(), Field::Tick);
        assert!(encode_note(0xFFE0, 10, 60, 0x1F, 24).is_ok());
        assert_eq!(encode_note(u32::MAX, 10, 60, 1, 24).unwrap_err(), Field::Tick);
        assert_eq!(encode_note(0xFFFF, 10, 60, 0, 24).unwrap_err(), Field::Tick);
        assert!(encode_note(0xFFFE, 10, 60, 0, 24).is_ok());
        assert_eq!(encode_note(0, 16, 60, 24, 24).unwrap_err(), Field::Channel);
        assert_eq!(encode_note(0, 10, 128, 24, 24).unwrap_err(), Field::Note);
        assert_eq!(encode_note(0, 10, -1, 24, 24).unwrap_err(), Field::Note);
    }

    #[test]
    fn test_off_sorts_before_on() {
        let (_, off) = encode_note(0, 13, 72, 24, 24).unwrap();
        let (on, _) = encode_note(18, 10, 40, 24, 24).unwrap();
        assert_eq!(off.tick(), on.tick());
        assert!(off < on);
    }

    #[test]
    fn test_message() {
        let event = NoteEvent::from_raw((24 << 16) | 0x9B40);
        assert_eq!(event.message().bytes(), [0x9B, 0x40, 100]);
        assert_eq!(event.message().velocity(), VELOCITY);
    }
}
