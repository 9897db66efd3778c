//! Header commands: beat unit (`U`) and tempo (`B`)

use super::cursor::ByteCursor;
use crate::error::{Error, Result};
use std::io::Read;

/// Pulses per beat for a beat-unit token, at 24 pulses per quarter note
pub fn pulses_per_beat(unit: &[u8]) -> Option<u32> {
    match unit {
        b"1/4" => Some(24),
        b"1/8" => Some(12),
        b"1/16" => Some(6),
        b"1/32" => Some(3),
        b"1/4T" => Some(8),
        b"1/8T" => Some(4),
        b"1/16T" => Some(2),
        b"1/32T" => Some(1),
        _ => None,
    }
}

/// Parse the argument of a `U 1/8` style line
pub fn parse_beat_unit<R: Read>(cursor: &mut ByteCursor<R>, line: usize) -> Result<u32> {
    let unit = cursor.read_rest_of_line()?;
    let ppb = pulses_per_beat(&unit).ok_or_else(|| Error::InvalidBeatUnit {
        line,
        unit: String::from_utf8_lossy(&unit).into_owned(),
    })?;
    log::debug!("{:2}: ppb={}", line, ppb);
    Ok(ppb)
}

/// Parse the argument of a `B 120` style line
pub fn parse_tempo<R: Read>(cursor: &mut ByteCursor<R>, line: usize) -> Result<u32> {
    let text = cursor.read_rest_of_line()?;
    let bpm = parse_decimal(&text)
        .filter(|&bpm| bpm > 0)
        .ok_or_else(|| Error::InvalidTempo {
            line,
            text: String::from_utf8_lossy(&text).into_owned(),
        })?;
    log::debug!("{:2}: bpm={}", line, bpm);
    Ok(bpm)
}

/// Digits only; no sign, no overflow
fn parse_decimal(digits: &[u8]) -> Option<u32> {
    if digits.is_empty() {
        return None;
    }
    digits.iter().try_fold(0u32, |acc, &b| {
        if !b.is_ascii_digit() {
            return None;
        }
        acc.checked_mul(10)?.checked_add((b - b'0') as u32)
    })
}
