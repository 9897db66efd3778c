use std::fmt;
use std::io;

/// Packed event field that failed its range check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Tick,
    Channel,
    Note,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::Tick => "tick",
            Field::Channel => "channel",
            Field::Note => "note",
        };
        f.write_str(name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid beat unit at line {line}: {unit:?}")]
    InvalidBeatUnit { line: usize, unit: String },

    #[error("Invalid tempo at line {line}: {text:?}")]
    InvalidTempo { line: usize, text: String },

    #[error("Invalid pitch at line {line}: {}", show_byte(.byte))]
    InvalidPitch { line: usize, byte: u8 },

    #[error("Unclosed chord at line {line}")]
    UnclosedChord { line: usize },

    #[error("Value out of range at line {line}: {field}")]
    ValueOutOfRange { line: usize, field: Field },

    #[error("Unexpected token at line {line}: {}", show_byte(.byte))]
    UnexpectedToken { line: usize, byte: u8 },

    #[error("Unexpected end of input at line {line}")]
    UnexpectedEnd { line: usize },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Line number the error was raised on, if it came from the score text
    pub fn line(&self) -> Option<usize> {
        match self {
            Error::InvalidBeatUnit { line, .. }
            | Error::InvalidTempo { line, .. }
            | Error::InvalidPitch { line, .. }
            | Error::UnclosedChord { line }
            | Error::ValueOutOfRange { line, .. }
            | Error::UnexpectedToken { line, .. }
            | Error::UnexpectedEnd { line } => Some(*line),
            Error::Io(_) => None,
        }
    }
}

/// Render a raw input byte for error messages
fn show_byte(byte: &u8) -> String {
    let byte = *byte;
    if byte.is_ascii_graphic() {
        format!("'{}'", byte as char)
    } else {
        format!("0x{:02x}", byte)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
