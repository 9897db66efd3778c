pub mod error;
pub mod midi;
pub mod player;
pub mod sequencer;

pub use error::{Error, Result};
pub use player::{Player, PlayerOptions, Step};
pub use sequencer::{parse, Score};
