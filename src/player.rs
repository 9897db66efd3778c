//! Real-time playback of a parsed score
//!
//! A [`Player`] never blocks. Each call to [`Player::resume`] either emits the
//! next due event, reports how many milliseconds remain until it is due, or
//! reports that the score (including its trailing silence) has finished. The
//! caller is free to do other work during the idle time it is told about.
//!
//! Looping is done by building a fresh player over the same [`Score`].

use crate::midi::event::MidiMessage;
use crate::sequencer::{Score, PULSES_PER_QUARTER};
use std::time::Instant;

/// Clock rollover period is `2^30` ms unless the clock says otherwise
pub const DEFAULT_WRAP_MASK: u32 = (1 << 30) - 1;

/// Monotonic millisecond clock
pub trait Clock {
    fn now_ms(&mut self) -> u32;

    /// Mask applied to elapsed time; one less than the rollover period
    fn wrap_mask(&self) -> u32 {
        DEFAULT_WRAP_MASK
    }
}

impl<F: FnMut() -> u32> Clock for F {
    fn now_ms(&mut self) -> u32 {
        self()
    }
}

/// Clock backed by [`Instant`], counting from its creation
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&mut self) -> u32 {
        // truncation wraps at 2^32, a multiple of the mask period
        self.origin.elapsed().as_millis() as u32
    }
}

/// Destination for 3-byte MIDI messages
pub trait MidiSink {
    fn send(&mut self, message: [u8; 3]);
}

impl<F: FnMut([u8; 3])> MidiSink for F {
    fn send(&mut self, message: [u8; 3]) {
        self(message)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PlayerOptions {
    /// Log each message with its elapsed timestamp
    pub debug: bool,
}

/// Outcome of one [`Player::resume`] call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Nothing due yet; milliseconds until the next deadline (at least 1)
    Idle(u32),
    /// A message was sent to the sink
    Emitted { message: MidiMessage, elapsed_ms: u32 },
    /// All events sent and the score's full length has elapsed
    Done,
}

/// Resumable player over a parsed score
pub struct Player<'a, C, S> {
    score: &'a Score,
    clock: C,
    sink: S,
    options: PlayerOptions,
    ms_per_pulse: f64,
    start: Option<u32>,
    next: usize,
    done: bool,
}

impl<'a, C: Clock, S: MidiSink> Player<'a, C, S> {
    pub fn new(score: &'a Score, clock: C, sink: S, options: PlayerOptions) -> Self {
        // 60000 ms/min / bpm / 24 pulses per quarter
        let ms_per_pulse = 60_000.0 / score.beats_per_minute() as f64 / PULSES_PER_QUARTER as f64;
        Self {
            score,
            clock,
            sink,
            options,
            ms_per_pulse,
            start: None,
            next: 0,
            done: false,
        }
    }

    pub fn ms_per_pulse(&self) -> f64 {
        self.ms_per_pulse
    }

    /// Wall-clock deadline of a tick, relative to the first `resume`
    pub fn deadline_ms(&self, tick: u32) -> f64 {
        self.ms_per_pulse * tick as f64
    }

    /// Milliseconds since the first `resume`, modulo the clock's rollover
    fn elapsed(&mut self) -> u32 {
        let now = self.clock.now_ms();
        let start = *self.start.get_or_insert(now);
        now.wrapping_sub(start) & self.clock.wrap_mask()
    }

    /// Advance playback as far as the clock allows, one step at a time
    pub fn resume(&mut self) -> Step {
        if self.done {
            return Step::Done;
        }

        let elapsed = self.elapsed();
        let event = self.score.events().get(self.next).copied();
        let tick = match event {
            Some(event) => event.tick(),
            None => self.score.end_tick(),
        };
        let target = self.deadline_ms(tick);
        if (elapsed as f64) < target {
            return Step::Idle((target - elapsed as f64).ceil() as u32);
        }

        match event {
            Some(event) => {
                self.next += 1;
                let message = event.message();
                if self.options.debug {
                    let [status, note, velocity] = message.bytes();
                    log::info!("{:5} ms: {:02x}{:02x}{:02x}", elapsed, status, note, velocity);
                }
                self.sink.send(message.bytes());
                Step::Emitted {
                    message,
                    elapsed_ms: elapsed,
                }
            }
            None => {
                self.done = true;
                Step::Done
            }
        }
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Events sent so far
    pub fn position(&self) -> usize {
        self.next
    }
}

/// Yields each step until the player is done
impl<C: Clock, S: MidiSink> Iterator for Player<'_, C, S> {
    type Item = Step;

    fn next(&mut self) -> Option<Step> {
        match self.resume() {
            Step::Done => None,
            step => Some(step),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequencer::parse;
    use std::cell::Cell;
    use std::rc::Rc;

    fn score(text: &str) -> Score {
        parse(text.as_bytes()).unwrap()
    }

    fn fake_clock(start: u32) -> (Rc<Cell<u32>>, impl FnMut() -> u32) {
        let now = Rc::new(Cell::new(start));
        let handle = Rc::clone(&now);
        (now, move || handle.get())
    }

    #[test]
    fn test_ms_per_pulse() {
        let score = score("B 120\n");
        let player = Player::new(&score, || 0u32, |_: [u8; 3]| {}, PlayerOptions::default());
        assert!((player.ms_per_pulse() - 2500.0 / 120.0).abs() < 1e-9);
        assert!((player.deadline_ms(24) - 500.0).abs() < 1e-9);
    }

    #[test]
    fn test_steps() {
        let score = score("1| C\n");
        let (now, clock) = fake_clock(1000);
        let mut sent = Vec::new();
        {
            let mut player =
                Player::new(&score, clock, |m: [u8; 3]| sent.push(m), PlayerOptions::default());

            assert!(matches!(player.resume(), Step::Emitted { elapsed_ms: 0, .. }));
            assert_eq!(player.resume(), Step::Idle(375));
            now.set(1374);
            assert_eq!(player.resume(), Step::Idle(1));
            now.set(1375);
            match player.resume() {
                Step::Emitted { message, elapsed_ms } => {
                    assert_eq!(message.bytes(), [0x8A, 60, 100]);
                    assert_eq!(elapsed_ms, 375);
                }
                other => panic!("unexpected step: {:?}", other),
            }
            // trailing wait until the voice's final tick
            assert_eq!(player.resume(), Step::Idle(125));
            now.set(1500);
            assert_eq!(player.resume(), Step::Done);
            assert!(player.is_done());
            assert_eq!(player.resume(), Step::Done);
        }
        assert_eq!(sent, vec![[0x9A, 60, 100], [0x8A, 60, 100]]);
    }

    #[test]
    fn test_late_resume_emits_backlog_in_order() {
        let score = score("1| C D\n2| {EG}\n");
        let (now, clock) = fake_clock(0);
        let mut player = Player::new(&score, clock, |_: [u8; 3]| {}, PlayerOptions::default());
        // first resume anchors the start time
        assert!(matches!(player.resume(), Step::Emitted { elapsed_ms: 0, .. }));
        now.set(10_000);
        let messages: Vec<_> = player
            .by_ref()
            .filter_map(|step| match step {
                Step::Emitted { message, .. } => Some(message.bytes()),
                _ => None,
            })
            .collect();
        assert_eq!(messages.len(), 7);
        assert_eq!(player.position(), 8);
        assert!(player.is_done());
        // releases come out in packed order even when all overdue
        let ticks_18: Vec<_> = messages[2..5].iter().map(|m| m[0]).collect();
        assert_eq!(ticks_18, vec![0x8A, 0x8B, 0x8B]);
    }

    #[test]
    fn test_silent_tail_is_waited_out() {
        // voice 2 runs for 4 beats with nothing after its first note-off
        let score = score("1| C\n2| C4\n");
        let (now, clock) = fake_clock(0);
        let mut player = Player::new(&score, clock, |_: [u8; 3]| {}, PlayerOptions::default());
        let mut t = 0;
        let mut last_idle = 0;
        loop {
            match player.resume() {
                Step::Idle(ms) => {
                    last_idle = ms;
                    t += ms;
                    now.set(t);
                }
                Step::Emitted { .. } => {}
                Step::Done => break,
            }
        }
        assert_eq!(t, 2000);
        assert!(last_idle > 0);
    }

    #[test]
    fn test_clock_wraparound() {
        let score = score("1| C\n");
        let (now, clock) = fake_clock(u32::MAX - 100);
        let mut player = Player::new(&score, clock, |_: [u8; 3]| {}, PlayerOptions::default());
        player.resume();
        now.set(99);
        assert_eq!(player.resume(), Step::Idle(175));
        now.set(274);
        assert!(matches!(player.resume(), Step::Emitted { elapsed_ms: 375, .. }));
    }

    struct ShortClock {
        now: Rc<Cell<u32>>,
    }

    impl Clock for ShortClock {
        fn now_ms(&mut self) -> u32 {
            self.now.get()
        }

        fn wrap_mask(&self) -> u32 {
            (1 << 29) - 1
        }
    }

    #[test]
    fn test_custom_wrap_period() {
        let score = score("1| C\n");
        let now = Rc::new(Cell::new((1 << 29) - 10));
        let clock = ShortClock { now: Rc::clone(&now) };
        let mut player = Player::new(&score, clock, |_: [u8; 3]| {}, PlayerOptions::default());
        player.resume();
        // clock rolled over from 2^29 - 1 to 0
        now.set(365);
        assert!(matches!(player.resume(), Step::Emitted { elapsed_ms: 375, .. }));
    }

    #[test]
    fn test_empty_score_is_done_immediately() {
        let score = score("B 60\n");
        let mut player = Player::new(&score, || 7u32, |_: [u8; 3]| {}, PlayerOptions::default());
        assert_eq!(player.resume(), Step::Done);
    }
}
