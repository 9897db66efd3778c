use clap::Parser;
use std::cell::RefCell;
use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};
use txtseq::player::SystemClock;
use txtseq::{Player, PlayerOptions, Score, Step};

/// Longest single sleep while waiting for the next event
const MAX_IDLE_SLEEP_MS: u32 = 10;

#[derive(Parser, Debug)]
#[command(name = "txtseq")]
#[command(version = "0.1.0")]
#[command(about = "Play a plaintext music score as timed MIDI messages", long_about = None)]
struct Args {
    /// Input score file (reads from stdin if not specified)
    input: Option<PathBuf>,

    /// Replay the score until interrupted
    #[arg(short, long = "loop")]
    looping: bool,

    /// Number of times to play the score
    #[arg(short, long, default_value_t = 1)]
    repeat: u32,

    /// Log every message with its elapsed time
    #[arg(short, long)]
    debug: bool,

    /// Log the parse trace
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<(), txtseq::Error> {
    let args = Args::parse();

    let level = if args.verbose { "debug" } else if args.debug { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let started = Instant::now();
    let score = match &args.input {
        Some(path) => txtseq::parse(BufReader::new(File::open(path)?))?,
        None => txtseq::parse(io::stdin().lock())?,
    };
    log::info!(
        "parse time: {} ms, {} events, {} ticks",
        started.elapsed().as_millis(),
        score.events().len(),
        score.end_tick()
    );

    let options = PlayerOptions { debug: args.debug };
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut pass = 0u32;
    while args.looping || pass < args.repeat {
        play(&score, &mut out, options)?;
        pass += 1;
    }

    Ok(())
}

/// Play one pass of the score, writing each message as a hex line
///
/// Stops at the first failed write and returns its error.
fn play<W: Write>(score: &Score, out: &mut W, options: PlayerOptions) -> io::Result<()> {
    let write_error = RefCell::new(None);
    let sink = |m: [u8; 3]| {
        if write_error.borrow().is_some() {
            return;
        }
        let result = writeln!(out, "{:02x} {:02x} {:02x}", m[0], m[1], m[2]).and_then(|_| out.flush());
        if let Err(e) = result {
            *write_error.borrow_mut() = Some(e);
        }
    };

    let mut player = Player::new(score, SystemClock::new(), sink, options);
    loop {
        match player.resume() {
            Step::Idle(ms) => thread::sleep(Duration::from_millis(ms.min(MAX_IDLE_SLEEP_MS) as u64)),
            Step::Emitted { .. } if write_error.borrow().is_some() => break,
            Step::Emitted { .. } => {}
            Step::Done => break,
        }
    }
    drop(player);

    match write_error.into_inner() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
