//! Score to JSON converter

use clap::Parser;
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::PathBuf;
use txtseq::midi::ScoreJson;

#[derive(Parser, Debug)]
#[command(name = "txtseq2json")]
#[command(version = "0.1.0")]
#[command(about = "Convert a plaintext music score to JSON note events", long_about = None)]
struct Args {
    /// Input score file
    input: PathBuf,

    /// Output JSON file (writes to stdout if not specified)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output compact JSON (default is pretty-printed)
    #[arg(short, long)]
    compact: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let file = File::open(&args.input)?;
    let score = txtseq::parse(BufReader::new(file))?;
    let score_json = ScoreJson::new(&score);

    let json_string = if args.compact {
        serde_json::to_string(&score_json)?
    } else {
        serde_json::to_string_pretty(&score_json)?
    };

    match args.output {
        Some(path) => {
            let mut file = File::create(path)?;
            file.write_all(json_string.as_bytes())?;
            file.write_all(b"\n")?;
        }
        None => {
            println!("{}", json_string);
        }
    }

    Ok(())
}
