//! Answer Strike entry point
//!
//! Runs a headless demo session: the autoplay driver stands in for the hand
//! tracker and a simulated clock stands in for the audio device.

use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use answer_strike::autoplay::Autoplay;
use answer_strike::consts::SIM_DT;
use answer_strike::playback::{Playback, SimulatedPlayback, TRACKS, Track, track_by_title};
use answer_strike::settings::DifficultyPreset;
use answer_strike::sim::{GameEvent, Session, SessionStatus, TickInput};
use answer_strike::{Curriculum, HighScores, Tuning};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "answer-strike")]
#[command(about = "Run a headless Answer Strike session with a synthetic player")]
struct Args {
    /// Session seed (chart layout and autoplay rolls)
    #[arg(short, long, default_value_t = 0x5EED)]
    seed: u64,

    /// Difficulty preset (easy, normal, hard)
    #[arg(short, long, default_value = "normal", value_parser = parse_preset)]
    preset: DifficultyPreset,

    /// Exact chart difficulty, overrides the preset
    #[arg(short, long)]
    difficulty: Option<f32>,

    /// Chance (0-1) that the synthetic player answers a question correctly
    #[arg(short = 'k', long, default_value_t = 0.85, value_parser = parse_skill)]
    skill: f32,

    /// Track title (defaults to one picked by the seed)
    #[arg(short, long)]
    track: Option<String>,

    /// Tuning overrides (JSON)
    #[arg(long)]
    tuning: Option<PathBuf>,

    /// High score table (JSON), loaded before and saved after the run
    #[arg(long)]
    scores: Option<PathBuf>,
}

fn parse_preset(s: &str) -> Result<DifficultyPreset, String> {
    DifficultyPreset::from_str(s).ok_or_else(|| format!("unknown preset '{}'", s))
}

fn parse_skill(s: &str) -> Result<f32, String> {
    let skill: f32 = s.parse().map_err(|e| format!("{}", e))?;
    if !(0.0..=1.0).contains(&skill) {
        return Err(format!("skill must be between 0 and 1, got {}", skill));
    }
    Ok(skill)
}

impl Args {
    fn tuning(&self) -> Result<Tuning, Box<dyn Error>> {
        let mut tuning = match &self.tuning {
            Some(path) => Tuning::from_json(&fs::read_to_string(path)?)?,
            None => Tuning::from_preset(self.preset),
        };
        if let Some(difficulty) = self.difficulty {
            tuning.difficulty = difficulty;
        }
        tuning.validate()?;
        Ok(tuning)
    }

    fn track(&self) -> Result<&'static Track, Box<dyn Error>> {
        match &self.track {
            Some(title) => {
                track_by_title(title).ok_or_else(|| format!("unknown track '{}'", title).into())
            }
            None => Ok(&TRACKS[(self.seed % TRACKS.len() as u64) as usize]),
        }
    }
}

fn load_scores(path: &Path) -> Result<HighScores, Box<dyn Error>> {
    if !path.exists() {
        log::info!("No high score table at {}, starting fresh", path.display());
        return Ok(HighScores::new());
    }
    Ok(HighScores::from_json(&fs::read_to_string(path)?)?)
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let args = Args::parse();
    log::info!("Answer Strike (headless) starting...");

    let tuning = args.tuning()?;
    let track = args.track()?;

    let mut session = Session::new(args.seed, Curriculum::builtin(), tuning);
    let mut playback = SimulatedPlayback::new();
    let mut bot = Autoplay::new(args.seed, args.skill);

    // Headless: the "tracker" is ready immediately
    session.mark_ready()?;
    session.start(track, &mut playback)?;
    log::info!("Game initialized with seed: {}", args.seed);

    while session.status() == SessionStatus::Playing {
        playback.advance(SIM_DT);
        let hands = bot.hands(&session);
        for event in session.tick(&TickInput::from_playback(&playback, hands)) {
            match event {
                GameEvent::Hit { note, good_cut } => println!(
                    "[{:6.2}s] {} {}",
                    playback.position(),
                    if good_cut { "HIT " } else { "BAD " },
                    note.text
                ),
                GameEvent::Miss { note } if note.is_correct => {
                    println!("[{:6.2}s] MISS {}", playback.position(), note.text)
                }
                GameEvent::Miss { .. } => {}
                GameEvent::InstructionChanged(text) => println!("          > {}", text),
                GameEvent::SessionEnded { victory } => {
                    println!("{}", if victory { "VICTORY" } else { "GAME OVER" })
                }
            }
        }
    }

    let snap = session.snapshot();
    println!(
        "Score {} | max combo {} | health {} | accuracy {:.0}%",
        snap.score,
        snap.stats.max_combo,
        snap.health,
        snap.stats.accuracy() * 100.0
    );

    // Without a table there is nothing to rank against
    let Some(path) = &args.scores else {
        return Ok(());
    };
    let mut scores = load_scores(path)?;
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as f64)
        .unwrap_or(0.0);
    if let Some(rank) = scores.record(&snap, track.title, timestamp) {
        println!("High score rank #{} of {}", rank, scores.entries.len());
    }
    fs::write(path, scores.to_json()?)?;
    Ok(())
}
