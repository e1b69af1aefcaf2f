//! Music tracks and the playback clock
//!
//! The engine never touches an audio device. It asks a [`Playback`] to start
//! a track and afterwards only reads the playback position and the
//! end-of-track flag, once per tick.

use serde::Serialize;

use crate::error::EngineError;

/// A music track charts are timed against
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Track {
    pub title: &'static str,
    pub bpm: f32,
    pub duration_secs: f64,
}

/// Built-in track list
pub const TRACKS: &[Track] = &[
    Track {
        title: "Warm Up",
        bpm: 100.0,
        duration_secs: 60.0,
    },
    Track {
        title: "Past Tense Groove",
        bpm: 120.0,
        duration_secs: 50.0,
    },
    Track {
        title: "Irregular Rush",
        bpm: 140.0,
        duration_secs: 42.0,
    },
];

/// Look up a built-in track by (case-insensitive) title
pub fn track_by_title(title: &str) -> Option<&'static Track> {
    TRACKS.iter().find(|t| t.title.eq_ignore_ascii_case(title))
}

/// Audio playback as seen by the engine
pub trait Playback {
    /// Begin playing `track` from the start
    fn start(&mut self, track: &Track) -> Result<(), EngineError>;
    /// Current position in seconds (monotonic while playing)
    fn position(&self) -> f64;
    /// True once the track has played to the end
    fn has_ended(&self) -> bool;
}

/// Playback driven by explicit time steps, for headless runs and tests
#[derive(Debug, Clone, Default)]
pub struct SimulatedPlayback {
    position: f64,
    duration: f64,
    playing: bool,
    available: bool,
}

impl SimulatedPlayback {
    pub fn new() -> Self {
        Self {
            available: true,
            ..Self::default()
        }
    }

    /// A device that refuses to start (e.g. no audio output)
    pub fn unavailable() -> Self {
        Self::default()
    }

    /// Advance the clock; stops at the end of the track
    pub fn advance(&mut self, dt: f64) {
        if !self.playing {
            return;
        }
        self.position = (self.position + dt.max(0.0)).min(self.duration);
    }

    pub fn is_playing(&self) -> bool {
        self.playing && !self.has_ended()
    }
}

impl Playback for SimulatedPlayback {
    fn start(&mut self, track: &Track) -> Result<(), EngineError> {
        if !self.available {
            return Err(EngineError::Playback(format!(
                "no output device for '{}'",
                track.title
            )));
        }
        self.position = 0.0;
        self.duration = track.duration_secs;
        self.playing = true;
        Ok(())
    }

    fn position(&self) -> f64 {
        self.position
    }

    fn has_ended(&self) -> bool {
        self.playing && self.position >= self.duration
    }
}
