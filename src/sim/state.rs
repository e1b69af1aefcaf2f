//! Session state and core simulation types

use glam::Vec3;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::note_position;

/// Unique note identifier, allocated in chart order
pub type NoteId = u32;

/// Top-level session status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionStatus {
    /// Waiting for the hand tracker to come up
    Loading,
    /// Ready, waiting for a start request
    Idle,
    /// Notes are flying
    Playing,
    /// Health ran out
    GameOver,
    /// Track finished with health remaining
    Victory,
}

impl SessionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionStatus::GameOver | SessionStatus::Victory)
    }
}

/// Which hand must strike a note
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Hand {
    Left,
    Right,
}

impl Hand {
    /// Left two lanes belong to the left hand
    pub fn for_lane(lane: u8) -> Self {
        if (lane as usize) < LANE_COUNT / 2 {
            Hand::Left
        } else {
            Hand::Right
        }
    }
}

/// Where a note is in its lifecycle.
///
/// Only ever moves forward: `Pending -> Active -> Hit | Missed`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Resolution {
    Pending,
    Active,
    Hit { at: f64 },
    Missed { at: f64 },
}

/// An answer flying toward the player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    /// Playback time (seconds) at which the note crosses the interception plane
    pub arrival: f64,
    pub lane: u8,
    pub layer: u8,
    pub hand: Hand,
    pub text: String,
    pub is_correct: bool,
    /// Prompt of the question this note answers
    pub instruction: String,
    resolution: Resolution,
}

impl Note {
    pub fn new(
        id: NoteId,
        arrival: f64,
        lane: u8,
        layer: u8,
        text: &str,
        is_correct: bool,
        instruction: &str,
    ) -> Self {
        Self {
            id,
            arrival,
            lane,
            layer,
            hand: Hand::for_lane(lane),
            text: text.to_string(),
            is_correct,
            instruction: instruction.to_string(),
            resolution: Resolution::Pending,
        }
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn is_resolved(&self) -> bool {
        matches!(
            self.resolution,
            Resolution::Hit { .. } | Resolution::Missed { .. }
        )
    }

    pub fn is_active(&self) -> bool {
        self.resolution == Resolution::Active
    }

    /// Time of the hit or miss, if resolved
    pub fn resolved_at(&self) -> Option<f64> {
        match self.resolution {
            Resolution::Hit { at } | Resolution::Missed { at } => Some(at),
            _ => None,
        }
    }

    /// `Pending -> Active`. Returns false (and changes nothing) otherwise.
    pub fn activate(&mut self) -> bool {
        if self.resolution != Resolution::Pending {
            return false;
        }
        self.resolution = Resolution::Active;
        true
    }

    /// `Active -> Hit`. Returns false (and changes nothing) otherwise.
    pub fn mark_hit(&mut self, at: f64) -> bool {
        if self.resolution != Resolution::Active {
            return false;
        }
        self.resolution = Resolution::Hit { at };
        true
    }

    /// `Active -> Missed`. Returns false (and changes nothing) otherwise.
    pub fn mark_missed(&mut self, at: f64) -> bool {
        if self.resolution != Resolution::Active {
            return false;
        }
        self.resolution = Resolution::Missed { at };
        true
    }

    /// Close out a note that never got a chance to resolve (session ended first)
    pub(crate) fn force_missed(&mut self, at: f64) -> bool {
        if self.is_resolved() {
            return false;
        }
        self.resolution = Resolution::Missed { at };
        true
    }

    /// Distance in front of the interception plane at playback time `now`
    /// (negative once the note has passed it)
    #[inline]
    pub fn z_at(&self, now: f64, speed: f32) -> f32 {
        ((self.arrival - now) * speed as f64) as f32
    }

    /// World-space position at playback time `now`
    pub fn position_at(&self, now: f64, speed: f32) -> Vec3 {
        note_position(self.lane, self.layer, self.z_at(now, speed))
    }
}

/// Everything the presentation layer hears about
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// A note was struck; `good_cut` is true when it was the correct answer
    Hit { note: Note, good_cut: bool },
    /// A note passed the interception zone untouched
    Miss { note: Note },
    /// The prompt in the interception zone changed
    InstructionChanged(String),
    /// The session finished (exactly once per session)
    SessionEnded { victory: bool },
}

/// Running counters for the results screen
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStats {
    pub good_cuts: u32,
    pub bad_cuts: u32,
    /// Correct answers that flew past
    pub missed_answers: u32,
    /// Distractors that flew past (the right thing to do)
    pub avoided: u32,
    pub max_combo: u32,
}

impl SessionStats {
    /// Fraction of questions answered correctly
    pub fn accuracy(&self) -> f32 {
        let attempts = self.good_cuts + self.missed_answers;
        if attempts == 0 {
            return 0.0;
        }
        self.good_cuts as f32 / attempts as f32
    }
}

/// HUD snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub score: u64,
    pub combo: u32,
    pub multiplier: u32,
    /// Always within `0..=MAX_HEALTH`
    pub health: u32,
    pub status: SessionStatus,
    /// Prompt of the question currently in the interception zone
    pub instruction: String,
    pub stats: SessionStats,
}

/// A note as the renderer sees it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisibleNote {
    pub id: NoteId,
    pub position: Vec3,
    pub text: String,
    pub hand: Hand,
    pub resolution: Resolution,
}

/// RNG state wrapper for serialization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RngState {
    pub seed: u64,
    pub stream: u64,
}

impl RngState {
    pub fn new(seed: u64) -> Self {
        Self { seed, stream: 0 }
    }

    /// Derive the RNG for the `stream`-th chart of this run and advance
    pub fn next_rng(&mut self) -> Pcg32 {
        let rng = Pcg32::new(self.seed, self.stream.wrapping_mul(2).wrapping_add(1));
        self.stream += 1;
        rng
    }
}
