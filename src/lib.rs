//! Answer Strike - a rhythm quiz engine
//!
//! Answers fly down four lanes toward the player in time with the music; the
//! player swings a tracked hand through the correct one.
//!
//! Core modules:
//! - `sim`: Deterministic simulation (chart, scheduling, collisions, scoring, session)
//! - `curriculum`: Question sets the charts are built from
//! - `playback`: Music track list and the playback clock seam
//! - `settings`: Data-driven tuning
//! - `autoplay`: Synthetic hand driver for demos and tests

pub mod autoplay;
pub mod curriculum;
pub mod error;
pub mod highscores;
pub mod playback;
pub mod settings;
pub mod sim;

pub use curriculum::{Curriculum, QuestionSet};
pub use error::EngineError;
pub use highscores::HighScores;
pub use settings::Tuning;

use glam::Vec3;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep used by the headless driver (90 Hz, tracker rate)
    pub const SIM_DT: f64 = 1.0 / 90.0;

    /// Chart layout (in beats)
    pub const CHART_START_BEAT: f64 = 8.0;
    pub const QUESTION_GAP_BEATS: f64 = 10.0;

    /// Discrete note slots
    pub const LANE_COUNT: usize = 4;
    pub const LAYER_COUNT: usize = 3;
    /// Upper bound on distractors placed per question
    pub const MAX_DISTRACTORS: usize = 3;

    /// Horizontal center of each lane (world units, player at x = 0).
    /// Neighbours sit more than two hit radii apart, so no hand position
    /// reaches two lanes at once.
    pub const LANE_X: [f32; LANE_COUNT] = [-3.3, -1.1, 1.1, 3.3];
    /// Height of each layer (world units, roughly chest height at layer 0)
    pub const LAYER_Y: [f32; LAYER_COUNT] = [1.0, 1.6, 2.2];

    /// Note travel (world units per second along -z)
    pub const NOTE_SPEED: f32 = 10.0;
    /// Distance from spawn point to the interception plane
    pub const SPAWN_DISTANCE: f32 = 40.0;
    /// How far past the interception plane a note may travel before it is missed
    pub const MISS_THRESHOLD: f32 = 2.0;
    /// Collision band around the interception plane
    pub const HIT_BAND_AHEAD: f32 = 1.5;
    pub const HIT_BAND_BEHIND: f32 = 1.0;

    /// Hand must come within this distance of a note center
    pub const HIT_RADIUS: f32 = 1.0;
    /// Hands slower than this are resting, not swinging
    pub const MIN_SWING_SPEED: f32 = 0.5;

    /// Health
    pub const MAX_HEALTH: u32 = 100;
    pub const GOOD_CUT_HEAL: u32 = 5;
    pub const BAD_CUT_PENALTY: u32 = 10;
    pub const MISSED_ANSWER_PENALTY: u32 = 15;

    /// Points per good cut before the multiplier
    pub const POINTS_PER_CUT: u64 = 100;
    /// Combo thresholds (strictly greater than) for the x2 and x4 multipliers
    pub const COMBO_X2: u32 = 5;
    pub const COMBO_X4: u32 = 10;
}

/// Convert a beat index to seconds at the given tempo
#[inline]
pub fn beat_to_seconds(beat: f64, bpm: f32) -> f64 {
    beat * (60.0 / bpm as f64)
}

/// World-space position of a note in `lane`/`layer` that is `z` units in
/// front of the interception plane
///
/// Charts only hold notes on the grid; an out-of-range slot is pinned to the
/// outermost lane or layer.
#[inline]
pub fn note_position(lane: u8, layer: u8, z: f32) -> Vec3 {
    debug_assert!((lane as usize) < consts::LANE_COUNT, "lane {lane} out of range");
    debug_assert!((layer as usize) < consts::LAYER_COUNT, "layer {layer} out of range");
    let x = consts::LANE_X[(lane as usize).min(consts::LANE_COUNT - 1)];
    let y = consts::LAYER_Y[(layer as usize).min(consts::LAYER_COUNT - 1)];
    Vec3::new(x, y, z)
}
