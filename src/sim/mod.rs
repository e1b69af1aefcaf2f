//! Deterministic simulation module
//!
//! All gameplay decisions live here. This module must be pure and deterministic:
//! - Time comes only from the playback clock in `TickInput`
//! - Seeded RNG only
//! - Stable iteration order (by note ID)
//! - No rendering, audio or tracker dependencies

pub mod chart;
pub mod collision;
pub mod scheduler;
pub mod scoring;
pub mod state;
pub mod tick;

pub use chart::{Chart, distractor_count, generate_chart};
pub use collision::{Contact, HandFrame, HandSample, check_contact, resolve_collisions};
pub use scheduler::{ActiveNote, NoteScheduler};
pub use scoring::{ScoreOutcome, Scoreboard, multiplier_for_combo};
pub use state::{
    GameEvent, Hand, Note, NoteId, Resolution, RngState, SessionState, SessionStats,
    SessionStatus, VisibleNote,
};
pub use tick::{Session, TickInput};
