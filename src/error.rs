//! Engine error type
//!
//! Nothing in the per-tick path returns an error: missing hand data, empty
//! charts and repeated resolutions are all ordinary game situations. Errors
//! are reserved for bad configuration and out-of-order session commands.

use thiserror::Error;

use crate::sim::{NoteId, SessionStatus};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("cannot {action} while session is {from:?}")]
    InvalidTransition {
        from: SessionStatus,
        action: &'static str,
    },
    #[error("difficulty must be a finite number >= 0, got {0}")]
    InvalidDifficulty(f32),
    #[error("tempo must be a finite number > 0 bpm, got {0}")]
    InvalidTempo(f32),
    #[error("tuning field `{field}` {reason}")]
    InvalidTuning {
        field: &'static str,
        reason: &'static str,
    },
    #[error("curriculum has no question sets")]
    EmptyCurriculum,
    #[error("question set {index} is invalid: {reason}")]
    InvalidQuestion { index: usize, reason: String },
    #[error("note {id} is invalid: {reason}")]
    InvalidNote { id: NoteId, reason: &'static str },
    #[error("playback unavailable: {0}")]
    Playback(String),
    #[error("configuration error: {0}")]
    Config(#[from] serde_json::Error),
}

impl EngineError {
    pub fn invalid_question<T: Into<String>>(index: usize, reason: T) -> Self {
        Self::InvalidQuestion {
            index,
            reason: reason.into(),
        }
    }
}
