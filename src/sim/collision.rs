//! Hand-versus-note collision
//!
//! The tricky part of Answer Strike: deciding, from one noisy tracker sample
//! per hand, whether the player deliberately struck a note this tick. A strike
//! needs the note inside the hit band, the required hand tracked and within
//! reach, and the hand actually moving. Anything less leaves the note alone
//! for a later tick (or for the scheduler to miss).

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::scheduler::{ActiveNote, NoteScheduler};
use super::state::{GameEvent, Hand, Note};
use crate::settings::Tuning;

/// One hand as reported by the tracker
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HandSample {
    /// `None` while the hand is not tracked
    pub position: Option<Vec3>,
    /// Zero when stationary or unknown
    pub velocity: Vec3,
}

impl HandSample {
    pub fn untracked() -> Self {
        Self::default()
    }

    pub fn at(position: Vec3, velocity: Vec3) -> Self {
        Self {
            position: Some(position),
            velocity,
        }
    }

    pub fn speed(&self) -> f32 {
        self.velocity.length()
    }
}

/// Both hands for one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HandFrame {
    pub left: HandSample,
    pub right: HandSample,
}

impl HandFrame {
    pub fn get(&self, hand: Hand) -> &HandSample {
        match hand {
            Hand::Left => &self.left,
            Hand::Right => &self.right,
        }
    }

    pub fn with(mut self, hand: Hand, sample: HandSample) -> Self {
        match hand {
            Hand::Left => self.left = sample,
            Hand::Right => self.right = sample,
        }
        self
    }
}

/// Outcome of testing one note against one hand sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Contact {
    /// Note is not inside the hit band
    OutOfBand,
    /// Required hand has no position this tick
    Untracked,
    /// Hand too far from the note
    OutOfReach { distance: f32 },
    /// Hand touching the note but not swinging
    Resting { speed: f32 },
    /// Deliberate strike; `good_cut` mirrors the note's correctness
    Strike { good_cut: bool },
}

impl Contact {
    pub fn is_strike(&self) -> bool {
        matches!(self, Contact::Strike { .. })
    }
}

/// Check one note (at `z` in front of the plane, world position `position`)
/// against a hand sample
pub fn check_contact(
    note: &Note,
    z: f32,
    position: Vec3,
    hand: &HandSample,
    tuning: &Tuning,
) -> Contact {
    if z > tuning.hit_band_ahead || z < -tuning.hit_band_behind {
        return Contact::OutOfBand;
    }

    let Some(hand_pos) = hand.position else {
        return Contact::Untracked;
    };

    let distance = hand_pos.distance(position);
    if distance >= tuning.hit_radius {
        return Contact::OutOfReach { distance };
    }

    let speed = hand.speed();
    if speed < tuning.min_swing_speed {
        return Contact::Resting { speed };
    }

    Contact::Strike {
        good_cut: note.is_correct,
    }
}

/// Test every active note against the hands and resolve strikes.
///
/// Notes are tested in arrival order; a struck note is moved to `Hit` through
/// the scheduler and reported exactly once.
pub fn resolve_collisions(
    scheduler: &mut NoteScheduler,
    hands: &HandFrame,
    now: f64,
    tuning: &Tuning,
) -> Vec<GameEvent> {
    let mut events = Vec::new();

    for ActiveNote { id, z, position } in scheduler.active_notes() {
        let Some(note) = scheduler.note(id) else {
            continue;
        };
        let contact = check_contact(note, z, position, hands.get(note.hand), tuning);
        let Contact::Strike { good_cut } = contact else {
            continue;
        };

        if let Some(note) = scheduler.resolve_hit(id, now) {
            log::debug!(
                "Note {} '{}' struck at {:.3}s ({})",
                note.id,
                note.text,
                now,
                if good_cut { "good cut" } else { "bad cut" }
            );
            events.push(GameEvent::Hit { note, good_cut });
        }
    }

    events
}
