//! Score, combo, multiplier and health
//!
//! Consumes hit/miss decisions. Health is clamped to `0..=MAX_HEALTH` and the
//! first time it reaches zero the scoreboard reports defeat; after that every
//! further decision is absorbed.

use serde::{Deserialize, Serialize};

use super::state::{GameEvent, SessionStats};
use crate::consts::*;
use crate::settings::Tuning;

/// What applying one event did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreOutcome {
    /// Score state changed (or a no-op miss was counted)
    Applied,
    /// Health just reached zero
    Defeated,
    /// Already defeated; event had no effect
    Absorbed,
    /// Not a scoring event
    Ignored,
}

/// Multiplier for a combo count
pub fn multiplier_for_combo(combo: u32) -> u32 {
    if combo > COMBO_X4 {
        4
    } else if combo > COMBO_X2 {
        2
    } else {
        1
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scoreboard {
    pub score: u64,
    pub combo: u32,
    pub multiplier: u32,
    pub health: u32,
    pub stats: SessionStats,
    defeated: bool,
}

impl Default for Scoreboard {
    fn default() -> Self {
        Self::new()
    }
}

impl Scoreboard {
    pub fn new() -> Self {
        Self {
            score: 0,
            combo: 0,
            multiplier: 1,
            health: MAX_HEALTH,
            stats: SessionStats::default(),
            defeated: false,
        }
    }

    pub fn is_defeated(&self) -> bool {
        self.defeated
    }

    /// Apply one decision event
    pub fn apply(&mut self, event: &GameEvent, tuning: &Tuning) -> ScoreOutcome {
        let is_decision = matches!(event, GameEvent::Hit { .. } | GameEvent::Miss { .. });
        if !is_decision {
            return ScoreOutcome::Ignored;
        }
        if self.defeated {
            return ScoreOutcome::Absorbed;
        }

        match event {
            GameEvent::Hit {
                good_cut: true, ..
            } => {
                self.combo += 1;
                self.multiplier = multiplier_for_combo(self.combo);
                self.score += POINTS_PER_CUT * self.multiplier as u64;
                self.heal(tuning.good_cut_heal);
                self.stats.good_cuts += 1;
                self.stats.max_combo = self.stats.max_combo.max(self.combo);
            }
            GameEvent::Hit {
                good_cut: false, ..
            } => {
                self.break_combo();
                self.damage(tuning.bad_cut_penalty);
                self.stats.bad_cuts += 1;
            }
            GameEvent::Miss { note } if note.is_correct => {
                self.break_combo();
                self.damage(tuning.missed_answer_penalty);
                self.stats.missed_answers += 1;
            }
            GameEvent::Miss { .. } => {
                // Letting a wrong answer fly by is the right call; nothing to score
                self.stats.avoided += 1;
            }
            _ => {}
        }

        if self.health == 0 {
            self.defeated = true;
            return ScoreOutcome::Defeated;
        }
        ScoreOutcome::Applied
    }

    fn break_combo(&mut self) {
        self.combo = 0;
        self.multiplier = 1;
    }

    fn heal(&mut self, amount: u32) {
        self.health = self.health.saturating_add(amount).min(MAX_HEALTH);
    }

    fn damage(&mut self, amount: u32) {
        self.health = self.health.saturating_sub(amount);
    }
}
