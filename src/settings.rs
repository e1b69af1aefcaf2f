//! Gameplay tuning
//!
//! Every threshold the engine decides with, gathered in one serializable
//! struct. Defaults come from [`crate::consts`]; a JSON file can override
//! any subset of fields.

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::EngineError;

/// Difficulty presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DifficultyPreset {
    Easy,
    #[default]
    Normal,
    Hard,
}

impl DifficultyPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            DifficultyPreset::Easy => "Easy",
            DifficultyPreset::Normal => "Normal",
            DifficultyPreset::Hard => "Hard",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "easy" => Some(DifficultyPreset::Easy),
            "normal" | "med" | "medium" => Some(DifficultyPreset::Normal),
            "hard" => Some(DifficultyPreset::Hard),
            _ => None,
        }
    }

    /// Difficulty fed to chart generation: one, two or three distractors
    pub fn difficulty(&self) -> f32 {
        match self {
            DifficultyPreset::Easy => 1.0,
            DifficultyPreset::Normal => 2.0,
            DifficultyPreset::Hard => 3.0,
        }
    }
}

/// Engine tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Chart difficulty; `floor(difficulty)` distractors per question, clamped to 1..=3
    pub difficulty: f32,

    // === Travel ===
    /// Note speed toward the player (units/s)
    pub note_speed: f32,
    /// Distance from spawn to the interception plane
    pub spawn_distance: f32,
    /// Distance past the plane at which an untouched note is missed
    pub miss_threshold: f32,

    // === Collision ===
    /// Band in front of the plane where strikes count
    pub hit_band_ahead: f32,
    /// Band behind the plane where strikes count
    pub hit_band_behind: f32,
    /// Maximum hand-to-note distance for contact
    pub hit_radius: f32,
    /// Minimum hand speed for a contact to count as a strike
    pub min_swing_speed: f32,

    // === Health ===
    pub good_cut_heal: u32,
    pub bad_cut_penalty: u32,
    pub missed_answer_penalty: u32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            difficulty: DifficultyPreset::Normal.difficulty(),

            note_speed: NOTE_SPEED,
            spawn_distance: SPAWN_DISTANCE,
            miss_threshold: MISS_THRESHOLD,

            hit_band_ahead: HIT_BAND_AHEAD,
            hit_band_behind: HIT_BAND_BEHIND,
            hit_radius: HIT_RADIUS,
            min_swing_speed: MIN_SWING_SPEED,

            good_cut_heal: GOOD_CUT_HEAL,
            bad_cut_penalty: BAD_CUT_PENALTY,
            missed_answer_penalty: MISSED_ANSWER_PENALTY,
        }
    }
}

impl Tuning {
    /// Create tuning from a difficulty preset
    pub fn from_preset(preset: DifficultyPreset) -> Self {
        Self {
            difficulty: preset.difficulty(),
            ..Self::default()
        }
    }

    /// Parse tuning overrides from JSON; missing fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        log::info!("Loaded tuning (difficulty {})", tuning.difficulty);
        Ok(tuning)
    }

    /// Reject tuning the scheduler and collision checks cannot work with
    pub fn validate(&self) -> Result<(), EngineError> {
        if !self.difficulty.is_finite() || self.difficulty < 0.0 {
            return Err(EngineError::InvalidDifficulty(self.difficulty));
        }
        let positive = [
            ("note_speed", self.note_speed),
            ("spawn_distance", self.spawn_distance),
            ("hit_radius", self.hit_radius),
        ];
        for (field, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(invalid(field, "must be a finite number > 0"));
            }
        }
        let non_negative = [
            ("hit_band_ahead", self.hit_band_ahead),
            ("hit_band_behind", self.hit_band_behind),
            ("min_swing_speed", self.min_swing_speed),
        ];
        for (field, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(invalid(field, "must be a finite number >= 0"));
            }
        }
        // Notes must leave the hit band before they can be missed
        if !self.miss_threshold.is_finite() || self.miss_threshold <= self.hit_band_behind {
            return Err(invalid("miss_threshold", "must be greater than hit_band_behind"));
        }
        Ok(())
    }

    /// Seconds between a note spawning and reaching the interception plane
    pub fn lead_time(&self) -> f64 {
        if self.note_speed <= 0.0 {
            return 0.0;
        }
        (self.spawn_distance / self.note_speed) as f64
    }
}

fn invalid(field: &'static str, reason: &'static str) -> EngineError {
    EngineError::InvalidTuning { field, reason }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_lead_time() {
        let tuning = Tuning::default();
        assert!((tuning.lead_time() - 4.0).abs() < 1e-6);
    }

    #[test]
    fn test_partial_json_overrides() {
        let tuning = Tuning::from_json(r#"{"difficulty": 2.5, "hit_radius": 0.8}"#).unwrap();
        assert_eq!(tuning.difficulty, 2.5);
        assert_eq!(tuning.hit_radius, 0.8);
        assert_eq!(tuning.min_swing_speed, MIN_SWING_SPEED);
    }

    #[test]
    fn test_rejects_negative_difficulty() {
        assert!(matches!(
            Tuning::from_json(r#"{"difficulty": -1.0}"#),
            Err(EngineError::InvalidDifficulty(_))
        ));
    }

    fn rejected_field(json: &str) -> Option<&'static str> {
        match Tuning::from_json(json) {
            Err(EngineError::InvalidTuning { field, .. }) => Some(field),
            _ => None,
        }
    }

    #[test]
    fn test_rejects_unusable_travel() {
        assert_eq!(rejected_field(r#"{"note_speed": -10.0}"#), Some("note_speed"));
        assert_eq!(rejected_field(r#"{"note_speed": 0.0}"#), Some("note_speed"));
        assert_eq!(rejected_field(r#"{"spawn_distance": 0.0}"#), Some("spawn_distance"));
    }

    #[test]
    fn test_rejects_unusable_collision() {
        assert_eq!(rejected_field(r#"{"hit_radius": -1.0}"#), Some("hit_radius"));
        assert_eq!(rejected_field(r#"{"hit_radius": 0.0}"#), Some("hit_radius"));
        assert_eq!(rejected_field(r#"{"min_swing_speed": -0.1}"#), Some("min_swing_speed"));
        assert_eq!(rejected_field(r#"{"hit_band_behind": -1.0}"#), Some("hit_band_behind"));
    }

    #[test]
    fn test_miss_threshold_must_clear_hit_band() {
        assert_eq!(rejected_field(r#"{"miss_threshold": 0.1}"#), Some("miss_threshold"));
        assert_eq!(rejected_field(r#"{"miss_threshold": 1.0}"#), Some("miss_threshold"));
        assert!(Tuning::from_json(r#"{"miss_threshold": 1.2}"#).is_ok());
        assert!(Tuning::default().validate().is_ok());
    }

    #[test]
    fn test_presets_give_distinct_charts() {
        use crate::sim::distractor_count;
        let counts: Vec<usize> = [DifficultyPreset::Easy, DifficultyPreset::Normal, DifficultyPreset::Hard]
            .iter()
            .map(|p| distractor_count(p.difficulty(), MAX_DISTRACTORS))
            .collect();
        assert_eq!(counts, vec![1, 2, 3]);
    }

    #[test]
    fn test_preset_roundtrip_names() {
        for preset in [DifficultyPreset::Easy, DifficultyPreset::Normal, DifficultyPreset::Hard] {
            assert_eq!(DifficultyPreset::from_str(preset.as_str()), Some(preset));
        }
    }
}
