//! Chart generation
//!
//! Turns a curriculum into a time-ordered list of notes. Each question becomes
//! one arrival time with the correct answer and a few distractors spread over
//! shuffled lanes. All randomness comes from the caller's RNG so a seed fully
//! determines the chart.

use std::collections::HashSet;

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use super::state::{Note, NoteId};
use crate::beat_to_seconds;
use crate::consts::*;
use crate::curriculum::Curriculum;
use crate::error::EngineError;

/// Notes sorted by arrival time
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Chart {
    notes: Vec<Note>,
}

impl Chart {
    /// Wrap pre-built notes, sorting them by arrival (stable, so ties keep id order).
    ///
    /// Rejects notes outside the lane/layer grid, non-finite arrivals and
    /// repeated ids.
    pub fn from_notes(mut notes: Vec<Note>) -> Result<Self, EngineError> {
        let mut ids = HashSet::with_capacity(notes.len());
        for note in &notes {
            let reason = if note.lane as usize >= LANE_COUNT {
                Some("lane out of range")
            } else if note.layer as usize >= LAYER_COUNT {
                Some("layer out of range")
            } else if !note.arrival.is_finite() {
                Some("arrival is not finite")
            } else if !ids.insert(note.id) {
                Some("duplicate id")
            } else {
                None
            };
            if let Some(reason) = reason {
                return Err(EngineError::InvalidNote { id: note.id, reason });
            }
        }
        notes.sort_by(|a, b| {
            a.arrival
                .partial_cmp(&b.arrival)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Ok(Self { notes })
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn into_notes(self) -> Vec<Note> {
        self.notes
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Arrival time of the last note (0 for an empty chart)
    pub fn last_arrival(&self) -> f64 {
        self.notes.last().map(|n| n.arrival).unwrap_or(0.0)
    }
}

/// Number of distractors placed per question at this difficulty.
///
/// `1 + floor(difficulty)` lanes are filled counting the correct answer, but
/// there is always at least one distractor and never more than
/// [`MAX_DISTRACTORS`] (or more than the question provides).
pub fn distractor_count(difficulty: f32, available: usize) -> usize {
    (difficulty.floor() as usize)
        .clamp(1, MAX_DISTRACTORS)
        .min(available)
}

/// Generate a chart for `curriculum` at `bpm`
pub fn generate_chart<R: Rng + ?Sized>(
    curriculum: &Curriculum,
    difficulty: f32,
    bpm: f32,
    rng: &mut R,
) -> Result<Chart, EngineError> {
    if !difficulty.is_finite() || difficulty < 0.0 {
        return Err(EngineError::InvalidDifficulty(difficulty));
    }
    if !bpm.is_finite() || bpm <= 0.0 {
        return Err(EngineError::InvalidTempo(bpm));
    }

    let mut notes = Vec::new();
    let mut next_id: NoteId = 1;
    let mut beat = CHART_START_BEAT;

    for question in curriculum.questions() {
        let arrival = beat_to_seconds(beat, bpm);

        let mut lanes: [u8; LANE_COUNT] = [0, 1, 2, 3];
        lanes.shuffle(rng);

        notes.push(Note::new(
            next_id,
            arrival,
            lanes[0],
            0,
            &question.answer,
            true,
            &question.instruction,
        ));
        next_id += 1;

        let count = distractor_count(difficulty, question.distractors.len());
        for (i, (distractor, &lane)) in question
            .distractors
            .iter()
            .zip(&lanes[1..])
            .take(count)
            .enumerate()
        {
            // Alternate 1, 0, 1 so neighbours don't line up at the same height
            let layer = if i % 2 == 0 { 1 } else { 0 };
            notes.push(Note::new(
                next_id,
                arrival,
                lane,
                layer,
                distractor,
                false,
                &question.instruction,
            ));
            next_id += 1;
        }

        beat += QUESTION_GAP_BEATS;
    }

    let chart = Chart::from_notes(notes)?;
    log::info!(
        "Generated chart: {} questions, {} notes, difficulty {}, last arrival {:.2}s",
        curriculum.len(),
        chart.len(),
        difficulty,
        chart.last_arrival()
    );
    Ok(chart)
}
