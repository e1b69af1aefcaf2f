//! Idle/demo mode - a synthetic player
//!
//! Produces hand samples the way a tracker would for a player who swings
//! through the correct answer as it crosses the interception plane. `skill`
//! is the chance of getting a question right; a fumbled question swings at a
//! distractor instead (or lets the answer fly by when there is none).

use std::collections::BTreeMap;

use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::sim::{Hand, HandFrame, HandSample, NoteId, Session};

/// Swing velocity of a striking hand (toward the incoming notes)
const SWING_VELOCITY: Vec3 = Vec3::new(0.0, -1.0, 2.5);
/// Where an idle hand rests: below every layer, out of reach
const REST_Y: f32 = -0.5;

#[derive(Debug, Clone)]
pub struct Autoplay {
    skill: f32,
    rng: Pcg32,
    /// Correct note id -> note the player will swing at (if any)
    plans: BTreeMap<NoteId, Option<NoteId>>,
}

impl Autoplay {
    pub fn new(seed: u64, skill: f32) -> Self {
        Self {
            skill: skill.clamp(0.0, 1.0),
            rng: Pcg32::seed_from_u64(seed),
            plans: BTreeMap::new(),
        }
    }

    /// Hand samples for the current tick
    pub fn hands(&mut self, session: &Session) -> HandFrame {
        let mut frame = HandFrame {
            left: HandSample::at(Vec3::new(-0.4, REST_Y, 0.0), Vec3::ZERO),
            right: HandSample::at(Vec3::new(0.4, REST_Y, 0.0), Vec3::ZERO),
        };
        let Some(scheduler) = session.scheduler() else {
            return frame;
        };
        let tuning = session.tuning();
        let active = scheduler.active_notes();

        // Decide each newly spawned question once
        for a in &active {
            let Some(note) = scheduler.note(a.id) else {
                continue;
            };
            if !note.is_correct || self.plans.contains_key(&a.id) {
                continue;
            }
            let target = if self.rng.random::<f32>() < self.skill {
                Some(note.id)
            } else {
                active
                    .iter()
                    .filter_map(|other| scheduler.note(other.id))
                    .find(|other| !other.is_correct && other.arrival == note.arrival)
                    .map(|other| other.id)
            };
            log::debug!("Autoplay plans note {} -> {:?}", note.id, target);
            self.plans.insert(note.id, target);
        }

        self.plans.retain(|&key, target| {
            scheduler.is_active(key) || matches!(target, Some(t) if scheduler.is_active(*t))
        });

        let mut claimed = (false, false);
        for a in &active {
            let planned = self.plans.values().any(|t| *t == Some(a.id));
            if !planned || a.z > tuning.hit_band_ahead || a.z < -tuning.hit_band_behind {
                continue;
            }
            let Some(note) = scheduler.note(a.id) else {
                continue;
            };
            let slot = match note.hand {
                Hand::Left => &mut claimed.0,
                Hand::Right => &mut claimed.1,
            };
            if *slot {
                continue;
            }
            *slot = true;
            frame = frame.with(note.hand, HandSample::at(a.position, SWING_VELOCITY));
        }

        frame
    }
}
