//! Note scheduling against the playback clock
//!
//! Owns the chart for one session. Notes spawn `lead_time` seconds ahead of
//! their arrival, fly toward the interception plane, and are missed once they
//! travel `miss_threshold` past it. The active set is keyed by note id so
//! iteration order is arrival order and membership is explicit.

use std::collections::BTreeMap;

use glam::Vec3;

use super::chart::Chart;
use super::state::{GameEvent, Note, NoteId, Resolution, VisibleNote};
use crate::settings::Tuning;

/// How long a resolved note stays in the render list (for hit/miss effects)
pub const RESOLVED_VISIBLE_SECS: f64 = 0.25;

/// An active note and where it is this tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActiveNote {
    pub id: NoteId,
    /// Distance in front of the interception plane
    pub z: f32,
    pub position: Vec3,
}

#[derive(Debug, Clone)]
pub struct NoteScheduler {
    /// Arena of all notes in arrival order
    notes: Vec<Note>,
    /// Index of the next note that has not been activated
    next_pending: usize,
    /// Active notes: id -> arena index
    active: BTreeMap<NoteId, usize>,
    speed: f32,
    lead_time: f64,
    miss_threshold: f32,
    /// Last time passed to `advance`
    now: f64,
}

impl NoteScheduler {
    pub fn new(chart: Chart, tuning: &Tuning) -> Self {
        Self {
            notes: chart.into_notes(),
            next_pending: 0,
            active: BTreeMap::new(),
            speed: tuning.note_speed,
            lead_time: tuning.lead_time(),
            miss_threshold: tuning.miss_threshold,
            now: 0.0,
        }
    }

    pub fn lead_time(&self) -> f64 {
        self.lead_time
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn note(&self, id: NoteId) -> Option<&Note> {
        self.index_of(id).map(|i| &self.notes[i])
    }

    /// Ids of active notes in arrival order
    pub fn active_ids(&self) -> impl Iterator<Item = NoteId> + '_ {
        self.active.keys().copied()
    }

    pub fn is_active(&self, id: NoteId) -> bool {
        self.active.contains_key(&id)
    }

    /// True once every note has been hit or missed
    pub fn is_finished(&self) -> bool {
        self.notes.iter().all(Note::is_resolved)
    }

    /// Spawn due notes and expire notes that flew past.
    ///
    /// Returns a `Miss` event for every note that expired this call.
    pub fn advance(&mut self, now: f64) -> Vec<GameEvent> {
        self.now = now;
        let mut events = Vec::new();

        while let Some(note) = self.notes.get_mut(self.next_pending) {
            if note.arrival - self.lead_time > now {
                break;
            }
            if note.activate() {
                log::debug!("Note {} '{}' spawned at {:.3}s", note.id, note.text, now);
                self.active.insert(note.id, self.next_pending);
            }
            self.next_pending += 1;
        }

        let expired: Vec<NoteId> = self
            .active
            .iter()
            .filter(|&(_, &index)| self.notes[index].z_at(now, self.speed) < -self.miss_threshold)
            .map(|(&id, _)| id)
            .collect();

        for id in expired {
            let Some(index) = self.active.remove(&id) else {
                continue;
            };
            let note = &mut self.notes[index];
            if note.mark_missed(now) {
                log::debug!("Note {} '{}' missed at {:.3}s", note.id, note.text, now);
                events.push(GameEvent::Miss { note: note.clone() });
            }
        }

        events
    }

    /// Active notes with their positions at the last `advance` time
    pub fn active_notes(&self) -> Vec<ActiveNote> {
        self.active
            .iter()
            .map(|(&id, &index)| {
                let note = &self.notes[index];
                ActiveNote {
                    id,
                    z: note.z_at(self.now, self.speed),
                    position: note.position_at(self.now, self.speed),
                }
            })
            .collect()
    }

    /// The active note closest to the interception plane
    pub fn nearest_active(&self) -> Option<&Note> {
        self.active
            .values()
            .map(|&index| &self.notes[index])
            .min_by(|a, b| {
                let da = a.z_at(self.now, self.speed).abs();
                let db = b.z_at(self.now, self.speed).abs();
                da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
            })
    }

    /// Move an active note to `Hit` and drop it from the active set.
    ///
    /// Returns the resolved note, or `None` if it was not active (already
    /// resolved, never spawned, or unknown). Calling twice is a no-op.
    pub fn resolve_hit(&mut self, id: NoteId, at: f64) -> Option<Note> {
        let index = *self.active.get(&id)?;
        let note = &mut self.notes[index];
        if !note.mark_hit(at) {
            return None;
        }
        self.active.remove(&id);
        Some(note.clone())
    }

    /// Resolve every remaining note as missed without emitting events.
    ///
    /// Used when the session ends before the chart does. Returns how many
    /// notes were closed out.
    pub fn close_out(&mut self, at: f64) -> usize {
        self.active.clear();
        let mut closed = 0;
        for note in &mut self.notes {
            if note.force_missed(at) {
                closed += 1;
            }
        }
        closed
    }

    /// Notes the renderer should draw right now
    pub fn visible_notes(&self) -> Vec<VisibleNote> {
        self.notes[..self.next_pending]
            .iter()
            .filter(|note| match note.resolved_at() {
                Some(at) => self.now - at <= RESOLVED_VISIBLE_SECS,
                None => note.resolution() == Resolution::Active,
            })
            .map(|note| VisibleNote {
                id: note.id,
                position: note.position_at(self.now, self.speed),
                text: note.text.clone(),
                hand: note.hand,
                resolution: note.resolution(),
            })
            .collect()
    }

    fn index_of(&self, id: NoteId) -> Option<usize> {
        if let Some(&index) = self.active.get(&id) {
            return Some(index);
        }
        self.notes.iter().position(|n| n.id == id)
    }
}
