//! Session state machine and the per-tick update
//!
//! `Session::tick` is the whole engine for one frame: schedule notes against
//! the playback clock, resolve hand collisions, feed every decision to the
//! scoreboard, then check for the end of the session. It returns the events
//! produced so presentation layers can react; nothing is shared or hidden.

use rand_pcg::Pcg32;

use super::chart::generate_chart;
use super::collision::{HandFrame, resolve_collisions};
use super::scheduler::NoteScheduler;
use super::scoring::{ScoreOutcome, Scoreboard};
use super::state::{GameEvent, RngState, SessionState, SessionStatus, VisibleNote};
use crate::curriculum::Curriculum;
use crate::error::EngineError;
use crate::playback::{Playback, Track};
use crate::settings::Tuning;

/// Inputs sampled once per tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Playback position in seconds
    pub playback_time: f64,
    /// Track has finished playing
    pub playback_ended: bool,
    /// Latest tracker samples (untracked hands have no position)
    pub hands: HandFrame,
}

impl TickInput {
    /// Sample the playback clock
    pub fn from_playback(playback: &dyn Playback, hands: HandFrame) -> Self {
        Self {
            playback_time: playback.position(),
            playback_ended: playback.has_ended(),
            hands,
        }
    }
}

/// One player's run through a track
#[derive(Debug, Clone)]
pub struct Session {
    status: SessionStatus,
    tuning: Tuning,
    curriculum: Curriculum,
    rng_state: RngState,
    scheduler: Option<NoteScheduler>,
    scoreboard: Scoreboard,
    instruction: String,
    track: Option<Track>,
    /// Latest playback time seen (clamps clock regressions)
    now: f64,
}

impl Session {
    /// Create a session waiting for the tracker
    pub fn new(seed: u64, curriculum: Curriculum, tuning: Tuning) -> Self {
        Self {
            status: SessionStatus::Loading,
            tuning,
            curriculum,
            rng_state: RngState::new(seed),
            scheduler: None,
            scoreboard: Scoreboard::new(),
            instruction: String::new(),
            track: None,
            now: 0.0,
        }
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn track(&self) -> Option<&Track> {
        self.track.as_ref()
    }

    pub fn scheduler(&self) -> Option<&NoteScheduler> {
        self.scheduler.as_ref()
    }

    /// Tracker/camera is up: `Loading -> Idle`
    pub fn mark_ready(&mut self) -> Result<(), EngineError> {
        if self.status != SessionStatus::Loading {
            return Err(self.invalid("mark ready"));
        }
        self.status = SessionStatus::Idle;
        log::info!("Tracking ready, session idle");
        Ok(())
    }

    /// Start a run on `track`: `Idle -> Playing`.
    ///
    /// Generates a fresh chart and resets the scoreboard. If the playback
    /// device fails to start, the session stays `Idle` and the error is
    /// returned.
    pub fn start(&mut self, track: &Track, playback: &mut dyn Playback) -> Result<(), EngineError> {
        if self.status != SessionStatus::Idle {
            return Err(self.invalid("start"));
        }
        self.tuning.validate()?;
        if !track.bpm.is_finite() || track.bpm <= 0.0 {
            return Err(EngineError::InvalidTempo(track.bpm));
        }

        if let Err(e) = playback.start(track) {
            log::warn!("Failed to start playback - staying idle: {}", e);
            return Err(e);
        }

        let mut rng: Pcg32 = self.rng_state.next_rng();
        let chart = generate_chart(&self.curriculum, self.tuning.difficulty, track.bpm, &mut rng)?;

        self.scheduler = Some(NoteScheduler::new(chart, &self.tuning));
        self.scoreboard = Scoreboard::new();
        self.instruction.clear();
        self.track = Some(*track);
        self.now = 0.0;
        self.status = SessionStatus::Playing;
        log::info!(
            "Session started: '{}' at {} bpm (chart stream {})",
            track.title,
            track.bpm,
            self.rng_state.stream
        );
        Ok(())
    }

    /// Leave a finished session: `GameOver | Victory -> Idle`
    pub fn reset(&mut self) -> Result<(), EngineError> {
        if !self.status.is_terminal() {
            return Err(self.invalid("reset"));
        }
        self.scheduler = None;
        self.scoreboard = Scoreboard::new();
        self.instruction.clear();
        self.track = None;
        self.now = 0.0;
        self.status = SessionStatus::Idle;
        log::info!("Session reset");
        Ok(())
    }

    /// Advance the session by one tick
    pub fn tick(&mut self, input: &TickInput) -> Vec<GameEvent> {
        if self.status != SessionStatus::Playing {
            return Vec::new();
        }
        let Some(scheduler) = self.scheduler.as_mut() else {
            return Vec::new();
        };

        if input.playback_time < self.now {
            log::debug!(
                "Playback clock went backwards ({:.3}s < {:.3}s), holding",
                input.playback_time,
                self.now
            );
        }
        let now = input.playback_time.max(self.now);
        self.now = now;

        let mut events = scheduler.advance(now);
        events.extend(resolve_collisions(scheduler, &input.hands, now, &self.tuning));

        let mut defeated = false;
        for event in &events {
            if self.scoreboard.apply(event, &self.tuning) == ScoreOutcome::Defeated {
                defeated = true;
            }
        }

        if let Some(note) = scheduler.nearest_active() {
            if note.instruction != self.instruction {
                self.instruction = note.instruction.clone();
                events.push(GameEvent::InstructionChanged(self.instruction.clone()));
            }
        }

        if defeated {
            self.end(false, &mut events);
        } else if input.playback_ended {
            self.end(true, &mut events);
        }

        events
    }

    /// Finish the run. Only the first call for a session has any effect.
    fn end(&mut self, victory: bool, events: &mut Vec<GameEvent>) {
        if self.status != SessionStatus::Playing {
            return;
        }
        self.status = if victory {
            SessionStatus::Victory
        } else {
            SessionStatus::GameOver
        };
        if let Some(scheduler) = self.scheduler.as_mut() {
            let closed = scheduler.close_out(self.now);
            if closed > 0 {
                log::debug!("Closed out {} unresolved notes", closed);
            }
        }
        log::info!(
            "Session ended ({}): score {}, max combo {}, health {}",
            if victory { "victory" } else { "game over" },
            self.scoreboard.score,
            self.scoreboard.stats.max_combo,
            self.scoreboard.health
        );
        events.push(GameEvent::SessionEnded { victory });
    }

    /// HUD snapshot
    pub fn snapshot(&self) -> SessionState {
        SessionState {
            score: self.scoreboard.score,
            combo: self.scoreboard.combo,
            multiplier: self.scoreboard.multiplier,
            health: self.scoreboard.health,
            status: self.status,
            instruction: self.instruction.clone(),
            stats: self.scoreboard.stats,
        }
    }

    /// Notes to draw this frame
    pub fn visible_notes(&self) -> Vec<VisibleNote> {
        self.scheduler
            .as_ref()
            .map(NoteScheduler::visible_notes)
            .unwrap_or_default()
    }

    fn invalid(&self, action: &'static str) -> EngineError {
        EngineError::InvalidTransition {
            from: self.status,
            action,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::*;
    use crate::curriculum::QuestionSet;
    use crate::playback::{SimulatedPlayback, TRACKS};
    use crate::sim::collision::HandSample;
    use crate::sim::state::{Hand, Note};
    use glam::Vec3;
    use proptest::prelude::*;

    fn went() -> Curriculum {
        Curriculum::new(vec![QuestionSet::new(
            "Yesterday I ___ to the park.",
            "WENT",
            &["GO", "GOES", "GOING"],
        )])
        .unwrap()
    }

    fn playing(curriculum: Curriculum) -> Session {
        let mut session = Session::new(12345, curriculum, Tuning::default());
        session.mark_ready().unwrap();
        session.start(&TRACKS[1], &mut SimulatedPlayback::new()).unwrap();
        session
    }

    fn at(time: f64) -> TickInput {
        TickInput {
            playback_time: time,
            ..Default::default()
        }
    }

    /// Hands swinging through `note` at the interception plane
    fn strike(note: &Note) -> HandFrame {
        let pos = crate::note_position(note.lane, note.layer, 0.0);
        HandFrame::default().with(note.hand, HandSample::at(pos, Vec3::new(0.0, 0.0, -3.0)))
    }

    fn first_note(session: &Session, correct: bool) -> Note {
        session
            .scheduler()
            .and_then(|s| s.notes().iter().find(|n| n.is_correct == correct).cloned())
            .unwrap()
    }

    #[test]
    fn test_status_transitions() {
        let mut session = Session::new(1, went(), Tuning::default());
        assert_eq!(session.status(), SessionStatus::Loading);
        assert!(session.start(&TRACKS[0], &mut SimulatedPlayback::new()).is_err());
        assert!(session.reset().is_err());

        session.mark_ready().unwrap();
        assert_eq!(session.status(), SessionStatus::Idle);
        assert!(session.mark_ready().is_err());

        session.start(&TRACKS[0], &mut SimulatedPlayback::new()).unwrap();
        assert_eq!(session.status(), SessionStatus::Playing);
        assert!(session.reset().is_err(), "reset only from a finished session");
        assert!(session.start(&TRACKS[0], &mut SimulatedPlayback::new()).is_err());
    }

    #[test]
    fn test_playback_failure_stays_idle() {
        let mut session = Session::new(1, went(), Tuning::default());
        session.mark_ready().unwrap();
        let result = session.start(&TRACKS[0], &mut SimulatedPlayback::unavailable());
        assert!(matches!(result, Err(EngineError::Playback(_))));
        assert_eq!(session.status(), SessionStatus::Idle);
        assert!(session.scheduler().is_none());
    }

    #[test]
    fn test_unusable_tuning_or_tempo_stays_idle() {
        let tuning = Tuning {
            note_speed: -10.0,
            ..Tuning::default()
        };
        let mut session = Session::new(1, went(), tuning);
        session.mark_ready().unwrap();
        let result = session.start(&TRACKS[0], &mut SimulatedPlayback::new());
        assert!(matches!(result, Err(EngineError::InvalidTuning { field: "note_speed", .. })));
        assert_eq!(session.status(), SessionStatus::Idle);

        let mut session = Session::new(1, went(), Tuning::default());
        session.mark_ready().unwrap();
        let silent = Track {
            bpm: 0.0,
            ..TRACKS[0]
        };
        let result = session.start(&silent, &mut SimulatedPlayback::new());
        assert!(matches!(result, Err(EngineError::InvalidTempo(_))));
        assert_eq!(session.status(), SessionStatus::Idle);
    }

    #[test]
    fn test_good_cut_scores_and_sets_instruction() {
        let mut session = playing(went());
        let note = first_note(&session, true);

        let events = session.tick(&at(note.arrival - 1.0));
        assert!(events.contains(&GameEvent::InstructionChanged(note.instruction.clone())));
        assert_eq!(session.snapshot().instruction, note.instruction);

        let input = TickInput {
            playback_time: note.arrival,
            playback_ended: false,
            hands: strike(&note),
        };
        let events = session.tick(&input);
        assert!(events.iter().any(|e| matches!(e, GameEvent::Hit { good_cut: true, .. })));

        let snap = session.snapshot();
        assert_eq!(snap.score, 100);
        assert_eq!(snap.combo, 1);
        assert_eq!(snap.health, MAX_HEALTH);
    }

    #[test]
    fn test_bad_cut_costs_health() {
        let mut session = playing(went());
        let wrong = first_note(&session, false);
        session.tick(&at(wrong.arrival - 1.0));
        let input = TickInput {
            playback_time: wrong.arrival,
            playback_ended: false,
            hands: strike(&wrong),
        };
        let events = session.tick(&input);
        assert!(events.iter().any(|e| matches!(e, GameEvent::Hit { good_cut: false, .. })));
        assert_eq!(session.snapshot().health, MAX_HEALTH - BAD_CUT_PENALTY);
    }

    #[test]
    fn test_missed_answer_at_health_ten_ends_game() {
        let mut session = playing(went());
        session.scoreboard.health = 10;
        let note = first_note(&session, true);

        session.tick(&at(note.arrival - 1.0));
        let events = session.tick(&at(note.arrival + 1.0));

        let snap = session.snapshot();
        assert_eq!(snap.health, 0);
        assert_eq!(snap.status, SessionStatus::GameOver);
        let ended: Vec<_> = events
            .iter()
            .filter(|e| matches!(e, GameEvent::SessionEnded { .. }))
            .collect();
        assert_eq!(ended, vec![&GameEvent::SessionEnded { victory: false }]);

        // Nothing more happens until reset
        assert!(session.tick(&at(note.arrival + 2.0)).is_empty());
        session.reset().unwrap();
        assert_eq!(session.status(), SessionStatus::Idle);
        assert_eq!(session.snapshot().health, MAX_HEALTH);
    }

    #[test]
    fn test_simultaneous_penalties_end_once() {
        // Two questions landing together, both correct answers missed in one tick
        let curriculum = Curriculum::new(vec![
            QuestionSet::new("I ___ home.", "WENT", &["GO"]),
            QuestionSet::new("We ___ pizza.", "ATE", &["EAT"]),
        ])
        .unwrap();
        let mut session = playing(curriculum);
        session.scoreboard.health = 20;

        let events = session.tick(&at(1000.0));
        let ended = events
            .iter()
            .filter(|e| matches!(e, GameEvent::SessionEnded { .. }))
            .count();
        assert_eq!(ended, 1);
        assert_eq!(session.status(), SessionStatus::GameOver);
        assert_eq!(session.snapshot().health, 0);
    }

    #[test]
    fn test_playback_end_is_victory() {
        let mut session = playing(went());
        let events = session.tick(&TickInput {
            playback_time: 50.0,
            playback_ended: true,
            hands: HandFrame::default(),
        });
        assert_eq!(session.status(), SessionStatus::Victory);
        assert_eq!(
            events.last(),
            Some(&GameEvent::SessionEnded { victory: true })
        );
        assert!(session.scheduler().map(NoteScheduler::is_finished).unwrap_or(false));
    }

    #[test]
    fn test_playback_end_with_notes_in_flight() {
        let mut session = playing(went());
        let note = first_note(&session, true);
        session.tick(&at(note.arrival - 2.0));
        session.tick(&TickInput {
            playback_time: note.arrival - 1.0,
            playback_ended: true,
            hands: HandFrame::default(),
        });
        assert_eq!(session.status(), SessionStatus::Victory);
        // Every note ends resolved
        assert!(session.scheduler().map(NoteScheduler::is_finished).unwrap_or(false));
    }

    #[test]
    fn test_clock_regression_is_held() {
        let mut session = playing(went());
        let note = first_note(&session, true);
        session.tick(&at(note.arrival + 0.1));
        // Going back in time must not resurrect or re-test the note window
        session.tick(&at(0.0));
        assert_eq!(session.now, note.arrival + 0.1);
    }

    #[test]
    fn test_restart_generates_new_chart() {
        let mut session = playing(Curriculum::builtin());
        let first: Vec<u8> = session
            .scheduler()
            .map(|s| s.notes().iter().map(|n| n.lane).collect())
            .unwrap();
        session.tick(&TickInput {
            playback_time: 1.0,
            playback_ended: true,
            hands: HandFrame::default(),
        });
        session.reset().unwrap();
        session.start(&TRACKS[1], &mut SimulatedPlayback::new()).unwrap();
        let second: Vec<u8> = session
            .scheduler()
            .map(|s| s.notes().iter().map(|n| n.lane).collect())
            .unwrap();
        assert_eq!(session.snapshot().score, 0);
        assert_ne!(first, second);
    }

    #[test]
    fn test_determinism() {
        // Two sessions with same seed and inputs produce identical results
        let mut a = playing(Curriculum::builtin());
        let mut b = playing(Curriculum::builtin());
        let note = first_note(&a, true);
        assert_eq!(note, first_note(&b, true));

        let inputs = [
            at(note.arrival - 1.0),
            TickInput {
                playback_time: note.arrival,
                playback_ended: false,
                hands: strike(&note),
            },
            at(note.arrival + 5.0),
            at(note.arrival + 10.0),
        ];
        for input in &inputs {
            assert_eq!(a.tick(input), b.tick(input));
        }
        assert_eq!(a.snapshot(), b.snapshot());
    }

    #[test]
    fn test_left_hand_cannot_take_right_lane() {
        let mut session = playing(went());
        let note = first_note(&session, true);
        session.tick(&at(note.arrival - 1.0));
        let wrong_hand = match note.hand {
            Hand::Left => Hand::Right,
            Hand::Right => Hand::Left,
        };
        let pos = crate::note_position(note.lane, note.layer, 0.0);
        let hands = HandFrame::default()
            .with(wrong_hand, HandSample::at(pos, Vec3::new(0.0, 0.0, -3.0)));
        let events = session.tick(&TickInput {
            playback_time: note.arrival,
            playback_ended: false,
            hands,
        });
        assert!(!events.iter().any(|e| matches!(e, GameEvent::Hit { .. })));
    }

    proptest! {
        #[test]
        fn prop_health_and_resolution_invariants(
            seed in any::<u64>(),
            difficulty in 0.0f32..4.0,
            steps in prop::collection::vec((0.0f64..0.5, any::<bool>(), any::<bool>(), 0.0f32..4.0), 1..200),
        ) {
            let tuning = Tuning { difficulty, ..Tuning::default() };
            let mut session = Session::new(seed, Curriculum::builtin(), tuning);
            session.mark_ready().unwrap();
            session.start(&TRACKS[2], &mut SimulatedPlayback::new()).unwrap();

            let mut time = 0.0;
            let mut ended = 0;
            for (dt, swing_left, swing_right, speed) in steps {
                time += dt;
                // Park both hands on lanes near the plane so strikes really happen
                let left = if swing_left {
                    HandSample::at(Vec3::new(LANE_X[1], LAYER_Y[0], 0.0), Vec3::new(0.0, 0.0, -speed))
                } else {
                    HandSample::untracked()
                };
                let right = if swing_right {
                    HandSample::at(Vec3::new(LANE_X[2], LAYER_Y[1], 0.0), Vec3::new(0.0, 0.0, -speed))
                } else {
                    HandSample::untracked()
                };
                let events = session.tick(&TickInput {
                    playback_time: time,
                    playback_ended: false,
                    hands: HandFrame { left, right },
                });
                ended += events.iter().filter(|e| matches!(e, GameEvent::SessionEnded { .. })).count();

                let snap = session.snapshot();
                prop_assert!(snap.health <= MAX_HEALTH);
                prop_assert!(ended <= 1);
                prop_assert_eq!(ended == 1, snap.status.is_terminal());
            }

            // Finish the track; every note ends hit or missed
            session.tick(&TickInput { playback_time: 1000.0, playback_ended: true, hands: HandFrame::default() });
            let scheduler = session.scheduler().unwrap();
            prop_assert!(scheduler.is_finished());
        }
    }
}
