//! Session state machine.
//!
//! Drives one workout over a `WorkoutBlockSequence`:
//!
//! ```text
//! ready --start--> countdown --3 ticks--> working --> resting --> ready (next set)
//!                                                          \--> exercise_complete --next--> ready | finished
//! ```
//!
//! The machine is pure: `tick` and the user actions mutate state and return
//! the events they caused. Audio cues and recording are side effects the
//! caller performs from those events.

use crate::blocks::WorkoutBlockSequence;
use crate::cues::CueEvent;
use crate::{
    Error, Exercise, Phase, PhaseKind, RepProgress, RepSpec, Result, SessionState, SubPhase,
    WorkProgress,
};
use serde::{Deserialize, Serialize};

/// Countdown length before every set, independent of the exercise
pub const COUNTDOWN_SECONDS: u32 = 3;

/// Rep pacer advance per tick; each lift or lower half takes 100 / STEP ticks
pub const REP_PERCENT_STEP: u8 = 50;

/// Rest/work seconds at or below which warning cues fire
pub const WARNING_SECONDS: u32 = 3;

/// User action accepted by the machine
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    Start,
    TogglePause,
    SelectSet { set: u32 },
    RepeatSet,
    NextExercise,
}

/// Something that happened during a tick or action
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    PhaseChanged { from: PhaseKind, to: PhaseKind },
    SetAdvanced { set: u32 },
    ExerciseAdvanced { index: usize },
    PauseToggled { paused: bool },
    Cue { cue: CueEvent },
    /// Emitted exactly once, when the machine enters `finished`
    Finished {
        reached_index: usize,
        elapsed_total_seconds: u64,
    },
}

/// Read-only view handed to the shell
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub exercise: Exercise,
    pub exercise_count: usize,
    pub estimated_minutes: u32,
}

/// What remains of a session torn down before finishing
#[derive(Clone, Debug, PartialEq)]
pub struct AbandonedSession {
    pub sequence: WorkoutBlockSequence,
    pub reached_index: usize,
    pub elapsed_total_seconds: u64,
}

/// The workout session state machine
#[derive(Clone, Debug)]
pub struct SessionMachine {
    sequence: WorkoutBlockSequence,
    state: SessionState,
}

impl SessionMachine {
    /// Start a session at the first set of the first exercise
    pub fn new(sequence: WorkoutBlockSequence) -> Self {
        Self {
            sequence,
            state: SessionState::default(),
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn sequence(&self) -> &WorkoutBlockSequence {
        &self.sequence
    }

    pub fn current_exercise(&self) -> &Exercise {
        // index is kept < len and the sequence is non-empty
        &self.sequence.exercises()[self.state.current_exercise_index]
    }

    pub fn is_finished(&self) -> bool {
        self.state.phase == Phase::Finished
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            state: self.state.clone(),
            exercise: self.current_exercise().clone(),
            exercise_count: self.sequence.len(),
            estimated_minutes: self.sequence.plan().estimated_minutes,
        }
    }

    /// Dispatch a user action
    pub fn apply(&mut self, action: Action) -> Result<Vec<SessionEvent>> {
        match action {
            Action::Start => self.start(),
            Action::TogglePause => self.toggle_pause(),
            Action::SelectSet { set } => self.select_set(set),
            Action::RepeatSet => self.repeat_set(),
            Action::NextExercise => self.next_exercise(),
        }
    }

    /// `ready` -> `countdown`
    pub fn start(&mut self) -> Result<Vec<SessionEvent>> {
        self.ensure_live()?;
        if self.state.phase != Phase::Ready {
            return Err(self.invalid("start"));
        }
        let mut events = Vec::new();
        self.enter(
            Phase::Countdown {
                remaining: COUNTDOWN_SECONDS,
            },
            &mut events,
        );
        tracing::info!(
            "Starting set {} of {:?}",
            self.state.current_set,
            self.current_exercise().name
        );
        Ok(events)
    }

    /// Flip `is_paused`; only while a timer phase is running
    pub fn toggle_pause(&mut self) -> Result<Vec<SessionEvent>> {
        self.ensure_live()?;
        if !self.state.phase.is_timer_active() {
            return Err(self.invalid("pause"));
        }
        self.state.is_paused = !self.state.is_paused;
        tracing::debug!("Paused: {}", self.state.is_paused);
        Ok(vec![SessionEvent::PauseToggled {
            paused: self.state.is_paused,
        }])
    }

    /// Jump to set `set` of the current exercise, discarding in-flight timers
    pub fn select_set(&mut self, set: u32) -> Result<Vec<SessionEvent>> {
        self.ensure_live()?;
        let sets_total = self.current_exercise().sets_total;
        if set == 0 || set > sets_total {
            return Err(Error::SetOutOfRange {
                requested: set,
                sets_total,
            });
        }
        let mut events = Vec::new();
        self.state.current_set = set;
        self.state.is_paused = false;
        self.enter(Phase::Ready, &mut events);
        events.push(SessionEvent::SetAdvanced { set });
        Ok(events)
    }

    /// Restart the current timed set from full duration (time-based only)
    pub fn repeat_set(&mut self) -> Result<Vec<SessionEvent>> {
        self.ensure_live()?;
        let seconds = match self.current_exercise().rep_spec {
            RepSpec::Duration { seconds } => seconds,
            RepSpec::Reps { .. } => return Err(self.invalid("repeat a rep-based set")),
        };
        match self.state.phase {
            Phase::Working(_) | Phase::Resting { .. } => {
                let mut events = Vec::new();
                self.enter(
                    Phase::Working(WorkProgress::Timed { remaining: seconds }),
                    &mut events,
                );
                Ok(events)
            }
            _ => Err(self.invalid("repeat set")),
        }
    }

    /// Advance to the next exercise, or finish after the last one
    pub fn next_exercise(&mut self) -> Result<Vec<SessionEvent>> {
        self.ensure_live()?;
        let mut events = Vec::new();
        self.state.is_paused = false;

        if self.state.current_exercise_index < self.sequence.last_index() {
            self.state.current_exercise_index += 1;
            self.state.current_set = 1;
            self.enter(Phase::Ready, &mut events);
            events.push(SessionEvent::ExerciseAdvanced {
                index: self.state.current_exercise_index,
            });
            tracing::info!(
                "Advanced to exercise {}/{}: {:?}",
                self.state.current_exercise_index + 1,
                self.sequence.len(),
                self.current_exercise().name
            );
        } else {
            self.enter(Phase::Finished, &mut events);
            events.push(SessionEvent::Finished {
                reached_index: self.state.current_exercise_index,
                elapsed_total_seconds: self.state.elapsed_total_seconds,
            });
            tracing::info!(
                "Session finished after {}s",
                self.state.elapsed_total_seconds
            );
        }
        Ok(events)
    }

    /// Tear the session down without finishing it
    pub fn abandon(self) -> AbandonedSession {
        tracing::info!(
            "Session abandoned at exercise {} after {}s",
            self.state.current_exercise_index + 1,
            self.state.elapsed_total_seconds
        );
        AbandonedSession {
            reached_index: self.state.current_exercise_index,
            elapsed_total_seconds: self.state.elapsed_total_seconds,
            sequence: self.sequence,
        }
    }

    /// Advance one second
    ///
    /// Does nothing while paused or finished. Otherwise counts elapsed time
    /// and steps the current timer phase.
    pub fn tick(&mut self) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        if self.state.is_paused || self.is_finished() {
            return events;
        }
        self.state.elapsed_total_seconds += 1;

        match self.state.phase {
            Phase::Countdown { remaining } => self.tick_countdown(remaining, &mut events),
            Phase::Working(WorkProgress::Timed { remaining }) => {
                self.tick_timed(remaining, &mut events)
            }
            Phase::Working(WorkProgress::Reps(progress)) => self.tick_reps(progress, &mut events),
            Phase::Resting { remaining } => self.tick_rest(remaining, &mut events),
            Phase::Ready | Phase::ExerciseComplete | Phase::Finished => {}
        }
        events
    }

    fn tick_countdown(&mut self, remaining: u32, events: &mut Vec<SessionEvent>) {
        if remaining <= 1 {
            cue(events, CueEvent::CountdownZero);
            let work = match self.current_exercise().rep_spec {
                RepSpec::Duration { seconds } => WorkProgress::Timed { remaining: seconds },
                RepSpec::Reps { .. } => WorkProgress::Reps(RepProgress::first()),
            };
            self.enter(Phase::Working(work), events);
        } else {
            cue(events, CueEvent::CountdownTick);
            self.state.phase = Phase::Countdown {
                remaining: remaining - 1,
            };
        }
    }

    fn tick_timed(&mut self, remaining: u32, events: &mut Vec<SessionEvent>) {
        let remaining = remaining.saturating_sub(1);
        if remaining == 0 {
            cue(events, CueEvent::PhaseComplete);
            self.enter_rest(events);
            return;
        }
        if remaining <= WARNING_SECONDS {
            cue(events, CueEvent::WorkWarning);
        }
        self.state.phase = Phase::Working(WorkProgress::Timed { remaining });
    }

    fn tick_reps(&mut self, progress: RepProgress, events: &mut Vec<SessionEvent>) {
        let total_reps = match self.current_exercise().rep_spec {
            RepSpec::Reps { count } => count,
            RepSpec::Duration { .. } => 0,
        };
        let percent = progress.percent.saturating_add(REP_PERCENT_STEP);

        let next = if percent < 100 {
            RepProgress { percent, ..progress }
        } else {
            match progress.sub_phase {
                SubPhase::Lift => {
                    cue(events, CueEvent::RepTurn);
                    RepProgress {
                        sub_phase: SubPhase::Lower,
                        percent: 0,
                        ..progress
                    }
                }
                SubPhase::Lower if progress.rep_number < total_reps => {
                    cue(events, CueEvent::NextRep);
                    RepProgress {
                        rep_number: progress.rep_number + 1,
                        sub_phase: SubPhase::Lift,
                        percent: 0,
                    }
                }
                SubPhase::Lower => {
                    cue(events, CueEvent::PhaseComplete);
                    self.enter_rest(events);
                    return;
                }
            }
        };
        self.state.phase = Phase::Working(WorkProgress::Reps(next));
    }

    fn tick_rest(&mut self, remaining: u32, events: &mut Vec<SessionEvent>) {
        let remaining = remaining.saturating_sub(1);
        if remaining > 0 {
            if remaining <= WARNING_SECONDS {
                cue(events, CueEvent::RestWarning);
            }
            self.state.phase = Phase::Resting { remaining };
            return;
        }

        cue(events, CueEvent::PhaseComplete);
        if self.state.current_set < self.current_exercise().sets_total {
            self.state.current_set += 1;
            self.enter(Phase::Ready, events);
            events.push(SessionEvent::SetAdvanced {
                set: self.state.current_set,
            });
        } else {
            self.enter(Phase::ExerciseComplete, events);
        }
    }

    fn enter_rest(&mut self, events: &mut Vec<SessionEvent>) {
        let remaining = self.current_exercise().rest_after_seconds;
        self.enter(Phase::Resting { remaining }, events);
    }

    fn enter(&mut self, phase: Phase, events: &mut Vec<SessionEvent>) {
        let from = self.state.phase.kind();
        self.state.phase = phase;
        tracing::debug!("Phase {:?} -> {:?}", from, phase.kind());
        events.push(SessionEvent::PhaseChanged {
            from,
            to: phase.kind(),
        });
    }

    fn ensure_live(&self) -> Result<()> {
        if self.is_finished() {
            Err(Error::SessionFinished)
        } else {
            Ok(())
        }
    }

    fn invalid(&self, action: &'static str) -> Error {
        Error::InvalidAction {
            action,
            phase: self.state.phase.kind(),
        }
    }
}

fn cue(events: &mut Vec<SessionEvent>, cue: CueEvent) {
    events.push(SessionEvent::Cue { cue });
}
