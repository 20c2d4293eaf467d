//! Session recorder.
//!
//! Builds the `SessionRecord` for a finished (or abandoned-and-kept) session
//! and hands it to the data service. A save failure never loses the record:
//! the caller gets it back in `FinalizeOutcome::Unsaved`.

use crate::blocks::WorkoutBlockSequence;
use crate::{CompletedExercise, CompletedSet, Exercise, RepSpec, Result, SessionRecord};
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

/// Data service that persists session records
pub trait SessionStore: Send + Sync {
    /// Persist `record`, returning the stored copy
    fn save_session(&self, record: &SessionRecord) -> Result<SessionRecord>;
}

/// Result of finalizing a session
#[derive(Clone, Debug, PartialEq)]
pub enum FinalizeOutcome {
    Saved(SessionRecord),
    /// The store failed; the summary can still be shown from `record`
    Unsaved { record: SessionRecord, error: String },
}

impl FinalizeOutcome {
    pub fn record(&self) -> &SessionRecord {
        match self {
            FinalizeOutcome::Saved(record) => record,
            FinalizeOutcome::Unsaved { record, .. } => record,
        }
    }

    pub fn is_saved(&self) -> bool {
        matches!(self, FinalizeOutcome::Saved(_))
    }
}

#[derive(Clone)]
pub struct SessionRecorder {
    store: Arc<dyn SessionStore>,
}

impl SessionRecorder {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    /// Build and save the record for a session that reached `reached_index`
    pub fn finalize(
        &self,
        sequence: &WorkoutBlockSequence,
        reached_index: usize,
        elapsed_total_seconds: u64,
    ) -> FinalizeOutcome {
        let record = build_record(sequence, reached_index, elapsed_total_seconds);
        match self.store.save_session(&record) {
            Ok(saved) => {
                tracing::info!(
                    "Saved session {} ({} exercises, {} min)",
                    saved.id,
                    saved.completed_exercises.len(),
                    saved.duration_minutes
                );
                FinalizeOutcome::Saved(saved)
            }
            Err(e) => {
                tracing::warn!("Failed to save session {}: {}", record.id, e);
                FinalizeOutcome::Unsaved {
                    record,
                    error: e.to_string(),
                }
            }
        }
    }
}

/// Summarize a session: every exercise up to and including `reached_index`
pub fn build_record(
    sequence: &WorkoutBlockSequence,
    reached_index: usize,
    elapsed_total_seconds: u64,
) -> SessionRecord {
    let plan = sequence.plan();
    let reached = reached_index.min(sequence.last_index());

    SessionRecord {
        id: Uuid::new_v4(),
        plan_id: plan.plan_id.clone(),
        plan_name: plan.plan_name.clone(),
        plan_notes: plan.plan_notes.clone(),
        date: Utc::now(),
        duration_minutes: duration_minutes(elapsed_total_seconds),
        calories_burned: plan.estimated_calories,
        completed_exercises: sequence.exercises()[..=reached]
            .iter()
            .map(completed_exercise)
            .collect(),
    }
}

/// Whole minutes, rounded, never below 1
pub fn duration_minutes(elapsed_total_seconds: u64) -> u32 {
    let minutes = (elapsed_total_seconds + 30) / 60;
    u32::try_from(minutes).unwrap_or(u32::MAX).max(1)
}

fn completed_exercise(exercise: &Exercise) -> CompletedExercise {
    let set = match exercise.rep_spec {
        RepSpec::Reps { count } => CompletedSet {
            reps: count,
            weight: 0.0,
            duration_seconds: None,
        },
        RepSpec::Duration { seconds } => CompletedSet {
            reps: 0,
            weight: 0.0,
            duration_seconds: Some(seconds),
        },
    };
    CompletedExercise {
        exercise_name: exercise.name.clone(),
        notes: exercise.instructions.clone(),
        sets: vec![set; exercise.sets_total as usize],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocks::{build_sequence, BlockPolicy};
    use crate::plan::{GeneratedExercise, GeneratedPlan, PlanSource};
    use crate::Error;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemoryStore {
        saved: Mutex<Vec<SessionRecord>>,
    }

    impl SessionStore for MemoryStore {
        fn save_session(&self, record: &SessionRecord) -> Result<SessionRecord> {
            self.saved.lock().unwrap().push(record.clone());
            Ok(record.clone())
        }
    }

    struct OfflineStore;

    impl SessionStore for OfflineStore {
        fn save_session(&self, _record: &SessionRecord) -> Result<SessionRecord> {
            Err(Error::Persistence("network unreachable".into()))
        }
    }

    fn sequence() -> WorkoutBlockSequence {
        let exercise = |name: &str, reps: &str| GeneratedExercise {
            name: name.into(),
            reps: reps.into(),
            sets: 3,
            instructions: format!("{} slowly", name),
            image_url: String::new(),
            equipment: None,
            rest_after: Some(30),
        };
        let source = PlanSource::Generated(GeneratedPlan {
            estimated_time: 30,
            estimated_calories: 250,
            training: vec![
                exercise("Squat", "12 reps"),
                exercise("Plank", "30 seconds"),
                exercise("Row", "10 reps"),
            ],
            ..Default::default()
        });
        build_sequence(&source, &BlockPolicy::default()).unwrap()
    }

    #[test]
    fn test_duration_minutes_rounds_with_floor_of_one() {
        assert_eq!(duration_minutes(0), 1);
        assert_eq!(duration_minutes(29), 1);
        assert_eq!(duration_minutes(89), 1);
        assert_eq!(duration_minutes(90), 2);
        assert_eq!(duration_minutes(1800), 30);
    }

    #[test]
    fn test_record_covers_reached_exercises() {
        let record = build_record(&sequence(), 1, 600);

        assert_eq!(record.plan_name, "AI Daily Workout");
        assert_eq!(record.calories_burned, 250);
        assert_eq!(record.duration_minutes, 10);
        assert_eq!(record.completed_exercises.len(), 2);

        let squat = &record.completed_exercises[0];
        assert_eq!(squat.sets.len(), 3);
        assert_eq!(squat.sets[0].reps, 12);
        assert_eq!(squat.notes, "Squat slowly");

        let plank = &record.completed_exercises[1];
        assert_eq!(plank.sets[0].duration_seconds, Some(30));
    }

    #[test]
    fn test_finalize_saves_once() {
        let store = Arc::new(MemoryStore::default());
        let recorder = SessionRecorder::new(store.clone());

        let outcome = recorder.finalize(&sequence(), 2, 1200);
        assert!(outcome.is_saved());
        assert_eq!(outcome.record().completed_exercises.len(), 3);
        assert_eq!(store.saved.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_finalize_keeps_record_when_store_fails() {
        let recorder = SessionRecorder::new(Arc::new(OfflineStore));

        match recorder.finalize(&sequence(), 0, 45) {
            FinalizeOutcome::Unsaved { record, error } => {
                assert_eq!(record.completed_exercises.len(), 1);
                assert!(error.contains("network unreachable"));
            }
            other => panic!("expected unsaved outcome, got {:?}", other),
        }
    }
}
