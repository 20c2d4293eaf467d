//! Core domain types for the Pacer workout player.
//!
//! This module defines the fundamental types used throughout the system:
//! - Normalized exercises and the blocks they belong to
//! - Session phases and timer progress
//! - Completed-exercise logs and persisted session records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Exercise Types
// ============================================================================

/// Block a normalized exercise belongs to. Declaration order is play order.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    WarmUp,
    Training,
    Stretching,
}

impl BlockKind {
    /// Heading used by the shell
    pub fn label(&self) -> &'static str {
        match self {
            BlockKind::WarmUp => "Warm Up",
            BlockKind::Training => "Training",
            BlockKind::Stretching => "Stretching",
        }
    }
}

/// How a set is performed: a rep count paced by the engine, or a hold
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RepSpec {
    /// Rep-based; `count` of 0 is a degenerate single paced rep
    Reps { count: u32 },
    /// Time-based
    Duration { seconds: u32 },
}

impl RepSpec {
    pub fn is_rep_based(&self) -> bool {
        matches!(self, RepSpec::Reps { .. })
    }
}

/// A normalized, block-tagged exercise ready for the session engine
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Exercise {
    pub name: String,
    pub block: BlockKind,
    pub sets_total: u32,
    pub rep_spec: RepSpec,
    pub rest_after_seconds: u32,
    pub equipment_label: String,
    pub instructions: String,
    pub image_ref: Option<String>,
    /// Original reps text ("12 reps", "30 seconds hold")
    pub reps_label: String,
}

/// What the block model had to fix on a malformed exercise
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RepairKind {
    /// `sets` was below the floor and was raised
    SetsFloored { from: i64, to: u32 },
    /// `sets` was above the ceiling and was lowered
    SetsCapped { from: i64, to: u32 },
    /// Rep-based text without a parseable count; defaulted to 0
    RepsUnparseable { text: String },
}

/// A repair applied to the exercise at `index` in the flattened sequence
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExerciseRepair {
    pub index: usize,
    pub name: String,
    pub kind: RepairKind,
}

// ============================================================================
// Plan Metadata
// ============================================================================

/// Where a plan came from
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PlanOrigin {
    UserAuthored,
    Generated,
}

/// Plan-level facts carried alongside the exercise sequence
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PlanInfo {
    pub plan_id: String,
    pub plan_name: String,
    pub plan_notes: String,
    pub origin: PlanOrigin,
    pub estimated_minutes: u32,
    pub estimated_calories: u32,
}

// ============================================================================
// Session Phase Types
// ============================================================================

/// Half of a paced rep
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SubPhase {
    Lift,
    Lower,
}

/// Pacer position inside a rep-based set
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RepProgress {
    pub rep_number: u32,
    pub sub_phase: SubPhase,
    pub percent: u8,
}

impl RepProgress {
    /// Rep 1, lift, 0%
    pub fn first() -> Self {
        Self {
            rep_number: 1,
            sub_phase: SubPhase::Lift,
            percent: 0,
        }
    }
}

/// Progress while working; the variant always matches the exercise's `RepSpec`
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WorkProgress {
    Timed { remaining: u32 },
    Reps(RepProgress),
}

/// Session phase with its phase-specific timer state
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum Phase {
    Ready,
    Countdown { remaining: u32 },
    Working(WorkProgress),
    Resting { remaining: u32 },
    ExerciseComplete,
    Finished,
}

impl Phase {
    pub fn kind(&self) -> PhaseKind {
        match self {
            Phase::Ready => PhaseKind::Ready,
            Phase::Countdown { .. } => PhaseKind::Countdown,
            Phase::Working(_) => PhaseKind::Working,
            Phase::Resting { .. } => PhaseKind::Resting,
            Phase::ExerciseComplete => PhaseKind::ExerciseComplete,
            Phase::Finished => PhaseKind::Finished,
        }
    }

    /// Countdown, working and resting run a timer; pause only applies to these
    pub fn is_timer_active(&self) -> bool {
        matches!(
            self,
            Phase::Countdown { .. } | Phase::Working(_) | Phase::Resting { .. }
        )
    }
}

/// Phase discriminant without timer payload
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PhaseKind {
    Ready,
    Countdown,
    Working,
    Resting,
    ExerciseComplete,
    Finished,
}

/// Mutable session state, owned by `SessionMachine`
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionState {
    /// 0-based, always < sequence length
    pub current_exercise_index: usize,
    /// 1-based, always <= sets_total of the current exercise
    pub current_set: u32,
    pub phase: Phase,
    pub elapsed_total_seconds: u64,
    pub is_paused: bool,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            current_exercise_index: 0,
            current_set: 1,
            phase: Phase::Ready,
            elapsed_total_seconds: 0,
            is_paused: false,
        }
    }
}

// ============================================================================
// Session Record Types
// ============================================================================

/// One recorded set
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CompletedSet {
    pub reps: u32,
    pub weight: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<u32>,
}

/// Post-hoc summary of one exercise reached in a session
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CompletedExercise {
    pub exercise_name: String,
    pub notes: String,
    pub sets: Vec<CompletedSet>,
}

/// A finished (or abandoned-and-kept) session, owned by the data service once saved
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SessionRecord {
    pub id: Uuid,
    pub plan_id: String,
    pub plan_name: String,
    #[serde(default)]
    pub plan_notes: String,
    pub date: DateTime<Utc>,
    pub duration_minutes: u32,
    pub calories_burned: u32,
    pub completed_exercises: Vec<CompletedExercise>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_order_matches_play_order() {
        assert!(BlockKind::WarmUp < BlockKind::Training);
        assert!(BlockKind::Training < BlockKind::Stretching);
    }

    #[test]
    fn test_timer_active_phases() {
        assert!(!Phase::Ready.is_timer_active());
        assert!(Phase::Countdown { remaining: 3 }.is_timer_active());
        assert!(Phase::Working(WorkProgress::Reps(RepProgress::first())).is_timer_active());
        assert!(Phase::Resting { remaining: 1 }.is_timer_active());
        assert!(!Phase::ExerciseComplete.is_timer_active());
        assert!(!Phase::Finished.is_timer_active());
    }

    #[test]
    fn test_phase_serializes_with_tag() {
        let json = serde_json::to_value(Phase::Resting { remaining: 12 }).unwrap();
        assert_eq!(json["phase"], "resting");
        assert_eq!(json["remaining"], 12);
    }
}
