//! Exercise block model.
//!
//! Normalizes either plan shape into one ordered sequence of block-tagged
//! exercises: warm-up, then training, then stretching, each block keeping
//! plan order. Malformed exercises are repaired (never rejected) and the
//! repairs are kept on the sequence.

use crate::plan::{GeneratedExercise, GeneratedPlan, PlanExercise, PlanSource, UserPlan};
use crate::{
    BlockKind, Error, Exercise, ExerciseRepair, PlanInfo, PlanOrigin, RepSpec, RepairKind, Result,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Label used when a plan names no equipment
const DEFAULT_EQUIPMENT: &str = "Bodyweight";

/// Upper bound on sets per exercise; larger counts are capped
pub const MAX_SETS: u32 = 20;

/// Defaulting policy for malformed plan data
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct BlockPolicy {
    /// Set floor for generated plans; user-authored plans floor to 1
    pub min_generated_sets: u32,
    /// Rest used when an exercise has none
    pub default_rest_seconds: u32,
}

impl Default for BlockPolicy {
    fn default() -> Self {
        Self {
            min_generated_sets: 3,
            default_rest_seconds: 30,
        }
    }
}

/// Ordered, immutable, non-empty exercise sequence for one session
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct WorkoutBlockSequence {
    plan: PlanInfo,
    exercises: Vec<Exercise>,
    repairs: Vec<ExerciseRepair>,
}

impl WorkoutBlockSequence {
    pub fn plan(&self) -> &PlanInfo {
        &self.plan
    }

    pub fn exercises(&self) -> &[Exercise] {
        &self.exercises
    }

    pub fn get(&self, index: usize) -> Option<&Exercise> {
        self.exercises.get(index)
    }

    pub fn len(&self) -> usize {
        self.exercises.len()
    }

    /// Always false for a constructed sequence
    pub fn is_empty(&self) -> bool {
        self.exercises.is_empty()
    }

    pub fn last_index(&self) -> usize {
        self.exercises.len().saturating_sub(1)
    }

    pub fn repairs(&self) -> &[ExerciseRepair] {
        &self.repairs
    }

    /// Exercises belonging to one block, in play order
    pub fn block(&self, kind: BlockKind) -> impl Iterator<Item = &Exercise> {
        self.exercises.iter().filter(move |e| e.block == kind)
    }
}

/// Build the session sequence from a plan document
///
/// Returns `Error::EmptyPlan` if no exercise survives block assembly.
pub fn build_sequence(source: &PlanSource, policy: &BlockPolicy) -> Result<WorkoutBlockSequence> {
    let mut builder = SequenceBuilder::default();

    let plan = match source {
        PlanSource::User(plan) => {
            for kind in [BlockKind::WarmUp, BlockKind::Training, BlockKind::Stretching] {
                for ex in plan.exercises.iter().filter(|e| bucket_for_notes(&e.notes) == kind) {
                    builder.push_user(ex, kind, policy);
                }
            }
            user_plan_info(plan)
        }
        PlanSource::Generated(plan) => {
            let blocks = [
                (BlockKind::WarmUp, plan.warm_up.as_deref().unwrap_or_default()),
                (BlockKind::Training, plan.training.as_slice()),
                (BlockKind::Stretching, plan.stretching.as_deref().unwrap_or_default()),
            ];
            for (kind, exercises) in blocks {
                for ex in exercises {
                    builder.push_generated(ex, kind, policy);
                }
            }
            generated_plan_info(plan)
        }
    };

    if builder.exercises.is_empty() {
        tracing::warn!("Plan {:?} has no exercises after block assembly", plan.plan_name);
        return Err(Error::EmptyPlan);
    }

    tracing::info!(
        "Built sequence for {:?}: {} exercises, {} repairs",
        plan.plan_name,
        builder.exercises.len(),
        builder.repairs.len()
    );

    Ok(WorkoutBlockSequence {
        plan,
        exercises: builder.exercises,
        repairs: builder.repairs,
    })
}

/// Legacy flat-plan bucketing; "warm up" wins over "stretch"
pub fn bucket_for_notes(notes: &str) -> BlockKind {
    let notes = notes.to_lowercase();
    if notes.contains("warm up") {
        BlockKind::WarmUp
    } else if notes.contains("stretch") {
        BlockKind::Stretching
    } else {
        BlockKind::Training
    }
}

/// Classify reps text: rep-based iff it mentions "rep" (any case)
///
/// Returns the rep spec and whether a rep count had to be defaulted.
/// Time-based text without a number uses `fallback_seconds`.
pub fn classify_reps(text: &str, fallback_seconds: u32) -> (RepSpec, bool) {
    let number = first_integer(text);
    if text.to_lowercase().contains("rep") {
        match number {
            Some(count) => (RepSpec::Reps { count }, false),
            None => (RepSpec::Reps { count: 0 }, true),
        }
    } else {
        (
            RepSpec::Duration {
                seconds: number.unwrap_or(fallback_seconds),
            },
            false,
        )
    }
}

/// First run of ASCII digits in `text`
fn first_integer(text: &str) -> Option<u32> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let digits: String = text[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

#[derive(Default)]
struct SequenceBuilder {
    exercises: Vec<Exercise>,
    repairs: Vec<ExerciseRepair>,
}

impl SequenceBuilder {
    fn push_user(&mut self, ex: &PlanExercise, block: BlockKind, policy: &BlockPolicy) {
        let sets_total = self.floor_sets(&ex.name, ex.sets, 1);
        let rep_spec = self.rep_spec(&ex.name, &ex.reps, ex.estimated_time);
        let image_ref = ex
            .media
            .first()
            .map(|m| m.url.clone())
            .filter(|url| !url.is_empty());

        self.exercises.push(Exercise {
            name: ex.name.clone(),
            block,
            sets_total,
            rep_spec,
            rest_after_seconds: rest_or_default(Some(ex.rest_time), policy),
            equipment_label: equipment_or_default(ex.equipment.as_deref()),
            instructions: ex.notes.clone(),
            image_ref,
            reps_label: ex.reps.clone(),
        });
    }

    fn push_generated(&mut self, ex: &GeneratedExercise, block: BlockKind, policy: &BlockPolicy) {
        let sets_total = self.floor_sets(&ex.name, ex.sets, policy.min_generated_sets.max(1));
        let rep_spec = self.rep_spec(&ex.name, &ex.reps, 0);

        self.exercises.push(Exercise {
            name: ex.name.clone(),
            block,
            sets_total,
            rep_spec,
            rest_after_seconds: rest_or_default(ex.rest_after, policy),
            equipment_label: equipment_or_default(ex.equipment.as_deref()),
            instructions: ex.instructions.clone(),
            image_ref: Some(ex.image_url.clone()).filter(|url| !url.is_empty()),
            reps_label: ex.reps.clone(),
        });
    }

    fn floor_sets(&mut self, name: &str, sets: i64, floor: u32) -> u32 {
        let floor = floor.min(MAX_SETS);
        if sets < i64::from(floor) {
            tracing::warn!("Exercise {:?} has {} sets, raising to {}", name, sets, floor);
            self.repair(name, RepairKind::SetsFloored { from: sets, to: floor });
            return floor;
        }
        if sets > i64::from(MAX_SETS) {
            tracing::warn!("Exercise {:?} has {} sets, capping at {}", name, sets, MAX_SETS);
            self.repair(name, RepairKind::SetsCapped { from: sets, to: MAX_SETS });
            return MAX_SETS;
        }
        u32::try_from(sets).unwrap_or(MAX_SETS)
    }

    fn rep_spec(&mut self, name: &str, reps: &str, fallback_seconds: u32) -> RepSpec {
        let (spec, defaulted) = classify_reps(reps, fallback_seconds);
        if defaulted {
            tracing::warn!("Exercise {:?} has no rep count in {:?}, using 0", name, reps);
            self.repair(name, RepairKind::RepsUnparseable { text: reps.into() });
        }
        spec
    }

    fn repair(&mut self, name: &str, kind: RepairKind) {
        self.repairs.push(ExerciseRepair {
            index: self.exercises.len(),
            name: name.into(),
            kind,
        });
    }
}

fn rest_or_default(rest: Option<u32>, policy: &BlockPolicy) -> u32 {
    rest.filter(|r| *r > 0).unwrap_or(policy.default_rest_seconds)
}

fn equipment_or_default(equipment: Option<&str>) -> String {
    equipment
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .unwrap_or(DEFAULT_EQUIPMENT)
        .to_string()
}

fn user_plan_info(plan: &UserPlan) -> PlanInfo {
    PlanInfo {
        plan_id: plan.id.clone(),
        plan_name: plan.name.clone(),
        plan_notes: plan.notes.clone(),
        origin: PlanOrigin::UserAuthored,
        estimated_minutes: plan.duration,
        estimated_calories: plan.calories_burned,
    }
}

fn generated_plan_info(plan: &GeneratedPlan) -> PlanInfo {
    PlanInfo {
        plan_id: format!("ai_{}", Utc::now().timestamp_millis()),
        plan_name: "AI Daily Workout".into(),
        plan_notes: "AI Generated Daily Workout".into(),
        origin: PlanOrigin::Generated,
        estimated_minutes: plan.estimated_time,
        estimated_calories: plan.estimated_calories,
    }
}
