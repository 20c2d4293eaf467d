//! Plan documents as they arrive from the plan source.
//!
//! Two shapes exist: user-authored plans with a flat exercise list, and
//! generated plans that are already split into warm-up, training and
//! stretching. Field names follow the JSON the app exchanges, so both
//! deserialize straight from a file or a generator response.

use crate::blocks::{build_sequence, BlockPolicy, WorkoutBlockSequence};
use crate::{Error, Exercise, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

// ============================================================================
// User-authored Plans
// ============================================================================

/// Attached media reference
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Media {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    pub url: String,
}

/// Exercise inside a user-authored plan
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlanExercise {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub sets: i64,
    #[serde(default)]
    pub reps: String,
    /// Seconds
    #[serde(default)]
    pub estimated_time: u32,
    /// Seconds
    #[serde(default)]
    pub rest_time: u32,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub media: Vec<Media>,
    #[serde(default)]
    pub equipment: Option<String>,
}

/// A user-authored plan; blocks are inferred from exercise notes
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserPlan {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub difficulty: Option<String>,
    /// Minutes
    #[serde(default)]
    pub duration: u32,
    #[serde(default)]
    pub calories_burned: u32,
    pub exercises: Vec<PlanExercise>,
}

// ============================================================================
// Generated Plans
// ============================================================================

/// Exercise inside a generated plan
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedExercise {
    pub name: String,
    #[serde(default)]
    pub reps: String,
    #[serde(default)]
    pub sets: i64,
    #[serde(default)]
    pub instructions: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub equipment: Option<String>,
    /// Seconds; generators omit it for the last exercise of a block
    #[serde(default)]
    pub rest_after: Option<u32>,
}

/// A generated plan, pre-bucketed into blocks
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedPlan {
    /// Minutes
    #[serde(default)]
    pub estimated_time: u32,
    #[serde(default)]
    pub estimated_calories: u32,
    #[serde(default)]
    pub total_exercises: u32,
    #[serde(default)]
    pub warm_up: Option<Vec<GeneratedExercise>>,
    #[serde(default)]
    pub training: Vec<GeneratedExercise>,
    #[serde(default)]
    pub stretching: Option<Vec<GeneratedExercise>>,
}

/// Either plan shape. Documents with an `exercises` key are user plans.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum PlanSource {
    User(UserPlan),
    Generated(GeneratedPlan),
}

impl PlanSource {
    /// Load a plan document from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let source = Self::from_json(&contents)?;
        tracing::info!("Loaded {} plan from {:?}", source.origin_label(), path);
        Ok(source)
    }

    /// Parse either shape; anything without `exercises` goes through the
    /// generated-plan gate
    pub fn from_json(text: &str) -> Result<Self> {
        if let Ok(value) = serde_json::from_str::<serde_json::Value>(text) {
            if value.get("exercises").is_some() {
                let plan: UserPlan = serde_json::from_value(value)?;
                return Ok(PlanSource::User(plan));
            }
        }
        let plan = accept_generated_plan(parse_generated_plan(text)?)?;
        Ok(PlanSource::Generated(plan))
    }

    fn origin_label(&self) -> &'static str {
        match self {
            PlanSource::User(_) => "user-authored",
            PlanSource::Generated(_) => "generated",
        }
    }
}

// ============================================================================
// Generative Plan Source
// ============================================================================

/// Producer of plans from a free-text prompt
pub trait PlanGenerator {
    fn generate_plan(&self, prompt: &str) -> Result<GeneratedPlan>;
}

/// Parse a generator's raw text response, tolerating markdown code fences
pub fn parse_generated_plan(text: &str) -> Result<GeneratedPlan> {
    let stripped = text.replace("```json", "").replace("```", "");
    serde_json::from_str(stripped.trim())
        .map_err(|e| Error::InvalidGeneratedPlan(format!("response is not a plan document: {}", e)))
}

/// Gate a generated plan before block assembly
///
/// A plan without training exercises is rejected outright. Set counts are not
/// touched here; the block model floors them with the generated-plan policy.
pub fn accept_generated_plan(plan: GeneratedPlan) -> Result<GeneratedPlan> {
    if plan.training.is_empty() {
        return Err(Error::InvalidGeneratedPlan(
            "plan has no training exercises".into(),
        ));
    }
    Ok(plan)
}

/// Generate, validate and normalize a plan in one step
pub fn generate_sequence(
    generator: &dyn PlanGenerator,
    prompt: &str,
    policy: &BlockPolicy,
) -> Result<WorkoutBlockSequence> {
    let plan = accept_generated_plan(generator.generate_plan(prompt)?)?;
    build_sequence(&PlanSource::Generated(plan), policy)
}

// ============================================================================
// Exercise Guide
// ============================================================================

/// Instruction/image lookup used by the shell for exercises that carry none
pub trait ExerciseGuide {
    fn instructions(&self, exercise_name: &str) -> Result<String>;
    fn image(&self, exercise_name: &str, gender_hint: &str) -> Result<String>;
}

/// Shown when neither the exercise nor the guide has instructions
pub const MISSING_INSTRUCTIONS: &str = "Could not load instructions. Please try again.";

/// Instructions for an exercise: its own text first, then the guide
pub fn describe_exercise(exercise: &Exercise, guide: Option<&dyn ExerciseGuide>) -> String {
    if !exercise.instructions.trim().is_empty() {
        return exercise.instructions.clone();
    }
    match guide.map(|g| g.instructions(&exercise.name)) {
        Some(Ok(text)) if !text.trim().is_empty() => text,
        Some(Err(e)) => {
            tracing::warn!("Instruction lookup failed for {}: {}", exercise.name, e);
            MISSING_INSTRUCTIONS.to_string()
        }
        _ => MISSING_INSTRUCTIONS.to_string(),
    }
}
