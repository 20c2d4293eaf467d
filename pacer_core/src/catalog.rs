//! Built-in catalog of user-authored plans.
//!
//! These are the plans offered by `pacer plans` when no plan file is given.

use crate::blocks::{build_sequence, BlockPolicy};
use crate::plan::{Media, PlanExercise, PlanSource, UserPlan};
use crate::{Error, Result};
use once_cell::sync::Lazy;
use std::collections::HashSet;

/// Ordered set of plans
#[derive(Clone, Debug)]
pub struct PlanCatalog {
    pub plans: Vec<UserPlan>,
}

/// Cached default catalog - built once and reused across all operations
static DEFAULT_CATALOG: Lazy<PlanCatalog> = Lazy::new(build_default_catalog);

/// Get a reference to the cached default catalog
pub fn get_default_catalog() -> &'static PlanCatalog {
    &DEFAULT_CATALOG
}

/// Builds a fresh copy of the default catalog
///
/// Prefer `get_default_catalog()`; this is for tests and custom catalogs.
pub fn build_default_catalog() -> PlanCatalog {
    PlanCatalog {
        plans: vec![
            UserPlan {
                id: "plan_0".into(),
                name: "Full Body Strength".into(),
                notes: "A foundational plan for building overall strength. Focus on compound movements.".into(),
                category: Some("Strength".into()),
                difficulty: Some("Intermediate".into()),
                duration: 50,
                calories_burned: 400,
                exercises: vec![
                    exercise("ex_sq", "Barbell Squats", 4, "10-12 reps", 180, 120,
                        "Keep your chest up and back straight. Go to at least parallel.", "Barbell, Squat Rack"),
                    exercise("ex_bp", "Bench Press", 4, "10-12 reps", 120, 90,
                        "Tuck your elbows slightly. Control the weight down.", "Barbell, Bench"),
                    exercise("ex_dl", "Deadlifts", 3, "10-12 reps", 180, 180,
                        "Keep a neutral spine. Drive with your legs.", "Barbell"),
                    exercise("ex_ohp", "Overhead Press", 4, "10-12 reps", 120, 90,
                        "Brace your core. Don't use leg drive.", "Barbell"),
                    exercise("ex_row", "Bent-Over Rows", 4, "10-15 reps", 120, 75,
                        "Pull the bar to your lower chest.", "Barbell"),
                ],
            },
            UserPlan {
                id: "plan_1".into(),
                name: "Confidence Carnival".into(),
                notes: "Focus on mind-muscle connection. Hit the chest from all angles.".into(),
                category: Some("Strength".into()),
                difficulty: Some("Advanced".into()),
                duration: 35,
                calories_burned: 320,
                exercises: vec![
                    exercise("ex1", "Standing Arm Circles", 3, "30 seconds", 30, 10,
                        "Warm up the shoulders.", "Bodyweight"),
                    exercise("ex2", "Dynamic Chest Stretch", 3, "30 seconds", 30, 10,
                        "Open up the chest.", "Bodyweight"),
                    exercise("ex3", "Dumbbell Bench Press", 4, "10-12 reps", 120, 75,
                        "Focus on the upper chest squeeze.", "15kg Dumbbells"),
                    exercise("ex_fly", "Incline Dumbbell Flys", 3, "12-15 reps", 120, 60,
                        "Focus on a wide stretch and controlled movement.", "10kg Dumbbells"),
                    exercise("ex4", "Push-ups", 4, "To Failure", 60, 60,
                        "Keep your body in a straight line.", "Bodyweight"),
                ],
            },
            UserPlan {
                id: "plan_2".into(),
                name: "Groove & Gains Time".into(),
                notes: "A fun, full-body workout with a focus on core strength.".into(),
                category: Some("Mixed".into()),
                difficulty: Some("Intermediate".into()),
                duration: 40,
                calories_burned: 380,
                exercises: vec![
                    exercise("ex_gs", "Goblet Squats", 4, "10-15 reps", 120, 60,
                        "Keep the kettlebell close to your chest.", "16kg Kettlebell"),
                    exercise("ex5", "Kettlebell Swings", 4, "15 reps", 120, 60,
                        "Use your hips, not your arms.", "16kg Kettlebell"),
                    exercise("ex_rt", "Russian Twists", 3, "15-20 reps", 60, 45,
                        "Keep your feet off the ground for more challenge.", "Bodyweight"),
                    exercise("ex6", "Plank", 3, "60 seconds", 60, 45,
                        "Keep your back flat.", "Bodyweight"),
                ],
            },
            UserPlan {
                id: "plan_3".into(),
                name: "The FUN-ctional Flow".into(),
                notes: "Improve your flexibility and mobility with this relaxing flow.".into(),
                category: Some("Flexibility".into()),
                difficulty: Some("Beginner".into()),
                duration: 20,
                calories_burned: 100,
                exercises: vec![
                    exercise("ex_cc", "Cat-Cow Stretch", 3, "30 seconds", 30, 20,
                        "Flow with your breath.", "Yoga Mat"),
                    exercise("ex7", "Downward Dog", 3, "30 seconds hold", 30, 30,
                        "Press through your palms.", "Yoga Mat"),
                    exercise("ex_cp", "Pigeon Pose", 3, "30 seconds per side", 60, 20,
                        "Keep hips square.", "Yoga Mat"),
                    exercise("ex_ch", "Child's Pose", 3, "60 seconds hold", 60, 30,
                        "Relax and breathe deeply.", "Yoga Mat"),
                ],
            },
        ],
    }
}

#[allow(clippy::too_many_arguments)]
fn exercise(
    id: &str,
    name: &str,
    sets: i64,
    reps: &str,
    estimated_time: u32,
    rest_time: u32,
    notes: &str,
    equipment: &str,
) -> PlanExercise {
    PlanExercise {
        id: id.into(),
        name: name.into(),
        sets,
        reps: reps.into(),
        estimated_time,
        rest_time,
        notes: notes.into(),
        media: vec![Media {
            id: format!("{}_m", id),
            kind: "image".into(),
            url: format!("https://picsum.photos/seed/{}/200/200", id),
        }],
        equipment: Some(equipment.into()),
    }
}

impl PlanCatalog {
    /// Look up a plan by id
    pub fn find(&self, id: &str) -> Result<&UserPlan> {
        self.plans
            .iter()
            .find(|p| p.id == id)
            .ok_or_else(|| Error::PlanNotFound(id.to_string()))
    }

    /// Validate the catalog for consistency and completeness
    ///
    /// Returns a list of validation errors, or empty Vec if valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        let mut seen = HashSet::new();

        for plan in &self.plans {
            if plan.id.is_empty() {
                errors.push("Plan has empty ID".to_string());
            }
            if !seen.insert(plan.id.as_str()) {
                errors.push(format!("Duplicate plan ID '{}'", plan.id));
            }
            if plan.name.is_empty() {
                errors.push(format!("Plan '{}' has empty name", plan.id));
            }

            for ex in &plan.exercises {
                if ex.sets < 1 {
                    errors.push(format!(
                        "Plan '{}': exercise '{}' has {} sets",
                        plan.id, ex.name, ex.sets
                    ));
                }
                if ex.reps.trim().is_empty() {
                    errors.push(format!(
                        "Plan '{}': exercise '{}' has no reps text",
                        plan.id, ex.name
                    ));
                }
            }

            match build_sequence(&PlanSource::User(plan.clone()), &BlockPolicy::default()) {
                Ok(sequence) if !sequence.repairs().is_empty() => errors.push(format!(
                    "Plan '{}' needs {} repairs",
                    plan.id,
                    sequence.repairs().len()
                )),
                Ok(_) => {}
                Err(e) => errors.push(format!("Plan '{}': {}", plan.id, e)),
            }
        }

        errors
    }

    /// Like `validate`, as a `Result`
    pub fn ensure_valid(&self) -> Result<()> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(Error::CatalogValidation(errors.join("; ")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BlockKind, RepSpec};

    #[test]
    fn test_catalog_loads() {
        let catalog = get_default_catalog();
        assert_eq!(catalog.plans.len(), 4);
        assert_eq!(catalog.plans[0].name, "Full Body Strength");
    }

    #[test]
    fn test_default_catalog_validates() {
        let catalog = build_default_catalog();
        let errors = catalog.validate();
        assert!(
            errors.is_empty(),
            "Default catalog has validation errors: {:?}",
            errors
        );
        assert!(catalog.ensure_valid().is_ok());
    }

    #[test]
    fn test_find_plan() {
        let catalog = get_default_catalog();
        assert_eq!(catalog.find("plan_3").unwrap().name, "The FUN-ctional Flow");
        assert!(matches!(
            catalog.find("plan_9"),
            Err(Error::PlanNotFound(ref id)) if id == "plan_9"
        ));
    }

    #[test]
    fn test_warm_up_exercise_moves_first() {
        let plan = get_default_catalog().find("plan_1").unwrap().clone();
        let sequence = build_sequence(&PlanSource::User(plan), &BlockPolicy::default()).unwrap();

        let first = &sequence.exercises()[0];
        assert_eq!(first.name, "Standing Arm Circles");
        assert_eq!(first.block, BlockKind::WarmUp);

        let push_ups = sequence
            .exercises()
            .iter()
            .find(|e| e.name == "Push-ups")
            .unwrap();
        assert_eq!(push_ups.rep_spec, RepSpec::Duration { seconds: 60 });
    }

    #[test]
    fn test_validate_reports_broken_plan() {
        let mut catalog = build_default_catalog();
        catalog.plans[0].exercises[0].sets = 0;
        catalog.plans.push(catalog.plans[1].clone());

        let errors = catalog.validate();
        assert!(errors.iter().any(|e| e.contains("Duplicate plan ID 'plan_1'")));
        assert!(errors.iter().any(|e| e.contains("has 0 sets")));
    }
}
