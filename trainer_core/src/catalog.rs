//! Default catalog of exercises and workouts.
//!
//! This module provides the built-in "7 Minute Workout" exercises, the rest
//! sentinel and a default workout built from them. The repository seeds its
//! collections from here on first use.

use crate::types::*;
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Name of the built-in workout
pub const DEFAULT_WORKOUT_NAME: &str = "7MinWorkout";

/// Exercises and workouts keyed by name
#[derive(Clone, Debug)]
pub struct Catalog {
    pub exercises: HashMap<String, Exercise>,
    pub workouts: HashMap<String, WorkoutPlan>,
}

/// Cached default catalog - built once and reused across all operations
static DEFAULT_CATALOG: Lazy<Catalog> = Lazy::new(build_default_catalog);

/// Get a reference to the cached default catalog
pub fn get_default_catalog() -> &'static Catalog {
    &DEFAULT_CATALOG
}

fn exercise(
    name: &str,
    title: &str,
    description: &str,
    image: &str,
    videos: &[&str],
    procedure: &[&str],
) -> Exercise {
    Exercise {
        name: name.into(),
        title: title.into(),
        description: description.into(),
        image: image.into(),
        name_sound: Some(format!("audio/{}.wav", name.to_lowercase())),
        videos: videos.iter().map(|v| v.to_string()).collect(),
        procedure: procedure.iter().map(|s| s.to_string()).collect(),
    }
}

/// Builds the default catalog
///
/// **Note**: prefer `get_default_catalog()`, which returns a cached reference.
pub fn build_default_catalog() -> Catalog {
    let list = vec![
        exercise(
            "jumpingJacks",
            "Jumping Jacks",
            "A jumping jack is a physical jumping exercise performed by jumping to a position with the legs spread wide.",
            "JumpingJacks.png",
            &["dmYwZH_BNd0", "BABOdJ-2Z6o", "c4DAnQ6DtF8"],
            &[
                "Assume an erect position, with feet together and arms at your side.",
                "Slightly bend your knees, and propel yourself a few inches into the air.",
                "While in air, bring your legs out to the side about shoulder width or slightly wider.",
                "As you are moving your legs outward, you should raise your arms up over your head.",
                "You should land with your feet wide and your hands over your head.",
                "Repeat this cycle as fast as you can.",
            ],
        ),
        exercise(
            "wallSit",
            "Wall Sit",
            "A wall sit is an isometric exercise that strengthens the quadriceps.",
            "wallsit.png",
            &["y-wV4Venusw", "MMV3v4ap4ro"],
            &[
                "Place your back against a wall with your feet shoulder width apart.",
                "Slide your back down until your knees are at a 90 degree angle.",
                "Hold the position, keeping your back flat against the wall.",
            ],
        ),
        exercise(
            "pushUp",
            "Push Up",
            "A push-up raises and lowers the body using the arms.",
            "pushup.png",
            &["Eh00_rniF8E", "ZWdBqFLNljc", "UwRLWMcOdwI"],
            &[
                "Lie prone on the ground with hands placed as wide or slightly wider than shoulder width.",
                "Keeping the body straight, lower body to the ground by bending arms at the elbows.",
                "Raise body up off the ground by extending the arms.",
            ],
        ),
        exercise(
            "crunches",
            "Abdominal Crunches",
            "The basic crunch is an abdominal exercise in a strength-training program.",
            "crunches.png",
            &["Xyd_fa5zoEU", "MKmrqcoCZ-M"],
            &[
                "Lie on your back with your knees bent and feet flat on the floor.",
                "Place your hands behind your head with elbows pointing out.",
                "Curl your shoulders towards your pelvis, then lower back down.",
            ],
        ),
        exercise(
            "stepUpOntoChair",
            "Step Up Onto Chair",
            "Step exercises are ideal for building muscle in your lower body.",
            "stepUpOntoChair.jpeg",
            &["aajhW7DD1EA"],
            &[
                "Position your chair in front of you.",
                "Step onto the seat with one foot, then bring the other up.",
                "Step back down one foot at a time and alternate the leading leg.",
            ],
        ),
        exercise(
            "squat",
            "Squat",
            "The squat is a compound, full body exercise that trains primarily the muscles of the thighs, hips, buttocks and quads.",
            "squat.png",
            &["QKKZ9AGYTi4", "UXJrBgI2RxA"],
            &[
                "Stand with your head facing forward and your chest held up and out.",
                "Place your feet shoulder-width apart or little wider.",
                "Sit back and down like you're sitting into a chair.",
                "Lower down so your thighs are as parallel to the floor as possible.",
                "Keep your body tight, and push through your heels to bring yourself back to the starting position.",
            ],
        ),
        exercise(
            "tricepdips",
            "Tricep Dips On Chair",
            "A body weight exercise for building arms.",
            "tricepdips.jpg",
            &["tKjcgfu44sI", "jox1rb5krQI"],
            &[
                "Sit on the edge of a chair with hands next to your hips.",
                "Slide your hips off the chair and lower your body by bending the elbows.",
                "Push back up until your arms are straight.",
            ],
        ),
        exercise(
            "plank",
            "Plank",
            "The plank is an isometric core strength exercise.",
            "Plank.png",
            &["pSHjTRCQxIw", "TvxNkmjdhMM"],
            &[
                "Get into pushup position on the floor.",
                "Bend your elbows 90 degrees and rest your weight on your forearms.",
                "Keep your body in a straight line from head to feet and hold.",
            ],
        ),
        exercise(
            "highKnees",
            "High Knees",
            "A form of running in place where the knees are lifted high.",
            "highknees.png",
            &["OAJ_J3EZkdY", "8opcQdC-V-U"],
            &[
                "Start standing with feet hip-width apart.",
                "Drive one knee up towards the chest, then quickly switch legs.",
                "Keep a fast pace, pumping the arms.",
            ],
        ),
        exercise(
            "lunges",
            "Lunges",
            "Lunges are a good exercise for strengthening, sculpting and building several muscles of the lower body.",
            "lunges.png",
            &["Z2n58m2i4jg"],
            &[
                "Stand erect with your feet about one shoulder width apart.",
                "Step forward with one leg and lower your hips until both knees are bent at about 90 degrees.",
                "Push back up to the starting position and alternate legs.",
            ],
        ),
        exercise(
            "pushupNRotate",
            "Push Up And Rotate",
            "A variation of the push-up that adds a rotation into a side plank.",
            "pushupNRotate.jpg",
            &["qHQ_E-f5278"],
            &[
                "Assume the classic pushup position.",
                "As you come up, rotate your body so your right arm lifts up and extends overhead.",
                "Return to the starting position, lower yourself, then push up and rotate to the left.",
            ],
        ),
        exercise(
            "sidePlank",
            "Side Plank",
            "A variation of the plank that targets the obliques.",
            "sideplank.png",
            &["wqzrb67Dwf8", "_rdfjFSFKMY"],
            &[
                "Lie on your side with your legs straight.",
                "Prop yourself up on your forearm, lifting your hips off the ground.",
                "Hold, keeping your body in a straight line, then switch sides.",
            ],
        ),
        Exercise::rest(),
    ];

    let rest = |secs: u32| ExercisePlan {
        exercise: Exercise::rest(),
        duration: secs,
    };

    let mut plans = Vec::new();
    let sequence: Vec<&Exercise> = list.iter().filter(|e| !e.is_rest()).collect();
    for (index, ex) in sequence.iter().enumerate() {
        if index > 0 {
            plans.push(rest(10));
        }
        plans.push(ExercisePlan {
            exercise: (*ex).clone(),
            duration: 30,
        });
    }

    let seven_minute = WorkoutPlan::new(DEFAULT_WORKOUT_NAME, "7 Minute Workout", 10, plans)
        .with_description("A high intensity workout that consists of 12 exercises.");

    let exercises = list.into_iter().map(|e| (e.name.clone(), e)).collect();
    let mut workouts = HashMap::new();
    workouts.insert(seven_minute.name.clone(), seven_minute);

    Catalog {
        exercises,
        workouts,
    }
}

impl Catalog {
    /// Validate the catalog for consistency and completeness
    ///
    /// Returns a list of validation errors, or empty Vec if valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        for (key, exercise) in &self.exercises {
            if key != &exercise.name {
                errors.push(format!(
                    "Exercise key '{}' doesn't match exercise.name '{}'",
                    key, exercise.name
                ));
            }
            if !is_valid_name(&exercise.name) {
                errors.push(format!("Exercise name '{}' is not alphanumeric", exercise.name));
            }
            if exercise.title.is_empty() {
                errors.push(format!("Exercise '{}' has empty title", key));
            }
        }

        if !self.exercises.contains_key(REST_EXERCISE_NAME) {
            errors.push("Catalog has no rest exercise".to_string());
        }

        for (key, workout) in &self.workouts {
            if key != &workout.name {
                errors.push(format!(
                    "Workout key '{}' doesn't match workout.name '{}'",
                    key, workout.name
                ));
            }
            errors.extend(workout.validate());

            // Check that all referenced exercises exist
            for plan in &workout.exercises {
                if !self.exercises.contains_key(&plan.exercise.name) {
                    errors.push(format!(
                        "Workout '{}' references non-existent exercise '{}'",
                        key, plan.exercise.name
                    ));
                }
            }
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_loads() {
        let catalog = build_default_catalog();
        assert_eq!(catalog.exercises.len(), 13);
        assert_eq!(catalog.workouts.len(), 1);
    }

    #[test]
    fn test_default_workout_alternates_rest() {
        let catalog = get_default_catalog();
        let workout = &catalog.workouts[DEFAULT_WORKOUT_NAME];

        assert_eq!(workout.exercises.len(), 23);
        assert!(!workout.exercises.first().unwrap().is_rest());
        assert!(!workout.exercises.get(22).unwrap().is_rest());
        for (index, plan) in workout.exercises.iter().enumerate() {
            assert_eq!(plan.is_rest(), index % 2 == 1);
        }
        assert_eq!(workout.total_duration(), 12 * 30 + 11 * 10);
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
    }
}
