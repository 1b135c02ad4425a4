//! Core domain types for the Trainer system.
//!
//! This module defines the fundamental types used throughout the system:
//! - Exercises and the timed plans that slot them into a workout
//! - The ordered exercise list shared by the builder and the runner
//! - Workout definitions
//! - Session log entries and runner events

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Reserved exercise name marking a rest interval
pub const REST_EXERCISE_NAME: &str = "rest";

/// Returns true if `name` can be used as a storage key (ASCII alphanumeric, no spaces)
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Render a number of seconds as `hh:mm:ss`
pub fn format_seconds(total: u64) -> String {
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}

// ============================================================================
// Exercise Types
// ============================================================================

/// A catalog exercise (e.g., "Jumping Jacks")
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Exercise {
    pub name: String,
    pub title: String,
    pub description: String,
    pub image: String,
    #[serde(default)]
    pub name_sound: Option<String>,
    #[serde(default)]
    pub videos: Vec<String>,
    #[serde(default)]
    pub procedure: Vec<String>,
}

impl Exercise {
    pub fn new(
        name: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
        image: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            title: title.into(),
            description: description.into(),
            image: image.into(),
            name_sound: None,
            videos: vec![],
            procedure: vec![],
        }
    }

    /// The rest sentinel exercise
    pub fn rest() -> Self {
        Self::new(REST_EXERCISE_NAME, "Relax!", "Relax a bit!", "rest.png")
    }

    pub fn is_rest(&self) -> bool {
        self.name == REST_EXERCISE_NAME
    }
}

/// One timed slot in a workout
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExercisePlan {
    pub exercise: Exercise,
    /// Whole seconds, always > 0
    pub duration: u32,
}

impl ExercisePlan {
    pub fn new(exercise: Exercise, duration: u32) -> Result<Self> {
        if duration == 0 {
            return Err(Error::Validation(vec![format!(
                "Exercise '{}' must have a duration greater than zero",
                exercise.name
            )]));
        }
        Ok(Self { exercise, duration })
    }

    /// A rest slot of the given length
    pub fn rest(duration: u32) -> Result<Self> {
        Self::new(Exercise::rest(), duration)
    }

    /// An empty row as a form would seed it before the user picks an exercise
    pub fn placeholder() -> Self {
        Self {
            exercise: Exercise::default(),
            duration: 30,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.exercise.name.is_empty()
    }

    pub fn is_rest(&self) -> bool {
        self.exercise.is_rest()
    }

    /// Name of the underlying exercise
    pub fn name(&self) -> &str {
        &self.exercise.name
    }
}

// ============================================================================
// Ordered Exercise List
// ============================================================================

/// Ordered sequence of exercise plans; position is execution order.
///
/// Every mutation keeps indices a contiguous `0..len` range.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct ExerciseList(Vec<ExercisePlan>);

impl ExerciseList {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ExercisePlan> {
        self.0.get(index)
    }

    pub fn first(&self) -> Option<&ExercisePlan> {
        self.0.first()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ExercisePlan> {
        self.0.iter()
    }

    pub fn push(&mut self, plan: ExercisePlan) {
        self.0.push(plan);
    }

    pub fn remove(&mut self, index: usize) -> Option<ExercisePlan> {
        if index < self.0.len() {
            Some(self.0.remove(index))
        } else {
            None
        }
    }

    /// Index of the first plan structurally equal to `plan`
    pub fn position(&self, plan: &ExercisePlan) -> Option<usize> {
        self.0.iter().position(|p| p == plan)
    }

    /// Index of the first plan wrapping an exercise called `name`
    pub fn position_by_name(&self, name: &str) -> Option<usize> {
        self.0.iter().position(|p| p.exercise.name == name)
    }

    /// Remove the first plan wrapping an exercise called `name`
    pub fn remove_by_name(&mut self, name: &str) -> Option<ExercisePlan> {
        let index = self.position_by_name(name)?;
        Some(self.0.remove(index))
    }

    /// Relocate the element at `from` to `to`, shifting the elements in between.
    ///
    /// Returns false (and leaves the list untouched) if either index is out of range.
    pub fn move_to(&mut self, from: usize, to: usize) -> bool {
        let len = self.0.len();
        if from >= len || to >= len {
            return false;
        }
        if from != to {
            let plan = self.0.remove(from);
            self.0.insert(to, plan);
        }
        true
    }

    /// Sum of all plan durations in seconds
    pub fn total_duration(&self) -> u64 {
        self.0.iter().map(|p| u64::from(p.duration)).sum()
    }

    pub fn contains_rest(&self) -> bool {
        self.0.iter().any(ExercisePlan::is_rest)
    }
}

impl From<Vec<ExercisePlan>> for ExerciseList {
    fn from(plans: Vec<ExercisePlan>) -> Self {
        Self(plans)
    }
}

impl FromIterator<ExercisePlan> for ExerciseList {
    fn from_iter<I: IntoIterator<Item = ExercisePlan>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a ExerciseList {
    type Item = &'a ExercisePlan;
    type IntoIter = std::slice::Iter<'a, ExercisePlan>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

// ============================================================================
// Workout Definition
// ============================================================================

/// A complete workout definition
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkoutPlan {
    pub name: String,
    pub title: String,
    pub rest_between_exercise: u32,
    pub exercises: ExerciseList,
    #[serde(default)]
    pub description: Option<String>,
}

impl WorkoutPlan {
    pub fn new(
        name: impl Into<String>,
        title: impl Into<String>,
        rest_between_exercise: u32,
        exercises: impl Into<ExerciseList>,
    ) -> Self {
        Self {
            name: name.into(),
            title: title.into(),
            rest_between_exercise,
            exercises: exercises.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Total running time of the workout in seconds
    pub fn total_duration(&self) -> u64 {
        self.exercises.total_duration()
    }

    /// Validate the workout for consistency before it is saved or run
    ///
    /// Returns a list of validation errors, or empty Vec if valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if !is_valid_name(&self.name) {
            errors.push(format!(
                "Workout name '{}' must be non-empty and alphanumeric",
                self.name
            ));
        }
        if self.title.trim().is_empty() {
            errors.push(format!("Workout '{}' has empty title", self.name));
        }
        if self.exercises.is_empty() {
            errors.push(format!("Workout '{}' has no exercises", self.name));
        }

        for (index, plan) in self.exercises.iter().enumerate() {
            if plan.is_placeholder() {
                errors.push(format!("Exercise #{} has no exercise selected", index + 1));
            }
            if plan.duration == 0 {
                errors.push(format!(
                    "Exercise #{} ('{}') has zero duration",
                    index + 1,
                    plan.exercise.name
                ));
            }
        }

        errors
    }

    /// Non-fatal oddities worth reporting, such as back-to-back rest slots
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        let mut previous_rest = false;
        for (index, plan) in self.exercises.iter().enumerate() {
            if plan.is_rest() && previous_rest {
                warnings.push(format!(
                    "Exercise #{} is a rest directly after another rest",
                    index + 1
                ));
            }
            previous_rest = plan.is_rest();
        }
        warnings
    }
}

// ============================================================================
// Session Log Types
// ============================================================================

/// Log data for one workout execution
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct WorkoutLogEntry {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub started_on: DateTime<Utc>,
    #[serde(default)]
    pub ended_on: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub exercises_done: u32,
    #[serde(default)]
    pub last_exercise: Option<String>,
}

impl WorkoutLogEntry {
    pub fn new(started_on: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            started_on,
            ended_on: None,
            completed: false,
            exercises_done: 0,
            last_exercise: None,
        }
    }

    /// True while the session has not been closed
    pub fn is_open(&self) -> bool {
        self.ended_on.is_none()
    }
}

// ============================================================================
// Runner Events
// ============================================================================

/// Emitted once per tick for the plan currently running
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExerciseProgressEvent {
    pub exercise: ExercisePlan,
    pub running_for: u32,
    pub time_remaining: u32,
}

/// Emitted when one plan ends and the next begins
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExerciseChangedEvent {
    pub previous: ExercisePlan,
    pub next: ExercisePlan,
    /// The plan that follows `next`, if any
    pub upcoming: Option<ExercisePlan>,
}
