//! Workout authoring.
//!
//! The builder holds the one workout being edited, applies list edits to it,
//! and remembers whether it is new so `save` picks create or update.

use crate::{Error, ExercisePlan, Result, WorkoutPlan, WorkoutRepository};

/// Default rest interval for a freshly created workout
pub const DEFAULT_REST_BETWEEN_EXERCISE: u32 = 30;

/// Which repository operation `save` performed
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SaveOutcome {
    Created,
    Updated,
}

/// Edits one workout at a time on top of a repository
#[derive(Debug)]
pub struct WorkoutBuilder<R: WorkoutRepository> {
    repository: R,
    building: Option<WorkoutPlan>,
    new_workout: bool,
    first_exercise: bool,
}

impl<R: WorkoutRepository> WorkoutBuilder<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository,
            building: None,
            new_workout: false,
            first_exercise: true,
        }
    }

    /// Start editing a workout.
    ///
    /// With no name (or an empty one) a blank workout is created and marked
    /// new; otherwise the named workout is fetched. Fetch failures, including
    /// `NotFound`, are returned as-is and leave the builder unchanged.
    pub fn start_building(&mut self, name: Option<&str>) -> Result<&WorkoutPlan> {
        let (workout, new_workout) = match name.filter(|n| !n.is_empty()) {
            Some(name) => (self.repository.workout(name)?, false),
            None => (
                WorkoutPlan::new("", "", DEFAULT_REST_BETWEEN_EXERCISE, vec![]),
                true,
            ),
        };

        tracing::debug!(
            "Building workout '{}' (new: {})",
            workout.name,
            new_workout
        );
        self.new_workout = new_workout;
        Ok(self.building.insert(workout))
    }

    /// The workout being edited
    pub fn workout(&self) -> Option<&WorkoutPlan> {
        self.building.as_ref()
    }

    /// Mutable access for editing the workout's own fields (name, title, ...)
    pub fn workout_mut(&mut self) -> Option<&mut WorkoutPlan> {
        self.building.as_mut()
    }

    pub fn is_new(&self) -> bool {
        self.new_workout
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// Append `plan` to the end of the workout.
    ///
    /// The first addition to a new workout drops a lone placeholder row left
    /// at the head of the list.
    pub fn add_exercise(&mut self, plan: ExercisePlan) {
        let Some(workout) = self.building.as_mut() else {
            return;
        };

        if self.new_workout && self.first_exercise {
            if workout.exercises.len() == 1
                && workout.exercises.first().is_some_and(ExercisePlan::is_placeholder)
            {
                workout.exercises.remove(0);
                tracing::debug!("Dropped placeholder row from new workout");
            }
            self.first_exercise = false;
        }

        tracing::debug!("Adding '{}' ({}s)", plan.exercise.name, plan.duration);
        workout.exercises.push(plan);
    }

    /// Remove the first entry whose exercise has the same name as `plan`'s.
    ///
    /// Returns false if nothing matched.
    pub fn remove_exercise(&mut self, plan: &ExercisePlan) -> bool {
        let Some(workout) = self.building.as_mut() else {
            return false;
        };
        let removed = workout.exercises.remove_by_name(&plan.exercise.name).is_some();
        if removed {
            tracing::debug!("Removed '{}'", plan.exercise.name);
        }
        removed
    }

    /// Move `plan` to `to_index`, shifting the entries in between.
    ///
    /// Returns false (no change) if `to_index` is out of range or the plan
    /// is not in the list.
    pub fn move_exercise_to(&mut self, plan: &ExercisePlan, to_index: usize) -> bool {
        let Some(workout) = self.building.as_mut() else {
            return false;
        };
        if to_index >= workout.exercises.len() {
            return false;
        }
        let Some(from) = workout.exercises.position(plan) else {
            return false;
        };
        workout.exercises.move_to(from, to_index)
    }

    /// Persist the workout: create if new, update otherwise.
    ///
    /// Once a create succeeds, later saves from this builder are updates.
    pub fn save(&mut self) -> Result<SaveOutcome> {
        let workout = self
            .building
            .as_ref()
            .ok_or_else(|| Error::InvalidState("no workout is being built".into()))?;

        let errors = workout.validate();
        if !errors.is_empty() {
            return Err(Error::Validation(errors));
        }
        for warning in workout.warnings() {
            tracing::warn!("Workout '{}': {}", workout.name, warning);
        }

        let outcome = if self.new_workout {
            self.repository.add_workout(workout)?;
            SaveOutcome::Created
        } else {
            self.repository.update_workout(workout)?;
            SaveOutcome::Updated
        };

        self.new_workout = false;
        tracing::info!("Saved workout '{}' ({:?})", workout.name, outcome);
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Exercise, MemoryStore, StoreRepository, DEFAULT_WORKOUT_NAME};

    fn builder() -> WorkoutBuilder<StoreRepository<MemoryStore>> {
        WorkoutBuilder::new(StoreRepository::open(MemoryStore::new()).unwrap())
    }

    fn plan(name: &str, duration: u32) -> ExercisePlan {
        ExercisePlan::new(Exercise::new(name, name, "", ""), duration).unwrap()
    }

    fn names<R: WorkoutRepository>(builder: &WorkoutBuilder<R>) -> Vec<String> {
        builder
            .workout()
            .unwrap()
            .exercises
            .iter()
            .map(|p| p.exercise.name.clone())
            .collect()
    }

    #[test]
    fn test_start_new_workout() {
        let mut builder = builder();
        let workout = builder.start_building(None).unwrap();

        assert!(workout.exercises.is_empty());
        assert_eq!(workout.rest_between_exercise, DEFAULT_REST_BETWEEN_EXERCISE);
        assert!(builder.is_new());

        builder.add_exercise(plan("squat", 30));
        assert_eq!(names(&builder), vec!["squat"]);
    }

    #[test]
    fn test_empty_name_means_new() {
        let mut builder = builder();
        builder.start_building(Some("")).unwrap();
        assert!(builder.is_new());
    }

    #[test]
    fn test_start_existing_workout() {
        let mut builder = builder();
        let workout = builder.start_building(Some(DEFAULT_WORKOUT_NAME)).unwrap();

        assert_eq!(workout.exercises.len(), 23);
        assert!(!builder.is_new());
    }

    #[test]
    fn test_start_missing_workout_propagates_not_found() {
        let mut builder = builder();
        let err = builder.start_building(Some("missing")).unwrap_err();
        assert!(err.is_not_found());
        assert!(builder.workout().is_none());
    }

    #[test]
    fn test_first_add_drops_placeholder_once() {
        let mut builder = builder();
        builder.start_building(None).unwrap();
        builder
            .workout_mut()
            .unwrap()
            .exercises
            .push(ExercisePlan::placeholder());

        builder.add_exercise(plan("squat", 30));
        assert_eq!(names(&builder), vec!["squat"]);

        // The rule has fired; a later placeholder is left alone
        builder
            .workout_mut()
            .unwrap()
            .exercises
            .push(ExercisePlan::placeholder());
        builder.add_exercise(plan("plank", 30));
        assert_eq!(names(&builder), vec!["squat", "", "plank"]);
    }

    #[test]
    fn test_existing_workout_keeps_first_row() {
        let mut builder = builder();
        builder.start_building(Some(DEFAULT_WORKOUT_NAME)).unwrap();
        builder.add_exercise(plan("squat", 30));

        let names = names(&builder);
        assert_eq!(names.len(), 24);
        assert_eq!(names[0], "jumpingJacks");
        assert_eq!(names[23], "squat");
    }

    #[test]
    fn test_remove_matches_by_exercise_name() {
        let mut builder = builder();
        builder.start_building(None).unwrap();
        builder.add_exercise(plan("a", 30));
        builder.add_exercise(plan("b", 30));
        builder.add_exercise(plan("c", 30));

        // Different duration, same exercise name
        assert!(builder.remove_exercise(&plan("b", 99)));
        assert_eq!(names(&builder), vec!["a", "c"]);

        assert!(!builder.remove_exercise(&plan("zzz", 30)));
        assert_eq!(names(&builder), vec!["a", "c"]);
    }

    #[test]
    fn test_remove_then_add_moves_to_end() {
        let mut builder = builder();
        builder.start_building(None).unwrap();
        for name in ["a", "b", "c"] {
            builder.add_exercise(plan(name, 30));
        }

        let b = plan("b", 30);
        builder.remove_exercise(&b);
        builder.add_exercise(b);
        assert_eq!(names(&builder), vec!["a", "c", "b"]);
    }

    #[test]
    fn test_move_exercise_to() {
        let mut builder = builder();
        builder.start_building(None).unwrap();
        for name in ["a", "b", "c", "d"] {
            builder.add_exercise(plan(name, 30));
        }

        assert!(builder.move_exercise_to(&plan("a", 30), 2));
        assert_eq!(names(&builder), vec!["b", "c", "a", "d"]);

        assert!(builder.move_exercise_to(&plan("d", 30), 0));
        assert_eq!(names(&builder), vec!["d", "b", "c", "a"]);
    }

    #[test]
    fn test_move_out_of_range_is_noop() {
        let mut builder = builder();
        builder.start_building(None).unwrap();
        for name in ["a", "b", "c"] {
            builder.add_exercise(plan(name, 30));
        }

        assert!(!builder.move_exercise_to(&plan("a", 30), 3));
        assert!(!builder.move_exercise_to(&plan("a", 30), usize::MAX));
        assert!(!builder.move_exercise_to(&plan("missing", 30), 0));
        assert_eq!(names(&builder), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_mutators_without_workout_are_noops() {
        let mut builder = builder();
        builder.add_exercise(plan("a", 30));
        assert!(!builder.remove_exercise(&plan("a", 30)));
        assert!(!builder.move_exercise_to(&plan("a", 30), 0));
        assert!(matches!(builder.save(), Err(Error::InvalidState(_))));
    }

    #[test]
    fn test_save_creates_then_updates() {
        let mut builder = builder();
        builder.start_building(None).unwrap();
        {
            let workout = builder.workout_mut().unwrap();
            workout.name = "legs".into();
            workout.title = "Leg Day".into();
        }
        let squat = builder.repository().exercise("squat").unwrap();
        builder.add_exercise(ExercisePlan::new(squat, 45).unwrap());

        assert_eq!(builder.save().unwrap(), SaveOutcome::Created);
        assert!(!builder.is_new());

        builder.workout_mut().unwrap().title = "Leg Day II".into();
        assert_eq!(builder.save().unwrap(), SaveOutcome::Updated);

        let stored = builder.repository().workout("legs").unwrap();
        assert_eq!(stored.title, "Leg Day II");
    }

    #[test]
    fn test_failed_create_keeps_new_flag() {
        let mut builder = builder();
        builder.start_building(None).unwrap();
        {
            let workout = builder.workout_mut().unwrap();
            workout.name = "mystery".into();
            workout.title = "Mystery".into();
        }
        // Not in the repository's exercise collection
        builder.add_exercise(plan("moonwalk", 30));

        assert!(builder.save().is_err());
        assert!(builder.is_new());
    }

    #[test]
    fn test_invalid_workout_not_saved() {
        let mut builder = builder();
        builder.start_building(None).unwrap();

        assert!(matches!(builder.save(), Err(Error::Validation(_))));
        assert!(builder.is_new());
    }

    #[test]
    fn test_back_to_back_rests_still_save() {
        let mut repository = StoreRepository::open(MemoryStore::new()).unwrap();
        let squat = repository.exercise("squat").unwrap();
        let legs = WorkoutPlan::new(
            "legs",
            "Legs",
            10,
            vec![
                ExercisePlan::new(squat.clone(), 30).unwrap(),
                ExercisePlan::rest(10).unwrap(),
                ExercisePlan::rest(10).unwrap(),
                ExercisePlan::new(squat, 30).unwrap(),
            ],
        );
        repository.add_workout(&legs).unwrap();

        let mut builder = WorkoutBuilder::new(repository);
        builder.start_building(Some("legs")).unwrap();
        builder.workout_mut().unwrap().title = "Leg Day".into();

        assert_eq!(builder.save().unwrap(), SaveOutcome::Updated);
        let saved = builder.repository().workout("legs").unwrap();
        assert_eq!(saved.title, "Leg Day");
        assert_eq!(saved.exercises.len(), 4);
    }
}
