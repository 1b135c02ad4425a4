//! Data access for workouts and exercises.
//!
//! `WorkoutRepository` is the seam the builder and the CLI talk to. The
//! provided implementation keeps both collections in a `KeyValueStore`.
//! Workouts are stored compactly, referencing exercises by name with a
//! duration, and are joined with the exercise collection when fetched.

use crate::{
    get_default_catalog, is_valid_name, Error, Exercise, ExerciseList, ExercisePlan,
    KeyValueStore, Result, WorkoutPlan,
};
use serde::{Deserialize, Serialize};

/// Store key holding the workout collection
pub const WORKOUTS_KEY: &str = "workoutPlans";

/// Store key holding the exercise collection
pub const EXERCISES_KEY: &str = "exercises";

/// CRUD over workouts and exercises
pub trait WorkoutRepository {
    fn workouts(&self) -> Result<Vec<WorkoutPlan>>;
    fn workout(&self, name: &str) -> Result<WorkoutPlan>;
    fn add_workout(&mut self, workout: &WorkoutPlan) -> Result<()>;
    fn update_workout(&mut self, workout: &WorkoutPlan) -> Result<()>;
    fn delete_workout(&mut self, name: &str) -> Result<()>;

    fn exercises(&self) -> Result<Vec<Exercise>>;
    fn exercise(&self, name: &str) -> Result<Exercise>;
    fn add_exercise(&mut self, exercise: &Exercise) -> Result<()>;
    fn update_exercise(&mut self, exercise: &Exercise) -> Result<()>;
    fn delete_exercise(&mut self, name: &str) -> Result<()>;
}

/// Exercise reference as stored inside a workout
#[derive(Clone, Debug, Serialize, Deserialize)]
struct StoredPlan {
    name: String,
    duration: u32,
}

/// Workout as stored: exercises by reference
#[derive(Clone, Debug, Serialize, Deserialize)]
struct StoredWorkout {
    name: String,
    title: String,
    #[serde(default)]
    description: Option<String>,
    rest_between_exercise: u32,
    exercises: Vec<StoredPlan>,
}

impl From<&WorkoutPlan> for StoredWorkout {
    fn from(workout: &WorkoutPlan) -> Self {
        StoredWorkout {
            name: workout.name.clone(),
            title: workout.title.clone(),
            description: workout.description.clone(),
            rest_between_exercise: workout.rest_between_exercise,
            exercises: workout
                .exercises
                .iter()
                .map(|p| StoredPlan {
                    name: p.exercise.name.clone(),
                    duration: p.duration,
                })
                .collect(),
        }
    }
}

/// Repository persisted in a key-value store
#[derive(Debug)]
pub struct StoreRepository<S: KeyValueStore> {
    store: S,
}

impl<S: KeyValueStore> StoreRepository<S> {
    /// Open the repository, seeding the built-in catalog into empty collections
    pub fn open(mut store: S) -> Result<Self> {
        let catalog = get_default_catalog();
        let errors = catalog.validate();
        if !errors.is_empty() {
            return Err(Error::CatalogValidation(errors.join("; ")));
        }

        if store.get(EXERCISES_KEY)?.is_none() {
            let mut exercises: Vec<&Exercise> = catalog.exercises.values().collect();
            exercises.sort_by(|a, b| a.name.cmp(&b.name));
            store.set(EXERCISES_KEY, &serde_json::to_string(&exercises)?)?;
            tracing::info!("Seeded {} built-in exercises", exercises.len());
        }

        if store.get(WORKOUTS_KEY)?.is_none() {
            let mut workouts: Vec<StoredWorkout> =
                catalog.workouts.values().map(StoredWorkout::from).collect();
            workouts.sort_by(|a, b| a.name.cmp(&b.name));
            store.set(WORKOUTS_KEY, &serde_json::to_string(&workouts)?)?;
            tracing::info!("Seeded {} built-in workouts", workouts.len());
        }

        Ok(Self { store })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn load_exercises(&self) -> Result<Vec<Exercise>> {
        match self.store.get(EXERCISES_KEY)? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Vec::new()),
        }
    }

    fn save_exercises(&mut self, exercises: &[Exercise]) -> Result<()> {
        self.store
            .set(EXERCISES_KEY, &serde_json::to_string(exercises)?)
    }

    fn load_workouts(&self) -> Result<Vec<StoredWorkout>> {
        match self.store.get(WORKOUTS_KEY)? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Vec::new()),
        }
    }

    fn save_workouts(&mut self, workouts: &[StoredWorkout]) -> Result<()> {
        self.store.set(WORKOUTS_KEY, &serde_json::to_string(workouts)?)
    }

    /// Join a stored workout with the exercise collection
    fn resolve(stored: StoredWorkout, exercises: &[Exercise]) -> Result<WorkoutPlan> {
        let plans = stored
            .exercises
            .into_iter()
            .map(|plan| {
                let exercise = exercises
                    .iter()
                    .find(|e| e.name == plan.name)
                    .cloned()
                    .or_else(|| (plan.name == crate::REST_EXERCISE_NAME).then(Exercise::rest))
                    .ok_or_else(|| Error::exercise_not_found(&plan.name))?;
                ExercisePlan::new(exercise, plan.duration)
            })
            .collect::<Result<ExerciseList>>()?;

        Ok(WorkoutPlan {
            name: stored.name,
            title: stored.title,
            rest_between_exercise: stored.rest_between_exercise,
            exercises: plans,
            description: stored.description,
        })
    }

    fn check_references(workout: &WorkoutPlan, exercises: &[Exercise]) -> Result<()> {
        let missing: Vec<String> = workout
            .exercises
            .iter()
            .filter(|p| !p.is_rest() && !exercises.iter().any(|e| e.name == p.exercise.name))
            .map(|p| format!("Unknown exercise '{}'", p.exercise.name))
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::Validation(missing))
        }
    }
}

impl<S: KeyValueStore> WorkoutRepository for StoreRepository<S> {
    fn workouts(&self) -> Result<Vec<WorkoutPlan>> {
        let exercises = self.load_exercises()?;
        self.load_workouts()?
            .into_iter()
            .map(|w| Self::resolve(w, &exercises))
            .collect()
    }

    fn workout(&self, name: &str) -> Result<WorkoutPlan> {
        let stored = self
            .load_workouts()?
            .into_iter()
            .find(|w| w.name == name)
            .ok_or_else(|| Error::workout_not_found(name))?;
        Self::resolve(stored, &self.load_exercises()?)
    }

    fn add_workout(&mut self, workout: &WorkoutPlan) -> Result<()> {
        if !is_valid_name(&workout.name) {
            return Err(Error::Validation(vec![format!(
                "Workout name '{}' must be non-empty and alphanumeric",
                workout.name
            )]));
        }
        Self::check_references(workout, &self.load_exercises()?)?;

        let mut workouts = self.load_workouts()?;
        if workouts.iter().any(|w| w.name == workout.name) {
            return Err(Error::Persistence(format!(
                "Workout '{}' already exists",
                workout.name
            )));
        }
        workouts.push(StoredWorkout::from(workout));
        self.save_workouts(&workouts)?;
        tracing::info!("Added workout '{}'", workout.name);
        Ok(())
    }

    fn update_workout(&mut self, workout: &WorkoutPlan) -> Result<()> {
        Self::check_references(workout, &self.load_exercises()?)?;

        let mut workouts = self.load_workouts()?;
        let slot = workouts
            .iter_mut()
            .find(|w| w.name == workout.name)
            .ok_or_else(|| Error::workout_not_found(&workout.name))?;
        *slot = StoredWorkout::from(workout);
        self.save_workouts(&workouts)?;
        tracing::info!("Updated workout '{}'", workout.name);
        Ok(())
    }

    fn delete_workout(&mut self, name: &str) -> Result<()> {
        let mut workouts = self.load_workouts()?;
        let index = workouts
            .iter()
            .position(|w| w.name == name)
            .ok_or_else(|| Error::workout_not_found(name))?;
        workouts.remove(index);
        self.save_workouts(&workouts)?;
        tracing::info!("Deleted workout '{}'", name);
        Ok(())
    }

    fn exercises(&self) -> Result<Vec<Exercise>> {
        self.load_exercises()
    }

    fn exercise(&self, name: &str) -> Result<Exercise> {
        self.load_exercises()?
            .into_iter()
            .find(|e| e.name == name)
            .ok_or_else(|| Error::exercise_not_found(name))
    }

    fn add_exercise(&mut self, exercise: &Exercise) -> Result<()> {
        if !is_valid_name(&exercise.name) {
            return Err(Error::Validation(vec![format!(
                "Exercise name '{}' must be non-empty and alphanumeric",
                exercise.name
            )]));
        }

        let mut exercises = self.load_exercises()?;
        if exercises.iter().any(|e| e.name == exercise.name) {
            return Err(Error::Persistence(format!(
                "Exercise '{}' already exists",
                exercise.name
            )));
        }
        exercises.push(exercise.clone());
        self.save_exercises(&exercises)?;
        tracing::info!("Added exercise '{}'", exercise.name);
        Ok(())
    }

    fn update_exercise(&mut self, exercise: &Exercise) -> Result<()> {
        let mut exercises = self.load_exercises()?;
        let slot = exercises
            .iter_mut()
            .find(|e| e.name == exercise.name)
            .ok_or_else(|| Error::exercise_not_found(&exercise.name))?;
        *slot = exercise.clone();
        self.save_exercises(&exercises)?;
        tracing::info!("Updated exercise '{}'", exercise.name);
        Ok(())
    }

    /// Refuses to delete an exercise that a stored workout still references
    fn delete_exercise(&mut self, name: &str) -> Result<()> {
        let users: Vec<String> = self
            .load_workouts()?
            .into_iter()
            .filter(|w| w.exercises.iter().any(|p| p.name == name))
            .map(|w| format!("Exercise '{}' is used by workout '{}'", name, w.name))
            .collect();
        if !users.is_empty() {
            return Err(Error::Validation(users));
        }

        let mut exercises = self.load_exercises()?;
        let index = exercises
            .iter()
            .position(|e| e.name == name)
            .ok_or_else(|| Error::exercise_not_found(name))?;
        exercises.remove(index);
        self.save_exercises(&exercises)?;
        tracing::info!("Deleted exercise '{}'", name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{JsonFileStore, MemoryStore, DEFAULT_WORKOUT_NAME};

    fn repo() -> StoreRepository<MemoryStore> {
        StoreRepository::open(MemoryStore::new()).unwrap()
    }

    #[test]
    fn test_seeds_builtin_catalog() {
        let repo = repo();
        assert_eq!(repo.exercises().unwrap().len(), 13);

        let workout = repo.workout(DEFAULT_WORKOUT_NAME).unwrap();
        assert_eq!(workout.exercises.len(), 23);
        assert_eq!(workout.exercises.first().unwrap().exercise.title, "Jumping Jacks");
    }

    #[test]
    fn test_missing_workout_is_not_found() {
        let repo = repo();
        let err = repo.workout("nope").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_workout_stored_by_reference() {
        let mut repo = repo();
        let squat = repo.exercise("squat").unwrap();
        let workout = WorkoutPlan::new(
            "legs",
            "Leg Day",
            0,
            vec![
                ExercisePlan::new(squat, 45).unwrap(),
                ExercisePlan::rest(15).unwrap(),
            ],
        );
        repo.add_workout(&workout).unwrap();

        let raw = repo.store().get(WORKOUTS_KEY).unwrap().unwrap();
        assert!(raw.contains(r#"{"name":"squat","duration":45}"#));
        assert!(!raw.contains("thighs"), "exercise bodies must not be embedded");

        let loaded = repo.workout("legs").unwrap();
        assert_eq!(loaded, workout);
    }

    #[test]
    fn test_update_sees_exercise_edits() {
        let mut repo = repo();
        let mut squat = repo.exercise("squat").unwrap();
        squat.title = "Air Squat".into();
        repo.update_exercise(&squat).unwrap();

        let workout = repo.workout(DEFAULT_WORKOUT_NAME).unwrap();
        assert!(workout.exercises.iter().any(|p| p.exercise.title == "Air Squat"));
    }

    #[test]
    fn test_add_rejects_duplicates_and_bad_names() {
        let mut repo = repo();
        let existing = repo.workout(DEFAULT_WORKOUT_NAME).unwrap();
        assert!(matches!(
            repo.add_workout(&existing),
            Err(Error::Persistence(_))
        ));

        let bad = Exercise::new("push up", "Push Up", "", "");
        assert!(matches!(repo.add_exercise(&bad), Err(Error::Validation(_))));
    }

    #[test]
    fn test_update_and_delete_missing_workout() {
        let mut repo = repo();
        let ghost = WorkoutPlan::new("ghost", "Ghost", 0, vec![]);
        assert!(repo.update_workout(&ghost).unwrap_err().is_not_found());
        assert!(repo.delete_workout("ghost").unwrap_err().is_not_found());
    }

    #[test]
    fn test_delete_exercise_in_use_refused() {
        let mut repo = repo();
        assert!(matches!(
            repo.delete_exercise("plank"),
            Err(Error::Validation(_))
        ));

        repo.add_exercise(&Exercise::new("burpee", "Burpee", "", "")).unwrap();
        repo.delete_exercise("burpee").unwrap();
        assert!(repo.exercise("burpee").unwrap_err().is_not_found());
    }

    #[test]
    fn test_file_backed_repository_persists() {
        let temp_dir = tempfile::tempdir().unwrap();
        {
            let mut repo = StoreRepository::open(JsonFileStore::new(temp_dir.path())).unwrap();
            repo.delete_workout(DEFAULT_WORKOUT_NAME).unwrap();
        }

        // Reopening must not re-seed a collection that exists but is empty
        let repo = StoreRepository::open(JsonFileStore::new(temp_dir.path())).unwrap();
        assert!(repo.workouts().unwrap().is_empty());
        assert!(temp_dir.path().join("exercises.json").exists());
    }
}
