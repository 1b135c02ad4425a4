//! Workout execution engine.
//!
//! `WorkoutRunner` is a tick-driven state machine over a workout's exercise
//! list:
//!
//! ```text
//! Idle -> Running <-> Paused
//!            |          |
//!            v          v
//!       Completed   Abandoned
//! ```
//!
//! Each `tick` advances the clock by one second and returns the events it
//! produced, in order. The runner reports session milestones to a
//! `SessionTracker`; a tracker failure aborts the call without changing any
//! runner state, so the same tick can be retried.

use crate::{
    EngineConfig, Error, ExerciseChangedEvent, ExerciseList, ExercisePlan,
    ExerciseProgressEvent, Result, SessionTracker, WorkoutPlan,
};

/// Lifecycle state of a run
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunnerState {
    Idle,
    Running,
    Paused,
    Completed,
    Abandoned,
}

impl RunnerState {
    /// True once the run has finished, one way or the other
    pub fn is_terminal(self) -> bool {
        matches!(self, RunnerState::Completed | RunnerState::Abandoned)
    }
}

/// Everything the runner tells its consumers
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WorkoutEvent {
    Started {
        first: ExercisePlan,
        total_duration: u64,
    },
    Progress(ExerciseProgressEvent),
    ExerciseChanged(ExerciseChangedEvent),
    Paused,
    Resumed,
    Completed,
    Abandoned,
}

/// Drives one workout at a time
#[derive(Debug)]
pub struct WorkoutRunner<T: SessionTracker> {
    tracker: T,
    config: EngineConfig,
    workout: Option<WorkoutPlan>,
    state: RunnerState,
    index: usize,
    running_for: u32,
    time_remaining: u32,
}

/// Interleave rest slots when the workout has none of its own
pub fn with_rest_intervals(workout: &WorkoutPlan) -> WorkoutPlan {
    let rest = workout.rest_between_exercise;
    if rest == 0 || workout.exercises.contains_rest() {
        return workout.clone();
    }

    let mut plans = Vec::with_capacity(workout.exercises.len() * 2);
    for (index, plan) in workout.exercises.iter().enumerate() {
        if index > 0 {
            plans.push(ExercisePlan {
                exercise: crate::Exercise::rest(),
                duration: rest,
            });
        }
        plans.push(plan.clone());
    }

    WorkoutPlan {
        exercises: ExerciseList::from(plans),
        ..workout.clone()
    }
}

impl<T: SessionTracker> WorkoutRunner<T> {
    pub fn new(tracker: T, config: EngineConfig) -> Self {
        Self {
            tracker,
            config,
            workout: None,
            state: RunnerState::Idle,
            index: 0,
            running_for: 0,
            time_remaining: 0,
        }
    }

    pub fn state(&self) -> RunnerState {
        self.state
    }

    /// The workout being run, with any inserted rest slots
    pub fn workout(&self) -> Option<&WorkoutPlan> {
        self.workout.as_ref()
    }

    pub fn tracker(&self) -> &T {
        &self.tracker
    }

    pub fn current_index(&self) -> usize {
        self.index
    }

    /// The plan on the clock (the last one once completed)
    pub fn current(&self) -> Option<&ExercisePlan> {
        self.workout.as_ref()?.exercises.get(self.index)
    }

    /// The plan after the current one
    pub fn upcoming(&self) -> Option<&ExercisePlan> {
        self.workout.as_ref()?.exercises.get(self.index + 1)
    }

    pub fn running_for(&self) -> u32 {
        self.running_for
    }

    pub fn time_remaining(&self) -> u32 {
        self.time_remaining
    }

    /// Seconds left in the whole workout
    pub fn workout_time_remaining(&self) -> u64 {
        let Some(workout) = self.workout.as_ref() else {
            return 0;
        };
        let later: u64 = workout
            .exercises
            .iter()
            .skip(self.index + 1)
            .map(|p| u64::from(p.duration))
            .sum();
        u64::from(self.time_remaining) + later
    }

    fn wrong_state(&self, action: &str) -> Error {
        tracing::error!("Cannot {} a workout runner in state {:?}", action, self.state);
        Error::InvalidState(format!("cannot {} while {:?}", action, self.state))
    }

    /// Begin running `workout` and open a tracked session
    pub fn start(&mut self, workout: WorkoutPlan) -> Result<Vec<WorkoutEvent>> {
        if self.state != RunnerState::Idle {
            return Err(self.wrong_state("start"));
        }

        let workout = if self.config.insert_rest {
            with_rest_intervals(&workout)
        } else {
            workout
        };

        let mut errors = Vec::new();
        if workout.exercises.is_empty() {
            errors.push(format!("Workout '{}' has no exercises", workout.name));
        }
        for plan in workout.exercises.iter().filter(|p| p.duration == 0) {
            errors.push(format!("Exercise '{}' has zero duration", plan.exercise.name));
        }
        if !errors.is_empty() {
            return Err(Error::Validation(errors));
        }

        let first = workout
            .exercises
            .first()
            .cloned()
            .ok_or_else(|| Error::InvalidState("workout has no first exercise".into()))?;

        self.tracker.start_tracking()?;

        let total_duration = workout.total_duration();
        tracing::info!(
            "Starting workout '{}' ({} exercises, {}s)",
            workout.name,
            workout.exercises.len(),
            total_duration
        );

        self.index = 0;
        self.running_for = 0;
        self.time_remaining = first.duration;
        self.workout = Some(workout);
        self.state = RunnerState::Running;

        Ok(vec![WorkoutEvent::Started {
            first,
            total_duration,
        }])
    }

    /// Advance the clock by one second.
    ///
    /// Ignored while paused or finished. Ticking a runner that was never
    /// started is an error.
    pub fn tick(&mut self) -> Result<Vec<WorkoutEvent>> {
        match self.state {
            RunnerState::Running => {}
            RunnerState::Idle => return Err(self.wrong_state("tick")),
            RunnerState::Paused | RunnerState::Completed | RunnerState::Abandoned => {
                return Ok(Vec::new());
            }
        }

        let workout = self
            .workout
            .as_ref()
            .ok_or_else(|| Error::InvalidState("running without a workout".into()))?;
        let current = workout
            .exercises
            .get(self.index)
            .cloned()
            .ok_or_else(|| Error::InvalidState(format!("no exercise at index {}", self.index)))?;

        let running_for = self.running_for + 1;
        let time_remaining = self.time_remaining.saturating_sub(1);
        debug_assert_eq!(time_remaining, current.duration - running_for);

        let mut events = vec![WorkoutEvent::Progress(ExerciseProgressEvent {
            exercise: current.clone(),
            running_for,
            time_remaining,
        })];

        if time_remaining > 0 {
            self.running_for = running_for;
            self.time_remaining = time_remaining;
            return Ok(events);
        }

        match workout.exercises.get(self.index + 1).cloned() {
            None => {
                self.tracker.end_tracking(true)?;
                self.running_for = running_for;
                self.time_remaining = 0;
                self.state = RunnerState::Completed;
                events.push(WorkoutEvent::Completed);
                tracing::info!("Workout '{}' completed", workout.name);
            }
            Some(next) => {
                let upcoming = workout.exercises.get(self.index + 2).cloned();
                if self.config.count_rest || !current.is_rest() {
                    self.tracker.exercise_complete(&current)?;
                }
                tracing::debug!(
                    "Exercise '{}' done, next '{}'",
                    current.exercise.name,
                    next.exercise.name
                );
                self.index += 1;
                self.running_for = 0;
                self.time_remaining = next.duration;
                events.push(WorkoutEvent::ExerciseChanged(ExerciseChangedEvent {
                    previous: current,
                    next,
                    upcoming,
                }));
            }
        }

        Ok(events)
    }

    /// Suspend the clock. A no-op if already paused.
    pub fn pause(&mut self) -> Result<Vec<WorkoutEvent>> {
        match self.state {
            RunnerState::Running => {
                self.state = RunnerState::Paused;
                tracing::debug!("Paused at {}s into exercise #{}", self.running_for, self.index);
                Ok(vec![WorkoutEvent::Paused])
            }
            RunnerState::Paused => Ok(Vec::new()),
            _ => Err(self.wrong_state("pause")),
        }
    }

    /// Continue from exactly where `pause` stopped. A no-op if running.
    pub fn resume(&mut self) -> Result<Vec<WorkoutEvent>> {
        match self.state {
            RunnerState::Paused => {
                self.state = RunnerState::Running;
                tracing::debug!("Resumed exercise #{}", self.index);
                Ok(vec![WorkoutEvent::Resumed])
            }
            RunnerState::Running => Ok(Vec::new()),
            _ => Err(self.wrong_state("resume")),
        }
    }

    /// Pause if running, resume if paused
    pub fn toggle_pause(&mut self) -> Result<Vec<WorkoutEvent>> {
        if self.state == RunnerState::Paused {
            self.resume()
        } else {
            self.pause()
        }
    }

    /// Stop before the natural end and close the session as not completed.
    ///
    /// Calling it again after the run finished is a no-op. If the tracker
    /// fails to close the session the error is returned and the runner keeps
    /// its state, so the abandon can be retried.
    pub fn abandon(&mut self) -> Result<Vec<WorkoutEvent>> {
        match self.state {
            RunnerState::Running | RunnerState::Paused => {
                self.tracker.end_tracking(false)?;
                self.state = RunnerState::Abandoned;
                tracing::info!(
                    "Workout abandoned at exercise #{} ({}s in)",
                    self.index,
                    self.running_for
                );
                Ok(vec![WorkoutEvent::Abandoned])
            }
            RunnerState::Completed | RunnerState::Abandoned => Ok(Vec::new()),
            RunnerState::Idle => Err(self.wrong_state("abandon")),
        }
    }

    /// Return a finished runner to `Idle` so another workout can start
    pub fn reset(&mut self) -> Result<()> {
        match self.state {
            RunnerState::Running | RunnerState::Paused => Err(self.wrong_state("reset")),
            _ => {
                self.workout = None;
                self.state = RunnerState::Idle;
                self.index = 0;
                self.running_for = 0;
                self.time_remaining = 0;
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Exercise, MemoryStore, WorkoutHistoryTracker};

    /// Tracker that records the calls it receives
    #[derive(Debug, Default)]
    struct RecordingTracker {
        calls: Vec<String>,
        fail_next: bool,
        fail_end: bool,
    }

    impl SessionTracker for RecordingTracker {
        fn start_tracking(&mut self) -> Result<()> {
            self.calls.push("start".into());
            Ok(())
        }

        fn exercise_complete(&mut self, plan: &ExercisePlan) -> Result<()> {
            if self.fail_next {
                self.fail_next = false;
                return Err(Error::Persistence("store unavailable".into()));
            }
            self.calls.push(format!("done:{}", plan.exercise.name));
            Ok(())
        }

        fn end_tracking(&mut self, completed: bool) -> Result<()> {
            if self.fail_end {
                self.fail_end = false;
                return Err(Error::Persistence("store unavailable".into()));
            }
            self.calls.push(format!("end:{}", completed));
            Ok(())
        }
    }

    fn plan(name: &str, duration: u32) -> ExercisePlan {
        ExercisePlan::new(Exercise::new(name, name, "", ""), duration).unwrap()
    }

    fn sample_workout() -> WorkoutPlan {
        WorkoutPlan::new(
            "sample",
            "Sample",
            10,
            vec![
                plan("jumpingJacks", 30),
                ExercisePlan::rest(10).unwrap(),
                plan("pushUp", 30),
            ],
        )
    }

    fn runner() -> WorkoutRunner<RecordingTracker> {
        WorkoutRunner::new(RecordingTracker::default(), EngineConfig::default())
    }

    fn run_ticks<T: SessionTracker>(runner: &mut WorkoutRunner<T>, n: u32) -> Vec<WorkoutEvent> {
        let mut events = Vec::new();
        for _ in 0..n {
            events.extend(runner.tick().unwrap());
        }
        events
    }

    fn changes(events: &[WorkoutEvent]) -> Vec<(String, String)> {
        events
            .iter()
            .filter_map(|e| match e {
                WorkoutEvent::ExerciseChanged(c) => Some((
                    c.previous.exercise.name.clone(),
                    c.next.exercise.name.clone(),
                )),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_sample_workout_scenario() {
        crate::logging::init_test();
        let tracker = WorkoutHistoryTracker::new(MemoryStore::new()).unwrap();
        let mut runner = WorkoutRunner::new(tracker, EngineConfig::default());
        runner.start(sample_workout()).unwrap();

        let events = run_ticks(&mut runner, 30);
        assert_eq!(
            changes(&events),
            vec![("jumpingJacks".to_string(), "rest".to_string())]
        );

        let events = run_ticks(&mut runner, 10);
        assert_eq!(
            changes(&events),
            vec![("rest".to_string(), "pushUp".to_string())]
        );
        assert_eq!(runner.state(), RunnerState::Running);

        let events = run_ticks(&mut runner, 30);
        assert!(changes(&events).is_empty());
        assert_eq!(events.last(), Some(&WorkoutEvent::Completed));
        assert_eq!(runner.state(), RunnerState::Completed);

        let entry = &runner.tracker().history()[0];
        assert!(entry.completed);
        assert_eq!(entry.exercises_done, 2);
        assert_eq!(entry.last_exercise.as_deref(), Some("Relax!"));
        assert!(!runner.tracker().is_tracking());
    }

    #[test]
    fn test_tick_and_transition_counts() {
        let workouts = vec![
            vec![plan("a", 1)],
            vec![plan("a", 3), plan("b", 2)],
            vec![plan("a", 5), ExercisePlan::rest(2).unwrap(), plan("b", 4), plan("c", 1)],
        ];

        for plans in workouts {
            let n = plans.len();
            let total: u32 = plans.iter().map(|p| p.duration).sum();
            let mut runner = runner();
            runner.start(WorkoutPlan::new("w", "W", 0, plans)).unwrap();

            let mut progress = Vec::new();
            let mut changed = 0;
            while runner.state() == RunnerState::Running {
                for event in runner.tick().unwrap() {
                    match event {
                        WorkoutEvent::Progress(p) => progress.push(p),
                        WorkoutEvent::ExerciseChanged(_) => changed += 1,
                        _ => {}
                    }
                }
            }

            assert_eq!(progress.len() as u32, total);
            assert_eq!(changed, n - 1);
            assert_eq!(progress.last().unwrap().time_remaining, 0);
            for p in &progress {
                assert_eq!(p.time_remaining, p.exercise.duration - p.running_for);
            }
        }
    }

    #[test]
    fn test_progress_precedes_change_in_same_tick() {
        let mut runner = runner();
        runner
            .start(WorkoutPlan::new("w", "W", 0, vec![plan("a", 1), plan("b", 1)]))
            .unwrap();

        let events = runner.tick().unwrap();
        assert_eq!(events.len(), 2);
        match (&events[0], &events[1]) {
            (WorkoutEvent::Progress(p), WorkoutEvent::ExerciseChanged(c)) => {
                assert_eq!(p.exercise.exercise.name, "a");
                assert_eq!(p.time_remaining, 0);
                assert_eq!(c.previous.exercise.name, "a");
                assert_eq!(c.next.exercise.name, "b");
                assert!(c.upcoming.is_none());
            }
            other => panic!("unexpected events {:?}", other),
        }
    }

    #[test]
    fn test_pause_freezes_counters() {
        let mut runner = runner();
        runner.start(sample_workout()).unwrap();
        run_ticks(&mut runner, 7);

        assert_eq!(runner.pause().unwrap(), vec![WorkoutEvent::Paused]);
        for _ in 0..100 {
            assert!(runner.tick().unwrap().is_empty());
        }
        assert_eq!(runner.running_for(), 7);
        assert_eq!(runner.time_remaining(), 23);

        runner.resume().unwrap();
        let events = runner.tick().unwrap();
        match &events[0] {
            WorkoutEvent::Progress(p) => {
                assert_eq!(p.running_for, 8);
                assert_eq!(p.time_remaining, 22);
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_abandon_ends_session_once() {
        let mut runner = runner();
        runner.start(sample_workout()).unwrap();
        run_ticks(&mut runner, 35);
        runner.pause().unwrap();

        assert_eq!(runner.abandon().unwrap(), vec![WorkoutEvent::Abandoned]);
        assert_eq!(runner.state(), RunnerState::Abandoned);
        assert!(runner.abandon().unwrap().is_empty());
        assert!(runner.tick().unwrap().is_empty());

        assert_eq!(
            runner.tracker().calls,
            vec!["start", "done:jumpingJacks", "end:false"]
        );
    }

    #[test]
    fn test_abandon_while_running() {
        let mut runner = runner();
        runner.start(sample_workout()).unwrap();
        run_ticks(&mut runner, 12);
        assert_eq!(runner.state(), RunnerState::Running);

        assert_eq!(runner.abandon().unwrap(), vec![WorkoutEvent::Abandoned]);
        assert_eq!(runner.state(), RunnerState::Abandoned);
        assert!(runner.abandon().unwrap().is_empty());
        assert_eq!(runner.tracker().calls, vec!["start", "end:false"]);
    }

    #[test]
    fn test_failed_abandon_can_be_retried() {
        let mut runner = runner();
        runner.start(sample_workout()).unwrap();
        run_ticks(&mut runner, 5);
        runner.tracker.fail_end = true;

        assert!(matches!(runner.abandon(), Err(Error::Persistence(_))));
        assert_eq!(runner.state(), RunnerState::Running);
        assert_eq!(runner.running_for(), 5);

        assert_eq!(runner.abandon().unwrap(), vec![WorkoutEvent::Abandoned]);
        assert_eq!(runner.tracker().calls, vec!["start", "end:false"]);
    }

    #[test]
    fn test_huge_durations_do_not_overflow() {
        let mut runner = runner();
        let events = runner
            .start(WorkoutPlan::new("big", "Big", 0, vec![plan("a", u32::MAX), plan("b", 5)]))
            .unwrap();

        assert!(matches!(
            events[0],
            WorkoutEvent::Started { total_duration, .. } if total_duration == u64::from(u32::MAX) + 5
        ));
        runner.tick().unwrap();
        assert_eq!(runner.workout_time_remaining(), u64::from(u32::MAX) + 4);
    }

    #[test]
    fn test_idle_runner_rejects_commands() {
        let mut runner = runner();
        assert!(matches!(runner.tick(), Err(Error::InvalidState(_))));
        assert!(matches!(runner.abandon(), Err(Error::InvalidState(_))));
        assert!(matches!(runner.pause(), Err(Error::InvalidState(_))));
        assert!(runner.tracker().calls.is_empty());
    }

    #[test]
    fn test_empty_workout_rejected_without_session() {
        let mut runner = runner();
        let result = runner.start(WorkoutPlan::new("w", "W", 0, vec![]));
        assert!(matches!(result, Err(Error::Validation(_))));
        assert_eq!(runner.state(), RunnerState::Idle);
        assert!(runner.tracker().calls.is_empty());
    }

    #[test]
    fn test_rest_not_counted_when_configured() {
        let config = EngineConfig {
            count_rest: false,
            ..EngineConfig::default()
        };
        let mut runner = WorkoutRunner::new(RecordingTracker::default(), config);
        runner.start(sample_workout()).unwrap();
        run_ticks(&mut runner, 70);

        assert_eq!(
            runner.tracker().calls,
            vec!["start", "done:jumpingJacks", "end:true"]
        );
    }

    #[test]
    fn test_insert_rest_between_exercises() {
        let config = EngineConfig {
            insert_rest: true,
            ..EngineConfig::default()
        };
        let mut runner = WorkoutRunner::new(RecordingTracker::default(), config);
        runner
            .start(WorkoutPlan::new("w", "W", 5, vec![plan("a", 10), plan("b", 10), plan("c", 10)]))
            .unwrap();

        let names: Vec<_> = runner
            .workout()
            .unwrap()
            .exercises
            .iter()
            .map(|p| p.exercise.name.clone())
            .collect();
        assert_eq!(names, vec!["a", "rest", "b", "rest", "c"]);
        assert_eq!(runner.workout_time_remaining(), 40);
    }

    #[test]
    fn test_existing_rest_slots_not_doubled() {
        let expanded = with_rest_intervals(&sample_workout());
        assert_eq!(expanded.exercises.len(), 3);
    }

    #[test]
    fn test_tracker_failure_leaves_tick_retryable() {
        let mut runner = runner();
        runner
            .start(WorkoutPlan::new("w", "W", 0, vec![plan("a", 1), plan("b", 1)]))
            .unwrap();
        runner.tracker.fail_next = true;

        assert!(runner.tick().is_err());
        assert_eq!(runner.current_index(), 0);
        assert_eq!(runner.time_remaining(), 1);

        let events = runner.tick().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(runner.current_index(), 1);
    }

    #[test]
    fn test_workout_time_remaining_counts_down() {
        let mut runner = runner();
        runner.start(sample_workout()).unwrap();
        assert_eq!(runner.workout_time_remaining(), 70);

        run_ticks(&mut runner, 31);
        assert_eq!(runner.workout_time_remaining(), 39);
        assert_eq!(runner.upcoming().unwrap().exercise.name, "pushUp");
    }

    #[test]
    fn test_reset_after_completion() {
        let mut runner = runner();
        runner
            .start(WorkoutPlan::new("w", "W", 0, vec![plan("a", 1)]))
            .unwrap();
        assert!(runner.reset().is_err());

        runner.tick().unwrap();
        assert_eq!(runner.state(), RunnerState::Completed);
        runner.reset().unwrap();
        assert_eq!(runner.state(), RunnerState::Idle);
        runner
            .start(WorkoutPlan::new("w", "W", 0, vec![plan("a", 1)]))
            .unwrap();
        assert_eq!(runner.state(), RunnerState::Running);
    }
}
