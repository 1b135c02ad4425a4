//! Bounded workout history backed by a key-value store.
//!
//! The tracker keeps the last N session log entries (oldest first) and owns
//! the single "current" entry while a workout is running. Every mutation is
//! applied to a copy, persisted, and only then committed in memory, so a failed
//! write never leaves the tracker out of sync with the store.

use crate::{Error, ExercisePlan, KeyValueStore, Result, WorkoutLogEntry};
use chrono::Utc;

/// Store key the history is persisted under
pub const HISTORY_KEY: &str = "workouts";

/// Number of sessions kept when no capacity is configured
pub const DEFAULT_HISTORY_CAPACITY: usize = 20;

/// Session lifecycle hooks the workout runner reports to
pub trait SessionTracker {
    fn start_tracking(&mut self) -> Result<()>;
    fn exercise_complete(&mut self, plan: &ExercisePlan) -> Result<()>;
    fn end_tracking(&mut self, completed: bool) -> Result<()>;
}

impl<T: SessionTracker + ?Sized> SessionTracker for &mut T {
    fn start_tracking(&mut self) -> Result<()> {
        (**self).start_tracking()
    }

    fn exercise_complete(&mut self, plan: &ExercisePlan) -> Result<()> {
        (**self).exercise_complete(plan)
    }

    fn end_tracking(&mut self, completed: bool) -> Result<()> {
        (**self).end_tracking(completed)
    }
}

/// Persisted ring buffer of workout sessions
#[derive(Debug)]
pub struct WorkoutHistoryTracker<S: KeyValueStore> {
    store: S,
    capacity: usize,
    history: Vec<WorkoutLogEntry>,
    tracking: bool,
}

impl<S: KeyValueStore> WorkoutHistoryTracker<S> {
    /// Rehydrate the tracker from `store` with the default capacity
    pub fn new(store: S) -> Result<Self> {
        Self::with_capacity(store, DEFAULT_HISTORY_CAPACITY)
    }

    /// Rehydrate the tracker from `store`, keeping at most `capacity` entries
    ///
    /// A payload that cannot be parsed is logged and replaced by an empty history.
    pub fn with_capacity(store: S, capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::Config("history capacity must be at least 1".into()));
        }

        let mut history = match store.get(HISTORY_KEY)? {
            Some(raw) => match serde_json::from_str::<Vec<WorkoutLogEntry>>(&raw) {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::warn!("Failed to parse workout history: {}. Starting empty.", e);
                    Vec::new()
                }
            },
            None => Vec::new(),
        };

        if history.len() > capacity {
            let excess = history.len() - capacity;
            history.drain(..excess);
            tracing::debug!("Dropped {} history entries over capacity {}", excess, capacity);
        }

        tracing::debug!("Loaded {} workout history entries", history.len());

        Ok(Self {
            store,
            capacity,
            history,
            tracking: false,
        })
    }

    /// Full history, oldest first
    pub fn history(&self) -> &[WorkoutLogEntry] {
        &self.history
    }

    /// The entry of the session being tracked, if any
    pub fn current(&self) -> Option<&WorkoutLogEntry> {
        if self.tracking {
            self.history.last()
        } else {
            None
        }
    }

    pub fn is_tracking(&self) -> bool {
        self.tracking
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Remove every entry. Refused while a session is being tracked.
    pub fn clear(&mut self) -> Result<()> {
        if self.tracking {
            return Err(self.violation("cannot clear history while a workout is tracked"));
        }
        self.commit(Vec::new())?;
        tracing::info!("Cleared workout history");
        Ok(())
    }

    fn violation(&self, message: &str) -> Error {
        tracing::error!("Workout history contract violation: {}", message);
        Error::InvalidState(message.to_string())
    }

    /// Persist `next` and adopt it as the in-memory history
    fn commit(&mut self, next: Vec<WorkoutLogEntry>) -> Result<()> {
        let payload = serde_json::to_string(&next)?;
        self.store.set(HISTORY_KEY, &payload)?;
        self.history = next;
        Ok(())
    }

    /// Copy of the history with `f` applied to the current entry
    fn with_current<F>(&self, f: F) -> Result<Vec<WorkoutLogEntry>>
    where
        F: FnOnce(&mut WorkoutLogEntry),
    {
        let mut next = self.history.clone();
        let current = next
            .last_mut()
            .ok_or_else(|| Error::InvalidState("tracked session entry is missing".into()))?;
        f(current);
        Ok(next)
    }
}

impl<S: KeyValueStore> SessionTracker for WorkoutHistoryTracker<S> {
    fn start_tracking(&mut self) -> Result<()> {
        if self.tracking {
            return Err(self.violation("start_tracking called while already tracking"));
        }

        let now = Utc::now();
        let mut next = self.history.clone();

        // Sessions a previous process never closed
        for stale in next.iter_mut().filter(|e| e.is_open()) {
            tracing::warn!(
                "Closing unterminated session started at {} as not completed",
                stale.started_on
            );
            stale.ended_on = Some(now);
            stale.completed = false;
        }

        while next.len() >= self.capacity {
            next.remove(0);
        }
        next.push(WorkoutLogEntry::new(now));

        self.commit(next)?;
        self.tracking = true;
        tracing::info!("Started tracking workout session at {}", now);
        Ok(())
    }

    fn exercise_complete(&mut self, plan: &ExercisePlan) -> Result<()> {
        if !self.tracking {
            return Err(self.violation("exercise_complete called while not tracking"));
        }

        let next = self.with_current(|entry| {
            entry.last_exercise = Some(plan.exercise.title.clone());
            entry.exercises_done += 1;
        })?;
        self.commit(next)?;
        tracing::debug!("Recorded completion of '{}'", plan.exercise.name);
        Ok(())
    }

    fn end_tracking(&mut self, completed: bool) -> Result<()> {
        if !self.tracking {
            return Err(self.violation("end_tracking called while not tracking"));
        }

        let now = Utc::now();
        let next = self.with_current(|entry| {
            entry.completed = completed;
            entry.ended_on = Some(now);
        })?;
        self.commit(next)?;
        self.tracking = false;
        tracing::info!("Ended workout session (completed: {})", completed);
        Ok(())
    }
}
