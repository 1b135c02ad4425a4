//! Audio cue derivation.
//!
//! The runner only reports raw progress; this module turns those events into
//! cue records (halfway, about to complete, next up) with a delay relative to
//! the event. Playing them is up to the caller.

use crate::{CueConfig, ExerciseChangedEvent, ExerciseProgressEvent, WorkoutEvent};

/// A sound the front end should play
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AudioCue {
    /// Halfway through a (non-rest) exercise
    Halfway,
    /// A few seconds left in the current exercise
    AboutToComplete,
    /// Generic "next up" announcement during a rest
    NextUp,
    /// Narration of the exercise that follows the rest
    NextUpExercise { sound: Option<String>, title: String },
}

/// A cue to fire `delay_ms` after the event that produced it
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScheduledCue {
    pub cue: AudioCue,
    pub delay_ms: u64,
}

impl ScheduledCue {
    fn now(cue: AudioCue) -> Self {
        Self { cue, delay_ms: 0 }
    }
}

#[derive(Clone, Debug, Default)]
pub struct CuePlanner {
    config: CueConfig,
}

impl CuePlanner {
    pub fn new(config: CueConfig) -> Self {
        Self { config }
    }

    pub fn on_progress(&self, progress: &ExerciseProgressEvent) -> Option<ScheduledCue> {
        let plan = &progress.exercise;
        if !plan.is_rest() && progress.running_for == plan.duration / 2 {
            Some(ScheduledCue::now(AudioCue::Halfway))
        } else if progress.time_remaining == self.config.about_to_complete_secs {
            Some(ScheduledCue::now(AudioCue::AboutToComplete))
        } else {
            None
        }
    }

    /// Entering a rest announces the exercise that follows it
    pub fn on_exercise_changed(&self, change: &ExerciseChangedEvent) -> Vec<ScheduledCue> {
        if !change.next.is_rest() {
            return Vec::new();
        }
        let Some(upcoming) = change.upcoming.as_ref() else {
            return Vec::new();
        };

        vec![
            ScheduledCue {
                cue: AudioCue::NextUp,
                delay_ms: self.config.next_up_delay_ms,
            },
            ScheduledCue {
                cue: AudioCue::NextUpExercise {
                    sound: upcoming.exercise.name_sound.clone(),
                    title: upcoming.exercise.title.clone(),
                },
                delay_ms: self.config.next_up_exercise_delay_ms,
            },
        ]
    }

    /// Cues for any runner event
    pub fn plan(&self, event: &WorkoutEvent) -> Vec<ScheduledCue> {
        match event {
            WorkoutEvent::Progress(progress) => self.on_progress(progress).into_iter().collect(),
            WorkoutEvent::ExerciseChanged(change) => self.on_exercise_changed(change),
            _ => Vec::new(),
        }
    }
}
