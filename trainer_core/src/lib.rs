#![forbid(unsafe_code)]

//! Core domain model and business logic for the Trainer workout runner.
//!
//! This crate provides:
//! - Domain types (exercises, exercise plans, workouts, session log entries)
//! - The workout builder for authoring exercise sequences
//! - The tick-driven workout runner and its events
//! - The bounded, persisted workout history
//! - Persistence (key-value store, workout repository, CSV export)
//! - Audio cue derivation from runner events

pub mod types;
pub mod error;
pub mod catalog;
pub mod config;
pub mod logging;
pub mod store;
pub mod repository;
pub mod history;
pub mod builder;
pub mod engine;
pub mod cues;
pub mod export;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use catalog::{build_default_catalog, get_default_catalog, Catalog, DEFAULT_WORKOUT_NAME};
pub use config::{Config, CueConfig, EngineConfig};
pub use store::{JsonFileStore, KeyValueStore, MemoryStore};
pub use repository::{StoreRepository, WorkoutRepository};
pub use history::{SessionTracker, WorkoutHistoryTracker, DEFAULT_HISTORY_CAPACITY};
pub use builder::{SaveOutcome, WorkoutBuilder};
pub use engine::{RunnerState, WorkoutEvent, WorkoutRunner};
pub use cues::{AudioCue, CuePlanner, ScheduledCue};
pub use export::export_history_csv;
