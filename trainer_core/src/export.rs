//! CSV export of workout history.

use crate::{Result, WorkoutLogEntry};
use std::fs::File;
use std::path::Path;

/// A row in the CSV output
#[derive(Debug, serde::Serialize)]
struct CsvRow {
    id: String,
    started_on: String,
    ended_on: Option<String>,
    completed: bool,
    exercises_done: u32,
    last_exercise: Option<String>,
}

impl From<&WorkoutLogEntry> for CsvRow {
    fn from(entry: &WorkoutLogEntry) -> Self {
        CsvRow {
            id: entry.id.to_string(),
            started_on: entry.started_on.to_rfc3339(),
            ended_on: entry.ended_on.map(|t| t.to_rfc3339()),
            completed: entry.completed,
            exercises_done: entry.exercises_done,
            last_exercise: entry.last_exercise.clone(),
        }
    }
}

/// Write `entries` to `path` as CSV (with headers), replacing any existing file
///
/// Returns the number of rows written. The file is synced to disk before
/// returning.
pub fn export_history_csv(entries: &[WorkoutLogEntry], path: &Path) -> Result<usize> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let file = File::create(path)?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(true)
        .from_writer(file);

    for entry in entries {
        writer.serialize(CsvRow::from(entry))?;
    }

    writer.flush()?;
    let file = writer
        .into_inner()
        .map_err(|e| crate::Error::Io(e.into_error()))?;
    file.sync_all()?;

    tracing::info!("Exported {} history entries to {:?}", entries.len(), path);
    Ok(entries.len())
}
