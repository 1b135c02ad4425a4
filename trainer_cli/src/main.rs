use clap::{Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};
use trainer_core::*;

#[derive(Parser)]
#[command(name = "trainer")]
#[command(about = "Guided workout runner", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a workout (default)
    Run {
        /// Workout to run
        #[arg(long)]
        workout: Option<String>,

        /// Tick as fast as possible without waiting for keyboard input (for testing)
        #[arg(long)]
        auto: bool,

        /// Abandon the workout after this many seconds
        #[arg(long, value_name = "SECS")]
        abandon_after: Option<u32>,
    },

    /// Inspect or delete stored workouts
    Workouts {
        #[command(subcommand)]
        action: WorkoutsAction,
    },

    /// List available exercises
    Exercises,

    /// Create or edit a workout (removals, then additions, then moves)
    Build {
        /// Workout name (alphanumeric)
        name: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        description: Option<String>,

        /// Rest between exercises in seconds
        #[arg(long, value_name = "SECS")]
        rest: Option<u32>,

        /// Append an exercise
        #[arg(long = "add", value_name = "EXERCISE:SECS")]
        adds: Vec<String>,

        /// Remove the first occurrence of an exercise
        #[arg(long = "remove", value_name = "EXERCISE")]
        removes: Vec<String>,

        /// Move the first occurrence of an exercise to a position (0-based)
        #[arg(long = "move", value_name = "EXERCISE:INDEX")]
        moves: Vec<String>,
    },

    /// Show workout history
    History {
        /// Export history to a CSV file
        #[arg(long, value_name = "PATH")]
        export: Option<PathBuf>,

        /// Delete all history entries
        #[arg(long, conflicts_with = "export")]
        clear: bool,
    },
}

#[derive(Subcommand)]
enum WorkoutsAction {
    /// List all workouts
    List,
    /// Show the exercises of a workout
    Show { name: String },
    /// Delete a workout
    Delete { name: String },
}

fn main() {
    // Initialize logging
    trainer_core::logging::init();

    if let Err(e) = run_cli(Cli::parse()) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run_cli(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let data_dir = cli
        .data_dir
        .unwrap_or_else(|| config.data.data_dir.clone());
    tracing::debug!("Using data directory {:?}", data_dir);

    match cli.command {
        Some(Commands::Run {
            workout,
            auto,
            abandon_after,
        }) => cmd_run(&data_dir, workout, auto, abandon_after, &config),
        Some(Commands::Workouts { action }) => cmd_workouts(&data_dir, action),
        Some(Commands::Exercises) => cmd_exercises(&data_dir),
        Some(Commands::Build {
            name,
            title,
            description,
            rest,
            adds,
            removes,
            moves,
        }) => cmd_build(
            &data_dir,
            BuildEdits {
                name,
                title,
                description,
                rest,
                adds,
                removes,
                moves,
            },
        ),
        Some(Commands::History { export, clear }) => cmd_history(&data_dir, export, clear, &config),
        None => {
            // Default to "run" command
            cmd_run(&data_dir, None, false, None, &config)
        }
    }
}

fn open_repository(data_dir: &Path) -> Result<StoreRepository<JsonFileStore>> {
    StoreRepository::open(JsonFileStore::new(data_dir))
}

fn open_tracker(data_dir: &Path, config: &Config) -> Result<WorkoutHistoryTracker<JsonFileStore>> {
    WorkoutHistoryTracker::with_capacity(JsonFileStore::new(data_dir), config.history.max_items)
}

// ============================================================================
// run
// ============================================================================

enum Input {
    TogglePause,
    Quit,
}

/// Read single-letter commands from stdin on a background thread
fn spawn_input_reader() -> Receiver<Input> {
    let (tx, rx) = channel();
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            let input = match line.trim().to_lowercase().as_str() {
                "p" => Input::TogglePause,
                "q" => Input::Quit,
                _ => continue,
            };
            if tx.send(input).is_err() {
                break;
            }
        }
    });
    rx
}

struct Display {
    planner: CuePlanner,
    live: bool,
    pending: Vec<(Instant, AudioCue)>,
}

impl Display {
    fn new(config: &Config, live: bool) -> Self {
        Self {
            planner: CuePlanner::new(config.cues.clone()),
            live,
            pending: Vec::new(),
        }
    }

    fn show(&mut self, events: Vec<WorkoutEvent>) -> Result<()> {
        for event in &events {
            self.show_event(event);
            for scheduled in self.planner.plan(event) {
                if self.live && scheduled.delay_ms > 0 {
                    let due = Instant::now() + Duration::from_millis(scheduled.delay_ms);
                    self.pending.push((due, scheduled.cue));
                } else {
                    show_cue(&scheduled.cue);
                }
            }
        }
        io::stdout().flush()?;
        Ok(())
    }

    /// Announce delayed cues whose time has come
    fn flush_due(&mut self) {
        let now = Instant::now();
        let (due, later): (Vec<_>, Vec<_>) = self.pending.drain(..).partition(|(at, _)| *at <= now);
        self.pending = later;
        for (_, cue) in due {
            show_cue(&cue);
        }
    }

    fn show_event(&self, event: &WorkoutEvent) {
        match event {
            WorkoutEvent::Started {
                first,
                total_duration,
            } => {
                println!("Workout started ({} total)", format_seconds(*total_duration));
                println!("▶ {} ({}s)", first.exercise.title, first.duration);
            }
            WorkoutEvent::Progress(progress) => {
                if self.live {
                    print!(
                        "\r  {:<28} {} left ",
                        progress.exercise.exercise.title,
                        format_seconds(progress.time_remaining.into())
                    );
                }
            }
            WorkoutEvent::ExerciseChanged(change) => {
                if self.live {
                    println!();
                }
                println!("✓ {} done", change.previous.exercise.title);
                println!("▶ {} ({}s)", change.next.exercise.title, change.next.duration);
            }
            WorkoutEvent::Paused => println!("\n⏸ Paused - 'p' + Enter to resume, 'q' + Enter to quit"),
            WorkoutEvent::Resumed => println!("▶ Resumed"),
            WorkoutEvent::Completed => println!("\n✓ Workout complete!"),
            WorkoutEvent::Abandoned => println!("\n✗ Workout abandoned"),
        }
    }
}

fn show_cue(cue: &AudioCue) {
    match cue {
        AudioCue::Halfway => println!("\n  ♪ Halfway there"),
        AudioCue::AboutToComplete => println!("\n  ♪ Almost done"),
        AudioCue::NextUp => println!("\n  ♪ Next up"),
        AudioCue::NextUpExercise { title, .. } => println!("\n  ♪ {}", title),
    }
}

/// Tick deadlines for the interactive driver.
///
/// Pausing keeps the part of the current interval not yet elapsed, so a
/// resumed run picks up mid-second instead of starting the second over.
struct TickClock {
    interval: Duration,
    next_tick: Instant,
    paused_with: Option<Duration>,
}

impl TickClock {
    fn new(interval: Duration, now: Instant) -> Self {
        Self {
            interval,
            next_tick: now + interval,
            paused_with: None,
        }
    }

    fn is_paused(&self) -> bool {
        self.paused_with.is_some()
    }

    /// How long to wait for input before checking the clock again
    fn wait(&self, now: Instant) -> Duration {
        if self.is_paused() {
            self.interval
        } else {
            self.next_tick.saturating_duration_since(now)
        }
    }

    fn is_due(&self, now: Instant) -> bool {
        !self.is_paused() && now >= self.next_tick
    }

    fn advance(&mut self) {
        self.next_tick += self.interval;
    }

    fn pause(&mut self, now: Instant) {
        if !self.is_paused() {
            self.paused_with = Some(self.next_tick.saturating_duration_since(now));
        }
    }

    fn resume(&mut self, now: Instant) {
        if let Some(left) = self.paused_with.take() {
            self.next_tick = now + left;
        }
    }
}

fn cmd_run(
    data_dir: &Path,
    workout: Option<String>,
    auto: bool,
    abandon_after: Option<u32>,
    config: &Config,
) -> Result<()> {
    let repository = open_repository(data_dir)?;
    let name = workout.unwrap_or_else(|| DEFAULT_WORKOUT_NAME.to_string());
    let plan = repository.workout(&name)?;

    println!("\n╭─────────────────────────────────────────╮");
    println!("│  {}", plan.title);
    println!("╰─────────────────────────────────────────╯");
    if let Some(ref description) = plan.description {
        println!("  {}", description);
    }
    println!();

    let tracker = open_tracker(data_dir, config)?;
    let mut runner = WorkoutRunner::new(tracker, config.engine.clone());
    let mut display = Display::new(config, !auto);

    display.show(runner.start(plan)?)?;

    let mut elapsed = 0u32;
    let should_abandon = |elapsed: u32| abandon_after.is_some_and(|limit| elapsed >= limit);

    if auto {
        while !runner.state().is_terminal() {
            if should_abandon(elapsed) {
                display.show(runner.abandon()?)?;
                break;
            }
            display.show(runner.tick()?)?;
            elapsed += 1;
        }
    } else {
        println!("'p' + Enter to pause/resume, 'q' + Enter to quit\n");
        let input = spawn_input_reader();
        let mut clock = TickClock::new(
            Duration::from_millis(config.engine.tick_millis),
            Instant::now(),
        );

        while !runner.state().is_terminal() {
            display.flush_due();
            if should_abandon(elapsed) {
                display.show(runner.abandon()?)?;
                break;
            }

            match input.recv_timeout(clock.wait(Instant::now())) {
                Ok(Input::TogglePause) => {
                    let events = runner.toggle_pause()?;
                    match runner.state() {
                        RunnerState::Paused => clock.pause(Instant::now()),
                        RunnerState::Running => clock.resume(Instant::now()),
                        _ => {}
                    }
                    display.show(events)?;
                }
                Ok(Input::Quit) => {
                    display.show(runner.abandon()?)?;
                    continue;
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    if clock.is_paused() {
                        tracing::warn!("Input closed while paused, abandoning workout");
                        display.show(runner.abandon()?)?;
                        continue;
                    }
                    tracing::trace!("Input closed, sleeping until next tick");
                    thread::sleep(clock.wait(Instant::now()));
                }
            }

            if clock.is_due(Instant::now()) {
                if runner.state() == RunnerState::Running {
                    elapsed += 1;
                }
                display.show(runner.tick()?)?;
                clock.advance();
            }
        }
    }

    if let Some(entry) = runner.tracker().history().last() {
        println!(
            "  Exercises done: {}{}",
            entry.exercises_done,
            entry
                .last_exercise
                .as_ref()
                .map(|e| format!(" (last: {})", e))
                .unwrap_or_default()
        );
    }

    Ok(())
}

// ============================================================================
// workouts / exercises
// ============================================================================

fn cmd_workouts(data_dir: &Path, action: WorkoutsAction) -> Result<()> {
    let mut repository = open_repository(data_dir)?;

    match action {
        WorkoutsAction::List => {
            let workouts = repository.workouts()?;
            if workouts.is_empty() {
                println!("No workouts found.");
            }
            for workout in workouts {
                println!(
                    "{:<20} {:<30} {:>3} exercises  {}",
                    workout.name,
                    workout.title,
                    workout.exercises.len(),
                    format_seconds(workout.total_duration())
                );
            }
        }
        WorkoutsAction::Show { name } => {
            let workout = repository.workout(&name)?;
            println!("{} ({})", workout.title, workout.name);
            if let Some(ref description) = workout.description {
                println!("  {}", description);
            }
            println!(
                "  Rest between exercises: {}s  Total: {}",
                workout.rest_between_exercise,
                format_seconds(workout.total_duration())
            );
            println!();
            for (index, plan) in workout.exercises.iter().enumerate() {
                println!(
                    "  {:>2}. {:<28} {:>4}s",
                    index, plan.exercise.title, plan.duration
                );
            }
        }
        WorkoutsAction::Delete { name } => {
            repository.delete_workout(&name)?;
            println!("✓ Deleted workout '{}'", name);
        }
    }

    Ok(())
}

fn cmd_exercises(data_dir: &Path) -> Result<()> {
    let repository = open_repository(data_dir)?;
    let mut exercises = repository.exercises()?;
    exercises.sort_by(|a, b| a.name.cmp(&b.name));

    for exercise in exercises {
        println!("{:<20} {}", exercise.name, exercise.title);
    }
    Ok(())
}

// ============================================================================
// build
// ============================================================================

struct BuildEdits {
    name: String,
    title: Option<String>,
    description: Option<String>,
    rest: Option<u32>,
    adds: Vec<String>,
    removes: Vec<String>,
    moves: Vec<String>,
}

/// Split `NAME:NUMBER`
fn parse_pair(raw: &str, what: &str) -> Result<(String, u32)> {
    let invalid = || Error::Validation(vec![format!("Expected {}, got '{}'", what, raw)]);
    let (name, number) = raw.rsplit_once(':').ok_or_else(invalid)?;
    let number = number.trim().parse::<u32>().map_err(|_| invalid())?;
    Ok((name.trim().to_string(), number))
}

/// First plan in the workout being built that wraps `name`
fn find_plan<R: WorkoutRepository>(builder: &WorkoutBuilder<R>, name: &str) -> Option<ExercisePlan> {
    builder
        .workout()?
        .exercises
        .iter()
        .find(|p| p.exercise.name == name)
        .cloned()
}

fn cmd_build(data_dir: &Path, edits: BuildEdits) -> Result<()> {
    let mut builder = WorkoutBuilder::new(open_repository(data_dir)?);

    match builder.start_building(Some(&edits.name)) {
        Ok(_) => {}
        Err(e) if e.is_not_found() => {
            builder.start_building(None)?;
            if let Some(workout) = builder.workout_mut() {
                workout.name = edits.name.clone();
                workout.title = edits.name.clone();
            }
        }
        Err(e) => return Err(e),
    }

    if let Some(workout) = builder.workout_mut() {
        if let Some(title) = edits.title {
            workout.title = title;
        }
        if let Some(description) = edits.description {
            workout.description = Some(description);
        }
        if let Some(rest) = edits.rest {
            workout.rest_between_exercise = rest;
        }
    }

    for name in &edits.removes {
        let removed = find_plan(&builder, name).is_some_and(|plan| builder.remove_exercise(&plan));
        if !removed {
            println!("  '{}' is not part of the workout, skipped", name);
        }
    }

    for raw in &edits.adds {
        let (name, duration) = parse_pair(raw, "EXERCISE:SECS")?;
        let exercise = builder.repository().exercise(&name)?;
        builder.add_exercise(ExercisePlan::new(exercise, duration)?);
    }

    for raw in &edits.moves {
        let (name, index) = parse_pair(raw, "EXERCISE:INDEX")?;
        let moved = find_plan(&builder, &name)
            .is_some_and(|plan| builder.move_exercise_to(&plan, index as usize));
        if !moved {
            println!("  Move of '{}' to {} ignored", name, index);
        }
    }

    let outcome = builder.save()?;
    let verb = match outcome {
        SaveOutcome::Created => "Created",
        SaveOutcome::Updated => "Updated",
    };
    if let Some(workout) = builder.workout() {
        println!(
            "✓ {} workout '{}' ({} exercises, {})",
            verb,
            workout.name,
            workout.exercises.len(),
            format_seconds(workout.total_duration())
        );
    }
    Ok(())
}

// ============================================================================
// history
// ============================================================================

fn cmd_history(data_dir: &Path, export: Option<PathBuf>, clear: bool, config: &Config) -> Result<()> {
    let mut tracker = open_tracker(data_dir, config)?;

    if clear {
        tracker.clear()?;
        println!("✓ History cleared");
        return Ok(());
    }

    if let Some(path) = export {
        let count = export_history_csv(tracker.history(), &path)?;
        println!("✓ Exported {} sessions to {}", count, path.display());
        return Ok(());
    }

    if tracker.history().is_empty() {
        println!("No workouts recorded yet.");
        return Ok(());
    }

    // Newest first for display
    for entry in tracker.history().iter().rev() {
        let started = entry.started_on.with_timezone(&chrono::Local);
        let status = match (entry.ended_on, entry.completed) {
            (None, _) => "in progress",
            (Some(_), true) => "completed",
            (Some(_), false) => "abandoned",
        };
        let took = entry
            .ended_on
            .map(|end| {
                let secs = (end - entry.started_on).num_seconds().max(0);
                format_seconds(u64::try_from(secs).unwrap_or(0))
            })
            .unwrap_or_else(|| "--:--:--".into());
        println!(
            "{}  {:<11} {}  {:>2} exercises  {}",
            started.format("%Y-%m-%d %H:%M"),
            status,
            took,
            entry.exercises_done,
            entry.last_exercise.as_deref().unwrap_or("-")
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_clock_keeps_partial_second_across_pause() {
        let start = Instant::now();
        let second = Duration::from_millis(1000);
        let mut clock = TickClock::new(second, start);

        assert_eq!(clock.wait(start), second);
        clock.pause(start + Duration::from_millis(400));
        assert!(clock.is_paused());
        assert!(!clock.is_due(start + Duration::from_secs(10)));

        let resumed = start + Duration::from_secs(10);
        clock.resume(resumed);
        assert_eq!(clock.wait(resumed), Duration::from_millis(600));
        assert!(!clock.is_due(resumed + Duration::from_millis(599)));
        assert!(clock.is_due(resumed + Duration::from_millis(600)));

        clock.advance();
        assert_eq!(clock.wait(resumed + Duration::from_millis(600)), second);
    }

    #[test]
    fn test_tick_clock_resume_without_pause_is_noop() {
        let start = Instant::now();
        let mut clock = TickClock::new(Duration::from_millis(1000), start);

        clock.resume(start + Duration::from_millis(300));
        assert!(clock.is_due(start + Duration::from_millis(1000)));
    }
}
