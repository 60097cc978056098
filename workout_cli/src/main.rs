mod console;

use clap::{Parser, Subcommand};
use console::{ConsoleListener, Timeline};
use std::io::{self, BufRead};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use workout_core::*;

#[derive(Parser)]
#[command(name = "wtimer")]
#[command(about = "Workout timer with series, rest and timed sets", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Show debug logs on stderr
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List saved workouts (default)
    List,

    /// Create an empty workout
    New {
        /// Workout name
        name: String,
    },

    /// Show the exercises of a workout
    Show {
        /// Workout id or name
        workout: String,
    },

    /// Add an exercise by hand
    AddExercise {
        /// Workout id or name
        workout: String,

        #[arg(long)]
        name: String,

        /// Number of series, e.g. 3 or 2-3
        #[arg(long, default_value = "")]
        series: String,

        /// Repetitions, e.g. 10, 8-12, or "tempo" for timed sets
        #[arg(long, default_value = "")]
        reps: String,

        /// Work time in seconds (timed sets)
        #[arg(long, default_value = "")]
        work: String,

        /// Rest between series in seconds
        #[arg(long, default_value = "")]
        rest_series: String,

        /// Rest before the next exercise in seconds
        #[arg(long, default_value = "")]
        rest_exercise: String,
    },

    /// Remove an exercise from a workout
    RemoveExercise {
        /// Workout id or name
        workout: String,

        /// Exercise id (see `show`)
        exercise_id: String,
    },

    /// Append exercises from a CSV file
    Import {
        /// Workout id or name
        workout: String,

        /// CSV file with Italian column headers
        file: PathBuf,
    },

    /// Write a workout's exercises as CSV
    Export {
        /// Workout id or name
        workout: String,

        /// Output file (stdout if omitted)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Delete a workout
    Delete {
        /// Workout id or name
        workout: String,
    },

    /// Run a workout with the interactive timer
    Play {
        /// Workout id or name
        workout: String,

        /// Answer every "done" prompt automatically (for scripted runs)
        #[arg(long)]
        auto_done: bool,
    },

    /// Print the phase sequence of a workout without waiting
    Preview {
        /// Workout id or name
        workout: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    workout_core::logging::init_for_cli(cli.verbose);

    let config = Config::load()?;
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());

    match cli.command.unwrap_or(Commands::List) {
        Commands::List => cmd_list(&data_dir),
        Commands::New { name } => cmd_new(&data_dir, &name),
        Commands::Show { workout } => cmd_show(&data_dir, &workout),
        Commands::AddExercise {
            workout,
            name,
            series,
            reps,
            work,
            rest_series,
            rest_exercise,
        } => {
            let exercise =
                Exercise::from_fields(&name, &series, &reps, &work, &rest_series, &rest_exercise)?;
            cmd_add_exercise(&data_dir, &workout, exercise)
        }
        Commands::RemoveExercise {
            workout,
            exercise_id,
        } => cmd_remove_exercise(&data_dir, &workout, &exercise_id),
        Commands::Import { workout, file } => cmd_import(&data_dir, &workout, &file),
        Commands::Export { workout, output } => cmd_export(&data_dir, &workout, output.as_deref()),
        Commands::Delete { workout } => cmd_delete(&data_dir, &workout),
        Commands::Play { workout, auto_done } => cmd_play(&data_dir, &workout, auto_done, &config),
        Commands::Preview { workout } => cmd_preview(&data_dir, &workout, &config),
    }
}

fn cmd_list(data_dir: &Path) -> Result<()> {
    let store = WorkoutStore::open(data_dir)?;

    if store.workouts().is_empty() {
        println!("No workouts yet. Create one with `wtimer new <name>`.");
        return Ok(());
    }

    for workout in store.workouts() {
        println!(
            "{}  ({} esercizi, updated {})",
            workout.name,
            workout.exercises.len(),
            workout
                .updated_at
                .with_timezone(&chrono::Local)
                .format("%Y-%m-%d %H:%M")
        );
        println!("  id: {}", workout.id);
    }
    Ok(())
}

fn cmd_new(data_dir: &Path, name: &str) -> Result<()> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::Validation("Workout name must not be empty".into()));
    }

    let mut store = WorkoutStore::open_exclusive(data_dir)?;
    let workout = Workout::new(name);
    let id = workout.id.clone();
    store.upsert(workout);
    store.save()?;

    println!("✓ Created workout {}", name);
    println!("  id: {}", id);
    Ok(())
}

fn cmd_show(data_dir: &Path, key: &str) -> Result<()> {
    let store = WorkoutStore::open(data_dir)?;
    let workout = store.require(key)?;

    println!("{}", workout.name);
    if workout.exercises.is_empty() {
        println!("  Nessun esercizio. Aggiungi manualmente o importa da CSV.");
        return Ok(());
    }

    for (index, exercise) in workout.exercises.iter().enumerate() {
        println!("  {}. {}", index + 1, exercise.name);
        println!("     {}", exercise.summary());
        println!("     id: {}", exercise.id);
    }
    Ok(())
}

fn cmd_add_exercise(data_dir: &Path, key: &str, exercise: Exercise) -> Result<()> {
    let mut store = WorkoutStore::open_exclusive(data_dir)?;
    let name = exercise.name.clone();
    let workout = store.update(key, |w| {
        w.append_exercises([exercise]);
        Ok(())
    })?;

    println!("✓ Added {} to {}", name, workout.name);
    Ok(())
}

fn cmd_remove_exercise(data_dir: &Path, key: &str, exercise_id: &str) -> Result<()> {
    let mut store = WorkoutStore::open_exclusive(data_dir)?;
    let workout = store.update(key, |w| {
        w.remove_exercise(exercise_id)
            .map(|_| ())
            .ok_or_else(|| Error::Validation(format!("No exercise with id {}", exercise_id)))
    })?;

    println!("✓ Removed exercise from {}", workout.name);
    Ok(())
}

fn cmd_import(data_dir: &Path, key: &str, file: &Path) -> Result<()> {
    let mut store = WorkoutStore::open_exclusive(data_dir)?;
    let mut imported = 0;
    let workout = store.update(key, |w| {
        // Parse fully before touching the workout
        let exercises = workout_core::csv_import::import_file(file)?;
        imported = exercises.len();
        w.append_exercises(exercises);
        Ok(())
    })?;

    println!("✓ Imported {} exercises into {}", imported, workout.name);
    Ok(())
}

fn cmd_export(data_dir: &Path, key: &str, output: Option<&Path>) -> Result<()> {
    let store = WorkoutStore::open(data_dir)?;
    let workout = store.require(key)?;

    match output {
        Some(path) => {
            workout_core::csv_import::export_file(&workout.exercises, path)?;
            println!("✓ Exported {} exercises to {}", workout.exercises.len(), path.display());
        }
        None => println!("{}", exercises_to_csv(&workout.exercises)?),
    }
    Ok(())
}

fn cmd_delete(data_dir: &Path, key: &str) -> Result<()> {
    let mut store = WorkoutStore::open_exclusive(data_dir)?;
    let id = store.require(key)?.id.clone();
    let removed = store.remove(&id);
    store.save()?;

    if let Some(workout) = removed {
        println!("✓ Deleted {}", workout.name);
    }
    Ok(())
}

fn cmd_play(data_dir: &Path, key: &str, auto_done: bool, config: &Config) -> Result<()> {
    let store = WorkoutStore::open(data_dir)?;
    let workout = store.require(key)?.clone();

    let listener = ConsoleListener::new(config.cues.clone());
    let mut player =
        WorkoutPlayer::new(workout, listener)?.with_grace_period(config.playback.grace_period());

    let input = if auto_done {
        None
    } else {
        println!("Enter = fatto/inizia, s = salta, p = pausa/riprendi, q = esci");
        Some(spawn_input_reader())
    };

    let tick = config.playback.tick_interval();
    player.start();

    while !player.is_finished() {
        if auto_done && player.phase() == Phase::Performing {
            player.done();
            continue;
        }

        match &input {
            Some(rx) => match rx.recv_timeout(tick) {
                Ok(line) => handle_input(&mut player, line.trim()),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => player.exit(),
            },
            None => thread::sleep(tick),
        }

        player.poll();
    }

    if player.listener().has_exited() {
        println!("\nWorkout interrotto.");
    } else if player.listener().is_completed() {
        println!("{}", player.workout().name);
    }
    Ok(())
}

fn handle_input<C: Clock>(player: &mut WorkoutPlayer<ConsoleListener, C>, input: &str) {
    match input.to_lowercase().as_str() {
        "" => player.done(),
        "s" => player.skip(),
        "p" => {
            if player.timer().is_paused() {
                player.resume();
                println!("  ▶ Riprendi");
            } else if player.timer().is_running() {
                player.pause();
                println!("  ⏸ Pausa");
            }
        }
        "q" => player.exit(),
        other => println!("  Comando sconosciuto: {:?}", other),
    }
}

/// Read stdin lines on a helper thread; the player stays on the main thread
fn spawn_input_reader() -> Receiver<String> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else {
                break;
            };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

fn cmd_preview(data_dir: &Path, key: &str, config: &Config) -> Result<()> {
    let store = WorkoutStore::open(data_dir)?;
    let workout = store.require(key)?.clone();
    let name = workout.name.clone();

    let clock = ManualClock::new();
    let grace = config.playback.grace_period();
    let mut player = WorkoutPlayer::with_clock(workout, Timeline::default(), clock.clone())?
        .with_grace_period(grace);

    player.start();
    while !player.is_finished() {
        if player.phase() == Phase::Performing {
            player.done();
            continue;
        }
        clock.advance(player.timer().remaining());
        player.poll();
        clock.advance(grace);
        player.poll();
    }

    let timeline = player.into_listener();
    let mut timed_secs = 0.0;
    let mut paced_sets = 0;

    println!("{}", name);
    for step in &timeline.steps {
        match step.phase {
            Phase::Performing => {
                println!(
                    "  {}/{} {}  serie {}/{}",
                    step.exercise_index + 1,
                    step.exercise_count,
                    step.exercise_name,
                    step.current_series,
                    step.total_series
                );
                if !step.is_timed {
                    println!("       {} rep", step.repetitions);
                    paced_sets += 1;
                }
            }
            Phase::WorkTimer | Phase::RestBetweenSeries | Phase::RestBetweenExercises => {
                let secs = step.countdown_secs.unwrap_or(0.0);
                timed_secs += secs;
                println!("       {} {}s", step.phase.label(), secs);
            }
            Phase::Complete => println!("  {}", step.phase.label()),
        }
    }

    println!();
    println!(
        "Timed total: {}s (~{} min) plus {} self-paced sets",
        timed_secs,
        (timed_secs / 60.0).ceil(),
        paced_sets
    );
    Ok(())
}
