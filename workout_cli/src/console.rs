//! Terminal rendering of playback events.

use std::io::{self, Write};
use workout_core::config::CueConfig;
use workout_core::{Phase, PhaseChange, PlaybackListener};

/// Prints phases and countdowns, rings the bell on natural completion
pub struct ConsoleListener {
    cues: CueConfig,
    last_tick: Option<u64>,
    completed: bool,
    exited: bool,
}

impl ConsoleListener {
    pub fn new(cues: CueConfig) -> Self {
        Self {
            cues,
            last_tick: None,
            completed: false,
            exited: false,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn has_exited(&self) -> bool {
        self.exited
    }
}

impl PlaybackListener for ConsoleListener {
    fn phase_changed(&mut self, change: &PhaseChange) {
        self.last_tick = None;

        match change.phase {
            Phase::Performing => {
                println!();
                println!(
                    "[Esercizio {}/{}] {}",
                    change.exercise_index + 1,
                    change.exercise_count,
                    change.exercise_name
                );
                println!("  Serie {}/{}", change.current_series, change.total_series);
                if change.is_timed {
                    println!("  Enter = INIZIA");
                } else {
                    println!("  RIPETIZIONI: {}", change.repetitions);
                    println!("  Enter = FATTO");
                }
            }
            Phase::WorkTimer | Phase::RestBetweenSeries | Phase::RestBetweenExercises => {
                println!();
                println!(
                    "  {} {}s  (p = pausa/riprendi, s = salta, q = esci)",
                    change.phase.label(),
                    change.countdown_secs.unwrap_or(0.0)
                );
            }
            Phase::Complete => {
                println!();
                println!("🏆 Workout Completato!");
            }
        }
    }

    fn tick(&mut self, remaining_secs: u64) {
        if self.last_tick == Some(remaining_secs) {
            return;
        }
        self.last_tick = Some(remaining_secs);
        print!("\r  {:>4} secondi ", remaining_secs);
        let _ = io::stdout().flush();
        if remaining_secs == 0 {
            println!();
        }
    }

    fn timer_finished(&mut self) {
        if self.cues.bell {
            print!("\x07");
            let _ = io::stdout().flush();
        }
        // No vibration motor on a terminal
        tracing::debug!("Haptic pattern {:?} not supported here", self.cues.vibration_pattern_ms);
    }

    fn completed(&mut self) {
        self.completed = true;
    }

    fn exited(&mut self) {
        self.exited = true;
    }
}

/// Records the phase sequence without printing, for previews
#[derive(Default)]
pub struct Timeline {
    pub steps: Vec<PhaseChange>,
}

impl PlaybackListener for Timeline {
    fn phase_changed(&mut self, change: &PhaseChange) {
        self.steps.push(change.clone());
    }
}
