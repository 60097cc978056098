//! Workout playback state machine.
//!
//! A [`WorkoutPlayer`] walks a workout from the first series of the first
//! exercise to completion:
//!
//! ```text
//! performing ──done──> work-timer ──(timer)──┐
//!     │                                      │
//!     └──done (rep-driven)───────────────────┴──> advance decision
//!
//! advance decision:
//!   more series?    rest > 0 ? rest-between-series : performing (series + 1)
//!   next exercise?  rest > 0 ? rest-between-exercises : performing (next, series 1)
//!   otherwise       complete
//! ```
//!
//! User actions and timer completion all go through one transition function
//! keyed on [`Trigger`]. Natural completion of a countdown notifies the
//! listener's cue and advances after a short grace period; skipping advances
//! at once with no cue.

use crate::clock::{Clock, MonotonicClock};
use crate::timer::{CountdownTimer, TimerEvent};
use crate::{Exercise, ExercisePlan, Result, Workout};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};

/// Delay between a countdown reaching zero and the automatic transition
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_millis(500);

/// Playback phase
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Phase {
    Performing,
    WorkTimer,
    RestBetweenSeries,
    RestBetweenExercises,
    Complete,
}

impl Phase {
    /// Phases that run a countdown
    pub fn is_timed(self) -> bool {
        matches!(
            self,
            Phase::WorkTimer | Phase::RestBetweenSeries | Phase::RestBetweenExercises
        )
    }

    /// Label shown to the user
    pub fn label(self) -> &'static str {
        match self {
            Phase::Performing => "ESERCIZIO",
            Phase::WorkTimer => "LAVORO",
            Phase::RestBetweenSeries => "RECUPERO SERIE",
            Phase::RestBetweenExercises => "RECUPERO ESERCIZIO",
            Phase::Complete => "COMPLETATO",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Performing => "performing",
            Phase::WorkTimer => "work-timer",
            Phase::RestBetweenSeries => "rest-between-series",
            Phase::RestBetweenExercises => "rest-between-exercises",
            Phase::Complete => "complete",
        };
        f.write_str(name)
    }
}

/// Events that drive the transition table
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Trigger {
    UserDone,
    TimerNaturalComplete,
    UserSkip,
}

/// Ephemeral session position
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlaybackState {
    /// 0-based index into the workout's exercises
    pub exercise_index: usize,
    /// 1-based series counter
    pub current_series: u32,
    pub phase: Phase,
}

/// What the presentation layer needs to render a new phase
#[derive(Clone, Debug, PartialEq)]
pub struct PhaseChange {
    pub phase: Phase,
    pub exercise_index: usize,
    pub exercise_count: usize,
    pub exercise_name: String,
    pub repetitions: String,
    pub current_series: u32,
    pub total_series: f64,
    pub is_timed: bool,
    /// Countdown length for timer phases
    pub countdown_secs: Option<f64>,
}

/// Presentation, navigation and cue collaborator.
///
/// Every method has a no-op default.
pub trait PlaybackListener {
    fn phase_changed(&mut self, _change: &PhaseChange) {}

    /// Whole seconds remaining on the active countdown
    fn tick(&mut self, _remaining_secs: u64) {}

    /// A countdown reached zero on its own (tone and vibration cue)
    fn timer_finished(&mut self) {}

    /// The workout is finished. Called once.
    fn completed(&mut self) {}

    /// The user left playback before the end
    fn exited(&mut self) {}
}

impl PlaybackListener for () {}

/// Drives one playback session over an owned workout snapshot
pub struct WorkoutPlayer<L: PlaybackListener, C: Clock = MonotonicClock> {
    workout: Workout,
    state: PlaybackState,
    plan: ExercisePlan,
    timer: CountdownTimer<C>,
    grace_period: Duration,
    pending_advance: Option<Instant>,
    listener: L,
    started: bool,
    completion_signalled: bool,
    exited: bool,
}

impl<L: PlaybackListener> WorkoutPlayer<L, MonotonicClock> {
    pub fn new(workout: Workout, listener: L) -> Result<Self> {
        Self::with_clock(workout, listener, MonotonicClock)
    }
}

impl<L: PlaybackListener, C: Clock> WorkoutPlayer<L, C> {
    /// Create a player. Fails with a validation error for an empty workout.
    pub fn with_clock(workout: Workout, listener: L, clock: C) -> Result<Self> {
        workout.ensure_playable()?;
        let plan = workout.exercises[0].plan();

        Ok(Self {
            workout,
            state: PlaybackState {
                exercise_index: 0,
                current_series: 1,
                phase: Phase::Performing,
            },
            plan,
            timer: CountdownTimer::with_clock(clock),
            grace_period: DEFAULT_GRACE_PERIOD,
            pending_advance: None,
            listener,
            started: false,
            completion_signalled: false,
            exited: false,
        })
    }

    pub fn with_grace_period(mut self, grace_period: Duration) -> Self {
        self.grace_period = grace_period;
        self
    }

    /// Announce the initial phase to the listener
    pub fn start(&mut self) {
        if self.started {
            return;
        }
        self.started = true;
        tracing::info!(
            "Starting workout {:?} ({} exercises)",
            self.workout.name,
            self.workout.exercises.len()
        );
        self.announce();
    }

    /// The user finished a set, or asked to start a timed set
    pub fn done(&mut self) {
        self.apply(Trigger::UserDone);
    }

    /// The user skipped the active countdown
    pub fn skip(&mut self) {
        self.apply(Trigger::UserSkip);
    }

    pub fn pause(&mut self) {
        if self.is_finished() {
            return;
        }
        self.timer.pause();
    }

    pub fn resume(&mut self) {
        if self.is_finished() {
            return;
        }
        self.timer.resume();
    }

    /// Leave playback early. Stops the timer and notifies the listener.
    pub fn exit(&mut self) {
        if self.is_finished() {
            return;
        }
        self.timer.stop();
        self.pending_advance = None;
        self.exited = true;
        tracing::info!(
            "Exited workout {:?} at exercise {} series {}",
            self.workout.name,
            self.state.exercise_index + 1,
            self.state.current_series
        );
        self.listener.exited();
    }

    /// Periodic check: advances the countdown and fires due transitions
    pub fn poll(&mut self) {
        if self.is_finished() {
            return;
        }

        if let Some(deadline) = self.pending_advance {
            if self.timer.clock().now() >= deadline {
                self.pending_advance = None;
                self.apply(Trigger::TimerNaturalComplete);
            }
            return;
        }

        match self.timer.poll() {
            Some(TimerEvent::Tick(remaining)) => self.listener.tick(remaining),
            Some(TimerEvent::Completed) => {
                self.listener.tick(0);
                self.listener.timer_finished();
                if self.grace_period.is_zero() {
                    self.apply(Trigger::TimerNaturalComplete);
                } else {
                    self.pending_advance = Some(self.timer.clock().now() + self.grace_period);
                }
            }
            None => {}
        }
    }

    /// The transition table
    fn apply(&mut self, trigger: Trigger) {
        if self.is_finished() {
            tracing::debug!("Ignoring {:?} after playback ended", trigger);
            return;
        }

        match (self.state.phase, trigger) {
            (Phase::Performing, Trigger::UserDone) => {
                if self.plan.is_timed {
                    self.begin_countdown(Phase::WorkTimer, self.plan.work_time_secs);
                } else {
                    self.advance_after_set();
                }
            }
            (Phase::WorkTimer, Trigger::TimerNaturalComplete | Trigger::UserSkip) => {
                self.end_countdown(trigger);
                self.advance_after_set();
            }
            (Phase::RestBetweenSeries, Trigger::TimerNaturalComplete | Trigger::UserSkip) => {
                self.end_countdown(trigger);
                self.state.current_series += 1;
                self.enter(Phase::Performing);
            }
            (Phase::RestBetweenExercises, Trigger::TimerNaturalComplete | Trigger::UserSkip) => {
                self.end_countdown(trigger);
                if self.has_next_exercise() {
                    self.next_exercise();
                } else {
                    self.complete();
                }
            }
            (phase, trigger) => {
                tracing::debug!("Ignoring {:?} during {}", trigger, phase);
            }
        }
    }

    /// Decide what follows a finished set
    fn advance_after_set(&mut self) {
        if f64::from(self.state.current_series) < self.plan.total_series {
            if self.plan.rest_series_secs > 0.0 {
                self.begin_countdown(Phase::RestBetweenSeries, self.plan.rest_series_secs);
            } else {
                self.state.current_series += 1;
                self.enter(Phase::Performing);
            }
        } else if self.has_next_exercise() {
            if self.plan.rest_exercise_secs > 0.0 {
                self.begin_countdown(Phase::RestBetweenExercises, self.plan.rest_exercise_secs);
            } else {
                self.next_exercise();
            }
        } else {
            self.complete();
        }
    }

    fn has_next_exercise(&self) -> bool {
        self.state.exercise_index + 1 < self.workout.exercises.len()
    }

    fn next_exercise(&mut self) {
        self.state.exercise_index += 1;
        self.state.current_series = 1;
        self.plan = self.current_exercise().plan();
        self.enter(Phase::Performing);
    }

    fn begin_countdown(&mut self, phase: Phase, secs: f64) {
        self.pending_advance = None;
        self.timer.start(secs_to_duration(secs));
        self.enter(phase);
    }

    fn end_countdown(&mut self, trigger: Trigger) {
        self.pending_advance = None;
        if trigger == Trigger::UserSkip {
            self.timer.skip();
        }
    }

    fn complete(&mut self) {
        self.timer.stop();
        self.pending_advance = None;
        self.enter(Phase::Complete);

        if !self.completion_signalled {
            self.completion_signalled = true;
            tracing::info!("Workout {:?} complete", self.workout.name);
            self.listener.completed();
        }
    }

    fn enter(&mut self, phase: Phase) {
        self.state.phase = phase;
        self.announce();
    }

    fn announce(&mut self) {
        let change = self.phase_change();
        tracing::info!(
            "Phase {} (exercise {}/{}, series {})",
            change.phase,
            change.exercise_index + 1,
            change.exercise_count,
            change.current_series
        );
        self.listener.phase_changed(&change);
    }

    /// Snapshot of the current phase for rendering
    pub fn phase_change(&self) -> PhaseChange {
        let exercise = self.current_exercise();
        let countdown_secs = match self.state.phase {
            Phase::WorkTimer => Some(self.plan.work_time_secs),
            Phase::RestBetweenSeries => Some(self.plan.rest_series_secs),
            Phase::RestBetweenExercises => Some(self.plan.rest_exercise_secs),
            Phase::Performing | Phase::Complete => None,
        };

        PhaseChange {
            phase: self.state.phase,
            exercise_index: self.state.exercise_index,
            exercise_count: self.workout.exercises.len(),
            exercise_name: exercise.name.clone(),
            repetitions: exercise.repetitions.clone(),
            current_series: self.state.current_series,
            total_series: self.plan.total_series,
            is_timed: self.plan.is_timed,
            countdown_secs,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn plan(&self) -> &ExercisePlan {
        &self.plan
    }

    pub fn current_exercise(&self) -> &Exercise {
        &self.workout.exercises[self.state.exercise_index]
    }

    pub fn workout(&self) -> &Workout {
        &self.workout
    }

    pub fn timer(&self) -> &CountdownTimer<C> {
        &self.timer
    }

    /// True while a natural completion is waiting out the grace period
    pub fn is_advance_pending(&self) -> bool {
        self.pending_advance.is_some()
    }

    pub fn is_complete(&self) -> bool {
        self.state.phase == Phase::Complete
    }

    pub fn is_exited(&self) -> bool {
        self.exited
    }

    /// Complete or exited; no further transitions happen
    pub fn is_finished(&self) -> bool {
        self.is_complete() || self.exited
    }

    pub fn listener(&self) -> &L {
        &self.listener
    }

    pub fn listener_mut(&mut self) -> &mut L {
        &mut self.listener
    }

    pub fn into_listener(self) -> L {
        self.listener
    }
}

/// Longest countdown the player will run (about 136 years)
pub const MAX_COUNTDOWN: Duration = Duration::from_secs(u32::MAX as u64);

fn secs_to_duration(secs: f64) -> Duration {
    Duration::try_from_secs_f64(secs).map_or(MAX_COUNTDOWN, |d| d.min(MAX_COUNTDOWN))
}
