#![forbid(unsafe_code)]

//! Core domain model and playback logic for the wtimer workout timer.
//!
//! This crate provides:
//! - Domain types (range values, exercises, workouts)
//! - CSV import/export
//! - Countdown timer and playback state machine
//! - Persistence (workout store) and configuration

pub mod types;
pub mod error;
pub mod range;
pub mod config;
pub mod logging;
pub mod csv_import;
pub mod clock;
pub mod timer;
pub mod player;
pub mod store;

// Re-export commonly used types
pub use error::{Error, Result};
pub use range::{parse_range_value, RangeValue};
pub use types::*;
pub use config::Config;
pub use csv_import::{exercises_to_csv, parse_csv};
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use timer::{CountdownTimer, TimerEvent};
pub use player::{Phase, PhaseChange, PlaybackListener, PlaybackState, Trigger, WorkoutPlayer};
pub use store::WorkoutStore;
