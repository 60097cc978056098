//! Core domain types for the workout timer.
//!
//! This module defines:
//! - Exercises and the values derived from them for playback
//! - Workouts (ordered exercise lists with timestamps)

use crate::{Error, RangeValue, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Repetition text that marks an exercise as duration-driven
pub const TIMED_REPETITIONS: &str = "tempo";

// ============================================================================
// Exercise
// ============================================================================

/// A single exercise within a workout
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exercise {
    pub id: String,
    pub name: String,
    pub series: RangeValue,
    /// Free text: a count, a range, or "tempo" for timed sets
    pub repetitions: String,
    pub work_time: RangeValue,
    pub rest_between_series: RangeValue,
    pub rest_between_exercises: RangeValue,
}

/// Concrete values picked from an exercise's ranges for one playback run
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ExercisePlan {
    pub total_series: f64,
    pub work_time_secs: f64,
    pub rest_series_secs: f64,
    pub rest_exercise_secs: f64,
    pub is_timed: bool,
}

impl Exercise {
    /// Build an exercise from raw form fields.
    ///
    /// The name is trimmed and must not be empty. Empty series default to
    /// "1" and empty time fields to "0" before range parsing.
    pub fn from_fields(
        name: &str,
        series: &str,
        repetitions: &str,
        work_time: &str,
        rest_between_series: &str,
        rest_between_exercises: &str,
    ) -> Result<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::Validation("Exercise name must not be empty".into()));
        }

        Ok(Self::from_parts(
            name,
            series,
            repetitions,
            work_time,
            rest_between_series,
            rest_between_exercises,
        ))
    }

    /// Unvalidated construction shared by the form and the CSV importer
    pub(crate) fn from_parts(
        name: &str,
        series: &str,
        repetitions: &str,
        work_time: &str,
        rest_between_series: &str,
        rest_between_exercises: &str,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            series: RangeValue::parse(or_default(series, "1")),
            repetitions: repetitions.to_string(),
            work_time: RangeValue::parse(or_default(work_time, "0")),
            rest_between_series: RangeValue::parse(or_default(rest_between_series, "0")),
            rest_between_exercises: RangeValue::parse(or_default(rest_between_exercises, "0")),
        }
    }

    /// Timed exercises run a work countdown instead of waiting for the user
    pub fn is_timed(&self) -> bool {
        self.repetitions.to_lowercase() == TIMED_REPETITIONS && self.work_time.is_positive()
    }

    pub fn plan(&self) -> ExercisePlan {
        ExercisePlan {
            total_series: self.series.default_value(),
            work_time_secs: self.work_time.default_value(),
            rest_series_secs: self.rest_between_series.default_value(),
            rest_exercise_secs: self.rest_between_exercises.default_value(),
            is_timed: self.is_timed(),
        }
    }

    /// One-line description as shown in the exercise list
    pub fn summary(&self) -> String {
        let mut line = format!("{} serie × {} rep", self.series.raw, self.repetitions);
        if self.work_time.is_positive() {
            line.push_str(&format!(" • Lavoro: {}s", self.work_time.raw));
        }
        if self.rest_between_series.is_positive() {
            line.push_str(&format!(" • Recupero: {}s", self.rest_between_series.raw));
        }
        line
    }
}

fn or_default<'a>(value: &'a str, default: &'a str) -> &'a str {
    if value.is_empty() {
        default
    } else {
        value
    }
}

// ============================================================================
// Workout
// ============================================================================

/// A named, ordered list of exercises. Order is execution order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workout {
    pub id: String,
    pub name: String,
    pub exercises: Vec<Exercise>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Workout {
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            exercises: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Refresh `updated_at`; this is the "save" action
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn append_exercises(&mut self, exercises: impl IntoIterator<Item = Exercise>) {
        self.exercises.extend(exercises);
    }

    /// Remove an exercise by id, returning it if present
    pub fn remove_exercise(&mut self, id: &str) -> Option<Exercise> {
        let index = self.exercises.iter().position(|e| e.id == id)?;
        Some(self.exercises.remove(index))
    }

    /// Playback precondition: at least one exercise
    pub fn ensure_playable(&self) -> Result<()> {
        if self.exercises.is_empty() {
            return Err(Error::Validation(
                "Add at least one exercise before starting the workout".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_fields_applies_defaults() {
        let exercise = Exercise::from_fields("  Push-up ", "", "10", "", "", "").unwrap();
        assert_eq!(exercise.name, "Push-up");
        assert_eq!(exercise.series.raw, "1");
        assert_eq!(exercise.series.max, 1.0);
        assert_eq!(exercise.work_time.raw, "0");
        assert_eq!(exercise.rest_between_series.max, 0.0);
        assert_eq!(exercise.rest_between_exercises.max, 0.0);
        assert!(Uuid::parse_str(&exercise.id).is_ok());
    }

    #[test]
    fn test_from_fields_rejects_blank_name() {
        let result = Exercise::from_fields("   ", "3", "10", "0", "30", "60");
        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[test]
    fn test_is_timed_needs_tempo_and_work_time() {
        let timed = Exercise::from_fields("Plank", "2", "TEMPO", "30", "0", "0").unwrap();
        assert!(timed.is_timed());

        let no_time = Exercise::from_fields("Plank", "2", "tempo", "0", "0", "0").unwrap();
        assert!(!no_time.is_timed());

        let reps = Exercise::from_fields("Squat", "2", "10", "30", "0", "0").unwrap();
        assert!(!reps.is_timed());
    }

    #[test]
    fn test_plan_uses_upper_bounds() {
        let exercise = Exercise::from_fields("Row", "2-3", "8-12", "24-36", "60-90", "120").unwrap();
        let plan = exercise.plan();
        assert_eq!(plan.total_series, 3.0);
        assert_eq!(plan.work_time_secs, 36.0);
        assert_eq!(plan.rest_series_secs, 90.0);
        assert_eq!(plan.rest_exercise_secs, 120.0);
        assert!(!plan.is_timed);
    }

    #[test]
    fn test_summary() {
        let exercise = Exercise::from_fields("Row", "3", "8-12", "0", "60", "0").unwrap();
        assert_eq!(exercise.summary(), "3 serie × 8-12 rep • Recupero: 60s");

        let timed = Exercise::from_fields("Plank", "2", "tempo", "30", "0", "0").unwrap();
        assert_eq!(timed.summary(), "2 serie × tempo rep • Lavoro: 30s");
    }

    #[test]
    fn test_new_workout_timestamps() {
        let workout = Workout::new("Leg day");
        assert_eq!(workout.created_at, workout.updated_at);
        assert!(workout.exercises.is_empty());
    }

    #[test]
    fn test_touch_refreshes_updated_at() {
        let mut workout = Workout::new("Leg day");
        let before = workout.updated_at;
        workout.touch();
        assert!(workout.updated_at >= before);
        assert_eq!(workout.created_at, before);
    }

    #[test]
    fn test_remove_exercise() {
        let mut workout = Workout::new("Upper");
        let a = Exercise::from_fields("A", "1", "5", "0", "0", "0").unwrap();
        let b = Exercise::from_fields("B", "1", "5", "0", "0", "0").unwrap();
        let a_id = a.id.clone();
        workout.append_exercises([a, b]);

        let removed = workout.remove_exercise(&a_id).unwrap();
        assert_eq!(removed.name, "A");
        assert_eq!(workout.exercises.len(), 1);
        assert!(workout.remove_exercise("missing").is_none());
    }

    #[test]
    fn test_ensure_playable() {
        let mut workout = Workout::new("Empty");
        assert!(matches!(workout.ensure_playable(), Err(Error::Validation(_))));

        workout.append_exercises([Exercise::from_fields("A", "1", "5", "0", "0", "0").unwrap()]);
        assert!(workout.ensure_playable().is_ok());
    }

    #[test]
    fn test_serializes_camel_case() {
        let exercise = Exercise::from_fields("A", "1", "5", "10", "0", "0").unwrap();
        let json = serde_json::to_string(&exercise).unwrap();
        assert!(json.contains("\"workTime\""));
        assert!(json.contains("\"restBetweenSeries\""));
    }
}
