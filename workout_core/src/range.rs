//! Range values such as "8-12", "30" or "tempo".
//!
//! Every numeric field of an exercise is stored as a [`RangeValue`]: the
//! parsed bounds plus the text the user typed. Parsing never fails; text that
//! is not numeric becomes the zero range, which downstream code reads as
//! "no count / no duration".

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

static RANGE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d+(?:\.\d+)?)\s*-\s*(\d+(?:\.\d+)?)$").expect("range pattern is valid")
});
static NUMBER_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+(?:\.\d+)?$").expect("number pattern is valid"));

/// A parsed numeric interval with the original text preserved
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RangeValue {
    pub min: f64,
    pub max: f64,
    pub raw: String,
}

impl RangeValue {
    /// Parse a field value.
    ///
    /// `"8-12"` gives `min = 8, max = 12`; `"30"` gives `min = max = 30`;
    /// anything else (including `""` and `"tempo"`) gives the zero range.
    /// Inverted ranges like `"12-8"` are kept as typed.
    pub fn parse(text: &str) -> Self {
        let trimmed = text.trim();

        if let Some(caps) = RANGE_REGEX.captures(trimmed) {
            let min = caps[1].parse::<f64>().unwrap_or(0.0);
            let max = caps[2].parse::<f64>().unwrap_or(0.0);
            return Self::new(min, max, trimmed);
        }

        if NUMBER_REGEX.is_match(trimmed) {
            if let Ok(n) = trimmed.parse::<f64>() {
                return Self::new(n, n, trimmed);
            }
        }

        Self::new(0.0, 0.0, trimmed)
    }

    fn new(min: f64, max: f64, raw: &str) -> Self {
        Self {
            min,
            max,
            raw: raw.to_string(),
        }
    }

    /// The quantity enacted during playback (the upper bound)
    pub fn default_value(&self) -> f64 {
        self.max
    }

    pub fn is_positive(&self) -> bool {
        self.max > 0.0
    }

    /// Display form recomputed from the bounds ("30" or "8-12")
    pub fn format(&self) -> String {
        if self.min == self.max {
            self.min.to_string()
        } else {
            format!("{}-{}", self.min, self.max)
        }
    }
}

impl Default for RangeValue {
    fn default() -> Self {
        Self::new(0.0, 0.0, "")
    }
}

impl fmt::Display for RangeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Free-function form of [`RangeValue::parse`]
pub fn parse_range_value(text: &str) -> RangeValue {
    RangeValue::parse(text)
}
