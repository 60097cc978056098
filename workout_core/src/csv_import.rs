//! CSV import and export of exercise lists.
//!
//! The file format uses fixed Italian column headers, resolved by name so
//! column order does not matter:
//!
//! ```text
//! Esercizio,Serie,Ripetizioni,Tempo Lavoro (s),Recupero Serie (s),Recupero Esercizio (s)
//! Push-up,3,10-12,0,60,90
//! Plank,2,tempo,30,30,0
//! ```
//!
//! Imports are all-or-nothing: either every row becomes an [`Exercise`] or
//! an error is returned and nothing is produced.

use crate::{Error, Exercise, Result};
use std::path::Path;

pub const HEADER_EXERCISE: &str = "Esercizio";
pub const HEADER_SERIES: &str = "Serie";
pub const HEADER_REPETITIONS: &str = "Ripetizioni";
pub const HEADER_WORK_TIME: &str = "Tempo Lavoro (s)";
pub const HEADER_REST_SERIES: &str = "Recupero Serie (s)";
pub const HEADER_REST_EXERCISE: &str = "Recupero Esercizio (s)";

const HEADERS: [&str; 6] = [
    HEADER_EXERCISE,
    HEADER_SERIES,
    HEADER_REPETITIONS,
    HEADER_WORK_TIME,
    HEADER_REST_SERIES,
    HEADER_REST_EXERCISE,
];

/// Column positions resolved from the header row
#[derive(Debug, Default)]
struct ColumnMap {
    exercise: Option<usize>,
    series: Option<usize>,
    repetitions: Option<usize>,
    work_time: Option<usize>,
    rest_series: Option<usize>,
    rest_exercise: Option<usize>,
}

impl ColumnMap {
    fn from_headers(headers: &[String]) -> Self {
        let mut map = Self::default();
        for (index, header) in headers.iter().enumerate() {
            let slot = match header.trim() {
                HEADER_EXERCISE => &mut map.exercise,
                HEADER_SERIES => &mut map.series,
                HEADER_REPETITIONS => &mut map.repetitions,
                HEADER_WORK_TIME => &mut map.work_time,
                HEADER_REST_SERIES => &mut map.rest_series,
                HEADER_REST_EXERCISE => &mut map.rest_exercise,
                other => {
                    tracing::debug!("Ignoring unrecognized CSV column {:?}", other);
                    continue;
                }
            };
            *slot = Some(index);
        }
        map
    }

    fn is_empty(&self) -> bool {
        self.exercise.is_none()
            && self.series.is_none()
            && self.repetitions.is_none()
            && self.work_time.is_none()
            && self.rest_series.is_none()
            && self.rest_exercise.is_none()
    }
}

fn field(values: &[String], column: Option<usize>) -> &str {
    column
        .and_then(|i| values.get(i))
        .map(String::as_str)
        .unwrap_or("")
}

/// Parse CSV content into exercises, each with a fresh id.
///
/// Fails with [`Error::Format`] when there is no header or no data line, or
/// when the header names none of the known columns. Blank data lines are
/// skipped.
pub fn parse_csv(content: &str) -> Result<Vec<Exercise>> {
    let lines: Vec<&str> = content.trim().lines().collect();

    if lines.len() < 2 {
        return Err(Error::Format(
            "CSV file must have at least a header row and one data row".into(),
        ));
    }

    let columns = ColumnMap::from_headers(&split_line(lines[0]));
    if columns.is_empty() {
        return Err(Error::Format(format!(
            "CSV header has none of the expected columns: {}",
            HEADERS.join(", ")
        )));
    }

    let exercises: Vec<Exercise> = lines[1..]
        .iter()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .map(|line| {
            let values = split_line(line);
            Exercise::from_parts(
                field(&values, columns.exercise),
                field(&values, columns.series),
                field(&values, columns.repetitions),
                field(&values, columns.work_time),
                field(&values, columns.rest_series),
                field(&values, columns.rest_exercise),
            )
        })
        .collect();

    tracing::info!("Parsed {} exercises from CSV", exercises.len());
    Ok(exercises)
}

/// Read and parse a CSV file
pub fn import_file(path: &Path) -> Result<Vec<Exercise>> {
    let content = std::fs::read_to_string(path)?;
    parse_csv(&content)
}

/// Split one line on commas outside of double quotes.
///
/// A `"` toggles quoting and is dropped; every field is trimmed.
fn split_line(line: &str) -> Vec<String> {
    let mut values = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for c in line.chars() {
        match c {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                values.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(c),
        }
    }

    values.push(current.trim().to_string());
    values
}

/// Serialize exercises back to the import format.
///
/// Rows use each field's original text. Fields are written unquoted, so a
/// value containing a comma does not survive a round trip.
pub fn exercises_to_csv(exercises: &[Exercise]) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .quote_style(csv::QuoteStyle::Never)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(HEADERS)?;
    for exercise in exercises {
        writer.write_record([
            exercise.name.as_str(),
            exercise.series.raw.as_str(),
            exercise.repetitions.as_str(),
            exercise.work_time.raw.as_str(),
            exercise.rest_between_series.raw.as_str(),
            exercise.rest_between_exercises.raw.as_str(),
        ])?;
    }
    writer.flush()?;

    let bytes = writer
        .into_inner()
        .map_err(|e| Error::Other(format!("Failed to finish CSV output: {}", e)))?;
    let mut output =
        String::from_utf8(bytes).map_err(|e| Error::Other(format!("CSV output is not UTF-8: {}", e)))?;

    // Rows are newline-joined, without a trailing terminator
    if output.ends_with('\n') {
        output.pop();
    }
    Ok(output)
}

/// Write exercises to a CSV file
pub fn export_file(exercises: &[Exercise], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, exercises_to_csv(exercises)?)?;
    tracing::info!("Exported {} exercises to {:?}", exercises.len(), path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str =
        "Esercizio,Serie,Ripetizioni,Tempo Lavoro (s),Recupero Serie (s),Recupero Esercizio (s)";

    #[test]
    fn test_parse_basic_rows() {
        let content = format!("{}\nPush-up,3,10-12,0,60,90\nPlank,2,tempo,30,30,0\n", HEADER);
        let exercises = parse_csv(&content).unwrap();

        assert_eq!(exercises.len(), 2);
        assert_eq!(exercises[0].name, "Push-up");
        assert_eq!(exercises[0].series.max, 3.0);
        assert_eq!(exercises[0].repetitions, "10-12");
        assert_eq!(exercises[0].rest_between_series.max, 60.0);
        assert_eq!(exercises[0].rest_between_exercises.max, 90.0);
        assert!(exercises[1].is_timed());
        assert_ne!(exercises[0].id, exercises[1].id);
    }

    #[test]
    fn test_crlf_and_blank_lines() {
        let content = format!("{}\r\nSquat,4,8,0,90,120\r\n\r\n   \r\nLunge,3,10,0,60,0\r\n", HEADER);
        let exercises = parse_csv(&content).unwrap();
        assert_eq!(exercises.len(), 2);
        assert_eq!(exercises[0].name, "Squat");
        assert_eq!(exercises[1].rest_between_exercises.raw, "0");
    }

    #[test]
    fn test_headers_resolved_by_name() {
        let content = "Serie, Esercizio , Note,Ripetizioni\n3,Row,heavy,8-10\n";
        let exercises = parse_csv(content).unwrap();

        assert_eq!(exercises.len(), 1);
        assert_eq!(exercises[0].name, "Row");
        assert_eq!(exercises[0].series.raw, "3");
        assert_eq!(exercises[0].repetitions, "8-10");
        // Missing columns fall back to defaults
        assert_eq!(exercises[0].work_time.raw, "0");
        assert_eq!(exercises[0].rest_between_series.raw, "0");
    }

    #[test]
    fn test_missing_series_defaults_to_one() {
        let content = format!("{}\nDips,,12,,,\n", HEADER);
        let exercises = parse_csv(&content).unwrap();
        assert_eq!(exercises[0].series.raw, "1");
        assert_eq!(exercises[0].series.max, 1.0);
    }

    #[test]
    fn test_quoted_fields() {
        let content = format!("{}\n\"Curl, hammer\",3,\"8-10\",0,45,60\n", HEADER);
        let exercises = parse_csv(&content).unwrap();
        assert_eq!(exercises[0].name, "Curl, hammer");
        assert_eq!(exercises[0].repetitions, "8-10");
        assert_eq!(exercises[0].rest_between_series.max, 45.0);
    }

    #[test]
    fn test_header_only_is_format_error() {
        let result = parse_csv(&format!("{}\n", HEADER));
        assert!(matches!(result, Err(Error::Format(_))));
    }

    #[test]
    fn test_empty_input_is_format_error() {
        assert!(matches!(parse_csv(""), Err(Error::Format(_))));
        assert!(matches!(parse_csv("\n\n  \n"), Err(Error::Format(_))));
    }

    #[test]
    fn test_unrecognized_header_is_format_error() {
        let result = parse_csv("name,sets,reps\nRow,3,10\n");
        assert!(matches!(result, Err(Error::Format(_))));
    }

    #[test]
    fn test_split_line_trims_and_toggles_quotes() {
        assert_eq!(split_line(" a , \"b,c\" ,d"), vec!["a", "b,c", "d"]);
        assert_eq!(split_line(""), vec![""]);
        assert_eq!(split_line("a,,"), vec!["a", "", ""]);
    }

    #[test]
    fn test_export_format() {
        let exercises = parse_csv(&format!("{}\nPush-up,3,10-12,0,60,90", HEADER)).unwrap();
        let csv = exercises_to_csv(&exercises).unwrap();
        assert_eq!(csv, format!("{}\nPush-up,3,10-12,0,60,90", HEADER));
    }

    #[test]
    fn test_export_empty_list_is_header_only() {
        assert_eq!(exercises_to_csv(&[]).unwrap(), HEADER);
    }

    #[test]
    fn test_round_trip_preserves_raw_text() {
        let original = vec![
            Exercise::from_fields("Row", "2-3", "8-12", "0", "60-90", "120").unwrap(),
            Exercise::from_fields("Plank", "2", "tempo", "24-36", "0", "0").unwrap(),
            Exercise::from_fields("Odd", "12-8", "AMRAP", "x", "30", "0").unwrap(),
        ];

        let reparsed = parse_csv(&exercises_to_csv(&original).unwrap()).unwrap();

        assert_eq!(reparsed.len(), original.len());
        for (a, b) in original.iter().zip(&reparsed) {
            assert_eq!(a.name, b.name);
            assert_eq!(a.repetitions, b.repetitions);
            assert_eq!(a.series.raw, b.series.raw);
            assert_eq!(a.work_time.raw, b.work_time.raw);
            assert_eq!(a.rest_between_series.raw, b.rest_between_series.raw);
            assert_eq!(a.rest_between_exercises.raw, b.rest_between_exercises.raw);
        }
        assert_eq!(reparsed[2].series.min, 12.0);
        assert_eq!(reparsed[2].series.max, 8.0);
    }

    #[test]
    fn test_file_round_trip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("export").join("workout.csv");

        let exercises = vec![Exercise::from_fields("Squat", "4", "6", "0", "120", "0").unwrap()];
        export_file(&exercises, &path).unwrap();

        let imported = import_file(&path).unwrap();
        assert_eq!(imported.len(), 1);
        assert_eq!(imported[0].name, "Squat");
        assert_eq!(imported[0].rest_between_series.max, 120.0);
    }
}
