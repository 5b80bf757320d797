//! Plain-text rendering for the command line.
//!
//! Turns results, verdicts, schema overviews and catalog listings into
//! strings. Nothing here influences grading.

use crate::catalog::{Catalog, Exercise, Level, QuizQuestion};
use crate::db::{QueryResult, StatementOutcome, Value};
use crate::grading::Verdict;
use crate::session::SchemaOverview;

/// Maximum width for any column.
const MAX_COLUMN_WIDTH: usize = 40;

/// Minimum width for any column.
const MIN_COLUMN_WIDTH: usize = 4;

/// Renders a result set as a boxed table, showing at most `max_rows` rows.
pub fn format_result(result: &QueryResult, max_rows: usize) -> String {
    if result.columns.is_empty() {
        return "(no columns)".to_string();
    }

    let shown = &result.rows[..result.rows.len().min(max_rows)];
    let headers: Vec<String> = result.columns.iter().map(|c| c.name.clone()).collect();
    let cells: Vec<Vec<String>> = shown
        .iter()
        .map(|row| row.iter().map(Value::to_display_string).collect())
        .collect();

    let widths = column_widths(&headers, &cells);

    let mut lines = Vec::with_capacity(cells.len() + 5);
    lines.push(border(&widths, '┌', '┬', '┐'));
    lines.push(line(&headers, &widths));
    lines.push(border(&widths, '├', '┼', '┤'));
    for row in &cells {
        lines.push(line(row, &widths));
    }
    lines.push(border(&widths, '└', '┴', '┘'));

    let mut footer = format!(
        "{} row{} returned ({}ms)",
        result.row_count,
        if result.row_count == 1 { "" } else { "s" },
        result.execution_time.as_millis()
    );
    if shown.len() < result.rows.len() {
        footer.push_str(&format!(", showing the first {}", shown.len()));
    }
    lines.push(footer);

    lines.join("\n")
}

/// Renders whatever a statement produced.
pub fn format_outcome(outcome: &StatementOutcome, max_rows: usize) -> String {
    match outcome {
        StatementOutcome::Rows(result) => format_result(result, max_rows),
        StatementOutcome::Affected { rows_affected } => format!(
            "Statement executed. {} row{} affected.",
            rows_affected,
            if *rows_affected == 1 { "" } else { "s" }
        ),
    }
}

/// Renders a verdict followed by the learner's result, if there is one.
pub fn format_verdict(verdict: &Verdict, max_rows: usize) -> String {
    let headline = if verdict.is_match() {
        format!("✔ {}", verdict.message())
    } else {
        format!("✘ Incorrect solution. {}", verdict.message())
    };

    match verdict.learner_result() {
        Some(result) if !result.columns.is_empty() => {
            format!(
                "{headline}\n\nYour result:\n{}",
                format_result(result, max_rows)
            )
        }
        _ => headline,
    }
}

/// Renders the schema diagram and the sample rows of every table.
pub fn format_overview(overview: &SchemaOverview, max_rows: usize) -> String {
    let mut out = format!(
        "Sample database: {} ({})\n\n",
        overview.schema,
        overview.schema.description()
    );
    out.push_str(&overview.structure.format_for_display());

    for (table, rows) in &overview.samples {
        out.push_str(&format!("\nSample data from {table}:\n"));
        out.push_str(&format_result(rows, max_rows));
        out.push('\n');
    }

    out.trim_end().to_string()
}

/// Lists the catalog's exercises grouped by level.
pub fn format_exercise_list(catalog: &Catalog, level: Option<Level>) -> String {
    let levels: Vec<Level> = match level {
        Some(level) => vec![level],
        None => Level::ALL.to_vec(),
    };

    let mut out = String::new();
    for level in levels {
        let exercises: Vec<&Exercise> = catalog.exercises_at(level).collect();
        if exercises.is_empty() {
            continue;
        }
        out.push_str(&format!("{level}:\n"));
        for exercise in exercises {
            out.push_str(&format!(
                "  - {} [{}]\n      {}\n",
                exercise.title, exercise.schema, exercise.description
            ));
        }
    }

    if out.is_empty() {
        "No exercises available.".to_string()
    } else {
        out.trim_end().to_string()
    }
}

/// Renders an exercise's reference answer and notes.
pub fn format_solution(exercise: &Exercise) -> String {
    let mut out = format!("{}\n\n{}", exercise.title, exercise.reference);
    if !exercise.expected_columns.is_empty() {
        out.push_str(&format!(
            "\n\nExpected columns: {}",
            exercise.expected_columns.join(", ")
        ));
    }
    if let Some(explanation) = &exercise.explanation {
        out.push_str(&format!("\n\n{explanation}"));
    }
    if !exercise.alternatives.is_empty() {
        out.push_str("\n\nAlso accepted:");
        for alternative in &exercise.alternatives {
            out.push_str(&format!("\n  {alternative}"));
        }
    }
    out
}

/// Renders a quiz question with numbered options.
pub fn format_question(question: &QuizQuestion, position: usize, total: usize) -> String {
    let mut out = format!("Question {position}/{total}: {}\n", question.question);
    for (i, option) in question.options.iter().enumerate() {
        out.push_str(&format!("  {}) {}\n", i + 1, option));
    }
    out.trim_end().to_string()
}

fn column_widths(headers: &[String], rows: &[Vec<String>]) -> Vec<usize> {
    let mut widths: Vec<usize> = headers
        .iter()
        .map(|h| h.chars().count().max(MIN_COLUMN_WIDTH))
        .collect();

    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(width) = widths.get_mut(i) {
                *width = (*width).max(cell.chars().count());
            }
        }
    }

    widths.iter().map(|&w| w.min(MAX_COLUMN_WIDTH)).collect()
}

fn border(widths: &[usize], left: char, mid: char, right: char) -> String {
    let segments: Vec<String> = widths.iter().map(|w| "─".repeat(w + 2)).collect();
    format!("{left}{}{right}", segments.join(&mid.to_string()))
}

fn line(cells: &[String], widths: &[usize]) -> String {
    let padded: Vec<String> = widths
        .iter()
        .enumerate()
        .map(|(i, &width)| {
            let cell = cells.get(i).map(String::as_str).unwrap_or("");
            format!(" {:width$} ", truncate(cell, width), width = width)
        })
        .collect();
    format!("│{}│", padded.join("│"))
}

/// Truncates a string to fit within the given width, adding ellipsis if needed.
fn truncate(s: &str, max_width: usize) -> String {
    if s.chars().count() <= max_width {
        s.to_string()
    } else if max_width <= 3 {
        s.chars().take(max_width).collect()
    } else {
        let kept: String = s.chars().take(max_width - 3).collect();
        format!("{kept}...")
    }
}
