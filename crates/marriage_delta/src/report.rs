//! Text presentation of comparisons and delta grids

use std::fmt::Write;

use marriage_delta_core::compare::{ComparisonRow, Section};
use marriage_delta_core::{
    CHILDREN_ASSUMPTION, ComparativeResult, GridOutcome, HouseholdMetric, MarriageOutcome,
};

/// Whole currency units with thousands separators, e.g. `-$12,345`
pub fn format_currency(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    if value < 0 {
        format!("-${grouped}")
    } else {
        format!("${grouped}")
    }
}

/// Fraction rendered as a percentage with one decimal
pub fn format_percent(fraction: f64) -> String {
    format!("{:.1}%", fraction * 100.0)
}

/// `refundable_ctc` -> `Refundable Ctc`
pub fn program_label(program: &str) -> String {
    program
        .split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn outcome_sentence(result: &ComparativeResult) -> String {
    let metric = HouseholdMetric::NetIncome;
    let delta = result.delta(metric);
    let change = format!(
        "{} ({})",
        format_currency(delta.abs()),
        format_percent(result.delta_percent(metric).abs())
    );
    match result.outcome() {
        MarriageOutcome::Bonus => {
            format!("Marriage bonus: filing together raises net income by {change}.")
        }
        MarriageOutcome::Penalty => {
            format!("Marriage penalty: filing together lowers net income by {change}.")
        }
        MarriageOutcome::Neutral => {
            "No marriage penalty or bonus: net income is unchanged.".to_string()
        }
    }
}

const HEADERS: [&str; 5] = ["Program", "Married", "Separate", "Delta", "Delta %"];

fn row_cells(row: &ComparisonRow, section: Section) -> [String; 5] {
    let program = match section {
        Section::Summary => row.program.clone(),
        Section::Category(_) => program_label(&row.program),
    };
    [
        program,
        format_currency(row.married),
        format_currency(row.separate),
        format_currency(row.delta),
        format_percent(row.delta_percent),
    ]
}

fn write_table(out: &mut String, title: &str, rows: &[[String; 5]]) {
    let mut widths = HEADERS.map(str::len);
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.len());
        }
    }

    let _ = writeln!(out, "{title}");
    let header = HEADERS.map(String::from);
    for cells in std::iter::once(&header).chain(rows) {
        let _ = write!(out, "  {:<w$}", cells[0], w = widths[0]);
        for (cell, width) in cells.iter().zip(widths).skip(1) {
            let _ = write!(out, "  {cell:>width$}");
        }
        out.push('\n');
    }
}

/// Outcome sentence, summary table and every non-empty category table
pub fn render_comparison(result: &ComparativeResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}\n", outcome_sentence(result));

    for section in result.table().sections {
        // Categories with no non-zero programs are left out entirely
        if section.rows.is_empty() {
            continue;
        }
        let rows: Vec<[String; 5]> = section
            .rows
            .iter()
            .map(|row| row_cells(row, section.section))
            .collect();
        write_table(&mut out, section.section.title(), &rows);
        out.push('\n');
    }

    let _ = writeln!(out, "Note: {CHILDREN_ASSUMPTION}");
    out
}

/// Delta matrix with head income down the side and spouse income across
pub fn render_grid(outcome: &GridOutcome) -> String {
    let grid = match outcome {
        GridOutcome::NoVariation { metric } => {
            return format!(
                "{}: no variation. Marital status does not change this amount at any income pair.\n",
                metric.label()
            );
        }
        GridOutcome::Delta(grid) => grid,
    };

    let mut out = String::new();
    let _ = writeln!(out, "{}: change from marriage", grid.metric.label());
    if !grid.metric.higher_is_better() {
        let _ = writeln!(
            out,
            "(sign inverted so positive values mean lower taxes for the household)"
        );
    }

    let values = grid.display_values();
    let labels: Vec<String> = grid.axis.iter().map(|&v| format_currency(v)).collect();
    let cells: Vec<String> = values
        .data()
        .iter()
        .map(|&v| format_currency(v.trunc() as i64))
        .collect();
    let width = labels
        .iter()
        .chain(&cells)
        .map(String::len)
        .max()
        .unwrap_or(0);

    let corner_label = "head \\ spouse";
    let corner = corner_label.len().max(width);
    let _ = write!(out, "{corner_label:>corner$}");
    for label in &labels {
        let _ = write!(out, "  {label:>width$}");
    }
    out.push('\n');

    for (row, label) in labels.iter().enumerate() {
        let _ = write!(out, "{label:>corner$}");
        for cell in &cells[row * values.cols()..(row + 1) * values.cols()] {
            let _ = write!(out, "  {cell:>width$}");
        }
        out.push('\n');
    }
    let _ = writeln!(
        out,
        "Largest change: {}",
        format_currency(values.max_abs().trunc() as i64)
    );
    out
}
