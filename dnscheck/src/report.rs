//! Rendering a [`CheckReport`] for humans (and machines).

use std::cmp::max;

use owo_colors::{OwoColorize, Stream};

use crate::check::{CheckReport, CheckRow};

/// Shown in place of the TTL, type and data of a failed row.
pub const SENTINEL: &str = "XXX";

const HEADER: [&str; 4] = ["NS", "TTL", "TYPE", "Data"];

fn cells(row: &CheckRow) -> [String; 4] {
    match &row.answer {
        Some(answer) => [
            row.nameserver.clone(),
            answer.ttl.to_string(),
            answer.rtype.clone(),
            answer.data.clone(),
        ],
        None => [
            row.nameserver.clone(),
            SENTINEL.to_string(),
            SENTINEL.to_string(),
            SENTINEL.to_string(),
        ],
    }
}

fn pad(cells: &[String; 4], widths: &[usize; 4]) -> String {
    // the last column is not padded, to avoid trailing whitespace
    format!(
        "{:<w0$}  {:<w1$}  {:<w2$}  {}",
        cells[0],
        cells[1],
        cells[2],
        cells[3],
        w0 = widths[0],
        w1 = widths[1],
        w2 = widths[2],
    )
}

/// Renders `report` as a table with one line per row, preceded by a header line.
///
/// If `output` is given and supports colours, the header is bold and failed rows are red.
pub fn as_table(report: &CheckReport, output: Option<Stream>) -> String {
    let header = HEADER.map(String::from);
    let rows: Vec<_> = report.rows().iter().map(|row| (cells(row), row)).collect();

    let mut widths = header.clone().map(|cell| cell.len());
    for (cells, _) in &rows {
        for (width, cell) in widths.iter_mut().zip(cells.iter()) {
            *width = max(*width, cell.len());
        }
    }

    let mut table = String::new();
    let line = pad(&header, &widths);
    match output {
        Some(stream) => table.push_str(&line.if_supports_color(stream, |s| s.bold()).to_string()),
        None => table.push_str(&line),
    }
    table.push('\n');

    for (cells, row) in rows {
        let line = pad(&cells, &widths);
        match output {
            Some(stream) if row.is_failure() => {
                table.push_str(&line.if_supports_color(stream, |s| s.red()).to_string())
            }
            _ => table.push_str(&line),
        }
        table.push('\n');
    }

    table
}

/// Renders `report` as pretty-printed JSON.
#[cfg(feature = "json")]
pub fn as_json(report: &CheckReport) -> serde_json::Result<String> {
    serde_json::to_string_pretty(report)
}
