//! Terminal views over the admin API.
//!
//! Each view owns its own state, talks to the API through [`ApiClient`] and
//! reports to the operator through an [`Interaction`]. Actions return an
//! [`Outcome`] rather than an error: failures have already been shown.
//!
//! [`ApiClient`]: crate::client::ApiClient
//! [`Interaction`]: crate::interact::Interaction

pub mod dashboard;
pub mod logs;
pub mod manual_post;
pub mod pages;
pub mod prompts;

use chrono::{DateTime, Local, Utc};

/// Result of a view action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    /// The operator declined a confirmation.
    Cancelled,
    /// Preconditions not met (nothing to act on, already running, inactive).
    Blocked,
    /// The request failed; the operator has been alerted.
    Failed,
}

impl Outcome {
    pub fn is_failure(self) -> bool {
        self == Self::Failed
    }
}

/// Timestamp in the operator's local time zone, or `Never`.
pub fn local_time(ts: Option<DateTime<Utc>>) -> String {
    match ts {
        Some(ts) => ts
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string(),
        None => "Never".to_string(),
    }
}

/// Cut `text` to `max` characters, marking the cut with `...`.
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max).collect();
        format!("{}...", cut)
    }
}

/// Plain-text table with left-aligned, width-fitted columns.
pub struct Table {
    headers: Vec<&'static str>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: &[&'static str]) -> Self {
        Self {
            headers: headers.to_vec(),
            rows: Vec::new(),
        }
    }

    pub fn row(&mut self, cells: Vec<String>) {
        self.rows.push(cells);
    }

    pub fn render(&self) -> String {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                if let Some(w) = widths.get_mut(i) {
                    *w = (*w).max(cell.chars().count());
                }
            }
        }

        let mut out = Vec::with_capacity(self.rows.len() + 2);
        out.push(pad_line(&self.headers, &widths));
        out.push(
            widths
                .iter()
                .map(|w| "-".repeat(*w))
                .collect::<Vec<_>>()
                .join("  "),
        );
        for row in &self.rows {
            let cells: Vec<&str> = row.iter().map(String::as_str).collect();
            out.push(pad_line(&cells, &widths));
        }
        out.join("\n")
    }
}

fn pad_line(cells: &[&str], widths: &[usize]) -> String {
    cells
        .iter()
        .zip(widths)
        .map(|(cell, w)| format!("{:<width$}", cell, width = *w))
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghij", 4), "abcd...");
    }

    #[test]
    fn test_table_aligns_columns() {
        let mut table = Table::new(&["Name", "Status"]);
        table.row(vec!["Cricket Fans".to_string(), "Active".to_string()]);
        table.row(vec!["X".to_string(), "Inactive".to_string()]);
        let rendered = table.render();
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0], "Name          Status");
        assert_eq!(lines[1], "------------  --------");
        assert_eq!(lines[3], "X             Inactive");
    }

    #[test]
    fn test_local_time_never() {
        assert_eq!(local_time(None), "Never");
    }
}
