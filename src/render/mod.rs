//! Result rendering.
//!
//! Turns a `ResultSet` envelope into a `DisplayTable`, which can be written
//! out as an HTML fragment or as a boxed plain-text table.

use std::fmt::{self, Write as _};

use crate::query::ResultSet;

/// Placeholder shown instead of an empty table.
pub const NO_RESULTS_PLACEHOLDER: &str = "No results returned";

/// Maximum width for any column in text output.
const MAX_COLUMN_WIDTH: usize = 40;

/// Minimum width for any column in text output.
const MIN_COLUMN_WIDTH: usize = 4;

/// A rendered result: either the placeholder or a header plus cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayTable {
    Empty,
    Table {
        headers: Vec<String>,
        rows: Vec<Vec<String>>,
    },
}

/// Builds the display table for an envelope.
///
/// An absent envelope or one without rows becomes `DisplayTable::Empty`.
/// Cells follow `fields` order; a row missing a field gets an empty cell.
pub fn render(envelope: Option<&ResultSet>) -> DisplayTable {
    let Some(envelope) = envelope.filter(|e| !e.is_empty()) else {
        return DisplayTable::Empty;
    };

    let rows = envelope
        .rows
        .iter()
        .map(|record| {
            envelope
                .fields
                .iter()
                .map(|field| {
                    record
                        .get(field)
                        .map(|v| v.to_display_string())
                        .unwrap_or_default()
                })
                .collect()
        })
        .collect();

    DisplayTable::Table {
        headers: envelope.fields.clone(),
        rows,
    }
}

impl DisplayTable {
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    pub fn row_count(&self) -> usize {
        match self {
            Self::Empty => 0,
            Self::Table { rows, .. } => rows.len(),
        }
    }

    /// Renders an HTML fragment styled with Bootstrap table classes.
    pub fn to_html(&self) -> String {
        let (headers, rows) = match self {
            Self::Empty => {
                return format!(
                    "<div class=\"alert alert-info\">{NO_RESULTS_PLACEHOLDER}</div>"
                )
            }
            Self::Table { headers, rows } => (headers, rows),
        };

        let mut html = String::from("<table class=\"table table-striped table-bordered\">");
        html.push_str("<thead><tr>");
        for header in headers {
            let _ = write!(html, "<th>{}</th>", escape_html(header));
        }
        html.push_str("</tr></thead><tbody>");
        for row in rows {
            html.push_str("<tr>");
            for cell in row {
                let _ = write!(html, "<td>{}</td>", escape_html(cell));
            }
            html.push_str("</tr>");
        }
        html.push_str("</tbody></table>");
        html
    }

    fn column_widths(headers: &[String], rows: &[Vec<String>]) -> Vec<usize> {
        let mut widths: Vec<usize> = headers
            .iter()
            .map(|h| h.chars().count().max(MIN_COLUMN_WIDTH))
            .collect();

        for row in rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.chars().count());
            }
        }

        widths.into_iter().map(|w| w.min(MAX_COLUMN_WIDTH)).collect()
    }

    fn write_border(
        f: &mut fmt::Formatter<'_>,
        widths: &[usize],
        left: char,
        mid: char,
        right: char,
    ) -> fmt::Result {
        f.write_char(left)?;
        for (i, &width) in widths.iter().enumerate() {
            f.write_str(&"─".repeat(width + 2))?;
            if i + 1 < widths.len() {
                f.write_char(mid)?;
            }
        }
        f.write_char(right)?;
        f.write_char('\n')
    }

    fn write_cells(f: &mut fmt::Formatter<'_>, cells: &[String], widths: &[usize]) -> fmt::Result {
        f.write_char('│')?;
        for (cell, &width) in cells.iter().zip(widths) {
            write!(f, " {:width$} │", truncate(cell, width), width = width)?;
        }
        f.write_char('\n')
    }
}

impl fmt::Display for DisplayTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (headers, rows) = match self {
            Self::Empty => return writeln!(f, "{NO_RESULTS_PLACEHOLDER}"),
            Self::Table { headers, rows } => (headers, rows),
        };

        let widths = Self::column_widths(headers, rows);

        Self::write_border(f, &widths, '┌', '┬', '┐')?;
        Self::write_cells(f, headers, &widths)?;
        Self::write_border(f, &widths, '├', '┼', '┤')?;
        for row in rows {
            Self::write_cells(f, row, &widths)?;
        }
        Self::write_border(f, &widths, '└', '┴', '┘')?;

        let count = rows.len();
        writeln!(f, "{count} row{} returned", if count == 1 { "" } else { "s" })
    }
}

/// Shortens `s` to `max_width` characters, ending in an ellipsis if cut.
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

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Value;
    use crate::query::Record;
    use pretty_assertions::assert_eq;

    fn envelope(fields: &[&str], rows: Vec<Record>) -> ResultSet {
        ResultSet {
            rows,
            fields: fields.iter().map(|f| f.to_string()).collect(),
            row_count: None,
            total_rows: None,
            message: None,
        }
    }

    #[test]
    fn test_absent_and_empty_envelopes_render_placeholder() {
        assert_eq!(render(None), DisplayTable::Empty);
        assert_eq!(render(Some(&ResultSet::no_results())), DisplayTable::Empty);
        assert_eq!(
            render(Some(&envelope(&["id"], Vec::new()))),
            DisplayTable::Empty
        );
    }

    #[test]
    fn test_cells_follow_field_order() {
        let rows = vec![Record::from_iter([("a", Value::Int(1)), ("b", Value::Int(2))])];

        let table = render(Some(&envelope(&["a", "b"], rows)));

        assert_eq!(
            table,
            DisplayTable::Table {
                headers: vec!["a".into(), "b".into()],
                rows: vec![vec!["1".into(), "2".into()]],
            }
        );
    }

    #[test]
    fn test_fields_reorder_row_keys() {
        let rows = vec![Record::from_iter([("b", Value::Int(2)), ("a", Value::Int(1))])];
        let table = render(Some(&envelope(&["a", "b"], rows)));
        assert_eq!(
            table,
            DisplayTable::Table {
                headers: vec!["a".into(), "b".into()],
                rows: vec![vec!["1".into(), "2".into()]],
            }
        );
    }

    #[test]
    fn test_missing_field_renders_empty_cell() {
        let rows = vec![
            Record::from_iter([("id", Value::Int(1)), ("email", Value::Null)]),
            Record::from_iter([("id", Value::Int(2))]),
        ];

        let table = render(Some(&envelope(&["id", "email"], rows)));

        let DisplayTable::Table { rows, .. } = table else {
            panic!("expected a table");
        };
        assert_eq!(rows[0], vec!["1", "NULL"]);
        assert_eq!(rows[1], vec!["2", ""]);
    }

    #[test]
    fn test_render_is_idempotent() {
        let env = envelope(
            &["name"],
            vec![Record::from_iter([("name", Value::from("jane"))])],
        );
        assert_eq!(render(Some(&env)), render(Some(&env)));
        assert_eq!(
            render(Some(&env)).to_string(),
            render(Some(&env)).to_string()
        );
    }

    #[test]
    fn test_text_table_layout() {
        let env = envelope(
            &["id", "username"],
            vec![Record::from_iter([
                ("id", Value::Int(1)),
                ("username", Value::from("john")),
            ])],
        );

        let text = render(Some(&env)).to_string();

        assert_eq!(
            text,
            "┌──────┬──────────┐\n\
             │ id   │ username │\n\
             ├──────┼──────────┤\n\
             │ 1    │ john     │\n\
             └──────┴──────────┘\n\
             1 row returned\n"
        );
    }

    #[test]
    fn test_text_placeholder() {
        assert_eq!(DisplayTable::Empty.to_string(), "No results returned\n");
    }

    #[test]
    fn test_long_cells_are_truncated_in_text() {
        let long = "x".repeat(60);
        let env = envelope(&["v"], vec![Record::from_iter([("v", Value::from(long))])]);
        let text = render(Some(&env)).to_string();
        assert!(text.contains(&format!("{}...", "x".repeat(37))));
        assert!(!text.contains(&"x".repeat(41)));
    }

    #[test]
    fn test_truncate_counts_characters() {
        assert_eq!(truncate("héllo", 10), "héllo");
        assert_eq!(truncate("ééééééé", 5), "éé...");
        assert_eq!(truncate("abcdef", 2), "ab");
    }

    #[test]
    fn test_html_escapes_cells() {
        let env = envelope(
            &["<b>"],
            vec![Record::from_iter([("<b>", Value::from("a & 'b'"))])],
        );

        let html = render(Some(&env)).to_html();

        assert_eq!(
            html,
            "<table class=\"table table-striped table-bordered\">\
             <thead><tr><th>&lt;b&gt;</th></tr></thead>\
             <tbody><tr><td>a &amp; &#39;b&#39;</td></tr></tbody></table>"
        );
    }

    #[test]
    fn test_html_placeholder() {
        assert_eq!(
            DisplayTable::Empty.to_html(),
            "<div class=\"alert alert-info\">No results returned</div>"
        );
    }
}
