//! Clipboard text projection and paste parsing.

use std::sync::Mutex;

use serde_json::Value;

use super::export_columns;
use crate::error::ClipboardError;
use crate::model::ColumnDef;
use crate::model::RowNode;
use crate::value::as_number;

/// Access to a system clipboard.
pub trait ClipboardProvider: Send + Sync {
    /// Reads clipboard text.
    fn read_text(&self) -> Result<String, ClipboardError>;

    /// Replaces clipboard text.
    fn write_text(&self, text: &str) -> Result<(), ClipboardError>;
}

/// In-process clipboard.
#[derive(Debug, Default)]
pub struct MemoryClipboard {
    text: Mutex<String>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a clipboard holding `text`.
    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            text: Mutex::new(text.into()),
        }
    }
}

impl ClipboardProvider for MemoryClipboard {
    fn read_text(&self) -> Result<String, ClipboardError> {
        self.text
            .lock()
            .map(|text| text.clone())
            .map_err(|_| ClipboardError::new("clipboard lock poisoned"))
    }

    fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
        let mut guard = self
            .text
            .lock()
            .map_err(|_| ClipboardError::new("clipboard lock poisoned"))?;
        *guard = text.to_string();
        Ok(())
    }
}

/// Renders data rows as tab-separated text without quoting.
pub fn rows_to_tsv(rows: &[RowNode], columns: &[ColumnDef], include_header: bool) -> String {
    let columns = export_columns(columns, None);
    let mut lines = Vec::new();
    if include_header {
        let header: Vec<&str> = columns.iter().map(|c| c.display_name()).collect();
        lines.push(header.join("\t"));
    }
    for row in rows.iter().filter(|r| r.is_data()) {
        let cells: Vec<String> = columns.iter().map(|c| c.format_value(&row.data)).collect();
        lines.push(cells.join("\t"));
    }
    lines.join("\n")
}

/// Splits clipboard text into a cell grid. A trailing line break does not
/// produce an empty last row.
pub fn parse_tsv(text: &str) -> Vec<Vec<String>> {
    let text = text.strip_suffix('\n').unwrap_or(text);
    let text = text.strip_suffix('\r').unwrap_or(text);
    if text.is_empty() {
        return Vec::new();
    }
    text.split('\n')
        .map(|line| {
            line.strip_suffix('\r')
                .unwrap_or(line)
                .split('\t')
                .map(str::to_string)
                .collect()
        })
        .collect()
}

/// One cell write produced by a paste.
#[derive(Debug, Clone, PartialEq)]
pub struct PasteEdit {
    pub row_id: String,
    pub field: String,
    pub value: Value,
}

/// Maps a pasted cell grid onto rows and columns.
///
/// The grid's top-left cell lands on `rows[anchor_row]` and
/// `columns[anchor_column]` (visible columns, display order). Cells falling
/// on non-editable columns or past the last row or column are skipped.
/// Text is converted to a number when the cell currently holds a number.
pub fn plan_paste(
    cells: &[Vec<String>],
    rows: &[RowNode],
    columns: &[&ColumnDef],
    anchor_row: usize,
    anchor_column: usize,
) -> Vec<PasteEdit> {
    let mut edits = Vec::new();
    for (row_offset, line) in cells.iter().enumerate() {
        let Some(row) = rows.get(anchor_row + row_offset) else {
            break;
        };
        for (column_offset, text) in line.iter().enumerate() {
            let Some(column) = columns.get(anchor_column + column_offset) else {
                break;
            };
            if !column.editable {
                continue;
            }
            edits.push(PasteEdit {
                row_id: row.id.clone(),
                field: column.field.clone(),
                value: paste_value(text, row.get(&column.field)),
            });
        }
    }
    edits
}

/// Converts pasted text to a value shaped like the current one.
pub fn paste_value(text: &str, current: Option<&Value>) -> Value {
    match current {
        Some(Value::Number(_)) => match parse_number(text) {
            Some(number) => Value::Number(number),
            None => Value::String(text.to_string()),
        },
        Some(Value::Bool(_)) => match text.trim().to_lowercase().as_str() {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ => Value::String(text.to_string()),
        },
        _ => Value::String(text.to_string()),
    }
}

/// Integral text stays integral; anything else goes through `f64`.
fn parse_number(text: &str) -> Option<serde_json::Number> {
    let trimmed = text.trim();
    if let Ok(n) = trimmed.parse::<i64>() {
        return Some(n.into());
    }
    if let Ok(n) = trimmed.parse::<u64>() {
        return Some(n.into());
    }
    as_number(Some(&Value::String(trimmed.to_string()))).and_then(serde_json::Number::from_f64)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_tsv_has_no_quoting() {
        let columns = vec![ColumnDef::new("a").header("A"), ColumnDef::new("b").header("B")];
        let rows = vec![RowNode::data("1", json!({ "a": "x,\"y\"", "b": 2 }), 0)];
        assert_eq!(rows_to_tsv(&rows, &columns, true), "A\tB\nx,\"y\"\t2");
    }

    #[test]
    fn test_parse_tsv_handles_crlf() {
        let cells = parse_tsv("a\tb\r\nc\td\r\n");
        assert_eq!(cells, vec![vec!["a", "b"], vec!["c", "d"]]);
        assert!(parse_tsv("").is_empty());
    }

    #[test]
    fn test_plan_paste_skips_read_only_and_overflow() {
        let defs = vec![
            ColumnDef::new("a").editable(),
            ColumnDef::new("b"),
            ColumnDef::new("c").editable(),
        ];
        let columns: Vec<&ColumnDef> = defs.iter().collect();
        let rows = vec![
            RowNode::data("r1", json!({ "a": 1, "c": "x" }), 0),
            RowNode::data("r2", json!({ "a": 2, "c": "y" }), 1),
        ];
        let cells = parse_tsv("10\tB\tz\textra\n20\tB\tw\n30\tB\tv");
        let edits = plan_paste(&cells, &rows, &columns, 0, 0);
        assert_eq!(edits.len(), 4);
        assert_eq!(edits[0].value, json!(10));
        assert_eq!(edits[1].value, json!("z"));
        assert_eq!(edits[3].row_id, "r2");
    }

    #[test]
    fn test_paste_value_keeps_integers_integral() {
        let current = json!(36);
        assert_eq!(paste_value("51", Some(&current)), json!(51));
        assert_eq!(paste_value(" -7 ", Some(&current)), json!(-7));
        assert_eq!(paste_value("18446744073709551615", Some(&current)), json!(u64::MAX));
        assert_eq!(paste_value("2.5", Some(&current)), json!(2.5));
        assert_eq!(paste_value("n/a", Some(&current)), json!("n/a"));
        assert_eq!(paste_value("51", Some(&json!("x"))), json!("51"));
    }

    #[test]
    fn test_memory_clipboard_round_trip() {
        let clipboard = MemoryClipboard::new();
        clipboard.write_text("hello").unwrap();
        assert_eq!(clipboard.read_text().unwrap(), "hello");
    }
}
