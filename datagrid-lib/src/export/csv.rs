//! CSV export.

use std::borrow::Cow;

use crate::model::ColumnDef;
use crate::model::RowNode;

/// CSV export options.
#[derive(Debug, Clone)]
pub struct CsvOptions {
    /// Omit the header line.
    pub skip_header: bool,
    /// Field separator.
    pub separator: char,
    /// Export only these fields, in this order. Defaults to every visible
    /// column.
    pub columns: Option<Vec<String>>,
    /// Export only selected rows.
    pub only_selected: bool,
    /// Export every page instead of the current one.
    pub all_pages: bool,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            skip_header: false,
            separator: ',',
            columns: None,
            only_selected: false,
            all_pages: true,
        }
    }
}

impl CsvOptions {
    pub fn skip_header(mut self) -> Self {
        self.skip_header = true;
        self
    }

    pub fn separator(mut self, separator: char) -> Self {
        self.separator = separator;
        self
    }

    pub fn columns(mut self, fields: Vec<String>) -> Self {
        self.columns = Some(fields);
        self
    }

    pub fn only_selected(mut self) -> Self {
        self.only_selected = true;
        self
    }

    pub fn current_page(mut self) -> Self {
        self.all_pages = false;
        self
    }
}

/// Columns an export projects through: the requested fields, or every
/// visible column.
pub fn export_columns<'a>(columns: &'a [ColumnDef], fields: Option<&[String]>) -> Vec<&'a ColumnDef> {
    match fields {
        Some(fields) => fields
            .iter()
            .filter_map(|field| columns.iter().find(|c| &c.field == field))
            .collect(),
        None => columns.iter().filter(|c| !c.hidden).collect(),
    }
}

/// Quotes a field if it contains the separator, a quote or a line break.
pub fn quote_csv_field(value: &str, separator: char) -> Cow<'_, str> {
    if value.contains(separator) || value.contains('"') || value.contains('\n') || value.contains('\r') {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}

/// Renders data rows as CSV. Group headers and split markers are skipped.
pub fn export_to_csv(rows: &[RowNode], columns: &[ColumnDef], options: &CsvOptions) -> String {
    let columns = export_columns(columns, options.columns.as_deref());
    let separator = options.separator.to_string();
    let mut lines = Vec::new();

    if !options.skip_header {
        let header: Vec<_> = columns
            .iter()
            .map(|c| quote_csv_field(c.display_name(), options.separator))
            .collect();
        lines.push(header.join(&separator));
    }

    for row in rows.iter().filter(|r| r.is_data()) {
        if options.only_selected && !row.selected {
            continue;
        }
        let cells: Vec<String> = columns
            .iter()
            .map(|c| quote_csv_field(&c.format_value(&row.data), options.separator).into_owned())
            .collect();
        lines.push(cells.join(&separator));
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_quoting() {
        assert_eq!(quote_csv_field("plain", ','), "plain");
        assert_eq!(quote_csv_field("a,b", ','), "\"a,b\"");
        assert_eq!(quote_csv_field("say \"hi\"", ','), "\"say \"\"hi\"\"\"");
        assert_eq!(quote_csv_field("two\nlines", ','), "\"two\nlines\"");
    }

    #[test]
    fn test_export_with_header_and_formatter() {
        let columns = vec![
            ColumnDef::new("name").header("Name"),
            ColumnDef::new("price").header("Price").formatter(|v, _| format!("{}$", v.map(|v| v.to_string()).unwrap_or_default())),
            ColumnDef::new("secret").hidden(),
        ];
        let rows = vec![
            RowNode::data("1", json!({ "name": "Widget, large", "price": 5, "secret": "x" }), 0),
            RowNode::data("2", json!({ "name": "Nut", "price": 1 }), 1),
        ];
        let csv = export_to_csv(&rows, &columns, &CsvOptions::default());
        assert_eq!(csv, "Name,Price\n\"Widget, large\",5$\nNut,1$");
        let csv = export_to_csv(&rows, &columns, &CsvOptions::default().skip_header());
        assert_eq!(csv.lines().count(), 2);
    }
}
