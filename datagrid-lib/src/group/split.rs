//! Split-by-field section markers.

use serde_json::Value;

use crate::model::RowKind;
use crate::model::RowNode;
use crate::value::deep_equal;
use crate::value::to_display_string;

/// Inserts a [`RowKind::SplitMarker`] before the first row and wherever the
/// value of `field` changes from the previous row. No nesting.
pub fn split_by_field(rows: Vec<RowNode>, field: &str) -> Vec<RowNode> {
    let mut out = Vec::with_capacity(rows.len());
    let mut current: Option<Value> = None;
    let mut sections = 0usize;

    for row in rows {
        let value = row.get(field).cloned().unwrap_or(Value::Null);
        let changed = current.as_ref().is_none_or(|c| !deep_equal(c, &value));
        if changed {
            out.push(RowNode {
                id: format!("split:{}={}#{}", field, to_display_string(Some(&value)), sections),
                data: Value::Null,
                row_index: 0,
                selected: false,
                expanded: None,
                level: None,
                children: Vec::new(),
                kind: RowKind::SplitMarker {
                    field: field.to_string(),
                    value: value.clone(),
                },
            });
            sections += 1;
            current = Some(value);
        }
        out.push(row);
    }

    for (index, row) in out.iter_mut().enumerate() {
        row.row_index = index;
    }
    out
}
