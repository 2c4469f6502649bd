//! Sort stage.

use std::cmp::Ordering;

use crate::model::ColumnDef;
use crate::model::Direction;
use crate::model::RowNode;
use crate::model::SortItem;
use crate::model::find_column;
use crate::value::default_compare;

/// Stable multi-key sort.
///
/// Each key uses its column's comparator when one is defined, otherwise
/// [`default_compare`]. Ties fall through to the next key; `Desc` reverses
/// a key. An empty sort model keeps the input order. `row_index` is
/// renumbered either way.
pub fn sort_rows(mut rows: Vec<RowNode>, sort_model: &[SortItem], columns: &[ColumnDef]) -> Vec<RowNode> {
    if !sort_model.is_empty() {
        rows.sort_by(|a, b| compare_rows(a, b, sort_model, columns));
    }
    for (index, row) in rows.iter_mut().enumerate() {
        row.row_index = index;
    }
    rows
}

/// Compares two rows under a sort model.
pub fn compare_rows(a: &RowNode, b: &RowNode, sort_model: &[SortItem], columns: &[ColumnDef]) -> Ordering {
    for item in sort_model {
        let left = a.get(&item.field);
        let right = b.get(&item.field);
        let ordering = match find_column(columns, &item.field).and_then(|c| c.comparator.as_ref()) {
            Some(comparator) => comparator.compare(left, right),
            None => default_compare(left, right),
        };
        let ordering = match item.direction {
            Direction::Asc => ordering,
            Direction::Desc => ordering.reverse(),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn rows() -> Vec<RowNode> {
        vec![
            RowNode::data("a", json!({ "g": 1, "n": "b" }), 0),
            RowNode::data("b", json!({ "g": 2, "n": "a" }), 1),
            RowNode::data("c", json!({ "g": 1, "n": "a" }), 2),
            RowNode::data("d", json!({ "n": "z" }), 3),
        ]
    }

    fn ids(rows: &[RowNode]) -> Vec<&str> {
        rows.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn test_multi_key_with_fallthrough() {
        let sorted = sort_rows(rows(), &[SortItem::asc("g"), SortItem::asc("n")], &[]);
        assert_eq!(ids(&sorted), vec!["d", "c", "a", "b"]);
    }

    #[test]
    fn test_desc_and_stability() {
        let sorted = sort_rows(rows(), &[SortItem::desc("g")], &[]);
        assert_eq!(ids(&sorted), vec!["b", "a", "c", "d"]);
        let again = sort_rows(sorted.clone(), &[SortItem::desc("g")], &[]);
        assert_eq!(again, sorted);
    }

    #[test]
    fn test_custom_comparator() {
        let columns = vec![ColumnDef::new("n").comparator(|a, b| default_compare(b, a))];
        let sorted = sort_rows(rows(), &[SortItem::asc("n")], &columns);
        assert_eq!(ids(&sorted)[0], "d");
    }

    #[test]
    fn test_no_sort_renumbers_only() {
        let mut input = rows();
        input.reverse();
        let sorted = sort_rows(input, &[], &[]);
        assert_eq!(ids(&sorted), vec!["d", "c", "b", "a"]);
        assert_eq!(sorted[0].row_index, 0);
    }
}
