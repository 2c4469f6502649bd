//! Group-by-fields.

use std::collections::BTreeMap;
use std::collections::HashMap;

use serde_json::Map;
use serde_json::Value;

use crate::model::ColumnDef;
use crate::model::GroupNode;
use crate::model::RowKind;
use crate::model::RowNode;
use crate::value::as_number;
use crate::value::is_nullish;
use crate::value::set_path;
use crate::value::to_display_string;

/// Prefix of every group node id.
pub const GROUP_ID_PREFIX: &str = "group:";

/// Builds a group id from the `(field, value)` path down to a group.
///
/// ```
/// use datagrid_lib::group::group_id;
/// use serde_json::json;
///
/// let id = group_id(&[("region".into(), json!("EU")), ("tier".into(), json!(2))]);
/// assert_eq!(id, "group:region=EU|tier=2");
/// ```
pub fn group_id(path: &[(String, Value)]) -> String {
    let parts: Vec<String> = path
        .iter()
        .map(|(field, value)| format!("{}={}", field, group_key_text(value)))
        .collect();
    format!("{}{}", GROUP_ID_PREFIX, parts.join("|"))
}

fn group_key_text(value: &Value) -> String {
    if is_nullish(Some(value)) {
        "null".to_string()
    } else {
        to_display_string(Some(value))
    }
}

/// Buckets rows by `fields`, one nesting level per field.
///
/// Buckets keep first-appearance order, so a sorted input yields sorted
/// groups. Fields are read as dotted paths whether or not a column exists
/// for them; rows missing the field share one `null` bucket. Columns with
/// an `agg_func` get an aggregation over each group's leaf rows.
pub fn group_by_fields(rows: Vec<RowNode>, fields: &[String], columns: &[ColumnDef]) -> Vec<RowNode> {
    group_level(rows, fields, columns, &mut Vec::new())
}

fn group_level(
    rows: Vec<RowNode>,
    fields: &[String],
    columns: &[ColumnDef],
    path: &mut Vec<(String, Value)>,
) -> Vec<RowNode> {
    let Some((field, rest)) = fields.split_first() else {
        return rows;
    };

    // First-appearance order, with a key index for constant-time lookup.
    let mut buckets: Vec<(Value, Vec<RowNode>)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for row in rows {
        let value = row.get(field).cloned().unwrap_or(Value::Null);
        let key = group_key_text(&value);
        match index.get(&key) {
            Some(&position) => buckets[position].1.push(row),
            None => {
                index.insert(key, buckets.len());
                buckets.push((value, vec![row]));
            }
        }
    }

    buckets
        .into_iter()
        .map(|(value, members)| {
            path.push((field.clone(), value.clone()));
            let id = group_id(path);
            let level = path.len() - 1;
            let leaves = members.clone();
            let children = group_level(members, rest, columns, path);
            path.pop();

            let aggregations = aggregate(&leaves, columns);
            let mut data = Value::Object(Map::new());
            set_path(&mut data, field, value.clone());
            for (agg_field, agg_value) in &aggregations {
                if let Some(number) = serde_json::Number::from_f64(*agg_value) {
                    set_path(&mut data, agg_field, Value::Number(number));
                }
            }

            RowNode {
                id,
                data,
                row_index: 0,
                selected: false,
                expanded: None,
                level: Some(level),
                children: Vec::new(),
                kind: RowKind::Group(GroupNode {
                    group_key: field.clone(),
                    group_value: value,
                    group_children: children,
                    aggregations,
                    leaf_count: leaves.len(),
                }),
            }
        })
        .collect()
}

/// Runs every column aggregation over a group's leaf rows.
pub fn aggregate(leaves: &[RowNode], columns: &[ColumnDef]) -> BTreeMap<String, f64> {
    columns
        .iter()
        .filter_map(|column| {
            let agg = column.agg_func.as_ref()?;
            let values: Vec<f64> = leaves
                .iter()
                .filter_map(|row| as_number(row.get(&column.field)))
                .collect();
            Some((column.field.clone(), agg.aggregate(&values, leaves.len())))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::model::AggFunc;

    fn rows() -> Vec<RowNode> {
        vec![
            RowNode::data("1", json!({ "region": "EU", "tier": 1, "amount": 10 }), 0),
            RowNode::data("2", json!({ "region": "US", "tier": 1, "amount": 5 }), 1),
            RowNode::data("3", json!({ "region": "EU", "tier": 2, "amount": 30 }), 2),
            RowNode::data("4", json!({ "tier": 2, "amount": 1 }), 3),
        ]
    }

    #[test]
    fn test_groups_keep_first_appearance_order() {
        let groups = group_by_fields(rows(), &["region".to_string()], &[]);
        let ids: Vec<_> = groups.iter().map(|g| g.id.as_str()).collect();
        assert_eq!(ids, vec!["group:region=EU", "group:region=US", "group:region=null"]);
        assert_eq!(groups[0].group().map(|g| g.leaf_count), Some(2));
    }

    #[test]
    fn test_interleaved_rows_land_in_their_bucket() {
        let rows: Vec<_> = (0..3000)
            .map(|i| RowNode::data(i.to_string(), json!({ "shard": i % 300 }), i))
            .collect();
        let groups = group_by_fields(rows, &["shard".to_string()], &[]);
        assert_eq!(groups.len(), 300);
        assert_eq!(groups[0].id, "group:shard=0");
        assert_eq!(groups[299].id, "group:shard=299");
        assert!(groups.iter().all(|g| g.group().map(|g| g.leaf_count) == Some(10)));
    }

    #[test]
    fn test_nested_groups_and_aggregations() {
        let columns = vec![ColumnDef::new("amount").agg(AggFunc::Sum)];
        let groups = group_by_fields(rows(), &["region".to_string(), "tier".to_string()], &columns);
        let eu = groups[0].group().unwrap();
        assert_eq!(eu.aggregations.get("amount"), Some(&40.0));
        assert_eq!(eu.group_children.len(), 2);
        assert_eq!(eu.group_children[1].id, "group:region=EU|tier=2");
        assert_eq!(eu.group_children[1].level, Some(1));
        assert_eq!(groups[0].data["amount"], json!(40.0));
    }
}
