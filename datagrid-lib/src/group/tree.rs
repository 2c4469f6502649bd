//! Explicit parent/child trees.

use serde_json::Value;

use crate::model::RowIdSource;
use crate::model::RowNode;
use crate::pipeline::Materializer;
use crate::value::get_path;

/// Attaches child rows read from `children_field` to each root row,
/// recursively.
///
/// Children get ids from [`RowIdSource::resolve_child`] and carry the
/// same override and selection treatment as root rows.
pub fn build_tree(roots: Vec<RowNode>, children_field: &str, materializer: &Materializer<'_>) -> Vec<RowNode> {
    roots
        .into_iter()
        .map(|mut root| {
            root.children = build_children(&root, children_field, materializer, 1);
            root
        })
        .collect()
}

fn build_children(
    parent: &RowNode,
    children_field: &str,
    materializer: &Materializer<'_>,
    level: usize,
) -> Vec<RowNode> {
    let Some(Value::Array(items)) = get_path(&parent.data, children_field) else {
        return Vec::new();
    };

    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let id = materializer.row_id.resolve_child(item, &parent.id, index);
            let mut child = materializer.materialize(id, item, index);
            child.level = Some(level);
            child.children = build_children(&child, children_field, materializer, level + 1);
            child
        })
        .collect()
}

/// Finds the path of child indices leading to a row id inside raw data.
///
/// Root rows resolve through `row_id` with their position; children the
/// same way as [`build_tree`]. Returns `(root_index, child_path)`.
pub fn locate_in_tree(
    raw: &[Value],
    row_id: &RowIdSource,
    children_field: &str,
    target: &str,
) -> Option<(usize, Vec<usize>)> {
    for (index, data) in raw.iter().enumerate() {
        let id = row_id.resolve(data, index);
        if id == target {
            return Some((index, Vec::new()));
        }
        let mut path = Vec::new();
        if locate_child(data, &id, row_id, children_field, target, &mut path) {
            return Some((index, path));
        }
    }
    None
}

fn locate_child(
    data: &Value,
    parent_id: &str,
    row_id: &RowIdSource,
    children_field: &str,
    target: &str,
    path: &mut Vec<usize>,
) -> bool {
    let Some(Value::Array(items)) = get_path(data, children_field) else {
        return false;
    };
    for (index, item) in items.iter().enumerate() {
        let id = row_id.resolve_child(item, parent_id, index);
        path.push(index);
        if id == target || locate_child(item, &id, row_id, children_field, target, path) {
            return true;
        }
        path.pop();
    }
    false
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use serde_json::json;

    use super::*;
    use crate::group::ExpandState;
    use crate::group::flatten;
    use crate::model::OverrideMap;

    #[test]
    fn test_children_flatten_only_when_expanded() {
        let raw = vec![json!({ "name": "p", "children": [{ "name": "c1" }, { "name": "c2" }] })];
        let row_id = RowIdSource::Index;
        let overrides = OverrideMap::new();
        let selection = HashSet::new();
        let materializer = Materializer::new(&row_id, &overrides, &selection);
        let roots = vec![materializer.materialize("row-0".to_string(), &raw[0], 0)];

        let tree = build_tree(roots, "children", &materializer);
        assert_eq!(tree[0].children[1].id, "row-0-1");

        let collapsed = flatten(tree.clone(), &ExpandState::default());
        assert_eq!(collapsed.len(), 1);
        assert_eq!(collapsed[0].expanded, Some(false));

        let mut expand = ExpandState::default();
        expand.set_row_expanded("row-0", true);
        let expanded = flatten(tree, &expand);
        assert_eq!(expanded.len(), 3);
        assert_eq!(expanded[2].level, Some(1));
        assert_eq!(expanded[2].row_index, 2);
    }

    #[test]
    fn test_locate_nested_child() {
        let raw = vec![
            json!({ "children": [] }),
            json!({ "children": [{ "children": [{ "x": 1 }] }] }),
        ];
        let found = locate_in_tree(&raw, &RowIdSource::Index, "children", "row-1-0-0");
        assert_eq!(found, Some((1, vec![0, 0])));
    }
}
