//! Locating the active paginated connection in a response tree.
//!
//! Responses have no fixed schema; the only structural knowledge needed is
//! that at most one paginated connection is active per request, marked by a
//! `pageInfo` object with a sibling `nodes` or `edges` list.

use serde_json::{Map, Value};

use crate::error::GraphqlClientError;

static NO_ITEMS: [Value; 0] = [];

/// Cursor-based page info.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageInfo {
    /// Cursor of the last item in the page.
    pub end_cursor: String,
    /// Cursor of the first item in the page.
    pub start_cursor: String,
    /// Whether a page precedes this one.
    pub has_previous_page: bool,
    /// Whether another page follows.
    pub has_next_page: bool,
}

impl PageInfo {
    /// Read page info out of a response subtree.
    ///
    /// A missing or non-object value yields the default: no cursors, no
    /// further pages. Absent pagination metadata means "no more pages",
    /// never an error.
    #[must_use]
    pub fn from_value(value: Option<&Value>) -> Self {
        let Some(map) = value.and_then(Value::as_object) else {
            return Self::default();
        };
        Self {
            end_cursor: string_field(map, "endCursor"),
            start_cursor: string_field(map, "startCursor"),
            has_previous_page: bool_field(map, "hasPreviousPage"),
            has_next_page: bool_field(map, "hasNextPage"),
        }
    }
}

fn string_field(map: &Map<String, Value>, key: &str) -> String {
    map.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn bool_field(map: &Map<String, Value>, key: &str) -> bool {
    map.get(key).and_then(Value::as_bool).unwrap_or_default()
}

/// The active paginated connection located inside a response tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Connection<'a> {
    /// Pagination metadata for this page.
    pub page_info: PageInfo,
    /// Data items: the `nodes` list, or the `edges` list with its wrapper
    /// objects intact.
    pub items: &'a [Value],
}

impl Connection<'_> {
    fn empty() -> Self {
        Connection {
            page_info: PageInfo::default(),
            items: &NO_ITEMS,
        }
    }
}

fn connection_at(map: &Map<String, Value>) -> Connection<'_> {
    let items = map
        .get("nodes")
        .or_else(|| map.get("edges"))
        .and_then(Value::as_array)
        .map_or(&NO_ITEMS[..], Vec::as_slice);
    Connection {
        page_info: PageInfo::from_value(map.get("pageInfo")),
        items,
    }
}

/// Locate the active connection by walking the tree for a `pageInfo` key.
///
/// Pre-order depth-first search over mapping values; the first `pageInfo`
/// found wins, with its sibling `nodes`/`edges` as the items. A tree that
/// legitimately holds two paginated connections is unsupported: only the
/// first is returned. A tree with no `pageInfo` at all yields an empty
/// connection (no items, no further pages).
#[must_use]
pub fn find_connection(tree: &Value) -> Connection<'_> {
    walk(tree).map_or_else(Connection::empty, connection_at)
}

fn walk(value: &Value) -> Option<&Map<String, Value>> {
    let map = value.as_object()?;
    if map.contains_key("pageInfo") {
        return Some(map);
    }
    map.values().find_map(walk)
}

/// Locate a connection keyed by its node-type name.
///
/// Descends through single-key mappings until the key `name` is found;
/// that sub-mapping's `nodes` (if present) else `edges`, together with its
/// `pageInfo`, is the connection. Every mapping on the path, including the
/// one carrying `name`, must have exactly one key; a violation, or a path
/// that ends without finding `name`, signals that the response shape no
/// longer matches the query.
pub fn find_connection_named<'a>(
    tree: &'a Value,
    name: &str,
) -> Result<Connection<'a>, GraphqlClientError> {
    let map = tree.as_object().ok_or_else(|| {
        GraphqlClientError::structure(format!(
            "expected an object while searching for `{name}`, found {tree}"
        ))
    })?;

    if map.len() != 1 {
        return Err(GraphqlClientError::structure(format!(
            "expected a single key on the path to `{name}`, found {}",
            map.len()
        )));
    }
    let (key, child) = map.iter().next().ok_or_else(|| {
        GraphqlClientError::structure(format!("empty object while searching for `{name}`"))
    })?;

    if key == name {
        let connection = child.as_object().ok_or_else(|| {
            GraphqlClientError::structure(format!("`{name}` is not an object"))
        })?;
        return Ok(connection_at(connection));
    }
    find_connection_named(child, name)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_find_connection_with_nodes() {
        let tree = json!({
            "repository": {
                "issues": {
                    "pageInfo": {
                        "endCursor": "c1",
                        "startCursor": "c0",
                        "hasPreviousPage": false,
                        "hasNextPage": true
                    },
                    "nodes": [{"title": "first"}, {"title": "second"}]
                }
            }
        });

        let connection = find_connection(&tree);
        assert_eq!(connection.page_info.end_cursor, "c1");
        assert!(connection.page_info.has_next_page);
        assert_eq!(connection.items.len(), 2);
        assert_eq!(
            connection.items[0].pointer("/title").and_then(Value::as_str),
            Some("first")
        );
    }

    #[test]
    fn test_find_connection_with_edges() {
        let tree = json!({
            "repository": {
                "stargazers": {
                    "pageInfo": {"endCursor": "s1", "hasNextPage": false},
                    "edges": [
                        {"starredAt": "2024-01-01T00:00:00Z", "node": {"login": "a"}},
                        {"starredAt": "2024-01-02T00:00:00Z", "node": {"login": "b"}}
                    ]
                }
            }
        });

        let connection = find_connection(&tree);
        assert!(!connection.page_info.has_next_page);
        // Edge wrappers are kept: extra fields like starredAt survive.
        assert_eq!(
            connection.items[1]
                .pointer("/node/login")
                .and_then(Value::as_str),
            Some("b")
        );
        assert!(connection.items[0].get("starredAt").is_some());
    }

    #[test]
    fn test_first_page_info_wins() {
        let tree = json!({
            "issues": {
                "pageInfo": {"endCursor": "issues-cursor", "hasNextPage": true},
                "nodes": [1]
            },
            "pullRequests": {
                "pageInfo": {"endCursor": "prs-cursor", "hasNextPage": true},
                "nodes": [2]
            }
        });

        let connection = find_connection(&tree);
        assert_eq!(connection.page_info.end_cursor, "issues-cursor");
    }

    #[test]
    fn test_missing_page_info_means_no_more_pages() {
        let tree = json!({"viewer": {"id": "user-1"}});
        let connection = find_connection(&tree);
        assert!(!connection.page_info.has_next_page);
        assert!(connection.page_info.end_cursor.is_empty());
        assert!(connection.items.is_empty());
    }

    #[test]
    fn test_walk_does_not_descend_into_arrays() {
        let tree = json!({
            "results": [
                {"pageInfo": {"endCursor": "buried", "hasNextPage": true}}
            ]
        });
        let connection = find_connection(&tree);
        assert!(connection.page_info.end_cursor.is_empty());
    }

    #[test]
    fn test_find_named_two_levels_deep() {
        let tree = json!({
            "repository": {
                "stargazers": {
                    "pageInfo": {"endCursor": "s9", "hasNextPage": true},
                    "edges": [{"node": {"login": "a"}}]
                }
            }
        });

        let connection = find_connection_named(&tree, "stargazers").expect("found");
        assert_eq!(connection.page_info.end_cursor, "s9");
        assert_eq!(connection.items.len(), 1);
    }

    #[test]
    fn test_find_named_prefers_nodes_over_edges() {
        let tree = json!({
            "issues": {
                "pageInfo": {"hasNextPage": false},
                "nodes": [{"title": "n"}],
                "edges": [{"node": {"title": "e"}}]
            }
        });

        let connection = find_connection_named(&tree, "issues").expect("found");
        assert_eq!(
            connection.items[0].pointer("/title").and_then(Value::as_str),
            Some("n")
        );
    }

    #[test]
    fn test_find_named_missing_is_structural_error() {
        let tree = json!({"repository": {"issues": {"nodes": []}}});
        let err = find_connection_named(&tree, "stargazers").expect_err("missing");
        assert!(matches!(err, GraphqlClientError::Structure { .. }));
    }

    #[test]
    fn test_find_named_rejects_siblings_beside_the_target() {
        // The single-key invariant holds at every level, including the one
        // carrying the target itself.
        let tree = json!({
            "stargazers": {
                "pageInfo": {"hasNextPage": false},
                "edges": []
            },
            "viewer": {"id": "user-1"}
        });
        let err = find_connection_named(&tree, "stargazers").expect_err("ambiguous");
        assert!(matches!(err, GraphqlClientError::Structure { .. }));
    }

    #[test]
    fn test_find_named_rejects_multi_key_path() {
        let tree = json!({
            "repository": {"id": "r1", "name": "demo"},
            "viewer": {"id": "user-1"}
        });
        let err = find_connection_named(&tree, "stargazers").expect_err("ambiguous");
        assert!(matches!(err, GraphqlClientError::Structure { .. }));
    }

    #[test]
    fn test_page_info_defaults_for_partial_objects() {
        let info = PageInfo::from_value(Some(&json!({"hasNextPage": true})));
        assert!(info.has_next_page);
        assert!(!info.has_previous_page);
        assert!(info.end_cursor.is_empty());
    }
}
