/// Secondary index over library document ids
///
/// Two views live in the `library` design document:
/// - `flow_entries_by_app_and_type`: `[prefix, "flow"] -> {path}` for ids whose third
///   segment is `flow`
/// - `lib_entries_by_app_and_type`: for every other library id, one `{dir}` row per
///   ancestor directory prefix and one `meta + fn` row keyed by the parent directory
///
/// The map functions are JavaScript for the server; `flow_rows` and `library_rows`
/// produce the same rows natively for clients without a view engine.

use crate::client::{DesignDocument, ViewDefinition, ViewRow};
use crate::library::path;
use crate::library::types::ListingItem;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

/// Design document name, installed at `_design/library`
pub const DESIGN_DOC: &str = "library";
/// View listing flow entries per namespace
pub const FLOW_VIEW: &str = "flow_entries_by_app_and_type";
/// View listing library directories and entries per namespace, type and directory
pub const LIBRARY_VIEW: &str = "lib_entries_by_app_and_type";

const FLOW_MAP: &str = r#"function (doc) {
    var p = doc._id.split("/");
    if (p.length > 2 && p[2] == "flow") {
        emit([p[0], p[2]], { path: p.slice(3).join("/") });
    }
}"#;

const LIBRARY_MAP: &str = r#"function (doc) {
    var p = doc._id.split("/");
    if (p.length > 2 && p[2] != "flow") {
        var dirs = p.slice(3, -1);
        for (var i = 0; i < dirs.length; i++) {
            emit([p[0], p[2], dirs.slice(0, i).join("/")], { dir: dirs[i] });
        }
        var meta = {};
        if (doc.meta && typeof doc.meta == "object") {
            for (var key in doc.meta) {
                meta[key] = doc.meta[key];
            }
        }
        meta.fn = p[p.length - 1];
        emit([p[0], p[2], dirs.join("/")], meta);
    }
}"#;

/// The design document installed when the database is created
pub fn design_document() -> DesignDocument {
    let mut views = BTreeMap::new();
    views.insert(FLOW_VIEW.to_string(), ViewDefinition { map: FLOW_MAP.to_string() });
    views.insert(LIBRARY_VIEW.to_string(), ViewDefinition { map: LIBRARY_MAP.to_string() });
    DesignDocument { views }
}

/// Rows the flow view emits for a document id
pub fn flow_rows(doc_id: &str) -> Vec<(Value, Value)> {
    let p: Vec<&str> = doc_id.split('/').collect();
    if p.len() > 2 && p[2] == "flow" {
        vec![(json!([p[0], p[2]]), json!({ "path": p[3..].join("/") }))]
    } else {
        Vec::new()
    }
}

/// Rows the library view emits for a document id and its `meta`
pub fn library_rows(doc_id: &str, meta: &Value) -> Vec<(Value, Value)> {
    let p: Vec<&str> = doc_id.split('/').collect();
    if p.len() <= 2 || p[2] == "flow" {
        return Vec::new();
    }

    let dirs: &[&str] = if p.len() > 4 { &p[3..p.len() - 1] } else { &[] };
    let mut rows = Vec::with_capacity(dirs.len() + 1);
    for i in 0..dirs.len() {
        rows.push((json!([p[0], p[2], dirs[..i].join("/")]), json!({ "dir": dirs[i] })));
    }

    let mut leaf = match meta {
        Value::Object(fields) => fields.clone(),
        _ => Map::new(),
    };
    leaf.insert("fn".to_string(), Value::String(p[p.len() - 1].to_string()));
    rows.push((json!([p[0], p[2], dirs.join("/")]), Value::Object(leaf)));
    rows
}

/// Composite key for listing the directory at `path`
pub fn listing_key(prefix: &str, lib_type: &str, dir: &str) -> Value {
    json!([prefix, lib_type, path::index_path(dir)])
}

/// Fold library view rows into a listing: unique directories first, then files
pub fn build_listing(rows: &[ViewRow]) -> Vec<ListingItem> {
    let mut dirs: Vec<String> = Vec::new();
    let mut files = Vec::new();

    for row in rows {
        match row.value.get("dir").and_then(Value::as_str) {
            Some(dir) => {
                if !dirs.iter().any(|d| d == dir) {
                    dirs.push(dir.to_string());
                }
            }
            None => {
                if let Value::Object(meta) = &row.value {
                    files.push(ListingItem::File(meta.clone()));
                }
            }
        }
    }

    dirs.into_iter().map(ListingItem::Directory).chain(files).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(key: Value, value: Value) -> ViewRow {
        ViewRow { id: None, key, value }
    }

    #[test]
    fn library_rows_emit_ancestors_and_leaf() {
        let rows = library_rows("ns/lib/functions/a/b/c", &json!({"name": "x"}));
        assert_eq!(
            rows,
            vec![
                (json!(["ns", "functions", ""]), json!({"dir": "a"})),
                (json!(["ns", "functions", "a"]), json!({"dir": "b"})),
                (json!(["ns", "functions", "a/b"]), json!({"name": "x", "fn": "c"})),
            ]
        );
    }

    #[test]
    fn library_rows_ignore_singletons_and_flow_entries() {
        assert!(library_rows("ns/flow", &Value::Null).is_empty());
        assert!(library_rows("ns/lib/flow/a", &Value::Null).is_empty());
        assert_eq!(flow_rows("ns/lib/flow/a/b"), vec![(json!(["ns", "flow"]), json!({"path": "a/b"}))]);
        assert!(flow_rows("ns/lib/functions/a").is_empty());
    }

    #[test]
    fn non_object_meta_still_gets_fn() {
        let rows = library_rows("ns/lib/flows/a", &json!("meta1"));
        assert_eq!(rows, vec![(json!(["ns", "flows", ""]), json!({"fn": "a"}))]);
    }

    #[test]
    fn listing_puts_unique_directories_first() {
        let rows = vec![
            row(json!(["ns", "t", ""]), json!({"fn": "top"})),
            row(json!(["ns", "t", ""]), json!({"dir": "b"})),
            row(json!(["ns", "t", ""]), json!({"dir": "a"})),
            row(json!(["ns", "t", ""]), json!({"dir": "b"})),
            row(json!(["ns", "t", ""]), json!({"fn": "other"})),
        ];
        let listing = build_listing(&rows);
        let dirs: Vec<_> = listing.iter().filter_map(ListingItem::as_directory).collect();
        let files: Vec<_> = listing.iter().filter_map(ListingItem::file_name).collect();
        assert_eq!(dirs, vec!["b", "a"]);
        assert_eq!(files, vec!["top", "other"]);
        assert_eq!(listing[0], ListingItem::Directory("b".into()));
        assert_eq!(listing[2].file_name(), Some("top"));
    }

    #[test]
    fn listing_key_uses_collapsed_path() {
        assert_eq!(listing_key("ns", "flows", "/a/"), json!(["ns", "flows", "a"]));
        assert_eq!(listing_key("ns", "flows", ""), json!(["ns", "flows", ""]));
    }

    #[test]
    fn design_document_has_both_views() {
        let ddoc = design_document();
        assert!(ddoc.views.contains_key(FLOW_VIEW));
        assert!(ddoc.views[LIBRARY_VIEW].map.contains("emit"));
    }
}
