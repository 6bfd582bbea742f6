/// Library type definitions
///
/// A library read yields either a stored entry or a directory listing computed
/// from the secondary index. Both serialize to the JSON shapes the flow editor expects:
/// an entry is `{meta, body}`, a listing is an array of directory names followed by
/// file metadata objects carrying `fn`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A stored library entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LibraryEntry {
    /// Descriptive attributes, indexed by the listing view
    #[serde(default)]
    pub meta: Value,
    /// Opaque content, e.g. function source or a subflow
    #[serde(default)]
    pub body: Value,
}

/// One item in a directory listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ListingItem {
    /// Immediate child directory name
    Directory(String),
    /// Metadata of an immediate child entry, including its `fn` segment
    File(Map<String, Value>),
}

impl ListingItem {
    /// Directory name, if this item is a directory
    pub fn as_directory(&self) -> Option<&str> {
        match self {
            ListingItem::Directory(name) => Some(name),
            ListingItem::File(_) => None,
        }
    }

    /// Final path segment of a file entry
    pub fn file_name(&self) -> Option<&str> {
        match self {
            ListingItem::Directory(_) => None,
            ListingItem::File(meta) => meta.get("fn").and_then(Value::as_str),
        }
    }
}

/// Result of resolving a library `(type, path)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LibraryValue {
    /// Directories first in discovery order, then files in index order
    ///
    /// Must stay ahead of `Entry`, which also deserializes from a short array.
    Listing(Vec<ListingItem>),
    Entry(LibraryEntry),
}

impl LibraryValue {
    pub fn as_entry(&self) -> Option<&LibraryEntry> {
        match self {
            LibraryValue::Entry(entry) => Some(entry),
            LibraryValue::Listing(_) => None,
        }
    }

    pub fn as_listing(&self) -> Option<&[ListingItem]> {
        match self {
            LibraryValue::Entry(_) => None,
            LibraryValue::Listing(items) => Some(items),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn listing_reads_back_as_listing() {
        let listing = LibraryValue::Listing(vec![
            ListingItem::Directory("util".into()),
            ListingItem::File(json!({ "fn": "add", "outputs": 1 }).as_object().cloned().unwrap()),
        ]);
        let wire = serde_json::to_value(&listing).unwrap();
        assert_eq!(wire, json!(["util", { "fn": "add", "outputs": 1 }]));
        assert_eq!(serde_json::from_value::<LibraryValue>(wire).unwrap(), listing);
    }

    #[test]
    fn empty_and_short_arrays_are_listings() {
        let empty: LibraryValue = serde_json::from_value(json!([])).unwrap();
        assert_eq!(empty, LibraryValue::Listing(Vec::new()));

        let pair: LibraryValue = serde_json::from_value(json!(["a", "b"])).unwrap();
        assert_eq!(pair.as_listing().unwrap().len(), 2);
        assert!(pair.as_entry().is_none());
    }

    #[test]
    fn entry_reads_back_as_entry() {
        let entry = LibraryValue::Entry(LibraryEntry { meta: json!({ "outputs": 1 }), body: json!("return msg;") });
        let wire = serde_json::to_value(&entry).unwrap();
        assert_eq!(wire, json!({ "meta": { "outputs": 1 }, "body": "return msg;" }));
        assert_eq!(serde_json::from_value::<LibraryValue>(wire).unwrap(), entry);
    }
}
