/// Library path normalization and document keys
///
/// Library entries live at `<prefix>/lib/<type><path>` where `<path>` is either empty
/// or starts with a separator and has no empty segments. The same collapsed form is
/// used for document lookups and cache keys; the index is queried with the collapsed
/// path minus its leading separator, which is how the listing view emits it.

pub const SEPARATOR: char = '/';

/// Non-empty path segments
pub fn segments(path: &str) -> Vec<&str> {
    path.split(SEPARATOR).filter(|s| !s.is_empty()).collect()
}

/// Collapse duplicate, leading and trailing separators; non-empty results start with `/`
pub fn normalize(path: &str) -> String {
    join_rooted(&segments(path))
}

/// Path in the form the listing view uses as its key: `a/b`, or `` for the root
pub fn index_path(path: &str) -> String {
    segments(path).join("/")
}

fn join_rooted(segments: &[&str]) -> String {
    if segments.is_empty() {
        String::new()
    } else {
        format!("{}{}", SEPARATOR, segments.join("/"))
    }
}

/// Document id of the library entry at `path`
pub fn entry_id(prefix: &str, lib_type: &str, path: &str) -> String {
    format!("{}/lib/{}{}", prefix, lib_type, normalize(path))
}

/// Ids of `path` and every ancestor directory, root first
///
/// For `a/b` this is `<prefix>/lib/<type>`, `<prefix>/lib/<type>/a` and
/// `<prefix>/lib/<type>/a/b`.
pub fn ancestor_ids(prefix: &str, lib_type: &str, path: &str) -> Vec<String> {
    let segs = segments(path);
    (0..=segs.len())
        .map(|i| format!("{}/lib/{}{}", prefix, lib_type, join_rooted(&segs[..i])))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_collapses_separators() {
        assert_eq!(normalize("//a//b/"), "/a/b");
        assert_eq!(normalize("a/b"), "/a/b");
        assert_eq!(normalize("/a/b"), "/a/b");
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("///"), "");
    }

    #[test]
    fn normalize_is_idempotent() {
        for p in ["", "a", "/a/", "//a//b/", "x/y/z"] {
            assert_eq!(normalize(&normalize(p)), normalize(p));
        }
    }

    #[test]
    fn entry_ids_agree_regardless_of_input_form() {
        assert_eq!(entry_id("ns", "flows", "//a//b/"), "ns/lib/flows/a/b");
        assert_eq!(entry_id("ns", "flows", "a/b"), "ns/lib/flows/a/b");
        assert_eq!(entry_id("ns", "flows", ""), "ns/lib/flows");
    }

    #[test]
    fn index_path_drops_leading_and_trailing_separators() {
        assert_eq!(index_path("/a/b/"), "a/b");
        assert_eq!(index_path("/"), "");
    }

    #[test]
    fn ancestors_walk_from_root() {
        assert_eq!(
            ancestor_ids("ns", "functions", "/a/b"),
            vec!["ns/lib/functions", "ns/lib/functions/a", "ns/lib/functions/a/b"]
        );
        assert_eq!(ancestor_ids("ns", "functions", ""), vec!["ns/lib/functions"]);
    }
}
