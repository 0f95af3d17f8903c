//! Rule names to file names.
//!
//! Sibling names are made unique first, then normalized into file and
//! directory names. Both steps are pure; the source tree is never renamed in
//! place.

use std::collections::HashMap;

use crate::types::RuleNode;

/// Normalized name of the tree root, whatever its literal name.
pub const ROOT_UNIT_NAME: &str = "rules";

/// Fallback for names that normalize to nothing.
pub const EMPTY_NAME_FALLBACK: &str = "rule";

/// File extension of structured units.
pub const UNIT_EXTENSION: &str = "jsonnet";

/// Turn a rule name into a file name component.
///
/// Leading and trailing whitespace is removed, each remaining space becomes
/// an underscore, and anything that is not alphanumeric, `-`, `_` or `.` is
/// dropped. Names left empty (or made only of dots) become
/// [`EMPTY_NAME_FALLBACK`].
///
/// ```rust
/// use akamai_jsonnet::naming::normalize_name;
///
/// assert_eq!(normalize_name("  Static Content (v2) "), "Static_Content_v2");
/// ```
pub fn normalize_name(name: &str) -> String {
    let normalized: String = name
        .trim()
        .chars()
        .map(|c| if c == ' ' { '_' } else { c })
        .filter(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.'))
        .collect();

    // Empty or dot-only names would address the parent directory.
    if normalized.chars().all(|c| c == '.') {
        EMPTY_NAME_FALLBACK.to_string()
    } else {
        normalized
    }
}

/// File name of a unit with the given normalized name.
pub fn unit_file_name(normalized: &str) -> String {
    format!("{}.{}", normalized, UNIT_EXTENSION)
}

/// Join relative `/`-separated path components, skipping empty ones.
pub fn join_path(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", dir, name)
    }
}

/// Emitted names for a list of siblings.
///
/// Names are counted case-insensitively in list order. The first occurrence
/// keeps its name; the Nth (N ≥ 2) becomes `"<name> N"`. The counter only
/// spans this one list.
pub fn disambiguate<'a, I>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen: HashMap<String, usize> = HashMap::new();
    names
        .into_iter()
        .map(|name| {
            let count = seen.entry(name.to_lowercase()).or_insert(0);
            *count += 1;
            if *count > 1 {
                format!("{} {}", name, count)
            } else {
                name.to_string()
            }
        })
        .collect()
}

/// A child rule paired with the name it is emitted under.
#[derive(Debug, Clone, Copy)]
pub struct NamedChild<'a> {
    /// Disambiguated name.
    pub name: &'a str,
    /// Source node (its own `name` field is ignored).
    pub node: &'a RuleNode,
}

/// Pair every child of `parent` with its emitted name.
pub fn named_children<'a>(parent: &'a RuleNode, names: &'a [String]) -> Vec<NamedChild<'a>> {
    parent
        .children
        .iter()
        .zip(names)
        .map(|(node, name)| NamedChild { name: name.as_str(), node })
        .collect()
}

/// Disambiguated names of the children of `parent`.
pub fn child_names(parent: &RuleNode) -> Vec<String> {
    disambiguate(parent.children.iter().map(|c| c.name.as_str()))
}
