//! Argument-key alias canonicalization.
//!
//! Keys are squashed (lowercased, non-alphanumerics stripped) and looked up in
//! a fixed canonical map covering the common equivalents models emit. Keys
//! outside the map are kept as-is.

use serde_json::{Map, Value};

/// Squashed-alias → canonical key. Canonical keys squash to an entry that
/// maps back to themselves, which keeps normalization idempotent.
const CANONICAL: &[(&str, &str)] = &[
    ("path", "path"),
    ("filepath", "path"),
    ("filename", "path"),
    ("file", "path"),
    ("targetpath", "path"),
    ("pattern", "pattern"),
    ("globpattern", "pattern"),
    ("filepattern", "pattern"),
    ("searchpattern", "pattern"),
    ("command", "command"),
    ("cmd", "command"),
    ("script", "command"),
    ("shellcommand", "command"),
    ("cwd", "cwd"),
    ("workingdirectory", "cwd"),
    ("workdir", "cwd"),
    ("content", "content"),
    ("contents", "content"),
    ("text", "content"),
    ("streamcontent", "content"),
    ("force", "force"),
    ("recursive", "force"),
    ("oldstring", "old_string"),
    ("newstring", "new_string"),
];

fn squash(key: &str) -> String {
    key.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Canonical name for an argument key, or `None` when the key is not aliased.
pub fn canonical_key(key: &str) -> Option<&'static str> {
    let squashed = squash(key);
    CANONICAL
        .iter()
        .find(|(alias, _)| *alias == squashed)
        .map(|(_, canon)| *canon)
}

/// Rewrites every aliased key to its canonical name.
///
/// When an alias and its canonical key are both present with different
/// values, the canonical value wins and the alias is reported in the
/// collision list. Two aliases of the same canonical key collide the same
/// way: first writer wins.
pub fn normalize_keys(input: Map<String, Value>) -> (Map<String, Value>, Vec<String>) {
    let mut out = Map::new();
    let mut collisions = Vec::new();

    // Canonical-named keys first so they win over any alias.
    for (key, value) in &input {
        if canonical_key(key) == Some(key.as_str()) {
            out.insert(key.clone(), value.clone());
        }
    }
    for (key, value) in input {
        let Some(canon) = canonical_key(&key) else {
            out.entry(key).or_insert(value);
            continue;
        };
        if canon == key {
            continue;
        }
        match out.get(canon) {
            Some(existing) if *existing != value => collisions.push(key),
            Some(_) => {}
            None => {
                out.insert(canon.to_string(), value);
            }
        }
    }
    (out, collisions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(v: Value) -> Map<String, Value> {
        v.as_object().unwrap().clone()
    }

    #[test]
    fn squashed_lookup_handles_casing_and_separators() {
        assert_eq!(canonical_key("filePath"), Some("path"));
        assert_eq!(canonical_key("FILE_PATH"), Some("path"));
        assert_eq!(canonical_key("old_string"), Some("old_string"));
        assert_eq!(canonical_key("oldString"), Some("old_string"));
        assert_eq!(canonical_key("unknown_key"), None);
    }

    #[test]
    fn alias_rewritten_to_canonical() {
        let (out, collisions) = normalize_keys(map(json!({"cmd": "ls"})));
        assert_eq!(out.get("command"), Some(&json!("ls")));
        assert!(collisions.is_empty());
    }

    #[test]
    fn canonical_wins_on_collision() {
        let (out, collisions) =
            normalize_keys(map(json!({"path": "canon.txt", "filePath": "alias.txt"})));
        assert_eq!(out.get("path"), Some(&json!("canon.txt")));
        assert_eq!(collisions, vec!["filePath"]);
    }

    #[test]
    fn equal_alias_value_is_not_a_collision() {
        let (out, collisions) = normalize_keys(map(json!({"path": "same", "file": "same"})));
        assert_eq!(out.get("path"), Some(&json!("same")));
        assert!(collisions.is_empty());
    }

    #[test]
    fn unknown_keys_pass_through() {
        let (out, _) = normalize_keys(map(json!({"limit": 10})));
        assert_eq!(out.get("limit"), Some(&json!(10)));
    }
}
