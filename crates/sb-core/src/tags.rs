//! Tag canonicalization and alias resolution.
//!
//! `normalize` is a pure function of its inputs: the same tag set and
//! alias table always produce an equal result set, regardless of input
//! ordering. It is invoked repeatedly across the pipeline, so both
//! idempotence and order-independence are load-bearing properties.

use std::collections::{BTreeMap, BTreeSet};

/// Maps recognized synonym/variant strings to one canonical tag string.
pub type AliasTable = BTreeMap<String, String>;

/// Canonical form of a single raw tag: lowercased, trimmed, internal
/// whitespace runs collapsed to a single hyphen.
#[must_use]
pub fn canonical(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();
    let mut out = String::with_capacity(lowered.len());
    let mut pending_gap = false;
    for ch in lowered.chars() {
        if ch.is_whitespace() {
            pending_gap = true;
        } else {
            if pending_gap && !out.is_empty() {
                out.push('-');
            }
            pending_gap = false;
            out.push(ch);
        }
    }
    out
}

/// Resolve one tag through the alias table, following chains to a
/// fixpoint. A cyclic table settles on the smallest cycle member, so the
/// result is stable no matter where the chain entered the cycle.
fn resolve(raw: &str, aliases: &AliasTable) -> String {
    let mut tag = canonical(raw);
    let mut seen: Vec<String> = Vec::new();
    while let Some(target) = aliases.get(&tag) {
        let target = canonical(target);
        if target == tag {
            break;
        }
        if let Some(pos) = seen.iter().position(|s| s == &target) {
            if let Some(min) = seen[pos..].iter().min() {
                if *min < tag {
                    tag = min.clone();
                }
            }
            break;
        }
        seen.push(tag);
        tag = target;
    }
    tag
}

/// Normalize a tag set: canonicalize each tag, substitute aliases,
/// deduplicate. Unknown tags pass through in canonical form; empty tags
/// are dropped.
pub fn normalize<I, S>(tags: I, aliases: &AliasTable) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tags.into_iter()
        .map(|t| resolve(t.as_ref(), aliases))
        .filter(|t| !t.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn table(pairs: &[(&str, &str)]) -> AliasTable {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn canonical_lowercases_and_hyphenates() {
        assert_eq!(canonical("  Machine   Learning "), "machine-learning");
        assert_eq!(canonical("Rust"), "rust");
        assert_eq!(canonical("topic/Rust"), "topic/rust");
        assert_eq!(canonical("   "), "");
    }

    #[test]
    fn aliases_substitute_after_canonicalization() {
        let aliases = table(&[("ml", "machine-learning"), ("rustlang", "rust")]);
        let out = normalize(["ML", "RustLang", "go"], &aliases);
        let expected: Vec<&str> = vec!["go", "machine-learning", "rust"];
        assert_eq!(out.iter().map(String::as_str).collect::<Vec<_>>(), expected);
    }

    #[test]
    fn synonyms_collapse_to_one_tag() {
        let aliases = table(&[("ai", "machine-learning"), ("ml", "machine-learning")]);
        let out = normalize(["AI", "ml", "Machine Learning"], &aliases);
        assert_eq!(out.len(), 1);
        assert!(out.contains("machine-learning"));
    }

    #[test]
    fn alias_chains_resolve_to_fixpoint() {
        let aliases = table(&[("js", "javascript"), ("javascript", "ecmascript")]);
        let out = normalize(["JS"], &aliases);
        assert!(out.contains("ecmascript"));
        // already-normalized input maps to itself
        assert_eq!(normalize(out.iter(), &aliases), out);
    }

    #[test]
    fn unknown_tags_pass_through() {
        let out = normalize(["Something New"], &AliasTable::new());
        assert!(out.contains("something-new"));
    }

    proptest! {
        #[test]
        fn normalize_is_idempotent(
            tags in proptest::collection::vec("[a-zA-Z /-]{0,12}", 0..8),
            pairs in proptest::collection::vec(("[a-z-]{1,8}", "[a-z-]{1,8}"), 0..6),
        ) {
            let aliases: AliasTable = pairs.into_iter().collect();
            let once = normalize(tags.iter(), &aliases);
            let twice = normalize(once.iter(), &aliases);
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn normalize_is_order_independent(
            tags in proptest::collection::vec("[a-zA-Z ]{0,12}", 0..8),
        ) {
            let aliases = AliasTable::new();
            let forward = normalize(tags.iter(), &aliases);
            let reversed = normalize(tags.iter().rev(), &aliases);
            prop_assert_eq!(forward, reversed);
        }
    }
}
