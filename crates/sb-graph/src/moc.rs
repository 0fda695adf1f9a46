//! Map of Content (MOC) generation: one index page per PARA category.
//!
//! Output is deterministic — stable sort keys, no wall-clock content
//! unless a timestamp is explicitly requested — so re-running over an
//! unchanged vault produces byte-identical pages.

use std::collections::BTreeMap;

use sb_core::Category;

use crate::graph::NoteGraph;

/// Build the index page for one category.
///
/// Notes are grouped under their most specific tag shared by at least
/// two notes of the category (deepest `/` path wins, then longest tag);
/// the remainder lands under `Ungrouped`. Entries are sorted by title
/// with the vault path as tie-break.
#[must_use]
pub fn build_moc(graph: &NoteGraph, category: Category, generated_at: Option<&str>) -> String {
    let members = graph.category_members(category);

    // tag -> occurrence count within this category
    let mut tag_counts: BTreeMap<&str, usize> = BTreeMap::new();
    for &id in &members {
        for tag in &graph.notes[id].tags {
            *tag_counts.entry(tag.as_str()).or_default() += 1;
        }
    }

    let mut groups: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    let mut ungrouped: Vec<usize> = Vec::new();
    for &id in &members {
        let best = graph.notes[id]
            .tags
            .iter()
            .filter(|t| tag_counts.get(t.as_str()).copied().unwrap_or(0) >= 2)
            .max_by_key(|t| (t.matches('/').count(), t.len(), std::cmp::Reverse(t.as_str())));
        match best {
            Some(tag) => groups.entry(tag.clone()).or_default().push(id),
            None => ungrouped.push(id),
        }
    }

    let label = category.label();
    let mut page = page_header(&format!("{label} Index"), generated_at);
    page.push_str(&format!("# {label} Index\n"));

    if members.is_empty() {
        page.push_str("\n_No notes in this category._\n");
        return page;
    }

    for (tag, ids) in &groups {
        page.push_str(&format!("\n## {tag}\n"));
        for &id in ids {
            page.push_str(&entry_line(graph, id));
        }
    }
    if !ungrouped.is_empty() {
        page.push_str("\n## Ungrouped\n");
        for &id in &ungrouped {
            page.push_str(&entry_line(graph, id));
        }
    }
    page
}

pub(crate) fn page_header(title: &str, generated_at: Option<&str>) -> String {
    let mut out = String::from("---\n");
    out.push_str(&format!("title: {title}\n"));
    out.push_str("generated: true\n");
    if let Some(ts) = generated_at {
        out.push_str(&format!("generated_at: {ts}\n"));
    }
    out.push_str("---\n\n");
    out
}

fn entry_line(graph: &NoteGraph, id: usize) -> String {
    let note = &graph.notes[id];
    if note.title == note.stem {
        format!("- [[{}]]\n", note.stem)
    } else {
        format!("- [[{}|{}]]\n", note.stem, note.title)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphConfig;
    use sb_core::Note;

    fn notes() -> Vec<Note> {
        let mk = |path: &str, title: &str, tags: &[&str]| {
            let block = tags
                .iter()
                .map(|t| format!("- {t}"))
                .collect::<Vec<_>>()
                .join("\n");
            Note::from_content(
                path,
                &format!("---\ntitle: {title}\ntags:\n{block}\n---\nBody.\n"),
            )
            .unwrap()
        };
        vec![
            mk("01_Projects/rust-cli.md", "Rust CLI", &["topic/rust", "tooling"]),
            mk("01_Projects/rust-web.md", "Rust Web", &["topic/rust"]),
            mk("01_Projects/solo.md", "Solo Effort", &["one-off"]),
            mk("03_Resources/paper.md", "Some Paper", &["topic/rust"]),
        ]
    }

    #[test]
    fn moc_groups_by_shared_tag_and_sorts_entries() {
        let graph = NoteGraph::build(&notes(), &GraphConfig::default());
        let page = build_moc(&graph, Category::Project, None);

        assert!(page.starts_with("---\ntitle: Projects Index\ngenerated: true\n---\n"));
        assert!(page.contains("# Projects Index\n"));
        assert!(page.contains("\n## topic/rust\n"));
        assert!(page.contains("- [[rust-cli|Rust CLI]]\n"));
        assert!(page.contains("- [[rust-web|Rust Web]]\n"));
        // only one note carries "one-off" within the category
        assert!(page.contains("\n## Ungrouped\n- [[solo|Solo Effort]]\n"));
        // resource note does not leak into the Projects page
        assert!(!page.contains("Some Paper"));
    }

    #[test]
    fn moc_is_byte_identical_across_runs() {
        let ns = notes();
        let a = build_moc(&NoteGraph::build(&ns, &GraphConfig::default()), Category::Project, None);
        let b = build_moc(&NoteGraph::build(&ns, &GraphConfig::default()), Category::Project, None);
        assert_eq!(a, b);
    }

    #[test]
    fn empty_category_renders_placeholder() {
        let graph = NoteGraph::build(&notes(), &GraphConfig::default());
        let page = build_moc(&graph, Category::Archive, None);
        assert!(page.contains("_No notes in this category._"));
    }

    #[test]
    fn timestamp_only_appears_when_requested() {
        let graph = NoteGraph::build(&notes(), &GraphConfig::default());
        let without = build_moc(&graph, Category::Project, None);
        assert!(!without.contains("generated_at"));
        let with = build_moc(&graph, Category::Project, Some("2026-01-01T00:00:00Z"));
        assert!(with.contains("generated_at: 2026-01-01T00:00:00Z\n"));
    }

    #[test]
    fn deeper_subtag_wins_grouping() {
        let mk = |path: &str, tags: &[&str]| {
            let block = tags
                .iter()
                .map(|t| format!("- {t}"))
                .collect::<Vec<_>>()
                .join("\n");
            Note::from_content(path, &format!("---\ntags:\n{block}\n---\n")).unwrap()
        };
        let ns = vec![
            mk("01_Projects/a.md", &["topic", "topic/rust/async"]),
            mk("01_Projects/b.md", &["topic", "topic/rust/async"]),
        ];
        let graph = NoteGraph::build(&ns, &GraphConfig::default());
        let page = build_moc(&graph, Category::Project, None);
        assert!(page.contains("## topic/rust/async\n"));
        assert!(!page.contains("\n## topic\n"));
    }
}
