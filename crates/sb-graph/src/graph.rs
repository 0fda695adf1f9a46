//! Note graph construction.
//!
//! Two passes over the scanned note set: an explicit-link pass parsing
//! `[[wiki-link]]` references from bodies, and a shared-tag pass over an
//! inverted tag index. The graph is rebuilt from scratch every run and
//! holds no state across runs.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::PathBuf;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use sb_core::config::DEFAULT_COMMON_TAG_THRESHOLD;
use sb_core::{Category, Note};

static WIKI_LINK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[\[([^\]\|]+)(?:\|[^\]]*)?\]\]").expect("link pattern compiles"));

/// A node in the note graph — the graph-relevant slice of a [`Note`].
#[derive(Debug, Clone)]
pub struct GraphNote {
    pub path: PathBuf,
    pub stem: String,
    pub title: String,
    pub category: Category,
    pub tags: BTreeSet<String>,
}

/// Tuning for graph construction.
#[derive(Debug, Clone)]
pub struct GraphConfig {
    /// Tags held by more notes than this are excluded from shared-tag
    /// edge generation (still used for MOC bucketing).
    pub common_tag_threshold: usize,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            common_tag_threshold: DEFAULT_COMMON_TAG_THRESHOLD,
        }
    }
}

/// In-memory graph of notes connected by explicit links and shared tags.
///
/// Node ids are indices into `notes`, which is sorted by vault path so
/// identical input sets always build an identical graph.
#[derive(Debug, Clone)]
pub struct NoteGraph {
    pub notes: Vec<GraphNote>,
    /// Directed reference edges from explicit `[[links]]`.
    pub link_edges: Vec<(usize, usize)>,
    /// Undirected co-membership edges keyed `(a, b)` with `a < b`,
    /// holding the tags the pair shares.
    pub tag_edges: BTreeMap<(usize, usize), BTreeSet<String>>,
    /// Inverted index tag → note ids, including over-threshold tags.
    pub tag_index: BTreeMap<String, Vec<usize>>,
    /// Tags too common for edge generation.
    pub excluded_tags: BTreeSet<String>,
}

impl NoteGraph {
    /// Build the graph from the current note set.
    #[must_use]
    pub fn build(notes: &[Note], config: &GraphConfig) -> Self {
        let mut graph_notes: Vec<GraphNote> = notes
            .iter()
            .map(|n| GraphNote {
                path: n.path.clone(),
                stem: n.stem().to_string(),
                title: n.title(),
                category: n.category(),
                tags: n.tags.clone(),
            })
            .collect();
        graph_notes.sort_by(|a, b| a.path.cmp(&b.path));

        // resolve wiki-link targets by file stem first, then title
        let mut by_stem: HashMap<String, usize> = HashMap::new();
        let mut by_title: HashMap<String, usize> = HashMap::new();
        for (id, gn) in graph_notes.iter().enumerate() {
            by_stem.entry(gn.stem.to_lowercase()).or_insert(id);
            by_title.entry(gn.title.to_lowercase()).or_insert(id);
        }

        let bodies: HashMap<&std::path::Path, &str> = notes
            .iter()
            .map(|n| (n.path.as_path(), n.body.as_str()))
            .collect();

        let mut link_edges = Vec::new();
        for (source, gn) in graph_notes.iter().enumerate() {
            let body = bodies.get(gn.path.as_path()).copied().unwrap_or_default();
            for target_name in wiki_links(body) {
                let key = target_name.to_lowercase();
                let target = by_stem.get(&key).or_else(|| by_title.get(&key));
                match target {
                    Some(&target) if target != source => link_edges.push((source, target)),
                    _ => {}
                }
            }
        }
        link_edges.sort_unstable();
        link_edges.dedup();

        let mut tag_index: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for (id, gn) in graph_notes.iter().enumerate() {
            for tag in &gn.tags {
                tag_index.entry(tag.clone()).or_default().push(id);
            }
        }

        let mut excluded_tags = BTreeSet::new();
        let mut tag_edges: BTreeMap<(usize, usize), BTreeSet<String>> = BTreeMap::new();
        for (tag, members) in &tag_index {
            if members.len() > config.common_tag_threshold {
                debug!(tag = %tag, notes = members.len(), "tag excluded from edge generation");
                excluded_tags.insert(tag.clone());
                continue;
            }
            for (i, &a) in members.iter().enumerate() {
                for &b in &members[i + 1..] {
                    tag_edges.entry((a, b)).or_default().insert(tag.clone());
                }
            }
        }

        Self {
            notes: graph_notes,
            link_edges,
            tag_edges,
            tag_index,
            excluded_tags,
        }
    }

    /// Note ids belonging to a category, ordered by title then path.
    #[must_use]
    pub fn category_members(&self, category: Category) -> Vec<usize> {
        let mut members: Vec<usize> = (0..self.notes.len())
            .filter(|&id| self.notes[id].category == category)
            .collect();
        members.sort_by(|&a, &b| {
            let ka = (self.notes[a].title.to_lowercase(), &self.notes[a].path);
            let kb = (self.notes[b].title.to_lowercase(), &self.notes[b].path);
            ka.cmp(&kb)
        });
        members
    }
}

/// Wiki-link targets in a body, in order, skipping fenced code blocks.
#[must_use]
pub fn wiki_links(body: &str) -> Vec<String> {
    let mut links = Vec::new();
    let mut in_code = false;
    for line in body.lines() {
        if line.trim_start().starts_with("```") {
            in_code = !in_code;
            continue;
        }
        if in_code {
            continue;
        }
        for caps in WIKI_LINK_RE.captures_iter(line) {
            if let Some(target) = caps.get(1) {
                links.push(target.as_str().trim().to_string());
            }
        }
    }
    links
}
