//! Topic clusters derived from the shared-tag edges of the note graph.
//!
//! Two grouping strategies: greedy connected components when clusters
//! must not overlap, and per-tag multi-membership grouping when they
//! may. Both are deterministic — stable labels, stable member order.

use std::collections::BTreeMap;

use crate::graph::NoteGraph;
use crate::moc::page_header;

/// A derived grouping of notes sharing tags, labeled by the dominant
/// shared tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cluster {
    pub label: String,
    /// Note ids into [`NoteGraph::notes`], sorted.
    pub members: Vec<usize>,
}

/// Group notes into topic clusters.
///
/// `overlap_allowed = false`: greedy connected components over the
/// shared-tag edges; the label is the most frequent tag on the
/// component's edges (lexicographic tie-break).
///
/// `overlap_allowed = true`: one candidate cluster per indexed tag
/// (threshold-excluded tags are skipped); a note may belong to several.
/// Clusters with identical member sets collapse under the smallest
/// label.
///
/// Clusters below `min_cluster_size` are dropped; output is ordered by
/// label.
#[must_use]
pub fn build_clusters(graph: &NoteGraph, min_cluster_size: usize, overlap_allowed: bool) -> Vec<Cluster> {
    let mut clusters = if overlap_allowed {
        overlapping_clusters(graph)
    } else {
        component_clusters(graph)
    };
    clusters.retain(|c| c.members.len() >= min_cluster_size);
    clusters.sort_by(|a, b| a.label.cmp(&b.label).then_with(|| a.members.cmp(&b.members)));
    clusters
}

fn component_clusters(graph: &NoteGraph) -> Vec<Cluster> {
    let mut parent: Vec<usize> = (0..graph.notes.len()).collect();

    fn find(parent: &mut Vec<usize>, x: usize) -> usize {
        let mut root = x;
        while parent[root] != root {
            root = parent[root];
        }
        let mut cur = x;
        while parent[cur] != root {
            let next = parent[cur];
            parent[cur] = root;
            cur = next;
        }
        root
    }

    for &(a, b) in graph.tag_edges.keys() {
        let ra = find(&mut parent, a);
        let rb = find(&mut parent, b);
        if ra != rb {
            parent[ra.max(rb)] = ra.min(rb);
        }
    }

    let mut members: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    // only nodes that participate in at least one shared-tag edge cluster
    for &(a, b) in graph.tag_edges.keys() {
        for id in [a, b] {
            let root = find(&mut parent, id);
            let component = members.entry(root).or_default();
            if !component.contains(&id) {
                component.push(id);
            }
        }
    }

    members
        .into_values()
        .map(|mut ids| {
            ids.sort_unstable();
            let label = dominant_tag(graph, &ids);
            Cluster { label, members: ids }
        })
        .collect()
}

/// Most frequent tag on the component's internal edges; ties resolve
/// lexicographically (BTreeMap iteration order).
fn dominant_tag(graph: &NoteGraph, ids: &[usize]) -> String {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for (&(a, b), tags) in &graph.tag_edges {
        if ids.contains(&a) && ids.contains(&b) {
            for tag in tags {
                *counts.entry(tag.as_str()).or_default() += 1;
            }
        }
    }
    counts
        .into_iter()
        .max_by_key(|&(tag, count)| (count, std::cmp::Reverse(tag)))
        .map(|(tag, _)| tag.to_string())
        .unwrap_or_else(|| "untagged".to_string())
}

fn overlapping_clusters(graph: &NoteGraph) -> Vec<Cluster> {
    // member set -> smallest label producing it
    let mut by_members: BTreeMap<Vec<usize>, String> = BTreeMap::new();
    for (tag, ids) in &graph.tag_index {
        if graph.excluded_tags.contains(tag) {
            continue;
        }
        let mut ids = ids.clone();
        ids.sort_unstable();
        match by_members.get_mut(&ids) {
            Some(label) if label.as_str() <= tag.as_str() => {}
            _ => {
                by_members.insert(ids, tag.clone());
            }
        }
    }
    by_members
        .into_iter()
        .map(|(members, label)| Cluster { label, members })
        .collect()
}

/// Render the cluster map page.
#[must_use]
pub fn render_cluster_map(graph: &NoteGraph, clusters: &[Cluster], generated_at: Option<&str>) -> String {
    let mut page = page_header("Semantic Cluster Map", generated_at);
    page.push_str("# Semantic Cluster Map\n");
    if clusters.is_empty() {
        page.push_str("\n_No clusters found._\n");
        return page;
    }
    for cluster in clusters {
        page.push_str(&format!("\n## {}\n", cluster.label));
        for &id in &cluster.members {
            page.push_str(&format!("- [[{}]]\n", graph.notes[id].stem));
        }
    }
    page
}
