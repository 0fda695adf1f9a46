//! # sb-graph
//!
//! The note graph and everything derived from it.
//!
//! Built fresh from the scanned note set every run: explicit wiki-link
//! edges, shared-tag edges over an inverted index, MOC index pages per
//! PARA category, and topic clusters from tag co-occurrence.

pub mod cluster;
pub mod graph;
pub mod moc;

pub use cluster::{build_clusters, render_cluster_map, Cluster};
pub use graph::{wiki_links, GraphConfig, GraphNote, NoteGraph};
pub use moc::build_moc;
