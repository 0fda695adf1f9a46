//! # sb-vault
//!
//! Vault IO and the batch pipeline.
//!
//! [`scan`] walks the vault and parses every user note; [`pipeline`]
//! drives the classify-and-move, tag-normalization, and generated-page
//! stages over the scanned set; [`store`] provides the atomic write
//! primitive everything goes through. Per-note problems are collected
//! into a [`RunReport`] rather than aborting the run.

pub mod pipeline;
pub mod report;
pub mod scan;
pub mod store;

pub use pipeline::{classify_and_move, generate_clusters, generate_moc, normalize_tags, CLUSTER_PAGE};
pub use report::{NoteFailure, RunReport};
pub use scan::{scan, ScanOutcome};
pub use store::write_atomic;
