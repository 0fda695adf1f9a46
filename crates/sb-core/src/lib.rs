//! # sb-core
//!
//! Core types for the Second Brain vault organizer.
//!
//! This crate defines the foundational types used across all other
//! workspace crates:
//! - [`Note`] — a markdown note with frontmatter, body, and tag set
//! - [`Category`] — the PARA category enumeration
//! - [`Frontmatter`] — format-preserving frontmatter mapping
//! - [`tags`] — tag canonicalization and alias resolution
//! - [`RunConfig`] — explicit per-run configuration
//! - Error hierarchy ([`OrganizerError`])

pub mod config;
pub mod error;
pub mod frontmatter;
pub mod note;
pub mod tags;

pub use config::RunConfig;
pub use error::{OrganizerError, Result};
pub use frontmatter::{FieldValue, Frontmatter};
pub use note::{Category, Note};
pub use tags::AliasTable;
