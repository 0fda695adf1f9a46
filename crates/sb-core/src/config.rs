//! Run configuration, passed explicitly through every pipeline stage.
//!
//! There is deliberately no ambient global state: the vault root, dry-run
//! flag, and alias table travel in one struct from `main` down to each
//! component's entry point.

use std::path::PathBuf;

use crate::tags::AliasTable;

/// Tags held by more notes than this are excluded from shared-tag edge
/// generation (they still bucket notes in MOC pages).
pub const DEFAULT_COMMON_TAG_THRESHOLD: usize = 25;

/// Process-wide configuration for a single organizer run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Absolute path of the vault root folder.
    pub vault_root: PathBuf,
    /// Report intended changes without writing anything.
    pub dry_run: bool,
    /// Synonym tag → canonical tag, loaded from the rule file.
    pub aliases: AliasTable,
    /// Cutoff for shared-tag edge generation.
    pub common_tag_threshold: usize,
}

impl RunConfig {
    #[must_use]
    pub fn new(vault_root: impl Into<PathBuf>) -> Self {
        Self {
            vault_root: vault_root.into(),
            dry_run: false,
            aliases: AliasTable::new(),
            common_tag_threshold: DEFAULT_COMMON_TAG_THRESHOLD,
        }
    }

    #[must_use]
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}
