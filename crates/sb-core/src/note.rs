//! Note type — the central unit of the vault — and the PARA category enum.

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::OrganizerError;
use crate::frontmatter::{self, FieldValue, Frontmatter};

/// PARA category a note belongs to, derived from its top-level folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Project,
    Area,
    Resource,
    Archive,
    Uncategorized,
}

impl Category {
    /// The four PARA categories, in vault folder order.
    pub const PARA: [Category; 4] = [
        Category::Project,
        Category::Area,
        Category::Resource,
        Category::Archive,
    ];

    /// Vault folder for this category. `Uncategorized` has none — such
    /// notes stay where they are.
    #[must_use]
    pub fn folder(self) -> Option<&'static str> {
        match self {
            Category::Project => Some("01_Projects"),
            Category::Area => Some("02_Areas"),
            Category::Resource => Some("03_Resources"),
            Category::Archive => Some("04_Archive"),
            Category::Uncategorized => None,
        }
    }

    /// Human label used in MOC page headings.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Category::Project => "Projects",
            Category::Area => "Areas",
            Category::Resource => "Resources",
            Category::Archive => "Archive",
            Category::Uncategorized => "Uncategorized",
        }
    }

    /// Category implied by a top-level vault folder name.
    #[must_use]
    pub fn from_folder(name: &str) -> Category {
        match name {
            "01_Projects" => Category::Project,
            "02_Areas" => Category::Area,
            "03_Resources" => Category::Resource,
            "04_Archive" => Category::Archive,
            _ => Category::Uncategorized,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A markdown note: vault-relative path, frontmatter, body, and the
/// working tag set.
///
/// The tag set is kept as a `BTreeSet` — deduplicated and ordered — and
/// written back to frontmatter only when it actually changed, so an
/// untouched note round-trips byte-for-byte.
#[derive(Debug, Clone)]
pub struct Note {
    /// Vault-relative path. Mutable across a run (renames/moves), so
    /// stable identity comes from [`Note::content_hash`].
    pub path: PathBuf,
    pub frontmatter: Frontmatter,
    pub body: String,
    pub tags: BTreeSet<String>,
}

impl Note {
    /// Parse a note from its raw file content.
    ///
    /// A file without a frontmatter block becomes a body-only note.
    ///
    /// # Errors
    ///
    /// Returns [`OrganizerError::Parse`] for an unterminated or malformed
    /// frontmatter block.
    pub fn from_content(path: impl Into<PathBuf>, content: &str) -> Result<Self, OrganizerError> {
        let (fm, body) = frontmatter::parse(content)?;
        let tags = read_tags(&fm);
        Ok(Self {
            path: path.into(),
            frontmatter: fm,
            body: body.to_string(),
            tags,
        })
    }

    /// File stem of the note's path, used for wiki-link targets.
    #[must_use]
    pub fn stem(&self) -> &str {
        self.path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
    }

    /// Display title: the `title` frontmatter field, else the file stem.
    #[must_use]
    pub fn title(&self) -> String {
        self.frontmatter
            .scalar("title")
            .map(str::to_string)
            .unwrap_or_else(|| self.stem().to_string())
    }

    /// Guarantee a `title` field exists, defaulting it from the file stem.
    pub fn ensure_title(&mut self) {
        if self.frontmatter.scalar("title").is_none() {
            let stem = self.stem().to_string();
            self.frontmatter.set_scalar("title", stem);
        }
    }

    /// Category implied by the note's current top-level folder.
    #[must_use]
    pub fn category(&self) -> Category {
        self.path
            .components()
            .next()
            .and_then(|c| c.as_os_str().to_str())
            // a bare filename has no folder component
            .filter(|_| self.path.components().count() > 1)
            .map_or(Category::Uncategorized, Category::from_folder)
    }

    /// Write the working tag set back into frontmatter. A no-op when the
    /// stored tags already match, and never adds an empty `tags` field.
    pub fn sync_tags(&mut self) {
        if self.tags.is_empty() && !self.frontmatter.contains_key("tags") {
            return;
        }
        let items: Vec<String> = self.tags.iter().cloned().collect();
        self.frontmatter.set_list("tags", items);
    }

    /// Serialize the note back to file content.
    #[must_use]
    pub fn render(&self) -> String {
        frontmatter::serialize(&self.frontmatter, &self.body)
    }

    /// Whether frontmatter was mutated since parsing.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.frontmatter.is_dirty()
    }

    /// Machine-generated pages (MOC/cluster output) carry
    /// `generated: true` so re-runs can tell them from user notes.
    #[must_use]
    pub fn is_generated(&self) -> bool {
        self.frontmatter.scalar("generated") == Some("true")
    }

    /// SHA-256 of the rendered note — the rename-stable identity.
    #[must_use]
    pub fn content_hash(&self) -> String {
        let digest = Sha256::digest(self.render().as_bytes());
        digest.iter().map(|b| format!("{b:02x}")).collect()
    }

    /// Path this note would occupy inside `folder`, keeping its filename.
    #[must_use]
    pub fn path_in_folder(&self, folder: &str) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(Path::new)
            .unwrap_or_else(|| Path::new(""));
        Path::new(folder).join(name)
    }
}

fn read_tags(fm: &Frontmatter) -> BTreeSet<String> {
    match fm.get("tags") {
        Some(FieldValue::List(items)) => items.iter().filter(|t| !t.is_empty()).cloned().collect(),
        Some(FieldValue::Scalar(s)) if !s.is_empty() => std::iter::once(s.clone()).collect(),
        _ => BTreeSet::new(),
    }
}
