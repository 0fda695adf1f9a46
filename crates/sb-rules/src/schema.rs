//! Rule file schema — the serde shape of a YAML rule document.
//!
//! ```yaml
//! mode: accumulate
//! aliases:
//!   ml: machine-learning
//! common_tag_threshold: 25
//! rules:
//!   - name: drafts
//!     match:
//!       filename: "draft"
//!     action:
//!       tags:
//!         add: [status/draft]
//!   - name: dated notes
//!     match:
//!       filename: '^(?P<date>\d{4}-\d{2}-\d{2})[ _](?P<rest>.+)$'
//!     action:
//!       rename: "${date}-${rest}"
//!       category: archive
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use sb_core::Category;

/// How a rule set combines matches across rules.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchMode {
    /// First matching rule's action is the decision; evaluation stops.
    #[default]
    FirstMatch,
    /// Every matching rule contributes its tag operations, in order.
    /// Destination and rename still come from the first match carrying one.
    Accumulate,
}

/// Top-level shape of a rule file. Rules are held as raw YAML values so
/// a schema error can be reported with the offending rule index.
#[derive(Debug, Deserialize)]
pub struct RuleFileDef {
    #[serde(default)]
    pub mode: MatchMode,
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,
    #[serde(default)]
    pub common_tag_threshold: Option<usize>,
    #[serde(default)]
    pub rules: Vec<serde_yaml::Value>,
}

/// One rule record: a predicate tree plus an action.
///
/// Predicates are written as plain singleton mappings
/// (`has_tag: project`, `all: [...]`), not YAML tags, so the field
/// deserializes through `singleton_map_recursive`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "match", with = "serde_yaml::with::singleton_map_recursive")]
    pub predicate: PredicateDef,
    #[serde(default)]
    pub action: ActionDef,
}

/// Predicate tree: AND/OR/NOT combinators over leaf predicates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredicateDef {
    /// All child predicates must hold.
    All(Vec<PredicateDef>),
    /// At least one child predicate must hold.
    Any(Vec<PredicateDef>),
    /// The child predicate must not hold.
    Not(Box<PredicateDef>),
    /// Regex over the file name; named capture groups feed the rename
    /// template.
    Filename(String),
    /// Glob over the vault-relative path.
    PathGlob(String),
    /// Tag-set membership (compared in canonical tag form).
    HasTag(String),
    /// Frontmatter scalar equality.
    Field { key: String, equals: String },
    /// Case-insensitive substring search over the note body.
    BodyContains(String),
}

/// Action of a matched rule. All parts are optional; a rule may only
/// rename, only categorize, or only adjust tags.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActionDef {
    /// Rename template; `${group}` expands named captures from the
    /// rule's filename regex.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<TagActionDef>,
}

/// Tag adjustments carried by a rule action.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TagActionDef {
    #[serde(default)]
    pub add: Vec<String>,
    #[serde(default)]
    pub remove: Vec<String>,
}
