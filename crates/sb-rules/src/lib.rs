//! # sb-rules
//!
//! Declarative, data-driven classification for vault notes.
//!
//! A rule file is an ordered list of records, each pairing a predicate
//! tree (AND/OR/NOT over regex, glob, tag-membership, field-equality,
//! and keyword leaves) with an action (rename template, destination
//! category, tag operations). Rules compile once at load time into
//! reusable matchers; [`classify`] evaluates them per note.

pub mod engine;
pub mod matcher;
pub mod schema;

pub use engine::{classify, CompiledRule, Decision, RuleSet, TagOp};
pub use matcher::Predicate;
pub use schema::{ActionDef, MatchMode, PredicateDef, RuleDef, TagActionDef};
