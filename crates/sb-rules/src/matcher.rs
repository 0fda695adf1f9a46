//! Compiled predicates: rule syntax is compiled once at load time into a
//! reusable matcher, so per-note evaluation never re-parses patterns.

use globset::{Glob, GlobMatcher};
use regex::Regex;

use sb_core::tags::canonical;
use sb_core::Note;

use crate::schema::PredicateDef;

/// A compiled predicate tree. Evaluation is conjunctive at the leaves'
/// parent unless combinators say otherwise.
#[derive(Debug, Clone)]
pub enum Predicate {
    All(Vec<Predicate>),
    Any(Vec<Predicate>),
    Not(Box<Predicate>),
    Filename(Regex),
    PathGlob(GlobMatcher),
    HasTag(String),
    Field { key: String, equals: String },
    BodyContains(String),
}

impl Predicate {
    /// Compile a predicate definition. Pattern errors surface as plain
    /// messages; the caller attaches the rule index.
    pub fn compile(def: &PredicateDef) -> Result<Self, String> {
        match def {
            PredicateDef::All(children) => Ok(Predicate::All(compile_all(children)?)),
            PredicateDef::Any(children) => Ok(Predicate::Any(compile_all(children)?)),
            PredicateDef::Not(child) => Ok(Predicate::Not(Box::new(Self::compile(child)?))),
            PredicateDef::Filename(pattern) => Regex::new(pattern)
                .map(Predicate::Filename)
                .map_err(|e| format!("invalid filename regex '{pattern}': {e}")),
            PredicateDef::PathGlob(pattern) => Glob::new(pattern)
                .map(|g| Predicate::PathGlob(g.compile_matcher()))
                .map_err(|e| format!("invalid path glob '{pattern}': {e}")),
            PredicateDef::HasTag(tag) => Ok(Predicate::HasTag(canonical(tag))),
            PredicateDef::Field { key, equals } => Ok(Predicate::Field {
                key: key.clone(),
                equals: equals.clone(),
            }),
            PredicateDef::BodyContains(needle) => {
                Ok(Predicate::BodyContains(needle.to_lowercase()))
            }
        }
    }

    /// Whether this predicate holds for a note.
    #[must_use]
    pub fn matches(&self, note: &Note) -> bool {
        match self {
            Predicate::All(children) => children.iter().all(|p| p.matches(note)),
            Predicate::Any(children) => children.iter().any(|p| p.matches(note)),
            Predicate::Not(child) => !child.matches(note),
            Predicate::Filename(re) => re.is_match(file_name(note)),
            Predicate::PathGlob(glob) => glob.is_match(&note.path),
            Predicate::HasTag(tag) => note.tags.iter().any(|t| canonical(t) == *tag),
            Predicate::Field { key, equals } => note.frontmatter.scalar(key) == Some(equals),
            Predicate::BodyContains(needle) => note.body.to_lowercase().contains(needle),
        }
    }

    /// Collect the filename regexes of this tree, in declaration order.
    /// Used to expand named capture groups into rename templates.
    pub fn filename_regexes<'a>(&'a self, out: &mut Vec<&'a Regex>) {
        match self {
            Predicate::All(children) | Predicate::Any(children) => {
                for child in children {
                    child.filename_regexes(out);
                }
            }
            Predicate::Not(child) => child.filename_regexes(out),
            Predicate::Filename(re) => out.push(re),
            _ => {}
        }
    }
}

fn compile_all(defs: &[PredicateDef]) -> Result<Vec<Predicate>, String> {
    defs.iter().map(Predicate::compile).collect()
}

fn file_name(note: &Note) -> &str {
    note.path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
}
