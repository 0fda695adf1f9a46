//! # sb-extract
//!
//! Best-effort entity extraction from note bodies.
//!
//! A capitalization/pattern scan, not NLP: capitalized multi-word spans
//! become person candidates, `@handle` tokens become mentions, and
//! `Project X` / `X Project` spans become project candidates. False
//! positives and negatives are acceptable; extraction never fails a run.
//!
//! Entities are converted to derived tags (`person/<slug>`,
//! `project/<slug>`) and merged through the tag normalizer. The note
//! body is never mutated.

use once_cell::sync::Lazy;
use regex::Regex;

use sb_core::tags::canonical;

static NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b[A-Z][a-z]+(?:\s+[A-Z][a-z]+)+\b").expect("name pattern compiles")
});
static MENTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"@([A-Za-z][A-Za-z0-9_-]*)").expect("mention pattern compiles"));
static PROJECT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\bProject\s+[A-Z][A-Za-z0-9]*\b|\b[A-Z][A-Za-z0-9]*\s+Project\b")
        .expect("project pattern compiles")
});

/// Kind of a detected entity mention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    /// Capitalized multi-word span, e.g. `Jane Smith`.
    Person,
    /// `@handle` token.
    Mention,
    /// `Project X` / `X Project` span.
    Project,
}

/// A detected entity mention in a note body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    pub text: String,
    pub kind: EntityKind,
}

impl Entity {
    /// Derived tag for this entity: `person/<slug>` or `project/<slug>`.
    #[must_use]
    pub fn tag(&self) -> String {
        let prefix = match self.kind {
            EntityKind::Person | EntityKind::Mention => "person",
            EntityKind::Project => "project",
        };
        format!("{prefix}/{}", canonical(&self.text))
    }
}

/// Lazy scan over a note body. Finite, deterministic, and restartable:
/// calling [`extract_entities`] again over the same body yields the same
/// sequence.
pub struct EntityScan<'a> {
    segments: std::vec::IntoIter<&'a str>,
    pending: std::vec::IntoIter<Entity>,
}

impl Iterator for EntityScan<'_> {
    type Item = Entity;

    fn next(&mut self) -> Option<Entity> {
        loop {
            if let Some(entity) = self.pending.next() {
                return Some(entity);
            }
            let segment = self.segments.next()?;
            self.pending = scan_segment(segment).into_iter();
        }
    }
}

/// Scan a note body for entity mentions, skipping fenced code blocks.
#[must_use]
pub fn extract_entities(body: &str) -> EntityScan<'_> {
    EntityScan {
        segments: prose_segments(body).into_iter(),
        pending: Vec::new().into_iter(),
    }
}

/// Derived tags for every entity found in a body, in scan order.
#[must_use]
pub fn entity_tags(body: &str) -> Vec<String> {
    extract_entities(body).map(|e| e.tag()).collect()
}

/// Split a body into the segments outside ``` fences.
fn prose_segments(body: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut in_code = false;
    let mut segment_start = 0;
    let mut offset = 0;

    for line in body.split_inclusive('\n') {
        if line.trim_start().starts_with("```") {
            if !in_code && offset > segment_start {
                segments.push(&body[segment_start..offset]);
            }
            in_code = !in_code;
            segment_start = offset + line.len();
        }
        offset += line.len();
    }
    if !in_code && body.len() > segment_start {
        segments.push(&body[segment_start..]);
    }
    segments
}

fn scan_segment(segment: &str) -> Vec<Entity> {
    // (start, precedence, entity) so output order is positional and stable
    let mut found: Vec<(usize, u8, Entity)> = Vec::new();

    let project_spans: Vec<(usize, usize)> = PROJECT_RE
        .find_iter(segment)
        .map(|m| (m.start(), m.end()))
        .collect();
    for &(start, end) in &project_spans {
        found.push((
            start,
            0,
            Entity {
                text: segment[start..end].to_string(),
                kind: EntityKind::Project,
            },
        ));
    }

    for m in NAME_RE.find_iter(segment) {
        // a name inside a project span is the project's name, not a person
        let overlaps = project_spans
            .iter()
            .any(|&(s, e)| m.start() < e && s < m.end());
        if overlaps {
            continue;
        }
        found.push((
            m.start(),
            1,
            Entity {
                text: m.as_str().to_string(),
                kind: EntityKind::Person,
            },
        ));
    }

    for caps in MENTION_RE.captures_iter(segment) {
        if let (Some(whole), Some(handle)) = (caps.get(0), caps.get(1)) {
            found.push((
                whole.start(),
                2,
                Entity {
                    text: handle.as_str().to_string(),
                    kind: EntityKind::Mention,
                },
            ));
        }
    }

    found.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));
    found.into_iter().map(|(_, _, e)| e).collect()
}
