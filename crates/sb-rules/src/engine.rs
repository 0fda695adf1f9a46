//! Rule set loading and the `classify` operation.
//!
//! A rule set is loaded once per run, compiled, and immutable afterward.
//! Pattern or schema errors fail the whole load with the offending rule
//! index — no note is touched when the rule file is bad.

use std::collections::BTreeSet;
use std::path::Path;

use tracing::{debug, warn};

use sb_core::config::DEFAULT_COMMON_TAG_THRESHOLD;
use sb_core::tags::canonical;
use sb_core::{AliasTable, Category, Note, OrganizerError};

use crate::matcher::Predicate;
use crate::schema::{ActionDef, MatchMode, RuleDef, RuleFileDef};

/// One tag operation yielded by a matching rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagOp {
    Add(String),
    Remove(String),
}

impl TagOp {
    /// Apply this operation to a working tag set. Removal compares
    /// canonical forms so `Remove("Machine Learning")` strips `ml`
    /// variants already canonicalized.
    pub fn apply(&self, tags: &mut BTreeSet<String>) {
        match self {
            TagOp::Add(tag) => {
                tags.insert(tag.clone());
            }
            TagOp::Remove(tag) => {
                let target = canonical(tag);
                tags.retain(|t| canonical(t) != target);
            }
        }
    }
}

/// The outcome of classifying one note. A no-op decision leaves the note
/// untouched: `Uncategorized` has no destination folder.
#[derive(Debug, Clone, Default)]
pub struct Decision {
    pub new_name: Option<String>,
    pub category: Option<Category>,
    pub tag_ops: Vec<TagOp>,
}

impl Decision {
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.new_name.is_none() && self.category.is_none() && self.tag_ops.is_empty()
    }

    /// Destination category, defaulting unmatched notes to `Uncategorized`.
    #[must_use]
    pub fn destination(&self) -> Category {
        self.category.unwrap_or(Category::Uncategorized)
    }
}

/// A compiled rule: predicate tree plus action, evaluated in file order.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    pub name: Option<String>,
    predicate: Predicate,
    pub action: ActionDef,
}

impl CompiledRule {
    fn matches(&self, note: &Note) -> bool {
        self.predicate.matches(note)
    }

    /// Expand the rule's rename template against the note's file name,
    /// substituting named captures from the rule's filename regexes.
    fn rename_target(&self, note: &Note, template: &str) -> Option<String> {
        let filename = note.path.file_name().and_then(|n| n.to_str())?;
        let mut regexes = Vec::new();
        self.predicate.filename_regexes(&mut regexes);
        for re in regexes {
            if let Some(caps) = re.captures(filename) {
                let mut out = String::new();
                caps.expand(template, &mut out);
                return Some(out);
            }
        }
        // no filename regex in the rule: template is literal
        Some(template.to_string())
    }

    fn tag_ops(&self) -> Vec<TagOp> {
        let Some(tags) = &self.action.tags else {
            return Vec::new();
        };
        tags.add
            .iter()
            .map(|t| TagOp::Add(t.clone()))
            .chain(tags.remove.iter().map(|t| TagOp::Remove(t.clone())))
            .collect()
    }
}

/// An ordered, immutable rule set plus the run-level settings the rule
/// file carries (alias table, common-tag threshold).
#[derive(Debug, Clone)]
pub struct RuleSet {
    pub mode: MatchMode,
    pub aliases: AliasTable,
    pub common_tag_threshold: usize,
    rules: Vec<CompiledRule>,
}

impl RuleSet {
    /// Load and compile a rule file.
    ///
    /// # Errors
    ///
    /// Returns [`OrganizerError::Io`] if the file cannot be read and
    /// [`OrganizerError::RuleDefinition`] for schema or pattern errors.
    pub fn load(path: &Path) -> Result<Self, OrganizerError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml(&text)
    }

    /// Compile a rule document from YAML text.
    ///
    /// # Errors
    ///
    /// Returns [`OrganizerError::RuleDefinition`] with the offending rule
    /// index for per-rule schema and pattern errors.
    pub fn from_yaml(text: &str) -> Result<Self, OrganizerError> {
        let def: RuleFileDef =
            serde_yaml::from_str(text).map_err(|e| OrganizerError::RuleDefinition {
                index: 0,
                message: format!("invalid rule file: {e}"),
            })?;

        let mut rules = Vec::with_capacity(def.rules.len());
        for (index, value) in def.rules.into_iter().enumerate() {
            let rule: RuleDef = serde_yaml::from_value(value).map_err(|e| {
                OrganizerError::RuleDefinition {
                    index,
                    message: format!("invalid rule record: {e}"),
                }
            })?;
            let predicate = Predicate::compile(&rule.predicate)
                .map_err(|message| OrganizerError::RuleDefinition { index, message })?;
            rules.push(CompiledRule {
                name: rule.name,
                predicate,
                action: rule.action,
            });
        }

        // alias keys are matched against canonicalized tags
        let aliases: AliasTable = def
            .aliases
            .into_iter()
            .map(|(k, v)| (canonical(&k), v))
            .collect();

        Ok(Self {
            mode: def.mode,
            aliases,
            common_tag_threshold: def
                .common_tag_threshold
                .unwrap_or(DEFAULT_COMMON_TAG_THRESHOLD),
            rules,
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Classify one note against a rule set.
///
/// Rules are tried in declared order. In `first-match` mode the first
/// matching rule's action is the whole decision. In `accumulate` mode
/// every matching rule contributes its tag operations; destination and
/// rename come from the first match carrying one. A later match carrying
/// a *different* category is a conflict: it is logged and the decision
/// falls back to `Uncategorized`.
#[must_use]
pub fn classify(note: &Note, rules: &RuleSet) -> Decision {
    let mut decision = Decision::default();
    let mut category_rule: Option<usize> = None;

    for (index, rule) in rules.rules.iter().enumerate() {
        if !rule.matches(note) {
            continue;
        }
        debug!(
            note = %note.path.display(),
            rule = index,
            name = rule.name.as_deref().unwrap_or(""),
            "rule matched"
        );

        if decision.new_name.is_none() {
            if let Some(template) = &rule.action.rename {
                decision.new_name = rule.rename_target(note, template);
            }
        }

        if let Some(category) = rule.action.category {
            match category_rule {
                None => {
                    decision.category = Some(category);
                    category_rule = Some(index);
                }
                Some(first) if decision.category != Some(category) => {
                    let conflict = OrganizerError::ClassificationConflict {
                        note: note.path.display().to_string(),
                        kept: decision.destination().to_string(),
                        rejected: category.to_string(),
                    };
                    warn!(
                        %conflict,
                        first_rule = first,
                        conflicting_rule = index,
                        "defaulting to Uncategorized"
                    );
                    decision.category = Some(Category::Uncategorized);
                }
                Some(_) => {}
            }
        }

        decision.tag_ops.extend(rule.tag_ops());

        if rules.mode == MatchMode::FirstMatch {
            break;
        }
    }

    decision
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(path: &str, content: &str) -> Note {
        Note::from_content(path, content).unwrap()
    }

    #[test]
    fn first_match_mode_stops_at_first_rule() {
        let rules = RuleSet::from_yaml(
            r#"
rules:
  - match:
      has_tag: project
    action:
      category: project
  - match:
      has_tag: project
    action:
      category: archive
"#,
        )
        .unwrap();
        let decision = classify(&note("a.md", "---\ntags:\n- project\n---\n"), &rules);
        assert_eq!(decision.category, Some(Category::Project));
    }

    #[test]
    fn accumulate_mode_collects_tag_ops_in_order() {
        let rules = RuleSet::from_yaml(
            r#"
mode: accumulate
rules:
  - match:
      body_contains: deadline
    action:
      tags:
        add: [project]
  - match:
      filename: "draft"
    action:
      tags:
        add: [status/draft]
        remove: [published]
"#,
        )
        .unwrap();
        let n = note(
            "draft-plan.md",
            "---\ntags:\n- published\n---\nThe deadline is close.\n",
        );
        let decision = classify(&n, &rules);
        assert_eq!(
            decision.tag_ops,
            vec![
                TagOp::Add("project".to_string()),
                TagOp::Add("status/draft".to_string()),
                TagOp::Remove("published".to_string()),
            ]
        );

        let mut tags = n.tags.clone();
        for op in &decision.tag_ops {
            op.apply(&mut tags);
        }
        assert!(tags.contains("project"));
        assert!(tags.contains("status/draft"));
        assert!(!tags.contains("published"));
    }

    #[test]
    fn unmatched_note_gets_noop_decision() {
        let rules = RuleSet::from_yaml(
            "rules:\n  - match:\n      has_tag: project\n    action:\n      category: project\n",
        )
        .unwrap();
        let decision = classify(&note("plain.md", "Nothing here.\n"), &rules);
        assert!(decision.is_noop());
        assert_eq!(decision.destination(), Category::Uncategorized);
    }

    #[test]
    fn named_captures_expand_into_rename_template() {
        let rules = RuleSet::from_yaml(
            r#"
rules:
  - match:
      filename: '^(?P<date>\d{4}-\d{2}-\d{2}) (?P<rest>.+)\.md$'
    action:
      rename: "${date}-${rest}.md"
"#,
        )
        .unwrap();
        let decision = classify(&note("2024-03-01 weekly review.md", "x\n"), &rules);
        assert_eq!(
            decision.new_name.as_deref(),
            Some("2024-03-01-weekly review.md")
        );
    }

    #[test]
    fn conflicting_categories_default_to_uncategorized() {
        let rules = RuleSet::from_yaml(
            r#"
mode: accumulate
rules:
  - match:
      has_tag: project
    action:
      category: project
  - match:
      has_tag: old
    action:
      category: archive
"#,
        )
        .unwrap();
        let decision = classify(
            &note("a.md", "---\ntags:\n- project\n- old\n---\n"),
            &rules,
        );
        assert_eq!(decision.category, Some(Category::Uncategorized));
    }

    #[test]
    fn invalid_regex_fails_load_with_rule_index() {
        let err = RuleSet::from_yaml(
            r#"
rules:
  - match:
      has_tag: fine
  - match:
      filename: "([unclosed"
"#,
        )
        .unwrap_err();
        match err {
            OrganizerError::RuleDefinition { index, .. } => assert_eq!(index, 1),
            other => panic!("expected RuleDefinition, got {other}"),
        }
    }

    #[test]
    fn bad_rule_schema_reports_index() {
        let err = RuleSet::from_yaml("rules:\n  - action:\n      category: project\n").unwrap_err();
        match err {
            OrganizerError::RuleDefinition { index, .. } => assert_eq!(index, 0),
            other => panic!("expected RuleDefinition, got {other}"),
        }
    }

    #[test]
    fn alias_keys_are_canonicalized_at_load() {
        let rules = RuleSet::from_yaml("aliases:\n  ML: machine-learning\nrules: []\n").unwrap();
        assert_eq!(
            rules.aliases.get("ml").map(String::as_str),
            Some("machine-learning")
        );
    }

    #[test]
    fn draft_rule_yields_exact_tag_set() {
        // filename contains "draft" -> add status/draft
        let rules = RuleSet::from_yaml(
            r#"
mode: accumulate
rules:
  - match:
      filename: "draft"
    action:
      tags:
        add: [status/draft]
"#,
        )
        .unwrap();
        let n = note("draft-ideas.md", "Some ideas.\n");
        let decision = classify(&n, &rules);

        let mut tags = n.tags.clone();
        for op in &decision.tag_ops {
            op.apply(&mut tags);
        }
        let normalized = sb_core::tags::normalize(tags.iter(), &rules.aliases);
        assert_eq!(
            normalized.into_iter().collect::<Vec<_>>(),
            vec!["status/draft".to_string()]
        );
    }
}
