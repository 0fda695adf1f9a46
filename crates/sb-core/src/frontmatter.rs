//! YAML frontmatter parsing and format-preserving writing.
//!
//! Handles the `---` delimited frontmatter block in markdown notes.
//! Format:
//! ```markdown
//! ---
//! title: "Alpha Project"
//! tags:
//!   - project
//!   - rust
//! ---
//!
//! ## Body content here
//! ```
//!
//! Unlike a plain serde round trip, every untouched entry keeps its raw
//! source lines, so `serialize(parse(x))` reproduces `x` byte-for-byte
//! when no field was mutated. Only mutated or newly added entries are
//! re-emitted through `serde_yaml`.

use crate::error::OrganizerError;

/// Parsed value of a single frontmatter entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// A scalar value (string, number, bool — all held as text).
    Scalar(String),
    /// A list of scalar items.
    List(Vec<String>),
    /// A nested structure we carry through verbatim but do not interpret.
    Opaque,
}

/// One top-level frontmatter entry, or a passthrough line (blank / comment).
#[derive(Debug, Clone)]
struct Entry {
    /// `None` for passthrough lines.
    key: Option<String>,
    value: FieldValue,
    /// Original source lines, including terminating newlines.
    raw: String,
    dirty: bool,
}

/// An ordered frontmatter mapping that round-trips unknown fields losslessly.
#[derive(Debug, Clone)]
pub struct Frontmatter {
    entries: Vec<Entry>,
    had_block: bool,
    closed_with_newline: bool,
    /// Delimiter lines used CRLF endings; re-emit them the same way.
    crlf: bool,
}

impl Default for Frontmatter {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            had_block: false,
            closed_with_newline: true,
            crlf: false,
        }
    }
}

/// Split a note into frontmatter and body.
///
/// A file that does not open with a `---` line is treated as body-only
/// with empty frontmatter (soft failure — a batch run never aborts over
/// a note without metadata).
///
/// # Errors
///
/// Returns [`OrganizerError::Parse`] if the block is opened but never
/// closed, or if an entry inside the block is not valid YAML.
pub fn parse(content: &str) -> Result<(Frontmatter, &str), OrganizerError> {
    let (rest, crlf) = if let Some(rest) = content.strip_prefix("---\r\n") {
        (rest, true)
    } else if let Some(rest) = content.strip_prefix("---\n") {
        (rest, false)
    } else {
        return Ok((Frontmatter::default(), content));
    };

    let mut search = 0;
    loop {
        let line_end = rest[search..].find('\n').map(|i| search + i);
        let line = match line_end {
            Some(end) => &rest[search..end],
            None => &rest[search..],
        };
        if line.strip_suffix('\r').unwrap_or(line) == "---" {
            let block = &rest[..search];
            let (body, closed_with_newline) = match line_end {
                Some(end) => (&rest[end + 1..], true),
                None => ("", false),
            };
            let mut fm = Frontmatter::from_block(block)?;
            fm.had_block = true;
            fm.closed_with_newline = closed_with_newline;
            fm.crlf = crlf;
            return Ok((fm, body));
        }
        match line_end {
            Some(end) => search = end + 1,
            None => {
                return Err(OrganizerError::Parse(
                    "unterminated frontmatter block: no closing '---' found".to_string(),
                ))
            }
        }
    }
}

/// Write frontmatter and body back out as a markdown note.
///
/// Untouched entries are emitted verbatim; a note that never had a block
/// and gained no fields serializes to its body alone.
#[must_use]
pub fn serialize(fm: &Frontmatter, body: &str) -> String {
    let block = fm.to_block();
    if block.is_empty() && !fm.had_block {
        return body.to_string();
    }

    let eol = if fm.crlf { "\r\n" } else { "\n" };
    let mut out = String::with_capacity(block.len() + body.len() + 10);
    out.push_str("---");
    out.push_str(eol);
    out.push_str(&block);
    out.push_str("---");
    if fm.closed_with_newline || !body.is_empty() {
        out.push_str(eol);
    }
    out.push_str(body);
    out
}

impl Frontmatter {
    fn from_block(block: &str) -> Result<Self, OrganizerError> {
        let mut entries: Vec<Entry> = Vec::new();
        // (key, raw) of the entry currently being collected
        let mut current: Option<(String, String)> = None;

        for line in block.split_inclusive('\n') {
            let text = line.strip_suffix('\n').unwrap_or(line);
            let text = text.strip_suffix('\r').unwrap_or(text);
            let trimmed = text.trim();

            let is_continuation = text.starts_with(' ')
                || text.starts_with('\t')
                || text.starts_with("- ")
                || text == "-";

            if is_continuation {
                match current.as_mut() {
                    Some((_, raw)) => raw.push_str(line),
                    None => {
                        return Err(OrganizerError::Parse(format!(
                            "frontmatter line '{text}' continues no entry"
                        )))
                    }
                }
            } else if trimmed.is_empty() || trimmed.starts_with('#') {
                if let Some((key, raw)) = current.take() {
                    entries.push(Entry::parsed(key, raw)?);
                }
                entries.push(Entry::passthrough(line));
            } else if let Some(colon) = text.find(':') {
                if let Some((key, raw)) = current.take() {
                    entries.push(Entry::parsed(key, raw)?);
                }
                current = Some((text[..colon].trim().to_string(), line.to_string()));
            } else {
                return Err(OrganizerError::Parse(format!(
                    "malformed frontmatter line: '{text}'"
                )));
            }
        }
        if let Some((key, raw)) = current.take() {
            entries.push(Entry::parsed(key, raw)?);
        }

        Ok(Self {
            entries,
            had_block: true,
            closed_with_newline: true,
            crlf: false,
        })
    }

    /// Look up an entry by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.entries
            .iter()
            .find(|e| e.key.as_deref() == Some(key))
            .map(|e| &e.value)
    }

    /// Scalar value of a key, if the key holds a scalar.
    #[must_use]
    pub fn scalar(&self, key: &str) -> Option<&str> {
        match self.get(key) {
            Some(FieldValue::Scalar(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    /// List items of a key, if the key holds a list.
    #[must_use]
    pub fn list(&self, key: &str) -> Option<&[String]> {
        match self.get(key) {
            Some(FieldValue::List(items)) => Some(items.as_slice()),
            _ => None,
        }
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Keys in declaration order, skipping passthrough lines.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().filter_map(|e| e.key.as_deref())
    }

    /// Set a scalar field. A no-op when the value is already equal, so
    /// untouched notes keep their exact bytes.
    pub fn set_scalar(&mut self, key: &str, value: impl Into<String>) {
        self.set(key, FieldValue::Scalar(value.into()));
    }

    /// Set a list field. A no-op when the items are already equal.
    pub fn set_list(&mut self, key: &str, items: Vec<String>) {
        self.set(key, FieldValue::List(items));
    }

    fn set(&mut self, key: &str, value: FieldValue) {
        if let Some(entry) = self
            .entries
            .iter_mut()
            .find(|e| e.key.as_deref() == Some(key))
        {
            if entry.value != value {
                entry.value = value;
                entry.dirty = true;
            }
        } else {
            self.entries.push(Entry {
                key: Some(key.to_string()),
                value,
                raw: String::new(),
                dirty: true,
            });
        }
    }

    /// Whether any field was mutated or added since parsing.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.entries.iter().any(|e| e.dirty)
    }

    fn to_block(&self) -> String {
        let mut out = String::new();
        for entry in &self.entries {
            if entry.dirty {
                out.push_str(&emit_entry(
                    entry.key.as_deref().unwrap_or_default(),
                    &entry.value,
                ));
            } else {
                out.push_str(&entry.raw);
            }
        }
        if !out.is_empty() && !out.ends_with('\n') {
            out.push('\n');
        }
        out
    }
}

impl Entry {
    fn passthrough(raw: &str) -> Self {
        Self {
            key: None,
            value: FieldValue::Opaque,
            raw: raw.to_string(),
            dirty: false,
        }
    }

    fn parsed(key: String, raw: String) -> Result<Self, OrganizerError> {
        let value: serde_yaml::Value = serde_yaml::from_str(&raw)
            .map_err(|e| OrganizerError::Parse(format!("invalid frontmatter entry '{key}': {e}")))?;
        let value = match value {
            serde_yaml::Value::Mapping(mut map) => {
                let inner = map
                    .iter_mut()
                    .next()
                    .map(|(_, v)| std::mem::take(v))
                    .unwrap_or(serde_yaml::Value::Null);
                field_from_yaml(inner)
            }
            // "key:" with nothing following parses as a plain null
            serde_yaml::Value::Null => FieldValue::Scalar(String::new()),
            _ => FieldValue::Opaque,
        };
        Ok(Self {
            key: Some(key),
            value,
            raw,
            dirty: false,
        })
    }
}

fn field_from_yaml(value: serde_yaml::Value) -> FieldValue {
    match value {
        serde_yaml::Value::Null => FieldValue::Scalar(String::new()),
        serde_yaml::Value::Bool(b) => FieldValue::Scalar(b.to_string()),
        serde_yaml::Value::Number(n) => FieldValue::Scalar(n.to_string()),
        serde_yaml::Value::String(s) => FieldValue::Scalar(s),
        serde_yaml::Value::Sequence(seq) => FieldValue::List(
            seq.into_iter()
                .map(|item| match item {
                    serde_yaml::Value::String(s) => s,
                    serde_yaml::Value::Bool(b) => b.to_string(),
                    serde_yaml::Value::Number(n) => n.to_string(),
                    _ => String::new(),
                })
                .collect(),
        ),
        _ => FieldValue::Opaque,
    }
}

fn emit_entry(key: &str, value: &FieldValue) -> String {
    let yaml = match value {
        FieldValue::Scalar(s) => serde_yaml::Value::String(s.clone()),
        FieldValue::List(items) => serde_yaml::Value::Sequence(
            items
                .iter()
                .map(|i| serde_yaml::Value::String(i.clone()))
                .collect(),
        ),
        FieldValue::Opaque => serde_yaml::Value::Null,
    };
    let mut map = serde_yaml::Mapping::new();
    map.insert(serde_yaml::Value::String(key.to_string()), yaml);
    serde_yaml::to_string(&serde_yaml::Value::Mapping(map)).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOTE: &str = "---\ntitle: \"Alpha Project\"\nstatus: active\ntags:\n  - project\n  - Rust\n# reviewed 2024\ncustom_field: 42\n---\n\n## Hello\n\nBody text.\n";

    #[test]
    fn parse_extracts_fields_and_body() {
        let (fm, body) = parse(NOTE).unwrap();
        assert_eq!(fm.scalar("title"), Some("Alpha Project"));
        assert_eq!(fm.scalar("status"), Some("active"));
        assert_eq!(
            fm.list("tags"),
            Some(&["project".to_string(), "Rust".to_string()][..])
        );
        assert_eq!(fm.scalar("custom_field"), Some("42"));
        assert!(body.contains("## Hello"));
    }

    #[test]
    fn untouched_note_roundtrips_byte_for_byte() {
        let (fm, body) = parse(NOTE).unwrap();
        assert_eq!(serialize(&fm, body), NOTE);
    }

    #[test]
    fn note_without_frontmatter_is_body_only() {
        let content = "# Just a heading\n\nNo metadata here.\n";
        let (fm, body) = parse(content).unwrap();
        assert!(!fm.contains_key("title"));
        assert_eq!(body, content);
        assert_eq!(serialize(&fm, body), content);
    }

    #[test]
    fn unterminated_block_is_an_error() {
        let content = "---\ntitle: broken\n\nNo closer anywhere.\n";
        assert!(parse(content).is_err());
    }

    #[test]
    fn setting_equal_value_keeps_bytes_identical() {
        let (mut fm, body) = parse(NOTE).unwrap();
        fm.set_scalar("status", "active");
        fm.set_list("tags", vec!["project".to_string(), "Rust".to_string()]);
        assert!(!fm.is_dirty());
        assert_eq!(serialize(&fm, body), NOTE);
    }

    #[test]
    fn mutating_one_field_preserves_the_others() {
        let (mut fm, body) = parse(NOTE).unwrap();
        fm.set_scalar("status", "archived");
        let out = serialize(&fm, body);
        assert!(out.contains("status: archived"));
        // untouched entries keep their original formatting
        assert!(out.contains("title: \"Alpha Project\""));
        assert!(out.contains("# reviewed 2024"));
        assert!(out.contains("custom_field: 42"));
        assert!(out.ends_with("Body text.\n"));
    }

    #[test]
    fn new_field_is_appended_to_the_block() {
        let (mut fm, body) = parse(NOTE).unwrap();
        fm.set_scalar("category", "project");
        let out = serialize(&fm, body);
        let (reparsed, _) = parse(&out).unwrap();
        assert_eq!(reparsed.scalar("category"), Some("project"));
        // declaration order of existing keys is preserved
        let keys: Vec<&str> = reparsed.keys().collect();
        assert_eq!(keys, ["title", "status", "tags", "custom_field", "category"]);
    }

    #[test]
    fn adding_field_to_bare_note_creates_a_block() {
        let content = "Just body text.\n";
        let (mut fm, body) = parse(content).unwrap();
        fm.set_scalar("title", "Bare");
        let out = serialize(&fm, body);
        assert!(out.starts_with("---\ntitle: Bare\n---\n"));
        assert!(out.ends_with("Just body text.\n"));
    }

    #[test]
    fn empty_block_roundtrips() {
        let content = "---\n---\nBody.\n";
        let (fm, body) = parse(content).unwrap();
        assert_eq!(serialize(&fm, body), content);
    }

    #[test]
    fn crlf_note_parses_and_roundtrips() {
        let raw = "---\r\ntitle: Windows Note\r\ntags:\r\n- project\r\n---\r\nBody.\r\n";
        let (fm, body) = parse(raw).unwrap();
        assert_eq!(fm.scalar("title"), Some("Windows Note"));
        assert_eq!(fm.list("tags"), Some(&["project".to_string()][..]));
        assert_eq!(body, "Body.\r\n");
        assert_eq!(serialize(&fm, body), raw);
    }

    #[test]
    fn invalid_entry_yaml_is_a_parse_error() {
        let content = "---\ntitle: [unclosed\n---\nBody.\n";
        assert!(parse(content).is_err());
    }

    #[test]
    fn scalar_tags_value_is_not_a_list() {
        let content = "---\ntags: solo\n---\n";
        let (fm, _) = parse(content).unwrap();
        assert_eq!(fm.list("tags"), None);
        assert_eq!(fm.scalar("tags"), Some("solo"));
    }
}
