//! Vault scanning: discover every user note under the vault root.

use std::path::Path;

use tracing::debug;
use walkdir::WalkDir;

use sb_core::{Note, OrganizerError, RunConfig};

use crate::report::NoteFailure;

/// Result of a full vault scan.
#[derive(Debug, Default)]
pub struct ScanOutcome {
    /// User notes, ordered by vault-relative path.
    pub notes: Vec<Note>,
    /// Machine-generated pages (MOC/cluster output) found and skipped.
    pub skipped_generated: usize,
    /// Notes that could not be parsed; the batch run continues past them.
    pub failures: Vec<NoteFailure>,
}

/// Walk the vault and parse every markdown note.
///
/// Dot-directories (`.obsidian`, `.git`, …) and the `Templates` folder
/// are skipped, as are pages marked `generated: true`. A note whose
/// frontmatter block is unterminated is recorded as a per-note failure,
/// never a fatal error.
///
/// # Errors
///
/// Returns [`OrganizerError::Vault`] if the vault root does not exist.
pub fn scan(config: &RunConfig) -> Result<ScanOutcome, OrganizerError> {
    if !config.vault_root.is_dir() {
        return Err(OrganizerError::Vault(format!(
            "vault root not found: {}",
            config.vault_root.display()
        )));
    }

    let mut outcome = ScanOutcome::default();
    let walker = WalkDir::new(&config.vault_root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            // the root itself is always walked, whatever its name
            if entry.depth() == 0 {
                return true;
            }
            let name = entry.file_name().to_string_lossy();
            !(entry.file_type().is_dir() && (name.starts_with('.') || name == "Templates"))
        });

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                outcome.failures.push(NoteFailure {
                    path: e.path().map(Path::to_path_buf).unwrap_or_default(),
                    cause: e.to_string(),
                });
                continue;
            }
        };
        if !entry.file_type().is_file()
            || entry.path().extension().and_then(|e| e.to_str()) != Some("md")
        {
            continue;
        }

        let rel = entry
            .path()
            .strip_prefix(&config.vault_root)
            .unwrap_or(entry.path())
            .to_path_buf();

        let content = match std::fs::read_to_string(entry.path()) {
            Ok(content) => content,
            Err(e) => {
                outcome.failures.push(NoteFailure {
                    path: rel,
                    cause: e.to_string(),
                });
                continue;
            }
        };

        match Note::from_content(rel.clone(), &content) {
            Ok(note) if note.is_generated() => {
                debug!(path = %rel.display(), "skipping generated page");
                outcome.skipped_generated += 1;
            }
            Ok(note) => outcome.notes.push(note),
            Err(e) => outcome.failures.push(NoteFailure {
                path: rel,
                cause: e.to_string(),
            }),
        }
    }

    outcome.notes.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn vault() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("01_Projects")).unwrap();
        fs::create_dir_all(dir.path().join(".obsidian")).unwrap();
        fs::create_dir_all(dir.path().join("Templates")).unwrap();
        fs::write(
            dir.path().join("01_Projects/alpha.md"),
            "---\ntitle: Alpha\n---\nBody.\n",
        )
        .unwrap();
        fs::write(dir.path().join("inbox.md"), "Plain body note.\n").unwrap();
        fs::write(dir.path().join(".obsidian/config.md"), "hidden\n").unwrap();
        fs::write(dir.path().join("Templates/daily.md"), "template\n").unwrap();
        fs::write(dir.path().join("notes.txt"), "not markdown\n").unwrap();
        dir
    }

    #[test]
    fn scan_finds_markdown_notes_only() {
        let dir = vault();
        let outcome = scan(&RunConfig::new(dir.path())).unwrap();
        let paths: Vec<String> = outcome
            .notes
            .iter()
            .map(|n| n.path.to_string_lossy().into_owned())
            .collect();
        assert_eq!(paths, ["01_Projects/alpha.md", "inbox.md"]);
        assert!(outcome.failures.is_empty());
    }

    #[test]
    fn scan_skips_generated_pages() {
        let dir = vault();
        fs::write(
            dir.path().join("Projects_Index.md"),
            "---\ntitle: Projects Index\ngenerated: true\n---\n# Index\n",
        )
        .unwrap();
        let outcome = scan(&RunConfig::new(dir.path())).unwrap();
        assert_eq!(outcome.skipped_generated, 1);
        assert!(outcome.notes.iter().all(|n| n.stem() != "Projects_Index"));
    }

    #[test]
    fn malformed_note_is_a_per_note_failure() {
        let dir = vault();
        fs::write(
            dir.path().join("broken.md"),
            "---\ntitle: never closed\n\nBody.\n",
        )
        .unwrap();
        let outcome = scan(&RunConfig::new(dir.path())).unwrap();
        assert_eq!(outcome.failures.len(), 1);
        assert!(outcome.failures[0].cause.contains("unterminated"));
        // the rest of the vault still scans
        assert_eq!(outcome.notes.len(), 2);
    }

    #[test]
    fn dot_named_vault_root_is_still_scanned() {
        let parent = tempfile::tempdir().unwrap();
        for root_name in [".vault", "Templates"] {
            let root = parent.path().join(root_name);
            fs::create_dir(&root).unwrap();
            fs::write(root.join("note.md"), "Body.\n").unwrap();
            let outcome = scan(&RunConfig::new(&root)).unwrap();
            assert_eq!(outcome.notes.len(), 1, "root {root_name} scanned as empty");
        }
    }

    #[test]
    fn missing_vault_root_is_fatal() {
        let result = scan(&RunConfig::new("/nonexistent/vault/path"));
        assert!(result.is_err());
    }
}
