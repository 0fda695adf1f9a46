//! Run report: what a batch run did (or, under dry-run, would do).

use std::fmt;
use std::path::PathBuf;

/// A note the run could not process. The batch continues past it.
#[derive(Debug, Clone)]
pub struct NoteFailure {
    /// Vault-relative path of the failed note.
    pub path: PathBuf,
    pub cause: String,
}

/// Summary of one organizer run, printed at the end.
#[derive(Debug, Default)]
pub struct RunReport {
    pub scanned: usize,
    pub moved: usize,
    pub renamed: usize,
    pub tags_changed: usize,
    /// Generated pages written this run (MOC indexes, cluster map).
    pub pages_written: Vec<PathBuf>,
    pub failures: Vec<NoteFailure>,
    pub dry_run: bool,
}

impl RunReport {
    /// Whether the run changed (or would change) anything at all.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.moved == 0
            && self.renamed == 0
            && self.tags_changed == 0
            && self.pages_written.is_empty()
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.dry_run {
            writeln!(f, "dry run, no files were written")?;
        }
        writeln!(f, "scanned:      {}", self.scanned)?;
        writeln!(f, "moved:        {}", self.moved)?;
        writeln!(f, "renamed:      {}", self.renamed)?;
        writeln!(f, "tags changed: {}", self.tags_changed)?;
        for page in &self.pages_written {
            writeln!(f, "wrote:        {}", page.display())?;
        }
        if !self.failures.is_empty() {
            writeln!(f, "failures:     {}", self.failures.len())?;
            for failure in &self.failures {
                writeln!(f, "  {}: {}", failure.path.display(), failure.cause)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_lists_counts_and_failures() {
        let report = RunReport {
            scanned: 3,
            moved: 1,
            renamed: 0,
            tags_changed: 2,
            pages_written: vec![PathBuf::from("Projects_Index.md")],
            failures: vec![NoteFailure {
                path: PathBuf::from("broken.md"),
                cause: "unterminated frontmatter".to_string(),
            }],
            dry_run: false,
        };
        let text = report.to_string();
        assert!(text.contains("scanned:      3"));
        assert!(text.contains("wrote:        Projects_Index.md"));
        assert!(text.contains("broken.md: unterminated frontmatter"));
        assert!(!report.is_noop());
    }

    #[test]
    fn dry_run_is_announced() {
        let report = RunReport {
            dry_run: true,
            ..RunReport::default()
        };
        assert!(report.to_string().starts_with("dry run"));
        assert!(report.is_noop());
    }
}
