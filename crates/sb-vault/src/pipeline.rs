//! The organizer pipeline: classify-and-move, tag normalization, and
//! generated-page output, all driven by one [`RunConfig`].
//!
//! Every stage scans fresh, applies per-note changes through atomic
//! writes, and collects per-note failures instead of aborting the batch.
//! Running any stage twice over an unchanged vault is a no-op.

use std::path::{Path, PathBuf};

use tracing::info;

use sb_core::tags::normalize;
use sb_core::{Category, Note, OrganizerError, RunConfig};
use sb_extract::entity_tags;
use sb_graph::{build_clusters, build_moc, render_cluster_map, GraphConfig, NoteGraph};
use sb_rules::{classify, Decision, RuleSet};

use crate::report::{NoteFailure, RunReport};
use crate::scan::scan;
use crate::store::{remove_old, write_atomic};

/// Name of the cluster map page.
pub const CLUSTER_PAGE: &str = "Semantic_Clusters.md";

/// Classify every note against the rule set, apply tag operations and
/// extracted entity tags, and move/rename notes into their PARA folders.
///
/// Per note: the rule decision's tag operations run first, then entity
/// tags extracted from the body are merged in, then the whole set is
/// normalized through the alias table. Notes land in their destination
/// category's folder; `Uncategorized` notes stay where they are. A note
/// whose destination already exists is recorded as a failure and left
/// untouched.
///
/// # Errors
///
/// Returns an error only when the vault root is missing; per-note
/// problems end up in the report's failure list.
pub fn classify_and_move(config: &RunConfig, rules: &RuleSet) -> Result<RunReport, OrganizerError> {
    let outcome = scan(config)?;
    let mut report = RunReport {
        scanned: outcome.notes.len(),
        failures: outcome.failures,
        dry_run: config.dry_run,
        ..RunReport::default()
    };

    for mut note in outcome.notes {
        let decision = classify(&note, rules);

        let tags_before = note.tags.clone();
        for op in &decision.tag_ops {
            op.apply(&mut note.tags);
        }
        for tag in entity_tags(&note.body) {
            note.tags.insert(tag);
        }
        let normalized = normalize(note.tags.iter(), &config.aliases);
        note.tags = normalized;

        note.ensure_title();
        note.sync_tags();

        let old_path = note.path.clone();
        let new_path = destination_path(&note, &decision);
        let moved = new_path.parent() != old_path.parent();
        let renamed = new_path.file_name() != old_path.file_name();

        if new_path == old_path && !note.is_dirty() {
            continue;
        }

        let abs_old = config.vault_root.join(&old_path);
        let abs_new = config.vault_root.join(&new_path);
        if new_path != old_path && abs_new.exists() {
            report.failures.push(NoteFailure {
                path: old_path,
                cause: format!("destination already exists: {}", new_path.display()),
            });
            continue;
        }

        if moved {
            report.moved += 1;
        }
        if renamed {
            report.renamed += 1;
        }
        if note.tags != tags_before {
            report.tags_changed += 1;
        }

        if config.dry_run {
            info!(
                from = %old_path.display(),
                to = %new_path.display(),
                "would update note"
            );
            continue;
        }

        match write_atomic(&abs_new, &note.render()) {
            Ok(()) => {
                if new_path != old_path {
                    if let Err(e) = remove_old(&abs_old) {
                        report.failures.push(NoteFailure {
                            path: old_path.clone(),
                            cause: format!("moved but old copy remains: {e}"),
                        });
                    }
                    info!(
                        from = %old_path.display(),
                        to = %new_path.display(),
                        "note relocated"
                    );
                }
            }
            Err(e) => {
                // undo the counts, nothing was written
                if moved {
                    report.moved -= 1;
                }
                if renamed {
                    report.renamed -= 1;
                }
                if note.tags != tags_before {
                    report.tags_changed -= 1;
                }
                report.failures.push(NoteFailure {
                    path: old_path,
                    cause: e.to_string(),
                });
            }
        }
    }

    Ok(report)
}

/// Normalize every note's tag set through the alias table, in place.
///
/// # Errors
///
/// Returns an error only when the vault root is missing.
pub fn normalize_tags(config: &RunConfig) -> Result<RunReport, OrganizerError> {
    let outcome = scan(config)?;
    let mut report = RunReport {
        scanned: outcome.notes.len(),
        failures: outcome.failures,
        dry_run: config.dry_run,
        ..RunReport::default()
    };

    for mut note in outcome.notes {
        let normalized = normalize(note.tags.iter(), &config.aliases);
        if normalized == note.tags {
            continue;
        }
        note.tags = normalized;
        note.sync_tags();
        report.tags_changed += 1;

        if config.dry_run {
            continue;
        }
        let abs = config.vault_root.join(&note.path);
        if let Err(e) = write_atomic(&abs, &note.render()) {
            report.tags_changed -= 1;
            report.failures.push(NoteFailure {
                path: note.path.clone(),
                cause: e.to_string(),
            });
        }
    }

    Ok(report)
}

/// Generate one `{Label}_Index.md` MOC page per PARA category.
///
/// Pages land in `output_dir` (vault root by default) and carry
/// `generated: true` so later scans skip them. Without a timestamp the
/// output is byte-identical across runs over an unchanged vault.
///
/// # Errors
///
/// Returns an error only when the vault root is missing.
pub fn generate_moc(
    config: &RunConfig,
    output_dir: Option<&Path>,
    generated_at: Option<&str>,
) -> Result<RunReport, OrganizerError> {
    let outcome = scan(config)?;
    let mut report = RunReport {
        scanned: outcome.notes.len(),
        failures: outcome.failures,
        dry_run: config.dry_run,
        ..RunReport::default()
    };

    let graph = NoteGraph::build(&outcome.notes, &graph_config(config));
    let base = page_base(config, output_dir);
    for category in Category::PARA {
        let page = build_moc(&graph, category, generated_at);
        let path = base.join(format!("{}_Index.md", category.label()));
        write_page(config, &mut report, &path, &page);
    }

    Ok(report)
}

/// Generate the `Semantic_Clusters.md` cluster map page.
///
/// # Errors
///
/// Returns an error only when the vault root is missing.
pub fn generate_clusters(
    config: &RunConfig,
    min_cluster_size: usize,
    overlap_allowed: bool,
    generated_at: Option<&str>,
) -> Result<RunReport, OrganizerError> {
    let outcome = scan(config)?;
    let mut report = RunReport {
        scanned: outcome.notes.len(),
        failures: outcome.failures,
        dry_run: config.dry_run,
        ..RunReport::default()
    };

    let graph = NoteGraph::build(&outcome.notes, &graph_config(config));
    let clusters = build_clusters(&graph, min_cluster_size, overlap_allowed);
    let page = render_cluster_map(&graph, &clusters, generated_at);
    let path = config.vault_root.join(CLUSTER_PAGE);
    write_page(config, &mut report, &path, &page);

    Ok(report)
}

fn graph_config(config: &RunConfig) -> GraphConfig {
    GraphConfig {
        common_tag_threshold: config.common_tag_threshold,
    }
}

fn page_base(config: &RunConfig, output_dir: Option<&Path>) -> PathBuf {
    match output_dir {
        Some(dir) if dir.is_absolute() => dir.to_path_buf(),
        Some(dir) => config.vault_root.join(dir),
        None => config.vault_root.clone(),
    }
}

fn write_page(config: &RunConfig, report: &mut RunReport, path: &Path, page: &str) {
    if config.dry_run {
        report.pages_written.push(path.to_path_buf());
        return;
    }
    match write_atomic(path, page) {
        Ok(()) => report.pages_written.push(path.to_path_buf()),
        Err(e) => report.failures.push(NoteFailure {
            path: path.to_path_buf(),
            cause: e.to_string(),
        }),
    }
}

/// Vault-relative path a note should occupy after applying a decision.
fn destination_path(note: &Note, decision: &Decision) -> PathBuf {
    let file_name = match &decision.new_name {
        Some(name) if !name.is_empty() => {
            if name.ends_with(".md") {
                name.clone()
            } else {
                format!("{name}.md")
            }
        }
        _ => note
            .path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string(),
    };
    match decision.destination().folder() {
        Some(folder) => Path::new(folder).join(file_name),
        None => note
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map_or_else(|| PathBuf::from(&file_name), |p| p.join(&file_name)),
    }
}
