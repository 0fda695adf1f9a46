//! sb CLI — PARA organizer for Obsidian vaults
//!
//! Commands: classify, normalize-tags, moc, clusters, completions

use std::io;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{CommandFactory, Parser};
use clap_complete::Shell;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use sb_core::RunConfig;
use sb_rules::RuleSet;
use sb_vault::{classify_and_move, generate_clusters, generate_moc, normalize_tags, RunReport};

#[derive(Parser)]
#[command(name = "sb")]
#[command(version)]
#[command(about = "PARA organizer for Obsidian vaults")]
struct Cli {
    /// Vault root (defaults to $OBSIDIAN_VAULT)
    #[arg(long, global = true)]
    vault: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Classify notes against a rule file and move them into PARA folders
    Classify {
        /// YAML rule file
        #[arg(long)]
        rules: PathBuf,
        /// Report intended changes without writing anything
        #[arg(long)]
        dry_run: bool,
    },
    /// Canonicalize every note's tags through the alias table
    NormalizeTags {
        /// Rule file supplying the alias table (tags are still
        /// canonicalized without one)
        #[arg(long)]
        rules: Option<PathBuf>,
        /// Report intended changes without writing anything
        #[arg(long)]
        dry_run: bool,
    },
    /// Generate one index page per PARA category
    Moc {
        /// Directory for generated pages, relative to the vault root
        #[arg(long)]
        output: Option<PathBuf>,
        /// Stamp pages with the generation time
        #[arg(long)]
        timestamp: bool,
    },
    /// Generate the semantic cluster map page
    Clusters {
        /// Minimum notes per cluster
        #[arg(long, default_value_t = 2)]
        min_size: usize,
        /// Allow a note to appear in several clusters
        #[arg(long)]
        overlap: bool,
        /// Stamp the page with the generation time
        #[arg(long)]
        timestamp: bool,
    },
    /// Emit shell completions
    Completions { shell: Shell },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let report = match cli.command {
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "sb", &mut io::stdout());
            return Ok(());
        }
        Commands::Classify { rules, dry_run } => {
            let rule_set = RuleSet::load(&rules)
                .with_context(|| format!("loading rules from {}", rules.display()))?;
            let mut config = vault_config(cli.vault)?.dry_run(dry_run);
            config.aliases = rule_set.aliases.clone();
            config.common_tag_threshold = rule_set.common_tag_threshold;
            classify_and_move(&config, &rule_set)?
        }
        Commands::NormalizeTags { rules, dry_run } => {
            let mut config = vault_config(cli.vault)?.dry_run(dry_run);
            if let Some(path) = rules {
                let rule_set = RuleSet::load(&path)
                    .with_context(|| format!("loading rules from {}", path.display()))?;
                config.aliases = rule_set.aliases;
            }
            normalize_tags(&config)?
        }
        Commands::Moc { output, timestamp } => {
            let config = vault_config(cli.vault)?;
            let stamp = timestamp.then(generation_stamp);
            generate_moc(&config, output.as_deref(), stamp.as_deref())?
        }
        Commands::Clusters {
            min_size,
            overlap,
            timestamp,
        } => {
            let config = vault_config(cli.vault)?;
            let stamp = timestamp.then(generation_stamp);
            generate_clusters(&config, min_size, overlap, stamp.as_deref())?
        }
    };

    finish(&report)
}

/// Resolve the vault root from `--vault`, falling back to the
/// `OBSIDIAN_VAULT` environment variable.
fn vault_config(cli_vault: Option<PathBuf>) -> Result<RunConfig> {
    let root = match cli_vault {
        Some(path) => path,
        None => match std::env::var_os("OBSIDIAN_VAULT") {
            Some(v) if !v.is_empty() => PathBuf::from(v),
            _ => bail!("no vault given: pass --vault or set OBSIDIAN_VAULT"),
        },
    };
    debug!(root = %root.display(), "vault root resolved");
    Ok(RunConfig::new(root))
}

fn generation_stamp() -> String {
    chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// Print the run report; per-note failures make the exit code nonzero
/// even though the rest of the batch went through.
fn finish(report: &RunReport) -> Result<()> {
    print!("{report}");
    if report.failures.is_empty() {
        Ok(())
    } else {
        bail!("{} note(s) failed", report.failures.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn vault_flag_wins_over_environment() {
        let config = vault_config(Some(PathBuf::from("/tmp/explicit"))).unwrap();
        assert_eq!(config.vault_root, PathBuf::from("/tmp/explicit"));
    }
}
