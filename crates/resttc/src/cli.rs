//! Clap derive structures for the `resttc` CLI.
//!
//! Defines the command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// resttc -- Teamcenter requirement specifications from the command line
#[derive(Debug, Parser)]
#[command(
    name = "resttc",
    version,
    about = "Read Teamcenter requirement specifications and link models back to them",
    long_about = "Talks to a Teamcenter server through its JSON/REST services.\n\n\
        Reads requirement specification structure and text, runs saved queries,\n\
        and creates backlinks from model files to requirements.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Server alias to use
    #[arg(long, short = 'a', env = "RESTTC_ALIAS", global = true)]
    pub alias: Option<String>,

    /// Alias configuration file (default: platform config dir)
    #[arg(long, env = "RESTTC_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding <alias>_key.key and <alias>_CredFile.ini
    #[arg(long, env = "RESTTC_CREDENTIAL_DIR", global = true)]
    pub credential_dir: Option<PathBuf>,

    /// Root for downloaded specification images
    #[arg(long, env = "RESTTC_CACHE_DIR", global = true)]
    pub cache_dir: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "RESTTC_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "RESTTC_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides the alias setting)
    #[arg(long, env = "RESTTC_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show the specification behind an Active Workspace link
    Spec {
        /// Show-object URL (`...#/...showObject?uid=<uid>`)
        url: String,
    },

    /// List a specification's contents in document order
    #[command(alias = "toc")]
    Contents(ContentsArgs),

    /// Show the display name of a document or one of its entries
    Summary {
        /// Document identifier (ID_REV)
        document: String,

        /// Entry identifier; the document itself when omitted
        location: Option<String>,
    },

    /// Print the Active Workspace link of a document
    Url {
        /// Document identifier (ID_REV)
        document: String,
    },

    /// Run a saved query
    #[command(alias = "q")]
    Query(QueryArgs),

    /// Link a model to a requirement (no-op if the label already exists)
    Backlink(BacklinkArgs),

    /// List configured server aliases
    Aliases,

    /// Manage stored credentials
    Credential(CredentialArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Contents ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ContentsArgs {
    /// Specification identifier (ID_REV)
    pub spec: String,

    /// Include the visible text of every entry
    #[arg(long)]
    pub text: bool,
}

// ── Query ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct QueryArgs {
    /// Saved query name (e.g. "Item Revision...")
    pub name: String,

    /// Criterion as ENTRY=VALUE (repeatable)
    #[arg(long = "entry", short = 'e', value_parser = parse_entry)]
    pub entries: Vec<(String, String)>,

    /// Maximum number of results
    #[arg(long, short = 'l', default_value = "25")]
    pub limit: u32,
}

fn parse_entry(raw: &str) -> Result<(String, String), String> {
    let (entry, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected ENTRY=VALUE, got '{raw}'"))?;
    if entry.trim().is_empty() {
        return Err("entry name must not be empty".into());
    }
    Ok((entry.trim().to_owned(), value.to_owned()))
}

// ── Backlink ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct BacklinkArgs {
    /// Requirement identifier (ID_REV)
    #[arg(long, short = 'r')]
    pub requirement: String,

    /// Model file path; its file name names the surrogate item
    #[arg(long, short = 'm')]
    pub model: String,

    /// Backlink label (dataset name, unique per surrogate)
    #[arg(long, short = 'l')]
    pub label: String,

    /// Navigation command stored in the dataset description
    #[arg(long)]
    pub nav_command: String,
}

// ── Credential ───────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CredentialArgs {
    #[command(subcommand)]
    pub command: CredentialCommand,
}

#[derive(Debug, Subcommand)]
pub enum CredentialCommand {
    /// Seal a password and write the alias's key and credential files
    Create {
        /// Username (prompted when omitted)
        #[arg(long, short = 'u')]
        username: Option<String>,

        /// Read the password from stdin instead of prompting
        #[arg(long)]
        password_stdin: bool,

        /// Expiry in hours (recorded only when at least 2)
        #[arg(long)]
        expiry: Option<i64>,
    },

    /// Show where the alias's credential files are and whether they exist
    Show,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn entries_split_on_first_equals() {
        assert_eq!(
            parse_entry("Name=a=b").unwrap(),
            ("Name".to_owned(), "a=b".to_owned())
        );
        assert!(parse_entry("Name").is_err());
        assert!(parse_entry("=x").is_err());
    }
}
