//! CLI command definitions and argument parsing.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Sanad CLI - Grade claims by the strength of their evidence chain.
#[derive(Debug, Parser)]
#[command(name = "sanad")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path
    #[arg(short, long, global = true, env = "SANAD_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log engine decisions at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
    /// Quiet format (grades only)
    Quiet,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Grade one or more claim snapshot files
    Grade(GradeArgs),

    /// Mark a defect cured
    Cure(DispositionArgs),

    /// Waive a defect
    Waive(DispositionArgs),

    /// Show the source tier table
    Tiers,

    /// Manage configuration
    Config(ConfigArgs),
}

/// Arguments for the grade command.
#[derive(Debug, Parser)]
pub struct GradeArgs {
    /// Snapshot JSON files
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Use a preset instead of the configured engine settings
    #[arg(short, long, value_enum)]
    pub preset: Option<PresetArg>,

    /// Append one JSON line per graded claim to this file
    #[arg(long)]
    pub audit_log: Option<PathBuf>,

    /// Write each result as JSON next to its snapshot (`<file>.result.json`)
    #[arg(long)]
    pub write_results: bool,
}

/// Arguments for cure and waive.
#[derive(Debug, Parser)]
pub struct DispositionArgs {
    /// Grade result the defect was raised in
    #[arg(short, long)]
    pub result: PathBuf,

    /// Ledger file; seeded from the result when absent
    #[arg(short, long)]
    pub ledger: PathBuf,

    /// Defect id
    #[arg(short, long)]
    pub defect: String,

    /// Accountable actor
    #[arg(short, long)]
    pub actor: String,

    /// Reason recorded with the disposition
    #[arg(long)]
    pub reason: String,

    /// Append the ledger entry as a JSON line to this file
    #[arg(long)]
    pub audit_log: Option<PathBuf>,
}

/// Arguments for configuration management.
#[derive(Debug, Parser)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Configuration actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Print the active configuration
    Show,

    /// Write a configuration file
    Init {
        /// Engine preset to start from
        #[arg(short, long, value_enum, default_value = "default")]
        preset: PresetArg,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the configuration file path
    Path,
}

/// Engine preset argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum PresetArg {
    /// Balanced thresholds
    Default,
    /// Tighter thresholds for regulated workflows
    Strict,
    /// Looser thresholds for early screening
    Lenient,
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
            CliFormat::Quiet => crate::config::OutputFormat::Quiet,
        }
    }
}

impl From<PresetArg> for sanad_engine::EngineConfig {
    fn from(preset: PresetArg) -> Self {
        match preset {
            PresetArg::Default => sanad_engine::EngineConfig::default(),
            PresetArg::Strict => sanad_engine::EngineConfig::strict(),
            PresetArg::Lenient => sanad_engine::EngineConfig::lenient(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grade_command() {
        let cli = Cli::parse_from(["sanad", "grade", "a.json", "b.json", "--audit-log", "audit.jsonl"]);
        match cli.command {
            Command::Grade(args) => {
                assert_eq!(args.files.len(), 2);
                assert_eq!(args.audit_log, Some(PathBuf::from("audit.jsonl")));
            }
            _ => panic!("Expected Grade command"),
        }
    }

    #[test]
    fn test_grade_requires_files() {
        assert!(Cli::try_parse_from(["sanad", "grade"]).is_err());
    }

    #[test]
    fn test_waive_command() {
        let cli = Cli::parse_from([
            "sanad",
            "waive",
            "--result",
            "r.json",
            "--ledger",
            "l.json",
            "--defect",
            "0000",
            "--actor",
            "partner:bo",
            "--reason",
            "Accepted",
        ]);
        assert!(matches!(cli.command, Command::Waive(_)));
    }

    #[test]
    fn test_preset_conversion() {
        let config: sanad_engine::EngineConfig = PresetArg::Strict.into();
        assert_eq!(config, sanad_engine::EngineConfig::strict());
    }
}
