use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Shared output mode across all commands.
#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
}

/// Top-level CLI parser for the `vgl` binary.
#[derive(Debug, Parser)]
#[command(name = "vgl", version, about = "Vigil - rule definition validator")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format: json, table
    #[arg(short, long, global = true, default_value = "table")]
    pub format: OutputFormat,

    /// Quiet mode (suppress non-essential output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Project root (relative store paths resolve under it)
    #[arg(short, long, global = true)]
    pub project: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Validate a rule file against a world fixture
    Check(CheckArgs),

    /// Silence an issue identity, optionally learning its value
    Suppress(SuppressArgs),

    /// Remove a suppression
    Unsuppress(KeyArgs),

    /// List active suppressions
    Suppressions,

    /// Remove every suppression
    ClearSuppressions,

    /// Show the issue taxonomy and its presentation groups
    Groups,
}

#[derive(Debug, clap::Args)]
pub struct CheckArgs {
    /// Rule definition file (a JSON object or array of objects)
    pub rules: PathBuf,

    /// World fixture file (registries, history, service schemas)
    #[arg(short, long)]
    pub world: PathBuf,

    /// Check template filter/test names against the bundled catalog
    #[arg(long)]
    pub strict_templates: bool,
}

#[derive(Debug, clap::Args)]
pub struct SuppressArgs {
    /// Issue identity key, `issue_type:subject:rule_id:path`
    pub key: String,

    /// Promote this value into the learned-states store
    #[arg(long)]
    pub learn: Option<String>,
}

#[derive(Debug, clap::Args)]
pub struct KeyArgs {
    /// Issue identity key, `issue_type:subject:rule_id:path`
    pub key: String,
}

#[cfg(test)]
mod tests {
    use clap::{CommandFactory, Parser};

    use super::{Cli, Commands, OutputFormat};

    #[test]
    fn clap_command_tree_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_parse_before_subcommand() {
        let cli = Cli::try_parse_from(["vgl", "--format", "json", "--verbose", "suppressions"])
            .expect("cli should parse");
        assert_eq!(cli.format, OutputFormat::Json);
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Suppressions));
    }

    #[test]
    fn global_flags_parse_after_subcommand() {
        let cli = Cli::try_parse_from(["vgl", "groups", "--format", "json", "--quiet"])
            .expect("cli should parse");
        assert_eq!(cli.format, OutputFormat::Json);
        assert!(cli.quiet);
        assert!(matches!(cli.command, Commands::Groups));
    }

    #[test]
    fn check_requires_a_world_file() {
        assert!(Cli::try_parse_from(["vgl", "check", "rules.json"]).is_err());
        let cli = Cli::try_parse_from(["vgl", "check", "rules.json", "--world", "world.json"])
            .expect("cli should parse");
        match cli.command {
            Commands::Check(args) => {
                assert_eq!(args.rules.to_str(), Some("rules.json"));
                assert!(!args.strict_templates);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn suppress_takes_an_optional_learn_value() {
        let cli = Cli::try_parse_from([
            "vgl",
            "suppress",
            "unknown_state:binary_sensor.door:r1:trigger/0/to",
            "--learn",
            "ajar",
        ])
        .expect("cli should parse");
        match cli.command {
            Commands::Suppress(args) => assert_eq!(args.learn.as_deref(), Some("ajar")),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn output_format_rejects_invalid_value() {
        assert!(Cli::try_parse_from(["vgl", "--format", "xml", "groups"]).is_err());
    }

    #[test]
    fn project_flag_is_global() {
        let cli = Cli::try_parse_from(["vgl", "suppressions", "--project", "/tmp/demo"])
            .expect("cli should parse");
        assert_eq!(cli.project.as_deref(), Some(std::path::Path::new("/tmp/demo")));
    }
}
