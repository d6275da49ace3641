use std::process::ExitCode;

use clap::Parser;

mod cli;
mod commands;
mod output;
mod world;

use vigil_config::VigilConfig;

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(error) => {
            eprintln!("vgl error: {error:#}");
            ExitCode::from(2)
        }
    }
}

fn run() -> anyhow::Result<ExitCode> {
    let cli = cli::Cli::parse();
    init_tracing(cli.quiet, cli.verbose)?;

    let mut config = VigilConfig::load_with_dotenv()?;
    if let Some(project) = &cli.project {
        anyhow::ensure!(
            project.is_dir(),
            "invalid --project '{}': directory does not exist",
            project.display()
        );
        if config.store.dir.is_relative() {
            config.store.dir = project.join(&config.store.dir);
        }
    }

    match &cli.command {
        cli::Commands::Check(args) => {
            let failed = commands::check(args, cli.format, &config)?;
            // Surviving error-level issues fail the run; exit 2 is reserved
            // for operational failures.
            Ok(if failed { ExitCode::from(1) } else { ExitCode::SUCCESS })
        }
        cli::Commands::Suppress(args) => {
            commands::suppress(args, &config)?;
            Ok(ExitCode::SUCCESS)
        }
        cli::Commands::Unsuppress(args) => {
            commands::unsuppress(args, &config)?;
            Ok(ExitCode::SUCCESS)
        }
        cli::Commands::Suppressions => {
            commands::suppressions(cli.format, &config)?;
            Ok(ExitCode::SUCCESS)
        }
        cli::Commands::ClearSuppressions => {
            commands::clear_suppressions(&config)?;
            Ok(ExitCode::SUCCESS)
        }
        cli::Commands::Groups => {
            commands::groups(cli.format)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn init_tracing(quiet: bool, verbose: bool) -> anyhow::Result<()> {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };

    let filter = tracing_subscriber::EnvFilter::try_from_env("VIGIL_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}
