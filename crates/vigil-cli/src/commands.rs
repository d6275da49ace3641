//! Command handlers for the `vgl` binary.

use anyhow::Context;
use std::str::FromStr;

use vigil_config::VigilConfig;
use vigil_core::{IssueKey, IssueType};
use vigil_rules::parse_rules;
use vigil_store::{LearnedStates, SuppressionStore};
use vigil_validate::{BasicTemplateParser, EngineOptions, ValidationEngine};

use crate::cli::{CheckArgs, KeyArgs, OutputFormat, SuppressArgs};
use crate::output::{render_report, render_table};
use crate::world::World;

fn open_stores(config: &VigilConfig) -> anyhow::Result<(SuppressionStore, LearnedStates)> {
    let suppressions = SuppressionStore::open(&config.store.dir, &config.store.namespace)
        .context("failed to open the suppression store")?;
    let learned = LearnedStates::open(&config.store.dir, &config.store.namespace)
        .context("failed to open the learned-states store")?;
    Ok((suppressions, learned))
}

fn parse_key(text: &str) -> anyhow::Result<IssueKey> {
    IssueKey::from_str(text)
        .with_context(|| format!("invalid issue key '{text}' (expected issue_type:subject:rule_id:path)"))
}

/// Handle `vgl check`. Returns whether error-level issues survived.
pub fn check(args: &CheckArgs, format: OutputFormat, config: &VigilConfig) -> anyhow::Result<bool> {
    let world = World::load(&args.world)?;
    let text = std::fs::read_to_string(&args.rules)
        .with_context(|| format!("failed to read rule file '{}'", args.rules.display()))?;
    let rules = parse_rules(&text)
        .with_context(|| format!("invalid rule file '{}'", args.rules.display()))?;

    let (suppressions, learned) = open_stores(config)?;
    let options = EngineOptions {
        max_depth: config.validation.max_depth,
        history_days: config.validation.history_days,
        strict_templates: config.validation.strict_templates || args.strict_templates,
        extra_domains: config.validation.extra_domains.clone(),
    };
    let engine = ValidationEngine::new(
        &world.registry,
        &world.services,
        &BasicTemplateParser,
        &suppressions,
        &learned,
        options,
    )
    .with_history(&world.history);

    let report = engine.check(&rules)?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Table => println!("{}", render_report(&report)),
    }
    Ok(report.has_errors())
}

/// Handle `vgl suppress`.
pub fn suppress(args: &SuppressArgs, config: &VigilConfig) -> anyhow::Result<()> {
    let key = parse_key(&args.key)?;
    let (suppressions, learned) = open_stores(config)?;
    suppressions
        .suppress(key.clone(), args.learn.clone())
        .context("failed to persist the suppression")?;
    if let Some(value) = &args.learn {
        if let Err(error) = learned.learn(&key.subject, value) {
            let _ = suppressions.unsuppress(&key);
            return Err(error).context("failed to record the learned value");
        }
    }
    match &args.learn {
        Some(value) => println!("suppressed {key} (learned \"{value}\")"),
        None => println!("suppressed {key}"),
    }
    Ok(())
}

/// Handle `vgl unsuppress`.
pub fn unsuppress(args: &KeyArgs, config: &VigilConfig) -> anyhow::Result<()> {
    let key = parse_key(&args.key)?;
    let (suppressions, _) = open_stores(config)?;
    if suppressions
        .unsuppress(&key)
        .context("failed to persist the removal")?
    {
        println!("removed {key}");
    } else {
        println!("no suppression for {key}");
    }
    Ok(())
}

/// Handle `vgl suppressions`.
pub fn suppressions(format: OutputFormat, config: &VigilConfig) -> anyhow::Result<()> {
    let (suppressions, _) = open_stores(config)?;
    let listed = suppressions.list();
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&listed)?),
        OutputFormat::Table => {
            let rows: Vec<Vec<String>> = listed
                .iter()
                .map(|suppression| {
                    vec![
                        suppression.key.to_string(),
                        suppression
                            .learned_value
                            .clone()
                            .unwrap_or_else(|| "-".to_string()),
                        suppression.created_at.to_rfc3339(),
                    ]
                })
                .collect();
            println!("{}", render_table(&["key", "learned", "created"], &rows));
        }
    }
    Ok(())
}

/// Handle `vgl clear-suppressions`.
pub fn clear_suppressions(config: &VigilConfig) -> anyhow::Result<()> {
    let (suppressions, _) = open_stores(config)?;
    let removed = suppressions.clear().context("failed to clear the store")?;
    println!("removed {removed} suppression(s)");
    Ok(())
}

/// Handle `vgl groups`: print the issue taxonomy.
pub fn groups(format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            let entries: Vec<serde_json::Value> = IssueType::ALL
                .iter()
                .map(|issue_type| {
                    serde_json::json!({
                        "issue_type": issue_type.as_str(),
                        "group": issue_type.group().as_str(),
                        "default_severity": issue_type.default_severity().as_str(),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
        OutputFormat::Table => {
            let rows: Vec<Vec<String>> = IssueType::ALL
                .iter()
                .map(|issue_type| {
                    vec![
                        issue_type.to_string(),
                        issue_type.group().to_string(),
                        issue_type.default_severity().to_string(),
                    ]
                })
                .collect();
            println!(
                "{}",
                render_table(&["issue_type", "group", "default_severity"], &rows)
            );
        }
    }
    Ok(())
}
