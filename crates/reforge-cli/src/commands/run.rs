//! Implementation of the `reforge run` command.
//!
//! Responsibility: merge flags into the loaded configuration, wire the
//! production adapters into a [`RegenerationService`], run one batch and
//! render the [`BatchSummary`].

use std::sync::Arc;

use tracing::{info, instrument};

use reforge_adapters::{EnvironmentAdapter, FilesystemSource, SyntaxValidator};
use reforge_core::application::{
    BatchSummary, CatalogService, ItemOutcome, RegenerationService,
};

use crate::{
    cli::RunArgs,
    commands::open_catalog,
    config::AppConfig,
    error::{CliError, CliResult},
    output::OutputManager,
};

/// Execute the `reforge run` command.
///
/// 1. Apply flag overrides to the configuration
/// 2. Open the catalog and load configured environment contexts
/// 3. Run the batch on a blocking runtime
/// 4. Print the summary; exit 5 when anything failed
#[instrument(skip_all, fields(priority = ?args.priority, category = ?args.category))]
pub fn execute(args: RunArgs, mut config: AppConfig, output: OutputManager) -> CliResult<()> {
    if let Some(environment) = &args.environment {
        config.regeneration.environment.clone_from(environment);
    }
    if let Some(workers) = args.workers {
        config.regeneration.max_workers = usize::from(workers);
    }
    let root = args.root.clone().unwrap_or(config.discovery.root.clone());
    if !root.is_dir() {
        return Err(CliError::FileNotFound { path: root });
    }

    let catalog = open_catalog(&config.catalog)?;
    CatalogService::new(Arc::clone(&catalog)).load_contexts(config.environments.clone())?;

    let source = FilesystemSource::with_rules(&root, config.discovery.rules.clone());
    let service = RegenerationService::new(
        catalog,
        Arc::new(source),
        Arc::new(EnvironmentAdapter),
        Arc::new(SyntaxValidator),
        config.regeneration.clone(),
    )?;

    info!(
        root = %root.display(),
        environment = %config.regeneration.environment,
        "Regeneration requested"
    );

    let spinner = output.spinner(&format!(
        "Regenerating {} for '{}'",
        root.display(),
        config.regeneration.environment
    ));
    let result = service.run_batch_blocking(args.priority, args.category);
    if let Some(bar) = spinner {
        bar.finish_and_clear();
    }
    let summary = result?;

    if output.is_json() {
        output.json(&summary)?;
    } else {
        render(&summary, args.details, &output)?;
    }

    if summary.is_clean() {
        Ok(())
    } else {
        Err(CliError::BatchFailures {
            failed: summary.failed + summary.validation_failed,
            total: summary.total,
        })
    }
}

fn render(summary: &BatchSummary, details: bool, output: &OutputManager) -> CliResult<()> {
    output.header("Regeneration summary")?;
    output.print(&format!(
        "  total {}  succeeded {}  failed {}  skipped {}  ({:.2}s)",
        summary.total,
        summary.succeeded,
        summary.failed,
        summary.skipped,
        summary.duration.as_secs_f64()
    ))?;
    output.print(&format!(
        "  validated {}  validation failed {}",
        summary.validated, summary.validation_failed
    ))?;

    if !summary.by_category.is_empty() {
        output.print("")?;
        output.print("By category:")?;
        for (category, count) in &summary.by_category {
            output.print(&format!("  {category:<24} {count}"))?;
        }
    }

    if details && !summary.items.is_empty() {
        output.print("")?;
        output.print("Artifacts:")?;
        for item in &summary.items {
            output.print(&format!(
                "  [{}] {:<40} {:<22} {}",
                item.priority,
                item.source_path.display(),
                item.category,
                describe(item.outcome)
            ))?;
        }
    }

    if !summary.failures.is_empty() {
        output.print("")?;
        output.warning("Failures:")?;
        for failure in &summary.failures {
            output.print(&format!(
                "  {} {}: {}",
                failure.kind,
                failure.artifact.display(),
                failure.message
            ))?;
        }
    }

    if summary.is_clean() {
        output.success(&format!("{} templates regenerated", summary.validated))?;
    }
    Ok(())
}

fn describe(outcome: ItemOutcome) -> String {
    match outcome {
        ItemOutcome::Validated => "validated".into(),
        ItemOutcome::ValidationFailed => "validation failed".into(),
        ItemOutcome::BelowGate => "below gate".into(),
        ItemOutcome::Failed(kind) => format!("failed ({kind})"),
    }
}
