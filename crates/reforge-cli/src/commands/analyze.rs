//! `reforge analyze`: inspect one file and show the extraction verdict.
//!
//! Nothing is written: the service runs against a throwaway in-memory
//! catalog and an empty source.

use std::{fs, path::Path, sync::Arc};

use tracing::instrument;

use reforge_adapters::{EnvironmentAdapter, InMemoryCatalog, MemorySource, SyntaxValidator};
use reforge_core::{
    application::{Assessment, RegenerationService},
    domain::Artifact,
};

use crate::{
    cli::AnalyzeArgs,
    config::AppConfig,
    error::{CliError, CliResult, IntoCli},
    output::OutputManager,
};

#[instrument(skip_all, fields(file = %args.file.display()))]
pub fn execute(args: AnalyzeArgs, config: AppConfig, output: OutputManager) -> CliResult<()> {
    let artifact = load(&args.file)?;
    let service = RegenerationService::new(
        Arc::new(InMemoryCatalog::new()),
        Arc::new(MemorySource::new(Vec::new())),
        Arc::new(EnvironmentAdapter),
        Arc::new(SyntaxValidator),
        config.regeneration,
    )?;
    let assessment = service.assess(&artifact)?;

    if output.is_json() {
        output.json(&assessment)?;
    } else {
        render(&assessment, &output)?;
    }
    Ok(())
}

fn load(path: &Path) -> CliResult<Artifact> {
    if !path.is_file() {
        return Err(CliError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let content =
        fs::read_to_string(path).with_cli_context(|| format!("reading {}", path.display()))?;
    Artifact::from_path(path, content).map_err(|e| CliError::Core(e.into()))
}

fn render(assessment: &Assessment, output: &OutputManager) -> CliResult<()> {
    let analysis = &assessment.analysis;
    let verdict = &assessment.verdict;

    output.header(&analysis.source_path.display().to_string())?;
    output.print(&format!("  kind        {}", analysis.kind))?;
    output.print(&format!("  category    {}", analysis.category))?;
    output.print(&format!(
        "  compliance  {:.1} (threshold {:.1})",
        analysis.compliance_score, verdict.threshold
    ))?;
    output.print(&format!("  complexity  {:.1}", analysis.complexity_score))?;

    if !analysis.pattern_tags.is_empty() {
        output.print(&format!("  tags        {}", analysis.pattern_tags.join(", ")))?;
    }
    if !analysis.dependencies.is_empty() {
        output.print(&format!("  imports     {}", analysis.dependencies.join(", ")))?;
    }
    if !analysis.functions.is_empty() {
        output.print(&format!("  functions   {}", analysis.functions.join(", ")))?;
    }

    let missing: Vec<_> = analysis
        .compliance
        .missing()
        .map(|signal| signal.as_str())
        .collect();
    if !missing.is_empty() {
        output.print(&format!("  missing     {}", missing.join(", ")))?;
    }

    output.print("")?;
    output.print(&format!(
        "Structural checks ({} of {} required):",
        verdict.passed_checks(),
        verdict.min_structural_checks
    ))?;
    for (check, passed) in &verdict.checks {
        let mark = if *passed { "\u{2713}" } else { "\u{2717}" };
        output.print(&format!("  {mark} {check}"))?;
    }

    output.print("")?;
    if verdict.accepted {
        output.success("Would be extracted as a template")?;
    } else {
        output.info("Below the extraction gate; would be skipped")?;
    }
    Ok(())
}
