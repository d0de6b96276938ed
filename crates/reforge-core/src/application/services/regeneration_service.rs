//! Regeneration Service - main application orchestrator.
//!
//! This service coordinates one batch end to end:
//! 1. Discover artifacts and apply the priority filter
//! 2. Plan: inspect (memoised by content hash) and categorize
//! 3. Filter by category and sort into processing order
//! 4. Regenerate on a bounded worker pool: extract → adapt → validate
//! 5. Commit results to the catalog and tally the summary
//!
//! Workers never write to the catalog. Every write happens here, in
//! processing order, after the worker for that artifact has finished.
//!
//! ```text
//!  discover ──► plan ──► sort ──► schedule ──► [worker pool] ──► commit
//!     │          │                   │          extract            │
//!  priority   inspect            deadline       adapt           put
//!   filter   categorize           check         validate     record_usage
//!                                                           append_record
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

use crate::{
    application::{
        ApplicationError,
        config::RegenerationConfig,
        ports::{ArtifactSource, ContentValidator, TemplateCatalog, TemplateRenderer},
        report::{BatchSummary, FailureEntry, FailureKind, ItemOutcome, ItemReport},
    },
    domain::{
        AnalysisResult, Artifact, Category, ContentHash, EnvironmentContext, GateVerdict,
        GenerationRecord, PatternCategorizer, RenderedContent, SourceInspector, Template,
        TemplateExtractor, TemplateId, ValidationOutcome,
    },
    error::{Context, ReforgeError, ReforgeResult},
};

/// Inspector output plus the extraction gate decision for one artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub analysis: AnalysisResult,
    pub verdict: GateVerdict,
}

/// An artifact after planning, in processing order.
struct Planned {
    artifact: Arc<Artifact>,
    category: Category,
    analysis: Result<Arc<AnalysisResult>, ReforgeError>,
}

/// Worker output, committed by the orchestrator.
struct Regenerated {
    template: Template,
    rendered: RenderedContent,
    outcome: ValidationOutcome,
}

enum Slot {
    Done(ItemReport, Option<FailureEntry>),
    Running(ItemReport, JoinHandle<ReforgeResult<Option<Regenerated>>>),
}

/// Main regeneration service.
pub struct RegenerationService {
    catalog: Arc<dyn TemplateCatalog>,
    source: Arc<dyn ArtifactSource>,
    renderer: Arc<dyn TemplateRenderer>,
    validator: Arc<dyn ContentValidator>,
    inspector: Arc<SourceInspector>,
    extractor: Arc<TemplateExtractor>,
    categorizer: PatternCategorizer,
    config: RegenerationConfig,
}

impl RegenerationService {
    /// Create a new regeneration service with the given adapters.
    ///
    /// Fails when the configuration is invalid (zero workers, weights not
    /// summing to 100, and so on).
    pub fn new(
        catalog: Arc<dyn TemplateCatalog>,
        source: Arc<dyn ArtifactSource>,
        renderer: Arc<dyn TemplateRenderer>,
        validator: Arc<dyn ContentValidator>,
        config: RegenerationConfig,
    ) -> ReforgeResult<Self> {
        config.validate()?;
        Ok(Self {
            inspector: Arc::new(SourceInspector::new(config.weights.clone())?),
            extractor: Arc::new(TemplateExtractor::new(config.extraction)?),
            categorizer: PatternCategorizer,
            catalog,
            source,
            renderer,
            validator,
            config,
        })
    }

    pub fn config(&self) -> &RegenerationConfig {
        &self.config
    }

    /// Inspect one artifact and report whether it would become a template.
    pub fn assess(&self, artifact: &Artifact) -> ReforgeResult<Assessment> {
        let mut analysis = self.inspector.analyze(artifact)?;
        analysis.category = self.categorizer.categorize(artifact, &analysis);
        let verdict = self.extractor.gate(&analysis, artifact);
        Ok(Assessment { analysis, verdict })
    }

    /// Run one batch on a fresh multi-threaded runtime.
    pub fn run_batch_blocking(
        &self,
        priority_filter: Option<u8>,
        category_filter: Option<Category>,
    ) -> ReforgeResult<BatchSummary> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(self.config.max_workers)
            .enable_all()
            .build()
            .context("failed to start async runtime")?;
        runtime.block_on(self.run_batch(priority_filter, category_filter))
    }

    /// Run one regeneration batch.
    ///
    /// Per-artifact failures are recorded in the summary. Only catalog
    /// failures (and discovery failures) abort the batch with `Err`.
    #[instrument(
        skip_all,
        fields(
            environment = %self.config.environment,
            priority = ?priority_filter,
            category = ?category_filter
        )
    )]
    pub async fn run_batch(
        &self,
        priority_filter: Option<u8>,
        category_filter: Option<Category>,
    ) -> ReforgeResult<BatchSummary> {
        let started = Instant::now();
        let deadline = started + self.config.batch_timeout;
        let semaphore = Arc::new(Semaphore::new(self.config.max_workers));
        info!(workers = self.config.max_workers, "Starting regeneration batch");

        // 1. Discover
        let source = Arc::clone(&self.source);
        let mut artifacts = tokio::task::spawn_blocking(move || source.discover())
            .await
            .map_err(join_error)??;
        let discovered = artifacts.len();
        if let Some(max) = priority_filter {
            artifacts.retain(|a| a.priority.value() <= max);
        }
        debug!(discovered, kept = artifacts.len(), "Discovery complete");

        // 2. Environment
        let context = Arc::new(
            self.catalog
                .get_context(&self.config.environment)?
                .unwrap_or_else(|| EnvironmentContext::identity(&self.config.environment)),
        );
        debug!(identity = context.is_identity(), "Environment context resolved");

        // 3. Plan
        let mut planned = self.plan(artifacts, &semaphore).await;
        if let Some(category) = category_filter {
            planned.retain(|p| p.category == category);
        }
        planned.sort_by(|a, b| {
            a.artifact
                .priority
                .cmp(&b.artifact.priority)
                .then_with(|| a.category.as_str().cmp(b.category.as_str()))
                .then_with(|| a.artifact.name().cmp(&b.artifact.name()))
                .then_with(|| a.artifact.source_path.cmp(&b.artifact.source_path))
        });
        debug!(planned = planned.len(), "Plan complete");

        // 4. Schedule
        let slots = self.schedule(planned, &context, &semaphore, deadline).await;

        // 5. Commit in processing order
        let mut items = Vec::with_capacity(slots.len());
        let mut failures = Vec::new();
        for slot in slots {
            let (item, failure) = match slot {
                Slot::Done(item, failure) => (item, failure),
                Slot::Running(item, handle) => {
                    let result = handle.await.unwrap_or_else(|e| Err(join_error(e)));
                    self.settle(item, result)?
                }
            };
            if let Some(failure) = failure {
                warn!(
                    artifact = %failure.artifact.display(),
                    kind = %failure.kind,
                    message = %failure.message,
                    "Artifact failed"
                );
                failures.push(failure);
            }
            items.push(item);
        }

        let summary = BatchSummary::tally(items, failures, started.elapsed());
        info!(
            total = summary.total,
            succeeded = summary.succeeded,
            failed = summary.failed,
            skipped = summary.skipped,
            validation_failed = summary.validation_failed,
            elapsed_ms = summary.duration.as_millis() as u64,
            "Batch complete"
        );
        Ok(summary)
    }

    // -------------------------------------------------------------------------
    // Stages
    // -------------------------------------------------------------------------

    /// Inspect every distinct content once, then categorize each artifact.
    async fn plan(&self, artifacts: Vec<Artifact>, semaphore: &Arc<Semaphore>) -> Vec<Planned> {
        let artifacts: Vec<_> = artifacts.into_iter().map(Arc::new).collect();
        let limit = self.config.artifact_timeout;

        let mut pending: HashMap<ContentHash, JoinHandle<ReforgeResult<AnalysisResult>>> =
            HashMap::new();
        for artifact in &artifacts {
            if pending.contains_key(&artifact.content_hash) {
                continue;
            }
            let semaphore = Arc::clone(semaphore);
            let inspector = Arc::clone(&self.inspector);
            let artifact = Arc::clone(artifact);
            let hash = artifact.content_hash.clone();
            let handle = tokio::spawn(async move {
                let _permit = acquire(semaphore).await?;
                run_bounded(limit, "analysis", move || {
                    inspector.analyze(&artifact).map_err(ReforgeError::from)
                })
                .await
            });
            pending.insert(hash, handle);
        }

        let mut analyses = HashMap::with_capacity(pending.len());
        for (hash, handle) in pending {
            let result = handle.await.unwrap_or_else(|e| Err(join_error(e)));
            analyses.insert(hash, result.map(Arc::new));
        }

        artifacts
            .into_iter()
            .map(|artifact| match analyses.get(&artifact.content_hash) {
                Some(Ok(shared)) => {
                    let mut analysis = shared.for_path(artifact.source_path.clone());
                    let category = self.categorizer.categorize(&artifact, &analysis);
                    analysis.category = category;
                    Planned {
                        category,
                        analysis: Ok(Arc::new(analysis)),
                        artifact,
                    }
                }
                Some(Err(e)) => Planned {
                    category: self.categorizer.categorize_by_name(&artifact),
                    analysis: Err(e.clone()),
                    artifact,
                },
                None => Planned {
                    category: self.categorizer.categorize_by_name(&artifact),
                    analysis: Err(ReforgeError::internal("analysis missing for planned artifact")),
                    artifact,
                },
            })
            .collect()
    }

    /// Hand planned artifacts to the worker pool until the batch deadline.
    async fn schedule(
        &self,
        planned: Vec<Planned>,
        context: &Arc<EnvironmentContext>,
        semaphore: &Arc<Semaphore>,
        deadline: Instant,
    ) -> Vec<Slot> {
        let limit = self.config.artifact_timeout;
        let mut slots = Vec::with_capacity(planned.len());

        for plan in planned {
            let mut item = ItemReport {
                source_path: plan.artifact.source_path.clone(),
                name: plan.artifact.name(),
                priority: plan.artifact.priority,
                category: plan.category,
                outcome: ItemOutcome::BelowGate,
                template_id: None,
                compliance_score: None,
            };

            let analysis = match plan.analysis {
                Ok(analysis) => analysis,
                Err(e) => {
                    slots.push(failed(item, e));
                    continue;
                }
            };
            item.compliance_score = Some(analysis.compliance_score);

            if Instant::now() >= deadline {
                slots.push(failed(item, ApplicationError::BatchTimeout.into()));
                continue;
            }
            let permit = match tokio::time::timeout_at(deadline, acquire(Arc::clone(semaphore))).await
            {
                Ok(Ok(permit)) => permit,
                Ok(Err(e)) => {
                    slots.push(failed(item, e));
                    continue;
                }
                Err(_) => {
                    slots.push(failed(item, ApplicationError::BatchTimeout.into()));
                    continue;
                }
            };

            let artifact = plan.artifact;
            let extractor = Arc::clone(&self.extractor);
            let renderer = Arc::clone(&self.renderer);
            let validator = Arc::clone(&self.validator);
            let context = Arc::clone(context);
            debug!(artifact = %artifact.display_path(), "Scheduled");
            let handle = tokio::spawn(async move {
                let _permit = permit;
                run_bounded(limit, "regeneration", move || {
                    let Some(template) = extractor.extract(&analysis, &artifact)? else {
                        return Ok(None);
                    };
                    let rendered = renderer.adapt(&template, &context)?;
                    let outcome = validator.validate(&rendered, template.kind);
                    Ok(Some(Regenerated {
                        template,
                        rendered,
                        outcome,
                    }))
                })
                .await
            });
            slots.push(Slot::Running(item, handle));
        }
        slots
    }

    /// Commit one finished worker result. Only errors fatal to the batch
    /// propagate; anything else becomes a failure entry for this artifact.
    fn settle(
        &self,
        mut item: ItemReport,
        result: ReforgeResult<Option<Regenerated>>,
    ) -> ReforgeResult<(ItemReport, Option<FailureEntry>)> {
        match result {
            Ok(None) => {
                debug!(artifact = %item.source_path.display(), "Below gate, skipped");
                item.outcome = ItemOutcome::BelowGate;
                Ok((item, None))
            }
            Ok(Some(regenerated)) => {
                let passed = regenerated.outcome.passed;
                let summary = regenerated.outcome.summary();
                let id = match self.commit(&item, regenerated) {
                    Ok(id) => id,
                    Err(e) if e.is_fatal_to_batch() => return Err(e),
                    Err(e) => {
                        let (item, failure) = fail(item, e);
                        return Ok((item, Some(failure)));
                    }
                };
                item.template_id = Some(id);
                if passed {
                    item.outcome = ItemOutcome::Validated;
                    Ok((item, None))
                } else {
                    item.outcome = ItemOutcome::ValidationFailed;
                    let failure = FailureEntry {
                        artifact: item.source_path.clone(),
                        kind: FailureKind::ValidationFailed,
                        message: summary,
                    };
                    Ok((item, Some(failure)))
                }
            }
            Err(e) if e.is_fatal_to_batch() => Err(e),
            Err(e) => {
                let (item, failure) = fail(item, e);
                Ok((item, Some(failure)))
            }
        }
    }

    fn commit(&self, item: &ItemReport, regenerated: Regenerated) -> ReforgeResult<TemplateId> {
        let Regenerated {
            template,
            rendered,
            outcome,
        } = regenerated;
        let observed = if outcome.passed { 100.0 } else { 0.0 };

        let id = self.catalog.put(template)?;
        self.catalog.record_usage(&id)?;

        let mut record = GenerationRecord::new(rendered, item.source_path.clone(), outcome);
        record.template_id = id;
        self.catalog.append_record(record)?;

        let stored = self.catalog.get(&id)?;
        let samples = stored.usage_count as f64;
        let blended = (stored.effectiveness_score * samples + observed) / (samples + 1.0);
        self.catalog.update_effectiveness(&id, blended)?;

        debug!(artifact = %item.source_path.display(), template = %id, "Committed");
        Ok(id)
    }
}

// -----------------------------------------------------------------------------
// Helpers
// -----------------------------------------------------------------------------

fn fail(mut item: ItemReport, error: ReforgeError) -> (ItemReport, FailureEntry) {
    let kind = FailureKind::of(&error);
    item.outcome = ItemOutcome::Failed(kind);
    let failure = FailureEntry {
        artifact: item.source_path.clone(),
        kind,
        message: error.to_string(),
    };
    (item, failure)
}

fn failed(item: ItemReport, error: ReforgeError) -> Slot {
    let (item, failure) = fail(item, error);
    Slot::Done(item, Some(failure))
}

async fn acquire(semaphore: Arc<Semaphore>) -> ReforgeResult<OwnedSemaphorePermit> {
    semaphore.acquire_owned().await.map_err(|e| {
        ApplicationError::Join {
            reason: e.to_string(),
        }
        .into()
    })
}

/// Run CPU-bound work on the blocking pool under a time limit.
async fn run_bounded<T, F>(limit: Duration, stage: &'static str, work: F) -> ReforgeResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> ReforgeResult<T> + Send + 'static,
{
    match tokio::time::timeout(limit, tokio::task::spawn_blocking(work)).await {
        Ok(Ok(result)) => result,
        Ok(Err(e)) => Err(join_error(e)),
        Err(_) => Err(ApplicationError::Timeout {
            stage,
            after: limit,
        }
        .into()),
    }
}

fn join_error(e: tokio::task::JoinError) -> ReforgeError {
    ApplicationError::Join {
        reason: e.to_string(),
    }
    .into()
}
