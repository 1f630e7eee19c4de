//! Update orchestrator for coordinating the entire update workflow
//!
//! This module provides:
//! - Workflow coordination: discover → extract → resolve → judge → write
//! - Concurrent lookups per file, bounded globally and per host
//! - Dry-run mode support
//! - Error handling with partial continuation

use crate::config::RunConfig;
use crate::domain::{
    Declaration, DeclarationKind, FileUpdateResult, SkipReason, UpdateResult, UpdateSummary,
};
use crate::error::{RegistryError, ResolveError};
use crate::manifest::{extract_declarations, read_manifest, ManifestWriter, WriteResult};
use crate::progress::Progress;
use crate::registry::{BackendSet, HttpClient};
use crate::update::{resolve_latest, UpdateJudge, VersionCandidate};
use futures::future::join_all;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Global and per-host lookup limits
pub struct HostLimiter {
    global: Arc<Semaphore>,
    per_host: Mutex<HashMap<String, Arc<Semaphore>>>,
    per_host_limit: usize,
}

impl HostLimiter {
    /// Create a limiter allowing `global` lookups overall and `per_host` against any one host
    pub fn new(global: usize, per_host: usize) -> Self {
        Self {
            global: Arc::new(Semaphore::new(global)),
            per_host: Mutex::new(HashMap::new()),
            per_host_limit: per_host,
        }
    }

    fn host_semaphore(&self, host: &str) -> Arc<Semaphore> {
        let mut hosts = self.per_host.lock().unwrap_or_else(|e| e.into_inner());
        Arc::clone(
            hosts
                .entry(host.to_string())
                .or_insert_with(|| Arc::new(Semaphore::new(self.per_host_limit))),
        )
    }

    /// Wait for a host permit, then a global permit
    ///
    /// Returns `None` only if the semaphores were closed.
    pub async fn acquire(&self, host: &str) -> Option<(OwnedSemaphorePermit, OwnedSemaphorePermit)> {
        let host_permit = self.host_semaphore(host).acquire_owned().await.ok()?;
        let global_permit = Arc::clone(&self.global).acquire_owned().await.ok()?;
        Some((host_permit, global_permit))
    }
}

/// Orchestrator for coordinating the update workflow
pub struct Orchestrator {
    /// Settings for this run
    config: RunConfig,
    /// Version backends
    backends: BackendSet,
    /// Update decisions
    judge: UpdateJudge,
    /// Concurrency limits for lookups
    limiter: HostLimiter,
}

/// Result of running the orchestrator
pub struct OrchestratorResult {
    /// Update summary with all results
    pub summary: UpdateSummary,
    /// Write results for each file with updates
    pub write_results: Vec<WriteResult>,
    /// Errors encountered during processing
    pub errors: Vec<OrchestratorError>,
}

impl OrchestratorResult {
    /// Returns true if any file or declaration failed
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Returns true if the run could not start at all
    pub fn has_fatal_error(&self) -> bool {
        self.errors
            .iter()
            .any(|e| matches!(e, OrchestratorError::DiscoveryError(_)))
    }
}

/// Errors that can occur during orchestration
#[derive(Debug)]
pub enum OrchestratorError {
    /// Failed to create HTTP client
    HttpClientError(String),
    /// Failed to find Terraform files
    DiscoveryError(String),
    /// Failed to read or parse a file
    FileError { path: String, message: String },
    /// Failed to fetch versions for a declaration
    LookupError {
        path: String,
        declaration: String,
        message: String,
    },
    /// Failed to rewrite or write a file
    WriteError { path: String, message: String },
}

impl std::fmt::Display for OrchestratorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrchestratorError::HttpClientError(msg) => write!(f, "HTTP client error: {}", msg),
            OrchestratorError::DiscoveryError(msg) => write!(f, "File discovery error: {}", msg),
            OrchestratorError::FileError { path, message } => {
                write!(f, "Skipping {}: {}", path, message)
            }
            OrchestratorError::LookupError {
                path,
                declaration,
                message,
            } => write!(f, "Failed to check {} in {}: {}", declaration, path, message),
            OrchestratorError::WriteError { path, message } => {
                write!(f, "Failed to update {}: {}", path, message)
            }
        }
    }
}

impl std::error::Error for OrchestratorError {}

impl Orchestrator {
    /// Create a new orchestrator, building the HTTP client and backends from `config`
    pub fn new(config: RunConfig) -> Result<Self, OrchestratorError> {
        let client = HttpClient::with_timeout(config.timeout)
            .map_err(|e| OrchestratorError::HttpClientError(e.to_string()))?;
        let backends = BackendSet::new(
            client,
            &config.urls,
            config.github_releases,
            config.timeout,
        );
        Ok(Self::with_backends(config, backends))
    }

    /// Create an orchestrator with prebuilt backends (for testing)
    pub fn with_backends(config: RunConfig, backends: BackendSet) -> Self {
        let judge = UpdateJudge::new(config.filter()).with_precision(config.precision);
        let limiter = HostLimiter::new(config.concurrency, config.per_host_concurrency);
        Self {
            config,
            backends,
            judge,
            limiter,
        }
    }

    /// Run the update workflow
    pub async fn run(&self) -> OrchestratorResult {
        self.run_with_progress(false).await
    }

    /// Run the update workflow with optional progress display
    pub async fn run_with_progress(&self, show_progress: bool) -> OrchestratorResult {
        let mut progress = Progress::new(show_progress);
        let mut summary = UpdateSummary::new(self.config.dry_run);
        let mut write_results = Vec::new();
        let mut errors = Vec::new();

        // Step 1: Find files
        progress.discovering();
        let files = match self.config.target_files() {
            Ok(files) => files,
            Err(e) => {
                progress.finish_and_clear();
                errors.push(OrchestratorError::DiscoveryError(e.to_string()));
                return OrchestratorResult {
                    summary,
                    write_results,
                    errors,
                };
            }
        };
        progress.finish_and_clear();

        if files.is_empty() {
            tracing::warn!(root = %self.config.root.display(), "no Terraform files found");
        }

        // Step 2: Process files one at a time
        let writer = ManifestWriter::new(self.config.dry_run);
        progress.start_files(files.len() as u64);

        for path in &files {
            progress.checking(path);
            tracing::info!(path = %path.display(), "processing file");

            if let Some(mut file_result) = self.check_file(path, &mut errors).await {
                if file_result.has_updates() {
                    match writer.apply_updates(&file_result) {
                        Ok(result) => {
                            file_result.modified = result.content_changed;
                            write_results.push(result);
                        }
                        Err(e) => errors.push(OrchestratorError::WriteError {
                            path: path.display().to_string(),
                            message: e.to_string(),
                        }),
                    }
                }
                summary.add_file(file_result);
            }
            progress.file_done();
        }
        progress.finish_and_clear();

        OrchestratorResult {
            summary,
            write_results,
            errors,
        }
    }

    /// Extract and judge every declaration of one file
    ///
    /// Returns `None` if the file could not be read or parsed.
    async fn check_file(
        &self,
        path: &Path,
        errors: &mut Vec<OrchestratorError>,
    ) -> Option<FileUpdateResult> {
        let declarations = match read_manifest(path)
            .and_then(|content| extract_declarations(&content).map_err(|e| e.with_path(path)))
        {
            Ok(declarations) => declarations,
            Err(e) => {
                tracing::warn!(error = %e, "skipping file");
                errors.push(OrchestratorError::FileError {
                    path: path.display().to_string(),
                    message: e.to_string(),
                });
                return None;
            }
        };

        let results = join_all(declarations.iter().map(|d| self.evaluate(d))).await;

        let mut file_result = FileUpdateResult::new(path);
        for result in results {
            if let UpdateResult::Skip {
                declaration,
                reason: SkipReason::FetchFailed(message),
            } = &result
            {
                errors.push(OrchestratorError::LookupError {
                    path: path.display().to_string(),
                    declaration: declaration.key().to_string(),
                    message: message.clone(),
                });
            }
            file_result.add_result(result);
        }
        Some(file_result)
    }

    /// Decide the outcome for a single declaration
    async fn evaluate(&self, declaration: &Declaration) -> UpdateResult {
        if let Some(reason) = self.judge.should_skip(declaration) {
            return UpdateResult::skip(declaration.clone(), reason);
        }

        if declaration.kind == DeclarationKind::Terraform {
            if let Some(fixed) = &self.config.terraform_version {
                return self.judge.judge_fixed(declaration, fixed);
            }
        }

        match self.resolve(declaration).await {
            Ok(latest) => self.judge.judge(declaration, &latest),
            Err(ResolveError::UnsupportedSource { reason, .. }) => {
                UpdateResult::skip(declaration.clone(), SkipReason::UnsupportedSource(reason))
            }
            Err(ResolveError::NoVersionsFound { .. }) => {
                tracing::warn!(declaration = %declaration.key(), "no usable versions found");
                UpdateResult::skip(declaration.clone(), SkipReason::NoVersionsFound)
            }
            Err(ResolveError::Backend(e)) => {
                tracing::warn!(declaration = %declaration.key(), error = %e, "lookup failed");
                UpdateResult::skip(declaration.clone(), SkipReason::FetchFailed(e.to_string()))
            }
        }
    }

    /// Query the declaration's backend and pick the newest version
    async fn resolve(&self, declaration: &Declaration) -> Result<VersionCandidate, ResolveError> {
        let route = self.backends.route(declaration)?;
        let host = route.host();

        let Some(permits) = self.limiter.acquire(&host).await else {
            return Err(RegistryError::network_error(
                &route.target,
                route.backend.backend_name(),
                "lookup cancelled",
            )
            .into());
        };
        tracing::debug!(
            target_name = %route.target,
            backend = route.backend.backend_name(),
            %host,
            "fetching versions"
        );
        let candidates = route.backend.fetch_versions(&route.target).await?;
        drop(permits);

        resolve_latest(&route.target, candidates, self.config.resolve_options())
    }
}
