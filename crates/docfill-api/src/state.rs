//! Application state wiring the engine to concrete adapters.
//!
//! The orchestrator is generic over its stores and generators; this module
//! pins the template store and generators to the infra implementations and
//! leaves the artifact store open (SQLite or in-memory).

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use tracing::warn;

use docfill_core::generation::{DeterministicRewriter, GenerativeAssembler, HybridOrchestrator};
use docfill_core::llm::BoxLlmProvider;
use docfill_core::mapping::FieldMapper;
use docfill_core::repository::ArtifactStore;
use docfill_infra::config::load_config;
use docfill_infra::filesystem::{LocalTemplateStore, resolve_data_dir};
use docfill_infra::llm::{create_provider, resolve_api_key};
use docfill_infra::sqlite::{DatabasePool, SqliteArtifactStore, database_url};
use docfill_types::config::DocfillConfig;

pub type Orchestrator<S> =
    HybridOrchestrator<LocalTemplateStore, S, GenerativeAssembler, DeterministicRewriter>;

pub struct AppState {
    pub data_dir: PathBuf,
    pub config: DocfillConfig,
}

impl AppState {
    /// Resolve the data directory and load `config.toml` from it.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();
        tokio::fs::create_dir_all(&data_dir)
            .await
            .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;

        let config = load_config(&data_dir).await;
        Ok(Self { data_dir, config })
    }

    /// Open the SQLite artifact store at `{data_dir}/docfill.db`.
    pub async fn artifact_store(&self) -> anyhow::Result<SqliteArtifactStore> {
        let pool = DatabasePool::new(&database_url(&self.data_dir))
            .await
            .context("failed to open artifact database")?;
        Ok(SqliteArtifactStore::new(pool))
    }

    /// Build the configured provider.
    ///
    /// `Ok(None)` when no `[provider]` section is configured.
    pub fn provider(&self) -> anyhow::Result<Option<BoxLlmProvider>> {
        let Some(config) = &self.config.provider else {
            return Ok(None);
        };
        let api_key = resolve_api_key(config).with_context(|| {
            format!("{} is not set for provider {}", config.api_key_env(), config.provider_type)
        })?;
        let provider = create_provider(config, Some(&api_key))?;
        Ok(Some(provider))
    }

    /// The AI generator, or `None` for deterministic-only runs.
    ///
    /// A misconfigured provider is logged and skipped rather than failing
    /// the batch.
    pub fn primary(&self) -> Option<GenerativeAssembler> {
        let provider = match self.provider() {
            Ok(provider) => provider?,
            Err(e) => {
                warn!(error = %e, "language provider unavailable, using deterministic rewrite only");
                return None;
            }
        };
        let model = self
            .config
            .provider
            .as_ref()
            .map(|p| p.model.clone())
            .unwrap_or_default();
        Some(GenerativeAssembler::new(
            Arc::new(provider),
            model,
            &self.config.generation,
            self.config.mapping.sentinel(),
        ))
    }

    pub fn orchestrator<S: ArtifactStore + 'static>(
        &self,
        templates: LocalTemplateStore,
        artifacts: S,
        deterministic_only: bool,
    ) -> Orchestrator<S> {
        let primary = if deterministic_only || self.config.generation.force_deterministic {
            None
        } else {
            self.primary()
        };
        HybridOrchestrator::new(
            templates,
            artifacts,
            FieldMapper::from_config(&self.config.mapping),
            primary,
            DeterministicRewriter::from_config(&self.config.mapping),
            &self.config.generation,
        )
    }
}
