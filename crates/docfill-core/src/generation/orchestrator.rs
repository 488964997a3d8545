//! Hybrid generation orchestrator.
//!
//! `HybridOrchestrator` drives one generation request: for every requested
//! template it reads the body, maps fields, tries the primary (AI) strategy,
//! falls back to the deterministic strategy on any primary failure, and
//! stores the result. Templates run as independent tasks bounded by a
//! semaphore; one template's failure never affects another's.
//!
//! # Per-template flow
//!
//! 1. Read the body (`TemplateUnavailable` / `EmptyTemplate` on failure).
//! 2. Extract placeholders and resolve them against the answers.
//! 3. Primary strategy, unless forced deterministic or none configured.
//! 4. Deterministic strategy when step 3 was skipped or failed.
//! 5. `put_artifact` keyed by (template, request).

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use docfill_types::answer::AnswerSet;
use docfill_types::artifact::{ArtifactId, ArtifactMetadata, ArtifactStatus, GenerationMethod};
use docfill_types::config::GenerationConfig;
use docfill_types::error::{GenerationError, RepositoryError};
use docfill_types::generation::{
    BatchReport, GenerationOptions, GenerationState, OutcomeStatus, TemplateOutcome,
};
use docfill_types::mapping::MappingSummary;
use docfill_types::template::{IntakeId, RequestId, TemplateId};

use super::generator::{GenerationInput, Generator};
use crate::mapping::FieldMapper;
use crate::repository::{AnswerStore, ArtifactStore, TemplateStore};
use crate::template::extractor::parse_template;

/// Sequences a primary and a fallback [`Generator`] across a batch of templates.
///
/// `P` is the primary strategy (normally the generative assembler) and is
/// optional; `F` is the fallback (normally the deterministic rewriter).
/// Cloning is cheap: all state sits behind one `Arc`.
pub struct HybridOrchestrator<T, S, P, F> {
    inner: Arc<Inner<T, S, P, F>>,
}

struct Inner<T, S, P, F> {
    templates: T,
    artifacts: S,
    mapper: FieldMapper,
    primary: Option<P>,
    fallback: F,
    max_concurrency: usize,
    force_deterministic: bool,
}

impl<T, S, P, F> Clone for HybridOrchestrator<T, S, P, F> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// The states one template has passed through.
struct StateTrail {
    states: Vec<GenerationState>,
}

impl StateTrail {
    fn new() -> Self {
        Self {
            states: vec![GenerationState::Pending],
        }
    }

    fn current(&self) -> GenerationState {
        self.states
            .last()
            .copied()
            .unwrap_or(GenerationState::Pending)
    }

    fn advance(&mut self, next: GenerationState) {
        debug_assert!(
            self.current().can_transition_to(next),
            "illegal transition {} -> {}",
            self.current(),
            next
        );
        self.states.push(next);
    }

    fn into_states(self) -> Vec<GenerationState> {
        self.states
    }
}

impl<T, S, P, F> HybridOrchestrator<T, S, P, F>
where
    T: TemplateStore + 'static,
    S: ArtifactStore + 'static,
    P: Generator + 'static,
    F: Generator + 'static,
{
    pub fn new(
        templates: T,
        artifacts: S,
        mapper: FieldMapper,
        primary: Option<P>,
        fallback: F,
        config: &GenerationConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                templates,
                artifacts,
                mapper,
                primary,
                fallback,
                max_concurrency: config.max_concurrency.max(1),
                force_deterministic: config.force_deterministic,
            }),
        }
    }

    pub fn has_primary(&self) -> bool {
        self.inner.primary.is_some()
    }

    pub fn artifacts(&self) -> &S {
        &self.inner.artifacts
    }

    /// Generate one artifact per template.
    ///
    /// The report lists every distinct requested template exactly once, in
    /// request order, with an explicit status. A partial batch is not an
    /// error at this level; the caller decides what it means.
    pub async fn generate_documents(
        &self,
        template_ids: &[TemplateId],
        answers: AnswerSet,
        options: GenerationOptions,
    ) -> BatchReport {
        self.generate_documents_with_cancel(template_ids, answers, options, CancellationToken::new())
            .await
    }

    /// Like [`generate_documents`](Self::generate_documents), but stops
    /// scheduling new templates once `cancel` fires.
    ///
    /// Templates already running finish and record their artifact.
    /// Templates never started are reported as errors.
    #[tracing::instrument(
        skip_all,
        fields(request_id = tracing::field::Empty, templates = template_ids.len())
    )]
    pub async fn generate_documents_with_cancel(
        &self,
        template_ids: &[TemplateId],
        answers: AnswerSet,
        options: GenerationOptions,
        cancel: CancellationToken,
    ) -> BatchReport {
        let request_id = options.request_id.unwrap_or_default();
        tracing::Span::current().record("request_id", tracing::field::display(request_id));

        let force_deterministic = options.force_deterministic || self.inner.force_deterministic;
        let answers = Arc::new(answers);

        let mut seen = HashSet::new();
        let unique: Vec<TemplateId> = template_ids
            .iter()
            .filter(|id| seen.insert(*id))
            .cloned()
            .collect();
        if unique.len() < template_ids.len() {
            debug!(
                requested = template_ids.len(),
                distinct = unique.len(),
                "duplicate template ids collapsed"
            );
        }

        info!(
            templates = unique.len(),
            force_deterministic,
            max_concurrency = self.inner.max_concurrency,
            "generation request started"
        );

        let semaphore = Arc::new(Semaphore::new(self.inner.max_concurrency));
        let mut join_set: JoinSet<TemplateOutcome> = JoinSet::new();
        let mut results: HashMap<TemplateId, TemplateOutcome> = HashMap::new();

        for template_id in &unique {
            let permit = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                permit = Arc::clone(&semaphore).acquire_owned() => permit.ok(),
            };
            let Some(permit) = permit else {
                warn!(template_id = %template_id, "cancelled before start");
                results.insert(
                    template_id.clone(),
                    failed_outcome(template_id, &GenerationError::Cancelled),
                );
                continue;
            };

            let inner = Arc::clone(&self.inner);
            let template_id = template_id.clone();
            let answers = Arc::clone(&answers);
            join_set.spawn(async move {
                let _permit = permit;
                inner
                    .process(template_id, request_id, answers, force_deterministic)
                    .await
            });
        }

        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok(outcome) => {
                    results.insert(outcome.template_id.clone(), outcome);
                }
                Err(join_error) => {
                    error!(error = %join_error, "generation task failed");
                }
            }
        }

        let outcomes: Vec<TemplateOutcome> = unique
            .iter()
            .map(|id| {
                results.remove(id).unwrap_or_else(|| {
                    failed_outcome(id, &GenerationError::TaskFailed("task panicked".to_string()))
                })
            })
            .collect();

        let report = BatchReport {
            request_id,
            outcomes,
        };
        info!(
            succeeded = report.outcomes.len() - report.failed_count(),
            failed = report.failed_count(),
            "generation request finished"
        );
        report
    }

    /// Load an intake's answers, then generate.
    pub async fn generate_for_intake<A: AnswerStore>(
        &self,
        answer_store: &A,
        intake: &IntakeId,
        template_ids: &[TemplateId],
        options: GenerationOptions,
    ) -> Result<BatchReport, RepositoryError> {
        let answers = answer_store.get_answers(intake).await?;
        debug!(intake = %intake, answers = answers.len(), "loaded intake answers");
        Ok(self.generate_documents(template_ids, answers, options).await)
    }
}

impl<T, S, P, F> Inner<T, S, P, F>
where
    T: TemplateStore,
    S: ArtifactStore,
    P: Generator,
    F: Generator,
{
    #[tracing::instrument(
        skip_all,
        fields(template_id = %template_id, request_id = %request_id)
    )]
    async fn process(
        &self,
        template_id: TemplateId,
        request_id: RequestId,
        answers: Arc<AnswerSet>,
        force_deterministic: bool,
    ) -> TemplateOutcome {
        let mut trail = StateTrail::new();

        let body = match self.templates.get_template_body(&template_id).await {
            Ok(body) => body,
            Err(e) => {
                let err = GenerationError::TemplateUnavailable(e.to_string());
                error!(error = %err, "template read failed");
                trail.advance(GenerationState::Error);
                return outcome_error(template_id, None, None, &err, trail);
            }
        };
        if body.trim().is_empty() {
            let err = GenerationError::EmptyTemplate;
            error!(error = %err, "template has no content");
            let artifact_id = self
                .store_error_artifact(&template_id, &request_id, None, MappingSummary::default(), &err)
                .await;
            trail.advance(GenerationState::Error);
            return outcome_error(template_id, artifact_id, None, &err, trail);
        }

        let template = parse_template(&body);
        let mappings = self.mapper.resolve(&template.placeholders, &answers);
        let summary = MappingSummary::from_mappings(&mappings);
        debug!(
            placeholders = summary.total,
            resolved = summary.resolved,
            unresolved = summary.unresolved,
            "fields mapped"
        );

        let input = GenerationInput {
            template_id: template_id.clone(),
            template,
            mappings,
            answers,
        };

        let mut produced: Option<(String, GenerationMethod)> = None;
        let mut ai_failure: Option<String> = None;

        match (&self.primary, force_deterministic) {
            (Some(primary), false) => {
                trail.advance(GenerationState::AiAttempted);
                match primary.generate(&input).await {
                    Ok(filled) => {
                        trail.advance(GenerationState::AiSucceeded);
                        produced = Some((filled, primary.method()));
                    }
                    Err(e) => {
                        warn!(error = %e, "primary generation failed, falling back");
                        trail.advance(GenerationState::AiFailed);
                        ai_failure = Some(e.to_string());
                    }
                }
            }
            (Some(_), true) => debug!("deterministic generation forced"),
            (None, _) => {}
        }

        let (filled, method) = match produced {
            Some(done) => done,
            None => {
                trail.advance(GenerationState::DeterministicUsed);
                match self.fallback.generate(&input).await {
                    Ok(filled) => (filled, self.fallback.method()),
                    Err(e) => {
                        let err = GenerationError::Deterministic(e);
                        error!(error = %err, "deterministic generation failed");
                        let artifact_id = self
                            .store_error_artifact(
                                &template_id,
                                &request_id,
                                Some(self.fallback.method()),
                                summary,
                                &err,
                            )
                            .await;
                        trail.advance(GenerationState::Error);
                        return outcome_error(
                            template_id,
                            artifact_id,
                            Some(self.fallback.method()),
                            &err,
                            trail,
                        );
                    }
                }
            }
        };

        let metadata = ArtifactMetadata {
            status: ArtifactStatus::Generated,
            method: Some(method),
            mapping: summary,
            ai_failure,
            error: None,
            generated_at: Utc::now(),
        };

        match self
            .artifacts
            .put_artifact(&template_id, &request_id, &filled, &metadata)
            .await
        {
            Ok(artifact_id) => {
                trail.advance(GenerationState::Done);
                info!(artifact_id = %artifact_id, method = %method, "artifact stored");
                TemplateOutcome {
                    template_id,
                    status: OutcomeStatus::Done,
                    artifact_id: Some(artifact_id),
                    method: Some(method),
                    error: None,
                    states: trail.into_states(),
                }
            }
            Err(e) => {
                let err = GenerationError::ArtifactStore(e.to_string());
                error!(error = %err, "artifact store write failed");
                trail.advance(GenerationState::Error);
                outcome_error(template_id, None, Some(method), &err, trail)
            }
        }
    }

    /// Record a terminal error as an artifact. A store failure here is only
    /// logged; the outcome already carries the error.
    async fn store_error_artifact(
        &self,
        template_id: &TemplateId,
        request_id: &RequestId,
        method: Option<GenerationMethod>,
        mapping: MappingSummary,
        err: &GenerationError,
    ) -> Option<ArtifactId> {
        let metadata = ArtifactMetadata {
            status: ArtifactStatus::Error,
            method,
            mapping,
            ai_failure: None,
            error: Some(err.to_string()),
            generated_at: Utc::now(),
        };
        match self
            .artifacts
            .put_artifact(template_id, request_id, "", &metadata)
            .await
        {
            Ok(id) => Some(id),
            Err(e) => {
                warn!(error = %e, "could not record error artifact");
                None
            }
        }
    }
}

fn outcome_error(
    template_id: TemplateId,
    artifact_id: Option<ArtifactId>,
    method: Option<GenerationMethod>,
    err: &GenerationError,
    trail: StateTrail,
) -> TemplateOutcome {
    TemplateOutcome {
        template_id,
        status: OutcomeStatus::Error,
        artifact_id,
        method,
        error: Some(err.to_string()),
        states: trail.into_states(),
    }
}

/// Outcome for a template that never ran.
fn failed_outcome(template_id: &TemplateId, err: &GenerationError) -> TemplateOutcome {
    let mut trail = StateTrail::new();
    trail.advance(GenerationState::Error);
    outcome_error(template_id.clone(), None, None, err, trail)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;
    use crate::generation::assembler::GenerativeAssembler;
    use crate::generation::deterministic::DeterministicRewriter;
    use crate::llm::box_provider::BoxLlmProvider;
    use crate::llm::provider::LlmProvider;
    use docfill_types::artifact::Artifact;
    use docfill_types::error::GeneratorError;
    use docfill_types::llm::{
        CompletionRequest, CompletionResponse, LlmError, ProviderCapabilities, StopReason, Usage,
    };
    use serde_json::json;
    use tokio::sync::Notify;

    // -----------------------------------------------------------------------
    // Test doubles
    // -----------------------------------------------------------------------

    #[derive(Default)]
    struct MockTemplates {
        bodies: HashMap<String, String>,
        unreadable: HashSet<String>,
    }

    impl MockTemplates {
        fn with(mut self, id: &str, body: &str) -> Self {
            self.bodies.insert(id.to_string(), body.to_string());
            self
        }

        fn unreadable(mut self, id: &str) -> Self {
            self.unreadable.insert(id.to_string());
            self
        }
    }

    impl TemplateStore for MockTemplates {
        async fn get_template_body(&self, id: &TemplateId) -> Result<String, RepositoryError> {
            if self.unreadable.contains(id.as_str()) {
                return Err(RepositoryError::Io("disk read failed".to_string()));
            }
            self.bodies
                .get(id.as_str())
                .cloned()
                .ok_or(RepositoryError::NotFound)
        }
    }

    #[derive(Default, Clone)]
    struct MockArtifacts {
        rows: Arc<Mutex<Vec<Artifact>>>,
        failing: Arc<HashSet<String>>,
    }

    impl MockArtifacts {
        fn failing_for(id: &str) -> Self {
            Self {
                rows: Arc::default(),
                failing: Arc::new(HashSet::from([id.to_string()])),
            }
        }

        fn all(&self) -> Vec<Artifact> {
            self.rows.lock().unwrap().clone()
        }
    }

    impl ArtifactStore for MockArtifacts {
        async fn put_artifact(
            &self,
            template_id: &TemplateId,
            request_id: &RequestId,
            body: &str,
            metadata: &ArtifactMetadata,
        ) -> Result<ArtifactId, RepositoryError> {
            if self.failing.contains(template_id.as_str()) {
                return Err(RepositoryError::Connection);
            }
            let mut rows = self.rows.lock().unwrap();
            let now = Utc::now();
            if let Some(row) = rows
                .iter_mut()
                .find(|a| &a.template_id == template_id && &a.request_id == request_id)
            {
                row.body = body.to_string();
                row.metadata = metadata.clone();
                row.updated_at = now;
                return Ok(row.id);
            }
            let id = ArtifactId::new();
            rows.push(Artifact {
                id,
                template_id: template_id.clone(),
                request_id: *request_id,
                body: body.to_string(),
                metadata: metadata.clone(),
                created_at: now,
                updated_at: now,
            });
            Ok(id)
        }

        async fn get_artifact(
            &self,
            template_id: &TemplateId,
            request_id: &RequestId,
        ) -> Result<Option<Artifact>, RepositoryError> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .iter()
                .find(|a| &a.template_id == template_id && &a.request_id == request_id)
                .cloned())
        }

        async fn list_for_request(
            &self,
            request_id: &RequestId,
        ) -> Result<Vec<Artifact>, RepositoryError> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .iter()
                .filter(|a| &a.request_id == request_id)
                .cloned()
                .collect())
        }
    }

    /// Scripted primary strategy.
    #[derive(Clone)]
    enum Script {
        /// Return the template body with every `{{` and `}}` removed.
        Echo,
        Fail,
        Panic,
        /// Signal `started`, then sleep before echoing.
        Slow(Arc<Notify>, Duration),
    }

    struct ScriptedPrimary {
        script: Script,
        calls: Arc<AtomicUsize>,
        in_flight: Arc<AtomicUsize>,
        peak: Arc<AtomicUsize>,
    }

    impl ScriptedPrimary {
        fn new(script: Script) -> Self {
            Self {
                script,
                calls: Arc::default(),
                in_flight: Arc::default(),
                peak: Arc::default(),
            }
        }
    }

    impl Generator for ScriptedPrimary {
        fn method(&self) -> GenerationMethod {
            GenerationMethod::Ai
        }

        async fn generate(&self, input: &GenerationInput) -> Result<String, GeneratorError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            let result = match &self.script {
                Script::Echo => Ok(input.template.body.replace("{{", "").replace("}}", "")),
                Script::Fail => Err(GeneratorError::TooShort {
                    actual: 1,
                    minimum: 10,
                }),
                Script::Panic => panic!("scripted panic"),
                Script::Slow(started, delay) => {
                    started.notify_one();
                    tokio::time::sleep(*delay).await;
                    Ok(input.template.body.clone())
                }
            };
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            result
        }
    }

    type TestOrchestrator<P> = HybridOrchestrator<MockTemplates, MockArtifacts, P, DeterministicRewriter>;

    fn config(max_concurrency: usize) -> GenerationConfig {
        GenerationConfig {
            max_concurrency,
            ..GenerationConfig::default()
        }
    }

    fn orchestrator<P: Generator + 'static>(
        templates: MockTemplates,
        artifacts: MockArtifacts,
        primary: Option<P>,
        max_concurrency: usize,
    ) -> TestOrchestrator<P> {
        HybridOrchestrator::new(
            templates,
            artifacts,
            FieldMapper::default(),
            primary,
            DeterministicRewriter::default(),
            &config(max_concurrency),
        )
    }

    fn answers() -> AnswerSet {
        serde_json::from_value(json!({"grantorName": "", "fullName": "Jane Doe"})).unwrap()
    }

    fn ids(raw: &[&str]) -> Vec<TemplateId> {
        raw.iter().map(|s| TemplateId::from(*s)).collect()
    }

    fn three_templates() -> MockTemplates {
        MockTemplates::default()
            .with("t1", "Grantor: {{grantor_name}}")
            .with("t2", "Trustee: [trustee]")
            .with("t3", "Signed by {{grantor_name}} on ____")
    }

    use GenerationState::*;

    // -----------------------------------------------------------------------
    // Tests
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn test_batch_isolates_unreadable_template() {
        let artifacts = MockArtifacts::default();
        let orch = orchestrator::<ScriptedPrimary>(
            three_templates().unreadable("t2"),
            artifacts.clone(),
            None,
            3,
        );

        let report = orch
            .generate_documents(&ids(&["t1", "t2", "t3"]), answers(), GenerationOptions::default())
            .await;

        let statuses: Vec<OutcomeStatus> = report.outcomes.iter().map(|o| o.status).collect();
        assert_eq!(
            statuses,
            vec![OutcomeStatus::Done, OutcomeStatus::Error, OutcomeStatus::Done]
        );
        let t2 = report.outcome(&"t2".into()).unwrap();
        assert!(t2.error.as_deref().unwrap().contains("template unavailable"));
        assert_eq!(t2.states, vec![Pending, Error]);
        assert!(t2.artifact_id.is_none());
        assert_eq!(report.failed_count(), 1);
        assert_eq!(artifacts.all().len(), 2);
    }

    #[tokio::test]
    async fn test_deterministic_only_without_primary() {
        let artifacts = MockArtifacts::default();
        let orch = orchestrator::<ScriptedPrimary>(three_templates(), artifacts.clone(), None, 2);

        let report = orch
            .generate_documents(&ids(&["t1"]), answers(), GenerationOptions::default())
            .await;

        let outcome = &report.outcomes[0];
        assert_eq!(outcome.method, Some(GenerationMethod::Deterministic));
        assert_eq!(outcome.states, vec![Pending, DeterministicUsed, Done]);

        let stored = artifacts.all().remove(0);
        assert_eq!(stored.body, "Grantor: Jane Doe");
        assert_eq!(stored.metadata.mapping.alias, 1);
        assert_eq!(stored.metadata.status, ArtifactStatus::Generated);
        assert_eq!(Some(stored.id), outcome.artifact_id);
    }

    #[tokio::test]
    async fn test_primary_success_skips_fallback() {
        let artifacts = MockArtifacts::default();
        let orch = orchestrator(
            three_templates(),
            artifacts.clone(),
            Some(ScriptedPrimary::new(Script::Echo)),
            3,
        );

        let report = orch
            .generate_documents(&ids(&["t1"]), answers(), GenerationOptions::default())
            .await;

        let outcome = &report.outcomes[0];
        assert_eq!(outcome.method, Some(GenerationMethod::Ai));
        assert_eq!(outcome.states, vec![Pending, AiAttempted, AiSucceeded, Done]);
        assert_eq!(artifacts.all()[0].body, "Grantor: grantor_name");
        assert!(artifacts.all()[0].metadata.ai_failure.is_none());
    }

    #[tokio::test]
    async fn test_primary_failure_falls_back_transparently() {
        let artifacts = MockArtifacts::default();
        let orch = orchestrator(
            three_templates(),
            artifacts.clone(),
            Some(ScriptedPrimary::new(Script::Fail)),
            3,
        );

        let report = orch
            .generate_documents(&ids(&["t1", "t3"]), answers(), GenerationOptions::default())
            .await;

        assert!(report.all_succeeded());
        for outcome in &report.outcomes {
            assert_eq!(outcome.method, Some(GenerationMethod::Deterministic));
            assert_eq!(
                outcome.states,
                vec![Pending, AiAttempted, AiFailed, DeterministicUsed, Done]
            );
            assert!(outcome.error.is_none());
        }
        let stored = orch
            .artifacts()
            .get_artifact(&"t3".into(), &report.request_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.body, "Signed by Jane Doe on Not Provided");
        assert!(stored.metadata.ai_failure.unwrap().contains("too short"));
    }

    #[tokio::test]
    async fn test_force_deterministic_never_calls_primary() {
        let primary = ScriptedPrimary::new(Script::Echo);
        let calls = Arc::clone(&primary.calls);
        let orch = orchestrator(three_templates(), MockArtifacts::default(), Some(primary), 3);

        let options = GenerationOptions {
            force_deterministic: true,
            request_id: None,
        };
        let report = orch
            .generate_documents(&ids(&["t1", "t2"]), answers(), options)
            .await;

        assert!(report.all_succeeded());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(report.outcomes[0].states, vec![Pending, DeterministicUsed, Done]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_assembler_timeout_falls_back() {
        struct StalledProvider(ProviderCapabilities);

        impl LlmProvider for StalledProvider {
            fn name(&self) -> &str {
                "stalled"
            }

            fn capabilities(&self) -> &ProviderCapabilities {
                &self.0
            }

            async fn complete(
                &self,
                _request: &CompletionRequest,
            ) -> Result<CompletionResponse, LlmError> {
                tokio::time::sleep(Duration::from_secs(3_600)).await;
                Ok(CompletionResponse {
                    id: "late".to_string(),
                    content: String::new(),
                    model: String::new(),
                    stop_reason: StopReason::EndTurn,
                    usage: Usage::default(),
                })
            }
        }

        let provider = Arc::new(BoxLlmProvider::new(StalledProvider(ProviderCapabilities {
            max_context_tokens: 1_000,
            max_output_tokens: 1_000,
        })));
        let assembler = GenerativeAssembler::new(
            provider,
            "m",
            &GenerationConfig {
                ai_timeout_secs: 2,
                ..GenerationConfig::default()
            },
            "Not Provided",
        );
        let artifacts = MockArtifacts::default();
        let orch = orchestrator(three_templates(), artifacts.clone(), Some(assembler), 1);

        let report = orch
            .generate_documents(&ids(&["t1"]), answers(), GenerationOptions::default())
            .await;

        assert!(report.all_succeeded());
        assert_eq!(report.outcomes[0].method, Some(GenerationMethod::Deterministic));
        let failure = artifacts.all()[0].metadata.ai_failure.clone().unwrap();
        assert!(failure.contains("timed out after 2s"), "{failure}");
    }

    #[tokio::test]
    async fn test_regeneration_replaces_artifact() {
        let artifacts = MockArtifacts::default();
        let orch = orchestrator::<ScriptedPrimary>(three_templates(), artifacts.clone(), None, 3);
        let request_id = RequestId::new();
        let options = GenerationOptions {
            force_deterministic: false,
            request_id: Some(request_id),
        };

        let first = orch
            .generate_documents(&ids(&["t1"]), answers(), options.clone())
            .await;
        let second_answers: AnswerSet =
            serde_json::from_value(json!({"grantor_name": "John Roe"})).unwrap();
        let second = orch
            .generate_documents(&ids(&["t1"]), second_answers, options)
            .await;

        assert_eq!(first.request_id, request_id);
        assert_eq!(first.outcomes[0].artifact_id, second.outcomes[0].artifact_id);

        let stored = artifacts.all();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].body, "Grantor: John Roe");
        assert_eq!(stored[0].metadata.mapping.exact, 1);
    }

    #[tokio::test]
    async fn test_empty_template_records_error_artifact() {
        let artifacts = MockArtifacts::default();
        let templates = MockTemplates::default().with("blank", "   \n  ");
        let orch = orchestrator::<ScriptedPrimary>(templates, artifacts.clone(), None, 3);

        let report = orch
            .generate_documents(&ids(&["blank"]), answers(), GenerationOptions::default())
            .await;

        let outcome = &report.outcomes[0];
        assert_eq!(outcome.status, OutcomeStatus::Error);
        assert_eq!(outcome.error.as_deref(), Some("template body is empty"));
        let stored = artifacts.all().remove(0);
        assert_eq!(stored.metadata.status, ArtifactStatus::Error);
        assert_eq!(Some(stored.id), outcome.artifact_id);
    }

    #[tokio::test]
    async fn test_artifact_store_failure_is_isolated() {
        let orch = orchestrator::<ScriptedPrimary>(
            three_templates(),
            MockArtifacts::failing_for("t2"),
            None,
            3,
        );

        let report = orch
            .generate_documents(&ids(&["t1", "t2", "t3"]), answers(), GenerationOptions::default())
            .await;

        let t2 = report.outcome(&"t2".into()).unwrap();
        assert_eq!(t2.status, OutcomeStatus::Error);
        assert!(t2.error.as_deref().unwrap().starts_with("artifact store error"));
        assert_eq!(t2.states, vec![Pending, DeterministicUsed, Error]);
        assert!(report.outcome(&"t1".into()).unwrap().is_done());
        assert!(report.outcome(&"t3".into()).unwrap().is_done());
    }

    #[tokio::test]
    async fn test_panicking_task_is_reported() {
        let orch = orchestrator(
            three_templates(),
            MockArtifacts::default(),
            Some(ScriptedPrimary::new(Script::Panic)),
            3,
        );

        let report = orch
            .generate_documents(&ids(&["t1"]), answers(), GenerationOptions::default())
            .await;

        let outcome = &report.outcomes[0];
        assert_eq!(outcome.status, OutcomeStatus::Error);
        assert!(outcome.error.as_deref().unwrap().contains("task panicked"));
    }

    #[tokio::test]
    async fn test_duplicate_ids_processed_once() {
        let artifacts = MockArtifacts::default();
        let orch = orchestrator::<ScriptedPrimary>(three_templates(), artifacts.clone(), None, 3);

        let report = orch
            .generate_documents(&ids(&["t1", "t2", "t1"]), answers(), GenerationOptions::default())
            .await;

        let order: Vec<&str> = report.outcomes.iter().map(|o| o.template_id.as_str()).collect();
        assert_eq!(order, vec!["t1", "t2"]);
        assert_eq!(artifacts.all().len(), 2);
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let artifacts = MockArtifacts::default();
        let orch = orchestrator::<ScriptedPrimary>(three_templates(), artifacts.clone(), None, 3);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let report = orch
            .generate_documents_with_cancel(
                &ids(&["t1", "t2"]),
                answers(),
                GenerationOptions::default(),
                cancel,
            )
            .await;

        assert_eq!(report.failed_count(), 2);
        for outcome in &report.outcomes {
            assert_eq!(outcome.error.as_deref(), Some("cancelled before start"));
            assert_eq!(outcome.states, vec![Pending, Error]);
        }
        assert!(artifacts.all().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_lets_in_flight_finish() {
        let started = Arc::new(Notify::new());
        let primary = ScriptedPrimary::new(Script::Slow(Arc::clone(&started), Duration::from_secs(30)));
        let artifacts = MockArtifacts::default();
        let orch = orchestrator(three_templates(), artifacts.clone(), Some(primary), 1);
        let cancel = CancellationToken::new();

        let batch = {
            let orch = orch.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move {
                orch.generate_documents_with_cancel(
                    &ids(&["t1", "t2", "t3"]),
                    answers(),
                    GenerationOptions::default(),
                    cancel,
                )
                .await
            })
        };

        started.notified().await;
        cancel.cancel();
        let report = batch.await.unwrap();

        let t1 = report.outcome(&"t1".into()).unwrap();
        assert!(t1.is_done());
        assert_eq!(t1.method, Some(GenerationMethod::Ai));
        for id in ["t2", "t3"] {
            let outcome = report.outcome(&id.into()).unwrap();
            assert_eq!(outcome.error.as_deref(), Some("cancelled before start"));
        }
        assert_eq!(artifacts.all().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrency_is_bounded() {
        let started = Arc::new(Notify::new());
        let primary = ScriptedPrimary::new(Script::Slow(started, Duration::from_millis(50)));
        let peak = Arc::clone(&primary.peak);
        let mut templates = MockTemplates::default();
        let names: Vec<String> = (0..6).map(|i| format!("doc{i}")).collect();
        for name in &names {
            templates = templates.with(name, "Body for {{grantor_name}}");
        }
        let orch = orchestrator(templates, MockArtifacts::default(), Some(primary), 2);

        let requested: Vec<TemplateId> = names.iter().map(|n| TemplateId::from(n.as_str())).collect();
        let report = orch
            .generate_documents(&requested, answers(), GenerationOptions::default())
            .await;

        assert!(report.all_succeeded());
        assert!(peak.load(Ordering::SeqCst) <= 2);
        assert!(peak.load(Ordering::SeqCst) >= 1);
    }

    #[tokio::test]
    async fn test_generate_for_intake_loads_answers() {
        struct OneIntake;

        impl AnswerStore for OneIntake {
            async fn get_answers(&self, intake: &IntakeId) -> Result<AnswerSet, RepositoryError> {
                if intake.0 == "intake-1" {
                    Ok(answers())
                } else {
                    Err(RepositoryError::NotFound)
                }
            }
        }

        let artifacts = MockArtifacts::default();
        let orch = orchestrator::<ScriptedPrimary>(three_templates(), artifacts.clone(), None, 3);

        let report = orch
            .generate_for_intake(&OneIntake, &"intake-1".into(), &ids(&["t1"]), GenerationOptions::default())
            .await
            .unwrap();
        assert!(report.all_succeeded());
        assert_eq!(artifacts.all()[0].body, "Grantor: Jane Doe");

        let err = orch
            .generate_for_intake(&OneIntake, &"missing".into(), &ids(&["t1"]), GenerationOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));
    }
}
