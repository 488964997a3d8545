//! `docfill generate` -- run one generation request.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use docfill_core::repository::{AnswerStore, ArtifactStore};
use docfill_infra::filesystem::{
    LocalAnswerStore, LocalTemplateStore, intakes_dir, load_answers_file, templates_dir,
};
use docfill_infra::memory::InMemoryArtifactStore;
use docfill_types::answer::AnswerSet;
use docfill_types::generation::{BatchReport, GenerationOptions, OutcomeStatus};
use docfill_types::template::{IntakeId, RequestId, TemplateId};

use crate::state::AppState;

#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Template ids (file names under the templates directory).
    #[arg(required = true)]
    pub template_ids: Vec<String>,

    /// JSON file of answers.
    #[arg(long, conflicts_with = "intake", required_unless_present = "intake")]
    pub answers: Option<PathBuf>,

    /// Intake id, read from `{data_dir}/intakes/{id}.json`.
    #[arg(long)]
    pub intake: Option<String>,

    /// Skip AI generation and use the deterministic rewrite only.
    #[arg(long)]
    pub deterministic: bool,

    /// Reuse a previous request id to regenerate its artifacts.
    #[arg(long)]
    pub request_id: Option<RequestId>,

    /// Read templates from this directory instead of `{data_dir}/templates`.
    #[arg(long)]
    pub templates_dir: Option<PathBuf>,

    /// Also write each generated body to `<DIR>/<template_id>`.
    #[arg(long, value_name = "DIR")]
    pub out: Option<PathBuf>,

    /// Keep artifacts in memory instead of the SQLite store.
    #[arg(long)]
    pub ephemeral: bool,
}

/// Run the batch and print its report.
///
/// Returns `true` when every template succeeded.
pub async fn generate(state: &AppState, args: GenerateArgs, json: bool, quiet: bool) -> Result<bool> {
    let answers = load_answers(state, &args).await?;
    let templates = LocalTemplateStore::new(
        args.templates_dir
            .clone()
            .unwrap_or_else(|| templates_dir(&state.data_dir)),
    );
    let template_ids: Vec<TemplateId> = args
        .template_ids
        .iter()
        .map(|id| TemplateId::from(id.as_str()))
        .collect();
    let options = GenerationOptions {
        force_deterministic: args.deterministic,
        request_id: args.request_id,
    };

    let report = if args.ephemeral {
        let artifacts = InMemoryArtifactStore::new();
        run_batch(state, templates, artifacts, &args, &template_ids, answers, options).await?
    } else {
        let artifacts = state.artifact_store().await?;
        run_batch(state, templates, artifacts, &args, &template_ids, answers, options).await?
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if !quiet {
        print_report(&report);
    }

    Ok(report.all_succeeded())
}

async fn load_answers(state: &AppState, args: &GenerateArgs) -> Result<AnswerSet> {
    match (&args.answers, &args.intake) {
        (Some(path), _) => load_answers_file(path)
            .await
            .with_context(|| format!("failed to load answers from {}", path.display())),
        (None, Some(intake)) => LocalAnswerStore::new(intakes_dir(&state.data_dir))
            .get_answers(&IntakeId::from(intake.as_str()))
            .await
            .with_context(|| format!("failed to load intake '{intake}'")),
        (None, None) => anyhow::bail!("either --answers or --intake is required"),
    }
}

async fn run_batch<S: ArtifactStore + 'static>(
    state: &AppState,
    templates: LocalTemplateStore,
    artifacts: S,
    args: &GenerateArgs,
    template_ids: &[TemplateId],
    answers: AnswerSet,
    options: GenerationOptions,
) -> Result<BatchReport> {
    let orchestrator = state.orchestrator(templates, artifacts, args.deterministic);

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, finishing in-flight templates");
            on_interrupt.cancel();
        }
    });

    let report = orchestrator
        .generate_documents_with_cancel(template_ids, answers, options, cancel)
        .await;
    interrupt.abort();

    info!(
        request_id = %report.request_id,
        failed = report.failed_count(),
        total = report.outcomes.len(),
        "generation request finished"
    );

    if let Some(out_dir) = &args.out {
        write_outputs(orchestrator.artifacts(), &report, out_dir).await?;
    }
    Ok(report)
}

/// Write every successful artifact body to `{out_dir}/{template_id}`.
async fn write_outputs<S: ArtifactStore>(
    artifacts: &S,
    report: &BatchReport,
    out_dir: &Path,
) -> Result<usize> {
    tokio::fs::create_dir_all(out_dir)
        .await
        .with_context(|| format!("failed to create {}", out_dir.display()))?;

    let mut written = 0;
    for outcome in report.outcomes.iter().filter(|o| o.is_done()) {
        let Some(artifact) = artifacts
            .get_artifact(&outcome.template_id, &report.request_id)
            .await?
        else {
            warn!(template_id = %outcome.template_id, "artifact missing after generation");
            continue;
        };
        let path = out_dir.join(outcome.template_id.as_str());
        tokio::fs::write(&path, &artifact.body)
            .await
            .with_context(|| format!("failed to write {}", path.display()))?;
        written += 1;
    }
    Ok(written)
}

fn print_report(report: &BatchReport) {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Template").fg(Color::White),
        Cell::new("Status").fg(Color::White),
        Cell::new("Method").fg(Color::White),
        Cell::new("Error").fg(Color::White),
    ]);

    for outcome in &report.outcomes {
        let status = match outcome.status {
            OutcomeStatus::Done => Cell::new("● done").fg(Color::Green),
            OutcomeStatus::Error => Cell::new("✗ error").fg(Color::Red),
        };
        table.add_row(vec![
            Cell::new(&outcome.template_id).fg(Color::Cyan),
            status,
            Cell::new(outcome.method.map(|m| m.to_string()).unwrap_or_else(|| "-".into())),
            Cell::new(outcome.error.as_deref().unwrap_or("")).fg(Color::DarkGrey),
        ]);
    }

    println!("{table}");
    let failed = report.failed_count();
    let done = report.outcomes.len() - failed;
    let summary = format!("{done} done, {failed} failed");
    println!(
        "  Request {}: {}",
        style(report.request_id).bold(),
        if failed == 0 {
            style(summary).green()
        } else {
            style(summary).yellow()
        }
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use docfill_types::artifact::{ArtifactMetadata, ArtifactStatus, GenerationMethod};
    use docfill_types::config::DocfillConfig;
    use docfill_types::mapping::MappingSummary;

    fn state(data_dir: &Path) -> AppState {
        AppState {
            data_dir: data_dir.to_path_buf(),
            config: DocfillConfig::default(),
        }
    }

    fn args(ids: &[&str]) -> GenerateArgs {
        GenerateArgs {
            template_ids: ids.iter().map(|s| s.to_string()).collect(),
            answers: None,
            intake: None,
            deterministic: true,
            request_id: None,
            templates_dir: None,
            out: None,
            ephemeral: true,
        }
    }

    #[tokio::test]
    async fn test_deterministic_batch_writes_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let templates = LocalTemplateStore::new(templates_dir(dir.path()));
        templates
            .put_template(&TemplateId::from("will.html"), "<p>I, {{grantor_name}}, of [county].</p>")
            .await
            .unwrap();

        let answers: AnswerSet = [("fullName", "Jane Doe")].into_iter().collect();
        let mut args = args(&["will.html", "missing.html"]);
        args.out = Some(dir.path().join("out"));
        let ids: Vec<TemplateId> = ["will.html", "missing.html"]
            .into_iter()
            .map(TemplateId::from)
            .collect();

        let report = run_batch(
            &state(dir.path()),
            templates,
            InMemoryArtifactStore::new(),
            &args,
            &ids,
            answers,
            GenerationOptions {
                force_deterministic: true,
                request_id: None,
            },
        )
        .await
        .unwrap();

        assert_eq!(report.failed_count(), 1);
        assert!(report.outcomes[0].is_done());
        assert_eq!(report.outcomes[1].status, OutcomeStatus::Error);

        let written = tokio::fs::read_to_string(dir.path().join("out").join("will.html"))
            .await
            .unwrap();
        assert_eq!(written, "<p>I, Jane Doe, of Not Provided.</p>");
        assert!(!dir.path().join("out").join("missing.html").exists());
    }

    #[tokio::test]
    async fn test_load_answers_from_intake() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::create_dir_all(intakes_dir(dir.path())).await.unwrap();
        tokio::fs::write(
            intakes_dir(dir.path()).join("i-1.json"),
            r#"{"fullName": "Jane"}"#,
        )
        .await
        .unwrap();

        let mut args = args(&["will.html"]);
        args.intake = Some("i-1".to_string());
        let answers = load_answers(&state(dir.path()), &args).await.unwrap();
        assert_eq!(answers.len(), 1);

        args.intake = Some("i-2".to_string());
        assert!(load_answers(&state(dir.path()), &args).await.is_err());
    }

    #[tokio::test]
    async fn test_write_outputs_skips_failed() {
        let dir = tempfile::tempdir().unwrap();
        let store = InMemoryArtifactStore::new();
        let request_id = RequestId::new();
        let metadata = ArtifactMetadata {
            status: ArtifactStatus::Generated,
            method: Some(GenerationMethod::Deterministic),
            mapping: MappingSummary::default(),
            ai_failure: None,
            error: None,
            generated_at: chrono::Utc::now(),
        };
        store
            .put_artifact(&TemplateId::from("a.txt"), &request_id, "filled", &metadata)
            .await
            .unwrap();

        let report: BatchReport = serde_json::from_value(serde_json::json!({
            "request_id": request_id,
            "outcomes": [
                {"template_id": "a.txt", "status": "done", "artifact_id": null,
                 "method": "deterministic", "error": null, "states": []},
                {"template_id": "b.txt", "status": "error", "artifact_id": null,
                 "method": null, "error": "template unavailable: entity not found", "states": []}
            ]
        }))
        .unwrap();

        let written = write_outputs(&store, &report, dir.path()).await.unwrap();
        assert_eq!(written, 1);
        assert!(dir.path().join("a.txt").exists());
        assert!(!dir.path().join("b.txt").exists());
    }
}
