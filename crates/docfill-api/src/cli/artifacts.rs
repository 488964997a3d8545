//! `docfill artifacts` -- list the artifacts stored for one request.

use anyhow::Result;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use docfill_core::repository::ArtifactStore;
use docfill_types::artifact::{Artifact, ArtifactStatus};
use docfill_types::template::RequestId;

use crate::state::AppState;

pub async fn list_artifacts(state: &AppState, request_id: &RequestId, json: bool) -> Result<()> {
    let store = state.artifact_store().await?;
    let artifacts = store.list_for_request(request_id).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&artifacts)?);
        return Ok(());
    }

    if artifacts.is_empty() {
        println!();
        println!("  {} No artifacts for request {request_id}", style("○").dim());
        println!();
        return Ok(());
    }

    println!("{}", artifact_table(&artifacts));
    Ok(())
}

fn artifact_table(artifacts: &[Artifact]) -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Template").fg(Color::White),
        Cell::new("Status").fg(Color::White),
        Cell::new("Method").fg(Color::White),
        Cell::new("Resolved").fg(Color::White),
        Cell::new("Note").fg(Color::White),
        Cell::new("Updated").fg(Color::White),
    ]);

    for artifact in artifacts {
        let meta = &artifact.metadata;
        let status = match meta.status {
            ArtifactStatus::Generated => Cell::new("● generated").fg(Color::Green),
            ArtifactStatus::Error => Cell::new("✗ error").fg(Color::Red),
        };
        let note = meta
            .error
            .as_deref()
            .or(meta.ai_failure.as_deref())
            .unwrap_or("");
        table.add_row(vec![
            Cell::new(&artifact.template_id).fg(Color::Cyan),
            status,
            Cell::new(meta.method.map(|m| m.to_string()).unwrap_or_else(|| "-".into())),
            Cell::new(format!("{}/{}", meta.mapping.resolved, meta.mapping.total)),
            Cell::new(note).fg(Color::DarkGrey),
            Cell::new(artifact.updated_at.format("%Y-%m-%d %H:%M:%S")).fg(Color::DarkGrey),
        ]);
    }
    table
}
