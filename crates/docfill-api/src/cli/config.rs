//! `docfill config` -- show the effective configuration.

use anyhow::{Result, bail};
use console::style;

use docfill_infra::llm::test_provider_connection;

use crate::state::AppState;

pub async fn show_config(state: &AppState, check: bool, json: bool) -> Result<()> {
    if json {
        let value = serde_json::json!({
            "data_dir": state.data_dir.display().to_string(),
            "config": state.config,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        println!();
        println!("  {}", style("── Data ──").dim());
        println!("  Data dir: {}", style(state.data_dir.display()).dim());
        println!();
        println!("{}", toml::to_string_pretty(&state.config)?);
    }

    if check {
        let Some(provider) = state.provider()? else {
            bail!("no [provider] configured");
        };
        test_provider_connection(&provider).await?;
        if !json {
            println!(
                "  {} Provider {} is reachable",
                style("✓").green(),
                style(provider.name()).cyan()
            );
        }
    }

    Ok(())
}
