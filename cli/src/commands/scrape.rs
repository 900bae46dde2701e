//! Scrape command: HTML snapshots to a Schema Document file

use crate::extract::build_schema;
use anyhow::{bail, Context};
use std::path::{Path, PathBuf};

pub const DEFAULT_SOURCE: &str = "https://udyamregistration.gov.in/UdyamRegistration.aspx";

async fn fetch_page(url: &str) -> anyhow::Result<String> {
    let body = reqwest::get(url)
        .await
        .and_then(|r| r.error_for_status())
        .with_context(|| format!("fetching {url}"))?
        .text()
        .await?;
    Ok(body)
}

/// Read the snapshots, or fetch the live page once and use it for both
/// captures when none are given.
pub async fn handle(url: &str, snapshots: &[PathBuf], out_dir: &Path) -> anyhow::Result<()> {
    if snapshots.len() > 2 {
        bail!("at most two snapshots: before and after the OTP step");
    }
    let pages = if snapshots.is_empty() {
        let page = fetch_page(url).await?;
        vec![page.clone(), page]
    } else {
        snapshots
            .iter()
            .map(|p| std::fs::read_to_string(p).with_context(|| format!("reading {}", p.display())))
            .collect::<anyhow::Result<Vec<_>>>()?
    };

    let schema = build_schema(&pages, url)?;
    std::fs::create_dir_all(out_dir)?;
    let out = out_dir.join("schema.json");
    std::fs::write(&out, serde_json::to_string_pretty(&schema)?)?;
    println!(
        "Saved schema to {} ({} steps, {} fields)",
        out.display(),
        schema.steps.len(),
        schema.field_count()
    );
    Ok(())
}
