//! Validate command: server pre-check of a record file

use crate::client::{first_errors, ApiClient, PreCheck};
use crate::output::OutputFormat;
use anyhow::{bail, Context};
use colored::Colorize;
use std::path::Path;

pub async fn handle(client: &ApiClient, file: &Path, format: OutputFormat) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(file).with_context(|| format!("reading {}", file.display()))?;
    let record: serde_json::Value = serde_json::from_str(&content).context("record is not valid JSON")?;
    if !record.is_object() {
        bail!("record must be a JSON object of field values");
    }
    match client.validate(&record).await? {
        PreCheck::Valid => {
            println!("{}", "Record is valid".green());
            Ok(())
        }
        PreCheck::Invalid(errors) => {
            format.print_errors(&first_errors(&errors));
            bail!("{} field(s) invalid", errors.len())
        }
    }
}
