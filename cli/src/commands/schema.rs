//! Schema commands

use crate::client::ApiClient;
use crate::output::OutputFormat;
use std::path::Path;

pub async fn handle(client: &ApiClient, local: Option<&Path>, format: OutputFormat) -> anyhow::Result<()> {
    let schema = client.load_schema(local).await?;
    format.print_schema(&schema);
    Ok(())
}
