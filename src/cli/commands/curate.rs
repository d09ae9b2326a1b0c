use anyhow::Context;

use crate::config::Config;
use crate::services::ClassificationService;

pub async fn cmd_curate(config: &Config, id_str: &str, file: &str) -> anyhow::Result<()> {
    let id = super::parse_artist_id(id_str)?;
    let raw = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("Failed to read profile from {file}"))?;

    let service = super::build_classification_service(config).await?;
    let profile = service.curate(id, &raw).await?;

    let code = profile
        .primary()
        .map_or_else(|| "?".to_string(), |c| c.to_string());
    println!("✓ Stored expert preset {code} for artist {id}");
    println!("  It will be kept by batch runs unless --force is given.");
    Ok(())
}
