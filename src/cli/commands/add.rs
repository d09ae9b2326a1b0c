//! Add artist command handler

use anyhow::Context;

use crate::config::Config;
use crate::db::Store;
use crate::models::artist::NewArtist;

pub async fn cmd_add_artist(config: &Config, artist: NewArtist) -> anyhow::Result<()> {
    if artist.name.trim().is_empty() {
        anyhow::bail!("Artist name must not be empty");
    }

    let store = Store::from_config(config).await?;
    let id = store
        .add_artist(&artist)
        .await
        .context("Failed to add artist")?;

    println!("✓ Added {} (ID: {id})", artist.name.trim());
    println!("  Classify it with: sayu-apt classify-one {id}");
    Ok(())
}
