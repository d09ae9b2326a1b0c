//! List artists command handler

use crate::apt::AptProfile;
use crate::config::Config;
use crate::db::Store;

pub async fn cmd_list_artists(config: &Config) -> anyhow::Result<()> {
    let store = Store::from_config(config).await?;
    let artists = store.list_artists().await?;

    if artists.is_empty() {
        println!("No artists yet.");
        println!();
        println!("Add one with: sayu-apt add \"artist name\"");
        return Ok(());
    }

    let now = chrono::Utc::now().to_rfc3339();
    let classified = artists.iter().filter(|a| a.is_classified()).count();

    println!(
        "Artists ({} total, {} classified)",
        artists.len(),
        classified
    );
    println!("{:-<70}", "");

    for artist in &artists {
        let summary = match artist.apt_profile.as_deref() {
            None => "○ unclassified".to_string(),
            Some(raw) => match AptProfile::parse_stored(raw, &now) {
                Ok(stored) => {
                    let legacy = if stored.was_migrated() { " (legacy)" } else { "" };
                    let profile = stored.profile();
                    let code = profile
                        .primary()
                        .map_or_else(|| "?".to_string(), |c| c.to_string());
                    let lock = if profile.is_protected() { " 🔒" } else { "" };
                    format!(
                        "✓ {code} {:.0}%{lock}{legacy}",
                        profile.meta.confidence * 100.0
                    )
                }
                Err(_) => "⚠ invalid profile".to_string(),
            },
        };

        println!("[{:>4}] {:<40} {summary}", artist.id, artist.name);
    }

    println!();
    println!("Legend: ✓ Classified | ○ Pending | 🔒 Protected");

    Ok(())
}
