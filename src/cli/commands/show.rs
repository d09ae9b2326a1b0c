use crate::apt::{AptProfile, Axis};
use crate::config::Config;
use crate::db::Store;

pub async fn cmd_show_artist(config: &Config, id_str: &str) -> anyhow::Result<()> {
    let id = super::parse_artist_id(id_str)?;
    let store = Store::from_config(config).await?;

    let Some(artist) = store.get_artist(id).await? else {
        println!("Artist with ID {id} not found.");
        return Ok(());
    };

    println!("Artist");
    println!("{:-<60}", "");
    println!("Name:        {}", artist.name);
    if let Some(name_ko) = &artist.name_ko {
        println!("Korean name: {name_ko}");
    }
    println!("ID:          {}", artist.id);
    if let Some(nationality) = &artist.nationality {
        println!("Nationality: {nationality}");
    }
    if let Some(era) = &artist.era {
        println!("Era:         {era}");
    }
    match (artist.birth_year, artist.death_year) {
        (Some(b), Some(d)) => println!("Lived:       {b}-{d}"),
        (Some(b), None) => println!("Born:        {b}"),
        _ => {}
    }
    if artist.follower_count > 0 || artist.is_verified {
        let badge = if artist.is_verified { " ✓ verified" } else { "" };
        println!("Followers:   {}{badge}", artist.follower_count);
    }

    let Some(raw) = artist.apt_profile.as_deref() else {
        println!();
        println!("Not classified yet. Run: sayu-apt classify-one {id}");
        return Ok(());
    };

    let stored = match AptProfile::parse_stored(raw, &chrono::Utc::now().to_rfc3339()) {
        Ok(stored) => stored,
        Err(e) => {
            println!();
            println!("⚠ Stored profile is invalid: {e}");
            return Ok(());
        }
    };
    let profile = stored.profile();

    println!();
    println!("Profile");
    println!("{:-<60}", "");
    for entry in &profile.primary_types {
        let info = entry.code.info();
        println!(
            "#{} {} {:>5.1}%  {} ({}, {})",
            entry.rank,
            entry.code,
            entry.weight * 100.0,
            info.title,
            info.animal,
            info.title_ko
        );
    }
    println!();
    for axis in Axis::ALL {
        println!(
            "{:<4} {:>6.2}  ({} ← → {})",
            axis.key(),
            profile.dimensions.get(axis),
            axis.low_pole().letter(),
            axis.high_pole().letter()
        );
    }
    println!();
    println!("Confidence:  {:.3}", profile.meta.confidence);
    println!("Source:      {}", profile.meta.source);
    println!("Method:      {}", profile.meta.classification_method);
    if !profile.meta.data_sources.is_empty() {
        println!("Sources:     {}", profile.meta.data_sources.join(", "));
    }
    println!("Updated:     {}", profile.meta.timestamp);
    if !profile.meta.reasoning.is_empty() {
        println!("Reasoning:   {}", profile.meta.reasoning);
    }
    if profile.is_protected() {
        println!("🔒 Protected from automatic reclassification");
    }
    if stored.was_migrated() {
        println!("⚠ Stored in a legacy format; run 'sayu-apt migrate-legacy' to upgrade");
    }

    Ok(())
}
