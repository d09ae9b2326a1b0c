//! Legacy migration command handler

use crate::config::Config;
use crate::db::Store;
use crate::domain::WriteMode;
use crate::services::ProfileMigrationService;

pub async fn cmd_migrate_legacy(config: &Config, force: bool) -> anyhow::Result<()> {
    let store = Store::from_config(config).await?;
    let service = ProfileMigrationService::new(store);

    println!("Migrating legacy profiles...");
    let report = service
        .migrate(WriteMode::from_force_flag(force))
        .await?;

    println!();
    println!("Migration Summary");
    println!("{:-<60}", "");
    println!("Converted in place:   {}", report.converted);
    println!("Imported mappings:    {}", report.imported);
    println!("Already current:      {}", report.already_current);
    println!("Skipped (has one):    {}", report.skipped_existing);
    println!("Protected (kept):     {}", report.rejected_protected);
    println!("Failed:               {}", report.failures.len());

    if !report.failures.is_empty() {
        println!();
        for (id, reason) in &report.failures {
            println!("  ✗ [{id}] {reason}");
        }
    }

    Ok(())
}
