use crate::config::Config;
use crate::services::ClassificationService;

pub async fn cmd_reset(config: &Config, include_protected: bool) -> anyhow::Result<()> {
    let service = super::build_classification_service(config).await?;
    let cleared = service.reset(include_protected).await?;

    println!("✓ Cleared {cleared} profile(s)");
    if !include_protected {
        println!("  Expert presets were kept. Use --include-protected to clear them too.");
    }
    Ok(())
}
