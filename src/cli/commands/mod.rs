mod add;
mod classify;
mod curate;
mod init;
mod list;
mod migrate;
mod reset;
mod show;

pub use add::cmd_add_artist;
pub use classify::{ClassifyArgs, cmd_classify, cmd_classify_one};
pub use curate::cmd_curate;
pub use init::cmd_init;
pub use list::cmd_list_artists;
pub use migrate::cmd_migrate_legacy;
pub use reset::cmd_reset;
pub use show::cmd_show_artist;

use crate::config::Config;
use crate::services::SeaOrmClassificationService;
use crate::state::ClassificationContext;

async fn build_classification_service(
    config: &Config,
) -> anyhow::Result<SeaOrmClassificationService> {
    let ctx = ClassificationContext::from_config(config.clone()).await?;
    Ok(SeaOrmClassificationService::new(&ctx))
}

fn parse_artist_id(id_str: &str) -> anyhow::Result<crate::domain::ArtistId> {
    use anyhow::Context;
    let id: i32 = id_str.parse().context("Invalid artist ID")?;
    Ok(crate::domain::ArtistId::new(id))
}
