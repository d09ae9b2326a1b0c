use std::sync::Arc;

use anyhow::Context;

use crate::apt::AxisScorer;
use crate::apt::resolver::ResolverSettings;
use crate::clients::{Collector, build_collectors};
use crate::config::Config;
use crate::db::Store;

/// Everything a classification run needs, passed explicitly.
///
/// Collectors carry their own rate limiters, so one context shared by a
/// whole batch keeps every source under its configured request rate.
#[derive(Clone)]
pub struct ClassificationContext {
    pub config: Arc<Config>,

    pub store: Store,

    pub collectors: Vec<Arc<dyn Collector>>,

    pub scorer: Arc<AxisScorer>,
}

impl ClassificationContext {
    /// Connects to the database and builds every enabled collector.
    pub async fn from_config(config: Config) -> anyhow::Result<Self> {
        let store = Store::from_config(&config).await?;
        let collectors = build_collectors(&config).context("Failed to build collectors")?;
        Self::with_collectors(config, store, collectors)
    }

    pub fn with_collectors(
        config: Config,
        store: Store,
        collectors: Vec<Arc<dyn Collector>>,
    ) -> anyhow::Result<Self> {
        let scorer = AxisScorer::standard().context("Failed to compile rule table")?;

        Ok(Self {
            config: Arc::new(config),
            store,
            collectors,
            scorer: Arc::new(scorer),
        })
    }

    #[must_use]
    pub fn resolver_settings(&self) -> ResolverSettings {
        ResolverSettings::from(&self.config.classification)
    }
}
