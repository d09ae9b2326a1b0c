use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub collectors: CollectorsConfig,

    pub classification: ClassificationConfig,

    pub batch: BatchConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_path: String,

    pub log_level: String,

    /// "pretty" (default) or "json"
    pub log_format: String,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    /// Maximum database connections (default: 5)
    pub max_db_connections: u32,

    /// Minimum database connections (default: 1)
    pub min_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:data/sayu-apt.db".to_string(),
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            worker_threads: 2,
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorsConfig {
    /// Sent with every request; Wikimedia rejects anonymous agents.
    pub user_agent: String,

    pub wikipedia: CollectorConfig,

    pub met_museum: CollectorConfig,

    pub pageviews: CollectorConfig,

    /// Number of Met objects fetched per artist for department/tag terms
    pub met_sample_objects: usize,
}

impl Default for CollectorsConfig {
    fn default() -> Self {
        Self {
            user_agent: "SayuApt/0.1 (artist classification batch)".to_string(),
            wikipedia: CollectorConfig::with_base_url("https://en.wikipedia.org/api/rest_v1"),
            met_museum: CollectorConfig {
                requests_per_second: 5,
                ..CollectorConfig::with_base_url(
                    "https://collectionapi.metmuseum.org/public/collection/v1",
                )
            },
            pageviews: CollectorConfig::with_base_url(
                "https://wikimedia.org/api/rest_v1/metrics/pageviews",
            ),
            met_sample_objects: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    pub enabled: bool,

    pub base_url: String,

    /// Upper bound for one collector call, including every request it makes
    pub timeout_seconds: u64,

    /// Global limit shared by all artists in a batch
    pub requests_per_second: u32,

    pub cache_ttl_hours: i64,

    /// Name of an environment variable holding a bearer token
    pub api_token_env: Option<String>,
}

impl CollectorConfig {
    fn with_base_url(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn api_token(&self) -> Option<String> {
        self.api_token_env
            .as_deref()
            .and_then(|name| std::env::var(name).ok())
            .filter(|token| !token.trim().is_empty())
    }
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: String::new(),
            timeout_seconds: 8,
            requests_per_second: 1,
            cache_ttl_hours: crate::constants::cache::EVIDENCE_TTL_HOURS,
            api_token_env: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassificationConfig {
    /// Below this, the best code is not considered separated from the rest
    pub min_separation: f64,

    /// Secondary codes further than this from the best one are dropped
    pub secondary_distance_cutoff: f64,

    /// Maximum number of primary types per profile (1-3)
    pub max_types: usize,

    /// Leave the profile empty instead of writing a low-confidence tiebreak
    pub unknown_on_low_separation: bool,
}

impl Default for ClassificationConfig {
    fn default() -> Self {
        Self {
            min_separation: 4.0,
            secondary_distance_cutoff: 60.0,
            max_types: 3,
            unknown_on_low_separation: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Artists classified concurrently
    pub parallelism: usize,

    /// Pause before each artist, in milliseconds
    pub delay_millis: u64,

    /// Claims older than this are considered abandoned
    pub claim_ttl_seconds: i64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            parallelism: 2,
            delay_millis: 0,
            claim_ttl_seconds: 600,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub metrics_enabled: bool,

    /// Prometheus textfile written after each batch run
    pub metrics_path: Option<String>,

    pub loki_enabled: bool,

    pub loki_url: String,

    pub loki_labels: std::collections::HashMap<String, String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        let mut labels = std::collections::HashMap::new();
        labels.insert("app".to_string(), "sayu-apt".to_string());

        Self {
            metrics_enabled: false,
            metrics_path: None,
            loki_enabled: false,
            loki_url: "http://localhost:3100".to_string(),
            loki_labels: labels,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            collectors: CollectorsConfig::default(),
            classification: ClassificationConfig::default(),
            batch: BatchConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let paths = Self::config_paths();

        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                return Self::load_from_path(path);
            }
        }

        info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![];

        paths.push(PathBuf::from("config.toml"));

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("sayu-apt").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".sayu-apt").join("config.toml"));
        }

        paths
    }

    fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    pub fn create_default_if_missing() -> Result<bool> {
        let path = Self::default_config_path();
        if path.exists() {
            Ok(false)
        } else {
            let config = Self::default();
            config.save_to_path(&path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(1..=3).contains(&self.classification.max_types) {
            anyhow::bail!("classification.max_types must be between 1 and 3");
        }

        if self.classification.min_separation < 0.0 {
            anyhow::bail!("classification.min_separation cannot be negative");
        }

        if self.batch.parallelism == 0 {
            anyhow::bail!("batch.parallelism must be > 0");
        }

        for (name, collector) in self.collector_configs() {
            if !collector.enabled {
                continue;
            }
            if collector.base_url.is_empty() {
                anyhow::bail!("collectors.{name}.base_url cannot be empty when enabled");
            }
            if collector.requests_per_second == 0 {
                anyhow::bail!("collectors.{name}.requests_per_second must be > 0");
            }
            if collector.timeout_seconds == 0 {
                anyhow::bail!("collectors.{name}.timeout_seconds must be > 0");
            }
        }

        let max_parallelism = self.max_parallelism();
        if self.batch.parallelism > max_parallelism {
            anyhow::bail!(
                "batch.parallelism is {} but the collector rate limits serve at most {max_parallelism} \
                 artists within their timeouts",
                self.batch.parallelism
            );
        }

        Ok(())
    }

    /// Largest batch parallelism the enabled collectors can serve without
    /// requests queued on their rate limiter outliving the per-call timeout.
    #[must_use]
    pub fn max_parallelism(&self) -> usize {
        self.collector_configs()
            .into_iter()
            .filter(|(_, collector)| collector.enabled)
            .map(|(name, collector)| {
                let budget =
                    u64::from(collector.requests_per_second).saturating_mul(collector.timeout_seconds);
                budget / self.requests_per_lookup(name)
            })
            .min()
            .map_or(usize::MAX, |max| usize::try_from(max).unwrap_or(usize::MAX))
            .max(1)
    }

    /// Upper bound on HTTP requests one collector makes for a single artist.
    fn requests_per_lookup(&self, source: &str) -> u64 {
        match source {
            // summary, then the "(painter)" and "(artist)" disambiguations
            "wikipedia" => 3,
            "met_museum" => u64::try_from(self.collectors.met_sample_objects)
                .unwrap_or(u64::MAX)
                .saturating_add(1),
            _ => 1,
        }
    }

    #[must_use]
    pub fn collector_configs(&self) -> [(&'static str, &CollectorConfig); 3] {
        [
            ("wikipedia", &self.collectors.wikipedia),
            ("met_museum", &self.collectors.met_museum),
            ("pageviews", &self.collectors.pageviews),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.classification.max_types, 3);
        assert_eq!(config.batch.parallelism, 2);
        assert_eq!(config.collectors.wikipedia.requests_per_second, 1);
        assert_eq!(config.collectors.met_museum.requests_per_second, 5);
        assert_eq!(config.collectors.pageviews.cache_ttl_hours, 24);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[collectors.wikipedia]"));
        assert!(toml_str.contains("[classification]"));
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
            [general]
            log_level = "debug"

            [collectors.met_museum]
            enabled = false

            [batch]
            parallelism = 4
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert!(!config.collectors.met_museum.enabled);
        assert_eq!(config.batch.parallelism, 4);

        assert!(config.collectors.wikipedia.enabled);
        assert_eq!(config.collectors.wikipedia.timeout_seconds, 8);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.classification.max_types = 4;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.collectors.pageviews.requests_per_second = 0;
        assert!(config.validate().is_err());

        config.collectors.pageviews.enabled = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parallelism_is_capped_by_rate_limits() {
        let mut config = Config::default();
        // wikipedia: 1 rps over 8s, three requests per artist
        assert_eq!(config.max_parallelism(), 2);

        config.batch.parallelism = 3;
        assert!(config.validate().is_err());

        config.collectors.wikipedia.requests_per_second = 3;
        // met_museum: 5 rps over 8s, search plus three objects
        assert_eq!(config.max_parallelism(), 8);
        assert!(config.validate().is_ok());

        config.collectors.wikipedia.timeout_seconds = 1;
        config.collectors.pageviews.timeout_seconds = 1;
        assert_eq!(config.max_parallelism(), 1);

        config.collectors.wikipedia.enabled = false;
        config.collectors.met_museum.enabled = false;
        config.collectors.pageviews.enabled = false;
        assert_eq!(config.max_parallelism(), usize::MAX);
    }
}
