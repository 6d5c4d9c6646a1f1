use serde::{Deserialize, Serialize};

use crate::content_based::ContentConfig;
use crate::hybrid::HybridConfig;
use crate::matrix_factorization::FactorizationConfig;

/// Recommender service configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RecommenderConfig {
    /// HTTP server configuration
    pub server: ServerConfig,

    /// Collaborative filtering model parameters
    pub factorization: FactorizationConfig,

    /// Content similarity parameters
    pub content: ContentConfig,

    /// Hybrid merge parameters
    pub hybrid: HybridConfig,

    /// Result count when a request does not specify one (default: 5)
    pub default_top_n: usize,

    /// Largest result count a request may ask for (default: 100)
    pub max_top_n: usize,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server host
    pub host: String,

    /// Server port (default: 8082)
    pub port: u16,

    /// Worker threads
    pub workers: Option<usize>,

    /// Maximum JSON body size in bytes (default: 8 MiB)
    pub max_payload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8082,
            workers: None,
            max_payload_bytes: 8 * 1024 * 1024,
        }
    }
}

impl Default for RecommenderConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            factorization: FactorizationConfig::default(),
            content: ContentConfig::default(),
            hybrid: HybridConfig::default(),
            default_top_n: 5,
            max_top_n: 100,
        }
    }
}

impl RecommenderConfig {
    /// Load configuration from an optional `config/recommender` file and
    /// `RECOMMENDER__*` environment variables (e.g. `RECOMMENDER__SERVER__PORT`)
    pub fn load() -> anyhow::Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name("config/recommender").required(false))
            .add_source(
                config::Environment::with_prefix("RECOMMENDER")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        self.factorization.validate()?;

        if self.max_top_n == 0 {
            anyhow::bail!("max_top_n must be at least 1");
        }
        if self.default_top_n == 0 || self.default_top_n > self.max_top_n {
            anyhow::bail!(
                "default_top_n must be in 1..={}, got {}",
                self.max_top_n,
                self.default_top_n
            );
        }
        if self.server.max_payload_bytes == 0 {
            anyhow::bail!("server.max_payload_bytes must be positive");
        }

        Ok(())
    }

    /// Resolve a requested result count against the configured default and cap
    pub fn resolve_top_n(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.default_top_n)
            .min(self.max_top_n)
    }
}
