//! Configuration management for ScholarNet services
//!
//! Supports loading configuration from:
//! - Environment variables (prefixed with APP__)
//! - Configuration files (config.toml, config.yaml)
//! - Default values

use crate::errors::{AppError, Result};
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    
    /// Bibliographic provider configuration
    #[serde(default)]
    pub providers: ProvidersConfig,
    
    /// Graph builder limits
    #[serde(default)]
    pub network: NetworkConfig,
    
    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
    
    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,
    
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
    
    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    
    /// Shutdown timeout in seconds
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub semantic_scholar: SemanticScholarConfig,
    
    #[serde(default)]
    pub openalex: OpenAlexConfig,
    
    /// Timeout applied to every outbound provider call
    #[serde(default = "default_call_timeout_ms")]
    pub call_timeout_ms: u64,
    
    /// Retries for 429/5xx responses
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    
    /// Response cache TTL in seconds (0 disables the cache)
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,
    
    /// Maximum cached responses per provider
    #[serde(default = "default_cache_max_entries")]
    pub cache_max_entries: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SemanticScholarConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    
    #[serde(default = "default_semantic_scholar_url")]
    pub base_url: String,
    
    /// Optional partner API key (sent as x-api-key)
    pub api_key: Option<String>,
    
    #[serde(default = "default_semantic_scholar_rps")]
    pub requests_per_second: u32,
    
    /// Works requested per author
    #[serde(default = "default_semantic_scholar_works")]
    pub works_limit: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OpenAlexConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    
    #[serde(default = "default_openalex_url")]
    pub base_url: String,
    
    /// Contact address for the OpenAlex polite pool
    pub mailto: Option<String>,
    
    #[serde(default = "default_openalex_rps")]
    pub requests_per_second: u32,
    
    /// Works requested per author (one page)
    #[serde(default = "default_openalex_works")]
    pub works_limit: usize,
}

/// Bounds for one graph build
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NetworkConfig {
    /// Size hint of the seed node
    #[serde(default = "default_seed_weight")]
    pub seed_weight: f64,
    
    /// Stop reading seed works once more distinct authors than this were found
    #[serde(default = "default_max_discovered_authors")]
    pub max_discovered_authors: usize,
    
    /// Citing works requested per paper
    #[serde(default = "default_citing_works_cap")]
    pub citing_works_cap: usize,
    
    /// Co-authors inspected by the secondary citation pass
    #[serde(default = "default_secondary_top_k")]
    pub secondary_top_k: usize,
    
    /// Works inspected per co-author in the secondary pass
    #[serde(default = "default_secondary_works")]
    pub secondary_works_per_coauthor: usize,
    
    /// Simultaneous provider calls per build
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,
    
    /// Overall deadline for one build in seconds
    #[serde(default = "default_build_deadline")]
    pub build_deadline_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level (debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
    
    /// Enable JSON logging
    #[serde(default = "default_json_logging")]
    pub json_logging: bool,
    
    /// Metrics port (0 to disable)
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,
    
    /// Service name for tracing
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateLimitConfig {
    /// Requests per second (global)
    #[serde(default = "default_rate_limit")]
    pub requests_per_second: u32,
    
    /// Burst capacity
    #[serde(default = "default_burst")]
    pub burst: u32,
    
    /// Enable rate limiting
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

// Default value functions
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }
fn default_request_timeout() -> u64 { 90 }
fn default_shutdown_timeout() -> u64 { 30 }
fn default_call_timeout_ms() -> u64 { 10_000 }
fn default_max_retries() -> u32 { 2 }
fn default_cache_ttl() -> u64 { 300 }
fn default_cache_max_entries() -> usize { 2_048 }
fn default_semantic_scholar_url() -> String { "https://api.semanticscholar.org/graph/v1".to_string() }
fn default_semantic_scholar_rps() -> u32 { 1 }
fn default_semantic_scholar_works() -> usize { 100 }
fn default_openalex_url() -> String { "https://api.openalex.org".to_string() }
fn default_openalex_rps() -> u32 { 10 }
fn default_openalex_works() -> usize { 50 }
fn default_seed_weight() -> f64 { 2.0 }
fn default_max_discovered_authors() -> usize { 25 }
fn default_citing_works_cap() -> usize { 50 }
fn default_secondary_top_k() -> usize { 5 }
fn default_secondary_works() -> usize { 3 }
fn default_max_in_flight() -> usize { 8 }
fn default_build_deadline() -> u64 { 60 }
fn default_log_level() -> String { "info".to_string() }
fn default_json_logging() -> bool { true }
fn default_metrics_port() -> u16 { 9090 }
fn default_service_name() -> String { "scholarnet".to_string() }
fn default_rate_limit() -> u32 { 20 }
fn default_burst() -> u32 { 40 }
fn default_enabled() -> bool { true }

impl AppConfig {
    /// Load configuration from environment and files
    pub fn load() -> std::result::Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());
        
        let config = Config::builder()
            // Load base config file
            .add_source(File::with_name("config/default").required(false))
            
            // Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            
            // Load local overrides
            .add_source(File::with_name("config/local").required(false))
            
            // Load from environment variables with APP__ prefix
            // e.g., APP__NETWORK__MAX_IN_FLIGHT=6
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true)
            )
            
            .build()?;
            
        config.try_deserialize()
    }
    
    /// Load from a specific TOML file
    pub fn from_file(path: &str) -> std::result::Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name(path))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true)
            )
            .build()?;
            
        config.try_deserialize()
    }
    
    /// Get request timeout as Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_secs)
    }
    
    /// Get shutdown timeout as Duration
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.server.shutdown_timeout_secs)
    }
}

impl ProvidersConfig {
    /// Per-call timeout as Duration
    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }
    
    /// Cache TTL as Duration, `None` when caching is disabled
    pub fn cache_ttl(&self) -> Option<Duration> {
        (self.cache_ttl_secs > 0).then(|| Duration::from_secs(self.cache_ttl_secs))
    }
}

impl NetworkConfig {
    /// Build deadline as Duration
    pub fn build_deadline(&self) -> Duration {
        Duration::from_secs(self.build_deadline_secs)
    }
    
    /// Reject limits that would make every build empty or stall it
    pub fn validate(&self) -> Result<()> {
        let zero = [
            ("max_in_flight", self.max_in_flight),
            ("citing_works_cap", self.citing_works_cap),
            ("build_deadline_secs", self.build_deadline_secs as usize),
        ]
        .into_iter()
        .find(|(_, value)| *value == 0);
        
        if let Some((field, _)) = zero {
            return Err(AppError::Configuration {
                message: format!("network.{} must be greater than zero", field),
            });
        }
        
        if !self.seed_weight.is_finite() || self.seed_weight < 1.5 {
            return Err(AppError::Configuration {
                message: "network.seed_weight must be at least 1.5".to_string(),
            });
        }
        
        Ok(())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_secs: default_request_timeout(),
            shutdown_timeout_secs: default_shutdown_timeout(),
        }
    }
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            semantic_scholar: SemanticScholarConfig::default(),
            openalex: OpenAlexConfig::default(),
            call_timeout_ms: default_call_timeout_ms(),
            max_retries: default_max_retries(),
            cache_ttl_secs: default_cache_ttl(),
            cache_max_entries: default_cache_max_entries(),
        }
    }
}

impl Default for SemanticScholarConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            base_url: default_semantic_scholar_url(),
            api_key: None,
            requests_per_second: default_semantic_scholar_rps(),
            works_limit: default_semantic_scholar_works(),
        }
    }
}

impl Default for OpenAlexConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            base_url: default_openalex_url(),
            mailto: None,
            requests_per_second: default_openalex_rps(),
            works_limit: default_openalex_works(),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            seed_weight: default_seed_weight(),
            max_discovered_authors: default_max_discovered_authors(),
            citing_works_cap: default_citing_works_cap(),
            secondary_top_k: default_secondary_top_k(),
            secondary_works_per_coauthor: default_secondary_works(),
            max_in_flight: default_max_in_flight(),
            build_deadline_secs: default_build_deadline(),
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logging: default_json_logging(),
            metrics_port: default_metrics_port(),
            service_name: default_service_name(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_second: default_rate_limit(),
            burst: default_burst(),
            enabled: default_enabled(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    
    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.network.max_discovered_authors, 25);
        assert_eq!(config.network.citing_works_cap, 50);
        assert_eq!(config.providers.call_timeout(), Duration::from_secs(10));
    }
    
    #[test]
    fn test_empty_source_matches_default() {
        let config: AppConfig = Config::builder()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(config.network.secondary_top_k, 5);
        assert_eq!(config.providers.openalex.works_limit, 50);
        assert_eq!(config.providers.semantic_scholar.works_limit, 100);
        assert!(config.rate_limit.enabled);
    }
    
    #[test]
    fn test_network_validation() {
        assert!(NetworkConfig::default().validate().is_ok());
        
        let config = NetworkConfig {
            max_in_flight: 0,
            ..NetworkConfig::default()
        };
        assert!(matches!(config.validate(), Err(AppError::Configuration { .. })));
        
        let config = NetworkConfig {
            seed_weight: 1.0,
            ..NetworkConfig::default()
        };
        assert!(config.validate().is_err());
    }
    
    #[test]
    fn test_cache_can_be_disabled() {
        let config = ProvidersConfig {
            cache_ttl_secs: 0,
            ..ProvidersConfig::default()
        };
        assert!(config.cache_ttl().is_none());
    }
}
