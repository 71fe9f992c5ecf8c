use serde::Deserialize;

/// Root application configuration. Loaded from environment variables
/// with the prefix `INFLUENCER_ENGINE__` and an optional TOML file.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_node_id")]
    pub node_id: String,
    #[serde(default)]
    pub text_generation: TextGenerationConfig,
    #[serde(default)]
    pub discovery: DiscoveryConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub notifications: NotificationConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TextGenerationConfig {
    #[serde(default = "default_textgen_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_textgen_model")]
    pub model: String,
    #[serde(default = "default_textgen_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_textgen_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_textgen_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
    #[serde(default = "default_analysis_max_tokens")]
    pub analysis_max_tokens: u32,
    #[serde(default = "default_report_max_tokens")]
    pub report_max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiscoveryConfig {
    #[serde(default = "default_max_search_results")]
    pub max_search_results: usize,
    #[serde(default = "default_recent_sample_limit")]
    pub recent_sample_limit: usize,
    #[serde(default = "default_recommendation_count")]
    pub default_recommendation_count: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default = "default_scheduler_enabled")]
    pub enabled: bool,
    #[serde(default = "default_batch_limit")]
    pub batch_limit: usize,
    #[serde(default = "default_batch_concurrency")]
    pub batch_concurrency: usize,
    #[serde(default = "default_daily_interval_secs")]
    pub metrics_refresh_interval_secs: u64,
    #[serde(default = "default_daily_interval_secs")]
    pub performance_tracking_interval_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotificationConfig {
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_host")]
    pub host: String,
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

// Default functions
fn default_node_id() -> String {
    "engine-01".to_string()
}
fn default_textgen_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_textgen_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_textgen_timeout_secs() -> u64 {
    60
}
fn default_textgen_max_retries() -> u32 {
    2
}
fn default_textgen_retry_backoff_ms() -> u64 {
    500
}
fn default_analysis_max_tokens() -> u32 {
    1000
}
fn default_report_max_tokens() -> u32 {
    1500
}
fn default_temperature() -> f32 {
    0.3
}
fn default_max_search_results() -> usize {
    50
}
fn default_recent_sample_limit() -> usize {
    20
}
fn default_recommendation_count() -> usize {
    10
}
fn default_scheduler_enabled() -> bool {
    true
}
fn default_batch_limit() -> usize {
    100
}
fn default_batch_concurrency() -> usize {
    8
}
fn default_daily_interval_secs() -> u64 {
    86_400
}
fn default_channel_capacity() -> usize {
    10_000
}
fn default_metrics_host() -> String {
    "0.0.0.0".to_string()
}
fn default_metrics_port() -> u16 {
    9091
}

impl Default for TextGenerationConfig {
    fn default() -> Self {
        Self {
            base_url: default_textgen_base_url(),
            api_key: String::new(),
            model: default_textgen_model(),
            timeout_secs: default_textgen_timeout_secs(),
            max_retries: default_textgen_max_retries(),
            retry_backoff_ms: default_textgen_retry_backoff_ms(),
            analysis_max_tokens: default_analysis_max_tokens(),
            report_max_tokens: default_report_max_tokens(),
            temperature: default_temperature(),
        }
    }
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            max_search_results: default_max_search_results(),
            recent_sample_limit: default_recent_sample_limit(),
            default_recommendation_count: default_recommendation_count(),
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: default_scheduler_enabled(),
            batch_limit: default_batch_limit(),
            batch_concurrency: default_batch_concurrency(),
            metrics_refresh_interval_secs: default_daily_interval_secs(),
            performance_tracking_interval_secs: default_daily_interval_secs(),
        }
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            host: default_metrics_host(),
            port: default_metrics_port(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            node_id: default_node_id(),
            text_generation: TextGenerationConfig::default(),
            discovery: DiscoveryConfig::default(),
            scheduler: SchedulerConfig::default(),
            notifications: NotificationConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables and an optional config file.
    /// Environment values win over the file.
    pub fn load(file: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(path) = file {
            builder = builder.add_source(config::File::with_name(path).required(true));
        }
        let builder = builder.add_source(
            config::Environment::with_prefix("INFLUENCER_ENGINE")
                .separator("__")
                .try_parsing(true)
                .list_separator(","),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }
}
