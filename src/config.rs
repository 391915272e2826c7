use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub growth: GrowthConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
    #[serde(default = "default_max_pool_size")]
    pub max_pool_size: u32,
}

fn default_max_pool_size() -> u32 {
    5
}

#[derive(Debug, Clone, Deserialize)]
pub struct PollingConfig {
    /// Seconds between fleet sweeps. A sweep still in flight skips the next tick.
    #[serde(default = "default_poll_interval_secs")]
    pub interval_secs: u64,
    /// Per-server probe deadline covering connect, exchange and parse.
    #[serde(default = "default_probe_timeout_secs")]
    pub probe_timeout_secs: u64,
    /// How often to log poller totals (servers probed, online, failed) at INFO level.
    #[serde(default = "default_stats_log_interval_secs")]
    pub stats_log_interval_secs: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_poll_interval_secs(),
            probe_timeout_secs: default_probe_timeout_secs(),
            stats_log_interval_secs: default_stats_log_interval_secs(),
        }
    }
}

fn default_poll_interval_secs() -> u64 {
    120
}

fn default_probe_timeout_secs() -> u64 {
    5
}

fn default_stats_log_interval_secs() -> u64 {
    300
}

#[derive(Debug, Clone, Deserialize)]
pub struct GrowthConfig {
    /// Cron expression (local time) for growth recompute. Falls back to
    /// `interval_secs` when unset or unparseable.
    #[serde(default)]
    pub schedule: Option<String>,
    #[serde(default = "default_growth_interval_secs")]
    pub interval_secs: u64,
}

impl Default for GrowthConfig {
    fn default() -> Self {
        Self {
            schedule: None,
            interval_secs: default_growth_interval_secs(),
        }
    }
}

fn default_growth_interval_secs() -> u64 {
    21_600
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        let s = std::fs::read_to_string(&path)?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.server.port > 0,
            "server.port must be between 1 and 65535, got {}",
            self.server.port
        );
        anyhow::ensure!(
            !self.database.path.is_empty(),
            "database.path must be non-empty"
        );
        anyhow::ensure!(
            self.database.max_pool_size > 0,
            "database.max_pool_size must be > 0, got {}",
            self.database.max_pool_size
        );
        anyhow::ensure!(
            self.polling.interval_secs > 0,
            "polling.interval_secs must be > 0, got {}",
            self.polling.interval_secs
        );
        anyhow::ensure!(
            self.polling.probe_timeout_secs > 0,
            "polling.probe_timeout_secs must be > 0, got {}",
            self.polling.probe_timeout_secs
        );
        anyhow::ensure!(
            self.polling.stats_log_interval_secs > 0,
            "polling.stats_log_interval_secs must be > 0, got {}",
            self.polling.stats_log_interval_secs
        );
        anyhow::ensure!(
            self.growth.interval_secs > 0,
            "growth.interval_secs must be > 0, got {}",
            self.growth.interval_secs
        );
        Ok(())
    }
}
