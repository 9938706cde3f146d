use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use mathlingo_algo::{AdaptationConfig, CriticalityWeighting};

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub log_level: String,
    pub seed_demo_content: bool,
}

impl Config {
    pub fn from_env() -> Self {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(3000);

        let host = std::env::var("HOST")
            .ok()
            .and_then(|value| value.parse::<IpAddr>().ok())
            .unwrap_or(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)));

        let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        Self {
            host,
            port,
            log_level,
            seed_demo_content: env_flag("SEED_DEMO_CONTENT"),
        }
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

/// Algorithm parameters plus the engine's own knobs.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub adaptation: AdaptationConfig,
    /// Fresh verification hashes tried before certificate issuance gives up
    pub certificate_hash_attempts: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            adaptation: AdaptationConfig::default(),
            certificate_hash_attempts: 5,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();
        let adaptation = &mut config.adaptation;

        if let Some(alpha) = env_parse::<f64>("MASTERY_BASE_ALPHA").filter(|v| *v > 0.0) {
            adaptation.mastery.base_alpha = alpha;
        }
        if let Ok(raw) = std::env::var("MASTERY_CRITICALITY_WEIGHTING") {
            match CriticalityWeighting::parse(&raw) {
                Some(weighting) => adaptation.mastery.weighting = weighting,
                None => tracing::warn!(value = %raw, "unknown criticality weighting, keeping default"),
            }
        }
        if let Some(days) = env_parse::<i64>("INACTIVITY_DAYS").filter(|v| *v >= 0) {
            adaptation.topic_state.inactivity_days = days;
        }
        if let Some(days) = env_parse::<i64>("REVALIDATION_WINDOW_DAYS").filter(|v| *v >= 0) {
            adaptation.topic_state.revalidation_window_days = days;
        }
        if let Some(count) = env_parse::<u32>("REVALIDATION_MIN_CORRECT") {
            adaptation.topic_state.revalidation_min_correct = count;
        }

        if let Err(message) = config.adaptation.validate() {
            tracing::warn!(%message, "invalid engine config from env, using defaults");
            return Self::default();
        }
        config
    }
}

pub fn env_flag(key: &str) -> bool {
    std::env::var(key)
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false)
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse::<T>().ok())
}
