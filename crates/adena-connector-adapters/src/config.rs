use std::str::FromStr;
use std::time::Duration;

use adena_connector_core::{DetectPolicy, TargetNetwork};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeProfile {
    Development,
    Production,
}

impl FromStr for RuntimeProfile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dev" | "development" => Ok(Self::Development),
            "prod" | "production" => Ok(Self::Production),
            other => Err(format!("unknown runtime profile: {other}")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConnectorConfig {
    pub runtime_profile: RuntimeProfile,
    pub app_name: String,
    pub chain_id: String,
    pub chain_name: String,
    pub rpc_url: String,
    pub detect_max_attempts: u32,
    pub detect_interval_ms: u64,
    pub provider_bridge_url: Option<String>,
    pub provider_timeout_ms: u64,
    pub toast_max: usize,
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        let target = TargetNetwork::default();
        Self {
            runtime_profile: RuntimeProfile::Development,
            app_name: "Adena".to_owned(),
            chain_id: target.chain_id,
            chain_name: target.chain_name,
            rpc_url: target.rpc_url,
            detect_max_attempts: 6,
            detect_interval_ms: 10,
            provider_bridge_url: None,
            provider_timeout_ms: 15_000,
            toast_max: 3,
        }
    }
}

impl ConnectorConfig {
    /// Defaults overridden by `ADENA_*` variables. Unparseable values fall back to the
    /// default with a warning.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut cfg = Self::default();
        let text = |key: &str| lookup(key).map(|v| v.trim().to_owned()).filter(|v| !v.is_empty());

        if let Some(profile) = text("ADENA_RUNTIME_PROFILE") {
            cfg.runtime_profile = parse_or(&profile, "ADENA_RUNTIME_PROFILE", cfg.runtime_profile);
        }
        if let Some(name) = text("ADENA_APP_NAME") {
            cfg.app_name = name;
        }
        if let Some(chain_id) = text("ADENA_CHAIN_ID") {
            cfg.chain_id = chain_id;
        }
        if let Some(chain_name) = text("ADENA_CHAIN_NAME") {
            cfg.chain_name = chain_name;
        }
        if let Some(rpc_url) = text("ADENA_RPC_URL") {
            cfg.rpc_url = rpc_url;
        }
        if let Some(n) = text("ADENA_DETECT_ATTEMPTS") {
            cfg.detect_max_attempts = parse_or(&n, "ADENA_DETECT_ATTEMPTS", cfg.detect_max_attempts);
        }
        if let Some(ms) = text("ADENA_DETECT_INTERVAL_MS") {
            cfg.detect_interval_ms = parse_or(&ms, "ADENA_DETECT_INTERVAL_MS", cfg.detect_interval_ms);
        }
        cfg.provider_bridge_url = text("ADENA_BRIDGE_URL");
        if let Some(ms) = text("ADENA_BRIDGE_TIMEOUT_MS") {
            cfg.provider_timeout_ms = parse_or(&ms, "ADENA_BRIDGE_TIMEOUT_MS", cfg.provider_timeout_ms);
        }
        cfg
    }

    pub fn strict_runtime_required(&self) -> bool {
        self.runtime_profile == RuntimeProfile::Production
    }

    pub fn detect_policy(&self) -> DetectPolicy {
        DetectPolicy {
            max_attempts: self.detect_max_attempts.max(1),
            interval: Duration::from_millis(self.detect_interval_ms),
        }
    }

    pub fn target_network(&self) -> TargetNetwork {
        TargetNetwork {
            chain_id: self.chain_id.clone(),
            chain_name: self.chain_name.clone(),
            rpc_url: self.rpc_url.clone(),
        }
    }
}

fn parse_or<T>(raw: &str, key: &str, fallback: T) -> T
where
    T: FromStr + Copy,
    T::Err: std::fmt::Display,
{
    match raw.parse() {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(%key, value = %raw, error = %e, "ignoring invalid config value");
            fallback
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_target_portal_loop() {
        let cfg = ConnectorConfig::from_lookup(|_| None);
        assert_eq!(cfg.target_network(), TargetNetwork::default());
        assert_eq!(cfg.detect_policy(), DetectPolicy::default());
        assert!(!cfg.strict_runtime_required());
        assert!(cfg.provider_bridge_url.is_none());
    }

    #[test]
    fn env_overrides_apply() {
        let cfg = ConnectorConfig::from_lookup(lookup(&[
            ("ADENA_RUNTIME_PROFILE", "production"),
            ("ADENA_CHAIN_ID", "test5"),
            ("ADENA_DETECT_ATTEMPTS", "20"),
            ("ADENA_BRIDGE_URL", "http://127.0.0.1:9000/rpc"),
        ]));
        assert!(cfg.strict_runtime_required());
        assert_eq!(cfg.target_network().chain_id, "test5");
        assert_eq!(cfg.detect_policy().max_attempts, 20);
        assert_eq!(
            cfg.provider_bridge_url.as_deref(),
            Some("http://127.0.0.1:9000/rpc")
        );
    }

    #[test]
    fn invalid_values_keep_defaults() {
        let cfg = ConnectorConfig::from_lookup(lookup(&[
            ("ADENA_RUNTIME_PROFILE", "staging"),
            ("ADENA_DETECT_INTERVAL_MS", "soon"),
            ("ADENA_BRIDGE_URL", "   "),
        ]));
        assert_eq!(cfg.runtime_profile, RuntimeProfile::Development);
        assert_eq!(cfg.detect_interval_ms, 10);
        assert!(cfg.provider_bridge_url.is_none());
    }

    #[test]
    fn zero_attempts_still_checks_once() {
        let cfg = ConnectorConfig {
            detect_max_attempts: 0,
            ..ConnectorConfig::default()
        };
        assert_eq!(cfg.detect_policy().max_attempts, 1);
    }
}
