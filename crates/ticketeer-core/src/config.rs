//! Runtime configuration.
//!
//! Loaded from an optional JSON file; every field has a default, so `{}` is a
//! valid config. The CLI applies its flags on top.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::app::builder::{DEFAULT_SHARDS, DEFAULT_TICKETS};
use crate::app::process::DEFAULT_MAX_CLAIMS;
use crate::app::{AdvancePolicy, BasicClaimProcess, PulseReaper, RegistryBuilder, TickCadence};
use crate::impls::{BlockRouter, ModulusRouter};
use crate::ports::Router;
use crate::registry::PulseBoard;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Which router the registry is built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RouterKind {
    #[default]
    Modulus,
    Block { block_size: usize },
}

impl RouterKind {
    pub fn build(self) -> Arc<dyn Router> {
        match self {
            RouterKind::Modulus => Arc::new(ModulusRouter),
            RouterKind::Block { block_size } => Arc::new(BlockRouter::new(block_size)),
        }
    }
}

/// Exponential tick backoff over contended ticks. Absent means fixed cadence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BackoffConfig {
    pub multiplier: f64,
    pub max_delay_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub num_tickets: usize,
    pub num_shards: usize,
    pub max_claims: usize,
    pub tick_delay_ms: u64,
    pub pulse_window_ms: u64,
    pub reaper_interval_ms: u64,
    pub advance: AdvancePolicy,
    pub router: RouterKind,
    pub drivers: usize,
    pub backoff: Option<BackoffConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            num_tickets: DEFAULT_TICKETS,
            num_shards: DEFAULT_SHARDS,
            max_claims: DEFAULT_MAX_CLAIMS,
            tick_delay_ms: millis(TickCadence::DEFAULT_DELAY),
            pulse_window_ms: millis(PulseBoard::DEFAULT_WINDOW),
            reaper_interval_ms: millis(PulseReaper::DEFAULT_INTERVAL),
            advance: AdvancePolicy::default(),
            router: RouterKind::default(),
            drivers: 1,
            backoff: None,
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl AppConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_shards == 0 {
            return Err(ConfigError::Invalid("num_shards must be at least 1".into()));
        }
        if self.drivers == 0 {
            return Err(ConfigError::Invalid("drivers must be at least 1".into()));
        }
        if self.max_claims > self.num_tickets {
            return Err(ConfigError::Invalid(format!(
                "max_claims ({}) exceeds num_tickets ({}); the run would hit an unknown index",
                self.max_claims, self.num_tickets
            )));
        }
        if let Some(backoff) = self.backoff
            && !(backoff.multiplier.is_finite() && backoff.multiplier >= 1.0)
        {
            return Err(ConfigError::Invalid(
                "backoff.multiplier must be a finite number >= 1.0".into(),
            ));
        }
        Ok(())
    }

    pub fn tick_delay(&self) -> Duration {
        Duration::from_millis(self.tick_delay_ms)
    }

    pub fn pulse_window(&self) -> Duration {
        Duration::from_millis(self.pulse_window_ms)
    }

    pub fn reaper_interval(&self) -> Duration {
        Duration::from_millis(self.reaper_interval_ms)
    }

    pub fn cadence(&self) -> TickCadence {
        match self.backoff {
            None => TickCadence::fixed(self.tick_delay()),
            Some(b) => TickCadence::backoff(
                self.tick_delay(),
                b.multiplier,
                Duration::from_millis(b.max_delay_ms),
            ),
        }
    }

    pub fn process(&self) -> BasicClaimProcess {
        BasicClaimProcess::new(self.max_claims, self.advance)
    }

    /// Builder preloaded with sizes, router and pulse window.
    /// Presenter and clock are left to the caller.
    pub fn registry_builder(&self) -> RegistryBuilder {
        RegistryBuilder::new()
            .shards(self.num_shards)
            .tickets(self.num_tickets)
            .router(self.router.build())
            .pulse_window(self.pulse_window())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{SystemClock, UlidGenerator};
    use rstest::rstest;

    #[test]
    fn defaults() {
        let config = AppConfig::default();
        assert_eq!(config.num_tickets, 100);
        assert_eq!(config.num_shards, 10);
        assert_eq!(config.max_claims, 10);
        assert_eq!(config.tick_delay(), Duration::from_secs(1));
        assert_eq!(config.pulse_window(), Duration::from_millis(100));
        assert_eq!(config.advance, AdvancePolicy::Always);
        assert_eq!(config.router, RouterKind::Modulus);
        assert_eq!(config.cadence(), TickCadence::default());
    }

    #[test]
    fn empty_object_is_default() {
        assert_eq!(AppConfig::from_json_str("{}").unwrap(), AppConfig::default());
    }

    #[test]
    fn json_overrides_fields() {
        let config = AppConfig::from_json_str(
            r#"{
                "num_tickets": 40,
                "num_shards": 4,
                "advance": "on_failure",
                "router": {"kind": "block", "block_size": 10},
                "backoff": {"multiplier": 2.0, "max_delay_ms": 8000}
            }"#,
        )
        .unwrap();

        assert_eq!(config.num_tickets, 40);
        assert_eq!(config.max_claims, 10);
        assert_eq!(config.advance, AdvancePolicy::OnFailure);
        assert_eq!(config.router, RouterKind::Block { block_size: 10 });
        assert_eq!(config.cadence().next_delay(2), Duration::from_secs(4));
        assert_eq!(config.process().advance(), AdvancePolicy::OnFailure);

        let registry = config
            .registry_builder()
            .build(&UlidGenerator::new(SystemClock))
            .unwrap();
        assert_eq!(registry.shards()[1].tickets()[0].index(), 10);
    }

    #[rstest]
    #[case::no_shards(r#"{"num_shards": 0}"#)]
    #[case::no_drivers(r#"{"drivers": 0}"#)]
    #[case::too_many_claims(r#"{"num_tickets": 5, "max_claims": 6}"#)]
    #[case::bad_multiplier(r#"{"backoff": {"multiplier": 0.5, "max_delay_ms": 10}}"#)]
    fn invalid_configs_are_rejected(#[case] json: &str) {
        assert!(matches!(
            AppConfig::from_json_str(json),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(
            AppConfig::from_json_str("{ nope"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = AppConfig::from_path("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(err.to_string().contains("not/here.json"));
    }
}
