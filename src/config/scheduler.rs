//! Scheduler configuration structure.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Environment variable for [`SchedulerConfig::cpu_tokens`].
pub const ENV_CPU_TOKENS: &str = "SCHED_CPU_TOKENS";
/// Environment variable for [`SchedulerConfig::time_slice_ticks`].
pub const ENV_TIME_SLICE_TICKS: &str = "SCHED_TIME_SLICE_TICKS";
/// Environment variable for [`SchedulerConfig::tick_interval_ms`].
pub const ENV_TICK_INTERVAL_MS: &str = "SCHED_TICK_INTERVAL_MS";
/// Environment variable for [`SchedulerConfig::max_ticks`]; `0` means unbounded.
pub const ENV_MAX_TICKS: &str = "SCHED_MAX_TICKS";
/// Environment variable for [`SchedulerConfig::idler_period`]; `0` disables the idler.
pub const ENV_IDLER_PERIOD: &str = "SCHED_IDLER_PERIOD";
/// Environment variable for [`SchedulerConfig::audit_capacity`].
pub const ENV_AUDIT_CAPACITY: &str = "SCHED_AUDIT_CAPACITY";

/// Root scheduler configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Number of CPU tokens, i.e. logical threads allowed to run at once.
    pub cpu_tokens: usize,
    /// Timer ticks per time slice.
    pub time_slice_ticks: u64,
    /// Wall-clock period of the timer lane, in milliseconds.
    pub tick_interval_ms: u64,
    /// Stop the timer lane after this many ticks.
    pub max_ticks: Option<u64>,
    /// Alarm period of the background idler; `None` runs no idler.
    pub idler_period: Option<u64>,
    /// Events kept by the in-memory audit sink; `0` disables auditing.
    pub audit_capacity: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            cpu_tokens: 1,
            time_slice_ticks: 3,
            tick_interval_ms: 400,
            max_ticks: None,
            idler_period: Some(5),
            audit_capacity: 0,
        }
    }
}

impl SchedulerConfig {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.cpu_tokens == 0 {
            return Err("cpu_tokens must be greater than 0".into());
        }
        if self.time_slice_ticks == 0 {
            return Err("time_slice_ticks must be greater than 0".into());
        }
        if self.tick_interval_ms == 0 {
            return Err("tick_interval_ms must be greater than 0".into());
        }
        if self.max_ticks == Some(0) {
            return Err("max_ticks must be greater than 0 when set".into());
        }
        if self.idler_period == Some(0) {
            return Err("idler_period must be greater than 0 when set".into());
        }
        Ok(())
    }

    /// Parse scheduler configuration from a JSON string and validate.
    /// Missing fields take their default values.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read configuration from the process environment, after loading a
    /// `.env` file if one exists. Unset variables keep their defaults.
    pub fn from_env() -> Result<Self, String> {
        // A missing .env file is fine.
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from `lookup`, which maps variable names such
    /// as [`ENV_CPU_TOKENS`] to their values.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        if let Some(tokens) = parse_var(&lookup, ENV_CPU_TOKENS)? {
            cfg.cpu_tokens = tokens;
        }
        if let Some(ticks) = parse_var(&lookup, ENV_TIME_SLICE_TICKS)? {
            cfg.time_slice_ticks = ticks;
        }
        if let Some(ms) = parse_var(&lookup, ENV_TICK_INTERVAL_MS)? {
            cfg.tick_interval_ms = ms;
        }
        if let Some(max) = parse_var::<u64, _>(&lookup, ENV_MAX_TICKS)? {
            cfg.max_ticks = (max > 0).then_some(max);
        }
        if let Some(period) = parse_var::<u64, _>(&lookup, ENV_IDLER_PERIOD)? {
            cfg.idler_period = (period > 0).then_some(period);
        }
        if let Some(capacity) = parse_var(&lookup, ENV_AUDIT_CAPACITY)? {
            cfg.audit_capacity = capacity;
        }
        cfg.validate()?;
        Ok(cfg)
    }

    /// Wall-clock period of the timer lane.
    #[must_use]
    pub const fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Set the number of CPU tokens.
    #[must_use]
    pub const fn with_cpu_tokens(mut self, tokens: usize) -> Self {
        self.cpu_tokens = tokens;
        self
    }

    /// Set the number of ticks per time slice.
    #[must_use]
    pub const fn with_time_slice_ticks(mut self, ticks: u64) -> Self {
        self.time_slice_ticks = ticks;
        self
    }

    /// Set the timer lane period in milliseconds.
    #[must_use]
    pub const fn with_tick_interval_ms(mut self, ms: u64) -> Self {
        self.tick_interval_ms = ms;
        self
    }

    /// Bound the timer lane to `max` ticks.
    #[must_use]
    pub const fn with_max_ticks(mut self, max: Option<u64>) -> Self {
        self.max_ticks = max;
        self
    }

    /// Set or disable the background idler.
    #[must_use]
    pub const fn with_idler_period(mut self, period: Option<u64>) -> Self {
        self.idler_period = period;
        self
    }

    /// Keep up to `capacity` audit events in memory.
    #[must_use]
    pub const fn with_audit_capacity(mut self, capacity: usize) -> Self {
        self.audit_capacity = capacity;
        self
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>, String>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse()
                .map_err(|e| format!("{key}=`{raw}` is invalid: {e}"))
        })
        .transpose()
}
