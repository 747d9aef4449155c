//! Builder to construct a [`Kernel`] from configuration.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::SchedulerConfig;
use crate::core::{AuditSink, InMemoryAuditSink, Kernel, SchedulerError, SharedAuditSink};

/// Assembles a kernel from a [`SchedulerConfig`] and optional audit sink.
pub struct KernelBuilder {
    config: SchedulerConfig,
    sink: Option<SharedAuditSink>,
}

impl KernelBuilder {
    /// Start from a copy of `cfg`.
    #[must_use]
    pub fn from_config(cfg: &SchedulerConfig) -> Self {
        Self {
            config: cfg.clone(),
            sink: None,
        }
    }

    /// Send scheduling events to `sink` instead of the in-memory log that
    /// `audit_capacity` would otherwise create.
    #[must_use]
    pub fn with_audit<S: AuditSink + 'static>(mut self, sink: S) -> Self {
        self.sink = Some(Arc::new(Mutex::new(Box::new(sink))));
        self
    }

    /// Validate the configuration, create the kernel and spawn its idler.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::InvalidConfig`] if validation fails, or
    /// [`SchedulerError::Spawn`] if the idler thread cannot be created.
    pub fn build(self) -> Result<Kernel, SchedulerError> {
        self.config
            .validate()
            .map_err(SchedulerError::InvalidConfig)?;

        let (sink, audit_log) = match self.sink {
            Some(sink) => (Some(sink), None),
            None if self.config.audit_capacity > 0 => {
                let log = InMemoryAuditSink::new(self.config.audit_capacity);
                let shared: SharedAuditSink = Arc::new(Mutex::new(Box::new(log.clone())));
                (Some(shared), Some(log))
            }
            None => (None, None),
        };

        let idler_period = self.config.idler_period;
        let kernel = Kernel::assemble(self.config, sink, audit_log);
        if let Some(period) = idler_period {
            // Detached: the idler sleeps on the clock until shutdown.
            drop(kernel.spawn_idler(period)?);
        }
        Ok(kernel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::AuditAction;

    #[test]
    fn test_invalid_config_is_rejected() {
        let cfg = SchedulerConfig::default().with_cpu_tokens(0);
        let err = KernelBuilder::from_config(&cfg).build().unwrap_err();
        assert!(matches!(err, SchedulerError::InvalidConfig(_)));
    }

    #[test]
    fn test_audit_capacity_creates_log() {
        let cfg = SchedulerConfig::default()
            .with_idler_period(None)
            .with_audit_capacity(8);
        let kernel = KernelBuilder::from_config(&cfg).build().unwrap();
        kernel
            .spawn_fn("solo", crate::Priority::LOWEST, |_| {})
            .unwrap()
            .join()
            .unwrap();

        let log = kernel.audit_log().unwrap();
        assert_eq!(log.threads_for(AuditAction::Spawn), vec!["solo".to_string()]);
        assert_eq!(log.threads_for(AuditAction::Exit), vec!["solo".to_string()]);
    }

    #[test]
    fn test_explicit_sink_replaces_log() {
        let cfg = SchedulerConfig::default()
            .with_idler_period(None)
            .with_audit_capacity(8);
        let sink = InMemoryAuditSink::new(8);
        let kernel = KernelBuilder::from_config(&cfg)
            .with_audit(sink.clone())
            .build()
            .unwrap();
        assert!(kernel.audit_log().is_none());

        kernel
            .spawn_fn("solo", crate::Priority::LOWEST, |_| {})
            .unwrap()
            .join()
            .unwrap();
        assert!(!sink.events().is_empty());
    }

    #[test]
    fn test_idler_is_spawned_when_configured() {
        let cfg = SchedulerConfig::default().with_idler_period(Some(5));
        let kernel = KernelBuilder::from_config(&cfg).build().unwrap();
        let deadline = std::time::Instant::now() + std::time::Duration::from_secs(5);
        while kernel.clock().sleepers() == 0 {
            assert!(std::time::Instant::now() < deadline, "idler never slept");
            std::thread::sleep(std::time::Duration::from_millis(1));
        }
        assert_eq!(kernel.clock().next_alarm(), Some(5));
        kernel.shutdown();
    }
}
