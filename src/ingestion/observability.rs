use std::fmt;
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::error::{ErrorKind, IngestionError};
use crate::types::DataContainer;

use super::format::IngestionPath;

/// Severity classification used for observer callbacks and alerting thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum IngestionSeverity {
    /// Informational event.
    Info,
    /// Warning-level event (non-fatal).
    Warning,
    /// Error-level event (operation failed).
    Error,
    /// Critical error (transport/file-system failures, missing capabilities).
    Critical,
}

impl IngestionSeverity {
    /// Severity assigned to a failed ingestion.
    pub fn for_error(e: &IngestionError) -> Self {
        match e.kind() {
            ErrorKind::Io | ErrorKind::UnavailableCapability => Self::Critical,
            ErrorKind::Format | ErrorKind::TypeMismatch | ErrorKind::Decode => Self::Error,
        }
    }
}

/// Context about an ingestion attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestionContext {
    /// Remote locator or local file name.
    pub locator: String,
    /// Parser/extractor the source was routed to.
    pub path: IngestionPath,
}

/// Minimal stats reported on successful ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestionStats {
    /// Number of leaf containers in the result.
    pub leaves: usize,
    /// Total number of scalars across all leaves.
    pub values: usize,
}

impl IngestionStats {
    pub fn of(container: &DataContainer) -> Self {
        if container.is_leaf() {
            return Self {
                leaves: 1,
                values: container.len(),
            };
        }
        container
            .children()
            .iter()
            .map(Self::of)
            .fold(Self { leaves: 0, values: 0 }, |acc, s| Self {
                leaves: acc.leaves + s.leaves,
                values: acc.values + s.values,
            })
    }
}

/// Observer interface for ingestion outcomes.
///
/// Implementors can record metrics, logs, or trigger alerts.
pub trait IngestionObserver: Send + Sync {
    /// Called when ingestion succeeds.
    fn on_success(&self, _ctx: &IngestionContext, _stats: IngestionStats) {}

    /// Called when ingestion fails.
    fn on_failure(&self, _ctx: &IngestionContext, _severity: IngestionSeverity, _error: &IngestionError) {}

    /// Called when an ingestion failure meets an alert threshold.
    ///
    /// Default behavior forwards to [`Self::on_failure`].
    fn on_alert(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        self.on_failure(ctx, severity, error)
    }
}

/// An observer that fans out callbacks to a list of observers.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn IngestionObserver>>,
}

impl CompositeObserver {
    pub fn new(observers: Vec<Arc<dyn IngestionObserver>>) -> Self {
        Self { observers }
    }
}

impl fmt::Debug for CompositeObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeObserver")
            .field("observers_len", &self.observers.len())
            .finish()
    }
}

impl IngestionObserver for CompositeObserver {
    fn on_success(&self, ctx: &IngestionContext, stats: IngestionStats) {
        for o in &self.observers {
            o.on_success(ctx, stats);
        }
    }

    fn on_failure(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        for o in &self.observers {
            o.on_failure(ctx, severity, error);
        }
    }

    fn on_alert(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        for o in &self.observers {
            o.on_alert(ctx, severity, error);
        }
    }
}

/// Emits ingestion events as `tracing` events (target `datatree_ingest::ingest`).
#[derive(Debug, Default)]
pub struct TracingObserver;

impl IngestionObserver for TracingObserver {
    fn on_success(&self, ctx: &IngestionContext, stats: IngestionStats) {
        info!(
            target: "datatree_ingest::ingest",
            locator = %ctx.locator,
            path = ?ctx.path,
            leaves = stats.leaves,
            values = stats.values,
            "ingested"
        );
    }

    fn on_failure(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        warn!(
            target: "datatree_ingest::ingest",
            locator = %ctx.locator,
            path = ?ctx.path,
            ?severity,
            kind = %error.kind(),
            %error,
            "ingestion failed"
        );
    }

    fn on_alert(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        error!(
            target: "datatree_ingest::ingest",
            locator = %ctx.locator,
            path = ?ctx.path,
            ?severity,
            kind = %error.kind(),
            %error,
            "ingestion alert"
        );
    }
}
