//! Per-source outcome reporting.
//!
//! Every reader that takes [`ExtractOptions`](super::ExtractOptions) reports what happened to
//! the configured [`ExtractObserver`]: one success or failure per source (per entry, for
//! archives). Failures at or above `alert_at_or_above` are additionally raised as alerts.

use std::fmt;
use std::sync::Arc;

use crate::error::ExtractError;

use super::unified::{EntryErrorPolicy, SourceFormat};

/// How bad a failed extraction is. Ordered, so it can be compared against a threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ExtractSeverity {
    /// One archive entry failed but the read carried on ([`EntryErrorPolicy::Collect`]).
    Warning,
    /// The source could not be extracted (bad content, missing sheet, missing field).
    Error,
    /// Infrastructure failure (local disk, network).
    Critical,
}

impl ExtractSeverity {
    /// Severity of a failed extraction, derived from the error kind.
    pub fn for_error(e: &ExtractError) -> Self {
        match e {
            ExtractError::LocalFile { .. } | ExtractError::Transport { .. } => Self::Critical,
            ExtractError::Entry { source, .. } => Self::for_error(source),
            ExtractError::FormFieldMissing { .. }
            | ExtractError::RequestBuild { .. }
            | ExtractError::UnexpectedStatus { .. }
            | ExtractError::ArchiveOpen { .. }
            | ExtractError::Decode { .. }
            | ExtractError::SheetNotFound { .. }
            | ExtractError::OpenSpreadsheet { .. } => Self::Error,
        }
    }

    /// Severity of a failed archive entry. Under [`EntryErrorPolicy::Collect`] the archive read
    /// continues, so the entry failure is only a warning.
    pub fn for_entry(e: &ExtractError, policy: EntryErrorPolicy) -> Self {
        match policy {
            EntryErrorPolicy::FailFast => Self::for_error(e),
            EntryErrorPolicy::Collect => Self::Warning,
        }
    }
}

/// The source an outcome refers to.
#[derive(Debug, Clone)]
pub struct ExtractContext {
    /// Path, URL, upload file name or archive entry name.
    pub source: String,
    /// Format used, when known.
    pub format: Option<SourceFormat>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractStats {
    /// Rows extracted. For a fetched archive, the sum over all decoded entries.
    pub rows: usize,
}

/// Receives extraction outcomes. All methods default to doing nothing, except
/// [`on_alert`](ExtractObserver::on_alert), which falls back to `on_failure`.
pub trait ExtractObserver: Send + Sync {
    fn on_success(&self, _ctx: &ExtractContext, _stats: ExtractStats) {}

    fn on_failure(&self, _ctx: &ExtractContext, _severity: ExtractSeverity, _error: &ExtractError) {}

    /// Raised after `on_failure` when `severity` reaches the configured alert threshold.
    fn on_alert(&self, ctx: &ExtractContext, severity: ExtractSeverity, error: &ExtractError) {
        self.on_failure(ctx, severity, error)
    }
}

/// Forwards every callback to each wrapped observer, in order.
#[derive(Clone, Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn ExtractObserver>>,
}

impl CompositeObserver {
    pub fn new(observers: Vec<Arc<dyn ExtractObserver>>) -> Self {
        Self { observers }
    }

    /// Append one more observer.
    pub fn with(mut self, observer: Arc<dyn ExtractObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    fn each(&self, f: impl Fn(&dyn ExtractObserver)) {
        self.observers.iter().for_each(|o| f(o.as_ref()));
    }
}

impl FromIterator<Arc<dyn ExtractObserver>> for CompositeObserver {
    fn from_iter<I: IntoIterator<Item = Arc<dyn ExtractObserver>>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl fmt::Debug for CompositeObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CompositeObserver").field(&self.len()).finish()
    }
}

impl ExtractObserver for CompositeObserver {
    fn on_success(&self, ctx: &ExtractContext, stats: ExtractStats) {
        self.each(|o| o.on_success(ctx, stats));
    }

    fn on_failure(&self, ctx: &ExtractContext, severity: ExtractSeverity, error: &ExtractError) {
        self.each(|o| o.on_failure(ctx, severity, error));
    }

    fn on_alert(&self, ctx: &ExtractContext, severity: ExtractSeverity, error: &ExtractError) {
        self.each(|o| o.on_alert(ctx, severity, error));
    }
}

/// Emits extraction events as `tracing` events under the `extract` target.
#[derive(Debug, Default)]
pub struct TracingObserver;

impl ExtractObserver for TracingObserver {
    fn on_success(&self, ctx: &ExtractContext, stats: ExtractStats) {
        tracing::info!(
            target: "extract",
            source = %ctx.source,
            format = ?ctx.format,
            rows = stats.rows,
            "extracted"
        );
    }

    fn on_failure(&self, ctx: &ExtractContext, severity: ExtractSeverity, error: &ExtractError) {
        tracing::warn!(
            target: "extract",
            source = %ctx.source,
            format = ?ctx.format,
            ?severity,
            stage = error.stage(),
            %error,
            "extraction failed"
        );
    }

    fn on_alert(&self, ctx: &ExtractContext, severity: ExtractSeverity, error: &ExtractError) {
        tracing::error!(
            target: "extract",
            source = %ctx.source,
            format = ?ctx.format,
            ?severity,
            stage = error.stage(),
            %error,
            "ALERT: extraction failed"
        );
    }
}
