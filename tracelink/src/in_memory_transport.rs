//! An in-memory transport that stores reports instead of sending them.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::TransportError;
use crate::transport::{ReportRequest, ReportResult, Transport};

/// A [`Transport`] that keeps every delivered report in memory.
///
/// Useful for testing and debugging. Clones share storage, so a clone kept
/// outside the reporter can inspect what was delivered:
///
/// ```
/// use tracelink::{InMemoryTransport, Reporter, SpanRecord};
///
/// let transport = InMemoryTransport::new();
/// let reporter = Reporter::builder(transport.clone()).build();
///
/// reporter.enqueue(SpanRecord::new("say-hello"));
/// reporter.flush();
///
/// assert_eq!(transport.get_reports().len(), 1);
/// ```
#[derive(Clone, Debug, Default)]
pub struct InMemoryTransport {
    reports: Arc<Mutex<Vec<ReportRequest>>>,
    failing: Arc<AtomicBool>,
}

impl InMemoryTransport {
    /// Create a transport that accepts every report.
    pub fn new() -> Self {
        InMemoryTransportBuilder::new().build()
    }

    /// Returns the reports delivered so far.
    pub fn get_reports(&self) -> Vec<ReportRequest> {
        self.reports
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Clears the stored reports.
    pub fn reset(&self) {
        self.reports
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Make subsequent deliveries fail (or succeed again). Shared across
    /// clones, so tests can flip the switch on a handle they kept.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::Relaxed);
    }
}

impl Transport for InMemoryTransport {
    fn report(&mut self, request: ReportRequest) -> ReportResult {
        if self.failing.load(Ordering::Relaxed) {
            return Err(TransportError::Connection(
                "in-memory transport set to fail".to_owned(),
            ));
        }
        self.reports
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request);
        Ok(())
    }
}

/// Builder for [`InMemoryTransport`].
#[derive(Clone, Debug, Default)]
pub struct InMemoryTransportBuilder {
    failing: bool,
}

impl InMemoryTransportBuilder {
    /// Creates a new instance of the builder.
    pub fn new() -> Self {
        InMemoryTransportBuilder::default()
    }

    /// Start the transport in the failing state.
    pub fn with_failing(mut self) -> Self {
        self.failing = true;
        self
    }

    /// Creates a new instance of the transport.
    pub fn build(&self) -> InMemoryTransport {
        InMemoryTransport {
            reports: Arc::new(Mutex::new(Vec::new())),
            failing: Arc::new(AtomicBool::new(self.failing)),
        }
    }
}
