//! Buffering and delivery of finished spans.
//!
//! The reporter accumulates finished [`SpanRecord`]s and, on flush, drains
//! them into a [`ReportRequest`] for its [`Transport`]. Its accounting
//! invariant: every record that does not reach the collector — whether it
//! overflowed the buffer or rode a failed report — is counted, and the count
//! is carried as the `spans.dropped` metric of the next successful report.
//! Delivery failures are never surfaced to the caller; reporting must not
//! break the code paths that finish spans.

use std::mem;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{error, warn};

use crate::config::{Config, DEFAULT_MAX_BUFFERED_SPANS};
use crate::transport::{now_micros, InternalMetrics, ReportRequest, Runtime, SpanRecord, Transport};

/// Buffers finished span records and flushes them to a [`Transport`].
///
/// Producers call [`enqueue`](Reporter::enqueue) from whatever thread
/// finishes a span; [`flush`](Reporter::flush) may run concurrently with
/// them, typically on a background timer. Overlapping flushes are
/// serialized.
#[derive(Debug)]
pub struct Reporter<T: Transport> {
    runtime: Runtime,
    max_buffered_spans: usize,
    buffer: Mutex<Vec<SpanRecord>>,
    dropped_spans: AtomicU64,
    /// Start of the current report window. The lock doubles as the flush
    /// serializer.
    window_start: Mutex<u64>,
    transport: Mutex<T>,
}

impl<T: Transport> Reporter<T> {
    /// Start building a reporter that delivers through `transport`.
    pub fn builder(transport: T) -> ReporterBuilder<T> {
        ReporterBuilder {
            transport,
            component_name: String::new(),
            max_buffered_spans: DEFAULT_MAX_BUFFERED_SPANS,
        }
    }

    /// Queue a finished span record for the next flush.
    ///
    /// When the buffer is full the record is dropped and counted instead.
    /// The first drop since the counter was last drained is logged; further
    /// drops only count, to keep a full buffer from flooding the log.
    pub fn enqueue(&self, record: SpanRecord) {
        let mut buffer = lock(&self.buffer);
        if buffer.len() >= self.max_buffered_spans {
            drop(buffer);
            if self.dropped_spans.fetch_add(1, Ordering::Relaxed) == 0 {
                warn!(
                    max_buffered_spans = self.max_buffered_spans,
                    "span buffer full, dropping spans until the next flush"
                );
            }
            return;
        }
        buffer.push(record);
    }

    /// Spans known to be lost since the last successful report.
    pub fn dropped_span_count(&self) -> u64 {
        self.dropped_spans.load(Ordering::Relaxed)
    }

    /// Drain the buffered span records and attempt delivery.
    ///
    /// Never fails. A transport error is logged and the batch re-accounted
    /// as dropped — the captured drop count plus the size of the failed
    /// batch go back into the counter, so the loss surfaces in the next
    /// successful report instead of vanishing. A flush with nothing buffered
    /// does nothing and leaves the report window untouched.
    pub fn flush(&self) {
        // Held for the whole flush; overlapping flushes serialize here.
        let mut window_start = lock(&self.window_start);

        if lock(&self.buffer).is_empty() {
            return;
        }

        let youngest_micros = now_micros();
        let span_records = mem::take(&mut *lock(&self.buffer));
        // Single exchange: increments racing with the reset land either in
        // this report or in the counter for the next one, never both.
        let dropped_spans = self.dropped_spans.swap(0, Ordering::Relaxed);

        let batch_len = span_records.len() as u64;
        let request = ReportRequest {
            runtime: self.runtime.clone(),
            oldest_micros: *window_start,
            youngest_micros,
            span_records,
            internal_metrics: InternalMetrics::dropped_spans(dropped_spans),
        };

        // The next window starts here whether or not delivery succeeds.
        *window_start = youngest_micros;

        if let Err(err) = lock(&self.transport).report(request) {
            error!(error = %err, "failed to send report to collector");
            self.dropped_spans
                .fetch_add(dropped_spans + batch_len, Ordering::Relaxed);
        }
    }

    /// Discard all buffered state and restart the report window.
    ///
    /// For deployments that duplicate process state (pre-fork servers,
    /// worker pools): buffered spans are not meaningful in the copy and
    /// must not be flushed from it.
    pub fn reset(&self) {
        let mut window_start = lock(&self.window_start);
        lock(&self.buffer).clear();
        self.dropped_spans.store(0, Ordering::Relaxed);
        *window_start = now_micros();
    }
}

/// Locks, recovering the guard from a poisoned mutex. A panic on another
/// thread must not take the reporting path down with it.
fn lock<'a, V>(mutex: &'a Mutex<V>) -> MutexGuard<'a, V> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Builder for [`Reporter`].
#[derive(Debug)]
pub struct ReporterBuilder<T: Transport> {
    transport: T,
    component_name: String,
    max_buffered_spans: usize,
}

impl<T: Transport> ReporterBuilder<T> {
    /// Apply the reporter-relevant settings from `config`.
    pub fn with_config(mut self, config: &Config) -> Self {
        self.component_name = config.component_name.clone();
        self.max_buffered_spans = config.max_buffered_spans;
        self
    }

    /// Override the buffer bound.
    pub fn with_max_buffered_spans(mut self, max_buffered_spans: usize) -> Self {
        self.max_buffered_spans = max_buffered_spans;
        self
    }

    /// Build the reporter. The report window opens at build time.
    pub fn build(self) -> Reporter<T> {
        Reporter {
            runtime: Runtime::new(&self.component_name),
            max_buffered_spans: self.max_buffered_spans,
            buffer: Mutex::new(Vec::new()),
            dropped_spans: AtomicU64::new(0),
            window_start: Mutex::new(now_micros()),
            transport: Mutex::new(self.transport),
        }
    }
}
