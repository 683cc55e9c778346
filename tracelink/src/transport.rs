//! Report delivery to the collector.
//!
//! [`Transport`] is the seam between the [`Reporter`] and the wire: the
//! reporter builds a [`ReportRequest`] per flush and hands it over, and the
//! transport is expected to be little more than an encoder and transmitter
//! for it. Protocol, connection handling, and retries all live behind the
//! trait.
//!
//! [`Reporter`]: crate::Reporter

use std::borrow::Cow;
use std::fmt::Debug;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

use crate::error::TransportError;

/// Describes the result of a report delivery attempt.
pub type ReportResult = Result<(), TransportError>;

/// Transport security implied by the configured collector port.
///
/// Selecting port 443 implies encrypted transport; any other port implies
/// unencrypted transport. See [`Config::encryption`](crate::Config::encryption).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Encryption {
    /// Encrypted transport, selected by collector port 443.
    Tls,
    /// Unencrypted transport, selected by every other port.
    Plaintext,
}

/// `Transport` defines the interface that protocol-specific collector
/// clients must implement so that they can be plugged into the reporter.
///
/// `report` is never called concurrently for the same transport instance;
/// the reporter serializes its flushes. A failed delivery is final from the
/// caller's point of view — the reporter does not retry, it only accounts
/// for the loss — so any retry logic a deployment needs is the transport's
/// own responsibility.
pub trait Transport: Send + Sync + Debug {
    /// Deliver one report to the collector.
    ///
    /// The request is consumed; whatever the transport does not manage to
    /// deliver is gone.
    fn report(&mut self, request: ReportRequest) -> ReportResult;
}

/// A key/value annotation attached to a span or to the reporting runtime.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Tag {
    /// Tag key.
    pub key: Cow<'static, str>,
    /// Tag value.
    pub value: String,
}

impl Tag {
    /// Create a new tag.
    pub fn new(key: impl Into<Cow<'static, str>>, value: impl Into<String>) -> Self {
        Tag {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// The finalized, immutable representation of a completed span, queued for
/// transmission.
///
/// Records are what interceptors see and what the reporter buffers; once a
/// record is enqueued nothing in this crate mutates it again.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SpanRecord {
    /// Globally unique span id.
    pub span_guid: String,
    /// Id of the trace this span belongs to.
    pub trace_guid: String,
    /// Operation name.
    pub span_name: Cow<'static, str>,
    /// Span start, in microseconds since the Unix epoch.
    pub oldest_micros: u64,
    /// Span end, in microseconds since the Unix epoch.
    pub youngest_micros: u64,
    /// Span annotations.
    pub tags: Vec<Tag>,
    /// Whether the operation ended in error.
    pub error_flag: bool,
}

impl SpanRecord {
    /// Create a record for the named operation, stamped with the current
    /// time and fresh span/trace ids.
    pub fn new(span_name: impl Into<Cow<'static, str>>) -> Self {
        let now = now_micros();
        SpanRecord {
            span_guid: generate_guid(),
            trace_guid: generate_guid(),
            span_name: span_name.into(),
            oldest_micros: now,
            youngest_micros: now,
            tags: Vec::new(),
            error_flag: false,
        }
    }

    /// Attach the record to an existing trace.
    pub fn with_trace_guid(mut self, trace_guid: impl Into<String>) -> Self {
        self.trace_guid = trace_guid.into();
        self
    }

    /// Add a tag.
    pub fn with_tag(mut self, key: impl Into<Cow<'static, str>>, value: impl Into<String>) -> Self {
        self.tags.push(Tag::new(key, value));
        self
    }

    /// Stamp the end time.
    pub fn finish(&mut self) {
        self.youngest_micros = now_micros();
    }
}

/// Metadata describing the reporting process, sent with every report.
#[derive(Clone, Debug, Serialize)]
pub struct Runtime {
    /// Unique id for this reporter instance.
    pub guid: String,
    /// Reporter start time, in microseconds since the Unix epoch.
    pub start_micros: u64,
    /// Component name, from configuration.
    pub group_name: String,
    /// Platform and version attributes.
    pub attrs: Vec<Tag>,
}

impl Runtime {
    /// Runtime metadata for this process, named per configuration.
    pub fn new(component_name: &str) -> Self {
        Runtime {
            guid: generate_guid(),
            start_micros: now_micros(),
            group_name: component_name.to_owned(),
            attrs: vec![
                Tag::new("tracer_platform", "rust"),
                Tag::new("tracer_version", env!("CARGO_PKG_VERSION")),
            ],
        }
    }
}

/// A single named counter in a report's internal metrics.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MetricCount {
    /// Metric name.
    pub name: Cow<'static, str>,
    /// Counter value.
    pub int64_value: i64,
}

/// Client-side metrics attached to a report.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct InternalMetrics {
    /// Counter metrics.
    pub counts: Vec<MetricCount>,
}

impl InternalMetrics {
    /// Metrics block carrying the number of spans dropped since the previous
    /// successful report.
    pub fn dropped_spans(count: u64) -> Self {
        InternalMetrics {
            counts: vec![MetricCount {
                name: Cow::Borrowed("spans.dropped"),
                int64_value: count as i64,
            }],
        }
    }
}

/// One flush worth of data: runtime metadata, the report time window, the
/// drained span records, and the client-side metrics.
///
/// Built once per flush and consumed exactly once by [`Transport::report`].
#[derive(Clone, Debug, Serialize)]
pub struct ReportRequest {
    /// Reporting process metadata.
    pub runtime: Runtime,
    /// Start of the report window, in microseconds since the Unix epoch.
    pub oldest_micros: u64,
    /// End of the report window, in microseconds since the Unix epoch.
    pub youngest_micros: u64,
    /// The span records in this batch.
    pub span_records: Vec<SpanRecord>,
    /// Client-side metrics, currently the dropped-span count.
    pub internal_metrics: InternalMetrics,
}

/// Current time in microseconds since the Unix epoch.
pub(crate) fn now_micros() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_micros() as u64)
        .unwrap_or(0)
}

/// 64-bit hex guid, the id format the collector expects.
pub(crate) fn generate_guid() -> String {
    format!("{:016x}", rand::random::<u64>())
}
