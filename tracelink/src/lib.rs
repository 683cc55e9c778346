//! Span interception and batched report delivery for tracing clients.
//!
//! This crate sits between a tracer that finishes spans and the collector
//! that receives them:
//!
//! ```ascii
//!   +--------+ finished span +-------------------+  accepted  +----------+
//!   |        |               |                   |  records   |          |
//!   | Tracer +---------------> Interceptor chain +------------> Reporter |
//!   |        |               |  (mutate / veto)  |            | (buffer) |
//!   +--------+               +-------------------+            +----+-----+
//!                                                                  | flush
//!                                                             +----v-----+
//!                                                             | Transport|
//!                                                             +----------+
//! ```
//!
//! * [`InterceptorChain`] runs an ordered, short-circuitable set of
//!   [`Interceptor`]s over each finished span before it is queued; any
//!   interceptor can mutate the span or veto it entirely.
//! * [`Reporter`] buffers accepted [`SpanRecord`]s and flushes them as a
//!   [`ReportRequest`] to a [`Transport`], counting every span it had to
//!   drop so the loss is visible in the next successful report.
//! * [`Config`] carries collector settings with `TRACELINK_*` environment
//!   overrides; the collector port selects the [`Encryption`] mode.
//!
//! # Example
//!
//! ```
//! use tracelink::{Config, InMemoryTransport, InterceptorChain, Reporter, SpanRecord};
//!
//! let config = Config::builder().with_component_name("checkout").build();
//! let transport = InMemoryTransport::new();
//! let reporter = Reporter::builder(transport.clone())
//!     .with_config(&config)
//!     .build();
//! let chain: InterceptorChain<SpanRecord> = InterceptorChain::default();
//!
//! let mut span = SpanRecord::new("charge-card");
//! span.finish();
//! chain.intercept(span, |record| reporter.enqueue(record));
//! reporter.flush();
//!
//! assert_eq!(transport.get_reports().len(), 1);
//! ```
#![warn(
    future_incompatible,
    missing_debug_implementations,
    missing_docs,
    nonstandard_style,
    rust_2018_idioms,
    unreachable_pub,
    unused
)]
#![cfg_attr(test, deny(warnings))]

mod config;
mod error;
mod in_memory_transport;
mod interceptor;
mod reporter;
mod transport;

pub use config::{Config, ConfigBuilder};
pub use error::TransportError;
pub use in_memory_transport::{InMemoryTransport, InMemoryTransportBuilder};
pub use interceptor::{Chain, Interceptor, InterceptorChain};
pub use reporter::{Reporter, ReporterBuilder};
pub use transport::{
    Encryption, InternalMetrics, MetricCount, ReportRequest, ReportResult, Runtime, SpanRecord,
    Tag, Transport,
};
