//! End-to-end tests: interceptor chain feeding a reporter over an in-memory
//! transport, including concurrent producers racing a flusher.

use std::collections::HashSet;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracelink::{
    Chain, Config, InMemoryTransport, Interceptor, InterceptorChain, Reporter, SpanRecord,
};

/// Adds a deployment tag to every span it sees.
#[derive(Debug)]
struct Tagging;

impl Interceptor<SpanRecord> for Tagging {
    fn call(&self, span: SpanRecord, chain: Chain<'_, SpanRecord>) {
        chain.proceed(span.with_tag("deployment", "production"));
    }
}

/// Drops health-check spans instead of forwarding them.
#[derive(Debug)]
struct HealthCheckFilter;

impl Interceptor<SpanRecord> for HealthCheckFilter {
    fn call(&self, span: SpanRecord, chain: Chain<'_, SpanRecord>) {
        if span.span_name == "healthcheck" {
            return;
        }
        chain.proceed(span);
    }
}

#[test]
fn chain_feeds_reporter_and_filters_vetoed_spans() {
    let config = Config::builder().with_component_name("frontend").build();
    let transport = InMemoryTransport::new();
    let reporter = Reporter::builder(transport.clone())
        .with_config(&config)
        .build();
    let chain = InterceptorChain::new(vec![
        Arc::new(Tagging) as Arc<dyn Interceptor<SpanRecord>>,
        Arc::new(HealthCheckFilter),
    ]);

    for name in ["render", "healthcheck", "query"] {
        let mut span = SpanRecord::new(name);
        span.finish();
        chain.intercept(span, |record| reporter.enqueue(record));
    }
    reporter.flush();

    let reports = transport.get_reports();
    assert_eq!(reports.len(), 1);
    let report = &reports[0];
    assert_eq!(report.runtime.group_name, "frontend");

    let names: Vec<_> = report
        .span_records
        .iter()
        .map(|record| record.span_name.as_ref())
        .collect();
    assert_eq!(names, vec!["render", "query"]);
    for record in &report.span_records {
        assert!(record
            .tags
            .iter()
            .any(|tag| tag.key == "deployment" && tag.value == "production"));
    }
    assert_eq!(report.internal_metrics.counts[0].int64_value, 0);
}

#[test]
fn concurrent_enqueue_and_flush_delivers_each_span_exactly_once() {
    const PRODUCERS: usize = 4;
    const SPANS_PER_PRODUCER: usize = 250;

    let transport = InMemoryTransport::new();
    let reporter = Arc::new(
        Reporter::builder(transport.clone())
            .with_max_buffered_spans(PRODUCERS * SPANS_PER_PRODUCER)
            .build(),
    );

    let mut producers = Vec::new();
    for _ in 0..PRODUCERS {
        let reporter = Arc::clone(&reporter);
        producers.push(thread::spawn(move || {
            for _ in 0..SPANS_PER_PRODUCER {
                let mut span = SpanRecord::new("work");
                span.finish();
                reporter.enqueue(span);
            }
        }));
    }

    let flusher = {
        let reporter = Arc::clone(&reporter);
        thread::spawn(move || {
            for _ in 0..20 {
                reporter.flush();
                thread::sleep(Duration::from_millis(1));
            }
        })
    };

    for producer in producers {
        producer.join().expect("producer thread panicked");
    }
    flusher.join().expect("flusher thread panicked");
    reporter.flush();

    let mut seen = HashSet::new();
    let mut delivered = 0usize;
    for report in transport.get_reports() {
        for record in report.span_records {
            delivered += 1;
            assert!(seen.insert(record.span_guid), "span delivered twice");
        }
        assert_eq!(report.internal_metrics.counts[0].int64_value, 0);
    }

    assert_eq!(delivered, PRODUCERS * SPANS_PER_PRODUCER);
    assert_eq!(reporter.dropped_span_count(), 0);
}
