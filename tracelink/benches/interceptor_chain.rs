use criterion::{criterion_group, criterion_main, Criterion};
use std::sync::Arc;
use tracelink::{Chain, Interceptor, InterceptorChain, SpanRecord};

#[derive(Debug)]
struct PassThrough;

impl Interceptor<SpanRecord> for PassThrough {
    fn call(&self, span: SpanRecord, chain: Chain<'_, SpanRecord>) {
        chain.proceed(span);
    }
}

fn criterion_benchmark(c: &mut Criterion) {
    for depth in [1usize, 4, 16] {
        let chain = InterceptorChain::new(
            (0..depth)
                .map(|_| Arc::new(PassThrough) as Arc<dyn Interceptor<SpanRecord>>)
                .collect(),
        );
        c.bench_function(&format!("interceptor_chain_pass/{depth}"), |b| {
            b.iter(|| {
                let span = SpanRecord::new("bench");
                let mut delivered = false;
                chain.intercept(span, |_| delivered = true);
                assert!(delivered);
            })
        });
    }
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
