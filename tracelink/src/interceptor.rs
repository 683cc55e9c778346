//! Span interception.
//!
//! Interceptors run over each finished span before it reaches the reporter.
//! Each one can observe the span, hand a mutated span down the chain, or
//! decline to continue, in which case the span is silently discarded. The
//! span type is generic: spans belong to the underlying tracer, and the
//! chain only forwards them.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

/// A pluggable unit that may observe, mutate, or veto a span on its way to
/// the reporter.
///
/// Implementations receive the span together with the rest of the chain and
/// decide whether processing continues:
///
/// * forward — call [`Chain::proceed`], passing the span through (mutated or
///   not);
/// * veto — return without calling it. The remaining interceptors and the
///   terminal action never run, and no error is raised. This is how a
///   sampling interceptor drops a span.
///
/// The chain catches nothing: a panicking interceptor unwinds to whatever
/// finished the span, so implementations are responsible for their own
/// error handling.
pub trait Interceptor<S>: Send + Sync + fmt::Debug {
    /// Process one span. `chain` continues the pass; dropping it without
    /// calling [`Chain::proceed`] halts the pass for this span.
    fn call(&self, span: S, chain: Chain<'_, S>);
}

/// An ordered set of interceptors applied to every finished span.
///
/// The set is configured once and reused; per-pass state lives in the
/// [`Chain`] cursor handed to each interceptor. An empty set is valid and
/// passes every span straight to the terminal action.
pub struct InterceptorChain<S> {
    interceptors: Vec<Arc<dyn Interceptor<S>>>,
}

impl<S> InterceptorChain<S> {
    /// Create a chain over an ordered interceptor list.
    ///
    /// Interceptors are consumed from the tail of the list: the last
    /// interceptor added is the first to run.
    pub fn new(interceptors: Vec<Arc<dyn Interceptor<S>>>) -> Self {
        InterceptorChain { interceptors }
    }

    /// Number of configured interceptors.
    pub fn len(&self) -> usize {
        self.interceptors.len()
    }

    /// Whether the chain has no interceptors.
    pub fn is_empty(&self) -> bool {
        self.interceptors.is_empty()
    }

    /// Run every interceptor against `span`, then invoke `terminal` if none
    /// of them vetoed continuation.
    ///
    /// Each interceptor runs at most once per pass, and `terminal` runs at
    /// most once, only if every interceptor cooperated.
    pub fn intercept<'a, F>(&'a self, span: S, terminal: F)
    where
        F: FnOnce(S) + 'a,
    {
        Chain {
            remaining: &self.interceptors,
            terminal: Box::new(terminal),
        }
        .proceed(span)
    }
}

impl<S> Default for InterceptorChain<S> {
    fn default() -> Self {
        InterceptorChain::new(Vec::new())
    }
}

impl<S> Clone for InterceptorChain<S> {
    fn clone(&self) -> Self {
        InterceptorChain {
            interceptors: self.interceptors.clone(),
        }
    }
}

impl<S> fmt::Debug for InterceptorChain<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterceptorChain")
            .field("interceptors", &self.interceptors)
            .finish()
    }
}

/// The remainder of one interception pass: a cursor over the interceptors
/// still to run, plus the terminal action.
///
/// [`Chain::proceed`] consumes the value, so a continuation can be invoked
/// at most once; dropping it instead is the short-circuit.
pub struct Chain<'a, S> {
    remaining: &'a [Arc<dyn Interceptor<S>>],
    terminal: Box<dyn FnOnce(S) + 'a>,
}

impl<S> Chain<'_, S> {
    /// Continue the pass with `span`.
    ///
    /// Runs the next remaining interceptor, or the terminal action once the
    /// interceptor list is exhausted. The span passed here need not be the
    /// one the interceptor received.
    pub fn proceed(self, span: S) {
        match self.remaining.split_last() {
            None => (self.terminal)(span),
            Some((interceptor, remaining)) => {
                debug!(interceptor = ?interceptor, "intercepting span");
                interceptor.call(
                    span,
                    Chain {
                        remaining,
                        terminal: self.terminal,
                    },
                );
            }
        }
    }
}

impl<S> fmt::Debug for Chain<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chain")
            .field("remaining", &self.remaining)
            .finish_non_exhaustive()
    }
}
