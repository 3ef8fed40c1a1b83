//! Ordered fallback fetch strategies
//!
//! Some content has several historical routes. A [`ResolverChain`] tries each
//! strategy in turn and stops at the first one yielding a non-empty list.

use std::future::Future;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;

use crate::api::ApiError;

type Attempt<'a, T> = Box<dyn FnOnce() -> BoxFuture<'a, Result<Vec<T>, ApiError>> + Send + 'a>;

/// Result of a successful chain
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved<T> {
    /// Name of the strategy that succeeded
    pub strategy: &'static str,
    /// Its non-empty result
    pub values: Vec<T>,
}

/// Strategies tried lazily, in insertion order
pub struct ResolverChain<'a, T> {
    attempts: Vec<(&'static str, Attempt<'a, T>)>,
}

impl<T> Default for ResolverChain<'_, T> {
    fn default() -> Self {
        Self { attempts: Vec::new() }
    }
}

impl<'a, T: Send + 'a> ResolverChain<'a, T> {
    /// Create an empty chain
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a strategy
    pub fn then<F, Fut>(mut self, name: &'static str, attempt: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'a,
        Fut: Future<Output = Result<Vec<T>, ApiError>> + Send + 'a,
    {
        self.attempts.push((name, Box::new(move || attempt().boxed())));
        self
    }

    /// Number of strategies
    pub fn len(&self) -> usize {
        self.attempts.len()
    }

    /// Whether the chain has no strategies
    pub fn is_empty(&self) -> bool {
        self.attempts.is_empty()
    }

    /// Run strategies until one returns a non-empty list
    ///
    /// Failures move on to the next strategy. Cancellation stops the chain
    /// and is the only error returned.
    pub async fn resolve(self) -> Result<Option<Resolved<T>>, ApiError> {
        for (strategy, attempt) in self.attempts {
            match attempt().await {
                Ok(values) if !values.is_empty() => {
                    tracing::debug!(strategy, count = values.len(), "Strategy succeeded");
                    return Ok(Some(Resolved { strategy, values }));
                }
                Ok(_) => tracing::debug!(strategy, "Strategy returned nothing"),
                Err(ApiError::Cancelled) => return Err(ApiError::Cancelled),
                Err(e) => tracing::debug!(strategy, error = %e, "Strategy failed"),
            }
        }
        Ok(None)
    }
}
