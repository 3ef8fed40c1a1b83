//! Background module loads
//!
//! Every navigation gets a generation number and its own cancellation
//! token. Starting a new navigation cancels the previous one, and results
//! tagged with an older generation are discarded on arrival.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::course::{LoadError, ModuleLoader, ModuleView};

/// Outcome of one navigation
#[derive(Debug)]
pub enum LoadEvent {
    Loaded { generation: u64, view: ModuleView },
    Failed { generation: u64, error: LoadError },
}

impl LoadEvent {
    /// Navigation this event belongs to
    pub fn generation(&self) -> u64 {
        match self {
            LoadEvent::Loaded { generation, .. } | LoadEvent::Failed { generation, .. } => {
                *generation
            }
        }
    }
}

/// Where to navigate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub course_id: String,
    pub module_id: String,
    pub student_id: Option<String>,
}

/// Spawns loads and hands back only current results
pub struct Navigator {
    loader: ModuleLoader,
    generation: u64,
    cancel: CancellationToken,
    tx: mpsc::UnboundedSender<LoadEvent>,
    rx: mpsc::UnboundedReceiver<LoadEvent>,
}

impl Navigator {
    pub fn new(loader: ModuleLoader) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { loader, generation: 0, cancel: CancellationToken::new(), tx, rx }
    }

    /// Current generation
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Cancel any load in flight and start loading `target`
    pub fn navigate(&mut self, target: Target) -> u64 {
        self.cancel.cancel();
        self.cancel = CancellationToken::new();
        self.generation += 1;

        let generation = self.generation;
        let cancel = self.cancel.clone();
        let loader = self.loader.clone();
        let tx = self.tx.clone();

        tracing::debug!(generation, module_id = %target.module_id, "Navigating");

        tokio::spawn(async move {
            let result = loader
                .load_view(
                    &target.course_id,
                    &target.module_id,
                    target.student_id.as_deref(),
                    &cancel,
                )
                .await;

            let event = match result {
                Ok(view) => LoadEvent::Loaded { generation, view },
                Err(e) if e.is_cancelled() => {
                    tracing::debug!(generation, "Navigation cancelled");
                    return;
                }
                Err(error) => LoadEvent::Failed { generation, error },
            };
            // The receiver is gone only when the app is shutting down
            let _ = tx.send(event);
        });

        generation
    }

    /// Cancel the load in flight, if any
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    fn is_current(&self, event: &LoadEvent) -> bool {
        let current = event.generation() == self.generation;
        if !current {
            tracing::debug!(
                stale = event.generation(),
                current = self.generation,
                "Dropping stale load result"
            );
        }
        current
    }

    /// Next current event without waiting
    pub fn try_next(&mut self) -> Option<LoadEvent> {
        while let Ok(event) = self.rx.try_recv() {
            if self.is_current(&event) {
                return Some(event);
            }
        }
        None
    }

    /// Wait for the next current event
    ///
    /// Returns `None` once the current navigation is cancelled, since a
    /// cancelled load never reports back.
    pub async fn next(&mut self) -> Option<LoadEvent> {
        let current = self.generation;
        let cancel = self.cancel.clone();
        loop {
            tokio::select! {
                biased;
                event = self.rx.recv() => {
                    let event = event?;
                    if event.generation() == current {
                        return Some(event);
                    }
                    tracing::debug!(stale = event.generation(), current, "Dropping stale load result");
                }
                _ = cancel.cancelled() => return None,
            }
        }
    }
}

impl Drop for Navigator {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::api::{ApiError, Route};
    use crate::course::loader::tests::{FakeApi, sample_api};

    fn target(module_id: &str) -> Target {
        Target { course_id: "c1".into(), module_id: module_id.into(), student_id: None }
    }

    #[tokio::test]
    async fn delivers_loaded_module() {
        let mut navigator = Navigator::new(ModuleLoader::new(Arc::new(sample_api())));
        let generation = navigator.navigate(target("m1"));

        match navigator.next().await {
            Some(LoadEvent::Loaded { generation: g, view }) => {
                assert_eq!(g, generation);
                assert_eq!(view.module.id.as_deref(), Some("m1"));
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn delivers_failures() {
        let api = FakeApi::default().fail(Route::Module("m9".into()), 503);
        let mut navigator = Navigator::new(ModuleLoader::new(Arc::new(api)));
        navigator.navigate(target("m9"));

        match navigator.next().await {
            Some(LoadEvent::Failed { error, .. }) => {
                assert!(error.is_retryable());
                assert!(matches!(error, LoadError::Api(ApiError::Http { status: 503, .. })));
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn stale_results_are_dropped() {
        let mut navigator = Navigator::new(ModuleLoader::new(Arc::new(sample_api())));
        navigator.navigate(target("m1"));
        let latest = navigator.navigate(target("missing"));

        let event = navigator.next().await.unwrap();
        assert_eq!(event.generation(), latest);
        assert!(matches!(event, LoadEvent::Failed { .. }));
    }

    #[tokio::test]
    async fn waiting_ends_when_navigation_is_cancelled() {
        let mut navigator = Navigator::new(ModuleLoader::new(Arc::new(sample_api())));
        navigator.navigate(target("m1"));
        navigator.cancel();

        let waited = tokio::time::timeout(std::time::Duration::from_secs(5), navigator.next()).await;
        assert!(matches!(waited, Ok(None)));
    }

    #[tokio::test]
    async fn waiting_with_nothing_in_flight_ends_after_cancel() {
        let mut navigator = Navigator::new(ModuleLoader::new(Arc::new(FakeApi::default())));
        navigator.cancel();
        assert!(navigator.next().await.is_none());
    }

    #[tokio::test]
    async fn stale_events_in_the_queue_are_skipped() {
        let mut navigator = Navigator::new(ModuleLoader::new(Arc::new(FakeApi::default())));
        navigator.generation = 3;
        navigator
            .tx
            .send(LoadEvent::Failed { generation: 2, error: LoadError::NotLoggedIn })
            .unwrap();
        navigator
            .tx
            .send(LoadEvent::Failed { generation: 3, error: LoadError::NotLoggedIn })
            .unwrap();

        assert_eq!(navigator.try_next().map(|e| e.generation()), Some(3));
        assert!(navigator.try_next().is_none());
    }
}
