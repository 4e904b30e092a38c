//! Ordered release of session resources.

use std::future::Future;

use futures::future::BoxFuture;
use futures::FutureExt;
use tracing::{debug, warn};

type ReleaseFn = Box<dyn FnOnce() -> BoxFuture<'static, ()> + Send>;

/// Release functions accumulated while acquiring resources, run in reverse
/// order of acquisition.
///
/// Each release function runs at most once. Release functions report their
/// own failures; unwinding never stops halfway.
#[derive(Default)]
pub struct ReleaseStack {
    entries: Vec<(&'static str, ReleaseFn)>,
}

impl ReleaseStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push<F, Fut>(&mut self, resource: &'static str, release: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        debug!(resource, "Registered resource for release");
        self.entries
            .push((resource, Box::new(move || release().boxed())));
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Unwind every registered resource, newest first.
    pub async fn release_all(&mut self) {
        while let Some((resource, release)) = self.entries.pop() {
            debug!(resource, "Releasing resource");
            release().await;
        }
    }
}

impl Drop for ReleaseStack {
    fn drop(&mut self) {
        if self.entries.is_empty() {
            return;
        }
        let entries = std::mem::take(&mut self.entries);
        warn!(
            pending = entries.len(),
            "Browser resources dropped without explicit release"
        );
        // Outside a runtime the captured resources are simply dropped.
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                for (resource, release) in entries.into_iter().rev() {
                    debug!(resource, "Releasing resource");
                    release().await;
                }
            });
        }
    }
}

impl std::fmt::Debug for ReleaseStack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|(resource, _)| resource))
            .finish()
    }
}
