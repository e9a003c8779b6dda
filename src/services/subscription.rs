use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::persistence::{parse_snapshot, ChangeFeed};
use crate::state::Snapshot;

/// Handle returned by `InventoryStore::subscribe`.
///
/// Dropping the handle leaves the watcher running; call
/// [`Subscription::unsubscribe`] to stop it.
pub struct Subscription {
    task: Option<JoinHandle<()>>,
}

impl Subscription {
    pub(crate) fn noop() -> Self {
        Self { task: None }
    }

    /// Whether change notifications are still being delivered.
    pub fn is_active(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    pub fn unsubscribe(self) {
        if let Some(task) = self.task {
            task.abort();
        }
    }
}

/// Spawn a watcher that hands every foreign write of `key` to `callback`.
pub(crate) fn watch<F>(mut feed: ChangeFeed, key: String, callback: F) -> Subscription
where
    F: Fn(Snapshot) + Send + 'static,
{
    let Ok(runtime) = Handle::try_current() else {
        tracing::warn!("No async runtime available, subscription to {key} is inactive");
        return Subscription::noop();
    };

    let task = runtime.spawn(async move {
        while let Some(event) = feed.next().await {
            if event.key.as_deref() != Some(key.as_str()) {
                continue;
            }
            // Removal of the key carries no snapshot.
            let Some(raw) = event.new_value else {
                continue;
            };
            if let Some(snapshot) = parse_snapshot(&raw, "storage event") {
                callback(snapshot);
            }
        }
        tracing::debug!("Change feed for {key} closed");
    });

    Subscription { task: Some(task) }
}
