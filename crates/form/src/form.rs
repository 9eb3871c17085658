//! The live settings page: an item registry plus platform metadata and the
//! after-build lifecycle.

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, Ordering},
};

use serde_json::{Map, Value};

use crate::{
    error::{Error, Result},
    event::SetupFuture,
    item::Item,
    watch::WatchInfo,
};

type SetupHandler = Arc<dyn Fn(Form) -> SetupFuture + Send + Sync>;

struct FormInner {
    watch_info: WatchInfo,
    items: Vec<Item>,
    setup: Mutex<Vec<SetupHandler>>,
    built: AtomicBool,
}

/// A built configuration page. Clones share the same page.
#[derive(Clone)]
pub struct Form {
    inner: Arc<FormInner>,
}

impl Form {
    #[must_use]
    pub fn new(watch_info: WatchInfo, items: Vec<Item>) -> Self {
        Self {
            inner: Arc::new(FormInner {
                watch_info,
                items,
                setup: Mutex::new(Vec::new()),
                built: AtomicBool::new(false),
            }),
        }
    }

    #[must_use]
    pub fn watch_info(&self) -> &WatchInfo {
        &self.inner.watch_info
    }

    #[must_use]
    pub fn items(&self) -> &[Item] {
        &self.inner.items
    }

    // ── Item lookup ────────────────────────────────────────────────────────

    /// Find the item bound to a message key. Behavior code treats a miss as
    /// a fatal configuration error, so this returns `Result` rather than
    /// `Option`.
    pub fn item_by_message_key(&self, key: &str) -> Result<Item> {
        self.inner
            .items
            .iter()
            .find(|item| item.message_key() == Some(key))
            .cloned()
            .ok_or_else(|| Error::UnknownMessageKey {
                key: key.to_string(),
            })
    }

    /// Find the item with an element id.
    pub fn item_by_id(&self, id: &str) -> Result<Item> {
        self.inner
            .items
            .iter()
            .find(|item| item.id() == Some(id))
            .cloned()
            .ok_or_else(|| Error::UnknownId { id: id.to_string() })
    }

    /// Every item tagged with a group, in page order. Unknown groups yield
    /// an empty list.
    #[must_use]
    pub fn items_by_group(&self, group: &str) -> Vec<Item> {
        self.inner
            .items
            .iter()
            .filter(|item| item.group() == Some(group))
            .cloned()
            .collect()
    }

    /// Message-keyed snapshot of every keyed item's current value, in the
    /// shape the phone app persists and transmits.
    #[must_use]
    pub fn settings(&self) -> Map<String, Value> {
        let mut settings = Map::new();
        for item in &self.inner.items {
            if let Some(key) = item.message_key() {
                settings.insert(key.to_string(), item.get());
            }
        }
        settings
    }

    // ── Lifecycle ──────────────────────────────────────────────────────────

    /// Register a setup handler to run when the page finishes building.
    pub fn on_after_build(&self, handler: impl Fn(Form) -> SetupFuture + Send + Sync + 'static) {
        let mut setup = self.inner.setup.lock().unwrap_or_else(|e| e.into_inner());
        setup.push(Arc::new(handler));
    }

    /// Fire the one-time "form built" lifecycle event, running setup
    /// handlers in registration order and propagating the first error.
    /// Calls after the first are no-ops.
    pub async fn finish_build(&self) -> Result<()> {
        if self.inner.built.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        let handlers: Vec<SetupHandler> = {
            let setup = self.inner.setup.lock().unwrap_or_else(|e| e.into_inner());
            setup.clone()
        };
        tracing::debug!(
            platform = %self.inner.watch_info.platform,
            handlers = handlers.len(),
            "running after-build setup"
        );
        for handler in handlers {
            handler(self.clone()).await?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for Form {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Form")
            .field("watch_info", &self.inner.watch_info)
            .field("items", &self.inner.items.len())
            .field("built", &self.inner.built.load(Ordering::Relaxed))
            .finish()
    }
}
