//! Item handles: accessor/mutator objects for one configuration control.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
};

use serde_json::Value;

use crate::event::{Event, HandlerFuture};

/// The kind of control backing a form item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Toggle,
    Input,
    Select,
    Button,
    Text,
}

type Observer = Arc<dyn Fn(Item) -> HandlerFuture + Send + Sync>;

#[derive(Debug)]
struct ItemState {
    value: Value,
    visible: bool,
    enabled: bool,
}

struct ItemInner {
    kind: ItemKind,
    message_key: Option<String>,
    id: Option<String>,
    group: Option<String>,
    state: Mutex<ItemState>,
    observers: Mutex<HashMap<Event, Vec<Observer>>>,
}

/// Handle to one configuration control. Clones share the same state; the
/// form runtime owns the control, consumers read and write through the
/// handle.
#[derive(Clone)]
pub struct Item {
    inner: Arc<ItemInner>,
}

/// Builder for an [`Item`]. Identity (message key, element id, group) is
/// fixed at build time; only value/visibility/enabled state mutates later.
#[derive(Debug)]
pub struct ItemBuilder {
    kind: ItemKind,
    message_key: Option<String>,
    id: Option<String>,
    group: Option<String>,
    value: Value,
}

impl ItemBuilder {
    #[must_use]
    pub fn message_key(mut self, key: impl Into<String>) -> Self {
        self.message_key = Some(key.into());
        self
    }

    #[must_use]
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    #[must_use]
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.value = value.into();
        self
    }

    #[must_use]
    pub fn build(self) -> Item {
        Item {
            inner: Arc::new(ItemInner {
                kind: self.kind,
                message_key: self.message_key,
                id: self.id,
                group: self.group,
                state: Mutex::new(ItemState {
                    value: self.value,
                    visible: true,
                    enabled: true,
                }),
                observers: Mutex::new(HashMap::new()),
            }),
        }
    }
}

impl Item {
    #[must_use]
    pub fn builder(kind: ItemKind) -> ItemBuilder {
        ItemBuilder {
            kind,
            message_key: None,
            id: None,
            group: None,
            value: Value::Null,
        }
    }

    fn state(&self) -> MutexGuard<'_, ItemState> {
        self.inner.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    #[must_use]
    pub fn kind(&self) -> ItemKind {
        self.inner.kind
    }

    #[must_use]
    pub fn message_key(&self) -> Option<&str> {
        self.inner.message_key.as_deref()
    }

    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.inner.id.as_deref()
    }

    #[must_use]
    pub fn group(&self) -> Option<&str> {
        self.inner.group.as_deref()
    }

    // ── Value access ───────────────────────────────────────────────────────

    /// Current value of the control.
    #[must_use]
    pub fn get(&self) -> Value {
        self.state().value.clone()
    }

    pub fn set(&self, value: impl Into<Value>) {
        self.state().value = value.into();
    }

    /// Boolean reading of the value; anything non-boolean reads as `false`.
    #[must_use]
    pub fn is_on(&self) -> bool {
        self.state().value.as_bool().unwrap_or(false)
    }

    /// Text reading of the value; anything non-string reads as empty.
    #[must_use]
    pub fn text(&self) -> String {
        match &self.state().value {
            Value::String(text) => text.clone(),
            _ => String::new(),
        }
    }

    /// Integer reading of the value. Select controls deliver their option
    /// value either as a number or as a numeric string.
    #[must_use]
    pub fn index(&self) -> i64 {
        let state = self.state();
        state
            .value
            .as_i64()
            .or_else(|| state.value.as_str().and_then(|text| text.parse().ok()))
            .unwrap_or(0)
    }

    // ── Visibility and enablement ──────────────────────────────────────────

    pub fn show(&self) {
        self.state().visible = true;
    }

    pub fn hide(&self) {
        self.state().visible = false;
    }

    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.state().visible
    }

    pub fn enable(&self) {
        self.state().enabled = true;
    }

    pub fn disable(&self) {
        self.state().enabled = false;
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.state().enabled
    }

    // ── Observers ──────────────────────────────────────────────────────────

    /// Register an observer for `event`. Observers run in registration order
    /// when the event is triggered.
    pub fn on(
        &self,
        event: Event,
        observer: impl Fn(Item) -> HandlerFuture + Send + Sync + 'static,
    ) {
        let mut observers = self
            .inner
            .observers
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        observers.entry(event).or_default().push(Arc::new(observer));
    }

    /// Dispatch `event` to every observer, awaiting each in registration
    /// order. The observer list is snapshotted before dispatch, so an
    /// observer may trigger further events (including on this item) without
    /// deadlocking.
    pub async fn trigger(&self, event: Event) {
        let observers: Vec<Observer> = {
            let map = self
                .inner
                .observers
                .lock()
                .unwrap_or_else(|e| e.into_inner());
            map.get(&event).cloned().unwrap_or_default()
        };
        tracing::trace!(?event, observers = observers.len(), "dispatching item event");
        for observer in observers {
            observer(self.clone()).await;
        }
    }
}

impl std::fmt::Debug for Item {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Item")
            .field("kind", &self.inner.kind)
            .field("message_key", &self.inner.message_key)
            .field("id", &self.inner.id)
            .field("group", &self.inner.group)
            .field("state", &*self.state())
            .finish()
    }
}
