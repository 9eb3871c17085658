//! Settings-form binding framework for the watchface configuration page.
//!
//! Models the page as a registry of typed items addressed by message key,
//! element id, or group, with observer-based change/click dispatch and a
//! one-time after-build lifecycle hook. The behavior layer in
//! `tickface-settings` binds its rules through these handles.

pub mod error;
pub mod event;
pub mod form;
pub mod item;
pub mod watch;

pub use {
    error::{Error, Result},
    event::{Event, HandlerFuture, SetupFuture},
    form::Form,
    item::{Item, ItemBuilder, ItemKind},
    watch::{Platform, WatchInfo},
};
