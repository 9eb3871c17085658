//! Behavior layer for the watchface settings page.
//!
//! Binds reactive show/hide rules between form fields and manages the one
//! Master Key lookup that provisions the weather-provider API key. The page
//! itself (items, persistence, transport to the watch) is the
//! `tickface-form` crate's concern; this crate only reads and writes
//! through item handles.

pub mod controller;
pub mod error;
pub mod keys;
pub mod layout;
pub mod masterkey;
pub mod provider;

pub use {
    controller::SettingsController,
    error::{Error, Result},
    layout::settings_form,
    masterkey::{
        HttpMasterKeyClient, KeyRing, LookupError, MasterKeyClient, SearchResponse, WeatherKeys,
    },
    provider::WeatherProvider,
};
