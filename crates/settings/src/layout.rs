//! Default layout of the settings page.

use tickface_form::{Form, Item, ItemKind, WatchInfo};

use crate::keys;

/// Build the watchface's settings page for `watch_info`.
///
/// Identity and defaults mirror the shipped page markup: the weather section
/// is grouped so its master toggle can show and hide it wholesale, and the
/// Master Key controls are page-local (element ids, no message keys).
#[must_use]
pub fn settings_form(watch_info: WatchInfo) -> Form {
    let items = vec![
        Item::builder(ItemKind::Toggle)
            .message_key(keys::WEATHER_ENABLED)
            .default_value(true)
            .build(),
        Item::builder(ItemKind::Toggle)
            .message_key(keys::WEATHER_USE_GPS)
            .group(keys::WEATHER_GROUP)
            .default_value(true)
            .build(),
        Item::builder(ItemKind::Input)
            .message_key(keys::WEATHER_LOCATION_NAME)
            .group(keys::WEATHER_GROUP)
            .default_value("")
            .build(),
        Item::builder(ItemKind::Select)
            .message_key(keys::WEATHER_PROVIDER)
            .group(keys::WEATHER_GROUP)
            .default_value(0)
            .build(),
        Item::builder(ItemKind::Input)
            .message_key(keys::WEATHER_KEY)
            .group(keys::WEATHER_GROUP)
            .default_value("")
            .build(),
        Item::builder(ItemKind::Input)
            .id(keys::MASTER_KEY_EMAIL)
            .group(keys::WEATHER_GROUP)
            .default_value("")
            .build(),
        Item::builder(ItemKind::Input)
            .id(keys::MASTER_KEY_PIN)
            .group(keys::WEATHER_GROUP)
            .default_value("")
            .build(),
        Item::builder(ItemKind::Button)
            .id(keys::MASTER_KEY_BUTTON)
            .group(keys::WEATHER_GROUP)
            .build(),
        Item::builder(ItemKind::Text)
            .id(keys::MASTER_KEY_TEXT)
            .group(keys::WEATHER_GROUP)
            .default_value("")
            .build(),
        Item::builder(ItemKind::Toggle)
            .message_key(keys::SHOW_STEPS)
            .default_value(true)
            .build(),
        Item::builder(ItemKind::Toggle)
            .message_key(keys::ENABLE_HEALTH)
            .default_value(false)
            .build(),
    ];
    Form::new(watch_info, items)
}
