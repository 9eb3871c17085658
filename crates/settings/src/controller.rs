//! The settings behavior controller: conditional visibility rules between
//! fields, plus the Master Key provisioning flow behind the "Get API key"
//! button.

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, info, warn};

use tickface_form::{Event, Form, Item, Platform};

use crate::{
    error::Result,
    keys,
    masterkey::{HttpMasterKeyClient, MasterKeyClient, SearchResponse},
    provider::WeatherProvider,
};

/// Status text shown after a successful provisioning.
const STATUS_SUCCESS: &str = "Success";

/// Wires the page's reactive behavior. Construct once, [`attach`] to a
/// form, and the rules bind when the page finishes building.
///
/// [`attach`]: SettingsController::attach
pub struct SettingsController {
    client: Arc<dyn MasterKeyClient>,
}

impl SettingsController {
    #[must_use]
    pub fn new(client: Arc<dyn MasterKeyClient>) -> Self {
        Self { client }
    }

    /// Register this controller on the page's after-build event.
    pub fn attach(self: &Arc<Self>, form: &Form) {
        let controller = Arc::clone(self);
        form.on_after_build(move |form| {
            let controller = Arc::clone(&controller);
            Box::pin(async move {
                controller
                    .initialize(&form)
                    .await
                    .map_err(|error| tickface_form::Error::message(error.to_string()))
            })
        });
    }

    /// Bind every rule. A missing field handle is a fatal configuration
    /// error and aborts the build.
    pub async fn initialize(&self, form: &Form) -> Result<()> {
        if form.watch_info().platform != Platform::Aplite {
            bind_hides_when_on(form, keys::WEATHER_USE_GPS, keys::WEATHER_LOCATION_NAME).await?;
            bind_hides_when_on(form, keys::SHOW_STEPS, keys::ENABLE_HEALTH).await?;
        }
        bind_weather_section(form).await?;
        self.bind_master_key(form)?;
        debug!(platform = %form.watch_info().platform, "settings behavior bound");
        Ok(())
    }

    fn bind_master_key(&self, form: &Form) -> Result<()> {
        let panel = Arc::new(MasterKeyPanel {
            client: Arc::clone(&self.client),
            provider: form.item_by_message_key(keys::WEATHER_PROVIDER)?,
            weather_key: form.item_by_message_key(keys::WEATHER_KEY)?,
            email: form.item_by_id(keys::MASTER_KEY_EMAIL)?,
            pin: form.item_by_id(keys::MASTER_KEY_PIN)?,
            button: form.item_by_id(keys::MASTER_KEY_BUTTON)?,
            status: form.item_by_id(keys::MASTER_KEY_TEXT)?,
            state: Mutex::new(ProvisioningState::default()),
        });

        panel.status.hide();

        let click_panel = Arc::clone(&panel);
        panel.button.on(Event::Click, move |_| {
            let panel = Arc::clone(&click_panel);
            Box::pin(async move { panel.handle_click().await })
        });

        let change_panel = Arc::clone(&panel);
        panel.provider.on(Event::Change, move |_| {
            let panel = Arc::clone(&change_panel);
            Box::pin(async move {
                panel.apply_cached_key();
            })
        });

        Ok(())
    }
}

impl Default for SettingsController {
    fn default() -> Self {
        Self::new(Arc::new(HttpMasterKeyClient::new()))
    }
}

// ── Visibility rules ───────────────────────────────────────────────────────

/// Make `target` visible exactly when `toggle` is off, now and on every
/// change.
async fn bind_hides_when_on(form: &Form, toggle_key: &str, target_key: &str) -> Result<()> {
    let toggle = form.item_by_message_key(toggle_key)?;
    let target = form.item_by_message_key(target_key)?;

    toggle.on(Event::Change, move |toggle| {
        let target = target.clone();
        Box::pin(async move {
            if toggle.is_on() {
                target.hide();
            } else {
                target.show();
            }
        })
    });
    toggle.trigger(Event::Change).await;
    Ok(())
}

/// Show or hide the whole weather group with its master toggle, and force
/// the GPS rule to re-evaluate so the location field stays consistent when
/// the section reappears.
async fn bind_weather_section(form: &Form) -> Result<()> {
    let enabled = form.item_by_message_key(keys::WEATHER_ENABLED)?;
    let gps = form.item_by_message_key(keys::WEATHER_USE_GPS)?;
    let page = form.clone();

    enabled.on(Event::Change, move |toggle| {
        let page = page.clone();
        let gps = gps.clone();
        Box::pin(async move {
            let on = toggle.is_on();
            for item in page.items_by_group(keys::WEATHER_GROUP) {
                if on {
                    item.show();
                } else {
                    item.hide();
                }
            }
            gps.trigger(Event::Change).await;
        })
    });
    enabled.trigger(Event::Change).await;
    Ok(())
}

// ── Master Key provisioning ────────────────────────────────────────────────

#[derive(Default)]
struct ProvisioningState {
    /// Cached outcome of the one lookup. Lives for the page session and is
    /// never cleared once set.
    lookup: Option<SearchResponse>,
    in_flight: bool,
}

/// Item handles and state shared by the click and provider-change handlers.
struct MasterKeyPanel {
    client: Arc<dyn MasterKeyClient>,
    provider: Item,
    weather_key: Item,
    email: Item,
    pin: Item,
    button: Item,
    status: Item,
    state: Mutex<ProvisioningState>,
}

impl MasterKeyPanel {
    fn state(&self) -> MutexGuard<'_, ProvisioningState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    async fn handle_click(&self) {
        // A prior successful lookup answers the click without the network.
        let have_success = {
            let state = self.state();
            state.lookup.as_ref().is_some_and(|lookup| lookup.success)
        };
        if have_success {
            self.apply_cached_key();
            return;
        }

        let email = self.email.text();
        let pin = self.pin.text();
        if email.is_empty() || pin.is_empty() {
            return;
        }

        {
            let mut state = self.state();
            if state.in_flight {
                debug!("master key lookup already in flight; click ignored");
                return;
            }
            state.in_flight = true;
        }

        match self.client.search(&email, &pin).await {
            Ok(response) => {
                let provisioned = response.success && response.weather_keys().is_some();
                let message = response.error.clone().unwrap_or_default();
                {
                    let mut state = self.state();
                    state.lookup = Some(response);
                    state.in_flight = false;
                }
                if provisioned {
                    self.apply_cached_key();
                    self.status.set(STATUS_SUCCESS);
                    self.status.show();
                    info!("weather key provisioned from master key account");
                } else {
                    warn!(error = %message, "master key account rejected the lookup");
                    self.present_failure(message);
                }
            },
            Err(error) => {
                self.state().in_flight = false;
                warn!(status = error.status, "master key lookup failed");
                self.present_failure(error.to_string());
            },
        }
    }

    /// Write the cached key for the selected provider into the key field.
    /// Without a cached success, or without a non-empty entry for the
    /// provider, the field is left unchanged.
    fn apply_cached_key(&self) {
        let state = self.state();
        let Some(ring) = state
            .lookup
            .as_ref()
            .filter(|lookup| lookup.success)
            .and_then(SearchResponse::weather_keys)
        else {
            return;
        };
        let Some(provider) = WeatherProvider::from_index(self.provider.index()) else {
            return;
        };
        if let Some(key) = ring.for_provider(provider) {
            debug!(provider = %provider, "weather key applied from cached lookup");
            self.weather_key.set(key);
        }
    }

    /// Terminal failure: lock the account controls and show the message.
    /// Only a page reload offers another attempt.
    fn present_failure(&self, message: String) {
        self.email.disable();
        self.pin.disable();
        self.button.disable();
        self.status.set(message);
        self.status.show();
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use tickface_form::WatchInfo;

    use super::*;
    use crate::{
        layout::settings_form,
        masterkey::{KeyRing, LookupError, WeatherKeys},
    };

    struct StubClient {
        response: std::result::Result<SearchResponse, LookupError>,
        calls: AtomicUsize,
    }

    impl StubClient {
        fn new(response: std::result::Result<SearchResponse, LookupError>) -> Arc<Self> {
            Arc::new(Self {
                response,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl MasterKeyClient for StubClient {
        async fn search(
            &self,
            _email: &str,
            _pin: &str,
        ) -> std::result::Result<SearchResponse, LookupError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.response.clone()
        }
    }

    fn full_ring() -> SearchResponse {
        SearchResponse {
            success: true,
            keys: Some(KeyRing {
                weather: Some(WeatherKeys {
                    owm: Some("A".into()),
                    wu: Some("B".into()),
                    forecast: Some("C".into()),
                }),
            }),
            error: None,
        }
    }

    fn rejection(message: &str) -> SearchResponse {
        SearchResponse {
            success: false,
            keys: None,
            error: Some(message.into()),
        }
    }

    async fn built_page(platform: Platform, client: Arc<dyn MasterKeyClient>) -> Form {
        let form = settings_form(WatchInfo::new(platform));
        let controller = Arc::new(SettingsController::new(client));
        controller.attach(&form);
        form.finish_build().await.unwrap();
        form
    }

    fn item(form: &Form, key: &str) -> Item {
        form.item_by_message_key(key).unwrap()
    }

    fn by_id(form: &Form, id: &str) -> Item {
        form.item_by_id(id).unwrap()
    }

    async fn click_with_account(form: &Form, email: &str, pin: &str) {
        by_id(form, keys::MASTER_KEY_EMAIL).set(email);
        by_id(form, keys::MASTER_KEY_PIN).set(pin);
        by_id(form, keys::MASTER_KEY_BUTTON).trigger(Event::Click).await;
    }

    // ── Visibility rules ───────────────────────────────────────────────

    #[tokio::test]
    async fn gps_toggle_drives_location_visibility() {
        let form = built_page(Platform::Basalt, StubClient::new(Ok(full_ring()))).await;
        let gps = item(&form, keys::WEATHER_USE_GPS);
        let location = item(&form, keys::WEATHER_LOCATION_NAME);

        // Evaluated immediately: GPS defaults on, so the field starts
        // hidden.
        assert!(!location.is_visible());

        gps.set(false);
        gps.trigger(Event::Change).await;
        assert!(location.is_visible());

        gps.set(true);
        gps.trigger(Event::Change).await;
        assert!(!location.is_visible());
    }

    #[tokio::test]
    async fn steps_toggle_drives_health_visibility() {
        let form = built_page(Platform::Basalt, StubClient::new(Ok(full_ring()))).await;
        let steps = item(&form, keys::SHOW_STEPS);
        let health = item(&form, keys::ENABLE_HEALTH);

        assert!(!health.is_visible());

        steps.set(false);
        steps.trigger(Event::Change).await;
        assert!(health.is_visible());
    }

    #[tokio::test]
    async fn aplite_binds_neither_location_nor_health_rule() {
        let form = built_page(Platform::Aplite, StubClient::new(Ok(full_ring()))).await;
        let gps = item(&form, keys::WEATHER_USE_GPS);
        let location = item(&form, keys::WEATHER_LOCATION_NAME);

        assert!(location.is_visible());

        gps.set(true);
        gps.trigger(Event::Change).await;
        assert!(location.is_visible());

        assert!(item(&form, keys::ENABLE_HEALTH).is_visible());
    }

    #[tokio::test]
    async fn weather_toggle_drives_the_whole_group() {
        let form = built_page(Platform::Basalt, StubClient::new(Ok(full_ring()))).await;
        let enabled = item(&form, keys::WEATHER_ENABLED);

        enabled.set(false);
        enabled.trigger(Event::Change).await;
        for group_item in form.items_by_group(keys::WEATHER_GROUP) {
            assert!(!group_item.is_visible());
        }

        enabled.set(true);
        enabled.trigger(Event::Change).await;
        assert!(item(&form, keys::WEATHER_PROVIDER).is_visible());
        assert!(item(&form, keys::WEATHER_KEY).is_visible());
        // The GPS rule re-evaluates after the section reappears, so the
        // location field ends hidden again (GPS defaults on).
        assert!(!item(&form, keys::WEATHER_LOCATION_NAME).is_visible());
    }

    #[tokio::test]
    async fn status_field_starts_hidden() {
        let form = built_page(Platform::Basalt, StubClient::new(Ok(full_ring()))).await;
        assert!(!by_id(&form, keys::MASTER_KEY_TEXT).is_visible());
    }

    // ── Master Key provisioning ────────────────────────────────────────

    #[tokio::test]
    async fn incomplete_account_fields_issue_no_lookup() {
        let client = StubClient::new(Ok(full_ring()));
        let form = built_page(Platform::Basalt, client.clone()).await;

        by_id(&form, keys::MASTER_KEY_BUTTON).trigger(Event::Click).await;
        assert_eq!(client.calls(), 0);

        by_id(&form, keys::MASTER_KEY_EMAIL).set("user@example.com");
        by_id(&form, keys::MASTER_KEY_BUTTON).trigger(Event::Click).await;
        assert_eq!(client.calls(), 0);

        assert!(!by_id(&form, keys::MASTER_KEY_TEXT).is_visible());
        assert_eq!(item(&form, keys::WEATHER_KEY).text(), "");
    }

    #[tokio::test]
    async fn successful_lookup_provisions_the_selected_provider() {
        let client = StubClient::new(Ok(full_ring()));
        let form = built_page(Platform::Basalt, client.clone()).await;

        click_with_account(&form, "user@example.com", "1234").await;

        assert_eq!(client.calls(), 1);
        assert_eq!(item(&form, keys::WEATHER_KEY).text(), "A");
        let status = by_id(&form, keys::MASTER_KEY_TEXT);
        assert!(status.is_visible());
        assert_eq!(status.text(), STATUS_SUCCESS);
        assert!(by_id(&form, keys::MASTER_KEY_EMAIL).is_enabled());
        assert!(by_id(&form, keys::MASTER_KEY_BUTTON).is_enabled());
    }

    #[tokio::test]
    async fn provider_without_a_ring_entry_leaves_the_key_field() {
        let client = StubClient::new(Ok(SearchResponse {
            success: true,
            keys: Some(KeyRing {
                weather: Some(WeatherKeys {
                    owm: None,
                    wu: Some("B".into()),
                    forecast: None,
                }),
            }),
            error: None,
        }));
        let form = built_page(Platform::Basalt, client).await;
        item(&form, keys::WEATHER_KEY).set("hand-entered");

        click_with_account(&form, "user@example.com", "1234").await;

        // Provider 0 has no owm entry; the field keeps its value but the
        // lookup itself still reports success.
        assert_eq!(item(&form, keys::WEATHER_KEY).text(), "hand-entered");
        assert_eq!(by_id(&form, keys::MASTER_KEY_TEXT).text(), STATUS_SUCCESS);
    }

    #[tokio::test]
    async fn rejected_lookup_locks_the_panel() {
        let client = StubClient::new(Ok(rejection("bad pin")));
        let form = built_page(Platform::Basalt, client.clone()).await;

        click_with_account(&form, "user@example.com", "0000").await;

        assert!(!by_id(&form, keys::MASTER_KEY_EMAIL).is_enabled());
        assert!(!by_id(&form, keys::MASTER_KEY_PIN).is_enabled());
        assert!(!by_id(&form, keys::MASTER_KEY_BUTTON).is_enabled());
        let status = by_id(&form, keys::MASTER_KEY_TEXT);
        assert!(status.is_visible());
        assert_eq!(status.text(), "bad pin");
        assert_eq!(item(&form, keys::WEATHER_KEY).text(), "");
    }

    #[tokio::test]
    async fn transport_failure_reports_status_and_body() {
        let client = StubClient::new(Err(LookupError {
            status: 500,
            body: "Server Error".into(),
        }));
        let form = built_page(Platform::Basalt, client.clone()).await;

        click_with_account(&form, "user@example.com", "1234").await;

        let status = by_id(&form, keys::MASTER_KEY_TEXT);
        assert!(status.is_visible());
        assert_eq!(status.text(), "500: Server Error");
        assert!(!by_id(&form, keys::MASTER_KEY_BUTTON).is_enabled());
    }

    #[tokio::test]
    async fn rejected_lookup_may_be_retried() {
        let client = StubClient::new(Ok(rejection("bad pin")));
        let form = built_page(Platform::Basalt, client.clone()).await;

        click_with_account(&form, "user@example.com", "0000").await;
        by_id(&form, keys::MASTER_KEY_BUTTON).trigger(Event::Click).await;

        assert_eq!(client.calls(), 2);
    }

    #[tokio::test]
    async fn provider_change_reapplies_the_cached_key() {
        let client = StubClient::new(Ok(full_ring()));
        let form = built_page(Platform::Basalt, client.clone()).await;
        let provider = item(&form, keys::WEATHER_PROVIDER);
        let weather_key = item(&form, keys::WEATHER_KEY);

        click_with_account(&form, "user@example.com", "1234").await;
        assert_eq!(weather_key.text(), "A");

        provider.set(1);
        provider.trigger(Event::Change).await;
        assert_eq!(weather_key.text(), "B");

        provider.set(2);
        provider.trigger(Event::Change).await;
        assert_eq!(weather_key.text(), "C");

        // An index outside the provider table changes nothing.
        provider.set(7);
        provider.trigger(Event::Change).await;
        assert_eq!(weather_key.text(), "C");

        assert_eq!(client.calls(), 1);
    }

    #[tokio::test]
    async fn provider_change_without_a_lookup_changes_nothing() {
        let form = built_page(Platform::Basalt, StubClient::new(Ok(full_ring()))).await;
        let provider = item(&form, keys::WEATHER_PROVIDER);

        provider.set(2);
        provider.trigger(Event::Change).await;
        assert_eq!(item(&form, keys::WEATHER_KEY).text(), "");
    }

    #[tokio::test]
    async fn second_click_reuses_the_cached_result() {
        let client = StubClient::new(Ok(full_ring()));
        let form = built_page(Platform::Basalt, client.clone()).await;

        click_with_account(&form, "user@example.com", "1234").await;
        assert_eq!(item(&form, keys::WEATHER_KEY).text(), "A");

        // Switch providers without firing a change event, then click again:
        // the cached ring answers, the network is not consulted.
        item(&form, keys::WEATHER_PROVIDER).set(2);
        by_id(&form, keys::MASTER_KEY_BUTTON).trigger(Event::Click).await;

        assert_eq!(item(&form, keys::WEATHER_KEY).text(), "C");
        assert_eq!(client.calls(), 1);
    }

    #[tokio::test]
    async fn click_while_a_lookup_is_in_flight_is_ignored() {
        struct GatedClient {
            release: tokio::sync::Notify,
            calls: AtomicUsize,
        }

        #[async_trait]
        impl MasterKeyClient for GatedClient {
            async fn search(
                &self,
                _email: &str,
                _pin: &str,
            ) -> std::result::Result<SearchResponse, LookupError> {
                self.calls.fetch_add(1, Ordering::SeqCst);
                self.release.notified().await;
                Ok(full_ring())
            }
        }

        let client = Arc::new(GatedClient {
            release: tokio::sync::Notify::new(),
            calls: AtomicUsize::new(0),
        });
        let form = built_page(Platform::Basalt, client.clone()).await;

        by_id(&form, keys::MASTER_KEY_EMAIL).set("user@example.com");
        by_id(&form, keys::MASTER_KEY_PIN).set("1234");

        let button = by_id(&form, keys::MASTER_KEY_BUTTON);
        let first = tokio::spawn({
            let button = button.clone();
            async move { button.trigger(Event::Click).await }
        });
        while client.calls.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }

        // Second activation while the first is outstanding: no-op.
        button.trigger(Event::Click).await;
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);

        client.release.notify_one();
        first.await.unwrap();

        assert_eq!(item(&form, keys::WEATHER_KEY).text(), "A");
        assert_eq!(by_id(&form, keys::MASTER_KEY_TEXT).text(), STATUS_SUCCESS);
    }

    #[tokio::test]
    async fn missing_controls_fail_the_build() {
        let form = Form::new(WatchInfo::new(Platform::Basalt), vec![]);
        let controller = Arc::new(SettingsController::new(StubClient::new(Ok(full_ring()))));
        controller.attach(&form);

        let error = form.finish_build().await.unwrap_err();
        assert!(error.to_string().contains(keys::WEATHER_USE_GPS));
    }
}
