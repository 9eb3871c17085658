//! Weather data services selectable on the settings page.

/// Supported weather providers, in select-control order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeatherProvider {
    OpenWeatherMap,
    WeatherUnderground,
    Forecast,
}

impl WeatherProvider {
    /// Map the provider select's option value to a provider. Values outside
    /// the table have no provider.
    #[must_use]
    pub fn from_index(index: i64) -> Option<Self> {
        match index {
            0 => Some(Self::OpenWeatherMap),
            1 => Some(Self::WeatherUnderground),
            2 => Some(Self::Forecast),
            _ => None,
        }
    }

    /// Short name used by the Master Key key ring.
    #[must_use]
    pub fn short_name(self) -> &'static str {
        match self {
            Self::OpenWeatherMap => "owm",
            Self::WeatherUnderground => "wu",
            Self::Forecast => "forecast",
        }
    }
}

impl std::fmt::Display for WeatherProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.short_name())
    }
}
