//! Platform detection helpers.

use super::{config::WidgetConfig, format::NumberLocale};

/// Language tag preferred by the browser, if one is exposed.
pub fn preferred_language() -> Option<String> {
    #[cfg(target_arch = "wasm32")]
    {
        web_sys::window().and_then(|w| w.navigator().language())
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        None
    }
}

/// Separators for the browser language; values are formatted through `Intl`
/// whenever the browser provides it.
pub fn number_locale() -> NumberLocale {
    preferred_language()
        .map(|tag| NumberLocale::from_tag(&tag))
        .unwrap_or_default()
        .with_intl()
}

/// Config for the current page; native builds always use defaults.
pub fn widget_config() -> WidgetConfig {
    #[cfg(target_arch = "wasm32")]
    {
        web_sys::window()
            .and_then(|w| w.location().search().ok())
            .map(|query| WidgetConfig::from_query(&query))
            .unwrap_or_default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        WidgetConfig::default()
    }
}
