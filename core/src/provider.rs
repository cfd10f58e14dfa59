//! Provider identity as reported by the platform for each slot.

use serde::{Deserialize, Serialize};

/// Which external provider currently backs a slot.
///
/// Known-buggy providers are recognised by their *display names*, because
/// the OEM ships the same component under different names per locale. The
/// package and component identities are kept for logging and tap targets.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderBinding {
    /// Package of the app hosting the provider.
    pub app_package: String,
    /// Component name of the provider service.
    pub provider_component: String,
    /// Localized app name, as shown to the user.
    pub app_name: String,
    /// Localized provider name, as shown to the user.
    pub provider_name: String,
}

impl ProviderBinding {
    pub fn new(
        app_package: impl Into<String>,
        provider_component: impl Into<String>,
        app_name: impl Into<String>,
        provider_name: impl Into<String>,
    ) -> Self {
        Self {
            app_package: app_package.into(),
            provider_component: provider_component.into(),
            app_name: app_name.into(),
            provider_name: provider_name.into(),
        }
    }
}

/// A provider component that can be registered as a slot default.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum DefaultProvider {
    /// A third-party component, e.g. the weather provider found at startup.
    #[serde(rename_all = "camelCase")]
    Component { package: String, service: String },
    /// The platform's own watch battery provider.
    SystemWatchBattery,
}

/// The external weather component discovered once at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherProvider {
    pub app_package: String,
    pub provider_service: String,
    /// Activity to open when the weather line is tapped.
    pub activity: String,
}

impl WeatherProvider {
    pub fn as_default_provider(&self) -> DefaultProvider {
        DefaultProvider::Component {
            package: self.app_package.clone(),
            service: self.provider_service.clone(),
        }
    }
}
