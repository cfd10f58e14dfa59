//! Platform services the watch face host provides.

use async_trait::async_trait;
use tokio::sync::broadcast;
use watchface_core::{
    DefaultProvider, PlatformQueries, ProviderBinding, SlotId, Timestamp, WeatherProvider,
};

/// Host side of the watch face: complication plumbing, sensors and alarms.
///
/// Also answers the out-of-band queries of the quirk sanitizer.
#[async_trait]
pub trait HostPlatform: PlatformQueries {
    /// Slots the face currently draws.
    fn set_active_slots(&self, slot_ids: &[SlotId]);

    /// Register or clear the default provider of a slot. Registering
    /// subscribes the slot; clearing unsubscribes it.
    fn set_default_provider(&self, slot_id: SlotId, provider: Option<&DefaultProvider>);

    /// Which provider backs each slot. `None` for an unbound slot.
    async fn provider_info(&self, slot_ids: &[SlotId]) -> Vec<(SlotId, Option<ProviderBinding>)>;

    /// Weather provider component installed on the device, looked up once.
    fn weather_provider(&self) -> Option<WeatherProvider>;

    /// Battery level as reported by the OS.
    fn watch_battery_level(&self) -> Option<u8>;

    /// Wake the face at `at` with a time tick.
    fn set_alarm(&self, at: Timestamp);

    /// Fires every time the heart rate sensor reports a value.
    fn heart_rate_changes(&self) -> broadcast::Receiver<f64>;
}

/// Companion-side platform state.
pub trait CompanionPlatform: Send + Sync {
    /// Current phone battery percentage.
    fn battery_percent(&self) -> Option<u8>;

    /// Notification listener access is granted.
    fn has_notification_permission(&self) -> bool;
}
