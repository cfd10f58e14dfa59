//! User settings and negotiated sync flags.
//!
//! One struct serves both sides of the pair: the watch reads the display
//! toggles, the companion reads its own sync flags. Unknown fields are ignored
//! and missing ones take their defaults, so older settings files still load.

use crate::slot::Style;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    pub user_premium: bool,
    pub use_24h_time_format: bool,
    pub use_android_12_style: bool,
    pub show_seconds_ring: bool,
    pub show_complications_in_ambient: bool,
    pub show_weather: bool,
    pub show_watch_battery: bool,
    pub hide_battery_in_ambient: bool,
    /// Watch side: display the phone battery. Doubles as the persisted
    /// battery sync flag.
    pub show_phone_battery: bool,
    /// Both sides: notification icon sync was negotiated on.
    pub notifications_sync_activated: bool,
    pub show_notifications_in_ambient: bool,
    /// Companion side: push the phone battery level to the watch.
    pub battery_sync_activated: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            user_premium: false,
            use_24h_time_format: true,
            use_android_12_style: false,
            show_seconds_ring: false,
            show_complications_in_ambient: false,
            show_weather: false,
            show_watch_battery: false,
            hide_battery_in_ambient: false,
            show_phone_battery: false,
            notifications_sync_activated: false,
            show_notifications_in_ambient: false,
            battery_sync_activated: false,
        }
    }
}

/// Identifies one settings field in change notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SettingKey {
    UserPremium,
    Use24hTimeFormat,
    UseAndroid12Style,
    ShowSecondsRing,
    ShowComplicationsInAmbient,
    ShowWeather,
    ShowWatchBattery,
    HideBatteryInAmbient,
    ShowPhoneBattery,
    NotificationsSyncActivated,
    ShowNotificationsInAmbient,
    BatterySyncActivated,
}

impl SettingKey {
    pub const ALL: [SettingKey; 12] = [
        SettingKey::UserPremium,
        SettingKey::Use24hTimeFormat,
        SettingKey::UseAndroid12Style,
        SettingKey::ShowSecondsRing,
        SettingKey::ShowComplicationsInAmbient,
        SettingKey::ShowWeather,
        SettingKey::ShowWatchBattery,
        SettingKey::HideBatteryInAmbient,
        SettingKey::ShowPhoneBattery,
        SettingKey::NotificationsSyncActivated,
        SettingKey::ShowNotificationsInAmbient,
        SettingKey::BatterySyncActivated,
    ];

    /// Whether a change of this key alters how complications are sanitized.
    pub fn affects_sanitizing(self) -> bool {
        matches!(self, SettingKey::Use24hTimeFormat)
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl Settings {
    pub fn style(&self) -> Style {
        if self.use_android_12_style {
            Style::Android12
        } else {
            Style::Regular
        }
    }

    pub fn get(&self, key: SettingKey) -> bool {
        match key {
            SettingKey::UserPremium => self.user_premium,
            SettingKey::Use24hTimeFormat => self.use_24h_time_format,
            SettingKey::UseAndroid12Style => self.use_android_12_style,
            SettingKey::ShowSecondsRing => self.show_seconds_ring,
            SettingKey::ShowComplicationsInAmbient => self.show_complications_in_ambient,
            SettingKey::ShowWeather => self.show_weather,
            SettingKey::ShowWatchBattery => self.show_watch_battery,
            SettingKey::HideBatteryInAmbient => self.hide_battery_in_ambient,
            SettingKey::ShowPhoneBattery => self.show_phone_battery,
            SettingKey::NotificationsSyncActivated => self.notifications_sync_activated,
            SettingKey::ShowNotificationsInAmbient => self.show_notifications_in_ambient,
            SettingKey::BatterySyncActivated => self.battery_sync_activated,
        }
    }

    /// Set a flag. Returns `true` when the stored value changed.
    pub fn set(&mut self, key: SettingKey, value: bool) -> bool {
        let slot = match key {
            SettingKey::UserPremium => &mut self.user_premium,
            SettingKey::Use24hTimeFormat => &mut self.use_24h_time_format,
            SettingKey::UseAndroid12Style => &mut self.use_android_12_style,
            SettingKey::ShowSecondsRing => &mut self.show_seconds_ring,
            SettingKey::ShowComplicationsInAmbient => &mut self.show_complications_in_ambient,
            SettingKey::ShowWeather => &mut self.show_weather,
            SettingKey::ShowWatchBattery => &mut self.show_watch_battery,
            SettingKey::HideBatteryInAmbient => &mut self.hide_battery_in_ambient,
            SettingKey::ShowPhoneBattery => &mut self.show_phone_battery,
            SettingKey::NotificationsSyncActivated => &mut self.notifications_sync_activated,
            SettingKey::ShowNotificationsInAmbient => &mut self.show_notifications_in_ambient,
            SettingKey::BatterySyncActivated => &mut self.battery_sync_activated,
        };
        let changed = *slot != value;
        *slot = value;
        changed
    }

    /// Weather is a premium feature.
    pub fn should_show_weather(&self) -> bool {
        self.user_premium && self.show_weather
    }

    /// Watch battery is a premium feature.
    pub fn should_show_watch_battery(&self) -> bool {
        self.user_premium && self.show_watch_battery
    }
}
