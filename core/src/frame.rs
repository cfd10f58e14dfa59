//! Immutable input of one draw, and tap routing over the same data.

use crate::battery::PhoneBatteryStatus;
use crate::complication::{ComplicationData, TapAction};
use crate::notification::NotificationState;
use crate::settings::Settings;
use crate::slot::Style;
use crate::{SlotId, Timestamp};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ModeFlags {
    pub ambient: bool,
    /// Interruption filter set to "none".
    pub muted: bool,
    pub visible: bool,
}

/// Everything the drawer needs for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameSnapshot {
    pub time: Timestamp,
    pub style: Style,
    /// Sanitized data of the active slots.
    pub complications: BTreeMap<SlotId, ComplicationData>,
    /// Present only while the weather slot is subscribed.
    pub weather: Option<ComplicationData>,
    /// Present only while the watch battery slot is subscribed.
    pub watch_battery: Option<ComplicationData>,
    /// Present only while phone battery display is on.
    pub phone_battery: Option<PhoneBatteryStatus>,
    /// Present only while notification sync is on.
    pub notifications: Option<NotificationState>,
    pub mode: ModeFlags,
}

/// Screen area hit by a tap, as resolved by the drawer's layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapRegion {
    Complication(SlotId),
    Weather,
    PhoneBattery,
    Notifications,
    Elsewhere,
}

/// Where the host should navigate after a tap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    /// Fire the complication's own tap action.
    Complication(TapAction),
    /// Open the weather app activity.
    Weather(String),
    PhoneBatterySetup,
    NotificationsSetup,
    /// Tell the user how to reach the notification shade.
    NotificationsHint,
}

/// State a tap decision depends on.
#[derive(Debug, Clone, Copy)]
pub struct TapContext<'a> {
    pub settings: &'a Settings,
    pub complications: &'a BTreeMap<SlotId, ComplicationData>,
    pub weather_activity: Option<&'a str>,
    pub phone_battery: &'a PhoneBatteryStatus,
    pub notifications: &'a NotificationState,
    pub now: Timestamp,
}

pub fn route_tap(region: TapRegion, ctx: &TapContext<'_>) -> Option<Navigation> {
    match region {
        TapRegion::Complication(slot_id) => ctx
            .complications
            .get(&slot_id)
            .and_then(ComplicationData::tap_action)
            .cloned()
            .map(Navigation::Complication),
        TapRegion::Weather => ctx
            .weather_activity
            .map(|activity| Navigation::Weather(activity.to_string())),
        TapRegion::PhoneBattery => {
            let settings = ctx.settings;
            (settings.user_premium
                && settings.show_phone_battery
                && ctx.phone_battery.is_stale(ctx.now))
            .then_some(Navigation::PhoneBatterySetup)
        }
        TapRegion::Notifications => {
            let settings = ctx.settings;
            if !settings.user_premium || !settings.notifications_sync_activated {
                return None;
            }
            match ctx.notifications {
                NotificationState::DataReceived { icons, .. } if !icons.is_empty() => {
                    Some(Navigation::NotificationsHint)
                }
                NotificationState::DataReceived { .. } => None,
                NotificationState::Unknown { .. } => ctx
                    .notifications
                    .is_stale(ctx.now)
                    .then_some(Navigation::NotificationsSetup),
            }
        }
        TapRegion::Elsewhere => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::Bitmap;

    fn premium() -> Settings {
        Settings {
            user_premium: true,
            show_phone_battery: true,
            notifications_sync_activated: true,
            ..Settings::default()
        }
    }

    #[test]
    fn stale_phone_battery_opens_setup() {
        let settings = premium();
        let complications = BTreeMap::new();
        let unknown = NotificationState::unknown(0);
        let ctx = TapContext {
            settings: &settings,
            complications: &complications,
            weather_activity: None,
            phone_battery: &PhoneBatteryStatus::Unknown,
            notifications: &unknown,
            now: 0,
        };
        assert_eq!(
            route_tap(TapRegion::PhoneBattery, &ctx),
            Some(Navigation::PhoneBatterySetup)
        );

        let fresh = PhoneBatteryStatus::received(50, 0).unwrap();
        let ctx = TapContext {
            phone_battery: &fresh,
            ..ctx
        };
        assert_eq!(route_tap(TapRegion::PhoneBattery, &ctx), None);
    }

    #[test]
    fn notifications_tap_depends_on_state() {
        let settings = premium();
        let complications = BTreeMap::new();
        let unknown = NotificationState::unknown(0);
        let ctx = TapContext {
            settings: &settings,
            complications: &complications,
            weather_activity: None,
            phone_battery: &PhoneBatteryStatus::Unknown,
            notifications: &unknown,
            now: 10_000,
        };
        assert_eq!(route_tap(TapRegion::Notifications, &ctx), None);

        let ctx = TapContext {
            now: 61_000,
            ..ctx
        };
        assert_eq!(
            route_tap(TapRegion::Notifications, &ctx),
            Some(Navigation::NotificationsSetup)
        );

        let received = NotificationState::DataReceived {
            icons: vec![Bitmap::new(1, 1, vec![0u8; 4])],
            has_more: false,
        };
        let ctx = TapContext {
            notifications: &received,
            ..ctx
        };
        assert_eq!(
            route_tap(TapRegion::Notifications, &ctx),
            Some(Navigation::NotificationsHint)
        );
    }

    #[test]
    fn complication_tap_uses_its_action() {
        let settings = Settings::default();
        let mut complications = BTreeMap::new();
        complications.insert(
            100,
            ComplicationData::short_text("1").with_tap_action(Some(TapAction::new("open/app"))),
        );
        let unknown = NotificationState::unknown(0);
        let ctx = TapContext {
            settings: &settings,
            complications: &complications,
            weather_activity: Some("weather/Activity"),
            phone_battery: &PhoneBatteryStatus::Unknown,
            notifications: &unknown,
            now: 0,
        };
        assert_eq!(
            route_tap(TapRegion::Complication(100), &ctx),
            Some(Navigation::Complication(TapAction::new("open/app")))
        );
        assert_eq!(route_tap(TapRegion::Complication(101), &ctx), None);
        assert_eq!(
            route_tap(TapRegion::Weather, &ctx),
            Some(Navigation::Weather("weather/Activity".into()))
        );
        assert_eq!(route_tap(TapRegion::PhoneBattery, &ctx), None);
    }
}
