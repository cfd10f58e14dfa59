//! Edge case tests for watchface-core
//!
//! Boundary conditions, malformed peer input and property checks over the
//! public API.

use proptest::prelude::*;
use watchface_core::clock::{HALF_HOUR_MS, MINUTE_MS};
use watchface_core::quirks::tables::{
    CALENDAR_PROVIDER_NAMES, DAILY_ACTIVITY_PROVIDER_NAMES, HEALTH_APP_NAMES,
    HEART_RATE_PROVIDER_NAMES, STEPS_PROVIDER_NAMES, WATCH_HOME_APP_NAMES,
};
use watchface_core::scheduler::MIN_UPDATE_INTERVAL_MS;
use watchface_core::wire::{
    decode_battery_percent, decode_notifications_item, icon_asset_key, Asset, KEY_HAS_MORE,
    KEY_ICON_IDS,
};
use watchface_core::{
    next_update_delay, CalendarEvent, ComplicationData, ComplicationText, DataItem, DataMap,
    DataValue, DeviceFamily, DeviceProfile, Error, NotificationsSyncStatus, PhoneBatteryStatus,
    PlatformQueries, ProviderBinding, Sanitizer, Settings, TimeDependentRegistry, WirePath,
};

#[derive(Debug, Clone, Default)]
struct FlakyPlatform {
    heart_rate: Option<f64>,
    fail: bool,
    health_version: u64,
}

impl PlatformQueries for FlakyPlatform {
    fn heart_rate(&self) -> watchface_core::Result<Option<f64>> {
        if self.fail {
            return Err(Error::PlatformQuery("heart rate".into()));
        }
        Ok(self.heart_rate)
    }

    fn next_calendar_event(&self) -> watchface_core::Result<Option<CalendarEvent>> {
        if self.fail {
            return Err(Error::PlatformQuery("calendar".into()));
        }
        Ok(Some(CalendarEvent {
            title: "Standup".into(),
            begin: 9 * 60 * MINUTE_MS,
        }))
    }

    fn health_suite_version(&self) -> watchface_core::Result<u64> {
        if self.fail {
            return Err(Error::PlatformQuery("health version".into()));
        }
        Ok(self.health_version)
    }
}

fn arb_text() -> impl Strategy<Value = ComplicationText> {
    prop_oneof![
        "[ -~]{0,12}".prop_map(ComplicationText::plain),
        (0u64..10_000_000).prop_map(ComplicationText::time_difference),
    ]
}

fn arb_data() -> impl Strategy<Value = ComplicationData> {
    prop_oneof![
        Just(ComplicationData::Empty),
        (arb_text(), proptest::option::of(arb_text())).prop_map(|(text, title)| {
            ComplicationData::ShortText {
                text,
                title,
                icon: None,
                tap_action: None,
            }
        }),
        arb_text().prop_map(|text| ComplicationData::LongText {
            text,
            title: None,
            icon: None,
            tap_action: None,
        }),
        (0.0f32..100.0, proptest::option::of(arb_text())).prop_map(|(value, text)| {
            ComplicationData::RangedValue {
                value,
                min: 0.0,
                max: 100.0,
                text,
                icon: None,
                tap_action: None,
            }
        }),
    ]
}

fn pick(names: &'static [&'static str]) -> impl Strategy<Value = String> {
    (0..names.len()).prop_map(move |i| names[i].to_string())
}

/// Bindings from the quirk tables mixed with random ones.
fn arb_binding() -> impl Strategy<Value = ProviderBinding> {
    let health = (
        pick(HEALTH_APP_NAMES),
        prop_oneof![
            pick(HEART_RATE_PROVIDER_NAMES),
            pick(DAILY_ACTIVITY_PROVIDER_NAMES),
            pick(STEPS_PROVIDER_NAMES),
        ],
    );
    let calendar = (pick(WATCH_HOME_APP_NAMES), pick(CALENDAR_PROVIDER_NAMES));
    let random = ("[a-z]{1,10}", "[a-z]{1,10}");
    prop_oneof![health, calendar, random].prop_map(|(app, provider)| {
        ProviderBinding::new("pkg", "pkg/.Provider", app, provider)
    })
}

fn arb_device() -> impl Strategy<Value = DeviceProfile> {
    prop_oneof![
        Just(DeviceProfile::new(DeviceFamily::Generic)),
        Just(DeviceProfile::new(DeviceFamily::Oppo)),
        Just(DeviceProfile::new(DeviceFamily::Samsung)),
        Just(DeviceProfile::new(DeviceFamily::Samsung).with_os(
            "R890XXU1EVA8",
            chrono::NaiveDate::from_ymd_opt(2022, 6, 1)
        )),
    ]
}

proptest! {
    #[test]
    fn prop_sanitize_is_total(
        device in arb_device(),
        raw in arb_data(),
        binding in proptest::option::of(arb_binding()),
        slot_id in 100u32..110,
        use_24h in any::<bool>(),
        heart_rate in proptest::option::of(-10.0f64..250.0),
        fail in any::<bool>(),
        health_version in prop_oneof![Just(6_200_016u64), Just(6_210_051u64), 0u64..7_000_000],
    ) {
        let platform = FlakyPlatform { heart_rate, fail, health_version };
        let settings = Settings { use_24h_time_format: use_24h, ..Settings::default() };
        let sanitizer = Sanitizer::new(&device, &platform);

        let first = sanitizer.sanitize(&raw, &settings, slot_id, binding.as_ref());
        let second = sanitizer.sanitize(&raw, &settings, slot_id, binding.as_ref());
        prop_assert_eq!(&first, &second);

        if !device.is_samsung() || binding.is_none() || raw.is_empty() {
            prop_assert_eq!(first, raw);
        }
    }

    #[test]
    fn prop_unknown_provider_passes_through(
        raw in arb_data(),
        app in "[a-z]{1,10}",
        provider in "[a-z]{1,10}",
    ) {
        let device = DeviceProfile::new(DeviceFamily::Samsung);
        let platform = FlakyPlatform::default();
        let sanitizer = Sanitizer::new(&device, &platform);
        let binding = ProviderBinding::new("pkg", "pkg/.P", app, provider);

        let data = sanitizer.sanitize(&raw, &Settings::default(), 100, Some(&binding));
        prop_assert_eq!(data, raw);
    }

    #[test]
    fn prop_delay_respects_floor(
        references in proptest::collection::vec(0u64..3_600_000, 0..8),
        now in 0u64..3_600_000,
    ) {
        let mut registry = TimeDependentRegistry::new();
        for (slot, reference) in references.iter().enumerate() {
            let data = ComplicationData::ShortText {
                text: ComplicationText::time_difference(*reference),
                title: None,
                icon: None,
                tap_action: None,
            };
            registry.update(100 + slot as u32, &data, now);
        }

        match next_update_delay(&registry, false, now) {
            Some(delay) => {
                prop_assert!(!references.is_empty());
                prop_assert!(delay >= MIN_UPDATE_INTERVAL_MS);
                prop_assert!(delay <= MINUTE_MS);
            }
            None => prop_assert!(references.is_empty()),
        }
    }

    #[test]
    fn prop_phone_battery_staleness_boundary(
        received_at in 0u64..1_000_000_000,
        elapsed in 0u64..(2 * HALF_HOUR_MS),
        percentage in 0u8..=100,
    ) {
        let status = PhoneBatteryStatus::received(percentage, received_at).unwrap();
        prop_assert_eq!(status.is_stale(received_at + elapsed), elapsed > HALF_HOUR_MS);
    }

    #[test]
    fn prop_battery_byte_never_exceeds_100(byte in any::<u8>()) {
        match decode_battery_percent(&[byte]) {
            Ok(percentage) => prop_assert!(percentage <= 100),
            Err(err) => prop_assert_eq!(err, Error::BatteryOutOfRange(byte)),
        }
    }
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn unknown_provider_short_text_is_untouched() {
    let device = DeviceProfile::new(DeviceFamily::Samsung);
    let platform = FlakyPlatform::default();
    let sanitizer = Sanitizer::new(&device, &platform);
    let binding = ProviderBinding::new(
        "com.example.battery",
        "com.example.battery/.Provider",
        "Battery Widgets",
        "Phone battery",
    );

    let raw = ComplicationData::short_text("42%");
    let data = sanitizer.sanitize(&raw, &Settings::default(), 100, Some(&binding));
    assert_eq!(data, raw);
}

fn notifications_item(ids: &[i32], has_more: bool, with_assets: &[i32]) -> DataItem {
    let mut map = DataMap::new();
    map.put(KEY_ICON_IDS, DataValue::IntList(ids.to_vec()))
        .put(KEY_HAS_MORE, DataValue::Bool(has_more));
    for id in with_assets {
        map.put(
            icon_asset_key(*id),
            DataValue::Asset(Asset::new(format!("digest-{id}"))),
        );
    }
    DataItem::new(WirePath::NotificationsItem, map)
}

#[test]
fn notifications_batch_is_truncated_to_five() {
    let item = notifications_item(&[1, 2, 3, 4, 5, 6], true, &[1, 2, 3, 4, 5, 6]);
    let decoded = decode_notifications_item(&item).unwrap();
    assert_eq!(decoded.icon_ids, vec![1, 2, 3, 4, 5]);
    assert!(decoded.has_more);
    assert_eq!(decoded.assets.len(), 5);
}

#[test]
fn sixth_asset_is_not_required() {
    let item = notifications_item(&[1, 2, 3, 4, 5, 6], false, &[1, 2, 3, 4, 5]);
    let decoded = decode_notifications_item(&item).unwrap();
    assert!(decoded.has_more);
}

#[test]
fn missing_asset_rejects_the_batch() {
    let item = notifications_item(&[1, 2, 3], false, &[1, 3]);
    assert_eq!(
        decode_notifications_item(&item),
        Err(Error::MissingAsset(2))
    );
}

#[test]
fn missing_icon_list_is_reported() {
    let item = DataItem::new(WirePath::NotificationsItem, DataMap::new());
    assert!(matches!(
        decode_notifications_item(&item),
        Err(Error::MissingField { .. })
    ));
}

#[test]
fn malformed_status_bytes_are_rejected() {
    assert_eq!(
        NotificationsSyncStatus::decode(&[3]),
        Err(Error::UnknownSyncStatus(3))
    );
    assert!(matches!(
        NotificationsSyncStatus::decode(&[]),
        Err(Error::EmptyPayload(_))
    ));
    assert!(decode_battery_percent(&[]).is_err());
}

#[test]
fn settings_survive_a_json_round_trip() {
    let settings = Settings {
        show_phone_battery: true,
        notifications_sync_activated: true,
        ..Settings::default()
    };
    let json = serde_json::to_string(&settings).unwrap();
    assert!(json.contains("\"showPhoneBattery\":true"));
    let restored: Settings = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, settings);

    // Older files without newer keys still load.
    let restored: Settings = serde_json::from_str("{\"userPremium\":true}").unwrap();
    assert!(restored.user_premium);
    assert!(restored.use_24h_time_format);
}

#[test]
fn registry_forgets_replaced_data() {
    let mut registry = TimeDependentRegistry::new();
    let countdown = ComplicationData::ShortText {
        text: ComplicationText::time_difference(5 * MINUTE_MS),
        title: None,
        icon: None,
        tap_action: None,
    };
    registry.update(100, &countdown, 0);
    assert!(next_update_delay(&registry, false, 0).is_some());

    registry.update(100, &ComplicationData::short_text("static"), 0);
    assert_eq!(next_update_delay(&registry, false, 0), None);
}
