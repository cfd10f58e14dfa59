//! Rewriting of known-broken OEM complication payloads.
//!
//! Recognition is two-step: [`classify`] maps a provider binding to a
//! [`ProviderClass`] through the localized name tables, then the first
//! [`QuirkRule`] whose class matches and whose [`VersionGate`] is open decides
//! the [`QuirkFix`]. New regressions are added as table rows, not branches.

use super::tables::{
    CALENDAR_PROVIDER_NAMES, DAILY_ACTIVITY_PROVIDER_NAMES, HEALTH_APP_NAMES,
    HEART_RATE_PROVIDER_NAMES, SLEEP_PROVIDER_NAMES, STEPS_PROVIDER_NAMES, WATCH_HOME_APP_NAMES,
    WATER_PROVIDER_NAMES,
};
use crate::complication::{ComplicationData, ComplicationText, IconRef, TapAction};
use crate::device::DeviceProfile;
use crate::error::{Error, Result};
use crate::provider::ProviderBinding;
use crate::settings::Settings;
use crate::slot::BOTTOM_SLOT_ID;
use crate::{SlotId, Timestamp};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

pub const HEALTH_SUITE_PACKAGE: &str = "com.samsung.android.wear.shealth";
pub const HEALTH_HOME_ACTIVITY: &str =
    "com.samsung.android.wear.shealth/com.samsung.android.wear.shealth.app.home.HomeActivity";
pub const CALENDAR_HOME_ACTIVITY: &str =
    "com.samsung.android.calendar/com.samsung.android.app.calendar.view.daily.DailyActivity";

/// Health suite 6.20.0.016.
pub const HEALTH_SUITE_6_20_0_016: u64 = 6_200_016;
/// Health suite 6.21.0.051.
pub const HEALTH_SUITE_6_21_0_051: u64 = 6_210_051;

pub const HEART_RATE_ICON: &str = "ic_heart_complication";
pub const CALENDAR_ICON: &str = "ic_calendar_complication";

/// Text shown when the live heart rate is not available.
const UNKNOWN_HEART_RATE: &str = "?";

/// Families of OEM providers the sanitizer knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProviderClass {
    HeartRate,
    Calendar,
    DailyActivity,
    Steps,
    Sleep,
    Water,
}

impl ProviderClass {
    pub const ALL: [ProviderClass; 6] = [
        ProviderClass::HeartRate,
        ProviderClass::Calendar,
        ProviderClass::DailyActivity,
        ProviderClass::Steps,
        ProviderClass::Sleep,
        ProviderClass::Water,
    ];

    fn app_names(self) -> &'static [&'static str] {
        match self {
            ProviderClass::Calendar => WATCH_HOME_APP_NAMES,
            ProviderClass::HeartRate
            | ProviderClass::DailyActivity
            | ProviderClass::Steps
            | ProviderClass::Sleep
            | ProviderClass::Water => HEALTH_APP_NAMES,
        }
    }

    fn provider_names(self) -> &'static [&'static str] {
        match self {
            ProviderClass::HeartRate => HEART_RATE_PROVIDER_NAMES,
            ProviderClass::Calendar => CALENDAR_PROVIDER_NAMES,
            ProviderClass::DailyActivity => DAILY_ACTIVITY_PROVIDER_NAMES,
            ProviderClass::Steps => STEPS_PROVIDER_NAMES,
            ProviderClass::Sleep => SLEEP_PROVIDER_NAMES,
            ProviderClass::Water => WATER_PROVIDER_NAMES,
        }
    }

    fn matches(self, binding: &ProviderBinding) -> bool {
        self.app_names().contains(&binding.app_name.as_str())
            && self.provider_names().contains(&binding.provider_name.as_str())
    }
}

/// Which OEM provider family, if any, backs a binding.
pub fn classify(binding: &ProviderBinding) -> Option<ProviderClass> {
    ProviderClass::ALL
        .into_iter()
        .find(|class| class.matches(binding))
}

/// Condition on the device or OEM app build for a rule to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionGate {
    Always,
    HealthSuiteExactly(u64),
    HealthSuiteAtLeast(u64),
    /// OS security patch inside the known-broken calendar range.
    CalendarBuggyOs,
}

/// How a recognized payload is repaired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuirkFix {
    /// Replace with the live heart rate read out of band.
    LiveHeartRate,
    /// Replace with the next calendar event read out of band.
    CalendarFromQuery,
    /// Keep the payload, open the health app home screen on tap.
    OpenHealthHome,
    /// Drop the payload.
    Suppress,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuirkRule {
    pub class: ProviderClass,
    pub gate: VersionGate,
    pub fix: QuirkFix,
}

const fn rule(class: ProviderClass, gate: VersionGate, fix: QuirkFix) -> QuirkRule {
    QuirkRule { class, gate, fix }
}

/// Known regressions. The first matching row wins.
pub const QUIRK_RULES: &[QuirkRule] = &[
    rule(ProviderClass::HeartRate, VersionGate::Always, QuirkFix::LiveHeartRate),
    rule(
        ProviderClass::DailyActivity,
        VersionGate::HealthSuiteExactly(HEALTH_SUITE_6_20_0_016),
        QuirkFix::OpenHealthHome,
    ),
    rule(
        ProviderClass::Steps,
        VersionGate::HealthSuiteExactly(HEALTH_SUITE_6_20_0_016),
        QuirkFix::Suppress,
    ),
    rule(
        ProviderClass::Sleep,
        VersionGate::HealthSuiteExactly(HEALTH_SUITE_6_20_0_016),
        QuirkFix::Suppress,
    ),
    rule(
        ProviderClass::Water,
        VersionGate::HealthSuiteExactly(HEALTH_SUITE_6_20_0_016),
        QuirkFix::Suppress,
    ),
    rule(
        ProviderClass::DailyActivity,
        VersionGate::HealthSuiteAtLeast(HEALTH_SUITE_6_21_0_051),
        QuirkFix::OpenHealthHome,
    ),
    rule(
        ProviderClass::Calendar,
        VersionGate::CalendarBuggyOs,
        QuirkFix::CalendarFromQuery,
    ),
];

/// Next calendar event as read from the OEM calendar content provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    pub title: String,
    pub begin: Timestamp,
}

/// Out-of-band platform lookups used by the fixes.
///
/// Implementations are expected to return quickly; they are called on the
/// engine's execution context.
pub trait PlatformQueries: Send + Sync {
    /// Latest heart rate in beats per minute. `None` when the sensor has no value.
    fn heart_rate(&self) -> Result<Option<f64>>;

    fn next_calendar_event(&self) -> Result<Option<CalendarEvent>>;

    /// Long version code of the OEM health suite.
    fn health_suite_version(&self) -> Result<u64>;

    /// Offset of the local time zone, used to format event times.
    fn utc_offset_seconds(&self) -> i32 {
        0
    }
}

/// Applies [`QUIRK_RULES`] for one device.
pub struct Sanitizer<'a> {
    device: &'a DeviceProfile,
    platform: &'a dyn PlatformQueries,
}

impl<'a> Sanitizer<'a> {
    pub fn new(device: &'a DeviceProfile, platform: &'a dyn PlatformQueries) -> Self {
        Self { device, platform }
    }

    /// Repair `raw` if it comes from a known-broken provider.
    ///
    /// Total: any fault is logged and the raw data is returned unchanged.
    pub fn sanitize(
        &self,
        raw: &ComplicationData,
        settings: &Settings,
        slot_id: SlotId,
        binding: Option<&ProviderBinding>,
    ) -> ComplicationData {
        let Some(binding) = binding else {
            return raw.clone();
        };
        if !self.device.is_samsung() || raw.is_empty() {
            return raw.clone();
        }

        match self.rewrite(raw, settings, slot_id, binding) {
            Ok(Some(data)) => data,
            Ok(None) => raw.clone(),
            Err(err) => {
                tracing::warn!(
                    slot_id,
                    provider = %binding.provider_name,
                    error = %err,
                    "failed to sanitize complication data, keeping raw"
                );
                raw.clone()
            }
        }
    }

    /// The rule that applies to `binding` on this device, if any.
    pub fn matching_rule(&self, binding: &ProviderBinding) -> Option<&'static QuirkRule> {
        if !self.device.is_samsung() {
            return None;
        }
        let class = classify(binding)?;
        QUIRK_RULES
            .iter()
            .filter(|rule| rule.class == class)
            .find(|rule| self.gate_open(rule.gate))
    }

    fn gate_open(&self, gate: VersionGate) -> bool {
        match gate {
            VersionGate::Always => true,
            VersionGate::CalendarBuggyOs => self.device.has_calendar_bug(),
            VersionGate::HealthSuiteExactly(version) => {
                self.health_suite_version() == Some(version)
            }
            VersionGate::HealthSuiteAtLeast(version) => {
                self.health_suite_version().is_some_and(|v| v >= version)
            }
        }
    }

    fn health_suite_version(&self) -> Option<u64> {
        match self.platform.health_suite_version() {
            Ok(version) => Some(version),
            Err(err) => {
                tracing::debug!(error = %err, "health suite version unavailable");
                None
            }
        }
    }

    fn rewrite(
        &self,
        raw: &ComplicationData,
        settings: &Settings,
        slot_id: SlotId,
        binding: &ProviderBinding,
    ) -> Result<Option<ComplicationData>> {
        let Some(rule) = self.matching_rule(binding) else {
            return Ok(None);
        };
        tracing::debug!(slot_id, class = ?rule.class, fix = ?rule.fix, "applying provider quirk");

        match rule.fix {
            QuirkFix::LiveHeartRate => Ok(Some(self.heart_rate_data(raw)?)),
            QuirkFix::CalendarFromQuery => self.calendar_data(settings, slot_id),
            QuirkFix::OpenHealthHome => Ok(Some(
                raw.clone()
                    .with_tap_action(Some(TapAction::new(HEALTH_HOME_ACTIVITY))),
            )),
            QuirkFix::Suppress => Ok(Some(ComplicationData::Empty)),
        }
    }

    fn heart_rate_data(&self, raw: &ComplicationData) -> Result<ComplicationData> {
        let text = match self.platform.heart_rate()? {
            Some(bpm) if bpm.is_finite() && bpm > 0.0 => format!("{}", bpm.round() as u32),
            _ => UNKNOWN_HEART_RATE.to_string(),
        };
        Ok(ComplicationData::ShortText {
            text: ComplicationText::plain(text),
            title: None,
            icon: Some(IconRef::new(HEART_RATE_ICON)),
            tap_action: raw.tap_action().cloned(),
        })
    }

    fn calendar_data(
        &self,
        settings: &Settings,
        slot_id: SlotId,
    ) -> Result<Option<ComplicationData>> {
        let Some(event) = self.platform.next_calendar_event()? else {
            return Ok(None);
        };
        let icon = Some(IconRef::new(CALENDAR_ICON));
        let tap_action = Some(TapAction::new(CALENDAR_HOME_ACTIVITY));

        if slot_id == BOTTOM_SLOT_ID {
            return Ok(Some(ComplicationData::LongText {
                text: ComplicationText::plain(event.title),
                title: None,
                icon,
                tap_action,
            }));
        }

        let time = format_event_time(
            event.begin,
            self.platform.utc_offset_seconds(),
            settings.use_24h_time_format,
        )?;
        Ok(Some(ComplicationData::ShortText {
            text: ComplicationText::plain(time),
            title: None,
            icon,
            tap_action,
        }))
    }
}

fn format_event_time(begin: Timestamp, offset_seconds: i32, use_24h: bool) -> Result<String> {
    let millis = i64::try_from(begin)
        .map_err(|_| Error::PlatformQuery(format!("event start out of range: {begin}")))?;
    let utc = DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| Error::PlatformQuery(format!("event start out of range: {begin}")))?;
    let offset = FixedOffset::east_opt(offset_seconds)
        .ok_or_else(|| Error::PlatformQuery(format!("invalid utc offset: {offset_seconds}")))?;
    let local = utc.with_timezone(&offset);
    let pattern = if use_24h { "%H:%M" } else { "%-I:%M" };
    Ok(local.format(pattern).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{parse_security_patch, DeviceFamily};
    use crate::slot::LEFT_SLOT_ID;

    #[derive(Default)]
    struct FakePlatform {
        heart_rate: Option<f64>,
        heart_rate_fails: bool,
        event: Option<CalendarEvent>,
        health_version: Option<u64>,
    }

    impl PlatformQueries for FakePlatform {
        fn heart_rate(&self) -> Result<Option<f64>> {
            if self.heart_rate_fails {
                return Err(Error::PlatformQuery("heart_rate".into()));
            }
            Ok(self.heart_rate)
        }

        fn next_calendar_event(&self) -> Result<Option<CalendarEvent>> {
            Ok(self.event.clone())
        }

        fn health_suite_version(&self) -> Result<u64> {
            self.health_version
                .ok_or_else(|| Error::PlatformQuery("package not found".into()))
        }
    }

    fn samsung() -> DeviceProfile {
        DeviceProfile::new(DeviceFamily::Samsung)
    }

    fn health(provider: &str) -> ProviderBinding {
        ProviderBinding::new(HEALTH_SUITE_PACKAGE, "p", "Samsung Health", provider)
    }

    fn calendar() -> ProviderBinding {
        ProviderBinding::new("com.samsung.android.app.watchmanager", "c", "One UI Watch Home", "Calendar")
    }

    fn raw() -> ComplicationData {
        ComplicationData::short_text("12").with_tap_action(Some(TapAction::new("provider/tap")))
    }

    #[test]
    fn unknown_provider_passes_through() {
        let device = samsung();
        let platform = FakePlatform::default();
        let sanitizer = Sanitizer::new(&device, &platform);
        let data = ComplicationData::short_text("42%");
        let binding = ProviderBinding::new("com.example", "x", "Example", "Battery");

        let out = sanitizer.sanitize(&data, &Settings::default(), LEFT_SLOT_ID, Some(&binding));
        assert_eq!(out, data);
        assert_eq!(classify(&binding), None);
    }

    #[test]
    fn other_device_families_are_untouched() {
        let device = DeviceProfile::new(DeviceFamily::Generic);
        let platform = FakePlatform {
            heart_rate: Some(70.0),
            ..FakePlatform::default()
        };
        let sanitizer = Sanitizer::new(&device, &platform);
        let out = sanitizer.sanitize(
            &raw(),
            &Settings::default(),
            LEFT_SLOT_ID,
            Some(&health("Heart rate")),
        );
        assert_eq!(out, raw());
    }

    #[test]
    fn heart_rate_is_replaced_by_live_value() {
        let device = samsung();
        let platform = FakePlatform {
            heart_rate: Some(71.6),
            ..FakePlatform::default()
        };
        let sanitizer = Sanitizer::new(&device, &platform);
        let out = sanitizer.sanitize(
            &raw(),
            &Settings::default(),
            LEFT_SLOT_ID,
            Some(&health("Heart rate")),
        );
        match out {
            ComplicationData::ShortText {
                text,
                icon,
                tap_action,
                ..
            } => {
                assert_eq!(text, ComplicationText::plain("72"));
                assert_eq!(icon, Some(IconRef::new(HEART_RATE_ICON)));
                assert_eq!(tap_action, Some(TapAction::new("provider/tap")));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn missing_heart_rate_shows_placeholder() {
        let device = samsung();
        let platform = FakePlatform {
            heart_rate: Some(0.0),
            ..FakePlatform::default()
        };
        let sanitizer = Sanitizer::new(&device, &platform);
        let out = sanitizer.sanitize(
            &raw(),
            &Settings::default(),
            LEFT_SLOT_ID,
            Some(&health("Heart rate")),
        );
        assert_eq!(out.primary_text(), Some(&ComplicationText::plain("?")));
    }

    #[test]
    fn platform_fault_returns_raw() {
        let device = samsung();
        let platform = FakePlatform {
            heart_rate_fails: true,
            ..FakePlatform::default()
        };
        let sanitizer = Sanitizer::new(&device, &platform);
        let out = sanitizer.sanitize(
            &raw(),
            &Settings::default(),
            LEFT_SLOT_ID,
            Some(&health("Heart rate")),
        );
        assert_eq!(out, raw());
    }

    #[test]
    fn empty_data_is_never_rewritten() {
        let device = samsung();
        let platform = FakePlatform {
            heart_rate: Some(60.0),
            ..FakePlatform::default()
        };
        let sanitizer = Sanitizer::new(&device, &platform);
        let out = sanitizer.sanitize(
            &ComplicationData::Empty,
            &Settings::default(),
            LEFT_SLOT_ID,
            Some(&health("Heart rate")),
        );
        assert!(out.is_empty());
    }

    #[test]
    fn health_suite_6_20_suppresses_steps_and_retargets_activity() {
        let device = samsung();
        let platform = FakePlatform {
            health_version: Some(HEALTH_SUITE_6_20_0_016),
            ..FakePlatform::default()
        };
        let sanitizer = Sanitizer::new(&device, &platform);
        let settings = Settings::default();

        for provider in ["Steps", "Sleep", "Water"] {
            let out = sanitizer.sanitize(&raw(), &settings, LEFT_SLOT_ID, Some(&health(provider)));
            assert!(out.is_empty(), "{provider} should be suppressed");
        }

        let out = sanitizer.sanitize(
            &raw(),
            &settings,
            LEFT_SLOT_ID,
            Some(&health("Daily activity")),
        );
        assert_eq!(out.tap_action(), Some(&TapAction::new(HEALTH_HOME_ACTIVITY)));
        assert_eq!(out.primary_text(), raw().primary_text());
    }

    #[test]
    fn later_health_suites_only_retarget_activity() {
        let device = samsung();
        let platform = FakePlatform {
            health_version: Some(HEALTH_SUITE_6_21_0_051 + 10),
            ..FakePlatform::default()
        };
        let sanitizer = Sanitizer::new(&device, &platform);
        let settings = Settings::default();

        let steps = sanitizer.sanitize(&raw(), &settings, LEFT_SLOT_ID, Some(&health("Steps")));
        assert_eq!(steps, raw());

        let activity = sanitizer.sanitize(
            &raw(),
            &settings,
            LEFT_SLOT_ID,
            Some(&health("Daily activity")),
        );
        assert_eq!(
            activity.tap_action(),
            Some(&TapAction::new(HEALTH_HOME_ACTIVITY))
        );
    }

    #[test]
    fn unknown_health_version_disables_version_rules() {
        let device = samsung();
        let platform = FakePlatform::default();
        let sanitizer = Sanitizer::new(&device, &platform);
        assert_eq!(sanitizer.matching_rule(&health("Steps")), None);
    }

    #[test]
    fn calendar_rewrite_depends_on_slot_and_time_format() {
        let device = samsung().with_os("", parse_security_patch("2022-06-01"));
        let platform = FakePlatform {
            event: Some(CalendarEvent {
                title: "Standup".into(),
                // 2022-06-01 14:05 UTC
                begin: 1_654_092_300_000,
            }),
            ..FakePlatform::default()
        };
        let sanitizer = Sanitizer::new(&device, &platform);
        let mut settings = Settings::default();

        let bottom = sanitizer.sanitize(&raw(), &settings, BOTTOM_SLOT_ID, Some(&calendar()));
        assert_eq!(bottom.primary_text(), Some(&ComplicationText::plain("Standup")));
        assert_eq!(
            bottom.tap_action(),
            Some(&TapAction::new(CALENDAR_HOME_ACTIVITY))
        );

        let left = sanitizer.sanitize(&raw(), &settings, LEFT_SLOT_ID, Some(&calendar()));
        assert_eq!(left.primary_text(), Some(&ComplicationText::plain("14:05")));

        settings.use_24h_time_format = false;
        let left = sanitizer.sanitize(&raw(), &settings, LEFT_SLOT_ID, Some(&calendar()));
        assert_eq!(left.primary_text(), Some(&ComplicationText::plain("2:05")));
    }

    #[test]
    fn calendar_outside_patch_range_passes_through() {
        let device = samsung().with_os("", parse_security_patch("2023-02-01"));
        let platform = FakePlatform {
            event: Some(CalendarEvent {
                title: "Standup".into(),
                begin: 0,
            }),
            ..FakePlatform::default()
        };
        let sanitizer = Sanitizer::new(&device, &platform);
        let out = sanitizer.sanitize(&raw(), &Settings::default(), LEFT_SLOT_ID, Some(&calendar()));
        assert_eq!(out, raw());
    }

    #[test]
    fn no_calendar_event_keeps_raw() {
        let device = samsung().with_os("", parse_security_patch("2022-06-01"));
        let platform = FakePlatform::default();
        let sanitizer = Sanitizer::new(&device, &platform);
        let out = sanitizer.sanitize(&raw(), &Settings::default(), LEFT_SLOT_ID, Some(&calendar()));
        assert_eq!(out, raw());
    }

    #[test]
    fn localized_names_are_recognized() {
        let binding = ProviderBinding::new("p", "c", "三星健康", HEART_RATE_PROVIDER_NAMES[3]);
        assert_eq!(classify(&binding), Some(ProviderClass::HeartRate));
    }
}
