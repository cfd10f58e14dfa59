//! Device family and OS build identity.
//!
//! Several platform regressions only exist on one device family and one range
//! of OS builds. The gates live here so that the sanitizer and the engine ask
//! the same questions.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// OS incremental build suffixes that stop delivering the ambient minute tick.
pub const AMBIENT_TICK_BUGGY_INCREMENTALS: &[&str] = &["EVA8", "EVA9"];

/// First and last security patch (year, month, day) on which the OEM
/// calendar provider sends broken data.
pub const CALENDAR_BUGGY_PATCHES: [(i32, u32, u32); 2] = [(2022, 1, 1), (2022, 12, 31)];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DeviceFamily {
    #[default]
    Generic,
    /// Galaxy Watch line. Hosts every known provider quirk.
    Samsung,
    Oppo,
}

impl FromStr for DeviceFamily {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "generic" => Ok(DeviceFamily::Generic),
            "samsung" => Ok(DeviceFamily::Samsung),
            "oppo" => Ok(DeviceFamily::Oppo),
            other => Err(format!("unknown device family '{other}'")),
        }
    }
}

impl fmt::Display for DeviceFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DeviceFamily::Generic => "generic",
            DeviceFamily::Samsung => "samsung",
            DeviceFamily::Oppo => "oppo",
        };
        f.write_str(name)
    }
}

/// What the watch is and which OS build it runs.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceProfile {
    pub family: DeviceFamily,
    /// OS incremental build identifier, e.g. `R870XXU1EVA8`.
    pub os_incremental: String,
    pub security_patch: Option<NaiveDate>,
}

impl DeviceProfile {
    pub fn new(family: DeviceFamily) -> Self {
        Self {
            family,
            ..Self::default()
        }
    }

    pub fn with_os(mut self, incremental: impl Into<String>, patch: Option<NaiveDate>) -> Self {
        self.os_incremental = incremental.into();
        self.security_patch = patch;
        self
    }

    pub fn is_samsung(&self) -> bool {
        self.family == DeviceFamily::Samsung
    }

    /// The OS stops sending the per-minute tick in ambient mode.
    pub fn has_ambient_tick_bug(&self) -> bool {
        if !self.is_samsung() {
            return false;
        }
        let chars: Vec<char> = self.os_incremental.chars().collect();
        let start = chars.len().saturating_sub(4);
        let suffix: String = chars[start..].iter().collect();
        AMBIENT_TICK_BUGGY_INCREMENTALS.contains(&suffix.as_str())
    }

    /// The OEM calendar provider is broken on this build.
    pub fn has_calendar_bug(&self) -> bool {
        let [(fy, fm, fd), (ly, lm, ld)] = CALENDAR_BUGGY_PATCHES;
        let (Some(first), Some(last)) = (
            NaiveDate::from_ymd_opt(fy, fm, fd),
            NaiveDate::from_ymd_opt(ly, lm, ld),
        ) else {
            return false;
        };
        self.is_samsung()
            && self
                .security_patch
                .is_some_and(|patch| (first..=last).contains(&patch))
    }

    /// Watch battery must be subscribed once regardless of the user toggle,
    /// otherwise the device shows no battery at all.
    pub fn forces_watch_battery(&self) -> bool {
        self.is_samsung()
    }
}

/// Parse a `YYYY-MM-DD` security patch string.
pub fn parse_security_patch(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()
}
