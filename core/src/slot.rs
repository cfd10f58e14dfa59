//! Complication slots and the two mutually exclusive layouts.
//!
//! Slot ids are stable across restarts because providers are bound to them by
//! the platform. Weather and watch battery are reserved synthetic slots: they
//! never take part in provider discovery and are bound through default
//! provider registration instead.

use crate::complication::ComplicationKind;
use crate::provider::{DefaultProvider, WeatherProvider};
use crate::SlotId;
use serde::{Deserialize, Serialize};

pub const LEFT_SLOT_ID: SlotId = 100;
pub const RIGHT_SLOT_ID: SlotId = 101;
pub const MIDDLE_SLOT_ID: SlotId = 102;
pub const BOTTOM_SLOT_ID: SlotId = 103;
pub const WEATHER_SLOT_ID: SlotId = 104;
pub const BATTERY_SLOT_ID: SlotId = 105;
pub const ANDROID_12_TOP_LEFT_SLOT_ID: SlotId = 106;
pub const ANDROID_12_TOP_RIGHT_SLOT_ID: SlotId = 107;
pub const ANDROID_12_BOTTOM_LEFT_SLOT_ID: SlotId = 108;
pub const ANDROID_12_BOTTOM_RIGHT_SLOT_ID: SlotId = 109;

/// Every slot that takes part in provider discovery, across both layouts.
pub const PROVIDER_SLOT_IDS: [SlotId; 8] = [
    LEFT_SLOT_ID,
    MIDDLE_SLOT_ID,
    RIGHT_SLOT_ID,
    BOTTOM_SLOT_ID,
    ANDROID_12_TOP_LEFT_SLOT_ID,
    ANDROID_12_TOP_RIGHT_SLOT_ID,
    ANDROID_12_BOTTOM_LEFT_SLOT_ID,
    ANDROID_12_BOTTOM_RIGHT_SLOT_ID,
];

const NORMAL_KINDS: [ComplicationKind; 4] = [
    ComplicationKind::ShortText,
    ComplicationKind::Icon,
    ComplicationKind::RangedValue,
    ComplicationKind::SmallImage,
];

const LARGE_KINDS: [ComplicationKind; 4] = [
    ComplicationKind::LongText,
    ComplicationKind::ShortText,
    ComplicationKind::Icon,
    ComplicationKind::SmallImage,
];

/// Visual style of the face. Each style owns its own set of slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Style {
    #[default]
    Regular,
    Android12,
}

/// Fixed screen positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SlotLocation {
    Left,
    Middle,
    Right,
    Bottom,
    Android12TopLeft,
    Android12TopRight,
    Android12BottomLeft,
    Android12BottomRight,
}

impl SlotLocation {
    pub fn slot_id(self) -> SlotId {
        match self {
            SlotLocation::Left => LEFT_SLOT_ID,
            SlotLocation::Middle => MIDDLE_SLOT_ID,
            SlotLocation::Right => RIGHT_SLOT_ID,
            SlotLocation::Bottom => BOTTOM_SLOT_ID,
            SlotLocation::Android12TopLeft => ANDROID_12_TOP_LEFT_SLOT_ID,
            SlotLocation::Android12TopRight => ANDROID_12_TOP_RIGHT_SLOT_ID,
            SlotLocation::Android12BottomLeft => ANDROID_12_BOTTOM_LEFT_SLOT_ID,
            SlotLocation::Android12BottomRight => ANDROID_12_BOTTOM_RIGHT_SLOT_ID,
        }
    }

    pub fn from_slot_id(id: SlotId) -> Option<Self> {
        match id {
            LEFT_SLOT_ID => Some(SlotLocation::Left),
            MIDDLE_SLOT_ID => Some(SlotLocation::Middle),
            RIGHT_SLOT_ID => Some(SlotLocation::Right),
            BOTTOM_SLOT_ID => Some(SlotLocation::Bottom),
            ANDROID_12_TOP_LEFT_SLOT_ID => Some(SlotLocation::Android12TopLeft),
            ANDROID_12_TOP_RIGHT_SLOT_ID => Some(SlotLocation::Android12TopRight),
            ANDROID_12_BOTTOM_LEFT_SLOT_ID => Some(SlotLocation::Android12BottomLeft),
            ANDROID_12_BOTTOM_RIGHT_SLOT_ID => Some(SlotLocation::Android12BottomRight),
            _ => None,
        }
    }

    /// Kinds accepted at this position, most preferred first.
    pub fn supported_kinds(self) -> &'static [ComplicationKind] {
        match self {
            SlotLocation::Bottom => &LARGE_KINDS,
            SlotLocation::Left
            | SlotLocation::Middle
            | SlotLocation::Right
            | SlotLocation::Android12TopLeft
            | SlotLocation::Android12TopRight
            | SlotLocation::Android12BottomLeft
            | SlotLocation::Android12BottomRight => &NORMAL_KINDS,
        }
    }

    /// Whether the slot is wide enough for long text.
    pub fn is_large(self) -> bool {
        matches!(self, SlotLocation::Bottom)
    }
}

/// A slot the face can render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplicationSlot {
    pub id: SlotId,
    /// Screen position; `None` for the synthetic slots.
    pub location: Option<SlotLocation>,
    pub supported_kinds: Vec<ComplicationKind>,
    /// Provider registered by the face itself rather than chosen by the user.
    pub default_provider: Option<DefaultProvider>,
}

impl ComplicationSlot {
    pub fn new(location: SlotLocation) -> Self {
        Self {
            id: location.slot_id(),
            location: Some(location),
            supported_kinds: location.supported_kinds().to_vec(),
            default_provider: None,
        }
    }

    /// The synthetic weather slot, bound to the discovered weather component.
    pub fn weather(provider: &WeatherProvider) -> Self {
        Self {
            id: WEATHER_SLOT_ID,
            location: None,
            supported_kinds: vec![ComplicationKind::ShortText],
            default_provider: Some(provider.as_default_provider()),
        }
    }

    /// The synthetic watch battery slot, bound to the platform battery provider.
    pub fn watch_battery() -> Self {
        Self {
            id: BATTERY_SLOT_ID,
            location: None,
            supported_kinds: vec![ComplicationKind::ShortText],
            default_provider: Some(DefaultProvider::SystemWatchBattery),
        }
    }

    pub fn accepts(&self, kind: ComplicationKind) -> bool {
        kind == ComplicationKind::Empty || self.supported_kinds.contains(&kind)
    }
}

/// The slot set for a style.
pub fn layout(style: Style) -> Vec<ComplicationSlot> {
    let locations: &[SlotLocation] = match style {
        Style::Regular => &[
            SlotLocation::Left,
            SlotLocation::Middle,
            SlotLocation::Right,
            SlotLocation::Bottom,
        ],
        Style::Android12 => &[
            SlotLocation::Android12TopLeft,
            SlotLocation::Android12TopRight,
            SlotLocation::Android12BottomLeft,
            SlotLocation::Android12BottomRight,
        ],
    };
    locations.iter().copied().map(ComplicationSlot::new).collect()
}

/// Whether `id` is one of the synthetic slots.
pub fn is_reserved_slot(id: SlotId) -> bool {
    id == WEATHER_SLOT_ID || id == BATTERY_SLOT_ID
}
