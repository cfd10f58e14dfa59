//! Complication payloads as delivered by providers.
//!
//! A [`ComplicationData`] is a tagged union of the kinds a slot can render.
//! Text fields are [`ComplicationText`]s, which may depend on the current
//! time and therefore carry a "next change" instant used by the wake
//! scheduler.

use crate::clock::MINUTE_MS;
use crate::Timestamp;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The data kinds a slot can accept, in the order a slot prefers them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ComplicationKind {
    Empty,
    ShortText,
    LongText,
    Icon,
    RangedValue,
    SmallImage,
}

/// Opaque reference to an image resource (provider icon, bundled drawable).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IconRef(pub String);

impl IconRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

/// Opaque reference to whatever should open when the complication is tapped.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TapAction {
    /// Component or intent target understood by the host platform.
    pub target: String,
}

impl TapAction {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
        }
    }
}

/// Text shown by a complication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ComplicationText {
    /// Fixed text.
    Plain { text: String },
    /// Whole minutes until `reference` (rounded up) before it is reached,
    /// whole minutes since `reference` (rounded down) afterwards.
    TimeDifference { reference: Timestamp },
}

impl ComplicationText {
    pub fn plain(text: impl Into<String>) -> Self {
        ComplicationText::Plain { text: text.into() }
    }

    pub fn time_difference(reference: Timestamp) -> Self {
        ComplicationText::TimeDifference { reference }
    }

    /// Render the text as of `now`.
    pub fn text_at(&self, now: Timestamp) -> String {
        match self {
            ComplicationText::Plain { text } => text.clone(),
            ComplicationText::TimeDifference { reference } => {
                format!("{} min", difference_minutes(*reference, now))
            }
        }
    }

    /// Next instant strictly after `now` at which [`text_at`](Self::text_at)
    /// returns something different, or `None` if the text never changes.
    pub fn next_change_time(&self, now: Timestamp) -> Option<Timestamp> {
        match self {
            ComplicationText::Plain { .. } => None,
            ComplicationText::TimeDifference { reference } => {
                let reference = *reference;
                if now < reference {
                    let shown = (reference - now).div_ceil(MINUTE_MS);
                    Some(reference - (shown - 1) * MINUTE_MS)
                } else {
                    let shown = (now - reference) / MINUTE_MS;
                    Some(reference.saturating_add((shown + 1) * MINUTE_MS))
                }
            }
        }
    }

    /// Whether the rendered value depends on time.
    pub fn is_time_dependent(&self) -> bool {
        matches!(self, ComplicationText::TimeDifference { .. })
    }
}

fn difference_minutes(reference: Timestamp, now: Timestamp) -> u64 {
    if now < reference {
        (reference - now).div_ceil(MINUTE_MS)
    } else {
        (now - reference) / MINUTE_MS
    }
}

/// A complication payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ComplicationData {
    Empty,
    #[serde(rename_all = "camelCase")]
    ShortText {
        text: ComplicationText,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<ComplicationText>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        icon: Option<IconRef>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tap_action: Option<TapAction>,
    },
    #[serde(rename_all = "camelCase")]
    LongText {
        text: ComplicationText,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<ComplicationText>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        icon: Option<IconRef>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tap_action: Option<TapAction>,
    },
    #[serde(rename_all = "camelCase")]
    Icon {
        icon: IconRef,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tap_action: Option<TapAction>,
    },
    #[serde(rename_all = "camelCase")]
    RangedValue {
        value: f32,
        min: f32,
        max: f32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        text: Option<ComplicationText>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        icon: Option<IconRef>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tap_action: Option<TapAction>,
    },
    #[serde(rename_all = "camelCase")]
    SmallImage {
        image: IconRef,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tap_action: Option<TapAction>,
    },
}

impl Default for ComplicationData {
    fn default() -> Self {
        ComplicationData::Empty
    }
}

impl ComplicationData {
    /// Plain short text without icon or tap action.
    pub fn short_text(text: impl Into<String>) -> Self {
        ComplicationData::ShortText {
            text: ComplicationText::plain(text),
            title: None,
            icon: None,
            tap_action: None,
        }
    }

    /// Plain long text without icon or tap action.
    pub fn long_text(text: impl Into<String>) -> Self {
        ComplicationData::LongText {
            text: ComplicationText::plain(text),
            title: None,
            icon: None,
            tap_action: None,
        }
    }

    pub fn kind(&self) -> ComplicationKind {
        match self {
            ComplicationData::Empty => ComplicationKind::Empty,
            ComplicationData::ShortText { .. } => ComplicationKind::ShortText,
            ComplicationData::LongText { .. } => ComplicationKind::LongText,
            ComplicationData::Icon { .. } => ComplicationKind::Icon,
            ComplicationData::RangedValue { .. } => ComplicationKind::RangedValue,
            ComplicationData::SmallImage { .. } => ComplicationKind::SmallImage,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, ComplicationData::Empty)
    }

    pub fn tap_action(&self) -> Option<&TapAction> {
        match self {
            ComplicationData::Empty => None,
            ComplicationData::ShortText { tap_action, .. }
            | ComplicationData::LongText { tap_action, .. }
            | ComplicationData::Icon { tap_action, .. }
            | ComplicationData::RangedValue { tap_action, .. }
            | ComplicationData::SmallImage { tap_action, .. } => tap_action.as_ref(),
        }
    }

    /// Replace the tap target, keeping the payload.
    pub fn with_tap_action(mut self, action: Option<TapAction>) -> Self {
        match &mut self {
            ComplicationData::Empty => {}
            ComplicationData::ShortText { tap_action, .. }
            | ComplicationData::LongText { tap_action, .. }
            | ComplicationData::Icon { tap_action, .. }
            | ComplicationData::RangedValue { tap_action, .. }
            | ComplicationData::SmallImage { tap_action, .. } => *tap_action = action,
        }
        self
    }

    pub fn short_text_value(&self) -> Option<&ComplicationText> {
        match self {
            ComplicationData::ShortText { text, .. } => Some(text),
            _ => None,
        }
    }

    /// The main text of the payload, whatever its kind.
    pub fn primary_text(&self) -> Option<&ComplicationText> {
        match self {
            ComplicationData::ShortText { text, .. } | ComplicationData::LongText { text, .. } => {
                Some(text)
            }
            ComplicationData::RangedValue { text, .. } => text.as_ref(),
            ComplicationData::Empty
            | ComplicationData::Icon { .. }
            | ComplicationData::SmallImage { .. } => None,
        }
    }

    /// Next instant the rendered payload changes, `None` when it is static.
    pub fn next_change_time(&self, now: Timestamp) -> Option<Timestamp> {
        self.primary_text()?.next_change_time(now)
    }
}

impl fmt::Display for ComplicationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ComplicationKind::Empty => "empty",
            ComplicationKind::ShortText => "short_text",
            ComplicationKind::LongText => "long_text",
            ComplicationKind::Icon => "icon",
            ComplicationKind::RangedValue => "ranged_value",
            ComplicationKind::SmallImage => "small_image",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_never_changes() {
        let text = ComplicationText::plain("42%");
        assert_eq!(text.text_at(0), "42%");
        assert_eq!(text.next_change_time(123), None);
        assert!(!text.is_time_dependent());
    }

    #[test]
    fn countdown_rounds_up_and_changes_on_minute_boundaries() {
        let reference = 10 * MINUTE_MS;
        let text = ComplicationText::time_difference(reference);

        // 9.5 minutes left shows 10
        let now = reference - 9 * MINUTE_MS - 30_000;
        assert_eq!(text.text_at(now), "10 min");
        let next = text.next_change_time(now).unwrap();
        assert_eq!(next, reference - 9 * MINUTE_MS);
        assert_eq!(text.text_at(next), "9 min");
    }

    #[test]
    fn countdown_flips_to_elapsed_at_reference() {
        let reference = 5 * MINUTE_MS;
        let text = ComplicationText::time_difference(reference);

        let now = reference - 20_000;
        assert_eq!(text.text_at(now), "1 min");
        assert_eq!(text.next_change_time(now), Some(reference));
        assert_eq!(text.text_at(reference), "0 min");
        assert_eq!(
            text.next_change_time(reference),
            Some(reference + MINUTE_MS)
        );
    }

    #[test]
    fn next_change_is_strictly_in_the_future() {
        let text = ComplicationText::time_difference(1_000_000);
        for now in (0..2_000_000).step_by(7_919) {
            let next = text.next_change_time(now).unwrap();
            assert!(next > now, "now={now} next={next}");
            assert_ne!(text.text_at(now), text.text_at(next));
        }
    }

    #[test]
    fn tap_action_replacement_keeps_payload() {
        let data = ComplicationData::short_text("12")
            .with_tap_action(Some(TapAction::new("health/home")));
        assert_eq!(data.tap_action().unwrap().target, "health/home");
        assert_eq!(data.primary_text(), Some(&ComplicationText::plain("12")));
        assert_eq!(data.kind(), ComplicationKind::ShortText);

        let empty = ComplicationData::Empty.with_tap_action(Some(TapAction::new("x")));
        assert!(empty.tap_action().is_none());
    }

    #[test]
    fn serialization_format() {
        let data = ComplicationData::short_text("42%");
        let json = serde_json::to_string(&data).unwrap();
        assert!(json.contains(r#""type":"shortText""#));
        assert!(!json.contains("tapAction"));

        let parsed: ComplicationData = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, data);
    }
}
