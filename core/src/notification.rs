//! Phone notification icons shown on the watch.
//!
//! The companion sends at most [`MAX_NOTIFICATION_ICONS`] icon ids per batch,
//! one per notification group, plus a flag telling whether more existed. The
//! watch turns each id into a [`Bitmap`] and publishes a [`NotificationState`].

use crate::clock::MINUTE_MS;
use crate::{IconId, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

pub const MAX_NOTIFICATION_ICONS: usize = 5;

/// Edge length, in pixels, of the icons the companion renders.
pub const NOTIFICATION_ICON_SIZE_PX: u32 = 32;

/// `Unknown` older than this shows a placeholder on the watch.
pub const NOTIFICATION_UNKNOWN_STALE_MS: u64 = MINUTE_MS;

/// Decoded RGBA8 image. Cheap to clone.
#[derive(Clone, PartialEq, Eq)]
pub struct Bitmap {
    pub width: u32,
    pub height: u32,
    pub pixels: Arc<[u8]>,
}

impl Bitmap {
    pub fn new(width: u32, height: u32, pixels: impl Into<Arc<[u8]>>) -> Self {
        Self {
            width,
            height,
            pixels: pixels.into(),
        }
    }
}

impl fmt::Debug for Bitmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bitmap")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.pixels.len())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationState {
    Unknown { created_at: Timestamp },
    DataReceived { icons: Vec<Bitmap>, has_more: bool },
}

impl NotificationState {
    pub fn unknown(now: Timestamp) -> Self {
        NotificationState::Unknown { created_at: now }
    }

    /// Only `Unknown` goes stale.
    pub fn is_stale(&self, now: Timestamp) -> bool {
        match self {
            NotificationState::Unknown { created_at } => {
                now.saturating_sub(*created_at) > NOTIFICATION_UNKNOWN_STALE_MS
            }
            NotificationState::DataReceived { .. } => false,
        }
    }
}

/// One active notification on the phone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhoneNotification {
    #[serde(default)]
    pub group_key: Option<String>,
    pub icon_id: IconId,
}

impl PhoneNotification {
    pub fn new(group_key: Option<&str>, icon_id: IconId) -> Self {
        Self {
            group_key: group_key.map(str::to_string),
            icon_id,
        }
    }
}

/// Icon ids to send in one data item.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationBatch {
    pub icon_ids: Vec<IconId>,
    pub has_more: bool,
}

impl NotificationBatch {
    /// Keep the first notification of each non-blank group, cap the list.
    pub fn from_active(notifications: &[PhoneNotification]) -> Self {
        let mut groups: HashSet<&str> = HashSet::new();
        let mut icon_ids = Vec::new();
        for notification in notifications {
            match notification.group_key.as_deref().map(str::trim) {
                Some(key) if !key.is_empty() => {
                    if groups.insert(key) {
                        icon_ids.push(notification.icon_id);
                    }
                }
                _ => icon_ids.push(notification.icon_id),
            }
        }
        Self::capped(icon_ids)
    }

    /// Truncate to [`MAX_NOTIFICATION_ICONS`], flagging anything dropped.
    pub fn capped(mut icon_ids: Vec<IconId>) -> Self {
        let has_more = icon_ids.len() > MAX_NOTIFICATION_ICONS;
        icon_ids.truncate(MAX_NOTIFICATION_ICONS);
        Self { icon_ids, has_more }
    }
}

/// Companion-side builder that skips re-sending an unchanged id list.
#[derive(Debug, Default)]
pub struct NotificationBatcher {
    last_sent: Option<Vec<IconId>>,
}

impl NotificationBatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// The batch to send for the current active list, or `None` when the
    /// watch already has it.
    pub fn next_batch(&mut self, notifications: &[PhoneNotification]) -> Option<NotificationBatch> {
        let batch = NotificationBatch::from_active(notifications);
        if self.last_sent.as_ref() == Some(&batch.icon_ids) {
            return None;
        }
        Some(batch)
    }

    /// Record a batch as delivered.
    pub fn mark_sent(&mut self, batch: &NotificationBatch) {
        self.last_sent = Some(batch.icon_ids.clone());
    }

    /// Forget what was sent, e.g. after sync is re-activated.
    pub fn reset(&mut self) {
        self.last_sent = None;
    }
}
