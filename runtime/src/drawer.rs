//! Rendering capability.

use watchface_core::notification::NotificationState;
use watchface_core::{FrameSnapshot, PhoneBatteryStatus};

/// Paints one frame. Must not block.
pub trait Drawer: Send {
    fn draw(&mut self, frame: &FrameSnapshot);
}

/// Logs a one-line summary of every frame.
#[derive(Debug, Default)]
pub struct LogDrawer {
    frames: u64,
}

impl LogDrawer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Drawer for LogDrawer {
    fn draw(&mut self, frame: &FrameSnapshot) {
        self.frames += 1;

        let texts: Vec<String> = frame
            .complications
            .iter()
            .filter_map(|(slot_id, data)| {
                data.primary_text()
                    .map(|text| format!("{slot_id}={}", text.text_at(frame.time)))
            })
            .collect();

        let phone_battery = match &frame.phone_battery {
            Some(PhoneBatteryStatus::DataReceived { percentage, .. }) => format!("{percentage}%"),
            Some(PhoneBatteryStatus::Unknown) => "?".to_string(),
            None => "-".to_string(),
        };

        let notifications = match &frame.notifications {
            Some(NotificationState::DataReceived { icons, has_more }) => {
                format!("{}{}", icons.len(), if *has_more { "+" } else { "" })
            }
            Some(NotificationState::Unknown { .. }) => "?".to_string(),
            None => "-".to_string(),
        };

        let time = chrono::DateTime::from_timestamp_millis(frame.time as i64)
            .map(|time| time.format("%H:%M:%S").to_string())
            .unwrap_or_default();

        tracing::info!(
            frame = self.frames,
            %time,
            ambient = frame.mode.ambient,
            complications = %texts.join(" "),
            phone_battery = %phone_battery,
            notifications = %notifications,
            "draw"
        );
    }
}
