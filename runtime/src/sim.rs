//! In-process stand-ins for the watch and phone platforms.
//!
//! Every knob is settable at runtime and every call the engine makes is
//! recorded, which is what both the simulator binary and the tests need.

use crate::host::{CompanionPlatform, HostPlatform};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast;
use watchface_core::{
    CalendarEvent, DefaultProvider, PlatformQueries, ProviderBinding, SlotId, Timestamp,
    WeatherProvider,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Default)]
struct HostState {
    active_slots: Vec<SlotId>,
    default_providers: HashMap<SlotId, DefaultProvider>,
    providers: HashMap<SlotId, ProviderBinding>,
    weather_provider: Option<WeatherProvider>,
    battery_level: Option<u8>,
    alarms: Vec<Timestamp>,
    heart_rate: Option<f64>,
    calendar_event: Option<CalendarEvent>,
    health_suite_version: u64,
    utc_offset_seconds: i32,
}

/// Simulated watch platform.
#[derive(Debug)]
pub struct SimHost {
    state: Mutex<HostState>,
    heart_rate_tx: broadcast::Sender<f64>,
}

impl Default for SimHost {
    fn default() -> Self {
        let (heart_rate_tx, _) = broadcast::channel(16);
        Self {
            state: Mutex::new(HostState::default()),
            heart_rate_tx,
        }
    }
}

impl SimHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_slots(&self) -> Vec<SlotId> {
        lock(&self.state).active_slots.clone()
    }

    pub fn default_provider(&self, slot_id: SlotId) -> Option<DefaultProvider> {
        lock(&self.state).default_providers.get(&slot_id).cloned()
    }

    /// Bind a user-chosen provider to a slot.
    pub fn set_provider(&self, slot_id: SlotId, binding: Option<ProviderBinding>) {
        let mut state = lock(&self.state);
        match binding {
            Some(binding) => state.providers.insert(slot_id, binding),
            None => state.providers.remove(&slot_id),
        };
    }

    pub fn set_weather_provider(&self, provider: Option<WeatherProvider>) {
        lock(&self.state).weather_provider = provider;
    }

    pub fn set_battery_level(&self, level: Option<u8>) {
        lock(&self.state).battery_level = level;
    }

    /// Update the sensor value and notify heart rate watchers.
    pub fn set_heart_rate(&self, bpm: Option<f64>) {
        lock(&self.state).heart_rate = bpm;
        if let Some(bpm) = bpm {
            let _ = self.heart_rate_tx.send(bpm);
        }
    }

    pub fn set_calendar_event(&self, event: Option<CalendarEvent>) {
        lock(&self.state).calendar_event = event;
    }

    pub fn set_health_suite_version(&self, version: u64) {
        lock(&self.state).health_suite_version = version;
    }

    pub fn set_utc_offset_seconds(&self, offset: i32) {
        lock(&self.state).utc_offset_seconds = offset;
    }

    /// Alarms requested so far, oldest first.
    pub fn alarms(&self) -> Vec<Timestamp> {
        lock(&self.state).alarms.clone()
    }
}

impl PlatformQueries for SimHost {
    fn heart_rate(&self) -> watchface_core::Result<Option<f64>> {
        Ok(lock(&self.state).heart_rate)
    }

    fn next_calendar_event(&self) -> watchface_core::Result<Option<CalendarEvent>> {
        Ok(lock(&self.state).calendar_event.clone())
    }

    fn health_suite_version(&self) -> watchface_core::Result<u64> {
        Ok(lock(&self.state).health_suite_version)
    }

    fn utc_offset_seconds(&self) -> i32 {
        lock(&self.state).utc_offset_seconds
    }
}

#[async_trait]
impl HostPlatform for SimHost {
    fn set_active_slots(&self, slot_ids: &[SlotId]) {
        lock(&self.state).active_slots = slot_ids.to_vec();
    }

    fn set_default_provider(&self, slot_id: SlotId, provider: Option<&DefaultProvider>) {
        let mut state = lock(&self.state);
        match provider {
            Some(provider) => state.default_providers.insert(slot_id, provider.clone()),
            None => state.default_providers.remove(&slot_id),
        };
        tracing::debug!(slot_id, ?provider, "default provider set");
    }

    async fn provider_info(&self, slot_ids: &[SlotId]) -> Vec<(SlotId, Option<ProviderBinding>)> {
        let state = lock(&self.state);
        slot_ids
            .iter()
            .map(|slot_id| (*slot_id, state.providers.get(slot_id).cloned()))
            .collect()
    }

    fn weather_provider(&self) -> Option<WeatherProvider> {
        lock(&self.state).weather_provider.clone()
    }

    fn watch_battery_level(&self) -> Option<u8> {
        lock(&self.state).battery_level
    }

    fn set_alarm(&self, at: Timestamp) {
        lock(&self.state).alarms.push(at);
        tracing::debug!(at, "alarm set");
    }

    fn heart_rate_changes(&self) -> broadcast::Receiver<f64> {
        self.heart_rate_tx.subscribe()
    }
}

/// Simulated phone platform.
#[derive(Debug)]
pub struct SimPhone {
    battery_percent: AtomicU8,
    notification_permission: AtomicBool,
}

impl SimPhone {
    pub fn new(battery_percent: u8, notification_permission: bool) -> Self {
        Self {
            battery_percent: AtomicU8::new(battery_percent.min(100)),
            notification_permission: AtomicBool::new(notification_permission),
        }
    }

    pub fn set_battery_percent(&self, percent: u8) {
        self.battery_percent.store(percent.min(100), Ordering::SeqCst);
    }

    pub fn set_notification_permission(&self, granted: bool) {
        self.notification_permission.store(granted, Ordering::SeqCst);
    }
}

impl CompanionPlatform for SimPhone {
    fn battery_percent(&self) -> Option<u8> {
        Some(self.battery_percent.load(Ordering::SeqCst))
    }

    fn has_notification_permission(&self) -> bool {
        self.notification_permission.load(Ordering::SeqCst)
    }
}
