//! Per-slot complication lifecycle.
//!
//! Owns the slot set of the current style, the raw and sanitized data of
//! every slot, the provider bindings used to recognise broken providers, and
//! the default-provider wiring of the synthetic weather and battery slots.

use crate::host::HostPlatform;
use std::collections::{BTreeMap, HashMap};
use watchface_core::clock::HALF_HOUR_MS;
use watchface_core::quirks::QuirkFix;
use watchface_core::scheduler::next_update_delay;
use watchface_core::slot::{layout, BATTERY_SLOT_ID, WEATHER_SLOT_ID};
use watchface_core::{
    check_watch_battery, ComplicationData, ComplicationKind, ComplicationSlot, DefaultProvider,
    DeviceProfile, ProviderBinding, Sanitizer, Settings, SlotId, Style, TimeDependentRegistry,
    Timestamp, WatchBatteryCheck, WatchBatteryStatus, WeatherProvider,
};

/// Which part of the face a data delivery touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotUpdate {
    Complication,
    Weather,
    WatchBattery,
    /// Not a slot of the current style.
    Ignored,
}

#[derive(Debug)]
pub struct ComplicationManager {
    style: Style,
    slots: Vec<ComplicationSlot>,
    raw: HashMap<SlotId, ComplicationData>,
    sanitized: BTreeMap<SlotId, ComplicationData>,
    bindings: HashMap<SlotId, ProviderBinding>,
    registry: TimeDependentRegistry,

    weather_provider: Option<WeatherProvider>,
    weather: Option<ComplicationData>,
    weather_subscribed: bool,

    watch_battery: Option<ComplicationData>,
    watch_battery_status: WatchBatteryStatus,
    battery_subscribed: bool,
    battery_forced: bool,

    calendar_refreshed_at: Timestamp,
}

impl ComplicationManager {
    pub fn new(weather_provider: Option<WeatherProvider>) -> Self {
        Self {
            style: Style::default(),
            slots: Vec::new(),
            raw: HashMap::new(),
            sanitized: BTreeMap::new(),
            bindings: HashMap::new(),
            registry: TimeDependentRegistry::new(),
            weather_provider,
            weather: None,
            weather_subscribed: false,
            watch_battery: None,
            watch_battery_status: WatchBatteryStatus::Unknown,
            battery_subscribed: false,
            battery_forced: false,
            calendar_refreshed_at: 0,
        }
    }

    /// Bind the slot set of `style` and reset every slot cache. Returns the
    /// slots whose provider info must be requested.
    pub fn initialize(&mut self, style: Style, host: &dyn HostPlatform) -> Vec<SlotId> {
        self.style = style;
        self.slots = layout(style);
        self.raw.clear();
        self.sanitized.clear();
        self.bindings.clear();
        self.registry.clear();

        let provider_slots = self.slot_ids();
        let mut active = provider_slots.clone();
        active.extend([WEATHER_SLOT_ID, BATTERY_SLOT_ID]);
        host.set_active_slots(&active);

        tracing::debug!(?style, slots = ?provider_slots, "complication slots initialized");
        provider_slots
    }

    pub fn style(&self) -> Style {
        self.style
    }

    pub fn slot_ids(&self) -> Vec<SlotId> {
        self.slots.iter().map(|slot| slot.id).collect()
    }

    fn slot(&self, slot_id: SlotId) -> Option<&ComplicationSlot> {
        self.slots.iter().find(|slot| slot.id == slot_id)
    }

    /// Record which provider backs a slot. When the quirk that applies to the
    /// slot changed, the last raw value is delivered again so it is
    /// re-sanitized; returns `true` in that case.
    pub fn on_provider_info(
        &mut self,
        slot_id: SlotId,
        binding: Option<ProviderBinding>,
        sanitizer: &Sanitizer<'_>,
        settings: &Settings,
        now: Timestamp,
    ) -> bool {
        if self.slot(slot_id).is_none() {
            return false;
        }

        let previous = self
            .bindings
            .get(&slot_id)
            .and_then(|binding| sanitizer.matching_rule(binding));
        let current = binding
            .as_ref()
            .and_then(|binding| sanitizer.matching_rule(binding));

        match binding {
            Some(binding) => {
                self.bindings.insert(slot_id, binding);
            }
            None => {
                self.bindings.remove(&slot_id);
            }
        }

        if previous == current {
            return false;
        }

        tracing::debug!(slot_id, quirk = ?current.map(|rule| rule.fix), "provider quirk changed");
        let raw = self.raw.get(&slot_id).cloned().unwrap_or_default();
        self.apply(slot_id, raw, sanitizer, settings, now);
        true
    }

    /// Store a delivery from a provider.
    pub fn on_complication_data(
        &mut self,
        slot_id: SlotId,
        raw: ComplicationData,
        sanitizer: &Sanitizer<'_>,
        settings: &Settings,
        now: Timestamp,
    ) -> SlotUpdate {
        match slot_id {
            WEATHER_SLOT_ID => {
                self.weather = (raw.kind() == ComplicationKind::ShortText).then_some(raw);
                SlotUpdate::Weather
            }
            BATTERY_SLOT_ID => {
                self.on_watch_battery_data(raw, now);
                SlotUpdate::WatchBattery
            }
            _ => {
                let Some(slot) = self.slot(slot_id) else {
                    tracing::debug!(slot_id, "data for inactive slot ignored");
                    return SlotUpdate::Ignored;
                };
                if !slot.accepts(raw.kind()) {
                    tracing::warn!(slot_id, kind = ?raw.kind(), "unsupported complication kind");
                }
                self.apply(slot_id, raw, sanitizer, settings, now);
                SlotUpdate::Complication
            }
        }
    }

    fn apply(
        &mut self,
        slot_id: SlotId,
        raw: ComplicationData,
        sanitizer: &Sanitizer<'_>,
        settings: &Settings,
        now: Timestamp,
    ) {
        let sanitized = sanitizer.sanitize(&raw, settings, slot_id, self.bindings.get(&slot_id));
        self.registry.update(slot_id, &sanitized, now);
        self.sanitized.insert(slot_id, sanitized);
        self.raw.insert(slot_id, raw);
    }

    fn on_watch_battery_data(&mut self, raw: ComplicationData, now: Timestamp) {
        if raw.kind() != ComplicationKind::ShortText {
            self.watch_battery = None;
            return;
        }
        if let Some(text) = raw.short_text_value() {
            match WatchBatteryStatus::parse(&text.text_at(now)) {
                Ok(status) => self.watch_battery_status = status,
                Err(err) => tracing::warn!(error = %err, "unreadable watch battery text"),
            }
        }
        self.watch_battery = Some(raw);
    }

    /// Re-sanitize every slot, e.g. after a setting the fixes read changed.
    pub fn resanitize_all(&mut self, sanitizer: &Sanitizer<'_>, settings: &Settings, now: Timestamp) {
        let slots: Vec<SlotId> = self.raw.keys().copied().collect();
        self.redeliver(&slots, sanitizer, settings, now);
    }

    /// Deliver the last raw value of `slot_ids` again.
    pub fn redeliver(
        &mut self,
        slot_ids: &[SlotId],
        sanitizer: &Sanitizer<'_>,
        settings: &Settings,
        now: Timestamp,
    ) {
        for slot_id in slot_ids {
            if let Some(raw) = self.raw.get(slot_id).cloned() {
                self.apply(*slot_id, raw, sanitizer, settings, now);
            }
        }
    }

    /// Slots whose provider is repaired with `fix`.
    pub fn slots_with_fix(&self, sanitizer: &Sanitizer<'_>, fix: QuirkFix) -> Vec<SlotId> {
        let mut slots: Vec<SlotId> = self
            .bindings
            .iter()
            .filter(|(_, binding)| sanitizer.matching_rule(binding).is_some_and(|rule| rule.fix == fix))
            .map(|(slot_id, _)| *slot_id)
            .collect();
        slots.sort_unstable();
        slots
    }

    /// Re-sanitize calendar slots at most every half hour. Returns `true`
    /// when something was refreshed.
    pub fn refresh_calendar_if_due(
        &mut self,
        sanitizer: &Sanitizer<'_>,
        settings: &Settings,
        now: Timestamp,
    ) -> bool {
        if now.saturating_sub(self.calendar_refreshed_at) < HALF_HOUR_MS {
            return false;
        }
        let slots = self.slots_with_fix(sanitizer, QuirkFix::CalendarFromQuery);
        if slots.is_empty() {
            return false;
        }
        self.calendar_refreshed_at = now;
        self.redeliver(&slots, sanitizer, settings, now);
        tracing::debug!(slots = ?slots, "calendar complications refreshed");
        true
    }

    /// Bring the synthetic slot registrations in line with the settings.
    /// Returns `true` when a registration changed.
    pub fn update_subscriptions(
        &mut self,
        settings: &Settings,
        device: &DeviceProfile,
        host: &dyn HostPlatform,
    ) -> bool {
        let mut changed = false;

        let show_weather = settings.should_show_weather();
        if show_weather != self.weather_subscribed {
            match (&self.weather_provider, show_weather) {
                (Some(provider), true) => {
                    host.set_default_provider(WEATHER_SLOT_ID, Some(&provider.as_default_provider()));
                    self.weather_subscribed = true;
                    changed = true;
                }
                (None, true) => {
                    tracing::debug!("no weather provider installed");
                }
                (_, false) => {
                    host.set_default_provider(WEATHER_SLOT_ID, None);
                    self.weather_subscribed = false;
                    self.weather = None;
                    changed = true;
                }
            }
        }

        let show_battery = settings.should_show_watch_battery();
        let force = device.forces_watch_battery() && !self.battery_forced;
        if show_battery != self.battery_subscribed || force {
            let subscribe = show_battery || device.forces_watch_battery();
            let provider = subscribe.then_some(&DefaultProvider::SystemWatchBattery);
            host.set_default_provider(BATTERY_SLOT_ID, provider);
            if !subscribe {
                self.watch_battery = None;
                self.watch_battery_status = WatchBatteryStatus::Unknown;
            }
            self.battery_subscribed = show_battery;
            self.battery_forced |= force;
            changed = true;
        }

        changed
    }

    /// Compare the reported watch battery with an OS sample and resubscribe
    /// the battery provider after the second mismatch in a row.
    pub fn check_watch_battery(&mut self, sampled: u8, host: &dyn HostPlatform) -> WatchBatteryCheck {
        let check = check_watch_battery(&mut self.watch_battery_status, sampled);
        match check {
            WatchBatteryCheck::Resubscribe => {
                tracing::info!(sampled, "watch battery provider looks stuck, resubscribing");
                host.set_default_provider(BATTERY_SLOT_ID, None);
                host.set_default_provider(BATTERY_SLOT_ID, Some(&DefaultProvider::SystemWatchBattery));
            }
            WatchBatteryCheck::Tolerated => {
                tracing::debug!(sampled, "watch battery mismatch tolerated");
            }
            WatchBatteryCheck::UpToDate => {}
        }
        check
    }

    /// Sanitized data of the active slots.
    pub fn complications(&self) -> &BTreeMap<SlotId, ComplicationData> {
        &self.sanitized
    }

    pub fn raw(&self, slot_id: SlotId) -> Option<&ComplicationData> {
        self.raw.get(&slot_id)
    }

    pub fn binding(&self, slot_id: SlotId) -> Option<&ProviderBinding> {
        self.bindings.get(&slot_id)
    }

    pub fn weather(&self) -> Option<&ComplicationData> {
        self.weather.as_ref()
    }

    pub fn weather_activity(&self) -> Option<&str> {
        self.weather_provider
            .as_ref()
            .map(|provider| provider.activity.as_str())
    }

    pub fn watch_battery(&self) -> Option<&ComplicationData> {
        self.watch_battery.as_ref()
    }

    pub fn watch_battery_status(&self) -> WatchBatteryStatus {
        self.watch_battery_status
    }

    pub fn is_weather_subscribed(&self) -> bool {
        self.weather_subscribed
    }

    /// Delay until the next visible change, `None` for none.
    pub fn next_update_delay(&self, seconds_ring: bool, now: Timestamp) -> Option<u64> {
        next_update_delay(&self.registry, seconds_ring, now)
    }
}
