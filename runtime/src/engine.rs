//! The watch face engine.
//!
//! One task owns every piece of draw-side state: complications, phone
//! battery, notification icons, mode flags and the wake timer. Everything
//! else talks to it through an [`EngineHandle`]. Host callbacks, transport
//! events, setting changes and timers all end up in the same `select!` loop,
//! so state is never shared across threads.
//!
//! An invalidation runs one draw cycle:
//!
//! 1. bring the weather and watch battery registrations in line with the
//!    settings,
//! 2. build an immutable [`FrameSnapshot`] and hand it to the [`Drawer`],
//! 3. arm the next wake when the face is interactive and none is pending.

use crate::cancel::CancelScope;
use crate::complications::{ComplicationManager, SlotUpdate};
use crate::config::Config;
use crate::drawer::Drawer;
use crate::error::{Result, RuntimeError};
use crate::host::HostPlatform;
use crate::notifications::NotificationIconCache;
use crate::protocol::send_with_timeout;
use crate::scheduler::{UpdateScheduler, Wake};
use crate::storage::Storage;
use crate::transport::{best_node, Transport, TransportEvent};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use watchface_core::clock::{minute_index, until_next_minute, HALF_HOUR_MS};
use watchface_core::wire::{
    decode_battery_percent, decode_bool, decode_notifications_item, decode_premium_item,
};
use watchface_core::{
    route_tap, Clock, ComplicationData, DataItem, DeviceProfile, FrameSnapshot, Message, ModeFlags,
    Navigation, PhoneBatteryStatus, ProviderBinding, QuirkFix, Sanitizer, SettingKey, Settings,
    SlotId, TapContext, TapRegion, Timestamp, WirePath,
};

/// Input to the engine task.
#[derive(Debug)]
pub enum EngineCommand {
    ComplicationData {
        slot_id: SlotId,
        data: ComplicationData,
    },
    ProviderInfo {
        slot_id: SlotId,
        binding: Option<ProviderBinding>,
    },
    SetAmbient(bool),
    SetVisible(bool),
    SetMuted(bool),
    /// Minute tick, or the ambient alarm firing.
    TimeTick,
    Invalidate,
    Tap {
        region: TapRegion,
        reply: oneshot::Sender<Option<Navigation>>,
    },
    /// The frame the engine would draw right now.
    Snapshot(oneshot::Sender<FrameSnapshot>),
}

/// Cheap, cloneable access to a running engine.
#[derive(Debug, Clone)]
pub struct EngineHandle {
    commands: mpsc::UnboundedSender<EngineCommand>,
    scope: CancelScope,
}

impl EngineHandle {
    fn send(&self, command: EngineCommand) {
        if self.commands.send(command).is_err() {
            tracing::debug!("engine stopped, command dropped");
        }
    }

    pub fn complication_data(&self, slot_id: SlotId, data: ComplicationData) {
        self.send(EngineCommand::ComplicationData { slot_id, data });
    }

    pub fn provider_info(&self, slot_id: SlotId, binding: Option<ProviderBinding>) {
        self.send(EngineCommand::ProviderInfo { slot_id, binding });
    }

    pub fn set_ambient(&self, ambient: bool) {
        self.send(EngineCommand::SetAmbient(ambient));
    }

    pub fn set_visible(&self, visible: bool) {
        self.send(EngineCommand::SetVisible(visible));
    }

    pub fn set_muted(&self, muted: bool) {
        self.send(EngineCommand::SetMuted(muted));
    }

    pub fn time_tick(&self) {
        self.send(EngineCommand::TimeTick);
    }

    pub fn invalidate(&self) {
        self.send(EngineCommand::Invalidate);
    }

    /// Where a tap on `region` should lead. `None` when nothing happens or
    /// the engine is gone.
    pub async fn tap(&self, region: TapRegion) -> Option<Navigation> {
        let (reply, rx) = oneshot::channel();
        self.send(EngineCommand::Tap { region, reply });
        rx.await.ok().flatten()
    }

    pub async fn snapshot(&self) -> Option<FrameSnapshot> {
        let (reply, rx) = oneshot::channel();
        self.send(EngineCommand::Snapshot(reply));
        rx.await.ok()
    }

    /// Stop the engine and everything it spawned.
    pub fn shutdown(&self) {
        self.scope.cancel();
    }
}

pub struct WatchFaceEngine<H: HostPlatform + 'static, D: Drawer> {
    host: Arc<H>,
    drawer: D,
    device: DeviceProfile,
    transport: Arc<dyn Transport>,
    storage: Arc<dyn Storage>,
    clock: Arc<dyn Clock>,
    companion_capability: String,
    peer_timeout: Duration,
    scope: CancelScope,

    commands: mpsc::UnboundedReceiver<EngineCommand>,
    command_tx: mpsc::UnboundedSender<EngineCommand>,
    wakes: mpsc::UnboundedReceiver<Wake>,
    scheduler: UpdateScheduler,

    complications: ComplicationManager,
    notifications: Arc<NotificationIconCache>,
    settings: Settings,
    phone_battery: PhoneBatteryStatus,
    last_battery_sync_request: Option<Timestamp>,
    last_ambient_alarm_minute: Option<u64>,
    mode: ModeFlags,
    frames: u64,
}

impl<H: HostPlatform + 'static, D: Drawer + 'static> WatchFaceEngine<H, D> {
    pub fn new(
        config: &Config,
        host: Arc<H>,
        drawer: D,
        transport: Arc<dyn Transport>,
        storage: Arc<dyn Storage>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let scope = CancelScope::new();
        let (command_tx, commands) = mpsc::unbounded_channel();
        let (wake_tx, wakes) = mpsc::unbounded_channel();
        let notifications = Arc::new(NotificationIconCache::new(clock.clone(), scope.child()));
        let complications = ComplicationManager::new(host.weather_provider());

        Self {
            device: config.device_profile(),
            companion_capability: config.companion_capability.clone(),
            peer_timeout: config.peer_timeout,
            scheduler: UpdateScheduler::new(wake_tx, scope.child()),
            settings: storage.settings(),
            host,
            drawer,
            transport,
            storage,
            clock,
            scope,
            commands,
            command_tx,
            wakes,
            complications,
            notifications,
            phone_battery: PhoneBatteryStatus::Unknown,
            last_battery_sync_request: None,
            last_ambient_alarm_minute: None,
            mode: ModeFlags {
                ambient: false,
                muted: false,
                visible: true,
            },
            frames: 0,
        }
    }

    pub fn handle(&self) -> EngineHandle {
        EngineHandle {
            commands: self.command_tx.clone(),
            scope: self.scope.clone(),
        }
    }

    /// Run the engine on its own task.
    pub fn spawn(self) -> (EngineHandle, JoinHandle<()>) {
        let handle = self.handle();
        (handle, tokio::spawn(self.run()))
    }

    pub async fn run(mut self) {
        let mut transport_events = self.transport.subscribe();
        let mut setting_changes = self.storage.subscribe();
        let mut heart_rate = self.host.heart_rate_changes();
        let mut notification_state = self.notifications.subscribe();
        let mut transport_open = true;
        let mut settings_open = true;
        let mut heart_rate_open = true;

        self.start();

        loop {
            tokio::select! {
                _ = self.scope.cancelled() => break,
                Some(command) = self.commands.recv() => self.on_command(command),
                Some(wake) = self.wakes.recv() => {
                    if self.scheduler.on_wake(wake) {
                        self.invalidate();
                    }
                }
                event = transport_events.recv(), if transport_open => {
                    if let Some(event) = received(event, &mut transport_open, "transport") {
                        self.on_transport_event(event);
                    }
                }
                key = setting_changes.recv(), if settings_open => {
                    if let Some(key) = received(key, &mut settings_open, "settings") {
                        self.on_setting_changed(key);
                    }
                }
                bpm = heart_rate.recv(), if heart_rate_open => {
                    if received(bpm, &mut heart_rate_open, "heart rate").is_some() {
                        self.on_heart_rate_changed();
                    }
                }
                Ok(()) = notification_state.changed() => self.on_notifications_changed(),
            }
        }

        self.stop();
    }

    fn start(&mut self) {
        let slots = self
            .complications
            .initialize(self.settings.style(), self.host.as_ref());
        self.request_provider_info(slots);
        self.send_startup_signals();
        tracing::info!(
            device = ?self.device.family,
            premium = self.settings.user_premium,
            "watch face engine started"
        );
        self.invalidate();
    }

    fn stop(&mut self) {
        self.scheduler.cancel();
        self.notifications.shutdown();
        self.scope.cancel();
        tracing::info!(frames = self.frames, "watch face engine stopped");
    }

    fn on_command(&mut self, command: EngineCommand) {
        match command {
            EngineCommand::ComplicationData { slot_id, data } => {
                self.on_complication_data(slot_id, data)
            }
            EngineCommand::ProviderInfo { slot_id, binding } => {
                self.on_provider_info(slot_id, binding)
            }
            EngineCommand::SetAmbient(ambient) => self.on_ambient_changed(ambient),
            EngineCommand::SetVisible(visible) => {
                self.mode.visible = visible;
                if visible {
                    self.invalidate();
                } else {
                    self.scheduler.cancel();
                }
            }
            EngineCommand::SetMuted(muted) => {
                self.mode.muted = muted;
                self.invalidate();
            }
            EngineCommand::TimeTick => self.on_time_tick(),
            EngineCommand::Invalidate => self.invalidate(),
            EngineCommand::Tap { region, reply } => {
                let _ = reply.send(self.route_tap(region));
            }
            EngineCommand::Snapshot(reply) => {
                let _ = reply.send(self.frame(self.clock.now()));
            }
        }
    }

    // Draw cycle

    fn invalidate(&mut self) {
        if !self.mode.visible {
            tracing::trace!("not visible, draw skipped");
            return;
        }
        let now = self.clock.now();

        self.complications
            .update_subscriptions(&self.settings, &self.device, self.host.as_ref());

        let frame = self.frame(now);
        self.drawer.draw(&frame);
        self.frames += 1;

        if !self.mode.ambient && !self.scheduler.has_pending() {
            if let Some(delay) = self
                .complications
                .next_update_delay(self.settings.show_seconds_ring, now)
            {
                self.scheduler.schedule_next(delay);
            }
        }
    }

    fn complications_visible(&self) -> bool {
        !self.mode.ambient || self.settings.show_complications_in_ambient
    }

    fn notifications_visible(&self) -> bool {
        self.settings.notifications_sync_activated
            && (!self.mode.ambient || self.settings.show_notifications_in_ambient)
    }

    fn frame(&self, now: Timestamp) -> FrameSnapshot {
        let settings = &self.settings;
        let battery_hidden = self.mode.ambient && settings.hide_battery_in_ambient;

        FrameSnapshot {
            time: now,
            style: self.complications.style(),
            complications: if self.complications_visible() {
                self.complications.complications().clone()
            } else {
                BTreeMap::new()
            },
            weather: settings
                .should_show_weather()
                .then(|| self.complications.weather().cloned())
                .flatten(),
            watch_battery: (settings.should_show_watch_battery() && !battery_hidden)
                .then(|| self.complications.watch_battery().cloned())
                .flatten(),
            phone_battery: (settings.show_phone_battery && !battery_hidden)
                .then_some(self.phone_battery),
            notifications: self
                .notifications_visible()
                .then(|| self.notifications.state()),
            mode: self.mode,
        }
    }

    // Complications

    fn on_complication_data(&mut self, slot_id: SlotId, data: ComplicationData) {
        let now = self.clock.now();
        let sanitizer = Sanitizer::new(&self.device, self.host.as_ref());
        let update =
            self.complications
                .on_complication_data(slot_id, data, &sanitizer, &self.settings, now);

        match update {
            SlotUpdate::Complication => {
                // The next update time may have moved.
                self.scheduler.cancel();
                if self.complications_visible() {
                    self.invalidate();
                }
            }
            SlotUpdate::Weather => {
                if self.settings.should_show_weather() {
                    self.invalidate();
                }
            }
            SlotUpdate::WatchBattery => {
                if self.settings.should_show_watch_battery() {
                    self.invalidate();
                }
            }
            SlotUpdate::Ignored => {}
        }
    }

    fn on_provider_info(&mut self, slot_id: SlotId, binding: Option<ProviderBinding>) {
        let now = self.clock.now();
        let sanitizer = Sanitizer::new(&self.device, self.host.as_ref());
        let redelivered =
            self.complications
                .on_provider_info(slot_id, binding, &sanitizer, &self.settings, now);
        if redelivered && self.complications_visible() {
            self.scheduler.cancel();
            self.invalidate();
        }
    }

    fn request_provider_info(&self, slot_ids: Vec<SlotId>) {
        let host = Arc::clone(&self.host);
        let commands = self.command_tx.clone();
        let scope = self.scope.clone();
        tokio::spawn(async move {
            let infos = scope
                .run(async { Ok::<_, RuntimeError>(host.provider_info(&slot_ids).await) })
                .await;
            let Ok(infos) = infos else {
                return;
            };
            for (slot_id, binding) in infos {
                let _ = commands.send(EngineCommand::ProviderInfo { slot_id, binding });
            }
        });
    }

    fn on_heart_rate_changed(&mut self) {
        let now = self.clock.now();
        let sanitizer = Sanitizer::new(&self.device, self.host.as_ref());
        let slots = self
            .complications
            .slots_with_fix(&sanitizer, QuirkFix::LiveHeartRate);
        if slots.is_empty() {
            return;
        }
        self.complications
            .redeliver(&slots, &sanitizer, &self.settings, now);
        if self.complications_visible() {
            self.invalidate();
        }
    }

    // Mode and time

    fn on_ambient_changed(&mut self, ambient: bool) {
        if self.mode.ambient == ambient {
            return;
        }
        self.mode.ambient = ambient;
        self.scheduler.cancel();
        if ambient {
            self.arm_ambient_alarm(self.clock.now());
        }
        self.invalidate();
    }

    fn on_time_tick(&mut self) {
        let now = self.clock.now();

        self.resync_phone_battery_if_stale(now);

        if self.device.forces_watch_battery() {
            if let Some(level) = self.host.watch_battery_level() {
                self.complications
                    .check_watch_battery(level, self.host.as_ref());
            }
        }

        let sanitizer = Sanitizer::new(&self.device, self.host.as_ref());
        self.complications
            .refresh_calendar_if_due(&sanitizer, &self.settings, now);

        if self.mode.ambient {
            self.arm_ambient_alarm(now);
        }
        self.invalidate();
    }

    /// Some devices stop delivering ambient ticks. Wake them at the next
    /// minute boundary, once per minute.
    fn arm_ambient_alarm(&mut self, now: Timestamp) {
        if !self.device.has_ambient_tick_bug() {
            return;
        }
        let at = now + until_next_minute(now);
        let minute = minute_index(at);
        if self.last_ambient_alarm_minute == Some(minute) {
            return;
        }
        self.host.set_alarm(at);
        self.last_ambient_alarm_minute = Some(minute);
        tracing::debug!(at, "ambient alarm armed");
    }

    fn resync_phone_battery_if_stale(&mut self, now: Timestamp) {
        if !self.settings.show_phone_battery || !self.phone_battery.is_stale(now) {
            return;
        }
        if self
            .last_battery_sync_request
            .is_some_and(|at| now.saturating_sub(at) < HALF_HOUR_MS)
        {
            return;
        }
        self.last_battery_sync_request = Some(now);
        tracing::info!("phone battery is stale, asking the companion again");
        self.signal_companion(vec![WirePath::BatteryActivate]);
    }

    // Companion

    /// Remind the companion of the persisted sync choices.
    fn send_startup_signals(&self) {
        let battery = if self.settings.show_phone_battery {
            WirePath::BatteryActivate
        } else {
            WirePath::BatteryDeactivate
        };
        let notifications = if self.settings.notifications_sync_activated {
            WirePath::NotificationsActivate
        } else {
            WirePath::NotificationsDeactivate
        };
        self.signal_companion(vec![battery, notifications]);
    }

    fn signal_companion(&self, paths: Vec<WirePath>) {
        let transport = Arc::clone(&self.transport);
        let capability = self.companion_capability.clone();
        let timeout = self.peer_timeout;
        let scope = self.scope.clone();
        tokio::spawn(async move {
            let sent = scope
                .run(send_to_companion(
                    transport.as_ref(),
                    &capability,
                    timeout,
                    &paths,
                ))
                .await;
            match sent {
                Ok(true) => tracing::debug!(?paths, "companion signalled"),
                Ok(false) => tracing::debug!("no companion in reach"),
                Err(err) if err.is_cancelled() => {}
                Err(err) => tracing::warn!(error = %err, "failed to signal companion"),
            }
        });
    }

    fn on_transport_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Message(message) => self.on_message(&message),
            TransportEvent::DataChanged(item) => self.on_data_changed(&item),
            TransportEvent::CapabilityChanged { .. } => {}
        }
    }

    fn on_message(&mut self, message: &Message) {
        match WirePath::parse(&message.path) {
            Ok(WirePath::BatteryStatus) => self.on_phone_battery(&message.payload),
            Ok(WirePath::PremiumMessage) => match decode_bool(&message.path, &message.payload) {
                Ok(premium) => self.on_premium(premium),
                Err(err) => tracing::warn!(error = %err, "malformed premium message"),
            },
            // Sync replies belong to the sync clients.
            Ok(_) => {}
            Err(err) => tracing::debug!(error = %err, "message ignored"),
        }
    }

    fn on_phone_battery(&mut self, payload: &[u8]) {
        let now = self.clock.now();
        let status = decode_battery_percent(payload)
            .and_then(|percentage| PhoneBatteryStatus::received(percentage, now));
        match status {
            Ok(status) => {
                self.phone_battery = status;
                tracing::debug!(?status, "phone battery received");
                if self.settings.show_phone_battery {
                    self.invalidate();
                }
            }
            Err(err) => tracing::error!(error = %err, "invalid phone battery status"),
        }
    }

    fn on_data_changed(&mut self, item: &DataItem) {
        match WirePath::parse(&item.path) {
            Ok(WirePath::PremiumItem) => match decode_premium_item(item) {
                Ok(Some(premium)) => self.on_premium(premium),
                Ok(None) => tracing::debug!("premium item without flag"),
                Err(err) => tracing::warn!(error = %err, "malformed premium item"),
            },
            Ok(WirePath::NotificationsItem) => self.on_notifications_item(item),
            Ok(_) | Err(_) => tracing::debug!(path = %item.path, "data item ignored"),
        }
    }

    fn on_premium(&mut self, premium: bool) {
        if self.storage.get(SettingKey::UserPremium) == premium {
            tracing::debug!(premium, "premium unchanged");
            return;
        }
        // The settings subscription picks the change up and redraws.
        match self.storage.set(SettingKey::UserPremium, premium) {
            Ok(()) => tracing::info!(premium, "premium updated"),
            Err(err) => tracing::error!(error = %err, "failed to persist premium"),
        }
    }

    fn on_notifications_item(&mut self, item: &DataItem) {
        if !self.settings.notifications_sync_activated {
            tracing::debug!("notification sync off, item ignored");
            return;
        }
        let batch = match decode_notifications_item(item) {
            Ok(batch) => batch,
            Err(err) => {
                tracing::error!(error = %err, "malformed notifications item");
                return;
            }
        };
        let cache = Arc::clone(&self.notifications);
        let transport = Arc::clone(&self.transport);
        tokio::spawn(async move {
            // A failed batch leaves the cache state alone.
            match cache.on_batch_received(batch, transport.as_ref()).await {
                Ok(()) => {}
                Err(err) if err.is_cancelled() => {}
                Err(err) => tracing::warn!(error = %err, "notification icons not updated"),
            }
        });
    }

    fn on_notifications_changed(&mut self) {
        if self.notifications_visible() {
            self.invalidate();
        }
    }

    // Settings and taps

    fn on_setting_changed(&mut self, key: SettingKey) {
        self.settings = self.storage.settings();
        let now = self.clock.now();

        if key.affects_sanitizing() {
            let sanitizer = Sanitizer::new(&self.device, self.host.as_ref());
            self.complications
                .resanitize_all(&sanitizer, &self.settings, now);
        }

        match key {
            SettingKey::UseAndroid12Style => {
                let slots = self
                    .complications
                    .initialize(self.settings.style(), self.host.as_ref());
                self.scheduler.cancel();
                self.request_provider_info(slots);
            }
            SettingKey::NotificationsSyncActivated if !self.settings.notifications_sync_activated => {
                self.notifications.reset();
            }
            _ => {}
        }

        tracing::debug!(%key, "setting changed");
        self.invalidate();
    }

    fn route_tap(&self, region: TapRegion) -> Option<Navigation> {
        let notifications = self.notifications.state();
        let ctx = TapContext {
            settings: &self.settings,
            complications: self.complications.complications(),
            weather_activity: self.complications.weather_activity(),
            phone_battery: &self.phone_battery,
            notifications: &notifications,
            now: self.clock.now(),
        };
        route_tap(region, &ctx)
    }
}

/// Unwrap a broadcast receive, closing the branch when the sender is gone.
fn received<T>(result: std::result::Result<T, RecvError>, open: &mut bool, source: &str) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(RecvError::Lagged(skipped)) => {
            tracing::warn!(source, skipped, "events lagged");
            None
        }
        Err(RecvError::Closed) => {
            *open = false;
            None
        }
    }
}

/// Send each of `paths` with an empty payload to the best companion.
/// Returns `false` when no companion is in reach.
async fn send_to_companion(
    transport: &dyn Transport,
    capability: &str,
    timeout: Duration,
    paths: &[WirePath],
) -> Result<bool> {
    let nodes = tokio::time::timeout(timeout, transport.reachable_nodes(capability))
        .await
        .map_err(|_| RuntimeError::Timeout("capability lookup"))??;
    let Some(node) = best_node(&nodes) else {
        return Ok(false);
    };
    for path in paths {
        send_with_timeout(transport, &node.id, *path, Vec::new(), timeout).await?;
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loopback::LoopbackNetwork;
    use crate::sim::SimHost;
    use crate::storage::SettingsStore;
    use std::sync::Mutex;
    use watchface_core::slot::LEFT_SLOT_ID;
    use watchface_core::{DeviceFamily, ManualClock};

    #[derive(Clone, Default)]
    struct RecordingDrawer {
        frames: Arc<Mutex<Vec<FrameSnapshot>>>,
    }

    impl RecordingDrawer {
        fn count(&self) -> usize {
            self.frames.lock().unwrap().len()
        }

        fn last(&self) -> FrameSnapshot {
            self.frames.lock().unwrap().last().cloned().unwrap()
        }
    }

    impl Drawer for RecordingDrawer {
        fn draw(&mut self, frame: &FrameSnapshot) {
            self.frames.lock().unwrap().push(frame.clone());
        }
    }

    struct Fixture {
        handle: EngineHandle,
        drawer: RecordingDrawer,
        host: Arc<SimHost>,
        storage: Arc<SettingsStore>,
        phone: crate::loopback::LoopbackTransport,
        watch_node: String,
    }

    fn fixture(config: Config, settings: Settings) -> Fixture {
        let network = LoopbackNetwork::new_shared();
        let watch = network.join("watch", true);
        let phone = network.join("phone", true);
        let host = Arc::new(SimHost::new());
        let storage = Arc::new(SettingsStore::in_memory(settings));
        let drawer = RecordingDrawer::default();
        let watch_node = watch.local_node();

        let engine = WatchFaceEngine::new(
            &config,
            host.clone(),
            drawer.clone(),
            Arc::new(watch),
            storage.clone(),
            Arc::new(ManualClock::new(1_000_000)),
        );
        let (handle, _task) = engine.spawn();
        Fixture {
            handle,
            drawer,
            host,
            storage,
            phone,
            watch_node,
        }
    }

    async fn settle(handle: &EngineHandle) -> FrameSnapshot {
        // With paused time the sleep only ends once every task is idle.
        tokio::time::sleep(Duration::from_millis(1)).await;
        handle.snapshot().await.unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn draws_on_start_and_on_data() {
        let f = fixture(Config::default(), Settings::default());
        settle(&f.handle).await;
        let before = f.drawer.count();
        assert!(before >= 1);

        f.handle
            .complication_data(LEFT_SLOT_ID, ComplicationData::short_text("12"));
        settle(&f.handle).await;
        assert!(f.drawer.count() > before);
        assert!(f.drawer.last().complications.contains_key(&LEFT_SLOT_ID));
    }

    #[tokio::test(start_paused = true)]
    async fn phone_battery_without_sync_updates_silently() {
        let f = fixture(Config::default(), Settings::default());
        settle(&f.handle).await;
        let before = f.drawer.count();

        f.phone
            .send_message(&f.watch_node, WirePath::BatteryStatus, vec![77])
            .await
            .unwrap();
        let frame = settle(&f.handle).await;

        assert_eq!(f.drawer.count(), before);
        assert_eq!(frame.phone_battery, None);

        f.storage.set(SettingKey::ShowPhoneBattery, true).unwrap();
        let frame = settle(&f.handle).await;
        assert_eq!(
            frame.phone_battery.and_then(|status| status.percentage()),
            Some(77)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn premium_is_deduplicated() {
        let f = fixture(Config::default(), Settings::default());
        let mut changes = f.storage.subscribe();
        settle(&f.handle).await;

        for _ in 0..3 {
            f.phone
                .send_message(&f.watch_node, WirePath::PremiumMessage, vec![1])
                .await
                .unwrap();
        }
        settle(&f.handle).await;

        assert_eq!(changes.recv().await.unwrap(), SettingKey::UserPremium);
        assert!(changes.try_recv().is_err());
        assert!(f.storage.get(SettingKey::UserPremium));
    }

    #[tokio::test(start_paused = true)]
    async fn ambient_hides_complications_unless_enabled() {
        let f = fixture(Config::default(), Settings::default());
        f.handle
            .complication_data(LEFT_SLOT_ID, ComplicationData::short_text("12"));
        f.handle.set_ambient(true);
        let frame = settle(&f.handle).await;
        assert!(frame.mode.ambient);
        assert!(frame.complications.is_empty());

        f.storage
            .set(SettingKey::ShowComplicationsInAmbient, true)
            .unwrap();
        let frame = settle(&f.handle).await;
        assert!(frame.complications.contains_key(&LEFT_SLOT_ID));
    }

    #[tokio::test(start_paused = true)]
    async fn ambient_alarm_armed_once_per_minute_on_buggy_device() {
        let config = Config {
            device_family: DeviceFamily::Samsung,
            os_incremental: "R890XXU1EVA8".to_string(),
            ..Config::default()
        };
        let f = fixture(config, Settings::default());
        f.handle.set_ambient(true);
        f.handle.time_tick();
        f.handle.time_tick();
        settle(&f.handle).await;

        // Clock sits at 1_000_000 ms, next boundary is 1_020_000 ms.
        assert_eq!(f.host.alarms(), vec![1_020_000]);
    }

    #[tokio::test(start_paused = true)]
    async fn nothing_drawn_while_invisible() {
        let f = fixture(Config::default(), Settings::default());
        f.handle.set_visible(false);
        settle(&f.handle).await;
        let before = f.drawer.count();

        f.handle.invalidate();
        f.handle.time_tick();
        settle(&f.handle).await;
        assert_eq!(f.drawer.count(), before);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_icon_fetch_keeps_placeholder() {
        use crate::notifications::encode_icon;
        use watchface_core::wire::notifications_request;
        use watchface_core::{Bitmap, NotificationBatch, NotificationState};

        let settings = Settings {
            user_premium: true,
            notifications_sync_activated: true,
            ..Settings::default()
        };
        let f = fixture(Config::default(), settings);
        settle(&f.handle).await;

        let icons = BTreeMap::from([(5, encode_icon(&Bitmap::new(1, 1, vec![5; 4])).unwrap())]);
        let batch = NotificationBatch::capped(vec![5]);

        // The asset disappears before the watch gets to fetch it.
        f.phone
            .put_data_item(notifications_request(&batch, &icons, 0))
            .await
            .unwrap();
        assert!(f.phone.network().forget_asset("icon-5-0"));
        let frame = settle(&f.handle).await;
        assert!(matches!(
            frame.notifications,
            Some(NotificationState::Unknown { .. })
        ));

        f.phone
            .put_data_item(notifications_request(&batch, &icons, 1))
            .await
            .unwrap();
        let frame = settle(&f.handle).await;
        assert!(matches!(
            frame.notifications,
            Some(NotificationState::DataReceived { ref icons, .. }) if icons.len() == 1
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_stops_the_engine() {
        let f = fixture(Config::default(), Settings::default());
        settle(&f.handle).await;
        f.handle.shutdown();
        tokio::task::yield_now().await;
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(f.handle.snapshot().await.is_none());
    }
}
