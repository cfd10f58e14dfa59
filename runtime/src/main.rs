//! Watch face simulator.
//!
//! Runs the engine against a simulated watch and phone connected through the
//! loopback transport, and plays a short script: premium purchase, battery
//! and notification sync, a few complication updates and an ambient cycle.
//! Frames are logged by the `LogDrawer`.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use watchface_core::slot::{LEFT_SLOT_ID, RIGHT_SLOT_ID};
use watchface_core::{
    Bitmap, Clock, ComplicationData, ComplicationText, PhoneNotification, Settings, SyncState,
    SystemClock, TapRegion,
};
use watchface_runtime::notifications::encode_icon;
use watchface_runtime::{
    BatterySync, CancelScope, CompanionResponder, Config, LogDrawer, LoopbackNetwork,
    NotificationsSync, PremiumPublisher, SettingsStore, SimHost, SimPhone, Storage, SyncClient,
    WatchFaceEngine,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "watchface_runtime=debug,watchface_sim=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;
    tracing::info!(device = ?config.device_family, "starting watch face simulator");

    let clock = Arc::new(SystemClock);
    let network = LoopbackNetwork::new_shared();

    // Phone side
    let phone = network.join("Pixel 8", true);
    phone.advertise(&config.companion_capability);
    let phone_platform = Arc::new(SimPhone::new(83, true));
    let phone_storage = Arc::new(SettingsStore::in_memory(Settings::default()));
    let phone_scope = CancelScope::new();
    let responder = Arc::new(CompanionResponder::new(
        Arc::new(phone.clone()),
        phone_storage,
        phone_platform.clone(),
        clock.clone(),
        config.watch_capability.clone(),
        config.peer_timeout,
        phone_scope.child(),
    ));
    responder.start();
    let publisher = PremiumPublisher::new(
        Arc::new(phone.clone()),
        clock.clone(),
        config.watch_capability.clone(),
        config.peer_timeout,
    );

    // Watch side
    let watch = network.join("Galaxy Watch", true);
    watch.advertise(&config.watch_capability);
    let watch_storage: Arc<SettingsStore> = match &config.settings_path {
        Some(path) => Arc::new(SettingsStore::open(path)?),
        None => Arc::new(SettingsStore::in_memory(Settings::default())),
    };
    let host = Arc::new(SimHost::new());
    host.set_battery_level(Some(64));

    let engine = WatchFaceEngine::new(
        &config,
        host.clone(),
        LogDrawer::new(),
        Arc::new(watch.clone()),
        watch_storage.clone(),
        clock.clone(),
    );
    let (engine_handle, engine_task) = engine.spawn();

    let watch_scope = CancelScope::new();
    let battery_sync = SyncClient::<BatterySync>::new(
        Arc::new(watch.clone()),
        watch_storage.clone(),
        config.companion_capability.clone(),
        config.peer_timeout,
        watch_scope.child(),
    );
    let notifications_sync = SyncClient::<NotificationsSync>::new(
        Arc::new(watch.clone()),
        watch_storage.clone(),
        config.companion_capability.clone(),
        config.peer_timeout,
        watch_scope.child(),
    );
    battery_sync.start();
    notifications_sync.start();

    // Premium purchase on the phone
    tracing::info!(status = ?publisher.wearable_status().await?, "wearable status");
    publisher.publish(true).await?;

    // Complications
    engine_handle.complication_data(LEFT_SLOT_ID, ComplicationData::short_text("72"));
    engine_handle.complication_data(
        RIGHT_SLOT_ID,
        ComplicationData::ShortText {
            text: ComplicationText::time_difference(clock.now() + 90_000),
            title: None,
            icon: None,
            tap_action: None,
        },
    );

    // Battery sync
    settle(&mut battery_sync.subscribe_state()).await;
    battery_sync.toggle(true);
    settle(&mut battery_sync.subscribe_state()).await;
    phone_platform.set_battery_percent(79);
    responder.on_battery_changed().await?;

    // Notification sync
    settle(&mut notifications_sync.subscribe_state()).await;
    notifications_sync.toggle(true);
    settle(&mut notifications_sync.subscribe_state()).await;

    let active = vec![
        PhoneNotification::new(Some("chat"), 1),
        PhoneNotification::new(Some("chat"), 1),
        PhoneNotification::new(None, 2),
    ];
    let mut icons = BTreeMap::new();
    for (icon_id, shade) in [(1, 0x40u8), (2, 0xc0u8)] {
        icons.insert(icon_id, encode_icon(&Bitmap::new(2, 2, vec![shade; 16]))?);
    }
    responder.publish_notifications(&active, &icons).await?;
    tokio::time::sleep(Duration::from_millis(200)).await;

    // Ambient cycle
    engine_handle.set_ambient(true);
    engine_handle.time_tick();
    engine_handle.set_ambient(false);

    let navigation = engine_handle.tap(TapRegion::Notifications).await;
    tracing::info!(?navigation, "tap on notifications");

    tokio::time::sleep(Duration::from_secs(2)).await;

    // Shutdown
    engine_handle.shutdown();
    watch_scope.cancel();
    phone_scope.cancel();
    engine_task.await?;

    tracing::info!(
        settings = %serde_json::to_string(&watch_storage.settings())?,
        "simulation finished"
    );
    Ok(())
}

/// Wait until a sync client reaches a settled state, logging it.
async fn settle<V: Clone + std::fmt::Debug>(rx: &mut tokio::sync::watch::Receiver<SyncState<V>>) {
    let waited = tokio::time::timeout(
        Duration::from_secs(10),
        rx.wait_for(|state| state.is_settled()),
    )
    .await;
    match waited {
        Ok(Ok(state)) => tracing::info!(state = ?*state, "sync settled"),
        Ok(Err(_)) => tracing::warn!("sync client dropped"),
        Err(_) => tracing::warn!("sync did not settle"),
    }
}
