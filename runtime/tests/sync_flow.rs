//! Companion sync between a watch and a phone over the loopback transport.

use std::sync::Arc;
use std::time::Duration;
use watchface_core::wire::NotificationsSyncStatus;
use watchface_core::{ManualClock, SettingKey, Settings, SyncErrorKind, SyncState};
use watchface_runtime::{
    BatterySync, CancelScope, CompanionResponder, LoopbackNetwork, LoopbackTransport,
    NotificationsSync, PremiumPublisher, SettingsStore, SimPhone, Storage, SyncClient,
    SyncEvent, SyncProtocol, Transport,
};

const COMPANION: &str = "companion";
const WATCH: &str = "watch";
const TIMEOUT: Duration = Duration::from_secs(5);

struct Pair {
    watch: LoopbackTransport,
    phone: LoopbackTransport,
    network: Arc<LoopbackNetwork>,
    watch_storage: Arc<SettingsStore>,
    phone_storage: Arc<SettingsStore>,
    phone_platform: Arc<SimPhone>,
}

fn pair(watch_settings: Settings) -> Pair {
    let network = LoopbackNetwork::new_shared();
    let watch = network.join("watch", true);
    let phone = network.join("phone", true);
    watch.advertise(WATCH);
    phone.advertise(COMPANION);
    Pair {
        watch,
        phone,
        network,
        watch_storage: Arc::new(SettingsStore::in_memory(watch_settings)),
        phone_storage: Arc::new(SettingsStore::in_memory(Settings::default())),
        phone_platform: Arc::new(SimPhone::new(64, true)),
    }
}

impl Pair {
    fn responder(&self) -> Arc<CompanionResponder> {
        let responder = Arc::new(CompanionResponder::new(
            Arc::new(self.phone.clone()),
            self.phone_storage.clone(),
            self.phone_platform.clone(),
            Arc::new(ManualClock::new(0)),
            WATCH,
            TIMEOUT,
            CancelScope::new(),
        ));
        responder.start();
        responder
    }

    fn client<P: SyncProtocol>(&self) -> SyncClient<P> {
        let client = SyncClient::new(
            Arc::new(self.watch.clone()),
            self.watch_storage.clone(),
            COMPANION,
            TIMEOUT,
            CancelScope::new(),
        );
        client.start();
        client
    }
}

async fn settled<V: Clone>(client: &SyncClient<impl SyncProtocol<Value = V>>) -> SyncState<V> {
    client
        .subscribe_state()
        .wait_for(|state| state.is_settled())
        .await
        .map(|state| state.clone())
        .unwrap()
}

#[tokio::test(start_paused = true)]
async fn battery_sync_round_trip() {
    let pair = pair(Settings::default());
    let _responder = pair.responder();
    let client = pair.client::<BatterySync>();

    assert_eq!(
        settled(&client).await,
        SyncState::PeerResponded {
            node: pair.phone.local_node(),
            value: false
        }
    );

    assert!(client.toggle(true));
    assert_eq!(
        settled(&client).await,
        SyncState::PeerResponded {
            node: pair.phone.local_node(),
            value: true
        }
    );
    assert!(pair.watch_storage.get(SettingKey::ShowPhoneBattery));
    assert!(pair.phone_storage.get(SettingKey::BatterySyncActivated));

    assert!(client.toggle(false));
    assert!(matches!(
        settled(&client).await,
        SyncState::PeerResponded { value: false, .. }
    ));
    assert!(!pair.watch_storage.get(SettingKey::ShowPhoneBattery));
}

#[tokio::test(start_paused = true)]
async fn notification_sync_reports_missing_permission() {
    let pair = pair(Settings::default());
    pair.phone_platform.set_notification_permission(false);
    let responder = pair.responder();
    let client = pair.client::<NotificationsSync>();

    settled(&client).await;
    assert!(client.toggle(true));
    assert!(matches!(
        settled(&client).await,
        SyncState::PeerResponded {
            value: NotificationsSyncStatus::ActivatedMissingPermission,
            ..
        }
    ));

    // Granting the permission pushes the new status unprompted.
    let mut states = client.subscribe_state();
    pair.phone_platform.set_notification_permission(true);
    responder.on_permission_changed().await.unwrap();
    states
        .wait_for(|state| {
            matches!(
                state,
                SyncState::PeerResponded {
                    value: NotificationsSyncStatus::Activated,
                    ..
                }
            )
        })
        .await
        .unwrap();
    assert!(pair.watch_storage.get(SettingKey::NotificationsSyncActivated));
}

#[tokio::test(start_paused = true)]
async fn silent_companion_leaves_persisted_flag_alone() {
    let mut settings = Settings::default();
    settings.show_phone_battery = true;
    let pair = pair(settings);
    // No responder on the phone.
    let client = pair.client::<BatterySync>();

    assert_eq!(
        settled(&client).await,
        SyncState::Error {
            kind: SyncErrorKind::NoResponse,
            activated: true
        }
    );
    assert!(pair.watch_storage.get(SettingKey::ShowPhoneBattery));

    client.force_deactivate();
    assert!(!pair.watch_storage.get(SettingKey::ShowPhoneBattery));
    assert_eq!(
        client.state(),
        SyncState::Error {
            kind: SyncErrorKind::NoResponse,
            activated: false
        }
    );
}

#[tokio::test(start_paused = true)]
async fn peer_swap_is_reported_once() {
    let network = LoopbackNetwork::new_shared();
    let watch = network.join("watch", true);
    let first = network.join("old phone", false);
    first.advertise(COMPANION);

    let storage = Arc::new(SettingsStore::in_memory(Settings::default()));
    let client = SyncClient::<BatterySync>::new(
        Arc::new(watch.clone()),
        storage,
        COMPANION,
        TIMEOUT,
        CancelScope::new(),
    );
    let mut events = client.subscribe_events();
    client.start();

    let first_id = first.local_node();
    client
        .subscribe_state()
        .wait_for(|state| state.node() == Some(&first_id))
        .await
        .unwrap();

    // The nearby phone wins over the routed one, then the old one leaves.
    let second = network.join("new phone", true);
    second.advertise(COMPANION);
    first.withdraw(COMPANION);
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(
        events.try_recv().unwrap(),
        SyncEvent::PeerChanged {
            node: second.local_node()
        }
    );
    assert!(events.try_recv().is_err());
    assert_eq!(client.state().node(), Some(&second.local_node()));
}

#[tokio::test(start_paused = true)]
async fn retry_after_companion_installed() {
    let network = LoopbackNetwork::new_shared();
    let watch = network.join("watch", true);
    let phone = network.join("phone", true);
    let storage = Arc::new(SettingsStore::in_memory(Settings::default()));
    let client = SyncClient::<BatterySync>::new(
        Arc::new(watch),
        storage,
        COMPANION,
        TIMEOUT,
        CancelScope::new(),
    );
    client.start();
    assert!(matches!(
        settled(&client).await,
        SyncState::PeerNotFound { .. }
    ));

    phone.advertise(COMPANION);
    // Capability announcement alone moves the client on.
    client
        .subscribe_state()
        .wait_for(|state| state.node() == Some(&phone.local_node()))
        .await
        .unwrap();
}

#[tokio::test(start_paused = true)]
async fn premium_reaches_every_watch() {
    let pair = pair(Settings::default());
    let second_watch = pair.network.join("second watch", true);
    second_watch.advertise(WATCH);

    let publisher = PremiumPublisher::new(
        Arc::new(pair.phone.clone()),
        Arc::new(ManualClock::new(0)),
        WATCH,
        TIMEOUT,
    );
    assert_eq!(publisher.publish(true).await.unwrap(), 2);
}

#[tokio::test(start_paused = true)]
async fn shutdown_stops_committing() {
    let pair = pair(Settings::default());
    let client = pair.client::<BatterySync>();
    client.shutdown();
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(client.state(), SyncState::Loading);
}
