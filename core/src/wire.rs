//! Wire format exchanged with the companion device.
//!
//! Two transport primitives exist: fire-and-forget [`Message`]s carrying a
//! few bytes, and [`DataItem`]s, which are persisted key/value maps that may
//! reference binary [`Asset`]s fetched separately.

use crate::error::{Error, Result};
use crate::notification::{NotificationBatch, MAX_NOTIFICATION_ICONS};
use crate::{IconId, NodeId, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Every path the two apps exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WirePath {
    BatteryQueryStatus,
    BatteryActivate,
    BatteryDeactivate,
    BatterySyncActivated,
    BatteryStatus,
    NotificationsQueryStatus,
    NotificationsActivate,
    NotificationsDeactivate,
    NotificationsSyncStatus,
    /// 1-byte mirror of the premium data item.
    PremiumMessage,
    PremiumItem,
    NotificationsItem,
}

impl WirePath {
    pub const ALL: [WirePath; 12] = [
        WirePath::BatteryQueryStatus,
        WirePath::BatteryActivate,
        WirePath::BatteryDeactivate,
        WirePath::BatterySyncActivated,
        WirePath::BatteryStatus,
        WirePath::NotificationsQueryStatus,
        WirePath::NotificationsActivate,
        WirePath::NotificationsDeactivate,
        WirePath::NotificationsSyncStatus,
        WirePath::PremiumMessage,
        WirePath::PremiumItem,
        WirePath::NotificationsItem,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            WirePath::BatteryQueryStatus => "/batterySync/queryStatus",
            WirePath::BatteryActivate => "/batterySync/activate",
            WirePath::BatteryDeactivate => "/batterySync/deactivate",
            WirePath::BatterySyncActivated => "/batterySync/syncActivated",
            WirePath::BatteryStatus => "/batterySync/batteryStatus",
            WirePath::NotificationsQueryStatus => "/notificationsSync/queryStatus",
            WirePath::NotificationsActivate => "/notificationsSync/activate",
            WirePath::NotificationsDeactivate => "/notificationsSync/deactivate",
            WirePath::NotificationsSyncStatus => "/notificationsSync/syncStatus",
            WirePath::PremiumMessage => "premium",
            WirePath::PremiumItem => "/premium",
            WirePath::NotificationsItem => "/notifications",
        }
    }

    pub fn parse(path: &str) -> Result<Self> {
        WirePath::ALL
            .into_iter()
            .find(|candidate| candidate.as_str() == path)
            .ok_or_else(|| Error::UnknownPath(path.to_string()))
    }
}

impl fmt::Display for WirePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A received message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub source: NodeId,
    pub path: String,
    pub payload: Vec<u8>,
}

impl Message {
    pub fn new(source: impl Into<NodeId>, path: WirePath, payload: Vec<u8>) -> Self {
        Self {
            source: source.into(),
            path: path.as_str().to_string(),
            payload,
        }
    }
}

/// Handle to a binary blob attached to a data item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Asset {
    pub digest: String,
}

impl Asset {
    pub fn new(digest: impl Into<String>) -> Self {
        Self {
            digest: digest.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum DataValue {
    Bool(bool),
    Long(i64),
    IntList(Vec<i32>),
    Asset(Asset),
}

/// Ordered key/value content of a data item.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DataMap(BTreeMap<String, DataValue>);

impl DataMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, key: impl Into<String>, value: DataValue) -> &mut Self {
        self.0.insert(key.into(), value);
        self
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&DataValue> {
        self.0.get(key)
    }

    pub fn get_bool(&self, key: &str) -> Result<Option<bool>> {
        match self.0.get(key) {
            None => Ok(None),
            Some(DataValue::Bool(value)) => Ok(Some(*value)),
            Some(_) => Err(type_error(key, "bool")),
        }
    }

    pub fn get_long(&self, key: &str) -> Result<Option<i64>> {
        match self.0.get(key) {
            None => Ok(None),
            Some(DataValue::Long(value)) => Ok(Some(*value)),
            Some(_) => Err(type_error(key, "long")),
        }
    }

    pub fn get_int_list(&self, key: &str) -> Result<Option<&[i32]>> {
        match self.0.get(key) {
            None => Ok(None),
            Some(DataValue::IntList(value)) => Ok(Some(value)),
            Some(_) => Err(type_error(key, "int list")),
        }
    }

    pub fn get_asset(&self, key: &str) -> Result<Option<&Asset>> {
        match self.0.get(key) {
            None => Ok(None),
            Some(DataValue::Asset(value)) => Ok(Some(value)),
            Some(_) => Err(type_error(key, "asset")),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

fn type_error(key: &str, expected: &'static str) -> Error {
    Error::FieldType {
        field: key.to_string(),
        expected,
    }
}

/// A data item as seen by the receiver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataItem {
    pub path: String,
    pub map: DataMap,
}

impl DataItem {
    pub fn new(path: WirePath, map: DataMap) -> Self {
        Self {
            path: path.as_str().to_string(),
            map,
        }
    }

    fn require<T>(&self, field: &str, value: Option<T>) -> Result<T> {
        value.ok_or_else(|| Error::MissingField {
            path: self.path.clone(),
            field: field.to_string(),
        })
    }
}

/// A data item to publish, with the bytes of every asset it references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutDataRequest {
    pub item: DataItem,
    pub assets: Vec<(Asset, Vec<u8>)>,
    /// Deliver without batching delay.
    pub urgent: bool,
}

pub const KEY_PREMIUM: &str = "premium";
pub const KEY_TIMESTAMP: &str = "ts";
pub const KEY_ICON_IDS: &str = "iconIds";
pub const KEY_HAS_MORE: &str = "hasMore";

/// Key of the asset holding the image for `icon_id`.
pub fn icon_asset_key(icon_id: IconId) -> String {
    format!("icon/{icon_id}")
}

// Message payloads

pub fn encode_bool(value: bool) -> Vec<u8> {
    vec![u8::from(value)]
}

/// First byte equal to 1 means `true`.
pub fn decode_bool(path: &str, payload: &[u8]) -> Result<bool> {
    payload
        .first()
        .map(|byte| *byte == 1)
        .ok_or_else(|| Error::EmptyPayload(path.to_string()))
}

pub fn encode_battery_percent(percentage: u8) -> Vec<u8> {
    vec![percentage]
}

pub fn decode_battery_percent(payload: &[u8]) -> Result<u8> {
    let byte = *payload
        .first()
        .ok_or_else(|| Error::EmptyPayload(WirePath::BatteryStatus.to_string()))?;
    if byte > 100 {
        return Err(Error::BatteryOutOfRange(byte));
    }
    Ok(byte)
}

/// Negotiated notification sync state as reported by the companion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NotificationsSyncStatus {
    Deactivated,
    Activated,
    ActivatedMissingPermission,
}

impl NotificationsSyncStatus {
    pub fn from_byte(byte: u8) -> Result<Self> {
        match byte {
            0 => Ok(NotificationsSyncStatus::Deactivated),
            1 => Ok(NotificationsSyncStatus::Activated),
            2 => Ok(NotificationsSyncStatus::ActivatedMissingPermission),
            other => Err(Error::UnknownSyncStatus(other)),
        }
    }

    pub fn as_byte(self) -> u8 {
        match self {
            NotificationsSyncStatus::Deactivated => 0,
            NotificationsSyncStatus::Activated => 1,
            NotificationsSyncStatus::ActivatedMissingPermission => 2,
        }
    }

    /// Derive from the persisted activation flag and the local permission.
    pub fn derive(activated: bool, has_permission: bool) -> Self {
        match (activated, has_permission) {
            (false, _) => NotificationsSyncStatus::Deactivated,
            (true, false) => NotificationsSyncStatus::ActivatedMissingPermission,
            (true, true) => NotificationsSyncStatus::Activated,
        }
    }

    pub fn decode(payload: &[u8]) -> Result<Self> {
        let byte = payload
            .first()
            .ok_or_else(|| Error::EmptyPayload(WirePath::NotificationsSyncStatus.to_string()))?;
        Self::from_byte(*byte)
    }
}

// Data items

/// Data maps carry longs. Instants past `i64::MAX` saturate.
fn timestamp_value(now: Timestamp) -> i64 {
    i64::try_from(now).unwrap_or(i64::MAX)
}

pub fn premium_item(premium: bool, now: Timestamp) -> DataItem {
    let mut map = DataMap::new();
    map.put(KEY_PREMIUM, DataValue::Bool(premium))
        .put(KEY_TIMESTAMP, DataValue::Long(timestamp_value(now)));
    DataItem::new(WirePath::PremiumItem, map)
}

/// Premium flag of a `/premium` item. `None` when the key is absent.
pub fn decode_premium_item(item: &DataItem) -> Result<Option<bool>> {
    item.map.get_bool(KEY_PREMIUM)
}

/// A decoded `/notifications` item. Icon ids keep their order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationsItem {
    pub icon_ids: Vec<IconId>,
    pub has_more: bool,
    /// One asset per id in `icon_ids`, same order.
    pub assets: Vec<Asset>,
}

/// Decode a `/notifications` item.
///
/// More than [`MAX_NOTIFICATION_ICONS`] ids are truncated and flagged as
/// `has_more`. A referenced id without its asset fails the whole item.
pub fn decode_notifications_item(item: &DataItem) -> Result<NotificationsItem> {
    let ids = item.require(KEY_ICON_IDS, item.map.get_int_list(KEY_ICON_IDS)?)?;
    let sent_more = item.map.get_bool(KEY_HAS_MORE)?.unwrap_or(false);
    let batch = NotificationBatch::capped(ids.to_vec());

    let mut assets = Vec::with_capacity(batch.icon_ids.len());
    for icon_id in &batch.icon_ids {
        let asset = item
            .map
            .get_asset(&icon_asset_key(*icon_id))?
            .ok_or(Error::MissingAsset(*icon_id))?;
        assets.push(asset.clone());
    }

    Ok(NotificationsItem {
        icon_ids: batch.icon_ids,
        has_more: sent_more || batch.has_more,
        assets,
    })
}

/// Build a `/notifications` request. `icons` holds the encoded image for each
/// id; ids without an image are still listed and the receiver rejects them.
pub fn notifications_request(
    batch: &NotificationBatch,
    icons: &BTreeMap<IconId, Vec<u8>>,
    now: Timestamp,
) -> PutDataRequest {
    let mut map = DataMap::new();
    map.put(KEY_ICON_IDS, DataValue::IntList(batch.icon_ids.clone()))
        .put(KEY_HAS_MORE, DataValue::Bool(batch.has_more))
        .put(KEY_TIMESTAMP, DataValue::Long(timestamp_value(now)));

    let mut assets = Vec::new();
    for icon_id in batch.icon_ids.iter().take(MAX_NOTIFICATION_ICONS) {
        let Some(bytes) = icons.get(icon_id) else {
            continue;
        };
        let asset = Asset::new(format!("icon-{icon_id}-{now}"));
        map.put(icon_asset_key(*icon_id), DataValue::Asset(asset.clone()));
        assets.push((asset, bytes.clone()));
    }

    PutDataRequest {
        item: DataItem::new(WirePath::NotificationsItem, map),
        assets,
        urgent: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_parse_back() {
        for path in WirePath::ALL {
            assert_eq!(WirePath::parse(path.as_str()).unwrap(), path);
        }
        assert_eq!(
            WirePath::parse("/nope"),
            Err(Error::UnknownPath("/nope".into()))
        );
    }

    #[test]
    fn bool_payloads() {
        assert!(decode_bool("p", &[1]).unwrap());
        assert!(!decode_bool("p", &[0]).unwrap());
        assert!(!decode_bool("p", &[7]).unwrap());
        assert_eq!(decode_bool("p", &[]), Err(Error::EmptyPayload("p".into())));
    }

    #[test]
    fn battery_payloads() {
        assert_eq!(decode_battery_percent(&[77]), Ok(77));
        assert_eq!(decode_battery_percent(&[101]), Err(Error::BatteryOutOfRange(101)));
        assert!(decode_battery_percent(&[]).is_err());
    }

    #[test]
    fn sync_status_bytes() {
        for byte in 0..=2 {
            assert_eq!(NotificationsSyncStatus::from_byte(byte).unwrap().as_byte(), byte);
        }
        assert_eq!(
            NotificationsSyncStatus::decode(&[3]),
            Err(Error::UnknownSyncStatus(3))
        );
    }

    #[test]
    fn tri_state_derivation() {
        use NotificationsSyncStatus::*;
        assert_eq!(NotificationsSyncStatus::derive(false, true), Deactivated);
        assert_eq!(NotificationsSyncStatus::derive(false, false), Deactivated);
        assert_eq!(
            NotificationsSyncStatus::derive(true, false),
            ActivatedMissingPermission
        );
        assert_eq!(NotificationsSyncStatus::derive(true, true), Activated);
    }

    #[test]
    fn premium_item_fields() {
        let item = premium_item(true, 42);
        assert_eq!(item.path, "/premium");
        assert_eq!(decode_premium_item(&item), Ok(Some(true)));
        assert_eq!(item.map.get_long(KEY_TIMESTAMP), Ok(Some(42)));

        let empty = DataItem::new(WirePath::PremiumItem, DataMap::new());
        assert_eq!(decode_premium_item(&empty), Ok(None));
    }

    #[test]
    fn far_future_timestamp_saturates() {
        let item = premium_item(false, u64::MAX);
        assert_eq!(item.map.get_long(KEY_TIMESTAMP), Ok(Some(i64::MAX)));

        let batch = NotificationBatch::capped(vec![]);
        let request = notifications_request(&batch, &BTreeMap::new(), u64::MAX);
        assert_eq!(request.item.map.get_long(KEY_TIMESTAMP), Ok(Some(i64::MAX)));
    }

    #[test]
    fn notifications_item_is_truncated_and_keeps_has_more() {
        let batch = NotificationBatch {
            icon_ids: vec![1, 2, 3, 4, 5, 6],
            has_more: true,
        };
        let icons = (1..=6).map(|id| (id, vec![id as u8])).collect();
        let request = notifications_request(&batch, &icons, 9);

        let decoded = decode_notifications_item(&request.item).unwrap();
        assert_eq!(decoded.icon_ids, vec![1, 2, 3, 4, 5]);
        assert!(decoded.has_more);
        assert_eq!(decoded.assets.len(), 5);
    }

    #[test]
    fn missing_asset_fails_the_item() {
        let batch = NotificationBatch {
            icon_ids: vec![1, 2],
            has_more: false,
        };
        let icons = BTreeMap::from([(1, vec![0u8])]);
        let request = notifications_request(&batch, &icons, 0);
        assert_eq!(
            decode_notifications_item(&request.item),
            Err(Error::MissingAsset(2))
        );
    }

    #[test]
    fn missing_icon_ids_is_an_error() {
        let item = DataItem::new(WirePath::NotificationsItem, DataMap::new());
        assert_eq!(
            decode_notifications_item(&item),
            Err(Error::MissingField {
                path: "/notifications".into(),
                field: "iconIds".into(),
            })
        );
    }

    #[test]
    fn wrong_field_type_is_reported() {
        let mut map = DataMap::new();
        map.put(KEY_ICON_IDS, DataValue::Bool(true));
        let item = DataItem::new(WirePath::NotificationsItem, map);
        assert!(matches!(
            decode_notifications_item(&item),
            Err(Error::FieldType { .. })
        ));
    }
}
