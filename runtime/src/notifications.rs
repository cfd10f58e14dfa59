//! Watch-side cache of phone notification icons.
//!
//! A batch either lands completely or not at all: every icon missing from
//! the LRU is fetched and decoded first, and only when all of them succeeded
//! is the new [`NotificationState`] published.

use crate::cancel::CancelScope;
use crate::error::{Result, RuntimeError};
use crate::transport::Transport;
use futures::future::try_join_all;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use watchface_core::wire::{Asset, NotificationsItem};
use watchface_core::{Bitmap, Clock, IconId, NotificationState};

/// Decoded icons kept across batches.
pub const ICON_CACHE_CAPACITY: usize = 10;

pub struct NotificationIconCache {
    icons: Mutex<LruCache<IconId, Bitmap>>,
    state: watch::Sender<NotificationState>,
    /// Sequence of the newest batch; older batches never publish.
    latest_batch: AtomicU64,
    clock: Arc<dyn Clock>,
    scope: CancelScope,
}

impl NotificationIconCache {
    pub fn new(clock: Arc<dyn Clock>, scope: CancelScope) -> Self {
        let capacity = NonZeroUsize::new(ICON_CACHE_CAPACITY).unwrap_or(NonZeroUsize::MIN);
        let (state, _) = watch::channel(NotificationState::unknown(clock.now()));
        Self {
            icons: Mutex::new(LruCache::new(capacity)),
            state,
            latest_batch: AtomicU64::new(0),
            clock,
            scope,
        }
    }

    pub fn state(&self) -> NotificationState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<NotificationState> {
        self.state.subscribe()
    }

    /// Apply a received batch. On any failure the published state is left
    /// as it was.
    pub async fn on_batch_received(
        &self,
        item: NotificationsItem,
        transport: &dyn Transport,
    ) -> Result<()> {
        let batch = self.latest_batch.fetch_add(1, Ordering::SeqCst) + 1;
        let result = self.scope.run(self.load_batch(&item, transport)).await;

        let icons = match result {
            Ok(icons) => icons,
            Err(err) if err.is_cancelled() => return Err(err),
            Err(err) => {
                tracing::error!(error = %err, ids = ?item.icon_ids, "notification batch dropped");
                return Err(err);
            }
        };

        if self.latest_batch.load(Ordering::SeqCst) != batch {
            tracing::debug!(batch, "newer notification batch arrived, dropping this one");
            return Ok(());
        }

        tracing::debug!(icons = icons.len(), has_more = item.has_more, "notification icons updated");
        self.state.send_replace(NotificationState::DataReceived {
            icons,
            has_more: item.has_more,
        });
        Ok(())
    }

    async fn load_batch(
        &self,
        item: &NotificationsItem,
        transport: &dyn Transport,
    ) -> Result<Vec<Bitmap>> {
        let missing: Vec<(IconId, Asset)> = {
            let icons = self.icons.lock().await;
            item.icon_ids
                .iter()
                .zip(&item.assets)
                .filter(|(icon_id, _)| !icons.contains(icon_id))
                .map(|(icon_id, asset)| (*icon_id, asset.clone()))
                .collect()
        };

        let fetched = try_join_all(missing.into_iter().map(|(icon_id, asset)| async move {
            let bytes = transport.fetch_asset(&asset).await?;
            let bitmap = decode_icon(&bytes)?;
            Ok::<_, RuntimeError>((icon_id, bitmap))
        }))
        .await?;

        let mut icons = self.icons.lock().await;
        for (icon_id, bitmap) in fetched {
            icons.put(icon_id, bitmap);
        }

        let mut bitmaps = Vec::with_capacity(item.icon_ids.len());
        for icon_id in &item.icon_ids {
            // Evicted already if a batch had more distinct ids than the
            // cache holds; the item limit keeps this from happening.
            let bitmap = icons
                .get(icon_id)
                .cloned()
                .ok_or(RuntimeError::Core(watchface_core::Error::MissingAsset(*icon_id)))?;
            bitmaps.push(bitmap);
        }
        Ok(bitmaps)
    }

    /// Back to `Unknown`, e.g. after sync was turned off.
    pub fn reset(&self) {
        self.latest_batch.fetch_add(1, Ordering::SeqCst);
        self.state
            .send_replace(NotificationState::unknown(self.clock.now()));
    }

    pub async fn cached_icons(&self) -> usize {
        self.icons.lock().await.len()
    }

    /// Cancel in-flight fetches. Nothing is published afterwards.
    pub fn shutdown(&self) {
        self.scope.cancel();
    }
}

/// Decode PNG bytes into an RGBA bitmap.
pub fn decode_icon(bytes: &[u8]) -> Result<Bitmap> {
    let image = image::load_from_memory_with_format(bytes, image::ImageFormat::Png)?.to_rgba8();
    let (width, height) = image.dimensions();
    Ok(Bitmap::new(width, height, image.into_raw()))
}

/// Encode an RGBA bitmap as PNG, the format icons travel in.
pub fn encode_icon(bitmap: &Bitmap) -> Result<Vec<u8>> {
    use image::{ImageBuffer, Rgba};

    let image: ImageBuffer<Rgba<u8>, Vec<u8>> =
        ImageBuffer::from_raw(bitmap.width, bitmap.height, bitmap.pixels.to_vec()).ok_or(
            RuntimeError::InvalidBitmap {
                width: bitmap.width,
                height: bitmap.height,
            },
        )?;

    let mut png = Vec::new();
    image.write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)?;
    Ok(png)
}
