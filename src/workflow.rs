use crate::database::MetadataStore;
use crate::error::{Error, Result};
use crate::export::encode_png;
use crate::host::ImageHost;
use crate::qrcode::RenderedQr;
use crate::raster::Rasterizer;
use crate::record::{NewRecord, RecordId};
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Rasterizes a QR code, hosts the image and records its metadata.
pub struct Generator {
    rasterizer: Arc<dyn Rasterizer>,
    host: Arc<dyn ImageHost>,
    store: Arc<dyn MetadataStore>,
    clock: Clock,
    in_flight: AtomicBool,
}

/// Clears the in-flight flag however `generate` exits.
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Generator {
    pub fn new(
        rasterizer: Arc<dyn Rasterizer>,
        host: Arc<dyn ImageHost>,
        store: Arc<dyn MetadataStore>,
    ) -> Self {
        Self {
            rasterizer,
            host,
            store,
            clock: Arc::new(Utc::now),
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn with_clock(mut self, clock: impl Fn() -> DateTime<Utc> + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn store(&self) -> &Arc<dyn MetadataStore> {
        &self.store
    }

    pub fn is_generating(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Rasterize `rendered`, upload it, then persist the record.
    ///
    /// Steps run strictly in order and the first failure aborts the rest,
    /// so nothing is written unless the upload succeeded. A second call
    /// while one is running is rejected with [`Error::Busy`].
    pub async fn generate(
        &self,
        content: &str,
        fg_color: &str,
        bg_color: &str,
        rendered: &RenderedQr,
    ) -> Result<RecordId> {
        if content.trim().is_empty() {
            return Err(Error::Validation(
                "Please enter text or URL to generate QR code".to_string(),
            ));
        }

        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            log::warn!("Ignoring generate request while another is in flight");
            return Err(Error::Busy);
        }
        let _guard = InFlightGuard(&self.in_flight);

        let png = self
            .rasterizer
            .rasterize(rendered)
            .and_then(|image| encode_png(&image))
            .map_err(|e| {
                log::error!("Error generating QR: {}", e);
                upstream(e)
            })?;

        let image_url = self.host.upload(png).await.map_err(|e| {
            log::error!("Error generating QR: {}", e);
            upstream(e)
        })?;

        let record = NewRecord {
            text: content.to_string(),
            image_url,
            fg_color: fg_color.to_string(),
            bg_color: bg_color.to_string(),
            timestamp: (self.clock)(),
            views: 0,
        };

        let id = self.store.create(&record).await.map_err(|e| {
            log::error!("Error generating QR: {}", e);
            upstream(e)
        })?;

        log::info!("QR code generated and hosted as {}", id);
        Ok(id)
    }
}

fn upstream(err: Error) -> Error {
    match err {
        Error::Upstream(_) => err,
        other => Error::Upstream(other.to_string()),
    }
}

/// Shareable preview URL for a record: `<origin>/qr/<id>`.
pub fn share_url(origin: &str, id: &RecordId) -> String {
    format!("{}/qr/{}", origin.trim_end_matches('/'), id)
}
