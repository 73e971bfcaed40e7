//! Generate / resolve workflow against in-process fakes

use async_trait::async_trait;
use image::RgbaImage;
use qrshare_lib::color::Color;
use qrshare_lib::database::{Database, MetadataStore};
use qrshare_lib::host::ImageHost;
use qrshare_lib::preview::resolve;
use qrshare_lib::qrcode::{DisplaySize, RenderedQr};
use qrshare_lib::raster::{CardRasterizer, Rasterizer};
use qrshare_lib::workflow::Generator;
use qrshare_lib::{Error, NewRecord, QrRecord, RecordId, Result};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

#[derive(Default)]
struct CountingRasterizer {
    calls: AtomicUsize,
    fail: bool,
}

impl Rasterizer for CountingRasterizer {
    fn rasterize(&self, rendered: &RenderedQr) -> Result<RgbaImage> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(Error::Render("canvas unavailable".to_string()));
        }
        CardRasterizer::default().rasterize(rendered)
    }
}

#[derive(Default)]
struct FakeHost {
    uploads: AtomicUsize,
    fail_status: Option<u16>,
}

#[async_trait]
impl ImageHost for FakeHost {
    async fn upload(&self, png: Vec<u8>) -> Result<String> {
        let n = self.uploads.fetch_add(1, Ordering::SeqCst);
        assert!(png.starts_with(b"\x89PNG"), "upload should be PNG bytes");
        match self.fail_status {
            Some(status) => Err(Error::Upstream(format!("HTTP {}", status))),
            None => Ok(format!("https://res.cloudinary.com/demo/image/upload/qr-{}.png", n)),
        }
    }
}

#[derive(Default)]
struct FakeStore {
    docs: Mutex<HashMap<String, QrRecord>>,
    writes: AtomicUsize,
    reads: AtomicUsize,
}

#[async_trait]
impl MetadataStore for FakeStore {
    async fn create(&self, record: &NewRecord) -> Result<RecordId> {
        let n = self.writes.fetch_add(1, Ordering::SeqCst);
        let id = RecordId::new(format!("doc{}", n));
        self.docs
            .lock()
            .unwrap()
            .insert(id.to_string(), record.clone().into_record(id.clone()));
        Ok(id)
    }

    async fn read(&self, id: &RecordId) -> Result<Option<QrRecord>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.docs.lock().unwrap().get(id.as_str()).cloned())
    }
}

struct BrokenStore;

#[async_trait]
impl MetadataStore for BrokenStore {
    async fn create(&self, _record: &NewRecord) -> Result<RecordId> {
        Err(Error::Upstream("permission denied".to_string()))
    }

    async fn read(&self, _id: &RecordId) -> Result<Option<QrRecord>> {
        Err(Error::Io(std::io::Error::new(
            std::io::ErrorKind::ConnectionReset,
            "connection reset",
        )))
    }
}

fn rendered(content: &str) -> RenderedQr {
    RenderedQr::new(content, Color::black(), Color::white(), DisplaySize::Regular).unwrap()
}

struct Harness {
    rasterizer: Arc<CountingRasterizer>,
    host: Arc<FakeHost>,
    store: Arc<FakeStore>,
    generator: Generator,
}

fn harness(rasterizer: CountingRasterizer, host: FakeHost) -> Harness {
    let rasterizer = Arc::new(rasterizer);
    let host = Arc::new(host);
    let store = Arc::new(FakeStore::default());
    let generator = Generator::new(rasterizer.clone(), host.clone(), store.clone());
    Harness {
        rasterizer,
        host,
        store,
        generator,
    }
}

#[tokio::test]
async fn generated_record_resolves_to_the_same_content() {
    let h = harness(CountingRasterizer::default(), FakeHost::default());
    let at: chrono::DateTime<chrono::Utc> = "2024-05-01T12:00:00Z".parse().unwrap();
    let generator = h.generator.with_clock(move || at);

    let id = generator
        .generate("https://example.com", "#000000", "#ffffff", &rendered("https://example.com"))
        .await
        .unwrap();

    let record = resolve(h.store.as_ref(), id.as_str()).await.unwrap();
    assert_eq!(record.id, id);
    assert_eq!(record.text, "https://example.com");
    assert_eq!(record.fg_color, "#000000");
    assert_eq!(record.bg_color, "#ffffff");
    assert_eq!(record.image_url, "https://res.cloudinary.com/demo/image/upload/qr-0.png");
    assert_eq!(record.timestamp, at);
    assert_eq!(record.views, 0);
    assert_eq!(h.host.uploads.load(Ordering::SeqCst), 1);
    assert_eq!(h.store.writes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn blank_content_is_rejected_before_any_side_effect() {
    let h = harness(CountingRasterizer::default(), FakeHost::default());

    for content in ["", "   ", "\n\t"] {
        let err = h
            .generator
            .generate(content, "#000000", "#ffffff", &rendered("placeholder"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)), "{content:?} gave {err:?}");
    }

    assert_eq!(h.rasterizer.calls.load(Ordering::SeqCst), 0);
    assert_eq!(h.host.uploads.load(Ordering::SeqCst), 0);
    assert_eq!(h.store.writes.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn failed_upload_writes_nothing() {
    let h = harness(
        CountingRasterizer::default(),
        FakeHost {
            fail_status: Some(500),
            ..Default::default()
        },
    );

    let err = h
        .generator
        .generate("https://example.com", "#000000", "#ffffff", &rendered("https://example.com"))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Upstream(_)));
    assert_eq!(h.host.uploads.load(Ordering::SeqCst), 1);
    assert_eq!(h.store.writes.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn failed_rasterization_skips_upload_and_write() {
    let h = harness(
        CountingRasterizer {
            fail: true,
            ..Default::default()
        },
        FakeHost::default(),
    );

    let err = h
        .generator
        .generate("hello", "#000000", "#ffffff", &rendered("hello"))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Upstream(_)));
    assert_eq!(h.host.uploads.load(Ordering::SeqCst), 0);
    assert_eq!(h.store.writes.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn store_failure_is_upstream() {
    let generator = Generator::new(
        Arc::new(CardRasterizer::default()),
        Arc::new(FakeHost::default()),
        Arc::new(BrokenStore),
    );

    let err = generator
        .generate("hello", "#000000", "#ffffff", &rendered("hello"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Upstream(_)));
    assert!(!generator.is_generating());
}

#[tokio::test]
async fn content_is_stored_as_entered() {
    let h = harness(CountingRasterizer::default(), FakeHost::default());
    let id = h
        .generator
        .generate("  padded  ", "navy", "#FFF", &rendered("  padded  "))
        .await
        .unwrap();

    let record = resolve(h.store.as_ref(), id.as_str()).await.unwrap();
    assert_eq!(record.text, "  padded  ");
    assert_eq!(record.fg_color, "navy");
    assert_eq!(record.bg_color, "#FFF");
}

#[tokio::test]
async fn resolve_distinguishes_invalid_and_missing_ids() {
    let store = FakeStore::default();

    assert!(matches!(resolve(&store, "").await, Err(Error::InvalidId)));
    assert!(matches!(resolve(&store, "  ").await, Err(Error::InvalidId)));
    assert_eq!(store.reads.load(Ordering::SeqCst), 0);

    match resolve(&store, "abc123").await {
        Err(Error::NotFound(id)) => assert_eq!(id, "abc123"),
        other => panic!("expected NotFound, got {other:?}"),
    }
    assert!(matches!(
        resolve(&store, "nonexistent-id").await,
        Err(Error::NotFound(_))
    ));
}

#[tokio::test]
async fn resolve_maps_store_failures_to_upstream() {
    assert!(matches!(
        resolve(&BrokenStore, "abc123").await,
        Err(Error::Upstream(_))
    ));
}

#[tokio::test]
async fn resolve_is_idempotent_against_sqlite() {
    let store = Arc::new(Database::open_in_memory().unwrap());
    let generator = Generator::new(
        Arc::new(CardRasterizer::default()),
        Arc::new(FakeHost::default()),
        store.clone(),
    );

    let id = generator
        .generate("https://example.com", "#000000", "#ffffff", &rendered("https://example.com"))
        .await
        .unwrap();

    let first = resolve(store.as_ref(), id.as_str()).await.unwrap();
    let second = resolve(store.as_ref(), id.as_str()).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(first.text, "https://example.com");
    assert_eq!(second.views, 0);
    assert_eq!(store.count().unwrap(), 1);
}

/// Holds every upload until released.
struct GatedHost {
    entered: Notify,
    release: Notify,
    uploads: AtomicUsize,
}

#[async_trait]
impl ImageHost for GatedHost {
    async fn upload(&self, _png: Vec<u8>) -> Result<String> {
        self.uploads.fetch_add(1, Ordering::SeqCst);
        self.entered.notify_one();
        self.release.notified().await;
        Ok("https://res.cloudinary.com/demo/image/upload/gated.png".to_string())
    }
}

#[tokio::test]
async fn overlapping_generate_is_rejected() {
    let host = Arc::new(GatedHost {
        entered: Notify::new(),
        release: Notify::new(),
        uploads: AtomicUsize::new(0),
    });
    let store = Arc::new(FakeStore::default());
    let generator = Arc::new(Generator::new(
        Arc::new(CardRasterizer::default()),
        host.clone(),
        store.clone(),
    ));

    let first = {
        let generator = generator.clone();
        let qr = rendered("first");
        tokio::spawn(async move { generator.generate("first", "#000000", "#ffffff", &qr).await })
    };

    host.entered.notified().await;
    assert!(generator.is_generating());

    let err = generator
        .generate("second", "#000000", "#ffffff", &rendered("second"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Busy));
    assert_eq!(host.uploads.load(Ordering::SeqCst), 1);

    host.release.notify_one();
    let id = first.await.unwrap().unwrap();
    assert_eq!(store.writes.load(Ordering::SeqCst), 1);
    assert!(!generator.is_generating());

    // The flag is released once the first call completes
    host.release.notify_one();
    let again = generator
        .generate("third", "#000000", "#ffffff", &rendered("third"))
        .await
        .unwrap();
    assert_ne!(again, id);
}
