//! Shared stubs for the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use autoqr::acquire::ResourceLoader;
use autoqr::decode::{BitmapDecoder, FormatSet, PixelDecoder};
use autoqr::error::{AcquireError, RemoteError};
use autoqr::interaction::{FeedbackRequest, Host, TooltipRequest, TooltipSurface};
use autoqr::remote::{RemoteRace, RemoteService};
use autoqr::scanner::BitmapFactory;
use autoqr::{ElementBox, ScanConfig, Scanner};
use image::{Rgba, RgbaImage};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// When a stub decoder reports a hit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Answer {
    Never,
    Always,
    /// Only when the top-left pixel is black, i.e. on the inverted canvas
    OnDarkPadding,
}

impl Answer {
    fn fires(&self, top_left: [u8; 3]) -> bool {
        match self {
            Answer::Never => false,
            Answer::Always => true,
            Answer::OnDarkPadding => top_left == [0, 0, 0],
        }
    }
}

pub struct CountingPixel {
    pub name: &'static str,
    pub answer: Answer,
    pub payload: &'static str,
    pub calls: AtomicUsize,
}

impl CountingPixel {
    pub fn new(name: &'static str, answer: Answer, payload: &'static str) -> Arc<Self> {
        Arc::new(Self {
            name,
            answer,
            payload,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl PixelDecoder for CountingPixel {
    fn name(&self) -> &str {
        self.name
    }

    fn decode(&self, rgba: &[u8], _width: u32, _height: u32) -> Option<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let top_left = [rgba[0], rgba[1], rgba[2]];
        self.answer
            .fires(top_left)
            .then(|| self.payload.to_string())
    }
}

pub struct CountingBitmap {
    pub answer: Answer,
    pub payload: &'static str,
    pub calls: AtomicUsize,
}

impl CountingBitmap {
    pub fn new(answer: Answer, payload: &'static str) -> Arc<Self> {
        Arc::new(Self {
            answer,
            payload,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BitmapDecoder for CountingBitmap {
    fn name(&self) -> &str {
        "ZXing"
    }

    async fn decode(&self, image: &RgbaImage) -> Option<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let px = image.get_pixel(0, 0).0;
        self.answer
            .fires([px[0], px[1], px[2]])
            .then(|| self.payload.to_string())
    }
}

/// Serves one bitmap for every URL and counts direct loads
pub struct StubLoader {
    pub bitmap: Option<RgbaImage>,
    pub loads: AtomicUsize,
}

impl StubLoader {
    pub fn serving(bitmap: RgbaImage) -> Arc<Self> {
        Arc::new(Self {
            bitmap: Some(bitmap),
            loads: AtomicUsize::new(0),
        })
    }

    pub fn broken() -> Arc<Self> {
        Arc::new(Self {
            bitmap: None,
            loads: AtomicUsize::new(0),
        })
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ResourceLoader for StubLoader {
    async fn load_image(&self, url: &str) -> Result<RgbaImage, AcquireError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        self.bitmap
            .clone()
            .ok_or_else(|| AcquireError::CrossOrigin(url.to_string()))
    }

    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, AcquireError> {
        Err(AcquireError::Fetch(format!("no network in tests: {url}")))
    }
}

/// Remote service answering after a fixed delay
pub struct StubRemote {
    pub label: &'static str,
    pub delay: Duration,
    pub result: Result<&'static str, &'static str>,
}

#[async_trait]
impl RemoteService for StubRemote {
    fn label(&self) -> &str {
        self.label
    }

    async fn decode_url(&self, _image_url: &str) -> Result<String, RemoteError> {
        tokio::time::sleep(self.delay).await;
        match self.result {
            Ok(text) => Ok(text.to_string()),
            Err(message) => Err(RemoteError::Rejected {
                service: self.label.to_string(),
                message: message.to_string(),
            }),
        }
    }
}

pub fn remote(
    label: &'static str,
    delay_ms: u64,
    result: Result<&'static str, &'static str>,
) -> Arc<dyn RemoteService> {
    Arc::new(StubRemote {
        label,
        delay: Duration::from_millis(delay_ms),
        result,
    })
}

#[derive(Default)]
pub struct RecordingSurface {
    pub shown: Mutex<Vec<TooltipRequest>>,
    pub hides: AtomicUsize,
    pub feedback: Mutex<Vec<FeedbackRequest>>,
}

impl TooltipSurface for RecordingSurface {
    fn show(&self, request: &TooltipRequest) {
        self.shown.lock().push(request.clone());
    }

    fn hide(&self) {
        self.hides.fetch_add(1, Ordering::SeqCst);
    }

    fn feedback(&self, request: &FeedbackRequest) {
        self.feedback.lock().push(request.clone());
    }
}

#[derive(Default)]
pub struct RecordingHost {
    pub clipboard: Mutex<Vec<String>>,
    pub tabs: Mutex<Vec<String>>,
    pub overlays: Mutex<Vec<Option<ElementBox>>>,
}

impl Host for RecordingHost {
    fn write_clipboard(&self, text: &str) {
        self.clipboard.lock().push(text.to_string());
    }

    fn open_tab(&self, url: &str) {
        self.tabs.lock().push(url.to_string());
    }

    fn set_crop_overlay(&self, rect: Option<ElementBox>) {
        self.overlays.lock().push(rect);
    }
}

pub fn gray_bitmap(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_pixel(width, height, Rgba([128, 128, 128, 255]))
}

/// Scanner wired entirely to stubs
pub fn stub_scanner(
    loader: Arc<StubLoader>,
    pixel: Arc<CountingPixel>,
    bitmap: Arc<CountingBitmap>,
    remote: RemoteRace,
) -> Scanner {
    Scanner::builder(ScanConfig::default())
        .loader(loader)
        .pixel_decoder(pixel)
        .bitmap_factory(Arc::new(move |_formats: FormatSet| {
            bitmap.clone() as Arc<dyn BitmapDecoder>
        }))
        .remote(remote)
        .build()
        .expect("stub scanner needs no HTTP client")
}

/// Bitmap factory that hands out one decoder and records every format set
/// it is asked to build for
pub struct RecordingFactory {
    pub decoder: Arc<CountingBitmap>,
    pub built: Mutex<Vec<FormatSet>>,
}

impl RecordingFactory {
    pub fn new(decoder: Arc<CountingBitmap>) -> Arc<Self> {
        Arc::new(Self {
            decoder,
            built: Mutex::new(Vec::new()),
        })
    }

    pub fn built(&self) -> Vec<FormatSet> {
        self.built.lock().clone()
    }

    pub fn factory(self: &Arc<Self>) -> BitmapFactory {
        let recorder = self.clone();
        Arc::new(move |formats: FormatSet| {
            recorder.built.lock().push(formats);
            recorder.decoder.clone() as Arc<dyn BitmapDecoder>
        })
    }
}

/// Scanner whose decoder B comes from `factory`
pub fn recording_scanner(
    loader: Arc<StubLoader>,
    pixel: Arc<CountingPixel>,
    factory: &Arc<RecordingFactory>,
    remote: RemoteRace,
) -> Scanner {
    Scanner::builder(ScanConfig::default())
        .loader(loader)
        .pixel_decoder(pixel)
        .bitmap_factory(factory.factory())
        .remote(remote)
        .build()
        .expect("stub scanner needs no HTTP client")
}

pub fn no_remote() -> RemoteRace {
    RemoteRace::new(Vec::new(), Duration::from_secs(1))
}
