use super::Size;
use image::RgbaImage;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Pixel access to a canvas drawing surface.
pub trait CanvasSurface: Send + Sync {
    /// Backing store size in pixels
    fn size(&self) -> Size;

    /// Read the pixels, or `None` when the surface is tainted by
    /// cross-origin content.
    fn read_pixels(&self) -> Option<RgbaImage>;

    /// Export as a `data:` URL, if the host allows it.
    fn to_data_url(&self) -> Option<String>;
}

/// Identity of a canvas. Canvases have no stable content key, so each one
/// gets a process-unique id when it is wrapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CanvasId(u64);

impl CanvasId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw id value
    pub fn get(&self) -> u64 {
        self.0
    }
}

/// Cache key of a scan target
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TargetKey {
    /// Image resource URL
    Url(String),
    /// Canvas identity
    Canvas(CanvasId),
}

/// Bitmap image element
#[derive(Debug)]
pub struct ImageTarget {
    url: String,
    natural: Size,
    display: Size,
    vector: bool,
    complete: bool,
    has_qr: AtomicBool,
}

impl ImageTarget {
    /// A fully loaded image
    pub fn new(url: impl Into<String>, natural: Size, display: Size) -> Self {
        Self {
            url: url.into(),
            natural,
            display,
            vector: false,
            complete: true,
            has_qr: AtomicBool::new(false),
        }
    }

    /// Mark the resource as resolution independent (SVG)
    pub fn vector(mut self) -> Self {
        self.vector = true;
        self
    }

    /// Mark the image as still loading
    pub fn loading(mut self) -> Self {
        self.complete = false;
        self
    }

    /// Source URL
    pub fn url(&self) -> &str {
        &self.url
    }
}

/// Canvas element
pub struct CanvasTarget {
    id: CanvasId,
    surface: Arc<dyn CanvasSurface>,
    display: Size,
    has_qr: AtomicBool,
}

impl CanvasTarget {
    /// Wrap a surface, allocating a fresh identity
    pub fn new(surface: Arc<dyn CanvasSurface>, display: Size) -> Self {
        Self {
            id: CanvasId::next(),
            surface,
            display,
            has_qr: AtomicBool::new(false),
        }
    }

    /// Identity of this canvas
    pub fn id(&self) -> CanvasId {
        self.id
    }

    /// Underlying drawing surface
    pub fn surface(&self) -> &Arc<dyn CanvasSurface> {
        &self.surface
    }
}

impl fmt::Debug for CanvasTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CanvasTarget")
            .field("id", &self.id)
            .field("size", &self.surface.size())
            .field("display", &self.display)
            .finish()
    }
}

/// An element eligible for decoding
#[derive(Debug, Clone)]
pub enum ScanTarget {
    /// Bitmap or vector image
    Image(Arc<ImageTarget>),
    /// Canvas drawing surface
    Canvas(Arc<CanvasTarget>),
}

impl ScanTarget {
    /// Convenience constructor for an image target
    pub fn image(image: ImageTarget) -> Self {
        ScanTarget::Image(Arc::new(image))
    }

    /// Convenience constructor for a canvas target
    pub fn canvas(surface: Arc<dyn CanvasSurface>, display: Size) -> Self {
        ScanTarget::Canvas(Arc::new(CanvasTarget::new(surface, display)))
    }

    /// Cache key: URL for images, identity for canvases
    pub fn key(&self) -> TargetKey {
        match self {
            ScanTarget::Image(img) => TargetKey::Url(img.url.clone()),
            ScanTarget::Canvas(canvas) => TargetKey::Canvas(canvas.id),
        }
    }

    /// Intrinsic pixel size
    pub fn natural_size(&self) -> Size {
        match self {
            ScanTarget::Image(img) => img.natural,
            ScanTarget::Canvas(canvas) => canvas.surface.size(),
        }
    }

    /// Rendered size in CSS pixels
    pub fn display_size(&self) -> Size {
        match self {
            ScanTarget::Image(img) => img.display,
            ScanTarget::Canvas(canvas) => canvas.display,
        }
    }

    /// Resolution-independent source
    pub fn is_vector(&self) -> bool {
        matches!(self, ScanTarget::Image(img) if img.vector)
    }

    /// Image fully loaded, or canvas with a non-empty backing store
    pub fn is_ready(&self) -> bool {
        match self {
            ScanTarget::Image(img) => img.complete && (img.vector || !img.natural.is_empty()),
            ScanTarget::Canvas(canvas) => !canvas.surface.size().is_empty(),
        }
    }

    /// Source URL for image targets
    pub fn url(&self) -> Option<&str> {
        match self {
            ScanTarget::Image(img) => Some(&img.url),
            ScanTarget::Canvas(_) => None,
        }
    }

    /// Attach the decoded-QR marker
    pub fn mark_has_qr(&self) {
        self.has_qr_flag().store(true, Ordering::Relaxed);
    }

    /// Whether a successful decode has been associated with the element
    pub fn has_qr(&self) -> bool {
        self.has_qr_flag().load(Ordering::Relaxed)
    }

    fn has_qr_flag(&self) -> &AtomicBool {
        match self {
            ScanTarget::Image(img) => &img.has_qr,
            ScanTarget::Canvas(canvas) => &canvas.has_qr,
        }
    }
}

impl fmt::Display for ScanTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanTarget::Image(img) if img.url.starts_with("data:") => write!(f, "img(data url)"),
            ScanTarget::Image(img) => write!(f, "img({})", img.url),
            ScanTarget::Canvas(canvas) => write!(f, "canvas#{}", canvas.id.get()),
        }
    }
}
