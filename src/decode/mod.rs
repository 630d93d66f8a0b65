//! Decode ladder: two decoders tried against three pixel variants.
//!
//! ```text
//! State 0: STANDARD   decoder A normal,    decoder B normal
//! State 1: INVERTED   decoder A inverted,  decoder B inverted
//! State 2: BINARIZED  decoder A binarized, decoder B binarized
//! ```
//!
//! Attempts run one at a time in that order, stop at the first hit, and
//! yield to the runtime between attempts.

/// Decoder B and its `rxing` implementation
pub mod bitmap;
/// Decoder A and its `rqrr` implementation
pub mod buffer;

pub use bitmap::{BitmapDecoder, RxingDecoder};
pub use buffer::{PixelDecoder, RqrrDecoder};

use crate::utils::binarization::{invert, mean_binarize};
use image::RgbaImage;
use std::borrow::Cow;
use std::fmt;
use tracing::{debug, trace};

/// Pixel variant fed to the decoders
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Variant {
    /// Canvas as rendered
    Normal,
    /// RGB inverted, alpha forced opaque
    Inverted,
    /// Thresholded against the global mean luminance
    Binarized,
}

impl Variant {
    /// Ladder order
    pub const LADDER: [Variant; 3] = [Variant::Normal, Variant::Inverted, Variant::Binarized];

    /// Produce this variant of `canvas`
    pub fn apply<'a>(&self, canvas: &'a RgbaImage) -> Cow<'a, RgbaImage> {
        match self {
            Variant::Normal => Cow::Borrowed(canvas),
            Variant::Inverted => Cow::Owned(invert(canvas)),
            Variant::Binarized => Cow::Owned(mean_binarize(canvas)),
        }
    }

    /// Suffix appended to the decoder name in result methods
    pub fn suffix(&self) -> &'static str {
        match self {
            Variant::Normal => "",
            Variant::Inverted => " inverted",
            Variant::Binarized => " binarized",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variant::Normal => f.write_str("normal"),
            Variant::Inverted => f.write_str("inverted"),
            Variant::Binarized => f.write_str("binarized"),
        }
    }
}

/// Which decoder made an attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecoderId {
    /// Decoder A, raw pixel buffer
    Pixel,
    /// Decoder B, image handle
    Bitmap,
}

/// Formats decoder B is allowed to report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatSet {
    /// QR and DataMatrix only
    QrAndDataMatrix,
    /// Every supported 1D and 2D format
    All,
}

/// One decoder run against one variant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeAttempt {
    /// Decoder used
    pub decoder: DecoderId,
    /// Variant decoded
    pub variant: Variant,
    /// Decoded text, if any
    pub result: Option<String>,
}

/// Successful ladder attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LadderHit {
    /// Decoded text
    pub text: String,
    /// Decoder name plus variant suffix
    pub method: String,
}

/// Result of a ladder run
#[derive(Debug, Clone, Default)]
pub struct LadderOutcome {
    /// First success, if any
    pub hit: Option<LadderHit>,
    /// Every attempt made, in order
    pub attempts: Vec<DecodeAttempt>,
}

/// Runs the variant ladder over a rendered canvas
pub struct Ladder<'a> {
    pixel: &'a dyn PixelDecoder,
    bitmap: &'a dyn BitmapDecoder,
}

impl<'a> Ladder<'a> {
    /// Create a ladder from decoder A and decoder B
    pub fn new(pixel: &'a dyn PixelDecoder, bitmap: &'a dyn BitmapDecoder) -> Self {
        Self { pixel, bitmap }
    }

    /// Try variants `from..=to`, decoder A before decoder B for each, and
    /// stop at the first success.
    pub async fn run(&self, canvas: &RgbaImage, from: Variant, to: Variant) -> LadderOutcome {
        let mut outcome = LadderOutcome::default();
        let (width, height) = canvas.dimensions();

        for variant in Variant::LADDER
            .into_iter()
            .filter(|v| *v >= from && *v <= to)
        {
            let pixels = variant.apply(canvas);

            if !outcome.attempts.is_empty() {
                tokio::task::yield_now().await;
            }
            let result = self.pixel.decode(pixels.as_raw(), width, height);
            trace!(decoder = self.pixel.name(), %variant, hit = result.is_some(), "attempt");
            let name = self.pixel.name();
            if let Some(hit) = record(&mut outcome, DecoderId::Pixel, variant, result, name) {
                outcome.hit = Some(hit);
                return outcome;
            }

            tokio::task::yield_now().await;
            let result = self.bitmap.decode(&pixels).await;
            trace!(decoder = self.bitmap.name(), %variant, hit = result.is_some(), "attempt");
            let name = self.bitmap.name();
            if let Some(hit) = record(&mut outcome, DecoderId::Bitmap, variant, result, name) {
                outcome.hit = Some(hit);
                return outcome;
            }
        }

        debug!(%from, %to, attempts = outcome.attempts.len(), "ladder exhausted");
        outcome
    }
}

fn record(
    outcome: &mut LadderOutcome,
    decoder: DecoderId,
    variant: Variant,
    result: Option<String>,
    name: &str,
) -> Option<LadderHit> {
    let hit = result.as_ref().map(|text| LadderHit {
        text: text.clone(),
        method: format!("{name}{}", variant.suffix()),
    });
    outcome.attempts.push(DecodeAttempt {
        decoder,
        variant,
        result,
    });
    hit
}
