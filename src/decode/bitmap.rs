//! Decoder B: asynchronous decoding from an image handle.

use super::FormatSet;
use async_trait::async_trait;
use image::RgbaImage;
use rxing::common::HybridBinarizer;
use rxing::{
    BarcodeFormat, BinaryBitmap, DecodeHintType, DecodeHintValue, DecodingHintDictionary,
    MultiFormatReader, RGBLuminanceSource, Reader,
};
use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc;
use std::thread;
use tokio::sync::oneshot;
use tracing::{trace, warn};

/// Decoder working on a whole image
#[async_trait]
pub trait BitmapDecoder: Send + Sync {
    /// Label used in result methods
    fn name(&self) -> &str;

    /// Decode the image
    async fn decode(&self, image: &RgbaImage) -> Option<String>;
}

/// Multi-format decoder backed by `rxing`, always in try-harder mode.
///
/// The reader and its hints are built once on a dedicated worker thread
/// (`rxing` hints hold an `Rc`, so neither can cross threads) and every
/// decode is handed to that thread.
#[derive(Debug, Clone)]
pub struct RxingDecoder {
    formats: FormatSet,
    jobs: Option<mpsc::Sender<Job>>,
}

struct Job {
    image: RgbaImage,
    reply: oneshot::Sender<Option<String>>,
}

impl RxingDecoder {
    /// Create a decoder restricted to `formats` and start its worker
    pub fn new(formats: FormatSet) -> Self {
        let (tx, rx) = mpsc::channel::<Job>();
        let spawned = thread::Builder::new()
            .name(format!("rxing-{formats:?}").to_lowercase())
            .spawn(move || run_worker(formats, rx));
        let jobs = match spawned {
            Ok(_) => Some(tx),
            Err(err) => {
                warn!(?formats, %err, "failed to start rxing worker");
                None
            }
        };
        Self { formats, jobs }
    }

    /// Format set this decoder was built with
    pub fn formats(&self) -> FormatSet {
        self.formats
    }
}

const ALL_FORMATS: [BarcodeFormat; 17] = [
    BarcodeFormat::QR_CODE,
    BarcodeFormat::DATA_MATRIX,
    BarcodeFormat::AZTEC,
    BarcodeFormat::PDF_417,
    BarcodeFormat::MAXICODE,
    BarcodeFormat::UPC_A,
    BarcodeFormat::UPC_E,
    BarcodeFormat::EAN_13,
    BarcodeFormat::EAN_8,
    BarcodeFormat::CODABAR,
    BarcodeFormat::CODE_39,
    BarcodeFormat::CODE_93,
    BarcodeFormat::CODE_128,
    BarcodeFormat::ITF,
    BarcodeFormat::RSS_14,
    BarcodeFormat::RSS_EXPANDED,
    BarcodeFormat::TELEPEN,
];

fn hints_for(formats: FormatSet) -> DecodingHintDictionary {
    // An empty format list makes the stateful reader drop every hint,
    // so the permissive set is spelled out.
    let possible: HashSet<BarcodeFormat> = match formats {
        FormatSet::QrAndDataMatrix => {
            HashSet::from([BarcodeFormat::QR_CODE, BarcodeFormat::DATA_MATRIX])
        }
        FormatSet::All => ALL_FORMATS.into_iter().collect(),
    };
    let mut hints = DecodingHintDictionary::new();
    hints.insert(
        DecodeHintType::POSSIBLE_FORMATS,
        DecodeHintValue::PossibleFormats(possible),
    );
    hints.insert(DecodeHintType::TRY_HARDER, DecodeHintValue::TryHarder(true));
    hints
}

fn reader_for(formats: FormatSet) -> MultiFormatReader {
    let mut reader = MultiFormatReader::default();
    reader.set_hints(&hints_for(formats));
    reader
}

/// Pack RGBA pixels as 0xAARRGGBB
fn to_argb(image: &RgbaImage) -> Vec<u32> {
    image
        .pixels()
        .map(|p| {
            let [r, g, b, a] = p.0;
            (a as u32) << 24 | (r as u32) << 16 | (g as u32) << 8 | b as u32
        })
        .collect()
}

fn decode_with(reader: &mut MultiFormatReader, image: &RgbaImage) -> Option<String> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return None;
    }

    let source = RGBLuminanceSource::new_with_width_height_pixels(
        width as usize,
        height as usize,
        &to_argb(image),
    );
    let mut bitmap = BinaryBitmap::new(HybridBinarizer::new(source));
    match reader.decode_with_state(&mut bitmap) {
        Ok(result) => Some(result.getText().to_string()),
        Err(err) => {
            trace!(?err, "rxing found nothing");
            None
        }
    }
}

/// Serve jobs until every handle to the decoder is dropped
fn run_worker(formats: FormatSet, jobs: mpsc::Receiver<Job>) {
    let mut reader = reader_for(formats);
    while let Ok(job) = jobs.recv() {
        let outcome =
            panic::catch_unwind(AssertUnwindSafe(|| decode_with(&mut reader, &job.image)));
        let text = outcome.unwrap_or_else(|_| {
            warn!(?formats, "rxing panicked, rebuilding reader");
            reader = reader_for(formats);
            None
        });
        // The caller may have given up waiting
        let _ = job.reply.send(text);
    }
}

#[async_trait]
impl BitmapDecoder for RxingDecoder {
    fn name(&self) -> &str {
        "ZXing"
    }

    async fn decode(&self, image: &RgbaImage) -> Option<String> {
        let jobs = self.jobs.as_ref()?;
        let (reply, answer) = oneshot::channel();
        let job = Job {
            image: image.clone(),
            reply,
        };
        jobs.send(job).ok()?;
        answer.await.ok().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_argb_packing() {
        let img = RgbaImage::from_pixel(1, 1, Rgba([0x11, 0x22, 0x33, 0xff]));
        assert_eq!(to_argb(&img), vec![0xff11_2233]);
    }

    #[test]
    fn test_hints_follow_format_set() {
        let strict = hints_for(FormatSet::QrAndDataMatrix);
        assert!(strict.contains_key(&DecodeHintType::POSSIBLE_FORMATS));
        assert!(strict.contains_key(&DecodeHintType::TRY_HARDER));

        let all = hints_for(FormatSet::All);
        assert!(all.contains_key(&DecodeHintType::TRY_HARDER));
        match all.get(&DecodeHintType::POSSIBLE_FORMATS) {
            Some(DecodeHintValue::PossibleFormats(formats)) => {
                assert_eq!(formats.len(), ALL_FORMATS.len());
                assert!(formats.contains(&BarcodeFormat::CODE_128));
            }
            _ => panic!("permissive hints must list formats"),
        }
    }

    #[tokio::test]
    async fn test_blank_image_has_no_code() {
        let white = RgbaImage::from_pixel(80, 80, Rgba([255, 255, 255, 255]));
        let decoder = RxingDecoder::new(FormatSet::All);
        assert_eq!(decoder.decode(&white).await, None);
    }

    fn qr_image(payload: &str) -> RgbaImage {
        let code = qrcode::QrCode::new(payload.as_bytes()).unwrap();
        let luma = code
            .render::<image::Luma<u8>>()
            .quiet_zone(true)
            .module_dimensions(4, 4)
            .build();
        image::DynamicImage::ImageLuma8(luma).to_rgba8()
    }

    #[tokio::test]
    async fn test_reader_survives_repeated_decodes() {
        let decoder = RxingDecoder::new(FormatSet::QrAndDataMatrix);
        let white = RgbaImage::from_pixel(80, 80, Rgba([255, 255, 255, 255]));
        let qr = qr_image("https://example.com/reuse");

        assert_eq!(decoder.decode(&white).await, None);
        for _ in 0..3 {
            assert_eq!(
                decoder.decode(&qr).await.as_deref(),
                Some("https://example.com/reuse")
            );
        }
        assert_eq!(decoder.decode(&white).await, None);
    }

    #[tokio::test]
    async fn test_clones_share_one_worker() {
        let decoder = RxingDecoder::new(FormatSet::All);
        let copy = decoder.clone();
        let qr = qr_image("shared");
        drop(decoder);
        assert_eq!(copy.decode(&qr).await.as_deref(), Some("shared"));
    }

    #[tokio::test]
    async fn test_empty_image_is_skipped() {
        let decoder = RxingDecoder::new(FormatSet::All);
        assert_eq!(decoder.decode(&RgbaImage::new(0, 0)).await, None);
        assert_eq!(
            decoder.decode(&qr_image("after empty")).await.as_deref(),
            Some("after empty")
        );
    }
}
