//! The scan pipeline: cache lookup, size policy, draw plan, acquisition,
//! rendering, the decode ladder and the remote race.
//!
//! Every failure is converted into a terminal [`CacheEntry`] here, so
//! callers only ever see cache states.

use crate::acquire::{Acquirer, HttpLoader, ResourceLoader};
use crate::cache::ResultCache;
use crate::config::ScanConfig;
use crate::decode::{
    BitmapDecoder, FormatSet, Ladder, LadderHit, PixelDecoder, RqrrDecoder, RxingDecoder, Variant,
};
use crate::error::{RemoteError, ScanError, SizeRejection};
use crate::geometry::{compute_draw_plan, render};
use crate::models::{CacheEntry, CropRegion, ScanTarget, TargetKey};
use crate::remote::RemoteRace;
use std::sync::{Arc, OnceLock};
use tracing::{debug, info, instrument};

/// Builds decoder B for a format set
pub type BitmapFactory = Arc<dyn Fn(FormatSet) -> Arc<dyn BitmapDecoder> + Send + Sync>;

/// Suffix appended to the method of crop scans
pub const CROP_SUFFIX: &str = " (crop)";

/// What a scan should do
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScanRequest {
    /// Run the full ladder and bypass the cache
    pub force: bool,
    /// Formats decoder B may report
    pub formats: FormatSet,
    /// Restrict the scan to part of the target
    pub crop: Option<CropRegion>,
}

impl ScanRequest {
    /// Automatic hover scan: standard stage only, cache respected
    pub fn auto() -> Self {
        Self {
            force: false,
            formats: FormatSet::QrAndDataMatrix,
            crop: None,
        }
    }

    /// Forced scan through every stage
    pub fn forced() -> Self {
        Self {
            force: true,
            ..Self::auto()
        }
    }

    /// Forced scan with every barcode format enabled
    pub fn forced_all_formats() -> Self {
        Self {
            formats: FormatSet::All,
            ..Self::forced()
        }
    }

    /// Forced scan of a crop region
    pub fn crop(crop: CropRegion) -> Self {
        Self::forced().with_crop(crop)
    }

    /// Same request restricted to `crop`
    pub fn with_crop(mut self, crop: CropRegion) -> Self {
        self.crop = Some(crop);
        self
    }
}

/// Decodes targets and records the outcomes
pub struct Scanner {
    config: ScanConfig,
    acquirer: Acquirer,
    cache: Arc<ResultCache>,
    pixel: Arc<dyn PixelDecoder>,
    bitmap_factory: BitmapFactory,
    strict: OnceLock<Arc<dyn BitmapDecoder>>,
    permissive: OnceLock<Arc<dyn BitmapDecoder>>,
    remote: RemoteRace,
}

impl Scanner {
    /// Start building a scanner
    pub fn builder(config: ScanConfig) -> ScannerBuilder {
        ScannerBuilder::new(config)
    }

    /// Active configuration
    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Shared result cache
    pub fn cache(&self) -> &Arc<ResultCache> {
        &self.cache
    }

    /// Cached outcome for `target`
    pub fn cached(&self, target: &ScanTarget) -> Option<CacheEntry> {
        self.cache.get(&target.key())
    }

    /// Record `Skipped{too_large}` unless the target already has an entry.
    /// Returns the entry now cached.
    pub fn mark_too_large(&self, target: &ScanTarget) -> CacheEntry {
        let key = target.key();
        if let Some(existing) = self.cache.get(&key) {
            return existing;
        }
        let entry = ScanError::SizeRejected(SizeRejection::TooLarge).to_entry();
        debug!(%target, "marking too large for automatic scans");
        self.cache.set(&key, entry.clone());
        entry
    }

    /// Decode `target` locally.
    ///
    /// Automatic scans return any cached entry untouched, skip oversized
    /// targets, and run only the standard stage. Forced scans run the whole
    /// ladder, starting at the inverted stage when a full-image scan is
    /// retrying a cached `standard_failed`.
    #[instrument(skip(self, request), fields(target = %target, force = request.force))]
    pub async fn scan(&self, target: &ScanTarget, request: &ScanRequest) -> CacheEntry {
        let key = target.key();
        let prior = self.cache.get(&key);

        if !request.force {
            if let Some(entry) = prior {
                debug!(%entry, "cached");
                return entry;
            }
            if self.config.exceeds_auto_size(target.natural_size()) {
                return self.mark_too_large(target);
            }
        }

        let skip_standard = request.force
            && request.crop.is_none()
            && prior.as_ref().is_some_and(CacheEntry::is_standard_failed);
        let from = if skip_standard {
            Variant::Inverted
        } else {
            Variant::Normal
        };
        let to = if request.force {
            Variant::Binarized
        } else {
            Variant::Normal
        };

        let entry = match self.run_local(target, request, from, to).await {
            Ok(hit) => {
                target.mark_has_qr();
                info!(method = %hit.method, "decoded");
                CacheEntry::success(hit.text, hit.method)
            }
            Err(err) => {
                debug!(%err, "scan failed");
                err.to_entry()
            }
        };
        self.store(&key, entry)
    }

    async fn run_local(
        &self,
        target: &ScanTarget,
        request: &ScanRequest,
        from: Variant,
        to: Variant,
    ) -> Result<LadderHit, ScanError> {
        let plan = compute_draw_plan(
            target.natural_size(),
            target.display_size(),
            target.is_vector(),
            request.crop.as_ref(),
            &self.config,
        )?;
        let bitmap = self.acquirer.acquire(target).await?;
        let canvas = render(&bitmap, &plan)?;

        let bitmap_decoder = self.bitmap_decoder(request.formats);
        let outcome = Ladder::new(self.pixel.as_ref(), bitmap_decoder.as_ref())
            .run(&canvas, from, to)
            .await;

        let mut hit = outcome.hit.ok_or(ScanError::DecodeExhausted {
            forced: request.force,
        })?;
        if request.crop.is_some() {
            hit.method.push_str(CROP_SUFFIX);
        }
        Ok(hit)
    }

    /// Query the remote services for an http(s) image target
    #[instrument(skip(self), fields(target = %target))]
    pub async fn remote_scan(&self, target: &ScanTarget) -> CacheEntry {
        let result = match target.url() {
            Some(url) => self.remote.race(url).await,
            None => Err(vec![RemoteError::Unsupported(target.to_string())]),
        };

        let entry = match result {
            Ok(hit) => {
                target.mark_has_qr();
                CacheEntry::success(hit.text, hit.source)
            }
            Err(errors) => ScanError::RemoteRaceExhausted(errors).to_entry(),
        };
        self.store(&target.key(), entry)
    }

    /// Write `entry` unless it is a failure that would replace a success.
    /// Returns the entry now cached.
    fn store(&self, key: &TargetKey, entry: CacheEntry) -> CacheEntry {
        if !entry.is_success() {
            if let Some(existing) = self.cache.get(key).filter(CacheEntry::is_success) {
                debug!(%entry, "keeping earlier success");
                return existing;
            }
        }
        self.cache.set(key, entry.clone());
        entry
    }

    fn bitmap_decoder(&self, formats: FormatSet) -> Arc<dyn BitmapDecoder> {
        let cell = match formats {
            FormatSet::QrAndDataMatrix => &self.strict,
            FormatSet::All => &self.permissive,
        };
        cell.get_or_init(|| {
            debug!(?formats, "constructing bitmap decoder");
            (self.bitmap_factory)(formats)
        })
        .clone()
    }
}

/// Builder for [`Scanner`]; unset parts get the production defaults
pub struct ScannerBuilder {
    config: ScanConfig,
    loader: Option<Arc<dyn ResourceLoader>>,
    cache: Option<Arc<ResultCache>>,
    pixel: Option<Arc<dyn PixelDecoder>>,
    bitmap_factory: Option<BitmapFactory>,
    remote: Option<RemoteRace>,
}

impl ScannerBuilder {
    /// Builder with nothing overridden
    pub fn new(config: ScanConfig) -> Self {
        Self {
            config,
            loader: None,
            cache: None,
            pixel: None,
            bitmap_factory: None,
            remote: None,
        }
    }

    /// Resource loader used for acquisition
    pub fn loader(mut self, loader: Arc<dyn ResourceLoader>) -> Self {
        self.loader = Some(loader);
        self
    }

    /// Result cache, possibly shared with another scanner
    pub fn cache(mut self, cache: Arc<ResultCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Decoder A
    pub fn pixel_decoder(mut self, decoder: Arc<dyn PixelDecoder>) -> Self {
        self.pixel = Some(decoder);
        self
    }

    /// Constructor for decoder B instances
    pub fn bitmap_factory(mut self, factory: BitmapFactory) -> Self {
        self.bitmap_factory = Some(factory);
        self
    }

    /// Remote race participants
    pub fn remote(mut self, remote: RemoteRace) -> Self {
        self.remote = Some(remote);
        self
    }

    /// Assemble the scanner, creating HTTP clients for any defaults needed
    pub fn build(self) -> Result<Scanner, reqwest::Error> {
        let loader: Arc<dyn ResourceLoader> = match self.loader {
            Some(loader) => loader,
            None => Arc::new(HttpLoader::new(self.config.remote_timeout)?),
        };
        let remote = match self.remote {
            Some(remote) => remote,
            None => RemoteRace::from_config(&self.config)?,
        };
        let bitmap_factory = self.bitmap_factory.unwrap_or_else(|| {
            Arc::new(|formats| Arc::new(RxingDecoder::new(formats)) as Arc<dyn BitmapDecoder>)
        });

        Ok(Scanner {
            acquirer: Acquirer::new(loader),
            cache: self.cache.unwrap_or_default(),
            pixel: self.pixel.unwrap_or_else(|| Arc::new(RqrrDecoder)),
            bitmap_factory,
            strict: OnceLock::new(),
            permissive: OnceLock::new(),
            remote,
            config: self.config,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_presets() {
        let auto = ScanRequest::auto();
        assert!(!auto.force);
        assert_eq!(auto.formats, FormatSet::QrAndDataMatrix);

        let all = ScanRequest::forced_all_formats();
        assert!(all.force);
        assert_eq!(all.formats, FormatSet::All);

        let crop = ScanRequest::crop(CropRegion::new(0.0, 0.0, 10.0, 10.0));
        assert!(crop.force);
        assert!(crop.crop.is_some());
    }
}
