//! Helpers shared by the CLI and the benches: dataset discovery, target
//! construction for files and URLs, and argument parsing.

use crate::acquire::{ResourceLoader, decode_bytes};
use crate::error::AcquireError;
use crate::models::{CropRegion, ImageTarget, ScanTarget, Size};
use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

const IMAGE_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "gif", "bmp", "webp"];

/// Default dataset root from `AUTOQR_DATASET_ROOT`.
pub fn dataset_root_from_env() -> PathBuf {
    env::var("AUTOQR_DATASET_ROOT")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("benches/images"))
}

/// Image limit from `AUTOQR_BENCH_LIMIT`; unset or `0` means no limit.
pub fn bench_limit_from_env() -> Option<usize> {
    env::var("AUTOQR_BENCH_LIMIT")
        .ok()
        .and_then(|value| value.trim().parse::<usize>().ok())
        .filter(|v| *v > 0)
}

/// Smoke test flag from `AUTOQR_SMOKE`.
pub fn smoke_from_env() -> bool {
    matches!(
        env::var("AUTOQR_SMOKE").as_deref(),
        Ok("1") | Ok("true") | Ok("TRUE") | Ok("yes") | Ok("YES")
    )
}

/// Iterate dataset image paths with optional smoke list and limit.
pub fn dataset_iter<P: AsRef<Path>>(
    root: P,
    limit: Option<usize>,
    smoke: bool,
) -> impl Iterator<Item = PathBuf> {
    let root = root.as_ref();
    let mut images = if smoke {
        load_smoke_list(root).unwrap_or_else(|| collect_images(root))
    } else {
        collect_images(root)
    };

    images.sort();
    if let Some(limit) = limit {
        images.truncate(limit);
    }
    images.into_iter()
}

fn load_smoke_list(root: &Path) -> Option<Vec<PathBuf>> {
    let contents = fs::read_to_string(root.join("_smoke.txt")).ok()?;
    let paths: Vec<PathBuf> = contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| {
            let candidate = Path::new(line);
            if candidate.is_absolute() {
                candidate.to_path_buf()
            } else {
                root.join(candidate)
            }
        })
        .filter(|path| path.exists())
        .collect();
    if paths.is_empty() { None } else { Some(paths) }
}

fn collect_images(root: &Path) -> Vec<PathBuf> {
    let mut stack = vec![root.to_path_buf()];
    let mut images = Vec::new();

    while let Some(dir) = stack.pop() {
        let Ok(entries) = fs::read_dir(&dir) else {
            continue;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
            } else if is_image_path(&path) {
                images.push(path);
            }
        }
    }
    images
}

fn is_image_path(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
}

/// Image target for a local file, displayed at its natural size
pub fn target_for_path(path: &Path) -> Result<ScanTarget, image::ImageError> {
    let (width, height) = image::image_dimensions(path)?;
    let size = Size::new(width, height);
    Ok(ScanTarget::image(ImageTarget::new(
        path.to_string_lossy(),
        size,
        size,
    )))
}

/// Image target for a path or URL.
///
/// Remote images are fetched once here to learn their natural size; the
/// scanner fetches them again through its own loader.
pub async fn resolve_target(
    input: &str,
    loader: &dyn ResourceLoader,
) -> Result<ScanTarget, AcquireError> {
    let is_remote = url::Url::parse(input)
        .map(|u| matches!(u.scheme(), "http" | "https"))
        .unwrap_or(false);
    if !is_remote {
        let bitmap = loader.load_image(input).await?;
        let size = Size::new(bitmap.width(), bitmap.height());
        return Ok(ScanTarget::image(ImageTarget::new(input, size, size)));
    }

    let bitmap = decode_bytes(&loader.fetch_bytes(input).await?)?;
    let size = Size::new(bitmap.width(), bitmap.height());
    Ok(ScanTarget::image(ImageTarget::new(input, size, size)))
}

/// Parse `x,y,w,h` into a crop region
pub fn parse_crop(value: &str) -> Result<CropRegion, String> {
    let parts: Vec<f64> = value
        .split(',')
        .map(|part| {
            part.trim()
                .parse::<f64>()
                .map_err(|e| format!("invalid crop component {part:?}: {e}"))
        })
        .collect::<Result<_, _>>()?;

    match parts.as_slice() {
        [x, y, w, h] if *w > 0.0 && *h > 0.0 => Ok(CropRegion::new(*x, *y, *w, *h)),
        [_, _, _, _] => Err("crop width and height must be positive".to_string()),
        _ => Err(format!("expected x,y,w,h, got {value:?}")),
    }
}

/// Decoded-image tally for a batch run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadingRate {
    /// Images that decoded
    pub decoded: usize,
    /// Images attempted
    pub total: usize,
}

impl ReadingRate {
    /// Count one image
    pub fn record(&mut self, decoded: bool) {
        self.total += 1;
        if decoded {
            self.decoded += 1;
        }
    }

    /// Percentage decoded, 0 when nothing was attempted
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.decoded as f64 / self.total as f64 * 100.0
        }
    }
}

impl fmt::Display for ReadingRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} = {:.2}%", self.decoded, self.total, self.percent())
    }
}
