use autoqr::acquire::HttpLoader;
use autoqr::tools::{
    ReadingRate, bench_limit_from_env, dataset_iter, dataset_root_from_env, parse_crop,
    resolve_target, smoke_from_env, target_for_path,
};
use autoqr::{CacheEntry, ImageTarget, ScanConfig, ScanRequest, ScanTarget, Scanner, Size};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "qrtool", version, about = "autoqr CLI tools")]
struct Cli {
    /// Print cache entries as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Decode one image from a path or URL
    Scan {
        input: String,
        /// Run the full decode ladder
        #[arg(long)]
        force: bool,
        /// Let decoder B report every barcode format
        #[arg(long)]
        all_formats: bool,
        /// Restrict the scan to `x,y,w,h` in displayed pixels
        #[arg(long, allow_hyphen_values = true)]
        crop: Option<String>,
        /// Decode the crop at its native size
        #[arg(long, requires = "crop")]
        no_scale: bool,
    },
    /// Race the remote decode services for an image URL
    Remote { url: String },
    /// Compute the reading rate over a directory of images
    Batch {
        #[arg(long)]
        root: Option<PathBuf>,
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long)]
        smoke: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = ScanConfig::from_env();
    let scanner = match Scanner::builder(config.clone()).build() {
        Ok(scanner) => scanner,
        Err(err) => {
            eprintln!("Failed to create HTTP client: {err}");
            return ExitCode::FAILURE;
        }
    };

    let entry = match cli.command {
        Command::Scan {
            input,
            force,
            all_formats,
            crop,
            no_scale,
        } => {
            let request = match build_request(force, all_formats, crop.as_deref(), no_scale) {
                Ok(request) => request,
                Err(err) => {
                    eprintln!("{err}");
                    return ExitCode::FAILURE;
                }
            };
            scan_cmd(&scanner, &config, &input, &request).await
        }
        Command::Remote { url } => remote_cmd(&scanner, &config, &url).await,
        Command::Batch { root, limit, smoke } => {
            batch_cmd(&scanner, root, limit, smoke).await;
            return ExitCode::SUCCESS;
        }
    };

    match entry {
        Some(entry) => {
            print_entry(&entry, cli.json);
            if entry.is_success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        None => ExitCode::FAILURE,
    }
}

fn build_request(
    force: bool,
    all_formats: bool,
    crop: Option<&str>,
    no_scale: bool,
) -> Result<ScanRequest, String> {
    let mut request = match (force, all_formats) {
        (_, true) => ScanRequest::forced_all_formats(),
        (true, false) => ScanRequest::forced(),
        (false, false) => ScanRequest::auto(),
    };
    if let Some(value) = crop {
        let mut region = parse_crop(value)?;
        region.no_scale = no_scale;
        request = ScanRequest {
            force: true,
            ..request.with_crop(region)
        };
    }
    Ok(request)
}

async fn scan_cmd(
    scanner: &Scanner,
    config: &ScanConfig,
    input: &str,
    request: &ScanRequest,
) -> Option<CacheEntry> {
    let loader = match HttpLoader::new(config.remote_timeout) {
        Ok(loader) => loader,
        Err(err) => {
            eprintln!("Failed to create HTTP client: {err}");
            return None;
        }
    };
    let target = match resolve_target(input, &loader).await {
        Ok(target) => target,
        Err(err) => {
            eprintln!("Failed to load image {input}: {err}");
            return None;
        }
    };

    let size = target.natural_size();
    println!("Image: {} ({}x{})", input, size.width, size.height);
    let start = Instant::now();
    let entry = scanner.scan(&target, request).await;
    println!("Scan took {:.2?}", start.elapsed());
    Some(entry)
}

async fn remote_cmd(scanner: &Scanner, config: &ScanConfig, url: &str) -> Option<CacheEntry> {
    let target = ScanTarget::image(ImageTarget::new(url, Size::default(), Size::default()));
    println!(
        "Querying {} and {}",
        config.zxing_endpoint, config.qr_api_endpoint
    );
    let start = Instant::now();
    let entry = scanner.remote_scan(&target).await;
    println!("Remote race took {:.2?}", start.elapsed());
    Some(entry)
}

async fn batch_cmd(scanner: &Scanner, root: Option<PathBuf>, limit: Option<usize>, smoke: bool) {
    let root = root.unwrap_or_else(dataset_root_from_env);
    let limit = limit.or_else(bench_limit_from_env);
    let smoke = smoke || smoke_from_env();
    if !root.exists() {
        eprintln!("Dataset root not found: {}", root.display());
        return;
    }

    let images: Vec<PathBuf> = dataset_iter(&root, limit, smoke).collect();
    if images.is_empty() {
        println!("No images found under {}", root.display());
        return;
    }

    println!("autoqr Reading Rate");
    println!("===================\n");
    let mut rate = ReadingRate::default();
    let started = Instant::now();
    for (i, path) in images.iter().enumerate() {
        let target = match target_for_path(path) {
            Ok(target) => target,
            Err(err) => {
                println!("  [{}] {} -> unreadable ({err})", i + 1, path.display());
                rate.record(false);
                continue;
            }
        };
        let start = Instant::now();
        let entry = scanner.scan(&target, &ScanRequest::forced()).await;
        let verdict = match &entry {
            CacheEntry::Success { method, .. } => format!("hit via {method}"),
            other => format!("miss ({other})"),
        };
        println!(
            "  [{}] {} -> {} ({:.2?})",
            i + 1,
            path.display(),
            verdict,
            start.elapsed()
        );
        rate.record(entry.is_success());
    }

    println!("\n===================");
    println!("Reading rate: {rate} in {:.2?}", started.elapsed());
}

fn print_entry(entry: &CacheEntry, json: bool) {
    if json {
        match serde_json::to_string_pretty(entry) {
            Ok(text) => println!("{text}"),
            Err(err) => eprintln!("Failed to serialize result: {err}"),
        }
        return;
    }
    match entry {
        CacheEntry::Success { text, method } => {
            println!("Decoded via {method}:");
            println!("{text}");
        }
        other => println!("No result: {other}"),
    }
}
