use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::style::Stylize;
use image::{DynamicImage, GrayAlphaImage, GrayImage, RgbImage, RgbaImage};
use indicatif::{ProgressBar, ProgressStyle};
use statrs::statistics::{Data, Median, Statistics};
use tile_ssim::{
    compute_ssim_channels, compute_ssim_with_backend, RayonBackend, SampleImage, SsimConfig,
    SsimReference,
};

/// Computes the tiled SSIM score between a source image and one or more
/// distorted images. 1.0 means identical.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Original image
    source: PathBuf,

    /// Distorted image(s) compared against the source
    #[arg(required = true)]
    distorted: Vec<PathBuf>,

    /// Side length of the square comparison tiles
    #[arg(short, long, default_value_t = tile_ssim::DEFAULT_TILE_SIZE)]
    tile_size: usize,

    /// Use the data-parallel backend
    #[arg(short, long)]
    parallel: bool,

    /// Number of worker threads for the parallel backend (implies --parallel)
    #[arg(long)]
    threads: Option<usize>,

    /// Also print the score of every channel
    #[arg(long)]
    channels: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

/// A decoded image with its 8-bit channel layout preserved.
enum Loaded {
    Luma(GrayImage),
    LumaAlpha(GrayAlphaImage),
    Rgb(RgbImage),
    Rgba(RgbaImage),
}

impl From<DynamicImage> for Loaded {
    fn from(img: DynamicImage) -> Self {
        match img.color().channel_count() {
            1 => Loaded::Luma(img.into_luma8()),
            2 => Loaded::LumaAlpha(img.into_luma_alpha8()),
            3 => Loaded::Rgb(img.into_rgb8()),
            _ => Loaded::Rgba(img.into_rgba8()),
        }
    }
}

macro_rules! with_buffer {
    ($self:expr, $buf:ident => $body:expr) => {
        match $self {
            Loaded::Luma($buf) => $body,
            Loaded::LumaAlpha($buf) => $body,
            Loaded::Rgb($buf) => $body,
            Loaded::Rgba($buf) => $body,
        }
    };
}

impl SampleImage for Loaded {
    fn width(&self) -> usize {
        with_buffer!(self, b => SampleImage::width(b))
    }

    fn height(&self) -> usize {
        with_buffer!(self, b => SampleImage::height(b))
    }

    fn channel_count(&self) -> usize {
        with_buffer!(self, b => SampleImage::channel_count(b))
    }

    fn sample(&self, channel: usize, x: usize, y: usize) -> u8 {
        with_buffer!(self, b => SampleImage::sample(b, channel, x, y))
    }
}

fn load_image(path: &Path) -> Result<Loaded> {
    let img = image::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    Ok(Loaded::from(img))
}

fn colored_score(score: f64) -> String {
    let text = format!("{:.6}", score);
    if !std::io::stdout().is_terminal() {
        return text;
    }
    if score >= 0.95 {
        text.green().to_string()
    } else if score >= 0.80 {
        text.yellow().to_string()
    } else {
        text.red().to_string()
    }
}

fn print_channels(
    prefix: &str,
    source: &Loaded,
    distorted: &Loaded,
    config: SsimConfig,
) -> Result<()> {
    let per_channel = compute_ssim_channels(source, distorted, config)?;
    for (channel, score) in per_channel.into_iter().enumerate() {
        println!("{}channel {}: {}", prefix, channel, colored_score(score));
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let parallel = args.parallel || args.threads.is_some();
    let config = if parallel {
        SsimConfig::parallel()
    } else {
        SsimConfig::sequential()
    }
    .with_tile_size(args.tile_size);
    let backend = match args.threads {
        Some(threads) => RayonBackend::with_threads(threads),
        None => RayonBackend::new(),
    };

    let source = load_image(&args.source)?;

    if let [path] = args.distorted.as_slice() {
        let distorted = load_image(path)?;
        let score = compute_ssim_with_backend(&source, &distorted, config, &backend)
            .with_context(|| format!("Failed to compare with {}", path.display()))?;
        println!("{}", colored_score(score));
        if args.channels {
            print_channels("", &source, &distorted, config)?;
        }
        return Ok(());
    }

    let reference = if parallel {
        None
    } else {
        Some(SsimReference::new(&source, config).context("Invalid source image")?)
    };

    let pb = ProgressBar::new(args.distorted.len() as u64);
    pb.set_style(
        ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} [{elapsed_precise}] {msg}")?
            .progress_chars("##-"),
    );

    let mut scores = Vec::with_capacity(args.distorted.len());
    for path in &args.distorted {
        pb.set_message(path.display().to_string());
        let distorted = load_image(path)?;
        let score = match &reference {
            Some(reference) => reference.compare(&distorted),
            None => compute_ssim_with_backend(&source, &distorted, config, &backend),
        }
        .with_context(|| format!("Failed to compare with {}", path.display()))?;

        pb.println(format!("{}: {}", path.display(), colored_score(score)));
        if args.channels {
            pb.suspend(|| print_channels("  ", &source, &distorted, config))?;
        }
        scores.push(score);
        pb.inc(1);
    }
    pb.finish_and_clear();

    let median = Data::new(scores.clone()).median();
    println!();
    println!("Mean:    {}", colored_score(Statistics::mean(&scores)));
    println!("Std dev: {:.6}", Statistics::std_dev(&scores));
    println!("Min:     {}", colored_score(Statistics::min(&scores)));
    println!("Median:  {}", colored_score(median));
    println!("Max:     {}", colored_score(Statistics::max(&scores)));

    Ok(())
}
