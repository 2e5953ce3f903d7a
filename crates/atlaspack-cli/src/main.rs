use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand};
use image::{DynamicImage, ImageReader, RgbaImage};
use walkdir::WalkDir;

use atlaspack_core::assembler::{ImageSource, NoopBleed};
use atlaspack_core::config::OutputFormat;
use atlaspack_core::error::Result as PackResultT;
use atlaspack_core::progress::ProgressSink;
use atlaspack_core::{pack, PackOptions, Rect, Settings};

#[derive(Parser, Debug)]
#[command(name = "atlaspack", about = "Pack images into a texture atlas", version, author)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Show a progress bar while packing (disabled by --quiet)
    #[arg(long, default_value_t = true, action = ArgAction::Set, global = true, help_heading = "Logging/UX")]
    progress: bool,
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true, help_heading = "Logging/UX")]
    verbose: u8,
    /// Quiet mode (overrides verbose): only warnings/errors
    #[arg(short, long, default_value_t = false, global = true, help_heading = "Logging/UX")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Pack a directory of images into one or more atlas pages plus a manifest
    Pack(PackArgs),
}

#[derive(Parser, Debug, Clone)]
struct PackArgs {
    /// Directory to walk for source images
    #[arg(help_heading = "Input/Output")]
    input_dir: PathBuf,
    /// Directory the pages and manifest are written to
    #[arg(help_heading = "Input/Output")]
    output_dir: PathBuf,
    /// Atlas base name (pages are named NAME.png or NAME_N.png; manifest is NAME<ext>)
    #[arg(help_heading = "Input/Output")]
    atlas_name: String,

    /// Settings JSON file; defaults to `<input_dir>/settings.json` if present
    #[arg(long, help_heading = "Input/Output")]
    settings: Option<PathBuf>,
    /// Append to an existing manifest instead of overwriting it
    #[arg(long, default_value_t = false, help_heading = "Input/Output")]
    append: bool,

    /// Override Settings.max_width
    #[arg(long, help_heading = "Layout overrides")]
    max_width: Option<u32>,
    /// Override Settings.max_height
    #[arg(long, help_heading = "Layout overrides")]
    max_height: Option<u32>,
    /// Override Settings.min_width
    #[arg(long, help_heading = "Layout overrides")]
    min_width: Option<u32>,
    /// Override Settings.min_height
    #[arg(long, help_heading = "Layout overrides")]
    min_height: Option<u32>,
    /// Override Settings.power_of_two
    #[arg(long, action = ArgAction::Set, help_heading = "Layout overrides")]
    power_of_two: Option<bool>,
    /// Override Settings.square
    #[arg(long, action = ArgAction::Set, help_heading = "Layout overrides")]
    square: Option<bool>,
    /// Override Settings.grid (uniform-cell packer instead of MaxRects)
    #[arg(long, action = ArgAction::Set, help_heading = "Layout overrides")]
    grid: Option<bool>,
    /// Override Settings.rotation
    #[arg(long, action = ArgAction::Set, help_heading = "Layout overrides")]
    rotation: Option<bool>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.quiet, cli.verbose);
    match &cli.command {
        Commands::Pack(args) => run_pack(args, cli.progress && !cli.quiet),
    }
}

fn run_pack(args: &PackArgs, show_progress: bool) -> anyhow::Result<()> {
    fs::create_dir_all(&args.output_dir)
        .with_context(|| format!("create output directory {}", args.output_dir.display()))?;

    let mut settings = load_settings(args)?;
    apply_overrides(&mut settings, args);

    let paths = collect_image_paths(&args.input_dir)
        .with_context(|| format!("walk input directory {}", args.input_dir.display()))?;
    let images = load_images(&paths, show_progress)?;

    for scale_index in 0..settings.scale.len() {
        pack_one_scale(args, &settings, scale_index, &images)?;
    }

    Ok(())
}

fn load_settings(args: &PackArgs) -> anyhow::Result<Settings> {
    let path = args.settings.clone().unwrap_or_else(|| args.input_dir.join("settings.json"));
    if !path.exists() {
        return Ok(Settings::default());
    }
    let text = fs::read_to_string(&path).with_context(|| format!("read settings file {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parse settings file {}", path.display()))
}

fn apply_overrides(settings: &mut Settings, args: &PackArgs) {
    if let Some(v) = args.max_width {
        settings.max_width = v;
    }
    if let Some(v) = args.max_height {
        settings.max_height = v;
    }
    if let Some(v) = args.min_width {
        settings.min_width = v;
    }
    if let Some(v) = args.min_height {
        settings.min_height = v;
    }
    if let Some(v) = args.power_of_two {
        settings.power_of_two = v;
    }
    if let Some(v) = args.square {
        settings.square = v;
    }
    if let Some(v) = args.grid {
        settings.grid = v;
    }
    if let Some(v) = args.rotation {
        settings.rotation = v;
    }
}

fn is_image(p: &Path) -> bool {
    matches!(
        p.extension().and_then(|e| e.to_str()).map(|s| s.to_ascii_lowercase()),
        Some(ext) if matches!(ext.as_str(), "png" | "jpg" | "jpeg" | "bmp" | "tga" | "gif")
    )
}

fn collect_image_paths(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut list = Vec::new();
    for entry in WalkDir::new(dir).into_iter().filter_map(|e| e.ok()) {
        let p = entry.path();
        if p.is_file() && is_image(p) {
            list.push(p.to_path_buf());
        }
    }
    list.sort();
    Ok(list)
}

struct LoadedImage {
    name: String,
    image: DynamicImage,
}

fn load_images(paths: &[PathBuf], show_progress: bool) -> anyhow::Result<Vec<LoadedImage>> {
    let bar = if show_progress {
        let b = indicatif::ProgressBar::new(paths.len() as u64);
        b.set_style(
            indicatif::ProgressStyle::with_template("{spinner:.green} loading {pos}/{len} [{elapsed_precise}] {wide_msg}")
                .unwrap(),
        );
        Some(b)
    } else {
        None
    };

    let mut out = Vec::with_capacity(paths.len());
    for p in paths {
        if let Some(b) = &bar {
            b.set_message(p.file_name().and_then(|s| s.to_str()).unwrap_or("").to_string());
        }
        let image = ImageReader::open(p)?.with_guessed_format()?.decode()?;
        let name = p.to_string_lossy().replace('\\', "/");
        out.push(LoadedImage { name, image });
        if let Some(b) = &bar {
            b.inc(1);
        }
    }
    if let Some(b) = &bar {
        b.finish_and_clear();
    }
    Ok(out)
}

struct MapImageSource<'a> {
    images: &'a [LoadedImage],
}

impl<'a> ImageSource for MapImageSource<'a> {
    fn load(&self, rect_name: &str) -> PackResultT<RgbaImage> {
        let found = self.images.iter().find(|i| i.name == rect_name);
        match found {
            Some(loaded) => Ok(loaded.image.to_rgba8()),
            None => Ok(RgbaImage::new(1, 1)),
        }
    }
}

struct CliProgress {
    bar: Option<indicatif::ProgressBar>,
}

impl ProgressSink for CliProgress {
    fn start(&mut self, _portion: f32) {}

    fn update(&mut self, count: usize, total: usize) -> bool {
        if let Some(bar) = &self.bar {
            bar.set_length(total as u64);
            bar.set_position(count as u64);
        }
        false
    }

    fn end(&mut self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }
}

fn pack_one_scale(
    args: &PackArgs,
    base_settings: &Settings,
    scale_index: usize,
    images: &[LoadedImage],
) -> anyhow::Result<()> {
    let scale = base_settings.scale[scale_index];
    let suffix = base_settings.scale_suffix.get(scale_index).cloned().unwrap_or_default();
    let filter = base_settings
        .scale_resampling
        .get(scale_index)
        .copied()
        .unwrap_or_default()
        .to_image_filter();

    let mut settings = base_settings.clone();
    settings.scale = vec![1.0];

    let scaled: Vec<LoadedImage> = if (scale - 1.0).abs() < f32::EPSILON {
        images.iter().map(|i| LoadedImage { name: i.name.clone(), image: i.image.clone() }).collect()
    } else {
        images
            .iter()
            .map(|i| {
                let (w, h) = (i.image.width(), i.image.height());
                let nw = ((w as f32) * scale).round().max(1.0) as u32;
                let nh = ((h as f32) * scale).round().max(1.0) as u32;
                LoadedImage { name: i.name.clone(), image: i.image.resize_exact(nw, nh, filter) }
            })
            .collect()
    };

    let rects: Vec<Rect> = scaled
        .iter()
        .map(|i| {
            let (w, h) = (i.image.width(), i.image.height());
            let mut rect = Rect::new(i.name.clone(), w, h);
            rect.region_width = w;
            rect.region_height = h;
            rect.original_width = w;
            rect.original_height = h;
            rect
        })
        .collect();

    let atlas_name = format!("{}{}", args.atlas_name, suffix);
    let ext = &settings.atlas_extension;
    let manifest_path = args.output_dir.join(format!("{atlas_name}{ext}"));

    let existing_manifest = if args.append && manifest_path.exists() {
        Some(fs::read_to_string(&manifest_path).with_context(|| format!("read {}", manifest_path.display()))?)
    } else {
        None
    };

    let existing_page_names = existing_output_names(&args.output_dir)?;
    let options = PackOptions {
        atlas_name: &atlas_name,
        existing_manifest: existing_manifest.as_deref(),
        existing_page_names: &existing_page_names,
        appending: args.append && existing_manifest.is_some(),
    };

    let source = MapImageSource { images: &scaled };
    let mut progress = CliProgress { bar: None };

    let result = pack(rects, &settings, &source, &NoopBleed, &mut progress, &options)
        .with_context(|| format!("pack {}", args.input_dir.display()))?;

    for (page, canvas) in result.pages.iter().zip(result.images.iter()) {
        let name = page.image_name.as_deref().unwrap_or("page.png");
        let path = args.output_dir.join(name);
        let format = match settings.output_format {
            OutputFormat::Png => image::ImageFormat::Png,
            OutputFormat::Jpg => image::ImageFormat::Jpeg,
        };
        canvas.save_with_format(&path, format).with_context(|| format!("write {}", path.display()))?;
        tracing::info!(?path, "wrote page");
    }

    if args.append && existing_manifest.is_some() {
        let mut body = existing_manifest.unwrap();
        body.push_str(&result.manifest);
        fs::write(&manifest_path, body).with_context(|| format!("write {}", manifest_path.display()))?;
    } else {
        fs::write(&manifest_path, &result.manifest).with_context(|| format!("write {}", manifest_path.display()))?;
    }
    tracing::info!(?manifest_path, "wrote manifest");

    Ok(())
}

fn existing_output_names(dir: &Path) -> anyhow::Result<HashSet<String>> {
    let mut names = HashSet::new();
    if dir.exists() {
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            if let Some(name) = entry.file_name().to_str() {
                names.insert(name.to_string());
            }
        }
    }
    Ok(names)
}

fn init_tracing(quiet: bool, verbose: u8) {
    let level = if quiet {
        "error"
    } else {
        match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };
    let _ = tracing_subscriber::fmt().with_env_filter(level).with_target(false).try_init();
}
