use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Context;
use atlas_packer_core::config::{AtlasConfig, PackerKind, SkylineMode, SortOrder};
use atlas_packer_core::{InputImage, PackOutput, pack_images, to_json};
use clap::{ArgAction, Parser, Subcommand};
use globset::{Glob, GlobSetBuilder};
use image::{DynamicImage, ImageReader};
use tracing::{error, info, warn};
use walkdir::WalkDir;

#[derive(Parser, Debug)]
#[command(
    name = "atlas-packer",
    about = "Pack sprites into texture atlas pages",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Show progress bars (disable with --progress false or --quiet)
    #[arg(long, default_value_t = true, action=ArgAction::Set, global=true, help_heading = "Logging/UX")]
    progress: bool,
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action=ArgAction::Count, global=true, help_heading = "Logging/UX")]
    verbose: u8,
    /// Quiet mode (overrides verbose)
    #[arg(
        short,
        long,
        default_value_t = false,
        global = true,
        help_heading = "Logging/UX"
    )]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Pack images into atlas pages (PNG) plus a JSON layout
    Pack(PackArgs),
    /// Layout-only export: compute placements and write the JSON, no PNGs
    Layout(PackArgs),
    /// Simple timing bench (packs once, prints time + occupancy)
    Bench(BenchArgs),
}

#[derive(Parser, Debug, Clone)]
struct PackArgs {
    // Input/Output
    /// Input file or directory
    #[arg(help_heading = "Input/Output")]
    input: PathBuf,
    /// Output directory
    #[arg(short, long, default_value = "out", help_heading = "Input/Output")]
    out_dir: PathBuf,
    /// Atlas base name (files will be name_<page>.png and name.json)
    #[arg(short, long, default_value = "atlas", help_heading = "Input/Output")]
    name: String,
    /// JSON config file (an AtlasConfig); replaces the packing options below
    #[arg(long, help_heading = "Input/Output")]
    config: Option<PathBuf>,
    /// Include patterns (glob). If set, only files matching any pattern are considered
    #[arg(long, help_heading = "Input/Output")]
    include: Vec<String>,
    /// Exclude patterns (glob). Files matching any pattern will be ignored
    #[arg(long, help_heading = "Input/Output")]
    exclude: Vec<String>,

    // Packing
    /// Packer: skyline | tile
    #[arg(long, value_parser = ["skyline", "tile"], default_value = "skyline", help_heading = "Packing")]
    packer: String,
    /// Skyline heuristic: bl
    #[arg(long, default_value = "bl", help_heading = "Packing")]
    skyline: String,
    /// Sort order: squareness_desc|area_desc|name_asc|none
    #[arg(long, default_value = "squareness_desc", help_heading = "Packing")]
    sort_order: String,
    /// Allow rotation (90deg for skyline, 90/180/270 for tile)
    #[arg(long, default_value_t = true, action=ArgAction::Set, help_heading = "Packing")]
    allow_rotation: bool,

    // Tile packer
    /// Tile edge in pixels (power of two; 0 = 16)
    #[arg(long, default_value_t = 16, help_heading = "Tile packer")]
    tile_size: u32,
    /// Alpha values at or below this are transparent
    #[arg(long, default_value_t = 8, help_heading = "Tile packer")]
    alpha_threshold: u8,
    /// Pixel gap kept around each sprite's content
    #[arg(long, default_value_t = 0, help_heading = "Tile packer")]
    padding: u32,
    /// Derive occupancy from an N-plane convex hull instead of raw pixels
    #[arg(long, help_heading = "Tile packer")]
    hull_planes: Option<usize>,

    // Rendering
    /// Draw a checkerboard behind sprites and tint semi-transparent texels (debug)
    #[arg(long, default_value_t = false, help_heading = "Rendering")]
    debug_background: bool,
    /// Source texels with alpha at or below this are not drawn
    #[arg(long, default_value_t = 8, help_heading = "Rendering")]
    render_alpha_threshold: u8,

    // Export
    /// Export packing stats (JSON) to this file
    #[arg(long, help_heading = "Export")]
    export_stats: Option<PathBuf>,
    /// Print the merged configuration and exit
    #[arg(long, default_value_t = false, help_heading = "Export")]
    print_config: bool,
    /// Dry run: compute layout and stats but do not write files
    #[arg(long, default_value_t = false, help_heading = "Export")]
    dry_run: bool,
}

#[derive(Parser, Debug, Clone)]
struct BenchArgs {
    /// Input directory
    input: PathBuf,
    /// Packer: skyline | tile
    #[arg(long, value_parser = ["skyline", "tile"], default_value = "tile")]
    packer: String,
    /// Tile edge in pixels for the tile packer
    #[arg(long, default_value_t = 16)]
    tile_size: u32,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing_with_level(cli.quiet, cli.verbose);
    match &cli.command {
        Commands::Pack(args) => run_pack(args, false, cli.progress && !cli.quiet),
        Commands::Layout(args) => run_pack(args, true, false),
        Commands::Bench(b) => run_bench(b),
    }
}

fn build_config(cli: &PackArgs) -> anyhow::Result<AtlasConfig> {
    if let Some(path) = &cli.config {
        let file =
            fs::read_to_string(path).with_context(|| format!("read config {}", path.display()))?;
        let cfg: AtlasConfig = serde_json::from_str(&file)
            .with_context(|| format!("parse config {}", path.display()))?;
        return Ok(cfg);
    }
    let kind: PackerKind = cli
        .packer
        .parse()
        .map_err(|_| anyhow::anyhow!("unknown packer: {}", cli.packer))?;
    let skyline_mode: SkylineMode = cli
        .skyline
        .parse()
        .map_err(|_| anyhow::anyhow!("unknown skyline heuristic: {}", cli.skyline))?;
    let sort_order: SortOrder = cli
        .sort_order
        .parse()
        .map_err(|_| anyhow::anyhow!("unknown sort order: {}", cli.sort_order))?;
    Ok(AtlasConfig::builder()
        .kind(kind)
        .skyline_mode(skyline_mode)
        .sort_order(sort_order)
        .allow_rotation(cli.allow_rotation)
        .tile_size(cli.tile_size)
        .alpha_threshold(cli.alpha_threshold)
        .padding(cli.padding)
        .hull_planes(cli.hull_planes)
        .debug_background(cli.debug_background)
        .render_alpha_threshold(cli.render_alpha_threshold)
        .build())
}

fn run_pack(cli: &PackArgs, layout_only: bool, show_progress: bool) -> anyhow::Result<()> {
    let cfg = build_config(cli)?;
    cfg.validate()?;
    if cli.print_config {
        println!("{}", serde_json::to_string_pretty(&cfg)?);
        return Ok(());
    }

    let paths = gather_paths(&cli.input, &cli.include, &cli.exclude)?;
    let inputs = load_images_with_progress(&paths, show_progress)?;
    info!(count = inputs.len(), "loaded input images");
    if inputs.is_empty() {
        anyhow::bail!("no images found under {}", cli.input.display());
    }

    let out = pack_images(inputs, cfg)?;
    if !out.summary.is_complete() {
        warn!(
            unplaced = out.summary.unplaced.len(),
            "some sprites did not fit and are missing from the atlas"
        );
    }
    let stats = out.stats();
    info!(
        pages = stats.num_pages,
        used_area = stats.used_area,
        total_area = stats.total_page_area,
        occupancy = format!("{:.2}%", stats.occupancy * 100.0),
        "stats"
    );

    if !cli.dry_run {
        fs::create_dir_all(&cli.out_dir)
            .with_context(|| format!("create out_dir {}", cli.out_dir.display()))?;
        if !layout_only {
            write_pages(&out, &cli.out_dir, &cli.name)?;
        }
        let json_path = cli.out_dir.join(format!("{}.json", cli.name));
        let json = serde_json::to_string_pretty(&to_json(&out.layout))?;
        fs::write(&json_path, json).with_context(|| format!("write {}", json_path.display()))?;
        info!(?json_path, pages = out.pages.len(), "atlas written");
    }

    if let Some(stats_path) = &cli.export_stats {
        if !cli.dry_run {
            fs::write(stats_path, serde_json::to_string_pretty(&stats)?)
                .with_context(|| format!("write {}", stats_path.display()))?;
            info!(?stats_path, "stats exported");
        } else {
            println!("{}", stats.summary());
        }
    }
    Ok(())
}

fn write_pages(out: &PackOutput, dir: &Path, name: &str) -> anyhow::Result<()> {
    for page in &out.pages {
        let path = dir.join(format!("{}_{}.png", name, page.page.index));
        page.image
            .save(&path)
            .with_context(|| format!("write {}", path.display()))?;
        info!(?path, w = page.page.width, h = page.page.height, "page written");
    }
    Ok(())
}

fn run_bench(b: &BenchArgs) -> anyhow::Result<()> {
    let images = gather_paths(&b.input, &[], &[])?;
    let inputs = load_images_with_progress(&images, false)?;
    let kind: PackerKind = b
        .packer
        .parse()
        .map_err(|_| anyhow::anyhow!("unknown packer: {}", b.packer))?;
    let cfg = AtlasConfig::builder()
        .kind(kind)
        .tile_size(b.tile_size)
        .build();
    let start = Instant::now();
    let out = pack_images(inputs, cfg)?;
    let dur = start.elapsed();
    let stats = out.stats();
    println!(
        "pages={} placed={}/{} occupancy={:.2}% time={}",
        stats.num_pages,
        stats.num_placed,
        stats.num_sprites,
        stats.occupancy * 100.0,
        fmt_dur(dur)
    );
    Ok(())
}

fn fmt_dur(d: Duration) -> String {
    let ms = d.as_secs_f64() * 1000.0;
    if ms >= 1.0 {
        format!("{:.1}ms", ms)
    } else {
        format!("{}us", d.as_micros())
    }
}

fn gather_paths(
    path: &Path,
    include: &[String],
    exclude: &[String],
) -> anyhow::Result<Vec<PathBuf>> {
    let inc_set = build_globset(include)?;
    let exc_set = build_globset(exclude)?;
    let mut list: Vec<PathBuf> = Vec::new();
    if path.is_file() {
        if !should_skip(path, inc_set.as_ref(), exc_set.as_ref()) && is_image(path) {
            list.push(path.to_path_buf());
        }
    } else {
        for entry in WalkDir::new(path)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let p = entry.path();
            if p.is_file() && !should_skip(p, inc_set.as_ref(), exc_set.as_ref()) && is_image(p) {
                list.push(p.to_path_buf());
            }
        }
    }
    Ok(list)
}

fn build_globset(patterns: &[String]) -> anyhow::Result<Option<globset::GlobSet>> {
    if patterns.is_empty() {
        return Ok(None);
    }
    let mut b = GlobSetBuilder::new();
    for pat in patterns {
        b.add(Glob::new(pat).with_context(|| format!("bad glob {pat}"))?);
    }
    Ok(Some(b.build()?))
}

fn should_skip(
    p: &Path,
    include: Option<&globset::GlobSet>,
    exclude: Option<&globset::GlobSet>,
) -> bool {
    let s = p.to_string_lossy().replace('\\', "/");
    if exclude.is_some_and(|ex| ex.is_match(&s)) {
        return true;
    }
    include.is_some_and(|inc| !inc.is_match(&s))
}

fn is_image(p: &Path) -> bool {
    matches!(
        p.extension()
            .and_then(|e| e.to_str())
            .map(|s| s.to_ascii_lowercase()),
        Some(ext) if matches!(ext.as_str(), "png" | "jpg" | "jpeg" | "bmp" | "tga" | "gif")
    )
}

fn load_images_with_progress(paths: &[PathBuf], progress: bool) -> anyhow::Result<Vec<InputImage>> {
    use indicatif::{ProgressBar, ProgressStyle};
    let bar = if progress {
        let b = ProgressBar::new(paths.len() as u64);
        b.set_style(ProgressStyle::with_template(
            "{spinner:.green} loading {pos}/{len} [{elapsed_precise}] {wide_msg}",
        )?);
        Some(b)
    } else {
        None
    };
    let mut list = Vec::with_capacity(paths.len());
    for p in paths {
        let msg = p.file_name().and_then(|s| s.to_str()).unwrap_or("");
        if let Some(b) = &bar {
            b.set_message(msg.to_string());
        }
        match load_image(p) {
            Ok(img) => {
                let key = p.to_string_lossy().replace('\\', "/");
                list.push(InputImage { key, image: img });
            }
            Err(e) => {
                error!(?p, error = %e, "skip image");
            }
        }
        if let Some(b) = &bar {
            b.inc(1);
        }
    }
    if let Some(b) = &bar {
        b.finish_and_clear();
    }
    Ok(list)
}

fn load_image(p: &Path) -> anyhow::Result<DynamicImage> {
    let img = ImageReader::open(p)?.with_guessed_format()?.decode()?;
    Ok(img)
}

fn init_tracing_with_level(quiet: bool, verbose: u8) {
    let level = if quiet {
        "error".to_string()
    } else {
        match verbose {
            0 => "info".into(),
            1 => "debug".into(),
            _ => "trace".into(),
        }
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(level)
        .with_target(false)
        .try_init();
}
