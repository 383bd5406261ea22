use clap::{Parser, Subcommand};
use cover_crop::export::{self, CancelToken, ExportHooks, ExportManifest, ExportSettings};
use cover_crop::imaging::{self, OutputFormat, Quality, RustBackend, SourceImage};
use cover_crop::targets::{self, ScaleFactor};
use cover_crop::{config, output};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Where the targets come from. Flags override the config file.
#[derive(clap::Args, Clone)]
struct TargetArgs {
    /// Preset to include (repeatable). Replaces the configured preset list
    #[arg(long = "preset", value_name = "NAME")]
    presets: Vec<String>,

    /// Export no presets, only custom sizes
    #[arg(long, conflicts_with = "presets")]
    no_presets: bool,

    /// Custom size as "label, WxH" (repeatable)
    #[arg(long = "size", value_name = "LABEL, WxH")]
    sizes: Vec<String>,

    /// File with one "label, WxH" per line
    #[arg(long, value_name = "FILE")]
    sizes_file: Option<PathBuf>,
}

#[derive(Parser)]
#[command(name = "cover-crop")]
#[command(about = "Resize one image into every placement size, packed as a ZIP")]
#[command(long_about = "\
Resize one image into every placement size, packed as a ZIP

Each target is filled completely: the image is scaled until it covers the
target box, then center-cropped. Nothing is stretched or letterboxed.

Targets are the selected presets followed by custom sizes:

  --preset \"Speaker\" --preset \"Email Header\"
  --size \"Square, 1080x1080\" --size \"Story, 1080x1920\"

Every size is multiplied by --scale (default 2.0 for retina exports).
Entries are named {base}_{label}_{W}x{H}.{jpg|png}; the archive is
{base}_resized.zip.

Run 'cover-crop gen-config' to generate a documented cover-crop.toml.")]
#[command(version)]
struct Cli {
    /// Config file (default: ./cover-crop.toml if present)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Target scale multiplier
    #[arg(long, global = true)]
    scale: Option<f64>,

    /// More log output (-v info, -vv debug). RUST_LOG takes precedence
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resize an image into every target and write the archive
    Export {
        /// Source image (jpg, png, webp, bmp, tiff)
        image: PathBuf,

        /// Output directory
        #[arg(long, default_value = ".")]
        out: PathBuf,

        /// Base name for entries and archive (default: source file name)
        #[arg(long)]
        base_name: Option<String>,

        /// Output format: jpg, jpeg or png
        #[arg(long)]
        format: Option<String>,

        /// JPEG quality
        #[arg(long, value_parser = clap::value_parser!(u32).range(60..=100))]
        quality: Option<u32>,

        #[command(flatten)]
        targets: TargetArgs,

        /// Write the images as separate files instead of a ZIP
        #[arg(long)]
        loose: bool,

        /// Also write a JSON summary of the export
        #[arg(long, value_name = "FILE")]
        manifest: Option<PathBuf>,
    },
    /// List the preset catalog at the current scale
    Presets,
    /// Print a stock cover-crop.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Export {
            image,
            out,
            base_name,
            format,
            quality,
            targets: target_args,
            loose,
            manifest,
        } => {
            let cfg = load_config(cli.config.as_deref())?;

            let quality = Quality::new(quality.unwrap_or(cfg.output.quality));
            let format = OutputFormat::parse(
                format.as_deref().unwrap_or(&cfg.output.format),
                quality,
            )?;
            let scale = match cli.scale {
                Some(s) => ScaleFactor::new(s)?,
                None => cfg.scale_factor()?,
            };

            let presets = if target_args.no_presets {
                Vec::new()
            } else if !target_args.presets.is_empty() {
                targets::select_presets(&target_args.presets)?
            } else {
                cfg.presets()?
            };
            let custom = custom_text(&cfg, &target_args)?;
            let set = targets::build_targets(&presets, &custom, scale)?;
            output::print_warnings(&set.warnings);

            if !has_supported_extension(&image) {
                return Err(format!(
                    "{}: unsupported input type (expected one of: {})",
                    image.display(),
                    imaging::supported_input_extensions().join(", ")
                )
                .into());
            }
            init_thread_pool(&cfg.processing);
            let source = SourceImage::open(&image)?;

            let settings = ExportSettings {
                format,
                base_name: base_name.unwrap_or_default(),
                background: cfg.background()?,
            };

            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    for line in output::format_export_event(&event) {
                        println!("{}", line);
                    }
                }
            });
            let hooks = ExportHooks {
                events: Some(tx),
                cancel: CancelToken::new(),
            };
            let result = export::export_with_backend(
                &RustBackend::new(),
                source,
                &set.targets,
                &settings,
                &hooks,
            );
            drop(hooks);
            printer
                .join()
                .map_err(|_| "progress printer thread panicked")?;
            let archive = result?;

            let written = if loose {
                archive.write_entries(&out)?
            } else {
                vec![archive.write_to_dir(&out)?]
            };
            if let Some(path) = manifest {
                let summary = ExportManifest::new(&image, &settings, &set, &archive);
                std::fs::write(&path, serde_json::to_string_pretty(&summary)?)?;
            }
            output::print_summary(&archive, &written);
        }
        Command::Presets => {
            let scale = match cli.scale {
                Some(s) => ScaleFactor::new(s)?,
                None => load_config(cli.config.as_deref())?.scale_factor()?,
            };
            output::print_presets(scale);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Log to stderr. `RUST_LOG` wins over `-v`.
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "error",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Explicit `--config` must exist; the default file is optional.
fn load_config(path: Option<&Path>) -> Result<config::ExportConfig, config::ConfigError> {
    match path {
        Some(p) => config::load_config_file(p),
        None => config::load_config(Path::new(".")),
    }
}

/// Configured custom lines, then `--size` flags, then the sizes file.
fn custom_text(
    cfg: &config::ExportConfig,
    args: &TargetArgs,
) -> Result<String, std::io::Error> {
    let mut lines: Vec<String> = cfg.targets.custom.clone();
    lines.extend(args.sizes.iter().cloned());
    if let Some(path) = &args.sizes_file {
        lines.push(std::fs::read_to_string(path)?);
    }
    Ok(lines.join("\n"))
}

fn has_supported_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(imaging::is_supported_extension)
}

/// Initialize the rayon thread pool based on processing config.
///
/// Capped at the number of available CPU cores.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
