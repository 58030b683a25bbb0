use clap::{Parser, Subcommand};
use easel::config::{self, EaselConfig};
use easel::imaging::{
    EditSpec, ExportFormat, ExportSpec, Exporter, FilterKind, FilterSpec, ImagingError,
    PlaceholderSource, Quality, edits, filters, obtain_images,
};
use easel::output::{self, ExportRecord, RunReport};
use easel::workspace::Workspace;
use image::DynamicImage;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Shared flags for commands that write images. Each overrides `[export]`.
#[derive(clap::Args, Clone)]
struct ExportArgs {
    /// Output format: jpeg, png or gif
    #[arg(long)]
    format: Option<ExportFormat>,

    /// JPEG quality, 1-100
    #[arg(long)]
    quality: Option<u32>,

    /// Output directory (created if missing)
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Base filename; a timestamp and extension are appended
    #[arg(long)]
    name: Option<String>,
}

impl ExportArgs {
    fn resolve(&self, config: &EaselConfig) -> Result<(Exporter, ExportSpec), ImagingError> {
        let mut spec = config.export_spec();
        if let Some(format) = self.format {
            spec.format = format;
        }
        if let Some(quality) = self.quality {
            spec.quality = Quality::new(quality);
        }
        if let Some(name) = &self.name {
            spec.filename = name.clone();
        }
        let dir = self
            .out_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(&config.export.output_dir));
        Ok((Exporter::new(dir)?, spec))
    }
}

#[derive(Parser)]
#[command(name = "easel")]
#[command(about = "Filter, edit and export generated images")]
#[command(long_about = "\
Filter, edit and export generated images

Every image goes through at most one filter and one edit before export:

  source ──► filter ──► edit ──► export

Filters: none, sepia, grayscale, blur, sharpen, vintage, noir, vibrant, pastel
Edits:   crop:L,T,R,B        margins in percent (0,0,100,100 = whole image)
         rotate:DEG          counter-clockwise, canvas grows to fit
         resize:WxH          exact size, aspect ratio not kept
         adjust:B,C,S        brightness, contrast, saturation factors (1 = unchanged)
         remove-background   keep the central subject, clear the rest
Formats: jpeg, png, gif

Filters and edits never fail: if one cannot be applied the image passes
through unchanged and a warning is logged.

Run 'easel gen-config' to generate a documented easel.toml.")]
#[command(version)]
struct Cli {
    /// Config file (default: ./easel.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate images from a prompt and export them unchanged
    Generate {
        /// Text prompt describing the image
        prompt: String,
        /// Number of images
        #[arg(long)]
        count: Option<u32>,
        /// Fixed seed
        #[arg(long)]
        seed: Option<u64>,
        #[command(flatten)]
        export: ExportArgs,
    },
    /// Apply one filter to an image file
    Filter {
        input: PathBuf,
        /// none, sepia, grayscale, blur, sharpen, vintage, noir, vibrant, pastel
        kind: FilterKind,
        /// Filter strength, 0.0-1.0
        #[arg(long)]
        intensity: Option<f32>,
        #[command(flatten)]
        export: ExportArgs,
    },
    /// Apply edits to an image file, in order
    Edit {
        input: PathBuf,
        /// crop:L,T,R,B | rotate:DEG | resize:WxH | adjust:B,C,S | remove-background
        #[arg(required = true)]
        edits: Vec<EditSpec>,
        #[command(flatten)]
        export: ExportArgs,
    },
    /// Full pipeline: source → filter → edit → export
    Run {
        /// Start from this file instead of generating
        #[arg(long, conflicts_with = "prompt")]
        input: Option<PathBuf>,
        /// Prompt for the image source
        #[arg(long)]
        prompt: Option<String>,
        #[arg(long)]
        filter: Option<FilterKind>,
        /// Filter strength, 0.0-1.0
        #[arg(long)]
        intensity: Option<f32>,
        #[arg(long)]
        edit: Option<EditSpec>,
        /// Write a JSON report of the run
        #[arg(long)]
        report: Option<PathBuf>,
        #[command(flatten)]
        export: ExportArgs,
    },
    /// Print a stock easel.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Command::GenConfig = cli.command {
        print!("{}", config::stock_config_toml());
        return Ok(());
    }

    let config = config::load_config(cli.config.as_deref())?;
    init_thread_pool(&config.processing);

    match cli.command {
        Command::Generate {
            prompt,
            count,
            seed,
            export,
        } => {
            let mut request = config.generation_request(&prompt);
            request.count = count.unwrap_or(request.count);
            request.seed = seed.or(request.seed);
            let (exporter, spec) = export.resolve(&config)?;
            let images = obtain_images(&PlaceholderSource, &request);
            let records = save_all(&exporter, &spec, &images)?;
            output::print_exports(&records);
        }
        Command::Filter {
            input,
            kind,
            intensity,
            export,
        } => {
            let image = open_image(&input)?;
            let intensity = intensity.unwrap_or(config.filter.intensity);
            let filtered = filters::apply_spec(&image, &FilterSpec::new(kind, intensity));
            let (exporter, spec) = export.resolve(&config)?;
            let records = save_all(&exporter, &spec, &[filtered])?;
            output::print_exports(&records);
        }
        Command::Edit {
            input,
            edits: edit_list,
            export,
        } => {
            let image = open_image(&input)?;
            let edited = edits::apply_all(&image, &edit_list);
            let (exporter, spec) = export.resolve(&config)?;
            let records = save_all(&exporter, &spec, &[edited])?;
            output::print_exports(&records);
        }
        Command::Run {
            input,
            prompt,
            filter,
            intensity,
            edit,
            report,
            export,
        } => {
            let (exporter, spec) = export.resolve(&config)?;
            let (source, images) = match &input {
                Some(path) => (path.display().to_string(), vec![open_image(path)?]),
                None => {
                    let request = config.generation_request(prompt.as_deref().unwrap_or(""));
                    (
                        "placeholder".to_string(),
                        obtain_images(&PlaceholderSource, &request),
                    )
                }
            };
            let filter = filter.map(|kind| {
                FilterSpec::new(kind, intensity.unwrap_or(config.filter.intensity))
            });

            let mut workspace = Workspace::new();
            let mut records = Vec::with_capacity(images.len());
            for image in images {
                workspace.set_current(image);
                if let Some(filter) = &filter {
                    workspace.apply_filter(filter);
                }
                if let Some(edit) = &edit {
                    workspace.apply_edit(edit);
                }
                if let Some(result) = workspace.display() {
                    let path = exporter.save(result, &spec)?;
                    records.push(ExportRecord::new(path, spec.format, result));
                }
            }

            let run = RunReport {
                source,
                prompt,
                filter,
                edit,
                exports: records,
            };
            output::print_run_report(&run);
            if let Some(report_path) = report {
                std::fs::write(&report_path, serde_json::to_string_pretty(&run)?)?;
            }
        }
        Command::GenConfig => {}
    }

    Ok(())
}

fn open_image(path: &Path) -> Result<DynamicImage, ImagingError> {
    Ok(image::open(path)?)
}

fn save_all(
    exporter: &Exporter,
    spec: &ExportSpec,
    images: &[DynamicImage],
) -> Result<Vec<ExportRecord>, ImagingError> {
    images
        .iter()
        .map(|image| {
            let path = exporter.save(image, spec)?;
            Ok(ExportRecord::new(path, spec.format, image))
        })
        .collect()
}

/// Install the log subscriber. `RUST_LOG` wins over `-v`.
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("easel={}", level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
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
