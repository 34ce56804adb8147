//! dotgrid CLI: detect circular markers and print their occupancy grid.

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use dotgrid::detect::{annotate_image, detect_image, mask_image};
use dotgrid::io::{DetectionReport, DotgridConfig};
use dotgrid::marker::{ClassifierRule, LumaPolarity};
use dotgrid::DetectorParams;
use std::path::{Path, PathBuf};

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "dotgrid")]
#[command(about = "Detect circular markers in a frame and infer their occupancy grid")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect markers in an image.
    Detect(DetectArgs),

    /// Print the default configuration as JSON.
    Defaults,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum RuleArg {
    Luminance,
    HueValue,
}

#[derive(Debug, Clone, Args)]
struct DetectArgs {
    /// Path to the input image. Overrides `image_path` from the config.
    #[arg(long)]
    image: Option<PathBuf>,

    /// JSON config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Path to write the detection report (JSON).
    #[arg(long)]
    out: Option<PathBuf>,

    /// Path to write the frame with overlay squares (PNG).
    #[arg(long)]
    annotated: Option<PathBuf>,

    /// Path to write the rendered foreground mask (PNG).
    #[arg(long)]
    mask: Option<PathBuf>,

    /// Pixel classification rule.
    #[arg(long, value_enum)]
    rule: Option<RuleArg>,

    /// Classifier threshold in (0, 1].
    #[arg(long)]
    threshold: Option<f64>,

    /// Hue cutoff in degrees for the hue-value rule.
    #[arg(long)]
    hue_cutoff: Option<u16>,

    /// Treat dark pixels as foreground (luminance rule).
    #[arg(long)]
    dark: bool,
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();

    #[cfg(feature = "tracing")]
    {
        let _ = cli.verbose;
        dotgrid::core::init_tracing(false);
    }
    #[cfg(not(feature = "tracing"))]
    {
        let level = match cli.verbose {
            0 => log::LevelFilter::Info,
            1 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        };
        dotgrid::core::init_with_level(level)?;
    }

    match cli.command {
        Commands::Detect(args) => run_detect(&args),
        Commands::Defaults => run_defaults(),
    }
}

fn run_defaults() -> CliResult<()> {
    let cfg = DotgridConfig::new("frame.png");
    println!("{}", serde_json::to_string_pretty(&cfg)?);
    Ok(())
}

fn apply_overrides(params: &mut DetectorParams, args: &DetectArgs) {
    let current = params.classifier;
    let threshold = args.threshold.unwrap_or_else(|| current.threshold());

    params.classifier = match (args.rule, current) {
        (Some(RuleArg::Luminance), _) | (None, ClassifierRule::Luminance { .. }) => {
            let polarity = match current {
                _ if args.dark => LumaPolarity::Dark,
                ClassifierRule::Luminance { polarity, .. } => polarity,
                ClassifierRule::HueValue { .. } => LumaPolarity::Bright,
            };
            if args.hue_cutoff.is_some() {
                log::warn!("--hue-cutoff is ignored by the luminance rule");
            }
            ClassifierRule::luminance(threshold, polarity)
        }
        (Some(RuleArg::HueValue), _) | (None, ClassifierRule::HueValue { .. }) => {
            let hue_cutoff = match current {
                ClassifierRule::HueValue { hue_cutoff, .. } => hue_cutoff,
                ClassifierRule::Luminance { .. } => 330,
            };
            if args.dark {
                log::warn!("--dark is ignored by the hue-value rule");
            }
            ClassifierRule::hue_value(threshold, args.hue_cutoff.unwrap_or(hue_cutoff))
        }
    };
}

fn load_config(args: &DetectArgs) -> CliResult<DotgridConfig> {
    let mut cfg = match &args.config {
        Some(path) => {
            log::info!("Loading config: {}", path.display());
            DotgridConfig::load_json(path)?
        }
        None => DotgridConfig::default(),
    };
    if let Some(image) = &args.image {
        cfg.image_path = image.to_string_lossy().into_owned();
    }
    if cfg.image_path.is_empty() {
        return Err("no input image: pass --image or set image_path in --config".into());
    }
    if let Some(out) = &args.out {
        cfg.output_path = Some(out.to_string_lossy().into_owned());
    }
    if let Some(annotated) = &args.annotated {
        cfg.annotated_path = Some(annotated.to_string_lossy().into_owned());
    }
    if let Some(mask) = &args.mask {
        cfg.mask_path = Some(mask.to_string_lossy().into_owned());
    }
    apply_overrides(&mut cfg.detector, args);
    Ok(cfg)
}

fn run_detect(args: &DetectArgs) -> CliResult<()> {
    let cfg = load_config(args)?;
    let params = &cfg.detector;
    params.validate()?;

    log::info!("Loading image: {}", cfg.image_path);
    let img = image::ImageReader::open(Path::new(&cfg.image_path))?
        .decode()?
        .to_rgba8();
    log::info!("Image size: {}x{}", img.width(), img.height());

    // One detection pass; the overlay reuses its markers.
    let result = match cfg.annotated_path() {
        Some(path) => {
            let (result, painted) = annotate_image(&img, params)?;
            painted.save(&path)?;
            log::info!("Annotated frame written to {}", path.display());
            result
        }
        None => detect_image(&img, params)?,
    };

    println!("markers: {}", result.marker_count());
    match result.matrix() {
        Some(matrix) => print!("{matrix}"),
        None => println!("no grid"),
    }

    if let Some(path) = cfg.mask_path() {
        mask_image(&img, params)?.save(&path)?;
        log::info!("Mask written to {}", path.display());
    }

    if let Some(path) = cfg.output_path() {
        let mut report =
            DetectionReport::new(&cfg, args.config.as_deref(), img.width(), img.height());
        report.set_detection(result);
        report.write_json(&path)?;
        log::info!("Report written to {}", path.display());
    }

    Ok(())
}
