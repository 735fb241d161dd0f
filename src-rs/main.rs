use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{ArgAction, Args, Parser, Subcommand};
use image::{DynamicImage, Rgba};
use redaction_probe::{
    average_char_width, compose, estimate_hidden_length, synth_page, AnalysisConfig,
    ArtifactClassifier, PixelBuffer, Profile, Rect, RegionDetector, SoftwareCanvas, SynthOptions,
};
use serde_json::{json, Value};
use std::env;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

const CONFIG_HELP: &str = r##"Config JSON schema (every field optional):
{
  "dark_threshold": 60,
  "artifact_low": 30,
  "artifact_high": 250,
  "artifact_ratio": 0.05,
  "min_region_side": 5
}

Notes:
- dark_threshold: probe/region pixels need luminance strictly below it.
- artifact_low/high: exclusive luminance band counted as residue inside a block.
- artifact_ratio: residue share that must be strictly exceeded to flag lazy redaction.
"##;

#[derive(Parser, Debug)]
#[command(
    name = "redaction-probe",
    version,
    about = "Locate redaction blocks, check them for leftover content, and render match reports"
)]
struct Cli {
    /// Raise log verbosity on stderr (repeatable)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print supported commands in JSON
    Commands,
    /// Find the dark block under a probe point
    Detect(DetectArgs),
    /// Score a block for lazy-redaction residue
    Classify(ClassifyArgs),
    /// Estimate hidden characters from box widths
    Estimate(EstimateArgs),
    /// Render a report image with an annotation band and the match name
    Compose(ComposeArgs),
    /// Generate a synthetic redacted page for fixtures
    Synth(SynthArgs),
}

#[derive(Args, Debug)]
struct ConfigArgs {
    /// Threshold config JSON path (or - for stdin)
    #[arg(long)]
    config: Option<String>,
    /// Print config schema help and exit
    #[arg(long, action = ArgAction::SetTrue)]
    config_help: bool,
}

#[derive(Args, Debug)]
struct DetectArgs {
    /// Input image path
    input: PathBuf,
    /// Probe x coordinate
    #[arg(long, allow_hyphen_values = true)]
    x: i64,
    /// Probe y coordinate
    #[arg(long, allow_hyphen_values = true)]
    y: i64,
    /// Write a copy of the input with the detected block outlined
    #[arg(long)]
    annotated_out: Option<PathBuf>,
    #[command(flatten)]
    config: ConfigArgs,
}

#[derive(Args, Debug)]
struct ClassifyArgs {
    /// Input image path
    input: PathBuf,
    /// Block as x,y,w,h
    #[arg(long, allow_hyphen_values = true)]
    rect: Rect,
    #[command(flatten)]
    config: ConfigArgs,
}

#[derive(Args, Debug)]
struct EstimateArgs {
    /// Width of the redaction box in pixels
    #[arg(long, allow_hyphen_values = true)]
    redaction_width: f64,
    /// Width of the reference box in pixels
    #[arg(long)]
    reference_width: f64,
    /// Transcribed text of the reference box
    #[arg(long, conflicts_with = "reference_length")]
    reference_text: Option<String>,
    /// Character count of the reference box
    #[arg(long)]
    reference_length: Option<usize>,
}

#[derive(Args, Debug)]
struct ComposeArgs {
    /// Input image path
    input: PathBuf,
    /// Output PNG path
    output: PathBuf,
    /// Redaction block as x,y,w,h
    #[arg(long, allow_hyphen_values = true)]
    rect: Rect,
    /// Matched profile JSON path (or - for stdin)
    #[arg(long)]
    profile: String,
    /// Path to write report metadata sidecar (default: <output>.json)
    #[arg(long)]
    meta_out: Option<PathBuf>,
    /// Disable metadata sidecar generation
    #[arg(long, action = ArgAction::SetTrue)]
    no_meta: bool,
}

#[derive(Args, Debug)]
struct SynthArgs {
    /// Output PNG path
    output: PathBuf,
    #[arg(long, default_value_t = 200)]
    width: u32,
    #[arg(long, default_value_t = 120)]
    height: u32,
    /// Block as x,y,w,h
    #[arg(long, allow_hyphen_values = true, default_value = "40,40,120,30")]
    rect: Rect,
    /// Share of block pixels turned mid-grey
    #[arg(long, default_value_t = 0.0)]
    noise: f64,
    #[arg(long, default_value_t = 0)]
    seed: u64,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Commands => print_commands(),
        Commands::Detect(args) => command_detect(args),
        Commands::Classify(args) => command_classify(args),
        Commands::Estimate(args) => command_estimate(args),
        Commands::Compose(args) => command_compose(args),
        Commands::Synth(args) => command_synth(args),
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn print_commands() -> Result<()> {
    let rows = vec![
        json!({
            "name": "detect",
            "description": "Find the redaction block under a probe point.",
        }),
        json!({
            "name": "classify",
            "description": "Score a block for lazy-redaction residue.",
        }),
        json!({
            "name": "estimate",
            "description": "Estimate hidden characters from box widths and a reference text.",
        }),
        json!({
            "name": "compose",
            "description": "Render the report image with annotation band and match name.",
        }),
        json!({
            "name": "synth",
            "description": "Generate a synthetic redacted page for fixtures.",
        }),
    ];

    println!(
        "{}",
        serde_json::to_string_pretty(&json!({ "commands": rows }))?
    );
    Ok(())
}

fn command_detect(args: DetectArgs) -> Result<()> {
    if args.config.config_help {
        println!("{}", CONFIG_HELP.trim());
        return Ok(());
    }
    let config = resolve_config(&args.config)?;
    let buffer = open_buffer(&args.input)?;
    let detector = RegionDetector::new(config);
    let rect = detector.detect(&buffer, args.x, args.y);
    let luma = buffer.luminance(args.x, args.y);

    if let (Some(path), Some(rect)) = (args.annotated_out.as_deref(), rect) {
        let mut canvas = SoftwareCanvas::from_buffer(buffer)?;
        canvas.stroke_rect(rect, Rgba([255, 69, 58, 255]), 2);
        save_buffer(canvas.into_buffer(), path)?;
    }

    let payload = json!({
        "input": abs_path(&args.input).display().to_string(),
        "probe": {"x": args.x, "y": args.y},
        "luminance": luma.map(|v| round_to(v, 3)),
        "found": rect.is_some(),
        "rect": rect,
        "annotated_image": args
            .annotated_out
            .filter(|_| rect.is_some())
            .map(|p| abs_path(&p).display().to_string()),
    });
    println!("{}", serde_json::to_string(&payload)?);
    Ok(())
}

fn command_classify(args: ClassifyArgs) -> Result<()> {
    if args.config.config_help {
        println!("{}", CONFIG_HELP.trim());
        return Ok(());
    }
    let config = resolve_config(&args.config)?;
    let threshold_ratio = config.artifact_ratio;
    let buffer = open_buffer(&args.input)?;
    let report = ArtifactClassifier::new(config).analyze(&buffer, args.rect);

    let payload = json!({
        "input": abs_path(&args.input).display().to_string(),
        "rect": args.rect,
        "lazy_redaction": report.lazy,
        "suspicious_pixels": report.suspicious_pixels,
        "area": report.area,
        "ratio": round_to(report.ratio, 6),
        "threshold_ratio": threshold_ratio,
    });
    println!("{}", serde_json::to_string(&payload)?);
    Ok(())
}

fn command_estimate(args: EstimateArgs) -> Result<()> {
    let reference_length = match (&args.reference_text, args.reference_length) {
        (Some(text), _) => text.chars().count(),
        (None, Some(len)) => len,
        (None, None) => bail!("pass either --reference-text or --reference-length"),
    };
    let estimated = estimate_hidden_length(
        args.redaction_width,
        args.reference_width,
        reference_length,
    );
    debug!(estimated, reference_length, "length estimate");

    let payload = json!({
        "redaction_width": args.redaction_width,
        "reference_width": args.reference_width,
        "reference_length": reference_length,
        "avg_char_width": round_to(average_char_width(args.reference_width, reference_length), 6),
        "estimated_length": estimated,
    });
    println!("{}", serde_json::to_string(&payload)?);
    Ok(())
}

fn command_compose(args: ComposeArgs) -> Result<()> {
    let profile = load_profile(&args.profile)?;
    let buffer = open_buffer(&args.input)?;
    let (width, height) = buffer.dimensions();
    let report = compose(&buffer, args.rect, &profile).context("failed to compose report")?;
    let (out_w, out_h) = report.dimensions();
    save_buffer(report, &args.output)?;
    info!(output = %args.output.display(), "report written");

    if !args.no_meta {
        let meta_path = args
            .meta_out
            .clone()
            .unwrap_or_else(|| default_sidecar_for(&args.output));
        let payload = json!({
            "report_meta_version": 1,
            "input_path": abs_path(&args.input).display().to_string(),
            "output_path": abs_path(&args.output).display().to_string(),
            "meta_path": abs_path(&meta_path).display().to_string(),
            "generated_at": timestamp_iso(),
            "source_size": {"width": width, "height": height, "units": "px"},
            "size": {"width": out_w, "height": out_h, "units": "px"},
            "redaction": args.rect,
            "profile": profile,
        });
        write_json_pretty(&meta_path, &payload)?;
    }

    println!("{}", abs_path(&args.output).display());
    Ok(())
}

fn command_synth(args: SynthArgs) -> Result<()> {
    let options = SynthOptions {
        width: args.width,
        height: args.height,
        block: args.rect,
        noise: args.noise,
        seed: args.seed,
    };
    let page = synth_page(&options).context("failed to generate synthetic page")?;
    save_buffer(page, &args.output)?;
    println!("{}", abs_path(&args.output).display());
    Ok(())
}

fn resolve_config(args: &ConfigArgs) -> Result<AnalysisConfig> {
    match args.config.as_deref() {
        Some(source) => {
            let raw = read_source(source, "config")?;
            AnalysisConfig::from_json(&raw)
                .with_context(|| format!("invalid config: {source}"))
        }
        None => Ok(AnalysisConfig::default()),
    }
}

fn load_profile(source: &str) -> Result<Profile> {
    let raw = read_source(source, "profile")?;
    let value: Value =
        serde_json::from_str(&raw).with_context(|| format!("invalid profile JSON: {source}"))?;
    // lookups return ranked candidates; the best match comes first
    let best = match value {
        Value::Array(items) => items
            .into_iter()
            .next()
            .with_context(|| format!("profile list is empty: {source}"))?,
        other => other,
    };
    serde_json::from_value(best).with_context(|| format!("invalid profile record: {source}"))
}

fn read_source(source: &str, what: &str) -> Result<String> {
    if source == "-" {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .with_context(|| format!("failed to read {what} from stdin"))?;
        Ok(buf)
    } else {
        fs::read_to_string(source).with_context(|| format!("failed to read {what} file: {source}"))
    }
}

fn open_buffer(path: &Path) -> Result<PixelBuffer> {
    if !path.exists() {
        bail!("input not found: {}", path.display());
    }
    let image = image::open(path)
        .with_context(|| format!("failed to open input image: {}", path.display()))?;
    Ok(PixelBuffer::from_dynamic(&image))
}

fn save_buffer(buffer: PixelBuffer, path: &Path) -> Result<()> {
    ensure_parent_dir(path)?;
    let image = buffer.into_rgba_image()?;
    DynamicImage::ImageRgba8(image)
        .save(path)
        .with_context(|| format!("failed to save image: {}", path.display()))?;
    Ok(())
}

fn write_json_pretty(path: &Path, value: &Value) -> Result<()> {
    ensure_parent_dir(path)?;
    let raw = serde_json::to_string_pretty(value)?;
    fs::write(path, raw).with_context(|| format!("failed to write JSON: {}", path.display()))?;
    Ok(())
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed to create parent directory: {}", parent.display())
            })?;
        }
    }
    Ok(())
}

fn default_sidecar_for(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output")
        .to_string();
    let parent = path.parent().unwrap_or_else(|| Path::new(""));
    parent.join(format!("{stem}.json"))
}

fn abs_path(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(path)
}

fn timestamp_iso() -> String {
    Utc::now().to_rfc3339()
}

fn round_to(v: f64, digits: u32) -> f64 {
    let factor = 10f64.powi(digits as i32);
    (v * factor).round() / factor
}
