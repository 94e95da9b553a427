use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};

use plateblur_core::blurring::infrastructure::cpu_gaussian_compositor::CpuGaussianCompositor;
use plateblur_core::detection::domain::plate_detector::PlateDetector;
use plateblur_core::detection::infrastructure::alpr_plate_detector::AlprPlateDetector;
use plateblur_core::detection::infrastructure::subprocess_engine::SubprocessEngine;
use plateblur_core::pipeline::blur_folder_use_case::BlurFolderUseCase;
use plateblur_core::pipeline::blur_image_use_case::BlurImageUseCase;
use plateblur_core::pipeline::blur_stream_use_case::BlurStreamUseCase;
use plateblur_core::pipeline::pipeline_logger::StdoutPipelineLogger;
use plateblur_core::pipeline::plate_anonymizer::PlateAnonymizer;
use plateblur_core::shared::config::{AppConfig, BlurConfig};
use plateblur_core::shared::frame::PixelFormat;
use plateblur_core::video::infrastructure::image_file_reader::ImageFileReader;
use plateblur_core::video::infrastructure::image_file_writer::ImageFileWriter;
use plateblur_core::video::infrastructure::raw_frame_reader::RawFrameReader;
use plateblur_core::video::infrastructure::raw_frame_writer::RawFrameWriter;

/// License plate anonymization for images, folders and raw frame streams.
#[derive(Parser)]
#[command(name = "plateblur", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// JSON config with ALPR and BLURRER sections (default: user config dir).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Engine sidecar program that hosts the plate recognizer.
    #[arg(long, global = true)]
    engine: Option<PathBuf>,

    /// Extra argument for the engine program (repeatable).
    #[arg(long = "engine-arg", global = true, allow_hyphen_values = true)]
    engine_args: Vec<String>,

    /// Blur radius of the first pass (overrides config).
    #[arg(long, global = true)]
    blur_radius: Option<f32>,

    /// Radius added per further pass (overrides config).
    #[arg(long, global = true)]
    blur_radius_increment: Option<f32>,

    /// Extra passes allowed after the first (overrides config).
    #[arg(long, global = true)]
    max_iter: Option<u32>,

    /// Draw plate outlines on the output.
    #[arg(long, global = true)]
    add_outline: bool,

    /// Fail when plates remain detectable after the last pass.
    #[arg(long, global = true)]
    strict: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Anonymize a single image.
    Image {
        input: PathBuf,
        /// Output image (omit to only report what would be blurred).
        output: Option<PathBuf>,
    },
    /// Anonymize every image in a folder.
    Folder { input_dir: PathBuf, output_dir: PathBuf },
    /// Anonymize raw frames from stdin, writing raw frames to stdout.
    Stream {
        #[arg(long)]
        width: u32,
        #[arg(long)]
        height: u32,
        /// rgb24, rgba32 or gray8.
        #[arg(long, default_value = "rgb24")]
        format: PixelFormat,
    },
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let mut config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::load_or_default()?,
    };
    apply_overrides(&cli, &mut config.blurrer);
    config.blurrer.validate()?;
    config.ensure_assets_folder(&std::env::current_dir()?);

    let detector = build_detector(&cli, &config)?;
    let anonymizer = PlateAnonymizer::new(
        detector,
        Box::new(CpuGaussianCompositor::new()),
        config.blurrer,
    );

    match &cli.command {
        Command::Image { input, output } => {
            run_image(input, output.as_deref(), anonymizer, cli.strict)
        }
        Command::Folder {
            input_dir,
            output_dir,
        } => run_folder(input_dir, output_dir, anonymizer, cli.strict),
        Command::Stream {
            width,
            height,
            format,
        } => run_stream(*width, *height, *format, anonymizer, cli.strict),
    }
}

fn run_image(
    input: &Path,
    output: Option<&Path>,
    anonymizer: PlateAnonymizer,
    strict: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut use_case = BlurImageUseCase::new(
        Box::new(ImageFileReader::new()),
        Box::new(ImageFileWriter::new()),
        anonymizer,
        Box::new(StdoutPipelineLogger::for_files()),
    );
    let report = use_case.execute(input, output)?;
    log::info!(
        "{}: {} plates, {} blur passes",
        input.display(),
        report.initial_regions,
        report.blur_passes
    );
    if let Some(output) = output {
        log::info!("Output written to {}", output.display());
    }

    if strict && !report.converged() {
        return Err(format!(
            "{} plates still detectable in {}",
            report.remaining_regions,
            input.display()
        )
        .into());
    }
    Ok(())
}

fn run_folder(
    input_dir: &Path,
    output_dir: &Path,
    anonymizer: PlateAnonymizer,
    strict: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let image = BlurImageUseCase::new(
        Box::new(ImageFileReader::new()),
        Box::new(ImageFileWriter::new()),
        anonymizer,
        Box::new(StdoutPipelineLogger::for_files()),
    );
    let report = BlurFolderUseCase::new(image).execute(input_dir, output_dir)?;

    if strict && (report.failed > 0 || report.forced_stops > 0) {
        return Err(format!(
            "{} images failed, {} still have detectable plates",
            report.failed, report.forced_stops
        )
        .into());
    }
    Ok(())
}

fn run_stream(
    width: u32,
    height: u32,
    format: PixelFormat,
    anonymizer: PlateAnonymizer,
    strict: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    log::info!("Reading {width}x{height} {format} frames from stdin");
    let reader = RawFrameReader::new(BufReader::new(io::stdin()), width, height, format);
    let writer = RawFrameWriter::new(BufWriter::new(io::stdout()));
    let mut use_case = BlurStreamUseCase::new(
        Box::new(reader),
        Box::new(writer),
        anonymizer,
        Box::new(StdoutPipelineLogger::for_frames()),
    );
    let report = use_case.execute()?;

    if strict && report.forced_stops > 0 {
        return Err(format!(
            "{} frames still had detectable plates",
            report.forced_stops
        )
        .into());
    }
    Ok(())
}

fn build_detector(
    cli: &Cli,
    config: &AppConfig,
) -> Result<Box<dyn PlateDetector>, Box<dyn std::error::Error>> {
    let program = cli
        .engine
        .as_deref()
        .ok_or("--engine is required: path to the plate recognition engine program")?;
    let engine = SubprocessEngine::spawn(program, &cli.engine_args)?;
    let detector = AlprPlateDetector::new(engine, &config.engine_settings_json())?;
    Ok(Box::new(detector))
}

fn apply_overrides(cli: &Cli, blurrer: &mut BlurConfig) {
    if let Some(radius) = cli.blur_radius {
        blurrer.blur_radius = radius;
    }
    if let Some(increment) = cli.blur_radius_increment {
        blurrer.blur_radius_increment = increment;
    }
    if let Some(max_iter) = cli.max_iter {
        blurrer.max_iter = max_iter;
    }
    if cli.add_outline {
        blurrer.add_outline = true;
    }
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    match &cli.command {
        Command::Image { input, output } => {
            if !input.is_file() {
                return Err(format!("Input file not found: {}", input.display()).into());
            }
            if output.as_deref() == Some(input.as_path()) {
                return Err("Output must differ from input".into());
            }
        }
        Command::Folder {
            input_dir,
            output_dir,
        } => {
            if !input_dir.is_dir() {
                return Err(
                    format!("Input folder not found: {}", input_dir.display()).into(),
                );
            }
            if input_dir == output_dir {
                return Err("Output folder must differ from input folder".into());
            }
        }
        Command::Stream { width, height, .. } => {
            if *width == 0 || *height == 0 {
                return Err(format!("Frame size must be non-zero, got {width}x{height}").into());
            }
        }
    }
    if cli.engine.is_none() {
        return Err("--engine is required: path to the plate recognition engine program".into());
    }
    Ok(())
}
