use clap::{Parser, Subcommand};
use respimg::{config, process, verify};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "respimg")]
#[command(about = "Responsive image pipeline: generate and verify breakpoint variants")]
#[command(long_about = "\
Responsive image pipeline

Transcodes every source photograph into a breakpoint × format matrix
(mobile/tablet/desktop/xl plus the untouched-size original, in WebP and
JPEG) with per-image JSON metadata, ready for static hosting.

Output structure:

  optimized/
  ├── index.json                   # Aggregate metadata for all images
  └── dawn/
      ├── metadata.json            # This image's variant matrix
      ├── dawn-mobile.webp
      ├── dawn-mobile.jpg
      ├── ...
      ├── dawn-original.webp
      └── dawn-original.jpg

Breakpoints narrower than the source are skipped (never upscale); the
original is always emitted. Configure the ladder, formats, and encoder
quality in respimg.toml.")]
#[command(version)]
struct Cli {
    /// Configuration file
    #[arg(long, default_value = "respimg.toml", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Transcode source images into the variant matrix
    Generate {
        /// Source image directory
        #[arg(long, default_value = "photos")]
        source: PathBuf,
        /// Output directory (variants land under <output>/optimized/)
        #[arg(long, default_value = "dist")]
        output: PathBuf,
        /// Worker threads (overrides config; 0 = all cores)
        #[arg(long)]
        threads: Option<usize>,
    },
    /// Check generated output against the metadata invariants
    Verify {
        /// Output directory of a previous generate run
        #[arg(long, default_value = "dist")]
        output: PathBuf,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("respimg=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run() {
        Ok(code) => code,
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let pipeline = config::PipelineConfig::load(&cli.config)?;

    match cli.command {
        Command::Generate {
            source,
            output,
            threads,
        } => {
            let mut processing = pipeline.processing.clone();
            if let Some(threads) = threads {
                processing.threads = threads;
            }
            init_thread_pool(&processing);

            let generator = process::GeneratorConfig::from_pipeline_config(&pipeline);
            let outcome = process::process(&source, &output, &generator)?;
            for failure in &outcome.report.failures {
                eprintln!("  ! {failure}");
            }
            println!("{}", outcome.report);
            if outcome.report.is_clean() {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::FAILURE)
            }
        }
        Command::Verify { output } => {
            let report = verify::verify(&output)?;
            for defect in &report.defects {
                eprintln!("  ! {defect}");
            }
            println!("{report}");
            if report.is_clean() {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::FAILURE)
            }
        }
    }
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores — user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    if let Err(error) = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
    {
        tracing::warn!(%error, "thread pool already initialized");
    }
}
