use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use vision_aid::daemon::{build_speaker, build_trigger};
use vision_aid::{
    AnalysisResult, Analyzer, CameraCapturer, CapturedImage, Capturer, Config, Daemon,
    GeminiAnalyzer, PromptVariant, variant_for,
};

/// Vision Aid - press a button, hear what the camera sees
#[derive(Parser)]
#[command(name = "visionaid", version, about)]
struct Cli {
    /// Path to a config file (defaults to ~/.config/vision-aid/config.toml)
    #[arg(short, long, env = "VISION_AID_CONFIG")]
    config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Speak text through the configured speech backend
    Speak {
        /// Text to speak
        #[arg(default_value = "Hello! This is a test of the speech system.")]
        text: String,
    },
    /// Capture one image and report where it was saved
    Capture,
    /// Analyze an existing image file
    Describe {
        /// Image to analyze
        image: PathBuf,
        /// Prompt variant
        #[arg(long, value_enum, default_value_t = PromptVariant::Describe)]
        variant: PromptVariant,
    },
    /// Print recognized button presses until interrupted
    Listen,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,vision_aid=info",
        1 => "info,vision_aid=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load(cli.config.as_deref())?;
    tracing::debug!(?config, "loaded configuration");

    if let Some(cmd) = cli.command {
        return match cmd {
            Command::Speak { text } => speak(config, &text).await,
            Command::Capture => capture(config).await,
            Command::Describe { image, variant } => describe(config, image, variant).await,
            Command::Listen => listen(&config).await,
        };
    }

    tracing::info!("--- vision aid initializing ---");
    let daemon = Daemon::new(config)?;
    daemon.run().await?;

    Ok(())
}

/// Speak a line of text
async fn speak(config: Config, text: &str) -> anyhow::Result<()> {
    let speaker = build_speaker(config.speech)?;
    speaker.speak(text).await;
    Ok(())
}

/// Capture a single image
async fn capture(config: Config) -> anyhow::Result<()> {
    let mut capturer = CameraCapturer::new(config.camera);
    let image = capturer.capture().await?;

    println!(
        "Saved {}x{} image to {}",
        image.width,
        image.height,
        image.path.display()
    );
    Ok(())
}

/// Analyze an image file with one prompt variant
async fn describe(config: Config, image: PathBuf, variant: PromptVariant) -> anyhow::Result<()> {
    let analyzer = GeminiAnalyzer::new(config.analyzer)?;
    let image = CapturedImage::from_file(image)?;

    match analyzer.analyze(&image, variant).await {
        AnalysisResult::Success(text) => {
            println!("{text}");
            Ok(())
        }
        AnalysisResult::Failure(reason) => Err(anyhow::anyhow!("analysis failed: {reason}")),
    }
}

/// Print button presses and the variant each would select
async fn listen(config: &Config) -> anyhow::Result<()> {
    let mut trigger = build_trigger(&config.trigger)?;
    println!("Press a face button (Ctrl-C to stop)...");

    loop {
        tokio::select! {
            event = trigger.wait_for_trigger() => {
                let variant = variant_for(&event.event_id)
                    .map_or_else(|| "none".to_string(), |v| v.to_string());
                println!("{} -> {variant}", event.event_id);
            }
            result = tokio::signal::ctrl_c() => {
                result?;
                return Ok(());
            }
        }
    }
}
