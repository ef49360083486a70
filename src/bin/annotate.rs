use clap::Parser;
use std::error::Error;
use std::fs;
use std::path::PathBuf;

use litchi_grasp::gui_app::run_annotator;
use litchi_grasp::session::SessionConfig;

#[derive(Parser, Debug)]
#[command(
    name = "grasp_annotate",
    about = "Annotate oriented grasp rectangles on a folder of images",
    version
)]
struct Cli {
    /// Directory containing the images to annotate
    #[arg(long = "img_dir")]
    img_dir: PathBuf,

    /// Directory receiving Cornell and Jacquard label files (created if absent)
    #[arg(long = "save_dir")]
    save_dir: PathBuf,

    /// Zoom factor applied per scroll step
    #[arg(long = "zoom-step", default_value_t = 1.2)]
    zoom_step: f32,

    /// Log a warning when the middle click deviates more than this from a right angle
    #[arg(long = "skew-warn-deg", default_value_t = 10.0)]
    skew_warn_deg: f64,
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    if !cli.img_dir.is_dir() {
        return Err(format!("Not a directory: {}", cli.img_dir.display()).into());
    }
    if cli.zoom_step <= 1.0 {
        return Err(format!("--zoom-step must be greater than 1, got {}", cli.zoom_step).into());
    }
    fs::create_dir_all(&cli.save_dir)?;

    let config = SessionConfig {
        zoom_step: cli.zoom_step,
        skew_warn_deg: cli.skew_warn_deg,
        ..SessionConfig::default()
    };
    run_annotator(&cli.img_dir, &cli.save_dir, config)?;
    Ok(())
}
