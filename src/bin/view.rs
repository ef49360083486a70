use clap::Parser;
use std::error::Error;
use std::path::PathBuf;

use litchi_grasp::gui_app::run_viewer;
use litchi_grasp::session::SessionConfig;

#[derive(Parser, Debug)]
#[command(
    name = "grasp_view",
    about = "Review saved grasp rectangles over their images",
    version
)]
struct Cli {
    /// Directory containing the images
    #[arg(long = "img_dir")]
    img_dir: PathBuf,

    /// Directory holding the Cornell folders and Jacquard files
    #[arg(long = "label_dir")]
    label_dir: PathBuf,

    /// Zoom factor applied per scroll step
    #[arg(long = "zoom-step", default_value_t = 1.2)]
    zoom_step: f32,
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
    if !cli.label_dir.is_dir() {
        tracing::warn!(dir = %cli.label_dir.display(), "label directory not found; no overlays will be shown");
    }

    let config = SessionConfig {
        zoom_step: cli.zoom_step,
        ..SessionConfig::default()
    };
    run_viewer(&cli.img_dir, &cli.label_dir, config)?;
    Ok(())
}
