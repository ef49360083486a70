use clap::Parser;
use std::error::Error;
use std::path::PathBuf;

use litchi_grasp::similarity::{
    self, ScoreSummary, SimilarityReport, SsimConfig, plot,
};

const DEFAULT_DATASET_DIR: &str = "data/LitchiDG/250619";

#[derive(Parser, Debug)]
#[command(
    name = "ssim_analysis",
    about = "Pairwise SSIM statistics across an image folder",
    version
)]
struct Cli {
    /// Directory containing the images
    #[arg(short = 'd', long = "dir", default_value = DEFAULT_DATASET_DIR)]
    dir: PathBuf,

    /// Image file extension to include (repeatable)
    #[arg(long = "ext", default_values_t = [String::from("jpg")])]
    ext: Vec<String>,

    /// Stop after loading this many images (0 loads all)
    #[arg(long = "max-images")]
    max_images: Option<usize>,

    /// Output path of the scatter/density plot
    #[arg(long = "plot", default_value = "ssim_analysis.png")]
    plot: PathBuf,

    /// Also write all pair scores and the summary as JSON
    #[arg(long = "json")]
    json: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    if !cli.dir.is_dir() {
        return Err(format!("Not a directory: {}", cli.dir.display()).into());
    }

    let config = SsimConfig::default();
    let extensions: Vec<&str> = cli.ext.iter().map(|e| e.trim_start_matches('.')).collect();
    let images = similarity::load_folder(&cli.dir, &extensions, cli.max_images, &config)?;
    println!("Loaded {} images.", images.len());

    let pairs = similarity::scan_pairs(&images, &config, |pair| {
        println!(
            "SSIM between {} and {} = {:.4}",
            pair.first, pair.second, pair.score
        );
    })?;
    let scores: Vec<f64> = pairs.iter().map(|p| p.score).collect();

    let summary = ScoreSummary::from_scores(&scores);
    match &summary {
        Some(s) => println!(
            "{} pairs: mean {:.4}, std {:.4}, min {:.4}, max {:.4}",
            s.count, s.mean, s.std, s.min, s.max
        ),
        None => println!("Fewer than two images; no pairs to compare."),
    }

    plot::save_plot(&cli.plot, &scores, plot::DEFAULT_SIZE)?;
    println!("Wrote {}", cli.plot.display());

    if let Some(json_path) = &cli.json {
        let report = SimilarityReport {
            folder: &cli.dir,
            images: images.iter().map(|i| i.name.as_str()).collect(),
            summary,
            pairs: &pairs,
        };
        similarity::write_report(json_path, &report)?;
        println!("Wrote {}", json_path.display());
    }

    Ok(())
}
