use std::fs;
use std::path::{Path, PathBuf};

use approx::assert_abs_diff_eq;
use image::{Rgb, RgbImage};

use litchi_grasp::similarity::{
    self, ScoreSummary, SimilarityReport, SsimConfig, plot, structural_similarity,
};

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("litchi_grasp_ssim_{name}_{}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).expect("scratch dir");
    dir
}

fn write_pattern(dir: &Path, name: &str, phase: u32) {
    let img = RgbImage::from_fn(160, 120, |x, y| {
        let v = ((x * 3 + y * 5 + phase * 17) % 256) as u8;
        Rgb([v, v.wrapping_add(40), 255 - v])
    });
    img.save(dir.join(name)).expect("write image");
}

#[test]
fn scans_every_pair_of_a_folder() {
    let dir = scratch_dir("pairs");
    for (i, name) in ["a.png", "b.png", "c.png", "d.png"].iter().enumerate() {
        write_pattern(&dir, name, i as u32);
    }
    fs::write(dir.join("notes.txt"), "ignored").expect("write");

    let config = SsimConfig::default();
    let images = similarity::load_folder(&dir, &["png"], None, &config).expect("load");
    assert_eq!(images.len(), 4);
    assert_eq!(images[0].gray.dimensions(), (128, 128));

    let mut printed = 0;
    let pairs = similarity::scan_pairs(&images, &config, |_| printed += 1).expect("scan");
    assert_eq!(pairs.len(), 6);
    assert_eq!(printed, 6);
    assert_eq!((pairs[0].first.as_str(), pairs[0].second.as_str()), ("a.png", "b.png"));
    assert_eq!((pairs[5].first.as_str(), pairs[5].second.as_str()), ("c.png", "d.png"));
    assert!(pairs.iter().all(|p| (-1.0..=1.0).contains(&p.score)));

    let scores: Vec<f64> = pairs.iter().map(|p| p.score).collect();
    let summary = ScoreSummary::from_scores(&scores).expect("summary");
    assert_eq!(summary.count, 6);

    let plot_path = dir.join("out.png");
    plot::save_plot(&plot_path, &scores, (600, 240)).expect("plot");
    let written = image::open(&plot_path).expect("read plot");
    assert_eq!((written.width(), written.height()), (600, 240));

    let json_path = dir.join("report.json");
    let report = SimilarityReport {
        folder: &dir,
        images: images.iter().map(|i| i.name.as_str()).collect(),
        summary: Some(summary),
        pairs: &pairs,
    };
    similarity::write_report(&json_path, &report).expect("json");
    let value: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&json_path).expect("read json")).expect("parse json");
    assert_eq!(value["pairs"].as_array().map(Vec::len), Some(6));
    assert_eq!(value["summary"]["count"], 6);
}

#[test]
fn max_images_and_extension_filter() {
    let dir = scratch_dir("filter");
    for (i, name) in ["a.jpg", "b.JPG", "c.png", "d.jpg"].iter().enumerate() {
        write_pattern(&dir, name, i as u32);
    }

    let config = SsimConfig::default();
    let jpgs = similarity::load_folder(&dir, &["jpg"], None, &config).expect("load");
    let names: Vec<&str> = jpgs.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, ["a.jpg", "b.JPG", "d.jpg"]);

    let capped = similarity::load_folder(&dir, &["jpg"], Some(2), &config).expect("load");
    assert_eq!(capped.len(), 2);

    // A cap of zero means no cap.
    let uncapped = similarity::load_folder(&dir, &["jpg"], Some(0), &config).expect("load");
    assert_eq!(uncapped.len(), 3);
}

#[test]
fn an_image_is_fully_similar_to_itself() {
    let dir = scratch_dir("self");
    write_pattern(&dir, "a.png", 3);

    let config = SsimConfig::default();
    let images = similarity::load_folder(&dir, &["png"], None, &config).expect("load");
    let score = structural_similarity(&images[0].gray, &images[0].gray, &config).expect("ssim");
    assert_abs_diff_eq!(score, 1.0, epsilon = 1e-12);
}
