#![forbid(unsafe_code)]

mod cli;
mod config;

use std::error::Error as _;
use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use tabletop_classify::{classify_batch, ObjectDataset, PointNet};
use tabletop_scene::{export, SceneSegmenter};
use thiserror::Error;

use crate::cli::{Cli, Command};
use crate::config::{AppConfig, ConfigError};

#[derive(Debug, Error)]
enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Scene(#[from] tabletop_scene::SceneError),

    #[error(transparent)]
    Classify(#[from] tabletop_classify::ClassifyError),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.log_level())
        .parse_default_env()
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            let mut source = err.source();
            while let Some(cause) = source {
                log::error!("  caused by: {cause}");
                source = cause.source();
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), AppError> {
    let mut config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };

    match cli.command {
        Command::Segment {
            scene,
            export_dir,
            seed,
        } => {
            if let Some(seed) = seed {
                config.scene.seed = seed;
            }
            segment(&config, &scene, export_dir.as_deref())
        }
        Command::Classify {
            object_dir,
            weights,
            num_points,
            seed,
        } => {
            if let Some(n) = num_points {
                config.classifier.num_points = n;
            }
            if let Some(seed) = seed {
                config.classifier.seed = seed;
            }
            classify(&config, &object_dir, &weights)
        }
    }
}

fn segment(config: &AppConfig, scene: &Path, export_dir: Option<&Path>) -> Result<(), AppError> {
    let raw = tabletop_scene::processing::load(scene).map_err(tabletop_scene::SceneError::from)?;
    println!("Loaded {} points from {}", raw.len(), scene.display());

    let segmenter = SceneSegmenter::new(config.scene.clone());
    let result = segmenter.segment(&raw)?;

    println!(
        "Table: {} inliers of {} horizontal candidates",
        result.table.inlier_count, result.table.candidate_count
    );
    println!("Points above the table: {}", result.clutter.len());
    println!("Number of objects: {}", result.num_objects());
    for object in &result.objects {
        let c = object.centroid;
        println!(
            "  object {}: {} points, centroid ({:.3}, {:.3}, {:.3})",
            object.label,
            object.points.len(),
            c[0],
            c[1],
            c[2]
        );
    }

    if let Some(dir) = export_dir {
        let written = export::write_objects(dir, &result.objects)?;
        export::write_scene(dir.join("scene.ply"), &result.objects)?;
        export::write_view(dir.join("view.json"), &config.view, &result.crop_box)?;
        println!("Wrote {} object files to {}", written.len(), dir.display());
    }

    Ok(())
}

fn classify(config: &AppConfig, object_dir: &Path, weights: &Path) -> Result<(), AppError> {
    let network = PointNet::from_file(weights)?;
    let dataset = ObjectDataset::from_dir(object_dir, config.classifier.vocabulary())?;
    let report = classify_batch(&network, &dataset, &config.classifier.sampler())?;

    println!("Predicted:    {:?}", report.predicted_labels());
    println!("Ground truth: {:?}", report.ground_truth_labels());
    for prediction in &report.predictions {
        let mark = if prediction.is_correct() { "ok" } else { "MISS" };
        println!(
            "  {:<4} {} -> {}",
            mark,
            prediction.path.display(),
            prediction.predicted_label
        );
    }

    let metrics = report.metrics;
    println!("Precision: {:.1}%", metrics.precision * 100.0);
    println!("Recall: {:.1}%", metrics.recall * 100.0);
    println!("F1 Score: {:.1}%", metrics.f1 * 100.0);

    Ok(())
}
