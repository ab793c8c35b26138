use std::path::PathBuf;

use clap::{Parser, Subcommand};
use log::LevelFilter;

#[derive(Parser, Debug)]
#[command(
    name = "tabletop",
    about = "Segment objects on a tabletop scan and classify them with PointNet",
    version
)]
pub struct Cli {
    /// TOML file overriding the built-in pipeline settings.
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// More log output (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Find the table in a scan and split what stands on it into objects.
    Segment {
        #[arg(value_name = "SCENE")]
        scene: PathBuf,

        /// Where to write the objects, the coloured scene and the view file.
        #[arg(short, long, value_name = "DIR")]
        export_dir: Option<PathBuf>,

        #[arg(long)]
        seed: Option<u64>,
    },

    /// Classify every object file of a directory and score the predictions.
    Classify {
        #[arg(value_name = "OBJECT_DIR")]
        object_dir: PathBuf,

        /// PointNet weights exported as JSON.
        #[arg(short, long, value_name = "FILE")]
        weights: PathBuf,

        #[arg(short, long)]
        num_points: Option<usize>,

        #[arg(long)]
        seed: Option<u64>,
    },
}

impl Cli {
    pub fn log_level(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_segment_with_global_flags() {
        let cli = Cli::parse_from([
            "tabletop", "segment", "scan.pcd", "--export-dir", "out", "-vv", "--seed", "7",
        ]);
        assert_eq!(cli.log_level(), LevelFilter::Debug);
        match cli.command {
            Command::Segment {
                scene,
                export_dir,
                seed,
            } => {
                assert_eq!(scene, PathBuf::from("scan.pcd"));
                assert_eq!(export_dir, Some(PathBuf::from("out")));
                assert_eq!(seed, Some(7));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn classify_requires_weights() {
        assert!(Cli::try_parse_from(["tabletop", "classify", "objects"]).is_err());

        let cli = Cli::try_parse_from([
            "tabletop", "--config", "run.toml", "classify", "objects", "-w", "net.json", "-n", "512",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("run.toml")));
        assert!(matches!(
            cli.command,
            Command::Classify {
                num_points: Some(512),
                ..
            }
        ));
    }
}
