//! Scans a GeoLife `Data` root and lists users with enough stay points to be worth profiling.

use {
    anyhow::Result,
    clap::Parser,
    haunts::{
        analysis::StayPointDetector,
        config::{PipelineConfig, constants},
        data::{BatchReporter, geolife_offset},
        engine::{run_batch, screen_users},
        init_logging,
    },
    std::path::PathBuf,
};

#[derive(Parser, Debug)]
#[command(about = "List GeoLife users with at least N stay points")]
struct Args {
    /// GeoLife `Data` directory (one sub-folder per user)
    root: PathBuf,

    #[arg(long, default_value_t = constants::SCREEN_MIN_STAY_POINTS)]
    min_stay_points: usize,

    /// Optional JSON pipeline config
    #[arg(long)]
    config: Option<PathBuf>,

    /// Run the full pipeline on every retained user and print a CSV summary
    #[arg(long, default_value_t = false)]
    full: bool,
}

fn main() -> Result<()> {
    init_logging();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => PipelineConfig::from_json_file(path)?,
        None => PipelineConfig::DEFAULT,
    };
    let detector = StayPointDetector::new(config.detector)?;
    let screened = screen_users(
        &args.root,
        geolife_offset(),
        &detector,
        args.min_stay_points,
        args.full,
    )?;

    let mut batch = Vec::new();
    for user in screened {
        match user.outcome {
            Ok(count) if count.stay_points >= args.min_stay_points => {
                println!("{},{}", user.user_id, count.stay_points);
                if let Some(fixes) = count.fixes {
                    batch.push((user.user_id, fixes));
                }
            }
            Ok(count) => log::info!(
                "User {} has only {} stay points. Skipping.",
                user.user_id,
                count.stay_points
            ),
            Err(e) => log::warn!("User {} could not be screened: {:#}", user.user_id, e),
        }
    }

    if args.full {
        let mut reporter = BatchReporter::new();
        reporter.add_header();
        for outcome in run_batch(config, batch)? {
            reporter.add_outcome(&outcome);
        }
        reporter.print_all();
    }
    Ok(())
}
