use clap::Parser;
use log::{error, info};

use video2yolo::{process_dataset, SplitArgs};

fn main() {
    // Initialize the logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = SplitArgs::parse();

    info!("Starting the split process...");

    match process_dataset(&args) {
        Ok(report) => {
            if !report.gaps.is_empty() {
                error!(
                    "{} video(s) were not assigned to any split",
                    report.gaps.iter().map(|gap| gap.records).sum::<usize>()
                );
            }
        }
        Err(e) => {
            error!("Failed to split dataset: {}", e);
            std::process::exit(1);
        }
    }
}
