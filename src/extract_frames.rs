use clap::Parser;
use log::{error, info};

use video2yolo::{extract_dataset, ExtractArgs, FfmpegDecoder};

fn main() {
    // Initialize the logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = ExtractArgs::parse();

    if !args.base_path.is_dir() {
        error!(
            "The specified base_path does not exist: {}",
            args.base_path.display()
        );
        std::process::exit(1);
    }

    info!("Starting frame extraction...");

    let decoder = FfmpegDecoder {
        program: args.ffmpeg.clone(),
    };
    let stats = extract_dataset(&args.base_path, &args.categories, &args.class_ids, &decoder);
    stats.print_summary("Extraction");
}
