use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use aimex_session::SessionConfig;

mod app;
mod scene;

use app::App;

/// Visuomotor aiming task: cross the invisible circle through the target.
#[derive(Parser)]
#[command(name = "aimex")]
struct Args {
    /// JSON configuration snapshot; defaults are used when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Directory trajectory reports are written into.
    #[arg(long, default_value = "reports")]
    out_dir: PathBuf,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => SessionConfig::load(path)?,
        None => SessionConfig::default(),
    };

    App::new(config, args.out_dir).run()
}
