mod dashboard;

use std::path::PathBuf;

use braillegraph::{GlyphMode, GraphConfig, logging};
use clap::Parser;
use dashboard::Dashboard;

/// Braille history graphs fed by synthetic meters.
#[derive(Debug, Parser)]
#[command(name = "braillegraph", version, about)]
struct Cli {
    /// JSON graph configuration
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Draw with ASCII characters instead of braille
    #[arg(long)]
    ascii: bool,

    /// Sampling interval in tenths of a second
    #[arg(long, value_name = "TENTHS")]
    delay: Option<u32>,

    /// Write logs to this file (filter with BRAILLEGRAPH_LOG)
    #[arg(long, value_name = "FILE")]
    log: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();

    if let Some(ref path) = cli.log {
        if let Err(e) = logging::init(path) {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }

    let mut config = match cli.config {
        Some(ref path) => match GraphConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error loading {}: {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => GraphConfig::default(),
    };
    if cli.ascii {
        config.glyphs = GlyphMode::Ascii;
    }
    if let Some(delay) = cli.delay {
        config.delay_tenths = delay;
    }

    let mut dashboard = match Dashboard::new(&config) {
        Ok(dashboard) => dashboard,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = dashboard.run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
