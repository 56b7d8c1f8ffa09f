//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

use patreon_dl::download::DEFAULT_MAX_ATTEMPTS;
use patreon_dl::download::constants::DEFAULT_DOWNLOAD_DIR;

/// Download Patreon files and posts, resumably.
///
/// Given file or post URLs, downloads every attached file into a
/// per-creator directory. Without --batch it keeps running and watches
/// standard input: paste one or more URLs per line to queue them.
#[derive(Parser, Debug)]
#[command(name = "patreon-dl")]
#[command(author, version, about)]
pub struct Args {
    /// File or post URLs to queue at startup
    pub urls: Vec<String>,

    /// Exit once the given URLs finish instead of watching standard input
    #[arg(short, long)]
    pub batch: bool,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// Maximum concurrent downloads (1-100)
    #[arg(short = 'c', long, default_value_t = 4, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub concurrency: u8,

    /// Maximum attempts per request, including the first (1-10)
    #[arg(short = 'r', long, default_value_t = DEFAULT_MAX_ATTEMPTS as u8, value_parser = clap::value_parser!(u8).range(1..=10))]
    pub max_attempts: u8,

    /// Root directory downloads are organized under
    #[arg(short = 'o', long, default_value = DEFAULT_DOWNLOAD_DIR)]
    pub output_dir: PathBuf,

    /// Seconds to let a post page settle before harvesting links (0-120)
    #[arg(short = 'w', long, default_value_t = 8, value_parser = clap::value_parser!(u64).range(0..=120))]
    pub render_wait: u64,
}
