//! NutriVision - compare AI nutritional estimates of a food photo
//!
//! A CLI tool that sends one image through several prompting techniques in
//! parallel and shows the estimates side by side.

mod cli;
mod commands;
mod output;

use clap::Parser;
use cli::Cli;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = commands::execute(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// RUST_LOG wins; otherwise warnings only, or debug for our crates with -v
fn init_logging(verbose: bool) {
    let default = if verbose {
        "warn,nutrivision_app=debug,nutrivision_vision=debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
