//! CLI definition using clap

use clap::{Parser, Subcommand};
use nutrivision_types::{OutputFormat, Technique};

#[derive(Parser)]
#[command(name = "nutrivision")]
#[command(author = "yuuji")]
#[command(version)]
#[command(about = "Compare AI nutritional estimates of a food photo across prompting techniques")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Model name override
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Output format (json, table). Uses config value if not specified.
    #[arg(long, short = 'f', global = true)]
    pub format: Option<OutputFormat>,

    /// Verbose output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze a food image with every technique
    Analyze {
        /// Image path, http(s) URL, data URI, or sample:<n|name>
        input: String,

        /// Run only this technique
        #[arg(long, short = 't')]
        technique: Option<Technique>,
    },

    /// List analysis techniques
    Techniques,

    /// List built-in sample images
    Samples,

    /// Manage configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,

        /// Set model
        #[arg(long)]
        set_model: Option<String>,

        /// Set sampling temperature
        #[arg(long)]
        set_temperature: Option<f32>,

        /// Set inference API base URL
        #[arg(long)]
        set_api_base: Option<String>,

        /// Set request timeout in seconds
        #[arg(long)]
        set_timeout: Option<u64>,

        /// Set default output format
        #[arg(long)]
        set_output: Option<OutputFormat>,

        /// Reset to defaults
        #[arg(long)]
        reset: bool,
    },
}
