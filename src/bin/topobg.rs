use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use topobg::{check_gpu_support, Background, BackgroundOptions};

/// Animated topology particle background in a transparent window.
#[derive(Debug, Parser)]
#[command(name = "topobg", version, about)]
struct Cli {
    /// JSON options file. Missing fields take their defaults.
    config: Option<PathBuf>,

    /// Force the mobile profile.
    #[arg(long)]
    mobile: bool,

    /// Switch to the mobile profile when the window is narrow.
    #[arg(long)]
    detect: bool,

    /// Fixed RNG seed for a reproducible layout.
    #[arg(long)]
    seed: Option<u64>,
}

impl Cli {
    fn options(&self) -> Result<BackgroundOptions, topobg::ConfigError> {
        let mut options = match &self.config {
            Some(path) => BackgroundOptions::from_json_file(path)?,
            None => BackgroundOptions::default(),
        };
        if self.mobile {
            options.is_mobile = true;
        }
        if self.detect {
            options.detect_mobile = true;
        }
        if self.seed.is_some() {
            options.seed = self.seed;
        }
        Ok(options)
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let options = match cli.options() {
        Ok(options) => options,
        Err(e) => {
            tracing::error!("{}", e);
            return ExitCode::from(2);
        }
    };

    if !check_gpu_support() {
        tracing::error!("no GPU adapter available");
        return ExitCode::FAILURE;
    }

    match Background::new(options).run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
