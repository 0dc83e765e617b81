//! Walks through a typical session against the GIIA platform: login, browse
//! and create products, inspect a buffer, read KPIs and notifications.
//!
//! Each step reports success or failure and moves on. Only a failed login
//! ends the walkthrough early.

mod walkthrough;

use std::io::{self, Write};

use clap::Parser;
use giia_core::config::{API_URL_ENV, DEFAULT_API_URL};
use giia_core::{ClientConfig, PlatformClient};

#[derive(Parser)]
#[command(name = "giia-demo")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Example client session against the GIIA platform APIs")]
struct Cli {
    /// Base URL of the platform host, without port
    #[arg(long, env = API_URL_ENV, default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Login email
    #[arg(long, env = "GIIA_EMAIL", default_value = "demo@example.com")]
    email: String,

    /// Login password
    #[arg(long, env = "GIIA_PASSWORD", default_value = "password", hide_env_values = true)]
    password: String,

    /// Enable verbose logging (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();
}

fn walk(cli: &Cli) -> io::Result<()> {
    let mut client = PlatformClient::new(ClientConfig::new(&cli.api_url));
    let mut out = io::stdout().lock();
    walkthrough::rule(&mut out)?;
    writeln!(out, "GIIA Platform Rust Client Example")?;
    walkthrough::rule(&mut out)?;
    walkthrough::run(&mut client, &cli.email, &cli.password, &mut out)
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = walk(&cli) {
        log::error!("writing to stdout failed: {e}");
    }
}
