use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;
use url::Url;

use scriven::build;
use scriven::config::SiteConfig;

/// Builds the site once: markdown posts in, an HTML tree and RSS feed out.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Site configuration file
    #[arg(short = 'C', long, default_value = "site.yaml")]
    config: PathBuf,

    /// Markdown content directory
    #[arg(long)]
    content: Option<PathBuf>,

    /// Page template directory
    #[arg(long)]
    templates: Option<PathBuf>,

    /// Static asset directory
    #[arg(long)]
    assets: Option<PathBuf>,

    /// Build output directory
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Base URL used for absolute links in the feed
    #[arg(long)]
    base_url: Option<Url>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(err) = run(Cli::parse()) {
        error!("build failed: {:#}", err);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = SiteConfig::load(&cli.config)?;
    if let Some(content) = cli.content {
        config.content_dir = content;
    }
    if let Some(templates) = cli.templates {
        config.template_dir = templates;
    }
    if let Some(assets) = cli.assets {
        config.asset_dir = assets;
    }
    if let Some(out) = cli.out {
        config.output_dir = out;
    }
    if let Some(base_url) = cli.base_url {
        config.base_url = base_url;
        config.normalize_base_url();
    }

    let cancel = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&cancel);
    ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed))
        .context("installing shutdown handler")?;

    build::build_site(&config, &cancel)?;
    Ok(())
}
