//! Blob bridge host entry point.
//!
//! Reads lines from the rendering surface on stdin: channel records are
//! fed to the reassembler, bare http(s) URLs are treated as intercepted
//! navigations. Shared files are printed to stdout.

mod app;
mod config;

use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries shared file references.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "starting blob bridge host"
    );

    let config = config::Config::load()?;
    tracing::info!(staging_dir = %config.staging_dir.display(), "configuration loaded");

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(app::run(config))?;

    tracing::info!("host shut down cleanly");
    Ok(())
}
