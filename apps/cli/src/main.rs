//! CourseHub CLI: validate, build and operate a static course portal.
//!
//! Loads YAML content, exports JSON pages with a sitemap, searches the
//! catalog and checks external links.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
