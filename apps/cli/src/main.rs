//! Wallabook CLI — export wallabag articles into an EPUB.
//!
//! Runs on desktops/servers and on e-readers (`--device`), which differ only
//! in default paths and where operator output goes.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli)?;
    commands::run(cli).await
}
