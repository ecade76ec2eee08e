use clap::Parser;
use mugplot::cli::{self, Cli};
use mugplot::init_logging;
use std::process::ExitCode;

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_logging()?;
    tracing::debug!("mugplot {} built {}", mugplot::VERSION, mugplot::BUILD_DATE);

    cli::run(cli)
}
