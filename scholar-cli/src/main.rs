use clap::Parser;
use scholar_cli::cli::Cli;
use scholar_cli::{commands, logging};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.log_json);
    commands::run(cli).await
}
