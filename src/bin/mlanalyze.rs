use std::process;

use clap::Parser;
use moodlens::commands::analyze::{self, AnalyzeArgs};
use moodlens::commands::init_tracing;

#[derive(Debug, Parser)]
#[command(
    name = "mlanalyze",
    about = "Analyze one journal entry for sentiment, emotion and stress",
    disable_version_flag = true
)]
struct Cli {
    #[command(flatten)]
    analyze: AnalyzeArgs,
}

#[tokio::main]
async fn main() {
    init_tracing("moodlens=warn");
    let cli = Cli::parse();
    if let Err(err) = analyze::run(cli.analyze).await {
        eprintln!("{err}");
        process::exit(1);
    }
}
