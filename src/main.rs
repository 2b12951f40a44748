use std::io;
use std::process;

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, shells};
use moodlens::commands::analyze::{self, AnalyzeArgs};
use moodlens::commands::config::{self, ConfigArgs};
use moodlens::commands::init_tracing;
use moodlens::commands::serve::{self, ServeArgs};

const ROOT_HELP_EXAMPLES: &str = "Examples:\n  moodlens serve --port 8080\n  moodlens analyze \"I am furious and overwhelmed today\"\n  echo \"Long day, but a good one.\" | moodlens analyze --json\n  moodlens config check\n  moodlens completion bash > ~/.local/share/bash-completion/completions/moodlens";

const ANALYZE_HELP_EXAMPLES: &str = "Examples:\n  moodlens analyze \"I am furious and overwhelmed today\"\n  moodlens analyze --dry-run --sentiment-model org/model \"Explain the plan\"\n  moodlens analyze --profile dev --json < entry.txt";

#[derive(Debug, Parser)]
#[command(
    name = "moodlens",
    version,
    about = "Journal entry sentiment, emotion and stress analysis",
    after_help = ROOT_HELP_EXAMPLES
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(about = "Run the authenticated analysis endpoint")]
    Serve(ServeArgs),
    #[command(about = "Analyze one entry from the command line", after_help = ANALYZE_HELP_EXAMPLES)]
    Analyze(AnalyzeArgs),
    #[command(about = "Manage local config")]
    Config(ConfigArgs),
    #[command(about = "Generate shell completion script")]
    Completion {
        #[arg(value_enum)]
        shell: CompletionShell,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}

fn print_completion(shell: CompletionShell) {
    let mut cmd = Cli::command();
    match shell {
        CompletionShell::Bash => generate(shells::Bash, &mut cmd, "moodlens", &mut io::stdout()),
        CompletionShell::Zsh => generate(shells::Zsh, &mut cmd, "moodlens", &mut io::stdout()),
        CompletionShell::Fish => generate(shells::Fish, &mut cmd, "moodlens", &mut io::stdout()),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Serve(args) => {
            init_tracing("moodlens=info,tower_http=info");
            serve::run(args).await
        }
        Commands::Analyze(args) => {
            init_tracing("moodlens=warn");
            analyze::run(args).await
        }
        Commands::Config(args) => config::run(args),
        Commands::Completion { shell } => {
            print_completion(shell);
            Ok(())
        }
    };

    if let Err(err) = result {
        eprintln!("{err}");
        process::exit(1);
    }
}
