use std::io::{self, IsTerminal, Read};

use clap::Args;
use owo_colors::{OwoColorize, Stream};
use serde_json::json;

use crate::analysis::client::endpoint;
use crate::analysis::{AnalysisResult, Analyzer, HfInferenceClient};
use crate::commands::{ModelArgs, ResolvedModels, load_selected_profile, resolve_models};
use crate::config::{self, API_KEY_ENV};

#[derive(Debug, Args, Clone)]
pub struct AnalyzeArgs {
    #[command(flatten)]
    pub models: ModelArgs,
    #[arg(long, help = "Print the planned inference requests without sending them")]
    pub dry_run: bool,
    #[arg(long, help = "Print the result as JSON")]
    pub json: bool,
    #[arg(long, help = "Print resolved settings to stderr")]
    pub verbose: bool,
    #[arg(help = "Entry text; read from stdin when omitted")]
    pub text: Option<String>,
}

pub async fn run(args: AnalyzeArgs) -> Result<(), String> {
    let profile = load_selected_profile(args.models.profile.as_deref())?;
    let resolved = resolve_models(&args.models, &profile)?;
    let text = read_text(args.text)?;
    let api_key = config::api_key();

    if args.verbose {
        eprintln!(
            "base_url={} sentiment_model={} emotion_model={} summary_model={} timeout={} api_key_present={}",
            resolved.base_url,
            resolved.models.sentiment_model,
            resolved.models.emotion_model,
            resolved.models.summary_model,
            resolved
                .timeout_secs
                .map_or_else(|| "default".to_string(), |secs| secs.to_string()),
            api_key.is_some()
        );
    }

    if args.dry_run {
        println!("{}", dry_run_plan(&resolved, &text));
        return Ok(());
    }

    let api_key = api_key.ok_or_else(|| format!("{API_KEY_ENV} is not set in the environment"))?;
    let client = HfInferenceClient::new(&resolved.base_url, api_key, resolved.timeout_secs);
    let analyzer = Analyzer::new(client, resolved.models);
    let result = analyzer.analyze(&text).await.map_err(|err| err.to_string())?;

    if args.json {
        let body = serde_json::to_string(&result)
            .map_err(|err| format!("Failed to serialize result: {err}"))?;
        println!("{body}");
    } else {
        print_result(&result);
    }
    Ok(())
}

fn read_text(argument: Option<String>) -> Result<String, String> {
    let text = match argument {
        Some(text) => text,
        None => {
            let mut stdin = io::stdin();
            if stdin.is_terminal() {
                String::new()
            } else {
                let mut buffer = String::new();
                stdin
                    .read_to_string(&mut buffer)
                    .map_err(|err| format!("Failed to read stdin: {err}"))?;
                buffer
            }
        }
    };

    if text.trim().is_empty() {
        return Err("No text provided. Pass it as an argument or pipe it on stdin.".to_string());
    }
    Ok(text)
}

fn dry_run_plan(resolved: &ResolvedModels, text: &str) -> serde_json::Value {
    let requests: Vec<_> = resolved
        .models
        .planned_requests(text)
        .into_iter()
        .map(|request| {
            json!({
                "model": request.model,
                "url": endpoint(&resolved.base_url, &request.model),
                "payload": request.payload,
            })
        })
        .collect();

    json!({
        "dry_run": true,
        "base_url": resolved.base_url,
        "timeout_secs": resolved.timeout_secs,
        "requests": requests,
    })
}

fn print_result(result: &AnalysisResult) {
    let label = |name: &'static str| {
        format!("{name:<12}")
            .if_supports_color(Stream::Stdout, |text| text.bold())
            .to_string()
    };

    println!("{}{:+.2}", label("sentiment"), result.sentiment);
    println!(
        "{}{} ({:.2})",
        label("emotion"),
        result.emotion,
        result.emotion_score
    );
    let stress = format!("{}/10", result.stress_score);
    if result.stress_score >= 7 {
        println!(
            "{}{}",
            label("stress"),
            stress.if_supports_color(Stream::Stdout, |text| text.red())
        );
    } else {
        println!("{}{}", label("stress"), stress);
    }
    println!("{}{}", label("summary"), result.summary);
    for suggestion in &result.suggestions {
        println!(
            "{}{}",
            "- ".if_supports_color(Stream::Stdout, |text| text.cyan()),
            suggestion
        );
    }
}
