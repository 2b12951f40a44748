//! CLI subcommands and the settings resolution they share.
//!
//! Every setting resolves as CLI flag, then environment, then the selected
//! profile, then the built-in default.

use clap::Args;
use tracing_subscriber::EnvFilter;

use crate::analysis::ModelSettings;
use crate::config::{DEFAULT_BASE_URL, ProfileConfig, env_parse, env_string, load_profile};

pub mod analyze;
pub mod config;
pub mod serve;

/// Model selection flags shared by `analyze` and `serve`.
#[derive(Debug, Args, Clone, Default)]
pub struct ModelArgs {
    #[arg(long, help = "Config profile to load")]
    pub profile: Option<String>,
    #[arg(long, help = "Inference base URL; model ids are appended")]
    pub base_url: Option<String>,
    #[arg(long, help = "Sentiment classification model id")]
    pub sentiment_model: Option<String>,
    #[arg(long, help = "Emotion classification model id")]
    pub emotion_model: Option<String>,
    #[arg(long, help = "Summarization model id")]
    pub summary_model: Option<String>,
    #[arg(long, help = "Per-request timeout in seconds")]
    pub timeout: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ResolvedModels {
    pub base_url: String,
    pub models: ModelSettings,
    pub timeout_secs: Option<u64>,
}

pub(crate) fn load_selected_profile(name: Option<&str>) -> Result<ProfileConfig, String> {
    match name {
        Some(name) => load_profile(name),
        None => Ok(ProfileConfig::default()),
    }
}

pub(crate) fn resolve_models(
    args: &ModelArgs,
    profile: &ProfileConfig,
) -> Result<ResolvedModels, String> {
    let defaults = ModelSettings::default();

    let base_url = args
        .base_url
        .clone()
        .or_else(|| env_string("MOODLENS_BASE_URL"))
        .or_else(|| profile.base_url.clone())
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

    let timeout_secs = match args.timeout {
        Some(timeout) => Some(timeout),
        None => env_parse::<u64>("MOODLENS_TIMEOUT")?.or(profile.timeout),
    };

    let models = ModelSettings {
        sentiment_model: pick_string(
            &args.sentiment_model,
            "MOODLENS_SENTIMENT_MODEL",
            &profile.sentiment_model,
            defaults.sentiment_model,
        ),
        emotion_model: pick_string(
            &args.emotion_model,
            "MOODLENS_EMOTION_MODEL",
            &profile.emotion_model,
            defaults.emotion_model,
        ),
        summary_model: pick_string(
            &args.summary_model,
            "MOODLENS_SUMMARY_MODEL",
            &profile.summary_model,
            defaults.summary_model,
        ),
        summary_min_length: profile
            .summary_min_length
            .unwrap_or(defaults.summary_min_length),
        summary_max_length: profile
            .summary_max_length
            .unwrap_or(defaults.summary_max_length),
    };

    if models.summary_min_length > models.summary_max_length {
        return Err(format!(
            "summary_min_length ({}) exceeds summary_max_length ({}).",
            models.summary_min_length, models.summary_max_length
        ));
    }

    Ok(ResolvedModels {
        base_url,
        models,
        timeout_secs,
    })
}

fn pick_string(
    cli: &Option<String>,
    env_key: &str,
    profile: &Option<String>,
    default: String,
) -> String {
    cli.clone()
        .or_else(|| env_string(env_key))
        .or_else(|| profile.clone())
        .unwrap_or(default)
}

/// Installs the stderr subscriber. `RUST_LOG` overrides `default_directives`.
pub fn init_tracing(default_directives: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives));
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .try_init();
}
