use clap::Args;
use tracing::info;

use crate::analysis::{Analyzer, HfInferenceClient};
use crate::commands::{ModelArgs, load_selected_profile, resolve_models};
use crate::config::{
    self, API_KEY_ENV, AuthMode, DEFAULT_HOST, DEFAULT_PORT, FIREBASE_API_KEY_ENV,
    ProfileConfig, env_parse, env_string,
};
use crate::server::{
    self, AppState, ConfiguredAuthenticator, FirebaseAuthenticator, StaticTokenAuthenticator,
};

#[derive(Debug, Args, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub models: ModelArgs,
    #[arg(long, help = "Address to bind")]
    pub host: Option<String>,
    #[arg(long, help = "Port to bind")]
    pub port: Option<u16>,
    #[arg(long, help = "Bearer token verification: static or firebase")]
    pub auth: Option<String>,
}

pub async fn run(args: ServeArgs) -> Result<(), String> {
    let profile = load_selected_profile(args.models.profile.as_deref())?;
    let resolved = resolve_models(&args.models, &profile)?;

    let host = args
        .host
        .clone()
        .or_else(|| env_string("MOODLENS_HOST"))
        .or_else(|| profile.host.clone())
        .unwrap_or_else(|| DEFAULT_HOST.to_string());
    let port = match args.port {
        Some(port) => port,
        None => env_parse::<u16>("MOODLENS_PORT")?
            .or(profile.port)
            .unwrap_or(DEFAULT_PORT),
    };

    let mode = resolve_auth_mode(args.auth.as_deref(), &profile)?;
    let authenticator = build_authenticator(mode, &profile)?;

    let api_key =
        config::api_key().ok_or_else(|| format!("{API_KEY_ENV} is not set in the environment"))?;
    let client = HfInferenceClient::new(&resolved.base_url, api_key, resolved.timeout_secs);

    info!(
        base_url = %resolved.base_url,
        sentiment_model = %resolved.models.sentiment_model,
        emotion_model = %resolved.models.emotion_model,
        summary_model = %resolved.models.summary_model,
        auth = mode.as_str(),
        "starting entry analysis server"
    );

    let state = AppState::new(Analyzer::new(client, resolved.models), authenticator);
    server::serve(&format!("{host}:{port}"), state).await
}

fn resolve_auth_mode(cli: Option<&str>, profile: &ProfileConfig) -> Result<AuthMode, String> {
    match cli
        .map(str::to_string)
        .or_else(|| env_string("MOODLENS_AUTH"))
        .or_else(|| profile.auth.clone())
    {
        Some(raw) => raw.parse(),
        None => Ok(AuthMode::Firebase),
    }
}

fn build_authenticator(
    mode: AuthMode,
    profile: &ProfileConfig,
) -> Result<ConfiguredAuthenticator, String> {
    match mode {
        AuthMode::Static => {
            let tokens = profile
                .tokens
                .clone()
                .filter(|tokens| !tokens.is_empty())
                .ok_or_else(|| {
                    "auth = static requires a non-empty [profiles.<name>.tokens] table.".to_string()
                })?;
            Ok(ConfiguredAuthenticator::Static(
                StaticTokenAuthenticator::new(tokens),
            ))
        }
        AuthMode::Firebase => {
            let api_key = env_string(FIREBASE_API_KEY_ENV)
                .or_else(|| profile.firebase_api_key.clone())
                .ok_or_else(|| {
                    format!("{FIREBASE_API_KEY_ENV} is not set (required for auth = firebase)")
                })?;
            Ok(ConfiguredAuthenticator::Firebase(FirebaseAuthenticator::new(
                api_key,
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn auth_mode_defaults_to_firebase() {
        let mode = resolve_auth_mode(None, &ProfileConfig::default()).expect("default mode");
        assert_eq!(mode, AuthMode::Firebase);
    }

    #[test]
    fn cli_auth_mode_wins_over_profile() {
        let profile = ProfileConfig {
            auth: Some("firebase".to_string()),
            ..ProfileConfig::default()
        };
        assert_eq!(
            resolve_auth_mode(Some("static"), &profile),
            Ok(AuthMode::Static)
        );
        assert!(resolve_auth_mode(Some("jwt"), &profile).is_err());
    }

    #[test]
    fn static_auth_requires_tokens() {
        let err = build_authenticator(AuthMode::Static, &ProfileConfig::default()).unwrap_err();
        assert!(err.contains("tokens"));

        let profile = ProfileConfig {
            tokens: Some(HashMap::from([("t".to_string(), "u".to_string())])),
            ..ProfileConfig::default()
        };
        assert!(matches!(
            build_authenticator(AuthMode::Static, &profile),
            Ok(ConfiguredAuthenticator::Static(_))
        ));
    }

    #[test]
    fn firebase_key_can_come_from_profile() {
        let profile = ProfileConfig {
            firebase_api_key: Some("web-key".to_string()),
            ..ProfileConfig::default()
        };
        assert!(matches!(
            build_authenticator(AuthMode::Firebase, &profile),
            Ok(ConfiguredAuthenticator::Firebase(_))
        ));
    }
}
