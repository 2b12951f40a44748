use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

use serde::Deserialize;

pub const DEFAULT_BASE_URL: &str = "https://router.huggingface.co/hf-inference/models";
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;

pub const API_KEY_ENV: &str = "HF_API_KEY";
pub const FIREBASE_API_KEY_ENV: &str = "FIREBASE_API_KEY";

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ProfileConfig {
    pub base_url: Option<String>,
    pub sentiment_model: Option<String>,
    pub emotion_model: Option<String>,
    pub summary_model: Option<String>,
    pub summary_min_length: Option<u32>,
    pub summary_max_length: Option<u32>,
    pub timeout: Option<u64>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub auth: Option<String>,
    pub firebase_api_key: Option<String>,
    pub tokens: Option<HashMap<String, String>>,
}

#[derive(Debug, Deserialize, Default)]
struct ConfigFile {
    profiles: Option<HashMap<String, ProfileConfig>>,
}

/// How the HTTP endpoint verifies bearer credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    Static,
    Firebase,
}

impl AuthMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Static => "static",
            Self::Firebase => "firebase",
        }
    }
}

impl FromStr for AuthMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "static" => Ok(Self::Static),
            "firebase" => Ok(Self::Firebase),
            other => Err(format!(
                "Invalid auth mode '{other}'. Supported values: static, firebase."
            )),
        }
    }
}

pub fn load_profile(name: &str) -> Result<ProfileConfig, String> {
    let (path, config) = read_config_file()?;

    let profiles = config.profiles.ok_or_else(|| {
        format!(
            "Config file '{}' does not contain a [profiles] section.",
            path.display()
        )
    })?;

    profiles.get(name).cloned().ok_or_else(|| {
        format!(
            "Profile '{}' not found in config file '{}'.",
            name,
            path.display()
        )
    })
}

/// Parses the config file and checks every profile (or only `profile`).
pub fn validate_config(profile: Option<&str>) -> Result<PathBuf, String> {
    let (path, config) = read_config_file()?;
    let profiles = config.profiles.unwrap_or_default();

    let selected: Vec<(&String, &ProfileConfig)> = match profile {
        Some(name) => {
            let (key, value) = profiles.get_key_value(name).ok_or_else(|| {
                format!(
                    "Profile '{}' not found in config file '{}'.",
                    name,
                    path.display()
                )
            })?;
            vec![(key, value)]
        }
        None => profiles.iter().collect(),
    };

    for (name, profile) in selected {
        validate_profile(profile).map_err(|err| format!("Profile '{name}': {err}"))?;
    }

    Ok(path)
}

fn validate_profile(profile: &ProfileConfig) -> Result<(), String> {
    if let Some(mode) = &profile.auth {
        mode.parse::<AuthMode>()?;
    }
    if let (Some(min), Some(max)) = (profile.summary_min_length, profile.summary_max_length) {
        if min > max {
            return Err(format!(
                "summary_min_length ({min}) exceeds summary_max_length ({max})."
            ));
        }
    }
    if let Some(url) = &profile.base_url {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(format!("base_url '{url}' must start with http:// or https://."));
        }
    }
    Ok(())
}

fn read_config_file() -> Result<(PathBuf, ConfigFile), String> {
    let path = config_path()?;
    let raw = fs::read_to_string(&path)
        .map_err(|err| format!("Failed to read config file '{}': {err}", path.display()))?;

    let config: ConfigFile = toml::from_str(&raw)
        .map_err(|err| format!("Failed to parse config file '{}': {err}", path.display()))?;

    Ok((path, config))
}

fn config_path() -> Result<PathBuf, String> {
    if let Some(path) = env_string("MOODLENS_CONFIG") {
        return Ok(PathBuf::from(path));
    }

    if let Some(xdg) = env_string("XDG_CONFIG_HOME") {
        return Ok(PathBuf::from(xdg).join("moodlens").join("config.toml"));
    }

    let home = env::var("HOME").map_err(|_| {
        "Cannot resolve config path: set MOODLENS_CONFIG or HOME/XDG_CONFIG_HOME.".to_string()
    })?;
    Ok(PathBuf::from(home)
        .join(".config")
        .join("moodlens")
        .join("config.toml"))
}

/// Trimmed, non-empty value of an environment variable.
pub fn env_string(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Parsed environment variable; a present but unparsable value is an error.
pub fn env_parse<T: FromStr>(key: &str) -> Result<Option<T>, String> {
    env_string(key)
        .map(|raw| {
            raw.parse::<T>()
                .map_err(|_| format!("Invalid {key} '{raw}'."))
        })
        .transpose()
}

/// Secret from the environment; never echoed back.
pub fn api_key() -> Option<String> {
    env_string(API_KEY_ENV)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_mode_parses_case_insensitively() {
        assert_eq!("Firebase".parse::<AuthMode>(), Ok(AuthMode::Firebase));
        assert_eq!(" static ".parse::<AuthMode>(), Ok(AuthMode::Static));
        let err = "oauth".parse::<AuthMode>().unwrap_err();
        assert!(err.contains("Supported values: static, firebase."));
    }

    #[test]
    fn profile_tables_deserialize() {
        let raw = r#"
[profiles.dev]
sentiment_model = "org/sentiment"
summary_min_length = 5
summary_max_length = 40
port = 9090
auth = "static"

[profiles.dev.tokens]
"tok-1" = "user-1"
"#;
        let config: ConfigFile = toml::from_str(raw).expect("config should parse");
        let profiles = config.profiles.expect("profiles section");
        let dev = &profiles["dev"];
        assert_eq!(dev.sentiment_model.as_deref(), Some("org/sentiment"));
        assert_eq!(dev.port, Some(9090));
        assert_eq!(
            dev.tokens.as_ref().and_then(|tokens| tokens.get("tok-1")).map(String::as_str),
            Some("user-1")
        );
        assert!(validate_profile(dev).is_ok());
    }

    #[test]
    fn unknown_profile_keys_are_rejected() {
        let raw = "[profiles.dev]\ntemperature = 0.2\n";
        assert!(toml::from_str::<ConfigFile>(raw).is_err());
    }

    #[test]
    fn inverted_summary_lengths_fail_validation() {
        let profile = ProfileConfig {
            summary_min_length: Some(80),
            summary_max_length: Some(20),
            ..ProfileConfig::default()
        };
        let err = validate_profile(&profile).unwrap_err();
        assert!(err.contains("summary_min_length (80)"));
    }

    #[test]
    fn base_url_must_be_http() {
        let profile = ProfileConfig {
            base_url: Some("ftp://models".to_string()),
            ..ProfileConfig::default()
        };
        assert!(validate_profile(&profile).is_err());
    }
}
