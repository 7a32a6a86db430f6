use std::fs;
use std::path::PathBuf;

use serde::Deserialize;

use crate::cli::RunArgs;
use crate::engine::EngineParams;
use crate::plan::smooth::DEFAULT_SIGMA_HOURS;
use crate::plan::PlanParams;
use crate::source::nix::{DEFAULT_PROFILE, DEFAULT_REPO};

pub struct Config {
    pub state_path: PathBuf,
    pub profile: PathBuf,
    pub repo: PathBuf,
    pub sigma_hours: f64,
    pub json_output: bool,
    pub verbose: bool,
}

/// Optional file config, merged below CLI flags.
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    state: Option<PathBuf>,
    profile: Option<PathBuf>,
    repo: Option<PathBuf>,
    sigma: Option<String>,
}

impl Config {
    /// Merge CLI args over the config file over built-in defaults.
    pub fn load(args: &RunArgs) -> Result<Config, String> {
        let file = read_file_config();

        let sigma_text = args.sigma.clone().or(file.sigma.clone());
        let sigma_hours = match sigma_text {
            Some(text) => parse_sigma_hours(&text)?,
            None => DEFAULT_SIGMA_HOURS,
        };

        Ok(Config {
            state_path: merge_state_path(args.state.clone(), &file),
            profile: args
                .profile
                .clone()
                .or(file.profile)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_PROFILE)),
            repo: args
                .repo
                .clone()
                .or(file.repo)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_REPO)),
            sigma_hours,
            json_output: args.json,
            verbose: args.verbose,
        })
    }

    /// Resolve the state path the same way a run does: CLI flag over the
    /// config file over the platform default. Pin and unpin go through
    /// this too, so a configured path and a planning run agree on where
    /// the pins live.
    pub fn resolve_state_path(cli: Option<PathBuf>) -> PathBuf {
        merge_state_path(cli, &read_file_config())
    }

    /// ~/.local/share/snapcull/state.json or the platform equivalent.
    pub fn default_state_path() -> PathBuf {
        directories::ProjectDirs::from("", "", "snapcull")
            .map(|dirs| dirs.data_dir().join("state.json"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/snapcull/state.json"))
    }

    pub fn engine_params(&self) -> EngineParams {
        EngineParams {
            sigma_hours: self.sigma_hours,
            plan: PlanParams::default(),
        }
    }
}

/// Read ~/.config/snapcull/config.toml if present; a broken file is
/// ignored rather than blocking a run that may be about to free disk.
fn read_file_config() -> FileConfig {
    let Some(dirs) = directories::ProjectDirs::from("", "", "snapcull") else {
        return FileConfig::default();
    };
    let path = dirs.config_dir().join("config.toml");
    let Ok(raw) = fs::read_to_string(path) else {
        return FileConfig::default();
    };
    parse_file_config(&raw).unwrap_or_default()
}

fn parse_file_config(raw: &str) -> Result<FileConfig, toml::de::Error> {
    toml::from_str(raw)
}

fn merge_state_path(cli: Option<PathBuf>, file: &FileConfig) -> PathBuf {
    cli.or_else(|| file.state.clone())
        .unwrap_or_else(Config::default_state_path)
}

/// Parse a humantime duration ("12h", "2d", "90m") into fractional hours.
fn parse_sigma_hours(text: &str) -> Result<f64, String> {
    let duration = humantime::parse_duration(text)
        .map_err(|e| format!("invalid sigma duration '{text}': {e}"))?;
    let hours = duration.as_secs_f64() / 3600.0;
    if hours <= 0.0 {
        return Err(format!("sigma duration '{text}' must be positive"));
    }
    Ok(hours)
}
