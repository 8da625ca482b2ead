//! Runtime configuration: command-line options, JSON machine profile,
//! then environment overrides.

use std::path::{Path, PathBuf};

use gcode_script::{MachineProfile, ZPolicy};
use path_extract::extract::ridge::DEFAULT_RIDGE_CUTOFF;

use super::ConfigError;
use super::args::RunOptions;
use super::defaults::{DEFAULT_CAPTURE_COMMAND, DEFAULT_GPIO_VALUE_PATH};
use super::validation::validate_setting;
use crate::bootstrap::data_dir_with;

/// Everything one invocation needs.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub options: RunOptions,
    pub profile: MachineProfile,
    pub ridge_cutoff: f64,
    pub gpio_value_path: PathBuf,
    pub capture_command: String,
    pub data_dir: PathBuf,
    /// Non-fatal problems from every layer, in load order.
    pub warnings: Vec<String>,
}

impl AppConfig {
    /// Load using the process environment.
    pub fn load(options: RunOptions) -> Result<Self, ConfigError> {
        Self::load_with(options, |key| std::env::var(key).ok())
    }

    /// Load with an explicit environment lookup.
    pub fn load_with<F>(options: RunOptions, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut profile = match &options.profile_path {
            Some(path) => load_profile(path)?,
            None => MachineProfile::default(),
        };
        let mut warnings = options.warnings.clone();
        check_profile(&mut profile, &mut warnings);

        // Only values that pass validation are applied.
        let mut valid = |key: &str| -> Option<String> {
            let raw = env(key)?;
            let value = raw.trim().to_string();
            match validate_setting(key, &value) {
                Ok(()) => Some(value),
                Err(reason) => {
                    warnings.push(format!("Ignoring {key}={raw}: {reason}"));
                    None
                }
            }
        };

        if let Some(v) = valid("MARBLE_MAX_X") {
            profile.max_x = parse_f64(&v, profile.max_x);
        }
        if let Some(v) = valid("MARBLE_MAX_Y") {
            profile.max_y = parse_f64(&v, profile.max_y);
        }
        if let Some(v) = valid("MARBLE_BORDER_X") {
            profile.border_x = parse_f64(&v, profile.border_x);
        }
        if let Some(v) = valid("MARBLE_BORDER_Y") {
            profile.border_y = parse_f64(&v, profile.border_y);
        }
        if let Some(v) = valid("MARBLE_FEED_RATE") {
            profile.initial_feed_rate = v.parse().unwrap_or(profile.initial_feed_rate);
        }
        if let Some(v) = valid("MARBLE_DEBUG") {
            profile.debug = v == "true";
        }
        if let Some(v) = valid("MARBLE_Z_POLICY") {
            profile.z_policy = v.parse::<ZPolicy>().unwrap_or(profile.z_policy);
        }
        let ridge_cutoff = valid("MARBLE_RIDGE_CUTOFF")
            .map(|v| parse_f64(&v, DEFAULT_RIDGE_CUTOFF))
            .unwrap_or(DEFAULT_RIDGE_CUTOFF);
        let gpio_value_path = valid("MARBLE_GPIO_VALUE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_GPIO_VALUE_PATH));
        let capture_command = valid("MARBLE_CAPTURE_COMMAND")
            .unwrap_or_else(|| DEFAULT_CAPTURE_COMMAND.to_string());

        warnings.extend(profile.margin_warnings());
        let data_dir = data_dir_with(&env);

        Ok(Self {
            options,
            profile,
            ridge_cutoff,
            gpio_value_path,
            capture_command,
            data_dir,
            warnings,
        })
    }

    /// Directory for captured webcam frames.
    pub fn capture_dir(&self) -> PathBuf {
        self.data_dir.join("captures")
    }
}

/// Read a JSON machine profile. Missing fields keep their defaults.
pub fn load_profile(path: &Path) -> Result<MachineProfile, ConfigError> {
    let profile_err = |reason: String| ConfigError::Profile {
        path: path.display().to_string(),
        reason,
    };
    let text = std::fs::read_to_string(path).map_err(|e| profile_err(e.to_string()))?;
    serde_json::from_str(&text).map_err(|e| profile_err(e.to_string()))
}

/// Apply the environment rules to profile geometry; rejected values fall
/// back to the built-in defaults.
fn check_profile(profile: &mut MachineProfile, warnings: &mut Vec<String>) {
    let defaults = MachineProfile::default();
    let fields = [
        ("MARBLE_MAX_X", "max_x", &mut profile.max_x, defaults.max_x),
        ("MARBLE_MAX_Y", "max_y", &mut profile.max_y, defaults.max_y),
        ("MARBLE_BORDER_X", "border_x", &mut profile.border_x, defaults.border_x),
        ("MARBLE_BORDER_Y", "border_y", &mut profile.border_y, defaults.border_y),
    ];
    for (key, name, value, default) in fields {
        if let Err(reason) = validate_setting(key, &value.to_string()) {
            warnings.push(format!("Ignoring profile {name}={value}: {reason}"));
            *value = default;
        }
    }
}

fn parse_f64(s: &str, default: f64) -> f64 {
    if s.is_empty() {
        return default;
    }
    s.parse().unwrap_or(default)
}
