//! Environment setting definitions with their default values.

use std::collections::HashMap;
use std::sync::LazyLock;

pub const DEFAULT_CAPTURE_COMMAND: &str = "fswebcam --no-banner -r 1280x720 {path}";
pub const DEFAULT_GPIO_VALUE_PATH: &str = "/sys/class/gpio/gpio17/value";

/// Placeholder substituted with the capture file path.
pub const CAPTURE_PATH_PLACEHOLDER: &str = "{path}";

type DefTuple = (&'static str, &'static str, &'static str);

const DEFS: &[DefTuple] = &[
    ("MARBLE_MAX_X", "613", "Maximum X travel in machine units"),
    ("MARBLE_MAX_Y", "548", "Maximum Y travel in machine units"),
    ("MARBLE_BORDER_X", "50", "Margin kept clear on both X edges"),
    ("MARBLE_BORDER_Y", "50", "Margin kept clear on both Y edges"),
    ("MARBLE_FEED_RATE", "5000", "Feed rate for the M203 line, 0 to omit it"),
    ("MARBLE_DEBUG", "false", "Pin Z to 0 on every motion line"),
    ("MARBLE_Z_POLICY", "mirror-y", "mirror-y or flat"),
    ("MARBLE_RIDGE_CUTOFF", "0.99", "Normalized distance kept as ridge, in (0, 1]"),
    ("MARBLE_GPIO_VALUE_PATH", DEFAULT_GPIO_VALUE_PATH, "Value file of the trigger button"),
    ("MARBLE_CAPTURE_COMMAND", DEFAULT_CAPTURE_COMMAND, "Webcam capture command, {path} is the output file"),
    ("MARBLE_DATA_DIR", "~/.marble-machine", "Directory for captured frames"),
];

/// A single setting definition.
#[derive(Debug, Clone)]
pub struct SettingDef {
    pub key: &'static str,
    pub default: &'static str,
    pub description: &'static str,
}

/// Setting definitions indexed by key.
pub static DEFAULT_SETTINGS: LazyLock<HashMap<&'static str, SettingDef>> = LazyLock::new(|| {
    DEFS.iter()
        .map(|&(key, default, description)| {
            (
                key,
                SettingDef {
                    key,
                    default,
                    description,
                },
            )
        })
        .collect()
});

/// Get the default value for a setting key, or `None` if not defined.
pub fn get_default(key: &str) -> Option<&'static str> {
    DEFAULT_SETTINGS.get(key).map(|d| d.default)
}

/// Setting keys in declaration order.
pub fn setting_keys() -> impl Iterator<Item = &'static str> {
    DEFS.iter().map(|&(key, _, _)| key)
}

/// Help text listing the environment settings.
pub fn env_help() -> String {
    let mut out = String::from("[ENVIRONMENT]\n");
    for key in setting_keys() {
        if let Some(def) = DEFAULT_SETTINGS.get(key) {
            out.push_str(&format!("{:<24} {} (default {})\n", def.key, def.description, def.default));
        }
    }
    out
}
