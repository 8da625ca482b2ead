//! Command-line options in `key=value` form.
//!
//! Tokens may carry a leading `--`. A bare `key` is the same as `key=true`.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use path_extract::ExtractorKind;

use super::ConfigError;

/// Raw options by key. Later duplicates win.
pub type ArgMap = BTreeMap<String, String>;

const KNOWN_KEYS: &[&str] = &[
    "input",
    "output",
    "bed_shake",
    "mode",
    "repeat",
    "trigger",
    "log_file",
    "profile",
    "help",
];

pub const USAGE: &str = "\
=== MarbleMachine HELP ===
Converts a black-on-white drawing, from an image file or a webcam, into
line-oriented G-code for an etch-a-sketch style plotter.
The drawing should be dark ink on a light background, ideally square.

[OPTIONS]
input=PATH         Input image. If omitted, a frame is captured from the webcam.
output=PATH        Output G-code file. Required.
bed_shake=BOOL     Prepend a 25-line bed agitation burst (default false).
mode=MODE          contour | ridge | centroid (default centroid).
repeat=BOOL        Keep running, waiting for a trigger between captures.
trigger=KIND       manual (ENTER key) | gpio (button on a GPIO value file).
log_file=PATH      Also append logs to this file.
profile=PATH       JSON machine profile overriding the built-in geometry.
help               Displays this help message.
=== END MarbleMachine HELP ===";

/// What starts the next capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TriggerKind {
    /// Operator presses ENTER.
    #[default]
    Manual,
    /// Falling edge on a GPIO value file.
    Gpio,
}

impl fmt::Display for TriggerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Manual => f.write_str("manual"),
            Self::Gpio => f.write_str("gpio"),
        }
    }
}

impl FromStr for TriggerKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "manual" | "enter" | "keyboard" => Ok(Self::Manual),
            "gpio" | "button" => Ok(Self::Gpio),
            other => Err(ConfigError::InvalidValue {
                key: "trigger".into(),
                reason: format!("`{other}` is not manual or gpio"),
            }),
        }
    }
}

/// Options for one invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOptions {
    /// `None` captures from the webcam.
    pub input: Option<PathBuf>,
    pub output: PathBuf,
    pub bed_shake: bool,
    pub extractor: ExtractorKind,
    pub repeat: bool,
    pub trigger: TriggerKind,
    pub log_file: Option<PathBuf>,
    pub profile_path: Option<PathBuf>,
    /// Non-fatal problems found while parsing, logged once tracing is up.
    pub warnings: Vec<String>,
}

impl RunOptions {
    /// Options for a single file-to-file run with defaults elsewhere.
    pub fn new(input: Option<PathBuf>, output: PathBuf) -> Self {
        Self {
            input,
            output,
            bed_shake: false,
            extractor: ExtractorKind::default(),
            repeat: false,
            trigger: TriggerKind::default(),
            log_file: None,
            profile_path: None,
            warnings: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ArgsOutcome {
    Help,
    Run(RunOptions),
}

/// Split raw tokens into an [`ArgMap`].
pub fn split_args<I, S>(args: I) -> ArgMap
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut map = ArgMap::new();
    for raw in args {
        let token = raw.as_ref().trim();
        let token = token.strip_prefix("--").unwrap_or(token);
        if token.is_empty() {
            continue;
        }
        match token.split_once('=') {
            Some((key, value)) => map.insert(key.trim().to_string(), value.to_string()),
            None => map.insert(token.to_string(), "true".to_string()),
        };
    }
    map
}

/// Parse command-line tokens (without the program name).
pub fn parse_args<I, S>(args: I) -> Result<ArgsOutcome, ConfigError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let map = split_args(args);
    if map.contains_key("help") {
        return Ok(ArgsOutcome::Help);
    }

    let mut warnings: Vec<String> = map
        .keys()
        .filter(|k| !KNOWN_KEYS.contains(&k.as_str()))
        .map(|k| format!("Unrecognized option `{k}` ignored"))
        .collect();

    let output = path_value(&map, "output").ok_or(ConfigError::MissingOutput)?;
    let input = path_value(&map, "input");
    let bed_shake = flag_value(&map, "bed_shake", &mut warnings);
    let repeat = flag_value(&map, "repeat", &mut warnings);

    let extractor = match map.get("mode") {
        Some(raw) => raw
            .parse::<ExtractorKind>()
            .map_err(|e| ConfigError::InvalidValue {
                key: "mode".into(),
                reason: e.to_string(),
            })?,
        None => ExtractorKind::default(),
    };
    let trigger = match map.get("trigger") {
        Some(raw) => raw.parse::<TriggerKind>()?,
        None => TriggerKind::default(),
    };

    Ok(ArgsOutcome::Run(RunOptions {
        input,
        output,
        bed_shake,
        extractor,
        repeat,
        trigger,
        log_file: path_value(&map, "log_file"),
        profile_path: path_value(&map, "profile"),
        warnings,
    }))
}

fn path_value(map: &ArgMap, key: &str) -> Option<PathBuf> {
    map.get(key)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

/// Lenient boolean: any value containing `true` is true, containing `false`
/// is false, anything else falls back to false with a warning.
fn flag_value(map: &ArgMap, key: &str, warnings: &mut Vec<String>) -> bool {
    let Some(raw) = map.get(key) else {
        return false;
    };
    let lower = raw.to_ascii_lowercase();
    if lower.contains("true") {
        true
    } else if lower.contains("false") {
        false
    } else {
        warnings.push(format!("Invalid {key} value `{raw}`. Assuming false."));
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_options(args: &[&str]) -> RunOptions {
        match parse_args(args).unwrap() {
            ArgsOutcome::Run(opts) => opts,
            ArgsOutcome::Help => panic!("unexpected help"),
        }
    }

    #[test]
    fn test_split_args_forms() {
        let map = split_args(["--input=a.png", "output=b.gcode", "help", "profile=x=y"]);
        assert_eq!(map["input"], "a.png");
        assert_eq!(map["output"], "b.gcode");
        assert_eq!(map["help"], "true");
        assert_eq!(map["profile"], "x=y");
    }

    #[test]
    fn test_help_short_circuits() {
        assert_eq!(parse_args(["help"]).unwrap(), ArgsOutcome::Help);
        // No output given, but help still wins.
        assert_eq!(parse_args(["--help", "bed_shake=maybe"]).unwrap(), ArgsOutcome::Help);
    }

    #[test]
    fn test_missing_output_is_error() {
        let err = parse_args(["input=drawing.png"]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingOutput));
        assert!(matches!(parse_args(["output="]).unwrap_err(), ConfigError::MissingOutput));
    }

    #[test]
    fn test_defaults() {
        let opts = run_options(&["output=out.gcode"]);
        assert_eq!(opts, RunOptions::new(None, PathBuf::from("out.gcode")));
        assert_eq!(opts.extractor, ExtractorKind::Centroid);
        assert_eq!(opts.trigger, TriggerKind::Manual);
    }

    #[test]
    fn test_empty_input_means_camera() {
        let opts = run_options(&["input=", "output=out.gcode"]);
        assert_eq!(opts.input, None);
    }

    #[test]
    fn test_bed_shake_lenient_parsing() {
        assert!(run_options(&["output=o", "bed_shake=TRUE"]).bed_shake);
        assert!(run_options(&["output=o", "bed_shake"]).bed_shake);
        assert!(!run_options(&["output=o", "bed_shake=False"]).bed_shake);

        let opts = run_options(&["output=o", "bed_shake=yes"]);
        assert!(!opts.bed_shake);
        assert_eq!(opts.warnings.len(), 1);
        assert!(opts.warnings[0].contains("bed_shake"));
    }

    #[test]
    fn test_full_option_set() {
        let opts = run_options(&[
            "input=drawing.png",
            "output=out.gcode",
            "mode=contour",
            "repeat=true",
            "trigger=gpio",
            "log_file=run.log",
            "profile=machine.json",
        ]);
        assert_eq!(opts.input, Some(PathBuf::from("drawing.png")));
        assert_eq!(opts.extractor, ExtractorKind::Contour);
        assert!(opts.repeat);
        assert_eq!(opts.trigger, TriggerKind::Gpio);
        assert_eq!(opts.log_file, Some(PathBuf::from("run.log")));
        assert_eq!(opts.profile_path, Some(PathBuf::from("machine.json")));
        assert!(opts.warnings.is_empty());
    }

    #[test]
    fn test_invalid_mode_and_trigger() {
        assert!(matches!(
            parse_args(["output=o", "mode=spiral"]).unwrap_err(),
            ConfigError::InvalidValue { .. }
        ));
        assert!(matches!(
            parse_args(["output=o", "trigger=pedal"]).unwrap_err(),
            ConfigError::InvalidValue { .. }
        ));
    }

    #[test]
    fn test_unknown_key_warns() {
        let opts = run_options(&["output=o", "speed=fast"]);
        assert_eq!(opts.warnings, vec!["Unrecognized option `speed` ignored".to_string()]);
    }
}
