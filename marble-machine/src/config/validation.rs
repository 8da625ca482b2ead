//! Setting value validation.

use super::defaults::CAPTURE_PATH_PLACEHOLDER;

/// Validate a setting value. Returns `Ok(())` if valid, or an error message.
pub fn validate_setting(key: &str, value: &str) -> Result<(), String> {
    match key {
        "MARBLE_MAX_X" | "MARBLE_MAX_Y" => {
            let v = parse_float(value)?;
            if v <= 0.0 {
                return Err("must be greater than 0".into());
            }
        }
        "MARBLE_BORDER_X" | "MARBLE_BORDER_Y" => {
            let v = parse_float(value)?;
            if v < 0.0 {
                return Err("must not be negative".into());
            }
        }
        "MARBLE_FEED_RATE" => {
            value
                .parse::<u32>()
                .map_err(|_| "must be a non-negative integer")?;
        }
        "MARBLE_DEBUG" => {
            if value != "true" && value != "false" {
                return Err("must be 'true' or 'false'".into());
            }
        }
        "MARBLE_Z_POLICY" => {
            value
                .parse::<gcode_script::ZPolicy>()
                .map_err(|_| "must be 'mirror-y' or 'flat'")?;
        }
        "MARBLE_RIDGE_CUTOFF" => {
            let v = parse_float(value)?;
            if !(v > 0.0 && v <= 1.0) {
                return Err("must be greater than 0.0 and at most 1.0".into());
            }
        }
        "MARBLE_GPIO_VALUE_PATH" => {
            if value.trim().is_empty() {
                return Err("must not be empty".into());
            }
        }
        "MARBLE_CAPTURE_COMMAND" => {
            if value.split_whitespace().next().is_none() {
                return Err("must not be empty".into());
            }
            if !value.contains(CAPTURE_PATH_PLACEHOLDER) {
                return Err(format!("must contain the {CAPTURE_PATH_PLACEHOLDER} placeholder"));
            }
        }
        _ => {}
    }
    Ok(())
}

fn parse_float(value: &str) -> Result<f64, String> {
    let v: f64 = value.parse().map_err(|_| "must be a number")?;
    if !v.is_finite() {
        return Err("must be finite".into());
    }
    Ok(v)
}
