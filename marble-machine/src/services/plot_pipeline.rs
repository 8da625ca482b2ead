//! Canvas-to-script pipeline.
//!
//! Extraction, ordering, mapping and emission are pure; only
//! [`write_script`] touches the filesystem.

use std::io::Write;
use std::path::{Path, PathBuf};

use gcode_script::{CommandEmitter, CoordinateMapper, DeviceCommand, MachineProfile, ScriptSummary, render};
use path_extract::extract::DEFAULT_RIDGE_CUTOFF;
use path_extract::{Canvas, ExtractorKind, OrderPolicy, order_features};

use crate::RunError;
use crate::config::AppConfig;

/// Inputs to one canvas-to-script conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotSettings {
    pub extractor: ExtractorKind,
    pub ridge_cutoff: f64,
    pub profile: MachineProfile,
    pub bed_shake: bool,
}

impl Default for PlotSettings {
    fn default() -> Self {
        Self {
            extractor: ExtractorKind::default(),
            ridge_cutoff: DEFAULT_RIDGE_CUTOFF,
            profile: MachineProfile::default(),
            bed_shake: false,
        }
    }
}

impl PlotSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            extractor: config.options.extractor,
            ridge_cutoff: config.ridge_cutoff,
            profile: config.profile.clone(),
            bed_shake: config.options.bed_shake,
        }
    }
}

/// An assembled script, ready to write.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotScript {
    pub commands: Vec<DeviceCommand>,
    pub feature_count: usize,
}

impl PlotScript {
    pub fn render(&self) -> String {
        render(&self.commands)
    }

    pub fn summary(&self) -> ScriptSummary {
        ScriptSummary::from_commands(&self.commands)
    }
}

/// Extract, order, map and emit.
pub fn process_canvas(canvas: &Canvas, settings: &PlotSettings) -> PlotScript {
    let extractor = settings.extractor.build(settings.ridge_cutoff);
    let features = extractor.extract(canvas);
    let feature_count = features.len();
    let ordered = order_features(features, &OrderPolicy::for_extractor(settings.extractor));

    let mapper = CoordinateMapper::new(&settings.profile);
    let points = ordered
        .iter()
        .flat_map(|f| f.anchor_points())
        .map(|(x, y)| mapper.map_point(x, y));
    let commands = CommandEmitter::new(&settings.profile, settings.bed_shake).emit(points);

    tracing::debug!(
        extractor = extractor.name(),
        features = feature_count,
        commands = commands.len(),
        "Processed canvas"
    );
    PlotScript {
        commands,
        feature_count,
    }
}

/// Replace `path` with `text`.
///
/// The text goes to a sibling temp file first and is renamed into place, so
/// readers never see a partial script.
pub fn write_script(path: &Path, text: &str) -> Result<(), RunError> {
    let output_err = |source| RunError::Output {
        path: path.to_path_buf(),
        source,
    };
    let tmp = temp_sibling(path);
    let result = std::fs::File::create(&tmp)
        .and_then(|mut file| {
            file.write_all(text.as_bytes())?;
            file.sync_all()
        })
        .and_then(|()| std::fs::rename(&tmp, path));
    if let Err(e) = result {
        let _ = std::fs::remove_file(&tmp);
        return Err(output_err(e));
    }
    Ok(())
}

fn temp_sibling(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "script".into());
    path.with_file_name(format!(".{name}.tmp"))
}
