use crate::error::ConfigError;
use crate::plan::DesignSpec;
use crate::trial::{Adjustment, ForcedChoice, Modality};
use illusio_core::{AdjustmentRecord, Condition, ForcedChoiceRecord};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable naming a JSON file that overrides preset fields.
pub const CONFIG_ENV: &str = "ILLUSIO_CONFIG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentConfig {
    /// Used in output filenames, e.g. `muller_lyer`.
    pub name: String,
    pub fixation_ms: u64,
    pub refresh_hz: u32,
    pub closing_ms: u64,
    pub output_dir: PathBuf,
    /// Fixed seed for the trial order. `None` draws a fresh one.
    pub seed: Option<u64>,
    pub instructions: String,
    pub closing_message: String,
    pub display: DisplayConfig,
    pub design: Design,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub fullscreen: bool,
    pub font_path: Option<PathBuf>,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            title: "Illusio".to_string(),
            width: 1000,
            height: 700,
            fullscreen: false,
            font_path: None,
        }
    }
}

/// Factorial design plus the response modality it is run with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "modality", rename_all = "snake_case")]
pub enum Design {
    Adjustment(AdjustmentDesign),
    ForcedChoice(ForcedChoiceDesign),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjustmentDesign {
    pub angles: Vec<i32>,
    pub repetitions: usize,
    pub reference_length: i32,
    pub start_length: i32,
    pub step_size: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForcedChoiceDesign {
    /// Signed `top - bottom` differences.
    pub length_diffs: Vec<i32>,
    pub repetitions: usize,
    pub base_length: i32,
}

impl Design {
    pub fn spec(&self) -> DesignSpec {
        let (values, repetitions) = match self {
            Design::Adjustment(d) => (&d.angles, d.repetitions),
            Design::ForcedChoice(d) => (&d.length_diffs, d.repetitions),
        };
        DesignSpec {
            values: values.iter().copied().map(Condition).collect(),
            repetitions,
        }
    }

    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            Design::Adjustment(_) => AdjustmentRecord::COLUMNS,
            Design::ForcedChoice(_) => ForcedChoiceRecord::COLUMNS,
        }
    }

    /// Fresh response state for one trial of this design.
    pub fn modality_for(&self, condition: Condition) -> Modality {
        match self {
            Design::Adjustment(d) => Modality::Adjustment(Adjustment::new(condition, d)),
            Design::ForcedChoice(d) => {
                Modality::ForcedChoice(ForcedChoice::new(condition, d.base_length))
            }
        }
    }
}

impl ExperimentConfig {
    pub fn muller_lyer() -> Self {
        Self {
            name: "muller_lyer".to_string(),
            fixation_ms: 500,
            refresh_hz: 60,
            closing_ms: 2000,
            output_dir: PathBuf::from("data"),
            seed: None,
            instructions: "Müller-Lyer Illusion\n\n\
                Make the bottom line as long as the top line.\n\
                LEFT / RIGHT ARROW = shorter / longer\n\
                SPACE = confirm,  ESC = exit\n\n\
                Press SPACE to begin."
                .to_string(),
            closing_message: "Thank you for participating!".to_string(),
            display: DisplayConfig {
                title: "Müller-Lyer Illusion".to_string(),
                ..DisplayConfig::default()
            },
            design: Design::Adjustment(AdjustmentDesign {
                angles: vec![40, 70, 110, 140],
                repetitions: 10,
                reference_length: 300,
                start_length: 300,
                step_size: 10,
            }),
        }
    }

    pub fn ponzo() -> Self {
        Self {
            name: "ponzo".to_string(),
            fixation_ms: 500,
            refresh_hz: 60,
            closing_ms: 2000,
            output_dir: PathBuf::from("data"),
            seed: None,
            instructions: "Ponzo Illusion\n\n\
                Two horizontal lines are shown between converging lines.\n\
                Which line APPEARS longer?\n\n\
                UP ARROW   = top line appears longer\n\
                DOWN ARROW = bottom line appears longer\n\n\
                Press SPACE to begin."
                .to_string(),
            closing_message: "Thank you for your participation!".to_string(),
            display: DisplayConfig {
                title: "Ponzo Illusion".to_string(),
                ..DisplayConfig::default()
            },
            design: Design::ForcedChoice(ForcedChoiceDesign {
                length_diffs: vec![-40, -20, 0, 20, 40],
                repetitions: 10,
                base_length: 260,
            }),
        }
    }

    pub fn fixation(&self) -> Duration {
        Duration::from_millis(self.fixation_ms)
    }

    pub fn closing(&self) -> Duration {
        Duration::from_millis(self.closing_ms)
    }

    /// Starts from `self` and replaces every field present in the JSON text.
    /// Nested objects are merged, arrays and scalars replaced.
    pub fn overlay_json(&self, text: &str, origin: &Path) -> Result<Self, ConfigError> {
        let parse_err = |source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        };
        let overrides: Value = serde_json::from_str(text).map_err(parse_err)?;
        let mut base = serde_json::to_value(self).map_err(parse_err)?;

        // A modality switch replaces the whole design instead of merging into it.
        let switches_modality = matches!(
            (overrides.pointer("/design/modality"), base.pointer("/design/modality")),
            (Some(new), Some(old)) if new != old
        );
        if switches_modality {
            if let Some(obj) = base.as_object_mut() {
                obj.remove("design");
            }
        }

        merge(&mut base, overrides);
        let config: Self = serde_json::from_value(base).map_err(parse_err)?;
        config.validate()?;
        Ok(config)
    }

    pub fn overlay_file(&self, path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        self.overlay_json(&text, path)
    }

    /// The preset, overridden by the file in `ILLUSIO_CONFIG` when set.
    pub fn load(preset: Self) -> Result<Self, ConfigError> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => {
                let path = PathBuf::from(path);
                tracing::info!(path = %path.display(), "loading config overrides");
                preset.overlay_file(&path)
            }
            None => {
                preset.validate()?;
                Ok(preset)
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::Invalid("experiment name is empty".into()));
        }
        if self.refresh_hz == 0 {
            return Err(ConfigError::Invalid("refresh_hz must be positive".into()));
        }
        if self.display.width == 0 || self.display.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "display size {}x{} is empty",
                self.display.width, self.display.height
            )));
        }
        if let Design::Adjustment(d) = &self.design {
            if d.step_size == 0 {
                return Err(ConfigError::Invalid("step_size must be non-zero".into()));
            }
        }
        Ok(())
    }
}

fn merge(base: &mut Value, overrides: Value) {
    match (base, overrides) {
        (Value::Object(base), Value::Object(overrides)) => {
            for (key, value) in overrides {
                match base.get_mut(&key) {
                    Some(slot) => merge(slot, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}
