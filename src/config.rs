use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::TunecraftError;

pub(crate) const APP_DIR_NAME: &str = "tunecraft";
const CONFIG_FILE_NAME: &str = "engine.json";

/// Default plausibility bounds for recalculated metrics.
pub const ZERO_TO_SIXTY_FLOOR_S: f64 = 2.0;
pub const BRAKING_FLOOR_FT: f64 = 70.0;
pub const GRIP_CEILING_G: f64 = 1.6;

/// Once cumulative hp gain exceeds `min_hp_gain`, explicit 0-60 improvements
/// are multiplied by `factor`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AmplificationStep {
    pub min_hp_gain: f64,
    pub factor: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    pub zero_to_sixty_floor_s: f64,
    pub braking_floor_ft: f64,
    pub grip_ceiling_g: f64,
    pub amplification_steps: Vec<AmplificationStep>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            zero_to_sixty_floor_s: ZERO_TO_SIXTY_FLOOR_S,
            braking_floor_ft: BRAKING_FLOOR_FT,
            grip_ceiling_g: GRIP_CEILING_G,
            amplification_steps: vec![
                AmplificationStep {
                    min_hp_gain: 100.0,
                    factor: 1.15,
                },
                AmplificationStep {
                    min_hp_gain: 200.0,
                    factor: 1.3,
                },
            ],
        }
    }
}

impl EngineConfig {
    pub fn default_path() -> Result<PathBuf, TunecraftError> {
        Ok(dirs::config_dir()
            .ok_or(TunecraftError::NoConfigDir)?
            .join(APP_DIR_NAME)
            .join(CONFIG_FILE_NAME))
    }

    /// Load the config from the user's config directory, if one was saved there.
    pub fn from_local_file() -> Result<Option<Self>, TunecraftError> {
        let Some(config_dir) = dirs::config_dir() else {
            return Ok(None);
        };
        let config_path = config_dir.join(APP_DIR_NAME).join(CONFIG_FILE_NAME);
        if config_path.exists() {
            Self::from_path(&config_path).map(Some)
        } else {
            debug!("No engine config at {:?}, using defaults", config_path);
            Ok(None)
        }
    }

    pub fn from_path(path: &Path) -> Result<Self, TunecraftError> {
        let file =
            std::fs::File::open(path).map_err(|e| TunecraftError::ConfigIOError { source: e })?;
        let config: EngineConfig = serde_json::from_reader(file)
            .map_err(|e| TunecraftError::ConfigSerializeError { source: e })?;
        config.validate()?;
        info!("Loaded engine config from {:?}", path);
        Ok(config.sorted())
    }

    pub fn save(&self) -> Result<(), TunecraftError> {
        self.save_to(&Self::default_path()?)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<(), TunecraftError> {
        if let Some(parent) = config_path.parent()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent)
                .map_err(|e| TunecraftError::ConfigIOError { source: e })?;
        }

        let file = std::fs::File::create(config_path)
            .map_err(|e| TunecraftError::ConfigIOError { source: e })?;
        serde_json::to_writer_pretty(file, self)
            .map_err(|e| TunecraftError::ConfigSerializeError { source: e })
    }

    pub fn validate(&self) -> Result<(), TunecraftError> {
        let bounds = [
            ("zero_to_sixty_floor_s", self.zero_to_sixty_floor_s),
            ("braking_floor_ft", self.braking_floor_ft),
            ("grip_ceiling_g", self.grip_ceiling_g),
        ];
        for (name, value) in bounds {
            if !value.is_finite() || value <= 0.0 {
                return Err(TunecraftError::InvalidConfig {
                    reason: format!("{name} must be a positive number, got {value}"),
                });
            }
        }
        for step in &self.amplification_steps {
            if !step.min_hp_gain.is_finite() || !step.factor.is_finite() || step.factor <= 0.0 {
                return Err(TunecraftError::InvalidConfig {
                    reason: format!(
                        "amplification step at {} hp has an invalid factor {}",
                        step.min_hp_gain, step.factor
                    ),
                });
            }
        }
        Ok(())
    }

    fn sorted(mut self) -> Self {
        self.amplification_steps
            .sort_by(|a, b| a.min_hp_gain.total_cmp(&b.min_hp_gain));
        self
    }

    /// Factor applied to explicit 0-60 improvements for a cumulative hp gain:
    /// the factor of the highest threshold strictly exceeded, or 1.0.
    pub fn amplification_factor(&self, total_hp_gain: f64) -> f64 {
        self.amplification_steps
            .iter()
            .filter(|step| total_hp_gain > step.min_hp_gain)
            .max_by(|a, b| a.min_hp_gain.total_cmp(&b.min_hp_gain))
            .map(|step| step.factor)
            .unwrap_or(1.0)
    }
}
