use std::collections::BTreeMap;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::vehicle::VehicleProfile;

pub mod aggregator;
pub use aggregator::DeltaAggregator;

pub const MIN_SCORE: f64 = 1.0;
pub const MAX_SCORE: f64 = 10.0;
/// Score used when nothing at all is known about a category.
pub const DEFAULT_SCORE: f64 = 5.0;

/// The seven capability categories every vehicle and build is scored on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreCategory {
    PowerAccel,
    GripCornering,
    Braking,
    TrackPace,
    Drivability,
    ReliabilityHeat,
    SoundEmotion,
}

impl ScoreCategory {
    pub const ALL: [ScoreCategory; 7] = [
        ScoreCategory::PowerAccel,
        ScoreCategory::GripCornering,
        ScoreCategory::Braking,
        ScoreCategory::TrackPace,
        ScoreCategory::Drivability,
        ScoreCategory::ReliabilityHeat,
        ScoreCategory::SoundEmotion,
    ];
}

impl std::fmt::Display for ScoreCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScoreCategory::PowerAccel => write!(f, "Power & Acceleration"),
            ScoreCategory::GripCornering => write!(f, "Grip & Cornering"),
            ScoreCategory::Braking => write!(f, "Braking"),
            ScoreCategory::TrackPace => write!(f, "Track Pace"),
            ScoreCategory::Drivability => write!(f, "Drivability"),
            ScoreCategory::ReliabilityHeat => write!(f, "Reliability & Heat"),
            ScoreCategory::SoundEmotion => write!(f, "Sound & Emotion"),
        }
    }
}

/// One value per score category.
///
/// Used both for absolute scores (1-10) and for the signed deltas an upgrade
/// contributes, which default to zero when omitted from catalog data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreVector {
    pub power_accel: f64,
    pub grip_cornering: f64,
    pub braking: f64,
    pub track_pace: f64,
    pub drivability: f64,
    pub reliability_heat: f64,
    pub sound_emotion: f64,
}

impl ScoreVector {
    pub fn uniform(value: f64) -> Self {
        let mut vector = Self::default();
        for category in ScoreCategory::ALL {
            vector.set(category, value);
        }
        vector
    }

    pub fn get(&self, category: ScoreCategory) -> f64 {
        match category {
            ScoreCategory::PowerAccel => self.power_accel,
            ScoreCategory::GripCornering => self.grip_cornering,
            ScoreCategory::Braking => self.braking,
            ScoreCategory::TrackPace => self.track_pace,
            ScoreCategory::Drivability => self.drivability,
            ScoreCategory::ReliabilityHeat => self.reliability_heat,
            ScoreCategory::SoundEmotion => self.sound_emotion,
        }
    }

    pub fn set(&mut self, category: ScoreCategory, value: f64) {
        let slot = match category {
            ScoreCategory::PowerAccel => &mut self.power_accel,
            ScoreCategory::GripCornering => &mut self.grip_cornering,
            ScoreCategory::Braking => &mut self.braking,
            ScoreCategory::TrackPace => &mut self.track_pace,
            ScoreCategory::Drivability => &mut self.drivability,
            ScoreCategory::ReliabilityHeat => &mut self.reliability_heat,
            ScoreCategory::SoundEmotion => &mut self.sound_emotion,
        };
        *slot = value;
    }

    pub fn iter(&self) -> impl Iterator<Item = (ScoreCategory, f64)> + '_ {
        ScoreCategory::ALL.into_iter().map(|c| (c, self.get(c)))
    }

    pub fn is_zero(&self) -> bool {
        self.iter().all(|(_, v)| v == 0.0)
    }
}

/// Which rung of the derivation ladder produced a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreSource {
    /// Curated score supplied with the vehicle profile
    Override,
    /// Calibrated formula over a hard metric
    Formula,
    /// Coarse star rating, or the mid-range default
    Fallback,
}

/// Stock scores of a vehicle together with the provenance of each.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineScores {
    pub scores: ScoreVector,
    pub sources: BTreeMap<ScoreCategory, ScoreSource>,
}

impl BaselineScores {
    pub fn source(&self, category: ScoreCategory) -> ScoreSource {
        self.sources
            .get(&category)
            .copied()
            .unwrap_or(ScoreSource::Fallback)
    }
}

pub(crate) fn clamp_score(value: f64) -> f64 {
    value.clamp(MIN_SCORE, MAX_SCORE)
}

fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Converts raw vehicle specs into seven normalized capability scores.
///
/// Each category is resolved through a strict ladder: a curated override on the
/// profile, then a formula over the relevant hard metric, then the coarse star
/// rating (or [`DEFAULT_SCORE`]). The ladder never errors; a missing metric simply
/// drops to the next rung.
pub struct ScoreDerivation;

impl ScoreDerivation {
    pub fn derive(vehicle: &VehicleProfile) -> BaselineScores {
        let mut scores = ScoreVector::default();
        let mut sources = BTreeMap::new();

        for category in ScoreCategory::ALL {
            let (score, source) = Self::derive_category(vehicle, category);
            scores.set(category, score);
            sources.insert(category, source);
        }

        BaselineScores { scores, sources }
    }

    fn derive_category(vehicle: &VehicleProfile, category: ScoreCategory) -> (f64, ScoreSource) {
        if let Some(score) = vehicle.score_overrides.get(&category) {
            return (round_to_tenth(clamp_score(*score)), ScoreSource::Override);
        }

        if let Some(raw) = Self::formula(vehicle, category) {
            return (clamp_score(raw.round()), ScoreSource::Formula);
        }

        debug!(
            "No override or metric for {} on {}, using fallback",
            category, vehicle.id
        );
        let score = vehicle
            .coarse_ratings
            .for_category(category)
            .map(|stars| clamp_score((stars * 2.0).round()))
            .unwrap_or(DEFAULT_SCORE);
        (score, ScoreSource::Fallback)
    }

    /// Unrounded formula output for a category, if its metric is present.
    fn formula(vehicle: &VehicleProfile, category: ScoreCategory) -> Option<f64> {
        let specs = &vehicle.specs;
        match category {
            ScoreCategory::PowerAccel => specs.zero_to_sixty_s.map(|t| 13.0 - t * 1.5),
            ScoreCategory::GripCornering => specs.lateral_g.map(|g| 20.0 * g - 13.0),
            // lower stopping distance is better
            ScoreCategory::Braking => specs.braking_60_0_ft.map(|d| 27.0 - d * 0.2),
            ScoreCategory::TrackPace => {
                let lb_per_hp = specs.curb_weight_lb? / specs.power_hp?;
                Some(13.5 - 0.75 * lb_per_hp)
            }
            ScoreCategory::Drivability => {
                let ratio = specs.torque_lb_ft? / specs.power_hp?;
                Some(10.0 * ratio - 4.0)
            }
            ScoreCategory::ReliabilityHeat => {
                let hp_per_liter = specs.power_hp? / specs.displacement_l?;
                Some(11.0 - hp_per_liter / 20.0)
            }
            ScoreCategory::SoundEmotion => specs.redline_rpm.map(|rpm| rpm / 1000.0 - 1.0),
        }
    }
}
