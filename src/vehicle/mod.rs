// Vehicle profiles consumed by the build engine

pub mod architecture;
pub mod loader;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub use architecture::{Aspiration, CylinderFamily, EngineArchitecture};
pub use loader::{find_vehicle, load_vehicles};

use crate::errors::TunecraftError;
use crate::scoring::ScoreCategory;

/// Where the engine sits in the chassis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChassisLayout {
    FrontEngine,
    MidEngine,
    RearEngine,
}

impl std::fmt::Display for ChassisLayout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChassisLayout::FrontEngine => write!(f, "Front-Engine"),
            ChassisLayout::MidEngine => write!(f, "Mid-Engine"),
            ChassisLayout::RearEngine => write!(f, "Rear-Engine"),
        }
    }
}

/// Per-vehicle classification that drives cost multipliers.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum PlatformCostTier {
    #[default]
    Mainstream,
    Luxury,
    Premium,
    Exotic,
}

/// Raw physical specs as published for the stock vehicle.
///
/// Every figure is optional; a missing figure sends score derivation to its
/// fallback path and leaves the matching metric absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawSpecs {
    pub power_hp: Option<f64>,
    pub torque_lb_ft: Option<f64>,
    pub curb_weight_lb: Option<f64>,
    pub zero_to_sixty_s: Option<f64>,
    pub braking_60_0_ft: Option<f64>,
    pub lateral_g: Option<f64>,
    pub displacement_l: Option<f64>,
    pub redline_rpm: Option<f64>,
}

/// Legacy 1-5 star ratings used when neither an override nor a hard metric is available.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoarseRatings {
    pub performance: Option<f64>,
    pub track: Option<f64>,
    pub comfort: Option<f64>,
    pub reliability: Option<f64>,
    pub sound: Option<f64>,
}

impl CoarseRatings {
    /// The star rating that stands in for a given score category.
    pub fn for_category(&self, category: ScoreCategory) -> Option<f64> {
        match category {
            ScoreCategory::PowerAccel => self.performance,
            ScoreCategory::GripCornering | ScoreCategory::Braking | ScoreCategory::TrackPace => {
                self.track
            }
            ScoreCategory::Drivability => self.comfort,
            ScoreCategory::ReliabilityHeat => self.reliability,
            ScoreCategory::SoundEmotion => self.sound,
        }
    }
}

/// A base vehicle as handed to the engine by the vehicle data source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleProfile {
    /// Unique slug, e.g. "porsche-718-cayman-gt4"
    pub id: String,
    pub name: String,
    pub brand: String,
    pub layout: ChassisLayout,
    pub architecture: EngineArchitecture,
    /// Explicit platform tier; when absent the tier is derived from the brand
    #[serde(default)]
    pub platform_tier: Option<PlatformCostTier>,
    #[serde(default)]
    pub specs: RawSpecs,
    /// Curated scores that always win over derived ones
    #[serde(default)]
    pub score_overrides: BTreeMap<ScoreCategory, f64>,
    #[serde(default)]
    pub coarse_ratings: CoarseRatings,
}

impl VehicleProfile {
    pub fn new(
        id: &str,
        name: &str,
        brand: &str,
        layout: ChassisLayout,
        architecture: EngineArchitecture,
    ) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            brand: brand.to_string(),
            layout,
            architecture,
            platform_tier: None,
            specs: RawSpecs::default(),
            score_overrides: BTreeMap::new(),
            coarse_ratings: CoarseRatings::default(),
        }
    }

    pub fn with_specs(mut self, specs: RawSpecs) -> Self {
        self.specs = specs;
        self
    }

    pub fn with_platform_tier(mut self, tier: PlatformCostTier) -> Self {
        self.platform_tier = Some(tier);
        self
    }

    pub fn with_override(mut self, category: ScoreCategory, score: f64) -> Self {
        self.score_overrides.insert(category, score);
        self
    }

    pub fn with_coarse_ratings(mut self, ratings: CoarseRatings) -> Self {
        self.coarse_ratings = ratings;
        self
    }

    /// Check the shape of the profile before any metric math runs on it.
    pub fn validate(&self) -> Result<(), TunecraftError> {
        if self.id.trim().is_empty() {
            return Err(TunecraftError::InvalidVehicle {
                field: "id".to_string(),
                reason: "vehicle id cannot be empty".to_string(),
            });
        }
        if self.brand.trim().is_empty() {
            return Err(TunecraftError::InvalidVehicle {
                field: "brand".to_string(),
                reason: "brand cannot be empty".to_string(),
            });
        }

        let specs = [
            ("power_hp", self.specs.power_hp),
            ("torque_lb_ft", self.specs.torque_lb_ft),
            ("curb_weight_lb", self.specs.curb_weight_lb),
            ("zero_to_sixty_s", self.specs.zero_to_sixty_s),
            ("braking_60_0_ft", self.specs.braking_60_0_ft),
            ("lateral_g", self.specs.lateral_g),
            ("displacement_l", self.specs.displacement_l),
            ("redline_rpm", self.specs.redline_rpm),
        ];
        for (field, value) in specs {
            if let Some(value) = value
                && (!value.is_finite() || value <= 0.0)
            {
                return Err(TunecraftError::InvalidVehicle {
                    field: field.to_string(),
                    reason: format!("must be a positive finite number, got {value}"),
                });
            }
        }

        for (category, score) in &self.score_overrides {
            if !score.is_finite() {
                return Err(TunecraftError::InvalidVehicle {
                    field: format!("score_overrides.{category}"),
                    reason: "override score must be finite".to_string(),
                });
            }
        }

        let ratings = [
            self.coarse_ratings.performance,
            self.coarse_ratings.track,
            self.coarse_ratings.comfort,
            self.coarse_ratings.reliability,
            self.coarse_ratings.sound,
        ];
        if ratings.iter().flatten().any(|r| !r.is_finite()) {
            return Err(TunecraftError::InvalidVehicle {
                field: "coarse_ratings".to_string(),
                reason: "ratings must be finite".to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gt4() -> VehicleProfile {
        VehicleProfile::new(
            "718-cayman-gt4",
            "718 Cayman GT4",
            "Porsche",
            ChassisLayout::MidEngine,
            EngineArchitecture::new(Aspiration::Natural, CylinderFamily::Flat6),
        )
    }

    #[test]
    fn test_valid_profile_passes() {
        let vehicle = gt4().with_specs(RawSpecs {
            power_hp: Some(414.0),
            zero_to_sixty_s: Some(3.8),
            ..Default::default()
        });
        assert!(vehicle.validate().is_ok());
    }

    #[test]
    fn test_empty_id_rejected() {
        let mut vehicle = gt4();
        vehicle.id = "  ".to_string();
        assert!(matches!(
            vehicle.validate(),
            Err(TunecraftError::InvalidVehicle { field, .. }) if field == "id"
        ));
    }

    #[test]
    fn test_non_positive_spec_rejected() {
        let vehicle = gt4().with_specs(RawSpecs {
            braking_60_0_ft: Some(-10.0),
            ..Default::default()
        });
        assert!(matches!(
            vehicle.validate(),
            Err(TunecraftError::InvalidVehicle { field, .. }) if field == "braking_60_0_ft"
        ));

        let vehicle = gt4().with_specs(RawSpecs {
            lateral_g: Some(f64::NAN),
            ..Default::default()
        });
        assert!(vehicle.validate().is_err());
    }

    #[test]
    fn test_profile_deserializes_with_defaults() {
        let json = r#"{
            "id": "mustang-gt",
            "name": "Mustang GT",
            "brand": "Ford",
            "layout": "front_engine",
            "architecture": "v8"
        }"#;
        let vehicle: VehicleProfile = serde_json::from_str(json).unwrap();
        assert_eq!(vehicle.architecture, EngineArchitecture::family(CylinderFamily::V8));
        assert_eq!(vehicle.platform_tier, None);
        assert!(vehicle.score_overrides.is_empty());
        assert_eq!(vehicle.specs, RawSpecs::default());
    }
}
