// Architecture-aware recombination of hard performance metrics

use std::fmt;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::catalog::{UpgradeCatalog, UpgradeCategory, UpgradeItem};
use crate::config::EngineConfig;
use crate::vehicle::{Aspiration, EngineArchitecture, RawSpecs, VehicleProfile};

/// Displacement at or above which a naturally aspirated engine counts as high output.
const NA_HIGH_OUTPUT_LITERS: f64 = 4.0;
/// Displacement at or below which a naturally aspirated engine counts as small.
const NA_SMALL_LITERS: f64 = 2.5;

/// Absolute hp gain for one module on one specific vehicle.
///
/// Replaces the multiplier estimate entirely for that pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricModifier {
    pub vehicle_id: String,
    pub item_key: String,
    pub hp_gain: f64,
}

impl MetricModifier {
    pub fn new(vehicle_id: &str, item_key: &str, hp_gain: f64) -> Self {
        Self {
            vehicle_id: vehicle_id.to_string(),
            item_key: item_key.to_string(),
            hp_gain,
        }
    }
}

/// The four hard metrics tracked through a build. Absent stays absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub power_hp: Option<f64>,
    pub zero_to_sixty_s: Option<f64>,
    pub braking_60_0_ft: Option<f64>,
    pub lateral_g: Option<f64>,
}

impl PerformanceMetrics {
    pub fn stock(specs: &RawSpecs) -> Self {
        Self {
            power_hp: specs.power_hp,
            zero_to_sixty_s: specs.zero_to_sixty_s,
            braking_60_0_ft: specs.braking_60_0_ft,
            lateral_g: specs.lateral_g,
        }
    }
}

/// Engine class used to scale declared hp gains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArchitectureClass {
    NaHighOutput,
    NaMid,
    NaSmall,
    Turbocharged,
    Supercharged,
}

impl ArchitectureClass {
    pub fn classify(architecture: &EngineArchitecture, displacement_l: Option<f64>) -> Self {
        match architecture.effective_aspiration() {
            Aspiration::Turbocharged => ArchitectureClass::Turbocharged,
            Aspiration::Supercharged => ArchitectureClass::Supercharged,
            Aspiration::Natural => {
                if architecture.cylinders.is_large()
                    || displacement_l.is_some_and(|l| l >= NA_HIGH_OUTPUT_LITERS)
                {
                    ArchitectureClass::NaHighOutput
                } else {
                    let small = match displacement_l {
                        Some(liters) => liters <= NA_SMALL_LITERS,
                        None => architecture.cylinders.is_small_displacement(),
                    };
                    if small {
                        ArchitectureClass::NaSmall
                    } else {
                        ArchitectureClass::NaMid
                    }
                }
            }
        }
    }

    pub fn for_vehicle(vehicle: &VehicleProfile) -> Self {
        Self::classify(&vehicle.architecture, vehicle.specs.displacement_l)
    }

    pub fn is_naturally_aspirated(&self) -> bool {
        matches!(
            self,
            ArchitectureClass::NaHighOutput | ArchitectureClass::NaMid | ArchitectureClass::NaSmall
        )
    }

    /// Scale applied to a module's declared hp gain.
    pub fn multiplier(&self, category: UpgradeCategory) -> f64 {
        use ArchitectureClass::*;

        match category {
            // adding boost to an NA engine: big engines gain the most
            UpgradeCategory::ForcedInduction => match self {
                NaHighOutput => 1.25,
                NaMid => 1.10,
                NaSmall => 1.0,
                Turbocharged => 0.6,
                Supercharged => 0.7,
            },
            UpgradeCategory::Power => match self {
                Turbocharged => 1.3,
                Supercharged => 1.15,
                NaSmall => 0.75,
                NaHighOutput | NaMid => 1.0,
            },
            UpgradeCategory::Tune => match self {
                Turbocharged => 1.5,
                Supercharged => 1.2,
                NaHighOutput | NaMid | NaSmall => 0.6,
            },
            UpgradeCategory::Exhaust => match self {
                Turbocharged => 1.1,
                NaSmall => 0.8,
                NaHighOutput | NaMid | Supercharged => 1.0,
            },
            _ => 1.0,
        }
    }
}

impl fmt::Display for ArchitectureClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArchitectureClass::NaHighOutput => write!(f, "NA high output"),
            ArchitectureClass::NaMid => write!(f, "NA mid"),
            ArchitectureClass::NaSmall => write!(f, "NA small"),
            ArchitectureClass::Turbocharged => write!(f, "Turbocharged"),
            ArchitectureClass::Supercharged => write!(f, "Supercharged"),
        }
    }
}

/// Stock and upgraded metrics for one build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpgradedMetrics {
    pub architecture: EngineArchitecture,
    pub architecture_class: ArchitectureClass,
    pub stock: PerformanceMetrics,
    pub upgraded: PerformanceMetrics,
    pub hp_gain: f64,
}

/// Recombines module metric deltas into upgraded hard metrics.
///
/// Power gains are scaled per architecture class unless the catalog holds a
/// modifier for the exact vehicle and module. Explicit 0-60 improvements are
/// amplified by the configured hp-gain steps; gains from modules without one
/// are converted through a power-to-time curve. Braking and grip add linearly.
pub struct MetricRecalculator<'a> {
    catalog: &'a UpgradeCatalog,
    config: &'a EngineConfig,
}

impl<'a> MetricRecalculator<'a> {
    pub fn new(catalog: &'a UpgradeCatalog, config: &'a EngineConfig) -> Self {
        Self { catalog, config }
    }

    /// Effective hp gain of one module on one vehicle.
    pub fn item_hp_gain(
        &self,
        vehicle: &VehicleProfile,
        class: ArchitectureClass,
        item: &UpgradeItem,
    ) -> f64 {
        if let Some(hp_gain) = self.catalog.metric_modifier(&vehicle.id, &item.key) {
            debug!(
                "Using catalog modifier for {} on {}: {} hp",
                item.key, vehicle.id, hp_gain
            );
            return hp_gain;
        }
        item.metric_deltas.hp_gain * class.multiplier(item.category)
    }

    /// `modules` must already be expanded from packages and de-duplicated.
    pub fn recalculate(&self, vehicle: &VehicleProfile, modules: &[&UpgradeItem]) -> UpgradedMetrics {
        let class = ArchitectureClass::for_vehicle(vehicle);
        let stock = PerformanceMetrics::stock(&vehicle.specs);

        let mut hp_gain = 0.0;
        let mut unexplained_hp_gain = 0.0;
        let mut explicit_improvement_s = 0.0;
        let mut braking_improvement_ft = 0.0;
        let mut grip_improvement_g = 0.0;

        for item in modules {
            let gain = self.item_hp_gain(vehicle, class, item);
            hp_gain += gain;
            match item.metric_deltas.zero_to_sixty_improvement_s {
                Some(improvement) => explicit_improvement_s += improvement,
                None => unexplained_hp_gain += gain,
            }
            braking_improvement_ft += item.metric_deltas.braking_improvement_ft;
            grip_improvement_g += item.metric_deltas.grip_improvement_g;
        }

        let zero_to_sixty_s = stock.zero_to_sixty_s.map(|base_t| {
            let amplified = explicit_improvement_s * self.config.amplification_factor(hp_gain);
            let estimated = stock
                .power_hp
                .map(|base_hp| estimated_improvement(base_t, base_hp, unexplained_hp_gain))
                .unwrap_or(0.0);
            floor_at(
                base_t - amplified - estimated,
                self.config.zero_to_sixty_floor_s,
                base_t,
            )
        });

        let braking_60_0_ft = stock.braking_60_0_ft.map(|base_ft| {
            floor_at(
                base_ft - braking_improvement_ft,
                self.config.braking_floor_ft,
                base_ft,
            )
        });

        let lateral_g = stock
            .lateral_g
            .map(|base_g| (base_g + grip_improvement_g).min(self.config.grip_ceiling_g.max(base_g)));

        let upgraded = PerformanceMetrics {
            power_hp: stock.power_hp.map(|hp| hp + hp_gain),
            zero_to_sixty_s,
            braking_60_0_ft,
            lateral_g,
        };

        UpgradedMetrics {
            architecture: vehicle.architecture,
            architecture_class: class,
            stock,
            upgraded,
            hp_gain,
        }
    }
}

/// Seconds saved by a power gain with no declared 0-60 figure, assuming time
/// scales with the inverse square root of power.
fn estimated_improvement(base_t: f64, base_hp: f64, hp_gain: f64) -> f64 {
    if hp_gain == 0.0 || base_hp <= 0.0 {
        return 0.0;
    }
    let ratio = 1.0 + hp_gain / base_hp;
    if ratio <= 0.0 {
        return 0.0;
    }
    base_t * (1.0 - 1.0 / ratio.sqrt())
}

/// Lower bound for a lower-is-better metric. A stock figure already below the
/// floor is kept but not improved upon.
fn floor_at(value: f64, floor: f64, stock: f64) -> f64 {
    value.max(floor.min(stock))
}
