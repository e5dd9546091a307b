// Reference catalog shipped with the crate

use std::collections::BTreeMap;

use super::{CatalogDocument, MetricDeltas, UpgradeCategory, UpgradeItem, UpgradeTier};
use crate::cost::{CostRange, CostTierTable};
use crate::metrics::MetricModifier;
use crate::scoring::ScoreCategory::*;
use crate::vehicle::{Aspiration, ChassisLayout, CylinderFamily, EngineArchitecture, PlatformCostTier};

pub const CATALOG_VERSION: u32 = 3;

fn cost(low: u64, high: u64) -> CostRange {
    CostRange::new(low, high)
}

fn na(cylinders: CylinderFamily) -> EngineArchitecture {
    EngineArchitecture::new(Aspiration::Natural, cylinders)
}

fn turbo(cylinders: CylinderFamily) -> EngineArchitecture {
    EngineArchitecture::new(Aspiration::Turbocharged, cylinders)
}

fn supercharged(cylinders: CylinderFamily) -> EngineArchitecture {
    EngineArchitecture::new(Aspiration::Supercharged, cylinders)
}

fn metrics(
    hp_gain: f64,
    zero_to_sixty: Option<f64>,
    braking_ft: f64,
    grip_g: f64,
) -> MetricDeltas {
    MetricDeltas {
        hp_gain,
        zero_to_sixty_improvement_s: zero_to_sixty,
        braking_improvement_ft: braking_ft,
        grip_improvement_g: grip_g,
    }
}

pub fn document() -> CatalogDocument {
    CatalogDocument {
        version: CATALOG_VERSION,
        items: items(),
        cost_table: cost_table(),
        metric_modifiers: metric_modifiers(),
    }
}

fn items() -> Vec<UpgradeItem> {
    use CylinderFamily::*;
    use UpgradeCategory as C;
    use UpgradeTier as T;

    let turbo_engines = [turbo(I4), turbo(I6), turbo(V6), turbo(V8), turbo(Flat6)];
    let supercharged_engines = [supercharged(V6), supercharged(V8)];

    vec![
        // Power
        UpgradeItem::module("cold-air-intake", "Cold Air Intake", C::Power, T::Street, cost(300, 600))
            .in_conflict_group("intake")
            .with_hp_gain(10.0)
            .with_score_deltas(&[(PowerAccel, 0.5), (SoundEmotion, 0.5)]),
        UpgradeItem::module("high-flow-intake", "High-Flow Carbon Intake", C::Power, T::Track, cost(600, 1200))
            .in_conflict_group("intake")
            .with_hp_gain(18.0)
            .with_score_deltas(&[(PowerAccel, 0.75), (SoundEmotion, 1.0)]),
        UpgradeItem::module("headers", "Long-Tube Headers", C::Power, T::Track, cost(1200, 2500))
            .for_architectures(&[na(I4), na(I6), na(V6), na(V8), na(V10), na(Flat6)])
            .with_hp_gain(25.0)
            .with_score_deltas(&[(PowerAccel, 1.0), (SoundEmotion, 1.0), (ReliabilityHeat, -0.5)]),
        UpgradeItem::module("supercharger-pulley-small", "Smaller Supercharger Pulley", C::Power, T::Attack, cost(400, 800))
            .for_architectures(&supercharged_engines)
            .in_conflict_group("supercharger-pulley")
            .with_hp_gain(50.0)
            .with_score_deltas(&[(PowerAccel, 1.0), (ReliabilityHeat, -0.5)]),
        UpgradeItem::module("supercharger-pulley-race", "Race Supercharger Pulley", C::Power, T::Ultimate, cost(700, 1300))
            .for_architectures(&supercharged_engines)
            .in_conflict_group("supercharger-pulley")
            .with_hp_gain(80.0)
            .with_score_deltas(&[(PowerAccel, 1.5), (ReliabilityHeat, -1.0), (Drivability, -0.5)]),
        // Forced induction
        UpgradeItem::module("supercharger-kit", "Centrifugal Supercharger Kit", C::ForcedInduction, T::Ultimate, cost(7000, 10000))
            .for_architectures(&[na(V6), na(V8), na(I6)])
            .in_conflict_group("forced-induction")
            .with_metric_deltas(metrics(180.0, Some(0.5), 0.0, 0.0))
            .with_score_deltas(&[(PowerAccel, 3.0), (Drivability, -0.5), (ReliabilityHeat, -1.5), (SoundEmotion, 0.5)]),
        UpgradeItem::module("turbo-kit", "Single Turbo Kit", C::ForcedInduction, T::Ultimate, cost(9000, 15000))
            .for_architectures(&[na(I4), na(I6), na(Flat6), na(V8)])
            .in_conflict_group("forced-induction")
            .with_hp_gain(220.0)
            .with_score_deltas(&[(PowerAccel, 3.5), (Drivability, -1.0), (ReliabilityHeat, -2.0)]),
        UpgradeItem::module("big-turbo-upgrade", "Big Turbo Upgrade", C::ForcedInduction, T::Attack, cost(4000, 7000))
            .for_architectures(&turbo_engines)
            .in_conflict_group("forced-induction")
            .with_hp_gain(120.0)
            .with_score_deltas(&[(PowerAccel, 2.5), (Drivability, -1.0), (ReliabilityHeat, -1.0)]),
        // Tune
        UpgradeItem::module("ecu-tune-stage1", "ECU Tune Stage 1", C::Tune, T::Street, cost(500, 900))
            .in_conflict_group("ecu-tune")
            .with_hp_gain(40.0)
            .with_score_deltas(&[(PowerAccel, 1.0), (Drivability, 0.25)]),
        UpgradeItem::module("ecu-tune-stage2", "ECU Tune Stage 2", C::Tune, T::Track, cost(900, 1800))
            .in_conflict_group("ecu-tune")
            .with_hp_gain(80.0)
            .with_score_deltas(&[(PowerAccel, 1.5), (ReliabilityHeat, -1.0)]),
        // Exhaust
        UpgradeItem::module("cat-back-exhaust", "Cat-Back Exhaust", C::Exhaust, T::Street, cost(800, 2000))
            .in_conflict_group("exhaust")
            .with_hp_gain(8.0)
            .with_score_deltas(&[(SoundEmotion, 1.5)]),
        UpgradeItem::module("valved-exhaust", "Valved Titanium Exhaust", C::Exhaust, T::Track, cost(2500, 5000))
            .in_conflict_group("exhaust")
            .with_hp_gain(12.0)
            .with_score_deltas(&[(SoundEmotion, 2.0), (Drivability, 0.5)]),
        UpgradeItem::module("downpipe", "High-Flow Downpipe", C::Exhaust, T::Track, cost(600, 1400))
            .for_architectures(&turbo_engines)
            .with_hp_gain(30.0)
            .with_score_deltas(&[(PowerAccel, 1.0), (SoundEmotion, 0.5), (ReliabilityHeat, -0.5)]),
        // Cooling
        UpgradeItem::module("oil-cooler", "Oil Cooler", C::Cooling, T::Street, cost(600, 1200))
            .with_score_deltas(&[(ReliabilityHeat, 1.5)]),
        UpgradeItem::module("track-radiator", "Track Radiator", C::Cooling, T::Track, cost(800, 1500))
            .with_score_deltas(&[(ReliabilityHeat, 1.0), (TrackPace, 0.5)]),
        UpgradeItem::module("intercooler-upgrade", "Front-Mount Intercooler", C::Cooling, T::Track, cost(700, 1400))
            .for_architectures(&turbo_engines)
            .with_hp_gain(10.0)
            .with_score_deltas(&[(ReliabilityHeat, 1.0), (PowerAccel, 0.25)]),
        // Chassis
        UpgradeItem::module("lowering-springs", "Lowering Springs", C::Chassis, T::Street, cost(300, 700))
            .in_conflict_group("suspension")
            .with_metric_deltas(metrics(0.0, None, 0.0, 0.02))
            .with_score_deltas(&[(GripCornering, 0.5), (Drivability, -0.5)]),
        UpgradeItem::module("coilovers", "Adjustable Coilovers", C::Chassis, T::Track, cost(1500, 3500))
            .in_conflict_group("suspension")
            .with_metric_deltas(metrics(0.0, None, 0.0, 0.05))
            .with_score_deltas(&[(GripCornering, 1.5), (TrackPace, 1.0), (Drivability, -1.0)]),
        UpgradeItem::module("adjustable-sway-bars", "Adjustable Sway Bars", C::Chassis, T::Track, cost(500, 1000))
            .with_metric_deltas(metrics(0.0, None, 0.0, 0.02))
            .with_score_deltas(&[(GripCornering, 0.5)]),
        // Brakes
        UpgradeItem::module("performance-pads", "Performance Brake Pads", C::Brakes, T::Street, cost(200, 450))
            .in_conflict_group("brake-pads")
            .with_metric_deltas(metrics(0.0, None, 4.0, 0.0))
            .with_score_deltas(&[(Braking, 0.5)]),
        UpgradeItem::module("track-pads", "Track Brake Pads", C::Brakes, T::Track, cost(350, 700))
            .in_conflict_group("brake-pads")
            .with_metric_deltas(metrics(0.0, None, 6.0, 0.0))
            .with_score_deltas(&[(Braking, 1.0), (Drivability, -0.5)]),
        UpgradeItem::module("stainless-brake-lines", "Stainless Brake Lines", C::Brakes, T::Street, cost(100, 250))
            .with_metric_deltas(metrics(0.0, None, 2.0, 0.0))
            .with_score_deltas(&[(Braking, 0.5)]),
        UpgradeItem::module("big-brake-kit", "Big Brake Kit", C::Brakes, T::Attack, cost(3000, 7000))
            .in_conflict_group("brake-calipers")
            .with_metric_deltas(metrics(0.0, None, 12.0, 0.0))
            .with_score_deltas(&[(Braking, 2.0), (TrackPace, 0.5)]),
        UpgradeItem::module("carbon-ceramic-brakes", "Carbon Ceramic Brakes", C::Brakes, T::Ultimate, cost(9000, 16000))
            .in_conflict_group("brake-calipers")
            .with_metric_deltas(metrics(0.0, None, 15.0, 0.0))
            .with_score_deltas(&[(Braking, 2.5), (TrackPace, 0.5), (ReliabilityHeat, 0.5)]),
        // Wheels and tires
        UpgradeItem::module("lightweight-wheels", "Forged Lightweight Wheels", C::Wheels, T::Track, cost(1800, 4000))
            .with_metric_deltas(metrics(0.0, Some(0.05), 0.0, 0.01))
            .with_score_deltas(&[(GripCornering, 0.5), (PowerAccel, 0.25)]),
        UpgradeItem::module("summer-performance-tires", "Summer Performance Tires", C::Tires, T::Street, cost(1000, 1800))
            .in_conflict_group("tires")
            .with_metric_deltas(metrics(0.0, None, 5.0, 0.05))
            .with_score_deltas(&[(GripCornering, 1.0), (Braking, 0.5)]),
        UpgradeItem::module("r-compound-tires", "R-Compound Track Tires", C::Tires, T::Attack, cost(1600, 2800))
            .in_conflict_group("tires")
            .with_metric_deltas(metrics(0.0, None, 9.0, 0.12))
            .with_score_deltas(&[(GripCornering, 2.0), (Braking, 1.0), (Drivability, -1.5)]),
        // Aero
        UpgradeItem::module("front-splitter", "Front Splitter", C::Aero, T::Track, cost(500, 1500))
            .with_metric_deltas(metrics(0.0, None, 0.0, 0.02))
            .with_score_deltas(&[(GripCornering, 0.5)]),
        UpgradeItem::module("gt-wing", "GT Wing", C::Aero, T::Attack, cost(1500, 4000))
            .in_conflict_group("rear-aero")
            // extra drag costs a little straight-line acceleration
            .with_metric_deltas(metrics(0.0, Some(-0.05), 0.0, 0.06))
            .with_score_deltas(&[(GripCornering, 1.0), (TrackPace, 1.0), (Drivability, -0.5)]),
        UpgradeItem::module("ducktail-spoiler", "Ducktail Spoiler", C::Aero, T::Street, cost(400, 900))
            .in_conflict_group("rear-aero")
            .with_metric_deltas(metrics(0.0, None, 0.0, 0.01))
            .with_score_deltas(&[(GripCornering, 0.25), (SoundEmotion, 0.25)]),
        // Drivetrain
        UpgradeItem::module("limited-slip-diff", "Limited-Slip Differential", C::Drivetrain, T::Track, cost(1200, 2000))
            .with_metric_deltas(metrics(0.0, Some(0.1), 0.0, 0.0))
            .with_score_deltas(&[(PowerAccel, 0.5), (GripCornering, 0.5)]),
        UpgradeItem::module("short-shifter", "Short Shifter", C::Drivetrain, T::Street, cost(250, 500))
            .with_score_deltas(&[(Drivability, 0.5), (SoundEmotion, 0.25)]),
        UpgradeItem::module("lightweight-flywheel", "Lightweight Flywheel", C::Drivetrain, T::Track, cost(500, 1000))
            .for_layouts(&[ChassisLayout::FrontEngine, ChassisLayout::MidEngine])
            .with_metric_deltas(metrics(0.0, Some(0.05), 0.0, 0.0))
            .with_score_deltas(&[(PowerAccel, 0.25), (Drivability, -0.5)]),
        // Packages
        UpgradeItem::package(
            "street-pack",
            "Street Package",
            C::Chassis,
            T::Street,
            &["cold-air-intake", "cat-back-exhaust", "lowering-springs", "performance-pads", "summer-performance-tires"],
            cost(3000, 6000),
        )
        .in_conflict_group("stage-package"),
        UpgradeItem::package(
            "track-pack",
            "Track Package",
            C::Chassis,
            T::Track,
            &["coilovers", "track-pads", "stainless-brake-lines", "track-radiator", "summer-performance-tires", "front-splitter"],
            cost(6000, 11000),
        )
        .in_conflict_group("stage-package"),
        UpgradeItem::package(
            "attack-pack",
            "Time Attack Package",
            C::Aero,
            T::Attack,
            &["coilovers", "big-brake-kit", "track-pads", "r-compound-tires", "gt-wing", "track-radiator", "limited-slip-diff"],
            cost(15000, 25000),
        )
        .in_conflict_group("stage-package"),
    ]
}

fn cost_table() -> CostTierTable {
    use PlatformCostTier::*;

    let multipliers = BTreeMap::from([
        (Mainstream, 1.0),
        (Luxury, 1.35),
        (Premium, 1.6),
        (Exotic, 2.25),
    ]);

    let package_tiers = BTreeMap::from([
        (
            UpgradeTier::Street,
            BTreeMap::from([
                (Mainstream, cost(2800, 5500)),
                (Luxury, cost(3800, 7500)),
                (Premium, cost(4500, 9000)),
                (Exotic, cost(6500, 13000)),
            ]),
        ),
        (
            UpgradeTier::Track,
            BTreeMap::from([
                (Mainstream, cost(6000, 11000)),
                (Luxury, cost(8000, 15000)),
                (Premium, cost(9500, 17500)),
                (Exotic, cost(13500, 25000)),
            ]),
        ),
        (
            UpgradeTier::Attack,
            BTreeMap::from([
                (Mainstream, cost(14000, 24000)),
                (Luxury, cost(19000, 32000)),
                (Premium, cost(22000, 38000)),
                (Exotic, cost(32000, 55000)),
            ]),
        ),
    ]);

    let brand_tiers = [
        ("Ford", Mainstream),
        ("Chevrolet", Mainstream),
        ("Dodge", Mainstream),
        ("Toyota", Mainstream),
        ("Honda", Mainstream),
        ("Subaru", Mainstream),
        ("Mazda", Mainstream),
        ("Nissan", Mainstream),
        ("Hyundai", Mainstream),
        ("Volkswagen", Mainstream),
        ("BMW", Luxury),
        ("Audi", Luxury),
        ("Mercedes-AMG", Luxury),
        ("Lexus", Luxury),
        ("Cadillac", Luxury),
        ("Porsche", Premium),
        ("Lotus", Premium),
        ("Aston Martin", Premium),
        ("Ferrari", Exotic),
        ("Lamborghini", Exotic),
        ("McLaren", Exotic),
    ]
    .into_iter()
    .map(|(brand, tier)| (brand.to_string(), tier))
    .collect();

    let brand_overrides = BTreeMap::from([
        (
            "Porsche".to_string(),
            BTreeMap::from([
                ("performance-pads".to_string(), cost(450, 750)),
                ("track-pads".to_string(), cost(600, 900)),
                ("cat-back-exhaust".to_string(), cost(3500, 6500)),
                ("summer-performance-tires".to_string(), cost(1800, 2600)),
            ]),
        ),
        (
            "Ford".to_string(),
            BTreeMap::from([
                ("cold-air-intake".to_string(), cost(350, 500)),
                ("supercharger-kit".to_string(), cost(7500, 8800)),
                ("supercharger-pulley-small".to_string(), cost(400, 600)),
                ("supercharger-pulley-race".to_string(), cost(700, 1000)),
            ]),
        ),
        (
            "Chevrolet".to_string(),
            BTreeMap::from([
                ("supercharger-pulley-small".to_string(), cost(450, 650)),
                ("supercharger-pulley-race".to_string(), cost(750, 1100)),
            ]),
        ),
    ]);

    CostTierTable {
        multipliers,
        package_tiers,
        brand_tiers,
        brand_overrides,
    }
}

fn metric_modifiers() -> Vec<MetricModifier> {
    vec![
        // Coyote V8 responds unusually well to boost
        MetricModifier::new("mustang-gt-s550", "supercharger-kit", 250.0),
        MetricModifier::new("camaro-zl1", "supercharger-pulley-race", 95.0),
        // GT4 flat six already runs near-optimal headers from the factory
        MetricModifier::new("718-cayman-gt4", "headers", 12.0),
    ]
}
