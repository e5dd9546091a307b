use std::collections::BTreeMap;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::catalog::{UpgradeItem, UpgradeTier};
use crate::vehicle::{PlatformCostTier, VehicleProfile};

/// Share of items (in tenths) that must resolve from verified or table data for a "high" grade.
const HIGH_CONFIDENCE_TENTHS: usize = 7;

/// A low/high price range in whole currency units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostRange {
    pub low: u64,
    pub high: u64,
}

impl CostRange {
    pub const ZERO: CostRange = CostRange { low: 0, high: 0 };

    pub fn new(low: u64, high: u64) -> Self {
        Self { low, high }
    }

    pub fn scaled(&self, multiplier: f64) -> Self {
        Self {
            low: (self.low as f64 * multiplier).round() as u64,
            high: (self.high as f64 * multiplier).round() as u64,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.low <= self.high
    }
}

impl std::ops::Add for CostRange {
    type Output = CostRange;

    fn add(self, rhs: Self) -> Self::Output {
        CostRange {
            low: self.low.saturating_add(rhs.low),
            high: self.high.saturating_add(rhs.high),
        }
    }
}

impl std::iter::Sum for CostRange {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(CostRange::ZERO, |acc, r| acc + r)
    }
}

/// How directly a cost figure was sourced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostConfidence {
    Verified,
    High,
    Estimated,
}

impl std::fmt::Display for CostConfidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CostConfidence::Verified => write!(f, "verified"),
            CostConfidence::High => write!(f, "high"),
            CostConfidence::Estimated => write!(f, "estimated"),
        }
    }
}

/// Rung of the per-item lookup chain that produced a cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostSource {
    BrandOverride,
    PackageTierTable,
    TierMultiplier,
}

impl CostSource {
    pub fn confidence(&self) -> CostConfidence {
        match self {
            CostSource::BrandOverride => CostConfidence::Verified,
            CostSource::PackageTierTable => CostConfidence::High,
            CostSource::TierMultiplier => CostConfidence::Estimated,
        }
    }
}

/// Cost tables shipped with the catalog.
///
/// Brand names are matched case-insensitively; [`CostTierTable::normalized`]
/// lower-cases every brand key once at catalog load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostTierTable {
    /// Generic multiplier per platform tier
    pub multipliers: BTreeMap<PlatformCostTier, f64>,
    /// Package cost per (package tier, platform tier)
    pub package_tiers: BTreeMap<UpgradeTier, BTreeMap<PlatformCostTier, CostRange>>,
    /// Platform tier implied by a brand
    pub brand_tiers: BTreeMap<String, PlatformCostTier>,
    /// Exact per-brand item prices
    pub brand_overrides: BTreeMap<String, BTreeMap<String, CostRange>>,
}

fn normalize_brand(brand: &str) -> String {
    brand.trim().to_lowercase()
}

impl CostTierTable {
    pub fn normalized(self) -> Self {
        Self {
            multipliers: self.multipliers,
            package_tiers: self.package_tiers,
            brand_tiers: self
                .brand_tiers
                .into_iter()
                .map(|(brand, tier)| (normalize_brand(&brand), tier))
                .collect(),
            brand_overrides: self
                .brand_overrides
                .into_iter()
                .map(|(brand, items)| (normalize_brand(&brand), items))
                .collect(),
        }
    }

    /// Explicit tier on the profile, else the brand's tier, else mainstream.
    pub fn platform_tier_for(&self, vehicle: &VehicleProfile) -> PlatformCostTier {
        if let Some(tier) = vehicle.platform_tier {
            return tier;
        }
        match self.brand_tiers.get(&normalize_brand(&vehicle.brand)) {
            Some(tier) => *tier,
            None => {
                debug!(
                    "Brand {} has no cost tier, defaulting to mainstream",
                    vehicle.brand
                );
                PlatformCostTier::Mainstream
            }
        }
    }

    pub fn multiplier(&self, tier: PlatformCostTier) -> f64 {
        self.multipliers.get(&tier).copied().unwrap_or(1.0)
    }

    pub fn brand_override(&self, brand: &str, item_key: &str) -> Option<CostRange> {
        self.brand_overrides
            .get(&normalize_brand(brand))
            .and_then(|items| items.get(item_key))
            .copied()
    }

    pub fn package_tier_cost(
        &self,
        package_tier: UpgradeTier,
        platform_tier: PlatformCostTier,
    ) -> Option<CostRange> {
        self.package_tiers
            .get(&package_tier)
            .and_then(|by_platform| by_platform.get(&platform_tier))
            .copied()
    }
}

/// Cost of a single selected item and where it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemCost {
    pub key: String,
    pub cost: CostRange,
    pub source: CostSource,
}

/// Aggregate cost of a selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostEstimate {
    pub total: CostRange,
    pub confidence: CostConfidence,
    /// Percentage of items priced from brand overrides or package tables
    pub sourced_pct: f64,
    pub platform_tier: PlatformCostTier,
    pub items: Vec<ItemCost>,
}

/// Prices a selection through the override > package table > multiplier chain.
pub struct CostEstimator<'a> {
    table: &'a CostTierTable,
}

impl<'a> CostEstimator<'a> {
    pub fn new(table: &'a CostTierTable) -> Self {
        Self { table }
    }

    pub fn item_cost(
        &self,
        vehicle: &VehicleProfile,
        platform_tier: PlatformCostTier,
        item: &UpgradeItem,
    ) -> ItemCost {
        let (cost, source) = if let Some(cost) = self.table.brand_override(&vehicle.brand, &item.key)
        {
            (cost, CostSource::BrandOverride)
        } else if let Some(cost) = item
            .is_package()
            .then(|| self.table.package_tier_cost(item.tier, platform_tier))
            .flatten()
        {
            (cost, CostSource::PackageTierTable)
        } else {
            (
                item.base_cost.scaled(self.table.multiplier(platform_tier)),
                CostSource::TierMultiplier,
            )
        };

        ItemCost {
            key: item.key.clone(),
            cost,
            source,
        }
    }

    pub fn estimate(&self, vehicle: &VehicleProfile, items: &[&UpgradeItem]) -> CostEstimate {
        let platform_tier = self.table.platform_tier_for(vehicle);
        let lines: Vec<ItemCost> = items
            .iter()
            .map(|item| self.item_cost(vehicle, platform_tier, item))
            .collect();

        let total = lines.iter().map(|line| line.cost).sum();
        let verified = lines
            .iter()
            .filter(|line| line.source == CostSource::BrandOverride)
            .count();
        let sourced = lines
            .iter()
            .filter(|line| line.source != CostSource::TierMultiplier)
            .count();
        let count = lines.len();

        let (confidence, sourced_pct) = if verified == count {
            (CostConfidence::Verified, 100.0)
        } else {
            let pct = sourced as f64 * 100.0 / count as f64;
            if sourced * 10 >= count * HIGH_CONFIDENCE_TENTHS {
                (CostConfidence::High, pct)
            } else {
                (CostConfidence::Estimated, pct)
            }
        };

        CostEstimate {
            total,
            confidence,
            sourced_pct,
            platform_tier,
            items: lines,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Applicability, ItemKind, UpgradeCategory};
    use crate::vehicle::{Aspiration, ChassisLayout, CylinderFamily, EngineArchitecture};

    fn item(key: &str, kind: ItemKind, tier: UpgradeTier, cost: CostRange) -> UpgradeItem {
        UpgradeItem {
            key: key.to_string(),
            name: key.to_string(),
            category: UpgradeCategory::Chassis,
            tier,
            kind,
            applicability: Applicability::any_layout(),
            score_deltas: Default::default(),
            metric_deltas: Default::default(),
            base_cost: cost,
            conflict_group: None,
        }
    }

    fn module(key: &str, low: u64, high: u64) -> UpgradeItem {
        item(key, ItemKind::Module, UpgradeTier::Street, CostRange::new(low, high))
    }

    fn package(key: &str, tier: UpgradeTier) -> UpgradeItem {
        item(
            key,
            ItemKind::Package {
                modules: vec!["springs".to_string()],
            },
            tier,
            CostRange::new(1000, 2000),
        )
    }

    fn table() -> CostTierTable {
        let mut table = CostTierTable::default();
        table.multipliers.insert(PlatformCostTier::Mainstream, 1.0);
        table.multipliers.insert(PlatformCostTier::Exotic, 2.0);
        table
            .brand_tiers
            .insert("Ferrari".to_string(), PlatformCostTier::Exotic);
        table.package_tiers.insert(
            UpgradeTier::Track,
            BTreeMap::from([(PlatformCostTier::Exotic, CostRange::new(9000, 12000))]),
        );
        table.brand_overrides.insert(
            "Ferrari".to_string(),
            BTreeMap::from([
                ("pads".to_string(), CostRange::new(800, 900)),
                ("springs".to_string(), CostRange::new(2000, 2500)),
            ]),
        );
        table.normalized()
    }

    fn vehicle(brand: &str) -> VehicleProfile {
        VehicleProfile::new(
            "car",
            "Car",
            brand,
            ChassisLayout::MidEngine,
            EngineArchitecture::new(Aspiration::Natural, CylinderFamily::V8),
        )
    }

    #[test]
    fn test_range_sum_saturates() {
        let huge = CostRange::new(u64::MAX - 10, u64::MAX);
        let total: CostRange = [huge, CostRange::new(100, 200)].into_iter().sum();
        assert_eq!(total, CostRange::new(u64::MAX, u64::MAX));
    }

    #[test]
    fn test_unknown_brand_falls_back_to_mainstream_multiplier() {
        let table = table();
        let estimator = CostEstimator::new(&table);
        let pads = module("pads", 200, 400);
        let estimate = estimator.estimate(&vehicle("Unheard Of Motors"), &[&pads]);

        assert_eq!(estimate.platform_tier, PlatformCostTier::Mainstream);
        assert_eq!(estimate.total, CostRange::new(200, 400));
        assert_eq!(estimate.confidence, CostConfidence::Estimated);
        assert_eq!(estimate.sourced_pct, 0.0);
    }

    #[test]
    fn test_all_overrides_report_verified() {
        let table = table();
        let estimator = CostEstimator::new(&table);
        let pads = module("pads", 200, 400);
        let springs = module("springs", 300, 500);
        let estimate = estimator.estimate(&vehicle("ferrari"), &[&pads, &springs]);

        assert_eq!(estimate.confidence, CostConfidence::Verified);
        assert_eq!(estimate.sourced_pct, 100.0);
        assert_eq!(estimate.total, CostRange::new(2800, 3400));
    }

    #[test]
    fn test_package_uses_tier_table() {
        let table = table();
        let estimator = CostEstimator::new(&table);
        let pack = package("track-pack", UpgradeTier::Track);
        let line = estimator.item_cost(&vehicle("Ferrari"), PlatformCostTier::Exotic, &pack);
        assert_eq!(line.source, CostSource::PackageTierTable);
        assert_eq!(line.cost, CostRange::new(9000, 12000));
    }

    #[test]
    fn test_package_without_table_entry_uses_multiplier() {
        let table = table();
        let estimator = CostEstimator::new(&table);
        let pack = package("street-pack", UpgradeTier::Street);
        let line = estimator.item_cost(&vehicle("Ferrari"), PlatformCostTier::Exotic, &pack);
        assert_eq!(line.source, CostSource::TierMultiplier);
        assert_eq!(line.cost, CostRange::new(2000, 4000));
    }

    #[test]
    fn test_high_confidence_threshold() {
        let table = table();
        let estimator = CostEstimator::new(&table);
        let pads = module("pads", 100, 200);
        let springs = module("springs", 100, 200);
        let pack = package("track-pack", UpgradeTier::Track);
        let other = module("wing", 100, 200);

        // 3 of 4 sourced = 75%
        let estimate = estimator.estimate(&vehicle("Ferrari"), &[&pads, &springs, &pack, &other]);
        assert_eq!(estimate.confidence, CostConfidence::High);
        assert_eq!(estimate.sourced_pct, 75.0);

        // 2 of 3 sourced = 66.7%
        let estimate = estimator.estimate(&vehicle("Ferrari"), &[&pads, &pack, &other]);
        assert_eq!(estimate.confidence, CostConfidence::Estimated);
        assert!((estimate.sourced_pct - 66.666).abs() < 0.01);
    }

    #[test]
    fn test_empty_selection_is_free_and_verified() {
        let table = table();
        let estimator = CostEstimator::new(&table);
        let estimate = estimator.estimate(&vehicle("Ford"), &[]);
        assert_eq!(estimate.total, CostRange::ZERO);
        assert_eq!(estimate.confidence, CostConfidence::Verified);
    }

    #[test]
    fn test_explicit_platform_tier_beats_brand() {
        let table = table();
        let v = vehicle("Ferrari").with_platform_tier(PlatformCostTier::Mainstream);
        assert_eq!(table.platform_tier_for(&v), PlatformCostTier::Mainstream);
        assert_eq!(
            table.platform_tier_for(&vehicle("FERRARI ")),
            PlatformCostTier::Exotic
        );
    }
}
