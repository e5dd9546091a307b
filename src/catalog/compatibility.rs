use log::debug;
use serde::{Deserialize, Serialize};

use super::{UpgradeCatalog, UpgradeItem};
use crate::vehicle::{Aspiration, EngineArchitecture, VehicleProfile};

/// How a vehicle's engine satisfied an item's architecture requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArchitectureMatch {
    /// Same cylinder family and same aspiration
    Exact,
    /// Same cylinder family, matched through one of the family rules
    Family,
}

/// Match a vehicle's engine against one required architecture.
///
/// The family rules are:
/// - a requirement with no aspiration accepts any engine of that cylinder family;
/// - a naturally aspirated requirement accepts an engine tagged only by its
///   cylinder family, since no turbo or supercharger qualifier is present.
///
/// A qualified forced-induction requirement never matches an unqualified engine.
pub fn match_architecture(
    vehicle: &EngineArchitecture,
    required: &EngineArchitecture,
) -> Option<ArchitectureMatch> {
    if vehicle.cylinders != required.cylinders {
        return None;
    }
    match (vehicle.aspiration, required.aspiration) {
        (Some(v), Some(r)) if v == r => Some(ArchitectureMatch::Exact),
        (None, None) => Some(ArchitectureMatch::Exact),
        (Some(_), None) => Some(ArchitectureMatch::Family),
        (None, Some(Aspiration::Natural)) => Some(ArchitectureMatch::Family),
        _ => None,
    }
}

/// Selects the part of the catalog that can be fitted to a given vehicle.
pub struct CompatibilityFilter<'a> {
    catalog: &'a UpgradeCatalog,
}

impl<'a> CompatibilityFilter<'a> {
    pub fn new(catalog: &'a UpgradeCatalog) -> Self {
        Self { catalog }
    }

    /// Whether the item's own applicability predicate accepts the vehicle.
    fn accepts(item: &UpgradeItem, vehicle: &VehicleProfile) -> bool {
        if !item.applicability.layouts.contains(&vehicle.layout) {
            return false;
        }
        match &item.applicability.architectures {
            None => true,
            Some(required) => required
                .iter()
                .any(|r| match_architecture(&vehicle.architecture, r).is_some()),
        }
    }

    /// Whether the item can be used on the vehicle. A package additionally
    /// requires every one of its modules to be usable.
    pub fn is_compatible(&self, item: &UpgradeItem, vehicle: &VehicleProfile) -> bool {
        if !Self::accepts(item, vehicle) {
            return false;
        }
        item.package_modules().iter().all(|key| {
            self.catalog
                .get(key)
                .is_some_and(|module| Self::accepts(module, vehicle))
        })
    }

    /// Every compatible item, in catalog order.
    pub fn compatible_items(&self, vehicle: &VehicleProfile) -> Vec<&'a UpgradeItem> {
        let items: Vec<&UpgradeItem> = self
            .catalog
            .items()
            .iter()
            .filter(|item| self.is_compatible(item, vehicle))
            .collect();
        debug!(
            "{} of {} catalog items compatible with {}",
            items.len(),
            self.catalog.len(),
            vehicle.id
        );
        items
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogDocument, UpgradeCategory, UpgradeTier};
    use crate::cost::{CostRange, CostTierTable};
    use crate::vehicle::{ChassisLayout, CylinderFamily};

    fn arch(tag: &str) -> EngineArchitecture {
        tag.parse().unwrap()
    }

    fn vehicle(layout: ChassisLayout, tag: &str) -> VehicleProfile {
        VehicleProfile::new("car", "Car", "Ford", layout, arch(tag))
    }

    fn catalog() -> UpgradeCatalog {
        let module = |key: &str| {
            UpgradeItem::module(
                key,
                key,
                UpgradeCategory::Power,
                UpgradeTier::Street,
                CostRange::new(100, 200),
            )
        };
        UpgradeCatalog::from_document(CatalogDocument {
            version: 1,
            items: vec![
                module("intake"),
                module("headers").for_architectures(&[arch("na-v8")]),
                module("downpipe").for_architectures(&[arch("turbo-i4"), arch("turbo-v8")]),
                module("flywheel").for_layouts(&[ChassisLayout::FrontEngine]),
                module("v8-anything").for_architectures(&[arch("v8")]),
                UpgradeItem::package(
                    "power-pack",
                    "Power Pack",
                    UpgradeCategory::Power,
                    UpgradeTier::Street,
                    &["intake", "headers"],
                    CostRange::new(500, 900),
                ),
            ],
            cost_table: CostTierTable::default(),
            metric_modifiers: Vec::new(),
        })
        .unwrap()
    }

    fn keys(items: Vec<&UpgradeItem>) -> Vec<&str> {
        items.into_iter().map(|i| i.key.as_str()).collect()
    }

    #[test]
    fn test_exact_architecture_match() {
        assert_eq!(
            match_architecture(&arch("turbo-i4"), &arch("turbo-i4")),
            Some(ArchitectureMatch::Exact)
        );
        assert_eq!(match_architecture(&arch("turbo-i4"), &arch("na-i4")), None);
        assert_eq!(match_architecture(&arch("turbo-i4"), &arch("turbo-i6")), None);
    }

    #[test]
    fn test_family_fallback_for_unqualified_engine() {
        // loosely tagged "v8" counts as naturally aspirated
        assert_eq!(
            match_architecture(&arch("v8"), &arch("na-v8")),
            Some(ArchitectureMatch::Family)
        );
        assert_eq!(match_architecture(&arch("v8"), &arch("supercharged-v8")), None);
        assert_eq!(
            match_architecture(&arch("supercharged-v8"), &arch("v8")),
            Some(ArchitectureMatch::Family)
        );
        assert_eq!(
            match_architecture(
                &EngineArchitecture::family(CylinderFamily::V8),
                &EngineArchitecture::family(CylinderFamily::V8)
            ),
            Some(ArchitectureMatch::Exact)
        );
    }

    #[test]
    fn test_filter_na_v8_front_engine() {
        let catalog = catalog();
        let filter = CompatibilityFilter::new(&catalog);
        let items = filter.compatible_items(&vehicle(ChassisLayout::FrontEngine, "na-v8"));
        assert_eq!(
            keys(items),
            vec!["intake", "headers", "flywheel", "v8-anything", "power-pack"]
        );
    }

    #[test]
    fn test_filter_loose_v8_uses_family_fallback() {
        let catalog = catalog();
        let filter = CompatibilityFilter::new(&catalog);
        let items = filter.compatible_items(&vehicle(ChassisLayout::FrontEngine, "v8"));
        assert!(keys(items).contains(&"headers"));
    }

    #[test]
    fn test_filter_turbo_mid_engine() {
        let catalog = catalog();
        let filter = CompatibilityFilter::new(&catalog);
        let items = filter.compatible_items(&vehicle(ChassisLayout::MidEngine, "turbo-v8"));
        // no flywheel (layout), no headers and thus no power-pack (architecture)
        assert_eq!(keys(items), vec!["intake", "downpipe", "v8-anything"]);
    }
}
