// Upgrade catalog: schema, validation and indexing

pub mod builtin;
pub mod compatibility;
pub mod conflicts;

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::path::Path;

use itertools::Itertools;
use log::{debug, info};
use serde::{Deserialize, Serialize};

pub use compatibility::{ArchitectureMatch, CompatibilityFilter};
pub use conflicts::{ConflictResolver, ReplacementEvent, Selection, SelectionChange, Transition};

use crate::cost::{CostRange, CostTierTable};
use crate::errors::TunecraftError;
use crate::metrics::MetricModifier;
use crate::scoring::aggregator::is_exact_delta;
use crate::scoring::{ScoreCategory, ScoreVector};
use crate::vehicle::{ChassisLayout, EngineArchitecture};

/// What part of the car an upgrade touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpgradeCategory {
    Power,
    ForcedInduction,
    Tune,
    Exhaust,
    Chassis,
    Brakes,
    Cooling,
    Wheels,
    Tires,
    Aero,
    Drivetrain,
}

impl std::fmt::Display for UpgradeCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UpgradeCategory::Power => write!(f, "Power"),
            UpgradeCategory::ForcedInduction => write!(f, "Forced Induction"),
            UpgradeCategory::Tune => write!(f, "Tune"),
            UpgradeCategory::Exhaust => write!(f, "Exhaust"),
            UpgradeCategory::Chassis => write!(f, "Chassis"),
            UpgradeCategory::Brakes => write!(f, "Brakes"),
            UpgradeCategory::Cooling => write!(f, "Cooling"),
            UpgradeCategory::Wheels => write!(f, "Wheels"),
            UpgradeCategory::Tires => write!(f, "Tires"),
            UpgradeCategory::Aero => write!(f, "Aero"),
            UpgradeCategory::Drivetrain => write!(f, "Drivetrain"),
        }
    }
}

/// Rough aggressiveness of an upgrade, independent of the platform cost tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpgradeTier {
    Street,
    Track,
    Attack,
    Ultimate,
}

/// Which vehicles an item can be fitted to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Applicability {
    pub layouts: BTreeSet<ChassisLayout>,
    /// When present, the vehicle's engine must match one of these
    #[serde(default)]
    pub architectures: Option<Vec<EngineArchitecture>>,
}

impl Applicability {
    pub fn any_layout() -> Self {
        Self {
            layouts: BTreeSet::from([
                ChassisLayout::FrontEngine,
                ChassisLayout::MidEngine,
                ChassisLayout::RearEngine,
            ]),
            architectures: None,
        }
    }
}

/// Hard-metric contribution of a module.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricDeltas {
    pub hp_gain: f64,
    /// Seconds taken off the 0-60 time; estimated from hp gain when absent.
    /// Negative for drag-adding trade-offs.
    pub zero_to_sixty_improvement_s: Option<f64>,
    pub braking_improvement_ft: f64,
    pub grip_improvement_g: f64,
}

/// Module or package.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Module,
    /// A bundle expanding to the listed module keys, in order
    Package { modules: Vec<String> },
}

/// A single catalog entry.
///
/// Packages share every field with modules but contribute score and metric
/// deltas only through their expanded modules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpgradeItem {
    pub key: String,
    pub name: String,
    pub category: UpgradeCategory,
    pub tier: UpgradeTier,
    pub kind: ItemKind,
    pub applicability: Applicability,
    #[serde(default)]
    pub score_deltas: ScoreVector,
    #[serde(default)]
    pub metric_deltas: MetricDeltas,
    pub base_cost: CostRange,
    /// Items sharing a group are mutually exclusive
    #[serde(default)]
    pub conflict_group: Option<String>,
}

impl UpgradeItem {
    /// A module fitting every layout, with no deltas and no conflict group.
    pub fn module(
        key: &str,
        name: &str,
        category: UpgradeCategory,
        tier: UpgradeTier,
        base_cost: CostRange,
    ) -> Self {
        Self {
            key: key.to_string(),
            name: name.to_string(),
            category,
            tier,
            kind: ItemKind::Module,
            applicability: Applicability::any_layout(),
            score_deltas: ScoreVector::default(),
            metric_deltas: MetricDeltas::default(),
            base_cost,
            conflict_group: None,
        }
    }

    pub fn package(
        key: &str,
        name: &str,
        category: UpgradeCategory,
        tier: UpgradeTier,
        modules: &[&str],
        base_cost: CostRange,
    ) -> Self {
        Self {
            kind: ItemKind::Package {
                modules: modules.iter().map(|m| m.to_string()).collect(),
            },
            ..Self::module(key, name, category, tier, base_cost)
        }
    }

    pub fn in_conflict_group(mut self, group: &str) -> Self {
        self.conflict_group = Some(group.to_string());
        self
    }

    pub fn with_score_deltas(mut self, deltas: &[(ScoreCategory, f64)]) -> Self {
        for (category, delta) in deltas {
            self.score_deltas.set(*category, *delta);
        }
        self
    }

    pub fn with_metric_deltas(mut self, deltas: MetricDeltas) -> Self {
        self.metric_deltas = deltas;
        self
    }

    pub fn with_hp_gain(mut self, hp_gain: f64) -> Self {
        self.metric_deltas.hp_gain = hp_gain;
        self
    }

    pub fn for_layouts(mut self, layouts: &[ChassisLayout]) -> Self {
        self.applicability.layouts = layouts.iter().copied().collect();
        self
    }

    pub fn for_architectures(mut self, architectures: &[EngineArchitecture]) -> Self {
        self.applicability.architectures = Some(architectures.to_vec());
        self
    }

    pub fn is_package(&self) -> bool {
        matches!(self.kind, ItemKind::Package { .. })
    }

    pub fn package_modules(&self) -> &[String] {
        match &self.kind {
            ItemKind::Module => &[],
            ItemKind::Package { modules } => modules,
        }
    }
}

/// A named set of keys of which at most one may be selected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictGroup {
    pub id: String,
    pub members: Vec<String>,
}

/// Serialized form of a catalog, as shipped by the catalog data source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogDocument {
    pub version: u32,
    pub items: Vec<UpgradeItem>,
    #[serde(default)]
    pub cost_table: CostTierTable,
    #[serde(default)]
    pub metric_modifiers: Vec<MetricModifier>,
}

/// Read-only, indexed upgrade catalog.
///
/// Built once from a [`CatalogDocument`]; lookups by key are O(1) and by
/// category O(category size). Catalog order is the document order and is the
/// stable order used when normalizing restored selections.
#[derive(Debug)]
pub struct UpgradeCatalog {
    version: u32,
    items: Vec<UpgradeItem>,
    by_key: HashMap<String, usize>,
    by_category: HashMap<UpgradeCategory, Vec<usize>>,
    conflict_groups: BTreeMap<String, Vec<String>>,
    cost_table: CostTierTable,
    metric_modifiers: HashMap<(String, String), f64>,
}

impl UpgradeCatalog {
    pub fn from_document(document: CatalogDocument) -> Result<Self, TunecraftError> {
        Self::validate_document(&document)?;

        let mut by_key = HashMap::with_capacity(document.items.len());
        let mut by_category: HashMap<UpgradeCategory, Vec<usize>> = HashMap::new();
        let mut conflict_groups: BTreeMap<String, Vec<String>> = BTreeMap::new();

        for (idx, item) in document.items.iter().enumerate() {
            by_key.insert(item.key.clone(), idx);
            by_category.entry(item.category).or_default().push(idx);
            if let Some(group) = &item.conflict_group {
                conflict_groups
                    .entry(group.clone())
                    .or_default()
                    .push(item.key.clone());
            }
        }

        let metric_modifiers = document
            .metric_modifiers
            .iter()
            .map(|m| ((m.vehicle_id.clone(), m.item_key.clone()), m.hp_gain))
            .collect();

        info!(
            "Loaded upgrade catalog v{} with {} items and {} conflict groups",
            document.version,
            document.items.len(),
            conflict_groups.len()
        );

        Ok(Self {
            version: document.version,
            items: document.items,
            by_key,
            by_category,
            conflict_groups,
            cost_table: document.cost_table.normalized(),
            metric_modifiers,
        })
    }

    /// Load a catalog document from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, TunecraftError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| TunecraftError::CatalogIOError { source: e })?;
        let document: CatalogDocument = serde_json::from_str(&content)
            .map_err(|e| TunecraftError::CatalogParseError { source: e })?;
        debug!("Parsed catalog document from {:?}", path);
        Self::from_document(document)
    }

    /// The reference catalog compiled into the crate.
    pub fn builtin() -> Self {
        Self::from_document(builtin::document())
            .unwrap_or_else(|e| panic!("built-in catalog is invalid: {e}"))
    }

    fn validate_document(document: &CatalogDocument) -> Result<(), TunecraftError> {
        let mut seen = HashSet::new();
        for item in &document.items {
            if item.key.trim().is_empty() {
                return Err(TunecraftError::CatalogValidationError {
                    reason: format!("item '{}' has an empty key", item.name),
                });
            }
            if !seen.insert(item.key.as_str()) {
                return Err(TunecraftError::CatalogValidationError {
                    reason: format!("duplicate item key: {}", item.key),
                });
            }
            if item.applicability.layouts.is_empty() {
                return Err(TunecraftError::CatalogValidationError {
                    reason: format!("item {} is not applicable to any layout", item.key),
                });
            }
            if !item.base_cost.is_valid() {
                return Err(TunecraftError::CatalogValidationError {
                    reason: format!("item {} has a cost range with low above high", item.key),
                });
            }
            if let Some((category, delta)) = item
                .score_deltas
                .iter()
                .find(|(_, delta)| !is_exact_delta(*delta))
            {
                return Err(TunecraftError::CatalogValidationError {
                    reason: format!(
                        "item {} has {} delta {} with more than four decimals",
                        item.key, category, delta
                    ),
                });
            }
        }

        let modules: HashMap<&str, &UpgradeItem> = document
            .items
            .iter()
            .filter(|item| !item.is_package())
            .map(|item| (item.key.as_str(), item))
            .collect();

        for package in document.items.iter().filter(|item| item.is_package()) {
            let members = package.package_modules();
            if members.is_empty() {
                return Err(TunecraftError::CatalogValidationError {
                    reason: format!("package {} has no modules", package.key),
                });
            }
            if let Some(missing) = members.iter().find(|m| !modules.contains_key(m.as_str())) {
                return Err(TunecraftError::CatalogValidationError {
                    reason: format!(
                        "package {} references {} which is not a module in the catalog",
                        package.key, missing
                    ),
                });
            }
            if let Some(clashing) = members
                .iter()
                .filter_map(|m| modules.get(m.as_str())?.conflict_group.as_deref())
                .duplicates()
                .next()
            {
                return Err(TunecraftError::CatalogValidationError {
                    reason: format!(
                        "package {} holds two modules from conflict group {}",
                        package.key, clashing
                    ),
                });
            }
            if !package.score_deltas.is_zero() || package.metric_deltas != MetricDeltas::default()
            {
                return Err(TunecraftError::CatalogValidationError {
                    reason: format!(
                        "package {} declares its own deltas; packages contribute through their modules",
                        package.key
                    ),
                });
            }
        }

        for modifier in &document.metric_modifiers {
            if !modules.contains_key(modifier.item_key.as_str()) {
                return Err(TunecraftError::CatalogValidationError {
                    reason: format!(
                        "metric modifier for {} references unknown module {}",
                        modifier.vehicle_id, modifier.item_key
                    ),
                });
            }
        }

        for (tier, by_platform) in &document.cost_table.package_tiers {
            if let Some((platform, _)) = by_platform.iter().find(|(_, r)| !r.is_valid()) {
                return Err(TunecraftError::CatalogValidationError {
                    reason: format!("package cost for {tier:?}/{platform:?} has low above high"),
                });
            }
        }

        Ok(())
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// All items in catalog order.
    pub fn items(&self) -> &[UpgradeItem] {
        &self.items
    }

    pub fn get(&self, key: &str) -> Option<&UpgradeItem> {
        self.by_key.get(key).map(|idx| &self.items[*idx])
    }

    pub fn contains(&self, key: &str) -> bool {
        self.by_key.contains_key(key)
    }

    /// Position of a key in catalog order.
    pub fn position(&self, key: &str) -> Option<usize> {
        self.by_key.get(key).copied()
    }

    pub fn by_category(&self, category: UpgradeCategory) -> impl Iterator<Item = &UpgradeItem> {
        self.by_category
            .get(&category)
            .into_iter()
            .flatten()
            .map(|idx| &self.items[*idx])
    }

    /// Items grouped by category, in category order, for listing.
    pub fn grouped_by_category<'a>(
        &'a self,
        items: impl IntoIterator<Item = &'a UpgradeItem>,
    ) -> Vec<(UpgradeCategory, Vec<&'a UpgradeItem>)> {
        items
            .into_iter()
            .sorted_by_key(|item| (item.category, self.position(&item.key)))
            .chunk_by(|item| item.category)
            .into_iter()
            .map(|(category, group)| (category, group.collect()))
            .collect()
    }

    pub fn conflict_group(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(|item| item.conflict_group.as_deref())
    }

    /// (holder, group) pairs a key occupies: its own group and, for a package,
    /// the groups of its modules.
    pub fn occupied_groups(&self, key: &str) -> Vec<(&str, &str)> {
        let Some(item) = self.get(key) else {
            return Vec::new();
        };
        let own = item
            .conflict_group
            .as_deref()
            .map(|group| (item.key.as_str(), group));
        let members = self.expand(key).into_iter().filter(|m| m.key != item.key);
        own.into_iter()
            .chain(members.filter_map(|module| {
                module
                    .conflict_group
                    .as_deref()
                    .map(|group| (module.key.as_str(), group))
            }))
            .collect()
    }

    /// Whether two keys are mutually exclusive once packages are expanded.
    /// The same module reached through a package and on its own is not a clash.
    pub fn clashes(&self, a: &str, b: &str) -> bool {
        let other = self.occupied_groups(b);
        self.occupied_groups(a).iter().any(|(holder, group)| {
            other
                .iter()
                .any(|(other_holder, other_group)| group == other_group && holder != other_holder)
        })
    }

    pub fn conflict_groups(&self) -> Vec<ConflictGroup> {
        self.conflict_groups
            .iter()
            .map(|(id, members)| ConflictGroup {
                id: id.clone(),
                members: members.clone(),
            })
            .collect()
    }

    /// Expand a key to the modules it stands for: a package to its module list,
    /// a module to itself. Unknown keys expand to nothing.
    pub fn expand(&self, key: &str) -> Vec<&UpgradeItem> {
        match self.get(key) {
            None => Vec::new(),
            Some(item) => match &item.kind {
                ItemKind::Module => vec![item],
                ItemKind::Package { modules } => {
                    modules.iter().filter_map(|m| self.get(m)).collect()
                }
            },
        }
    }

    /// Expand a selection into distinct modules, first occurrence wins.
    pub fn expand_selection<'a, I>(&self, keys: I) -> Vec<&UpgradeItem>
    where
        I: IntoIterator<Item = &'a String>,
    {
        keys.into_iter()
            .flat_map(|key| self.expand(key))
            .unique_by(|item| item.key.clone())
            .collect()
    }

    pub fn cost_table(&self) -> &CostTierTable {
        &self.cost_table
    }

    /// Absolute hp gain declared for a specific vehicle and module, if any.
    pub fn metric_modifier(&self, vehicle_id: &str, item_key: &str) -> Option<f64> {
        self.metric_modifiers
            .get(&(vehicle_id.to_string(), item_key.to_string()))
            .copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn module(key: &str, category: UpgradeCategory, group: Option<&str>) -> UpgradeItem {
        UpgradeItem {
            key: key.to_string(),
            name: key.to_string(),
            category,
            tier: UpgradeTier::Street,
            kind: ItemKind::Module,
            applicability: Applicability::any_layout(),
            score_deltas: ScoreVector::default(),
            metric_deltas: MetricDeltas::default(),
            base_cost: CostRange::new(100, 200),
            conflict_group: group.map(str::to_string),
        }
    }

    fn package(key: &str, modules: &[&str]) -> UpgradeItem {
        UpgradeItem {
            kind: ItemKind::Package {
                modules: modules.iter().map(|m| m.to_string()).collect(),
            },
            ..module(key, UpgradeCategory::Chassis, None)
        }
    }

    fn document(items: Vec<UpgradeItem>) -> CatalogDocument {
        CatalogDocument {
            version: 1,
            items,
            cost_table: CostTierTable::default(),
            metric_modifiers: Vec::new(),
        }
    }

    #[test]
    fn test_indexes_by_key_and_category() {
        let catalog = UpgradeCatalog::from_document(document(vec![
            module("intake", UpgradeCategory::Power, Some("intake")),
            module("pads", UpgradeCategory::Brakes, None),
            module("big-intake", UpgradeCategory::Power, Some("intake")),
        ]))
        .unwrap();

        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.position("big-intake"), Some(2));
        assert_eq!(catalog.by_category(UpgradeCategory::Power).count(), 2);
        assert_eq!(catalog.by_category(UpgradeCategory::Aero).count(), 0);
        assert_eq!(catalog.conflict_group("intake"), Some("intake"));
        assert_eq!(catalog.conflict_group("pads"), None);
        assert_eq!(
            catalog.conflict_groups(),
            vec![ConflictGroup {
                id: "intake".to_string(),
                members: vec!["intake".to_string(), "big-intake".to_string()],
            }]
        );
    }

    #[test]
    fn test_duplicate_keys_rejected() {
        let result = UpgradeCatalog::from_document(document(vec![
            module("pads", UpgradeCategory::Brakes, None),
            module("pads", UpgradeCategory::Brakes, None),
        ]));
        assert!(matches!(
            result,
            Err(TunecraftError::CatalogValidationError { .. })
        ));
    }

    #[test]
    fn test_package_must_reference_modules() {
        let result = UpgradeCatalog::from_document(document(vec![
            module("pads", UpgradeCategory::Brakes, None),
            package("brake-pack", &["pads", "rotors"]),
        ]));
        assert!(result.is_err());

        let result = UpgradeCatalog::from_document(document(vec![
            module("pads", UpgradeCategory::Brakes, None),
            package("brake-pack", &["pads"]),
            package("mega-pack", &["brake-pack"]),
        ]));
        assert!(result.is_err(), "nested packages are rejected");
    }

    #[test]
    fn test_package_with_own_deltas_rejected() {
        let mut pack = package("brake-pack", &["pads"]);
        pack.score_deltas.braking = 1.0;
        let result = UpgradeCatalog::from_document(document(vec![
            module("pads", UpgradeCategory::Brakes, None),
            pack,
        ]));
        assert!(result.is_err());
    }

    #[test]
    fn test_package_with_clashing_modules_rejected() {
        let result = UpgradeCatalog::from_document(document(vec![
            module("street-pads", UpgradeCategory::Brakes, Some("pads")),
            module("race-pads", UpgradeCategory::Brakes, Some("pads")),
            package("brake-pack", &["street-pads", "race-pads"]),
        ]));
        assert!(matches!(
            result,
            Err(TunecraftError::CatalogValidationError { .. })
        ));
    }

    #[test]
    fn test_overly_precise_delta_rejected() {
        let mut pads = module("pads", UpgradeCategory::Brakes, None);
        pads.score_deltas.braking = 0.00005;
        assert!(UpgradeCatalog::from_document(document(vec![pads])).is_err());
    }

    #[test]
    fn test_packages_occupy_module_groups() {
        let catalog = UpgradeCatalog::from_document(document(vec![
            module("street-pads", UpgradeCategory::Brakes, Some("pads")),
            module("race-pads", UpgradeCategory::Brakes, Some("pads")),
            module("lines", UpgradeCategory::Brakes, None),
            package("brake-pack", &["street-pads", "lines"]),
        ]))
        .unwrap();

        assert_eq!(
            catalog.occupied_groups("brake-pack"),
            vec![("street-pads", "pads")]
        );
        assert!(catalog.clashes("brake-pack", "race-pads"));
        assert!(catalog.clashes("race-pads", "brake-pack"));
        // same module on its own and inside the package
        assert!(!catalog.clashes("brake-pack", "street-pads"));
        assert!(!catalog.clashes("brake-pack", "lines"));
        assert!(!catalog.clashes("ghost", "race-pads"));
    }

    #[test]
    fn test_inverted_cost_range_rejected() {
        let mut pads = module("pads", UpgradeCategory::Brakes, None);
        pads.base_cost = CostRange::new(500, 100);
        assert!(UpgradeCatalog::from_document(document(vec![pads])).is_err());
    }

    #[test]
    fn test_expand_selection_deduplicates() {
        let catalog = UpgradeCatalog::from_document(document(vec![
            module("pads", UpgradeCategory::Brakes, None),
            module("lines", UpgradeCategory::Brakes, None),
            package("brake-pack", &["pads", "lines"]),
        ]))
        .unwrap();

        let selection = vec![
            "pads".to_string(),
            "brake-pack".to_string(),
            "ghost".to_string(),
        ];
        let keys: Vec<&str> = catalog
            .expand_selection(&selection)
            .iter()
            .map(|item| item.key.as_str())
            .collect();
        assert_eq!(keys, vec!["pads", "lines"]);
    }

    #[test]
    fn test_grouped_by_category_keeps_catalog_order() {
        let catalog = UpgradeCatalog::from_document(document(vec![
            module("pads", UpgradeCategory::Brakes, None),
            module("intake", UpgradeCategory::Power, None),
            module("lines", UpgradeCategory::Brakes, None),
        ]))
        .unwrap();

        let grouped = catalog.grouped_by_category(catalog.items());
        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[0].0, UpgradeCategory::Power);
        assert_eq!(grouped[1].0, UpgradeCategory::Brakes);
        let brakes: Vec<&str> = grouped[1].1.iter().map(|i| i.key.as_str()).collect();
        assert_eq!(brakes, vec!["pads", "lines"]);
    }

    #[test]
    fn test_document_round_trips_through_json() {
        let doc = builtin::document();
        let json = serde_json::to_string(&doc).unwrap();
        let parsed: CatalogDocument = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, doc);
    }

    #[test]
    fn test_builtin_catalog_is_valid() {
        let catalog = UpgradeCatalog::builtin();
        assert!(!catalog.is_empty());
        assert!(catalog.get("street-pack").unwrap().is_package());
        assert!(
            catalog
                .conflict_groups()
                .iter()
                .any(|g| g.id == "supercharger-pulley" && g.members.len() == 2)
        );
    }
}
