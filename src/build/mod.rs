// Build resolution: the single entry point tying the engine together

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, RwLock};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::catalog::{
    CompatibilityFilter, ConflictResolver, ReplacementEvent, Selection, SelectionChange,
    UpgradeCatalog, UpgradeItem,
};
use crate::config::EngineConfig;
use crate::cost::{CostConfidence, CostEstimate, CostEstimator, CostRange};
use crate::errors::TunecraftError;
use crate::metrics::{MetricRecalculator, UpgradedMetrics};
use crate::scoring::{BaselineScores, DeltaAggregator, ScoreDerivation, ScoreVector};
use crate::vehicle::{EngineArchitecture, VehicleProfile};

/// A requested key that did not make it into the resolved selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResolutionWarning {
    UnknownItem { key: String },
    Incompatible { key: String },
}

impl fmt::Display for ResolutionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolutionWarning::UnknownItem { key } => write!(f, "{key} is not in the catalog"),
            ResolutionWarning::Incompatible { key } => {
                write!(f, "{key} does not fit this vehicle")
            }
        }
    }
}

/// Everything the presentation layer needs to show a build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedBuild {
    pub vehicle_id: String,
    pub architecture: EngineArchitecture,
    /// Conflict-free selection in catalog order
    pub selection: Selection,
    /// Module keys the selection expands to, de-duplicated, in catalog order
    pub modules: Vec<String>,
    pub stock_scores: BaselineScores,
    pub scores: ScoreVector,
    pub metrics: UpgradedMetrics,
    pub cost: CostEstimate,
    /// Replacements made while normalizing the requested keys
    pub replacements: Vec<ReplacementEvent>,
    pub warnings: Vec<ResolutionWarning>,
}

impl ResolvedBuild {
    pub fn hp_gain(&self) -> f64 {
        self.metrics.hp_gain
    }

    /// Snapshot handed to the persistence collaborator.
    pub fn to_saved_build(&self, name: &str) -> SavedBuild {
        SavedBuild {
            name: name.to_string(),
            vehicle_id: self.vehicle_id.clone(),
            selection: self.selection.keys().to_vec(),
            hp_gain: self.metrics.hp_gain,
            cost: self.cost.total,
            confidence: self.cost.confidence,
        }
    }
}

/// Persisted summary of a build. Restoring it goes back through
/// [`BuildResolver::resolve`], which re-normalizes the stored keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedBuild {
    pub name: String,
    pub vehicle_id: String,
    pub selection: Vec<String>,
    pub hp_gain: f64,
    pub cost: CostRange,
    pub confidence: CostConfidence,
}

/// Upper bound on memoized baselines; the memo starts over once it is reached.
const MAX_MEMOIZED_BASELINES: usize = 512;

/// Resolves (vehicle, selection) pairs into complete builds.
///
/// Holds only the shared read-only catalog, the engine config and a bounded
/// memo of baseline scores per vehicle, so a single resolver can serve
/// concurrent callers. The memo is verified against the full profile on every
/// hit and never changes a result.
pub struct BuildResolver {
    catalog: Arc<UpgradeCatalog>,
    config: EngineConfig,
    baselines: RwLock<HashMap<String, (VehicleProfile, BaselineScores)>>,
}

impl BuildResolver {
    pub fn new(catalog: Arc<UpgradeCatalog>, config: EngineConfig) -> Result<Self, TunecraftError> {
        config.validate()?;
        info!(
            "Build resolver ready with catalog v{} ({} items)",
            catalog.version(),
            catalog.len()
        );
        Ok(Self {
            catalog,
            config,
            baselines: RwLock::new(HashMap::new()),
        })
    }

    /// Resolver over the built-in catalog with default bounds.
    pub fn with_builtin_catalog() -> Self {
        Self {
            catalog: Arc::new(UpgradeCatalog::builtin()),
            config: EngineConfig::default(),
            baselines: RwLock::new(HashMap::new()),
        }
    }

    pub fn catalog(&self) -> &UpgradeCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Catalog items that can be offered for this vehicle, in catalog order.
    pub fn compatible_items(
        &self,
        vehicle: &VehicleProfile,
    ) -> Result<Vec<&UpgradeItem>, TunecraftError> {
        vehicle.validate()?;
        Ok(CompatibilityFilter::new(&self.catalog).compatible_items(vehicle))
    }

    /// Stock scores for a vehicle, memoized per vehicle id.
    pub fn baseline(&self, vehicle: &VehicleProfile) -> BaselineScores {
        if let Ok(cache) = self.baselines.read()
            && let Some((profile, baseline)) = cache.get(&vehicle.id)
            && profile == vehicle
        {
            return baseline.clone();
        }

        let baseline = ScoreDerivation::derive(vehicle);
        if let Ok(mut cache) = self.baselines.write() {
            if cache.len() >= MAX_MEMOIZED_BASELINES && !cache.contains_key(&vehicle.id) {
                debug!("Baseline memo full, clearing {} entries", cache.len());
                cache.clear();
            }
            cache.insert(vehicle.id.clone(), (vehicle.clone(), baseline.clone()));
        }
        baseline
    }

    /// Resolve requested keys against a vehicle.
    ///
    /// Unknown and incompatible keys are dropped with a warning. The rest are
    /// normalized from an empty selection in catalog order, so conflicting
    /// keys resolve to the one that comes last in the catalog.
    pub fn resolve<I, S>(
        &self,
        vehicle: &VehicleProfile,
        requested: I,
    ) -> Result<ResolvedBuild, TunecraftError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        vehicle.validate()?;

        let filter = CompatibilityFilter::new(&self.catalog);
        let mut warnings = Vec::new();
        let mut seen = HashSet::new();
        let mut accepted = Vec::new();

        for key in requested {
            let key = key.as_ref();
            if !seen.insert(key.to_string()) {
                continue;
            }
            match self.catalog.get(key) {
                None => {
                    warn!("Dropping unknown upgrade {} for {}", key, vehicle.id);
                    warnings.push(ResolutionWarning::UnknownItem {
                        key: key.to_string(),
                    });
                }
                Some(item) if !filter.is_compatible(item, vehicle) => {
                    warn!("Dropping {} which does not fit {}", key, vehicle.id);
                    warnings.push(ResolutionWarning::Incompatible {
                        key: key.to_string(),
                    });
                }
                Some(_) => accepted.push(key.to_string()),
            }
        }

        let (selection, replacements) =
            ConflictResolver::new(&self.catalog).normalize(&accepted);

        let mut modules = self.catalog.expand_selection(&selection);
        modules.sort_by_key(|item| self.catalog.position(&item.key));
        let stock_scores = self.baseline(vehicle);
        let scores = DeltaAggregator::aggregate(
            &stock_scores.scores,
            modules.iter().map(|item| &item.score_deltas),
        );
        let metrics = MetricRecalculator::new(&self.catalog, &self.config)
            .recalculate(vehicle, &modules);

        // a standalone module already bundled in a selected package is paid for once
        let bundled: HashSet<&str> = selection
            .iter()
            .filter_map(|key| self.catalog.get(key))
            .flat_map(|item| item.package_modules().iter().map(String::as_str))
            .collect();
        let selected: Vec<&UpgradeItem> = selection
            .iter()
            .filter(|key| !bundled.contains(key.as_str()))
            .filter_map(|key| self.catalog.get(key))
            .collect();
        let cost = CostEstimator::new(self.catalog.cost_table()).estimate(vehicle, &selected);

        debug!(
            "Resolved {} with {} items ({} modules): +{:.1} hp, {}-{} ({})",
            vehicle.id,
            selection.len(),
            modules.len(),
            metrics.hp_gain,
            cost.total.low,
            cost.total.high,
            cost.confidence
        );

        Ok(ResolvedBuild {
            vehicle_id: vehicle.id.clone(),
            architecture: vehicle.architecture,
            modules: modules.iter().map(|item| item.key.clone()).collect(),
            selection,
            stock_scores,
            scores,
            metrics,
            cost,
            replacements,
            warnings,
        })
    }

    /// Apply one add/remove to a caller-owned selection and resolve the result.
    ///
    /// Adding a key that is unknown or does not fit the vehicle leaves the
    /// prior selection untouched; the resolved build carries the warning.
    pub fn apply_change(
        &self,
        vehicle: &VehicleProfile,
        prior: &Selection,
        change: &SelectionChange,
    ) -> Result<(ResolvedBuild, Option<ReplacementEvent>), TunecraftError> {
        vehicle.validate()?;

        if let SelectionChange::Add(key) = change {
            let fits = self.catalog.get(key).is_some_and(|item| {
                CompatibilityFilter::new(&self.catalog).is_compatible(item, vehicle)
            });
            if !fits {
                let build = self.resolve(vehicle, prior.iter().chain(std::iter::once(key)))?;
                return Ok((build, None));
            }
        }

        let transition = ConflictResolver::new(&self.catalog).apply(prior, change);
        if let Some(event) = &transition.event {
            info!("{} replaced {:?} on {}", event.added, event.removed, vehicle.id);
        }
        let build = self.resolve(vehicle, &transition.selection)?;
        Ok((build, transition.event))
    }
}
