// Library interface for tunecraft
// Exposes the build engine to the CLI, integration tests and benches

pub mod build;
pub mod catalog;
pub mod config;
pub mod cost;
pub mod errors;
pub mod metrics;
pub mod scoring;
pub mod storage;
pub mod vehicle;

// Re-export commonly used types
pub use build::{BuildResolver, ResolutionWarning, ResolvedBuild, SavedBuild};
pub use catalog::{
    CatalogDocument, ReplacementEvent, Selection, SelectionChange, UpgradeCatalog, UpgradeItem,
};
pub use config::EngineConfig;
pub use cost::{CostConfidence, CostEstimate, CostRange};
pub use errors::TunecraftError;
pub use metrics::{PerformanceMetrics, UpgradedMetrics};
pub use scoring::{ScoreCategory, ScoreVector};
pub use storage::{BuildStorage, FileBasedStorage};
pub use vehicle::{ChassisLayout, EngineArchitecture, VehicleProfile};
