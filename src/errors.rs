// Error types for tunecraft

use snafu::Snafu;
use std::io;

#[derive(Debug, Snafu)]
pub enum TunecraftError {
    // Vehicle profile shape errors, raised at the resolution boundary
    #[snafu(display("Invalid vehicle profile: {field} - {reason}"))]
    InvalidVehicle { field: String, reason: String },
    #[snafu(display("Unknown vehicle: {id}"))]
    UnknownVehicle { id: String },
    #[snafu(display("Invalid engine architecture tag: {tag}"))]
    InvalidArchitectureTag { tag: String },

    // Catalog errors
    #[snafu(display("Catalog validation failed: {reason}"))]
    CatalogValidationError { reason: String },
    #[snafu(display("Error reading catalog file"))]
    CatalogIOError { source: io::Error },
    #[snafu(display("Error parsing catalog file"))]
    CatalogParseError { source: serde_json::Error },

    // Vehicle data loading errors
    #[snafu(display("Error loading vehicle file"))]
    VehicleLoaderError { source: io::Error },
    #[snafu(display("Error parsing vehicle file"))]
    VehicleParseError { source: serde_json::Error },

    // Config management errors
    #[snafu(display("Could not find application data directory to save config file"))]
    NoConfigDir,
    #[snafu(display("Error writing config file"))]
    ConfigIOError { source: io::Error },
    #[snafu(display("Error serializing config file"))]
    ConfigSerializeError { source: serde_json::Error },
    #[snafu(display("Invalid engine config: {reason}"))]
    InvalidConfig { reason: String },

    // Saved build storage errors
    #[snafu(display("Saved build validation failed: {reason}"))]
    BuildValidationError { reason: String },
    #[snafu(display("Saved build storage error: {reason}"))]
    BuildStorageError { reason: String },
    #[snafu(display("Error serializing build data"))]
    BuildSerializeError { source: serde_json::Error },
    #[snafu(display("File operation failed: {operation} - {reason}"))]
    FileOperationError { operation: String, reason: String },
}
