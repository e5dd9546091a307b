use std::path::Path;

use log::info;

use super::VehicleProfile;
use crate::errors::TunecraftError;

/// Load vehicle profiles from a `.jsonl` file (one profile per line) or a
/// `.json` file holding either one profile or an array of them.
pub fn load_vehicles(source_file: &Path) -> Result<Vec<VehicleProfile>, TunecraftError> {
    let is_json_lines = source_file
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("jsonl"));

    let vehicles = if is_json_lines {
        serde_jsonlines::json_lines(source_file)
            .map_err(|e| TunecraftError::VehicleLoaderError { source: e })?
            .collect::<Result<Vec<VehicleProfile>, std::io::Error>>()
            .map_err(|e| TunecraftError::VehicleLoaderError { source: e })?
    } else {
        let content = std::fs::read_to_string(source_file)
            .map_err(|e| TunecraftError::VehicleLoaderError { source: e })?;
        let value: serde_json::Value = serde_json::from_str(&content)
            .map_err(|e| TunecraftError::VehicleParseError { source: e })?;
        if value.is_array() {
            serde_json::from_value(value)
        } else {
            serde_json::from_value(value).map(|vehicle| vec![vehicle])
        }
        .map_err(|e| TunecraftError::VehicleParseError { source: e })?
    };

    info!("Loaded {} vehicles from {:?}", vehicles.len(), source_file);
    Ok(vehicles)
}

/// Pick one vehicle out of a file. `id` may be omitted when the file holds a single vehicle.
pub fn find_vehicle(source_file: &Path, id: Option<&str>) -> Result<VehicleProfile, TunecraftError> {
    let mut vehicles = load_vehicles(source_file)?;
    match id {
        Some(id) => vehicles
            .into_iter()
            .find(|vehicle| vehicle.id == id)
            .ok_or_else(|| TunecraftError::UnknownVehicle { id: id.to_string() }),
        None if vehicles.len() == 1 => Ok(vehicles.remove(0)),
        None => Err(TunecraftError::UnknownVehicle {
            id: format!("<{} vehicles in file, pass a vehicle id>", vehicles.len()),
        }),
    }
}
