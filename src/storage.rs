// Storage implementation for saved builds

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::build::SavedBuild;
use crate::config::APP_DIR_NAME;
use crate::errors::TunecraftError;

const MAX_BUILD_NAME_LEN: usize = 80;

/// Persistence collaborator for saved builds. The engine never calls it;
/// callers hand it the output of [`crate::ResolvedBuild::to_saved_build`].
pub trait BuildStorage {
    /// Save a build, replacing any build with the same vehicle and name
    fn save_build(&mut self, build: &SavedBuild) -> Result<(), TunecraftError>;

    /// Load a build by vehicle id and build name
    fn load_build(&self, vehicle_id: &str, name: &str)
    -> Result<Option<SavedBuild>, TunecraftError>;

    /// List saved builds, optionally only those for one vehicle
    fn list_builds(&self, vehicle_id: Option<&str>) -> Result<Vec<SavedBuild>, TunecraftError>;

    /// Delete a build. Deleting a build that does not exist is not an error.
    fn delete_build(&mut self, vehicle_id: &str, name: &str) -> Result<(), TunecraftError>;
}

/// One pretty-printed JSON file per build under a storage directory.
pub struct FileBasedStorage {
    storage_path: PathBuf,
    cache: HashMap<String, SavedBuild>,
}

impl FileBasedStorage {
    pub fn new(storage_path: PathBuf) -> Result<Self, TunecraftError> {
        if !storage_path.exists() {
            fs::create_dir_all(&storage_path).map_err(|e| TunecraftError::FileOperationError {
                operation: "create_storage_dir".to_string(),
                reason: e.to_string(),
            })?;
        }

        Ok(Self {
            storage_path,
            cache: HashMap::new(),
        })
    }

    /// Storage in the default application data directory
    pub fn new_default() -> Result<Self, TunecraftError> {
        Self::new(Self::default_storage_path()?)
    }

    pub fn default_storage_path() -> Result<PathBuf, TunecraftError> {
        let app_data_dir = dirs::data_dir().ok_or(TunecraftError::NoConfigDir)?;
        Ok(app_data_dir.join(APP_DIR_NAME).join("builds"))
    }

    pub fn storage_path(&self) -> &Path {
        &self.storage_path
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    fn normalize(part: &str) -> String {
        part.trim()
            .to_lowercase()
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' { c } else { '_' })
            .collect()
    }

    fn storage_key(vehicle_id: &str, name: &str) -> String {
        format!("{}__{}", Self::normalize(vehicle_id), Self::normalize(name))
    }

    fn file_path(&self, vehicle_id: &str, name: &str) -> PathBuf {
        self.storage_path
            .join(format!("{}.json", Self::storage_key(vehicle_id, name)))
    }

    fn validate_for_save(build: &SavedBuild) -> Result<(), TunecraftError> {
        if build.vehicle_id.trim().is_empty() {
            return Err(TunecraftError::BuildValidationError {
                reason: "Vehicle id cannot be empty".to_string(),
            });
        }
        if build.name.trim().is_empty() {
            return Err(TunecraftError::BuildValidationError {
                reason: "Build name cannot be empty".to_string(),
            });
        }
        if build.name.len() > MAX_BUILD_NAME_LEN {
            return Err(TunecraftError::BuildValidationError {
                reason: format!(
                    "Build name too long ({} characters, max {})",
                    build.name.len(),
                    MAX_BUILD_NAME_LEN
                ),
            });
        }
        if !build.cost.is_valid() {
            return Err(TunecraftError::BuildValidationError {
                reason: "Cost range has low above high".to_string(),
            });
        }
        if !build.hp_gain.is_finite() {
            return Err(TunecraftError::BuildValidationError {
                reason: "hp gain must be finite".to_string(),
            });
        }
        Ok(())
    }

    fn read_file(path: &Path) -> Result<SavedBuild, TunecraftError> {
        let content = fs::read_to_string(path).map_err(|e| TunecraftError::FileOperationError {
            operation: "read_build_file".to_string(),
            reason: e.to_string(),
        })?;
        serde_json::from_str(&content).map_err(|e| TunecraftError::BuildStorageError {
            reason: format!("Failed to parse {}: {}", path.display(), e),
        })
    }

    /// Write through a temporary file so a failed write never leaves a truncated build.
    fn write_file(path: &Path, build: &SavedBuild) -> Result<(), TunecraftError> {
        let content = serde_json::to_string_pretty(build)
            .map_err(|e| TunecraftError::BuildSerializeError { source: e })?;
        let temp_path = path.with_extension("json.tmp");

        {
            let mut temp_file =
                fs::File::create(&temp_path).map_err(|e| TunecraftError::FileOperationError {
                    operation: "create_temp_file".to_string(),
                    reason: e.to_string(),
                })?;
            temp_file
                .write_all(content.as_bytes())
                .and_then(|_| temp_file.sync_all())
                .map_err(|e| TunecraftError::FileOperationError {
                    operation: "write_temp_file".to_string(),
                    reason: e.to_string(),
                })?;
        }

        fs::rename(&temp_path, path).map_err(|e| {
            let _ = fs::remove_file(&temp_path);
            TunecraftError::FileOperationError {
                operation: "atomic_move".to_string(),
                reason: e.to_string(),
            }
        })
    }
}

impl BuildStorage for FileBasedStorage {
    fn save_build(&mut self, build: &SavedBuild) -> Result<(), TunecraftError> {
        Self::validate_for_save(build)?;

        let path = self.file_path(&build.vehicle_id, &build.name);
        Self::write_file(&path, build)?;
        info!("Saved build '{}' for {}", build.name, build.vehicle_id);

        self.cache.insert(
            Self::storage_key(&build.vehicle_id, &build.name),
            build.clone(),
        );
        Ok(())
    }

    fn load_build(
        &self,
        vehicle_id: &str,
        name: &str,
    ) -> Result<Option<SavedBuild>, TunecraftError> {
        let key = Self::storage_key(vehicle_id, name);
        if let Some(build) = self.cache.get(&key) {
            debug!("Found build {} in cache", key);
            return Ok(Some(build.clone()));
        }

        let path = self.file_path(vehicle_id, name);
        if !path.exists() {
            return Ok(None);
        }
        Self::read_file(&path).map(Some)
    }

    fn list_builds(&self, vehicle_id: Option<&str>) -> Result<Vec<SavedBuild>, TunecraftError> {
        let entries =
            fs::read_dir(&self.storage_path).map_err(|e| TunecraftError::FileOperationError {
                operation: "list_builds".to_string(),
                reason: e.to_string(),
            })?;

        let mut builds = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_file() || path.extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }
            match Self::read_file(&path) {
                Ok(build) => {
                    if vehicle_id.is_none_or(|id| build.vehicle_id == id) {
                        builds.push(build);
                    }
                }
                Err(e) => warn!("Skipping unreadable build file {:?}: {}", path, e),
            }
        }

        builds.sort_by(|a, b| (&a.vehicle_id, &a.name).cmp(&(&b.vehicle_id, &b.name)));
        Ok(builds)
    }

    fn delete_build(&mut self, vehicle_id: &str, name: &str) -> Result<(), TunecraftError> {
        let path = self.file_path(vehicle_id, name);
        if path.exists() {
            fs::remove_file(&path).map_err(|e| TunecraftError::FileOperationError {
                operation: "delete_build".to_string(),
                reason: e.to_string(),
            })?;
            info!("Deleted build '{}' for {}", name, vehicle_id);
        }
        self.cache.remove(&Self::storage_key(vehicle_id, name));
        Ok(())
    }
}
