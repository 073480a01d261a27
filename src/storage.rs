// Portal Autologin - Profile Storage
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Local profile storage.
//!
//! Profiles live in `profiles.json` under the config directory and are
//! cached in memory after the first read. Loading never fails: a missing,
//! blank or corrupt file yields the built-in default profiles.
//!
//! This module uses RwLock for thread-safe access. Lock poisoning is handled
//! gracefully by recovering the inner value, as poison indicates a panic
//! in another thread but the data itself may still be valid.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::{debug, error, info, warn};

use crate::models::validation::validate_profile;
use crate::models::{default_profiles, Error, Profile, Result};
use crate::CONFIG_DIR_NAME;

/// Profiles file name inside the config directory.
pub const PROFILES_FILENAME: &str = "profiles.json";

/// Settings file name inside the config directory.
pub const SETTINGS_FILENAME: &str = "settings.toml";

/// Read-only view of the profile list used by the orchestrator.
pub trait ProfileSource: Send + Sync {
    /// Load all profiles in stable order. Never fails.
    fn load_profiles(&self) -> Vec<Profile>;
}

/// Default config directory (`$XDG_CONFIG_HOME/portal-autologin`).
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR_NAME)
}

/// JSON-file backed profile store.
#[derive(Debug)]
pub struct ProfileStore {
    /// Profiles file path.
    profiles_file: PathBuf,
    /// In-memory profile cache, `None` until first load.
    cache: RwLock<Option<Vec<Profile>>>,
}

impl ProfileStore {
    /// Create a new store with the default config directory.
    pub fn new() -> Self {
        Self::with_config_dir(default_config_dir())
    }

    /// Create a new store with a specific config directory.
    pub fn with_config_dir(config_dir: PathBuf) -> Self {
        if let Err(e) = fs::create_dir_all(&config_dir) {
            error!("Failed to create config directory: {}", e);
        }
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let _ = fs::set_permissions(&config_dir, fs::Permissions::from_mode(0o700));
        }

        Self {
            profiles_file: config_dir.join(PROFILES_FILENAME),
            cache: RwLock::new(None),
        }
    }

    // ========================================================================
    // RwLock Helper Methods (handle poisoning gracefully)
    // ========================================================================

    fn read_cache(&self) -> Option<Vec<Profile>> {
        match self.cache.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => {
                warn!("RwLock poisoned reading profile cache, recovering");
                poisoned.into_inner().clone()
            }
        }
    }

    fn write_cache(&self, value: Option<Vec<Profile>>) {
        match self.cache.write() {
            Ok(mut guard) => *guard = value,
            Err(poisoned) => {
                warn!("RwLock poisoned writing profile cache, recovering");
                *poisoned.into_inner() = value;
            }
        }
    }

    // ========================================================================
    // Profiles
    // ========================================================================

    /// Load all profiles, from cache when possible.
    pub fn load_profiles(&self) -> Vec<Profile> {
        if let Some(cached) = self.read_cache() {
            return cached;
        }
        let profiles = self.load_from_disk();
        self.write_cache(Some(profiles.clone()));
        profiles
    }

    /// Replace the stored profile list.
    pub fn save_profiles(&self, profiles: &[Profile]) -> Result<()> {
        self.write_to_disk(profiles)?;
        self.write_cache(Some(profiles.to_vec()));
        Ok(())
    }

    /// Add a new profile after validating it.
    pub fn add_profile(&self, profile: Profile) -> Result<()> {
        validate_profile(&profile)?;
        let mut profiles = self.load_profiles();
        if profiles.iter().any(|p| p.id == profile.id) {
            return Err(Error::ProfileAlreadyExists(profile.id));
        }
        info!("Adding profile {}", profile.id);
        profiles.push(profile);
        self.save_profiles(&profiles)
    }

    /// Replace an existing profile (matched by ID) after validating it.
    pub fn update_profile(&self, profile: Profile) -> Result<()> {
        validate_profile(&profile)?;
        let mut profiles = self.load_profiles();
        let Some(slot) = profiles.iter_mut().find(|p| p.id == profile.id) else {
            return Err(Error::ProfileNotFound(profile.id));
        };
        *slot = profile;
        self.save_profiles(&profiles)
    }

    /// Delete a profile by ID.
    pub fn delete_profile(&self, id: &str) -> Result<()> {
        let mut profiles = self.load_profiles();
        let before = profiles.len();
        profiles.retain(|p| p.id != id);
        if profiles.len() == before {
            return Err(Error::ProfileNotFound(id.to_string()));
        }
        info!("Deleting profile {}", id);
        self.save_profiles(&profiles)
    }

    /// Drop the in-memory cache so the next load reads the file again.
    pub fn invalidate_cache(&self) {
        self.write_cache(None);
    }

    /// Get the profiles file path.
    pub fn profiles_file(&self) -> &Path {
        &self.profiles_file
    }

    // ========================================================================
    // Disk I/O
    // ========================================================================

    fn load_from_disk(&self) -> Vec<Profile> {
        let content = match fs::read_to_string(&self.profiles_file) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No profiles file at {:?}, installing defaults", self.profiles_file);
                return self.install_defaults();
            }
            Err(e) => {
                error!("Failed to read profiles file: {}", e);
                return default_profiles();
            }
        };

        if content.trim().is_empty() {
            warn!("Profiles file is blank, installing defaults");
            return self.install_defaults();
        }

        match Profile::list_from_json(&content) {
            Ok(profiles) => {
                for profile in &profiles {
                    if let Err(e) = validate_profile(profile) {
                        warn!("Stored profile {} is invalid: {}", profile.id, e);
                    }
                }
                info!("Loaded {} profiles from {:?}", profiles.len(), self.profiles_file);
                profiles
            }
            Err(e) => {
                error!("Failed to parse profiles file, installing defaults: {}", e);
                self.install_defaults()
            }
        }
    }

    fn install_defaults(&self) -> Vec<Profile> {
        let defaults = default_profiles();
        if let Err(e) = self.write_to_disk(&defaults) {
            warn!("Failed to write default profiles: {}", e);
        }
        defaults
    }

    fn write_to_disk(&self, profiles: &[Profile]) -> Result<()> {
        let json = Profile::list_to_json(profiles)?;
        let tmp = self.profiles_file.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|e| Error::ConfigWriteFailed(e.to_string()))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let _ = fs::set_permissions(&tmp, fs::Permissions::from_mode(0o600));
        }
        fs::rename(&tmp, &self.profiles_file).map_err(|e| Error::ConfigWriteFailed(e.to_string()))?;
        debug!("Saved {} profiles", profiles.len());
        Ok(())
    }
}

impl Default for ProfileStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ProfileSource for ProfileStore {
    fn load_profiles(&self) -> Vec<Profile> {
        ProfileStore::load_profiles(self)
    }
}
