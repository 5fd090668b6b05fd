//! Profile and stored-token lookup.
//!
//! The core only ever reads through [`ProfileStore`]; persistence policy
//! belongs to the host. A JSON-file implementation is provided for the
//! binary, an in-memory one for tests and embedding.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A named connection profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub name: String,
    pub server: Option<String>,
    pub auth_scheme: Option<String>,
}

/// Read-only lookup interface used by the request builder.
pub trait ProfileStore {
    fn read_profiles(&self) -> (Vec<Profile>, Option<String>);

    /// Named profile, or the default profile when `name` is `None`.
    fn get_profile(&self, name: Option<&str>) -> Option<Profile> {
        let (profiles, default) = self.read_profiles();
        let wanted = name.map(str::to_string).or(default)?;
        profiles.into_iter().find(|p| p.name == wanted)
    }

    fn get_token(&self, spec_id: &str, profile: &str) -> Option<String>;
}

/// Store with no profiles and no tokens.
pub struct NoProfiles;

impl ProfileStore for NoProfiles {
    fn read_profiles(&self) -> (Vec<Profile>, Option<String>) {
        (Vec::new(), None)
    }

    fn get_token(&self, _spec_id: &str, _profile: &str) -> Option<String> {
        None
    }
}

/// In-memory store for tests and programmatic embedding.
#[derive(Default)]
pub struct MemoryStore {
    pub profiles: Vec<Profile>,
    pub default_profile: Option<String>,
    pub tokens: HashMap<(String, String), String>,
}

impl MemoryStore {
    pub fn with_token(mut self, spec_id: &str, profile: &str, token: &str) -> Self {
        self.tokens
            .insert((spec_id.to_string(), profile.to_string()), token.to_string());
        self
    }

    pub fn with_profile(mut self, profile: Profile, default: bool) -> Self {
        if default {
            self.default_profile = Some(profile.name.clone());
        }
        self.profiles.push(profile);
        self
    }
}

impl ProfileStore for MemoryStore {
    fn read_profiles(&self) -> (Vec<Profile>, Option<String>) {
        (self.profiles.clone(), self.default_profile.clone())
    }

    fn get_token(&self, spec_id: &str, profile: &str) -> Option<String> {
        self.tokens
            .get(&(spec_id.to_string(), profile.to_string()))
            .cloned()
    }
}

/// On-disk layout of the profiles file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfilesFile {
    pub profiles: IndexMap<String, ProfileEntry>,

    #[serde(rename = "defaultProfile", skip_serializing_if = "Option::is_none")]
    pub default_profile: Option<String>,

    /// Tokens keyed by `"{spec_id}/{profile}"`.
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub tokens: IndexMap<String, String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server: Option<String>,

    #[serde(rename = "authScheme", skip_serializing_if = "Option::is_none")]
    pub auth_scheme: Option<String>,
}

/// JSON-file store. A missing file reads as an empty store.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonFileStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> ProfilesFile {
        let Ok(text) = std::fs::read_to_string(&self.path) else {
            return ProfilesFile::default();
        };
        match serde_json::from_str(&text) {
            Ok(file) => file,
            Err(e) => {
                log::warn!("ignoring malformed profiles file {}: {e}", self.path.display());
                ProfilesFile::default()
            }
        }
    }

    pub fn save(&self, file: &ProfilesFile) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let text = serde_json::to_string_pretty(file).expect("profiles file serializes");
        std::fs::write(&self.path, text)
    }

    pub fn set_token(&self, spec_id: &str, profile: &str, token: &str) -> std::io::Result<()> {
        let mut file = self.load();
        file.profiles.entry(profile.to_string()).or_default();
        if file.default_profile.is_none() {
            file.default_profile = Some(profile.to_string());
        }
        file.tokens
            .insert(token_key(spec_id, profile), token.to_string());
        self.save(&file)
    }

    pub fn remove_token(&self, spec_id: &str, profile: &str) -> std::io::Result<bool> {
        let mut file = self.load();
        let removed = file.tokens.shift_remove(&token_key(spec_id, profile)).is_some();
        if removed {
            self.save(&file)?;
        }
        Ok(removed)
    }
}

impl ProfileStore for JsonFileStore {
    fn read_profiles(&self) -> (Vec<Profile>, Option<String>) {
        let file = self.load();
        let profiles = file
            .profiles
            .iter()
            .map(|(name, entry)| Profile {
                name: name.clone(),
                server: entry.server.clone(),
                auth_scheme: entry.auth_scheme.clone(),
            })
            .collect();
        (profiles, file.default_profile)
    }

    fn get_token(&self, spec_id: &str, profile: &str) -> Option<String> {
        self.load().tokens.get(&token_key(spec_id, profile)).cloned()
    }
}

fn token_key(spec_id: &str, profile: &str) -> String {
    format!("{spec_id}/{profile}")
}

/// The profile name an invocation runs under: the default, else `"default"`.
pub fn effective_profile_name(store: &dyn ProfileStore) -> String {
    store
        .read_profiles()
        .1
        .unwrap_or_else(|| "default".to_string())
}
