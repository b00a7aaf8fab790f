//! Credential Store
//!
//! Capabilities that call third-party APIs look up per-caller secrets
//! through [`SecretStore`]. The engine itself never reads secrets.
//!
//! # Implementations
//!
//! - [`MemorySecretStore`]: in-process map, mainly for tests and embedding
//! - [`FileSecretStore`]: JSON file `{owner: {service: secret}}`
//! - [`EnvSecretStore`]: `<SERVICE>_API_KEY` variables, shared by all owners
//! - [`ChainedSecretStore`]: tries several stores in order

use std::collections::HashMap;
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

/// Looks up a secret owned by a caller for a named service.
pub trait SecretStore: Send + Sync {
    fn get_secret(&self, owner_id: &str, service_name: &str) -> Option<String>;
}

/// Secrets keyed by owner, then by service.
type SecretMap = HashMap<String, HashMap<String, String>>;

/// In-memory secret store.
#[derive(Debug, Clone, Default)]
pub struct MemorySecretStore {
    secrets: SecretMap,
}

impl MemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a secret, builder style.
    pub fn with_secret(
        mut self,
        owner_id: impl Into<String>,
        service_name: impl Into<String>,
        secret: impl Into<String>,
    ) -> Self {
        self.set(owner_id, service_name, secret);
        self
    }

    pub fn set(
        &mut self,
        owner_id: impl Into<String>,
        service_name: impl Into<String>,
        secret: impl Into<String>,
    ) {
        self.secrets
            .entry(owner_id.into())
            .or_default()
            .insert(service_name.into(), secret.into());
    }
}

impl SecretStore for MemorySecretStore {
    fn get_secret(&self, owner_id: &str, service_name: &str) -> Option<String> {
        self.secrets
            .get(owner_id)
            .and_then(|services| services.get(service_name))
            .cloned()
    }
}

/// Secret store persisted as a JSON file.
#[derive(Debug, Clone, Default)]
pub struct FileSecretStore {
    path: PathBuf,
    secrets: SecretMap,
}

impl FileSecretStore {
    /// Creates an empty store that will be saved to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            secrets: HashMap::new(),
        }
    }

    /// Loads the store from disk.
    ///
    /// A missing or unreadable file yields an empty store.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            debug!("Secrets file not found: {}", path.display());
            return Self::new(path);
        }

        let content = fs::read_to_string(path).unwrap_or_default();
        match serde_json::from_str::<SecretMap>(&content) {
            Ok(secrets) => {
                info!("Loaded secrets for {} owners from {}", secrets.len(), path.display());
                Self {
                    path: path.to_path_buf(),
                    secrets,
                }
            }
            Err(e) => {
                warn!("Ignoring malformed secrets file {}: {}", path.display(), e);
                Self::new(path)
            }
        }
    }

    /// Saves the store to disk.
    pub fn save(&self) -> Result<(), Box<dyn Error>> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.secrets)?;
        fs::write(&self.path, json)?;
        Ok(())
    }

    pub fn set(
        &mut self,
        owner_id: impl Into<String>,
        service_name: impl Into<String>,
        secret: impl Into<String>,
    ) {
        self.secrets
            .entry(owner_id.into())
            .or_default()
            .insert(service_name.into(), secret.into());
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SecretStore for FileSecretStore {
    fn get_secret(&self, owner_id: &str, service_name: &str) -> Option<String> {
        self.secrets
            .get(owner_id)
            .and_then(|services| services.get(service_name))
            .cloned()
    }
}

/// Reads `<SERVICE>_API_KEY` from the process environment.
///
/// The owner is ignored, so every caller shares the same key.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvSecretStore;

impl EnvSecretStore {
    fn variable_name(service_name: &str) -> String {
        format!("{}_API_KEY", service_name.to_ascii_uppercase())
    }
}

impl SecretStore for EnvSecretStore {
    fn get_secret(&self, _owner_id: &str, service_name: &str) -> Option<String> {
        std::env::var(Self::variable_name(service_name))
            .ok()
            .filter(|v| !v.is_empty())
    }
}

/// Consults each store in order and returns the first hit.
#[derive(Default)]
pub struct ChainedSecretStore {
    stores: Vec<Box<dyn SecretStore>>,
}

impl ChainedSecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_store(mut self, store: impl SecretStore + 'static) -> Self {
        self.stores.push(Box::new(store));
        self
    }

    pub fn len(&self) -> usize {
        self.stores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stores.is_empty()
    }
}

impl SecretStore for ChainedSecretStore {
    fn get_secret(&self, owner_id: &str, service_name: &str) -> Option<String> {
        self.stores
            .iter()
            .find_map(|store| store.get_secret(owner_id, service_name))
    }
}
