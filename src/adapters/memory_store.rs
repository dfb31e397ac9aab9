//! In-memory settings store.
//!
//! Implements both [`ConfigPort`] and [`StoragePort`] over a
//! `RefCell<HashMap>`.  Stands in for the host's device-settings database
//! in tests and simulation.
//!
//! - Config validation: [`HoodConfig::validate`] runs before persistence;
//!   out-of-range values are rejected, never clamped.
//! - Namespace isolation: keys are stored as `namespace::key`.
//! - A read-only switch makes every write fail with
//!   [`StorageError::Rejected`], for exercising persistence failures.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use log::{debug, info};

use crate::app::ports::{ConfigError, ConfigPort, StorageError, StoragePort};
use crate::config::HoodConfig;

const CONFIG_NAMESPACE: &str = "hoodctl";
const CONFIG_KEY: &str = "config";

#[derive(Debug, Default)]
pub struct MemoryStore {
    store: RefCell<HashMap<String, Vec<u8>>>,
    read_only: Cell<bool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn composite_key(namespace: &str, key: &str) -> String {
        format!("{}::{}", namespace, key)
    }

    /// Refuse (or accept again) every subsequent write.
    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.set(read_only);
    }

    /// Number of stored keys across all namespaces.
    pub fn len(&self) -> usize {
        self.store.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.borrow().is_empty()
    }
}

impl ConfigPort for MemoryStore {
    fn load(&self) -> Result<HoodConfig, ConfigError> {
        let key = Self::composite_key(CONFIG_NAMESPACE, CONFIG_KEY);
        match self.store.borrow().get(&key) {
            Some(bytes) => {
                let cfg: HoodConfig =
                    postcard::from_bytes(bytes).map_err(|_| ConfigError::Corrupted)?;
                info!("MemoryStore: loaded config ({} bytes)", bytes.len());
                Ok(cfg)
            }
            None => {
                info!("MemoryStore: no stored config, using defaults");
                Ok(HoodConfig::default())
            }
        }
    }

    fn save(&self, config: &HoodConfig) -> Result<(), ConfigError> {
        config.validate()?;
        if self.read_only.get() {
            return Err(ConfigError::IoError);
        }
        let key = Self::composite_key(CONFIG_NAMESPACE, CONFIG_KEY);
        let bytes = postcard::to_allocvec(config).map_err(|_| ConfigError::IoError)?;
        info!("MemoryStore: config saved ({} bytes)", bytes.len());
        self.store.borrow_mut().insert(key, bytes);
        Ok(())
    }
}

impl StoragePort for MemoryStore {
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        let composite = Self::composite_key(namespace, key);
        match self.store.borrow().get(&composite) {
            Some(data) if data.len() > buf.len() => Err(StorageError::Full),
            Some(data) => {
                buf[..data.len()].copy_from_slice(data);
                Ok(data.len())
            }
            None => Err(StorageError::NotFound),
        }
    }

    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        if self.read_only.get() {
            debug!("MemoryStore: write to {}::{} rejected", namespace, key);
            return Err(StorageError::Rejected);
        }
        let composite = Self::composite_key(namespace, key);
        self.store.borrow_mut().insert(composite, data.to_vec());
        Ok(())
    }

    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError> {
        if self.read_only.get() {
            return Err(StorageError::Rejected);
        }
        let composite = Self::composite_key(namespace, key);
        self.store.borrow_mut().remove(&composite);
        Ok(())
    }

    fn exists(&self, namespace: &str, key: &str) -> bool {
        let composite = Self::composite_key(namespace, key);
        self.store.borrow().contains_key(&composite)
    }
}
