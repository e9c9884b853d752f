//! Persisted configuration backends.
//!
//! On device the config lives in the default NVS partition as a postcard
//! blob, next to the one-byte controller-variant selector the installer
//! writes when provisioning a station. Host builds get an in-memory store
//! with the same semantics.

use log::{info, warn};

use crate::config::DockConfig;
use crate::ports::{ConfigError, ConfigPort};

const CONFIG_KEY: &str = "dock_cfg";
const VARIANT_KEY: &str = "variant";
const MAX_BLOB_LEN: usize = 256;

#[cfg(feature = "espidf")]
pub use device::NvsConfigStore;

#[cfg(feature = "espidf")]
mod device {
    use esp_idf_svc::nvs::{EspDefaultNvsPartition, EspNvs, NvsDefault};
    use log::{info, warn};

    use super::{CONFIG_KEY, MAX_BLOB_LEN, VARIANT_KEY};
    use crate::config::DockConfig;
    use crate::ports::{ConfigError, ConfigPort};

    /// NVS-backed configuration store.
    pub struct NvsConfigStore {
        nvs: EspNvs<NvsDefault>,
    }

    impl NvsConfigStore {
        pub fn new(partition: EspDefaultNvsPartition) -> Result<Self, ConfigError> {
            let nvs = EspNvs::new(partition, "orbdock", true).map_err(|e| {
                warn!("nvs namespace open failed: {e}");
                ConfigError::IoError
            })?;
            Ok(Self { nvs })
        }
    }

    impl ConfigPort for NvsConfigStore {
        fn load(&self) -> Result<DockConfig, ConfigError> {
            let mut buf = [0u8; MAX_BLOB_LEN];
            match self.nvs.get_raw(CONFIG_KEY, &mut buf) {
                Ok(Some(blob)) => {
                    let config: DockConfig =
                        postcard::from_bytes(blob).map_err(|_| ConfigError::Corrupted)?;
                    config.validate().map_err(ConfigError::ValidationFailed)?;
                    Ok(config)
                }
                Ok(None) => {
                    info!("no stored config, using defaults");
                    Ok(DockConfig::default())
                }
                Err(e) => {
                    warn!("config load failed: {e}");
                    Err(ConfigError::IoError)
                }
            }
        }

        fn save(&mut self, config: &DockConfig) -> Result<(), ConfigError> {
            config.validate().map_err(ConfigError::ValidationFailed)?;
            let blob = postcard::to_allocvec(config).map_err(|_| ConfigError::Corrupted)?;
            self.nvs.set_raw(CONFIG_KEY, &blob).map_err(|e| {
                warn!("config save failed: {e}");
                ConfigError::IoError
            })?;
            Ok(())
        }

        fn variant_byte(&self) -> u8 {
            self.nvs.get_u8(VARIANT_KEY).ok().flatten().unwrap_or(0)
        }
    }
}

/// In-memory store with NVS semantics: blobs survive only for the life of
/// the process.
pub struct InMemoryConfigStore {
    blob: Option<std::vec::Vec<u8>>,
    variant: u8,
}

impl InMemoryConfigStore {
    pub fn new(variant: u8) -> Self {
        Self {
            blob: None,
            variant,
        }
    }
}

impl ConfigPort for InMemoryConfigStore {
    fn load(&self) -> Result<DockConfig, ConfigError> {
        match &self.blob {
            Some(blob) => {
                let config: DockConfig =
                    postcard::from_bytes(blob).map_err(|_| ConfigError::Corrupted)?;
                config.validate().map_err(ConfigError::ValidationFailed)?;
                Ok(config)
            }
            None => {
                info!("no stored config, using defaults");
                Ok(DockConfig::default())
            }
        }
    }

    fn save(&mut self, config: &DockConfig) -> Result<(), ConfigError> {
        config.validate().map_err(ConfigError::ValidationFailed)?;
        let blob = postcard::to_allocvec(config).map_err(|_| ConfigError::Corrupted)?;
        if blob.len() > MAX_BLOB_LEN {
            warn!("config blob exceeds slot size");
            return Err(ConfigError::IoError);
        }
        self.blob = Some(blob);
        Ok(())
    }

    fn variant_byte(&self) -> u8 {
        self.variant
    }
}
