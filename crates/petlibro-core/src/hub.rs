//! Account hub
//!
//! The hub owns the API client and the set of devices registered to the
//! account. It discovers devices from the cloud device list and drives the
//! per-device refresh that the polling coordinator schedules.

use std::sync::Arc;

use dashmap::DashMap;
use serde_json::Value;
use tracing::{debug, info, warn};

use petlibro_api::{ApiResult, PetLibroApi};

use crate::config::PetLibroConfig;
use crate::device::Device;
use crate::kind::DeviceKind;

/// One PETLIBRO account and its devices
pub struct PetLibroHub {
    api: Arc<PetLibroApi>,
    devices: DashMap<String, Arc<Device>>,
}

impl PetLibroHub {
    /// Wrap an already-authenticated client
    pub fn new(api: Arc<PetLibroApi>) -> Self {
        Self {
            api,
            devices: DashMap::new(),
        }
    }

    /// Log in with the configured credentials and discover devices
    pub async fn connect(config: &PetLibroConfig) -> ApiResult<Self> {
        let api = Arc::new(PetLibroApi::new(config.region)?);
        api.login(&config.email, &config.password).await?;
        let hub = Self::new(api);
        hub.load_devices().await?;
        Ok(hub)
    }

    pub fn api(&self) -> &Arc<PetLibroApi> {
        &self.api
    }

    /// Fetch the account device list and register every supported appliance
    ///
    /// Devices seen before keep their cached state and only merge the fresh
    /// list payload. Unsupported products are skipped with a warning.
    pub async fn load_devices(&self) -> ApiResult<()> {
        for payload in self.api.list_devices().await? {
            let Some(product) = payload.get("productName").and_then(Value::as_str) else {
                warn!("Device list entry without a productName, skipping");
                continue;
            };
            let Some(kind) = DeviceKind::from_product_name(product) else {
                warn!(product, "Unsupported PETLIBRO product, skipping");
                continue;
            };
            let Some(serial) = payload.get("deviceSn").and_then(Value::as_str) else {
                warn!(product, "Device list entry without a serial, skipping");
                continue;
            };

            match self.devices.get(serial) {
                Some(existing) => existing.update_data(payload.clone()),
                None => {
                    info!(serial, product, "Discovered device");
                    let device = Arc::new(Device::new(kind, payload.clone(), self.api.clone()));
                    self.devices.insert(serial.to_string(), device);
                }
            }
        }
        debug!(count = self.devices.len(), "Device list loaded");
        Ok(())
    }

    /// Refresh every device's cloud state
    ///
    /// A failing device does not stop the others; returns whether the whole
    /// cycle succeeded. Works on a snapshot of the registry so no map guard
    /// is held while a refresh is in flight and a concurrent
    /// `load_devices()` can insert freely.
    pub async fn refresh_devices(&self) -> bool {
        let mut all_ok = true;
        for device in self.devices() {
            if let Err(err) = device.refresh().await {
                warn!(serial = %device.serial(), error = %err, "Device refresh failed");
                all_ok = false;
            }
        }
        all_ok
    }

    /// All known devices
    pub fn devices(&self) -> Vec<Arc<Device>> {
        self.devices.iter().map(|e| e.value().clone()).collect()
    }

    /// Look up a device by serial
    pub fn device(&self, serial: &str) -> Option<Arc<Device>> {
        self.devices.get(serial).map(|e| e.value().clone())
    }
}
