//! Shared entity plumbing
//!
//! Every platform entity is described declaratively and bound to one
//! [`Device`]. The description carries the stable key, display name and
//! presentation hints; the entity reads its state from the device cache.

use petlibro_core::Device;

pub const MANUFACTURER: &str = "PETLIBRO";

/// Registry category an entity is filed under
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityCategory {
    Config,
    Diagnostic,
}

/// Presentation-independent part of every entity description
#[derive(Debug, Clone, Copy)]
pub struct EntityDescription {
    pub key: &'static str,
    pub translation_key: &'static str,
    pub name: &'static str,
    pub icon: Option<&'static str>,
    pub entity_category: Option<EntityCategory>,
}

impl EntityDescription {
    pub const fn new(key: &'static str, name: &'static str) -> Self {
        Self {
            key,
            translation_key: key,
            name,
            icon: None,
            entity_category: None,
        }
    }

    pub const fn icon(mut self, icon: &'static str) -> Self {
        self.icon = Some(icon);
        self
    }

    pub const fn translation_key(mut self, translation_key: &'static str) -> Self {
        self.translation_key = translation_key;
        self
    }

    pub const fn category(mut self, category: EntityCategory) -> Self {
        self.entity_category = Some(category);
        self
    }
}

/// Stable identifier for an entity: serial plus description key
pub fn unique_id(device: &Device, key: &str) -> String {
    format!("{}-{}", device.serial(), key)
}

/// Sensor variant of the unique id, suffixed with the colon-free MAC when
/// the device reports one
pub fn unique_id_with_mac(device: &Device, key: &str) -> String {
    match device.mac() {
        Some(mac) => format!("{}-{}-{}", device.serial(), key, mac.replace(':', "")),
        None => unique_id(device, key),
    }
}

/// Registry metadata describing the physical appliance behind an entity
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceInfo {
    pub identifier: String,
    pub manufacturer: &'static str,
    pub model: Option<String>,
    pub name: String,
    pub sw_version: Option<String>,
    pub hw_version: Option<String>,
}

pub fn device_info(device: &Device) -> DeviceInfo {
    DeviceInfo {
        identifier: device.serial(),
        manufacturer: MANUFACTURER,
        model: device.model(),
        name: device.name(),
        sw_version: device.software_version(),
        hw_version: device.hardware_version(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use petlibro_api::PetLibroApi;
    use petlibro_core::DeviceKind;
    use serde_json::json;
    use std::sync::Arc;

    fn device(data: serde_json::Value) -> Device {
        let api = Arc::new(PetLibroApi::with_base_url("http://localhost:1").unwrap());
        Device::new(DeviceKind::GranarySmartFeeder, data, api)
    }

    #[test]
    fn test_unique_id() {
        let dev = device(json!({"deviceSn": "SN9"}));
        assert_eq!(unique_id(&dev, "online"), "SN9-online");
    }

    #[test]
    fn test_unique_id_with_mac_strips_colons() {
        let dev = device(json!({"deviceSn": "SN9", "mac": "AA:BB:CC:DD:EE:FF"}));
        assert_eq!(
            unique_id_with_mac(&dev, "wifi_rssi"),
            "SN9-wifi_rssi-AABBCCDDEEFF"
        );
    }

    #[test]
    fn test_unique_id_with_mac_missing_mac() {
        let dev = device(json!({"deviceSn": "SN9"}));
        assert_eq!(unique_id_with_mac(&dev, "wifi_rssi"), "SN9-wifi_rssi");
    }

    #[test]
    fn test_device_info() {
        let dev = device(json!({
            "deviceSn": "SN9",
            "name": "Hallway",
            "productIdentifier": "PLAF103",
            "softwareVersion": "1.2.3",
        }));
        let info = device_info(&dev);
        assert_eq!(info.identifier, "SN9");
        assert_eq!(info.manufacturer, "PETLIBRO");
        assert_eq!(info.model.as_deref(), Some("PLAF103"));
        assert_eq!(info.name, "Hallway");
        assert_eq!(info.sw_version.as_deref(), Some("1.2.3"));
    }
}
