//! Binary sensor platform
//!
//! Connectivity transitions are logged at INFO/WARNING so an appliance going
//! offline is visible without debug logging.

use std::sync::{Arc, Mutex};

use tracing::{debug, info, warn};

use petlibro_core::{Device, DeviceKind, PetLibroHub};

use crate::entity::{unique_id, EntityDescription};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinarySensorDeviceClass {
    Battery,
    Connectivity,
    Door,
    Lock,
    Power,
    Problem,
}

/// Declarative description of one binary sensor
#[derive(Clone, Copy)]
pub struct BinarySensorDescription {
    pub entity: EntityDescription,
    pub device_class: Option<BinarySensorDeviceClass>,
    pub should_report: Option<fn(&Device) -> bool>,
}

impl BinarySensorDescription {
    pub const fn new(key: &'static str, name: &'static str) -> Self {
        Self {
            entity: EntityDescription::new(key, name),
            device_class: None,
            should_report: None,
        }
    }

    pub const fn icon(mut self, icon: &'static str) -> Self {
        self.entity = self.entity.icon(icon);
        self
    }

    pub const fn device_class(mut self, device_class: BinarySensorDeviceClass) -> Self {
        self.device_class = Some(device_class);
        self
    }

    pub const fn should_report(mut self, f: fn(&Device) -> bool) -> Self {
        self.should_report = Some(f);
        self
    }
}

/// One binary sensor bound to a device
pub struct BinarySensorEntity {
    device: Arc<Device>,
    description: &'static BinarySensorDescription,
    unique_id: String,
    last_state: Mutex<Option<bool>>,
}

impl BinarySensorEntity {
    pub fn new(device: Arc<Device>, description: &'static BinarySensorDescription) -> Self {
        let unique_id = unique_id(&device, description.entity.key);
        Self {
            device,
            description,
            unique_id,
            last_state: Mutex::new(None),
        }
    }

    pub fn key(&self) -> &'static str {
        self.description.entity.key
    }

    pub fn name(&self) -> &'static str {
        self.description.entity.name
    }

    pub fn unique_id(&self) -> &str {
        &self.unique_id
    }

    pub fn device(&self) -> &Arc<Device> {
        &self.device
    }

    pub fn device_class(&self) -> Option<BinarySensorDeviceClass> {
        self.description.device_class
    }

    pub fn icon(&self) -> Option<&'static str> {
        self.description.entity.icon
    }

    /// Current state; reads as off while the device does not report the key
    pub fn is_on(&self) -> bool {
        if !self
            .description
            .should_report
            .map_or(true, |f| f(&self.device))
        {
            return false;
        }
        let state = self
            .device
            .value(self.key())
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
        self.log_transition(state);
        state
    }

    fn log_transition(&self, state: bool) {
        let mut last = self.last_state.lock().expect("binary sensor lock poisoned");
        if *last == Some(state) {
            return;
        }
        if self.key() == "online" {
            if state {
                info!(serial = %self.device.serial(), "Device is online");
            } else {
                warn!(serial = %self.device.serial(), "Device went offline");
            }
        } else {
            debug!(
                serial = %self.device.serial(),
                key = self.key(),
                state,
                "Binary sensor state changed"
            );
        }
        *last = Some(state);
    }
}

const ONLINE_SENSOR: BinarySensorDescription = BinarySensorDescription::new("online", "Wi-Fi")
    .icon("mdi:wifi")
    .device_class(BinarySensorDeviceClass::Connectivity)
    .should_report(|device| device.online().is_some());

const LOW_BATTERY_SENSOR: BinarySensorDescription =
    BinarySensorDescription::new("enable_low_battery_notice", "Battery Status")
        .icon("mdi:battery-alert")
        .device_class(BinarySensorDeviceClass::Battery)
        .should_report(|device| device.enable_low_battery_notice().is_some());

const DRY_FEEDER_SENSORS: [BinarySensorDescription; 5] = [
    BinarySensorDescription::new("food_dispenser_state", "Food Dispenser")
        .icon("mdi:bowl-outline")
        .device_class(BinarySensorDeviceClass::Problem)
        .should_report(|device| device.food_dispenser_state().is_some()),
    BinarySensorDescription::new("food_low", "Food Status")
        .icon("mdi:bowl-mix-outline")
        .device_class(BinarySensorDeviceClass::Problem)
        .should_report(|device| device.food_low().is_some()),
    ONLINE_SENSOR,
    BinarySensorDescription::new("whether_in_sleep_mode", "Sleep Mode")
        .icon("mdi:sleep")
        .device_class(BinarySensorDeviceClass::Power)
        .should_report(|device| device.whether_in_sleep_mode().is_some()),
    LOW_BATTERY_SENSOR,
];

const ONE_RFID_SMART_FEEDER_SENSORS: [BinarySensorDescription; 10] = [
    BinarySensorDescription::new("door_state", "Lid")
        .icon("mdi:door")
        .device_class(BinarySensorDeviceClass::Door)
        .should_report(|device| device.door_state().is_some()),
    DRY_FEEDER_SENSORS[0],
    BinarySensorDescription::new("door_blocked", "Lid Status")
        .icon("mdi:door")
        .device_class(BinarySensorDeviceClass::Problem)
        .should_report(|device| device.door_blocked().is_some()),
    DRY_FEEDER_SENSORS[1],
    ONLINE_SENSOR,
    DRY_FEEDER_SENSORS[3],
    LOW_BATTERY_SENSOR,
    BinarySensorDescription::new("sound_switch", "Sound Status")
        .icon("mdi:volume-high")
        .should_report(|device| device.sound_switch().is_some()),
    BinarySensorDescription::new("child_lock_switch", "Buttons Lock")
        .icon("mdi:lock")
        .device_class(BinarySensorDeviceClass::Lock)
        .should_report(|device| device.child_lock_switch().is_some()),
    BinarySensorDescription::new("display_switch", "Display Status")
        .icon("mdi:monitor-star")
        .should_report(|device| device.display_switch().is_some()),
];

const POLAR_WET_FOOD_FEEDER_SENSORS: [BinarySensorDescription; 3] = [
    ONLINE_SENSOR,
    LOW_BATTERY_SENSOR,
    BinarySensorDescription::new("door_blocked", "Lid Status")
        .icon("mdi:door-closed-lock")
        .device_class(BinarySensorDeviceClass::Problem)
        .should_report(|device| device.door_blocked().is_some()),
];

const FOUNTAIN_SENSORS: [BinarySensorDescription; 1] = [ONLINE_SENSOR];

/// Binary sensor descriptions applicable to a product
pub fn binary_sensor_descriptions(kind: DeviceKind) -> &'static [BinarySensorDescription] {
    match kind {
        DeviceKind::AirSmartFeeder
        | DeviceKind::GranarySmartFeeder
        | DeviceKind::GranarySmartCameraFeeder => &DRY_FEEDER_SENSORS,
        DeviceKind::OneRfidSmartFeeder => &ONE_RFID_SMART_FEEDER_SENSORS,
        DeviceKind::PolarWetFoodFeeder => &POLAR_WET_FOOD_FEEDER_SENSORS,
        DeviceKind::DockstreamSmartFountain | DeviceKind::DockstreamSmartRfidFountain => {
            &FOUNTAIN_SENSORS
        }
    }
}

/// Binary sensors for every device known to the hub
pub fn build_binary_sensors(hub: &PetLibroHub) -> Vec<BinarySensorEntity> {
    let entities: Vec<BinarySensorEntity> = hub
        .devices()
        .into_iter()
        .flat_map(|device| {
            binary_sensor_descriptions(device.kind())
                .iter()
                .map(move |description| BinarySensorEntity::new(device.clone(), description))
        })
        .collect();
    debug!(count = entities.len(), "Built binary sensor entities");
    entities
}

#[cfg(test)]
mod tests {
    use super::*;
    use petlibro_api::PetLibroApi;
    use serde_json::json;

    fn device(kind: DeviceKind, data: serde_json::Value) -> Arc<Device> {
        let api = Arc::new(PetLibroApi::with_base_url("http://localhost:1").unwrap());
        Arc::new(Device::new(kind, data, api))
    }

    fn find(kind: DeviceKind, key: &str) -> &'static BinarySensorDescription {
        binary_sensor_descriptions(kind)
            .iter()
            .find(|d| d.entity.key == key)
            .unwrap()
    }

    #[test]
    fn test_map_sizes() {
        assert_eq!(
            binary_sensor_descriptions(DeviceKind::AirSmartFeeder).len(),
            5
        );
        assert_eq!(
            binary_sensor_descriptions(DeviceKind::OneRfidSmartFeeder).len(),
            10
        );
        assert_eq!(
            binary_sensor_descriptions(DeviceKind::PolarWetFoodFeeder).len(),
            3
        );
        assert_eq!(
            binary_sensor_descriptions(DeviceKind::DockstreamSmartRfidFountain).len(),
            1
        );
    }

    #[test]
    fn test_food_low_inverts_surplus() {
        let dev = device(DeviceKind::GranarySmartFeeder, json!({"surplusGrain": false}));
        let sensor = BinarySensorEntity::new(dev, find(DeviceKind::GranarySmartFeeder, "food_low"));
        assert!(sensor.is_on());
    }

    #[test]
    fn test_unreported_key_reads_off() {
        let dev = device(DeviceKind::GranarySmartFeeder, json!({}));
        let sensor = BinarySensorEntity::new(dev, find(DeviceKind::GranarySmartFeeder, "online"));
        assert!(!sensor.is_on());
    }

    #[test]
    fn test_door_blocked_reads_real_info() {
        let dev = device(DeviceKind::OneRfidSmartFeeder, json!({}));
        dev.update_data(json!({"realInfo": {"barnDoorError": true}}));
        let sensor =
            BinarySensorEntity::new(dev, find(DeviceKind::OneRfidSmartFeeder, "door_blocked"));
        assert!(sensor.is_on());
    }

    #[test]
    fn test_unique_id_has_no_mac_suffix() {
        let dev = device(
            DeviceKind::AirSmartFeeder,
            json!({"deviceSn": "A1", "mac": "00:11:22:33:44:55"}),
        );
        let sensor = BinarySensorEntity::new(dev, find(DeviceKind::AirSmartFeeder, "online"));
        assert_eq!(sensor.unique_id(), "A1-online");
    }
}
