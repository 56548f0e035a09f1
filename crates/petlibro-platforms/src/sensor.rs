//! Sensor platform
//!
//! Per-product description tables drive which sensors exist for a device.
//! A handful of keys get reformatted on read (cup conversion, gram to ounce,
//! plan state text); everything else is the cached cloud value as-is.

use std::sync::{Arc, Mutex};

use tracing::debug;

use petlibro_core::{Device, DeviceKind, PetLibroHub, StateValue};

use crate::entity::{unique_id_with_mac, EntityDescription};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorDeviceClass {
    Battery,
    Enum,
    SignalStrength,
    Timestamp,
    Volume,
    Weight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorStateClass {
    Measurement,
    TotalIncreasing,
}

/// Declarative description of one sensor
#[derive(Clone, Copy)]
pub struct SensorDescription {
    pub entity: EntityDescription,
    pub device_class: Option<SensorDeviceClass>,
    pub state_class: Option<SensorStateClass>,
    pub native_unit: Option<&'static str>,
    pub unit_fn: Option<fn(&Device) -> Option<&'static str>>,
    pub device_class_fn: Option<fn(&Device) -> Option<SensorDeviceClass>>,
    pub should_report: Option<fn(&Device) -> bool>,
}

impl SensorDescription {
    pub const fn new(key: &'static str, name: &'static str) -> Self {
        Self {
            entity: EntityDescription::new(key, name),
            device_class: None,
            state_class: None,
            native_unit: None,
            unit_fn: None,
            device_class_fn: None,
            should_report: None,
        }
    }

    pub const fn icon(mut self, icon: &'static str) -> Self {
        self.entity = self.entity.icon(icon);
        self
    }

    pub const fn translation_key(mut self, translation_key: &'static str) -> Self {
        self.entity = self.entity.translation_key(translation_key);
        self
    }

    pub const fn device_class(mut self, device_class: SensorDeviceClass) -> Self {
        self.device_class = Some(device_class);
        self
    }

    pub const fn state_class(mut self, state_class: SensorStateClass) -> Self {
        self.state_class = Some(state_class);
        self
    }

    pub const fn unit(mut self, unit: &'static str) -> Self {
        self.native_unit = Some(unit);
        self
    }

    pub const fn unit_fn(mut self, f: fn(&Device) -> Option<&'static str>) -> Self {
        self.unit_fn = Some(f);
        self
    }

    pub const fn device_class_fn(mut self, f: fn(&Device) -> Option<SensorDeviceClass>) -> Self {
        self.device_class_fn = Some(f);
        self
    }

    pub const fn should_report(mut self, f: fn(&Device) -> bool) -> Self {
        self.should_report = Some(f);
        self
    }
}

/// Two-decimal rounding with ties going to the even neighbor
fn round2(value: f64) -> f64 {
    let scaled = value * 100.0;
    let floor = scaled.floor();
    if (scaled - floor - 0.5).abs() < 1e-9 {
        let even = if (floor as i64) % 2 == 0 {
            floor
        } else {
            floor + 1.0
        };
        return even / 100.0;
    }
    scaled.round() / 100.0
}

/// Gauge icon for a fill level percentage
pub fn icon_for_gauge_level(gauge_level: Option<i64>, offset: i64) -> &'static str {
    match gauge_level {
        None => "mdi:gauge-empty",
        Some(level) if level <= offset => "mdi:gauge-empty",
        Some(level) if level > 70 + offset => "mdi:gauge-full",
        Some(level) if level > 30 + offset => "mdi:gauge",
        Some(_) => "mdi:gauge-low",
    }
}

/// Dispensed quantities are reported in the unit picked in the vendor app
fn unit_of_measurement_feeder(device: &Device) -> Option<&'static str> {
    device.unit_type()
}

fn device_class_feeder(device: &Device) -> Option<SensorDeviceClass> {
    match device.unit_type() {
        Some("g") | Some("oz") => Some(SensorDeviceClass::Weight),
        Some("mL") => Some(SensorDeviceClass::Volume),
        _ => None,
    }
}

/// One sensor bound to a device
pub struct SensorEntity {
    device: Arc<Device>,
    description: &'static SensorDescription,
    unique_id: String,
    last_reported: Mutex<Option<StateValue>>,
}

impl SensorEntity {
    pub fn new(device: Arc<Device>, description: &'static SensorDescription) -> Self {
        let unique_id = unique_id_with_mac(&device, description.entity.key);
        Self {
            device,
            description,
            unique_id,
            last_reported: Mutex::new(None),
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

    pub fn description(&self) -> &'static SensorDescription {
        self.description
    }

    fn log_if_changed(&self, value: &Option<StateValue>) {
        let mut last = self.last_reported.lock().expect("sensor state lock poisoned");
        if last.as_ref() != value.as_ref() {
            debug!(
                serial = %self.device.serial(),
                key = self.key(),
                value = ?value,
                "Sensor state changed"
            );
            *last = value.clone();
        }
    }

    /// Current state, reformatted for the keys that need it
    pub fn native_value(&self) -> Option<StateValue> {
        let value = match self.key() {
            // plan state is surfaced as text rather than a raw bool
            "feeding_plan_state" => {
                let active = self.device.feeding_plan_state().unwrap_or(false);
                self.log_if_changed(&Some(StateValue::Bool(active)));
                return Some(StateValue::from(if active { "On" } else { "Off" }));
            }
            "today_eating_time" => Some(StateValue::Int(
                self.device.today_eating_time().unwrap_or(0),
            )),
            "today_feeding_quantity" => {
                let quantity = self.device.today_feeding_quantity().unwrap_or(0) as f64;
                let factor = match self.device.conversion_mode().as_deref() {
                    Some("1/24") => 1.0 / 24.0,
                    _ => 1.0 / 12.0,
                };
                let cups = round2(quantity * factor);
                Some(StateValue::from(cups.to_string()))
            }
            "wifi_rssi" => self.device.wifi_rssi().map(StateValue::from),
            "weight" => self
                .device
                .weight_grams()
                .map(|grams| StateValue::Float(round2(grams * 0.035274))),
            key => {
                if self
                    .description
                    .should_report
                    .map_or(true, |f| f(&self.device))
                {
                    self.device.value(key)
                } else {
                    None
                }
            }
        };
        self.log_if_changed(&value);
        value
    }

    pub fn icon(&self) -> Option<&'static str> {
        self.description.entity.icon
    }

    /// Unit shown for the state; a few keys always render in a fixed unit
    pub fn unit_of_measurement(&self) -> Option<&'static str> {
        match self.key() {
            "temperature" => Some("°F"),
            "today_feeding_quantity" => Some("cups"),
            "today_eating_time" => Some("s"),
            "wifi_rssi" => Some("dBm"),
            "weight" => Some("oz"),
            "use_water_interval" | "use_water_duration" => Some("min"),
            "weight_percent" | "electric_quantity" => Some("%"),
            _ => match self.description.unit_fn {
                Some(f) => f(&self.device),
                None => self.description.native_unit,
            },
        }
    }

    pub fn device_class(&self) -> Option<SensorDeviceClass> {
        if let Some(f) = self.description.device_class_fn {
            if let Some(class) = f(&self.device) {
                return Some(class);
            }
        }
        self.description.device_class
    }
}

const CONNECTIVITY_SENSORS: [SensorDescription; 4] = [
    SensorDescription::new("device_sn", "Device SN").icon("mdi:identifier"),
    SensorDescription::new("mac", "MAC Address")
        .translation_key("mac_address")
        .icon("mdi:network"),
    SensorDescription::new("wifi_ssid", "Wi-Fi SSID").icon("mdi:wifi"),
    SensorDescription::new("wifi_rssi", "Wi-Fi Signal Strength")
        .icon("mdi:wifi")
        .unit("dBm")
        .device_class(SensorDeviceClass::SignalStrength)
        .state_class(SensorStateClass::Measurement),
];

const BATTERY_SENSORS: [SensorDescription; 2] = [
    SensorDescription::new("battery_state", "Battery Level").icon("mdi:battery"),
    SensorDescription::new("electric_quantity", "Battery / AC %")
        .icon("mdi:battery")
        .unit("%")
        .device_class(SensorDeviceClass::Battery)
        .state_class(SensorStateClass::Measurement),
];

const FEEDING_SENSORS: [SensorDescription; 3] = [
    SensorDescription::new("feeding_plan_state", "Feeding Plan State")
        .icon("mdi:calendar-check")
        .should_report(|device| device.feeding_plan_state().is_some()),
    SensorDescription::new("today_feeding_quantity", "Today Feeding Quantity")
        .icon("mdi:scale")
        .unit_fn(unit_of_measurement_feeder)
        .device_class_fn(device_class_feeder)
        .state_class(SensorStateClass::TotalIncreasing),
    SensorDescription::new("today_feeding_times", "Today Feeding Times")
        .icon("mdi:history")
        .state_class(SensorStateClass::TotalIncreasing),
];

const CHILD_LOCK_SENSOR: SensorDescription =
    SensorDescription::new("child_lock_switch", "Buttons Lock").icon("mdi:lock");

const REMAINING_DESICCANT_SENSOR: SensorDescription =
    SensorDescription::new("remaining_desiccant", "Remaining Desiccant Days").icon("mdi:package");

const AIR_SMART_FEEDER_SENSORS: [SensorDescription; 10] = [
    CONNECTIVITY_SENSORS[0],
    CONNECTIVITY_SENSORS[1],
    CONNECTIVITY_SENSORS[2],
    CONNECTIVITY_SENSORS[3],
    BATTERY_SENSORS[0],
    BATTERY_SENSORS[1],
    FEEDING_SENSORS[0],
    FEEDING_SENSORS[1],
    FEEDING_SENSORS[2],
    CHILD_LOCK_SENSOR,
];

const GRANARY_SMART_FEEDER_SENSORS: [SensorDescription; 11] = [
    CONNECTIVITY_SENSORS[0],
    CONNECTIVITY_SENSORS[1],
    CONNECTIVITY_SENSORS[2],
    CONNECTIVITY_SENSORS[3],
    REMAINING_DESICCANT_SENSOR,
    BATTERY_SENSORS[0],
    BATTERY_SENSORS[1],
    FEEDING_SENSORS[0],
    FEEDING_SENSORS[1],
    FEEDING_SENSORS[2],
    CHILD_LOCK_SENSOR,
];

const GRANARY_SMART_CAMERA_FEEDER_SENSORS: [SensorDescription; 16] = [
    CONNECTIVITY_SENSORS[0],
    SensorDescription::new("mac_address", "MAC Address").icon("mdi:network"),
    CONNECTIVITY_SENSORS[2],
    CONNECTIVITY_SENSORS[3],
    SensorDescription::new("remaining_desiccant", "Remaining Desiccant Days")
        .icon("mdi:package")
        .unit("days"),
    BATTERY_SENSORS[0],
    BATTERY_SENSORS[1],
    FEEDING_SENSORS[0],
    FEEDING_SENSORS[1],
    FEEDING_SENSORS[2],
    CHILD_LOCK_SENSOR,
    SensorDescription::new("resolution", "Camera Resolution")
        .icon("mdi:camera")
        .should_report(|device| device.resolution().is_some()),
    SensorDescription::new("night_vision", "Night Vision Mode")
        .icon("mdi:weather-night")
        .should_report(|device| device.night_vision().is_some()),
    SensorDescription::new("enable_video_record", "Video Recording Enabled")
        .icon("mdi:video")
        .should_report(|device| device.enable_video_record().is_some()),
    SensorDescription::new("video_record_switch", "Video Recording Switch")
        .icon("mdi:video-outline")
        .should_report(|device| device.video_record_switch().is_some()),
    SensorDescription::new("video_record_mode", "Video Recording Mode")
        .icon("mdi:motion-sensor")
        .should_report(|device| device.video_record_mode().is_some()),
];

const ONE_RFID_SMART_FEEDER_SENSORS: [SensorDescription; 12] = [
    CONNECTIVITY_SENSORS[0],
    CONNECTIVITY_SENSORS[1],
    CONNECTIVITY_SENSORS[2],
    CONNECTIVITY_SENSORS[3],
    REMAINING_DESICCANT_SENSOR,
    BATTERY_SENSORS[0],
    BATTERY_SENSORS[1],
    FEEDING_SENSORS[0],
    FEEDING_SENSORS[1],
    FEEDING_SENSORS[2],
    SensorDescription::new("today_eating_times", "Today Eating Times")
        .icon("mdi:history")
        .state_class(SensorStateClass::TotalIncreasing),
    SensorDescription::new("today_eating_time", "Today Eating Time")
        .icon("mdi:history")
        .unit("s")
        .state_class(SensorStateClass::TotalIncreasing),
];

const POLAR_WET_FOOD_FEEDER_SENSORS: [SensorDescription; 11] = [
    CONNECTIVITY_SENSORS[0],
    CONNECTIVITY_SENSORS[1],
    CONNECTIVITY_SENSORS[3],
    CONNECTIVITY_SENSORS[2],
    BATTERY_SENSORS[0],
    BATTERY_SENSORS[1],
    SensorDescription::new("feeding_plan_state", "Feeding Plan")
        .translation_key("feeding_plan")
        .icon("mdi:calendar-check")
        .should_report(|device| device.feeding_plan_state().is_some()),
    SensorDescription::new("next_feeding_time", "Feeding Begins")
        .icon("mdi:clock-outline")
        .device_class(SensorDeviceClass::Timestamp),
    SensorDescription::new("next_feeding_end_time", "Feeding Ends")
        .icon("mdi:clock-end")
        .device_class(SensorDeviceClass::Timestamp),
    SensorDescription::new("plate_position", "Plate Position")
        .icon("mdi:rotate-3d-variant")
        .should_report(|device| device.plate_position().is_some()),
    SensorDescription::new("active_feeding_plan_name", "Active feeding plan")
        .icon("mdi:notebook"),
];

const FOUNTAIN_SENSORS: [SensorDescription; 10] = [
    CONNECTIVITY_SENSORS[0],
    CONNECTIVITY_SENSORS[1],
    CONNECTIVITY_SENSORS[2],
    CONNECTIVITY_SENSORS[3],
    SensorDescription::new("remaining_cleaning_days", "Remaining Cleaning Days")
        .icon("mdi:package"),
    SensorDescription::new("weight", "Current Weight")
        .icon("mdi:scale")
        .unit("oz")
        .device_class(SensorDeviceClass::Weight)
        .state_class(SensorStateClass::Measurement),
    SensorDescription::new("weight_percent", "Current Weight Percent")
        .icon("mdi:scale")
        .unit("%")
        .state_class(SensorStateClass::Measurement),
    SensorDescription::new("use_water_interval", "Water Interval")
        .icon("mdi:water")
        .unit("min"),
    SensorDescription::new("use_water_duration", "Water Time Duration")
        .icon("mdi:water")
        .unit("min"),
    SensorDescription::new("remaining_filter_days", "Remaining Filter Days")
        .icon("mdi:package")
        .unit("days"),
];

/// Sensor descriptions applicable to a product
pub fn sensor_descriptions(kind: DeviceKind) -> &'static [SensorDescription] {
    match kind {
        DeviceKind::AirSmartFeeder => &AIR_SMART_FEEDER_SENSORS,
        DeviceKind::GranarySmartFeeder => &GRANARY_SMART_FEEDER_SENSORS,
        DeviceKind::GranarySmartCameraFeeder => &GRANARY_SMART_CAMERA_FEEDER_SENSORS,
        DeviceKind::OneRfidSmartFeeder => &ONE_RFID_SMART_FEEDER_SENSORS,
        DeviceKind::PolarWetFoodFeeder => &POLAR_WET_FOOD_FEEDER_SENSORS,
        DeviceKind::DockstreamSmartFountain | DeviceKind::DockstreamSmartRfidFountain => {
            &FOUNTAIN_SENSORS
        }
    }
}

/// Sensors for every device known to the hub
pub fn build_sensors(hub: &PetLibroHub) -> Vec<SensorEntity> {
    let entities: Vec<SensorEntity> = hub
        .devices()
        .into_iter()
        .flat_map(|device| {
            sensor_descriptions(device.kind())
                .iter()
                .map(move |description| SensorEntity::new(device.clone(), description))
        })
        .collect();
    debug!(count = entities.len(), "Built sensor entities");
    entities
}
