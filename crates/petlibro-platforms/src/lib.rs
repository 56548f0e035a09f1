//! Entity platforms for PETLIBRO devices
//!
//! Each platform module carries per-product description tables and an entity
//! type that binds a description to a [`petlibro_core::Device`]. The
//! `build_*` functions expand a hub's device list into the full entity set.

pub mod binary_sensor;
pub mod button;
pub mod entity;
pub mod number;
pub mod sensor;
pub mod switch;
pub mod wet_feeding;

pub use binary_sensor::{build_binary_sensors, BinarySensorDeviceClass, BinarySensorEntity};
pub use button::{build_buttons, ButtonAction, ButtonEntity};
pub use entity::{device_info, DeviceInfo, EntityCategory, EntityDescription};
pub use number::{build_numbers, NumberEntity, NumberMode};
pub use sensor::{build_sensors, SensorDeviceClass, SensorEntity, SensorStateClass};
pub use switch::{build_switches, SwitchEntity};
pub use wet_feeding::{build_wet_feeding_plates, PlateState, WetFeedingPlanPlateEntity};
