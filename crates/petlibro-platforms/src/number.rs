//! Number platform

use std::sync::Arc;

use tracing::debug;

use petlibro_api::ApiResult;
use petlibro_core::{Device, DeviceKind, PetLibroHub};

use crate::entity::{unique_id, EntityCategory, EntityDescription};

/// Setting a number entity writes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberAction {
    DesiccantFrequency,
    SoundLevel,
}

/// Frontend input style for a number entity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberMode {
    Auto,
    Box,
    Slider,
}

/// Declarative description of one number entity
#[derive(Clone, Copy)]
pub struct NumberDescription {
    pub entity: EntityDescription,
    pub action: NumberAction,
    pub unit: Option<&'static str>,
    pub min: f64,
    pub max: f64,
    pub step: f64,
    pub mode: NumberMode,
}

impl NumberDescription {
    pub const fn new(key: &'static str, name: &'static str, action: NumberAction) -> Self {
        Self {
            entity: EntityDescription::new(key, name).category(EntityCategory::Config),
            action,
            unit: None,
            min: 0.0,
            max: 100.0,
            step: 1.0,
            mode: NumberMode::Auto,
        }
    }

    pub const fn icon(mut self, icon: &'static str) -> Self {
        self.entity = self.entity.icon(icon);
        self
    }

    pub const fn unit(mut self, unit: &'static str) -> Self {
        self.unit = Some(unit);
        self
    }

    pub const fn range(mut self, min: f64, max: f64, step: f64) -> Self {
        self.min = min;
        self.max = max;
        self.step = step;
        self
    }

    pub const fn mode(mut self, mode: NumberMode) -> Self {
        self.mode = mode;
        self
    }
}

/// One number entity bound to a device
pub struct NumberEntity {
    device: Arc<Device>,
    description: &'static NumberDescription,
    unique_id: String,
}

impl NumberEntity {
    pub fn new(device: Arc<Device>, description: &'static NumberDescription) -> Self {
        let unique_id = unique_id(&device, description.entity.key);
        Self {
            device,
            description,
            unique_id,
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

    pub fn description(&self) -> &'static NumberDescription {
        self.description
    }

    pub fn native_value(&self) -> Option<f64> {
        let value = match self.description.action {
            NumberAction::DesiccantFrequency => self.device.desiccant_frequency(),
            NumberAction::SoundLevel => self.device.sound_level(),
        };
        value.map(|v| v as f64)
    }

    /// Write the value to the cloud, clamped to the entity range
    pub async fn set_native_value(&self, value: f64) -> ApiResult<()> {
        let value = value.clamp(self.description.min, self.description.max).round() as u32;
        debug!(serial = %self.device.serial(), key = self.key(), value, "Setting number");
        match self.description.action {
            NumberAction::DesiccantFrequency => self.device.set_desiccant_frequency(value).await,
            NumberAction::SoundLevel => self.device.set_sound_level(value).await,
        }
    }
}

const ONE_RFID_SMART_FEEDER_NUMBERS: [NumberDescription; 2] = [
    NumberDescription::new(
        "desiccant_frequency",
        "Desiccant Frequency",
        NumberAction::DesiccantFrequency,
    )
    .icon("mdi:calendar-alert")
    .unit("Days")
    .range(1.0, 60.0, 1.0)
    .mode(NumberMode::Box),
    NumberDescription::new("sound_level", "Sound Level", NumberAction::SoundLevel)
        .icon("mdi:volume-high")
        .unit("%")
        .range(1.0, 100.0, 1.0),
];

/// Number descriptions applicable to a product
pub fn number_descriptions(kind: DeviceKind) -> &'static [NumberDescription] {
    match kind {
        DeviceKind::OneRfidSmartFeeder => &ONE_RFID_SMART_FEEDER_NUMBERS,
        _ => &[],
    }
}

/// Number entities for every device known to the hub
pub fn build_numbers(hub: &PetLibroHub) -> Vec<NumberEntity> {
    let entities: Vec<NumberEntity> = hub
        .devices()
        .into_iter()
        .flat_map(|device| {
            number_descriptions(device.kind())
                .iter()
                .map(move |description| NumberEntity::new(device.clone(), description))
        })
        .collect();
    debug!(count = entities.len(), "Built number entities");
    entities
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use petlibro_api::PetLibroApi;
    use serde_json::json;

    fn find(key: &str) -> &'static NumberDescription {
        number_descriptions(DeviceKind::OneRfidSmartFeeder)
            .iter()
            .find(|d| d.entity.key == key)
            .unwrap()
    }

    #[test]
    fn test_only_one_rfid_has_numbers() {
        assert_eq!(number_descriptions(DeviceKind::OneRfidSmartFeeder).len(), 2);
        assert!(number_descriptions(DeviceKind::GranarySmartFeeder).is_empty());
        assert!(number_descriptions(DeviceKind::DockstreamSmartFountain).is_empty());
    }

    #[test]
    fn test_desiccant_frequency_range() {
        let desc = find("desiccant_frequency");
        assert_eq!((desc.min, desc.max, desc.step), (1.0, 60.0, 1.0));
        assert_eq!(desc.mode, NumberMode::Box);
        assert_eq!(desc.unit, Some("Days"));
    }

    #[test]
    fn test_native_value_reads_cache() {
        let api = Arc::new(PetLibroApi::with_base_url("http://localhost:1").unwrap());
        let dev = Arc::new(Device::new(
            DeviceKind::OneRfidSmartFeeder,
            json!({"volume": 35}),
            api,
        ));
        let number = NumberEntity::new(dev, find("sound_level"));
        assert_eq!(number.native_value(), Some(35.0));
    }

    #[tokio::test]
    async fn test_set_value_clamps_to_range() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/member/auth/login")
            .with_status(200)
            .with_body(json!({"code": 0, "data": {"token": "t"}}).to_string())
            .create_async()
            .await;
        let mock = server
            .mock("POST", "/device/setting/updateAttributeSetting")
            .match_body(Matcher::Json(
                json!({"deviceSn": "SN1", "desiccantFrequency": 60}),
            ))
            .with_status(200)
            .with_body(json!({"code": 0}).to_string())
            .create_async()
            .await;

        let api = Arc::new(PetLibroApi::with_base_url(server.url()).unwrap());
        api.login("user@example.com", "digest").await.unwrap();
        let dev = Arc::new(Device::new(
            DeviceKind::OneRfidSmartFeeder,
            json!({"deviceSn": "SN1"}),
            api,
        ));
        let number = NumberEntity::new(dev, find("desiccant_frequency"));

        number.set_native_value(90.0).await.unwrap();
        mock.assert_async().await;
    }
}
