//! Switch platform
//!
//! Feeders expose their scheduled feeding plan as a switch, mirroring the
//! enable/disable button pair with a stateful control.

use std::sync::Arc;

use tracing::debug;

use petlibro_api::ApiResult;
use petlibro_core::{Device, DeviceKind, PetLibroHub};

use crate::entity::{unique_id, EntityDescription};

/// Cloud setting a switch toggles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchAction {
    FeedingPlan,
}

/// Declarative description of one switch
#[derive(Clone, Copy)]
pub struct SwitchDescription {
    pub entity: EntityDescription,
    pub action: SwitchAction,
}

impl SwitchDescription {
    pub const fn new(key: &'static str, name: &'static str, action: SwitchAction) -> Self {
        Self {
            entity: EntityDescription::new(key, name),
            action,
        }
    }

    pub const fn icon(mut self, icon: &'static str) -> Self {
        self.entity = self.entity.icon(icon);
        self
    }
}

/// One switch bound to a device
pub struct SwitchEntity {
    device: Arc<Device>,
    description: &'static SwitchDescription,
    unique_id: String,
}

impl SwitchEntity {
    pub fn new(device: Arc<Device>, description: &'static SwitchDescription) -> Self {
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

    pub fn is_on(&self) -> bool {
        match self.description.action {
            SwitchAction::FeedingPlan => self.device.feeding_plan_state().unwrap_or(false),
        }
    }

    pub async fn turn_on(&self) -> ApiResult<()> {
        self.set(true).await
    }

    pub async fn turn_off(&self) -> ApiResult<()> {
        self.set(false).await
    }

    async fn set(&self, on: bool) -> ApiResult<()> {
        debug!(serial = %self.device.serial(), key = self.key(), on, "Setting switch");
        match self.description.action {
            SwitchAction::FeedingPlan => self.device.set_feeding_plan(on).await?,
        }
        self.device.refresh().await
    }
}

const FEEDING_PLAN_SWITCH: [SwitchDescription; 1] = [SwitchDescription::new(
    "feeding_plan",
    "Feeding Plan",
    SwitchAction::FeedingPlan,
)
.icon("mdi:calendar-check")];

/// Switch descriptions applicable to a product
pub fn switch_descriptions(kind: DeviceKind) -> &'static [SwitchDescription] {
    match kind {
        DeviceKind::AirSmartFeeder
        | DeviceKind::GranarySmartFeeder
        | DeviceKind::GranarySmartCameraFeeder
        | DeviceKind::OneRfidSmartFeeder => &FEEDING_PLAN_SWITCH,
        DeviceKind::PolarWetFoodFeeder
        | DeviceKind::DockstreamSmartFountain
        | DeviceKind::DockstreamSmartRfidFountain => &[],
    }
}

/// Switches for every device known to the hub
pub fn build_switches(hub: &PetLibroHub) -> Vec<SwitchEntity> {
    let entities: Vec<SwitchEntity> = hub
        .devices()
        .into_iter()
        .flat_map(|device| {
            switch_descriptions(device.kind())
                .iter()
                .map(move |description| SwitchEntity::new(device.clone(), description))
        })
        .collect();
    debug!(count = entities.len(), "Built switch entities");
    entities
}
