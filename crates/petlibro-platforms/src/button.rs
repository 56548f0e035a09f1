//! Button platform
//!
//! Buttons fire a cloud command and immediately refresh the device so the
//! dependent sensors reflect the new state without waiting for the next poll.

use std::sync::Arc;

use tracing::debug;

use petlibro_api::ApiResult;
use petlibro_core::{Device, DeviceKind, PetLibroHub};

use crate::entity::{unique_id, EntityCategory, EntityDescription};

/// Cloud command a button fires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonAction {
    ManualFeed,
    EnableFeedingPlan,
    DisableFeedingPlan,
    ManualLidOpen,
    DisplayOn,
    DisplayOff,
    SoundOn,
    SoundOff,
    DesiccantReset,
}

/// Declarative description of one button
#[derive(Clone, Copy)]
pub struct ButtonDescription {
    pub entity: EntityDescription,
    pub action: ButtonAction,
}

impl ButtonDescription {
    pub const fn new(key: &'static str, name: &'static str, action: ButtonAction) -> Self {
        Self {
            entity: EntityDescription::new(key, name).category(EntityCategory::Config),
            action,
        }
    }
}

/// One button bound to a device
pub struct ButtonEntity {
    device: Arc<Device>,
    description: &'static ButtonDescription,
    unique_id: String,
}

impl ButtonEntity {
    pub fn new(device: Arc<Device>, description: &'static ButtonDescription) -> Self {
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

    pub fn action(&self) -> ButtonAction {
        self.description.action
    }

    /// Buttons are only usable while the appliance is reachable
    pub fn available(&self) -> bool {
        self.device.online().unwrap_or(false)
    }

    /// Fire the command and refresh the device state
    pub async fn press(&self) -> ApiResult<()> {
        debug!(serial = %self.device.serial(), key = self.key(), "Button pressed");
        match self.description.action {
            ButtonAction::ManualFeed => self.device.set_manual_feed().await?,
            ButtonAction::EnableFeedingPlan => self.device.set_feeding_plan(true).await?,
            ButtonAction::DisableFeedingPlan => self.device.set_feeding_plan(false).await?,
            ButtonAction::ManualLidOpen => self.device.set_manual_lid_open().await?,
            ButtonAction::DisplayOn => self.device.set_display(true).await?,
            ButtonAction::DisplayOff => self.device.set_display(false).await?,
            ButtonAction::SoundOn => self.device.set_sound(true).await?,
            ButtonAction::SoundOff => self.device.set_sound(false).await?,
            ButtonAction::DesiccantReset => self.device.set_desiccant_reset().await?,
        }
        self.device.refresh().await
    }
}

const DRY_FEEDER_BUTTONS: [ButtonDescription; 3] = [
    ButtonDescription::new("manual_feed", "Manual Feed", ButtonAction::ManualFeed),
    ButtonDescription::new(
        "enable_feeding_plan",
        "Enable Feeding Plan",
        ButtonAction::EnableFeedingPlan,
    ),
    ButtonDescription::new(
        "disable_feeding_plan",
        "Disable Feeding Plan",
        ButtonAction::DisableFeedingPlan,
    ),
];

const ONE_RFID_SMART_FEEDER_BUTTONS: [ButtonDescription; 9] = [
    DRY_FEEDER_BUTTONS[0],
    DRY_FEEDER_BUTTONS[1],
    DRY_FEEDER_BUTTONS[2],
    ButtonDescription::new(
        "manual_lid_open",
        "Manually Open Lid",
        ButtonAction::ManualLidOpen,
    ),
    ButtonDescription::new("display_on", "Turn On Display", ButtonAction::DisplayOn),
    ButtonDescription::new("display_off", "Turn Off Display", ButtonAction::DisplayOff),
    ButtonDescription::new("sound_on", "Turn On Sound", ButtonAction::SoundOn),
    ButtonDescription::new("sound_off", "Turn Off Sound", ButtonAction::SoundOff),
    ButtonDescription::new(
        "desiccant_reset",
        "Desiccant Replaced",
        ButtonAction::DesiccantReset,
    ),
];

/// Button descriptions applicable to a product
pub fn button_descriptions(kind: DeviceKind) -> &'static [ButtonDescription] {
    match kind {
        DeviceKind::AirSmartFeeder
        | DeviceKind::GranarySmartFeeder
        | DeviceKind::GranarySmartCameraFeeder => &DRY_FEEDER_BUTTONS,
        DeviceKind::OneRfidSmartFeeder => &ONE_RFID_SMART_FEEDER_BUTTONS,
        DeviceKind::PolarWetFoodFeeder
        | DeviceKind::DockstreamSmartFountain
        | DeviceKind::DockstreamSmartRfidFountain => &[],
    }
}

/// Buttons for every device known to the hub
pub fn build_buttons(hub: &PetLibroHub) -> Vec<ButtonEntity> {
    let entities: Vec<ButtonEntity> = hub
        .devices()
        .into_iter()
        .flat_map(|device| {
            button_descriptions(device.kind())
                .iter()
                .map(move |description| ButtonEntity::new(device.clone(), description))
        })
        .collect();
    debug!(count = entities.len(), "Built button entities");
    entities
}
