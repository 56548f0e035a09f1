//! Product catalogue
//!
//! The cloud identifies appliances by their marketing product name; the hub
//! maps that name to a [`DeviceKind`] to decide which entity descriptions
//! apply.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Supported PETLIBRO appliance models
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceKind {
    AirSmartFeeder,
    GranarySmartFeeder,
    GranarySmartCameraFeeder,
    OneRfidSmartFeeder,
    PolarWetFoodFeeder,
    DockstreamSmartFountain,
    DockstreamSmartRfidFountain,
}

impl DeviceKind {
    pub const ALL: [DeviceKind; 7] = [
        DeviceKind::AirSmartFeeder,
        DeviceKind::GranarySmartFeeder,
        DeviceKind::GranarySmartCameraFeeder,
        DeviceKind::OneRfidSmartFeeder,
        DeviceKind::PolarWetFoodFeeder,
        DeviceKind::DockstreamSmartFountain,
        DeviceKind::DockstreamSmartRfidFountain,
    ];

    /// Resolve a cloud `productName` to a kind
    pub fn from_product_name(name: &str) -> Option<Self> {
        match name {
            "Air Smart Feeder" => Some(DeviceKind::AirSmartFeeder),
            "Granary Smart Feeder" => Some(DeviceKind::GranarySmartFeeder),
            "Granary Smart Camera Feeder" => Some(DeviceKind::GranarySmartCameraFeeder),
            "One RFID Smart Feeder" => Some(DeviceKind::OneRfidSmartFeeder),
            "Polar Wet Food Feeder" => Some(DeviceKind::PolarWetFoodFeeder),
            "Dockstream Smart Fountain" => Some(DeviceKind::DockstreamSmartFountain),
            "Dockstream Smart RFID Fountain" => Some(DeviceKind::DockstreamSmartRfidFountain),
            _ => None,
        }
    }

    pub fn product_name(&self) -> &'static str {
        match self {
            DeviceKind::AirSmartFeeder => "Air Smart Feeder",
            DeviceKind::GranarySmartFeeder => "Granary Smart Feeder",
            DeviceKind::GranarySmartCameraFeeder => "Granary Smart Camera Feeder",
            DeviceKind::OneRfidSmartFeeder => "One RFID Smart Feeder",
            DeviceKind::PolarWetFoodFeeder => "Polar Wet Food Feeder",
            DeviceKind::DockstreamSmartFountain => "Dockstream Smart Fountain",
            DeviceKind::DockstreamSmartRfidFountain => "Dockstream Smart RFID Fountain",
        }
    }

    pub fn is_feeder(&self) -> bool {
        !self.is_fountain()
    }

    pub fn is_fountain(&self) -> bool {
        matches!(
            self,
            DeviceKind::DockstreamSmartFountain | DeviceKind::DockstreamSmartRfidFountain
        )
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.product_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_name_roundtrip() {
        for kind in DeviceKind::ALL {
            assert_eq!(DeviceKind::from_product_name(kind.product_name()), Some(kind));
        }
    }

    #[test]
    fn test_unknown_product() {
        assert_eq!(DeviceKind::from_product_name("Space Laser Feeder"), None);
    }

    #[test]
    fn test_families() {
        assert!(DeviceKind::AirSmartFeeder.is_feeder());
        assert!(DeviceKind::PolarWetFoodFeeder.is_feeder());
        assert!(DeviceKind::DockstreamSmartFountain.is_fountain());
        assert!(DeviceKind::DockstreamSmartRfidFountain.is_fountain());
    }
}
