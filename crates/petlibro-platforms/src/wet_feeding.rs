//! Wet-food feeding plan plate entities
//!
//! The Polar wet food feeder carries three rotating plates; the active plan
//! schedules a feeding window per plate. Each plate is surfaced as an entity
//! that is on while the plan covers it, with the window details as state
//! attributes.

use std::sync::Arc;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use petlibro_core::{Device, DeviceKind, PetLibroHub};

pub const PLATE_COUNT: u8 = 3;

/// Plate progress within the active plan, as the cloud encodes it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlateState {
    Waiting,
    Done,
    Active,
}

impl PlateState {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(PlateState::Waiting),
            2 => Some(PlateState::Done),
            3 => Some(PlateState::Active),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PlateState::Waiting => "waiting",
            PlateState::Done => "done",
            PlateState::Active => "active",
        }
    }
}

/// One plate of a wet food feeder
pub struct WetFeedingPlanPlateEntity {
    device: Arc<Device>,
    plate_index: u8,
    unique_id: String,
}

impl WetFeedingPlanPlateEntity {
    pub fn new(device: Arc<Device>, plate_index: u8) -> Self {
        let unique_id = format!("{}-plate-{}", device.serial(), plate_index);
        Self {
            device,
            plate_index,
            unique_id,
        }
    }

    pub fn plate_index(&self) -> u8 {
        self.plate_index
    }

    pub fn name(&self) -> String {
        format!("Plate {}", self.plate_index)
    }

    pub fn unique_id(&self) -> &str {
        &self.unique_id
    }

    fn plate(&self) -> Option<Map<String, Value>> {
        self.device.wet_feeding_plan_plate(self.plate_index)
    }

    /// Whether the active plan schedules this plate
    pub fn is_on(&self) -> bool {
        self.plate().is_some()
    }

    pub fn label(&self) -> Option<String> {
        self.plate()?
            .get("label")
            .and_then(Value::as_str)
            .map(str::to_owned)
    }

    pub fn cancel_state(&self) -> Option<bool> {
        self.plate()?.get("cancelState").and_then(Value::as_bool)
    }

    pub fn plate_state(&self) -> Option<PlateState> {
        let code = self.plate()?.get("state").and_then(Value::as_i64)?;
        match PlateState::from_code(code) {
            Some(state) => Some(state),
            None => {
                warn!(
                    serial = %self.device.serial(),
                    plate = self.plate_index,
                    code,
                    "Unexpected plate state code"
                );
                None
            }
        }
    }

    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        self.window_bound("executionStartTime")
    }

    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        self.window_bound("executionEndTime")
    }

    fn window_bound(&self, key: &str) -> Option<DateTime<Utc>> {
        let plate = self.plate()?;
        let raw = plate.get(key)?.as_str()?;
        let timezone = plate.get("timezone")?.as_str()?;

        let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M").ok()?;
        let tz: Tz = timezone.parse().ok()?;
        tz.from_local_datetime(&naive)
            .earliest()
            .map(|local| local.with_timezone(&Utc))
    }

    /// Extra state attributes describing the feeding window
    pub fn attributes(&self) -> Map<String, Value> {
        let mut attributes = Map::new();
        attributes.insert(
            "start_time".to_string(),
            json!(self.start_time().map(|t| t.to_rfc3339())),
        );
        attributes.insert(
            "end_time".to_string(),
            json!(self.end_time().map(|t| t.to_rfc3339())),
        );
        attributes.insert("label".to_string(), json!(self.label()));
        attributes.insert("cancel_state".to_string(), json!(self.cancel_state()));
        attributes.insert(
            "plate_state".to_string(),
            json!(self.plate_state().map(|s| s.as_str())),
        );
        attributes
    }
}

/// Plate entities for every wet food feeder known to the hub
pub fn build_wet_feeding_plates(hub: &PetLibroHub) -> Vec<WetFeedingPlanPlateEntity> {
    let entities: Vec<WetFeedingPlanPlateEntity> = hub
        .devices()
        .into_iter()
        .filter(|device| device.kind() == DeviceKind::PolarWetFoodFeeder)
        .flat_map(|device| {
            (1..=PLATE_COUNT).map(move |index| WetFeedingPlanPlateEntity::new(device.clone(), index))
        })
        .collect();
    debug!(count = entities.len(), "Built wet feeding plate entities");
    entities
}

#[cfg(test)]
mod tests {
    use super::*;
    use petlibro_api::PetLibroApi;
    use serde_json::json;

    fn polar_device() -> Arc<Device> {
        let api = Arc::new(PetLibroApi::with_base_url("http://localhost:1").unwrap());
        let dev = Arc::new(Device::new(
            DeviceKind::PolarWetFoodFeeder,
            json!({"deviceSn": "P1"}),
            api,
        ));
        dev.update_data(json!({
            "wetFeedingPlan": {
                "templateName": "Weekday",
                "plan": [
                    {
                        "plate": "2",
                        "label": "Lunch",
                        "state": 3,
                        "cancelState": false,
                        "executionStartTime": "2026-03-01 11:30",
                        "executionEndTime": "2026-03-01 12:30",
                        "timezone": "UTC",
                    },
                ],
            },
        }));
        dev
    }

    #[test]
    fn test_scheduled_plate() {
        let plate = WetFeedingPlanPlateEntity::new(polar_device(), 2);
        assert!(plate.is_on());
        assert_eq!(plate.label().as_deref(), Some("Lunch"));
        assert_eq!(plate.plate_state(), Some(PlateState::Active));
        assert_eq!(plate.cancel_state(), Some(false));

        let start = plate.start_time().unwrap();
        let end = plate.end_time().unwrap();
        assert_eq!((end - start).num_minutes(), 60);
    }

    #[test]
    fn test_unscheduled_plate() {
        let plate = WetFeedingPlanPlateEntity::new(polar_device(), 1);
        assert!(!plate.is_on());
        assert!(plate.label().is_none());
        assert!(plate.plate_state().is_none());
    }

    #[test]
    fn test_attributes() {
        let plate = WetFeedingPlanPlateEntity::new(polar_device(), 2);
        let attributes = plate.attributes();
        assert_eq!(attributes["label"], json!("Lunch"));
        assert_eq!(attributes["plate_state"], json!("active"));
        assert_eq!(attributes["start_time"], json!("2026-03-01T11:30:00+00:00"));
    }

    #[test]
    fn test_unknown_state_code() {
        assert_eq!(PlateState::from_code(9), None);
        assert_eq!(PlateState::from_code(1), Some(PlateState::Waiting));
    }

    #[test]
    fn test_unique_id() {
        let plate = WetFeedingPlanPlateEntity::new(polar_device(), 3);
        assert_eq!(plate.unique_id(), "P1-plate-3");
        assert_eq!(plate.name(), "Plate 3");
    }
}
