//! In-memory cache of one appliance's latest cloud state
//!
//! A [`Device`] wraps the merged JSON payloads for a single appliance and
//! exposes them through thin typed accessors. Accessors never fail: a missing
//! or oddly-typed field reads as `None` and the entity layer degrades to an
//! unknown state.

use std::sync::{Arc, RwLock};

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde_json::{Map, Value};
use tracing::{debug, error};

use petlibro_api::{ApiResult, PetLibroApi};

use crate::data::DeviceData;
use crate::kind::DeviceKind;
use crate::value::StateValue;

/// One physical appliance and its cached cloud state
pub struct Device {
    kind: DeviceKind,
    api: Arc<PetLibroApi>,
    data: RwLock<DeviceData>,
}

impl Device {
    /// Wrap an initial device-list payload
    pub fn new(kind: DeviceKind, initial: Value, api: Arc<PetLibroApi>) -> Self {
        Self {
            kind,
            api,
            data: RwLock::new(DeviceData::from_value(initial)),
        }
    }

    pub fn kind(&self) -> DeviceKind {
        self.kind
    }

    fn data(&self) -> std::sync::RwLockReadGuard<'_, DeviceData> {
        self.data.read().expect("device data lock poisoned")
    }

    /// Merge an update payload into the cache
    pub fn update_data(&self, update: Value) {
        debug!(serial = %self.serial(), "Merging device state update");
        self.data
            .write()
            .expect("device data lock poisoned")
            .merge(update);
    }

    fn insert_section(&self, key: &str, value: Value) {
        self.data
            .write()
            .expect("device data lock poisoned")
            .insert_section(key, value);
    }

    /// Re-fetch the device payloads from the cloud and merge them
    ///
    /// The wet food feeder additionally carries its grain status, plan
    /// templates and plate schedule as named sections.
    pub async fn refresh(&self) -> ApiResult<()> {
        let serial = self.serial();

        let base = self.api.device_base_info(&serial).await?;
        let real = self.api.device_real_info(&serial).await?;
        let settings = self.api.device_attribute_settings(&serial).await?;
        self.update_data(base);
        self.update_data(settings);

        if self.kind == DeviceKind::PolarWetFoodFeeder {
            self.insert_section("realInfo", real);
            let grain = self.api.device_grain_status(&serial).await?;
            let templates = self.api.device_feeding_plan_templates(&serial).await?;
            let wet_plan = self.api.device_wet_feeding_plan(&serial).await?;
            self.insert_section("grainStatus", grain);
            self.insert_section("feedingPlanTemplates", templates);
            self.insert_section("wetFeedingPlan", wet_plan);
        } else {
            self.update_data(real);
        }

        Ok(())
    }

    // --- identification -----------------------------------------------------

    pub fn serial(&self) -> String {
        self.data()
            .field_str("deviceSn")
            .unwrap_or_else(|| "unknown".to_string())
    }

    pub fn name(&self) -> String {
        self.data()
            .field_str("name")
            .unwrap_or_else(|| self.kind.product_name().to_string())
    }

    pub fn model(&self) -> Option<String> {
        self.data().field_str("productIdentifier")
    }

    pub fn model_name(&self) -> Option<String> {
        self.data().field_str("productName")
    }

    pub fn mac(&self) -> Option<String> {
        self.data()
            .field_str("mac")
            .or_else(|| self.data().field_str("macAddress"))
    }

    pub fn software_version(&self) -> Option<String> {
        self.data().field_str("softwareVersion")
    }

    pub fn hardware_version(&self) -> Option<String> {
        self.data().field_str("hardwareVersion")
    }

    // --- connectivity and power --------------------------------------------

    pub fn online(&self) -> Option<bool> {
        self.data().field_bool("online")
    }

    pub fn wifi_ssid(&self) -> Option<String> {
        self.data().field_str("wifiSsid")
    }

    pub fn wifi_rssi(&self) -> Option<i64> {
        self.data().field_i64("wifiRssi")
    }

    pub fn battery_state(&self) -> Option<String> {
        self.data().field_str("batteryState")
    }

    /// Battery percentage, or mains-power level for plugged-in units
    pub fn electric_quantity(&self) -> Option<i64> {
        self.data().field_i64("electricQuantity")
    }

    pub fn enable_low_battery_notice(&self) -> Option<bool> {
        self.data().field_bool("enableLowBatteryNotice")
    }

    pub fn whether_in_sleep_mode(&self) -> Option<bool> {
        self.data().field_bool("whetherInSleepMode")
    }

    // --- feeder state -------------------------------------------------------

    pub fn feeding_plan_state(&self) -> Option<bool> {
        self.data().field_bool("enableFeedingPlan")
    }

    pub fn today_feeding_quantity(&self) -> Option<i64> {
        self.data().field_i64("todayFeedingQuantity")
    }

    pub fn today_feeding_times(&self) -> Option<i64> {
        self.data().field_i64("todayFeedingTimes")
    }

    pub fn today_eating_times(&self) -> Option<i64> {
        self.data().field_i64("todayEatingTimes")
    }

    /// Accumulated eating time today, in seconds
    pub fn today_eating_time(&self) -> Option<i64> {
        self.data().field_i64("todayEatingTime")
    }

    /// The hopper reports `surplusGrain: true` while enough food remains
    pub fn food_low(&self) -> Option<bool> {
        self.data().field_bool("surplusGrain").map(|surplus| !surplus)
    }

    /// The dispenser reports `grainOutletState: true` while unobstructed
    pub fn food_dispenser_state(&self) -> Option<bool> {
        self.data().field_bool("grainOutletState").map(|ok| !ok)
    }

    pub fn door_state(&self) -> Option<bool> {
        self.data().field_bool("barnDoorState")
    }

    pub fn door_blocked(&self) -> Option<bool> {
        self.data().field_bool("barnDoorError")
    }

    pub fn remaining_desiccant(&self) -> Option<i64> {
        self.data().field_i64("remainingDesiccantDays")
    }

    pub fn desiccant_frequency(&self) -> Option<i64> {
        self.data().field_i64("desiccantFrequency")
    }

    pub fn child_lock_switch(&self) -> Option<bool> {
        self.data().field_bool("childLockSwitch")
    }

    pub fn sound_switch(&self) -> Option<bool> {
        self.data().field_bool("soundSwitch")
    }

    pub fn sound_level(&self) -> Option<i64> {
        self.data().field_i64("volume")
    }

    pub fn display_switch(&self) -> Option<bool> {
        self.data().field_bool("screenDisplaySwitch")
    }

    /// Display unit selected in the vendor app for dispensed quantities
    pub fn unit_type(&self) -> Option<&'static str> {
        match self.data().field_i64("unitType")? {
            1 => Some("g"),
            2 => Some("oz"),
            3 => Some("mL"),
            _ => None,
        }
    }

    /// Dispenser unit-to-cup conversion mode (`"1/12"` or `"1/24"`)
    pub fn conversion_mode(&self) -> Option<String> {
        self.data().field_str("conversionMode")
    }

    // --- camera feeder ------------------------------------------------------

    pub fn resolution(&self) -> Option<String> {
        self.data().field_str("resolution")
    }

    pub fn night_vision(&self) -> Option<String> {
        self.data().field_str("nightVision")
    }

    pub fn enable_video_record(&self) -> Option<bool> {
        self.data().field_bool("enableVideoRecord")
    }

    pub fn video_record_switch(&self) -> Option<bool> {
        self.data().field_bool("videoRecordSwitch")
    }

    pub fn video_record_mode(&self) -> Option<String> {
        self.data().field_str("videoRecordMode")
    }

    // --- fountain state -----------------------------------------------------

    /// Reservoir weight in grams as reported by the scale
    pub fn weight_grams(&self) -> Option<f64> {
        self.data().field_f64("weight")
    }

    pub fn weight_percent(&self) -> Option<i64> {
        self.data().field_i64("weightPercent")
    }

    pub fn use_water_interval(&self) -> Option<i64> {
        self.data().field_i64("useWaterInterval")
    }

    pub fn use_water_duration(&self) -> Option<i64> {
        self.data().field_i64("useWaterDuration")
    }

    pub fn remaining_cleaning_days(&self) -> Option<i64> {
        self.data().field_i64("remainingCleaningDays")
    }

    pub fn remaining_filter_days(&self) -> Option<i64> {
        self.data().field_i64("remainingFilterDays")
    }

    // --- wet food feeder ----------------------------------------------------

    pub fn plate_position(&self) -> Option<i64> {
        self.data().field_i64("platePosition")
    }

    pub fn temperature(&self) -> Option<f64> {
        self.data().field_f64("temperature")
    }

    pub fn active_feeding_plan_name(&self) -> Option<String> {
        self.data()
            .section_value("wetFeedingPlan", "templateName")?
            .as_str()
            .map(str::to_owned)
    }

    /// Start of the next scheduled feeding window, in UTC
    pub fn next_feeding_time(&self) -> Option<DateTime<Utc>> {
        self.next_feeding("nextFeedingTime")
    }

    /// End of the next scheduled feeding window, in UTC
    ///
    /// The cloud reports only a day and a clock time; the end is assumed to
    /// fall on the same day because plans cannot cross midnight.
    pub fn next_feeding_end_time(&self) -> Option<DateTime<Utc>> {
        self.next_feeding("nextFeedingEndTime")
    }

    fn next_feeding(&self, time_key: &str) -> Option<DateTime<Utc>> {
        let data = self.data();
        let time = data.field_str(time_key);
        let day = data.field_str("nextFeedingDay");
        let timezone = data.field_str("timezone");
        drop(data);

        let (Some(time), Some(day), Some(timezone)) = (time, day, timezone) else {
            error!(
                serial = %self.serial(),
                key = time_key,
                "Feeding schedule is missing a time, day or timezone field"
            );
            return None;
        };
        match parse_local_timestamp(&day, &time, &timezone) {
            Some(instant) => Some(instant),
            None => {
                error!(
                    serial = %self.serial(),
                    "Cannot parse feeding time '{day} {time}' in timezone {timezone}"
                );
                None
            }
        }
    }

    /// The plate schedule entry for a plate index, if the plan covers it
    pub fn wet_feeding_plan_plate(&self, plate_index: u8) -> Option<Map<String, Value>> {
        let data = self.data();
        let plan = data.section_value("wetFeedingPlan", "plan")?.as_array()?;
        plan.iter()
            .filter_map(Value::as_object)
            .find(|plate| {
                plate.get("plate").and_then(Value::as_str) == Some(plate_index.to_string().as_str())
            })
            .cloned()
    }

    // --- generic accessor ---------------------------------------------------

    /// Resolve an entity description key to the matching accessor
    ///
    /// This is the lookup the declarative description maps are written
    /// against; an unknown key reads as `None`.
    pub fn value(&self, key: &str) -> Option<StateValue> {
        match key {
            "device_sn" => Some(self.serial().into()),
            "mac" | "mac_address" => self.mac().map(Into::into),
            "wifi_ssid" => self.wifi_ssid().map(Into::into),
            "wifi_rssi" => self.wifi_rssi().map(Into::into),
            "online" => self.online().map(Into::into),
            "battery_state" => self.battery_state().map(Into::into),
            "electric_quantity" => self.electric_quantity().map(Into::into),
            "enable_low_battery_notice" => self.enable_low_battery_notice().map(Into::into),
            "whether_in_sleep_mode" => self.whether_in_sleep_mode().map(Into::into),
            "feeding_plan_state" => self.feeding_plan_state().map(Into::into),
            "today_feeding_quantity" => self.today_feeding_quantity().map(Into::into),
            "today_feeding_times" => self.today_feeding_times().map(Into::into),
            "today_eating_times" => self.today_eating_times().map(Into::into),
            "today_eating_time" => self.today_eating_time().map(Into::into),
            "food_low" => self.food_low().map(Into::into),
            "food_dispenser_state" => self.food_dispenser_state().map(Into::into),
            "door_state" => self.door_state().map(Into::into),
            "door_blocked" => self.door_blocked().map(Into::into),
            "remaining_desiccant" => self.remaining_desiccant().map(Into::into),
            "desiccant_frequency" => self.desiccant_frequency().map(Into::into),
            "child_lock_switch" => self.child_lock_switch().map(Into::into),
            "sound_switch" => self.sound_switch().map(Into::into),
            "sound_level" => self.sound_level().map(Into::into),
            "display_switch" => self.display_switch().map(Into::into),
            "resolution" => self.resolution().map(Into::into),
            "night_vision" => self.night_vision().map(Into::into),
            "enable_video_record" => self.enable_video_record().map(Into::into),
            "video_record_switch" => self.video_record_switch().map(Into::into),
            "video_record_mode" => self.video_record_mode().map(Into::into),
            "weight" => self.weight_grams().map(Into::into),
            "weight_percent" => self.weight_percent().map(Into::into),
            "use_water_interval" => self.use_water_interval().map(Into::into),
            "use_water_duration" => self.use_water_duration().map(Into::into),
            "remaining_cleaning_days" => self.remaining_cleaning_days().map(Into::into),
            "remaining_filter_days" => self.remaining_filter_days().map(Into::into),
            "plate_position" => self.plate_position().map(Into::into),
            "temperature" => self.temperature().map(Into::into),
            "active_feeding_plan_name" => self.active_feeding_plan_name().map(Into::into),
            "next_feeding_time" => self.next_feeding_time().map(Into::into),
            "next_feeding_end_time" => self.next_feeding_end_time().map(Into::into),
            _ => None,
        }
    }

    // --- commands -----------------------------------------------------------

    pub async fn set_manual_feed(&self) -> ApiResult<()> {
        self.api.manual_feed(&self.serial()).await
    }

    pub async fn set_feeding_plan(&self, enable: bool) -> ApiResult<()> {
        self.api.set_feeding_plan(&self.serial(), enable).await
    }

    pub async fn set_manual_lid_open(&self) -> ApiResult<()> {
        self.api.manual_lid_open(&self.serial()).await
    }

    pub async fn set_display(&self, on: bool) -> ApiResult<()> {
        self.api.set_display(&self.serial(), on).await
    }

    pub async fn set_sound(&self, on: bool) -> ApiResult<()> {
        self.api.set_sound(&self.serial(), on).await
    }

    pub async fn set_sound_level(&self, level: u32) -> ApiResult<()> {
        self.api.set_sound_level(&self.serial(), level).await
    }

    pub async fn set_desiccant_reset(&self) -> ApiResult<()> {
        self.api.desiccant_reset(&self.serial()).await
    }

    pub async fn set_desiccant_frequency(&self, days: u32) -> ApiResult<()> {
        self.api.set_desiccant_frequency(&self.serial(), days).await
    }
}

impl std::fmt::Debug for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Device")
            .field("kind", &self.kind)
            .field("serial", &self.serial())
            .finish_non_exhaustive()
    }
}

/// Combine a vendor-local date, clock time and IANA timezone into a UTC
/// instant
fn parse_local_timestamp(day: &str, time: &str, timezone: &str) -> Option<DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(&format!("{day} {time}"), "%Y-%m-%d %H:%M").ok()?;
    let tz: Tz = timezone.parse().ok()?;
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;
    use serde_json::json;

    fn device(kind: DeviceKind, data: Value) -> Device {
        let api = Arc::new(PetLibroApi::with_base_url("http://localhost:1").unwrap());
        Device::new(kind, data, api)
    }

    #[test]
    fn test_identification_accessors() {
        let dev = device(
            DeviceKind::GranarySmartFeeder,
            json!({
                "deviceSn": "GSF001",
                "name": "Pantry",
                "productIdentifier": "PLAF103",
                "mac": "AA:BB:CC:DD:EE:FF",
                "softwareVersion": "1.0.2",
            }),
        );
        assert_eq!(dev.serial(), "GSF001");
        assert_eq!(dev.name(), "Pantry");
        assert_eq!(dev.model().as_deref(), Some("PLAF103"));
        assert_eq!(dev.mac().as_deref(), Some("AA:BB:CC:DD:EE:FF"));
        assert_eq!(dev.software_version().as_deref(), Some("1.0.2"));
        assert!(dev.hardware_version().is_none());
    }

    #[test]
    fn test_defaults_when_empty() {
        let dev = device(DeviceKind::AirSmartFeeder, json!({}));
        assert_eq!(dev.serial(), "unknown");
        assert_eq!(dev.name(), "Air Smart Feeder");
        assert!(dev.online().is_none());
    }

    #[test]
    fn test_food_state_inversion() {
        let dev = device(
            DeviceKind::AirSmartFeeder,
            json!({"surplusGrain": true, "grainOutletState": false}),
        );
        assert_eq!(dev.food_low(), Some(false));
        assert_eq!(dev.food_dispenser_state(), Some(true));
    }

    #[test]
    fn test_real_info_fallback() {
        let dev = device(DeviceKind::PolarWetFoodFeeder, json!({"deviceSn": "P1"}));
        dev.insert_section(
            "realInfo",
            json!({"wifiSsid": "den", "platePosition": 3, "barnDoorError": true}),
        );
        assert_eq!(dev.wifi_ssid().as_deref(), Some("den"));
        assert_eq!(dev.plate_position(), Some(3));
        assert_eq!(dev.door_blocked(), Some(true));
    }

    #[test]
    fn test_next_feeding_time_parses_to_utc() {
        let dev = device(
            DeviceKind::PolarWetFoodFeeder,
            json!({
                "nextFeedingDay": "2026-03-01",
                "nextFeedingTime": "07:30",
                "nextFeedingEndTime": "08:00",
                "timezone": "America/New_York",
            }),
        );
        let start = dev.next_feeding_time().unwrap();
        // 07:30 EST == 12:30 UTC
        assert_eq!(start.hour(), 12);
        assert_eq!(start.minute(), 30);
        let end = dev.next_feeding_end_time().unwrap();
        assert!(end > start);
    }

    #[test]
    fn test_next_feeding_time_missing_component() {
        let dev = device(
            DeviceKind::PolarWetFoodFeeder,
            json!({"nextFeedingDay": "2026-03-01", "nextFeedingTime": "07:30"}),
        );
        assert!(dev.next_feeding_time().is_none());
    }

    #[test]
    fn test_next_feeding_time_bad_timezone() {
        let dev = device(
            DeviceKind::PolarWetFoodFeeder,
            json!({
                "nextFeedingDay": "2026-03-01",
                "nextFeedingTime": "07:30",
                "timezone": "Mars/Olympus_Mons",
            }),
        );
        assert!(dev.next_feeding_time().is_none());
    }

    #[test]
    fn test_wet_feeding_plan_plate_lookup() {
        let dev = device(DeviceKind::PolarWetFoodFeeder, json!({}));
        dev.insert_section(
            "wetFeedingPlan",
            json!({
                "templateName": "Weekday",
                "plan": [
                    {"plate": "1", "label": "Breakfast", "state": 2},
                    {"plate": "3", "label": "Dinner", "state": 1},
                ],
            }),
        );
        assert_eq!(dev.active_feeding_plan_name().as_deref(), Some("Weekday"));
        let plate = dev.wet_feeding_plan_plate(3).unwrap();
        assert_eq!(plate.get("label").and_then(Value::as_str), Some("Dinner"));
        assert!(dev.wet_feeding_plan_plate(2).is_none());
    }

    #[test]
    fn test_unit_type_mapping() {
        let dev = device(DeviceKind::GranarySmartFeeder, json!({"unitType": 2}));
        assert_eq!(dev.unit_type(), Some("oz"));
        let dev = device(DeviceKind::GranarySmartFeeder, json!({"unitType": 9}));
        assert_eq!(dev.unit_type(), None);
    }

    #[test]
    fn test_value_dispatch() {
        let dev = device(
            DeviceKind::OneRfidSmartFeeder,
            json!({
                "deviceSn": "ONE1",
                "wifiRssi": -58,
                "enableFeedingPlan": true,
                "weight": 340.5,
            }),
        );
        assert_eq!(dev.value("device_sn"), Some(StateValue::from("ONE1")));
        assert_eq!(dev.value("wifi_rssi"), Some(StateValue::Int(-58)));
        assert_eq!(dev.value("feeding_plan_state"), Some(StateValue::Bool(true)));
        assert_eq!(dev.value("weight"), Some(StateValue::Float(340.5)));
        assert_eq!(dev.value("not_a_key"), None);
    }
}
