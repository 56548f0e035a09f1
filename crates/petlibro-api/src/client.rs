//! PETLIBRO cloud REST client
//!
//! All endpoints answer HTTP 200 with a JSON envelope `{code, msg, data}`;
//! `code` 0 means success and anything else is a vendor error. Requests are
//! made exactly once, errors are surfaced to the caller unmodified.

use std::sync::RwLock;
use std::time::Duration;

use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use crate::error::{ApiError, ApiResult};
use crate::session::{Region, Session, API_LANGUAGE, API_SOURCE, API_VERSION};

/// Vendor result code for a successful call
const CODE_OK: i64 = 0;
/// Vendor result codes that invalidate the stored session token
const CODE_NOT_LOGGED_IN: i64 = 1003;
const CODE_TOKEN_EXPIRED: i64 = 1009;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct Envelope {
    code: i64,
    #[serde(default)]
    msg: String,
    #[serde(default)]
    data: Value,
}

#[derive(Debug, Deserialize)]
struct LoginData {
    token: String,
}

/// Client for one PETLIBRO account
///
/// Cheap to share behind an `Arc`; the session token is interior-mutable so
/// a re-login replaces it for every holder.
pub struct PetLibroApi {
    http: reqwest::Client,
    session: RwLock<Session>,
}

impl PetLibroApi {
    /// Create a client for a region shard
    pub fn new(region: Region) -> ApiResult<Self> {
        Self::from_session(Session::for_region(region))
    }

    /// Create a client against an explicit base URL (tests, proxies)
    pub fn with_base_url(base_url: impl Into<String>) -> ApiResult<Self> {
        Self::from_session(Session::with_base_url(base_url))
    }

    fn from_session(session: Session) -> ApiResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            session: RwLock::new(session),
        })
    }

    /// Whether a session token is currently held
    pub fn is_logged_in(&self) -> bool {
        self.session.read().expect("session lock poisoned").is_logged_in()
    }

    /// Authenticate and store the session token
    ///
    /// `password` is the digest the vendor app derives from the account
    /// password, not the clear text.
    pub async fn login(&self, email: &str, password: &str) -> ApiResult<()> {
        debug!(email, "Logging in to the PETLIBRO cloud");
        let data = self
            .post(
                "/member/auth/login",
                json!({
                    "email": email,
                    "password": password,
                    "source": API_SOURCE,
                }),
            )
            .await?;

        let login: LoginData = serde_json::from_value(data)?;
        self.session
            .write()
            .expect("session lock poisoned")
            .set_token(login.token);
        debug!("Login succeeded, session token stored");
        Ok(())
    }

    /// End the session and drop the token
    pub async fn logout(&self) -> ApiResult<()> {
        self.post_authed("/member/auth/logout", json!({})).await?;
        self.session
            .write()
            .expect("session lock poisoned")
            .clear_token();
        Ok(())
    }

    /// All devices registered to the account
    pub async fn list_devices(&self) -> ApiResult<Vec<Value>> {
        let data = self.post_authed("/device/device/list", json!({})).await?;
        match data {
            Value::Array(devices) => Ok(devices),
            Value::Null => Ok(Vec::new()),
            other => {
                warn!("Unexpected device list payload: {other}");
                Ok(Vec::new())
            }
        }
    }

    /// Static device information (name, product, firmware)
    pub async fn device_base_info(&self, serial: &str) -> ApiResult<Value> {
        self.post_authed("/device/device/baseInfo", json!({ "id": serial }))
            .await
    }

    /// Live device state (battery, connectivity, dispenser state)
    pub async fn device_real_info(&self, serial: &str) -> ApiResult<Value> {
        self.post_authed("/device/device/realInfo", json!({ "id": serial }))
            .await
    }

    /// User-configurable attribute settings (sound, display, child lock)
    pub async fn device_attribute_settings(&self, serial: &str) -> ApiResult<Value> {
        self.post_authed("/device/setting/getAttributeSetting", json!({ "id": serial }))
            .await
    }

    /// Hopper/grain status for feeders
    pub async fn device_grain_status(&self, serial: &str) -> ApiResult<Value> {
        self.post_authed("/device/data/grainStatus", json!({ "id": serial }))
            .await
    }

    /// Feeding plan templates configured for a device
    pub async fn device_feeding_plan_templates(&self, serial: &str) -> ApiResult<Value> {
        self.post_authed(
            "/device/feedingPlan/templates",
            json!({ "deviceSn": serial }),
        )
        .await
    }

    /// Active wet-food feeding plan (plate schedule) for a device
    pub async fn device_wet_feeding_plan(&self, serial: &str) -> ApiResult<Value> {
        self.post_authed("/device/feedingPlan/wetList", json!({ "deviceSn": serial }))
            .await
    }

    /// Trigger one manual feeding cycle
    pub async fn manual_feed(&self, serial: &str) -> ApiResult<()> {
        self.post_authed(
            "/device/device/manualFeeding",
            json!({ "deviceSn": serial }),
        )
        .await
        .map(drop)
    }

    /// Enable or disable the scheduled feeding plan
    pub async fn set_feeding_plan(&self, serial: &str, enable: bool) -> ApiResult<()> {
        self.post_authed(
            "/device/feedingPlan/enableTodaySimple",
            json!({ "deviceSn": serial, "enable": enable }),
        )
        .await
        .map(drop)
    }

    /// Open the feeder lid without an RFID trigger
    pub async fn manual_lid_open(&self, serial: &str) -> ApiResult<()> {
        self.post_authed(
            "/device/device/manualLidOpen",
            json!({ "deviceSn": serial }),
        )
        .await
        .map(drop)
    }

    /// Turn the front display on or off
    pub async fn set_display(&self, serial: &str, on: bool) -> ApiResult<()> {
        self.update_attribute_settings(serial, json!({ "screenDisplaySwitch": on }))
            .await
    }

    /// Turn dispense sounds on or off
    pub async fn set_sound(&self, serial: &str, on: bool) -> ApiResult<()> {
        self.update_attribute_settings(serial, json!({ "soundSwitch": on }))
            .await
    }

    /// Set the dispense sound volume, 1..=100
    pub async fn set_sound_level(&self, serial: &str, level: u32) -> ApiResult<()> {
        self.update_attribute_settings(serial, json!({ "volume": level }))
            .await
    }

    /// Restart the desiccant replacement countdown
    pub async fn desiccant_reset(&self, serial: &str) -> ApiResult<()> {
        self.post_authed("/device/desiccant/reset", json!({ "deviceSn": serial }))
            .await
            .map(drop)
    }

    /// Set the desiccant replacement reminder interval in days
    pub async fn set_desiccant_frequency(&self, serial: &str, days: u32) -> ApiResult<()> {
        self.update_attribute_settings(serial, json!({ "desiccantFrequency": days }))
            .await
    }

    async fn update_attribute_settings(&self, serial: &str, patch: Value) -> ApiResult<()> {
        let mut body = Map::new();
        body.insert("deviceSn".to_string(), json!(serial));
        if let Value::Object(patch) = patch {
            body.extend(patch);
        }
        self.post_authed(
            "/device/setting/updateAttributeSetting",
            Value::Object(body),
        )
        .await
        .map(drop)
    }

    /// POST an endpoint that requires an established session
    async fn post_authed(&self, path: &str, body: Value) -> ApiResult<Value> {
        if !self.is_logged_in() {
            return Err(ApiError::NotLoggedIn);
        }
        self.post(path, body).await
    }

    async fn post(&self, path: &str, body: Value) -> ApiResult<Value> {
        let (url, token) = {
            let session = self.session.read().expect("session lock poisoned");
            (
                format!("{}{}", session.base_url(), path),
                session.token().map(str::to_owned),
            )
        };

        debug!(%url, "POST");
        let mut request = self
            .http
            .post(&url)
            .header("source", API_SOURCE)
            .header("language", API_LANGUAGE)
            .header("version", API_VERSION)
            .json(&body);
        if let Some(token) = token {
            request = request.header("token", token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "PETLIBRO cloud returned HTTP error");
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let text = response.text().await?;
        let envelope: Envelope = serde_json::from_str(&text)?;
        match envelope.code {
            CODE_OK => Ok(envelope.data),
            CODE_NOT_LOGGED_IN | CODE_TOKEN_EXPIRED => {
                warn!(code = envelope.code, msg = %envelope.msg, "Session rejected by cloud");
                self.session
                    .write()
                    .expect("session lock poisoned")
                    .clear_token();
                Err(ApiError::InvalidAuth(envelope.msg))
            }
            code => Err(ApiError::Api {
                code,
                message: envelope.msg,
            }),
        }
    }
}
