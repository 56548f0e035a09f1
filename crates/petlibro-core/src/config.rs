//! Account configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

use petlibro_api::Region;

const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;

/// Credentials and polling settings for one PETLIBRO account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PetLibroConfig {
    pub email: String,
    /// The vendor-app digest of the account password
    pub password: String,
    #[serde(default)]
    pub region: Region,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

fn default_poll_interval_secs() -> u64 {
    DEFAULT_POLL_INTERVAL_SECS
}

impl PetLibroConfig {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            region: Region::default(),
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
        }
    }

    pub fn with_region(mut self, region: Region) -> Self {
        self.region = region;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_secs = interval.as_secs().max(1);
        self
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }
}
