//! Session state for the PETLIBRO cloud
//!
//! The cloud is region-sharded; every account lives on exactly one shard and
//! tokens are only valid there. A [`Session`] tracks the shard base URL and
//! the token returned by the login endpoint.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// App identity sent with every request, mirroring the vendor mobile app
pub(crate) const API_SOURCE: &str = "ANDROID";
pub(crate) const API_LANGUAGE: &str = "EN";
pub(crate) const API_VERSION: &str = "1.3.45";

/// Cloud shard an account is registered on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Region {
    #[default]
    Us,
    Eu,
}

impl Region {
    /// Base URL of the shard's REST endpoint
    pub fn base_url(&self) -> &'static str {
        match self {
            Region::Us => "https://api.us.petlibro.com",
            Region::Eu => "https://api.eu.petlibro.com",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Region::Us => write!(f, "US"),
            Region::Eu => write!(f, "EU"),
        }
    }
}

impl FromStr for Region {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "US" => Ok(Region::Us),
            "EU" => Ok(Region::Eu),
            other => Err(format!("unknown region '{other}'")),
        }
    }
}

/// Mutable authentication state shared by all requests of one account
#[derive(Debug, Clone, Default)]
pub struct Session {
    base_url: String,
    token: Option<String>,
}

impl Session {
    /// Create a session against a region shard
    pub fn for_region(region: Region) -> Self {
        Self::with_base_url(region.base_url())
    }

    /// Create a session against an explicit base URL (tests, proxies)
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: None,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn set_token(&mut self, token: impl Into<String>) {
        self.token = Some(token.into());
    }

    pub fn clear_token(&mut self) {
        self.token = None;
    }

    pub fn is_logged_in(&self) -> bool {
        self.token.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_parse() {
        assert_eq!("us".parse::<Region>().unwrap(), Region::Us);
        assert_eq!("EU".parse::<Region>().unwrap(), Region::Eu);
        assert!("mars".parse::<Region>().is_err());
    }

    #[test]
    fn test_region_base_url() {
        assert_eq!(Region::Us.base_url(), "https://api.us.petlibro.com");
        assert_eq!(Region::Eu.base_url(), "https://api.eu.petlibro.com");
    }

    #[test]
    fn test_session_token_lifecycle() {
        let mut session = Session::for_region(Region::Us);
        assert!(!session.is_logged_in());

        session.set_token("abc123");
        assert_eq!(session.token(), Some("abc123"));
        assert!(session.is_logged_in());

        session.clear_token();
        assert!(session.token().is_none());
    }
}
