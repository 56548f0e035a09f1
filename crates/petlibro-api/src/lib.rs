//! HTTP client for the PETLIBRO cloud API
//!
//! This crate wraps the vendor REST endpoints used by PETLIBRO feeders and
//! fountains: member authentication, the account device list, per-device
//! state payloads, and the small set of write commands (manual feed, feeding
//! plan toggle, attribute settings). Every call is a single attempt; callers
//! decide how failures propagate.

mod client;
mod error;
mod session;

pub use client::PetLibroApi;
pub use error::{ApiError, ApiResult};
pub use session::{Region, Session};
