//! Core types for the PETLIBRO integration
//!
//! This crate owns the in-memory model of an account: the JSON state cache
//! kept per appliance ([`Device`]), the product catalogue ([`DeviceKind`]),
//! the account hub that loads and refreshes devices, and the polling
//! coordinator that entities observe for update notifications.

mod config;
mod coordinator;
mod data;
mod device;
mod kind;
mod value;

pub mod hub;

pub use config::PetLibroConfig;
pub use coordinator::{CoordinatorMessage, UpdateCoordinator};
pub use data::DeviceData;
pub use device::Device;
pub use hub::PetLibroHub;
pub use kind::DeviceKind;
pub use value::StateValue;
