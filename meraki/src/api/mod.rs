//! Meraki Dashboard API v1 client
//!
//! `Client` performs the HTTP work; each endpoint group borrows it through a
//! small accessor (`client.networks()`, `client.appliance()`, ...).

pub mod admins;
pub mod appliance;
pub mod client;
pub mod common;
pub mod devices;
pub mod error;
pub mod networks;
pub mod organizations;
pub mod snmp;
pub mod switch;
pub mod syslog;

pub use client::{Client, DEFAULT_BASE_URL};
pub use error::ApiError;
