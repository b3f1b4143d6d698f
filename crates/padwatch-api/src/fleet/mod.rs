// Fleet API: the device-management backend that reports Launchpad state.

mod client;
pub mod models;

pub use client::FleetClient;
pub use models::{LaunchpadRecord, Page};
