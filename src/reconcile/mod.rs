pub mod capabilities;
pub mod devices;
pub mod platform;
pub mod zigbee;

pub use capabilities::{CapabilityContext, CapabilityOutcome, EnsureOutcome};
pub use devices::{DeviceOutcome, DeviceReport};
