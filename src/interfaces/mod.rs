pub mod mqtt;
pub mod registry;
