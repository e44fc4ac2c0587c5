pub const CAPABILITY: &str = "device/state";
pub const CAPABILITY_UPDATED: &str = "device/updated";
pub const DISCOVERY: &str = "smarthome/discovery";
