mod run;
mod send_discovery;
mod simulate;

pub use run::run;
pub use send_discovery::send_discovery;
pub use simulate::simulate;
