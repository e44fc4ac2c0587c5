mod command;
mod config;
mod constants;
mod correlation;
mod dispatch;
mod helpers;
mod interfaces;
mod models;
mod reconcile;
#[cfg(test)]
mod testing;

use std::path::PathBuf;

use anyhow::{anyhow, Result};
use env_logger::Env;

use crate::config::Config;
use crate::constants::{defaults, envvars};

const CMD_RUN: &str = "run";
const CMD_SEND_DISCOVERY: &str = "send-discovery";
const CMD_SIMULATE: &str = "simulate";

fn main() -> Result<()> {
    helpers::load_dotenv();
    env_logger::Builder::from_env(Env::default().filter_or(envvars::LOG_LEVEL, defaults::LOG_LEVEL))
        .init();

    let mut args = pico_args::Arguments::from_env();
    match args.subcommand()?.as_deref() {
        Some(CMD_RUN) | None => command::run(Config::from_env()?),
        Some(CMD_SEND_DISCOVERY) => {
            let path: PathBuf = args.free_from_str()?;
            command::send_discovery(&Config::from_env()?, &path)
        }
        Some(CMD_SIMULATE) => {
            let topic: String = args.free_from_str()?;
            let path: PathBuf = args.free_from_str()?;
            command::simulate(Config::from_env()?, &topic, &path)
        }
        Some(other) => Err(anyhow!(
            "Unknown subcommand '{other}'; must be one of 'run', 'send-discovery', 'simulate'"
        )),
    }
}
